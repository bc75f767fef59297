//! End-to-end round trips through the smodels reader and writer, including
//! the clasp extensions and name-based heuristic/edge recovery.

use potassco_io::builder::RuleBuilder;
use potassco_io::error::Result;
use potassco_io::sink::Sink;
use potassco_io::smodels::{ParserOptions, Reader, Writer, WriterOptions};
use potassco_io::types::{Atom, HeadType, HeuristicType, Literal, TruthValue, Weight, WeightLit};

#[derive(Default)]
struct Recorder {
    rules: Vec<(HeadType, Vec<Atom>, Vec<Literal>)>,
    outputs: Vec<(String, Vec<Literal>)>,
    assumed: Vec<Literal>,
    externals: Vec<(Atom, TruthValue)>,
    heuristics: Vec<(Atom, HeuristicType, i32, u32)>,
    edges: Vec<(i32, i32)>,
}

impl Sink for Recorder {
    fn rule(&mut self, head_type: HeadType, head: &[Atom], body: &[Literal]) -> Result<()> {
        self.rules.push((head_type, head.to_vec(), body.to_vec()));
        Ok(())
    }
    fn rule_sum(&mut self, _: HeadType, _: &[Atom], _: Weight, _: &[WeightLit]) -> Result<()> {
        Ok(())
    }
    fn minimize(&mut self, _: Weight, _: &[WeightLit]) -> Result<()> {
        Ok(())
    }
    fn output(&mut self, text: &str, condition: &[Literal]) -> Result<()> {
        self.outputs.push((text.to_string(), condition.to_vec()));
        Ok(())
    }
    fn assume(&mut self, lits: &[Literal]) -> Result<()> {
        self.assumed.extend_from_slice(lits);
        Ok(())
    }
    fn external(&mut self, atom: Atom, value: TruthValue) -> Result<()> {
        self.externals.push((atom, value));
        Ok(())
    }
    fn heuristic(&mut self, atom: Atom, kind: HeuristicType, bias: i32, priority: u32, _condition: &[Literal]) -> Result<()> {
        self.heuristics.push((atom, kind, bias, priority));
        Ok(())
    }
    fn acyc_edge(&mut self, s: i32, t: i32, _condition: &[Literal]) -> Result<()> {
        self.edges.push((s, t));
        Ok(())
    }
}

#[test]
fn compute_statement_becomes_one_assume_call() {
    let src = "1 1 0 0\n1 2 0 0\n0\n1 p\n2 q\n0\nB+\n1\n0\nB-\n2\n0\n1\n";
    let mut reader = Reader::new(src.as_bytes(), ParserOptions::default()).unwrap();
    let mut rec = Recorder::default();
    reader.parse(&mut rec).unwrap();
    assert_eq!(rec.assumed, vec![1, -2]);
}

#[test]
fn external_assign_and_release_round_trip_with_clasp_ext() {
    let mut buf = Vec::new();
    {
        let mut w = Writer::new(&mut buf, WriterOptions::new(1000).enable_clasp_ext());
        w.init_program(false).unwrap();
        w.begin_step().unwrap();
        let mut b = RuleBuilder::new();
        b.start(HeadType::Disjunctive).unwrap();
        b.add_head(1).unwrap();
        b.end(Some(&mut w)).unwrap();
        w.external(2, TruthValue::True).unwrap();
        w.external(2, TruthValue::Release).unwrap();
        w.end_step().unwrap();
    }
    let mut reader = Reader::new(buf.as_slice(), ParserOptions::default().enable_clasp_ext()).unwrap();
    let mut rec = Recorder::default();
    reader.parse(&mut rec).unwrap();
    assert_eq!(rec.externals, vec![(2, TruthValue::True), (2, TruthValue::Release)]);
}

#[test]
fn empty_head_uses_the_false_atom_substitute() {
    let mut buf = Vec::new();
    {
        let mut w = Writer::new(&mut buf, WriterOptions::new(1000));
        w.init_program(false).unwrap();
        w.begin_step().unwrap();
        w.rule(HeadType::Disjunctive, &[], &[1]).unwrap();
        w.end_step().unwrap();
    }
    let mut reader = Reader::new(buf.as_slice(), ParserOptions::default()).unwrap();
    let mut rec = Recorder::default();
    reader.parse(&mut rec).unwrap();
    // The false atom (1000) is never defined by its own rule, so it never
    // appears in the symbol table and the rule's head stays effectively empty.
    assert_eq!(rec.rules, vec![(HeadType::Disjunctive, vec![1000], vec![1])]);
}

#[test]
fn heuristic_and_edge_names_recovered_from_the_symbol_table() {
    let src = "1 1 0 0\n1 2 0 0\n1 3 0 0\n1 4 0 0\n0\n\
               1 p\n2 _heuristic(p,sign,-1)\n3 _edge(a,b)\n4 q\n0\nB+\n0\nB-\n0\n1\n";
    let mut reader = Reader::new(src.as_bytes(), ParserOptions::default().convert_heuristic().convert_edges().drop_converted()).unwrap();
    let mut rec = Recorder::default();
    reader.parse(&mut rec).unwrap();
    assert_eq!(rec.heuristics, vec![(1, HeuristicType::Sign, -1, 1)]);
    assert_eq!(rec.edges, vec![(0, 1)]);
    // Converted atoms are dropped from `output` when `drop_converted` is set.
    assert_eq!(rec.outputs, vec![("p".to_string(), vec![1]), ("q".to_string(), vec![4])]);
}
