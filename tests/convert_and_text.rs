//! Integration coverage for the ASPIF -> smodels bridge (`Converter`) and
//! the ground-text renderer (`text::Writer`), driven straight off the
//! ASPIF reader so the whole pipeline is exercised end to end.

use potassco_io::aspif::{Reader, Writer as AspifWriter};
use potassco_io::builder::RuleBuilder;
use potassco_io::convert::{Converter, Options as ConvertOptions};
use potassco_io::smodels::{ParserOptions as SmodelsParserOptions, Reader as SmodelsReader, Writer as SmodelsWriter, WriterOptions};
use potassco_io::text;
use potassco_io::types::HeadType;

#[test]
fn disjunctive_sum_head_becomes_an_auxiliary_atom_before_reaching_smodels() {
    // Build an ASPIF stream with a two-atom disjunctive sum-body rule,
    // which plain smodels cannot express directly.
    let mut aspif_buf = Vec::new();
    {
        let mut w = AspifWriter::new(&mut aspif_buf);
        w.init_program(false).unwrap();
        let mut b = RuleBuilder::new();
        b.start(HeadType::Disjunctive).unwrap();
        b.add_head(1).unwrap();
        b.add_head(2).unwrap();
        b.start_sum(1).unwrap();
        b.add_goal(3).unwrap();
        b.end(Some(&mut w)).unwrap();
        w.end_step().unwrap();
    }

    let smodels_writer = SmodelsWriter::new(Vec::new(), WriterOptions::new(1000).enable_clasp_ext());
    let mut converter = Converter::new(smodels_writer, ConvertOptions::default());
    let mut reader = Reader::new(aspif_buf.as_slice());
    reader.parse(&mut converter).unwrap();

    let smodels_bytes = converter.into_inner();
    // The converted stream must be parseable by the plain smodels reader:
    // the two-atom head was split into an auxiliary-atom cardinality rule
    // plus a defining rule over that auxiliary.
    use potassco_io::error::Result;
    use potassco_io::sink::Sink;
    use potassco_io::types::{Atom, Literal, Weight, WeightLit};

    #[derive(Default)]
    struct Recorder {
        rules: Vec<(HeadType, Vec<Atom>, Vec<Literal>)>,
        sum_rules: Vec<(HeadType, Vec<Atom>, Weight, Vec<WeightLit>)>,
    }
    impl Sink for Recorder {
        fn rule(&mut self, head_type: HeadType, head: &[Atom], body: &[Literal]) -> Result<()> {
            self.rules.push((head_type, head.to_vec(), body.to_vec()));
            Ok(())
        }
        fn rule_sum(&mut self, head_type: HeadType, head: &[Atom], bound: Weight, body: &[WeightLit]) -> Result<()> {
            self.sum_rules.push((head_type, head.to_vec(), bound, body.to_vec()));
            Ok(())
        }
        fn minimize(&mut self, _: Weight, _: &[WeightLit]) -> Result<()> {
            Ok(())
        }
    }

    let mut out = SmodelsReader::new(smodels_bytes.as_slice(), SmodelsParserOptions::default()).unwrap();
    let mut rec = Recorder::default();
    out.parse(&mut rec).unwrap();

    assert_eq!(rec.sum_rules.len(), 1);
    let aux = rec.sum_rules[0].1[0];
    // Input atoms 1 and 2 pass through the converter's dense atom map and
    // come out the other side renumbered (atom 1 is reserved for the
    // false-atom substitution), so the head here is [2, 3], not [1, 2].
    assert_eq!(rec.rules, vec![(HeadType::Disjunctive, vec![2, 3], vec![aux as Literal])]);
}

#[test]
fn text_writer_renders_an_aspif_stream_with_bound_names() {
    let mut aspif_buf = Vec::new();
    {
        let mut w = AspifWriter::new(&mut aspif_buf);
        w.init_program(false).unwrap();
        let mut b = RuleBuilder::new();
        b.start(HeadType::Disjunctive).unwrap();
        b.add_head(1).unwrap();
        b.start_body().unwrap();
        b.add_goal(2).unwrap();
        b.end(Some(&mut w)).unwrap();
        use potassco_io::sink::Sink;
        w.output("a", &[1]).unwrap();
        w.output("b", &[2]).unwrap();
        w.end_step().unwrap();
    }

    let mut rendered = Vec::new();
    {
        let mut writer = text::Writer::new(&mut rendered, text::Options::default());
        let mut reader = Reader::new(aspif_buf.as_slice());
        reader.parse(&mut writer).unwrap();
    }
    assert_eq!(String::from_utf8(rendered).unwrap(), "a :- b.\n");
}
