use std::collections::BTreeMap;
use std::io::Write;

use crate::error::{Error, Result};
use crate::sink::Sink;
use crate::types::{atom_of, Atom, HeadType, HeuristicType, Literal, TruthValue, Weight, WeightLit};

/// Options controlling how [`Writer`] renders a program that may use
/// constructs the plain smodels format can't natively express.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Emit rule types 90/91/92 for incremental steps and external atoms
    /// with a fixed truth value; without this, anything but a single,
    /// non-incremental step with `TruthValue::Free` externals is rejected.
    pub clasp_ext: bool,
    /// Atom substituted for the head of an integrity constraint (the
    /// format has no way to write an empty head). Must not otherwise
    /// occur as the head of any rule the writer is given.
    pub false_atom: Atom,
}

impl Options {
    /// Creates options with a given false-atom placeholder and clasp
    /// extensions disabled.
    pub fn new(false_atom: Atom) -> Self {
        Self { clasp_ext: false, false_atom }
    }

    /// Enables the clasp incremental/external extensions.
    pub fn enable_clasp_ext(mut self) -> Self {
        self.clasp_ext = true;
        self
    }
}

/// Splits a body into (atoms-in-wire-order, count-of-negatives): the
/// format always lists the negative literals of a body before the
/// positive ones, recovering the sign from position rather than a bit.
fn reorder_lits(lits: &[Literal]) -> (Vec<Atom>, usize) {
    let (mut neg, mut pos): (Vec<Atom>, Vec<Atom>) = (Vec::new(), Vec::new());
    for &l in lits {
        if l < 0 {
            neg.push(atom_of(l));
        } else {
            pos.push(atom_of(l));
        }
    }
    let neg_len = neg.len();
    neg.extend(pos);
    (neg, neg_len)
}

fn reorder_wlits(wlits: &[WeightLit]) -> (Vec<WeightLit>, usize) {
    let (mut neg, mut pos): (Vec<WeightLit>, Vec<WeightLit>) = (Vec::new(), Vec::new());
    for &wl in wlits {
        if wl.lit < 0 {
            neg.push(wl);
        } else {
            pos.push(wl);
        }
    }
    let neg_len = neg.len();
    neg.extend(pos);
    (neg, neg_len)
}

/// Writes a program to the legacy smodels format, buffering whatever the
/// format demands in a fixed section order (rules, symbol table, compute
/// statement, externals, model count) regardless of the order a [`Sink`]
/// caller presents them in.
pub struct Writer<W> {
    out: W,
    opts: Options,
    step_index: u32,
    max_atom: Atom,
    atom_names: std::collections::HashMap<Atom, String>,
    minimize_buf: BTreeMap<Weight, Vec<WeightLit>>,
    outputs: Vec<(String, Atom)>,
    assume_lits: Vec<Literal>,
    external_free: Vec<Atom>,
}

impl<W: Write> Writer<W> {
    /// Wraps a byte sink.
    pub fn new(out: W, opts: Options) -> Self {
        Self {
            out,
            max_atom: opts.false_atom,
            opts,
            step_index: 0,
            atom_names: Default::default(),
            minimize_buf: BTreeMap::new(),
            outputs: Vec::new(),
            assume_lits: Vec::new(),
            external_free: Vec::new(),
        }
    }

    fn note_atom(&mut self, a: Atom) {
        if a > self.max_atom {
            self.max_atom = a;
        }
    }

    fn fresh_atom(&mut self) -> Atom {
        self.max_atom += 1;
        self.max_atom
    }

    fn write_ints(&mut self, ints: &[i64]) -> Result<()> {
        let line = ints.iter().map(i64::to_string).collect::<Vec<_>>().join(" ");
        writeln!(self.out, "{line}").map_err(Error::Io)
    }

    fn write_rule_ints(&mut self, head: &[Atom], mut prefix: Vec<i64>, body: &[Literal]) -> Result<()> {
        for &a in head {
            self.note_atom(a);
        }
        for &l in body {
            self.note_atom(atom_of(l));
        }
        let (atoms, neg_len) = reorder_lits(body);
        prefix.push(atoms.len() as i64);
        prefix.push(neg_len as i64);
        prefix.extend(atoms.iter().map(|&a| a as i64));
        self.write_ints(&prefix)
    }
}

impl<W: Write> Sink for Writer<W> {
    fn init_program(&mut self, _incremental: bool) -> Result<()> {
        Ok(())
    }

    fn begin_step(&mut self) -> Result<()> {
        if self.step_index > 0 {
            if !self.opts.clasp_ext {
                return Err(Error::unsupported("incremental steps require the clasp extensions"));
            }
            self.write_ints(&[90, 0])?;
        }
        self.step_index += 1;
        self.outputs.clear();
        self.assume_lits.clear();
        self.external_free.clear();
        self.minimize_buf.clear();
        Ok(())
    }

    fn rule(&mut self, head_type: HeadType, head: &[Atom], body: &[Literal]) -> Result<()> {
        match head_type {
            HeadType::Disjunctive if head.is_empty() => self.write_rule_ints(&[], vec![1, self.opts.false_atom as i64], body),
            HeadType::Disjunctive if head.len() == 1 => self.write_rule_ints(head, vec![1, head[0] as i64], body),
            HeadType::Disjunctive => {
                if !self.opts.clasp_ext {
                    return Err(Error::unsupported("disjunctive heads require the clasp extensions"));
                }
                let mut prefix = vec![8, head.len() as i64];
                prefix.extend(head.iter().map(|&a| a as i64));
                self.write_rule_ints(head, prefix, body)
            }
            HeadType::Choice => {
                let mut prefix = vec![3, head.len() as i64];
                prefix.extend(head.iter().map(|&a| a as i64));
                self.write_rule_ints(head, prefix, body)
            }
        }
    }

    fn rule_sum(&mut self, head_type: HeadType, head: &[Atom], bound: Weight, body: &[WeightLit]) -> Result<()> {
        if head_type == HeadType::Choice {
            return Err(Error::unsupported("a choice head with a sum/count body has no native smodels encoding"));
        }
        let head_atom = match head.len() {
            0 => self.opts.false_atom,
            1 => head[0],
            _ => return Err(Error::unsupported("a sum/count body rule may have only one head atom")),
        };
        for &a in head {
            self.note_atom(a);
        }
        for wl in body {
            self.note_atom(atom_of(wl.lit));
        }
        let (ordered, neg_len) = reorder_wlits(body);
        let cardinality = ordered.iter().all(|wl| wl.weight == 1);
        if cardinality {
            let mut ints = vec![2, head_atom as i64, ordered.len() as i64, neg_len as i64, bound as i64];
            ints.extend(ordered.iter().map(|wl| atom_of(wl.lit) as i64));
            self.write_ints(&ints)
        } else {
            let mut ints = vec![5, head_atom as i64, bound as i64, ordered.len() as i64, neg_len as i64];
            ints.extend(ordered.iter().map(|wl| atom_of(wl.lit) as i64));
            ints.extend(ordered.iter().map(|wl| wl.weight as i64));
            self.write_ints(&ints)
        }
    }

    fn minimize(&mut self, priority: Weight, lits: &[WeightLit]) -> Result<()> {
        for wl in lits {
            self.note_atom(atom_of(wl.lit));
        }
        self.minimize_buf.entry(priority).or_default().extend_from_slice(lits);
        Ok(())
    }

    fn output(&mut self, text: &str, condition: &[Literal]) -> Result<()> {
        if condition.len() != 1 || condition[0] <= 0 {
            return Err(Error::unsupported("an output's condition must be a single positive literal in the smodels format"));
        }
        let atom = condition[0] as Atom;
        self.note_atom(atom);
        self.atom_names.insert(atom, text.to_string());
        self.outputs.push((text.to_string(), atom));
        Ok(())
    }

    fn external(&mut self, atom: Atom, value: TruthValue) -> Result<()> {
        self.note_atom(atom);
        match value {
            TruthValue::Free if !self.opts.clasp_ext => {
                self.external_free.push(atom);
                Ok(())
            }
            TruthValue::Release if !self.opts.clasp_ext => {
                Err(Error::unsupported("releasing an external atom requires the clasp extensions"))
            }
            _ if !self.opts.clasp_ext => Err(Error::unsupported("fixing an external atom's value requires the clasp extensions")),
            TruthValue::Release => self.write_ints(&[92, atom as i64]),
            _ => {
                let wire = (value.code() ^ 3) - 1;
                self.write_ints(&[91, atom as i64, wire as i64])
            }
        }
    }

    fn assume(&mut self, lits: &[Literal]) -> Result<()> {
        for &l in lits {
            self.note_atom(atom_of(l));
        }
        self.assume_lits.extend_from_slice(lits);
        Ok(())
    }

    fn heuristic(&mut self, atom: Atom, kind: HeuristicType, bias: i32, priority: u32, condition: &[Literal]) -> Result<()> {
        let fresh = self.fresh_atom();
        self.rule(HeadType::Disjunctive, &[fresh], condition)?;
        let target = match self.atom_names.get(&atom) {
            Some(name) => name.clone(),
            None => {
                let name = format!("_atom({atom})");
                self.atom_names.insert(atom, name.clone());
                self.outputs.push((name.clone(), atom));
                name
            }
        };
        let name = if priority == bias.unsigned_abs() {
            format!("_heuristic({target},{},{bias})", kind.name())
        } else {
            format!("_heuristic({target},{},{bias},{priority})", kind.name())
        };
        self.outputs.push((name, fresh));
        Ok(())
    }

    fn acyc_edge(&mut self, s: i32, t: i32, condition: &[Literal]) -> Result<()> {
        let fresh = self.fresh_atom();
        self.rule(HeadType::Disjunctive, &[fresh], condition)?;
        self.outputs.push((format!("_edge({s},{t})"), fresh));
        Ok(())
    }

    fn end_step(&mut self) -> Result<()> {
        let minimize_buf = std::mem::take(&mut self.minimize_buf);
        for (_, wlits) in minimize_buf {
            let (ordered, neg_len) = reorder_wlits(&wlits);
            let mut ints = vec![6i64, 0, ordered.len() as i64, neg_len as i64];
            ints.extend(ordered.iter().map(|wl| atom_of(wl.lit) as i64));
            ints.extend(ordered.iter().map(|wl| wl.weight as i64));
            self.write_ints(&ints)?;
        }
        self.write_ints(&[0])?;

        for (name, atom) in std::mem::take(&mut self.outputs) {
            writeln!(self.out, "{atom} {name}").map_err(Error::Io)?;
        }
        self.write_ints(&[0])?;

        let assumed = std::mem::take(&mut self.assume_lits);
        let bplus: Vec<i64> = assumed.iter().filter(|&&l| l > 0).map(|&l| l as i64).collect();
        let bminus: Vec<i64> = assumed.iter().filter(|&&l| l < 0).map(|&l| atom_of(l) as i64).collect();
        writeln!(self.out, "B+").map_err(Error::Io)?;
        for a in &bplus {
            self.write_ints(&[*a])?;
        }
        self.write_ints(&[0])?;
        writeln!(self.out, "B-").map_err(Error::Io)?;
        for a in &bminus {
            self.write_ints(&[*a])?;
        }
        self.write_ints(&[0])?;

        let externals = std::mem::take(&mut self.external_free);
        if !externals.is_empty() {
            writeln!(self.out, "E").map_err(Error::Io)?;
            for a in &externals {
                self.write_ints(&[*a as i64])?;
            }
            self.write_ints(&[0])?;
        }
        self.write_ints(&[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smodels::ParserOptions;
    use crate::smodels::Reader as SmodelsReader;

    #[derive(Default)]
    struct Recorder {
        rules: Vec<(HeadType, Vec<Atom>, Vec<Literal>)>,
        outputs: Vec<(String, Vec<Literal>)>,
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
    }

    #[test]
    fn writes_a_fact() {
        let mut buf = Vec::new();
        let mut w = Writer::new(&mut buf, Options::new(1000));
        w.init_program(false).unwrap();
        w.begin_step().unwrap();
        w.rule(HeadType::Disjunctive, &[1], &[]).unwrap();
        w.end_step().unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("1 1 0 0\n"));
    }

    #[test]
    fn round_trips_through_the_reader() {
        let mut buf = Vec::new();
        {
            let mut w = Writer::new(&mut buf, Options::new(1000));
            w.init_program(false).unwrap();
            w.begin_step().unwrap();
            w.rule(HeadType::Disjunctive, &[1], &[2, -3]).unwrap();
            w.output("p", &[1]).unwrap();
            w.end_step().unwrap();
        }
        let mut reader = SmodelsReader::new(buf.as_slice(), ParserOptions::default()).unwrap();
        let mut rec = Recorder::default();
        reader.parse(&mut rec).unwrap();
        // The format groups negative body literals before positive ones,
        // so the round trip preserves the body's literal set, not its order.
        assert_eq!(rec.rules[0], (HeadType::Disjunctive, vec![1], vec![-3, 2]));
        assert_eq!(rec.outputs, vec![("p".to_string(), vec![1])]);
    }
}
