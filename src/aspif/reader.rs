use std::io::BufRead;

use tracing::trace;

use super::{Tag, TheoryTag};
use crate::builder::RuleBuilder;
use crate::error::{Error, FormatError, FormatKind, Result};
use crate::sink::Sink;
use crate::token::Line;
use crate::types::{HeadType, HeuristicType, TruthValue};

/// Parses an ASPIF stream, dispatching parsed rules and directives to a [`Sink`].
///
/// Mirrors the source's `AspifInput`: a `RuleBuilder` stages each rule
/// before it's handed to the sink, so the sink never sees a partially
/// built rule.
pub struct Reader<R> {
    input: R,
    line_no: u64,
    buf: String,
}

impl<R: BufRead> Reader<R> {
    /// Wraps a buffered byte stream.
    pub fn new(input: R) -> Self {
        Self { input, line_no: 0, buf: String::new() }
    }

    fn next_line(&mut self) -> Result<Option<&str>> {
        self.buf.clear();
        let n = self.input.read_line(&mut self.buf).map_err(Error::Io)?;
        if n == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        if self.buf.ends_with('\n') {
            self.buf.pop();
            if self.buf.ends_with('\r') {
                self.buf.pop();
            }
        }
        Ok(Some(&self.buf))
    }

    fn require_line(&mut self) -> Result<&str> {
        let line_no = self.line_no + 1;
        self.next_line()?.ok_or_else(|| {
            FormatError::new(line_no, FormatKind::MissingTerminator("unexpected end of input".into())).into()
        })
    }

    /// Reads the `asp 1 0 <rev>[ incremental]` header, returning whether
    /// the `incremental` tag was present.
    fn read_header(&mut self) -> Result<bool> {
        let line_no = self.line_no + 1;
        let line = self.require_line()?.to_string();
        let mut parts = line.split(' ');
        let err = || -> Error { FormatError::new(line_no, FormatKind::UnexpectedToken("expected 'asp 1 0 <revision>'".into())).into() };
        if parts.next() != Some("asp") {
            return Err(err());
        }
        if parts.next() != Some("1") {
            return Err(err());
        }
        if parts.next() != Some("0") {
            return Err(err());
        }
        let _revision: u32 = parts.next().ok_or_else(err)?.parse().map_err(|_| err())?;
        Ok(matches!(parts.next(), Some("incremental")))
    }

    /// Parses the whole stream (header plus every incremental step),
    /// dispatching to `sink`.
    pub fn parse<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        let incremental = self.read_header()?;
        trace!(incremental, "parsed aspif header");
        sink.init_program(incremental)?;
        loop {
            self.parse_step(sink)?;
            if !incremental {
                break;
            }
            // An incremental stream keeps emitting steps until EOF.
            if self.next_nonempty_peek_is_eof()? {
                break;
            }
        }
        Ok(())
    }

    fn next_nonempty_peek_is_eof(&mut self) -> Result<bool> {
        Ok(self.input.fill_buf().map_err(Error::Io)?.is_empty())
    }

    fn parse_step<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        sink.begin_step()?;
        let mut rule = RuleBuilder::new();
        loop {
            let line_no = self.line_no + 1;
            let raw = self.require_line()?.to_string();
            let mut cur = Line::new(&raw, line_no);
            let tag = cur.i64()?;
            if tag == 0 {
                break;
            }
            let tag = Tag::from_i64(tag).ok_or_else(|| Error::from(FormatError::new(line_no, FormatKind::UnknownTag(tag))))?;
            self.parse_directive(tag, &mut cur, &mut rule, sink)?;
            rule.clear();
        }
        sink.end_step()
    }

    fn parse_directive<S: Sink + ?Sized>(
        &mut self,
        tag: Tag,
        cur: &mut Line<'_>,
        rule: &mut RuleBuilder,
        sink: &mut S,
    ) -> Result<()> {
        match tag {
            Tag::Rule => {
                let head_type = match cur.uint()? {
                    0 => HeadType::Disjunctive,
                    1 => HeadType::Choice,
                    v => return Err(FormatError::new(cur.line_no(), FormatKind::OutOfRange(format!("unknown head type {v}"))).into()),
                };
                rule.start(head_type)?;
                for a in cur.atoms()? {
                    rule.add_head(a)?;
                }
                let body_type = cur.uint()?;
                if body_type == 0 {
                    rule.start_body()?;
                    for l in cur.lits()? {
                        rule.add_goal(l)?;
                    }
                } else if body_type == 1 {
                    let bound = cur.weight(false)?;
                    rule.start_sum(bound)?;
                    for wl in cur.wlits(true)? {
                        rule.add_goal_weighted(wl)?;
                    }
                } else {
                    return Err(FormatError::new(cur.line_no(), FormatKind::OutOfRange(format!("unknown body type {body_type}"))).into());
                }
                rule.end(Some(sink))?;
            }
            Tag::Minimize => {
                let priority = cur.weight(false)?;
                rule.start_minimize(priority)?;
                for wl in cur.wlits(false)? {
                    rule.add_goal_weighted(wl)?;
                }
                rule.end(Some(sink))?;
            }
            Tag::Project => {
                let atoms = cur.atoms()?;
                sink.project(&atoms)?;
            }
            Tag::Output => {
                let text = cur.string()?.to_string();
                let cond = cur.lits()?;
                sink.output(&text, &cond)?;
            }
            Tag::External => {
                let atom = cur.atom_or_zero()?;
                let value = cur.uint()?;
                let value = TruthValue::from_code(value as i32)
                    .ok_or_else(|| Error::from(FormatError::new(cur.line_no(), FormatKind::OutOfRange(format!("unknown truth value {value}")))))?;
                if atom != 0 {
                    sink.external(atom, value)?;
                }
            }
            Tag::Assume => {
                let lits = cur.lits()?;
                sink.assume(&lits)?;
            }
            Tag::Heuristic => {
                let kind = cur.uint()?;
                let kind = HeuristicType::from_code(kind as i32).ok_or_else(|| {
                    Error::from(FormatError::new(cur.line_no(), FormatKind::OutOfRange(format!("unknown heuristic modifier {kind}"))))
                })?;
                let atom = cur.atom()?;
                let bias = cur.int()?;
                let priority = cur.uint()?;
                let cond = cur.lits()?;
                sink.heuristic(atom, kind, bias, priority, &cond)?;
            }
            Tag::Edge => {
                let s = cur.int()?;
                let t = cur.int()?;
                let cond = cur.lits()?;
                sink.acyc_edge(s, t, &cond)?;
            }
            Tag::Theory => self.parse_theory(cur, sink)?,
            Tag::Comment => return Ok(()),
        }
        if !cur.at_end() {
            return Err(FormatError::new(cur.line_no(), FormatKind::UnexpectedToken("trailing tokens on directive line".into())).into());
        }
        Ok(())
    }

    fn parse_theory<S: Sink + ?Sized>(&mut self, cur: &mut Line<'_>, sink: &mut S) -> Result<()> {
        let line_no = cur.line_no();
        let sub = cur.i64()?;
        let sub = TheoryTag::from_i64(sub).ok_or_else(|| Error::from(FormatError::new(line_no, FormatKind::UnknownTag(sub))))?;
        let id = cur.id()?;
        match sub {
            TheoryTag::Number => {
                let n = cur.int()?;
                sink.theory_number(id, n as i64)?;
            }
            TheoryTag::Symbol => {
                let s = cur.string()?.to_string();
                sink.theory_symbol(id, &s)?;
            }
            TheoryTag::Compound => {
                let base = cur.int()?;
                let args = cur.ids()?;
                sink.theory_compound(id, base, &args)?;
            }
            TheoryTag::Element => {
                let terms = cur.ids()?;
                let cond = cur.lits()?;
                sink.theory_element(id, &terms, &cond)?;
            }
            TheoryTag::Atom => {
                let term_id = cur.id()?;
                let elements = cur.ids()?;
                sink.theory_atom(id, term_id, &elements)?;
            }
            TheoryTag::AtomWithGuard => {
                let term_id = cur.id()?;
                let elements = cur.ids()?;
                let op = cur.id()?;
                let rhs = cur.id()?;
                sink.theory_atom_with_guard(id, term_id, &elements, op, rhs)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Atom, HeadType as HT, Literal, Weight, WeightLit};

    #[derive(Default)]
    struct Recorder {
        rules: Vec<(HT, Vec<Atom>, Vec<Literal>)>,
        outputs: Vec<(String, Vec<Literal>)>,
    }

    impl Sink for Recorder {
        fn rule(&mut self, head_type: HT, head: &[Atom], body: &[Literal]) -> Result<()> {
            self.rules.push((head_type, head.to_vec(), body.to_vec()));
            Ok(())
        }
        fn rule_sum(&mut self, _: HT, _: &[Atom], _: Weight, _: &[WeightLit]) -> Result<()> {
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

    fn parse(src: &str) -> Recorder {
        let mut reader = Reader::new(src.as_bytes());
        let mut rec = Recorder::default();
        reader.parse(&mut rec).unwrap();
        rec
    }

    #[test]
    fn parses_a_fact() {
        let rec = parse("asp 1 0 0\n1 0 1 1 0 0\n0\n");
        assert_eq!(rec.rules, vec![(HT::Disjunctive, vec![1], vec![])]);
    }

    #[test]
    fn parses_output_directive() {
        let rec = parse("asp 1 0 0\n4 1 a 1 1\n0\n");
        assert_eq!(rec.outputs, vec![("a".to_string(), vec![1])]);
    }

    #[test]
    fn rejects_unknown_tag() {
        let mut reader = Reader::new("asp 1 0 0\n99\n0\n".as_bytes());
        let mut rec = Recorder::default();
        assert!(reader.parse(&mut rec).is_err());
    }
}
