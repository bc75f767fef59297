use std::io::Read;

use tracing::{debug, trace};

use super::cursor::Cursor;
use super::names::{match_edge, match_heuristic};
use super::RuleTag;
use crate::builder::RuleBuilder;
use crate::error::{Error, FormatError, FormatKind, Result};
use crate::sink::Sink;
use crate::types::{Atom, HeadType, HeuristicType, Literal, TruthValue, Weight, WeightLit};

/// Options controlling how [`Reader`] interprets the clasp extensions to
/// the plain smodels format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Accept rule types 90/91/92 (incremental marker, external assign/release).
    pub clasp_ext: bool,
    /// Recover `acyc_edge` directives from `_edge(s,t)`/`_acyc_k_s_t` atom names.
    pub convert_edges: bool,
    /// Recover `heuristic` directives from `_heuristic(atom,type,bias[,prio])` atom names.
    pub convert_heuristic: bool,
    /// Drop atoms that were converted to edge/heuristic directives from `output`.
    pub filter: bool,
}

impl Options {
    /// Enables the clasp incremental/external extensions.
    pub fn enable_clasp_ext(mut self) -> Self {
        self.clasp_ext = true;
        self
    }
    /// Enables `_edge`/`_acyc_` recovery.
    pub fn convert_edges(mut self) -> Self {
        self.convert_edges = true;
        self
    }
    /// Enables `_heuristic` recovery.
    pub fn convert_heuristic(mut self) -> Self {
        self.convert_heuristic = true;
        self
    }
    /// Drops converted atoms from `output`.
    pub fn drop_converted(mut self) -> Self {
        self.filter = true;
        self
    }
}

/// Parses an (extended) smodels stream.
pub struct Reader {
    cursor: Cursor,
    opts: Options,
    /// Atoms seen in the symbol table so far this step, for
    /// [`Options::convert_heuristic`]'s forward references.
    known_atoms: std::collections::HashMap<String, Atom>,
    /// Node name -> synthesized node id, for [`Options::convert_edges`].
    nodes: std::collections::HashMap<String, i32>,
}

struct DeferredHeuristic {
    name: String,
    kind: HeuristicType,
    bias: i32,
    prio: u32,
    cond: Literal,
}

impl Reader {
    /// Reads the whole input stream up front and prepares a parser over it.
    pub fn new(mut input: impl Read, opts: Options) -> Result<Self> {
        let mut text = Vec::new();
        input.read_to_end(&mut text).map_err(Error::Io)?;
        Ok(Self { cursor: Cursor::new(text), opts, known_atoms: Default::default(), nodes: Default::default() })
    }

    fn peek_incremental(&mut self) -> Result<bool> {
        match self.cursor.peek_nonws() {
            Some(b) if b.is_ascii_digit() => Ok(b == b'9' && self.opts.clasp_ext),
            Some(_) => Err(FormatError::new(1, FormatKind::UnexpectedToken("expected a rule type".into())).into()),
            None => Err(FormatError::new(1, FormatKind::MissingTerminator("empty input".into())).into()),
        }
    }

    /// Parses the whole stream (every step block back to back), dispatching to `sink`.
    pub fn parse<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        let incremental = self.peek_incremental()?;
        trace!(incremental, "parsed smodels header");
        sink.init_program(incremental)?;
        loop {
            self.parse_step(sink)?;
            if self.cursor.at_eof() {
                break;
            }
        }
        Ok(())
    }

    fn parse_step<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        sink.begin_step()?;
        self.read_rules(sink)?;
        self.read_symbols(sink)?;
        let mut assumed = self.read_compute("B+", true)?;
        assumed.extend(self.read_compute("B-", false)?);
        if !assumed.is_empty() {
            sink.assume(&assumed)?;
        }
        self.read_extra(sink)?;
        sink.end_step()
    }

    fn match_body(&mut self) -> Result<Vec<Literal>> {
        let len = self.cursor.uint()?;
        let mut neg = self.cursor.uint()?;
        let mut lits = Vec::with_capacity(len as usize);
        for _ in 0..len {
            let mut p = self.cursor.atom()? as Literal;
            if neg > 0 {
                p = -p;
                neg -= 1;
            }
            lits.push(p);
        }
        Ok(lits)
    }

    fn match_sum(&mut self, weights: bool) -> Result<(Weight, Vec<WeightLit>)> {
        let (bound, len, mut neg) = if weights {
            let bound = self.cursor.uint()?;
            let len = self.cursor.uint()?;
            let neg = self.cursor.uint()?;
            (bound, len, neg)
        } else {
            let len = self.cursor.uint()?;
            let neg = self.cursor.uint()?;
            let bound = self.cursor.uint()?;
            (bound, len, neg)
        };
        let mut lits = Vec::with_capacity(len as usize);
        for _ in 0..len {
            let mut p = self.cursor.atom()? as Literal;
            if neg > 0 {
                p = -p;
                neg -= 1;
            }
            lits.push(WeightLit::new(p, 1));
        }
        if weights {
            for wl in &mut lits {
                wl.weight = self.cursor.uint()? as Weight;
            }
        }
        Ok((bound as Weight, lits))
    }

    fn read_rules<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        let mut rule = RuleBuilder::new();
        let mut min_prio: Weight = 0;
        loop {
            let line_no = self.cursor.line_no();
            let rt = self.cursor.uint()?;
            if rt == 0 {
                break;
            }
            let tag = RuleTag::from_u32(rt).ok_or_else(|| Error::from(FormatError::new(line_no, FormatKind::UnknownTag(rt as i64))))?;
            rule.clear();
            match tag {
                RuleTag::End => unreachable!(),
                RuleTag::Choice | RuleTag::Disjunctive => {
                    rule.start(if tag == RuleTag::Choice { HeadType::Choice } else { HeadType::Disjunctive })?;
                    let n = self.cursor.uint()?;
                    for _ in 0..n {
                        rule.add_head(self.cursor.atom()?)?;
                    }
                    for l in self.match_body()? {
                        rule.add_goal(l)?;
                    }
                    rule.end(Some(sink))?;
                }
                RuleTag::Basic => {
                    rule.start(HeadType::Disjunctive)?;
                    rule.add_head(self.cursor.atom()?)?;
                    for l in self.match_body()? {
                        rule.add_goal(l)?;
                    }
                    rule.end(Some(sink))?;
                }
                RuleTag::Cardinality | RuleTag::Weight => {
                    rule.start(HeadType::Disjunctive)?;
                    rule.add_head(self.cursor.atom()?)?;
                    let (bound, wlits) = self.match_sum(tag == RuleTag::Weight)?;
                    rule.start_sum(bound)?;
                    for wl in wlits {
                        rule.add_goal_weighted(wl)?;
                    }
                    rule.end(Some(sink))?;
                }
                RuleTag::Optimize => {
                    rule.start_minimize(min_prio)?;
                    min_prio += 1;
                    let (_, wlits) = self.match_sum(true)?;
                    for wl in wlits {
                        rule.add_goal_weighted(wl)?;
                    }
                    rule.end(Some(sink))?;
                }
                RuleTag::ClaspIncrement => {
                    if !self.opts.clasp_ext {
                        return Err(FormatError::new(line_no, FormatKind::UnknownTag(90)).into());
                    }
                    if self.cursor.uint()? != 0 {
                        return Err(FormatError::new(line_no, FormatKind::OutOfRange("clasp increment payload must be 0".into())).into());
                    }
                }
                RuleTag::ClaspAssignExternal => {
                    if !self.opts.clasp_ext {
                        return Err(FormatError::new(line_no, FormatKind::UnknownTag(91)).into());
                    }
                    let atom = self.cursor.atom()?;
                    let w = self.cursor.uint()?;
                    if w > 2 {
                        return Err(FormatError::new(line_no, FormatKind::OutOfRange(format!("0..2 expected, got {w}"))).into());
                    }
                    let code = (w ^ 3) - 1;
                    let value = TruthValue::from_code(code as i32).expect("w in 0..=2 maps to a valid truth value code");
                    sink.external(atom, value)?;
                }
                RuleTag::ClaspReleaseExternal => {
                    if !self.opts.clasp_ext {
                        return Err(FormatError::new(line_no, FormatKind::UnknownTag(92)).into());
                    }
                    let atom = self.cursor.atom()?;
                    sink.external(atom, TruthValue::Release)?;
                }
            }
        }
        Ok(())
    }

    fn read_symbols<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        self.known_atoms.clear();
        let mut deferred_heuristics = Vec::new();
        loop {
            let atom = self.cursor.atom_or_zero_peekable()?;
            let Some(atom) = atom else { break };
            let name = self.cursor.rest_of_line()?;
            let mut filtered = false;

            if self.opts.convert_edges {
                if let Some((n0, n1)) = match_edge(&name) {
                    let s = self.node_id(n0);
                    let t = self.node_id(n1);
                    sink.acyc_edge(s, t, &[atom as Literal])?;
                    filtered = self.opts.filter;
                }
            }
            if !filtered && self.opts.convert_heuristic {
                if let Some((target, kind, bias, prio)) = match_heuristic(&name) {
                    if let Some(&target_atom) = self.known_atoms.get(target) {
                        sink.heuristic(target_atom, kind, bias, prio, &[atom as Literal])?;
                    } else {
                        deferred_heuristics.push(DeferredHeuristic {
                            name: target.to_string(),
                            kind,
                            bias,
                            prio,
                            cond: atom as Literal,
                        });
                    }
                    filtered = self.opts.filter;
                }
            }
            if !filtered {
                sink.output(&name, &[atom as Literal])?;
            }
            self.known_atoms.insert(name, atom);
        }
        for def in deferred_heuristics {
            if let Some(&target_atom) = self.known_atoms.get(&def.name) {
                sink.heuristic(target_atom, def.kind, def.bias, def.prio, &[def.cond])?;
            } else {
                debug!(atom = %def.name, "heuristic names an atom never defined in the symbol table");
            }
        }
        Ok(())
    }

    fn node_id(&mut self, name: &str) -> i32 {
        if let Some(&id) = self.nodes.get(name) {
            return id;
        }
        let id = self.nodes.len() as i32;
        self.nodes.insert(name.to_string(), id);
        id
    }

    /// Reads one `B+`/`B-` compute section, returning its atoms as
    /// literals fixed to the given truth value (a compute statement is an
    /// assumption about the step's only answer set, not a rule).
    fn read_compute(&mut self, marker: &str, positive: bool) -> Result<Vec<Literal>> {
        self.cursor.expect(marker)?;
        let mut lits = Vec::new();
        loop {
            let Some(atom) = self.cursor.atom_or_zero_peekable()? else { break };
            lits.push(if positive { atom as Literal } else { -(atom as Literal) });
        }
        Ok(lits)
    }

    fn read_extra<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        if self.cursor.try_expect("E")? {
            loop {
                let Some(atom) = self.cursor.atom_or_zero_peekable()? else { break };
                sink.external(atom, TruthValue::Free)?;
            }
        }
        // number of models; present but unused by the sink contract.
        let _ = self.cursor.uint()?;
        Ok(())
    }
}
