//! Ground-text pretty printer: a [`Sink`] that renders a parsed program as
//! readable ASP syntax instead of re-encoding it on some wire format.
//!
//! Rendering can't happen directly inside each `Sink` method, because a
//! rule's head atoms are frequently named by an `output` call that hasn't
//! been seen yet (nothing in the contract requires directives to arrive in
//! any particular order within a step). So this writer stages every
//! directive of the current step in [`Directive`] form and only turns it
//! into text at `end_step`, once every `output` binding for the step is
//! known.

use std::collections::{BTreeMap, HashMap};
use std::io::Write as _;

use crate::error::{Error, Result};
use crate::sink::Sink;
use crate::theory::{ElementId, Term, TermId, TheoryStore, TupleType};
use crate::types::{Atom, Body, HeadType, HeuristicType, Literal, TruthValue, Weight, WeightLit};

/// Options controlling [`Writer`]'s output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Prefix each step's rendered rules with a `% #program base.` /
    /// `% #program step(n).` comment, matching gringo's incremental output.
    pub incremental_headers: bool,
}

impl Options {
    /// Enables the `% #program ...` step headers.
    pub fn with_incremental_headers(mut self) -> Self {
        self.incremental_headers = true;
        self
    }
}

#[derive(Debug, Clone)]
enum Directive {
    Rule { head_type: HeadType, head: Vec<Atom>, body: Body },
    Project(Vec<Atom>),
    External(Atom, TruthValue),
    Assume(Vec<Literal>),
    Heuristic { atom: Atom, kind: HeuristicType, bias: i32, priority: u32, condition: Vec<Literal> },
    AcycEdge { s: i32, t: i32, condition: Vec<Literal> },
    TheoryAtom { atom: TermAtomId },
    Show { text: String, condition: Vec<Literal> },
}

/// Index into the step's [`TheoryStore`] at the time the atom was added, so
/// rendering can look it up again once the step is complete.
#[derive(Debug, Clone, Copy)]
struct TermAtomId(usize);

/// Renders a parsed or converted program as plain ASP text.
pub struct Writer<W> {
    out: W,
    opts: Options,
    step_index: u32,
    atom_names: HashMap<Atom, String>,
    directives: Vec<Directive>,
    minimize_buf: BTreeMap<Weight, Vec<WeightLit>>,
    theory: TheoryStore,
    /// Condition literals for theory elements, keyed by element id. The
    /// wire contract hands us a literal span per element, while
    /// [`TheoryStore`] only tracks an opaque condition id (set later via
    /// `set_condition` in the source this is grounded on); we keep our own
    /// side table instead of routing literals through that id.
    element_conditions: HashMap<ElementId, Vec<Literal>>,
}

impl<W: std::io::Write> Writer<W> {
    /// Wraps an output stream.
    pub fn new(out: W, opts: Options) -> Self {
        Self {
            out,
            opts,
            step_index: 0,
            atom_names: HashMap::new(),
            directives: Vec::new(),
            minimize_buf: BTreeMap::new(),
            theory: TheoryStore::new(),
            element_conditions: HashMap::new(),
        }
    }

    fn atom_name(&self, atom: Atom) -> String {
        self.atom_names.get(&atom).cloned().unwrap_or_else(|| format!("x_{atom}"))
    }

    fn render_lit(&self, lit: Literal) -> String {
        if lit < 0 {
            format!("not {}", self.atom_name(lit.unsigned_abs()))
        } else {
            self.atom_name(lit as Atom)
        }
    }

    fn render_lits(&self, lits: &[Literal]) -> String {
        lits.iter().map(|l| self.render_lit(*l)).collect::<Vec<_>>().join(",")
    }

    fn render_body(&self, body: &Body) -> String {
        match body {
            Body::Normal(lits) => self.render_lits(lits),
            Body::Sum { bound, lits } => {
                let inner = lits.iter().map(|wl| format!("{}:{}", wl.weight, self.render_lit(wl.lit))).collect::<Vec<_>>().join(";");
                format!("{bound} #sum{{{inner}}}")
            }
        }
    }

    fn render_rule(&self, head_type: &HeadType, head: &[Atom], body: &Body) -> String {
        let head_text = match head_type {
            HeadType::Disjunctive => head.iter().map(|&a| self.atom_name(a)).collect::<Vec<_>>().join("|"),
            HeadType::Choice => format!("{{{}}}", head.iter().map(|&a| self.atom_name(a)).collect::<Vec<_>>().join(";")),
        };
        let body_text = self.render_body(body);
        match (head_text.is_empty(), body_text.is_empty()) {
            (true, true) => ":-.".to_string(),
            (true, false) => format!(":- {body_text}."),
            (false, true) => format!("{head_text}."),
            (false, false) => format!("{head_text} :- {body_text}."),
        }
    }

    fn render_minimize(&self, priority: Weight, lits: &[WeightLit]) -> String {
        let inner = lits.iter().map(|wl| format!("{}@{priority},{}", wl.weight, self.render_lit(wl.lit))).collect::<Vec<_>>().join(";");
        format!("#minimize{{{inner}}}.")
    }

    fn render_term(&self, id: TermId) -> String {
        match self.theory.get_term(id) {
            Ok(Term::Number(n)) => n.to_string(),
            Ok(Term::Symbol(s)) => s.clone(),
            Ok(Term::Compound { base, args }) => {
                let inner = args.iter().map(|&a| self.render_term(a)).collect::<Vec<_>>().join(",");
                if let Some(tt) = TupleType::from_base(*base) {
                    let (open, close) = tt.parens();
                    format!("{open}{inner}{close}")
                } else {
                    format!("{}({inner})", self.render_term(*base as TermId))
                }
            }
            Err(_) => format!("#t{id}"),
        }
    }

    fn render_element(&self, id: ElementId) -> Result<String> {
        let element = self.theory.get_element(id)?;
        let terms = element.terms.iter().map(|&t| self.render_term(t)).collect::<Vec<_>>().join(",");
        match self.element_conditions.get(&id) {
            Some(cond) if !cond.is_empty() => Ok(format!("{terms}:{}", self.render_lits(cond))),
            _ => Ok(terms),
        }
    }

    fn render_theory_atom_at(&self, idx: usize) -> Result<String> {
        let atom = &self.theory.atoms()[idx];
        let name = self.render_term(atom.term);
        let mut elements = Vec::with_capacity(atom.elements.len());
        for &e in &atom.elements {
            elements.push(self.render_element(e)?);
        }
        let body = format!("&{name}{{{}}}", elements.join(";"));
        Ok(match atom.guard {
            Some((op, rhs)) => format!("{body} {} {}", self.render_term(op), self.render_term(rhs)),
            None => body,
        })
    }

    fn render_heuristic(&self, atom: Atom, kind: HeuristicType, bias: i32, priority: u32, condition: &[Literal]) -> String {
        let cond = self.render_lits(condition);
        let head = format!("#heuristic {}", self.atom_name(atom));
        let guarded = if cond.is_empty() { head } else { format!("{head} : {cond}") };
        format!("{guarded}. [{bias}@{priority}, {kind}]")
    }

    fn render_directive(&self, d: &Directive) -> Result<String> {
        Ok(match d {
            Directive::Rule { head_type, head, body } => self.render_rule(head_type, head, body),
            Directive::Project(atoms) => format!("#project {{{}}}.", atoms.iter().map(|&a| self.atom_name(a)).collect::<Vec<_>>().join(",")),
            Directive::External(atom, value) => {
                let name = self.atom_name(*atom);
                match value {
                    TruthValue::Release => format!("#external {name}. [release]"),
                    TruthValue::Free => format!("#external {name}. [free]"),
                    TruthValue::True => format!("#external {name}. [true]"),
                    TruthValue::False => format!("#external {name}. [false]"),
                }
            }
            Directive::Assume(lits) => format!("% assume {{{}}}.", self.render_lits(lits)),
            Directive::Heuristic { atom, kind, bias, priority, condition } => self.render_heuristic(*atom, *kind, *bias, *priority, condition),
            Directive::AcycEdge { s, t, condition } => {
                let cond = self.render_lits(condition);
                if cond.is_empty() {
                    format!("#edge({s},{t}).")
                } else {
                    format!("#edge({s},{t}) : {cond}.")
                }
            }
            Directive::TheoryAtom { atom } => format!("{}.", self.render_theory_atom_at(atom.0)?),
            Directive::Show { text, condition } => {
                if condition.is_empty() {
                    format!("#show {text}.")
                } else {
                    format!("#show {text} : {}.", self.render_lits(condition))
                }
            }
        })
    }

    fn flush_step(&mut self) -> Result<()> {
        if self.opts.incremental_headers {
            let header = if self.step_index == 0 { "% #program base.".to_string() } else { format!("% #program step({}).", self.step_index) };
            writeln!(self.out, "{header}").map_err(Error::Io)?;
        }
        for (priority, lits) in std::mem::take(&mut self.minimize_buf) {
            writeln!(self.out, "{}", self.render_minimize(priority, &lits)).map_err(Error::Io)?;
        }
        for d in std::mem::take(&mut self.directives) {
            let line = self.render_directive(&d)?;
            writeln!(self.out, "{line}").map_err(Error::Io)?;
        }
        self.theory.update();
        self.element_conditions.clear();
        self.step_index += 1;
        Ok(())
    }
}

impl<W: std::io::Write> Sink for Writer<W> {
    fn begin_step(&mut self) -> Result<()> {
        self.directives.clear();
        self.minimize_buf.clear();
        Ok(())
    }

    fn rule(&mut self, head_type: HeadType, head: &[Atom], body: &[Literal]) -> Result<()> {
        self.directives.push(Directive::Rule { head_type, head: head.to_vec(), body: Body::Normal(body.to_vec()) });
        Ok(())
    }

    fn rule_sum(&mut self, head_type: HeadType, head: &[Atom], bound: Weight, body: &[WeightLit]) -> Result<()> {
        self.directives.push(Directive::Rule { head_type, head: head.to_vec(), body: Body::Sum { bound, lits: body.to_vec() } });
        Ok(())
    }

    fn minimize(&mut self, priority: Weight, lits: &[WeightLit]) -> Result<()> {
        self.minimize_buf.entry(priority).or_default().extend_from_slice(lits);
        Ok(())
    }

    fn project(&mut self, atoms: &[Atom]) -> Result<()> {
        self.directives.push(Directive::Project(atoms.to_vec()));
        Ok(())
    }

    fn output(&mut self, text: &str, condition: &[Literal]) -> Result<()> {
        let looks_like_atom_name = matches!(text.as_bytes().first(), Some(b'_') | Some(b'a'..=b'z'));
        if let [lit] = condition {
            if *lit > 0 && looks_like_atom_name {
                self.atom_names.insert(*lit as Atom, text.to_string());
                return Ok(());
            }
        }
        self.directives.push(Directive::Show { text: text.to_string(), condition: condition.to_vec() });
        Ok(())
    }

    fn external(&mut self, atom: Atom, value: TruthValue) -> Result<()> {
        self.directives.push(Directive::External(atom, value));
        Ok(())
    }

    fn assume(&mut self, lits: &[Literal]) -> Result<()> {
        self.directives.push(Directive::Assume(lits.to_vec()));
        Ok(())
    }

    fn heuristic(&mut self, atom: Atom, kind: HeuristicType, bias: i32, priority: u32, condition: &[Literal]) -> Result<()> {
        self.directives.push(Directive::Heuristic { atom, kind, bias, priority, condition: condition.to_vec() });
        Ok(())
    }

    fn acyc_edge(&mut self, s: i32, t: i32, condition: &[Literal]) -> Result<()> {
        self.directives.push(Directive::AcycEdge { s, t, condition: condition.to_vec() });
        Ok(())
    }

    fn theory_number(&mut self, term_id: u32, number: i64) -> Result<()> {
        self.theory.add_number(term_id, number)
    }

    fn theory_symbol(&mut self, term_id: u32, symbol: &str) -> Result<()> {
        self.theory.add_symbol(term_id, symbol)
    }

    fn theory_compound(&mut self, term_id: u32, base: i32, args: &[u32]) -> Result<()> {
        self.theory.add_compound(term_id, base, args.to_vec())
    }

    fn theory_element(&mut self, element_id: u32, terms: &[u32], condition: &[Literal]) -> Result<()> {
        self.theory.add_element(element_id, terms.to_vec(), 0)?;
        self.element_conditions.insert(element_id, condition.to_vec());
        Ok(())
    }

    fn theory_atom(&mut self, atom_or_zero: u32, term_id: u32, elements: &[u32]) -> Result<()> {
        self.theory.add_atom(atom_or_zero, term_id, elements.to_vec());
        self.directives.push(Directive::TheoryAtom { atom: TermAtomId(self.theory.num_atoms() - 1) });
        Ok(())
    }

    fn theory_atom_with_guard(&mut self, atom_or_zero: u32, term_id: u32, elements: &[u32], op: u32, rhs: u32) -> Result<()> {
        self.theory.add_atom_with_guard(atom_or_zero, term_id, elements.to_vec(), op, rhs);
        self.directives.push(Directive::TheoryAtom { atom: TermAtomId(self.theory.num_atoms() - 1) });
        Ok(())
    }

    fn end_step(&mut self) -> Result<()> {
        self.flush_step()
    }
}
