//! The [`Sink`] trait: the single contract every consumer of a parsed
//! program implements (writers, the converter, a user-supplied visitor).
//!
//! Parsers ([`crate::aspif::Reader`], [`crate::smodels::Reader`]) are
//! *sources*; they call methods on a `Sink` in the order fixed by
//! spec.md §5: `init_program` once, then alternating
//! `begin_step`/`end_step` pairs, with rules/directives in any order
//! within a step except where a sink itself imposes a stricter order
//! (the smodels writer requires rules before outputs).

use crate::error::{Error, Result};
use crate::types::{Atom, HeadType, HeuristicType, Literal, TruthValue, Weight, WeightLit};

/// Sink for a parsed or converted logic program.
///
/// `rule`, `minimize` and `end_step` (via `begin_step`/`init_program`)
/// are the only methods a sink must support unconditionally; every
/// "advanced" method has a default implementation that returns
/// [`Error::Unsupported`], matching `AbstractProgram`'s default-throw
/// behavior in the source so that strict sinks (the smodels writer) opt
/// out cleanly without boilerplate overrides.
pub trait Sink {
    /// Called once to prepare for a new logic program.
    fn init_program(&mut self, _incremental: bool) -> Result<()> {
        Ok(())
    }

    /// Called once before the rules/directives of a step are added.
    fn begin_step(&mut self) -> Result<()> {
        Ok(())
    }

    /// Adds a normal-body rule.
    fn rule(&mut self, head_type: HeadType, head: &[Atom], body: &[Literal]) -> Result<()>;

    /// Adds a sum-body rule.
    fn rule_sum(&mut self, head_type: HeadType, head: &[Atom], bound: Weight, body: &[WeightLit]) -> Result<()>;

    /// Adds a minimize statement.
    fn minimize(&mut self, priority: Weight, lits: &[WeightLit]) -> Result<()>;

    /// Marks the given atoms as projection atoms.
    fn project(&mut self, _atoms: &[Atom]) -> Result<()> {
        Err(Error::unsupported("project"))
    }

    /// Outputs `text` whenever `condition` holds in a stable model.
    fn output(&mut self, _text: &str, _condition: &[Literal]) -> Result<()> {
        Err(Error::unsupported("output"))
    }

    /// Marks `atom` external with the given truth value (or releases it
    /// back to a regular atom if `value` is [`TruthValue::Release`]).
    fn external(&mut self, _atom: Atom, _value: TruthValue) -> Result<()> {
        Err(Error::unsupported("external"))
    }

    /// Assumes the given literals true during solving.
    fn assume(&mut self, _lits: &[Literal]) -> Result<()> {
        Err(Error::unsupported("assume"))
    }

    /// Applies a heuristic modification to `atom`, active when `condition` holds.
    fn heuristic(
        &mut self,
        _atom: Atom,
        _kind: HeuristicType,
        _bias: i32,
        _priority: u32,
        _condition: &[Literal],
    ) -> Result<()> {
        Err(Error::unsupported("heuristic"))
    }

    /// Asserts a conditional acyclicity edge `(s, t)`.
    fn acyc_edge(&mut self, _s: i32, _t: i32, _condition: &[Literal]) -> Result<()> {
        Err(Error::unsupported("acyc_edge"))
    }

    /// Adds a theory number term.
    fn theory_number(&mut self, _term_id: u32, _number: i64) -> Result<()> {
        Err(Error::unsupported("theory_number"))
    }

    /// Adds a theory symbolic term.
    fn theory_symbol(&mut self, _term_id: u32, _symbol: &str) -> Result<()> {
        Err(Error::unsupported("theory_symbol"))
    }

    /// Adds a theory compound (function or tuple) term.
    fn theory_compound(&mut self, _term_id: u32, _base: i32, _args: &[u32]) -> Result<()> {
        Err(Error::unsupported("theory_compound"))
    }

    /// Adds a theory atom element.
    fn theory_element(&mut self, _element_id: u32, _terms: &[u32], _condition: &[Literal]) -> Result<()> {
        Err(Error::unsupported("theory_element"))
    }

    /// Adds a theory atom over the given elements.
    fn theory_atom(&mut self, _atom_or_zero: u32, _term_id: u32, _elements: &[u32]) -> Result<()> {
        Err(Error::unsupported("theory_atom"))
    }

    /// Adds a theory atom with a guard and right-hand side term.
    fn theory_atom_with_guard(
        &mut self,
        _atom_or_zero: u32,
        _term_id: u32,
        _elements: &[u32],
        _op: u32,
        _rhs: u32,
    ) -> Result<()> {
        Err(Error::unsupported("theory_atom_with_guard"))
    }

    /// Called once after all rules/directives of the current step were added.
    fn end_step(&mut self) -> Result<()> {
        Ok(())
    }
}
