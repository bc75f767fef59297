//! [`TheoryStore`] (C2): a content-addressed store of theory terms,
//! elements, and atoms, with a per-step visibility window.
//!
//! Terms, elements and atoms are each kept in one id-indexed array; a
//! "mark" recorded at the last [`TheoryStore::update`] splits each array
//! into the entries visible from a previous step and the ones added in
//! the current step. A id whose slot is `None` does not exist yet (or
//! was removed by [`TheoryStore::remove_term`]); ids are otherwise dense
//! from `0`, matching the wire format's own term/element/atom numbering.

use crate::error::{Error, Result};
use crate::types::Atom;

/// A term id.
pub type TermId = u32;
/// An element id.
pub type ElementId = u32;

/// Sentinel passed to [`TheoryStore::add_element`] to mean "the
/// condition will be supplied later via [`TheoryStore::set_condition`]".
pub const COND_DEFERRED: u32 = u32::MAX;

/// The tuple bracket form of a compound term whose `base` is negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleType {
    /// `[...]`
    Bracket,
    /// `{...}`
    Brace,
    /// `(...)`
    Paren,
}

impl TupleType {
    /// Decodes the negative `base` tag used on the wire (`-3, -2, -1`).
    pub const fn from_base(base: i32) -> Option<Self> {
        match base {
            -3 => Some(Self::Bracket),
            -2 => Some(Self::Brace),
            -1 => Some(Self::Paren),
            _ => None,
        }
    }

    /// The negative `base` tag used on the wire.
    pub const fn base(self) -> i32 {
        match self {
            Self::Bracket => -3,
            Self::Brace => -2,
            Self::Paren => -1,
        }
    }

    /// The surrounding characters used when rendering a tuple term as text.
    pub const fn parens(self) -> (char, char) {
        match self {
            Self::Bracket => ('[', ']'),
            Self::Brace => ('{', '}'),
            Self::Paren => ('(', ')'),
        }
    }
}

/// A theory term: a number, a symbol, or a compound (function or tuple).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// An integer constant.
    Number(i64),
    /// A symbolic name.
    Symbol(String),
    /// A function application or tuple. `base >= 0` names a function
    /// (by referencing the [`TermId`] of its symbolic name); `base < 0`
    /// is one of the three [`TupleType`] tags.
    Compound {
        /// Function term id, or a negative [`TupleType`] tag.
        base: i32,
        /// Argument term ids.
        args: Vec<TermId>,
    },
}

impl Term {
    /// Whether this compound term is a function application.
    pub fn is_function(&self) -> bool {
        matches!(self, Term::Compound { base, .. } if *base >= 0)
    }

    /// Whether this compound term is a tuple.
    pub fn is_tuple(&self) -> bool {
        matches!(self, Term::Compound { base, .. } if *base < 0)
    }
}

/// A basic building block for a theory atom: an ordered list of term ids
/// plus an optional condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Term ids making up this element.
    pub terms: Vec<TermId>,
    /// `0` if unconditional, [`COND_DEFERRED`] if not yet set, otherwise
    /// an opaque condition id assigned by the caller (e.g. a literal-set
    /// id maintained alongside this store).
    pub condition: u32,
}

/// A theory atom: an optional program atom, a naming term, a body of
/// elements, and an optional guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TheoryAtom {
    /// The associated program atom, or `0` if this atom originated from
    /// a bare theory directive.
    pub atom: Atom,
    /// The term naming this atom (e.g. the `diff` in `&diff{...}`).
    pub term: TermId,
    /// Element ids making up this atom's body.
    pub elements: Vec<ElementId>,
    /// `(operator term id, right-hand-side term id)`, if guarded.
    pub guard: Option<(TermId, TermId)>,
}

#[derive(Default)]
struct Marks {
    term: usize,
    element: usize,
    atom: usize,
}

/// Visitation scope: whether to include entities kept from a previous
/// step or only ones added in the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitMode {
    /// Visit every referenced entity.
    All,
    /// Visit only entities added since the last [`TheoryStore::update`].
    Current,
}

/// Receives callbacks from [`TheoryStore::accept`]. Implementations that
/// want to recurse into an entity's children call the matching
/// `accept_*` method on the store themselves (the store does not
/// recurse automatically, mirroring the source's visitor contract).
pub trait TheoryVisitor {
    /// Visits a term.
    fn visit_term(&mut self, store: &TheoryStore, id: TermId, term: &Term);
    /// Visits an element.
    fn visit_element(&mut self, store: &TheoryStore, id: ElementId, element: &Element);
    /// Visits a theory atom.
    fn visit_atom(&mut self, store: &TheoryStore, atom: &TheoryAtom);
}

/// Content-addressed store of theory terms, elements, and atoms.
#[derive(Debug, Clone, Default)]
pub struct TheoryStore {
    terms: Vec<Option<Term>>,
    elements: Vec<Option<Element>>,
    atoms: Vec<TheoryAtom>,
    marks: Marks,
}

impl TheoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a term with the given id exists.
    pub fn has_term(&self, id: TermId) -> bool {
        (id as usize) < self.terms.len() && self.terms[id as usize].is_some()
    }

    /// Whether the given term was added since the last [`Self::update`].
    pub fn is_new_term(&self, id: TermId) -> bool {
        self.has_term(id) && id as usize >= self.marks.term
    }

    /// Whether an element with the given id exists.
    pub fn has_element(&self, id: ElementId) -> bool {
        (id as usize) < self.elements.len() && self.elements[id as usize].is_some()
    }

    /// Whether the given element was added since the last [`Self::update`].
    pub fn is_new_element(&self, id: ElementId) -> bool {
        self.has_element(id) && id as usize >= self.marks.element
    }

    /// Returns the term with the given id.
    pub fn get_term(&self, id: TermId) -> Result<&Term> {
        self.terms
            .get(id as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::precondition(format!("unknown theory term '{id}'")))
    }

    /// Returns the element with the given id.
    pub fn get_element(&self, id: ElementId) -> Result<&Element> {
        self.elements
            .get(id as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::precondition(format!("unknown theory element '{id}'")))
    }

    /// The number of currently stored theory atoms.
    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// All stored theory atoms.
    pub fn atoms(&self) -> &[TheoryAtom] {
        &self.atoms
    }

    /// Theory atoms added since the last [`Self::update`].
    pub fn current_atoms(&self) -> &[TheoryAtom] {
        &self.atoms[self.marks.atom.min(self.atoms.len())..]
    }

    fn set_term(&mut self, id: TermId, term: Term) -> Result<()> {
        let idx = id as usize;
        if self.has_term(id) {
            if self.is_new_term(id) {
                return Err(Error::precondition(format!("redefinition of theory term '{id}'")));
            }
            self.terms[idx] = None;
        } else if idx >= self.terms.len() {
            self.terms.resize(idx + 1, None);
        }
        self.terms[idx] = Some(term);
        Ok(())
    }

    /// Adds a number term.
    pub fn add_number(&mut self, id: TermId, number: i64) -> Result<()> {
        self.set_term(id, Term::Number(number))
    }

    /// Adds a symbolic term.
    pub fn add_symbol(&mut self, id: TermId, symbol: impl Into<String>) -> Result<()> {
        self.set_term(id, Term::Symbol(symbol.into()))
    }

    /// Adds a compound (function or tuple) term.
    pub fn add_compound(&mut self, id: TermId, base: i32, args: Vec<TermId>) -> Result<()> {
        self.set_term(id, Term::Compound { base, args })
    }

    /// Removes the term with the given id, if any. It is the caller's
    /// responsibility to ensure no element or compound still references
    /// it. The id may be reused by a later [`Self::add_number`]/etc.
    pub fn remove_term(&mut self, id: TermId) {
        if self.has_term(id) {
            self.terms[id as usize] = None;
        }
    }

    /// Adds a new theory element. Fails on redefinition within the
    /// current step; redefining an element kept from a previous step
    /// (not yet touched by `update()`) is allowed, matching the source.
    pub fn add_element(&mut self, id: ElementId, terms: Vec<TermId>, condition: u32) -> Result<()> {
        let idx = id as usize;
        if self.has_element(id) {
            if self.is_new_element(id) {
                return Err(Error::precondition(format!("redefinition of theory element '{id}'")));
            }
        } else if idx >= self.elements.len() {
            self.elements.resize(idx + 1, None);
        }
        self.elements[idx] = Some(Element { terms, condition });
        Ok(())
    }

    /// Sets the condition of a previously deferred element.
    pub fn set_condition(&mut self, id: ElementId, new_condition: u32) -> Result<()> {
        let element = self.elements.get_mut(id as usize).and_then(Option::as_mut).ok_or_else(|| {
            Error::precondition(format!("unknown theory element '{id}'"))
        })?;
        if element.condition != COND_DEFERRED {
            return Err(Error::precondition(format!("condition of element '{id}' is not deferred")));
        }
        element.condition = new_condition;
        Ok(())
    }

    /// Appends a new (possibly directive-only) theory atom.
    pub fn add_atom(&mut self, atom_or_zero: Atom, term: TermId, elements: Vec<ElementId>) {
        self.atoms.push(TheoryAtom { atom: atom_or_zero, term, elements, guard: None });
    }

    /// Appends a new theory atom with a guard and right-hand-side term.
    pub fn add_atom_with_guard(&mut self, atom_or_zero: Atom, term: TermId, elements: Vec<ElementId>, op: TermId, rhs: TermId) {
        self.atoms.push(TheoryAtom { atom: atom_or_zero, term, elements, guard: Some((op, rhs)) });
    }

    /// Snapshots the current array sizes; everything added after this
    /// call counts as "current" until the next `update()`.
    pub fn update(&mut self) {
        self.marks = Marks { term: self.terms.len(), element: self.elements.len(), atom: self.atoms.len() };
    }

    /// Frees everything and reverts to an empty store.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Removes every atom added since the last `update()` for which
    /// `predicate` returns `true`. Atoms with id `0` (directive-only)
    /// are never removed, matching the source.
    pub fn filter(&mut self, predicate: impl Fn(&TheoryAtom) -> bool) {
        let mark = self.marks.atom.min(self.atoms.len());
        let (kept, candidates) = self.atoms.split_at(mark);
        let mut kept = kept.to_vec();
        kept.extend(candidates.iter().filter(|a| a.atom == 0 || !predicate(a)).cloned());
        self.atoms = kept;
    }

    /// Calls `visitor.visit_atom` for every theory atom in scope.
    pub fn accept(&self, visitor: &mut dyn TheoryVisitor, mode: VisitMode) {
        let atoms: &[TheoryAtom] = match mode {
            VisitMode::All => &self.atoms,
            VisitMode::Current => self.current_atoms(),
        };
        for atom in atoms {
            visitor.visit_atom(self, atom);
        }
    }

    fn should_visit_term(&self, mode: VisitMode, id: TermId) -> bool {
        mode == VisitMode::All || self.is_new_term(id)
    }

    fn should_visit_element(&self, mode: VisitMode, id: ElementId) -> bool {
        mode == VisitMode::All || self.is_new_element(id)
    }

    /// Visits the arguments of a compound term (and, if it is a
    /// function, its base/name term).
    pub fn accept_term(&self, term: &Term, visitor: &mut dyn TheoryVisitor, mode: VisitMode) -> Result<()> {
        if let Term::Compound { base, args } = term {
            for &id in args {
                if self.should_visit_term(mode, id) {
                    visitor.visit_term(self, id, self.get_term(id)?);
                }
            }
            if *base >= 0 {
                let fun = *base as TermId;
                if self.should_visit_term(mode, fun) {
                    visitor.visit_term(self, fun, self.get_term(fun)?);
                }
            }
        }
        Ok(())
    }

    /// Visits the terms of an element.
    pub fn accept_element(&self, element: &Element, visitor: &mut dyn TheoryVisitor, mode: VisitMode) -> Result<()> {
        for &id in &element.terms {
            if self.should_visit_term(mode, id) {
                visitor.visit_term(self, id, self.get_term(id)?);
            }
        }
        Ok(())
    }

    /// Visits the term, elements, and guard of a theory atom.
    pub fn accept_atom(&self, atom: &TheoryAtom, visitor: &mut dyn TheoryVisitor, mode: VisitMode) -> Result<()> {
        if self.should_visit_term(mode, atom.term) {
            visitor.visit_term(self, atom.term, self.get_term(atom.term)?);
        }
        for &id in &atom.elements {
            if self.should_visit_element(mode, id) {
                visitor.visit_element(self, id, self.get_element(id)?);
            }
        }
        if let Some((op, rhs)) = atom.guard {
            if self.should_visit_term(mode, op) {
                visitor.visit_term(self, op, self.get_term(op)?);
            }
            if self.should_visit_term(mode, rhs) {
                visitor.visit_term(self, rhs, self.get_term(rhs)?);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_fetch_terms() {
        let mut store = TheoryStore::new();
        store.add_number(0, 42).unwrap();
        store.add_symbol(1, "end").unwrap();
        store.add_compound(2, 1, vec![0]).unwrap();
        assert_eq!(store.get_term(0).unwrap(), &Term::Number(42));
        assert!(store.get_term(2).unwrap().is_function());
    }

    #[test]
    fn redefinition_within_step_fails() {
        let mut store = TheoryStore::new();
        store.add_number(0, 1).unwrap();
        assert!(store.add_number(0, 2).is_err());
    }

    #[test]
    fn redefinition_across_step_boundary_ok() {
        let mut store = TheoryStore::new();
        store.add_number(0, 1).unwrap();
        store.update();
        store.add_number(0, 2).unwrap();
        assert_eq!(store.get_term(0).unwrap(), &Term::Number(2));
    }

    #[test]
    fn deferred_condition_round_trip() {
        let mut store = TheoryStore::new();
        store.add_element(0, vec![], COND_DEFERRED).unwrap();
        store.set_condition(0, 5).unwrap();
        assert_eq!(store.get_element(0).unwrap().condition, 5);
        assert!(store.set_condition(0, 6).is_err());
    }

    #[test]
    fn filter_removes_only_current_atoms_with_id() {
        let mut store = TheoryStore::new();
        store.add_atom(0, 0, vec![]);
        store.add_atom(1, 0, vec![]);
        store.update();
        store.add_atom(2, 0, vec![]);
        store.add_atom(0, 0, vec![]);
        store.filter(|a| a.atom == 2);
        assert_eq!(store.num_atoms(), 3);
        assert!(store.atoms().iter().all(|a| a.atom != 2));
    }

    struct Collector {
        terms: Vec<TermId>,
    }

    impl TheoryVisitor for Collector {
        fn visit_term(&mut self, _store: &TheoryStore, id: TermId, _term: &Term) {
            self.terms.push(id);
        }
        fn visit_element(&mut self, store: &TheoryStore, _id: ElementId, element: &Element) {
            store.accept_element(element, self, VisitMode::All).unwrap();
        }
        fn visit_atom(&mut self, store: &TheoryStore, atom: &TheoryAtom) {
            store.accept_atom(atom, self, VisitMode::All).unwrap();
        }
    }

    #[test]
    fn accept_visits_term_then_elements_then_guard() {
        let mut store = TheoryStore::new();
        store.add_symbol(0, "end").unwrap();
        store.add_number(1, 1).unwrap();
        store.add_element(0, vec![1], 0).unwrap();
        store.add_number(2, 200).unwrap();
        store.add_number(3, 0).unwrap(); // operator placeholder term
        store.add_atom_with_guard(1, 0, vec![0], 3, 2);

        let mut collector = Collector { terms: vec![] };
        store.accept(&mut collector, VisitMode::All);
        assert_eq!(collector.terms, vec![0, 1, 3, 2]);
    }
}
