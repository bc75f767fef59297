//! Bridges a producer that uses ASPIF's full vocabulary (disjunctive/choice
//! sum-body rules, heuristics, acyclicity edges) to a [`Sink`] that can
//! only represent what the plain smodels format can: maps input atoms to
//! a dense output-atom space, normalizes non-trivial aggregate heads into
//! an auxiliary atom plus a defining rule, substitutes a reserved false
//! atom for empty disjunctive heads, and — unless the inner sink
//! understands the clasp extensions — emulates `external`/`heuristic`/
//! `acyc_edge` the same way the smodels writer's name-based recovery
//! expects to find them.

use std::collections::{BTreeMap, HashMap, HashSet};

use itertools::Itertools;

use crate::error::{Error, Result};
use crate::sink::Sink;
use crate::types::{atom_of, Atom, HeadType, HeuristicType, Literal, TruthValue, Weight, WeightLit};

/// The output atom reserved for the head of an empty disjunctive rule;
/// never assigned to an input atom.
const FALSE_ATOM: Atom = 1;

/// Options controlling how much of the clasp vocabulary the inner sink
/// is trusted to understand directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// The inner sink natively supports `heuristic`/`acyc_edge`/`external`
    /// with a fixed value — pass them straight through instead of
    /// emulating them with synthesized atoms.
    pub ext: bool,
}

impl Options {
    /// Trusts the inner sink to understand the clasp extensions directly.
    pub fn trust_extensions(mut self) -> Self {
        self.ext = true;
        self
    }
}

/// Normalizes a program on the way into a [`Sink`] with a smaller
/// vocabulary than ASPIF's.
pub struct Converter<S> {
    inner: S,
    opts: Options,
    /// Dense input-atom -> output-atom map, populated lazily. Output ids
    /// start at 2; `1` is reserved for [`FALSE_ATOM`].
    atom_map: HashMap<Atom, Atom>,
    next_atom: Atom,
    /// Output atoms that have appeared in some rule's head. Used to skip
    /// externals that are already defined, and to decide whether a
    /// heuristic's target atom is ever otherwise referenced.
    head_atoms: HashSet<Atom>,
    /// Names bound to output atoms via `output`, or synthesized for an
    /// unnamed heuristic target.
    atom_names: HashMap<Atom, String>,
    minimize_buf: BTreeMap<Weight, Vec<WeightLit>>,
    pending_externals: Vec<(Atom, TruthValue)>,
    pending_heuristics: Vec<(Atom, HeuristicType, i32, u32, Atom)>,
    pending_outputs: Vec<(Atom, String)>,
}

impl<S: Sink> Converter<S> {
    /// Wraps `inner`.
    pub fn new(inner: S, opts: Options) -> Self {
        Self {
            inner,
            opts,
            atom_map: HashMap::new(),
            next_atom: FALSE_ATOM + 1,
            head_atoms: HashSet::new(),
            atom_names: HashMap::new(),
            minimize_buf: BTreeMap::new(),
            pending_externals: Vec::new(),
            pending_heuristics: Vec::new(),
            pending_outputs: Vec::new(),
        }
    }

    /// Unwraps back to the inner sink.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn fresh_atom(&mut self) -> Atom {
        let out = self.next_atom;
        self.next_atom += 1;
        out
    }

    fn map_atom(&mut self, a: Atom) -> Atom {
        if let Some(&out) = self.atom_map.get(&a) {
            return out;
        }
        let out = self.fresh_atom();
        self.atom_map.insert(a, out);
        out
    }

    fn map_head_atom(&mut self, a: Atom) -> Atom {
        let out = self.map_atom(a);
        self.head_atoms.insert(out);
        out
    }

    /// Maps a head, substituting [`FALSE_ATOM`] for an empty disjunctive
    /// head. A non-disjunctive empty head (e.g. an empty choice) stays
    /// empty — the caller drops the rule entirely rather than render it.
    fn map_head(&mut self, head_type: HeadType, head: &[Atom]) -> Vec<Atom> {
        let mut mapped: Vec<Atom> = head.iter().map(|&a| self.map_head_atom(a)).collect();
        if mapped.is_empty() && head_type == HeadType::Disjunctive {
            mapped.push(FALSE_ATOM);
        }
        mapped
    }

    fn map_lit(&mut self, l: Literal) -> Literal {
        let out = self.map_atom(atom_of(l)) as Literal;
        if l < 0 {
            -out
        } else {
            out
        }
    }

    fn map_lits(&mut self, lits: &[Literal]) -> Vec<Literal> {
        lits.iter().map(|&l| self.map_lit(l)).collect()
    }

    fn map_wlit(&mut self, wl: WeightLit) -> WeightLit {
        WeightLit::new(self.map_lit(wl.lit), wl.weight)
    }

    fn map_wlits(&mut self, lits: &[WeightLit]) -> Vec<WeightLit> {
        lits.iter().map(|&wl| self.map_wlit(wl)).collect()
    }

    /// Creates (or reuses) a single atom standing for `condition`: if the
    /// condition is already exactly one positive, unnamed output atom,
    /// that atom is reused directly; otherwise a fresh auxiliary atom
    /// defined by `aux :- condition.` is synthesized.
    fn make_named_atom(&mut self, condition: &[Literal]) -> Result<Atom> {
        if let [lit] = condition {
            if *lit > 0 {
                let atom = self.map_atom(atom_of(*lit));
                if !self.atom_names.contains_key(&atom) {
                    return Ok(atom);
                }
            }
        }
        let aux = self.fresh_atom();
        let mapped_body = self.map_lits(condition);
        self.inner.rule(HeadType::Disjunctive, &[aux], &mapped_body)?;
        self.head_atoms.insert(aux);
        Ok(aux)
    }

    /// Re-expresses a sum-body rule with a non-trivial head (more than
    /// one head atom, or a choice head) as: one auxiliary atom that
    /// holds exactly when the aggregate does, then a normal-body rule
    /// per original head atom conditioned on that auxiliary atom. `head`
    /// and `body` are already mapped to output atoms.
    fn split_aggregate_head(&mut self, head_type: HeadType, head: &[Atom], bound: Weight, body: &[WeightLit]) -> Result<()> {
        let aux = self.fresh_atom();
        self.inner.rule_sum(HeadType::Disjunctive, &[aux], bound, body)?;
        self.head_atoms.insert(aux);
        self.inner.rule(head_type, head, &[aux as Literal])
    }

    fn flush_minimize(&mut self) -> Result<()> {
        for (priority, lits) in std::mem::take(&mut self.minimize_buf) {
            self.inner.minimize(priority, &lits)?;
        }
        Ok(())
    }

    fn flush_externals(&mut self) -> Result<()> {
        let mut choice_head = Vec::new();
        for (atom, value) in std::mem::take(&mut self.pending_externals) {
            if self.head_atoms.contains(&atom) {
                continue;
            }
            match value {
                TruthValue::Free => choice_head.push(atom),
                TruthValue::True => self.inner.rule(HeadType::Disjunctive, &[atom], &[])?,
                TruthValue::False | TruthValue::Release => {}
            }
        }
        if !choice_head.is_empty() {
            self.inner.rule(HeadType::Choice, &choice_head, &[])?;
        }
        Ok(())
    }

    fn flush_heuristics(&mut self) -> Result<()> {
        for (raw_atom, kind, bias, priority, cond_atom) in std::mem::take(&mut self.pending_heuristics) {
            let Some(&out_atom) = self.atom_map.get(&raw_atom) else {
                continue;
            };
            let name = match self.atom_names.get(&out_atom) {
                Some(name) => name.clone(),
                None => {
                    let name = format!("_atom({out_atom})");
                    self.atom_names.insert(out_atom, name.clone());
                    self.pending_outputs.push((out_atom, name.clone()));
                    name
                }
            };
            let text = if priority == bias.unsigned_abs() {
                format!("_heuristic({name},{},{bias})", kind.name())
            } else {
                format!("_heuristic({name},{},{bias},{priority})", kind.name())
            };
            self.inner.output(&text, &[cond_atom as Literal])?;
        }
        Ok(())
    }

    fn flush_outputs(&mut self) -> Result<()> {
        for (atom, name) in std::mem::take(&mut self.pending_outputs).into_iter().sorted_by_key(|(atom, _)| *atom) {
            self.inner.output(&name, &[atom as Literal])?;
        }
        Ok(())
    }
}

impl<S: Sink> Sink for Converter<S> {
    fn init_program(&mut self, incremental: bool) -> Result<()> {
        self.inner.init_program(incremental)
    }

    fn begin_step(&mut self) -> Result<()> {
        self.inner.begin_step()
    }

    fn rule(&mut self, head_type: HeadType, head: &[Atom], body: &[Literal]) -> Result<()> {
        if head.is_empty() && head_type != HeadType::Disjunctive {
            return Ok(());
        }
        let mapped_head = self.map_head(head_type, head);
        let mapped_body = self.map_lits(body);
        self.inner.rule(head_type, &mapped_head, &mapped_body)
    }

    fn rule_sum(&mut self, head_type: HeadType, head: &[Atom], bound: Weight, body: &[WeightLit]) -> Result<()> {
        if head.is_empty() && head_type != HeadType::Disjunctive {
            return Ok(());
        }
        if let Some(wl) = body.iter().find(|wl| wl.weight < 0) {
            return Err(Error::unsupported(format!("negative-weight body literal {} not supported outside a minimize statement", wl.lit)));
        }
        let mapped_head = self.map_head(head_type, head);
        let mapped_body = self.map_wlits(body);
        if head_type == HeadType::Disjunctive && mapped_head.len() <= 1 {
            self.inner.rule_sum(head_type, &mapped_head, bound, &mapped_body)
        } else {
            self.split_aggregate_head(head_type, &mapped_head, bound, &mapped_body)
        }
    }

    fn minimize(&mut self, priority: Weight, lits: &[WeightLit]) -> Result<()> {
        let mapped = lits.iter().map(|&wl| {
            let wl = self.map_wlit(wl);
            if wl.weight < 0 {
                WeightLit::new(-wl.lit, -wl.weight)
            } else {
                wl
            }
        });
        self.minimize_buf.entry(priority).or_default().extend(mapped);
        Ok(())
    }

    fn project(&mut self, atoms: &[Atom]) -> Result<()> {
        let mapped: Vec<Atom> = atoms.iter().map(|&a| self.map_atom(a)).collect();
        self.inner.project(&mapped)
    }

    fn output(&mut self, text: &str, condition: &[Literal]) -> Result<()> {
        let atom = self.make_named_atom(condition)?;
        self.atom_names.insert(atom, text.to_string());
        self.pending_outputs.push((atom, text.to_string()));
        Ok(())
    }

    fn external(&mut self, atom: Atom, value: TruthValue) -> Result<()> {
        let out_atom = self.map_atom(atom);
        if self.opts.ext {
            return self.inner.external(out_atom, value);
        }
        self.pending_externals.push((out_atom, value));
        Ok(())
    }

    fn assume(&mut self, lits: &[Literal]) -> Result<()> {
        let mapped = self.map_lits(lits);
        self.inner.assume(&mapped)
    }

    fn heuristic(&mut self, atom: Atom, kind: HeuristicType, bias: i32, priority: u32, condition: &[Literal]) -> Result<()> {
        if self.opts.ext {
            let out_atom = self.map_atom(atom);
            let mapped_cond = self.map_lits(condition);
            return self.inner.heuristic(out_atom, kind, bias, priority, &mapped_cond);
        }
        let cond_atom = self.make_named_atom(condition)?;
        self.pending_heuristics.push((atom, kind, bias, priority, cond_atom));
        Ok(())
    }

    fn acyc_edge(&mut self, s: i32, t: i32, condition: &[Literal]) -> Result<()> {
        if self.opts.ext {
            let mapped_cond = self.map_lits(condition);
            return self.inner.acyc_edge(s, t, &mapped_cond);
        }
        let cond_atom = self.make_named_atom(condition)?;
        self.atom_names.insert(cond_atom, format!("_edge({s},{t})"));
        self.pending_outputs.push((cond_atom, format!("_edge({s},{t})")));
        Ok(())
    }

    fn theory_number(&mut self, term_id: u32, number: i64) -> Result<()> {
        self.inner.theory_number(term_id, number)
    }

    fn theory_symbol(&mut self, term_id: u32, symbol: &str) -> Result<()> {
        self.inner.theory_symbol(term_id, symbol)
    }

    fn theory_compound(&mut self, term_id: u32, base: i32, args: &[u32]) -> Result<()> {
        self.inner.theory_compound(term_id, base, args)
    }

    fn theory_element(&mut self, element_id: u32, terms: &[u32], condition: &[Literal]) -> Result<()> {
        self.inner.theory_element(element_id, terms, condition)
    }

    fn theory_atom(&mut self, atom_or_zero: u32, term_id: u32, elements: &[u32]) -> Result<()> {
        self.inner.theory_atom(atom_or_zero, term_id, elements)
    }

    fn theory_atom_with_guard(&mut self, atom_or_zero: u32, term_id: u32, elements: &[u32], op: u32, rhs: u32) -> Result<()> {
        self.inner.theory_atom_with_guard(atom_or_zero, term_id, elements, op, rhs)
    }

    fn end_step(&mut self) -> Result<()> {
        self.flush_minimize()?;
        self.flush_externals()?;
        self.flush_heuristics()?;
        self.flush_outputs()?;
        self.inner.assume(&[-(FALSE_ATOM as Literal)])?;
        self.inner.end_step()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Weight;

    #[derive(Default)]
    struct Recorder {
        rules: Vec<(HeadType, Vec<Atom>, Vec<Literal>)>,
        sum_rules: Vec<(HeadType, Vec<Atom>, Weight, Vec<WeightLit>)>,
        minimizes: Vec<(Weight, Vec<WeightLit>)>,
        outputs: Vec<(String, Vec<Literal>)>,
        assumed: Vec<Literal>,
        externals: Vec<(Atom, TruthValue)>,
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
        fn minimize(&mut self, priority: Weight, lits: &[WeightLit]) -> Result<()> {
            self.minimizes.push((priority, lits.to_vec()));
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
    }

    #[test]
    fn maps_input_atoms_to_a_dense_output_space() {
        let mut c = Converter::new(Recorder::default(), Options::default());
        c.rule(HeadType::Disjunctive, &[100], &[200, -300]).unwrap();
        assert_eq!(c.inner.rules, vec![(HeadType::Disjunctive, vec![2], vec![3, -4])]);
    }

    #[test]
    fn reuses_the_same_output_atom_for_a_repeated_input_atom() {
        let mut c = Converter::new(Recorder::default(), Options::default());
        c.rule(HeadType::Disjunctive, &[100], &[]).unwrap();
        c.rule(HeadType::Disjunctive, &[200], &[100]).unwrap();
        assert_eq!(c.inner.rules, vec![(HeadType::Disjunctive, vec![2], vec![]), (HeadType::Disjunctive, vec![3], vec![2])]);
    }

    #[test]
    fn empty_disjunctive_head_becomes_the_false_atom() {
        let mut c = Converter::new(Recorder::default(), Options::default());
        c.rule(HeadType::Disjunctive, &[], &[100]).unwrap();
        assert_eq!(c.inner.rules, vec![(HeadType::Disjunctive, vec![FALSE_ATOM], vec![2])]);
    }

    #[test]
    fn empty_choice_head_is_dropped() {
        let mut c = Converter::new(Recorder::default(), Options::default());
        c.rule(HeadType::Choice, &[], &[100]).unwrap();
        assert!(c.inner.rules.is_empty());
    }

    #[test]
    fn passes_trivial_sum_head_through() {
        let mut c = Converter::new(Recorder::default(), Options::default());
        c.rule_sum(HeadType::Disjunctive, &[1], 2, &[WeightLit::new(2, 1)]).unwrap();
        assert_eq!(c.inner.sum_rules, vec![(HeadType::Disjunctive, vec![2], 2, vec![WeightLit::new(3, 1)])]);
    }

    #[test]
    fn splits_multi_atom_sum_head() {
        let mut c = Converter::new(Recorder::default(), Options::default());
        c.rule_sum(HeadType::Disjunctive, &[1, 2], 1, &[WeightLit::new(3, 1)]).unwrap();
        assert_eq!(c.inner.sum_rules.len(), 1);
        let aux = c.inner.sum_rules[0].1[0];
        assert_eq!(c.inner.rules, vec![(HeadType::Disjunctive, vec![2, 3], vec![aux as Literal])]);
    }

    #[test]
    fn merges_minimize_calls_by_priority() {
        let mut c = Converter::new(Recorder::default(), Options::default());
        c.minimize(0, &[WeightLit::new(1, 1)]).unwrap();
        c.minimize(0, &[WeightLit::new(2, 1)]).unwrap();
        c.end_step().unwrap();
        assert_eq!(c.inner.minimizes, vec![(0, vec![WeightLit::new(2, 1), WeightLit::new(3, 1)])]);
    }

    #[test]
    fn flips_negative_weight_minimize_literals() {
        let mut c = Converter::new(Recorder::default(), Options::default());
        c.minimize(1, &[WeightLit::new(-2, -3), WeightLit::new(4, 1)]).unwrap();
        c.end_step().unwrap();
        assert_eq!(c.inner.minimizes, vec![(1, vec![WeightLit::new(2, 3), WeightLit::new(3, 1)])]);
    }

    #[test]
    fn emulates_heuristic_without_ext_using_an_atom_fallback_name() {
        let mut c = Converter::new(Recorder::default(), Options::default());
        c.rule(HeadType::Disjunctive, &[5], &[]).unwrap();
        c.heuristic(5, HeuristicType::Sign, -1, 1, &[7]).unwrap();
        c.end_step().unwrap();
        assert_eq!(c.inner.outputs[0], ("_heuristic(_atom(2),sign,-1)".to_string(), vec![3]));
        assert_eq!(c.inner.outputs[1], ("_atom(2)".to_string(), vec![2]));
    }

    #[test]
    fn heuristic_for_an_atom_never_otherwise_mapped_is_dropped() {
        let mut c = Converter::new(Recorder::default(), Options::default());
        c.heuristic(5, HeuristicType::Sign, -1, 1, &[7]).unwrap();
        c.end_step().unwrap();
        assert!(c.inner.outputs.is_empty());
    }

    #[test]
    fn free_externals_become_a_choice_rule() {
        let mut c = Converter::new(Recorder::default(), Options::default());
        c.external(9, TruthValue::Free).unwrap();
        c.end_step().unwrap();
        assert_eq!(c.inner.rules, vec![(HeadType::Choice, vec![2], vec![])]);
    }

    #[test]
    fn true_externals_become_facts() {
        let mut c = Converter::new(Recorder::default(), Options::default());
        c.external(9, TruthValue::True).unwrap();
        c.end_step().unwrap();
        assert_eq!(c.inner.rules, vec![(HeadType::Disjunctive, vec![2], vec![])]);
    }

    #[test]
    fn false_externals_are_elided() {
        let mut c = Converter::new(Recorder::default(), Options::default());
        c.external(9, TruthValue::False).unwrap();
        c.end_step().unwrap();
        assert!(c.inner.rules.is_empty());
    }

    #[test]
    fn an_external_already_headed_is_skipped() {
        let mut c = Converter::new(Recorder::default(), Options::default());
        c.rule(HeadType::Disjunctive, &[9], &[]).unwrap();
        c.external(9, TruthValue::Free).unwrap();
        c.end_step().unwrap();
        assert_eq!(c.inner.rules, vec![(HeadType::Disjunctive, vec![2], vec![])]);
    }

    #[test]
    fn clasp_ext_passes_external_through_directly() {
        let mut c = Converter::new(Recorder::default(), Options::default().trust_extensions());
        c.external(9, TruthValue::Free).unwrap();
        c.end_step().unwrap();
        assert!(c.inner.rules.is_empty());
        assert_eq!(c.inner.externals, vec![(2, TruthValue::Free)]);
    }

    #[test]
    fn end_step_asserts_the_negated_false_atom() {
        let mut c = Converter::new(Recorder::default(), Options::default());
        c.end_step().unwrap();
        assert_eq!(c.inner.assumed, vec![-(FALSE_ATOM as Literal)]);
    }
}
