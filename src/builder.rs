//! [`RuleBuilder`]: the scratch aggregator used to stage a single rule or
//! minimize statement before emitting it to a [`Sink`].
//!
//! The source stages a rule inside one contiguous byte buffer with
//! packed range headers; we use two small `Vec`-backed slots instead (a
//! "straightforward variant is equally valid" per the design notes) and
//! reproduce the same state machine: each slot is *empty*, *open*, or
//! *frozen*, and the builder as a whole is *frozen* only once both slots
//! are frozen.

use crate::error::{Error, Result};
use crate::sink::Sink;
use crate::types::{Atom, BodyType, HeadType, Literal, Weight, WeightLit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SlotState {
    #[default]
    Empty,
    Open,
    Frozen,
}

#[derive(Debug, Clone, Default)]
struct HeadSlot {
    state: SlotState,
    is_minimize: bool,
    head_type: HeadType,
    atoms: Vec<Atom>,
}

#[derive(Debug, Clone, Default)]
struct BodySlot {
    state: SlotState,
    body_type: BodyType,
    /// Lower bound for `Sum`/`Count` bodies, or priority while staging a
    /// minimize statement. Meaningless while `body_type == Normal`.
    bound: Weight,
    lits: Vec<Literal>,
    wlits: Vec<WeightLit>,
}

/// Staging buffer for one rule or minimize statement.
///
/// Typical use: a handful of `start*`/`add*` calls followed by [`RuleBuilder::end`],
/// which freezes the active rule and, if given a sink, dispatches it.
/// Calling any `start*` method again after a frozen builder implicitly
/// clears it and begins a new rule.
#[derive(Debug, Clone, Default)]
pub struct RuleBuilder {
    head: HeadSlot,
    body: BodySlot,
}

impl RuleBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether both the head and body slots are frozen (i.e. `end()` was
    /// called and no `start*`/`clear*` has run since).
    pub fn frozen(&self) -> bool {
        self.head.state == SlotState::Frozen && self.body.state == SlotState::Frozen
    }

    /// Discards the active rule and unfreezes the builder.
    pub fn clear(&mut self) -> &mut Self {
        self.head = HeadSlot::default();
        self.body = BodySlot::default();
        self
    }

    /// Discards the head of the active rule but keeps the body, if any.
    pub fn clear_head(&mut self) -> &mut Self {
        self.head = HeadSlot::default();
        self
    }

    /// Discards the body of the active rule but keeps the head, if any.
    pub fn clear_body(&mut self) -> &mut Self {
        self.body = BodySlot::default();
        self
    }

    fn clear_if_frozen(&mut self) {
        if self.frozen() {
            self.clear();
        }
    }

    /// Starts definition of the rule's head.
    ///
    /// Fails if the head is already open or frozen while the builder as
    /// a whole isn't frozen (a double-start without an intervening
    /// `end()`/`clear()`).
    pub fn start(&mut self, head_type: HeadType) -> Result<&mut Self> {
        if !self.frozen() && self.head.state != SlotState::Empty {
            return Err(Error::precondition("head already started"));
        }
        self.clear_if_frozen();
        if self.body.state == SlotState::Open {
            self.body.state = SlotState::Frozen;
        }
        self.head = HeadSlot {
            state: SlotState::Open,
            is_minimize: false,
            head_type,
            atoms: Vec::new(),
        };
        Ok(self)
    }

    /// Starts definition of a conjunction to be used as the rule's body.
    pub fn start_body(&mut self) -> Result<&mut Self> {
        if !self.frozen() && self.body.state != SlotState::Empty {
            return Err(Error::precondition("body already started"));
        }
        self.clear_if_frozen();
        if self.head.state == SlotState::Open {
            self.head.state = SlotState::Frozen;
        }
        self.body = BodySlot {
            state: SlotState::Open,
            body_type: BodyType::Normal,
            bound: 0,
            lits: Vec::new(),
            wlits: Vec::new(),
        };
        Ok(self)
    }

    /// Starts definition of a sum aggregate to be used as the rule's body.
    ///
    /// A no-op while an unfrozen minimize statement is active, matching
    /// the source's guard against corrupting the in-progress minimize.
    pub fn start_sum(&mut self, bound: Weight) -> Result<&mut Self> {
        if self.head.is_minimize && !self.frozen() {
            return Ok(self);
        }
        if !self.frozen() && self.body.state != SlotState::Empty {
            return Err(Error::precondition("body already started"));
        }
        self.clear_if_frozen();
        if self.head.state == SlotState::Open {
            self.head.state = SlotState::Frozen;
        }
        self.body = BodySlot {
            state: SlotState::Open,
            body_type: BodyType::Sum,
            bound,
            lits: Vec::new(),
            wlits: Vec::new(),
        };
        Ok(self)
    }

    /// Starts definition of a minimize statement. No head is allowed.
    pub fn start_minimize(&mut self, priority: Weight) -> Result<&mut Self> {
        if !self.frozen() && (self.head.state != SlotState::Empty || self.body.state != SlotState::Empty) {
            return Err(Error::precondition("head or body already started"));
        }
        self.clear_if_frozen();
        self.head = HeadSlot {
            state: SlotState::Open,
            is_minimize: true,
            head_type: HeadType::Disjunctive,
            atoms: Vec::new(),
        };
        self.body = BodySlot {
            state: SlotState::Open,
            body_type: BodyType::Sum,
            bound: priority,
            lits: Vec::new(),
            wlits: Vec::new(),
        };
        Ok(self)
    }

    /// Updates the lower bound of the active sum aggregate.
    pub fn set_bound(&mut self, bound: Weight) -> Result<&mut Self> {
        if self.body.body_type == BodyType::Normal || self.frozen() {
            return Err(Error::precondition("set_bound requires an active non-normal body"));
        }
        self.body.bound = bound;
        Ok(self)
    }

    /// Adds an atom to the rule's head, starting the head with the
    /// default (disjunctive) type if it hasn't been started yet.
    pub fn add_head(&mut self, atom: Atom) -> Result<&mut Self> {
        if self.frozen() {
            return Err(Error::precondition("add_head on a frozen builder"));
        }
        if self.head.is_minimize {
            return Err(Error::precondition("cannot add a head atom to a minimize statement"));
        }
        if self.head.state == SlotState::Empty {
            self.head = HeadSlot {
                state: SlotState::Open,
                is_minimize: false,
                head_type: HeadType::default(),
                atoms: Vec::new(),
            };
        } else if self.head.state == SlotState::Frozen {
            return Err(Error::precondition("head already frozen"));
        }
        self.head.atoms.push(atom);
        Ok(self)
    }

    /// Adds a plain literal to the rule's body. If the active body is a
    /// sum/count aggregate, the literal is stored with weight `1`.
    pub fn add_goal(&mut self, lit: Literal) -> Result<&mut Self> {
        if self.frozen() {
            return Err(Error::precondition("add_goal on a frozen builder"));
        }
        if self.body.state == SlotState::Empty {
            self.start_body().expect("body slot is empty, start_body cannot fail here");
        }
        if self.body.state == SlotState::Frozen {
            return Err(Error::precondition("body already frozen"));
        }
        if self.body.body_type == BodyType::Normal {
            self.body.lits.push(lit);
        } else {
            self.body.wlits.push(WeightLit::new(lit, 1));
        }
        Ok(self)
    }

    /// Adds a weight literal to the rule's body.
    ///
    /// If the active body is normal, this succeeds only when the weight
    /// is exactly `1` (stored as a plain literal); otherwise it fails.
    /// Weight-`0` literals added to a sum/count body are silently
    /// dropped, per spec.
    pub fn add_goal_weighted(&mut self, wl: WeightLit) -> Result<&mut Self> {
        if self.frozen() {
            return Err(Error::precondition("add_goal on a frozen builder"));
        }
        if self.body.state == SlotState::Empty {
            self.start_sum(0).expect("body slot is empty, start_sum cannot fail here");
        }
        if self.body.state == SlotState::Frozen {
            return Err(Error::precondition("body already frozen"));
        }
        if self.body.body_type == BodyType::Normal {
            if wl.weight != 1 {
                return Err(Error::precondition("non-trivial weight literal not supported in normal body"));
            }
            self.body.lits.push(wl.lit);
        } else {
            if wl.weight == 0 && !self.head.is_minimize {
                return Ok(self);
            }
            self.body.wlits.push(wl);
        }
        Ok(self)
    }

    /// Linear scan by literal value (not normalized) over the active
    /// sum/count body.
    pub fn find_sum_lit(&self, lit: Literal) -> Option<WeightLit> {
        self.body.wlits.iter().copied().find(|wl| wl.lit == lit)
    }

    /// Weakens the active sum/count aggregate body.
    ///
    /// - `sum -> count`: keeps literals, sets every weight to `1`, and
    ///   scales the bound up as `ceil(bound / min_weight)` so the
    ///   weakened body is still satisfied whenever the original was.
    /// - `sum -> normal` / `count -> normal`: drops weights and bound;
    ///   literals survive in their original order.
    ///
    /// A no-op on a normal body or when `to` equals the body's current
    /// type. Fails on a minimize statement (it has no meaningful head
    /// to weaken towards).
    pub fn weaken(&mut self, to: BodyType, reset_weights: bool) -> Result<&mut Self> {
        if self.head.is_minimize {
            return Err(Error::precondition("weaken is invalid on a minimize statement"));
        }
        let from = self.body.body_type;
        if from == BodyType::Normal || from == to {
            return Ok(self);
        }
        match to {
            BodyType::Normal => {
                self.body.lits = self.body.wlits.iter().map(|wl| wl.lit).collect();
                self.body.wlits.clear();
                self.body.bound = 0;
                self.body.body_type = BodyType::Normal;
            }
            BodyType::Count => {
                if reset_weights && !self.body.wlits.is_empty() {
                    let min_w = self.body.wlits.iter().map(|wl| wl.weight).min().unwrap_or(1);
                    for wl in &mut self.body.wlits {
                        wl.weight = 1;
                    }
                    self.body.bound = if min_w > 0 {
                        (self.body.bound + min_w - 1) / min_w
                    } else {
                        self.body.bound
                    };
                }
                self.body.body_type = BodyType::Count;
            }
            BodyType::Sum => {
                self.body.body_type = BodyType::Sum;
            }
        }
        Ok(self)
    }

    /// The head type of the active rule.
    pub fn head_type(&self) -> HeadType {
        self.head.head_type
    }

    /// The head atoms of the active rule.
    pub fn head(&self) -> &[Atom] {
        &self.head.atoms
    }

    /// Whether the active rule is a minimize statement.
    pub fn is_minimize(&self) -> bool {
        self.head.is_minimize
    }

    /// The body type of the active rule.
    pub fn body_type(&self) -> BodyType {
        self.body.body_type
    }

    /// The body literals of the active rule (meaningful for normal bodies).
    pub fn body(&self) -> &[Literal] {
        &self.body.lits
    }

    /// The lower bound of the active sum/count body, or the priority of
    /// an active minimize statement. `-1` for a normal body.
    pub fn bound(&self) -> Weight {
        if self.body.body_type == BodyType::Normal {
            -1
        } else {
            self.body.bound
        }
    }

    /// The weighted literals of the active sum/count body or minimize statement.
    pub fn sum_lits(&self) -> &[WeightLit] {
        &self.body.wlits
    }

    /// Freezes both slots. If `sink` is given, dispatches the active
    /// rule or minimize statement to it.
    pub fn end<S: Sink + ?Sized>(&mut self, sink: Option<&mut S>) -> Result<&mut Self> {
        self.head.state = SlotState::Frozen;
        self.body.state = SlotState::Frozen;
        if let Some(sink) = sink {
            if self.body.body_type == BodyType::Normal {
                sink.rule(self.head.head_type, &self.head.atoms, &self.body.lits)?;
            } else if self.head.is_minimize {
                sink.minimize(self.body.bound, &self.body.wlits)?;
            } else {
                sink.rule_sum(self.head.head_type, &self.head.atoms, self.body.bound, &self.body.wlits)?;
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HeadType;

    #[derive(Default)]
    struct Recorder {
        rules: Vec<(HeadType, Vec<Atom>, Vec<Literal>)>,
        sum_rules: Vec<(HeadType, Vec<Atom>, Weight, Vec<WeightLit>)>,
        minimizes: Vec<(Weight, Vec<WeightLit>)>,
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
    }

    #[test]
    fn fact_round_trip() {
        let mut b = RuleBuilder::new();
        b.start(HeadType::Disjunctive).unwrap();
        b.add_head(1).unwrap();
        let mut rec = Recorder::default();
        b.end(Some(&mut rec)).unwrap();
        assert_eq!(rec.rules, vec![(HeadType::Disjunctive, vec![1], vec![])]);
    }

    #[test]
    fn choice_with_weight_body() {
        let mut b = RuleBuilder::new();
        b.start(HeadType::Choice).unwrap();
        b.add_head(1).unwrap();
        b.add_head(2).unwrap();
        b.start_sum(2).unwrap();
        b.add_goal_weighted(WeightLit::new(2, 1)).unwrap();
        b.add_goal_weighted(WeightLit::new(-3, 2)).unwrap();
        let mut rec = Recorder::default();
        b.end(Some(&mut rec)).unwrap();
        assert_eq!(
            rec.sum_rules,
            vec![(HeadType::Choice, vec![1, 2], 2, vec![WeightLit::new(2, 1), WeightLit::new(-3, 2)])]
        );
    }

    #[test]
    fn zero_weight_dropped_in_sum_body() {
        let mut b = RuleBuilder::new();
        b.start(HeadType::Disjunctive).unwrap();
        b.add_head(1).unwrap();
        b.start_sum(1).unwrap();
        b.add_goal_weighted(WeightLit::new(2, 0)).unwrap();
        b.add_goal_weighted(WeightLit::new(3, 1)).unwrap();
        assert_eq!(b.sum_lits(), &[WeightLit::new(3, 1)]);
    }

    #[test]
    fn weaken_sum_to_count_scales_bound() {
        let mut b = RuleBuilder::new();
        b.start(HeadType::Disjunctive).unwrap();
        b.add_head(1).unwrap();
        b.start_sum(5).unwrap();
        b.add_goal_weighted(WeightLit::new(1, 2)).unwrap();
        b.add_goal_weighted(WeightLit::new(2, 3)).unwrap();
        b.weaken(BodyType::Count, true).unwrap();
        assert_eq!(b.body_type(), BodyType::Count);
        assert!(b.sum_lits().iter().all(|wl| wl.weight == 1));
        assert_eq!(b.bound(), 3); // ceil(5/2)
    }

    #[test]
    fn weaken_to_normal_drops_weights() {
        let mut b = RuleBuilder::new();
        b.start(HeadType::Disjunctive).unwrap();
        b.add_head(1).unwrap();
        b.start_sum(5).unwrap();
        b.add_goal_weighted(WeightLit::new(1, 2)).unwrap();
        b.add_goal_weighted(WeightLit::new(-2, 3)).unwrap();
        b.weaken(BodyType::Normal, true).unwrap();
        assert_eq!(b.body_type(), BodyType::Normal);
        assert_eq!(b.body(), &[1, -2]);
    }

    #[test]
    fn frozen_builder_rejects_mutation() {
        let mut b = RuleBuilder::new();
        b.start(HeadType::Disjunctive).unwrap();
        b.add_head(1).unwrap();
        b.end::<Recorder>(None).unwrap();
        assert!(b.add_head(2).is_err());
    }

    #[test]
    fn start_after_frozen_clears() {
        let mut b = RuleBuilder::new();
        b.start(HeadType::Disjunctive).unwrap();
        b.add_head(1).unwrap();
        b.end::<Recorder>(None).unwrap();
        b.start(HeadType::Choice).unwrap();
        assert_eq!(b.head(), &[] as &[Atom]);
        assert_eq!(b.head_type(), HeadType::Choice);
    }

    #[test]
    fn minimize_round_trip() {
        let mut b = RuleBuilder::new();
        b.start_minimize(1).unwrap();
        b.add_goal_weighted(WeightLit::new(-2, -3)).unwrap();
        assert!(b.is_minimize());
        let mut rec = Recorder::default();
        b.end(Some(&mut rec)).unwrap();
        assert_eq!(rec.minimizes, vec![(1, vec![WeightLit::new(-2, -3)])]);
    }
}
