//! Core data types shared by every component: atoms, literals, weights,
//! rule shapes, and the handful of small enums the wire formats encode
//! as bare integers.

use std::fmt;

/// An atom id. Valid atoms are in `[1, Atom::MAX]`; `0` is used as a
/// directive-local sentinel (e.g. "no associated program atom") and is
/// never itself a valid atom.
pub type Atom = u32;

/// Largest value an [`Atom`] may take: `2^31 - 1`.
pub const ATOM_MAX: Atom = (1u32 << 31) - 1;

/// Returns whether `n` is a valid atom, i.e. in `[1, ATOM_MAX]`.
pub const fn valid_atom(n: u32) -> bool {
    n != 0 && n <= ATOM_MAX
}

/// A literal: a signed atom. Positive literal `a`, negative literal `-a`.
/// `0` is reserved as an end-of-list terminator in both wire formats and
/// is never a valid literal.
pub type Literal = i32;

/// Returns the underlying atom of a literal, ignoring its sign.
pub const fn atom_of(lit: Literal) -> Atom {
    lit.unsigned_abs()
}

/// A (literal) weight.
pub type Weight = i32;

/// A literal paired with an integer weight, as used in sum/count bodies
/// and minimize statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeightLit {
    /// The literal.
    pub lit: Literal,
    /// Its weight.
    pub weight: Weight,
}

impl WeightLit {
    /// Creates a new weight literal.
    pub const fn new(lit: Literal, weight: Weight) -> Self {
        Self { lit, weight }
    }
}

impl From<Literal> for WeightLit {
    fn from(lit: Literal) -> Self {
        Self { lit, weight: 1 }
    }
}

/// Supported rule head types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeadType {
    /// `h1 | h2 | ... | hn :- body.` An empty disjunctive head is an
    /// integrity constraint.
    #[default]
    Disjunctive,
    /// `{h1;h2;...;hn} :- body.`
    Choice,
}

/// Supported rule body types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BodyType {
    /// A conjunction of literals.
    #[default]
    Normal,
    /// `Σ wi*li >= bound`, restricted to unit weights.
    Count,
    /// `Σ wi*li >= bound`.
    Sum,
}

/// The value assigned to an external atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TruthValue {
    /// The external's value is not fixed; a solver may choose it freely.
    Free,
    /// The external is assumed true.
    True,
    /// The external is assumed false.
    False,
    /// The atom is no longer external; treat as a regular atom.
    Release,
}

impl TruthValue {
    /// Decodes the numeric encoding used on the wire (`0..=3`).
    pub const fn from_code(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::Free),
            1 => Some(Self::True),
            2 => Some(Self::False),
            3 => Some(Self::Release),
            _ => None,
        }
    }

    /// The numeric encoding used on the wire.
    pub const fn code(self) -> i32 {
        match self {
            Self::Free => 0,
            Self::True => 1,
            Self::False => 2,
            Self::Release => 3,
        }
    }
}

/// The kind of modification a heuristic directive applies to an atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeuristicType {
    /// Sets the atom's decision level.
    Level,
    /// Sets the atom's preferred sign.
    Sign,
    /// Scales the atom's score by a factor.
    Factor,
    /// Sets the atom's initial score.
    Init,
    /// Assumes the atom true for heuristic purposes.
    True,
    /// Assumes the atom false for heuristic purposes.
    False,
}

impl HeuristicType {
    /// Decodes the numeric encoding used on the wire (`0..=5`).
    pub const fn from_code(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::Level),
            1 => Some(Self::Sign),
            2 => Some(Self::Factor),
            3 => Some(Self::Init),
            4 => Some(Self::True),
            5 => Some(Self::False),
            _ => None,
        }
    }

    /// The numeric encoding used on the wire.
    pub const fn code(self) -> i32 {
        match self {
            Self::Level => 0,
            Self::Sign => 1,
            Self::Factor => 2,
            Self::Init => 3,
            Self::True => 4,
            Self::False => 5,
        }
    }

    /// The lowercase name used in synthesized `_heuristic(...)` predicates.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Level => "level",
            Self::Sign => "sign",
            Self::Factor => "factor",
            Self::Init => "init",
            Self::True => "true",
            Self::False => "false",
        }
    }
}

impl fmt::Display for HeuristicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A rule body: either a plain conjunction or a weighted sum with a bound.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Body {
    /// A conjunction of literals.
    Normal(Vec<Literal>),
    /// A weighted sum with a lower bound. `BodyType::Count` is the
    /// special case where every weight equals `1`.
    Sum {
        /// Lower bound of the aggregate.
        bound: Weight,
        /// Weighted literals of the aggregate.
        lits: Vec<WeightLit>,
    },
}

impl Body {
    /// The [`BodyType`] of this body. A sum body with every weight equal
    /// to `1` still reports [`BodyType::Sum`] here; callers that care
    /// about the cardinality special case use [`Body::is_count`].
    pub fn body_type(&self) -> BodyType {
        match self {
            Body::Normal(_) => BodyType::Normal,
            Body::Sum { .. } => BodyType::Sum,
        }
    }

    /// Whether every weight in a sum body equals `1`, i.e. whether the
    /// body could be written as a count/cardinality aggregate.
    pub fn is_count(&self) -> bool {
        matches!(self, Body::Sum { lits, .. } if lits.iter().all(|wl| wl.weight == 1))
    }
}

/// A fully materialized rule: head plus body. Produced by [`crate::builder::RuleBuilder::rule`]
/// and consumed by writers/converters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rule {
    /// Head type.
    pub head_type: HeadType,
    /// Head atoms. Empty with `head_type == Disjunctive` means an
    /// integrity constraint.
    pub head: Vec<Atom>,
    /// Body.
    pub body: Body,
}

/// A minimize statement: a priority level and a weighted literal list, no head.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Minimize {
    /// Priority; lower priorities are minimized first.
    pub priority: Weight,
    /// Weighted literals.
    pub lits: Vec<WeightLit>,
}
