//! The legacy smodels numeric format (C4 reader, C6 writer): a phased,
//! whitespace-token encoding of a ground logic program (rules, then a
//! symbol table, then a two-part compute statement, then an optional
//! externals section and model count).

mod cursor;
mod names;
mod reader;
mod writer;

pub use names::{match_edge, match_heuristic, split_args};
pub use reader::{Options as ParserOptions, Reader};
pub use writer::{Options as WriterOptions, Writer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RuleTag {
    End = 0,
    Basic = 1,
    Cardinality = 2,
    Choice = 3,
    Weight = 5,
    Optimize = 6,
    Disjunctive = 8,
    ClaspIncrement = 90,
    ClaspAssignExternal = 91,
    ClaspReleaseExternal = 92,
}

impl RuleTag {
    pub(crate) fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            0 => Self::End,
            1 => Self::Basic,
            2 => Self::Cardinality,
            3 => Self::Choice,
            5 => Self::Weight,
            6 => Self::Optimize,
            8 => Self::Disjunctive,
            90 => Self::ClaspIncrement,
            91 => Self::ClaspAssignExternal,
            92 => Self::ClaspReleaseExternal,
            _ => return None,
        })
    }
}
