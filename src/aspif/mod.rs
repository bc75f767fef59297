//! ASPIF (ASP Intermediate Format): a line-oriented, integer-encoded
//! wire format for ground logic programs. [`Reader`] is a source, [`Writer`] a sink.

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

#[repr(i64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tag {
    Rule = 1,
    Minimize = 2,
    Project = 3,
    Output = 4,
    External = 5,
    Assume = 6,
    Heuristic = 7,
    Edge = 8,
    Theory = 9,
    Comment = 10,
}

impl Tag {
    pub(crate) fn from_i64(v: i64) -> Option<Self> {
        Some(match v {
            1 => Self::Rule,
            2 => Self::Minimize,
            3 => Self::Project,
            4 => Self::Output,
            5 => Self::External,
            6 => Self::Assume,
            7 => Self::Heuristic,
            8 => Self::Edge,
            9 => Self::Theory,
            10 => Self::Comment,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TheoryTag {
    Number = 0,
    Symbol = 1,
    Compound = 2,
    Element = 4,
    Atom = 5,
    AtomWithGuard = 6,
}

impl TheoryTag {
    pub(crate) fn from_i64(v: i64) -> Option<Self> {
        Some(match v {
            0 => Self::Number,
            1 => Self::Symbol,
            2 => Self::Compound,
            4 => Self::Element,
            5 => Self::Atom,
            6 => Self::AtomWithGuard,
            _ => return None,
        })
    }
}
