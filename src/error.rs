//! Crate-wide error types.

use std::io;
use thiserror::Error;

/// The kind of formatting problem a parser ran into, independent of
/// where in the stream it happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatKind {
    /// A token didn't match what the grammar expected at this point.
    #[error("unexpected token: {0}")]
    UnexpectedToken(String),
    /// An atom, literal, or id fell outside its valid range.
    #[error("value out of range: {0}")]
    OutOfRange(String),
    /// A directive or section ended without its terminator.
    #[error("missing terminator: {0}")]
    MissingTerminator(String),
    /// The leading tag of a directive wasn't recognized.
    #[error("unknown directive tag: {0}")]
    UnknownTag(i64),
    /// An integer literal in the stream didn't fit its target type.
    #[error("integer overflow while parsing: {0}")]
    Overflow(String),
}

/// A parse failure, pinned to the line it occurred on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct FormatError {
    /// 1-based line number within the current input stream.
    pub line: u64,
    /// What went wrong.
    pub kind: FormatKind,
}

impl FormatError {
    /// Builds a format error at the given line.
    pub fn new(line: u64, kind: FormatKind) -> Self {
        Self { line, kind }
    }
}

/// The error type returned by every fallible public API in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A parser could not make sense of its input.
    #[error("format error: {0}")]
    Format(#[from] FormatError),
    /// A caller misused a stateful builder or store (double-start
    /// without `end`, invalid id, mutating a frozen rule, ...).
    #[error("precondition violation: {0}")]
    Precondition(String),
    /// A sink was asked to represent a construct it cannot express
    /// (e.g. a theory atom passed to the smodels writer).
    #[error("unsupported construct: {0}")]
    Unsupported(String),
    /// The underlying byte stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Builds a [`Error::Precondition`] from a formatted message.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Builds a [`Error::Unsupported`] from a formatted message.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
