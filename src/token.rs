//! A small per-line token cursor shared by the ASPIF and smodels
//! parsers (C3/C4): both formats are whitespace-separated integers with
//! the occasional length-prefixed byte string, read one line at a time.

use crate::error::{FormatError, FormatKind, Result};
use crate::types::{atom_of, valid_atom, Atom, Literal, Weight, WeightLit, ATOM_MAX};

/// Cursor over one line of input, tracking its 1-based line number for
/// error reporting.
pub struct Line<'a> {
    text: &'a str,
    pos: usize,
    line_no: u64,
}

impl<'a> Line<'a> {
    /// Wraps `text` (without its trailing newline) as the contents of line `line_no`.
    pub fn new(text: &'a str, line_no: u64) -> Self {
        Self { text, pos: 0, line_no }
    }

    /// The 1-based line number, for error reporting outside this cursor.
    pub fn line_no(&self) -> u64 {
        self.line_no
    }

    fn err(&self, kind: FormatKind) -> crate::error::Error {
        FormatError::new(self.line_no, kind).into()
    }

    fn skip_ws(&mut self) {
        while self.pos < self.text.len() && self.text.as_bytes()[self.pos] == b' ' {
            self.pos += 1;
        }
    }

    /// Whether the cursor has consumed the whole line (ignoring trailing whitespace).
    pub fn at_end(&mut self) -> bool {
        self.skip_ws();
        self.pos >= self.text.len()
    }

    /// Consumes exactly one space character.
    pub fn space(&mut self) -> Result<()> {
        if self.text.as_bytes().get(self.pos) == Some(&b' ') {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.err(FormatKind::UnexpectedToken("expected a space".into())))
        }
    }

    fn take_token(&mut self) -> Result<&'a str> {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.text.len() && self.text.as_bytes()[self.pos] != b' ' {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.err(FormatKind::UnexpectedToken("unexpected end of line".into())));
        }
        Ok(&self.text[start..self.pos])
    }

    /// Reads a signed 64-bit integer token.
    pub fn i64(&mut self) -> Result<i64> {
        let tok = self.take_token()?;
        tok.parse::<i64>()
            .map_err(|_| self.err(FormatKind::UnexpectedToken(format!("integer expected, got '{tok}'"))))
    }

    /// Reads a plain (unbounded) signed integer.
    pub fn int(&mut self) -> Result<i32> {
        let v = self.i64()?;
        i32::try_from(v).map_err(|_| self.err(FormatKind::Overflow(format!("{v}"))))
    }

    /// Reads a non-negative integer, no upper bound beyond `u32`.
    pub fn uint(&mut self) -> Result<u32> {
        let v = self.i64()?;
        u32::try_from(v).map_err(|_| self.err(FormatKind::OutOfRange(format!("non-negative integer expected, got {v}"))))
    }

    /// Reads an id (`[0, u32::MAX]`).
    pub fn id(&mut self) -> Result<u32> {
        self.uint()
    }

    /// Reads an atom (`[1, ATOM_MAX]`).
    pub fn atom(&mut self) -> Result<Atom> {
        let v = self.uint()?;
        if !valid_atom(v) {
            return Err(self.err(FormatKind::OutOfRange(format!("atom out of range: {v}"))));
        }
        Ok(v)
    }

    /// Reads an atom or zero (`[0, ATOM_MAX]`).
    pub fn atom_or_zero(&mut self) -> Result<Atom> {
        let v = self.uint()?;
        if v > ATOM_MAX {
            return Err(self.err(FormatKind::OutOfRange(format!("atom out of range: {v}"))));
        }
        Ok(v)
    }

    /// Reads a literal: a non-zero signed atom.
    pub fn lit(&mut self) -> Result<Literal> {
        let v = self.int()?;
        if v == 0 || atom_of(v) > ATOM_MAX {
            return Err(self.err(FormatKind::OutOfRange(format!("literal out of range: {v}"))));
        }
        Ok(v)
    }

    /// Reads a weight (any `i32`, optionally required positive).
    pub fn weight(&mut self, require_positive: bool) -> Result<Weight> {
        let v = self.int()?;
        if require_positive && v < 0 {
            return Err(self.err(FormatKind::OutOfRange(format!("non-negative weight expected, got {v}"))));
        }
        Ok(v)
    }

    /// Reads a weight literal.
    pub fn wlit(&mut self, require_positive: bool) -> Result<WeightLit> {
        let lit = self.lit()?;
        let weight = self.weight(require_positive)?;
        Ok(WeightLit::new(lit, weight))
    }

    /// Reads `nAtoms a1 a2 ...`.
    pub fn atoms(&mut self) -> Result<Vec<Atom>> {
        let n = self.uint()?;
        (0..n).map(|_| self.atom()).collect()
    }

    /// Reads `nLits l1 l2 ...`.
    pub fn lits(&mut self) -> Result<Vec<Literal>> {
        let n = self.uint()?;
        (0..n).map(|_| self.lit()).collect()
    }

    /// Reads `nWLits l1 w1 l2 w2 ...`.
    pub fn wlits(&mut self, require_positive: bool) -> Result<Vec<WeightLit>> {
        let n = self.uint()?;
        (0..n).map(|_| self.wlit(require_positive)).collect()
    }

    /// Reads `nIds id1 id2 ...`.
    pub fn ids(&mut self) -> Result<Vec<u32>> {
        let n = self.uint()?;
        (0..n).map(|_| self.id()).collect()
    }

    /// Reads `strLen ' ' bytes`: a length-prefixed, single-space-separated string.
    pub fn string(&mut self) -> Result<&'a str> {
        let len = self.uint()? as usize;
        self.space()?;
        if self.pos + len > self.text.len() {
            return Err(self.err(FormatKind::MissingTerminator("string runs past end of line".into())));
        }
        let s = &self.text[self.pos..self.pos + len];
        self.pos += len;
        Ok(s)
    }
}
