//! Whole-document token cursor for the smodels format.
//!
//! Unlike ASPIF, smodels directives are whitespace-separated tokens that
//! freely cross line boundaries (the rule and body sections read like
//! one long token stream); only the symbol table's atom names are
//! bound to a single line, since a name may itself contain spaces and
//! parentheses. We read the whole input up front rather than replicate
//! the source's byte-at-a-time buffered stream — the wire format
//! doesn't make that streaming behavior observable.

use crate::error::{FormatError, FormatKind, Result};
use crate::types::{atom_of, valid_atom, Atom, Literal, ATOM_MAX};

pub struct Cursor {
    text: Vec<u8>,
    pos: usize,
    line_no: u64,
}

impl Cursor {
    pub fn new(text: Vec<u8>) -> Self {
        Self { text, pos: 0, line_no: 1 }
    }

    pub fn line_no(&self) -> u64 {
        self.line_no
    }

    fn err(&self, kind: FormatKind) -> crate::error::Error {
        FormatError::new(self.line_no, kind).into()
    }

    fn peek_byte(&self) -> Option<u8> {
        self.text.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_whitespace() {
                if b == b'\n' {
                    self.line_no += 1;
                }
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Whether the input has no more non-whitespace content.
    pub fn at_eof(&mut self) -> bool {
        self.skip_ws();
        self.pos >= self.text.len()
    }

    fn take_token(&mut self) -> Result<&str> {
        self.skip_ws();
        let start = self.pos;
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.err(FormatKind::MissingTerminator("unexpected end of input".into())));
        }
        std::str::from_utf8(&self.text[start..self.pos]).map_err(|_| self.err(FormatKind::UnexpectedToken("invalid utf-8".into())))
    }

    /// Reads the next whitespace-delimited token and requires it to equal `word` exactly.
    pub fn expect(&mut self, word: &str) -> Result<()> {
        let tok = self.take_token()?;
        if tok != word {
            return Err(self.err(FormatKind::UnexpectedToken(format!("expected '{word}', got '{tok}'"))));
        }
        Ok(())
    }

    /// Reads the next whitespace-delimited token and reports whether it equals `word`,
    /// without consuming it if it doesn't (used for peeking at optional sections like `E`).
    pub fn try_expect(&mut self, word: &str) -> Result<bool> {
        self.skip_ws();
        let save = (self.pos, self.line_no);
        let tok = self.take_token()?;
        if tok == word {
            Ok(true)
        } else {
            (self.pos, self.line_no) = save;
            Ok(false)
        }
    }

    pub fn uint(&mut self) -> Result<u32> {
        let tok = self.take_token()?;
        tok.parse::<u32>().map_err(|_| self.err(FormatKind::OutOfRange(format!("non-negative integer expected, got '{tok}'"))))
    }

    pub fn int(&mut self) -> Result<i32> {
        let tok = self.take_token()?;
        tok.parse::<i32>().map_err(|_| self.err(FormatKind::UnexpectedToken(format!("integer expected, got '{tok}'"))))
    }

    pub fn atom(&mut self) -> Result<Atom> {
        let v = self.uint()?;
        if !valid_atom(v) {
            return Err(self.err(FormatKind::OutOfRange(format!("atom out of range: {v}"))));
        }
        Ok(v)
    }

    pub fn lit(&mut self) -> Result<Literal> {
        let v = self.int()?;
        if v == 0 || atom_of(v) > ATOM_MAX {
            return Err(self.err(FormatKind::OutOfRange(format!("literal out of range: {v}"))));
        }
        Ok(v)
    }

    /// Reads the rest of the current line verbatim (used for symbol
    /// table names, which may contain spaces/parens/commas). The cursor
    /// must be positioned right after the atom id and its separating space.
    pub fn rest_of_line(&mut self) -> Result<String> {
        if self.peek_byte() != Some(b' ') {
            return Err(self.err(FormatKind::UnexpectedToken("expected a space before atom name".into())));
        }
        self.pos += 1;
        let start = self.pos;
        while let Some(b) = self.peek_byte() {
            if b == b'\n' {
                break;
            }
            self.pos += 1;
        }
        if self.peek_byte() != Some(b'\n') {
            return Err(self.err(FormatKind::MissingTerminator("unterminated symbol name".into())));
        }
        let name = std::str::from_utf8(&self.text[start..self.pos])
            .map_err(|_| self.err(FormatKind::UnexpectedToken("invalid utf-8".into())))?
            .trim_end_matches('\r')
            .to_string();
        self.pos += 1;
        self.line_no += 1;
        Ok(name)
    }

    /// Peeks the first non-whitespace byte without consuming it.
    pub fn peek_nonws(&mut self) -> Option<u8> {
        self.skip_ws();
        self.peek_byte()
    }

    /// Reads an atom, or `None` if the next token is the list terminator `0`.
    /// Used for the symbol table and the `E` section, both zero-terminated
    /// lists of atoms read one token at a time.
    pub fn atom_or_zero_peekable(&mut self) -> Result<Option<Atom>> {
        let v = self.uint()?;
        if v == 0 {
            return Ok(None);
        }
        if !valid_atom(v) {
            return Err(self.err(FormatKind::OutOfRange(format!("atom out of range: {v}"))));
        }
        Ok(Some(v))
    }
}
