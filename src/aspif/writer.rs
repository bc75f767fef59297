use std::io::Write as _;

use super::Tag;
use crate::error::{Error, Result};
use crate::types::{Atom, HeadType, HeuristicType, Literal, TruthValue, Weight, WeightLit};

/// Writes ASPIF directives to a byte stream.
///
/// Each sink method is a single `write!` of a `Tag` plus its payload,
/// directly mirroring the source's `AspifOutput::startDir/add/endDir` chain.
pub struct Writer<W> {
    out: W,
}

impl<W: std::io::Write> Writer<W> {
    /// Wraps an output stream.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn atoms(&mut self, atoms: &[Atom]) -> Result<()> {
        write!(self.out, " {}", atoms.len()).map_err(Error::Io)?;
        for a in atoms {
            write!(self.out, " {a}").map_err(Error::Io)?;
        }
        Ok(())
    }

    fn lits(&mut self, lits: &[Literal]) -> Result<()> {
        write!(self.out, " {}", lits.len()).map_err(Error::Io)?;
        for l in lits {
            write!(self.out, " {l}").map_err(Error::Io)?;
        }
        Ok(())
    }

    fn wlits(&mut self, lits: &[WeightLit]) -> Result<()> {
        write!(self.out, " {}", lits.len()).map_err(Error::Io)?;
        for wl in lits {
            write!(self.out, " {} {}", wl.lit, wl.weight).map_err(Error::Io)?;
        }
        Ok(())
    }

    fn ids(&mut self, ids: &[u32]) -> Result<()> {
        write!(self.out, " {}", ids.len()).map_err(Error::Io)?;
        for id in ids {
            write!(self.out, " {id}").map_err(Error::Io)?;
        }
        Ok(())
    }

    fn string(&mut self, s: &str) -> Result<()> {
        write!(self.out, " {} {}", s.len(), s).map_err(Error::Io)
    }
}

impl<W: std::io::Write> crate::sink::Sink for Writer<W> {
    fn init_program(&mut self, incremental: bool) -> Result<()> {
        write!(self.out, "asp 1 0 0").map_err(Error::Io)?;
        if incremental {
            write!(self.out, " incremental").map_err(Error::Io)?;
        }
        writeln!(self.out).map_err(Error::Io)
    }

    fn end_step(&mut self) -> Result<()> {
        writeln!(self.out, "0").map_err(Error::Io)
    }

    fn rule(&mut self, head_type: HeadType, head: &[Atom], body: &[Literal]) -> Result<()> {
        write!(self.out, "{} {}", Tag::Rule as i64, head_type as u8).map_err(Error::Io)?;
        self.atoms(head)?;
        write!(self.out, " 0").map_err(Error::Io)?;
        self.lits(body)?;
        writeln!(self.out).map_err(Error::Io)
    }

    fn rule_sum(&mut self, head_type: HeadType, head: &[Atom], bound: Weight, body: &[WeightLit]) -> Result<()> {
        write!(self.out, "{} {}", Tag::Rule as i64, head_type as u8).map_err(Error::Io)?;
        self.atoms(head)?;
        write!(self.out, " 1 {bound}").map_err(Error::Io)?;
        self.wlits(body)?;
        writeln!(self.out).map_err(Error::Io)
    }

    fn minimize(&mut self, priority: Weight, lits: &[WeightLit]) -> Result<()> {
        write!(self.out, "{} {priority}", Tag::Minimize as i64).map_err(Error::Io)?;
        self.wlits(lits)?;
        writeln!(self.out).map_err(Error::Io)
    }

    fn project(&mut self, atoms: &[Atom]) -> Result<()> {
        write!(self.out, "{}", Tag::Project as i64).map_err(Error::Io)?;
        self.atoms(atoms)?;
        writeln!(self.out).map_err(Error::Io)
    }

    fn output(&mut self, text: &str, condition: &[Literal]) -> Result<()> {
        write!(self.out, "{}", Tag::Output as i64).map_err(Error::Io)?;
        self.string(text)?;
        self.lits(condition)?;
        writeln!(self.out).map_err(Error::Io)
    }

    fn external(&mut self, atom: Atom, value: TruthValue) -> Result<()> {
        writeln!(self.out, "{} {} {}", Tag::External as i64, atom, value.code()).map_err(Error::Io)
    }

    fn assume(&mut self, lits: &[Literal]) -> Result<()> {
        write!(self.out, "{}", Tag::Assume as i64).map_err(Error::Io)?;
        self.lits(lits)?;
        writeln!(self.out).map_err(Error::Io)
    }

    fn heuristic(&mut self, atom: Atom, kind: HeuristicType, bias: i32, priority: u32, condition: &[Literal]) -> Result<()> {
        write!(self.out, "{} {} {} {} {}", Tag::Heuristic as i64, kind.code(), atom, bias, priority).map_err(Error::Io)?;
        self.lits(condition)?;
        writeln!(self.out).map_err(Error::Io)
    }

    fn acyc_edge(&mut self, s: i32, t: i32, condition: &[Literal]) -> Result<()> {
        write!(self.out, "{} {} {}", Tag::Edge as i64, s, t).map_err(Error::Io)?;
        self.lits(condition)?;
        writeln!(self.out).map_err(Error::Io)
    }

    fn theory_number(&mut self, term_id: u32, number: i64) -> Result<()> {
        writeln!(self.out, "{} 0 {} {}", Tag::Theory as i64, term_id, number).map_err(Error::Io)
    }

    fn theory_symbol(&mut self, term_id: u32, symbol: &str) -> Result<()> {
        write!(self.out, "{} 1 {}", Tag::Theory as i64, term_id).map_err(Error::Io)?;
        self.string(symbol)?;
        writeln!(self.out).map_err(Error::Io)
    }

    fn theory_compound(&mut self, term_id: u32, base: i32, args: &[u32]) -> Result<()> {
        write!(self.out, "{} 2 {} {}", Tag::Theory as i64, term_id, base).map_err(Error::Io)?;
        self.ids(args)?;
        writeln!(self.out).map_err(Error::Io)
    }

    fn theory_element(&mut self, element_id: u32, terms: &[u32], condition: &[Literal]) -> Result<()> {
        write!(self.out, "{} 4 {}", Tag::Theory as i64, element_id).map_err(Error::Io)?;
        self.ids(terms)?;
        self.lits(condition)?;
        writeln!(self.out).map_err(Error::Io)
    }

    fn theory_atom(&mut self, atom_or_zero: u32, term_id: u32, elements: &[u32]) -> Result<()> {
        write!(self.out, "{} 5 {} {}", Tag::Theory as i64, atom_or_zero, term_id).map_err(Error::Io)?;
        self.ids(elements)?;
        writeln!(self.out).map_err(Error::Io)
    }

    fn theory_atom_with_guard(&mut self, atom_or_zero: u32, term_id: u32, elements: &[u32], op: u32, rhs: u32) -> Result<()> {
        write!(self.out, "{} 6 {} {}", Tag::Theory as i64, atom_or_zero, term_id).map_err(Error::Io)?;
        self.ids(elements)?;
        writeln!(self.out, " {op} {rhs}").map_err(Error::Io)
    }
}
