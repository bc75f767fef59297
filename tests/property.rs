//! Property-based checks for the round-trip and ordering laws.

use potassco_io::aspif::{Reader, Writer};
use potassco_io::error::Result;
use potassco_io::sink::Sink;
use potassco_io::theory::TheoryStore;
use potassco_io::types::{Atom, HeadType, Literal};
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

#[derive(Default)]
struct Recorder {
    rules: Vec<(HeadType, Vec<Atom>, Vec<Literal>)>,
}

impl Sink for Recorder {
    fn rule(&mut self, head_type: HeadType, head: &[Atom], body: &[Literal]) -> Result<()> {
        self.rules.push((head_type, head.to_vec(), body.to_vec()));
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct SmallRule {
    disjunctive: bool,
    head: Vec<Atom>,
    body: Vec<Literal>,
}

impl Arbitrary for SmallRule {
    fn arbitrary(g: &mut Gen) -> Self {
        let head_len = u8::arbitrary(g) % 4;
        let head = (0..head_len).map(|_| 1 + u32::arbitrary(g) % 50).collect::<Vec<_>>();
        let body_len = u8::arbitrary(g) % 4;
        let body = (0..body_len)
            .map(|_| {
                let a = 1 + (u32::arbitrary(g) % 50) as i32;
                if bool::arbitrary(g) {
                    -a
                } else {
                    a
                }
            })
            .collect::<Vec<_>>();
        SmallRule { disjunctive: bool::arbitrary(g) || head.is_empty(), head, body }
    }
}

// spec's round-trip law: reading an ASPIF file back through the ASPIF
// writer and parsing the result again reproduces the same rule events.
#[quickcheck]
fn aspif_rule_round_trips(rules: Vec<SmallRule>) -> bool {
    let mut buf = Vec::new();
    {
        let mut w = Writer::new(&mut buf);
        w.init_program(false).unwrap();
        for r in &rules {
            let ht = if r.disjunctive || r.head.len() != 1 { HeadType::Disjunctive } else { HeadType::Choice };
            if w.rule(ht, &r.head, &r.body).is_err() {
                return true; // builder/writer rejected a malformed case; not under test here
            }
        }
        w.end_step().unwrap();
    }
    let mut reader = Reader::new(buf.as_slice());
    let mut rec = Recorder::default();
    if reader.parse(&mut rec).is_err() {
        return false;
    }
    let expected: Vec<_> = rules
        .iter()
        .map(|r| {
            let ht = if r.disjunctive || r.head.len() != 1 { HeadType::Disjunctive } else { HeadType::Choice };
            (ht, r.head.clone(), r.body.clone())
        })
        .collect();
    rec.rules == expected
}

// spec's theory store law: filter(p) preserves atom order among retained atoms.
#[quickcheck]
fn theory_filter_preserves_order(keep_mask: Vec<bool>) -> bool {
    let mut store = TheoryStore::new();
    store.add_symbol(0, "p").unwrap();
    let n = keep_mask.len().min(20);
    for i in 0..n {
        store.add_atom((i + 1) as Atom, 0, vec![]);
    }
    let before: Vec<Atom> = store.atoms().iter().map(|a| a.atom).collect();
    store.filter(|a| {
        let idx = (a.atom - 1) as usize;
        idx < keep_mask.len() && !keep_mask[idx]
    });
    let after: Vec<Atom> = store.atoms().iter().map(|a| a.atom).collect();
    let retained: Vec<Atom> = before.into_iter().filter(|&atom| after.contains(&atom)).collect();
    retained == after
}
