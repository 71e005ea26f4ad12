//! Branch closure for unsigned tableaux.
//!
//! A branch closes when:
//!
//! - **Contradiction**: some formula `~F` and some formula `F` both occur on
//!   it (compared by canonical key), or
//! - **Emptiness**: every formula on it is already decomposed (in the leaf's
//!   history) or is a literal, so no rule can add anything.
//!
//! A user may also declare a contradiction by hand. [`contradicts`] accepts
//! any two formulas with the same core below their leading negations and an
//! odd difference in how many negations they carry, so `A` and `~~~A`
//! qualify even though the automatic check waits for `double not`.
//!
//! Emptiness only means "saturated" for propositional rule sets; rules that
//! can fire more than once per formula need a different criterion.

use super::canonical::{History, canonical_key};
use crate::{Close, Formula};

pub fn check_closure(branch: &[Formula], history: &History) -> Option<Close> {
    for (i, first) in branch.iter().enumerate() {
        for (j, second) in branch.iter().enumerate().skip(i + 1) {
            let (negated, plain) = match (first.starts_with_negation(), second.starts_with_negation()) {
                (true, false) => (first, second),
                (false, true) => (second, first),
                _ => continue,
            };
            let negation = negated.operators().negation();
            if negated.strip_prefix(negation).is_some_and(|inner| canonical_key(&inner) == canonical_key(plain)) {
                return Some(Close::Contradiction { first: i, second: j });
            }
        }
    }

    if branch.iter().all(|f| history.contains(f) || f.is_literal()) {
        return Some(Close::Emptiness);
    }
    None
}

/// Same non-negated core, opposite polarity.
pub fn contradicts(first: &Formula, second: &Formula) -> bool {
    canonical_key(&first.non_negated()) == canonical_key(&second.non_negated())
        && negation_depth(first) % 2 != negation_depth(second) % 2
}

fn negation_depth(formula: &Formula) -> usize {
    let negation = formula.operators().negation();
    std::iter::successors(Some(formula.clone()), |f| f.strip_prefix(negation)).count() - 1
}
