//! Canonical keys and branch history.
//!
//! Two formulas are "the same" for history and contradiction checks when
//! their canonical token sequences match:
//!
//! - variables, constants, predicates and functions compare by lexeme
//!   (`p` and `q` differ),
//! - every other token compares by type (`and`, `^` and `&` are equal).
//!
//! The key is taken over the bracket-reduced formula, so `(p and q)` and
//! `p and q` share a key.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Formula;

const LEXEME_KINDS: [&str; 5] = ["sentvar", "constant", "predicate", "indvar", "function"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyPart {
    Kind(String),
    Lexeme(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalKey(Vec<KeyPart>);

pub fn canonical_key(formula: &Formula) -> CanonicalKey {
    let reduced = formula.reduce_brackets();
    CanonicalKey(
        reduced
            .tokens()
            .iter()
            .map(|t| {
                if LEXEME_KINDS.contains(&t.kind.as_str()) {
                    KeyPart::Lexeme(t.lexem.clone())
                } else {
                    KeyPart::Kind(t.kind.clone())
                }
            })
            .collect(),
    )
}

/// Keys of the formulas already decomposed on a branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    keys: BTreeSet<CanonicalKey>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, formula: &Formula) -> bool {
        self.keys.contains(&canonical_key(formula))
    }

    pub fn contains_key(&self, key: &CanonicalKey) -> bool {
        self.keys.contains(key)
    }

    pub fn insert(&mut self, key: CanonicalKey) -> bool {
        self.keys.insert(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Token;
    use crate::formula::tests::{debug_table, formula};

    #[test]
    fn key_ignores_surface_form_of_connectives() {
        let ops = debug_table();
        let amp = Formula::new(
            vec![Token::new("sentvar", "p"), Token::new("and", "&"), Token::new("sentvar", "q")],
            ops.clone(),
        );
        let word = Formula::new(
            vec![
                Token::open_bracket(),
                Token::new("sentvar", "p"),
                Token::new("and", "and"),
                Token::new("sentvar", "q"),
                Token::close_bracket(),
            ],
            ops,
        );
        assert_eq!(canonical_key(&amp), canonical_key(&word));
    }

    #[test]
    fn key_distinguishes_variables() {
        assert_ne!(canonical_key(&formula("a and b")), canonical_key(&formula("a and c")));
        assert_ne!(canonical_key(&formula("a")), canonical_key(&formula("neg a")));
    }

    #[test]
    fn history_membership_is_canonical() {
        let mut history = History::new();
        assert!(history.insert(canonical_key(&formula("( a or b )"))));
        assert!(history.contains(&formula("a or b")));
        assert!(!history.contains(&formula("b or a")));
        assert!(!history.insert(canonical_key(&formula("a or b"))));
        assert_eq!(history.len(), 1);
    }
}
