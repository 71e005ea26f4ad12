//! Formulas and the precedence engine.
//!
//! A [`Formula`] is an immutable sequence of [`Token`]s. Every structural
//! operation (bracket reduction, splitting, prefixing) returns a new formula.
//!
//! ## Key concepts
//!
//! - **Precedence map**: for every connective index, `level + strength/scale`
//!   where `level` is the bracket depth at that token and `strength`/`scale`
//!   come from the [`OperatorTable`]. Lower values bind weaker.
//! - **Main connective**: the index with the minimal value. Ties between unary
//!   operators resolve to the leftmost one (`~~p` splits at the first `~`),
//!   any other tie resolves to the rightmost one (`a and b and c` splits at
//!   the second `and`).
//! - **Bracket reduction**: strip outer `( ... )` pairs, then re-wrap just
//!   enough brackets to keep nesting valid:
//!
//! ```text
//! ( ( a ) and ( b ) )   strip 2 pairs ->  a ) and ( b
//!                       re-wrap 1     ->  ( a ) and ( b )
//! ```
//!
//! The precedence map is cached per formula. Slicing and bracket reduction
//! carry the parent's map over, re-keyed by the index shift, so a derived
//! formula never reuses indices that no longer point at its connectives.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use once_cell::unsync::OnceCell;

use crate::Token;

// --- Operator table ---------------------------------------------------------

/// Binding strength of every connective type of a formal system.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorTable {
    strengths: BTreeMap<String, u32>,
    unary: BTreeSet<String>,
    negation: String,
    scale: u32,
}

impl OperatorTable {
    /// `negation` names the unary type rules strip and add as a prefix.
    pub fn new<'a>(
        strengths: impl IntoIterator<Item = (&'a str, u32)>,
        unary: impl IntoIterator<Item = &'a str>,
        negation: &str,
    ) -> Self {
        let strengths: BTreeMap<String, u32> = strengths.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        let scale = strengths.values().copied().max().unwrap_or(0) + 1;
        OperatorTable {
            strengths,
            unary: unary.into_iter().map(str::to_string).collect(),
            negation: negation.to_string(),
            scale,
        }
    }

    pub fn strength(&self, kind: &str) -> Option<u32> {
        self.strengths.get(kind).copied()
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_connective(&self, kind: &str) -> bool {
        self.strengths.contains_key(kind)
    }

    pub fn is_unary(&self, kind: &str) -> bool {
        self.unary.contains(kind)
    }

    pub fn negation(&self) -> &str {
        &self.negation
    }

    /// Precedence value of a connective at the given bracket depth.
    pub fn value(&self, kind: &str, level: i64) -> Option<f64> {
        self.strength(kind).map(|s| level as f64 + f64::from(s) / f64::from(self.scale))
    }
}

// --- Formula ----------------------------------------------------------------

/// Main connective of a formula and the two sides around it.
#[derive(Debug, Clone, PartialEq)]
pub struct Components {
    pub connective: Token,
    pub index: usize,
    pub left: Option<Formula>,
    pub right: Option<Formula>,
}

#[derive(Clone)]
pub struct Formula {
    tokens: Vec<Token>,
    ops: Arc<OperatorTable>,
    precedence: OnceCell<BTreeMap<usize, f64>>,
}

impl Formula {
    pub fn new(tokens: Vec<Token>, ops: Arc<OperatorTable>) -> Self {
        Formula { tokens, ops, precedence: OnceCell::new() }
    }

    fn with_precedence(tokens: Vec<Token>, ops: Arc<OperatorTable>, precedence: Option<BTreeMap<usize, f64>>) -> Self {
        let formula = Formula::new(tokens, ops);
        if let Some(map) = precedence {
            let _ = formula.precedence.set(map);
        }
        formula
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn operators(&self) -> &Arc<OperatorTable> {
        &self.ops
    }

    /// Whether the first token is the system's negation.
    pub fn starts_with_negation(&self) -> bool {
        self.tokens.first().is_some_and(|t| t.kind == self.ops.negation())
    }

    /// Connective index -> binding value, computed once per formula.
    pub fn precedence(&self) -> &BTreeMap<usize, f64> {
        self.precedence.get_or_init(|| {
            let mut level: i64 = 0;
            let mut map = BTreeMap::new();
            for (i, token) in self.tokens.iter().enumerate() {
                if token.is_open_bracket() {
                    level += 1;
                } else if token.is_close_bracket() {
                    level -= 1;
                } else if let Some(value) = self.ops.value(&token.kind, level) {
                    map.insert(i, value);
                }
            }
            map
        })
    }

    /// Index of the weakest-binding connective, `None` for a bare variable.
    pub fn main_connective(&self) -> Option<usize> {
        let precedence = self.precedence();
        let min = precedence.values().copied().reduce(f64::min)?;
        let tied: Vec<usize> = precedence.iter().filter(|(_, v)| **v == min).map(|(i, _)| *i).collect();

        let all_unary = tied.iter().all(|&i| self.tokens.get(i).is_some_and(|t| self.ops.is_unary(&t.kind)));
        if all_unary { tied.first().copied() } else { tied.last().copied() }
    }

    /// Minimal bracketing of the same formula. Idempotent.
    pub fn reduce_brackets(&self) -> Formula {
        if self.tokens.len() < 2 {
            return self.clone();
        }

        let (mut start, mut end) = (0, self.tokens.len());
        while end - start >= 2 && self.tokens[start].is_open_bracket() && self.tokens[end - 1].is_close_bracket() {
            start += 1;
            end -= 1;
        }
        let removed = start;
        let inner = &self.tokens[start..end];

        let (mut opened_left, mut opened_right, mut lowest_unopened) = (0i64, 0i64, 0i64);
        for token in inner {
            if token.is_open_bracket() {
                opened_left += 1;
            } else if token.is_close_bracket() {
                opened_right += 1;
            } else {
                continue;
            }
            lowest_unopened = lowest_unopened.max(opened_right - opened_left);
        }
        let unclosed_right = (opened_left - opened_right + lowest_unopened).max(0) as usize;
        let lowest_unopened = lowest_unopened as usize;

        let mut tokens = Vec::with_capacity(inner.len() + lowest_unopened + unclosed_right);
        tokens.extend(std::iter::repeat_n(Token::open_bracket(), lowest_unopened));
        tokens.extend_from_slice(inner);
        tokens.extend(std::iter::repeat_n(Token::close_bracket(), unclosed_right));

        let precedence = self.precedence.get().map(|map| {
            map.iter().filter_map(|(k, v)| (k + lowest_unopened).checked_sub(removed).map(|k| (k, *v))).collect()
        });
        Formula::with_precedence(tokens, Arc::clone(&self.ops), precedence)
    }

    /// Left `[0, index)` and right `(index, len)` parts, each fully reduced.
    pub fn split_at(&self, index: usize) -> (Option<Formula>, Option<Formula>) {
        let precedence = self.precedence();
        let index = index.min(self.tokens.len());

        let left_map = precedence.range(..index).map(|(k, v)| (*k, *v)).collect();
        let right_map = precedence.range(index + 1..).map(|(k, v)| (k - index - 1, *v)).collect();

        let left = &self.tokens[..index];
        let right = self.tokens.get(index + 1..).unwrap_or(&[]);

        let side = |tokens: &[Token], map: BTreeMap<usize, f64>| {
            (!tokens.is_empty()).then(|| {
                Formula::with_precedence(tokens.to_vec(), Arc::clone(&self.ops), Some(map))
                    .reduce_brackets()
                    .reduce_brackets()
            })
        };
        (side(left, left_map), side(right, right_map))
    }

    /// Main connective plus both sides, `None` for a bare variable.
    pub fn components(&self) -> Option<Components> {
        let reduced = self.reduce_brackets();
        let index = reduced.main_connective()?;
        let (left, right) = reduced.split_at(index);
        Some(Components { connective: reduced.tokens[index].clone(), index, left, right })
    }

    /// No connective at all, or a single unary operator in front.
    pub fn is_literal(&self) -> bool {
        let reduced = self.reduce_brackets();
        match reduced.main_connective() {
            None => true,
            Some(0) => reduced.precedence().len() == 1,
            Some(_) => false,
        }
    }

    /// Innermost operand below any leading negations.
    pub fn non_negated(&self) -> Formula {
        match self.components() {
            Some(Components { connective, right: Some(right), .. }) if connective.kind == self.ops.negation() => {
                right.non_negated()
            }
            _ => self.reduce_brackets(),
        }
    }

    /// Operand of a leading `kind` operator, `None` if the main connective
    /// is something else.
    pub fn strip_prefix(&self, kind: &str) -> Option<Formula> {
        if self.tokens.len() <= 1 {
            return None;
        }
        let components = self.components()?;
        if components.connective.kind != kind {
            return None;
        }
        components.right.map(|right| right.reduce_brackets())
    }

    /// `prefix F`, bracketing `F` unless it is a single token.
    pub fn with_prefix(&self, prefix: Token) -> Formula {
        let mut tokens = Vec::with_capacity(self.tokens.len() + 3);
        tokens.push(prefix);
        if self.tokens.len() == 1 {
            tokens.extend_from_slice(&self.tokens);
        } else {
            tokens.push(Token::open_bracket());
            tokens.extend_from_slice(&self.tokens);
            tokens.push(Token::close_bracket());
        }
        Formula::new(tokens, Arc::clone(&self.ops))
    }

    /// Same connective structure, same number of `(` and `)`.
    pub fn brackets_balanced(&self) -> bool {
        let mut depth: i64 = 0;
        for token in &self.tokens {
            if token.is_open_bracket() {
                depth += 1;
            } else if token.is_close_bracket() {
                depth -= 1;
            }
        }
        depth == 0
    }

    pub fn lexemes(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.lexem.as_str()).collect()
    }
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        self.tokens == other.tokens
    }
}

impl Eq for Formula {}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Formula[{}]", self.lexemes().join(" "))
    }
}

/// Readable form: binary connectives spaced, unary ones glued to their operand.
impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            if token.is_bracket() {
                f.write_str(&token.lexem)?;
            } else if self.ops.is_unary(&token.kind) {
                if token.lexem.chars().all(char::is_alphabetic) {
                    write!(f, "{} ", token.lexem)?;
                } else {
                    f.write_str(&token.lexem)?;
                }
            } else if self.ops.is_connective(&token.kind) {
                write!(f, " {} ", token.lexem)?;
            } else {
                f.write_str(&token.lexem)?;
            }
        }
        Ok(())
    }
}
