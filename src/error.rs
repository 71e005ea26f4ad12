//! Error taxonomy.
//!
//! Two kinds of failure leave the core:
//!
//! - [`Mistake`]: a deterministic, expected user mistake (bad sentence index,
//!   reuse of a decomposed formula, splitting on a variable, ...). It carries a
//!   named [`MistakeKind`], a default human-readable message and structured
//!   `extra` data a front end can use to point at the offending token.
//! - [`EngineError`]: everything the orchestrator has to react to. User
//!   mistakes are wrapped unchanged; invariant violations abort the current
//!   step.
//!
//! A solver that cannot close a proof is *not* an error: `solve` returns
//! `Ok(false)`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::BranchId;

/// Named category of a user mistake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MistakeKind {
    NoSuchSentence,
    NoSuchToken,
    AlreadyUsed,
    DivideByVariable,
    DivideByNegation,
    DivideByBracket,
    NoNegation,
    CannotPerform,
    CannotSplit,
    UnknownRule,
    WrongContext,
    WrongRule,
    WrongPrecedence,
    NoVariables,
    NothingBetween,
    BracketNotClosed,
    BracketNotOpened,
    NoRightOperand,
    NoLeftOperand,
    InvalidSyntax,
    NoContradiction,
}

impl MistakeKind {
    /// Stable name used in logs and serialized reports.
    pub fn name(self) -> &'static str {
        match self {
            MistakeKind::NoSuchSentence => "no such sentence",
            MistakeKind::NoSuchToken => "no such token",
            MistakeKind::AlreadyUsed => "already used",
            MistakeKind::DivideByVariable => "divide by variable",
            MistakeKind::DivideByNegation => "divide by negation",
            MistakeKind::DivideByBracket => "divide by bracket",
            MistakeKind::NoNegation => "no negation",
            MistakeKind::CannotPerform => "cannot perform",
            MistakeKind::CannotSplit => "cannot split",
            MistakeKind::UnknownRule => "unknown rule",
            MistakeKind::WrongContext => "wrong context",
            MistakeKind::WrongRule => "wrong rule",
            MistakeKind::WrongPrecedence => "wrong precedence",
            MistakeKind::NoVariables => "no variables",
            MistakeKind::NothingBetween => "nothing between formulas",
            MistakeKind::BracketNotClosed => "bracket left open",
            MistakeKind::BracketNotOpened => "bracket not opened",
            MistakeKind::NoRightOperand => "no right",
            MistakeKind::NoLeftOperand => "no left",
            MistakeKind::InvalidSyntax => "invalid syntax",
            MistakeKind::NoContradiction => "no contradiction",
        }
    }

    /// Default message shown when no formula-specific text is available.
    pub fn default_message(self) -> &'static str {
        match self {
            MistakeKind::NoSuchSentence => "No such sentence",
            MistakeKind::NoSuchToken => "No such token",
            MistakeKind::AlreadyUsed => "This sentence was already used in a non-reusable rule",
            MistakeKind::DivideByVariable => "You can't divide a sentence by a variable",
            MistakeKind::DivideByNegation => "You can't divide a sentence by a negation",
            MistakeKind::DivideByBracket => "You can't divide a sentence by a parenthesis",
            MistakeKind::NoNegation => "You can't reduce a negation if it doesn't exist",
            MistakeKind::CannotPerform => "This rule can't be performed on this sentence",
            MistakeKind::CannotSplit => "One side of this connective is empty",
            MistakeKind::UnknownRule => "No such rule",
            MistakeKind::WrongContext => "Wrong context",
            MistakeKind::WrongRule => "This rule can't be used on this sentence",
            MistakeKind::WrongPrecedence => "Check which connective is the main one",
            MistakeKind::NoVariables => "The formula contains no variables",
            MistakeKind::NothingBetween => "Two formulas are not joined by a connective",
            MistakeKind::BracketNotClosed => "A bracket is never closed",
            MistakeKind::BracketNotOpened => "A bracket is never opened",
            MistakeKind::NoRightOperand => "A binary connective has no right operand",
            MistakeKind::NoLeftOperand => "A binary connective has no left operand",
            MistakeKind::InvalidSyntax => "The formula is not well formed",
            MistakeKind::NoContradiction => "These sentences don't contradict each other",
        }
    }
}

impl fmt::Display for MistakeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A user mistake: named kind, readable message, structured extra data.
///
/// Equality ignores the message so that the same mistake reported with a
/// different wording still deduplicates.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct Mistake {
    pub kind: MistakeKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Mistake {
    pub fn new(kind: MistakeKind) -> Self {
        Self { kind, message: kind.default_message().to_string(), extra: BTreeMap::new() }
    }

    pub fn with_message(kind: MistakeKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), extra: BTreeMap::new() }
    }

    /// Attach a structured value (token position, rule name, ...).
    pub fn with_extra(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

impl PartialEq for Mistake {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.extra == other.extra
    }
}

impl Eq for Mistake {}

/// Tokenizer failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unrecognized symbol '{symbol}' at byte {position}")]
    Unrecognized { symbol: String, position: usize },

    #[error("no lexeme can be generated for type '{0}'")]
    CannotGenerate(String),

    #[error("every fresh symbol for type '{0}' is already used")]
    Exhausted(String),

    #[error("invalid lexicon pattern: {0}")]
    Pattern(String),
}

/// Errors surfaced to the orchestrator.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Mistake(#[from] Mistake),

    #[error("invalid formula: {0}")]
    Syntax(Mistake),

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("there is no proof started")]
    NoProof,

    #[error("branch {0} doesn't exist in this proof")]
    UnknownBranch(BranchId),

    #[error("there is no branch on the {0}")]
    NoNeighbour(&'static str),

    #[error("all branches are closed")]
    AllClosed,

    #[error("branch {0} is already closed")]
    BranchClosed(BranchId),

    #[error("cannot undo {requested} step(s), only {available} recorded")]
    NothingToUndo { requested: usize, available: usize },

    #[error("an unfinished proof can't be checked")]
    Unfinished,

    #[error("no rule has been applied yet")]
    NoRulesUsed,

    #[error("unknown formal system '{0}'")]
    UnknownSystem(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("config: {0}")]
    Config(serde_json::Error),

    #[error("proof log: {0}")]
    Log(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// The wrapped user mistake, if this error is one.
    pub fn mistake(&self) -> Option<&Mistake> {
        match self {
            EngineError::Mistake(m) | EngineError::Syntax(m) => Some(m),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mistake_equality_ignores_message() {
        let a = Mistake::new(MistakeKind::WrongRule).with_extra("rule", "true and");
        let b = Mistake::with_message(MistakeKind::WrongRule, "'true and' can't be used on 'p'")
            .with_extra("rule", "true and");
        assert_eq!(a, b);
        assert_ne!(a, Mistake::new(MistakeKind::WrongRule));
    }

    #[test]
    fn engine_error_exposes_wrapped_mistake() {
        let err: EngineError = Mistake::new(MistakeKind::NoSuchSentence).into();
        assert_eq!(err.to_string(), "No such sentence");
        assert_eq!(err.mistake().map(|m| m.kind), Some(MistakeKind::NoSuchSentence));
        assert!(EngineError::NoProof.mistake().is_none());
    }
}
