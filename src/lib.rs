//! Analytic-tableau theorem prover for propositional logic.
//!
//! A formula is tokenized, negated and placed at the root of a proof tree.
//! Formulas are then decomposed with Smullyan-style rules until every branch
//! is closed, either by a contradiction (the input is a tautology on that
//! branch) or because nothing is left to decompose.
//!
//! ```
//! use larch::prove;
//!
//! let verdict = prove("p imp p").unwrap();
//! assert!(verdict.closed);
//! assert!(verdict.tautology);
//! ```
//!
//! Interactive use goes through [`Session`], which mirrors what a proof
//! assistant front end needs: applying named rules by hand, undoing them,
//! jumping between branches, checking a finished proof and replaying a log.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[macro_use]
mod macros;
mod api;
mod config;
mod engine;
mod error;
mod formula;
mod lexicon;
mod rules;
mod system;

pub use api::{Session, Verdict, prove, prove_with};
pub use config::Config;
pub use engine::{
    CanonicalKey, History, KeyPart, NodeId, PassMetrics, Proof, ProofNode, ProofTree, RuleId, RuleIndex, Side,
    SolveMetrics, canonical_key,
};
pub use error::{EngineError, LexError, Mistake, MistakeKind};
pub use formula::{Components, Formula, OperatorTable};
pub use lexicon::Lexicon;
pub use rules::Propositional;
pub use system::{FormalSystem, HistoryOp, RuleOutcome, by_name};

// --- Tokens -----------------------------------------------------------------

pub const OPEN_BRACKET: &str = "(";
pub const CLOSE_BRACKET: &str = ")";

/// One element of the alphabet: a semantic type plus the surface text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Semantic category (`sentvar`, `and`, `not`, `(`, ...).
    pub kind: String,
    /// Text as written by the user.
    pub lexem: String,
    #[serde(default)]
    pub is_literal: bool,
}

impl Token {
    pub fn new(kind: impl Into<String>, lexem: impl Into<String>) -> Self {
        Token { kind: kind.into(), lexem: lexem.into(), is_literal: false }
    }

    /// A token whose type and lexeme are the same literal text.
    pub fn literal(text: &str) -> Self {
        Token { kind: text.to_string(), lexem: text.to_string(), is_literal: true }
    }

    pub fn open_bracket() -> Self {
        Token::literal(OPEN_BRACKET)
    }

    pub fn close_bracket() -> Self {
        Token::literal(CLOSE_BRACKET)
    }

    pub fn is_open_bracket(&self) -> bool {
        self.kind == OPEN_BRACKET
    }

    pub fn is_close_bracket(&self) -> bool {
        self.kind == CLOSE_BRACKET
    }

    pub fn is_bracket(&self) -> bool {
        self.is_open_bracket() || self.is_close_bracket()
    }
}

// --- Branches and closures --------------------------------------------------

/// Identifier of a branch, unique among the current leaves of a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(pub u32);

impl BranchId {
    pub const ROOT: BranchId = BranchId(0);
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal verdict attached to a leaf.
///
/// Positions in `Contradiction` index into the branch, root formula at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Close {
    Contradiction { first: usize, second: usize },
    Emptiness,
}

impl Close {
    /// Whether the closure counts toward proving the root formula.
    pub fn success(&self) -> bool {
        matches!(self, Close::Contradiction { .. })
    }
}

impl fmt::Display for Close {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Close::Contradiction { first, second } => write!(f, "contradiction ({first}, {second})"),
            Close::Emptiness => f.write_str("emptiness"),
        }
    }
}

// --- Rule application -------------------------------------------------------

/// Output of one rule application.
#[derive(Debug, Clone, PartialEq)]
pub enum Decomposition {
    /// Conjunctive step: formulas appended to the same branch, in order.
    SameBranch(Vec<Formula>),
    /// Disjunctive step: one new sibling branch per inner list.
    NewBranches(Vec<Vec<Formula>>),
}

impl Decomposition {
    pub fn branch_count(&self) -> usize {
        match self {
            Decomposition::SameBranch(_) => 1,
            Decomposition::NewBranches(branches) => branches.len(),
        }
    }

    /// Every produced formula, branch by branch.
    pub fn formulas(&self) -> Vec<&Formula> {
        match self {
            Decomposition::SameBranch(formulas) => formulas.iter().collect(),
            Decomposition::NewBranches(branches) => branches.iter().flatten().collect(),
        }
    }

    pub fn into_branches(self) -> Vec<Vec<Formula>> {
        match self {
            Decomposition::SameBranch(formulas) => vec![formulas],
            Decomposition::NewBranches(branches) => branches,
        }
    }
}

/// Rule parameters supplied by the caller (`sentenceID`, `tokenID`, ...).
pub type RuleContext = BTreeMap<String, i64>;

/// Non-deterministic choices made while applying a rule, kept for replay.
pub type Decisions = BTreeMap<String, serde_json::Value>;

/// Audit and replay record of one applied rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsedRule {
    pub layer: usize,
    pub branch: BranchId,
    pub rule: String,
    #[serde(default)]
    pub context: RuleContext,
    #[serde(default)]
    pub decisions: Decisions,
    #[serde(default)]
    pub auto: bool,
}

/// A branch the user closed by pointing at two contradictory formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredClose {
    pub branch: BranchId,
    pub first: usize,
    pub second: usize,
}

/// Root formula plus the ordered rule log: enough to rebuild a proof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofLog {
    pub system: String,
    pub root: Vec<Token>,
    pub rules: Vec<UsedRule>,
    /// Closures declared by hand, re-applied after the rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub declared: Vec<DeclaredClose>,
}

/// Description of one context parameter a rule needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContextDef {
    /// Key under which the value is passed in a [`RuleContext`].
    pub variable: &'static str,
    /// Name shown to the user.
    pub official: &'static str,
    pub docs: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

pub const SENTENCE_ID: ContextDef = ContextDef {
    variable: "sentenceID",
    official: "Sentence Number",
    docs: "The number of the sentence in this branch",
    kind: "sentenceID",
};

pub const TOKEN_ID: ContextDef = ContextDef {
    variable: "tokenID",
    official: "Token Number",
    docs: "The number of the symbol in the sentence",
    kind: "tokenID",
};

pub(crate) type StrictFn = Box<dyn Fn(&Formula) -> Option<Decomposition> + Send + Sync>;
pub(crate) type NaiveFn = Box<dyn Fn(&[Formula], &RuleContext) -> Result<Decomposition, Mistake> + Send + Sync>;

/// A named tableau rule.
///
/// `strict` decomposes a whole formula using its main connective and is what
/// the solver and the checker rely on. `naive` follows a user-chosen sentence
/// and token position, so it can also produce wrong (but checkable) steps.
pub struct Rule {
    pub name: &'static str,
    /// Notation such as `A and B / A; B`.
    pub symbolic: &'static str,
    pub docs: &'static str,
    /// Non-reusable rules consume their premise on the branch.
    pub reusable: bool,
    pub context: &'static [ContextDef],
    pub(crate) strict: StrictFn,
    pub(crate) naive: NaiveFn,
}

impl Rule {
    pub fn strict(&self, formula: &Formula) -> Option<Decomposition> {
        (self.strict)(formula)
    }

    pub fn naive(&self, branch: &[Formula], context: &RuleContext) -> Result<Decomposition, Mistake> {
        (self.naive)(branch, context)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("symbolic", &self.symbolic)
            .field("reusable", &self.reusable)
            .field("strict", &"<function>")
            .field("naive", &"<function>")
            .finish()
    }
}
