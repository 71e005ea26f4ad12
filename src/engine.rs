//! Proof engine.
//!
//! This module owns everything that changes while a proof is built: the tree,
//! the rule log, closure detection and the solver. Formal systems plug in
//! through [`FormalSystem`](crate::FormalSystem) and never touch the tree
//! directly.
//!
//! ## How the parts work together
//!
//! ```text
//! formula ── FormalSystem::prepare_for_proving ──> root
//!                                                   │
//!                                          Proof::new (proof.rs)
//!                                                   │
//!     user / replay                                 │                solver
//!  Proof::use_rule_on ──> FormalSystem::use_rule    │    solve (solver.rs)
//!    (naive form)             │                     │     strict form per target
//!                             v                     v
//!                      ProofTree::append (tree.rs) <─┘
//!                             │
//!                             v
//!                 check_closure (closure.rs)
//!                   - canonical keys (canonical.rs)
//!                   - contradiction / emptiness
//! ```
//!
//! ## Responsibilities by module
//!
//! - `tree.rs`: node arena, branches, layers, pruning.
//! - `proof.rs`: rule log, active branch, undo, copy/replay, proof check.
//! - `solver.rs`: rule propagation along the priority index, backtracking.
//! - `rule_index.rs`: the immutable rule-priority tree.
//! - `canonical.rs`: canonical keys and per-branch history.
//! - `closure.rs`: the unsigned-tableau closure criterion.
//! - `syntax.rs`: shape-based syntax check shared by formal systems.
//! - `metrics.rs`: solver timing and counters.
//!
//! ## Debugging
//!
//! Every rule application, closure and backtrack emits a `tracing` event at
//! `debug` level. The binary turns them on with `LARCH_DEBUG_RULES=1`.

#[path = "engine/canonical.rs"]
mod canonical;
#[path = "engine/closure.rs"]
mod closure;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/proof.rs"]
mod proof;
#[path = "engine/rule_index.rs"]
mod rule_index;
#[path = "engine/solver.rs"]
mod solver;
#[path = "engine/syntax.rs"]
mod syntax;
#[path = "engine/tree.rs"]
mod tree;

pub use canonical::{CanonicalKey, History, KeyPart, canonical_key};
pub use closure::{check_closure, contradicts};
pub use metrics::{PassMetrics, SolveMetrics};
pub use proof::{Proof, Side};
pub use rule_index::{RuleId, RuleIndex};
pub use syntax::{SyntaxAlphabet, check_syntax};
pub use tree::{NodeId, ProofNode, ProofTree};
