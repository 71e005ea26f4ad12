//! Formal systems and their rule sets.
//!
//! Each system lives in its own directory with the same layout:
//!
//! - `rules.rs`: the rules (built with `rule!`), the operator table and the
//!   [`FormalSystem`](crate::FormalSystem) implementation,
//! - `helpers.rs`: the shared rule bodies,
//! - `predicates.rs`: shape tests on formulas,
//! - `tests.rs`: table-driven cases.

pub(crate) mod propositional {
    pub(crate) mod helpers;
    pub(crate) mod predicates;
    pub(crate) mod rules;

    #[cfg(test)]
    mod tests;
}

pub use propositional::rules::Propositional;
