//! Solver metrics.
//!
//! `Proof::solve` discards these; `Proof::solve_with_metrics` returns them for
//! profiling and for the CLI report.

use std::time::Duration;

use serde::Serialize;

// --- Metrics -----------------------------------------------------------------

#[derive(Debug, Default, Clone, Serialize)]
pub struct SolveMetrics {
    /// Total elapsed time of the solver run.
    pub total: Duration,
    /// Rules applied by the solver (across all passes).
    pub applications: usize,
    /// Branches closed while propagating.
    pub closures: usize,
    /// Times the solver rolled back to a snapshot.
    pub backtracks: usize,
    /// One entry per `propagate_rule` call that had pending work.
    pub passes: Vec<PassMetrics>,
}

/// A single propagation of one rule to exhaustion.
#[derive(Debug, Default, Clone, Serialize)]
pub struct PassMetrics {
    pub rule: &'static str,
    pub duration: Duration,
    /// Targets the rule was applied to.
    pub applied: usize,
    /// Branches closed right after one of those applications.
    pub closed: usize,
}

impl SolveMetrics {
    pub(crate) fn record(&mut self, pass: PassMetrics) {
        self.applications += pass.applied;
        self.closures += pass.closed;
        self.passes.push(pass);
    }
}
