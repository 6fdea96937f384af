//! Fixed-point pass driver.
//!
//! Runs the recording pass, freezes the cutoffs, then repeats deciding passes
//! until the number of mind changes drops to the tolerance. The search pass
//! itself is supplied by the caller as a closure.

use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cutoff::CutoffSummary;
use crate::error::{FdrError, FdrResult};
use crate::oracle::IndependenceOracle;
use crate::wrapper::FdrIndependenceWrapper;

/// Stopping rule for [`run_to_fixed_point`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergenceOptions {
    /// Stop once a pass changes at most this many decisions.
    pub tolerance: usize,
    /// Upper bound on deciding passes.
    pub max_passes: usize,
}

impl Default for ConvergenceOptions {
    fn default() -> Self {
        Self {
            tolerance: 0,
            max_passes: 10,
        }
    }
}

impl ConvergenceOptions {
    pub fn validate(&self) -> FdrResult<()> {
        if self.max_passes == 0 {
            return Err(FdrError::invalid_parameter("max_passes must be >= 1"));
        }
        Ok(())
    }
}

/// What happened during a driven run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    /// Deciding passes executed (excludes the recording pass).
    pub decision_passes: usize,
    /// Mind changes after each deciding pass. The first entry is always 0
    /// because it only establishes the baseline snapshot.
    pub mind_changes: Vec<usize>,
    /// Whether the tolerance was reached before `max_passes`.
    pub converged: bool,
    /// Cutoffs frozen after the recording pass.
    pub cutoffs: CutoffSummary,
}

/// Drive `pass` to a decision fixed point.
///
/// `pass` receives the wrapper and the pass index (0 is the recording pass).
/// Convergence is only judged from the second deciding pass on, since the
/// first one has nothing to compare against.
pub fn run_to_fixed_point<V, O, F>(
    wrapper: &FdrIndependenceWrapper<V, O>,
    options: ConvergenceOptions,
    mut pass: F,
) -> FdrResult<ConvergenceReport>
where
    V: Ord + Hash + Clone,
    O: IndependenceOracle<V>,
    F: FnMut(&FdrIndependenceWrapper<V, O>, usize),
{
    options.validate()?;

    wrapper.start_recording_epoch();
    pass(wrapper, 0);
    let cutoffs = wrapper.compute_cutoffs_from_recorded_pvals();

    let mut mind_changes = Vec::with_capacity(options.max_passes);
    let mut converged = false;

    for index in 1..=options.max_passes {
        pass(wrapper, index);
        let changes = wrapper.count_mind_changes_and_snapshot();
        mind_changes.push(changes);

        if index >= 2 && changes <= options.tolerance {
            converged = true;
            break;
        }
    }

    let report = ConvergenceReport {
        decision_passes: mind_changes.len(),
        mind_changes,
        converged,
        cutoffs,
    };

    info!(
        decision_passes = report.decision_passes,
        converged = report.converged,
        last_changes = report.mind_changes.last().copied().unwrap_or(0),
        "Finished fixed-point run"
    );

    Ok(report)
}
