//! Result returned to the driving search for each adjudicated query.

use serde::{Deserialize, Serialize};

use crate::epoch::EpochState;
use crate::fact::Fact;

/// Outcome of one `adjudicate` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjudication<V> {
    /// Canonical fact the query resolved to.
    pub fact: Fact<V>,

    /// `true` when the pair is judged independent given the conditioning set.
    pub independent: bool,

    /// Cached raw p-value (may be NaN).
    pub p_value: f64,

    /// `alpha_used - p_value`.
    pub score: f64,

    /// Threshold the decision was made against.
    pub alpha_used: f64,

    /// Regime the decision was made under.
    pub epoch: EpochState,
}

impl<V> Adjudication<V> {
    pub(crate) fn new(
        fact: Fact<V>,
        independent: bool,
        p_value: f64,
        alpha_used: f64,
        epoch: EpochState,
    ) -> Self {
        Self {
            fact,
            independent,
            p_value,
            score: alpha_used - p_value,
            alpha_used,
            epoch,
        }
    }

    pub fn is_dependent(&self) -> bool {
        !self.independent
    }
}
