//! Recording / deciding protocol state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which regime a pass of the driving search runs under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpochState {
    /// Queries populate the p-value cache; decisions use the oracle's own alpha.
    #[default]
    Recording,
    /// Queries are adjudicated against the frozen cutoff model.
    Deciding,
}

impl EpochState {
    pub fn is_deciding(self) -> bool {
        matches!(self, Self::Deciding)
    }
}

impl fmt::Display for EpochState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recording => write!(f, "recording"),
            Self::Deciding => write!(f, "deciding"),
        }
    }
}
