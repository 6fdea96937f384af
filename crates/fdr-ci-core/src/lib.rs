//! FDR-controlled conditional-independence decisions.
//!
//! Constraint-based causal discovery issues thousands of conditional
//! independence (CI) queries, many of them repeated across passes. Accepting
//! independence whenever `p > α` accumulates false "independent" calls across
//! all those tests. This crate sits between the search and a raw CI oracle and:
//!
//! - memoizes each raw p-value per canonical fact (one oracle call per fact)
//! - freezes a Benjamini–Hochberg / Benjamini–Yekutieli acceptance threshold
//!   α*, globally or per conditioning-set size
//! - counts decision flips between consecutive decision passes so the search
//!   can stop at a fixed point
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   adjudicate(x, y, z)   ┌─────────────────────────┐
//! │  search driver   │ ──────────────────────▶ │ FdrIndependenceWrapper  │
//! └──────────────────┘                         │  Fact ─▶ PValueCache ───┼──▶ IndependenceOracle
//!                                              │  EpochState             │
//!                                              │  CutoffModel (BH / BY)  │
//!                                              │  MindChangeTracker      │
//!                                              └─────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use fdr_ci_core::{CutoffScope, FdrConfig, FdrIndependenceWrapper, FdrMethod, FnOracle};
//!
//! let oracle = FnOracle::new(|x: &u32, y: &u32, _z: &[u32]| if x + y > 4 { 0.97 } else { 0.01 });
//! let config = FdrConfig::new(FdrMethod::BenjaminiHochberg, 0.1, CutoffScope::Global);
//! let wrapper = FdrIndependenceWrapper::new(Arc::new(oracle), config).unwrap();
//!
//! // Recording pass
//! for y in 1..6 {
//!     wrapper.adjudicate(&0, &y, &[]);
//! }
//! wrapper.compute_cutoffs_from_recorded_pvals();
//!
//! // Deciding pass
//! let result = wrapper.adjudicate(&5, &0, &[]);
//! assert_eq!(result.p_value, 0.97);
//! assert_eq!(wrapper.count_mind_changes_and_snapshot(), 0);
//! ```

pub mod cache;
pub mod config;
pub mod cutoff;
pub mod driver;
pub mod epoch;
pub mod error;
pub mod fact;
pub mod oracle;
pub mod result;
pub mod tracker;
pub mod wrapper;

// Re-exports for convenience
pub use cache::{CacheStats, PValueCache};
pub use config::FdrConfig;
pub use cutoff::{
    compute_alpha_star, compute_cutoff, harmonic_number, CutoffComputation, CutoffModel,
    CutoffScope, CutoffSummary, FdrMethod, StratumCutoff, CONSERVATIVE_ALPHA,
};
pub use driver::{run_to_fixed_point, ConvergenceOptions, ConvergenceReport};
pub use epoch::EpochState;
pub use error::{FdrError, FdrResult};
pub use fact::Fact;
pub use oracle::{FnOracle, IndependenceOracle};
pub use result::Adjudication;
pub use tracker::MindChangeTracker;
pub use wrapper::{FdrIndependenceWrapper, WrapperStats};
