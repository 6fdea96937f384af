//! FDR-adjusted acceptance thresholds (Benjamini–Hochberg / Benjamini–Yekutieli).
//!
//! Decisions here follow "large p ⇒ accept independence", the mirror image of
//! the usual "small p ⇒ reject the null" framing the step-up procedures assume.
//! The procedure therefore runs on reflected values `p′ = clamp(1 − p, 0, 1)`:
//!
//! 1. reflect and sort ascending: `p′(1) ≤ … ≤ p′(m)`
//! 2. `q_adj = q` (BH) or `q / H_m` (BY), `H_m = Σ 1/i`
//! 3. `k` = largest `i` with `p′(i) ≤ i · q_adj / m`, scanning every `i`
//! 4. no such `k` ⇒ `α* = 1.0`, else `α* = 1 − p′(k)`
//!
//! The scan never stops early, so a non-monotone sequence of satisfied ranks
//! still selects the last one.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cutoff returned whenever nothing can be judged independent.
pub const CONSERVATIVE_ALPHA: f64 = 1.0;

/// Step-up procedure used to control the false discovery rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FdrMethod {
    /// Benjamini–Hochberg: valid under independence / positive dependence.
    #[default]
    #[serde(alias = "bh")]
    BenjaminiHochberg,
    /// Benjamini–Yekutieli: valid under arbitrary dependence.
    #[serde(alias = "by")]
    BenjaminiYekutieli,
}

impl FdrMethod {
    /// Effective level for `m` tests at target `q`.
    ///
    /// BY divides by the m-th harmonic number; with no tests both methods
    /// return `q` unchanged.
    pub fn adjusted_level(self, q: f64, m: usize) -> f64 {
        match self {
            Self::BenjaminiHochberg => q,
            Self::BenjaminiYekutieli if m == 0 => q,
            Self::BenjaminiYekutieli => q / harmonic_number(m),
        }
    }
}

impl fmt::Display for FdrMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BenjaminiHochberg => write!(f, "BH"),
            Self::BenjaminiYekutieli => write!(f, "BY"),
        }
    }
}

/// Population over which the cutoff is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutoffScope {
    /// One α* over every recorded fact.
    #[default]
    Global,
    /// One α* per conditioning-set size |Z|.
    StratifiedByConditioningSetSize,
}

impl fmt::Display for CutoffScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::StratifiedByConditioningSetSize => write!(f, "stratified_by_condset_size"),
        }
    }
}

/// `H_m = 1 + 1/2 + … + 1/m`. `H_0 = 0`.
pub fn harmonic_number(m: usize) -> f64 {
    (1..=m).map(|i| 1.0 / i as f64).sum()
}

/// Outcome of one step-up run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutoffComputation {
    /// Acceptance threshold: `p ≥ alpha_star` ⇒ independent.
    ///
    /// Reported as the raw p-value at rank `k` rather than `1 − p′(k)` so the
    /// rank-k fact itself compares exactly at the boundary.
    pub alpha_star: f64,

    /// Selected rank `k` (1-based); 0 when no rank satisfied the inequality.
    pub rejections: usize,

    /// Number of p-values in the population (`m`), NaN included.
    pub tested: usize,

    /// `q_adj` used for the inequality.
    pub adjusted_level: f64,
}

/// Run the reflected BH/BY step-up procedure over raw p-values.
///
/// NaN inputs count towards `m` but rank last and never satisfy the
/// inequality, so they only tighten the thresholds. An all-NaN input yields
/// [`CONSERVATIVE_ALPHA`].
pub fn compute_cutoff(p_values: &[f64], method: FdrMethod, q: f64) -> CutoffComputation {
    let m = p_values.len();

    // (reflected, raw) pairs; the raw value at rank k is the cutoff itself.
    let mut reflected: Vec<(f64, f64)> = p_values
        .iter()
        .filter(|p| !p.is_nan())
        .map(|&p| ((1.0 - p).clamp(0.0, 1.0), p.clamp(0.0, 1.0)))
        .collect();
    reflected.sort_by(|a, b| a.0.total_cmp(&b.0));

    let adjusted_level = method.adjusted_level(q, m);

    let mut k = 0;
    for (idx, (p_prime, _)) in reflected.iter().enumerate() {
        let i = idx + 1;
        if *p_prime <= (i as f64 * adjusted_level) / m as f64 {
            k = i;
        }
    }

    // α* = 1 − p′(k), read back from the raw value so it stays exact.
    let alpha_star = if k == 0 {
        CONSERVATIVE_ALPHA
    } else {
        reflected[k - 1].1
    };

    CutoffComputation {
        alpha_star,
        rejections: k,
        tested: m,
        adjusted_level,
    }
}

/// Convenience wrapper returning only α*.
pub fn compute_alpha_star(p_values: &[f64], method: FdrMethod, q: f64) -> f64 {
    compute_cutoff(p_values, method, q).alpha_star
}

/// Cutoff for one scope (`stratum == None`) or one |Z| stratum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratumCutoff {
    pub stratum: Option<usize>,
    pub computation: CutoffComputation,
}

/// Everything computed by one freeze, for logging and inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutoffSummary {
    pub method: FdrMethod,
    pub scope: CutoffScope,
    pub target_fdr: f64,
    pub cutoffs: Vec<StratumCutoff>,
}

/// Frozen acceptance threshold(s) for a decision epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CutoffModel {
    /// Nothing frozen yet; every lookup yields [`CONSERVATIVE_ALPHA`].
    #[default]
    Unset,
    Global {
        alpha_star: f64,
    },
    /// Strata without recorded facts are absent and resolve to
    /// [`CONSERVATIVE_ALPHA`].
    Stratified {
        alpha_stars: BTreeMap<usize, f64>,
    },
}

impl CutoffModel {
    /// Freeze one global cutoff over every recorded p-value.
    pub fn global(p_values: &[f64], method: FdrMethod, q: f64) -> (Self, CutoffSummary) {
        let computation = compute_cutoff(p_values, method, q);
        let summary = CutoffSummary {
            method,
            scope: CutoffScope::Global,
            target_fdr: q,
            cutoffs: vec![StratumCutoff {
                stratum: None,
                computation,
            }],
        };
        (
            Self::Global {
                alpha_star: computation.alpha_star,
            },
            summary,
        )
    }

    /// Freeze one cutoff per stratum, each from its own p-values only.
    pub fn stratified(
        by_stratum: &BTreeMap<usize, Vec<f64>>,
        method: FdrMethod,
        q: f64,
    ) -> (Self, CutoffSummary) {
        let mut alpha_stars = BTreeMap::new();
        let mut cutoffs = Vec::with_capacity(by_stratum.len());

        for (&stratum, p_values) in by_stratum {
            let computation = compute_cutoff(p_values, method, q);
            debug!(
                stratum,
                alpha_star = computation.alpha_star,
                rejections = computation.rejections,
                tested = computation.tested,
                "Computed stratum cutoff"
            );
            alpha_stars.insert(stratum, computation.alpha_star);
            cutoffs.push(StratumCutoff {
                stratum: Some(stratum),
                computation,
            });
        }

        let summary = CutoffSummary {
            method,
            scope: CutoffScope::StratifiedByConditioningSetSize,
            target_fdr: q,
            cutoffs,
        };
        (Self::Stratified { alpha_stars }, summary)
    }

    /// α* applicable to facts with `|Z| == stratum`. Never fails.
    pub fn alpha_for(&self, stratum: usize) -> f64 {
        match self {
            Self::Unset => CONSERVATIVE_ALPHA,
            Self::Global { alpha_star } => *alpha_star,
            Self::Stratified { alpha_stars } => alpha_stars
                .get(&stratum)
                .copied()
                .unwrap_or(CONSERVATIVE_ALPHA),
        }
    }

    /// Decision rule for the deciding epoch: `p ≥ α*`. NaN is never independent.
    pub fn is_independent(&self, p_value: f64, stratum: usize) -> bool {
        p_value >= self.alpha_for(stratum)
    }

    pub fn is_frozen(&self) -> bool {
        !matches!(self, Self::Unset)
    }
}
