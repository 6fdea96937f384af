//! FDR-controlled conditional-independence decisions across search epochs.
//!
//! [`FdrIndependenceWrapper`] sits between a search algorithm and a raw CI
//! oracle. It owns all per-run state: the p-value cache, the epoch state, the
//! frozen cutoff model and the mind-change snapshot.
//!
//! # Protocol
//!
//! ```text
//! pass 0        RECORDING   adjudicate() fills the cache
//!               compute_cutoffs_from_recorded_pvals()  -> DECIDING
//! pass 1..n     DECIDING    adjudicate() uses p >= α*(|Z|)
//!               count_mind_changes_and_snapshot()  after each pass
//! ```
//!
//! Transitions must only run between passes. Queries within a pass may run
//! concurrently from any number of threads.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::PValueCache;
use crate::config::FdrConfig;
use crate::cutoff::{CutoffModel, CutoffScope, CutoffSummary, CONSERVATIVE_ALPHA};
use crate::epoch::EpochState;
use crate::error::FdrResult;
use crate::fact::Fact;
use crate::oracle::IndependenceOracle;
use crate::result::Adjudication;
use crate::tracker::MindChangeTracker;

/// Aggregate counters for one wrapper instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapperStats {
    /// Calls into the wrapped oracle.
    pub oracle_evaluations: u64,
    /// Queries answered from the cache.
    pub cache_hits: u64,
    /// Distinct facts recorded.
    pub facts: usize,
    /// Total `adjudicate` calls.
    pub adjudications: u64,
    /// Number of cutoff freezes performed.
    pub freezes: u64,
    pub epoch: EpochState,
}

/// Decision layer over an [`IndependenceOracle`].
pub struct FdrIndependenceWrapper<V, O> {
    config: FdrConfig,
    oracle: Arc<O>,
    /// Oracle's own alpha, or 1.0; used only while recording.
    base_alpha: f64,
    cache: PValueCache<V>,
    state: RwLock<EpochState>,
    cutoff: RwLock<Arc<CutoffModel>>,
    tracker: MindChangeTracker<V>,
    oracle_evaluations: AtomicU64,
    adjudications: AtomicU64,
    freezes: AtomicU64,
}

impl<V, O> FdrIndependenceWrapper<V, O>
where
    V: Ord + Hash + Clone,
    O: IndependenceOracle<V>,
{
    /// Wrap `oracle` under `config`.
    ///
    /// # Errors
    ///
    /// `FdrError::InvalidTargetFdr` when `config.target_fdr` is not in (0, 1).
    pub fn new(oracle: Arc<O>, config: FdrConfig) -> FdrResult<Self> {
        config.validate()?;
        Ok(Self::build(oracle, config))
    }

    /// Wrap with [`FdrConfig::default`] (BH, q = 0.05, global).
    pub fn with_defaults(oracle: Arc<O>) -> Self {
        Self::build(oracle, FdrConfig::default())
    }

    fn build(oracle: Arc<O>, config: FdrConfig) -> Self {
        let base_alpha =
            IndependenceOracle::<V>::configured_alpha(&*oracle).unwrap_or(CONSERVATIVE_ALPHA);

        info!(
            method = %config.method,
            target_fdr = config.target_fdr,
            scope = %config.scope,
            base_alpha,
            "Created FDR independence wrapper"
        );

        Self {
            config,
            oracle,
            base_alpha,
            cache: PValueCache::new(),
            state: RwLock::new(EpochState::Recording),
            cutoff: RwLock::new(Arc::new(CutoffModel::Unset)),
            tracker: MindChangeTracker::new(),
            oracle_evaluations: AtomicU64::new(0),
            adjudications: AtomicU64::new(0),
            freezes: AtomicU64::new(0),
        }
    }

    /// Decide whether `x _||_ y | z`.
    ///
    /// The oracle is consulted only the first time the canonical fact is seen.
    /// Recording: `p > base_alpha`. Deciding: `p >= α*(|Z|)`. A NaN p-value is
    /// always dependent.
    pub fn adjudicate(&self, x: &V, y: &V, z: &[V]) -> Adjudication<V> {
        self.adjudications.fetch_add(1, Ordering::Relaxed);

        let fact = Fact::from_refs(x, y, z);
        let p_value = self.cache.lookup_or_compute(&fact, || {
            self.oracle_evaluations.fetch_add(1, Ordering::Relaxed);
            let p = self.oracle.evaluate(fact.first(), fact.second(), fact.conditioning());
            if p.is_nan() {
                warn!(stratum = fact.stratum(), "Oracle returned NaN p-value");
            }
            p
        });

        let epoch = *self.state.read();
        let (independent, alpha_used) = match epoch {
            EpochState::Recording => (p_value > self.base_alpha, self.base_alpha),
            EpochState::Deciding => {
                let model = self.cutoff_model();
                let alpha = model.alpha_for(fact.stratum());
                (p_value >= alpha, alpha)
            }
        };

        Adjudication::new(fact, independent, p_value, alpha_used, epoch)
    }

    /// Enter the recording regime. The cache is kept.
    pub fn start_recording_epoch(&self) {
        let mut state = self.state.write();
        let previous = *state;
        *state = EpochState::Recording;
        info!(
            previous = %previous,
            cached_facts = self.cache.len(),
            "Started recording epoch"
        );
    }

    /// Freeze a cutoff model from every recorded p-value and enter the
    /// deciding regime. The mind-change snapshot is invalidated because
    /// decisions under the old cutoff are no longer comparable.
    pub fn compute_cutoffs_from_recorded_pvals(&self) -> CutoffSummary {
        let FdrConfig {
            method,
            target_fdr,
            scope,
        } = self.config;

        let (model, summary) = match scope {
            CutoffScope::Global => CutoffModel::global(&self.cache.p_values(), method, target_fdr),
            CutoffScope::StratifiedByConditioningSetSize => {
                CutoffModel::stratified(&self.cache.p_values_by_stratum(), method, target_fdr)
            }
        };

        for cutoff in &summary.cutoffs {
            info!(
                method = %method,
                scope = %scope,
                stratum = ?cutoff.stratum,
                alpha_star = cutoff.computation.alpha_star,
                rejections = cutoff.computation.rejections,
                tested = cutoff.computation.tested,
                "Froze FDR cutoff"
            );
        }

        *self.cutoff.write() = Arc::new(model);
        *self.state.write() = EpochState::Deciding;
        self.tracker.invalidate();
        self.freezes.fetch_add(1, Ordering::Relaxed);

        summary
    }

    /// Number of facts whose decision flipped since the previous decision
    /// pass; replaces the snapshot. Always 0 while recording.
    pub fn count_mind_changes_and_snapshot(&self) -> usize {
        if !self.epoch_state().is_deciding() {
            return 0;
        }

        let model = self.cutoff_model();
        let current: HashMap<Fact<V>, bool> = self
            .cache
            .entries()
            .into_iter()
            .map(|(fact, p)| {
                let decision = model.is_independent(p, fact.stratum());
                (fact, decision)
            })
            .collect();

        let had_baseline = self.tracker.has_snapshot();
        let changes = self.tracker.count_and_replace(current);

        debug!(
            changes,
            had_baseline,
            snapshot = self.tracker.snapshot_len(),
            "Counted mind changes"
        );
        changes
    }

    pub fn epoch_state(&self) -> EpochState {
        *self.state.read()
    }

    /// The active cutoff model (shared; replaced on each freeze).
    pub fn cutoff_model(&self) -> Arc<CutoffModel> {
        Arc::clone(&*self.cutoff.read())
    }

    /// α* that a deciding-epoch query for `fact` would use.
    pub fn alpha_star_for(&self, fact: &Fact<V>) -> f64 {
        self.cutoff.read().alpha_for(fact.stratum())
    }

    pub fn base_alpha(&self) -> f64 {
        self.base_alpha
    }

    pub fn config(&self) -> &FdrConfig {
        &self.config
    }

    pub fn cache(&self) -> &PValueCache<V> {
        &self.cache
    }

    pub fn oracle(&self) -> &Arc<O> {
        &self.oracle
    }

    pub fn stats(&self) -> WrapperStats {
        let cache = self.cache.stats();
        WrapperStats {
            oracle_evaluations: self.oracle_evaluations.load(Ordering::Relaxed),
            cache_hits: cache.hits,
            facts: cache.entries,
            adjudications: self.adjudications.load(Ordering::Relaxed),
            freezes: self.freezes.load(Ordering::Relaxed),
            epoch: self.epoch_state(),
        }
    }
}
