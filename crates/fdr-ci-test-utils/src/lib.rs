//! Deterministic oracles and p-value generators for fdr-ci tests.
//!
//! Everything here is reproducible: p-values are either scripted per
//! canonical fact or derived from sin-based sequences, never sampled at
//! test time unless a seed is supplied.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use fdr_ci_core::{Fact, IndependenceOracle};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Oracle answering from a table keyed by canonical fact.
///
/// Unscripted facts return `fallback` (NaN by default). Every call is
/// counted, in total and per fact.
#[derive(Debug)]
pub struct ScriptedOracle {
    table: HashMap<Fact<u32>, f64>,
    fallback: f64,
    alpha: Option<f64>,
    calls: AtomicUsize,
    per_fact: Mutex<HashMap<Fact<u32>, usize>>,
}

impl Default for ScriptedOracle {
    fn default() -> Self {
        Self {
            table: HashMap::new(),
            fallback: f64::NAN,
            alpha: None,
            calls: AtomicUsize::new(0),
            per_fact: Mutex::new(HashMap::new()),
        }
    }
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the p-value for `x _||_ y | z` (any order).
    pub fn with_fact(mut self, x: u32, y: u32, z: &[u32], p: f64) -> Self {
        self.table.insert(Fact::from_refs(&x, &y, z), p);
        self
    }

    pub fn with_fallback(mut self, p: f64) -> Self {
        self.fallback = p;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Total `evaluate` calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `evaluate` calls for one fact (any order of arguments).
    pub fn calls_for(&self, x: u32, y: u32, z: &[u32]) -> usize {
        let fact = Fact::from_refs(&x, &y, z);
        self.per_fact.lock().get(&fact).copied().unwrap_or(0)
    }
}

impl IndependenceOracle<u32> for ScriptedOracle {
    fn evaluate(&self, x: &u32, y: &u32, z: &[u32]) -> f64 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let fact = Fact::from_refs(x, y, z);
        let p = self.table.get(&fact).copied().unwrap_or(self.fallback);
        *self.per_fact.lock().entry(fact).or_insert(0) += 1;
        p
    }

    fn configured_alpha(&self) -> Option<f64> {
        self.alpha
    }
}

/// `n` variables `0..n`.
pub fn variables(n: u32) -> Vec<u32> {
    (0..n).collect()
}

/// Deterministic p-values in `[0, 1]` from a sin sequence.
pub fn generate_p_values(count: usize, seed: u64) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let x = (i as f64 + seed as f64) * 0.37;
            (x.sin() + 1.0) / 2.0
        })
        .collect()
}

/// Seeded uniform p-values, optionally scaled into `[low, high]`.
pub fn seeded_p_values(count: usize, seed: u64, low: f64, high: f64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| rng.gen_range(low..=high)).collect()
}

/// Every unordered pair over `vars` with the empty conditioning set.
pub fn marginal_pairs(vars: &[u32]) -> Vec<(u32, u32)> {
    let mut pairs = Vec::new();
    for (i, x) in vars.iter().enumerate() {
        for y in &vars[i + 1..] {
            pairs.push((*x, *y));
        }
    }
    pairs
}
