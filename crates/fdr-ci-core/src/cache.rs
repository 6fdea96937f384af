//! Append-only p-value memo keyed by canonical fact.
//!
//! Raw p-values depend only on the data and the fact, never on the active
//! cutoff, so they are stored once and reused verbatim across every epoch.
//! There is no eviction.
//!
//! # Concurrency
//!
//! Lookups take a read lock. On a miss the oracle runs with no lock held and
//! the result is inserted with `entry().or_insert`, so concurrent misses for
//! the same fact may compute redundantly but every caller returns the single
//! value that landed in the map.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fact::Fact;

/// Counters describing cache traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered from the map.
    pub hits: u64,

    /// Lookups that invoked the compute function (includes benign races).
    pub misses: u64,

    /// Distinct facts stored.
    pub entries: usize,
}

/// Thread-safe, unbounded fact → raw p-value store.
#[derive(Debug)]
pub struct PValueCache<V> {
    entries: RwLock<HashMap<Fact<V>, f64>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> Default for PValueCache<V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

impl<V: Eq + Hash + Clone> PValueCache<V> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the stored p-value for `fact`, computing and storing it on
    /// first sight.
    pub fn lookup_or_compute<F>(&self, fact: &Fact<V>, compute: F) -> f64
    where
        F: FnOnce() -> f64,
    {
        if let Some(p) = self.entries.read().get(fact).copied() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return p;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let computed = compute();

        let mut entries = self.entries.write();
        let stored = *entries.entry(fact.clone()).or_insert(computed);
        debug!(
            entries = entries.len(),
            p_value = stored,
            "Cached raw p-value"
        );
        stored
    }

    /// Stored p-value, if any.
    pub fn get(&self, fact: &Fact<V>) -> Option<f64> {
        self.entries.read().get(fact).copied()
    }

    pub fn contains(&self, fact: &Fact<V>) -> bool {
        self.entries.read().contains_key(fact)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Point-in-time copy of every `(fact, p)` pair.
    pub fn entries(&self) -> Vec<(Fact<V>, f64)> {
        self.entries
            .read()
            .iter()
            .map(|(fact, p)| (fact.clone(), *p))
            .collect()
    }

    /// Every stored raw p-value, in no particular order.
    pub fn p_values(&self) -> Vec<f64> {
        self.entries.read().values().copied().collect()
    }

    /// Stored raw p-values grouped by conditioning-set size.
    pub fn p_values_by_stratum(&self) -> BTreeMap<usize, Vec<f64>> {
        let entries = self.entries.read();
        let mut strata: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
        for (fact, p) in entries.iter() {
            strata.entry(fact.stratum()).or_default().push(*p);
        }
        strata
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_compute_runs_once_per_fact() {
        let cache = PValueCache::new();
        let calls = Cell::new(0);
        let fact = Fact::new(1u32, 2, [3]);

        for _ in 0..5 {
            let p = cache.lookup_or_compute(&fact, || {
                calls.set(calls.get() + 1);
                0.42
            });
            assert_eq!(p, 0.42);
        }

        assert_eq!(calls.get(), 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 4,
                misses: 1,
                entries: 1
            }
        );
        println!("[PASS] test_compute_runs_once_per_fact");
    }

    #[test]
    fn test_symmetric_queries_share_an_entry() {
        let cache = PValueCache::new();
        let p1 = cache.lookup_or_compute(&Fact::new("a", "b", ["c", "d"]), || 0.3);
        let p2 = cache.lookup_or_compute(&Fact::new("b", "a", ["d", "c"]), || 0.9);
        assert_eq!(p1, 0.3);
        assert_eq!(p2, 0.3, "second query must hit the first entry");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_nan_is_stored_verbatim() {
        let cache = PValueCache::new();
        let fact = Fact::new(0u8, 1, Vec::new());
        assert!(cache.lookup_or_compute(&fact, || f64::NAN).is_nan());
        assert!(cache.get(&fact).unwrap().is_nan());
        // A stored NaN is still a hit.
        assert!(cache.lookup_or_compute(&fact, || 0.5).is_nan());
    }

    #[test]
    fn test_p_values_by_stratum() {
        let cache = PValueCache::new();
        cache.lookup_or_compute(&Fact::new(0u8, 1, Vec::new()), || 0.1);
        cache.lookup_or_compute(&Fact::new(0u8, 2, Vec::new()), || 0.2);
        cache.lookup_or_compute(&Fact::new(0u8, 1, [3, 4]), || 0.9);

        let strata = cache.p_values_by_stratum();
        assert_eq!(strata.len(), 2);
        let mut zero = strata[&0].clone();
        zero.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(zero, vec![0.1, 0.2]);
        assert_eq!(strata[&2], vec![0.9]);
        assert!(!strata.contains_key(&1));
    }

    #[test]
    fn test_concurrent_misses_converge_to_one_value() {
        let cache = PValueCache::new();
        let fact = Fact::new(10u32, 20, [30]);

        let results: Vec<f64> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let cache = &cache;
                    let fact = &fact;
                    s.spawn(move || cache.lookup_or_compute(fact, || 0.1 * (i + 1) as f64))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let stored = cache.get(&fact).unwrap();
        assert!(results.iter().all(|p| *p == stored));
        assert_eq!(cache.len(), 1);
        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 8);
        assert!(stats.misses >= 1 && stats.misses <= 8);
    }
}
