//! Canonical independence facts.
//!
//! A [`Fact`] is the order-independent identity of a conditional-independence
//! query `X _||_ Y | Z`. The pair `{X, Y}` is stored smaller-first and the
//! conditioning set is stored as a sorted, de-duplicated sequence, so queries
//! issued as `(X, Y, Z)` or `(Y, X, Z')` for any permutation `Z'` of `Z`
//! collapse to one cache entry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical `{X, Y} | Z` key.
///
/// Equality and hashing are structural over `(first, second, conditioning)`.
/// `X == Y` is not guarded; callers must supply distinct variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fact<V> {
    first: V,
    second: V,
    conditioning: Vec<V>,
}

impl<V: Ord + Clone> Fact<V> {
    /// Build the canonical fact for `x _||_ y | z`.
    pub fn new<I>(x: V, y: V, z: I) -> Self
    where
        I: IntoIterator<Item = V>,
    {
        let (first, second) = if y < x { (y, x) } else { (x, y) };
        let mut conditioning: Vec<V> = z.into_iter().collect();
        conditioning.sort();
        conditioning.dedup();

        Self {
            first,
            second,
            conditioning,
        }
    }

    /// Build from borrowed parts, cloning each variable once.
    pub fn from_refs(x: &V, y: &V, z: &[V]) -> Self {
        Self::new(x.clone(), y.clone(), z.iter().cloned())
    }
}

impl<V> Fact<V> {
    /// Smaller variable of the pair.
    pub fn first(&self) -> &V {
        &self.first
    }

    /// Larger variable of the pair.
    pub fn second(&self) -> &V {
        &self.second
    }

    /// Sorted conditioning set.
    pub fn conditioning(&self) -> &[V] {
        &self.conditioning
    }

    /// The pair in canonical order.
    pub fn variables(&self) -> (&V, &V) {
        (&self.first, &self.second)
    }

    /// Stratum key: the conditioning-set size |Z|.
    pub fn stratum(&self) -> usize {
        self.conditioning.len()
    }
}

impl<V: fmt::Display> fmt::Display for Fact<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} _||_ {}", self.first, self.second)?;
        if let Some((head, tail)) = self.conditioning.split_first() {
            write!(f, " | {}", head)?;
            for z in tail {
                write!(f, ", {}", z)?;
            }
        }
        Ok(())
    }
}
