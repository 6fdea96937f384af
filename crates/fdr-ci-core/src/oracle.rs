//! Conditional-independence oracle contract.
//!
//! Test adapters (likelihood-ratio, rank, kernel, correlation) live outside
//! this crate; they only need to implement [`IndependenceOracle`]. The
//! configured significance level is an optional capability rather than
//! something probed at runtime.

use std::fmt;
use std::sync::Arc;

/// Raw CI test: `evaluate(x, y, z)` returns a p-value in `[0, 1]`, or NaN
/// when the underlying test fails.
pub trait IndependenceOracle<V>: Send + Sync {
    /// Raw p-value for `x _||_ y | z`.
    fn evaluate(&self, x: &V, y: &V, z: &[V]) -> f64;

    /// The oracle's own significance level, if it has one.
    fn configured_alpha(&self) -> Option<f64> {
        None
    }
}

impl<V, O> IndependenceOracle<V> for &O
where
    O: IndependenceOracle<V> + ?Sized,
{
    fn evaluate(&self, x: &V, y: &V, z: &[V]) -> f64 {
        (**self).evaluate(x, y, z)
    }

    fn configured_alpha(&self) -> Option<f64> {
        (**self).configured_alpha()
    }
}

impl<V, O> IndependenceOracle<V> for Arc<O>
where
    O: IndependenceOracle<V> + ?Sized,
{
    fn evaluate(&self, x: &V, y: &V, z: &[V]) -> f64 {
        (**self).evaluate(x, y, z)
    }

    fn configured_alpha(&self) -> Option<f64> {
        (**self).configured_alpha()
    }
}

impl<V, O> IndependenceOracle<V> for Box<O>
where
    O: IndependenceOracle<V> + ?Sized,
{
    fn evaluate(&self, x: &V, y: &V, z: &[V]) -> f64 {
        (**self).evaluate(x, y, z)
    }

    fn configured_alpha(&self) -> Option<f64> {
        (**self).configured_alpha()
    }
}

/// Adapts a closure into an oracle.
///
/// ```
/// use fdr_ci_core::oracle::{FnOracle, IndependenceOracle};
///
/// let oracle = FnOracle::new(|_x: &u32, _y: &u32, z: &[u32]| 0.1 * z.len() as f64)
///     .with_alpha(0.05);
/// assert_eq!(oracle.evaluate(&0u32, &1, &[2, 3]), 0.2);
/// assert_eq!(IndependenceOracle::<u32>::configured_alpha(&oracle), Some(0.05));
/// ```
pub struct FnOracle<F> {
    evaluate: F,
    alpha: Option<f64>,
}

impl<F> FnOracle<F> {
    pub fn new(evaluate: F) -> Self {
        Self {
            evaluate,
            alpha: None,
        }
    }

    /// Report `alpha` as the oracle's configured significance level.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }
}

impl<F> fmt::Debug for FnOracle<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOracle")
            .field("alpha", &self.alpha)
            .finish_non_exhaustive()
    }
}

impl<V, F> IndependenceOracle<V> for FnOracle<F>
where
    F: Fn(&V, &V, &[V]) -> f64 + Send + Sync,
{
    fn evaluate(&self, x: &V, y: &V, z: &[V]) -> f64 {
        (self.evaluate)(x, y, z)
    }

    fn configured_alpha(&self) -> Option<f64> {
        self.alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(f64);

    impl IndependenceOracle<u8> for Constant {
        fn evaluate(&self, _x: &u8, _y: &u8, _z: &[u8]) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_default_alpha_is_absent() {
        assert_eq!(IndependenceOracle::<u8>::configured_alpha(&Constant(0.5)), None);
    }

    #[test]
    fn test_smart_pointer_impls_forward() {
        let shared: Arc<dyn IndependenceOracle<u8>> = Arc::new(Constant(0.25));
        assert_eq!(shared.evaluate(&0, &1, &[]), 0.25);

        let boxed: Box<dyn IndependenceOracle<u8>> = Box::new(FnOracle::new(
            |_: &u8, _: &u8, _: &[u8]| 0.75,
        )
        .with_alpha(0.01));
        assert_eq!(boxed.evaluate(&0, &1, &[2]), 0.75);
        assert_eq!(IndependenceOracle::<u8>::configured_alpha(&boxed), Some(0.01));

        let borrowed = &Constant(0.9);
        assert_eq!(borrowed.evaluate(&3, &4, &[]), 0.9);
    }
}
