//! Distance measures between feature vectors.

mod euclidean;

pub use euclidean::EuclideanDistance;

use crate::som::FeatureVector;

/// Trait for distance measures between feature vectors.
///
/// The map calls a measure with a fixed argument order at each call site, so
/// implementations are not required to be symmetric.
pub trait DistanceMeasure: Send + Sync {
    /// Computes the distance between two vectors. Must be nonnegative.
    fn distance(&self, a: &FeatureVector, b: &FeatureVector) -> f64;
}

/// Adapts a plain function or closure into a [`DistanceMeasure`].
#[derive(Clone, Copy)]
pub struct FnDistance<F>(pub F);

impl<F> DistanceMeasure for FnDistance<F>
where
    F: Fn(&FeatureVector, &FeatureVector) -> f64 + Send + Sync,
{
    #[inline]
    fn distance(&self, a: &FeatureVector, b: &FeatureVector) -> f64 {
        (self.0)(a, b)
    }
}

impl<F> std::fmt::Debug for FnDistance<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnDistance")
    }
}
