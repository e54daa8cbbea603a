//! Euclidean distance over the union of feature keys.

use crate::distance::DistanceMeasure;
use crate::som::FeatureVector;

/// Euclidean distance measure.
///
/// A key present in only one vector counts as 0 in the other.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanDistance;

impl DistanceMeasure for EuclideanDistance {
    fn distance(&self, a: &FeatureVector, b: &FeatureVector) -> f64 {
        euclidean_distance(a, b)
    }
}

/// Computes the Euclidean distance between two sparse vectors.
///
/// First pass covers every key of `a`, second pass adds the keys only `b` has.
pub fn euclidean_distance(a: &FeatureVector, b: &FeatureVector) -> f64 {
    let mut sum = 0.0;

    for (key, value) in a {
        let other = b.get(key).copied().unwrap_or(0.0);
        sum += (value - other).powi(2);
    }

    for (key, value) in b {
        if !a.contains_key(key) {
            sum += value.powi(2);
        }
    }

    sum.sqrt()
}
