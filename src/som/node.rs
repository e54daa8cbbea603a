//! Node representation for the Self-Organizing Map.

use crate::error::{Result, SomError};
use crate::som::FeatureVector;
use rand::Rng;
use std::collections::BTreeMap;

/// Category used when a trainee is added without one.
pub const DEFAULT_CATEGORY: &str = "default";

/// A trainee recorded on the node it matched.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// Trainee identifier.
    pub id: String,
    /// Category the trainee was filed under.
    pub category: String,
    /// The vector the trainee was trained with.
    pub vector: FeatureVector,
}

/// Trainees grouped by category, each group in training order.
pub type Members = BTreeMap<String, Vec<Member>>;

/// Construction parameters for a [`Node`].
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Prototype weights. Required.
    pub weights: Option<FeatureVector>,
    /// Row on the grid.
    pub x: usize,
    /// Column on the grid.
    pub y: usize,
    /// Linear index on the grid.
    pub i: usize,
}

/// A prototype unit on the grid.
///
/// Holds a weight vector and the trainees for which it is (or was) the best match.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Weight vector, adapted in place during training.
    pub weights: FeatureVector,
    /// Row position on the grid.
    pub x: usize,
    /// Column position on the grid.
    pub y: usize,
    /// Linear position on the grid.
    pub i: usize,
    members: Members,
}

impl Node {
    /// Creates a node from a configuration, failing if no weights are given.
    pub fn from_config(config: NodeConfig) -> Result<Self> {
        let weights = config.weights.ok_or_else(|| {
            SomError::Config("Provide weights for initialization of a node in the map".to_string())
        })?;

        Ok(Self::new_with_weights(config.x, config.y, config.i, weights))
    }

    /// Creates a new node with the given weights.
    pub fn new_with_weights(x: usize, y: usize, i: usize, weights: FeatureVector) -> Self {
        Self {
            weights,
            x,
            y,
            i,
            members: Members::new(),
        }
    }

    /// Creates a node with random weights for the given features.
    ///
    /// Each weight is uniform in `[0, 1]`, rounded to `precision` steps.
    pub fn new_random<R: Rng>(x: usize, y: usize, i: usize, features: &[String], precision: f64, rng: &mut R) -> Self {
        let weights = features
            .iter()
            .map(|feature| {
                let value = (rng.gen::<f64>() * precision).round() / precision;
                (feature.clone(), value)
            })
            .collect();

        Self::new_with_weights(x, y, i, weights)
    }

    /// Records a trainee under the default category.
    pub fn add_member(&mut self, id: impl Into<String>, vector: FeatureVector) {
        self.add_categorized_member(id, vector, DEFAULT_CATEGORY);
    }

    /// Records a trainee under `category`. Duplicates are kept.
    pub fn add_categorized_member(&mut self, id: impl Into<String>, vector: FeatureVector, category: &str) {
        self.members.entry(category.to_string()).or_default().push(Member {
            id: id.into(),
            category: category.to_string(),
            vector,
        });
    }

    /// All trainees grouped by category.
    #[inline]
    pub fn members(&self) -> &Members {
        &self.members
    }

    /// Trainees of a single category, in training order.
    pub fn members_in(&self, category: &str) -> &[Member] {
        self.members.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of recorded trainees across categories.
    pub fn member_count(&self) -> usize {
        self.members.values().map(Vec::len).sum()
    }

    /// Returns true if no trainee has been recorded on this node.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Moves each weight present in `input` towards it by `rate`.
    ///
    /// Weights whose feature is missing from `input` are left as they are.
    pub fn adapt(&mut self, input: &FeatureVector, rate: f64) {
        for (feature, weight) in self.weights.iter_mut() {
            if let Some(target) = input.get(feature) {
                *weight += rate * (target - *weight);
            }
        }
    }
}
