//! Configuration for the Self-Organizing Map.

use crate::som::Node;
use serde::{Deserialize, Serialize};

/// Default grid width (columns).
pub const DEFAULT_WIDTH: usize = 100;

/// Default grid height (rows).
pub const DEFAULT_HEIGHT: usize = 100;

/// Default initial learning rate.
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// Self-Organizing Map configuration.
///
/// Unspecified fields take their defaults when deserialized, so a partial
/// document such as `{"iteration_count": 500}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SomConfig {
    /// Grid columns.
    /// Default: 100. Zero falls back to the default.
    pub width: usize,

    /// Grid rows.
    /// Default: 100. Zero falls back to the default.
    pub height: usize,

    /// Initial neighborhood radius in weight space.
    /// Default: None (half of the larger grid side).
    pub initial_radius: Option<f64>,

    /// Total number of `train` calls the schedule is designed for.
    /// Required, there is no default.
    pub iteration_count: Option<usize>,

    /// Initial learning rate.
    /// Default: 0.1. Zero falls back to the default.
    pub initial_learning_rate: f64,

    /// Random seed for grid initialization.
    /// Default: None (random).
    pub seed: Option<u64>,

    /// Run BMU search and weight updates on the rayon pool.
    /// Default: false.
    pub parallel: bool,
}

impl Default for SomConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            initial_radius: None,
            iteration_count: None,
            initial_learning_rate: DEFAULT_LEARNING_RATE,
            seed: None,
            parallel: false,
        }
    }
}

impl SomConfig {
    /// Creates a configuration with the given iteration budget and defaults elsewhere.
    pub fn with_iterations(iteration_count: usize) -> Self {
        Self {
            iteration_count: Some(iteration_count),
            ..Default::default()
        }
    }

    /// Grid width after applying the default for zero.
    #[inline]
    pub fn effective_width(&self) -> usize {
        if self.width == 0 { DEFAULT_WIDTH } else { self.width }
    }

    /// Grid height after applying the default for zero.
    #[inline]
    pub fn effective_height(&self) -> usize {
        if self.height == 0 { DEFAULT_HEIGHT } else { self.height }
    }

    /// Initial radius, defaulting to `max(width, height) / 2`.
    pub fn effective_initial_radius(&self) -> f64 {
        match self.initial_radius {
            Some(radius) if radius != 0.0 && !radius.is_nan() => radius,
            _ => self.effective_width().max(self.effective_height()) as f64 / 2.0,
        }
    }

    /// Initial learning rate after applying the default for zero.
    pub fn effective_learning_rate(&self) -> f64 {
        let rate = self.initial_learning_rate;
        if rate == 0.0 || rate.is_nan() { DEFAULT_LEARNING_RATE } else { rate }
    }

    /// Returns the total number of nodes in the grid, or None if it overflows.
    #[inline]
    pub fn total_nodes(&self) -> Option<usize> {
        self.effective_width().checked_mul(self.effective_height())
    }
}

/// Grid initialization request for [`crate::Som::init`].
///
/// A complete pre-built node list takes priority over random features.
#[derive(Debug, Clone, Default)]
pub struct InitConfig {
    /// Pre-built nodes, adopted verbatim when their count matches the grid size.
    pub nodes: Vec<Node>,
    /// Feature names for random node creation.
    pub features: Vec<String>,
    /// Decimal digits for random weights. Default: enough to make collisions negligible.
    pub precision: Option<u32>,
}

impl InitConfig {
    /// Initialization from pre-built nodes.
    pub fn with_nodes(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            ..Default::default()
        }
    }

    /// Random initialization over the given features.
    pub fn with_features<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            features: features.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Overrides the number of decimal digits for random weights.
    pub fn precision(mut self, digits: u32) -> Self {
        self.precision = Some(digits);
        self
    }
}
