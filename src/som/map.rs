//! Self-Organizing Map implementation.

use crate::config::{InitConfig, SomConfig};
use crate::distance::{DistanceMeasure, EuclideanDistance};
use crate::error::{Result, SomError};
use crate::som::{FeatureVector, Members, Node};
use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Members of one node reported by a neighbor query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighborhood<'a> {
    /// Distance between the node and the trainee's BMU.
    pub distance: f64,
    /// The node's trainees grouped by category.
    pub members: &'a Members,
}

/// A Self-Organizing Map over sparse feature vectors.
///
/// The map is a `width x height` grid of nodes stored in row-major order. Each
/// `train` call moves the prototypes around the best matching unit towards the
/// input, and records the trainee on that unit so it can be queried later.
#[derive(Clone)]
pub struct Som {
    width: usize,
    height: usize,
    initial_radius: f64,
    initial_learning_rate: f64,
    iteration_count: usize,
    pub(crate) current_iteration: usize,
    pub(crate) parallel: bool,
    seed: Option<u64>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) distance: Arc<dyn DistanceMeasure>,
    trainee_index: HashMap<String, usize>,
}

impl Som {
    /// Creates an uninitialized map from a configuration.
    ///
    /// Fails if `iteration_count` is missing or the grid size overflows. Call [`Som::init`] before training.
    pub fn new(config: &SomConfig) -> Result<Self> {
        let iteration_count = config.iteration_count.ok_or_else(|| {
            SomError::Config(
                "Provide the iteration count in the config as iteration_count: X where X is the expected number of iterations"
                    .to_string(),
            )
        })?;

        if config.total_nodes().is_none() {
            return Err(SomError::Config(format!(
                "Grid of {}x{} nodes is too large",
                config.effective_width(),
                config.effective_height()
            )));
        }

        Ok(Self {
            width: config.effective_width(),
            height: config.effective_height(),
            initial_radius: config.effective_initial_radius(),
            initial_learning_rate: config.effective_learning_rate(),
            iteration_count,
            current_iteration: 1,
            parallel: config.parallel,
            seed: config.seed,
            nodes: Vec::new(),
            distance: Arc::new(EuclideanDistance),
            trainee_index: HashMap::new(),
        })
    }

    /// Replaces the distance measure.
    pub fn with_distance<D: DistanceMeasure + 'static>(mut self, distance: D) -> Self {
        self.distance = Arc::new(distance);
        self
    }

    /// Builds the grid, either from pre-built nodes or from random features.
    ///
    /// A node list is adopted only when its length equals the grid size.
    /// Otherwise a non-empty feature list produces random nodes in row-major
    /// order. A successful call replaces any previous grid and clears the
    /// trainee index.
    pub fn init(&mut self, config: InitConfig) -> Result<()> {
        let total = self.grid_size();

        if !config.nodes.is_empty() && config.nodes.len() == total {
            self.nodes = config.nodes;
        } else if !config.features.is_empty() {
            let precision = random_precision(total, config.precision)?;
            let mut rng = match self.seed {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            };

            let mut nodes = Vec::with_capacity(total);
            let (mut row, mut column) = (0, 0);

            for i in 0..total {
                nodes.push(Node::new_random(row, column, i, &config.features, precision, &mut rng));

                column += 1;
                if column == self.width {
                    row += 1;
                    column = 0;
                }
            }

            self.nodes = nodes;
        } else {
            return Err(SomError::Config(
                "Provide either a complete list of initialized nodes, or a non empty list of features for random node creation"
                    .to_string(),
            ));
        }

        self.trainee_index.clear();

        info!(
            "Initialized SOM grid: {} nodes ({}x{}), {} iterations",
            self.nodes.len(),
            self.width,
            self.height,
            self.iteration_count
        );

        Ok(())
    }

    /// Grid columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of nodes the grid holds once initialized.
    #[inline]
    pub fn grid_size(&self) -> usize {
        self.width * self.height
    }

    /// Initial neighborhood radius.
    #[inline]
    pub fn initial_radius(&self) -> f64 {
        self.initial_radius
    }

    /// Initial learning rate.
    #[inline]
    pub fn initial_learning_rate(&self) -> f64 {
        self.initial_learning_rate
    }

    /// Total number of training calls the schedule is designed for.
    #[inline]
    pub fn iteration_count(&self) -> usize {
        self.iteration_count
    }

    /// The iteration number the next `train` call will use.
    #[inline]
    pub fn current_iteration(&self) -> usize {
        self.current_iteration
    }

    /// Returns true once every scheduled iteration has been used.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.current_iteration > self.iteration_count
    }

    /// Number of `train` calls still accepted.
    pub fn remaining_iterations(&self) -> usize {
        (self.iteration_count + 1).saturating_sub(self.current_iteration)
    }

    /// The nodes in grid order.
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Gets a node by its grid position.
    #[inline]
    pub fn get(&self, position: usize) -> Option<&Node> {
        self.nodes.get(position)
    }

    /// Gets a node by its 2D position.
    #[inline]
    pub fn get_at(&self, row: usize, col: usize) -> Option<&Node> {
        if row < self.height && col < self.width {
            self.nodes.get(self.coords_to_index(row, col))
        } else {
            None
        }
    }

    /// Converts a grid position to `(row, column)`.
    #[inline]
    pub fn index_to_coords(&self, index: usize) -> (usize, usize) {
        (index / self.width, index % self.width)
    }

    /// Converts `(row, column)` to a grid position.
    #[inline]
    pub fn coords_to_index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// Records `position` as the BMU of trainee `id`, replacing any previous entry.
    pub fn index(&mut self, id: impl Into<String>, position: usize) -> Result<()> {
        if position >= self.nodes.len() {
            return Err(SomError::IndexOutOfBounds {
                index: position,
                max: self.nodes.len(),
            });
        }

        self.trainee_index.insert(id.into(), position);
        Ok(())
    }

    /// Grid position last recorded for trainee `id`.
    #[inline]
    pub fn trained_position(&self, id: &str) -> Option<usize> {
        self.trainee_index.get(id).copied()
    }

    /// Node last recorded as the BMU of trainee `id`.
    pub fn trained_node(&self, id: &str) -> Option<&Node> {
        self.trained_position(id).and_then(|position| self.nodes.get(position))
    }

    /// Number of distinct trainee ids in the index.
    #[inline]
    pub fn trainee_count(&self) -> usize {
        self.trainee_index.len()
    }

    /// Finds the Best Matching Unit (BMU) for an input vector.
    ///
    /// Returns the grid position of the node with the smallest
    /// `distance(node.weights, input)`. Ties go to the earliest node.
    pub fn find_bmu(&self, input: &FeatureVector) -> Result<usize> {
        self.ensure_initialized()?;

        if self.parallel {
            Ok(self.scan_bmu_parallel(input))
        } else {
            Ok(self.scan_bmu(input))
        }
    }

    /// Finds the BMU node for an input vector.
    pub fn best_matching_unit(&self, input: &FeatureVector) -> Result<&Node> {
        let position = self.find_bmu(input)?;
        Ok(&self.nodes[position])
    }

    /// Finds the k nearest nodes to an input vector.
    ///
    /// Returns `(position, distance)` pairs sorted by distance, ties in grid order.
    pub fn find_k_nearest(&self, input: &FeatureVector, k: usize) -> Result<Vec<(usize, f64)>> {
        self.ensure_initialized()?;

        let mut distances: Vec<(usize, f64)> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (i, self.distance.distance(&node.weights, input)))
            .collect();

        distances.sort_by(|a, b| a.1.total_cmp(&b.1));
        distances.truncate(k);

        Ok(distances)
    }

    /// Returns the trainees around the BMU of `id`.
    ///
    /// Without a radius (or with a zero radius) the result is the BMU's own
    /// members at distance 0. With a radius, every non-empty node whose
    /// distance to the BMU is strictly below it is reported, in grid order.
    pub fn neighbors(&self, id: &str, radius: Option<f64>) -> Result<Vec<Neighborhood<'_>>> {
        let bmu = self
            .trained_node(id)
            .ok_or_else(|| SomError::TraineeNotFound(id.to_string()))?;

        let radius = match radius {
            Some(radius) if radius != 0.0 && !radius.is_nan() => radius,
            _ => {
                return Ok(vec![Neighborhood {
                    distance: 0.0,
                    members: bmu.members(),
                }]);
            }
        };

        let neighborhoods = self
            .nodes
            .iter()
            .filter(|node| !node.is_empty())
            .filter_map(|node| {
                let distance = self.distance.distance(&node.weights, &bmu.weights);
                (distance < radius).then(|| Neighborhood {
                    distance,
                    members: node.members(),
                })
            })
            .collect();

        Ok(neighborhoods)
    }

    pub(crate) fn ensure_initialized(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(SomError::Config(
                "The map grid is empty, call init before training or querying".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn record_trainee(&mut self, id: String, position: usize, vector: FeatureVector) {
        self.nodes[position].add_member(id.clone(), vector);
        self.trainee_index.insert(id, position);
    }

    fn scan_bmu(&self, input: &FeatureVector) -> usize {
        let mut best_idx = 0;
        let mut best_dist = f64::MAX;

        for (i, node) in self.nodes.iter().enumerate() {
            let dist = self.distance.distance(&node.weights, input);
            if dist < best_dist {
                best_dist = dist;
                best_idx = i;
            }
        }

        best_idx
    }

    fn scan_bmu_parallel(&self, input: &FeatureVector) -> usize {
        self.nodes
            .par_iter()
            .enumerate()
            .filter_map(|(i, node)| {
                let dist = self.distance.distance(&node.weights, input);
                (dist < f64::MAX).then_some((i, dist))
            })
            .reduce_with(|a, b| if b.1 < a.1 || (b.1 == a.1 && b.0 < a.0) { b } else { a })
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}

impl fmt::Debug for Som {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Som")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("initial_radius", &self.initial_radius)
            .field("initial_learning_rate", &self.initial_learning_rate)
            .field("iteration_count", &self.iteration_count)
            .field("current_iteration", &self.current_iteration)
            .field("nodes", &self.nodes.len())
            .field("trainees", &self.trainee_index.len())
            .finish_non_exhaustive()
    }
}

/// Rounding steps per feature for random weights.
///
/// Enough steps that two random vectors on the grid are unlikely to collide.
/// An explicit digit count must keep `10^digits` finite.
fn random_precision(total: usize, digits: Option<u32>) -> Result<f64> {
    let digits = match digits {
        Some(digits) => i32::try_from(digits)
            .ok()
            .filter(|&d| d <= f64::MAX_10_EXP)
            .ok_or_else(|| {
                SomError::Config(format!(
                    "Precision of {} digits exceeds the supported maximum of {}",
                    digits,
                    f64::MAX_10_EXP
                ))
            })?,
        None => (total as f64).log10().ceil() as i32 + 2,
    };

    Ok(10f64.powi(digits))
}
