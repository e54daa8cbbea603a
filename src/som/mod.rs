//! Self-Organizing Map (SOM) module.
//!
//! - **Nodes**: prototype vectors and the trainees they matched (node.rs)
//! - **Map**: grid initialization, BMU search, trainee index, neighbor queries (map.rs)
//! - **Training**: decay schedules and neighborhood updates (training.rs)

mod map;
mod node;
pub mod training;

pub use map::{Neighborhood, Som};
pub use node::{Member, Members, Node, NodeConfig, DEFAULT_CATEGORY};
pub use training::neighborhood_influence;

use std::collections::BTreeMap;

/// A sparse feature vector: feature name to value.
///
/// Keys absent from a vector are treated as 0 by the default distance.
pub type FeatureVector = BTreeMap<String, f64>;
