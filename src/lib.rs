//! # Kohonen - Self-Organizing Maps
//!
//! A Self-Organizing Map (SOM) projects high-dimensional feature vectors onto a
//! fixed 2D grid of prototype nodes while preserving their topology.
//!
//! ## Overview
//!
//! Every `train` call finds the node closest to the input (the best matching
//! unit, BMU), records the trainee on it, and pulls the nodes around it towards
//! the input. Both the neighborhood radius and the learning rate decay
//! exponentially over a fixed iteration budget. Trained ids can then be
//! queried for the trainees that landed on or near the same node.
//!
//! ## Quick Start
//!
//! ```rust
//! use kohonen::{FeatureVector, InitConfig, Som, SomConfig};
//!
//! let config = SomConfig {
//!     width: 4,
//!     height: 4,
//!     seed: Some(42),
//!     ..SomConfig::with_iterations(100)
//! };
//!
//! let mut som = Som::new(&config)?;
//! som.init(InitConfig::with_features(["red", "green", "blue"]))?;
//!
//! let orange: FeatureVector = [("red", 1.0), ("green", 0.5), ("blue", 0.0)]
//!     .into_iter()
//!     .map(|(k, v)| (k.to_string(), v))
//!     .collect();
//! som.train("orange", orange)?;
//!
//! let groups = som.neighbors("orange", None)?;
//! assert_eq!(groups[0].members["default"][0].id, "orange");
//! # Ok::<(), kohonen::SomError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`som`] - Nodes, the map and training
//! - [`distance`] - Pluggable distance measures
//! - [`config`] - Map and grid initialization configuration
//! - [`error`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod distance;
pub mod error;
pub mod som;

// Re-export commonly used types
pub use config::{InitConfig, SomConfig, DEFAULT_HEIGHT, DEFAULT_LEARNING_RATE, DEFAULT_WIDTH};
pub use distance::{DistanceMeasure, EuclideanDistance, FnDistance};
pub use error::{Result, SomError};
pub use som::{FeatureVector, Member, Members, Neighborhood, Node, NodeConfig, Som, DEFAULT_CATEGORY};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
