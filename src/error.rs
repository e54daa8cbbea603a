//! Error types for the Self-Organizing Map engine.

use thiserror::Error;

/// The main error type for SOM operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SomError {
    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The iteration budget fixed at construction has been used up.
    #[error(
        "Cannot train anymore: current iteration is greater than the expected iteration count of {iteration_count}"
    )]
    TrainingExhausted {
        /// The iteration budget of the map.
        iteration_count: usize,
    },

    /// Trainee id was never trained or indexed.
    #[error("Trainee not found in index: {0}")]
    TraineeNotFound(String),

    /// Grid position out of bounds.
    #[error("Index out of bounds: {index} >= {max}")]
    IndexOutOfBounds {
        /// The position that was out of bounds.
        index: usize,
        /// The grid size.
        max: usize,
    },
}

impl SomError {
    /// Returns true for configuration failures.
    pub fn is_config(&self) -> bool {
        matches!(self, SomError::Config(_))
    }

    /// Returns true for failed lookups into the trainee index or the grid.
    pub fn is_lookup(&self) -> bool {
        matches!(self, SomError::TraineeNotFound(_) | SomError::IndexOutOfBounds { .. })
    }
}

/// Result type alias for SOM operations.
pub type Result<T> = std::result::Result<T, SomError>;
