//! Error types for curve extraction.
//!
//! Only failures that prevent a search from starting are errors. An
//! unreachable goal is a valid outcome and is reported through
//! [`SearchStatus`](crate::SearchStatus); refinement that runs out of
//! iterations reports `converged == false` on its result.

use ce_grid::{GridError, Point};

/// Errors that can occur before or while setting up a segmentation.
///
/// # Example
///
/// ```
/// use curve_types::CurveError;
///
/// let error = CurveError::invalid_config("Unknown descent_method: bfgs");
/// assert!(error.to_string().contains("descent_method"));
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum CurveError {
    /// A setting or input combination is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A requested source or goal lies outside the grid.
    #[error("point {0} is outside the grid")]
    OutOfBounds(Point),

    /// A requested source or goal lies on an excluded voxel.
    #[error("point {0} is excluded by the mesh mask")]
    Excluded(Point),

    /// The request names no source or no goal.
    #[error("segmentation request needs at least one {0}")]
    EmptyRequest(&'static str),

    /// Two input volumes do not share a grid.
    #[error("shape mismatch: data is {data:?}, mask is {mask:?}")]
    ShapeMismatch {
        /// Extents of the data volume.
        data: (usize, usize, usize),
        /// Extents of the mask.
        mask: (usize, usize, usize),
    },

    /// An error raised by the grid layer.
    #[error(transparent)]
    Grid(#[from] GridError),
}

impl CurveError {
    /// Creates an invalid configuration error with the given message.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }
}
