//! Error types for grid operations.

use crate::Point;

/// Errors that can occur while building or indexing a grid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum GridError {
    /// Every grid extent must be at least one voxel.
    #[error("invalid grid dimensions: {m}x{n}x{o}")]
    InvalidDimensions {
        /// Extent along x.
        m: usize,
        /// Extent along y.
        n: usize,
        /// Extent along z.
        o: usize,
    },

    /// The number of voxels does not fit in memory indices.
    #[error("grid dimensions {m}x{n}x{o} overflow the index range")]
    IndexOverflow {
        /// Extent along x.
        m: usize,
        /// Extent along y.
        n: usize,
        /// Extent along z.
        o: usize,
    },

    /// A buffer does not match the number of voxels in the grid.
    #[error("size mismatch: expected {expected} voxels, got {actual}")]
    SizeMismatch {
        /// Number of voxels in the grid.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },

    /// A point lies outside the grid extent.
    #[error("point {point} is out of bounds")]
    OutOfBounds {
        /// The offending point.
        point: Point,
    },

    /// A mask value is not one of the known voxel class codes.
    #[error("unknown mask code {code} at linear index {index}")]
    UnknownMaskCode {
        /// The raw code.
        code: u8,
        /// Linear index of the voxel carrying it.
        index: usize,
    },
}
