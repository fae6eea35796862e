//! Dense voxel grids for curve extraction.
//!
//! This crate provides the grid layer shared by the search and refinement
//! crates:
//!
//! - [`Point`] - Integer grid points, also used as neighbor offsets
//! - [`GridMesh`] - Bounds-checked bijection between points and linear indices
//! - [`Volume`] - Dense per-voxel arrays (cost volumes, diagnostic maps)
//! - [`MeshMask`] - Per-voxel searchability with optional start/end sets
//!
//! # Indexing
//!
//! Linear indices are column-major and 0-based, `index = x + y·M + z·M·N`
//! for an `M×N×O` grid. Nothing here wraps around: every accessor returns
//! `None` for points or indices outside the grid.
//!
//! # Example
//!
//! ```
//! use ce_grid::{GridMesh, MeshMask, Point, Volume, VoxelClass};
//!
//! let mesh = GridMesh::new(5, 5, 1).unwrap();
//! let data = Volume::filled(mesh, 1.0_f64);
//! let mut mask = MeshMask::all_free(mesh);
//! mask.set(Point::new(2, 2, 0), VoxelClass::Excluded);
//!
//! assert_eq!(data.get(Point::new(4, 4, 0)), Some(&1.0));
//! assert!(!mask.is_traversable(Point::new(2, 2, 0)));
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod error;
mod mesh;
mod point;
mod volume;

pub use error::GridError;
pub use mesh::GridMesh;
pub use point::Point;
pub use volume::{MeshMask, Volume, VoxelClass};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
