//! Continuous refinement of extracted curves.
//!
//! The search in `curve-search` returns a chain of voxel centers. This crate
//! lets the interior vertices of that chain move off the grid to lower a
//! smooth version of the same energy, keeping both endpoints fixed.
//!
//! # Overview
//!
//! - [`Objective`]: a scalar function with a finite-difference gradient
//! - [`CurveEnergy`]: data, length, curvature, and torsion of a polyline
//! - [`lbfgs`] and [`nelder_mead`]: the two descent methods
//! - [`DescentRefiner`]: picks a method from [`DescentMethod`](curve_types::DescentMethod)
//! - [`refine_output`]: one call from a segmentation to a [`Refinement`]
//!
//! # Example
//!
//! ```
//! use ce_grid::{GridMesh, MeshMask, Point, Volume};
//! use curve_refine::refine_output;
//! use curve_search::{ConnectivityTable, segment};
//! use curve_types::{InstanceSettings, SegmentationRequest};
//!
//! let mesh = GridMesh::new(6, 6, 1).unwrap();
//! let data = Volume::filled(mesh, 1.0);
//! let mask = MeshMask::all_free(mesh);
//! let settings = InstanceSettings::new().with_length_penalty(1.0);
//!
//! let output = segment(
//!     &data,
//!     &mask,
//!     &ConnectivityTable::planar_neighbors(),
//!     &settings,
//!     &SegmentationRequest::new(Point::new(0, 0, 0), Point::new(3, 3, 0)),
//! )
//! .unwrap();
//!
//! // The 4-connected staircase shortens toward the diagonal.
//! let refined = refine_output(&output, &data, &settings).unwrap();
//! assert!(refined.cost() < refined.initial_cost());
//! ```

#![doc(html_root_url = "https://docs.rs/curve-refine/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]

pub mod lbfgs;
pub mod nelder_mead;
pub mod objective;
pub mod params;
pub mod refiner;

pub use objective::{CurveEnergy, Objective};
pub use params::{DescentParams, Minimum};
pub use refiner::{DescentRefiner, LocalRefiner, Refinement, refine_output};
