//! Minimum-cost curve extraction on voxel grids.
//!
//! Finds the cheapest chain of grid steps from a source set to a goal set,
//! where the cost of a curve combines a data term, its length, its
//! curvature, and its torsion. Curvature and torsion depend on more than one
//! step, so the search runs on a lifted graph whose states remember the last
//! one or two steps.
//!
//! # Overview
//!
//! - [`ConnectivityTable`]: the allowed steps, including long-range ones
//! - [`cost`]: pluggable data, length, curvature, and torsion policies
//! - [`graph`]: node, edge, and edge-pair state graphs
//! - [`search`]: Dijkstra / A* with an optional budget
//! - [`reconstruct`]: parent links back to a polyline
//! - [`Segmenter`]: validated inputs, dispatch, and batch runs
//!
//! # Quick Start
//!
//! ```
//! use curve_search::{ConnectivityTable, segment};
//! use curve_types::{InstanceSettings, SearchStatus, SegmentationRequest};
//! use ce_grid::{GridMesh, MeshMask, Point, Volume};
//!
//! let mesh = GridMesh::new(8, 8, 8).unwrap();
//! let data = Volume::from_fn(mesh, |p| if p.y == p.x { 0.1 } else { 1.0 });
//! let mask = MeshMask::all_free(mesh);
//! let table = ConnectivityTable::full_neighbors();
//!
//! let settings = InstanceSettings::new()
//!     .with_length_penalty(0.1)
//!     .with_curvature_penalty(0.5)
//!     .with_use_a_star(true);
//!
//! let output = segment(
//!     &data,
//!     &mask,
//!     &table,
//!     &settings,
//!     &SegmentationRequest::new(Point::new(0, 0, 0), Point::new(7, 7, 7)),
//! )
//! .unwrap();
//!
//! assert_eq!(output.status(), SearchStatus::Reached);
//! assert_eq!(output.points().first(), Some(&Point::new(0, 0, 0)));
//! assert_eq!(output.points().last(), Some(&Point::new(7, 7, 7)));
//! ```
//!
//! # Graph Selection
//!
//! | Active penalties | Graph | States per node |
//! |------------------|-------|-----------------|
//! | data, length | node | 1 |
//! | + curvature | edge | edges + 1 |
//! | + torsion | edge-pair | pairs + edges + 1 |

#![doc(html_root_url = "https://docs.rs/curve-search/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]

pub mod connectivity;
pub mod cost;
pub mod graph;
pub mod heuristics;
pub mod reconstruct;
pub mod search;
pub mod segmentation;

pub use connectivity::ConnectivityTable;
pub use graph::{StateGraph, StateId};
pub use reconstruct::{is_table_path, reconstruct};
pub use search::{SearchOptions, SearchResult, ShortestPathSearch};
pub use segmentation::{Segmenter, segment};
