//! Core types for regularized curve extraction.
//!
//! This crate holds the values that flow into and out of a segmentation
//! call, independent of how the search is carried out:
//!
//! - **Settings**: [`InstanceSettings`] with [`DescentMethod`] and [`DataType`]
//! - **Requests**: start/end sets and budgets ([`SegmentationRequest`], [`SearchBudget`])
//! - **Results**: [`SegmentationOutput`] and [`SearchStatus`]
//! - **Errors**: [`CurveError`]
//! - **Timing**: [`TimingContext`], passed explicitly instead of a global timer
//!
//! # Example
//!
//! ```
//! use curve_types::{InstanceSettings, SegmentationRequest};
//! use ce_grid::Point;
//!
//! let settings = InstanceSettings::default()
//!     .with_length_penalty(1.0)
//!     .with_store_distances(true);
//! settings.validate().unwrap();
//!
//! let request = SegmentationRequest::new(Point::new(0, 0, 0), Point::new(4, 4, 0));
//! assert_eq!(request.sources().len(), 1);
//! ```
//!
//! # Feature Flags
//!
//! - `serde`: Enables serialization/deserialization for all types

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]

pub mod error;
pub mod output;
pub mod request;
pub mod settings;
pub mod timing;

pub use error::CurveError;
pub use output::{SearchStatus, SegmentationOutput};
pub use request::{SearchBudget, SegmentationRequest};
pub use settings::{DataType, DescentMethod, InstanceSettings, RegularizationOrder};
pub use timing::TimingContext;
