//! Search results and diagnostic maps.
//!
//! # Example
//!
//! ```
//! use curve_types::{SearchStatus, SegmentationOutput};
//! use ce_grid::Point;
//! use std::time::Duration;
//!
//! let output = SegmentationOutput::new(
//!     vec![Point::new(0, 0, 0), Point::new(1, 0, 0)],
//!     1.0,
//!     SearchStatus::Reached,
//! )
//! .with_evaluations(6)
//! .with_run_time(Duration::from_micros(40));
//!
//! assert!(output.is_reachable());
//! assert_eq!(output.len(), 2);
//! ```

use std::time::Duration;

use ce_grid::{Point, Volume};

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchStatus {
    /// A goal was settled; the path is optimal.
    Reached,
    /// The frontier ran dry before any goal was settled.
    Unreachable,
    /// The budget ran out; the path leads to the settled state closest to
    /// the goal set.
    BudgetExhausted,
}

/// Everything a segmentation call produces.
///
/// Diagnostic maps are present only when requested in the settings. They
/// are indexed by grid node; for edge and edge-pair searches each node
/// reports its best state.
///
/// - `visit_time`: order in which the node was first settled, `-1` if never
/// - `shortest_path_tree`: linear index of the parent node, `-1` if
///   unvisited, the node's own index for sources
/// - `distances`: optimal cost to the node, `+∞` if unvisited
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentationOutput {
    points: Vec<Point>,
    cost: f64,
    status: SearchStatus,
    run_time: Duration,
    evaluations: usize,
    settled: usize,
    visit_time: Option<Volume<i64>>,
    shortest_path_tree: Option<Volume<i64>>,
    distances: Option<Volume<f64>>,
}

impl SegmentationOutput {
    /// Creates an output from a path, its cost, and the search status.
    #[must_use]
    pub const fn new(points: Vec<Point>, cost: f64, status: SearchStatus) -> Self {
        Self {
            points,
            cost,
            status,
            run_time: Duration::ZERO,
            evaluations: 0,
            settled: 0,
            visit_time: None,
            shortest_path_tree: None,
            distances: None,
        }
    }

    /// The result for a goal that cannot be reached: empty path, infinite cost.
    #[must_use]
    pub const fn unreachable() -> Self {
        Self::new(Vec::new(), f64::INFINITY, SearchStatus::Unreachable)
    }

    /// Sets the run time.
    #[must_use]
    pub const fn with_run_time(mut self, run_time: Duration) -> Self {
        self.run_time = run_time;
        self
    }

    /// Sets the number of transition cost evaluations.
    #[must_use]
    pub const fn with_evaluations(mut self, evaluations: usize) -> Self {
        self.evaluations = evaluations;
        self
    }

    /// Sets the number of settled states.
    #[must_use]
    pub const fn with_settled(mut self, settled: usize) -> Self {
        self.settled = settled;
        self
    }

    /// Attaches the visit order map.
    #[must_use]
    pub fn with_visit_time(mut self, map: Volume<i64>) -> Self {
        self.visit_time = Some(map);
        self
    }

    /// Attaches the parent map.
    #[must_use]
    pub fn with_shortest_path_tree(mut self, map: Volume<i64>) -> Self {
        self.shortest_path_tree = Some(map);
        self
    }

    /// Attaches the distance map.
    #[must_use]
    pub fn with_distances(mut self, map: Volume<f64>) -> Self {
        self.distances = Some(map);
        self
    }

    /// The extracted curve, source first.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of points on the curve.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the curve is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total cost of the curve (`+∞` when unreachable).
    #[must_use]
    pub const fn cost(&self) -> f64 {
        self.cost
    }

    /// How the search ended.
    #[must_use]
    pub const fn status(&self) -> SearchStatus {
        self.status
    }

    /// Whether a goal was reached.
    #[must_use]
    pub const fn is_reachable(&self) -> bool {
        matches!(self.status, SearchStatus::Reached)
    }

    /// Wall-clock time of the call.
    #[must_use]
    pub const fn run_time(&self) -> Duration {
        self.run_time
    }

    /// Number of transition cost evaluations.
    #[must_use]
    pub const fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Number of settled states.
    #[must_use]
    pub const fn settled(&self) -> usize {
        self.settled
    }

    /// Visit order per node, if requested.
    #[must_use]
    pub const fn visit_time(&self) -> Option<&Volume<i64>> {
        self.visit_time.as_ref()
    }

    /// Parent node per node, if requested.
    #[must_use]
    pub const fn shortest_path_tree(&self) -> Option<&Volume<i64>> {
        self.shortest_path_tree.as_ref()
    }

    /// Optimal cost per node, if requested.
    #[must_use]
    pub const fn distances(&self) -> Option<&Volume<f64>> {
        self.distances.as_ref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use ce_grid::GridMesh;

    #[test]
    fn test_unreachable() {
        let output = SegmentationOutput::unreachable();
        assert!(output.is_empty());
        assert!(output.cost().is_infinite());
        assert_eq!(output.status(), SearchStatus::Unreachable);
        assert!(!output.is_reachable());
    }

    #[test]
    fn test_diagnostics_absent_by_default() {
        let output = SegmentationOutput::new(vec![Point::origin()], 0.0, SearchStatus::Reached);
        assert!(output.visit_time().is_none());
        assert!(output.shortest_path_tree().is_none());
        assert!(output.distances().is_none());
    }

    #[test]
    fn test_with_maps() {
        let mesh = GridMesh::new(2, 1, 1).unwrap();
        let output = SegmentationOutput::new(vec![Point::origin()], 0.0, SearchStatus::Reached)
            .with_visit_time(Volume::filled(mesh, -1))
            .with_shortest_path_tree(Volume::filled(mesh, -1))
            .with_distances(Volume::filled(mesh, f64::INFINITY))
            .with_settled(1);
        assert_eq!(output.visit_time().unwrap().as_slice(), &[-1, -1]);
        assert_eq!(output.shortest_path_tree().unwrap().as_slice(), &[-1, -1]);
        assert!(output.distances().unwrap().as_slice()[0].is_infinite());
        assert_eq!(output.settled(), 1);
    }
}
