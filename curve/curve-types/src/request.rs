//! Source/goal sets and search budgets.

use std::time::Duration;

use ce_grid::{MeshMask, Point};

/// Limits checked by the search at every settled state.
///
/// When a limit is hit the search stops cleanly and reports
/// [`SearchStatus::BudgetExhausted`](crate::SearchStatus::BudgetExhausted)
/// with the best partial result found so far.
///
/// # Example
///
/// ```
/// use curve_types::SearchBudget;
/// use std::time::Duration;
///
/// let budget = SearchBudget::unlimited()
///     .with_max_settled(10_000)
///     .with_time_limit(Duration::from_millis(50));
/// assert_eq!(budget.max_settled(), Some(10_000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchBudget {
    max_settled: Option<usize>,
    time_limit: Option<Duration>,
}

impl SearchBudget {
    /// A budget without limits.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_settled: None,
            time_limit: None,
        }
    }

    /// Caps the number of settled states.
    #[must_use]
    pub const fn with_max_settled(mut self, max: usize) -> Self {
        self.max_settled = Some(max);
        self
    }

    /// Caps the wall-clock time spent in the search loop.
    #[must_use]
    pub const fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Maximum number of settled states, if set.
    #[must_use]
    pub const fn max_settled(&self) -> Option<usize> {
        self.max_settled
    }

    /// Wall-clock limit, if set.
    #[must_use]
    pub const fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    /// Whether the budget is spent after `settled` states and `elapsed` time.
    #[must_use]
    pub fn is_exhausted(&self, settled: usize, elapsed: Duration) -> bool {
        self.max_settled.is_some_and(|max| settled >= max)
            || self.time_limit.is_some_and(|limit| elapsed >= limit)
    }
}

/// Where a segmentation starts and where it may end.
///
/// Several sources run as one multi-source search; the search ends at
/// whichever goal is settled first.
///
/// # Example
///
/// ```
/// use curve_types::SegmentationRequest;
/// use ce_grid::Point;
///
/// let request = SegmentationRequest::new(Point::new(0, 0, 0), Point::new(4, 4, 0))
///     .with_source(Point::new(0, 4, 0));
/// assert_eq!(request.sources().len(), 2);
/// assert_eq!(request.goals(), &[Point::new(4, 4, 0)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentationRequest {
    sources: Vec<Point>,
    goals: Vec<Point>,
    budget: SearchBudget,
}

impl SegmentationRequest {
    /// A single-source, single-goal request.
    #[must_use]
    pub fn new(source: Point, goal: Point) -> Self {
        Self {
            sources: vec![source],
            goals: vec![goal],
            budget: SearchBudget::unlimited(),
        }
    }

    /// A request with explicit source and goal sets.
    #[must_use]
    pub const fn from_sets(sources: Vec<Point>, goals: Vec<Point>) -> Self {
        Self {
            sources,
            goals,
            budget: SearchBudget::unlimited(),
        }
    }

    /// Reads the start set (`Source` voxels) and end set (`Sink` voxels)
    /// from a mask.
    #[must_use]
    pub fn from_mask(mask: &MeshMask) -> Self {
        Self::from_sets(mask.sources(), mask.sinks())
    }

    /// Adds another source.
    #[must_use]
    pub fn with_source(mut self, source: Point) -> Self {
        self.sources.push(source);
        self
    }

    /// Adds another goal.
    #[must_use]
    pub fn with_goal(mut self, goal: Point) -> Self {
        self.goals.push(goal);
        self
    }

    /// Sets the search budget.
    #[must_use]
    pub const fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    /// The start set.
    #[must_use]
    pub fn sources(&self) -> &[Point] {
        &self.sources
    }

    /// The end set.
    #[must_use]
    pub fn goals(&self) -> &[Point] {
        &self.goals
    }

    /// The search budget.
    #[must_use]
    pub const fn budget(&self) -> &SearchBudget {
        &self.budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ce_grid::{GridMesh, VoxelClass};

    #[test]
    fn test_budget_unlimited_never_exhausts() {
        let budget = SearchBudget::unlimited();
        assert!(!budget.is_exhausted(usize::MAX, Duration::from_secs(3600)));
    }

    #[test]
    fn test_budget_max_settled() {
        let budget = SearchBudget::unlimited().with_max_settled(3);
        assert!(!budget.is_exhausted(2, Duration::ZERO));
        assert!(budget.is_exhausted(3, Duration::ZERO));
    }

    #[test]
    fn test_budget_time_limit() {
        let budget = SearchBudget::default().with_time_limit(Duration::from_millis(5));
        assert!(!budget.is_exhausted(0, Duration::from_millis(4)));
        assert!(budget.is_exhausted(0, Duration::from_millis(5)));
    }

    #[test]
    fn test_request_from_mask() {
        let Ok(mesh) = GridMesh::new(3, 1, 1) else {
            panic!("valid mesh");
        };
        let mut mask = MeshMask::all_free(mesh);
        mask.set(Point::new(0, 0, 0), VoxelClass::Source);
        mask.set(Point::new(2, 0, 0), VoxelClass::Sink);

        let request = SegmentationRequest::from_mask(&mask);
        assert_eq!(request.sources(), &[Point::new(0, 0, 0)]);
        assert_eq!(request.goals(), &[Point::new(2, 0, 0)]);
        assert_eq!(request.budget(), &SearchBudget::unlimited());
    }

    #[test]
    fn test_request_builders() {
        let request = SegmentationRequest::new(Point::origin(), Point::new(1, 0, 0))
            .with_goal(Point::new(0, 1, 0))
            .with_budget(SearchBudget::unlimited().with_max_settled(1));
        assert_eq!(request.goals().len(), 2);
        assert_eq!(request.budget().max_settled(), Some(1));
    }
}
