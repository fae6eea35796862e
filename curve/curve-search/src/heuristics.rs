//! Goal-distance heuristic for A*.
//!
//! The estimate at a node is the physical Euclidean distance to the nearest
//! goal times a lower bound on cost per unit length. Every step of length
//! `ℓ` costs at least `rate · ℓ`, and a chain of steps is at least as long
//! as the straight line it spans, so the estimate never overestimates and
//! satisfies the triangle inequality (it is consistent).
//!
//! # Example
//!
//! ```
//! use curve_search::heuristics::GoalHeuristic;
//! use ce_grid::Point;
//!
//! let goals = [Point::new(3, 4, 0)];
//! let h = GoalHeuristic::new(&goals, &[1.0, 1.0, 1.0], 2.0);
//! assert!((h.estimate(Point::origin()) - 10.0).abs() < 1e-12);
//! assert!((h.distance(Point::origin()) - 5.0).abs() < 1e-12);
//! ```

use ce_grid::{Point, Vector3};

/// Scaled Euclidean distance to the nearest goal.
#[derive(Debug, Clone)]
pub struct GoalHeuristic {
    goals: Vec<Vector3<f64>>,
    voxel_dimensions: [f64; 3],
    rate: f64,
}

impl GoalHeuristic {
    /// A heuristic toward `goals` with cost `rate` per unit of physical
    /// distance.
    #[must_use]
    pub fn new(goals: &[Point], voxel_dimensions: &[f64; 3], rate: f64) -> Self {
        Self {
            goals: goals.iter().map(|g| g.scaled(voxel_dimensions)).collect(),
            voxel_dimensions: *voxel_dimensions,
            rate: rate.max(0.0),
        }
    }

    /// The cost rate the distance is multiplied by.
    #[must_use]
    pub const fn rate(&self) -> f64 {
        self.rate
    }

    /// Physical distance from `p` to the nearest goal (`+∞` without goals).
    #[must_use]
    pub fn distance(&self, p: Point) -> f64 {
        let position = p.scaled(&self.voxel_dimensions);
        self.goals
            .iter()
            .map(|goal| (goal - position).norm())
            .fold(f64::INFINITY, f64::min)
    }

    /// Lower bound on the remaining cost from `p`.
    #[must_use]
    pub fn estimate(&self, p: Point) -> f64 {
        if self.rate == 0.0 || self.goals.is_empty() {
            return 0.0;
        }
        self.rate * self.distance(p)
    }
}

/// Physical Euclidean distance between two grid points.
///
/// # Example
///
/// ```
/// use curve_search::heuristics::euclidean_distance;
/// use ce_grid::Point;
///
/// let d = euclidean_distance(Point::origin(), Point::new(1, 0, 1), &[1.0, 1.0, 2.0]);
/// assert!((d - 5.0_f64.sqrt()).abs() < 1e-12);
/// ```
#[must_use]
pub fn euclidean_distance(from: Point, to: Point, voxel_dimensions: &[f64; 3]) -> f64 {
    (to.scaled(voxel_dimensions) - from.scaled(voxel_dimensions)).norm()
}
