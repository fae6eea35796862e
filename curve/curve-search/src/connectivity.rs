//! Candidate moves and the turn/twist tables derived from them.
//!
//! A [`ConnectivityTable`] lists the neighbor offsets a curve may take in a
//! single step. The regularized searches additionally need, for every pair
//! of consecutive steps, the cost of turning from one to the other
//! ([`TurnTable`]), and for every triple, the cost of twisting out of the
//! plane of the previous turn ([`TwistTable`]). Both are precomputed once
//! per call on a rayon pool.
//!
//! # Example
//!
//! ```
//! use curve_search::ConnectivityTable;
//!
//! let table = ConnectivityTable::full_neighbors();
//! assert_eq!(table.len(), 26);
//!
//! // Steps scaled by anisotropic voxels.
//! let steps = table.physical_steps(&[1.0, 1.0, 2.0]);
//! assert_eq!(steps.len(), 26);
//! ```

use ce_grid::{Point, Vector3};
use curve_types::CurveError;
use hashbrown::HashSet;
use rayon::prelude::*;

/// The set of directed neighbor offsets a path may use.
///
/// Rows are kept in the order they were given; row indices identify edges
/// in the edge and edge-pair state graphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityTable {
    rows: Vec<Point>,
}

impl ConnectivityTable {
    /// Creates a table from explicit offsets.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidConfig`] if the table is empty, contains
    /// the zero offset, or repeats a row.
    ///
    /// # Example
    ///
    /// ```
    /// use curve_search::ConnectivityTable;
    /// use ce_grid::Point;
    ///
    /// // A knight-like long-range step is allowed.
    /// let table = ConnectivityTable::new(vec![
    ///     Point::new(1, 0, 0),
    ///     Point::new(-1, 0, 0),
    ///     Point::new(2, 1, 0),
    /// ]).unwrap();
    /// assert_eq!(table.len(), 3);
    ///
    /// assert!(ConnectivityTable::new(vec![]).is_err());
    /// assert!(ConnectivityTable::new(vec![Point::origin()]).is_err());
    /// ```
    pub fn new(rows: Vec<Point>) -> Result<Self, CurveError> {
        if rows.is_empty() {
            return Err(CurveError::invalid_config(
                "connectivity table must contain at least one row",
            ));
        }
        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            if row.is_zero() {
                return Err(CurveError::invalid_config(
                    "connectivity table contains the zero offset",
                ));
            }
            if !seen.insert(*row) {
                return Err(CurveError::invalid_config(format!(
                    "connectivity table repeats row {row}"
                )));
            }
        }
        Ok(Self { rows })
    }

    /// Creates a table from `[dx, dy, dz]` triples.
    ///
    /// # Errors
    ///
    /// Same as [`ConnectivityTable::new`].
    pub fn from_offsets(offsets: &[[i32; 3]]) -> Result<Self, CurveError> {
        Self::new(offsets.iter().copied().map(Point::from).collect())
    }

    /// The 4 in-plane face neighbors (±x, ±y).
    #[must_use]
    pub fn planar_neighbors() -> Self {
        Self::stencil(|p| p.z == 0 && p.x.abs() + p.y.abs() == 1)
    }

    /// The 6 face neighbors.
    #[must_use]
    pub fn face_neighbors() -> Self {
        Self::stencil(|p| p.x.abs() + p.y.abs() + p.z.abs() == 1)
    }

    /// Face and edge neighbors (18).
    #[must_use]
    pub fn edge_neighbors() -> Self {
        Self::stencil(|p| p.x.abs() + p.y.abs() + p.z.abs() <= 2)
    }

    /// All 26 neighbors of the unit cube.
    #[must_use]
    pub fn full_neighbors() -> Self {
        Self::stencil(|_| true)
    }

    fn stencil(keep: impl Fn(Point) -> bool) -> Self {
        let mut rows = Vec::with_capacity(26);
        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let p = Point::new(dx, dy, dz);
                    if !p.is_zero() && keep(p) {
                        rows.push(p);
                    }
                }
            }
        }
        Self { rows }
    }

    /// The offsets, in table order.
    #[must_use]
    pub fn rows(&self) -> &[Point] {
        &self.rows
    }

    /// Offset of row `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<Point> {
        self.rows.get(index).copied()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always `false`; construction rejects empty tables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row index of an offset, if present.
    #[must_use]
    pub fn index_of(&self, offset: Point) -> Option<usize> {
        self.rows.iter().position(|row| *row == offset)
    }

    /// Step vectors in physical units.
    #[must_use]
    pub fn physical_steps(&self, voxel_dimensions: &[f64; 3]) -> Vec<Vector3<f64>> {
        self.rows
            .iter()
            .map(|row| row.scaled(voxel_dimensions))
            .collect()
    }

    /// Rows whose physical length is at most `radius`.
    ///
    /// Only these rows take part in curvature- and torsion-aware search.
    #[must_use]
    pub fn within_radius(&self, voxel_dimensions: &[f64; 3], radius: f64) -> Vec<usize> {
        self.physical_steps(voxel_dimensions)
            .iter()
            .enumerate()
            .filter(|(_, step)| step.norm() <= radius)
            .map(|(index, _)| index)
            .collect()
    }
}

/// One allowed continuation of an incoming edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Turn {
    /// Slot of the outgoing edge (index into [`TurnTable::edges`]).
    pub to: usize,
    /// Identifier of the (incoming, outgoing) pair.
    pub pair: usize,
    /// Regularization cost of taking this turn.
    pub cost: f64,
}

/// Enumerated edge pairs with their turning costs.
///
/// Edges are addressed by slot: slot `s` refers to table row
/// `edges()[s]`. A pair `(a, b)` is present when both edges fit inside a
/// ball of the regularization radius around the shared node.
#[derive(Debug, Clone)]
pub struct TurnTable {
    edges: Vec<usize>,
    turns: Vec<Vec<Turn>>,
    pairs: Vec<(usize, usize)>,
}

impl TurnTable {
    /// Enumerates pairs over the table rows within `radius`.
    ///
    /// `turn_cost` receives the incoming and outgoing physical step vectors.
    pub fn build<F>(
        table: &ConnectivityTable,
        voxel_dimensions: &[f64; 3],
        radius: f64,
        pool: &rayon::ThreadPool,
        turn_cost: F,
    ) -> Self
    where
        F: Fn(&Vector3<f64>, &Vector3<f64>) -> f64 + Sync,
    {
        let steps = table.physical_steps(voxel_dimensions);
        let edges = table.within_radius(voxel_dimensions, radius);

        let costs: Vec<Vec<f64>> = pool.install(|| {
            edges
                .par_iter()
                .map(|&a| {
                    edges
                        .iter()
                        .map(|&b| turn_cost(&steps[a], &steps[b]))
                        .collect()
                })
                .collect()
        });

        let mut pairs = Vec::with_capacity(edges.len() * edges.len());
        let turns = costs
            .into_iter()
            .enumerate()
            .map(|(a, row)| {
                row.into_iter()
                    .enumerate()
                    .map(|(b, cost)| {
                        let pair = pairs.len();
                        pairs.push((a, b));
                        Turn { to: b, pair, cost }
                    })
                    .collect()
            })
            .collect();

        Self {
            edges,
            turns,
            pairs,
        }
    }

    /// Table rows taking part in the enumeration, by slot.
    #[must_use]
    pub fn edges(&self) -> &[usize] {
        &self.edges
    }

    /// Number of edge slots.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of enumerated pairs.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Continuations of the edge in slot `incoming`.
    #[must_use]
    pub fn turns_from(&self, incoming: usize) -> &[Turn] {
        self.turns.get(incoming).map_or(&[], Vec::as_slice)
    }

    /// The `(incoming, outgoing)` slots of a pair.
    #[must_use]
    pub fn pair(&self, pair: usize) -> Option<(usize, usize)> {
        self.pairs.get(pair).copied()
    }
}

/// One allowed continuation of an edge pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Twist {
    /// Slot of the third edge.
    pub to: usize,
    /// Identifier of the pair formed by the second and third edges.
    pub pair: usize,
    /// Turning cost of the second pair plus the torsion cost of the triple.
    pub cost: f64,
}

/// Enumerated edge triples with their combined turning and torsion costs.
#[derive(Debug, Clone)]
pub struct TwistTable {
    twists: Vec<Vec<Twist>>,
}

impl TwistTable {
    /// Enumerates triples `(a, b, c)` of pairs from `turns`.
    ///
    /// A triple is kept when both outer nodes lie within `radius` of the
    /// midpoint of the middle edge. `twist_cost` receives the three
    /// physical step vectors in order.
    pub fn build<F>(
        table: &ConnectivityTable,
        turns: &TurnTable,
        voxel_dimensions: &[f64; 3],
        radius: f64,
        pool: &rayon::ThreadPool,
        twist_cost: F,
    ) -> Self
    where
        F: Fn(&Vector3<f64>, &Vector3<f64>, &Vector3<f64>) -> f64 + Sync,
    {
        let steps = table.physical_steps(voxel_dimensions);
        let vector = |slot: usize| &steps[turns.edges[slot]];

        let twists = pool.install(|| {
            turns
                .pairs
                .par_iter()
                .map(|&(a, b)| {
                    let (va, vb) = (vector(a), vector(b));
                    let half = vb * 0.5;
                    if (half + va).norm() > radius {
                        return Vec::new();
                    }
                    turns
                        .turns_from(b)
                        .iter()
                        .filter_map(|turn| {
                            let vc = vector(turn.to);
                            if (half + vc).norm() > radius {
                                return None;
                            }
                            Some(Twist {
                                to: turn.to,
                                pair: turn.pair,
                                cost: turn.cost + twist_cost(va, vb, vc),
                            })
                        })
                        .collect()
                })
                .collect()
        });

        Self { twists }
    }

    /// Continuations of `pair`.
    #[must_use]
    pub fn twists_from(&self, pair: usize) -> &[Twist] {
        self.twists.get(pair).map_or(&[], Vec::as_slice)
    }

    /// Total number of enumerated triples.
    #[must_use]
    pub fn triple_count(&self) -> usize {
        self.twists.iter().map(Vec::len).sum()
    }
}
