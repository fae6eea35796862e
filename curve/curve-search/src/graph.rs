//! State graphs searched by the shortest-path engine.
//!
//! The three graphs share the grid and the connectivity table but differ in
//! how much history a state carries:
//!
//! | Graph | State | Regularization |
//! |-------|-------|----------------|
//! | [`NodeGraph`] | node | none |
//! | [`EdgeGraph`] | node + incoming edge | curvature |
//! | [`EdgePairGraph`] | node + last two edges | curvature and torsion |
//!
//! States are packed into a single [`StateId`]: `node · stride + slot`.
//! Every node owns `stride` slots. The last slot of each node is its root
//! state, used when the node is a source and the curve has no history yet.
//! The edge-pair graph additionally has one head slot per edge for the first
//! step out of a source, where a turn is known but no twist is.

use ce_grid::{GridMesh, MeshMask, Point, Vector3};
use curve_types::CurveError;

use crate::connectivity::{ConnectivityTable, TurnTable, TwistTable};
use crate::cost::{CostModel, CurvatureCost, DataCost, LengthCost, TorsionCost};

/// Packed identifier of a search state.
pub type StateId = usize;

/// A graph whose states project onto grid nodes.
///
/// The search engine is generic over this trait, so each graph is
/// monomorphized into its own search loop.
pub trait StateGraph {
    /// Short name used in log output.
    const NAME: &'static str;

    /// The grid the states live on.
    fn mesh(&self) -> &GridMesh;

    /// Number of addressable states.
    fn state_count(&self) -> usize;

    /// Linear index of the node a state sits on.
    fn node_of(&self, state: StateId) -> usize;

    /// The history-free state of a source node.
    fn root_state(&self, node: usize) -> StateId;

    /// Appends every successor of `state` with its transition cost.
    fn successors(&self, state: StateId, out: &mut Vec<(StateId, f64)>);
}

/// Grid, mask, and table rows with their physical step vectors.
#[derive(Debug, Clone)]
struct Lattice<'a> {
    mask: &'a MeshMask,
    rows: Vec<Point>,
    steps: Vec<Vector3<f64>>,
}

impl<'a> Lattice<'a> {
    fn new(mask: &'a MeshMask, table: &ConnectivityTable, voxel_dimensions: &[f64; 3]) -> Self {
        Self {
            mask,
            rows: table.rows().to_vec(),
            steps: table.physical_steps(voxel_dimensions),
        }
    }

    fn mesh(&self) -> &GridMesh {
        self.mask.mesh()
    }

    fn point(&self, node: usize) -> Option<Point> {
        self.mesh().ind2sub(node)
    }

    /// Applies row `row` at `p`, returning the target and its index when it
    /// is inside the grid and not excluded.
    fn step(&self, p: Point, row: usize) -> Option<(Point, usize)> {
        let q = self.mesh().step(p, *self.rows.get(row)?)?;
        let index = self.mesh().sub2ind(q)?;
        self.mask.is_traversable_index(index).then_some((q, index))
    }
}

fn stride_checked(mesh: &GridMesh, stride: usize) -> Result<usize, CurveError> {
    mesh.len().checked_mul(stride).ok_or_else(|| {
        CurveError::invalid_config("state space does not fit in the address range")
    })
}

/// States are nodes; transitions carry data and length costs.
#[derive(Debug, Clone)]
pub struct NodeGraph<'a, D, L, C, T> {
    lattice: Lattice<'a>,
    model: &'a CostModel<D, L, C, T>,
}

impl<'a, D, L, C, T> NodeGraph<'a, D, L, C, T> {
    /// Builds the graph over every row of the table.
    #[must_use]
    pub fn new(
        mask: &'a MeshMask,
        table: &ConnectivityTable,
        model: &'a CostModel<D, L, C, T>,
    ) -> Self {
        Self {
            lattice: Lattice::new(mask, table, model.voxel_dimensions()),
            model,
        }
    }
}

impl<D, L, C, T> StateGraph for NodeGraph<'_, D, L, C, T>
where
    D: DataCost,
    L: LengthCost,
    C: CurvatureCost,
    T: TorsionCost,
{
    const NAME: &'static str = "node";

    fn mesh(&self) -> &GridMesh {
        self.lattice.mesh()
    }

    fn state_count(&self) -> usize {
        self.lattice.mesh().len()
    }

    fn node_of(&self, state: StateId) -> usize {
        state
    }

    fn root_state(&self, node: usize) -> StateId {
        node
    }

    fn successors(&self, state: StateId, out: &mut Vec<(StateId, f64)>) {
        let Some(p) = self.lattice.point(state) else {
            return;
        };
        for (row, step) in self.lattice.steps.iter().enumerate() {
            if let Some((q, index)) = self.lattice.step(p, row) {
                out.push((index, self.model.step_cost(p, q, step)));
            }
        }
    }
}

/// States are (node, incoming edge); turns between edges add curvature.
#[derive(Debug, Clone)]
pub struct EdgeGraph<'a, D, L, C, T> {
    lattice: Lattice<'a>,
    turns: TurnTable,
    model: &'a CostModel<D, L, C, T>,
    stride: usize,
}

impl<'a, D, L, C, T> EdgeGraph<'a, D, L, C, T>
where
    D: DataCost,
    L: LengthCost,
    C: CurvatureCost,
    T: TorsionCost,
{
    /// Builds the graph and precomputes turning costs on `pool`.
    ///
    /// Only rows no longer than `radius` take part.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidConfig`] if the state space is too large
    /// to address.
    pub fn new(
        mask: &'a MeshMask,
        table: &ConnectivityTable,
        model: &'a CostModel<D, L, C, T>,
        radius: f64,
        pool: &rayon::ThreadPool,
    ) -> Result<Self, CurveError> {
        let turns = TurnTable::build(table, model.voxel_dimensions(), radius, pool, |a, b| {
            model.turn_cost(a, b)
        });
        let stride = turns.edge_count() + 1;
        stride_checked(mask.mesh(), stride)?;
        Ok(Self {
            lattice: Lattice::new(mask, table, model.voxel_dimensions()),
            turns,
            model,
            stride,
        })
    }

    /// The enumerated turns.
    #[must_use]
    pub const fn turns(&self) -> &TurnTable {
        &self.turns
    }

    fn root_slot(&self) -> usize {
        self.turns.edge_count()
    }

    /// Takes the edge in slot `slot` from `p`, adding `extra` to its cost.
    fn push_edge(&self, p: Point, slot: usize, extra: f64, out: &mut Vec<(StateId, f64)>) {
        let row = self.turns.edges()[slot];
        if let Some((q, index)) = self.lattice.step(p, row) {
            let cost = self.model.step_cost(p, q, &self.lattice.steps[row]) + extra;
            out.push((index * self.stride + slot, cost));
        }
    }
}

impl<D, L, C, T> StateGraph for EdgeGraph<'_, D, L, C, T>
where
    D: DataCost,
    L: LengthCost,
    C: CurvatureCost,
    T: TorsionCost,
{
    const NAME: &'static str = "edge";

    fn mesh(&self) -> &GridMesh {
        self.lattice.mesh()
    }

    fn state_count(&self) -> usize {
        self.lattice.mesh().len() * self.stride
    }

    fn node_of(&self, state: StateId) -> usize {
        state / self.stride
    }

    fn root_state(&self, node: usize) -> StateId {
        node * self.stride + self.root_slot()
    }

    fn successors(&self, state: StateId, out: &mut Vec<(StateId, f64)>) {
        let (node, slot) = (state / self.stride, state % self.stride);
        let Some(p) = self.lattice.point(node) else {
            return;
        };
        if slot == self.root_slot() {
            for next in 0..self.turns.edge_count() {
                self.push_edge(p, next, 0.0, out);
            }
        } else {
            for turn in self.turns.turns_from(slot) {
                self.push_edge(p, turn.to, turn.cost, out);
            }
        }
    }
}

/// States are (node, last two edges); twists between turns add torsion.
#[derive(Debug, Clone)]
pub struct EdgePairGraph<'a, D, L, C, T> {
    lattice: Lattice<'a>,
    turns: TurnTable,
    twists: TwistTable,
    model: &'a CostModel<D, L, C, T>,
    stride: usize,
}

impl<'a, D, L, C, T> EdgePairGraph<'a, D, L, C, T>
where
    D: DataCost,
    L: LengthCost,
    C: CurvatureCost,
    T: TorsionCost,
{
    /// Builds the graph and precomputes turning and twisting costs on
    /// `pool`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidConfig`] if the state space is too large
    /// to address.
    pub fn new(
        mask: &'a MeshMask,
        table: &ConnectivityTable,
        model: &'a CostModel<D, L, C, T>,
        radius: f64,
        pool: &rayon::ThreadPool,
    ) -> Result<Self, CurveError> {
        let dims = model.voxel_dimensions();
        let turns = TurnTable::build(table, dims, radius, pool, |a, b| model.turn_cost(a, b));
        let twists = TwistTable::build(table, &turns, dims, radius, pool, |a, b, c| {
            model.twist_cost(a, b, c)
        });
        let stride = turns.pair_count() + turns.edge_count() + 1;
        stride_checked(mask.mesh(), stride)?;
        Ok(Self {
            lattice: Lattice::new(mask, table, dims),
            turns,
            twists,
            model,
            stride,
        })
    }

    /// The enumerated turns.
    #[must_use]
    pub const fn turns(&self) -> &TurnTable {
        &self.turns
    }

    /// The enumerated twists.
    #[must_use]
    pub const fn twists(&self) -> &TwistTable {
        &self.twists
    }

    fn head_slot(&self, edge: usize) -> usize {
        self.turns.pair_count() + edge
    }

    fn root_slot(&self) -> usize {
        self.turns.pair_count() + self.turns.edge_count()
    }

    fn push_edge(
        &self,
        p: Point,
        edge: usize,
        slot: usize,
        extra: f64,
        out: &mut Vec<(StateId, f64)>,
    ) {
        let row = self.turns.edges()[edge];
        if let Some((q, index)) = self.lattice.step(p, row) {
            let cost = self.model.step_cost(p, q, &self.lattice.steps[row]) + extra;
            out.push((index * self.stride + slot, cost));
        }
    }
}

impl<D, L, C, T> StateGraph for EdgePairGraph<'_, D, L, C, T>
where
    D: DataCost,
    L: LengthCost,
    C: CurvatureCost,
    T: TorsionCost,
{
    const NAME: &'static str = "edge-pair";

    fn mesh(&self) -> &GridMesh {
        self.lattice.mesh()
    }

    fn state_count(&self) -> usize {
        self.lattice.mesh().len() * self.stride
    }

    fn node_of(&self, state: StateId) -> usize {
        state / self.stride
    }

    fn root_state(&self, node: usize) -> StateId {
        node * self.stride + self.root_slot()
    }

    fn successors(&self, state: StateId, out: &mut Vec<(StateId, f64)>) {
        let (node, slot) = (state / self.stride, state % self.stride);
        let Some(p) = self.lattice.point(node) else {
            return;
        };
        let pairs = self.turns.pair_count();
        if slot == self.root_slot() {
            for edge in 0..self.turns.edge_count() {
                self.push_edge(p, edge, self.head_slot(edge), 0.0, out);
            }
        } else if slot >= pairs {
            for turn in self.turns.turns_from(slot - pairs) {
                self.push_edge(p, turn.to, turn.pair, turn.cost, out);
            }
        } else {
            for twist in self.twists.twists_from(slot) {
                self.push_edge(p, twist.to, twist.pair, twist.cost, out);
            }
        }
    }
}
