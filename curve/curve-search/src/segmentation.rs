//! Segmentation entry points.
//!
//! A [`Segmenter`] validates its inputs once, owns the rayon pool sized by
//! `num_threads`, and runs any number of requests against the same data.
//! [`Segmenter::segment`] picks the data policy from `data_type` and the
//! state graph from the active penalties; the `*_segmentation` methods
//! expose each graph directly with caller-chosen cost policies.

use ce_grid::{MeshMask, Point, Volume, VoxelClass};
use curve_types::{
    CurveError, DataType, InstanceSettings, RegularizationOrder, SearchBudget, SegmentationOutput,
    SegmentationRequest, TimingContext,
};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::connectivity::ConnectivityTable;
use crate::cost::{
    CostModel, CurvatureCost, DataCost, DihedralAngle, EuclideanLength, LengthCost,
    LinearInterpolation, NearestVoxel, TorsionCost, TurningAngle, validate_data,
};
use crate::graph::{EdgeGraph, EdgePairGraph, NodeGraph, StateGraph};
use crate::heuristics::GoalHeuristic;
use crate::reconstruct::reconstruct;
use crate::search::{SearchOptions, ShortestPathSearch};

/// A request checked against the grid and mask.
#[derive(Debug, Clone)]
struct Resolved {
    sources: Vec<usize>,
    goals: Vec<usize>,
    goal_points: Vec<Point>,
    budget: SearchBudget,
}

/// Validated inputs shared by any number of segmentation calls.
///
/// # Example
///
/// ```
/// use curve_search::{ConnectivityTable, Segmenter};
/// use curve_types::{DataType, InstanceSettings, SegmentationRequest};
/// use ce_grid::{GridMesh, MeshMask, Point, Volume};
///
/// let mesh = GridMesh::new(5, 5, 1).unwrap();
/// let data = Volume::filled(mesh, 1.0);
/// let mask = MeshMask::all_free(mesh);
/// let table = ConnectivityTable::planar_neighbors();
/// let settings = InstanceSettings::new()
///     .with_data_type(DataType::Nearest)
///     .with_length_penalty(1.0);
///
/// let segmenter = Segmenter::new(&data, &mask, &table, &settings).unwrap();
/// let output = segmenter
///     .segment(&SegmentationRequest::new(Point::new(0, 0, 0), Point::new(4, 4, 0)))
///     .unwrap();
///
/// assert_eq!(output.len(), 9);
/// assert!((output.cost() - 16.0).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct Segmenter<'a> {
    data: &'a Volume<f64>,
    mask: &'a MeshMask,
    connectivity: &'a ConnectivityTable,
    settings: InstanceSettings,
    pool: rayon::ThreadPool,
}

impl<'a> Segmenter<'a> {
    /// Validates settings and inputs and builds the worker pool.
    ///
    /// # Errors
    ///
    /// - [`CurveError::InvalidConfig`] for invalid settings, negative or
    ///   non-finite data values, or a pool that cannot be built
    /// - [`CurveError::ShapeMismatch`] if data and mask grids differ
    pub fn new(
        data: &'a Volume<f64>,
        mask: &'a MeshMask,
        connectivity: &'a ConnectivityTable,
        settings: &InstanceSettings,
    ) -> Result<Self, CurveError> {
        settings.validate()?;
        if data.mesh() != mask.mesh() {
            return Err(CurveError::ShapeMismatch {
                data: data.mesh().dims(),
                mask: mask.mesh().dims(),
            });
        }
        validate_data(data)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.worker_threads())
            .build()
            .map_err(|e| CurveError::invalid_config(format!("cannot build thread pool: {e}")))?;

        Ok(Self {
            data,
            mask,
            connectivity,
            settings: *settings,
            pool,
        })
    }

    /// The settings every call uses.
    #[must_use]
    pub const fn settings(&self) -> &InstanceSettings {
        &self.settings
    }

    /// The worker pool.
    #[must_use]
    pub const fn pool(&self) -> &rayon::ThreadPool {
        &self.pool
    }

    /// Extracts the cheapest curve for one request.
    ///
    /// An empty request takes its sources and goals from the `Source` and
    /// `Sink` voxels of the mask.
    ///
    /// # Errors
    ///
    /// Returns an error if the request has no source or goal, or names a
    /// point outside the grid or on an excluded voxel. An unreachable goal
    /// is not an error; see [`SegmentationOutput::status`].
    pub fn segment(&self, request: &SegmentationRequest) -> Result<SegmentationOutput, CurveError> {
        match self.settings.data_type() {
            DataType::Nearest => self.segment_with(NearestVoxel::new(self.data), request),
            DataType::LinearInterpolation => {
                self.segment_with(LinearInterpolation::new(self.data), request)
            }
        }
    }

    /// Runs independent requests in parallel on the pool.
    ///
    /// Results are returned in request order.
    pub fn segment_batch(
        &self,
        requests: &[SegmentationRequest],
    ) -> Vec<Result<SegmentationOutput, CurveError>> {
        self.pool
            .install(|| requests.par_iter().map(|r| self.segment(r)).collect())
    }

    fn segment_with<D: DataCost>(
        &self,
        data: D,
        request: &SegmentationRequest,
    ) -> Result<SegmentationOutput, CurveError> {
        match self.settings.regularization_order() {
            RegularizationOrder::Node => self.node_segmentation(data, EuclideanLength, request),
            RegularizationOrder::Edge => {
                self.edge_segmentation(data, EuclideanLength, TurningAngle, request)
            }
            RegularizationOrder::EdgePair => self.edgepair_segmentation(
                data,
                EuclideanLength,
                TurningAngle,
                DihedralAngle,
                request,
            ),
        }
    }

    /// Searches the node graph: data and length costs only.
    ///
    /// # Errors
    ///
    /// Same as [`Segmenter::segment`].
    pub fn node_segmentation<D: DataCost, L: LengthCost>(
        &self,
        data: D,
        length: L,
        request: &SegmentationRequest,
    ) -> Result<SegmentationOutput, CurveError> {
        let mut timing = TimingContext::new(self.settings.verbose());
        let resolved = self.resolve(request)?;
        let model =
            CostModel::with_policies(data, length, TurningAngle, DihedralAngle, &self.settings);
        let graph = NodeGraph::new(self.mask, self.connectivity, &model);
        timing.lap("graph construction");
        Ok(self.run(&graph, &model, &resolved, timing))
    }

    /// Searches the edge graph: adds curvature between consecutive steps.
    ///
    /// # Errors
    ///
    /// Same as [`Segmenter::segment`].
    pub fn edge_segmentation<D: DataCost, L: LengthCost, C: CurvatureCost>(
        &self,
        data: D,
        length: L,
        curvature: C,
        request: &SegmentationRequest,
    ) -> Result<SegmentationOutput, CurveError> {
        let mut timing = TimingContext::new(self.settings.verbose());
        let resolved = self.resolve(request)?;
        let model = CostModel::with_policies(data, length, curvature, DihedralAngle, &self.settings);
        let graph = EdgeGraph::new(
            self.mask,
            self.connectivity,
            &model,
            self.settings.regularization_radius(),
            &self.pool,
        )?;
        timing.lap("graph construction");
        Ok(self.run(&graph, &model, &resolved, timing))
    }

    /// Searches the edge-pair graph: adds curvature and torsion.
    ///
    /// # Errors
    ///
    /// Same as [`Segmenter::segment`].
    pub fn edgepair_segmentation<D, L, C, T>(
        &self,
        data: D,
        length: L,
        curvature: C,
        torsion: T,
        request: &SegmentationRequest,
    ) -> Result<SegmentationOutput, CurveError>
    where
        D: DataCost,
        L: LengthCost,
        C: CurvatureCost,
        T: TorsionCost,
    {
        let mut timing = TimingContext::new(self.settings.verbose());
        let resolved = self.resolve(request)?;
        let model = CostModel::with_policies(data, length, curvature, torsion, &self.settings);
        let graph = EdgePairGraph::new(
            self.mask,
            self.connectivity,
            &model,
            self.settings.regularization_radius(),
            &self.pool,
        )?;
        timing.lap("graph construction");
        Ok(self.run(&graph, &model, &resolved, timing))
    }

    fn resolve(&self, request: &SegmentationRequest) -> Result<Resolved, CurveError> {
        let from_mask;
        let request = if request.sources().is_empty() && request.goals().is_empty() {
            from_mask = SegmentationRequest::from_mask(self.mask).with_budget(*request.budget());
            &from_mask
        } else {
            request
        };

        if request.sources().is_empty() {
            return Err(CurveError::EmptyRequest("source"));
        }
        if request.goals().is_empty() {
            return Err(CurveError::EmptyRequest("goal"));
        }

        let index = |p: Point| -> Result<usize, CurveError> {
            let index = self
                .mask
                .mesh()
                .require(p)
                .map_err(|_| CurveError::OutOfBounds(p))?;
            if self.mask.at(index) == Some(&VoxelClass::Excluded) {
                return Err(CurveError::Excluded(p));
            }
            Ok(index)
        };

        Ok(Resolved {
            sources: request
                .sources()
                .iter()
                .map(|p| index(*p))
                .collect::<Result<_, _>>()?,
            goals: request
                .goals()
                .iter()
                .map(|p| index(*p))
                .collect::<Result<_, _>>()?,
            goal_points: request.goals().to_vec(),
            budget: *request.budget(),
        })
    }

    fn run<G, D, L, C, T>(
        &self,
        graph: &G,
        model: &CostModel<D, L, C, T>,
        resolved: &Resolved,
        mut timing: TimingContext,
    ) -> SegmentationOutput
    where
        G: StateGraph,
        D: DataCost,
        L: LengthCost,
        C: CurvatureCost,
        T: TorsionCost,
    {
        let dims = model.voxel_dimensions();
        let max_step = self
            .connectivity
            .physical_steps(dims)
            .iter()
            .map(|step| step.norm())
            .fold(0.0, f64::max);
        let heuristic =
            GoalHeuristic::new(&resolved.goal_points, dims, model.rate_lower_bound(max_step));
        let options = SearchOptions::from_settings(&self.settings).with_budget(resolved.budget);

        let result = ShortestPathSearch::new(graph, &heuristic, options)
            .run(&resolved.sources, &resolved.goals);
        timing.lap("search");

        let points = reconstruct(graph, &result);
        timing.lap("reconstruction");

        let mut output = SegmentationOutput::new(points, result.cost(), result.status())
            .with_evaluations(result.evaluations())
            .with_settled(result.settled());
        if self.settings.store_visit_time() {
            output = output.with_visit_time(result.visit_time_map(graph));
        }
        if self.settings.store_parents() {
            output = output.with_shortest_path_tree(result.parent_map(graph));
        }
        if self.settings.store_distances() {
            output = output.with_distances(result.distance_map(graph));
        }
        let output = output.with_run_time(timing.total());

        if self.settings.verbose() {
            info!(
                graph = G::NAME,
                status = ?output.status(),
                cost = output.cost(),
                points = output.len(),
                evaluations = output.evaluations(),
                seconds = output.run_time().as_secs_f64(),
                "segmentation finished"
            );
        } else {
            debug!(
                graph = G::NAME,
                status = ?output.status(),
                cost = output.cost(),
                "segmentation finished"
            );
        }
        output
    }
}

/// One-shot segmentation: validates, builds a [`Segmenter`], and runs a
/// single request.
///
/// # Errors
///
/// Same as [`Segmenter::new`] and [`Segmenter::segment`].
///
/// # Example
///
/// ```
/// use curve_search::{ConnectivityTable, segment};
/// use curve_types::{InstanceSettings, SearchStatus, SegmentationRequest};
/// use ce_grid::{GridMesh, MeshMask, Point, Volume};
///
/// let mesh = GridMesh::new(3, 1, 1).unwrap();
/// let data = Volume::filled(mesh, 1.0);
/// let mask = MeshMask::all_free(mesh);
/// let table = ConnectivityTable::face_neighbors();
///
/// let output = segment(
///     &data,
///     &mask,
///     &table,
///     &InstanceSettings::default(),
///     &SegmentationRequest::new(Point::new(0, 0, 0), Point::new(2, 0, 0)),
/// )
/// .unwrap();
/// assert_eq!(output.status(), SearchStatus::Reached);
/// ```
pub fn segment(
    data: &Volume<f64>,
    mask: &MeshMask,
    connectivity: &ConnectivityTable,
    settings: &InstanceSettings,
    request: &SegmentationRequest,
) -> Result<SegmentationOutput, CurveError> {
    Segmenter::new(data, mask, connectivity, settings)?.segment(request)
}
