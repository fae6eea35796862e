//! Turning search labels into a polyline.

use ce_grid::Point;

use crate::connectivity::ConnectivityTable;
use crate::graph::{StateGraph, StateId};
use crate::search::SearchResult;

/// States from a source to `target`, source first.
///
/// Follows parent links until a state that is its own parent. Returns an
/// empty vector if `target` has no label.
#[must_use]
pub fn state_chain(result: &SearchResult, target: StateId) -> Vec<StateId> {
    let mut chain = Vec::new();
    let mut current = target;
    while let Some(label) = result.label(current) {
        chain.push(current);
        if label.parent == current || chain.len() > result.settled() + 1 {
            break;
        }
        current = label.parent;
    }
    chain.reverse();
    chain
}

/// The grid points of the path to the search target, source first.
///
/// Each state contributes exactly one point; consecutive points differ by a
/// row of the connectivity table. Empty when the search has no target.
///
/// # Example
///
/// ```
/// use curve_search::cost::{CostModel, NearestVoxel};
/// use curve_search::graph::NodeGraph;
/// use curve_search::heuristics::GoalHeuristic;
/// use curve_search::reconstruct::{is_table_path, reconstruct};
/// use curve_search::search::{SearchOptions, ShortestPathSearch};
/// use curve_search::ConnectivityTable;
/// use curve_types::InstanceSettings;
/// use ce_grid::{GridMesh, MeshMask, Point, Volume};
///
/// let mesh = GridMesh::new(3, 3, 1).unwrap();
/// let data = Volume::filled(mesh, 1.0);
/// let mask = MeshMask::all_free(mesh);
/// let settings = InstanceSettings::new();
/// let model = CostModel::new(NearestVoxel::new(&data), &settings);
/// let table = ConnectivityTable::planar_neighbors();
/// let graph = NodeGraph::new(&mask, &table, &model);
///
/// let goal = Point::new(2, 2, 0);
/// let heuristic = GoalHeuristic::new(&[goal], &[1.0; 3], 0.0);
/// let result = ShortestPathSearch::new(&graph, &heuristic, SearchOptions::default())
///     .run(&[0], &[mesh.sub2ind(goal).unwrap()]);
///
/// let points = reconstruct(&graph, &result);
/// assert_eq!(points.first(), Some(&Point::origin()));
/// assert_eq!(points.last(), Some(&goal));
/// assert!(is_table_path(&points, &table));
/// ```
#[must_use]
pub fn reconstruct<G: StateGraph>(graph: &G, result: &SearchResult) -> Vec<Point> {
    let Some(target) = result.target() else {
        return Vec::new();
    };
    state_chain(result, target)
        .into_iter()
        .filter_map(|state| graph.mesh().ind2sub(graph.node_of(state)))
        .collect()
}

/// Whether every consecutive pair of points differs by a table row.
///
/// Paths with fewer than two points pass trivially.
#[must_use]
pub fn is_table_path(points: &[Point], table: &ConnectivityTable) -> bool {
    points
        .windows(2)
        .all(|pair| table.index_of(pair[1] - pair[0]).is_some())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cost::{CostModel, NearestVoxel};
    use crate::graph::EdgeGraph;
    use crate::heuristics::GoalHeuristic;
    use crate::search::{SearchOptions, ShortestPathSearch};
    use ce_grid::{GridMesh, MeshMask, Volume};
    use curve_types::InstanceSettings;

    #[test]
    fn test_is_table_path() {
        let table = ConnectivityTable::face_neighbors();
        let good = [Point::origin(), Point::new(1, 0, 0), Point::new(1, 0, 1)];
        let bad = [Point::origin(), Point::new(1, 1, 0)];
        assert!(is_table_path(&good, &table));
        assert!(!is_table_path(&bad, &table));
        assert!(is_table_path(&[Point::origin()], &table));
    }

    #[test]
    fn test_edge_graph_path_projects_to_nodes() {
        let mesh = GridMesh::new(4, 4, 1).unwrap();
        let data = Volume::filled(mesh, 1.0);
        let mask = MeshMask::all_free(mesh);
        let settings = InstanceSettings::new().with_curvature_penalty(1.0);
        let model = CostModel::new(NearestVoxel::new(&data), &settings);
        let table = ConnectivityTable::planar_neighbors();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap();
        let graph = EdgeGraph::new(&mask, &table, &model, 4.0, &pool).unwrap();

        let goal = Point::new(3, 3, 0);
        let heuristic = GoalHeuristic::new(&[goal], &[1.0; 3], 0.0);
        let result = ShortestPathSearch::new(&graph, &heuristic, SearchOptions::default())
            .run(&[0], &[mesh.sub2ind(goal).unwrap()]);

        let points = reconstruct(&graph, &result);
        assert_eq!(points.len(), 7);
        assert_eq!(points[0], Point::origin());
        assert_eq!(points[6], goal);
        assert!(is_table_path(&points, &table));
    }

    #[test]
    fn test_no_target_no_points() {
        let mesh = GridMesh::new(2, 1, 1).unwrap();
        let data = Volume::filled(mesh, 1.0);
        let mut mask = MeshMask::all_free(mesh);
        mask.set(Point::new(1, 0, 0), ce_grid::VoxelClass::Excluded);
        let settings = InstanceSettings::new();
        let model = CostModel::new(NearestVoxel::new(&data), &settings);
        let table = ConnectivityTable::face_neighbors();
        let graph = crate::graph::NodeGraph::new(&mask, &table, &model);
        let heuristic = GoalHeuristic::new(&[Point::new(1, 0, 0)], &[1.0; 3], 0.0);
        let result = ShortestPathSearch::new(&graph, &heuristic, SearchOptions::default())
            .run(&[0], &[1]);
        assert!(reconstruct(&graph, &result).is_empty());
    }
}
