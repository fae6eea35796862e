//! Label-setting shortest-path search over a [`StateGraph`].
//!
//! The frontier is a binary heap keyed on tentative cost (plus the
//! heuristic estimate when A* is enabled). Labels are kept in a sparse map,
//! so only states the search touches cost memory. A label is only replaced
//! by a strictly cheaper one, and heap ties are broken by insertion order,
//! which makes results deterministic for a given graph.
//!
//! # Example
//!
//! ```
//! use curve_search::cost::{CostModel, NearestVoxel};
//! use curve_search::graph::NodeGraph;
//! use curve_search::heuristics::GoalHeuristic;
//! use curve_search::search::{SearchOptions, ShortestPathSearch};
//! use curve_search::ConnectivityTable;
//! use curve_types::{InstanceSettings, SearchStatus};
//! use ce_grid::{GridMesh, MeshMask, Point, Volume};
//!
//! let mesh = GridMesh::new(4, 1, 1).unwrap();
//! let data = Volume::filled(mesh, 1.0);
//! let mask = MeshMask::all_free(mesh);
//! let settings = InstanceSettings::new();
//! let model = CostModel::new(NearestVoxel::new(&data), &settings);
//! let table = ConnectivityTable::face_neighbors();
//! let graph = NodeGraph::new(&mask, &table, &model);
//!
//! let heuristic = GoalHeuristic::new(&[Point::new(3, 0, 0)], &[1.0; 3], 0.0);
//! let search = ShortestPathSearch::new(&graph, &heuristic, SearchOptions::default());
//! let result = search.run(&[0], &[3]);
//!
//! assert_eq!(result.status(), SearchStatus::Reached);
//! assert!((result.cost() - 3.0).abs() < 1e-12);
//! ```

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use ce_grid::Volume;
use curve_types::{InstanceSettings, SearchBudget, SearchStatus};
use hashbrown::{HashMap, HashSet};
use tracing::debug;

use crate::graph::{StateGraph, StateId};
use crate::heuristics::GoalHeuristic;

/// How the search runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOptions {
    use_a_star: bool,
    compute_all_distances: bool,
    budget: SearchBudget,
}

impl SearchOptions {
    /// Reads the search flags from settings.
    #[must_use]
    pub const fn from_settings(settings: &InstanceSettings) -> Self {
        Self {
            use_a_star: settings.use_a_star(),
            compute_all_distances: settings.compute_all_distances(),
            budget: SearchBudget::unlimited(),
        }
    }

    /// Guides the search with the goal heuristic.
    #[must_use]
    pub const fn with_a_star(mut self, enable: bool) -> Self {
        self.use_a_star = enable;
        self
    }

    /// Keeps searching after a goal is settled, until the frontier is empty.
    #[must_use]
    pub const fn with_compute_all_distances(mut self, enable: bool) -> Self {
        self.compute_all_distances = enable;
        self
    }

    /// Limits the search.
    #[must_use]
    pub const fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Whether A* is enabled.
    #[must_use]
    pub const fn use_a_star(&self) -> bool {
        self.use_a_star
    }

    /// Whether the search runs to exhaustion.
    #[must_use]
    pub const fn compute_all_distances(&self) -> bool {
        self.compute_all_distances
    }

    /// The budget.
    #[must_use]
    pub const fn budget(&self) -> &SearchBudget {
        &self.budget
    }
}

/// Best known cost and parent of a state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Label {
    /// Tentative cost, final once settled.
    pub cost: f64,
    /// Predecessor state; a source is its own parent.
    pub parent: StateId,
    /// Position in the settle order, if settled.
    pub settled_at: Option<usize>,
}

/// Frontier entry.
#[derive(Debug, Clone, Copy)]
struct Entry {
    key: f64,
    cost: f64,
    sequence: u64,
    state: StateId,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .key
            .total_cmp(&self.key)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Labels and statistics of a finished search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    labels: HashMap<StateId, Label>,
    target: Option<StateId>,
    status: SearchStatus,
    evaluations: usize,
    settled: usize,
    elapsed: Duration,
}

impl SearchResult {
    /// How the search ended.
    #[must_use]
    pub const fn status(&self) -> SearchStatus {
        self.status
    }

    /// The reached goal state, or the best partial state when the budget
    /// ran out.
    #[must_use]
    pub const fn target(&self) -> Option<StateId> {
        self.target
    }

    /// Cost of the target state, `+∞` without one.
    #[must_use]
    pub fn cost(&self) -> f64 {
        self.target
            .and_then(|state| self.labels.get(&state))
            .map_or(f64::INFINITY, |label| label.cost)
    }

    /// Number of transition costs evaluated.
    #[must_use]
    pub const fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Number of settled states.
    #[must_use]
    pub const fn settled(&self) -> usize {
        self.settled
    }

    /// Time spent in the search loop.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Label of a state, if the search reached it.
    #[must_use]
    pub fn label(&self, state: StateId) -> Option<&Label> {
        self.labels.get(&state)
    }

    /// Settled states with their labels, in no particular order.
    pub fn settled_labels(&self) -> impl Iterator<Item = (StateId, &Label)> + '_ {
        self.labels
            .iter()
            .filter(|(_, label)| label.settled_at.is_some())
            .map(|(state, label)| (*state, label))
    }

    /// Per-node best settled label as `(cost, settle order, parent node)`.
    fn best_per_node<G: StateGraph>(&self, graph: &G) -> Vec<Option<(f64, usize, usize)>> {
        let mut best: Vec<Option<(f64, usize, usize)>> = vec![None; graph.mesh().len()];
        for (state, label) in self.settled_labels() {
            let Some(order) = label.settled_at else {
                continue;
            };
            let node = graph.node_of(state);
            let candidate = (label.cost, order, graph.node_of(label.parent));
            let Some(slot) = best.get_mut(node) else {
                continue;
            };
            let better = slot.is_none_or(|(cost, seen, _)| {
                label.cost.total_cmp(&cost).then(order.cmp(&seen)) == Ordering::Less
            });
            if better {
                *slot = Some(candidate);
            }
        }
        best
    }

    /// Order in which each node was first settled, `-1` if never.
    #[must_use]
    pub fn visit_time_map<G: StateGraph>(&self, graph: &G) -> Volume<i64> {
        let mut map = Volume::filled(*graph.mesh(), -1_i64);
        for (state, label) in self.settled_labels() {
            let Some(order) = label.settled_at.and_then(|o| i64::try_from(o).ok()) else {
                continue;
            };
            if let Some(value) = map.at_mut(graph.node_of(state)) {
                if *value < 0 || order < *value {
                    *value = order;
                }
            }
        }
        map
    }

    /// Parent node of each node's best state, `-1` if never settled.
    ///
    /// Sources are their own parent.
    #[must_use]
    pub fn parent_map<G: StateGraph>(&self, graph: &G) -> Volume<i64> {
        let best = self.best_per_node(graph);
        let values = best
            .iter()
            .map(|entry| entry.and_then(|(_, _, parent)| i64::try_from(parent).ok()).unwrap_or(-1))
            .collect();
        Volume::from_vec(*graph.mesh(), values)
            .unwrap_or_else(|_| Volume::filled(*graph.mesh(), -1))
    }

    /// Optimal cost to each node, `+∞` if never settled.
    #[must_use]
    pub fn distance_map<G: StateGraph>(&self, graph: &G) -> Volume<f64> {
        let best = self.best_per_node(graph);
        let values = best
            .iter()
            .map(|entry| entry.map_or(f64::INFINITY, |(cost, _, _)| cost))
            .collect();
        Volume::from_vec(*graph.mesh(), values)
            .unwrap_or_else(|_| Volume::filled(*graph.mesh(), f64::INFINITY))
    }
}

/// Dijkstra or A* over a state graph.
#[derive(Debug)]
pub struct ShortestPathSearch<'a, G> {
    graph: &'a G,
    heuristic: &'a GoalHeuristic,
    options: SearchOptions,
}

impl<'a, G: StateGraph> ShortestPathSearch<'a, G> {
    /// Creates a search. The heuristic guides the frontier only when A* is
    /// enabled; its distances also rank partial results under a budget.
    #[must_use]
    pub const fn new(graph: &'a G, heuristic: &'a GoalHeuristic, options: SearchOptions) -> Self {
        Self {
            graph,
            heuristic,
            options,
        }
    }

    /// The options in use.
    #[must_use]
    pub const fn options(&self) -> &SearchOptions {
        &self.options
    }

    fn estimate(&self, state: StateId) -> f64 {
        if !self.options.use_a_star {
            return 0.0;
        }
        self.graph
            .mesh()
            .ind2sub(self.graph.node_of(state))
            .map_or(0.0, |p| self.heuristic.estimate(p))
    }

    fn goal_distance(&self, state: StateId) -> f64 {
        self.graph
            .mesh()
            .ind2sub(self.graph.node_of(state))
            .map_or(f64::INFINITY, |p| self.heuristic.distance(p))
    }

    /// Searches from the root states of `sources` until a node in `goals`
    /// is settled (or, with `compute_all_distances`, until the frontier is
    /// empty).
    ///
    /// Both sets hold linear node indices.
    #[must_use]
    pub fn run(&self, sources: &[usize], goals: &[usize]) -> SearchResult {
        let started = Instant::now();
        let budget = self.options.budget;
        let limited = budget.max_settled().is_some() || budget.time_limit().is_some();
        let goal_set: HashSet<usize> = goals.iter().copied().collect();

        let mut labels: HashMap<StateId, Label> = HashMap::new();
        let mut frontier = BinaryHeap::new();
        let mut sequence = 0_u64;

        for &node in sources {
            let state = self.graph.root_state(node);
            if labels.contains_key(&state) {
                continue;
            }
            labels.insert(
                state,
                Label {
                    cost: 0.0,
                    parent: state,
                    settled_at: None,
                },
            );
            frontier.push(Entry {
                key: self.estimate(state),
                cost: 0.0,
                sequence,
                state,
            });
            sequence += 1;
        }

        let mut successors = Vec::new();
        let mut evaluations = 0_usize;
        let mut settled = 0_usize;
        let mut reached = None;
        let mut exhausted = false;
        let mut best_partial: Option<(f64, f64, StateId)> = None;

        while let Some(entry) = frontier.pop() {
            let Some(label) = labels.get_mut(&entry.state) else {
                continue;
            };
            if label.settled_at.is_some() || entry.cost > label.cost {
                continue;
            }
            label.settled_at = Some(settled);
            settled += 1;
            let cost = label.cost;

            if limited {
                let distance = self.goal_distance(entry.state);
                let closer = best_partial.is_none_or(|(d, c, _)| {
                    distance.total_cmp(&d).then(cost.total_cmp(&c)) == Ordering::Less
                });
                if closer {
                    best_partial = Some((distance, cost, entry.state));
                }
            }

            if reached.is_none() && goal_set.contains(&self.graph.node_of(entry.state)) {
                reached = Some(entry.state);
                if !self.options.compute_all_distances {
                    break;
                }
            }

            if limited {
                let elapsed = if budget.time_limit().is_some() {
                    started.elapsed()
                } else {
                    Duration::ZERO
                };
                if budget.is_exhausted(settled, elapsed) {
                    exhausted = true;
                    break;
                }
            }

            successors.clear();
            self.graph.successors(entry.state, &mut successors);
            evaluations += successors.len();

            for &(next, step) in &successors {
                let tentative = cost + step;
                let improved = match labels.get_mut(&next) {
                    Some(existing) => {
                        if existing.settled_at.is_some() || tentative >= existing.cost {
                            false
                        } else {
                            existing.cost = tentative;
                            existing.parent = entry.state;
                            true
                        }
                    }
                    None => {
                        labels.insert(
                            next,
                            Label {
                                cost: tentative,
                                parent: entry.state,
                                settled_at: None,
                            },
                        );
                        true
                    }
                };
                if improved {
                    frontier.push(Entry {
                        key: tentative + self.estimate(next),
                        cost: tentative,
                        sequence,
                        state: next,
                    });
                    sequence += 1;
                }
            }
        }

        let (status, target) = match (reached, exhausted) {
            (Some(goal), _) => (SearchStatus::Reached, Some(goal)),
            (None, true) => (
                SearchStatus::BudgetExhausted,
                best_partial.map(|(_, _, state)| state),
            ),
            (None, false) => (SearchStatus::Unreachable, None),
        };

        debug!(
            graph = G::NAME,
            settled,
            evaluations,
            labels = labels.len(),
            ?status,
            "search finished"
        );

        SearchResult {
            labels,
            target,
            status,
            evaluations,
            settled,
            elapsed: started.elapsed(),
        }
    }
}
