use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::BuildHasherDefault;

use indexmap::map::Entry;
use indexmap::IndexMap;
use rustc_hash::{FxHashSet, FxHasher};
use smallvec::SmallVec;

use crate::geo::{great_circle, Position};
use crate::route::context::{Expansion, SearchOptions, TraversalContext};
use crate::route::finder::PreprocessedGraph;
use crate::route::phantom::PhantomOverlay;
use crate::route::turn;
use crate::topology::VertexIx;

type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Estimates the remaining cost from a vertex to the goal. The
/// search stays optimal only while the estimate never exceeds the
/// true remaining cost.
pub(crate) trait Heuristic {
    fn estimate(&self, vertex: VertexIx, goal: VertexIx) -> f64;
}

/// Zero estimate: the label-setting core degenerates into Dijkstra.
pub(crate) struct NoHeuristic;

impl Heuristic for NoHeuristic {
    #[inline]
    fn estimate(&self, _vertex: VertexIx, _goal: VertexIx) -> f64 {
        0f64
    }
}

/// Great-circle distance to the goal, in kilometers. Falls back to
/// zero when either coordinate is unavailable, which trivially keeps
/// the estimate admissible.
pub(crate) struct GreatCircleHeuristic<'g, D> {
    pub graph: &'g PreprocessedGraph<D>,
}

impl<D> Heuristic for GreatCircleHeuristic<'_, D> {
    fn estimate(&self, vertex: VertexIx, goal: VertexIx) -> f64 {
        let coordinates = &self.graph.topology.coordinates;
        match (
            coordinates.get(vertex as usize),
            coordinates.get(goal as usize),
        ) {
            (Some(a), Some(b)) => great_circle(a, b),
            _ => 0f64,
        }
    }
}

#[derive(Debug)]
struct SmallestHolder {
    priority: f64,
    index: usize,
}

impl PartialEq for SmallestHolder {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl Eq for SmallestHolder {}

impl PartialOrd for SmallestHolder {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SmallestHolder {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        other.priority.total_cmp(&self.priority)
    }
}

/// Label-setting search over the compacted graph with the phantom
/// overlay consulted for endpoint grafts.
///
/// The heap holds indices into the parents table rather than full
/// paths; the winning path is rebuilt from parent links on goal hit.
/// Entries superseded by a cheaper relaxation are discarded lazily
/// at pop time. Returns the accumulated cost (biases included) and
/// the vertex sequence, or `None` when the goal is unreachable.
pub(crate) fn search<D: Clone, H: Heuristic>(
    view: &PhantomOverlay<'_, D>,
    start: VertexIx,
    goal: VertexIx,
    options: &SearchOptions<'_>,
    heuristic: &H,
) -> Option<(f64, Vec<VertexIx>)> {
    let graph = view.graph();
    let goal_coordinate = *graph.topology.coordinate(goal);

    let mut to_see = BinaryHeap::with_capacity(256);
    let mut seen: FxHashSet<usize> = FxHashSet::default();
    let mut parents: FxIndexMap<VertexIx, (usize, f64)> =
        FxIndexMap::with_capacity_and_hasher(64, BuildHasherDefault::<FxHasher>::default());

    parents.insert(start, (usize::MAX, 0f64));
    to_see.push(SmallestHolder {
        priority: heuristic.estimate(start, goal),
        index: 0,
    });

    while let Some(SmallestHolder { index, .. }) = to_see.pop() {
        // Lazy deletion: an index popped once is settled, later
        // holders for it are stale.
        if !seen.insert(index) {
            continue;
        }

        let (node, cost) = {
            let (node, &(_, cost)) = parents.get_index(index).unwrap();
            (*node, cost)
        };

        if let Some(on_expand) = options.on_expand {
            on_expand(&Expansion { vertex: node, cost });
        }
        if node == goal {
            return Some((cost, rebuild(&parents, index)));
        }

        let trace = options.needs_trace().then(|| rebuild(&parents, index));
        let from_coordinate = *graph.topology.coordinate(node);

        for (next, edge) in view.neighbors(node) {
            let mut bias = 0f64;

            if let Some(trace) = &trace {
                if options.avoid_sharp_turns {
                    let approach: SmallVec<[Position; 2]> = trace
                        [trace.len().saturating_sub(3)..trace.len() - 1]
                        .iter()
                        .map(|&vertex| *graph.topology.coordinate(vertex))
                        .collect();
                    if !turn::permits_turn(&approach, from_coordinate, edge) {
                        continue;
                    }
                }

                if options.transition_guard.is_some() || options.direction_bias.is_some() {
                    let previous = (trace.len() >= 2).then(|| {
                        let vertex = trace[trace.len() - 2];
                        (vertex, *graph.topology.coordinate(vertex))
                    });
                    let context = TraversalContext::assemble(
                        trace.clone(),
                        previous,
                        node,
                        next,
                        cost,
                        from_coordinate,
                        *graph.topology.coordinate(next),
                        goal_coordinate,
                    );

                    if let Some(guard) = options.transition_guard {
                        if !guard(&context) {
                            continue;
                        }
                    }
                    if let Some(direction_bias) = options.direction_bias {
                        bias = direction_bias(&context);
                    }
                }
            }

            let new_cost = cost + edge.weight + bias;
            if !new_cost.is_finite() {
                continue;
            }

            let pushed = match parents.entry(next) {
                Entry::Vacant(entry) => {
                    let next_index = entry.index();
                    entry.insert((index, new_cost));
                    Some(next_index)
                }
                Entry::Occupied(mut entry) => {
                    // A settled vertex keeps its parent link even if a
                    // cheaper offer arrives (only possible under an
                    // inconsistent heuristic); rewriting it would let
                    // the reported cost and the rebuilt path disagree.
                    if entry.get().1 > new_cost && !seen.contains(&entry.index()) {
                        entry.insert((index, new_cost));
                        Some(entry.index())
                    } else {
                        None
                    }
                }
            };

            if let Some(next_index) = pushed {
                to_see.push(SmallestHolder {
                    priority: new_cost + heuristic.estimate(next, goal),
                    index: next_index,
                });
            }
        }
    }

    None
}

/// Rebuilds the vertex sequence leading to a parents-table entry by
/// chasing parent indices back to the start sentinel.
fn rebuild(parents: &FxIndexMap<VertexIx, (usize, f64)>, index: usize) -> Vec<VertexIx> {
    let mut path = Vec::new();
    let mut cursor = index;
    while cursor != usize::MAX {
        let (vertex, &(parent, _)) = parents.get_index(cursor).unwrap();
        path.push(*vertex);
        cursor = parent;
    }
    path.reverse();
    path
}
