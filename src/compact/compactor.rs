use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use log::{debug, info};
use petgraph::prelude::DiGraphMap;
use petgraph::Direction;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::geo::Position;
use crate::topology::{Phase, ProgressFn, ReduceFn, Topology, VertexIx};

/// A collapsed chain between two surviving vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactedEdge<D> {
    /// Cumulative weight of the raw edges along the chain.
    pub weight: f64,
    /// Source coordinates strictly after the owning vertex, ending
    /// with the target vertex's own coordinate.
    pub geometry: Vec<Position>,
    /// Payload folded across the chain, present when a reducer is
    /// configured.
    pub data: Option<D>,
}

/// The compacted graph: every vertex that is not interior to a
/// linear chain, with one directed edge per traversable chain.
pub struct CompactedGraph<D> {
    pub(crate) vertices: FxHashSet<VertexIx>,
    pub(crate) edges: FxHashMap<VertexIx, FxHashMap<VertexIx, CompactedEdge<D>>>,
}

impl<D> CompactedGraph<D> {
    pub fn contains(&self, vertex: VertexIx) -> bool {
        self.vertices.contains(&vertex)
    }

    pub fn edge(&self, from: VertexIx, to: VertexIx) -> Option<&CompactedEdge<D>> {
        self.edges.get(&from).and_then(|outgoing| outgoing.get(&to))
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(FxHashMap::len).sum()
    }

    pub(crate) fn neighbors(
        &self,
        from: VertexIx,
    ) -> impl Iterator<Item = (VertexIx, &CompactedEdge<D>)> {
        self.edges
            .get(&from)
            .into_iter()
            .flat_map(|outgoing| outgoing.iter().map(|(to, edge)| (*to, edge)))
    }

    pub(crate) fn insert(&mut self, from: VertexIx, to: VertexIx, edge: CompactedEdge<D>) {
        keep_lighter(self.edges.entry(from).or_default(), to, edge);
    }
}

/// Inserts an edge into an outgoing table, resolving duplicates in
/// favour of the lighter edge. Exact weight ties keep the shorter
/// geometry, then the incumbent.
pub(crate) fn keep_lighter<D>(
    outgoing: &mut FxHashMap<VertexIx, CompactedEdge<D>>,
    to: VertexIx,
    edge: CompactedEdge<D>,
) {
    match outgoing.entry(to) {
        Entry::Occupied(mut incumbent) => {
            let lighter = edge.weight < incumbent.get().weight
                || (edge.weight == incumbent.get().weight
                    && edge.geometry.len() < incumbent.get().geometry.len());
            if lighter {
                incumbent.insert(edge);
            }
        }
        Entry::Vacant(slot) => {
            slot.insert(edge);
        }
    }
}

/// The distinct undirected neighbor set of a vertex. A vertex is
/// interior to a chain exactly when this has two elements.
pub(crate) fn distinct_neighbors(
    graph: &DiGraphMap<VertexIx, f64>,
    vertex: VertexIx,
) -> SmallVec<[VertexIx; 4]> {
    let mut neighbors: SmallVec<[VertexIx; 4]> = SmallVec::new();
    for neighbor in graph
        .neighbors_directed(vertex, Direction::Outgoing)
        .chain(graph.neighbors_directed(vertex, Direction::Incoming))
    {
        if !neighbors.contains(&neighbor) {
            neighbors.push(neighbor);
        }
    }
    neighbors
}

/// Which way a chain walk traverses the directed raw edges: a
/// `Forward` walk follows edges away from the origin, a `Reverse`
/// walk follows edges pointing back towards it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChainDirection {
    Forward,
    Reverse,
}

/// The outcome of walking one chain from a surviving vertex.
pub(crate) struct ChainWalk<D> {
    /// The surviving vertex the walk ended on. Equal to the origin
    /// when the chain is a closed ring.
    pub end: VertexIx,
    pub weight: f64,
    /// Interior chain coordinates in discovery order (origin side
    /// first), excluding both endpoints.
    pub interior: Vec<Position>,
    pub data: Option<D>,
}

/// Walks from `origin` through its neighbor `first` along a chain of
/// interior vertices until a stop vertex is reached, accumulating
/// weight, interior geometry and folded payload.
///
/// Returns `None` when a raw edge required for the walk's direction
/// is missing (a one-way segment facing the other way), or when the
/// walk revisits an interior vertex without reaching a stop.
pub(crate) fn walk_chain<D, F>(
    topology: &Topology<D>,
    reduce: Option<&ReduceFn<D>>,
    is_stop: &F,
    origin: VertexIx,
    first: VertexIx,
    direction: ChainDirection,
) -> Option<ChainWalk<D>>
where
    D: Clone,
    F: Fn(VertexIx) -> bool,
{
    let step_weight = |a: VertexIx, b: VertexIx| match direction {
        ChainDirection::Forward => topology.graph.edge_weight(a, b).copied(),
        ChainDirection::Reverse => topology.graph.edge_weight(b, a).copied(),
    };
    let step_data = |a: VertexIx, b: VertexIx| match direction {
        ChainDirection::Forward => topology.edge_data.get(&(a, b)),
        ChainDirection::Reverse => topology.edge_data.get(&(b, a)),
    };

    let mut weight = step_weight(origin, first)?;
    let mut data = match reduce {
        Some(_) => step_data(origin, first).cloned(),
        None => None,
    };

    let mut interior = Vec::new();
    let mut seen: FxHashSet<VertexIx> = FxHashSet::default();
    seen.insert(first);

    let (mut previous, mut current) = (origin, first);
    while !is_stop(current) {
        interior.push(*topology.coordinate(current));

        let next = distinct_neighbors(&topology.graph, current)
            .into_iter()
            .find(|&neighbor| neighbor != previous)?;
        weight += step_weight(current, next)?;

        if let Some(reduce) = reduce {
            if let Some(step) = step_data(current, next) {
                data = Some(match data.take() {
                    Some(folded) => reduce(&folded, step),
                    None => step.clone(),
                });
            }
        }

        previous = current;
        current = next;
        if !is_stop(current) && !seen.insert(current) {
            // Looped through interior vertices without reaching a
            // stop; no compacted edge exists in this direction.
            return None;
        }
    }

    Some(ChainWalk {
        end: current,
        weight,
        interior,
        data,
    })
}

/// Reduces a raw topology to its compacted graph.
pub(crate) struct Compactor<'t, D> {
    topology: &'t Topology<D>,
    reduce: Option<&'t ReduceFn<D>>,
}

impl<'t, D: Clone + Send + Sync> Compactor<'t, D> {
    pub(crate) fn new(topology: &'t Topology<D>, reduce: Option<&'t ReduceFn<D>>) -> Self {
        Compactor { topology, reduce }
    }

    /// Collapses every traversable chain. Surviving vertices are the
    /// junctions and dead-ends of the raw graph plus one anchor per
    /// junction-free component; chain walks fan out from each of
    /// them in parallel.
    pub(crate) fn compact(&self, progress: Option<&ProgressFn>) -> CompactedGraph<D> {
        let start_time = Instant::now();
        let graph = &self.topology.graph;

        let mut survivors: FxHashSet<VertexIx> = graph
            .nodes()
            .filter(|&vertex| distinct_neighbors(graph, vertex).len() != 2)
            .collect();
        for anchor in self.ring_anchors(&survivors) {
            survivors.insert(anchor);
        }

        let mut walk_origins: Vec<VertexIx> = survivors.iter().copied().collect();
        walk_origins.sort_unstable();

        let total = walk_origins.len();
        let done = AtomicUsize::new(0);

        let walks: Vec<(VertexIx, VertexIx, CompactedEdge<D>)> = walk_origins
            .par_iter()
            .fold(Vec::new, |mut accumulated, &origin| {
                for neighbor in graph.neighbors_directed(origin, Direction::Outgoing) {
                    let walk = walk_chain(
                        self.topology,
                        self.reduce,
                        &|vertex| survivors.contains(&vertex),
                        origin,
                        neighbor,
                        ChainDirection::Forward,
                    );
                    if let Some(walk) = walk {
                        let mut geometry = walk.interior;
                        geometry.push(*self.topology.coordinate(walk.end));
                        accumulated.push((
                            origin,
                            walk.end,
                            CompactedEdge {
                                weight: walk.weight,
                                geometry,
                                data: walk.data,
                            },
                        ));
                    }
                }

                if let Some(progress) = progress {
                    progress(
                        Phase::Compaction,
                        done.fetch_add(1, Ordering::Relaxed) + 1,
                        total,
                    );
                }
                accumulated
            })
            .reduce(Vec::new, |mut merged, mut chunk| {
                merged.append(&mut chunk);
                merged
            });

        let mut compacted = CompactedGraph {
            vertices: survivors,
            edges: FxHashMap::default(),
        };
        for (from, to, edge) in walks {
            compacted.insert(from, to, edge);
        }

        debug!("Chain compaction took: {:?}", start_time.elapsed());
        info!(
            "Compacted {} raw vertices into {} vertices and {} edges",
            self.topology.vertex_count(),
            compacted.vertex_count(),
            compacted.edge_count()
        );

        compacted
    }

    /// The compacted graph of an uncompacted run: every raw vertex
    /// survives and every raw edge becomes a single-step compacted
    /// edge. Searches then run on the raw structure and endpoint
    /// grafting is never required.
    pub(crate) fn passthrough(&self) -> CompactedGraph<D> {
        let graph = &self.topology.graph;
        let mut compacted = CompactedGraph {
            vertices: graph.nodes().collect(),
            edges: FxHashMap::default(),
        };

        for (from, to, &weight) in graph.all_edges() {
            let data = match self.reduce {
                Some(_) => self.topology.edge_data.get(&(from, to)).cloned(),
                None => None,
            };
            compacted.insert(
                from,
                to,
                CompactedEdge {
                    weight,
                    geometry: vec![*self.topology.coordinate(to)],
                    data,
                },
            );
        }

        compacted
    }

    /// One anchor vertex per connected component that contains no
    /// junction (a closed ring): its smallest vertex. Without an
    /// anchor such a component would compact away entirely.
    fn ring_anchors(&self, junctions: &FxHashSet<VertexIx>) -> Vec<VertexIx> {
        let graph = &self.topology.graph;
        let mut seen: FxHashSet<VertexIx> = FxHashSet::default();
        let mut anchors = Vec::new();

        for vertex in graph.nodes() {
            if !seen.insert(vertex) {
                continue;
            }

            let mut queue = vec![vertex];
            let mut has_junction = false;
            let mut anchor = vertex;
            while let Some(member) = queue.pop() {
                if junctions.contains(&member) {
                    has_junction = true;
                }
                if member < anchor {
                    anchor = member;
                }
                for neighbor in distinct_neighbors(graph, member) {
                    if seen.insert(neighbor) {
                        queue.push(neighbor);
                    }
                }
            }

            if !has_junction {
                anchors.push(anchor);
            }
        }

        anchors
    }
}
