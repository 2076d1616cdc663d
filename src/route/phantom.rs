use petgraph::Direction;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::compact::compactor::{keep_lighter, walk_chain, ChainDirection};
use crate::compact::CompactedEdge;
use crate::route::finder::PreprocessedGraph;
use crate::topology::{ReduceFn, VertexIx};

/// Temporary endpoint grafts layered over the immutable compacted
/// graph for the duration of one search.
///
/// A search endpoint interior to a collapsed chain is promoted to a
/// junction here rather than in the shared graph: the search
/// consults the overlay's edges alongside the graph's, and dropping
/// the overlay is the removal. The shared graph is never mutated, so
/// concurrent searches on one facade cannot observe each other's
/// endpoints.
pub(crate) struct PhantomOverlay<'g, D> {
    graph: &'g PreprocessedGraph<D>,
    reduce: Option<&'g ReduceFn<D>>,
    phantoms: SmallVec<[VertexIx; 2]>,
    edges: FxHashMap<VertexIx, FxHashMap<VertexIx, CompactedEdge<D>>>,
}

impl<'g, D: Clone> PhantomOverlay<'g, D> {
    pub(crate) fn new(graph: &'g PreprocessedGraph<D>, reduce: Option<&'g ReduceFn<D>>) -> Self {
        PhantomOverlay {
            graph,
            reduce,
            phantoms: SmallVec::new(),
            edges: FxHashMap::default(),
        }
    }

    pub(crate) fn graph(&self) -> &'g PreprocessedGraph<D> {
        self.graph
    }

    /// Grafts `vertex` as a temporary junction. A vertex already
    /// present in the compacted graph (or grafted earlier) needs no
    /// phantom and is left untouched.
    ///
    /// Walks stop at previously grafted phantoms as well as at real
    /// compacted vertices, so two endpoints interior to the same
    /// chain become directly connected.
    pub(crate) fn graft(&mut self, vertex: VertexIx) {
        if self.graph.compacted.contains(vertex) || self.phantoms.contains(&vertex) {
            return;
        }

        let graph = self.graph;
        let topology = &graph.topology;
        let grafted = self.phantoms.clone();
        let is_stop = |candidate: VertexIx| {
            graph.compacted.contains(candidate) || grafted.contains(&candidate)
        };

        // Outgoing: forward walks to the nearest surviving vertex.
        for neighbor in topology.graph.neighbors_directed(vertex, Direction::Outgoing) {
            let walk = walk_chain(
                topology,
                self.reduce,
                &is_stop,
                vertex,
                neighbor,
                ChainDirection::Forward,
            );
            if let Some(walk) = walk {
                let mut geometry = walk.interior;
                geometry.push(*topology.coordinate(walk.end));
                keep_lighter(
                    self.edges.entry(vertex).or_default(),
                    walk.end,
                    CompactedEdge {
                        weight: walk.weight,
                        geometry,
                        data: walk.data,
                    },
                );
            }
        }

        // Incoming: independent reverse walks over the raw in-edges,
        // registered on the neighboring vertex's outgoing table. A
        // one-way chain therefore grafts in its traversable
        // direction only.
        for neighbor in topology.graph.neighbors_directed(vertex, Direction::Incoming) {
            let walk = walk_chain(
                topology,
                self.reduce,
                &is_stop,
                vertex,
                neighbor,
                ChainDirection::Reverse,
            );
            if let Some(walk) = walk {
                let mut geometry: Vec<_> = walk.interior.into_iter().rev().collect();
                geometry.push(*topology.coordinate(vertex));
                keep_lighter(
                    self.edges.entry(walk.end).or_default(),
                    vertex,
                    CompactedEdge {
                        weight: walk.weight,
                        geometry,
                        data: walk.data,
                    },
                );
            }
        }

        self.phantoms.push(vertex);
    }

    /// Looks an edge up in the overlay first, then in the underlying
    /// compacted graph. The two never hold the same edge: overlay
    /// edges always have a phantom endpoint.
    pub(crate) fn edge(&self, from: VertexIx, to: VertexIx) -> Option<&CompactedEdge<D>> {
        self.edges
            .get(&from)
            .and_then(|outgoing| outgoing.get(&to))
            .or_else(|| self.graph.compacted.edge(from, to))
    }

    pub(crate) fn neighbors(
        &self,
        from: VertexIx,
    ) -> impl Iterator<Item = (VertexIx, &CompactedEdge<D>)> {
        self.graph.compacted.neighbors(from).chain(
            self.edges
                .get(&from)
                .into_iter()
                .flat_map(|outgoing| outgoing.iter().map(|(to, edge)| (*to, edge))),
        )
    }
}
