use std::collections::hash_map::Entry;
use std::time::Instant;

use itertools::Itertools;
use log::{debug, info};
use petgraph::prelude::DiGraphMap;
use rustc_hash::FxHashMap;

use crate::geo::{great_circle, Position};
use crate::network::Network;
use crate::route::PathFinderOptions;
use crate::topology::{Phase, VertexIx, Weighting};

/// The raw vertex graph extracted from a polyline network.
///
/// Vertices are arena indices; `coordinates` holds each vertex's
/// original (un-rounded) source coordinate and `keys` maps the
/// snapped key string back to the index. Directed edge weights live
/// in the graph itself, per-edge payloads in `edge_data`.
pub struct Topology<D> {
    pub(crate) graph: DiGraphMap<VertexIx, f64>,
    pub(crate) coordinates: Vec<Position>,
    pub(crate) keys: FxHashMap<String, VertexIx>,
    pub(crate) edge_data: FxHashMap<(VertexIx, VertexIx), D>,
}

impl<D> Topology<D> {
    /// The source coordinate recorded for a vertex. Every vertex of
    /// the raw graph has one.
    pub fn coordinate(&self, vertex: VertexIx) -> &Position {
        &self.coordinates[vertex as usize]
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Builds the topology for a network. Consecutive coordinate
    /// pairs of each feature become directed edges between snapped
    /// vertices; segments the weight function declines are skipped
    /// entirely.
    pub(crate) fn build<P>(network: &Network<P>, options: &PathFinderOptions<P, D>) -> Topology<D> {
        let start_time = Instant::now();
        let tolerance = options.tolerance;

        let mut topology = Topology {
            graph: DiGraphMap::new(),
            coordinates: Vec::new(),
            keys: FxHashMap::default(),
            edge_data: FxHashMap::default(),
        };

        let total = network.features.len();
        for (done, feature) in network.features.iter().enumerate() {
            for (a, b) in feature.coordinates.iter().tuple_windows() {
                let key_a = options.key_of(&a.rounded(tolerance));
                let key_b = options.key_of(&b.rounded(tolerance));

                // Zero-length after snapping.
                if key_a == key_b {
                    continue;
                }

                let weighting = match &options.weight {
                    Some(weight) => weight(a, b, &feature.properties),
                    None => Some(Weighting::Both(great_circle(a, b))),
                };
                let Some(weighting) = weighting else { continue };

                let (forward, backward) = (weighting.forward(), weighting.backward());
                if forward.is_none() && backward.is_none() {
                    continue;
                }

                let ix_a = topology.intern(key_a, a);
                let ix_b = topology.intern(key_b, b);

                if let Some(weight) = forward {
                    topology.insert(ix_a, ix_b, weight, &feature.properties, options);
                }
                if let Some(weight) = backward {
                    topology.insert(ix_b, ix_a, weight, &feature.properties, options);
                }
            }

            if let Some(progress) = &options.progress {
                progress(Phase::Topology, done + 1, total);
            }
        }

        debug!("Topology extraction took: {:?}", start_time.elapsed());
        info!(
            "Built topology: {} vertices, {} directed edges from {} features",
            topology.vertex_count(),
            topology.edge_count(),
            total
        );

        topology
    }

    /// Interns a snapped key, recording the source coordinate on
    /// first sight. First write wins, so the coordinate kept for a
    /// vertex is the first original coordinate that snapped onto it.
    fn intern(&mut self, key: String, position: &Position) -> VertexIx {
        let coordinates = &mut self.coordinates;
        *self.keys.entry(key).or_insert_with(|| {
            coordinates.push(*position);
            (coordinates.len() - 1) as VertexIx
        })
    }

    fn insert<P>(
        &mut self,
        from: VertexIx,
        to: VertexIx,
        weight: f64,
        properties: &P,
        options: &PathFinderOptions<P, D>,
    ) {
        // Overlapping features inserting the same directed edge keep
        // the lighter weight.
        match self.graph.edge_weight_mut(from, to) {
            Some(existing) => {
                if weight < *existing {
                    *existing = weight;
                }
            }
            None => {
                self.graph.add_edge(from, to, weight);
            }
        }

        if let Some(seed) = &options.edge_data_seed {
            let seeded = seed(properties);
            match self.edge_data.entry((from, to)) {
                Entry::Occupied(mut entry) => {
                    if let Some(reduce) = &options.edge_data_reduce {
                        let folded = reduce(entry.get(), &seeded);
                        entry.insert(folded);
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(seeded);
                }
            }
        }
    }
}
