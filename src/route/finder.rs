use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use itertools::Itertools;

use crate::compact::compactor::Compactor;
use crate::compact::CompactedGraph;
use crate::geo::{default_key, KeyFn, Position, DEFAULT_TOLERANCE};
use crate::network::Network;
use crate::route::context::{Algorithm, SearchOptions};
use crate::route::error::RouteError;
use crate::route::phantom::PhantomOverlay;
use crate::route::search::{search, GreatCircleHeuristic, NoHeuristic};
use crate::topology::{ProgressFn, ReduceFn, SeedFn, Topology, VertexIx, WeightFn};
use crate::worker::pool::WorkerPool;
use crate::worker::{Ticket, WorkerOptions};

/// Facade construction options.
///
/// `P` is the feature property type, `D` the per-edge payload
/// produced by the seed/reduce pair. `edge_data_seed` and
/// `edge_data_reduce` only make sense together: the seed derives a
/// payload per raw edge, the reducer folds payloads across collapsed
/// chains. Configuring a reducer or a custom key function makes
/// queries ineligible for worker dispatch.
pub struct PathFinderOptions<P = (), D = ()> {
    /// Snap radius for vertex keying, in degrees.
    pub tolerance: f64,
    /// Custom coordinate-to-key function.
    pub key: Option<Box<KeyFn>>,
    /// Collapse degree-two chains after topology extraction. When
    /// off, searches run on the raw graph directly.
    pub compact: bool,
    /// Per-segment weight function. Defaults to symmetric
    /// great-circle kilometers.
    pub weight: Option<Box<WeightFn<P>>>,
    pub edge_data_seed: Option<Box<SeedFn<P, D>>>,
    pub edge_data_reduce: Option<Arc<ReduceFn<D>>>,
    /// Preprocessing progress callback.
    pub progress: Option<Box<ProgressFn>>,
    pub worker: WorkerOptions,
}

impl<P, D> Default for PathFinderOptions<P, D> {
    fn default() -> Self {
        PathFinderOptions {
            tolerance: DEFAULT_TOLERANCE,
            key: None,
            compact: true,
            weight: None,
            edge_data_seed: None,
            edge_data_reduce: None,
            progress: None,
            worker: WorkerOptions::default(),
        }
    }
}

impl<P, D> PathFinderOptions<P, D> {
    pub(crate) fn key_of(&self, position: &Position) -> String {
        match &self.key {
            Some(key) => key(position),
            None => default_key(position),
        }
    }
}

/// The immutable preprocessing product: raw topology, compacted
/// graph and the keying configuration that produced them. Shared
/// by reference between the owning facade and any worker facades.
pub struct PreprocessedGraph<D> {
    pub(crate) topology: Topology<D>,
    pub(crate) compacted: CompactedGraph<D>,
    pub(crate) tolerance: f64,
    pub(crate) key: Option<Box<KeyFn>>,
}

impl<D> PreprocessedGraph<D> {
    pub fn topology(&self) -> &Topology<D> {
        &self.topology
    }

    pub fn compacted(&self) -> &CompactedGraph<D> {
        &self.compacted
    }

    pub(crate) fn key_of(&self, position: &Position) -> String {
        match &self.key {
            Some(key) => key(position),
            None => default_key(position),
        }
    }

    /// Resolves a query coordinate to a network vertex: a direct key
    /// hit wins, otherwise the source coordinates are scanned for
    /// entries whose rounded 2D part matches. A 2D query therefore
    /// also finds a 3D vertex whose projection snaps onto it.
    ///
    /// `Ok(None)` means the coordinate is not on the network at all;
    /// more than one scan match is an ambiguity error.
    pub(crate) fn resolve(&self, point: &Position) -> Result<Option<VertexIx>, RouteError> {
        let key = self.key_of(&point.rounded(self.tolerance));
        if let Some(&vertex) = self.topology.keys.get(&key) {
            return Ok(Some(vertex));
        }

        let mut along: Option<VertexIx> = None;
        for (vertex, coordinate) in self.topology.coordinates.iter().enumerate() {
            if coordinate.snaps_to(point, self.tolerance) {
                if along.is_some() {
                    return Err(RouteError::AmbiguousCoordinate(*point));
                }
                along = Some(vertex as VertexIx);
            }
        }
        Ok(along)
    }
}

/// A found path: the full polyline geometry, the accumulated weight
/// and, when a payload reducer is configured, one folded payload per
/// traversed compacted edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Path<D = ()> {
    pub path: Vec<Position>,
    pub weight: f64,
    pub edge_datas: Option<Vec<D>>,
}

/// Routing facade over a polyline network.
///
/// Preprocessing happens once at construction; searches never mutate
/// the shared graph (endpoints are grafted into a per-search
/// overlay), so `find_path` may be called concurrently from multiple
/// threads.
pub struct PathFinder<D = ()> {
    graph: Arc<PreprocessedGraph<D>>,
    reduce: Option<Arc<ReduceFn<D>>>,
    worker: WorkerOptions,
    pool: OnceLock<WorkerPool<D>>,
    closed: AtomicBool,
}

impl<D: Clone + Send + Sync + 'static> PathFinder<D> {
    /// Builds the topology and compacted graph for a network and
    /// wraps them in a facade.
    pub fn new<P>(network: &Network<P>, options: PathFinderOptions<P, D>) -> Self {
        let topology = Topology::build(network, &options);

        let PathFinderOptions {
            tolerance,
            key,
            compact,
            edge_data_reduce,
            progress,
            worker,
            ..
        } = options;

        let compactor = Compactor::new(&topology, edge_data_reduce.as_deref());
        let compacted = match compact {
            true => compactor.compact(progress.as_deref()),
            false => compactor.passthrough(),
        };

        let graph = Arc::new(PreprocessedGraph {
            topology,
            compacted,
            tolerance,
            key,
        });

        PathFinder {
            graph,
            reduce: edge_data_reduce,
            worker,
            pool: OnceLock::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Wraps an already preprocessed graph. Used by worker contexts,
    /// which receive the shared graph once at startup; the keying
    /// configuration travels inside the graph, so only the reducer
    /// and worker options are read from `options`.
    pub fn from_preprocessed(
        graph: Arc<PreprocessedGraph<D>>,
        options: PathFinderOptions<(), D>,
    ) -> Self {
        let PathFinderOptions {
            edge_data_reduce,
            worker,
            ..
        } = options;

        PathFinder {
            graph,
            reduce: edge_data_reduce,
            worker,
            pool: OnceLock::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// A shareable handle to the preprocessing product.
    pub fn preprocessed(&self) -> Arc<PreprocessedGraph<D>> {
        Arc::clone(&self.graph)
    }

    /// Finds the least-cost path between two points on the network.
    ///
    /// Returns `Ok(None)` when either endpoint is off the network or
    /// no connecting route exists. Endpoints interior to a collapsed
    /// chain are grafted for the duration of this call only.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, options), level = "debug")
    )]
    pub fn find_path(
        &self,
        start: &Position,
        finish: &Position,
        options: &SearchOptions<'_>,
    ) -> Result<Option<Path<D>>, RouteError> {
        let Some(start_vertex) = self.graph.resolve(start)? else {
            return Ok(None);
        };
        let Some(finish_vertex) = self.graph.resolve(finish)? else {
            return Ok(None);
        };

        let mut overlay = PhantomOverlay::new(&self.graph, self.reduce.as_deref());
        overlay.graft(start_vertex);
        overlay.graft(finish_vertex);

        let outcome = match options.algorithm {
            Algorithm::Dijkstra => {
                search(&overlay, start_vertex, finish_vertex, options, &NoHeuristic)
            }
            Algorithm::AStar => search(
                &overlay,
                start_vertex,
                finish_vertex,
                options,
                &GreatCircleHeuristic {
                    graph: self.graph.as_ref(),
                },
            ),
        };

        Ok(outcome.map(|(weight, vertices)| self.reconstruct(&overlay, weight, &vertices)))
    }

    /// Like [`PathFinder::find_path`], but eligible queries are
    /// dispatched to the worker pool, which is spawned lazily on
    /// first use.
    ///
    /// A query is eligible when workers are enabled and nothing
    /// non-transferable is involved: no payload reducer, no custom
    /// key function and no per-request callbacks. Ineligible queries
    /// resolve synchronously in the caller's context.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, options), level = "debug")
    )]
    pub fn find_path_async(
        &self,
        start: &Position,
        finish: &Position,
        options: &SearchOptions<'_>,
    ) -> Ticket<D> {
        let eligible = self.worker.enabled
            && self.reduce.is_none()
            && self.graph.key.is_none()
            && !options.has_callbacks();

        if !eligible {
            return Ticket::resolved(self.find_path(start, finish, options));
        }
        if self.closed.load(Ordering::SeqCst) {
            return Ticket::resolved(Err(RouteError::PoolClosed));
        }

        let pool = self
            .pool
            .get_or_init(|| WorkerPool::spawn(Arc::clone(&self.graph), self.worker.size()));
        pool.submit(*start, *finish, options.algorithm, options.avoid_sharp_turns)
    }

    /// Closes the worker pool, rejecting queued and in-flight
    /// tickets. Idempotent; also run on drop. Must be called before
    /// process exit when workers were enabled.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(pool) = self.pool.get() {
            pool.close();
        }
    }

    fn reconstruct(
        &self,
        overlay: &PhantomOverlay<'_, D>,
        weight: f64,
        vertices: &[VertexIx],
    ) -> Path<D> {
        let mut geometry = vec![*self.graph.topology.coordinate(vertices[0])];
        let mut edge_datas = self.reduce.is_some().then(Vec::new);

        for (from, to) in vertices.iter().tuple_windows() {
            let edge = overlay
                .edge(*from, *to)
                .expect("searched path crosses a missing edge");
            geometry.extend_from_slice(&edge.geometry);
            if let (Some(edge_datas), Some(data)) = (edge_datas.as_mut(), edge.data.as_ref()) {
                edge_datas.push(data.clone());
            }
        }

        Path {
            path: geometry,
            weight,
            edge_datas,
        }
    }
}
