//! Shortest paths through planar networks of polyline features.
//!
//! A [`PathFinder`] extracts a vertex graph from overlapping
//! polylines, collapses degree-two chains into single edges that
//! keep their full geometry, and answers point-to-point queries with
//! Dijkstra or A*, pluggable per-edge costing and optional per-edge
//! payload aggregation.

pub mod compact;
pub mod geo;
pub mod network;
pub mod route;
pub mod topology;
pub mod worker;

#[doc(inline)]
pub use compact::{CompactedEdge, CompactedGraph};
#[doc(inline)]
pub use crate::geo::{default_key, great_circle, KeyFn, Position, Vector, DEFAULT_TOLERANCE};
#[doc(inline)]
pub use network::{Network, Polyline};
#[doc(inline)]
pub use route::{
    Algorithm, Expansion, Path, PathFinder, PathFinderOptions, PreprocessedGraph, RouteError,
    SearchOptions, TraversalContext,
};
#[doc(inline)]
pub use topology::{
    Phase, ProgressFn, ReduceFn, SeedFn, Topology, VertexIx, WeightFn, Weighting,
};
#[doc(inline)]
pub use worker::{Ticket, WorkerOptions};

/// Convenience alias for fallible routing operations.
pub type Result<T> = std::result::Result<T, RouteError>;
