//! Weighted search over the compacted graph: the routing facade,
//! per-search phantom endpoint grafts, the shared label-setting
//! core behind Dijkstra and A*, and the traversal context handed to
//! user costing callbacks.

#[doc(hidden)]
pub mod context;
#[doc(hidden)]
pub mod error;
#[doc(hidden)]
pub mod finder;

mod phantom;
mod search;
mod turn;

#[doc(inline)]
pub use context::{
    Algorithm, DirectionBias, Expansion, OnExpand, SearchOptions, TransitionGuard,
    TraversalContext,
};
#[doc(inline)]
pub use error::RouteError;
#[doc(inline)]
pub use finder::{Path, PathFinder, PathFinderOptions, PreprocessedGraph};
