//! Chain compaction. Collapses degree-two chains of the raw graph
//! into single edges that carry the chain's cumulative weight, its
//! interior geometry and a payload folded across the chain, leaving
//! a graph of junctions, dead-ends and ring anchors.

#[doc(hidden)]
pub mod compactor;

#[doc(inline)]
pub use compactor::{CompactedEdge, CompactedGraph};
