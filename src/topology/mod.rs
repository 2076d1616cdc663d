//! Raw topology extraction: polyline features become a directed
//! vertex graph with per-direction weights, an arena of source
//! coordinates and an optional per-edge payload table.

#[doc(hidden)]
pub mod builder;
mod test;

#[doc(inline)]
pub use builder::Topology;

use crate::geo::Position;

/// Arena index of a network vertex. String keys exist only inside
/// the preprocessing key table; everything downstream of topology
/// extraction operates on indices.
pub type VertexIx = u32;

/// Edge usability and cost as decided by the weight function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Weighting {
    /// Both directions traversable at the same cost.
    Both(f64),
    /// Independent directed costs. A missing or non-positive
    /// direction is impassable.
    Directed {
        forward: Option<f64>,
        backward: Option<f64>,
    },
}

impl Weighting {
    /// The usable forward cost, if any. Non-positive and non-finite
    /// weights mark the direction impassable and are never inserted.
    pub(crate) fn forward(&self) -> Option<f64> {
        match self {
            Weighting::Both(weight) => usable(*weight),
            Weighting::Directed { forward, .. } => forward.and_then(usable),
        }
    }

    /// The usable backward cost, if any.
    pub(crate) fn backward(&self) -> Option<f64> {
        match self {
            Weighting::Both(weight) => usable(*weight),
            Weighting::Directed { backward, .. } => backward.and_then(usable),
        }
    }
}

fn usable(weight: f64) -> Option<f64> {
    (weight > 0f64 && weight.is_finite()).then_some(weight)
}

/// Decides the cost of traversing one polyline segment. Returning
/// `None` marks the segment impassable in both directions.
pub type WeightFn<P> = dyn Fn(&Position, &Position, &P) -> Option<Weighting> + Send + Sync;

/// Derives the initial payload of a raw edge from its feature's
/// properties.
pub type SeedFn<P, D> = dyn Fn(&P) -> D + Send + Sync;

/// Folds two edge payloads into one. Applied when overlapping
/// features insert the same raw edge twice, and again when the
/// compactor collapses a chain of raw edges into a single edge.
pub type ReduceFn<D> = dyn Fn(&D, &D) -> D + Send + Sync;

/// Preprocessing progress callback: phase, units done, units total.
pub type ProgressFn = dyn Fn(Phase, usize, usize) + Send + Sync;

/// Preprocessing phases reported through the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Topology,
    Compaction,
}
