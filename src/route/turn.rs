use itertools::Itertools;
use smallvec::SmallVec;

use crate::compact::CompactedEdge;
use crate::geo::{Position, Vector};

/// Whether a candidate transition keeps every interior angle obtuse.
///
/// The inspected point sequence is the approach through the last two
/// path vertices followed by the candidate edge's internal geometry,
/// so reversals hidden inside a collapsed chain are caught as well
/// as reversals at the junction itself. A triple containing a
/// zero-length vector is treated as obtuse, which keeps coincident
/// coordinates from rejecting a legitimate transition.
pub(crate) fn permits_turn<D>(
    approach: &[Position],
    from: Position,
    edge: &CompactedEdge<D>,
) -> bool {
    let points: SmallVec<[Position; 8]> = approach
        .iter()
        .copied()
        .chain(std::iter::once(from))
        .chain(edge.geometry.iter().copied())
        .collect();

    for (a, b, c) in points.iter().tuple_windows() {
        let outward_back = Vector::between(b, a);
        let outward_ahead = Vector::between(b, c);
        if outward_back.is_zero() || outward_ahead.is_zero() {
            continue;
        }
        if outward_back.dot(&outward_ahead) >= 0f64 {
            return false;
        }
    }

    true
}
