use crate::geo::{Position, Vector};
use crate::topology::VertexIx;

/// Search algorithm selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Algorithm {
    #[default]
    Dijkstra,
    AStar,
}

/// Additive per-edge cost bias. The returned value is added to the
/// edge weight during relaxation; negative biases are permitted but
/// the summed step cost must stay positive for the search to remain
/// optimal.
pub type DirectionBias<'a> = dyn Fn(&TraversalContext) -> f64 + 'a;

/// Vetoes a candidate transition by returning `false`; any other
/// return admits it.
pub type TransitionGuard<'a> = dyn Fn(&TraversalContext) -> bool + 'a;

/// Observer invoked once per accepted expansion, immediately before
/// the goal check.
pub type OnExpand<'a> = dyn Fn(&Expansion) + 'a;

/// An accepted expansion of the search frontier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expansion {
    pub vertex: VertexIx,
    /// Accumulated cost from the start, biases included.
    pub cost: f64,
}

/// Per-search options.
pub struct SearchOptions<'a> {
    pub algorithm: Algorithm,
    pub direction_bias: Option<&'a DirectionBias<'a>>,
    pub transition_guard: Option<&'a TransitionGuard<'a>>,
    pub on_expand: Option<&'a OnExpand<'a>>,
    /// Rejects transitions whose geometry doubles back at a
    /// non-obtuse interior angle. Off by default.
    pub avoid_sharp_turns: bool,
}

impl Default for SearchOptions<'_> {
    fn default() -> Self {
        SearchOptions {
            algorithm: Algorithm::default(),
            direction_bias: None,
            transition_guard: None,
            on_expand: None,
            avoid_sharp_turns: false,
        }
    }
}

impl SearchOptions<'_> {
    /// Whether any configured option needs the path walked so far
    /// materialised before relaxing a vertex's neighbors.
    pub(crate) fn needs_trace(&self) -> bool {
        self.direction_bias.is_some() || self.transition_guard.is_some() || self.avoid_sharp_turns
    }

    /// Whether the request carries any callback. Callback-bearing
    /// requests cannot cross the worker boundary.
    pub(crate) fn has_callbacks(&self) -> bool {
        self.direction_bias.is_some() || self.transition_guard.is_some() || self.on_expand.is_some()
    }
}

/// The geometric surroundings of one candidate transition, handed to
/// direction biases and transition guards.
///
/// Vectors are plain 2D differences in degree space: enough to
/// decide alignment and turning behaviour without paying for
/// projected coordinates on every relaxation. The context owns its
/// path snapshot so callbacks stay plain `Fn(&TraversalContext)`
/// closures.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalContext {
    /// Vertex the step leaves from: the last element of `path`.
    pub from: VertexIx,
    /// Candidate vertex the step would move to.
    pub to: VertexIx,
    /// Accumulated cost at `from`, biases included.
    pub cost: f64,
    /// Vertices from the search start up to and including `from`.
    pub path: Vec<VertexIx>,
    /// Vertex visited immediately before `from`, once the path is
    /// two or more steps deep.
    pub previous: Option<VertexIx>,
    pub from_coordinate: Position,
    pub to_coordinate: Position,
    pub from_to_vector: Vector,
    pub from_goal_vector: Vector,
    pub to_goal_vector: Vector,
    pub previous_to_from_vector: Option<Vector>,
}

impl TraversalContext {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        path: Vec<VertexIx>,
        previous: Option<(VertexIx, Position)>,
        from: VertexIx,
        to: VertexIx,
        cost: f64,
        from_coordinate: Position,
        to_coordinate: Position,
        goal_coordinate: Position,
    ) -> Self {
        TraversalContext {
            from,
            to,
            cost,
            path,
            previous: previous.map(|(vertex, _)| vertex),
            from_coordinate,
            to_coordinate,
            from_to_vector: Vector::between(&from_coordinate, &to_coordinate),
            from_goal_vector: Vector::between(&from_coordinate, &goal_coordinate),
            to_goal_vector: Vector::between(&to_coordinate, &goal_coordinate),
            previous_to_from_vector: previous
                .map(|(_, coordinate)| Vector::between(&coordinate, &from_coordinate)),
        }
    }
}
