use std::fmt::{Display, Formatter};

use geo::{Coord, Distance, Haversine, Point};

/// Snap radius, in degrees, under which two coordinates collapse
/// onto the same network vertex.
pub const DEFAULT_TOLERANCE: f64 = 1e-5;

/// A geographic position: a longitude/latitude pair with an
/// optional elevation carried through untouched.
///
/// Only the two-dimensional part participates in keying and
/// distance calculations. Elevation survives rounding, topology
/// extraction and path reconstruction unchanged, so a 2D query
/// against a 3D network returns the stored 3D geometry.
///
/// ```rust
/// use wayfinder::Position;
/// let position = Position::new(151.2093, -33.8688);
/// println!("Position: {}", position);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lng: f64,
    pub lat: f64,
    pub elevation: Option<f64>,
}

impl Position {
    /// Constructs a new `Position` from a given `lng` and `lat`.
    pub fn new(lng: f64, lat: f64) -> Self {
        Position {
            lng,
            lat,
            elevation: None,
        }
    }

    /// Constructs a three-dimensional `Position`.
    pub fn with_elevation(lng: f64, lat: f64, elevation: f64) -> Self {
        Position {
            lng,
            lat,
            elevation: Some(elevation),
        }
    }

    /// Snaps the two-dimensional part onto a `tolerance`-spaced grid.
    /// Elevation is passed through unrounded.
    pub fn rounded(&self, tolerance: f64) -> Position {
        Position {
            lng: (self.lng / tolerance).round() * tolerance,
            lat: (self.lat / tolerance).round() * tolerance,
            elevation: self.elevation,
        }
    }

    /// Whether the two-dimensional parts of `self` and `other`
    /// coincide once snapped at `tolerance`.
    pub fn snaps_to(&self, other: &Position, tolerance: f64) -> bool {
        let (a, b) = (self.rounded(tolerance), other.rounded(tolerance));
        a.lng == b.lng && a.lat == b.lat
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.elevation {
            Some(elevation) => write!(f, "{},{},{}", self.lng, self.lat, elevation),
            None => write!(f, "{},{}", self.lng, self.lat),
        }
    }
}

impl From<(f64, f64)> for Position {
    fn from(value: (f64, f64)) -> Self {
        Position::new(value.0, value.1)
    }
}

impl From<(f64, f64, f64)> for Position {
    fn from(value: (f64, f64, f64)) -> Self {
        Position::with_elevation(value.0, value.1, value.2)
    }
}

impl From<[f64; 2]> for Position {
    fn from(value: [f64; 2]) -> Self {
        Position::new(value[0], value[1])
    }
}

impl From<[f64; 3]> for Position {
    fn from(value: [f64; 3]) -> Self {
        Position::with_elevation(value[0], value[1], value[2])
    }
}

impl From<Coord<f64>> for Position {
    fn from(value: Coord<f64>) -> Self {
        Position::new(value.x, value.y)
    }
}

impl From<&Position> for Point<f64> {
    fn from(value: &Position) -> Self {
        Point::new(value.lng, value.lat)
    }
}

impl From<Position> for Point<f64> {
    fn from(value: Position) -> Self {
        Point::new(value.lng, value.lat)
    }
}

impl From<Position> for Coord<f64> {
    fn from(value: Position) -> Self {
        Coord {
            x: value.lng,
            y: value.lat,
        }
    }
}

/// Great-circle distance between two positions, in kilometers.
/// Elevation does not contribute.
pub fn great_circle(a: &Position, b: &Position) -> f64 {
    Haversine::distance(Point::from(a), Point::from(b)) / 1_000f64
}

/// Coordinate-to-key function. Implementations must be
/// deterministic and may only depend on the rounded input, so that
/// keys are stable across invocations and equal exactly when the
/// snapped 2D positions coincide.
pub type KeyFn = dyn Fn(&Position) -> String + Send + Sync;

/// Renders the two-dimensional part as `"{x},{y}"`. The input is
/// expected to be rounded already.
pub fn default_key(position: &Position) -> String {
    format!("{},{}", position.lng, position.lat)
}
