//! Coordinate model: positions with optional elevation, tolerance
//! snapping, vertex keying and the 2D vectors handed to search
//! callbacks.

#[doc(hidden)]
pub mod coord;
#[doc(hidden)]
pub mod vector;
mod test;

#[doc(inline)]
pub use coord::{default_key, great_circle, KeyFn, Position, DEFAULT_TOLERANCE};
#[doc(inline)]
pub use vector::Vector;
