//! Input feature model. A [`Network`] is a collection of polyline
//! features whose shared endpoints and crossings become the vertices
//! of the routed graph. Feature properties are opaque to the router
//! and are only ever handed back to the user's weight function and
//! edge-data seed.

use crate::geo::Position;

/// A polyline feature: an ordered coordinate sequence plus a
/// properties bag of the caller's choosing.
#[derive(Debug, Clone)]
pub struct Polyline<P = ()> {
    pub coordinates: Vec<Position>,
    pub properties: P,
}

impl Polyline<()> {
    /// A polyline without properties.
    pub fn from_coordinates<I, C>(coordinates: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Position>,
    {
        Polyline::new(coordinates, ())
    }
}

impl<P> Polyline<P> {
    pub fn new<I, C>(coordinates: I, properties: P) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Position>,
    {
        Polyline {
            coordinates: coordinates.into_iter().map(Into::into).collect(),
            properties,
        }
    }
}

/// A collection of polyline features forming a planar network.
#[derive(Debug, Clone)]
pub struct Network<P = ()> {
    pub features: Vec<Polyline<P>>,
}

impl<P> Network<P> {
    pub fn new(features: Vec<Polyline<P>>) -> Self {
        Network { features }
    }
}

impl<P> FromIterator<Polyline<P>> for Network<P> {
    fn from_iter<T: IntoIterator<Item = Polyline<P>>>(iter: T) -> Self {
        Network {
            features: iter.into_iter().collect(),
        }
    }
}
