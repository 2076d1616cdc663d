#![cfg(test)]

use std::sync::Arc;

use crate::geo::{default_key, Position, DEFAULT_TOLERANCE};
use crate::network::{Network, Polyline};
use crate::route::PathFinderOptions;
use crate::topology::{Topology, VertexIx, Weighting};

fn euclidean(a: &Position, b: &Position) -> f64 {
    ((b.lng - a.lng).powi(2) + (b.lat - a.lat).powi(2)).sqrt()
}

fn network(features: &[&[(f64, f64)]]) -> Network<()> {
    Network::new(
        features
            .iter()
            .map(|coordinates| Polyline::from_coordinates(coordinates.iter().copied()))
            .collect(),
    )
}

fn euclidean_options() -> PathFinderOptions<(), ()> {
    PathFinderOptions {
        weight: Some(Box::new(|a, b, _| Some(Weighting::Both(euclidean(a, b))))),
        ..PathFinderOptions::default()
    }
}

fn vertex(topology: &Topology<()>, lng: f64, lat: f64) -> VertexIx {
    let key = default_key(&Position::new(lng, lat).rounded(DEFAULT_TOLERANCE));
    topology.keys[&key]
}

#[test]
fn l_network_builds_symmetric_edges() {
    let network = network(&[&[(0.0, 0.0), (1.0, 0.0)], &[(1.0, 0.0), (1.0, 1.0)]]);
    let topology = Topology::build(&network, &euclidean_options());

    assert_eq!(topology.vertex_count(), 3);
    assert_eq!(topology.edge_count(), 4);

    let (a, b) = (vertex(&topology, 0.0, 0.0), vertex(&topology, 1.0, 0.0));
    assert_eq!(topology.graph.edge_weight(a, b), Some(&1.0));
    assert_eq!(topology.graph.edge_weight(b, a), Some(&1.0));
}

#[test]
fn zero_length_segments_are_skipped() {
    let network = network(&[&[(0.0, 0.0), (0.0, 0.0), (1.0, 0.0)]]);
    let topology = Topology::build(&network, &euclidean_options());

    assert_eq!(topology.vertex_count(), 2);
    assert_eq!(topology.edge_count(), 2);
}

#[test]
fn nearby_endpoints_snap_onto_one_vertex() {
    let network = network(&[
        &[(0.0, 0.0), (1.0, 0.0)],
        &[(1.000001, 0.0), (1.0, 1.0)],
    ]);
    let topology = Topology::build(&network, &euclidean_options());

    assert_eq!(topology.vertex_count(), 3);

    // First write wins for the source coordinate.
    let shared = vertex(&topology, 1.0, 0.0);
    assert_eq!(*topology.coordinate(shared), Position::new(1.0, 0.0));
}

#[test]
fn impassable_segments_are_skipped() {
    let network = network(&[&[(0.0, 0.0), (1.0, 0.0)], &[(1.0, 0.0), (1.0, 1.0)]]);
    let options: PathFinderOptions<(), ()> = PathFinderOptions {
        weight: Some(Box::new(|a, _, _| {
            // Segments leaving the origin are unusable.
            if a.lng == 0.0 && a.lat == 0.0 {
                None
            } else {
                Some(Weighting::Both(1.0))
            }
        })),
        ..PathFinderOptions::default()
    };
    let topology = Topology::build(&network, &options);

    assert_eq!(topology.vertex_count(), 2);
    assert_eq!(topology.edge_count(), 2);
}

#[test]
fn zero_weight_marks_a_segment_impassable() {
    let network = network(&[&[(0.0, 0.0), (1.0, 0.0)]]);
    let options: PathFinderOptions<(), ()> = PathFinderOptions {
        weight: Some(Box::new(|_, _, _| Some(Weighting::Both(0.0)))),
        ..PathFinderOptions::default()
    };
    let topology = Topology::build(&network, &options);

    assert_eq!(topology.edge_count(), 0);
}

#[test]
fn asymmetric_weights_insert_independent_directions() {
    let network = network(&[&[(0.0, 0.0), (1.0, 0.0)]]);
    let options: PathFinderOptions<(), ()> = PathFinderOptions {
        weight: Some(Box::new(|a, b, _| {
            Some(Weighting::Directed {
                forward: Some(euclidean(a, b)),
                backward: None,
            })
        })),
        ..PathFinderOptions::default()
    };
    let topology = Topology::build(&network, &options);

    assert_eq!(topology.edge_count(), 1);
    let (a, b) = (vertex(&topology, 0.0, 0.0), vertex(&topology, 1.0, 0.0));
    assert_eq!(topology.graph.edge_weight(a, b), Some(&1.0));
    assert_eq!(topology.graph.edge_weight(b, a), None);
}

#[test]
fn duplicate_edges_keep_the_minimum_weight() {
    let features = vec![
        Polyline::new([(0.0, 0.0), (1.0, 0.0)], 5.0f64),
        Polyline::new([(0.0, 0.0), (1.0, 0.0)], 2.0f64),
    ];
    let options: PathFinderOptions<f64, ()> = PathFinderOptions {
        weight: Some(Box::new(|_, _, cost| Some(Weighting::Both(*cost)))),
        ..PathFinderOptions::default()
    };
    let topology = Topology::build(&Network::new(features), &options);

    assert_eq!(topology.edge_count(), 2);
    let keys: Vec<_> = topology.graph.nodes().collect();
    assert_eq!(topology.graph.edge_weight(keys[0], keys[1]), Some(&2.0));
}

#[test]
fn payloads_are_seeded_and_folded() {
    let features = vec![
        Polyline::new([(0.0, 0.0), (1.0, 0.0)], 5.0f64),
        Polyline::new([(0.0, 0.0), (1.0, 0.0)], 2.0f64),
    ];
    let options: PathFinderOptions<f64, f64> = PathFinderOptions {
        weight: Some(Box::new(|_, _, cost| Some(Weighting::Both(*cost)))),
        edge_data_seed: Some(Box::new(|cost| *cost)),
        edge_data_reduce: Some(Arc::new(|a, b| a + b)),
        ..PathFinderOptions::default()
    };
    let topology = Topology::build(&Network::new(features), &options);

    let nodes: Vec<_> = topology.graph.nodes().collect();
    assert_eq!(topology.edge_data[&(nodes[0], nodes[1])], 7.0);
    assert_eq!(topology.edge_data[&(nodes[1], nodes[0])], 7.0);
}
