#![cfg(test)]

use std::cell::Cell;

use crate::geo::Position;
use crate::network::{Network, Polyline};
use crate::route::{Expansion, PathFinder, PathFinderOptions, RouteError, SearchOptions};
use crate::topology::Weighting;
use crate::worker::WorkerOptions;

fn euclidean(a: &Position, b: &Position) -> f64 {
    ((b.lng - a.lng).powi(2) + (b.lat - a.lat).powi(2)).sqrt()
}

fn pooled_finder(pool_size: usize) -> PathFinder<()> {
    let network = Network::new(vec![
        Polyline::from_coordinates([(0.0, 0.0), (1.0, 0.0)]),
        Polyline::from_coordinates([(1.0, 0.0), (1.0, 1.0)]),
    ]);
    PathFinder::new(
        &network,
        PathFinderOptions {
            weight: Some(Box::new(|a, b, _| Some(Weighting::Both(euclidean(a, b))))),
            worker: WorkerOptions {
                enabled: true,
                pool_size: Some(pool_size),
            },
            ..PathFinderOptions::default()
        },
    )
}

#[test]
fn pool_matches_synchronous_results() -> crate::Result<()> {
    let finder = pooled_finder(2);
    let (start, finish) = (Position::new(0.0, 0.0), Position::new(1.0, 1.0));

    let synchronous = finder
        .find_path(&start, &finish, &SearchOptions::default())?
        .expect("no synchronous route");

    let first = finder.find_path_async(&start, &finish, &SearchOptions::default());
    let second = finder.find_path_async(&finish, &start, &SearchOptions::default());

    let first = first.wait()?.expect("no pooled route");
    let second = second.wait()?.expect("no reversed pooled route");

    assert_eq!(first.path, synchronous.path);
    assert_eq!(first.weight, synchronous.weight);
    assert_eq!(second.path.len(), synchronous.path.len());

    finder.close();
    Ok(())
}

#[test]
fn callbacks_force_synchronous_fallback() -> crate::Result<()> {
    let finder = pooled_finder(2);
    let (start, finish) = (Position::new(0.0, 0.0), Position::new(1.0, 1.0));

    let expansions = Cell::new(0usize);
    let count = |_: &Expansion| expansions.set(expansions.get() + 1);
    let ticket = finder.find_path_async(
        &start,
        &finish,
        &SearchOptions {
            on_expand: Some(&count),
            ..SearchOptions::default()
        },
    );

    // The callback has already fired: the query never left this
    // thread.
    assert!(expansions.get() > 0);
    assert!(ticket.wait()?.is_some());

    finder.close();
    Ok(())
}

#[test]
fn queued_requests_all_resolve() -> crate::Result<()> {
    let finder = pooled_finder(1);
    let (start, finish) = (Position::new(0.0, 0.0), Position::new(1.0, 1.0));

    let tickets: Vec<_> = (0..4)
        .map(|_| finder.find_path_async(&start, &finish, &SearchOptions::default()))
        .collect();

    for ticket in tickets {
        let path = ticket.wait()?.expect("no pooled route");
        assert!((path.weight - 2.0).abs() < 1e-9);
    }

    finder.close();
    Ok(())
}

#[test]
fn close_rejects_subsequent_queries() {
    let finder = pooled_finder(2);
    let (start, finish) = (Position::new(0.0, 0.0), Position::new(1.0, 1.0));

    // Spin the pool up, then tear it down. Closing twice is fine.
    let warmup = finder.find_path_async(&start, &finish, &SearchOptions::default());
    assert!(warmup.wait().is_ok());
    finder.close();
    finder.close();

    let rejected = finder.find_path_async(&start, &finish, &SearchOptions::default());
    assert_eq!(rejected.wait(), Err(RouteError::PoolClosed));
}

#[test]
fn close_before_first_use_is_a_noop() {
    let finder = pooled_finder(2);
    finder.close();
}
