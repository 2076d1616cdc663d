use criterion::criterion_main;

use wayfinder::{
    Algorithm, Network, PathFinder, PathFinderOptions, Polyline, Position, SearchOptions,
};

/// A `size` by `size` grid of unit cells, 0.01 degrees apart.
fn grid_network(size: usize) -> Network<()> {
    let spacing = 0.01;
    let mut features = Vec::with_capacity(size * 2);

    for row in 0..size {
        features.push(Polyline::from_coordinates(
            (0..size).map(|column| (column as f64 * spacing, row as f64 * spacing)),
        ));
        features.push(Polyline::from_coordinates(
            (0..size).map(|column| (row as f64 * spacing, column as f64 * spacing)),
        ));
    }

    Network::new(features)
}

fn route_benchmark(c: &mut criterion::Criterion) {
    let mut group = c.benchmark_group("route");
    group.significance_level(0.1).sample_size(30);

    let size = 30;
    let finder: PathFinder<()> = PathFinder::new(&grid_network(size), PathFinderOptions::default());
    let start = Position::new(0.0, 0.0);
    let finish = Position::new((size - 1) as f64 * 0.01, (size - 1) as f64 * 0.01);

    group.bench_function("dijkstra", |b| {
        b.iter(|| finder.find_path(&start, &finish, &SearchOptions::default()))
    });
    group.bench_function("astar", |b| {
        b.iter(|| {
            finder.find_path(
                &start,
                &finish,
                &SearchOptions {
                    algorithm: Algorithm::AStar,
                    ..SearchOptions::default()
                },
            )
        })
    });

    group.finish();
}

criterion::criterion_group!(route_benches, route_benchmark);
criterion_main!(route_benches);
