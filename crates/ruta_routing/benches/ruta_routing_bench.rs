use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use ruta_routing::{
    geopoint::GeoPoint,
    graph::{GraphBuilder, GraphBuilderParams, RouteGraph, WaypointId},
    routing::{CostMatrix, OptimizationMode, OptimizerParams, Termination, optimize},
    weighting::GreatCircleDistance,
};

/// Serpentine track over a `rows` x `cols` grid with 50 m spacing, each cell recorded twice.
fn serpentine_track(rows: usize, cols: usize) -> Vec<GeoPoint> {
    let mut points = Vec::with_capacity(rows * cols * 2);
    for row in 0..rows {
        for step in 0..cols {
            let col = if row % 2 == 0 { step } else { cols - 1 - step };
            let point = GeoPoint::new(
                48.0 + row as f64 * 0.00045,
                2.0 + col as f64 * 0.00067,
            );
            points.push(point);
            points.push(GeoPoint::new(point.lat + 0.00002, point.lon));
        }
    }
    points
}

fn serpentine_graph(rows: usize, cols: usize) -> RouteGraph {
    let mut builder = GraphBuilder::new(GraphBuilderParams::default());
    builder.add_track(serpentine_track(rows, cols));
    builder.build(&GreatCircleDistance).unwrap()
}

fn graph_builder_benchmark(c: &mut Criterion) {
    let track = serpentine_track(40, 40);

    c.bench_function("deduplicate 3200 points", |b| {
        b.iter(|| GraphBuilder::deduplicate(GraphBuilderParams::default(), [black_box(&track).iter().copied()]))
    });
}

fn optimizer_benchmark(c: &mut Criterion) {
    let graph = serpentine_graph(10, 10);
    let params = OptimizerParams {
        termination: vec![Termination::Iterations(50)],
        ..OptimizerParams::default()
    };

    c.bench_function("cost matrix 100 waypoints", |b| {
        b.iter(|| CostMatrix::from_graph(black_box(&graph)))
    });

    c.bench_function("shortest path 100 waypoints", |b| {
        b.iter(|| {
            optimize(
                black_box(&graph),
                WaypointId::new(0),
                OptimizationMode::ShortestPath {
                    target: WaypointId::new(99),
                },
                &params,
            )
        })
    });

    c.bench_function("tour 100 waypoints", |b| {
        b.iter(|| {
            optimize(
                black_box(&graph),
                WaypointId::new(0),
                OptimizationMode::Tour,
                &params,
            )
        })
    });
}

criterion_group!(benches, graph_builder_benchmark, optimizer_benchmark);
criterion_main!(benches);
