use std::f64::consts::TAU;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gerber_offset::geometry::polygon::contains_point;
use gerber_offset::testing::gerber_program;
use gerber_offset::{offset_ring, parse, Position, ScaleTransformer};
use rand::Rng;

/// A star-shaped ring with a random radius per vertex, so it is simple but generally concave.
fn generate_random_ring(count: usize) -> Vec<Position> {
    let mut rng = rand::rng();
    (0..count)
        .map(|index| {
            let angle = TAU * index as f64 / count as f64;
            let radius = rng.random_range(5.0..10.0);
            Position::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

fn generate_pad_program(pads: usize) -> String {
    let mut rng = rand::rng();
    let mut body = String::from("%ADD10C,0.5*%\n%ADD11R,1.0X0.6*%\n%ADD12O,1.2X0.8*%\n");
    for index in 0..pads {
        body.push_str(&format!("D{}*\n", 10 + index % 3));
        body.push_str(&format!(
            "X{}Y{}D03*\n",
            rng.random_range(0..1_000_000),
            rng.random_range(0..1_000_000)
        ));
    }
    gerber_program(&body)
}

fn benchmark_offset(c: &mut Criterion) {
    let mut group = c.benchmark_group("Boundary offset");

    for count in [128, 1024] {
        let ring = generate_random_ring(count);

        group.bench_function(format!("offset_ring_{}", count), |b| {
            b.iter(|| black_box(offset_ring(black_box(&ring), 1.05, 0.95)))
        });

        group.bench_function(format!("contains_point_{}", count), |b| {
            b.iter(|| black_box(contains_point(black_box(&ring), black_box(Position::new(1.0, 1.0)))))
        });
    }

    group.finish();
}

fn benchmark_pipeline(c: &mut Criterion) {
    let text = generate_pad_program(1000);
    let file = match parse(&text) {
        Ok(file) => file,
        Err(error) => panic!("benchmark program failed to parse: {}", error),
    };
    let transformer = ScaleTransformer::new(1.02, 1.02);

    let mut group = c.benchmark_group("Pipeline");

    group.bench_function("parse_1000_pads", |b| b.iter(|| black_box(parse(black_box(&text)))));

    group.bench_function("transform_1000_pads", |b| b.iter(|| black_box(transformer.apply(black_box(&file)))));

    group.finish();
}

criterion_group!(benches, benchmark_offset, benchmark_pipeline);
criterion_main!(benches);
