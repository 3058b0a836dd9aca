//! Criterion benchmarks for insertion, export and import.

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use gridprint_core::entity::{CircuitSide, WireColor};
use gridprint_core::test_utils::*;
use gridprint_spatial::Blueprint;

/// A 20x20 grid of chests, each wired to its right-hand neighbour.
fn build_wired_grid() -> Blueprint {
    let mut bp = Blueprint::new();
    for y in 0..20 {
        let mut previous = None;
        for x in 0..20 {
            let id = bp.add_entity(chest_at(x * 2, y * 2), false).unwrap().key();
            if let Some(prev) = previous {
                bp.add_circuit_connection(WireColor::Red, prev, id, CircuitSide::Input, CircuitSide::Input)
                    .unwrap();
            }
            previous = Some(id);
        }
    }
    bp
}

fn bench_blueprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("blueprint");
    group.sample_size(50);

    // Benchmark: place 1000 chests in a 40x25 block.
    group.bench_function("add_1000_entities", |b| {
        b.iter(|| {
            let mut bp = Blueprint::new();
            for y in 0..25 {
                for x in 0..40 {
                    bp.add_entity(chest_at(x, y), false).unwrap();
                }
            }
        });
    });

    // Benchmark: re-place the same 400 chests with merging on.
    group.bench_function("merge_400_duplicates", |b| {
        b.iter_batched(
            build_wired_grid,
            |mut bp| {
                for y in 0..20 {
                    for x in 0..20 {
                        bp.add_entity(chest_at(x * 2, y * 2), true).unwrap();
                    }
                }
            },
            BatchSize::LargeInput,
        );
    });

    let bp = build_wired_grid();
    group.bench_function("export_400_wired", |b| {
        b.iter(|| bp.to_value().unwrap());
    });

    let s = bp.to_blueprint_string().unwrap();
    group.bench_function("import_400_wired_string", |b| {
        b.iter(|| Blueprint::from_string(&s).unwrap());
    });

    group.bench_function("clone_400_wired", |b| {
        b.iter(|| bp.clone());
    });

    group.finish();
}

criterion_group!(benches, bench_blueprint);
criterion_main!(benches);
