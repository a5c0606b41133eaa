use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use lh_data::{generate, prepare, ColumnMap, PrepareConfig, SimulationConfig};
use lh_inference::econometrics::FixedEffectsSolver;
use lh_inference::{run_specification, run_specifications, DididSpecification, FitOptions};
use std::hint::black_box;

fn bench_fe_ols(c: &mut Criterion) {
    let columns = ColumnMap::default();
    let specs = DididSpecification::standard(&columns);
    let opts = FitOptions::default();

    let mut group = c.benchmark_group("fe_ols");
    group.sample_size(10);
    for n_per_cell in [250usize, 2_500] {
        let cfg = SimulationConfig { n_states: 40, n_per_cell, ..SimulationConfig::default() };
        let raw = generate(&cfg, &columns).unwrap();
        let table = prepare(&raw, &PrepareConfig::default()).unwrap().table;
        let rows = table.n_rows();

        group.bench_with_input(BenchmarkId::new("employment", rows), &table, |b, t| {
            b.iter(|| black_box(run_specification(black_box(t), &specs[0], &opts)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("all_four_threads_4", rows), &table, |b, t| {
            b.iter(|| black_box(run_specifications(black_box(t), &specs, &opts, 4)).unwrap())
        });
    }
    group.finish();
}

fn bench_absorb(c: &mut Criterion) {
    // Deterministic state × age assignment without RNG overhead.
    let n = 200_000usize;
    let state: Vec<usize> = (0..n).map(|i| (i * 31) % 48).collect();
    let age: Vec<usize> = (0..n).map(|i| (i * 17 + i / 7) % 40).collect();
    let v: Vec<f64> = (0..n).map(|i| ((i * 131) % 1000) as f64 / 100.0).collect();
    let solver = FixedEffectsSolver::new(vec![state, age]).unwrap();

    c.bench_function("absorb_two_way_200k", |b| {
        b.iter(|| black_box(solver.partial_out(black_box(&v))).unwrap())
    });
}

criterion_group!(benches, bench_fe_ols, bench_absorb);
criterion_main!(benches);
