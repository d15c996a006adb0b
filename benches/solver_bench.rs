//! Benchmarks for the hand simulator and the evaluator.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use flip7_solver::games::flip7::{simulate_hand, Flip7};
use flip7_solver::induction::{Evaluator, GameState, Matchup, SolverConfig, StrategyTable};

fn hand_benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("flip7_single_hand_x25", |b| {
        b.iter(|| simulate_hand(black_box(25), &mut rng).total_value)
    });
}

fn evaluator_benchmark(c: &mut Criterion) {
    let config = SolverConfig::default();
    let table = StrategyTable::new();
    let evaluator = Evaluator::new(&Flip7, &config, &table);
    let matchup = Matchup::at(GameState::new(100, 100), 30, 25);

    c.bench_function("evaluate_10000_samples", |b| {
        b.iter(|| evaluator.evaluate(black_box(&matchup), 10_000, 42).win_probability)
    });
}

criterion_group!(benches, hand_benchmark, evaluator_benchmark);
criterion_main!(benches);
