//! Benchmark finite-horizon value iteration and policy evaluation.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use episodic_rl::envs::{BuildEnv, Chain, GridWorld};
use episodic_rl::EpisodicVi;
use ndarray::Array2;

const HORIZON: usize = 20;

fn value_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("episodic_vi/run");
    for size in [5, 10, 20] {
        let mdp = GridWorld::new(size, size, 0.1, 0.5, 0.0).build_env(0).unwrap();
        group.bench_with_input(BenchmarkId::new("grid_world", size), &mdp, |b, mdp| {
            let mut vi = EpisodicVi::new(HORIZON);
            b.iter(|| vi.run(black_box(mdp)))
        });
    }
    let mdp = Chain::new(50, 0.1).build_env(0).unwrap();
    group.bench_function("chain/50", |b| {
        let mut vi = EpisodicVi::new(HORIZON);
        b.iter(|| vi.run(black_box(&mdp)))
    });
}

fn policy_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("episodic_vi/evaluate_policy");
    let mdp = GridWorld::new(10, 10, 0.1, 0.5, 0.0).build_env(0).unwrap();
    let mut vi = EpisodicVi::new(HORIZON);
    vi.run(&mdp);
    let policy = vi.greedy_policy().to_owned();
    let mut values = Array2::zeros((HORIZON + 1, mdp.num_states()));
    group.bench_function("grid_world/10", |b| {
        b.iter(|| {
            vi.evaluate_policy(black_box(&mdp), policy.view(), &mut values)
                .unwrap()
        })
    });
}

criterion_group!(benches, value_iteration, policy_evaluation);
criterion_main!(benches);
