//! Benchmark UCBVI episodes.
use criterion::{criterion_group, criterion_main, Criterion};
use episodic_rl::agents::{BonusType, UcbviConfig};
use episodic_rl::envs::{BuildEnv, Chain, GridWorld};
use episodic_rl::EpisodicVi;

const HORIZON: usize = 10;

fn run_episode(c: &mut Criterion) {
    let mut group = c.benchmark_group("ucbvi/run_episode");
    for bonus in [BonusType::Hoeffding, BonusType::Bernstein] {
        let mut mdp = GridWorld::new(6, 6, 0.1, 0.5, 0.0).build_env(0).unwrap();
        let mut vi = EpisodicVi::new(HORIZON);
        vi.run(&mdp);
        let true_v = vi.v().to_owned();
        let mut agent = UcbviConfig::new(HORIZON, 1.0, bonus)
            .build_agent(&mut mdp)
            .unwrap();
        group.bench_function(format!("grid_world/{}", bonus), |b| {
            b.iter(|| agent.run_episode(true_v.view(), &mut (), &mut ()).unwrap())
        });
    }
}

fn update(c: &mut Criterion) {
    let mut mdp = Chain::new(30, 0.1).build_env(0).unwrap();
    let mut agent = UcbviConfig::default().build_agent(&mut mdp).unwrap();
    c.bench_function("ucbvi/update", |b| {
        b.iter(|| agent.update(3, 1, 0.5, 2).unwrap())
    });
}

criterion_group!(benches, run_episode, update);
criterion_main!(benches);
