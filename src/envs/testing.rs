//! Environment testing utilities
use super::{Environment, TabularModel, ROW_SUM_TOLERANCE};
use crate::spaces::{IndexSpace, Space};
use ndarray::s;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt::Debug;

/// Check that every transition row of a tabular model is a probability distribution.
pub fn check_row_sums<M: TabularModel + ?Sized>(model: &M) {
    let transitions = model.transitions();
    for state in 0..model.num_states() {
        for action in 0..model.num_actions() {
            let row = transitions.slice(s![state, action, ..]);
            assert!(row.iter().all(|&p| p >= 0.0));
            let sum: f64 = row.sum();
            assert!(
                (sum - 1.0).abs() <= ROW_SUM_TOLERANCE,
                "P[{}, {}, :] sums to {}",
                state,
                action,
                sum
            );
        }
    }
}

/// Run an environment with uniform random actions and check that invariants are satisfied.
pub fn run_random<E>(env: &mut E, num_steps: u64, seed: u64)
where
    E: Environment<ObservationSpace = IndexSpace, ActionSpace = IndexSpace> + ?Sized,
    E::Error: Debug,
{
    let observation_space = env.observation_space();
    let action_space = env.action_space();
    let (min_reward, max_reward) = env.reward_range();
    let discount_factor = env.discount_factor();
    assert!(discount_factor >= 0.0);
    assert!(discount_factor <= 1.0);

    let mut rng = StdRng::seed_from_u64(seed);
    let state = env.reset();
    assert!(observation_space.contains(&state));
    for _ in 0..num_steps {
        let action = action_space.sample(&mut rng);
        let result = env.step(&action).unwrap();
        assert!(observation_space.contains(&result.next_state));
        assert!(result.reward >= min_reward);
        assert!(result.reward <= max_reward);
        if result.done {
            env.reset();
        }
    }
}
