//! Chain environment
use super::{BuildEnv, BuildEnvError, FiniteMdp};
use ndarray::Array3;
use serde::{Deserialize, Serialize};

/// Chain Environment
///
/// Consists of `size` states in a line with 2 actions.
/// * Action 0 moves right, staying put in the last state.
/// * Action 1 moves left, staying put in the first state.
/// * Every action has a `fail_prob` chance of taking the opposite move.
///
/// A reward of 1 is given on every transition into the last state, which is terminal.
/// Episodes start in state 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub size: usize,
    pub fail_prob: f64,
}

impl Chain {
    pub const fn new(size: usize, fail_prob: f64) -> Self {
        Self { size, fail_prob }
    }

    /// Transition and mean reward tables.
    fn tables(&self) -> (Array3<f64>, Array3<f64>) {
        let n = self.size;
        let num_actions = 2;
        let mut transitions = Array3::zeros((n, num_actions, n));
        let mut rewards = Array3::zeros((n, num_actions, n));
        for state in 0..n {
            for action in [Move::Right, Move::Left] {
                let intended = action.apply(state, n);
                let slipped = action.swap().apply(state, n);
                let a = action as usize;
                transitions[[state, a, intended]] += 1.0 - self.fail_prob;
                transitions[[state, a, slipped]] += self.fail_prob;
                rewards[[state, a, n - 1]] = 1.0;
            }
        }
        (transitions, rewards)
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self {
            size: 5,
            fail_prob: 0.0,
        }
    }
}

impl BuildEnv for Chain {
    type Environment = FiniteMdp;

    fn build_env(&self, seed: u64) -> Result<FiniteMdp, BuildEnvError> {
        if self.size == 0 {
            return Err(BuildEnvError::NoStates);
        }
        if !(0.0..=1.0).contains(&self.fail_prob) {
            return Err(BuildEnvError::InvalidParameter {
                name: "fail_prob",
                value: self.fail_prob,
            });
        }
        let (transitions, rewards) = self.tables();
        FiniteMdp::from_mean_rewards(rewards, transitions, vec![self.size - 1], 0, seed)
    }
}

/// Chain actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Right = 0,
    Left = 1,
}

impl Move {
    const fn swap(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// The state reached by this move in a chain of length `size`.
    pub fn apply(self, state: usize, size: usize) -> usize {
        match self {
            Self::Right => (state + 1).min(size - 1),
            Self::Left => state.saturating_sub(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{testing, EnvStructure, TabularModel};
    use super::*;
    use rstest::rstest;

    #[test]
    fn chain_3_scenario() {
        let mut env = Chain::new(3, 0.0).build_env(42).unwrap();
        assert_eq!(env.state(), 0);

        let result = env.step(0).unwrap();
        assert_eq!(env.state(), 1);
        assert_eq!(result.reward, 0.0);

        let result = env.step(1).unwrap();
        assert_eq!(env.state(), 0);
        assert_eq!(result.reward, 0.0);

        env.step(0).unwrap();
        let result = env.step(0).unwrap();
        assert_eq!(env.state(), 2);
        assert_eq!(result.reward, 1.0);
        assert!(result.done);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(6)]
    fn deterministic_moves(#[case] size: usize) {
        let env = Chain::new(size, 0.0).build_env(0).unwrap();
        let transitions = env.transitions();
        let rewards = env.mean_rewards();
        for state in 0..size {
            let right = (state + 1).min(size - 1);
            let left = state.saturating_sub(1);
            assert_eq!(transitions[[state, 0, right]], 1.0);
            assert_eq!(transitions[[state, 1, left]], 1.0);
            assert_eq!(
                rewards[[state, 0, right]],
                if right == size - 1 { 1.0 } else { 0.0 }
            );
            assert_eq!(
                rewards[[state, 1, left]],
                if left == size - 1 { 1.0 } else { 0.0 }
            );
        }
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.1)]
    #[case(1.0)]
    fn rows_sum_to_one(#[case] fail_prob: f64) {
        testing::check_row_sums(&Chain::new(7, fail_prob).build_env(0).unwrap());
    }

    #[test]
    fn fail_prob_slips() {
        let env = Chain::new(4, 0.25).build_env(0).unwrap();
        let transitions = env.transitions();
        assert_eq!(transitions[[1, 0, 2]], 0.75);
        assert_eq!(transitions[[1, 0, 0]], 0.25);
        assert_eq!(transitions[[0, 1, 0]], 0.75);
        assert_eq!(transitions[[0, 1, 1]], 0.25);
        assert_eq!(transitions[[3, 0, 3]], 0.75);
        assert_eq!(transitions[[3, 0, 2]], 0.25);
    }

    #[test]
    fn terminal_is_last_state() {
        let env = Chain::default().build_env(0).unwrap();
        assert_eq!(env.terminal_states(), &[4]);
        assert_eq!(env.reward_range(), (0.0, 1.0));
    }

    #[test]
    fn invalid_config() {
        assert_eq!(
            Chain::new(0, 0.0).build_env(0).unwrap_err(),
            BuildEnvError::NoStates
        );
        assert!(matches!(
            Chain::new(3, 1.5).build_env(0),
            Err(BuildEnvError::InvalidParameter {
                name: "fail_prob",
                ..
            })
        ));
    }

    #[test]
    fn run_default() {
        testing::run_random(&mut Chain::new(5, 0.2).build_env(1).unwrap(), 1000, 0);
    }

    #[test]
    fn config_serde() {
        let config = Chain::new(10, 0.05);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<Chain>(&json).unwrap(), config);
    }
}
