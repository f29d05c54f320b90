//! Grid world environment
use super::{BuildEnv, BuildEnvError, DiscreteReward, FiniteMdp, RewardNoise};
use ndarray::{s, Array3};
use serde::{Deserialize, Serialize};

/// Number of grid world actions.
const NUM_ACTIONS: usize = 4;

/// A `rows` x `cols` grid without walls.
///
/// # Actions
/// * 0: left  (`col - 1`)
/// * 1: right (`col + 1`)
/// * 2: up    (`row - 1`)
/// * 3: down  (`row + 1`)
///
/// Moves off the grid leave the position unchanged along that axis.
/// With probability `fail_prob` a uniformly random action is taken instead
/// (which may be the chosen action).
///
/// The goal is the bottom-right cell; it is the only terminal state.
/// The mean reward depends only on the next state:
/// `exp(-d² / (2 reward_smoothness²))` where `d` is the distance to the goal with each
/// axis normalised to `[0, 1]`, or the indicator of reaching the goal when `reward_smoothness` is 0.
/// If `reward_sigma > 0`, rewards have additive Gaussian noise with that standard deviation.
///
/// States are indexed in row-major order. Episodes start in state 0 (top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridWorld {
    pub rows: usize,
    pub cols: usize,
    pub fail_prob: f64,
    pub reward_smoothness: f64,
    pub reward_sigma: f64,
}

impl GridWorld {
    pub const fn new(
        rows: usize,
        cols: usize,
        fail_prob: f64,
        reward_smoothness: f64,
        reward_sigma: f64,
    ) -> Self {
        Self {
            rows,
            cols,
            fail_prob,
            reward_smoothness,
            reward_sigma,
        }
    }

    pub const fn num_states(&self) -> usize {
        self.rows * self.cols
    }

    /// The `(row, col)` coordinates of a state index.
    pub const fn coord_of(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }

    /// The state index of `(row, col)` coordinates.
    pub const fn index_of(&self, (row, col): (usize, usize)) -> usize {
        row * self.cols + col
    }

    /// Coordinates reached from `coord` by taking `action`, without failure.
    ///
    /// `action` must be one of the 4 grid actions.
    fn neighbor(&self, (row, col): (usize, usize), action: usize) -> (usize, usize) {
        match action {
            0 => (row, col.saturating_sub(1)),
            1 => (row, (col + 1).min(self.cols - 1)),
            2 => (row.saturating_sub(1), col),
            3 => ((row + 1).min(self.rows - 1), col),
            _ => unreachable!("invalid grid world action {}", action),
        }
    }

    fn goal(&self) -> usize {
        self.num_states() - 1
    }

    /// Mean reward for entering `state`.
    fn state_reward(&self, state: usize) -> f64 {
        let (row, col) = self.coord_of(state);
        let row_distance = (self.rows - 1 - row) as f64 / (self.rows - 1) as f64;
        let col_distance = (self.cols - 1 - col) as f64 / (self.cols - 1) as f64;
        let squared_distance = row_distance.powi(2) + col_distance.powi(2);
        if self.reward_smoothness > 0.0 {
            (-squared_distance / (2.0 * self.reward_smoothness.powi(2))).exp()
        } else if state == self.goal() {
            1.0
        } else {
            0.0
        }
    }

    fn check(&self) -> Result<(), BuildEnvError> {
        let size_checks = [("rows", self.rows), ("cols", self.cols)];
        for (name, value) in size_checks {
            if value < 2 {
                return Err(BuildEnvError::InvalidParameter {
                    name,
                    value: value as f64,
                });
            }
        }
        if !(0.0..=1.0).contains(&self.fail_prob) {
            return Err(BuildEnvError::InvalidParameter {
                name: "fail_prob",
                value: self.fail_prob,
            });
        }
        for (name, value) in [
            ("reward_smoothness", self.reward_smoothness),
            ("reward_sigma", self.reward_sigma),
        ] {
            if !(value >= 0.0) {
                return Err(BuildEnvError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

impl Default for GridWorld {
    fn default() -> Self {
        Self::new(5, 5, 0.0, 0.0, 0.0)
    }
}

impl BuildEnv for GridWorld {
    type Environment = FiniteMdp;

    fn build_env(&self, seed: u64) -> Result<FiniteMdp, BuildEnvError> {
        self.check()?;
        let num_states = self.num_states();
        let shape = (num_states, NUM_ACTIONS, num_states);

        let mut rewards = Array3::zeros(shape);
        for next_state in 0..num_states {
            let reward = self.state_reward(next_state);
            rewards.slice_mut(s![.., .., next_state]).fill(reward);
        }

        let mut transitions = Array3::zeros(shape);
        let failure_share = self.fail_prob / NUM_ACTIONS as f64;
        for state in 0..num_states {
            let coord = self.coord_of(state);
            for action in 0..NUM_ACTIONS {
                let next_state = self.index_of(self.neighbor(coord, action));
                transitions[[state, action, next_state]] += 1.0;
                if self.fail_prob > 0.0 {
                    for other in (0..NUM_ACTIONS).filter(|&b| b != action) {
                        let perturbed = self.index_of(self.neighbor(coord, other));
                        transitions[[state, action, next_state]] -= failure_share;
                        transitions[[state, action, perturbed]] += failure_share;
                    }
                }
            }
        }

        let noise = if self.reward_sigma > 0.0 {
            RewardNoise::Gaussian {
                std_dev: self.reward_sigma,
            }
        } else {
            RewardNoise::None
        };
        let reward = DiscreteReward {
            mean_rewards: rewards,
            noise,
        };
        FiniteMdp::new(reward, transitions, vec![self.goal()], 0, seed)
    }
}
