use super::RewardError;
use thiserror::Error;

/// Build an environment from a configuration.
pub trait BuildEnv {
    type Environment;

    /// Build an environment instance.
    ///
    /// # Args
    /// * `seed` - Seed for pseudo-randomness used by the environment dynamics.
    fn build_env(&self, seed: u64) -> Result<Self::Environment, BuildEnvError>;
}

/// Error building an environment
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildEnvError {
    #[error("environment must have at least one state")]
    NoStates,
    #[error("environment must have at least one action")]
    NoActions,
    #[error("transition table has shape {actual:?}, expected {expected:?}")]
    TransitionShape {
        expected: [usize; 3],
        actual: Vec<usize>,
    },
    #[error("reward table has shape {actual:?}, expected {expected:?}")]
    RewardShape {
        expected: [usize; 3],
        actual: Vec<usize>,
    },
    #[error("transition probability P[{state}, {action}, {next_state}] = {value} is not a non-negative number")]
    InvalidProbability {
        state: usize,
        action: usize,
        next_state: usize,
        value: f64,
    },
    #[error("transition probabilities P[{state}, {action}, :] sum to {sum}, not 1")]
    RowSum { state: usize, action: usize, sum: f64 },
    #[error("state {state} out of range for {num_states} states")]
    StateOutOfRange { state: usize, num_states: usize },
    #[error("invalid parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error(transparent)]
    Reward(#[from] RewardError),
}
