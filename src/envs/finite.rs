//! Finite Markov decision processes
use super::{BuildEnvError, DiscreteReward, EnvStructure, Environment, StepResult, TabularModel};
use crate::spaces::IndexSpace;
use crate::utils::random::{RandomError, RandomSource};
use ndarray::{s, Array3, ArrayView3, Axis};
use rand::distributions::Distribution;
use thiserror::Error;

/// Maximum allowed deviation of a transition row sum from 1.
pub const ROW_SUM_TOLERANCE: f64 = 1e-12;

/// Seed offset of the observation space sampler.
const OBSERVATION_SEED_OFFSET: u64 = 123;
/// Seed offset of the action space sampler.
const ACTION_SEED_OFFSET: u64 = 456;

/// Error taking a step in an environment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    #[error("action {action} out of range for {num_actions} actions")]
    InvalidAction { action: usize, num_actions: usize },
    #[error(transparent)]
    Sampling(#[from] RandomError),
}

/// A Markov decision process with finitely many states and actions.
///
/// Transitions and rewards are stored in lookup tables indexed by
/// `[state, action, next_state]`.
/// Entering a terminal state flags the step as `done` but the process keeps running
/// until [`FiniteMdp::reset`] is called.
#[derive(Debug, Clone)]
pub struct FiniteMdp {
    transitions: Array3<f64>,
    reward: DiscreteReward,
    /// Sorted, without duplicates
    terminal_states: Vec<usize>,
    default_state: usize,
    state: usize,

    rng: RandomSource,
    observation_rng: RandomSource,
    action_rng: RandomSource,
}

impl FiniteMdp {
    /// Create a finite MDP.
    ///
    /// # Args
    /// * `reward` - Reward model. Its mean reward table determines the number of states and actions.
    /// * `transitions` - Transition probabilities, shape `(num_states, num_actions, num_states)`.
    /// * `terminal_states` - Indices of the terminal states.
    /// * `default_state` - State set by [`FiniteMdp::reset`].
    /// * `seed` - Seed for sampling transitions and rewards.
    ///     The observation and action space samplers are seeded at fixed offsets from it.
    ///
    /// # Errors
    /// If the tables are inconsistent or any row of `transitions` is not a probability distribution.
    pub fn new(
        reward: DiscreteReward,
        transitions: Array3<f64>,
        terminal_states: Vec<usize>,
        default_state: usize,
        seed: u64,
    ) -> Result<Self, BuildEnvError> {
        let (num_states, num_actions, _) = reward.mean_rewards.dim();
        if num_states == 0 {
            return Err(BuildEnvError::NoStates);
        }
        if num_actions == 0 {
            return Err(BuildEnvError::NoActions);
        }
        let expected = [num_states, num_actions, num_states];
        if reward.mean_rewards.shape() != expected {
            return Err(BuildEnvError::RewardShape {
                expected,
                actual: reward.mean_rewards.shape().to_vec(),
            });
        }
        if transitions.shape() != expected {
            return Err(BuildEnvError::TransitionShape {
                expected,
                actual: transitions.shape().to_vec(),
            });
        }
        check_transitions(&transitions)?;

        for &state in terminal_states.iter().chain(Some(&default_state)) {
            if state >= num_states {
                return Err(BuildEnvError::StateOutOfRange { state, num_states });
            }
        }
        let mut terminal_states = terminal_states;
        terminal_states.sort_unstable();
        terminal_states.dedup();

        let rng = RandomSource::new(seed);
        Ok(Self {
            transitions,
            reward,
            terminal_states,
            default_state,
            state: default_state,
            observation_rng: rng.fork(OBSERVATION_SEED_OFFSET),
            action_rng: rng.fork(ACTION_SEED_OFFSET),
            rng,
        })
    }

    /// Create a finite MDP with noiseless rewards.
    pub fn from_mean_rewards(
        mean_rewards: Array3<f64>,
        transitions: Array3<f64>,
        terminal_states: Vec<usize>,
        default_state: usize,
        seed: u64,
    ) -> Result<Self, BuildEnvError> {
        Self::new(
            DiscreteReward::deterministic(mean_rewards),
            transitions,
            terminal_states,
            default_state,
            seed,
        )
    }

    /// Put the MDP in its default state.
    ///
    /// # Returns
    /// The default state.
    pub fn reset(&mut self) -> usize {
        self.state = self.default_state;
        self.state
    }

    /// Take an action from the current state.
    ///
    /// # Errors
    /// If `action` is not a valid action index.
    pub fn step(&mut self, action: usize) -> Result<StepResult<usize>, StepError> {
        let num_actions = self.num_actions();
        if action >= num_actions {
            return Err(StepError::InvalidAction {
                action,
                num_actions,
            });
        }
        let state = self.state;
        let row = self.transitions.slice(s![state, action, ..]);
        let next_state = match self.rng.categorical(row.iter(), None) {
            Ok(next_state) => next_state,
            // Rows may sum to slightly less than 1
            Err(RandomError::NoCategory(u)) => row
                .iter()
                .enumerate()
                .filter(|(_, &p)| p > 0.0)
                .map(|(i, _)| i)
                .last()
                .ok_or(RandomError::NoCategory(u))?,
            Err(err) => return Err(err.into()),
        };
        let reward = self
            .reward
            .sample(state, action, next_state, &mut self.rng)?;
        let done = self.is_terminal(next_state);
        self.state = next_state;
        Ok(StepResult {
            next_state,
            reward,
            done,
        })
    }

    /// The current state.
    pub const fn state(&self) -> usize {
        self.state
    }

    /// The state set on reset.
    pub const fn default_state(&self) -> usize {
        self.default_state
    }

    /// Whether `state` is terminal.
    pub fn is_terminal(&self, state: usize) -> bool {
        self.terminal_states.binary_search(&state).is_ok()
    }

    /// Terminal state indices in increasing order.
    pub fn terminal_states(&self) -> &[usize] {
        &self.terminal_states
    }

    pub fn num_states(&self) -> usize {
        self.transitions.len_of(Axis(0))
    }

    pub fn num_actions(&self) -> usize {
        self.transitions.len_of(Axis(1))
    }

    /// The reward model.
    pub const fn reward(&self) -> &DiscreteReward {
        &self.reward
    }

    /// Seed of the transition sampler.
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Sample an element of the observation space.
    pub fn sample_observation(&mut self) -> usize {
        IndexSpace::new(self.num_states()).sample(self.observation_rng.rng_mut())
    }

    /// Sample an element of the action space.
    pub fn sample_action(&mut self) -> usize {
        IndexSpace::new(self.num_actions()).sample(self.action_rng.rng_mut())
    }
}

/// Check that every row of the transition table is a probability distribution.
fn check_transitions(transitions: &Array3<f64>) -> Result<(), BuildEnvError> {
    let (num_states, num_actions, _) = transitions.dim();
    for state in 0..num_states {
        for action in 0..num_actions {
            let row = transitions.slice(s![state, action, ..]);
            for (next_state, &value) in row.iter().enumerate() {
                if !(value >= 0.0) {
                    return Err(BuildEnvError::InvalidProbability {
                        state,
                        action,
                        next_state,
                        value,
                    });
                }
            }
            let sum = row.sum();
            if !((sum - 1.0).abs() <= ROW_SUM_TOLERANCE) {
                return Err(BuildEnvError::RowSum { state, action, sum });
            }
        }
    }
    Ok(())
}

impl EnvStructure for FiniteMdp {
    type ObservationSpace = IndexSpace;
    type ActionSpace = IndexSpace;

    fn observation_space(&self) -> Self::ObservationSpace {
        IndexSpace::new(self.num_states())
    }

    fn action_space(&self) -> Self::ActionSpace {
        IndexSpace::new(self.num_actions())
    }

    fn reward_range(&self) -> (f64, f64) {
        self.reward.reward_range()
    }

    fn discount_factor(&self) -> f64 {
        // Episodes have a finite horizon
        1.0
    }
}

impl Environment for FiniteMdp {
    type Error = StepError;

    fn reset(&mut self) -> usize {
        Self::reset(self)
    }

    fn step(&mut self, action: &usize) -> Result<StepResult<usize>, StepError> {
        Self::step(self, *action)
    }
}

impl TabularModel for FiniteMdp {
    fn num_states(&self) -> usize {
        Self::num_states(self)
    }

    fn num_actions(&self) -> usize {
        Self::num_actions(self)
    }

    fn transitions(&self) -> ArrayView3<f64> {
        self.transitions.view()
    }

    fn mean_rewards(&self) -> ArrayView3<f64> {
        self.reward.mean_rewards.view()
    }
}
