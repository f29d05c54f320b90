//! Reinforcement learning environments
mod builder;
mod chain;
mod finite;
mod grid_world;
mod reward;
#[cfg(test)]
pub mod testing;

pub use builder::{BuildEnv, BuildEnvError};
pub use chain::{Chain, Move};
pub use finite::{FiniteMdp, StepError, ROW_SUM_TOLERANCE};
pub use grid_world::GridWorld;
pub use reward::{DiscreteReward, RewardError, RewardNoise};

use crate::spaces::Space;
use ndarray::ArrayView3;

/// The result of taking a step in an environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult<S> {
    /// The resulting state.
    pub next_state: S,
    /// The reward value for this transition.
    pub reward: f64,
    /// Whether `next_state` is terminal.
    ///
    /// Reaching a terminal state does not reset the environment.
    pub done: bool,
}

/// The external structure of a reinforcement learning environment.
pub trait EnvStructure {
    type ObservationSpace: Space;
    type ActionSpace: Space;

    /// Space containing all possible observations.
    fn observation_space(&self) -> Self::ObservationSpace;

    /// The space of all possible actions.
    ///
    /// Every element in this space must be a valid action.
    fn action_space(&self) -> Self::ActionSpace;

    /// A lower and upper bound on possible reward values.
    ///
    /// These bounds are not required to be tight but ideally will be as tight as possible.
    fn reward_range(&self) -> (f64, f64);

    /// A discount factor applied to future rewards.
    ///
    /// A value between `0` and `1`, inclusive.
    fn discount_factor(&self) -> f64;
}

/// A reinforcement learning environment with internal state.
pub trait Environment: EnvStructure {
    type Error;

    /// Reset the environment to its initial state.
    ///
    /// # Returns
    /// The initial state.
    fn reset(&mut self) -> <Self::ObservationSpace as Space>::Element;

    /// Take a step in the environment.
    ///
    /// Stepping is allowed after reaching a terminal state;
    /// the caller is responsible for calling [`Environment::reset`].
    ///
    /// # Errors
    /// If the action is not an element of the action space.
    fn step(
        &mut self,
        action: &<Self::ActionSpace as Space>::Element,
    ) -> Result<StepResult<<Self::ObservationSpace as Space>::Element>, Self::Error>;
}

impl<E: EnvStructure + ?Sized> EnvStructure for Box<E> {
    type ObservationSpace = E::ObservationSpace;
    type ActionSpace = E::ActionSpace;

    fn observation_space(&self) -> Self::ObservationSpace {
        E::observation_space(self)
    }
    fn action_space(&self) -> Self::ActionSpace {
        E::action_space(self)
    }
    fn reward_range(&self) -> (f64, f64) {
        E::reward_range(self)
    }
    fn discount_factor(&self) -> f64 {
        E::discount_factor(self)
    }
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    type Error = E::Error;

    fn reset(&mut self) -> <Self::ObservationSpace as Space>::Element {
        E::reset(self)
    }

    fn step(
        &mut self,
        action: &<Self::ActionSpace as Space>::Element,
    ) -> Result<StepResult<<Self::ObservationSpace as Space>::Element>, Self::Error> {
        E::step(self, action)
    }
}

/// Ground-truth dynamics of a tabular environment.
///
/// Used by planners that need exact transition probabilities and mean rewards.
pub trait TabularModel {
    /// Number of states.
    fn num_states(&self) -> usize;

    /// Number of actions.
    fn num_actions(&self) -> usize;

    /// Transition probabilities `P[[s, a, s']]`.
    fn transitions(&self) -> ArrayView3<f64>;

    /// Mean rewards `R[[s, a, s']]`.
    fn mean_rewards(&self) -> ArrayView3<f64>;
}

impl<M: TabularModel + ?Sized> TabularModel for &M {
    fn num_states(&self) -> usize {
        M::num_states(self)
    }
    fn num_actions(&self) -> usize {
        M::num_actions(self)
    }
    fn transitions(&self) -> ArrayView3<f64> {
        M::transitions(self)
    }
    fn mean_rewards(&self) -> ArrayView3<f64> {
        M::mean_rewards(self)
    }
}
