//! Reward models for finite MDPs
use crate::utils::random::{RandomError, RandomSource};
use ndarray::Array3;
use ndarray_stats::QuantileExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error constructing a reward model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RewardError {
    #[error("unknown reward noise type \"{0}\"")]
    UnknownNoise(String),
    #[error("noise type \"{kind}\" expects {expected} parameter(s), got {actual}")]
    NoiseParams {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("gaussian noise standard deviation must be positive, got {0}")]
    NonPositiveStdDev(f64),
}

/// Additive noise on sampled rewards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RewardNoise {
    /// Rewards are exactly the mean reward.
    None,
    /// Zero-mean normal noise.
    Gaussian { std_dev: f64 },
}

impl RewardNoise {
    /// Parse a noise description made of a type name and its parameters.
    ///
    /// * `"none"` - no parameters.
    /// * `"gaussian"` - one parameter, the noise standard deviation.
    pub fn from_kind(kind: &str, params: &[f64]) -> Result<Self, RewardError> {
        match kind {
            "none" => {
                if !params.is_empty() {
                    return Err(RewardError::NoiseParams {
                        kind: "none",
                        expected: 0,
                        actual: params.len(),
                    });
                }
                Ok(Self::None)
            }
            "gaussian" => match *params {
                [std_dev] if std_dev > 0.0 => Ok(Self::Gaussian { std_dev }),
                [std_dev] => Err(RewardError::NonPositiveStdDev(std_dev)),
                _ => Err(RewardError::NoiseParams {
                    kind: "gaussian",
                    expected: 1,
                    actual: params.len(),
                }),
            },
            _ => Err(RewardError::UnknownNoise(kind.into())),
        }
    }

    fn sample(&self, rng: &mut RandomSource) -> Result<f64, RandomError> {
        match *self {
            Self::None => Ok(0.0),
            Self::Gaussian { std_dev } => rng.gaussian(0.0, std_dev),
        }
    }
}

impl Default for RewardNoise {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Display for RewardNoise {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Gaussian { std_dev } => write!(f, "gaussian(σ={})", std_dev),
        }
    }
}

/// Reward function of a finite MDP.
///
/// The reward for a transition `(s, a, s')` is `mean_rewards[[s, a, s']]` plus noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscreteReward {
    /// Mean reward of each transition, shape `(num_states, num_actions, num_states)`.
    pub mean_rewards: Array3<f64>,
    pub noise: RewardNoise,
}

impl DiscreteReward {
    /// Reward model without noise.
    pub const fn deterministic(mean_rewards: Array3<f64>) -> Self {
        Self {
            mean_rewards,
            noise: RewardNoise::None,
        }
    }

    /// Reward model with noise given by name and parameters.
    ///
    /// # Errors
    /// If the noise type is unknown or does not match the number of parameters.
    pub fn new(
        mean_rewards: Array3<f64>,
        noise_kind: &str,
        noise_params: &[f64],
    ) -> Result<Self, RewardError> {
        Ok(Self {
            mean_rewards,
            noise: RewardNoise::from_kind(noise_kind, noise_params)?,
        })
    }

    /// Mean reward of a transition.
    pub fn mean(&self, state: usize, action: usize, next_state: usize) -> f64 {
        self.mean_rewards[[state, action, next_state]]
    }

    /// Sample a reward for a transition.
    ///
    /// # Panics
    /// If any index is out of bounds.
    pub fn sample(
        &self,
        state: usize,
        action: usize,
        next_state: usize,
        rng: &mut RandomSource,
    ) -> Result<f64, RandomError> {
        Ok(self.mean(state, action, next_state) + self.noise.sample(rng)?)
    }

    /// A lower and upper bound on sampled rewards.
    pub fn reward_range(&self) -> (f64, f64) {
        if let RewardNoise::Gaussian { .. } = self.noise {
            return (f64::NEG_INFINITY, f64::INFINITY);
        }
        match (self.mean_rewards.min(), self.mean_rewards.max()) {
            (Ok(min), Ok(max)) => (*min, *max),
            _ => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }
}
