//! Regret of UCBVI in a single environment
use super::SimulationError;
use crate::agents::UcbviConfig;
use crate::envs::FiniteMdp;
use crate::history::HistorySink;
use crate::logging::{Event, Logger};
use crate::planning::EpisodicVi;
use serde::{Deserialize, Serialize};

/// Configuration of a regret experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegretConfig {
    pub num_episodes: usize,
}

impl Default for RegretConfig {
    fn default() -> Self {
        Self { num_episodes: 1000 }
    }
}

impl RegretConfig {
    pub const fn new(num_episodes: usize) -> Self {
        Self { num_episodes }
    }
}

/// Outcome of a regret experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct RegretCurve {
    /// Cumulative regret after each episode, starting with 0 before the first episode.
    pub cumulative_regret: Vec<f64>,
    /// Total reward obtained in each episode.
    pub episode_rewards: Vec<f64>,
}

impl RegretCurve {
    /// Number of episodes run.
    pub fn num_episodes(&self) -> usize {
        self.episode_rewards.len()
    }

    /// Cumulative regret at the end of the experiment.
    pub fn final_regret(&self) -> f64 {
        self.cumulative_regret.last().copied().unwrap_or(0.0)
    }
}

/// Measure the regret of UCBVI learning in `mdp`.
///
/// The optimal values are computed with [`EpisodicVi`] on the true dynamics.
/// The regret of an episode is the optimal value of its initial state minus
/// the true value of the policy followed in the episode.
pub fn run_regret(
    mdp: &mut FiniteMdp,
    agent_config: &UcbviConfig,
    config: &RegretConfig,
    logger: &mut dyn Logger,
) -> Result<RegretCurve, SimulationError> {
    run_regret_with_history(mdp, agent_config, config, &mut (), logger)
}

/// Measure the regret of UCBVI learning in `mdp`, recording every transition in `history`.
///
/// See [`run_regret`].
pub fn run_regret_with_history(
    mdp: &mut FiniteMdp,
    agent_config: &UcbviConfig,
    config: &RegretConfig,
    history: &mut dyn HistorySink<usize, usize>,
    logger: &mut dyn Logger,
) -> Result<RegretCurve, SimulationError> {
    let mut planner = EpisodicVi::new(agent_config.horizon);
    planner.run(&*mdp);
    let true_v = planner.v().to_owned();

    let mut agent = agent_config.build_agent(mdp)?;
    agent.prepare_history(history, config.num_episodes)?;

    let mut cumulative_regret = Vec::with_capacity(config.num_episodes + 1);
    let mut total: f64 = 0.0;
    cumulative_regret.push(total);
    for episode in 0..config.num_episodes {
        let initial_state = agent.run_episode(true_v.view(), history, logger)?;
        total += true_v[[0, initial_state]] - agent.episode_value()[episode];
        cumulative_regret.push(total);
    }

    logger.log(Event::Run, "regret", total.into())?;
    logger.done(Event::Run);
    Ok(RegretCurve {
        cumulative_regret,
        episode_rewards: agent.all_episode_rewards().to_vec(),
    })
}
