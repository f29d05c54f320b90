//! Upper-confidence bound value iteration (UCBVI)
use super::bonus::{self, BonusType, ExplorationBonus};
use super::BuildAgentError;
use crate::envs::{FiniteMdp, StepError};
use crate::history::{HistoryError, HistorySink};
use crate::logging::{Event, LogError, Loggable, Logger};
use crate::planning::{lookahead, EpisodicVi, PlanningError};
use crate::utils::iter::FirstArgMax;
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Confidence parameter of the exploration bonuses.
pub const DELTA: f64 = 0.1;

/// Name of the extra history variable holding the episode regret.
pub const REGRET_VAR: &str = "regret";

/// Configuration of a [`Ucbvi`] agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UcbviConfig {
    /// Number of steps per episode.
    pub horizon: usize,
    /// Multiplier applied to every exploration bonus.
    pub scale_factor: f64,
    pub bonus: BonusType,
}

impl Default for UcbviConfig {
    fn default() -> Self {
        Self {
            horizon: 10,
            scale_factor: 1.0,
            bonus: BonusType::Bernstein,
        }
    }
}

impl UcbviConfig {
    pub const fn new(horizon: usize, scale_factor: f64, bonus: BonusType) -> Self {
        Self {
            horizon,
            scale_factor,
            bonus,
        }
    }

    /// Configuration with the bonus type given by name (`"hoeffding"` or `"bernstein"`).
    pub fn with_bonus_name(
        horizon: usize,
        scale_factor: f64,
        bonus: &str,
    ) -> Result<Self, BuildAgentError> {
        Ok(Self::new(horizon, scale_factor, bonus.parse()?))
    }

    /// Build an agent that learns in `mdp`.
    pub fn build_agent<'a>(&self, mdp: &'a mut FiniteMdp) -> Result<Ucbvi<'a>, BuildAgentError> {
        Ucbvi::new(mdp, self)
    }
}

/// Error running a UCBVI episode.
#[derive(Debug, Error)]
pub enum UcbviError {
    #[error("optimal values have shape {actual:?}, expected {expected:?}")]
    ValueShape {
        expected: [usize; 2],
        actual: Vec<usize>,
    },
    #[error("stage {stage} out of range for horizon {horizon}")]
    InvalidStage { stage: usize, horizon: usize },
    #[error(
        "transition ({state}, {action}) -> {next_state} out of range for \
         {num_states} states and {num_actions} actions"
    )]
    InvalidTransition {
        state: usize,
        action: usize,
        next_state: usize,
        num_states: usize,
        num_actions: usize,
    },
    #[error(transparent)]
    Step(#[from] StepError),
    #[error(transparent)]
    Planning(#[from] PlanningError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Log(#[from] LogError<'static>),
}

/// UCBVI: optimistic value iteration on an empirical model of a finite MDP.
///
/// Each episode the agent plans with the empirical transitions `phat` and rewards `rhat`
/// plus an exploration bonus, then follows the resulting greedy policy for `horizon` steps
/// in the environment, updating its model after every step.
///
/// The agent borrows its environment for its whole lifetime.
/// The ground-truth dynamics are only used to evaluate the value of the agent's policies.
#[derive(Debug)]
pub struct Ucbvi<'a> {
    mdp: &'a mut FiniteMdp,
    horizon: usize,
    scale_factor: f64,
    bonus_type: BonusType,
    evaluator: EpisodicVi,

    /// Total number of environment steps.
    t: u64,
    /// Number of completed episodes.
    episode: usize,

    phat: Array3<f64>,
    rhat: Array3<f64>,
    n_sa: Array2<u64>,
    n_sas: Array3<u64>,
    bonus: Array3<f64>,
    q: Array3<f64>,
    v: Array2<f64>,
    vpi: Array2<f64>,
    policy: Array2<usize>,

    all_episode_rewards: Vec<f64>,
    episode_value: Vec<f64>,
}

impl<'a> Ucbvi<'a> {
    /// Create an agent with all estimates at zero.
    pub fn new(mdp: &'a mut FiniteMdp, config: &UcbviConfig) -> Result<Self, BuildAgentError> {
        if config.horizon == 0 {
            return Err(BuildAgentError::ZeroHorizon);
        }
        if !(config.scale_factor >= 0.0 && config.scale_factor.is_finite()) {
            return Err(BuildAgentError::InvalidScaleFactor(config.scale_factor));
        }
        let horizon = config.horizon;
        let ns = mdp.num_states();
        let na = mdp.num_actions();
        Ok(Self {
            mdp,
            horizon,
            scale_factor: config.scale_factor,
            bonus_type: config.bonus,
            evaluator: EpisodicVi::new(horizon),
            t: 0,
            episode: 0,
            phat: Array3::zeros((ns, na, ns)),
            rhat: Array3::zeros((ns, na, ns)),
            n_sa: Array2::zeros((ns, na)),
            n_sas: Array3::zeros((ns, na, ns)),
            bonus: Array3::zeros((horizon, ns, na)),
            q: Array3::zeros((horizon + 1, ns, na)),
            v: Array2::zeros((horizon + 1, ns)),
            vpi: Array2::zeros((horizon + 1, ns)),
            policy: Array2::zeros((horizon, ns)),
            all_episode_rewards: Vec::new(),
            episode_value: Vec::new(),
        })
    }

    /// Forget everything learned: zero all tables and counters and clear the episode logs.
    pub fn reset(&mut self) {
        self.t = 0;
        self.episode = 0;
        self.phat.fill(0.0);
        self.rhat.fill(0.0);
        self.n_sa.fill(0);
        self.n_sas.fill(0);
        self.bonus.fill(0.0);
        self.q.fill(0.0);
        self.v.fill(0.0);
        self.vpi.fill(0.0);
        self.policy.fill(0);
        self.all_episode_rewards.clear();
        self.episode_value.clear();
    }

    /// Compute optimistic values and the greedy policy by backward induction on the
    /// empirical model plus exploration bonus.
    ///
    /// Does nothing besides zeroing `q[horizon]` before the first episode has completed.
    pub fn get_optimistic_q(&mut self) {
        self.q.index_axis_mut(Axis(0), self.horizon).fill(0.0);
        if self.episode == 0 {
            return;
        }

        let per_stage_bonus = self.bonus_type.uses_next_values();
        if !per_stage_bonus {
            self.compute_hoeffding_bonus();
        }

        let ns = self.num_states();
        let na = self.num_actions();
        for h in (0..self.horizon).rev() {
            if per_stage_bonus {
                self.fill_bernstein_bonus(h);
            }
            let max_value = (self.horizon - h + 2) as f64;
            for state in 0..ns {
                for action in 0..na {
                    let expected = lookahead(
                        self.phat.slice(s![state, action, ..]),
                        self.rhat.slice(s![state, action, ..]),
                        self.v.row(h + 1),
                    );
                    self.q[[h, state, action]] = expected + self.bonus[[h, state, action]];
                }
                let q_state = self.q.slice(s![h, state, ..]);
                if let Some((action, value)) = q_state.iter().copied().first_argmax() {
                    self.v[[h, state]] = value.min(max_value);
                    self.policy[[h, state]] = action;
                }
            }
        }
    }

    /// Fill the bonus table at every stage with the Hoeffding bonus.
    pub fn compute_hoeffding_bonus(&mut self) {
        let ns = self.num_states();
        let na = self.num_actions();
        for state in 0..ns {
            for action in 0..na {
                let visits = self.n_sa[[state, action]].max(1);
                let log_term = bonus::log_term(ns, na, visits, DELTA);
                let value = self.scale_factor
                    * BonusType::Hoeffding.compute(self.horizon, visits, log_term, 0.0);
                self.bonus.slice_mut(s![.., state, action]).fill(value);
            }
        }
    }

    /// Fill the bonus table at stage `h` with the Bernstein bonus.
    ///
    /// Uses the current value estimates at stage `h + 1`.
    ///
    /// # Errors
    /// If `h >= horizon`.
    pub fn compute_bernstein_bonus(&mut self, h: usize) -> Result<(), UcbviError> {
        if h >= self.horizon {
            return Err(UcbviError::InvalidStage {
                stage: h,
                horizon: self.horizon,
            });
        }
        self.fill_bernstein_bonus(h);
        Ok(())
    }

    fn fill_bernstein_bonus(&mut self, h: usize) {
        let ns = self.num_states();
        let na = self.num_actions();
        let next_values = self.v.row(h + 1);
        for state in 0..ns {
            for action in 0..na {
                let visits = self.n_sa[[state, action]].max(1);
                let log_term = bonus::log_term(ns, na, visits, DELTA);
                let variance = bonus::next_value_variance(
                    self.phat.slice(s![state, action, ..]),
                    next_values,
                );
                self.bonus[[h, state, action]] = self.scale_factor
                    * BonusType::Bernstein.compute(self.horizon, visits, log_term, variance);
            }
        }
    }

    /// Run one episode in the environment.
    ///
    /// Plans optimistically, evaluates the resulting policy under the true dynamics,
    /// then follows it for `horizon` steps while updating the empirical model.
    ///
    /// # Args
    /// * `true_v` - Optimal values of the environment, shape `(horizon + 1, num_states)`.
    ///     Used to record the regret of this episode.
    /// * `history` - Receives every transition with the episode regret as extra variable.
    /// * `logger` - Logs step and episode statistics.
    ///
    /// # Returns
    /// The initial state of the episode.
    ///
    /// # Errors
    /// On error the episode is abandoned without being counted.
    /// Steps taken before the error stay in the empirical model and in `t`.
    pub fn run_episode(
        &mut self,
        true_v: ArrayView2<f64>,
        history: &mut dyn HistorySink<usize, usize>,
        logger: &mut dyn Logger,
    ) -> Result<usize, UcbviError> {
        let value_shape = [self.horizon + 1, self.num_states()];
        if true_v.shape() != value_shape {
            return Err(UcbviError::ValueShape {
                expected: value_shape,
                actual: true_v.shape().to_vec(),
            });
        }

        let initial_state = self.mdp.reset();
        self.get_optimistic_q();

        self.evaluator
            .evaluate_policy(&*self.mdp, self.policy.view(), &mut self.vpi)?;
        let policy_value = self.vpi[[0, initial_state]];
        let regret = true_v[[0, initial_state]] - policy_value;

        let num_actions = self.num_actions();
        let mut episode_reward: f64 = 0.0;
        let mut state = initial_state;
        for h in 0..self.horizon {
            let action = self.policy[[h, state]];
            let result = self.mdp.step(action)?;
            history.append(
                state,
                action,
                result.reward,
                result.next_state,
                &[regret],
                self.episode,
            )?;
            self.record(state, action, result.reward, result.next_state);
            self.t += 1;

            logger.log(Event::Step, "reward", result.reward.into())?;
            logger.log(
                Event::Step,
                "action",
                Loggable::IndexSample {
                    value: action,
                    size: num_actions,
                },
            )?;
            logger.done(Event::Step);

            episode_reward += result.reward;
            state = result.next_state;
        }
        self.episode_value.push(policy_value);
        self.episode += 1;
        self.all_episode_rewards.push(episode_reward);

        logger.log(Event::Episode, "reward", episode_reward.into())?;
        logger.log(Event::Episode, "policy_value", policy_value.into())?;
        logger.log(Event::Episode, "regret", regret.into())?;
        logger.done(Event::Episode);
        Ok(initial_state)
    }

    /// Update the empirical model with an observed transition.
    ///
    /// # Errors
    /// If a state or the action is out of range.
    pub fn update(
        &mut self,
        state: usize,
        action: usize,
        reward: f64,
        next_state: usize,
    ) -> Result<(), UcbviError> {
        let num_states = self.num_states();
        let num_actions = self.num_actions();
        if state >= num_states || action >= num_actions || next_state >= num_states {
            return Err(UcbviError::InvalidTransition {
                state,
                action,
                next_state,
                num_states,
                num_actions,
            });
        }
        self.record(state, action, reward, next_state);
        Ok(())
    }

    fn record(&mut self, state: usize, action: usize, reward: f64, next_state: usize) {
        let old_n = self.n_sas[[state, action, next_state]];
        self.n_sas[[state, action, next_state]] += 1;
        self.n_sa[[state, action]] += 1;

        let n_sa = self.n_sa[[state, action]] as f64;
        let counts = self.n_sas.slice(s![state, action, ..]);
        let mut phat = self.phat.slice_mut(s![state, action, ..]);
        phat.zip_mut_with(&counts, |p, &n| *p = n as f64 / n_sa);

        let rhat = &mut self.rhat[[state, action, next_state]];
        *rhat = (*rhat * old_n as f64 + reward) / (old_n + 1) as f64;
    }

    /// Reserve space in `history` for `num_episodes` episodes and name the regret variable.
    pub fn prepare_history(
        &self,
        history: &mut dyn HistorySink<usize, usize>,
        num_episodes: usize,
    ) -> Result<(), HistoryError> {
        history.reserve(num_episodes * self.horizon, 1)?;
        history.set_names(&[REGRET_VAR])
    }

    pub fn mdp(&self) -> &FiniteMdp {
        &*self.mdp
    }

    pub const fn horizon(&self) -> usize {
        self.horizon
    }

    pub const fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub const fn bonus_type(&self) -> BonusType {
        self.bonus_type
    }

    pub fn num_states(&self) -> usize {
        self.phat.len_of(Axis(0))
    }

    pub fn num_actions(&self) -> usize {
        self.phat.len_of(Axis(1))
    }

    /// Total number of environment steps taken.
    pub const fn t(&self) -> u64 {
        self.t
    }

    /// Number of completed episodes.
    pub const fn episode(&self) -> usize {
        self.episode
    }

    /// Empirical transition probabilities `phat[[s, a, s']]`.
    pub fn phat(&self) -> ArrayView3<f64> {
        self.phat.view()
    }

    /// Empirical mean rewards `rhat[[s, a, s']]`.
    pub fn rhat(&self) -> ArrayView3<f64> {
        self.rhat.view()
    }

    /// State-action visit counts.
    pub fn n_sa(&self) -> ArrayView2<u64> {
        self.n_sa.view()
    }

    /// Transition counts.
    pub fn n_sas(&self) -> ArrayView3<u64> {
        self.n_sas.view()
    }

    /// Exploration bonus `bonus[[h, s, a]]`.
    pub fn bonus(&self) -> ArrayView3<f64> {
        self.bonus.view()
    }

    /// Optimistic action values `q[[h, s, a]]`.
    pub fn q(&self) -> ArrayView3<f64> {
        self.q.view()
    }

    /// Optimistic state values `v[[h, s]]`.
    pub fn v(&self) -> ArrayView2<f64> {
        self.v.view()
    }

    /// True values of the most recently evaluated policy.
    pub fn vpi(&self) -> ArrayView2<f64> {
        self.vpi.view()
    }

    /// Greedy policy `policy[[h, s]]`.
    pub fn policy(&self) -> ArrayView2<usize> {
        self.policy.view()
    }

    /// Total reward of each completed episode.
    pub fn all_episode_rewards(&self) -> &[f64] {
        &self.all_episode_rewards
    }

    /// True initial-state value of the policy followed in each episode.
    pub fn episode_value(&self) -> &[f64] {
        &self.episode_value
    }
}
