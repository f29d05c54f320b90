use super::{run_regret, RegretConfig, RegretCurve, SimulationError};
use crate::agents::UcbviConfig;
use crate::envs::{BuildEnv, FiniteMdp};
use crate::logging::{Event, Logger};
use crate::utils::stats::OnlineMeanVariance;
use serde::{Deserialize, Serialize};

/// Configuration for running independent regret experiments on multiple threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MultithreadRegretConfig {
    /// Number of independent runs.
    pub num_runs: usize,
    /// Number of worker threads. Runs are divided evenly among the workers.
    pub num_threads: usize,
}

impl Default for MultithreadRegretConfig {
    fn default() -> Self {
        Self {
            num_runs: 10,
            num_threads: num_cpus::get(),
        }
    }
}

impl MultithreadRegretConfig {
    pub const fn new(num_runs: usize, num_threads: usize) -> Self {
        Self {
            num_runs,
            num_threads,
        }
    }

    /// Run independent regret experiments in parallel and aggregate their regret curves.
    ///
    /// Run `i` builds its own environment from `env_config` with seed `seed + i`
    /// and its own agent; nothing mutable is shared between workers.
    ///
    /// # Args
    /// * `env_config` - Environment configuration.
    /// * `agent_config` - UCBVI configuration.
    /// * `regret_config` - Number of episodes per run.
    /// * `seed` - Base environment seed.
    /// * `logger` - Logs the final regret of each run once all workers are done.
    pub fn run<EC>(
        &self,
        env_config: &EC,
        agent_config: &UcbviConfig,
        regret_config: &RegretConfig,
        seed: u64,
        logger: &mut dyn Logger,
    ) -> Result<RegretSummary, SimulationError>
    where
        EC: BuildEnv<Environment = FiniteMdp> + Sync + ?Sized,
    {
        if self.num_runs == 0 {
            return Err(SimulationError::NoRuns);
        }
        let num_threads = self.num_threads.clamp(1, self.num_runs);

        let worker_results = crossbeam::scope(|scope| {
            let workers: Vec<_> = (0..num_threads)
                .map(|worker| {
                    scope.spawn(move |_scope| {
                        (worker..self.num_runs)
                            .step_by(num_threads)
                            .map(|run| -> Result<_, SimulationError> {
                                let env_seed = seed.wrapping_add(run as u64);
                                let mut mdp = env_config.build_env(env_seed)?;
                                let curve =
                                    run_regret(&mut mdp, agent_config, regret_config, &mut ())?;
                                Ok((run, curve))
                            })
                            .collect::<Result<Vec<_>, _>>()
                    })
                })
                .collect();

            workers
                .into_iter()
                .map(|handle| handle.join().map_err(|_| SimulationError::WorkerPanic))
                .collect::<Vec<_>>()
        })
        .map_err(|_| SimulationError::WorkerPanic)?;

        let mut curves: Vec<(usize, RegretCurve)> = Vec::with_capacity(self.num_runs);
        for result in worker_results {
            curves.extend(result??);
        }
        curves.sort_by_key(|(run, _)| *run);

        let mut summary = RegretSummary::new(regret_config.num_episodes);
        for (_, curve) in &curves {
            logger.log(Event::Run, "final_regret", curve.final_regret().into())?;
            logger.done(Event::Run);
            summary.push(curve);
        }
        Ok(summary)
    }
}

/// Per-episode statistics of the cumulative regret over independent runs.
#[derive(Debug, Clone, PartialEq)]
pub struct RegretSummary {
    /// Statistics of the cumulative regret after each episode; index 0 is before the first.
    pub episodes: Vec<OnlineMeanVariance<f64>>,
}

impl RegretSummary {
    /// An empty summary for experiments of `num_episodes` episodes.
    pub fn new(num_episodes: usize) -> Self {
        Self {
            episodes: vec![OnlineMeanVariance::default(); num_episodes + 1],
        }
    }

    /// Add a regret curve to the summary.
    ///
    /// Entries beyond the shorter of the two lengths are ignored.
    pub fn push(&mut self, curve: &RegretCurve) {
        for (stats, &regret) in self.episodes.iter_mut().zip(&curve.cumulative_regret) {
            stats.push(regret);
        }
    }

    /// Number of runs summarized.
    pub fn num_runs(&self) -> u64 {
        self.episodes.first().map_or(0, OnlineMeanVariance::count)
    }

    /// Mean cumulative regret after each episode.
    pub fn mean(&self) -> Vec<f64> {
        self.episodes
            .iter()
            .map(|stats| stats.mean().unwrap_or(f64::NAN))
            .collect()
    }

    /// Standard deviation of the cumulative regret after each episode.
    pub fn stddev(&self) -> Vec<f64> {
        self.episodes
            .iter()
            .map(|stats| stats.stddev().unwrap_or(f64::NAN))
            .collect()
    }
}
