//! Regret experiments
mod multithread;
mod regret;

pub use multithread::{MultithreadRegretConfig, RegretSummary};
pub use regret::{run_regret, run_regret_with_history, RegretConfig, RegretCurve};

use crate::agents::{BuildAgentError, UcbviError};
use crate::envs::BuildEnvError;
use crate::history::HistoryError;
use crate::logging::LogError;
use thiserror::Error;

/// Error initializing or running an experiment.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("error building agent")]
    BuildAgent(#[from] BuildAgentError),
    #[error("error building environment")]
    BuildEnv(#[from] BuildEnvError),
    #[error("error running episode")]
    Ucbvi(#[from] UcbviError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Log(#[from] LogError<'static>),
    #[error("experiment has no runs")]
    NoRuns,
    #[error("worker thread panicked")]
    WorkerPanic,
}
