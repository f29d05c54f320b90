//! Error type
use crate::agents::{BuildAgentError, UcbviError};
use crate::envs::{BuildEnvError, StepError};
use crate::planning::PlanningError;
use crate::simulation::SimulationError;
use thiserror::Error;

/// Error from the episodic RL crate.
#[derive(Error, Debug)]
pub enum RLError {
    #[error("error building agent")]
    BuildAgent(#[from] BuildAgentError),
    #[error("error building environment")]
    BuildEnv(#[from] BuildEnvError),
    #[error("error taking an environment step")]
    Step(#[from] StepError),
    #[error("error planning")]
    Planning(#[from] PlanningError),
    #[error("error running UCBVI")]
    Ucbvi(#[from] UcbviError),
    #[error("error running simulation")]
    Simulation(#[from] SimulationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn converts_with_source() {
        let error: RLError = BuildAgentError::ZeroHorizon.into();
        assert!(matches!(error, RLError::BuildAgent(BuildAgentError::ZeroHorizon)));
        assert_eq!(error.to_string(), "error building agent");
        assert_eq!(
            error.source().map(ToString::to_string),
            Some("horizon must be at least 1".to_string())
        );
    }
}
