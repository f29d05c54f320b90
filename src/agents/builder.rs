use thiserror::Error;

/// Error building an agent
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildAgentError {
    #[error("unknown exploration bonus \"{0}\", expected \"hoeffding\" or \"bernstein\"")]
    UnknownBonus(String),
    #[error("horizon must be at least 1")]
    ZeroHorizon,
    #[error("bonus scale factor must be finite and non-negative, got {0}")]
    InvalidScaleFactor(f64),
}
