//! Learning agents
mod bonus;
mod builder;
mod ucbvi;

pub use bonus::{log_term, next_value_variance, BonusType, ExplorationBonus};
pub use builder::BuildAgentError;
pub use ucbvi::{Ucbvi, UcbviConfig, UcbviError, DELTA, REGRET_VAR};
