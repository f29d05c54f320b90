//! Tabular episodic reinforcement learning.
//!
//! Finite MDP environments, finite-horizon value iteration and the UCBVI
//! online learning algorithm.
#![warn(clippy::cast_lossless)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::missing_const_for_fn)] // has some false positives
#![warn(clippy::needless_borrow)]
#![warn(clippy::needless_pass_by_value)]
#![warn(clippy::redundant_closure_for_method_calls)]
#![warn(clippy::use_self)] // also triggered by macro expansions
pub mod agents;
pub mod envs;
mod error;
pub mod history;
pub mod logging;
pub mod planning;
pub mod simulation;
pub mod spaces;
pub mod utils;

pub use agents::{BonusType, Ucbvi, UcbviConfig};
pub use envs::{BuildEnv, EnvStructure, Environment, FiniteMdp, TabularModel};
pub use error::RLError;
pub use history::{History, HistorySink};
pub use planning::EpisodicVi;
pub use simulation::{run_regret, MultithreadRegretConfig, RegretConfig};
