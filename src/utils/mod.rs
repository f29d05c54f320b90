//! Utilities
pub mod iter;
pub mod random;
pub mod stats;
