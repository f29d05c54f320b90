//! Planning with known dynamics
mod episodic_vi;

pub use episodic_vi::{EpisodicVi, PlanningError};

use ndarray::ArrayView1;

/// Expected one-step return `Σ_{s'} P[s'] (R[s'] + V[s'])`.
///
/// Terms are accumulated in increasing `s'` order so that results are reproducible
/// bit-for-bit.
///
/// # Args
/// * `transitions` - Successor state probabilities `P[s, a, :]`.
/// * `rewards` - Transition rewards `R[s, a, :]`.
/// * `next_values` - Successor state values.
pub fn lookahead(
    transitions: ArrayView1<f64>,
    rewards: ArrayView1<f64>,
    next_values: ArrayView1<f64>,
) -> f64 {
    let mut total = 0.0;
    for ((p, r), v) in transitions.iter().zip(rewards).zip(next_values) {
        total += p * (r + v);
    }
    total
}
