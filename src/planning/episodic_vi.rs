//! Finite-horizon value iteration
use super::lookahead;
use crate::envs::TabularModel;
use crate::utils::iter::FirstArgMax;
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, Axis};
use thiserror::Error;

/// Error evaluating a policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanningError {
    #[error("policy has shape {actual:?}, expected {expected:?}")]
    PolicyShape {
        expected: [usize; 2],
        actual: Vec<usize>,
    },
    #[error("value buffer has shape {actual:?}, expected {expected:?}")]
    ValueShape {
        expected: [usize; 2],
        actual: Vec<usize>,
    },
    #[error("policy action {action} at stage {stage}, state {state} out of range for {num_actions} actions")]
    InvalidAction {
        stage: usize,
        state: usize,
        action: usize,
        num_actions: usize,
    },
}

/// Exact value iteration for episodes of a fixed horizon.
///
/// Plans against the true dynamics of a [`TabularModel`].
/// Stages are indexed `0 .. horizon`; the values at stage `horizon` are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodicVi {
    horizon: usize,
    /// Optimal action values, shape `(horizon + 1, num_states, num_actions)`.
    q: Array3<f64>,
    /// Optimal state values, shape `(horizon + 1, num_states)`.
    v: Array2<f64>,
    /// Greedy policy, shape `(horizon, num_states)`.
    greedy_policy: Array2<usize>,
}

impl EpisodicVi {
    /// Create a planner for episodes of length `horizon`.
    ///
    /// The value tables are empty until [`EpisodicVi::run`] is called.
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon,
            q: Array3::zeros((horizon + 1, 0, 0)),
            v: Array2::zeros((horizon + 1, 0)),
            greedy_policy: Array2::zeros((horizon, 0)),
        }
    }

    pub const fn horizon(&self) -> usize {
        self.horizon
    }

    /// Optimal action values `Q[[h, s, a]]`.
    pub fn q(&self) -> ArrayView3<f64> {
        self.q.view()
    }

    /// Optimal state values `V[[h, s]]`.
    pub fn v(&self) -> ArrayView2<f64> {
        self.v.view()
    }

    /// Greedy policy `pi[[h, s]]`.
    ///
    /// Ties between actions are broken in favour of the lowest action index.
    pub fn greedy_policy(&self) -> ArrayView2<usize> {
        self.greedy_policy.view()
    }

    /// Compute optimal values and a greedy policy by backward induction.
    ///
    /// All tables are recomputed from scratch.
    pub fn run<M: TabularModel + ?Sized>(&mut self, model: &M) {
        let num_states = model.num_states();
        let num_actions = model.num_actions();
        let transitions = model.transitions();
        let rewards = model.mean_rewards();

        self.q = Array3::zeros((self.horizon + 1, num_states, num_actions));
        self.v = Array2::zeros((self.horizon + 1, num_states));
        self.greedy_policy = Array2::zeros((self.horizon, num_states));

        for h in (0..self.horizon).rev() {
            let (mut v_h, v_next) = self.v.multi_slice_mut((s![h, ..], s![h + 1, ..]));
            for state in 0..num_states {
                for action in 0..num_actions {
                    self.q[[h, state, action]] = lookahead(
                        transitions.slice(s![state, action, ..]),
                        rewards.slice(s![state, action, ..]),
                        v_next.view(),
                    );
                }
                let q_state = self.q.slice(s![h, state, ..]);
                if let Some((action, value)) = q_state.iter().copied().first_argmax() {
                    v_h[state] = value;
                    self.greedy_policy[[h, state]] = action;
                }
            }
        }
    }

    /// Evaluate a fixed policy under the true dynamics.
    ///
    /// # Args
    /// * `model` - Environment dynamics.
    /// * `policy` - Action `policy[[h, s]]` taken in state `s` at stage `h`.
    ///     Shape `(horizon, num_states)`.
    /// * `values` - Output buffer of shape `(horizon + 1, num_states)`.
    ///     Overwritten with the policy values; `values[[horizon, s]] = 0`.
    ///
    /// # Errors
    /// If the shapes do not match or the policy takes an invalid action.
    /// `values` is left unmodified on error.
    pub fn evaluate_policy<M: TabularModel + ?Sized>(
        &self,
        model: &M,
        policy: ArrayView2<usize>,
        values: &mut Array2<f64>,
    ) -> Result<(), PlanningError> {
        let num_states = model.num_states();
        let num_actions = model.num_actions();
        let policy_shape = [self.horizon, num_states];
        if policy.shape() != policy_shape {
            return Err(PlanningError::PolicyShape {
                expected: policy_shape,
                actual: policy.shape().to_vec(),
            });
        }
        let value_shape = [self.horizon + 1, num_states];
        if values.shape() != value_shape {
            return Err(PlanningError::ValueShape {
                expected: value_shape,
                actual: values.shape().to_vec(),
            });
        }
        if let Some(((stage, state), &action)) =
            policy.indexed_iter().find(|(_, &a)| a >= num_actions)
        {
            return Err(PlanningError::InvalidAction {
                stage,
                state,
                action,
                num_actions,
            });
        }

        let transitions = model.transitions();
        let rewards = model.mean_rewards();
        values.index_axis_mut(Axis(0), self.horizon).fill(0.0);
        for h in (0..self.horizon).rev() {
            let (mut v_h, v_next) = values.multi_slice_mut((s![h, ..], s![h + 1, ..]));
            for state in 0..num_states {
                let action = policy[[h, state]];
                v_h[state] = lookahead(
                    transitions.slice(s![state, action, ..]),
                    rewards.slice(s![state, action, ..]),
                    v_next.view(),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::{BuildEnv, Chain, FiniteMdp, GridWorld};
    use ndarray::arr3;
    use rstest::rstest;

    /// One state, two actions with equal mean reward.
    fn tied_actions() -> FiniteMdp {
        let transitions = arr3(&[[[1.0], [1.0]]]);
        let rewards = arr3(&[[[0.5], [0.5]]]);
        FiniteMdp::from_mean_rewards(rewards, transitions, vec![], 0, 0).unwrap()
    }

    #[test]
    fn chain_optimal_values() {
        let mdp = Chain::new(4, 0.0).build_env(0).unwrap();
        let mut vi = EpisodicVi::new(5);
        vi.run(&mdp);
        // Reach the last state in 3 steps then stay for 2 more rewards.
        assert_eq!(vi.v()[[0, 0]], 3.0);
        assert_eq!(vi.v()[[4, 3]], 1.0);
        assert_eq!(vi.v()[[4, 0]], 0.0);
        for h in 0..5 {
            for s in 0..4 {
                assert_eq!(vi.greedy_policy()[[h, s]], 0, "stage {} state {}", h, s);
            }
        }
        assert!(vi.v().row(5).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn ties_pick_lowest_action() {
        let mdp = tied_actions();
        let mut vi = EpisodicVi::new(3);
        vi.run(&mdp);
        assert!(vi.greedy_policy().iter().all(|&a| a == 0));
        assert_eq!(vi.v()[[0, 0]], 1.5);
    }

    #[rstest]
    #[case(GridWorld::new(3, 4, 0.2, 0.5, 0.0))]
    #[case(GridWorld::new(4, 4, 0.0, 0.0, 0.0))]
    fn q_is_lookahead_of_next_values(#[case] grid: GridWorld) {
        let mdp = grid.build_env(0).unwrap();
        let horizon = 6;
        let mut vi = EpisodicVi::new(horizon);
        vi.run(&mdp);
        let p = mdp.transitions();
        let r = mdp.mean_rewards();
        for h in 0..horizon {
            for s in 0..mdp.num_states() {
                for a in 0..mdp.num_actions() {
                    let mut expected = 0.0;
                    for sn in 0..mdp.num_states() {
                        expected += p[[s, a, sn]] * (r[[s, a, sn]] + vi.v()[[h + 1, sn]]);
                    }
                    assert_eq!(vi.q()[[h, s, a]], expected);
                }
                let best = vi.greedy_policy()[[h, s]];
                assert_eq!(vi.v()[[h, s]], vi.q()[[h, s, best]]);
                for a in 0..best {
                    assert!(vi.q()[[h, s, a]] < vi.v()[[h, s]]);
                }
                for a in best..mdp.num_actions() {
                    assert!(vi.q()[[h, s, a]] <= vi.v()[[h, s]]);
                }
            }
        }
    }

    #[test]
    fn greedy_policy_value_is_optimal() {
        let mdp = GridWorld::new(3, 3, 0.1, 0.4, 0.0).build_env(0).unwrap();
        let horizon = 5;
        let mut vi = EpisodicVi::new(horizon);
        vi.run(&mdp);
        let mut values = Array2::from_elem((horizon + 1, mdp.num_states()), f64::NAN);
        vi.evaluate_policy(&mdp, vi.greedy_policy(), &mut values)
            .unwrap();
        for (a, b) in values.iter().zip(vi.v()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn evaluate_fixed_policy() {
        let mdp = Chain::new(3, 0.0).build_env(0).unwrap();
        let horizon = 4;
        let vi = EpisodicVi::new(horizon);
        // Always move left: never reaches the rewarding state from state 0.
        let left = Array2::from_elem((horizon, 3), 1);
        let mut values = Array2::zeros((horizon + 1, 3));
        vi.evaluate_policy(&mdp, left.view(), &mut values).unwrap();
        assert_eq!(values[[0, 0]], 0.0);
        // From the last state, moving left leaves it
        assert_eq!(values[[3, 2]], 0.0);

        let right = Array2::zeros((horizon, 3));
        vi.evaluate_policy(&mdp, right.view(), &mut values).unwrap();
        assert_eq!(values[[0, 0]], 3.0);
        assert_eq!(values[[0, 2]], 4.0);
        assert_eq!(values.row(horizon).sum(), 0.0);
    }

    #[test]
    fn evaluate_policy_shape_errors() {
        let mdp = Chain::new(3, 0.0).build_env(0).unwrap();
        let vi = EpisodicVi::new(2);
        let mut values = Array2::zeros((3, 3));
        let policy = Array2::zeros((3, 3));
        assert_eq!(
            vi.evaluate_policy(&mdp, policy.view(), &mut values),
            Err(PlanningError::PolicyShape {
                expected: [2, 3],
                actual: vec![3, 3]
            })
        );

        let policy = Array2::zeros((2, 3));
        let mut short = Array2::zeros((2, 3));
        assert!(matches!(
            vi.evaluate_policy(&mdp, policy.view(), &mut short),
            Err(PlanningError::ValueShape { .. })
        ));

        let mut bad_action = Array2::zeros((2, 3));
        bad_action[[1, 2]] = 2;
        assert_eq!(
            vi.evaluate_policy(&mdp, bad_action.view(), &mut values),
            Err(PlanningError::InvalidAction {
                stage: 1,
                state: 2,
                action: 2,
                num_actions: 2
            })
        );
    }

    #[test]
    fn zero_horizon() {
        let mdp = tied_actions();
        let mut vi = EpisodicVi::new(0);
        vi.run(&mdp);
        assert_eq!(vi.v().shape(), &[1, 1]);
        assert_eq!(vi.greedy_policy().shape(), &[0, 1]);
    }
}
