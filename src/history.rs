//! Transition histories
use thiserror::Error;

/// Error recording a transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("expected {expected} extra variable(s), got {actual}")]
    ExtraVars { expected: usize, actual: usize },
    #[error("{expected} extra variable name(s) were reserved, got {actual}")]
    Names { expected: usize, actual: usize },
    #[error("cannot change from {current} to {requested} extra variable(s) with {len} record(s) stored")]
    ExtraVarsChanged {
        current: usize,
        requested: usize,
        len: usize,
    },
}

/// Append-only log of environment transitions.
///
/// Each record may carry a fixed number of named extra variables
/// (for example the per-episode regret).
pub trait HistorySink<S, A> {
    /// Prepare for `capacity` more records with `n_extra` extra variables each.
    ///
    /// Never discards records. Changing the number of extra variables of a sink
    /// that already holds records is an error.
    fn reserve(&mut self, capacity: usize, n_extra: usize) -> Result<(), HistoryError>;

    /// Name the extra variables.
    fn set_names(&mut self, names: &[&str]) -> Result<(), HistoryError>;

    /// Record a transition.
    fn append(
        &mut self,
        state: S,
        action: A,
        reward: f64,
        next_state: S,
        extra_vars: &[f64],
        episode: usize,
    ) -> Result<(), HistoryError>;
}

/// History sink that discards everything.
impl<S, A> HistorySink<S, A> for () {
    fn reserve(&mut self, _: usize, _: usize) -> Result<(), HistoryError> {
        Ok(())
    }

    fn set_names(&mut self, _: &[&str]) -> Result<(), HistoryError> {
        Ok(())
    }

    fn append(&mut self, _: S, _: A, _: f64, _: S, _: &[f64], _: usize) -> Result<(), HistoryError> {
        Ok(())
    }
}

impl<S, A, T: HistorySink<S, A> + ?Sized> HistorySink<S, A> for &mut T {
    fn reserve(&mut self, capacity: usize, n_extra: usize) -> Result<(), HistoryError> {
        T::reserve(self, capacity, n_extra)
    }

    fn set_names(&mut self, names: &[&str]) -> Result<(), HistoryError> {
        T::set_names(self, names)
    }

    fn append(
        &mut self,
        state: S,
        action: A,
        reward: f64,
        next_state: S,
        extra_vars: &[f64],
        episode: usize,
    ) -> Result<(), HistoryError> {
        T::append(self, state, action, reward, next_state, extra_vars, episode)
    }
}

/// A recorded transition.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow<'a, S, A> {
    pub state: &'a S,
    pub action: &'a A,
    pub reward: f64,
    pub next_state: &'a S,
    pub extra_vars: &'a [f64],
    pub episode: usize,
}

/// In-memory column store of transitions.
#[derive(Debug, Clone, PartialEq)]
pub struct History<S, A> {
    states: Vec<S>,
    actions: Vec<A>,
    rewards: Vec<f64>,
    next_states: Vec<S>,
    episodes: Vec<usize>,
    /// Extra variables stored row-major, `n_extra` per record.
    extra_vars: Vec<f64>,
    n_extra: usize,
    names: Vec<String>,
}

impl<S, A> Default for History<S, A> {
    fn default() -> Self {
        Self {
            states: Vec::new(),
            actions: Vec::new(),
            rewards: Vec::new(),
            next_states: Vec::new(),
            episodes: Vec::new(),
            extra_vars: Vec::new(),
            n_extra: 0,
            names: Vec::new(),
        }
    }
}

impl<S, A> History<S, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded transitions.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Number of extra variables per record.
    pub const fn n_extra(&self) -> usize {
        self.n_extra
    }

    /// Names of the extra variables.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    /// Remove all records, keeping the variable names.
    pub fn clear(&mut self) {
        self.states.clear();
        self.actions.clear();
        self.rewards.clear();
        self.next_states.clear();
        self.episodes.clear();
        self.extra_vars.clear();
    }

    /// Values of the extra variable `name` for every record.
    pub fn extra(&self, name: &str) -> Option<impl Iterator<Item = f64> + '_> {
        let column = self.names.iter().position(|n| n == name)?;
        Some(
            self.extra_vars
                .chunks_exact(self.n_extra)
                .map(move |row| row[column]),
        )
    }

    /// Iterate over the recorded transitions in order.
    pub fn iter(&self) -> Iter<S, A> {
        Iter {
            history: self,
            index: 0,
        }
    }

    fn extra_row(&self, index: usize) -> &[f64] {
        &self.extra_vars[index * self.n_extra..(index + 1) * self.n_extra]
    }
}

impl<S, A> HistorySink<S, A> for History<S, A> {
    fn reserve(&mut self, capacity: usize, n_extra: usize) -> Result<(), HistoryError> {
        if n_extra != self.n_extra {
            if !self.is_empty() {
                return Err(HistoryError::ExtraVarsChanged {
                    current: self.n_extra,
                    requested: n_extra,
                    len: self.len(),
                });
            }
            self.names.clear();
            self.n_extra = n_extra;
        }
        self.states.reserve(capacity);
        self.actions.reserve(capacity);
        self.rewards.reserve(capacity);
        self.next_states.reserve(capacity);
        self.episodes.reserve(capacity);
        self.extra_vars.reserve(capacity * n_extra);
        Ok(())
    }

    fn set_names(&mut self, names: &[&str]) -> Result<(), HistoryError> {
        if names.len() != self.n_extra {
            return Err(HistoryError::Names {
                expected: self.n_extra,
                actual: names.len(),
            });
        }
        self.names = names.iter().map(|&n| n.into()).collect();
        Ok(())
    }

    fn append(
        &mut self,
        state: S,
        action: A,
        reward: f64,
        next_state: S,
        extra_vars: &[f64],
        episode: usize,
    ) -> Result<(), HistoryError> {
        if extra_vars.len() != self.n_extra {
            return Err(HistoryError::ExtraVars {
                expected: self.n_extra,
                actual: extra_vars.len(),
            });
        }
        self.states.push(state);
        self.actions.push(action);
        self.rewards.push(reward);
        self.next_states.push(next_state);
        self.episodes.push(episode);
        self.extra_vars.extend_from_slice(extra_vars);
        Ok(())
    }
}

/// Iterator over [`HistoryRow`]s.
#[derive(Debug, Clone)]
pub struct Iter<'a, S, A> {
    history: &'a History<S, A>,
    index: usize,
}

impl<'a, S, A> Iterator for Iter<'a, S, A> {
    type Item = HistoryRow<'a, S, A>;

    fn next(&mut self) -> Option<Self::Item> {
        let h = self.history;
        let i = self.index;
        if i >= h.len() {
            return None;
        }
        self.index += 1;
        Some(HistoryRow {
            state: &h.states[i],
            action: &h.actions[i],
            reward: h.rewards[i],
            next_state: &h.next_states[i],
            extra_vars: h.extra_row(i),
            episode: h.episodes[i],
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.history.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl<'a, S, A> ExactSizeIterator for Iter<'a, S, A> {}

impl<'a, S, A> IntoIterator for &'a History<S, A> {
    type Item = HistoryRow<'a, S, A>;
    type IntoIter = Iter<'a, S, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regret_history() -> History<usize, usize> {
        let mut history = History::new();
        history.reserve(4, 1).unwrap();
        history.set_names(&["regret"]).unwrap();
        history.append(0, 1, 0.0, 1, &[0.5], 0).unwrap();
        history.append(1, 0, 1.0, 2, &[0.5], 0).unwrap();
        history.append(0, 0, 0.0, 1, &[0.25], 1).unwrap();
        history
    }

    #[test]
    fn append_and_iterate() {
        let history = regret_history();
        assert_eq!(history.len(), 3);
        let rows: Vec<_> = history.iter().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(*rows[1].state, 1);
        assert_eq!(*rows[1].next_state, 2);
        assert_eq!(rows[1].reward, 1.0);
        assert_eq!(rows[2].extra_vars, &[0.25]);
        assert_eq!(rows[2].episode, 1);
        assert_eq!(history.rewards(), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn extra_column_by_name() {
        let history = regret_history();
        let regret: Vec<_> = history.extra("regret").unwrap().collect();
        assert_eq!(regret, vec![0.5, 0.5, 0.25]);
        assert!(history.extra("value").is_none());
    }

    #[test]
    fn wrong_extra_count() {
        let mut history = regret_history();
        assert_eq!(
            history.append(0, 0, 0.0, 0, &[], 2),
            Err(HistoryError::ExtraVars {
                expected: 1,
                actual: 0
            })
        );
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn wrong_name_count() {
        let mut history: History<usize, usize> = History::new();
        history.reserve(1, 2).unwrap();
        assert_eq!(
            history.set_names(&["regret"]),
            Err(HistoryError::Names {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn reserve_keeps_records() {
        let mut history = regret_history();
        history.reserve(16, 1).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history.names(), &["regret".to_string()]);

        assert_eq!(
            history.reserve(4, 2),
            Err(HistoryError::ExtraVarsChanged {
                current: 1,
                requested: 2,
                len: 3
            })
        );
        assert_eq!(history.len(), 3);
        assert_eq!(history.n_extra(), 1);
        assert_eq!(history.names(), &["regret".to_string()]);
        let regret: Vec<_> = history.extra("regret").unwrap().collect();
        assert_eq!(regret, vec![0.5, 0.5, 0.25]);
    }

    #[test]
    fn reserve_changes_extra_count_when_empty() {
        let mut history = regret_history();
        history.clear();
        history.reserve(4, 2).unwrap();
        assert_eq!(history.n_extra(), 2);
        assert!(history.names().is_empty());
        history.set_names(&["regret", "value"]).unwrap();
        history.append(0, 0, 0.0, 1, &[0.1, 0.2], 0).unwrap();
        assert_eq!(history.iter().next().unwrap().extra_vars, &[0.1, 0.2]);
    }

    #[test]
    fn clear_keeps_names() {
        let mut history = regret_history();
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.names(), &["regret".to_string()]);
        history.append(3, 1, 2.0, 4, &[0.0], 5).unwrap();
        assert_eq!(history.iter().len(), 1);
    }

    #[test]
    fn generic_state_type() {
        let mut history: History<(usize, usize), char> = History::new();
        history.append((0, 0), 'r', 0.0, (0, 1), &[], 0).unwrap();
        let row = history.iter().next().unwrap();
        assert_eq!(row.next_state, &(0, 1));
        assert_eq!(row.action, &'r');
    }

    #[test]
    fn null_sink() {
        let mut sink = ();
        assert!(<() as HistorySink<usize, usize>>::reserve(&mut sink, 10, 1).is_ok());
        let result = <() as HistorySink<usize, usize>>::append(&mut sink, 0, 0, 1.0, 0, &[1.0, 2.0], 0);
        assert!(result.is_ok());
    }
}
