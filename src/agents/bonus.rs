//! Exploration bonuses
use super::BuildAgentError;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An additive exploration bonus derived from a concentration inequality.
pub trait ExplorationBonus {
    /// Whether the bonus at stage `h` depends on the value estimates at stage `h + 1`.
    ///
    /// If false, the bonus is the same at every stage.
    fn uses_next_values(&self) -> bool;

    /// Unscaled bonus of a state-action pair.
    ///
    /// # Args
    /// * `horizon` - Episode length.
    /// * `visits` - Number of visits to the state-action pair, at least 1.
    /// * `log_term` - Confidence term `L`; see [`log_term`].
    /// * `next_value_variance` - Variance of the next-stage values under the empirical
    ///     transition distribution. Ignored unless [`ExplorationBonus::uses_next_values`].
    fn compute(&self, horizon: usize, visits: u64, log_term: f64, next_value_variance: f64)
        -> f64;
}

/// Kind of UCBVI exploration bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BonusType {
    /// `7 H sqrt(L / n)`
    Hoeffding,
    /// `sqrt(8 L var / n) + 14 L H / (3 n) + sqrt(8 H² / n)`
    Bernstein,
}

impl Default for BonusType {
    fn default() -> Self {
        Self::Bernstein
    }
}

impl fmt::Display for BonusType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Hoeffding => write!(f, "hoeffding"),
            Self::Bernstein => write!(f, "bernstein"),
        }
    }
}

impl FromStr for BonusType {
    type Err = BuildAgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hoeffding" => Ok(Self::Hoeffding),
            "bernstein" => Ok(Self::Bernstein),
            _ => Err(BuildAgentError::UnknownBonus(s.into())),
        }
    }
}

impl ExplorationBonus for BonusType {
    fn uses_next_values(&self) -> bool {
        matches!(self, Self::Bernstein)
    }

    fn compute(
        &self,
        horizon: usize,
        visits: u64,
        log_term: f64,
        next_value_variance: f64,
    ) -> f64 {
        let h = horizon as f64;
        let n = visits as f64;
        match self {
            Self::Hoeffding => 7.0 * h * (log_term / n).sqrt(),
            Self::Bernstein => {
                (8.0 * log_term * next_value_variance / n).sqrt()
                    + 14.0 * log_term * h / (3.0 * n)
                    + (8.0 * h * h / n).sqrt()
            }
        }
    }
}

/// Confidence term `L = ln(5 S A n / delta)` of a state-action pair visited `n` times.
pub fn log_term(num_states: usize, num_actions: usize, visits: u64, delta: f64) -> f64 {
    (5.0 * num_states as f64 * num_actions as f64 * visits as f64 / delta).ln()
}

/// Variance of `values` under the distribution `transitions`.
pub fn next_value_variance(transitions: ArrayView1<f64>, values: ArrayView1<f64>) -> f64 {
    let mean: f64 = transitions.iter().zip(values).map(|(p, v)| p * v).sum();
    transitions
        .iter()
        .zip(values)
        .map(|(p, v)| p * (v - mean).powi(2))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;
    use rstest::rstest;

    #[rstest]
    #[case("hoeffding", BonusType::Hoeffding)]
    #[case("bernstein", BonusType::Bernstein)]
    fn parse(#[case] name: &str, #[case] expected: BonusType) {
        assert_eq!(name.parse::<BonusType>().unwrap(), expected);
        assert_eq!(expected.to_string(), name);
    }

    #[rstest]
    #[case("Hoeffding")]
    #[case("ucb")]
    #[case("")]
    fn parse_unknown(#[case] name: &str) {
        assert!(matches!(
            name.parse::<BonusType>(),
            Err(BuildAgentError::UnknownBonus(s)) if s == name
        ));
    }

    #[test]
    fn serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&BonusType::Hoeffding).unwrap(),
            "\"hoeffding\""
        );
        assert_eq!(
            serde_json::from_str::<BonusType>("\"bernstein\"").unwrap(),
            BonusType::Bernstein
        );
        assert!(serde_json::from_str::<BonusType>("\"other\"").is_err());
    }

    #[test]
    fn log_term_value() {
        let expected = (5.0_f64 * 3.0 * 2.0 * 4.0 / 0.1).ln();
        assert_eq!(log_term(3, 2, 4, 0.1), expected);
    }

    #[test]
    fn hoeffding_formula() {
        let bonus = BonusType::Hoeffding.compute(5, 4, 2.0, 100.0);
        assert!((bonus - 7.0 * 5.0 * (0.5_f64).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn bernstein_formula() {
        let bonus = BonusType::Bernstein.compute(3, 2, 1.5, 0.25);
        let expected =
            (8.0_f64 * 1.5 * 0.25 / 2.0).sqrt() + 14.0 * 1.5 * 3.0 / 6.0 + (8.0_f64 * 9.0 / 2.0).sqrt();
        assert!((bonus - expected).abs() < 1e-12);
    }

    #[test]
    fn only_bernstein_uses_next_values() {
        assert!(BonusType::Bernstein.uses_next_values());
        assert!(!BonusType::Hoeffding.uses_next_values());
    }

    #[test]
    fn variance() {
        let p = arr1(&[0.5, 0.0, 0.5]);
        let v = arr1(&[1.0, 10.0, 3.0]);
        assert_eq!(next_value_variance(p.view(), v.view()), 1.0);
        let point = arr1(&[0.0, 1.0, 0.0]);
        assert_eq!(next_value_variance(point.view(), v.view()), 0.0);
    }
}
