//! Seeded random number source
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use thiserror::Error;

/// Error from sampling a [`RandomSource`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RandomError {
    #[error("categorical distribution has no categories")]
    EmptyDistribution,
    #[error("no category has cumulative probability at least {0}")]
    NoCategory(f64),
    #[error("invalid uniform interval [{low}, {high})")]
    InvalidInterval { low: f64, high: f64 },
    #[error("standard deviation must be positive, got {0}")]
    NonPositiveStdDev(f64),
}

/// Pseudo-random number source that is fully determined by its seed.
///
/// Each instance owns its generator state; there is no shared global generator.
#[derive(Debug, Clone)]
pub struct RandomSource {
    seed: u64,
    rng: StdRng,
}

impl RandomSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The seed this source was created with.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// An independent source seeded at `seed + offset`.
    pub fn fork(&self, offset: u64) -> Self {
        Self::new(self.seed.wrapping_add(offset))
    }

    /// Sample an index from a categorical distribution.
    ///
    /// Returns the first index `i` such that `prob[0] + ... + prob[i] >= u`.
    ///
    /// # Args
    /// * `prob` - Non-negative category weights summing to 1.
    /// * `u` - Uniform sample in `[0, 1)`. Drawn from this source if `None`.
    ///
    /// # Errors
    /// Returns an error if `prob` is empty or if no cumulative weight reaches `u`.
    pub fn categorical<'a, I>(&mut self, prob: I, u: Option<f64>) -> Result<usize, RandomError>
    where
        I: IntoIterator<Item = &'a f64>,
    {
        let mut prob = prob.into_iter().peekable();
        if prob.peek().is_none() {
            return Err(RandomError::EmptyDistribution);
        }
        let u = match u {
            Some(u) => u,
            None => self.rng.gen::<f64>(),
        };
        let mut cumulative = 0.0;
        for (i, p) in prob.enumerate() {
            cumulative += p;
            if u <= cumulative {
                return Ok(i);
            }
        }
        Err(RandomError::NoCategory(u))
    }

    /// Sample uniformly from `[low, high)`.
    pub fn uniform_real(&mut self, low: f64, high: f64) -> Result<f64, RandomError> {
        if !(high >= low) {
            return Err(RandomError::InvalidInterval { low, high });
        }
        let u: f64 = self.rng.gen();
        Ok((high - low) * u + low)
    }

    /// Sample from a normal distribution with mean `mu` and standard deviation `sigma`.
    pub fn gaussian(&mut self, mu: f64, sigma: f64) -> Result<f64, RandomError> {
        if !(sigma > 0.0) {
            return Err(RandomError::NonPositiveStdDev(sigma));
        }
        let normal = Normal::new(mu, sigma).map_err(|_| RandomError::NonPositiveStdDev(sigma))?;
        Ok(normal.sample(&mut self.rng))
    }

    /// Mutable access to the underlying generator.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
