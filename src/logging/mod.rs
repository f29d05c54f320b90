//! Logging statistics from learning runs
pub mod cli;

pub use cli::CLILogger;

use enum_map::Enum;
use thiserror::Error;

/// Learning run events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum Event {
    /// A single environment step.
    Step,
    /// A complete episode of `horizon` steps.
    Episode,
    /// A complete learning run over many episodes.
    Run,
}

/// A value that can be logged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Loggable {
    /// Nothing. No data to log.
    /// Logging Nothing data may still produce a placeholder entry for the name.
    Nothing,
    /// A scalar value. Aggregate by taking means.
    Scalar(f64),
    /// A sample from a distribution over `0 .. size`
    IndexSample { value: usize, size: usize },
}

impl From<f64> for Loggable {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<f32> for Loggable {
    fn from(value: f32) -> Self {
        Self::Scalar(value.into())
    }
}

/// Log statistics from a learning run.
pub trait Logger {
    /// Log a value.
    ///
    /// # Args
    /// * `event` - The event associated with this value.
    /// * `name` - The name that identifies this value.
    /// * `value` - The value to log.
    ///
    /// # Returns
    /// May return an error if the logged value is structurally incompatible
    /// with previous values logged under the same name.
    fn log<'a>(&mut self, event: Event, name: &'a str, value: Loggable)
        -> Result<(), LogError<'a>>;

    /// Mark the end of an event.
    fn done(&mut self, event: Event);
}

/// Logger that does nothing
impl Logger for () {
    fn log<'a>(&mut self, _: Event, _: &'a str, _: Loggable) -> Result<(), LogError<'a>> {
        Ok(())
    }

    fn done(&mut self, _: Event) {}
}

impl<T: Logger + ?Sized> Logger for &mut T {
    fn log<'a>(
        &mut self,
        event: Event,
        name: &'a str,
        value: Loggable,
    ) -> Result<(), LogError<'a>> {
        T::log(self, event, name, value)
    }

    fn done(&mut self, event: Event) {
        T::done(self, event)
    }
}

/// A logged value is incompatible with earlier values of the same name.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("\"{name}\": incompatible value {value:?}, expected {expected}")]
pub struct LogError<'a> {
    name: &'a str,
    value: Loggable,
    expected: String,
}

impl<'a> LogError<'a> {
    pub fn new(name: &'a str, value: Loggable, expected: String) -> Self {
        Self {
            name,
            value,
            expected,
        }
    }

    pub const fn name(&self) -> &'a str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_logger_accepts_anything() {
        let mut logger = ();
        assert!(logger.log(Event::Step, "x", Loggable::Scalar(1.0)).is_ok());
        assert!(logger
            .log(Event::Step, "x", Loggable::IndexSample { value: 0, size: 2 })
            .is_ok());
        logger.done(Event::Step);
    }

    #[test]
    fn log_error_display() {
        let error = LogError::new("reward", Loggable::Nothing, "Scalar".into());
        assert_eq!(
            error.to_string(),
            "\"reward\": incompatible value Nothing, expected Scalar"
        );
        assert_eq!(error.name(), "reward");
    }
}
