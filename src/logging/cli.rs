//! Command-line logger
use super::{Event, LogError, Loggable, Logger};
use enum_map::{enum_map, EnumMap};
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;
use std::ops::Drop;
use std::time::{Duration, Instant};
use yansi::Paint;

/// Logger that writes summaries to stdout.
///
/// Values are aggregated per event: scalars by their mean and index samples by their
/// empirical distribution. A summary is displayed whenever an event completes
/// at least `display_period` after the previous summary, and once more on drop.
pub struct CLILogger {
    events: EnumMap<Event, EventLog>,

    display_period: Duration,
    last_display_time: Instant,

    average_between_displays: bool,
}

impl CLILogger {
    pub fn new(display_period: Duration, average_between_displays: bool) -> Self {
        Self {
            events: enum_map! { _ => EventLog::new() },
            display_period,
            last_display_time: Instant::now(),
            average_between_displays,
        }
    }

    /// Display the summary and clear all stored data.
    pub fn display(&mut self) {
        println!();
        for (event, event_log) in self.events.iter_mut() {
            let summary_size = event_log.index - event_log.summary_start_index;
            if summary_size == 0 {
                continue;
            }

            let title = if self.average_between_displays {
                format!(
                    "{:?}s {} - {}",
                    event,
                    event_log.summary_start_index,
                    event_log.index - 1
                )
            } else {
                format!("{:?} {}", event, event_log.index - 1)
            };
            let per_event =
                event_log.summary_duration / u32::try_from(summary_size).unwrap_or(u32::MAX);
            println!(
                "==== {} ({} / event) ====",
                Paint::fixed(111, title),
                Paint::fixed(253, format!("{:?}", per_event))
            );

            for (name, aggregator) in &mut event_log.aggregators {
                println!("{:<24} {}", Paint::fixed(35, name), aggregator);
                aggregator.clear()
            }
            event_log.summary_start_index = event_log.index;
        }
        self.last_display_time = Instant::now();
    }
}

impl Default for CLILogger {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), true)
    }
}

impl fmt::Debug for CLILogger {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CLILogger")
            .field("display_period", &self.display_period)
            .field("average_between_displays", &self.average_between_displays)
            .finish()
    }
}

impl Logger for CLILogger {
    fn log<'a>(
        &mut self,
        event: Event,
        name: &'a str,
        value: Loggable,
    ) -> Result<(), LogError<'a>> {
        // Separate get() / insert() calls so that the name is only allocated
        // the first time it is logged.
        let aggregators = &mut self.events[event].aggregators;
        if let Some(aggregator) = aggregators.get_mut(name) {
            if let Err((value, expected)) = aggregator.update(value) {
                return Err(LogError::new(name, value, expected));
            }
        } else {
            let aggregator = Aggregator::new(value)
                .map_err(|(value, expected)| LogError::new(name, value, expected))?;
            aggregators.insert(name.into(), aggregator);
        }
        Ok(())
    }

    fn done(&mut self, event: Event) {
        let event_info = &mut self.events[event];
        event_info.index += 1;

        for aggregator in event_info.aggregators.values_mut() {
            aggregator.commit()
        }

        let time_since_display = self.last_display_time.elapsed();
        event_info.summary_duration = time_since_display;
        if time_since_display < self.display_period {
            return;
        }

        self.display();
    }
}

impl Drop for CLILogger {
    fn drop(&mut self) {
        // Flush anything not yet displayed
        self.display();
    }
}

struct EventLog {
    /// Global index for this event
    index: u64,
    /// Value of `index` at the start of this summary period
    summary_start_index: u64,
    /// Duration of this summary period to the most recent update
    summary_duration: Duration,
    /// An aggregator for each log entry.
    aggregators: BTreeMap<String, Aggregator>,
}

impl EventLog {
    #[allow(clippy::missing_const_for_fn)] // BTreeMap const new not stabilized
    fn new() -> Self {
        Self {
            index: 0,
            summary_start_index: 0,
            summary_duration: Duration::new(0, 0),
            aggregators: BTreeMap::new(),
        }
    }
}

#[derive(Debug)]
enum Aggregator {
    /// Aggregates nothing
    Nothing,
    ScalarMean {
        accumulator: MeanAccumulator,
        pending: Option<f64>,
    },
    IndexDistribution {
        accumulator: IndexDistributionAccumulator,
        pending: Option<usize>,
    },
}
use Aggregator::*;

impl Aggregator {
    /// Create a new aggregator from a logged value.
    fn new(value: Loggable) -> Result<Self, (Loggable, String)> {
        Ok(match value {
            Loggable::Nothing => Nothing,
            Loggable::Scalar(x) => ScalarMean {
                accumulator: MeanAccumulator::new(),
                pending: Some(x),
            },
            Loggable::IndexSample { size, .. } => {
                let accumulator = IndexDistributionAccumulator::new(size);
                let pending = Some(accumulator.prepare(value)?);
                IndexDistribution {
                    accumulator,
                    pending,
                }
            }
        })
    }

    /// Update an aggregator with a logged value within an event.
    ///
    /// Returns Err((value, expected)) if the value is incompatible with this aggregator.
    fn update(&mut self, value: Loggable) -> Result<(), (Loggable, String)> {
        match self {
            Nothing => match value {
                Loggable::Nothing => {}
                _ => return Err((value, "Nothing".into())),
            },
            ScalarMean {
                accumulator,
                pending,
            } => *pending = Some(accumulator.prepare(value)?),
            IndexDistribution {
                accumulator,
                pending,
            } => *pending = Some(accumulator.prepare(value)?),
        };
        Ok(())
    }

    /// Commit the pending values into the aggregate.
    fn commit(&mut self) {
        match self {
            Nothing => {}
            ScalarMean {
                accumulator,
                pending,
            } => {
                if let Some(value) = pending.take() {
                    accumulator.insert(value)
                }
            }
            IndexDistribution {
                accumulator,
                pending,
            } => {
                if let Some(value) = pending.take() {
                    accumulator.insert(value)
                }
            }
        }
    }

    /// Clear the aggregated values (but not the pending values)
    fn clear(&mut self) {
        match self {
            Nothing => {}
            ScalarMean { accumulator, .. } => accumulator.clear(),
            IndexDistribution { accumulator, .. } => accumulator.clear(),
        }
    }
}

/// Display the committed aggregated value.
impl fmt::Display for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Nothing => write!(f, "Nothing"),
            ScalarMean { accumulator, .. } => accumulator.fmt(f),
            IndexDistribution { accumulator, .. } => accumulator.fmt(f),
        }
    }
}

/// Accumulate statistics of a loggable.
trait Accumulator: 'static + fmt::Display {
    /// Type for prepared values.
    type Prepared;

    /// Prepare a value to be inserted into the accumulator.
    ///
    /// Used when a value is logged during an event.
    fn prepare(&self, value: Loggable) -> Result<Self::Prepared, (Loggable, String)>;

    /// Insert a new prepared value into the accumulation.
    ///
    /// Used at the end of an event.
    fn insert(&mut self, value: Self::Prepared);

    /// Clear the accumulated values.
    fn clear(&mut self);
}

#[derive(Debug)]
struct MeanAccumulator {
    sum: f64,
    count: u64,
}

impl MeanAccumulator {
    const fn new() -> Self {
        Self { sum: 0.0, count: 0 }
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

impl Accumulator for MeanAccumulator {
    type Prepared = f64;

    fn prepare(&self, value: Loggable) -> Result<Self::Prepared, (Loggable, String)> {
        if let Loggable::Scalar(x) = value {
            Ok(x)
        } else {
            Err((value, "Scalar".into()))
        }
    }

    fn insert(&mut self, value: Self::Prepared) {
        self.sum += value;
        self.count += 1;
    }

    fn clear(&mut self) {
        self.sum = 0.0;
        self.count = 0;
    }
}

impl fmt::Display for MeanAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.mean() {
            Some(mean) => write!(f, "{}", mean),
            None => write!(f, "None"),
        }
    }
}

#[derive(Debug)]
struct IndexDistributionAccumulator {
    counts: Vec<u64>,
}

impl IndexDistributionAccumulator {
    fn new(size: usize) -> Self {
        Self {
            counts: vec![0; size],
        }
    }
}

impl Accumulator for IndexDistributionAccumulator {
    type Prepared = usize;

    fn prepare(&self, value: Loggable) -> Result<Self::Prepared, (Loggable, String)> {
        match value {
            Loggable::IndexSample { value: index, size }
                if self.counts.len() == size && index < size =>
            {
                Ok(index)
            }
            v => Err((v, format!("IndexSample{{size: {}}}", self.counts.len()))),
        }
    }

    fn insert(&mut self, value: Self::Prepared) {
        self.counts[value] += 1;
    }

    fn clear(&mut self) {
        for count in &mut self.counts {
            *count = 0;
        }
    }
}

impl fmt::Display for IndexDistributionAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let total: u64 = self.counts.iter().sum();
        if total == 0 {
            return write!(f, "None");
        }
        write!(f, "[")?;
        for (i, c) in self.counts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:.3}", (*c as f64) / (total as f64))?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_logger() -> CLILogger {
        CLILogger::new(Duration::from_secs(3600), true)
    }

    #[test]
    fn scalar_mean() {
        let mut logger = quiet_logger();
        for x in [1.0_f64, 2.0, 6.0] {
            logger.log(Event::Episode, "reward", x.into()).unwrap();
            logger.done(Event::Episode);
        }
        let aggregator = &logger.events[Event::Episode].aggregators["reward"];
        assert_eq!(aggregator.to_string(), "3");
        assert_eq!(logger.events[Event::Episode].index, 3);
    }

    #[test]
    fn last_value_within_event_wins() {
        let mut logger = quiet_logger();
        logger.log(Event::Step, "x", Loggable::Scalar(1.0)).unwrap();
        logger.log(Event::Step, "x", Loggable::Scalar(5.0)).unwrap();
        logger.done(Event::Step);
        assert_eq!(
            logger.events[Event::Step].aggregators["x"].to_string(),
            "5"
        );
    }

    #[test]
    fn index_distribution() {
        let mut logger = quiet_logger();
        for value in [0, 1, 1, 1] {
            logger
                .log(Event::Step, "action", Loggable::IndexSample { value, size: 2 })
                .unwrap();
            logger.done(Event::Step);
        }
        assert_eq!(
            logger.events[Event::Step].aggregators["action"].to_string(),
            "[0.250, 0.750]"
        );
    }

    #[test]
    fn incompatible_value() {
        let mut logger = quiet_logger();
        logger.log(Event::Run, "regret", Loggable::Scalar(1.0)).unwrap();
        let error = logger
            .log(Event::Run, "regret", Loggable::Nothing)
            .unwrap_err();
        assert_eq!(error, LogError::new("regret", Loggable::Nothing, "Scalar".into()));

        logger
            .log(Event::Run, "arm", Loggable::IndexSample { value: 0, size: 3 })
            .unwrap();
        assert!(logger
            .log(Event::Run, "arm", Loggable::IndexSample { value: 0, size: 4 })
            .is_err());
        assert!(logger
            .log(Event::Run, "arm", Loggable::IndexSample { value: 3, size: 3 })
            .is_err());
        assert!(logger
            .log(Event::Run, "new_arm", Loggable::IndexSample { value: 2, size: 2 })
            .is_err());
    }

    #[test]
    fn events_are_separate() {
        let mut logger = quiet_logger();
        logger.log(Event::Step, "reward", Loggable::Scalar(1.0)).unwrap();
        logger
            .log(Event::Episode, "reward", Loggable::Nothing)
            .unwrap();
        logger.done(Event::Step);
        logger.done(Event::Episode);
        logger.display();
        assert_eq!(logger.events[Event::Step].summary_start_index, 1);
    }
}
