// Extremal and optimal itinerary selection
use crate::itinerary::Itinerary;
use crate::metrics::{total_durations, total_prices, MetricError};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("Operation requires at least one itinerary")]
    EmptyInput,

    #[error("Invalid selection mode: {0}")]
    InvalidMode(String),

    #[error("Invalid selection metric: {0}")]
    InvalidMetric(String),

    #[error(transparent)]
    Metric(#[from] MetricError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Price,
    Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Min,
    Max,
}

impl FromStr for Metric {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "price" => Ok(Metric::Price),
            "duration" => Ok(Metric::Duration),
            _ => Err(SelectionError::InvalidMetric(s.to_string())),
        }
    }
}

impl FromStr for Mode {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "min" => Ok(Mode::Min),
            "max" => Ok(Mode::Max),
            _ => Err(SelectionError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Price => write!(f, "price"),
            Metric::Duration => write!(f, "duration"),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Min => write!(f, "min"),
            Mode::Max => write!(f, "max"),
        }
    }
}

/// Keeps every itinerary whose metric equals the extremal value under `mode`.
/// Ties are all kept, in their original order.
pub fn select_by<'a, I>(
    metric: Metric,
    itineraries: I,
    mode: Mode,
) -> Result<Vec<&'a Itinerary>, SelectionError>
where
    I: IntoIterator<Item = &'a Itinerary>,
{
    let itineraries: Vec<&Itinerary> = itineraries.into_iter().collect();
    if itineraries.is_empty() {
        return Err(SelectionError::EmptyInput);
    }

    let total = itineraries.len();
    let selected = match metric {
        Metric::Price => {
            let prices = total_prices(&itineraries)?;
            retain_extremes(itineraries, &prices, mode)
        }
        Metric::Duration => {
            let seconds = whole_seconds(&itineraries);
            retain_extremes(itineraries, &seconds, mode)
        }
    };

    debug!(
        "Selected {} of {} itineraries by {} {}",
        selected.len(),
        total,
        mode,
        metric
    );
    Ok(selected)
}

/// Two-stage selection: keep itineraries no slower than the mean duration,
/// then the cheapest among those. The result is never empty for non-empty
/// input since the fastest itinerary is always at or below the mean.
pub fn select_optimal<'a, I>(itineraries: I) -> Result<Vec<&'a Itinerary>, SelectionError>
where
    I: IntoIterator<Item = &'a Itinerary>,
{
    let itineraries: Vec<&Itinerary> = itineraries.into_iter().collect();
    if itineraries.is_empty() {
        return Err(SelectionError::EmptyInput);
    }

    // secs <= total / count, kept in integers
    let seconds = whole_seconds(&itineraries);
    let count = seconds.len() as i128;
    let total: i128 = seconds.iter().copied().map(i128::from).sum();

    let at_most_mean: Vec<&Itinerary> = itineraries
        .into_iter()
        .zip(&seconds)
        .filter(|(_, secs)| i128::from(**secs) * count <= total)
        .map(|(itinerary, _)| itinerary)
        .collect();

    select_by(Metric::Price, at_most_mean, Mode::Min)
}

// Durations compared at whole-second precision.
fn whole_seconds(itineraries: &[&Itinerary]) -> Vec<i64> {
    total_durations(itineraries)
        .iter()
        .map(|duration| duration.num_seconds())
        .collect()
}

fn retain_extremes<'a, K: Ord>(
    itineraries: Vec<&'a Itinerary>,
    values: &[K],
    mode: Mode,
) -> Vec<&'a Itinerary> {
    let extreme = match mode {
        Mode::Min => values.iter().min(),
        Mode::Max => values.iter().max(),
    };

    match extreme {
        Some(extreme) => itineraries
            .into_iter()
            .zip(values)
            .filter(|(_, value)| *value == extreme)
            .map(|(itinerary, _)| itinerary)
            .collect(),
        None => Vec::new(),
    }
}
