// Per-itinerary price and duration metrics
use crate::itinerary::{FlightLeg, Itinerary};
use chrono::Duration;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    #[error("Invalid numeric format: {value:?}")]
    InvalidNumericFormat { value: String },

    #[error("Total price overflowed while adding {value:?}")]
    Overflow { value: String },
}

/// Charge type whose prices make up an itinerary's total.
pub const TOTAL_AMOUNT: &str = "TotalAmount";

/// Sum of all `TotalAmount` service charges; zero when there are none.
pub fn total_price(itinerary: &Itinerary) -> Result<Decimal, MetricError> {
    itinerary
        .pricing
        .service_charges
        .iter()
        .filter(|charge| charge.charge_type == TOTAL_AMOUNT)
        .try_fold(Decimal::ZERO, |total, charge| {
            let price = Decimal::from_str(&charge.price).map_err(|_| {
                MetricError::InvalidNumericFormat {
                    value: charge.price.clone(),
                }
            })?;
            total.checked_add(price).ok_or_else(|| MetricError::Overflow {
                value: charge.price.clone(),
            })
        })
}

/// Onward travel window plus, when present, the return travel window.
/// Inconsistent timestamps yield a negative duration rather than an error.
pub fn total_duration(itinerary: &Itinerary) -> Duration {
    let onward = travel_window(&itinerary.onward_legs);
    if itinerary.return_legs.is_empty() {
        onward
    } else {
        onward + travel_window(&itinerary.return_legs)
    }
}

fn travel_window(legs: &[FlightLeg]) -> Duration {
    match (legs.first(), legs.last()) {
        (Some(first), Some(last)) => last.arrival_time - first.departure_time,
        _ => Duration::zero(),
    }
}

// Index `i` of each list below belongs to `itineraries[i]`.

pub fn total_prices(itineraries: &[&Itinerary]) -> Result<Vec<Decimal>, MetricError> {
    itineraries.iter().map(|itinerary| total_price(itinerary)).collect()
}

pub fn total_durations(itineraries: &[&Itinerary]) -> Vec<Duration> {
    itineraries.iter().map(|itinerary| total_duration(itinerary)).collect()
}
