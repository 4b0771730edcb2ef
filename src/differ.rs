// Field-level comparison of two itinerary search results
use crate::itinerary::{Itinerary, ItinerarySearchResult};
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiffError {
    #[error("Both results need at least one itinerary to compare")]
    EmptyInput,
}

/// One side of a [`Diff`]. Only fields that differ from the other side are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSide {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_itinerary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub charge_types: Option<Vec<String>>,
}

impl DiffSide {
    fn describe(generated_return_itineraries: bool, itinerary: &Itinerary) -> Self {
        let charge_types: BTreeSet<&str> = itinerary
            .pricing
            .service_charges
            .iter()
            .map(|charge| charge.passenger_type.as_str())
            .collect();

        Self {
            return_itinerary: Some(generated_return_itineraries),
            source: itinerary.onward_legs.first().map(|leg| leg.source.clone()),
            destination: itinerary.onward_legs.last().map(|leg| leg.destination.clone()),
            departure_date: itinerary.onward_legs.first().map(|leg| leg.departure_date()),
            currency: Some(itinerary.pricing.currency.clone()),
            charge_types: Some(charge_types.into_iter().map(str::to_string).collect()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diff {
    pub first: DiffSide,
    pub second: DiffSide,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.first.is_empty() && self.second.is_empty()
    }

    pub fn swapped(self) -> Self {
        Self {
            first: self.second,
            second: self.first,
        }
    }
}

/// Compares the first itinerary of each result on the return flag, the
/// onward origin and final destination, the departure date, the pricing
/// currency and the set of passenger types charged for.
pub fn difference(
    a: &ItinerarySearchResult,
    b: &ItinerarySearchResult,
) -> Result<Diff, DiffError> {
    let (Some(first_a), Some(first_b)) = (a.itineraries.first(), b.itineraries.first()) else {
        return Err(DiffError::EmptyInput);
    };

    let mut first = DiffSide::describe(a.generated_return_itineraries, first_a);
    let mut second = DiffSide::describe(b.generated_return_itineraries, first_b);

    clear_if_equal(&mut first.return_itinerary, &mut second.return_itinerary);
    clear_if_equal(&mut first.source, &mut second.source);
    clear_if_equal(&mut first.destination, &mut second.destination);
    clear_if_equal(&mut first.departure_date, &mut second.departure_date);
    clear_if_equal(&mut first.currency, &mut second.currency);
    clear_if_equal(&mut first.charge_types, &mut second.charge_types);

    Ok(Diff { first, second })
}

fn clear_if_equal<T: PartialEq>(first: &mut Option<T>, second: &mut Option<T>) {
    if first == second {
        *first = None;
        *second = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itinerary::fixtures::{charge, itinerary, leg, result};
    use crate::search_parser::{FlightSearchProcessor, SAMPLE_ONE_WAY_PATH, SAMPLE_ROUND_TRIP_PATH};
    use serde_json::json;

    fn single(destination: &str) -> ItinerarySearchResult {
        let mut itinerary = itinerary("100.00", "2018-10-22T0005", "2018-10-22T0445");
        itinerary.onward_legs = vec![leg("DXB", destination, "2018-10-22T0005", "2018-10-22T0445")];
        result(vec![itinerary])
    }

    #[test]
    fn test_result_compared_to_itself_is_empty() {
        let a = single("BKK");
        let diff = difference(&a, &a).unwrap();

        assert!(diff.is_empty());
        assert_eq!(
            serde_json::to_value(&diff).unwrap(),
            json!({"first": {}, "second": {}})
        );
    }

    #[test]
    fn test_destination_only_difference() {
        let diff = difference(&single("BKK"), &single("DEL")).unwrap();

        assert_eq!(
            serde_json::to_value(&diff).unwrap(),
            json!({"first": {"destination": "BKK"}, "second": {"destination": "DEL"}})
        );
    }

    #[test]
    fn test_difference_is_symmetric() {
        let a = FlightSearchProcessor::new()
            .process_file(SAMPLE_ONE_WAY_PATH)
            .unwrap();
        let b = FlightSearchProcessor::new()
            .process_file(SAMPLE_ROUND_TRIP_PATH)
            .unwrap();

        let forward = difference(&a, &b).unwrap();
        let backward = difference(&b, &a).unwrap();
        assert_eq!(forward, backward.swapped());
    }

    #[test]
    fn test_samples_differ_on_return_date_and_passengers() {
        let one_way = FlightSearchProcessor::new()
            .process_file(SAMPLE_ONE_WAY_PATH)
            .unwrap();
        let round_trip = FlightSearchProcessor::new()
            .process_file(SAMPLE_ROUND_TRIP_PATH)
            .unwrap();

        let diff = difference(&one_way, &round_trip).unwrap();
        assert_eq!(
            serde_json::to_value(&diff).unwrap(),
            json!({
                "first": {
                    "return_itinerary": false,
                    "departure_date": "2018-10-22",
                    "type": ["SingleAdult"]
                },
                "second": {
                    "return_itinerary": true,
                    "departure_date": "2018-10-27",
                    "type": ["SingleAdult", "SingleChild", "SingleInfant"]
                }
            })
        );
    }

    #[test]
    fn test_charge_types_compare_as_sorted_sets() {
        let mut a = single("BKK");
        a.itineraries[0].pricing.service_charges = vec![
            charge("SingleChild", "TotalAmount", "10"),
            charge("SingleAdult", "TotalAmount", "20"),
            charge("SingleAdult", "BaseFare", "15"),
        ];
        let mut b = single("BKK");
        b.itineraries[0].pricing.service_charges = vec![
            charge("SingleAdult", "TotalAmount", "20"),
            charge("SingleChild", "TotalAmount", "10"),
        ];

        assert!(difference(&a, &b).unwrap().is_empty());
    }

    #[test]
    fn test_only_first_itinerary_is_compared() {
        let a = single("BKK");
        let mut b = single("BKK");
        b.itineraries
            .push(itinerary("999.00", "2019-01-01T0000", "2019-01-01T0100"));
        b.itineraries[1].pricing.currency = "USD".to_string();

        assert!(difference(&a, &b).unwrap().is_empty());
    }

    #[test]
    fn test_empty_result_is_rejected() {
        let empty = result(Vec::new());
        assert_eq!(difference(&empty, &single("BKK")), Err(DiffError::EmptyInput));
        assert_eq!(difference(&single("BKK"), &empty), Err(DiffError::EmptyInput));
    }
}
