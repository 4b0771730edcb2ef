use chrono::NaiveDateTime;
use serde::Serialize;

/// Timestamp layout used by the vendor schema, e.g. `2018-10-22T0005`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H%M";

// Parsed itinerary search response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItinerarySearchResult {
    pub generated_return_itineraries: bool,
    pub request_time: String,
    pub response_time: String,
    pub request_id: String,
    pub itineraries: Vec<Itinerary>,
}

impl ItinerarySearchResult {
    /// Builds a serializable view that shares this result's header but only
    /// lists the given itineraries.
    pub fn view<'a>(&'a self, itineraries: Vec<&'a Itinerary>) -> ItineraryView<'a> {
        ItineraryView {
            generated_return_itineraries: self.generated_return_itineraries,
            request_time: &self.request_time,
            response_time: &self.response_time,
            request_id: &self.request_id,
            itineraries,
        }
    }

    pub fn view_all(&self) -> ItineraryView<'_> {
        self.view(self.itineraries.iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    pub onward_legs: Vec<FlightLeg>,
    pub return_legs: Vec<FlightLeg>,
    pub pricing: Pricing,
}

impl Itinerary {
    pub fn has_return(&self) -> bool {
        !self.return_legs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightLeg {
    pub carrier_id: String,
    pub carrier_name: String,
    pub flight_number: String,
    pub source: String,
    pub destination: String,
    #[serde(with = "vendor_timestamp")]
    pub departure_time: NaiveDateTime,
    #[serde(with = "vendor_timestamp")]
    pub arrival_time: NaiveDateTime,
    pub class: String,
    pub number_of_stops: String,
    pub fare_basis: String,
    pub warning_text: String,
    pub ticket_type: String,
}

impl FlightLeg {
    /// Date portion of the departure timestamp (`YYYY-MM-DD`).
    pub fn departure_date(&self) -> String {
        self.departure_time.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pricing {
    pub currency: String,
    pub service_charges: Vec<ServiceCharge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCharge {
    #[serde(rename = "type")]
    pub passenger_type: String,
    pub charge_type: String,
    pub price: String,
}

/// Filtered, borrowed counterpart of [`ItinerarySearchResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItineraryView<'a> {
    pub generated_return_itineraries: bool,
    pub request_time: &'a str,
    pub response_time: &'a str,
    pub request_id: &'a str,
    pub itineraries: Vec<&'a Itinerary>,
}

mod vendor_timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::Serializer;

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }
}
