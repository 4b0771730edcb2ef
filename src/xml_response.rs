use crate::itinerary::{
    FlightLeg, Itinerary, ItinerarySearchResult, Pricing, ServiceCharge, TIMESTAMP_FORMAT,
};
use crate::search_parser::ParseError;
use chrono::NaiveDateTime;
use serde::Deserialize;

// Structures for XML deserialization. Fields without a serde default are
// required: a missing element or attribute fails the whole document.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[serde(rename = "AirFareSearchResponse")]
pub struct XmlAirFareSearchResponse {
    #[serde(rename = "@RequestTime")]
    pub request_time: String,
    #[serde(rename = "@ResponseTime")]
    pub response_time: String,
    pub request_id: String,
    pub priced_itineraries: XmlPricedItineraries,
}

impl XmlAirFareSearchResponse {
    /// Converts the raw document into the record model. `expect_return` comes
    /// from the text probe run before deserialization; when it is set every
    /// itinerary group must carry a `ReturnPricedItinerary`.
    pub fn into_search_result(
        self,
        expect_return: bool,
    ) -> Result<ItinerarySearchResult, ParseError> {
        let itineraries = self
            .priced_itineraries
            .flights
            .into_iter()
            .enumerate()
            .map(|(index, group)| {
                group
                    .into_itinerary(expect_return)
                    .map_err(|e| within_itinerary(index, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ItinerarySearchResult {
            generated_return_itineraries: expect_return,
            request_time: self.request_time,
            response_time: self.response_time,
            request_id: self.request_id.trim().to_string(),
            itineraries,
        })
    }
}

fn within_itinerary(index: usize, err: ParseError) -> ParseError {
    match err {
        ParseError::MalformedDocument(msg) => {
            ParseError::MalformedDocument(format!("itinerary #{}: {}", index, msg))
        }
        other => other,
    }
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XmlPricedItineraries {
    #[serde(rename = "Flights", default)]
    pub flights: Vec<XmlItineraryGroup>,
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XmlItineraryGroup {
    pub onward_priced_itinerary: XmlPricedItinerary,
    pub return_priced_itinerary: Option<XmlPricedItinerary>,
    pub pricing: XmlPricing,
}

impl XmlItineraryGroup {
    fn into_itinerary(self, expect_return: bool) -> Result<Itinerary, ParseError> {
        let onward_legs = self.onward_priced_itinerary.into_legs("OnwardPricedItinerary")?;

        let return_legs = match (expect_return, self.return_priced_itinerary) {
            (true, Some(itinerary)) => itinerary.into_legs("ReturnPricedItinerary")?,
            (true, None) => {
                return Err(ParseError::MalformedDocument(
                    "document announces return itineraries but `ReturnPricedItinerary` is missing"
                        .to_string(),
                ))
            }
            (false, _) => Vec::new(),
        };

        Ok(Itinerary {
            onward_legs,
            return_legs,
            pricing: self.pricing.try_into()?,
        })
    }
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XmlPricedItinerary {
    pub flights: XmlFlights,
}

impl XmlPricedItinerary {
    fn into_legs(self, container: &str) -> Result<Vec<FlightLeg>, ParseError> {
        if self.flights.flights.is_empty() {
            return Err(ParseError::MalformedDocument(format!(
                "`{}` contains no `Flight` elements",
                container
            )));
        }

        self.flights
            .flights
            .into_iter()
            .map(FlightLeg::try_from)
            .collect()
    }
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XmlFlights {
    #[serde(rename = "Flight", default)]
    pub flights: Vec<XmlFlight>,
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XmlFlight {
    pub carrier: XmlCarrier,
    pub flight_number: String,
    pub source: String,
    pub destination: String,
    pub departure_time_stamp: String,
    pub arrival_time_stamp: String,
    pub class: String,
    pub number_of_stops: String,
    pub fare_basis: XmlText,
    pub warning_text: XmlText,
    pub ticket_type: String,
}

impl TryFrom<XmlFlight> for FlightLeg {
    type Error = ParseError;

    fn try_from(item: XmlFlight) -> Result<Self, Self::Error> {
        Ok(FlightLeg {
            departure_time: parse_timestamp("DepartureTimeStamp", &item.departure_time_stamp)?,
            arrival_time: parse_timestamp("ArrivalTimeStamp", &item.arrival_time_stamp)?,
            carrier_id: item.carrier.id,
            carrier_name: item.carrier.name.trim().to_string(),
            flight_number: item.flight_number,
            source: item.source,
            destination: item.destination,
            class: item.class,
            number_of_stops: item.number_of_stops,
            fare_basis: item.fare_basis.value.trim().to_string(),
            warning_text: item.warning_text.value.trim().to_string(),
            ticket_type: item.ticket_type,
        })
    }
}

fn parse_timestamp(field: &str, value: &str) -> Result<NaiveDateTime, ParseError> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).map_err(|e| {
        ParseError::MalformedDocument(format!("`{}` value {:?}: {}", field, value, e))
    })
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct XmlCarrier {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "$text", default)]
    pub name: String,
}

/// Text-only element that is required to be present but may be empty,
/// e.g. `<WarningText/>`.
#[derive(Debug, PartialEq, Deserialize)]
pub struct XmlText {
    #[serde(rename = "$text", default)]
    pub value: String,
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct XmlPricing {
    #[serde(rename = "@currency")]
    pub currency: String,
    #[serde(rename = "ServiceCharges", default)]
    pub service_charges: Vec<XmlServiceCharge>,
}

impl TryFrom<XmlPricing> for Pricing {
    type Error = ParseError;

    fn try_from(item: XmlPricing) -> Result<Self, Self::Error> {
        Ok(Pricing {
            currency: item.currency,
            service_charges: item
                .service_charges
                .into_iter()
                .map(ServiceCharge::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}

// Attributes and text default to empty here so that the check below can
// report which part of the charge is missing.
#[derive(Debug, PartialEq, Deserialize)]
pub struct XmlServiceCharge {
    #[serde(rename = "@type", default)]
    pub passenger_type: String,
    #[serde(rename = "@ChargeType", default)]
    pub charge_type: String,
    #[serde(rename = "$text", default)]
    pub price: String,
}

impl TryFrom<XmlServiceCharge> for ServiceCharge {
    type Error = ParseError;

    fn try_from(item: XmlServiceCharge) -> Result<Self, Self::Error> {
        let charge = ServiceCharge {
            passenger_type: item.passenger_type.trim().to_string(),
            charge_type: item.charge_type.trim().to_string(),
            price: item.price.trim().to_string(),
        };

        let parts = [
            ("type", &charge.passenger_type),
            ("ChargeType", &charge.charge_type),
            ("price", &charge.price),
        ];
        if let Some((name, _)) = parts.iter().find(|(_, value)| value.is_empty()) {
            return Err(ParseError::MalformedDocument(format!(
                "`ServiceCharges` element is missing its {}",
                name
            )));
        }

        Ok(charge)
    }
}
