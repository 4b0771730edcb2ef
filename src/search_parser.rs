// XML parsing of vendor air fare search responses
use crate::itinerary::ItinerarySearchResult;
use crate::xml_response::XmlAirFareSearchResponse;
use quick_xml::de::from_str;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::DeError;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

// Error types for XML processing
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),
}

pub const RESPONSE_ROOT: &str = "AirFareSearchResponse";
pub const RETURN_ITINERARY_TAG: &str = "ReturnPricedItinerary";

/// Cheap text-level probe for round-trip documents. It runs before any
/// structural parsing and its answer is binding: once it reports `true`,
/// every itinerary group must carry return legs.
pub fn has_return_itineraries(xml: &str) -> bool {
    xml.contains(RETURN_ITINERARY_TAG)
}

#[derive(Debug, Default)]
pub struct FlightSearchProcessor {}

impl FlightSearchProcessor {
    pub fn new() -> Self {
        Self {}
    }

    /// Parses raw response text into the record model. Any structural error
    /// aborts the whole parse; no partial result is returned.
    pub fn process(&self, xml: &str) -> Result<ItinerarySearchResult, ParseError> {
        let generated_return_itineraries = has_return_itineraries(xml);

        let root = root_element_name(xml)?;
        if root != RESPONSE_ROOT {
            return Err(ParseError::MalformedDocument(format!(
                "expected root element `{}`, found `{}`",
                RESPONSE_ROOT, root
            )));
        }

        let response: XmlAirFareSearchResponse = from_str(xml).map_err(from_de_error)?;
        let result = response.into_search_result(generated_return_itineraries)?;

        debug!(
            "Parsed response {} with {} itineraries (return itineraries: {})",
            result.request_id,
            result.itineraries.len(),
            result.generated_return_itineraries
        );
        Ok(result)
    }

    pub fn process_bytes(&self, bytes: &[u8]) -> Result<ItinerarySearchResult, ParseError> {
        let xml = std::str::from_utf8(bytes).map_err(|e| ParseError::Encoding(e.to_string()))?;
        self.process(xml)
    }

    /// Reads the whole file, releases it, then parses its contents.
    pub fn process_file(&self, path: impl AsRef<Path>) -> Result<ItinerarySearchResult, ParseError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ParseError::NotFound(path.to_path_buf()),
            _ => ParseError::Io(e),
        })?;

        debug!("Loaded {} bytes from {}", bytes.len(), path.display());
        self.process_bytes(&bytes)
    }
}

// Walks the whole event stream once so that syntax errors surface as
// encoding errors before deserialization, and returns the root tag name.
fn root_element_name(xml: &str) -> Result<String, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if root.is_none() {
                    root = Some(tag_name(&e));
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) if root.is_none() => root = Some(tag_name(&e)),
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ParseError::Encoding(format!(
                    "error at position {}: {}",
                    reader.error_position(),
                    e
                )))
            }
            _ => (),
        }
    }

    if depth != 0 {
        return Err(ParseError::Encoding(format!(
            "document ended with {} unclosed element(s)",
            depth
        )));
    }

    root.ok_or_else(|| ParseError::MalformedDocument("document has no root element".to_string()))
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn from_de_error(err: DeError) -> ParseError {
    match err {
        DeError::InvalidXml(e) => ParseError::Encoding(e.to_string()),
        other => ParseError::MalformedDocument(other.to_string()),
    }
}

// Sample file paths (the actual files are stored in the samples directory)
pub const SAMPLE_ONE_WAY_PATH: &str = "samples/RS_ViaOW.xml";
pub const SAMPLE_ROUND_TRIP_PATH: &str = "samples/RS_Via-3.xml";

// A small one-way sample for inline testing: two itineraries priced 100 and 150
pub const SMALL_SAMPLE_XML: &str = r#"
<AirFareSearchResponse RequestTime="28-09-2015 20:23:49" ResponseTime="28-09-2015 20:23:56">
  <RequestId>123ABCD</RequestId>
  <PricedItineraries>
    <Flights>
      <OnwardPricedItinerary>
        <Flights>
          <Flight>
            <Carrier id="AI">AirIndia</Carrier>
            <FlightNumber>996</FlightNumber>
            <Source>DXB</Source>
            <Destination>DEL</Destination>
            <DepartureTimeStamp>2018-10-22T0005</DepartureTimeStamp>
            <ArrivalTimeStamp>2018-10-22T0445</ArrivalTimeStamp>
            <Class>G</Class>
            <NumberOfStops>0</NumberOfStops>
            <FareBasis>
              2820303decf751-5511-447a-aeb1-810a6b10ad7d@@$255_DXB_DEL_996_9_00:05__A2_0_0
            </FareBasis>
            <WarningText/>
            <TicketType>E</TicketType>
          </Flight>
        </Flights>
      </OnwardPricedItinerary>
      <Pricing currency="SGD">
        <ServiceCharges type="SingleAdult" ChargeType="BaseFare">60.00</ServiceCharges>
        <ServiceCharges type="SingleAdult" ChargeType="AirlineTaxes">40.00</ServiceCharges>
        <ServiceCharges type="SingleAdult" ChargeType="TotalAmount">100.00</ServiceCharges>
      </Pricing>
    </Flights>
    <Flights>
      <OnwardPricedItinerary>
        <Flights>
          <Flight>
            <Carrier id="EK">Emirates</Carrier>
            <FlightNumber>510</FlightNumber>
            <Source>DXB</Source>
            <Destination>DEL</Destination>
            <DepartureTimeStamp>2018-10-22T0935</DepartureTimeStamp>
            <ArrivalTimeStamp>2018-10-22T1415</ArrivalTimeStamp>
            <Class>U</Class>
            <NumberOfStops>0</NumberOfStops>
            <FareBasis>EK510U</FareBasis>
            <WarningText>Baggage not included</WarningText>
            <TicketType>E</TicketType>
          </Flight>
        </Flights>
      </OnwardPricedItinerary>
      <Pricing currency="SGD">
        <ServiceCharges type="SingleAdult" ChargeType="BaseFare">110.00</ServiceCharges>
        <ServiceCharges type="SingleAdult" ChargeType="TotalAmount">150.00</ServiceCharges>
      </Pricing>
    </Flights>
  </PricedItineraries>
</AirFareSearchResponse>
"#;
