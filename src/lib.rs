// Itinerary search response processing: parse, measure, select and compare

pub mod api;
pub mod config;
pub mod differ;
pub mod itinerary;
pub mod metrics;
pub mod search_parser;
pub mod selector;
pub mod xml_response;

// Re-export key types for convenience
pub use differ::{difference, Diff, DiffError, DiffSide};
pub use itinerary::{
    FlightLeg, Itinerary, ItinerarySearchResult, ItineraryView, Pricing, ServiceCharge,
};
pub use metrics::{total_duration, total_durations, total_price, total_prices, MetricError};
pub use search_parser::{FlightSearchProcessor, ParseError};
pub use selector::{select_by, select_optimal, Metric, Mode, SelectionError};
