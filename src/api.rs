// HTTP boundary: maps the flights.* routes onto the parse/select/diff pipeline
use crate::config::DataConfig;
use crate::differ::{difference, DiffError};
use crate::itinerary::{Itinerary, ItinerarySearchResult};
use crate::search_parser::{FlightSearchProcessor, ParseError};
use crate::selector::{select_by, select_optimal, Metric, Mode, SelectionError};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad Request (400): unrecognized return flag {0:?}")]
    InvalidReturnFlag(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Parse(_) | ApiError::Internal(_) => {
                error!("Internal Server Error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            _ => {
                warn!("Rejected request: {}", self);
                (StatusCode::BAD_REQUEST, self.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Parsed documents keyed by path. Concurrent first requests for the same
/// path may each parse it, but only the first stored document is kept and
/// every caller receives that one.
#[derive(Debug, Default)]
pub struct DocumentCache {
    processor: FlightSearchProcessor,
    documents: DashMap<PathBuf, Arc<ItinerarySearchResult>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_parse(&self, path: &Path) -> Result<Arc<ItinerarySearchResult>, ParseError> {
        if let Some(document) = self.documents.get(path) {
            return Ok(Arc::clone(document.value()));
        }

        let parsed = Arc::new(self.processor.process_file(path)?);
        let stored = self.documents.entry(path.to_path_buf()).or_insert(parsed);
        Ok(Arc::clone(stored.value()))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<DocumentCache>,
    pub data: Arc<DataConfig>,
}

impl AppState {
    pub fn new(data: DataConfig) -> Self {
        Self {
            cache: Arc::new(DocumentCache::new()),
            data: Arc::new(data),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trip {
    OneWay,
    RoundTrip,
}

impl Trip {
    // `?return=0` is one-way, `?return=1` (the default) round trip
    fn from_flag(flag: Option<&str>) -> Result<Self, ApiError> {
        match flag.unwrap_or("1") {
            "0" => Ok(Trip::OneWay),
            "1" => Ok(Trip::RoundTrip),
            other => Err(ApiError::InvalidReturnFlag(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum View {
    All,
    Extreme(Metric, Mode),
    Optimal,
}

#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    #[serde(rename = "return")]
    return_flag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectQuery {
    metric: Option<String>,
    mode: Option<String>,
    #[serde(rename = "return")]
    return_flag: Option<String>,
}

#[derive(Serialize)]
struct Envelope<T> {
    response: T,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route(
            "/flights.getAll",
            get(|state: State<AppState>, query: Query<ListingQuery>| {
                list_flights(state, query, View::All)
            }),
        )
        .route(
            "/flights.getCheapest",
            get(|state: State<AppState>, query: Query<ListingQuery>| {
                list_flights(state, query, View::Extreme(Metric::Price, Mode::Min))
            }),
        )
        .route(
            "/flights.getMostExpensive",
            get(|state: State<AppState>, query: Query<ListingQuery>| {
                list_flights(state, query, View::Extreme(Metric::Price, Mode::Max))
            }),
        )
        .route(
            "/flights.getFastest",
            get(|state: State<AppState>, query: Query<ListingQuery>| {
                list_flights(state, query, View::Extreme(Metric::Duration, Mode::Min))
            }),
        )
        .route(
            "/flights.getLongest",
            get(|state: State<AppState>, query: Query<ListingQuery>| {
                list_flights(state, query, View::Extreme(Metric::Duration, Mode::Max))
            }),
        )
        .route(
            "/flights.getOptimal",
            get(|state: State<AppState>, query: Query<ListingQuery>| {
                list_flights(state, query, View::Optimal)
            }),
        )
        .route("/flights.select", get(select_flights))
        .route("/flights.getDifference", get(flights_difference))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn list_flights(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
    view: View,
) -> Result<Response, ApiError> {
    let trip = Trip::from_flag(query.return_flag.as_deref())?;
    let document = load(&state, trip).await?;
    render(&document, view)
}

async fn select_flights(
    State(state): State<AppState>,
    Query(query): Query<SelectQuery>,
) -> Result<Response, ApiError> {
    // A missing key is reported like an unrecognized one
    let metric: Metric = query.metric.unwrap_or_default().parse()?;
    let mode: Mode = query.mode.unwrap_or_default().parse()?;
    let trip = Trip::from_flag(query.return_flag.as_deref())?;

    let document = load(&state, trip).await?;
    render(&document, View::Extreme(metric, mode))
}

async fn flights_difference(State(state): State<AppState>) -> Result<Response, ApiError> {
    let one_way = load(&state, Trip::OneWay).await?;
    let round_trip = load(&state, Trip::RoundTrip).await?;

    let diff = difference(&one_way, &round_trip)?;
    Ok(Json(Envelope { response: diff }).into_response())
}

fn render(document: &ItinerarySearchResult, view: View) -> Result<Response, ApiError> {
    let itineraries: Vec<&Itinerary> = match view {
        View::All => document.itineraries.iter().collect(),
        View::Extreme(metric, mode) => select_by(metric, &document.itineraries, mode)?,
        View::Optimal => select_optimal(&document.itineraries)?,
    };

    Ok(Json(Envelope {
        response: document.view(itineraries),
    })
    .into_response())
}

// File reads and parsing are synchronous; keep them off the async workers.
async fn load(state: &AppState, trip: Trip) -> Result<Arc<ItinerarySearchResult>, ApiError> {
    let path = match trip {
        Trip::OneWay => state.data.one_way_path(),
        Trip::RoundTrip => state.data.round_trip_path(),
    };
    let cache = Arc::clone(&state.cache);

    let document = tokio::task::spawn_blocking(move || cache.get_or_parse(&path))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
        let response = app(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn sample_state() -> AppState {
        AppState::new(DataConfig::default())
    }

    fn carriers(body: &Value) -> Vec<String> {
        body["response"]["itineraries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["onward_legs"][0]["carrier_id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_get_all_defaults_to_round_trip() {
        let (status, body) = get_json(sample_state(), "/flights.getAll").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"]["generated_return_itineraries"], true);
        assert_eq!(body["response"]["request_id"], "123ABCD");
        assert_eq!(carriers(&body), vec!["AI", "EK", "TG"]);
        assert_eq!(
            body["response"]["itineraries"][0]["return_legs"][0]["departure_time"],
            "2018-11-05T2220"
        );
    }

    #[tokio::test]
    async fn test_listing_routes_on_one_way_document() {
        let state = sample_state();

        let (status, body) = get_json(state.clone(), "/flights.getCheapest?return=0").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"]["generated_return_itineraries"], false);
        assert_eq!(carriers(&body), vec!["AI", "TG"]);

        let (_, body) = get_json(state.clone(), "/flights.getMostExpensive?return=0").await;
        assert_eq!(carriers(&body), vec!["EK"]);

        let (_, body) = get_json(state.clone(), "/flights.getFastest?return=0").await;
        assert_eq!(carriers(&body), vec!["TG"]);

        let (_, body) = get_json(state.clone(), "/flights.getLongest?return=0").await;
        assert_eq!(carriers(&body), vec!["AI"]);

        let (_, body) = get_json(state.clone(), "/flights.getOptimal?return=0").await;
        assert_eq!(carriers(&body), vec!["TG"]);

        // Every request above hit the same parsed document
        assert_eq!(state.cache.len(), 1);
    }

    #[tokio::test]
    async fn test_unrecognized_return_flag_is_bad_request() {
        let (status, body) = get_json(sample_state(), "/flights.getCheapest?return=2").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Bad Request (400)"));
    }

    #[tokio::test]
    async fn test_generic_select_route() {
        let (status, body) = get_json(
            sample_state(),
            "/flights.select?metric=duration&mode=max&return=1",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(carriers(&body), vec!["AI"]);

        let (status, body) =
            get_json(sample_state(), "/flights.select?metric=price&mode=median").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid selection mode: median");

        let (status, _) = get_json(sample_state(), "/flights.select?metric=speed&mode=min").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_select_without_keys_is_json_bad_request() {
        let (status, body) = get_json(sample_state(), "/flights.select").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid selection metric: ");

        let (status, body) = get_json(sample_state(), "/flights.select?metric=price").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid selection mode: ");
    }

    #[tokio::test]
    async fn test_difference_route() {
        let (status, body) = get_json(sample_state(), "/flights.getDifference").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"]["first"]["return_itinerary"], false);
        assert_eq!(body["response"]["second"]["return_itinerary"], true);
        assert!(body["response"]["first"].get("source").is_none());
    }

    #[tokio::test]
    async fn test_missing_document_is_server_error() {
        let data = DataConfig {
            samples_dir: PathBuf::from("samples/missing"),
            ..DataConfig::default()
        };
        let (status, body) = get_json(AppState::new(data), "/flights.getAll").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error");
    }

    #[test]
    fn test_cache_parses_once_per_path() {
        let cache = DocumentCache::new();
        let path = DataConfig::default().one_way_path();

        let first = cache.get_or_parse(&path).unwrap();
        let second = cache.get_or_parse(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        assert!(cache.get_or_parse(Path::new("samples/nope.xml")).is_err());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_first_requests_share_one_document() {
        let cache = DocumentCache::new();
        let path = DataConfig::default().round_trip_path();

        let documents: Vec<Arc<ItinerarySearchResult>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| cache.get_or_parse(&path).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(cache.len(), 1);
        let stored = cache.get_or_parse(&path).unwrap();
        assert!(documents.iter().all(|d| Arc::ptr_eq(d, &stored)));
    }
}
