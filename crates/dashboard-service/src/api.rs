//! REST API endpoints for the dashboard service.
//!
//! # Conditional requests
//!
//! `GET /api/dashboard` and `GET /api/readings` send a weak `ETag` holding
//! the instant of the newest reading. A client that sends it back in
//! `If-None-Match` gets `304 Not Modified`, with the same `ETag` repeated,
//! until a new reading arrives.
//! `GET /api/chart` is never conditional because its window slides with the
//! current time even when no reading is added.
//!
//! # Error Handling
//!
//! All endpoints return structured JSON errors via [`AppError`]. Malformed
//! parameters return 400. A store that cannot be reached in time returns 503
//! with `Retry-After`.
//!
//! # Example
//!
//! ```ignore
//! use dashboard_service::api;
//!
//! let app = api::router().with_state(state);
//! ```

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use dashboard_core::freshness;
use dashboard_core::{
    ChartSeries, ErrorKind, Freshness, FreshnessToken, LabelFormatter, Page, PageCursor,
};
use dashboard_store::StoredReading;

use crate::params::{ChartParams, DashboardParams, PageParams, RecordParams};
use crate::state::AppState;

/// Seconds a client should wait before retrying a 503.
pub const RETRY_AFTER_SECS: u64 = 1;

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/readings", get(get_readings).post(record_reading))
        .route("/api/chart", get(get_chart))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Number of stored readings; absent when the store is unavailable.
    pub readings: Option<u64>,
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let readings = match state.dashboard.count_readings().await {
        Ok(count) => Some(count),
        Err(e) => {
            warn!("Health check could not count readings: {}", e);
            None
        }
    };

    Json(HealthResponse {
        status: if readings.is_some() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
        readings,
    })
}

/// A stored reading with its display label.
#[derive(Debug, Serialize)]
pub struct ReadingRow {
    #[serde(flatten)]
    pub reading: StoredReading,
    /// `recorded_at` in the dashboard timezone.
    pub label: String,
}

impl ReadingRow {
    fn new(reading: StoredReading, labels: &LabelFormatter) -> Self {
        let label = labels.row_label(reading.recorded_at);
        Self { reading, label }
    }
}

/// One page of readings plus what the client needs to load more.
#[derive(Debug, Serialize)]
pub struct ReadingsResponse {
    pub readings: Vec<ReadingRow>,
    pub limit: u64,
    pub offset: u64,
    /// Cursor for the following page.
    pub next: PageCursor,
    /// Whether this was the final page.
    pub last_page: bool,
    /// Instant of the newest reading, `null` for an empty store.
    pub last_updated: Option<FreshnessToken>,
}

impl ReadingsResponse {
    fn from_page(page: Page, labels: &LabelFormatter) -> Self {
        let last_page = page.is_last();
        let next = page.next_cursor();
        Self {
            readings: page
                .rows
                .into_iter()
                .map(|r| ReadingRow::new(r, labels))
                .collect(),
            limit: page.cursor.limit,
            offset: page.cursor.offset,
            next,
            last_page,
            last_updated: page.last_updated,
        }
    }
}

/// Rows and chart in one response.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub page: ReadingsResponse,
    pub chart: ChartSeries,
}

/// Full dashboard: the first page of readings and the chart.
///
/// Answers `304` without touching rows or buckets when the client's
/// `If-None-Match` matches the newest reading.
async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let cursor = params
        .page()
        .cursor(state.config.dashboard.page_size)
        .map_err(AppError::BadRequest)?;
    let request = params
        .chart()
        .request(state.config.dashboard.default_chart())
        .map_err(AppError::BadRequest)?;
    request.validate()?;

    if let Some(response) = not_modified(&state, &headers).await? {
        return Ok(response);
    }

    let page = state.dashboard.fetch_page(cursor).await?;
    let chart = state.dashboard.fetch_chart(request).await?;
    info!(
        "Dashboard: {} rows, {} chart points",
        page.rows.len(),
        chart.len()
    );

    let etag = page.last_updated;
    let body = DashboardResponse {
        page: ReadingsResponse::from_page(page, state.dashboard.labels()),
        chart,
    };
    Ok(with_etag(Json(body).into_response(), etag))
}

/// "Load more": one page of readings, newest first.
async fn get_readings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let cursor = params
        .cursor(state.config.dashboard.page_size)
        .map_err(AppError::BadRequest)?;

    if let Some(response) = not_modified(&state, &headers).await? {
        return Ok(response);
    }

    let page = state.dashboard.fetch_page(cursor).await?;
    debug!("Readings page: {} rows", page.rows.len());

    let etag = page.last_updated;
    let body = ReadingsResponse::from_page(page, state.dashboard.labels());
    Ok(with_etag(Json(body).into_response(), etag))
}

/// Bucketed chart series.
async fn get_chart(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChartParams>,
) -> Result<Json<ChartSeries>, AppError> {
    let request = params
        .request(state.config.dashboard.default_chart())
        .map_err(AppError::BadRequest)?;

    let chart = state.dashboard.fetch_chart(request).await?;
    debug!("Chart: {} points", chart.len());
    Ok(Json(chart))
}

/// Response to a stored reading.
#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub message: &'static str,
    pub id: i64,
}

/// Store a reading given as `?temperature=..&humidity=..`.
async fn record_reading(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecordParams>,
) -> Result<Json<RecordResponse>, AppError> {
    let (temperature, humidity) = params.values().map_err(AppError::BadRequest)?;
    let id = state
        .dashboard
        .record_reading(temperature, humidity)
        .await?;

    Ok(Json(RecordResponse {
        message: "Data stored correctly",
        id,
    }))
}

/// `Some(304)` when the client's `If-None-Match` is still current.
async fn not_modified(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<Response>, AppError> {
    let client_token = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok());
    if client_token.is_none() {
        return Ok(None);
    }

    let last_updated = state.dashboard.last_updated().await?;
    match freshness::check(client_token, last_updated) {
        Freshness::NotModified => {
            debug!("Client data is current, answering 304");
            let current = last_updated.map(FreshnessToken::new);
            Ok(Some(with_etag(
                StatusCode::NOT_MODIFIED.into_response(),
                current,
            )))
        }
        Freshness::Stale { .. } => Ok(None),
    }
}

fn with_etag(mut response: Response, token: Option<FreshnessToken>) -> Response {
    if let Some(token) = token
        && let Ok(value) = HeaderValue::from_str(&token.to_etag())
    {
        response.headers_mut().insert(header::ETAG, value);
    }
    response
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Malformed request parameters.
    BadRequest(String),
    /// Well-formed parameters outside the domain.
    InvalidArgument(String),
    /// Store unreachable or busy; the client may retry.
    NotAvailable(String),
}

impl From<dashboard_core::Error> for AppError {
    fn from(e: dashboard_core::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidArgument => AppError::InvalidArgument(e.to_string()),
            ErrorKind::NotAvailable => {
                error!("Store not available: {}", e);
                AppError::NotAvailable(e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) | AppError::InvalidArgument(msg) => {
                (StatusCode::BAD_REQUEST, msg)
            }
            AppError::NotAvailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = serde_json::json!({
            "error": message,
        });

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
        }
        response
    }
}
