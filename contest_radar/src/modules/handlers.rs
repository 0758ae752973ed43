use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use contest_radar_libs::cache::TtlCache;
use contest_radar_libs::cancel::CancelToken;
use contest_radar_libs::ingest::{
    IngestError, IngestionOrchestrator, PlatformRunSummary, RunSummary,
};
use contest_radar_libs::platform::Platform;
use contest_radar_libs::store::ContestStore;
use contest_radar_libs::types::Contest;
use contest_radar_libs::verify::VerificationOrchestrator;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

const VERIFY_CACHE_TTL_MINUTES: i64 = 10;

pub struct AppState {
    pub ingest: IngestionOrchestrator,
    pub verify: VerificationOrchestrator,
    pub store: Arc<dyn ContestStore>,
    pub verify_cache: TtlCache<(Platform, String), bool>,
    pub cancel: CancelToken,
}

type ApiError = (StatusCode, Json<Value>);

fn bad_request(message: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn ingest_error(error: IngestError) -> ApiError {
    match error {
        IngestError::AlreadyRunning => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "a refresh is already in progress" })),
        ),
        IngestError::Cancelled => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "refresh cancelled during shutdown" })),
        ),
    }
}

fn parse_platform(raw: &str) -> Result<Platform, ApiError> {
    Platform::from_str(raw).map_err(|error| bad_request(error.to_string()))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// POST /api/contests/refresh
pub async fn refresh(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<RunSummary>, ApiError> {
    let summary = state
        .ingest
        .run(&state.cancel)
        .await
        .map_err(ingest_error)?;
    Ok(Json(summary))
}

/// POST /api/contests/refresh/platform/:platform
pub async fn refresh_platform(
    Path(platform): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<PlatformRunSummary>, ApiError> {
    let platform = parse_platform(&platform)?;
    let summary = state
        .ingest
        .run_platform(platform, &state.cancel)
        .await
        .map_err(ingest_error)?;
    Ok(Json(summary))
}

/// GET /api/contests/platforms/list
pub async fn platforms_list() -> Json<Vec<&'static str>> {
    Json(Platform::all().iter().map(|p| p.as_str()).collect())
}

#[derive(Debug, Deserialize)]
pub struct UpcomingParams {
    platform: Option<String>,
}

/// GET /api/contests/upcoming
pub async fn upcoming(
    Query(params): Query<UpcomingParams>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<Contest>>, ApiError> {
    let filter = match params.platform.as_deref() {
        Some(raw) => Some(parse_platform(raw)?),
        None => None,
    };
    let contests = state.store.list_future(Utc::now()).await.map_err(|error| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": error.to_string() })),
        )
    })?;
    let contests = contests
        .into_iter()
        .filter(|contest| filter.map_or(true, |platform| contest.platform == platform))
        .collect();
    Ok(Json(contests))
}

/// GET /api/verify/:platform/:handle, an unauthenticated single check.
/// Cached briefly so repeated probes don't hammer upstreams.
pub async fn verify_one(
    Path((platform, handle)): Path<(String, String)>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let platform = parse_platform(&platform)?;
    let cache_key = (platform, handle.to_lowercase());

    let exists = match state.verify_cache.get(&cache_key) {
        Some(cached) => cached,
        None => {
            let exists = state.verify.verify_one(platform, &handle).await;
            state.verify_cache.put(
                cache_key,
                exists,
                Duration::minutes(VERIFY_CACHE_TTL_MINUTES),
            );
            exists
        }
    };

    Ok(Json(json!({
        "platform": platform.as_str(),
        "handle": handle,
        "exists": exists,
    })))
}

/// POST /api/verify with a `{platform: handle}` body. Unknown platform
/// names are a client error; unconfigured platforms stay absent from the
/// response so callers can tell "not configured" from "checked and absent".
pub async fn verify_batch(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<HashMap<String, String>>,
) -> Result<Json<HashMap<&'static str, bool>>, ApiError> {
    let mut handles = HashMap::new();
    for (raw, handle) in body {
        let platform = parse_platform(&raw)?;
        handles.insert(platform, handle);
    }

    let results = state.verify.verify_all(&handles).await;
    Ok(Json(
        results
            .into_iter()
            .map(|(platform, exists)| (platform.as_str(), exists))
            .collect(),
    ))
}
