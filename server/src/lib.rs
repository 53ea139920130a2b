use axum::{extract::{Query, State}, http::{header, HeaderValue, StatusCode}, response::IntoResponse, routing::get, Router};
use dirsearch_core::{search, IndexManager};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const MAX_QUERY_LEN: usize = 256;

/// Query string exactly as the client sent it.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    #[serde(rename = "minIndex")]
    pub min_index: Option<String>,
    #[serde(rename = "maxIndex")]
    pub max_index: Option<String>,
}

/// Validated search request; the engine never sees raw parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub min_index: usize,
    pub max_index: usize,
}

impl TryFrom<SearchParams> for SearchRequest {
    type Error = String;

    fn try_from(params: SearchParams) -> Result<Self, Self::Error> {
        let query = params.query.ok_or("missing parameter: query")?;
        if query.trim().is_empty() {
            return Err("query must not be empty".into());
        }
        if query.chars().count() > MAX_QUERY_LEN {
            return Err(format!("query must be at most {MAX_QUERY_LEN} characters"));
        }
        let min_index = parse_index("minIndex", params.min_index)?;
        let max_index = parse_index("maxIndex", params.max_index)?;
        if min_index > max_index {
            return Err("minIndex must not exceed maxIndex".into());
        }
        Ok(Self { query, min_index, max_index })
    }
}

fn parse_index(name: &str, raw: Option<String>) -> Result<usize, String> {
    let raw = raw.ok_or_else(|| format!("missing parameter: {name}"))?;
    raw.trim().parse().map_err(|_| format!("{name} must be a non-negative integer"))
}

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<IndexManager>,
}

pub fn build_app(manager: Arc<IndexManager>) -> Router {
    let cors = cors_layer(std::env::var("CORS_ALLOW_ORIGIN").ok().as_deref());

    Router::new()
        .route("/health", get(health_handler))
        .route("/search", get(search_handler))
        .with_state(AppState { manager })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Comma-separated allowed origins; unset or unparsable means any origin.
fn cors_layer(allowed: Option<&str>) -> CorsLayer {
    let origins = allowed_origins(allowed);
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

fn allowed_origins(allowed: Option<&str>) -> Vec<HeaderValue> {
    allowed
        .into_iter()
        .flat_map(|list| list.split(','))
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| origin.parse().ok())
        .collect()
}

/// Kick off the index build in the background so the first query rarely waits.
pub fn warm_up(manager: Arc<IndexManager>) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        // Outcome is logged by the manager and cached for every later caller.
        let _ = manager.get();
    })
}

async fn health_handler(State(state): State<AppState>) -> &'static str {
    state.manager.status().as_str()
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<impl IntoResponse, (StatusCode, String)> {
    let request = SearchRequest::try_from(params).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;
    let manager = Arc::clone(&state.manager);
    // get() may block on the first build.
    let body = tokio::task::spawn_blocking(move || run_search(&manager, &request))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "search task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "search failed".to_string())
        })??;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

fn run_search(manager: &IndexManager, request: &SearchRequest) -> Result<String, (StatusCode, String)> {
    let index = manager.get().map_err(|e| {
        tracing::warn!(error = %e, "search requested while index unavailable");
        (StatusCode::SERVICE_UNAVAILABLE, "search is temporarily unavailable".to_string())
    })?;
    // Ranges were validated by `SearchRequest`, so an engine error here is ours.
    let hits = search(&index, &request.query, request.min_index, request.max_index).map_err(|e| {
        tracing::error!(error = %e, "validated search request rejected by engine");
        (StatusCode::INTERNAL_SERVER_ERROR, "search failed".to_string())
    })?;
    serde_json::to_string(&hits).map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
