//! HTTP handlers

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use tracing::{debug, info};

use super::ServerState;
use super::error::ApiError;
use super::protocol::{
    ExtensionCount, HealthResponse, ReindexResponse, RootSummary, SearchResponse,
    StatsResponse, SuggestResponse,
};
use crate::search::{RawSearchParams, evaluate};

/// Number of extensions returned by `/suggest`
pub const SUGGEST_LIMIT: usize = 100;

pub async fn search(
    State(state): State<Arc<ServerState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<SearchResponse>, ApiError> {
    let raw = RawSearchParams::from_pairs(&pairs);
    let text = raw.q.clone().unwrap_or_default();
    let query = raw.into_query(&state.search)?;
    let mode = query.mode;

    // Evaluation holds its own Arc; a publish during the call does not affect it
    let snapshot = state.index.current();
    let task = tokio::task::spawn_blocking(move || evaluate(&snapshot, &query));

    let joined = match state.search.timeout_ms {
        0 => task.await,
        ms => tokio::time::timeout(Duration::from_millis(ms), task)
            .await
            .map_err(|_| ApiError::unavailable(format!("Search exceeded {}ms", ms)))?,
    };
    let result = joined.map_err(|e| ApiError::internal(format!("Search task failed: {}", e)))??;

    debug!(
        "Search {:?} ({}): {} matches in {}ms",
        text, mode, result.total, result.took_ms
    );
    Ok(Json(SearchResponse::new(text, mode.as_str(), result)))
}

pub async fn stats(State(state): State<Arc<ServerState>>) -> Json<StatsResponse> {
    let snapshot = state.index.current();
    let stats = snapshot.stats();
    let roots = snapshot
        .root_stats(&state.indexer.root_names())
        .into_iter()
        .map(RootSummary::from)
        .collect();
    Json(StatsResponse {
        total_files: stats.total_files,
        total_size: stats.total_size,
        last_scan: stats.last_scan,
        scanning: state.indexer.is_scanning(),
        files_seen: state.indexer.files_seen(),
        current_scan_path: state.indexer.get_current_scan_path(),
        last_report: state.indexer.last_report(),
        roots,
    })
}

pub async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        indexed: state.index.is_indexed(),
    })
}

pub async fn suggest(State(state): State<Arc<ServerState>>) -> Json<SuggestResponse> {
    let extensions = state
        .index
        .current()
        .extension_counts(SUGGEST_LIMIT)
        .into_iter()
        .map(|(ext, count)| ExtensionCount { ext, count })
        .collect();
    Json(SuggestResponse { extensions })
}

pub async fn reindex(
    State(state): State<Arc<ServerState>>,
) -> Result<(StatusCode, Json<ReindexResponse>), ApiError> {
    state.indexer.request_scan()?;
    info!("Reindex requested over HTTP");
    Ok((
        StatusCode::ACCEPTED,
        Json(ReindexResponse {
            message: "Scan started".to_string(),
        }),
    ))
}
