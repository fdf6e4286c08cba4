//! HTTP API
//!
//! Routes:
//! - `GET /search` filtered, sorted, paginated search
//! - `GET /stats` snapshot and scan statistics
//! - `GET /health` liveness
//! - `GET /suggest` most common extensions
//! - `POST /reindex` start a scan in the background

mod error;
mod format;
mod handlers;
mod protocol;

pub use error::ApiError;
pub use format::{format_size, format_timestamp};
pub use protocol::*;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::SearchConfig;
use crate::index::IndexService;
use crate::indexer::Indexer;

/// Shared state behind every handler
pub struct ServerState {
    pub index: IndexService,
    pub indexer: Indexer,
    pub search: SearchConfig,
}

impl ServerState {
    pub fn new(indexer: Indexer, search: SearchConfig) -> Self {
        Self {
            index: indexer.index().clone(),
            indexer,
            search,
        }
    }
}

/// Build the API router
pub fn router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", get(handlers::search))
        .route("/stats", get(handlers::stats))
        .route("/health", get(handlers::health))
        .route("/suggest", get(handlers::suggest))
        .route("/reindex", post(handlers::reindex))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until `shutdown` resolves
pub async fn serve<F>(addr: &str, state: Arc<ServerState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let local: SocketAddr = listener.local_addr()?;
    info!("HTTP server listening on {}", local);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    info!("HTTP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use fsearch_core::FileRecord;

    use crate::config::IndexConfig;
    use crate::index::IndexSnapshot;

    fn state_with(records: Vec<FileRecord>) -> Arc<ServerState> {
        let index = IndexService::new();
        if !records.is_empty() {
            index.publish(IndexSnapshot::new(records, 1_700_000_000, 1_700_000_010));
        }
        let indexer = Indexer::new(
            index,
            None,
            IndexConfig {
                roots: vec!["/nonexistent-root".to_string()],
                ..IndexConfig::default()
            },
        );
        Arc::new(ServerState::new(indexer, SearchConfig::default()))
    }

    fn sample() -> Vec<FileRecord> {
        vec![
            FileRecord::new("/data/docs/report.pdf", 1536, 1_700_000_000),
            FileRecord::new("/data/docs/notes.txt", 512, 1_600_000_000),
            FileRecord::new("/data/src/main.rs", 2048, 1_650_000_000),
            FileRecord::new("/data/src/lib.rs", 100, 1_650_000_000),
        ]
    }

    fn params(items: &[(&str, &str)]) -> Query<Vec<(String, String)>> {
        Query(
            items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn search_returns_formatted_page() {
        let state = state_with(sample());
        let Json(body) = handlers::search(State(state), params(&[("q", "report")]))
            .await
            .unwrap();

        assert_eq!(body.query, "report");
        assert_eq!(body.mode, "substring");
        assert_eq!(body.total, 1);
        assert_eq!(body.total_pages, 1);
        assert_eq!(body.per_page, 50);
        let hit = &body.results[0];
        assert_eq!(hit.ext, "pdf");
        assert_eq!(hit.dirpath, "/data/docs");
        assert_eq!(hit.size_formatted, "1.5 KB");
        assert_eq!(hit.mtime_formatted, format_timestamp(1_700_000_000));
    }

    #[tokio::test]
    async fn search_defaults_to_newest_first() {
        let state = state_with(sample());
        let Json(body) = handlers::search(State(state), params(&[])).await.unwrap();
        let paths: Vec<&str> = body.results.iter().map(|h| h.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/data/docs/report.pdf",
                "/data/src/lib.rs",
                "/data/src/main.rs",
                "/data/docs/notes.txt",
            ]
        );
    }

    #[tokio::test]
    async fn bad_parameters_are_400() {
        let state = state_with(sample());
        let cases: [&[(&str, &str)]; 4] = [
            &[("q", "("), ("mode", "regex")],
            &[("size_min", "abc")],
            &[("per_page", "100000")],
            &[("size_min", "10"), ("size_max", "1")],
        ];
        for case in cases {
            let err = handlers::search(State(state.clone()), params(case))
                .await
                .unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert_eq!(err.code(), "bad_request");
        }
    }

    #[tokio::test]
    async fn empty_index_stats_and_health() {
        let state = state_with(Vec::new());
        let Json(stats) = handlers::stats(State(state.clone())).await;
        assert_eq!(stats.total_files, 0);
        assert_eq!(stats.last_scan, None);
        assert!(!stats.scanning);

        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("last_scan").is_none());

        let Json(health) = handlers::health(State(state.clone())).await;
        assert_eq!(health.status, "healthy");
        assert!(!health.indexed);

        let Json(body) = handlers::search(State(state), params(&[("q", "x")]))
            .await
            .unwrap();
        assert_eq!(body.total, 0);
        assert!(body.results.is_empty());
    }

    #[tokio::test]
    async fn stats_reflect_published_snapshot() {
        let state = state_with(sample());
        let Json(stats) = handlers::stats(State(state)).await;
        assert_eq!(stats.total_files, 4);
        assert_eq!(stats.total_size, 1536 + 512 + 2048 + 100);
        assert_eq!(stats.last_scan, Some(1_700_000_010));

        // Before any scan the configured root is listed even if unreachable
        assert_eq!(stats.roots.len(), 1);
        assert_eq!(stats.roots[0].name, "/nonexistent-root");
        assert_eq!(stats.roots[0].files, 0);
    }

    #[tokio::test]
    async fn stats_break_down_by_root() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("docs")).unwrap();
        std::fs::write(temp.path().join("docs/a.txt"), b"hello").unwrap();
        std::fs::write(temp.path().join("b.bin"), vec![0u8; 2048]).unwrap();

        let indexer = Indexer::new(
            IndexService::new(),
            None,
            IndexConfig {
                roots: vec![temp.path().to_string_lossy().into_owned()],
                exclude_patterns: Vec::new(),
                ..IndexConfig::default()
            },
        );
        indexer.scan().await.unwrap();
        let state = Arc::new(ServerState::new(indexer, SearchConfig::default()));

        let Json(stats) = handlers::stats(State(state)).await;
        let root = std::fs::canonicalize(temp.path()).unwrap();
        assert_eq!(stats.roots.len(), 1);
        assert_eq!(stats.roots[0].name, root.to_string_lossy());
        assert_eq!(stats.roots[0].files, 2);
        assert_eq!(stats.roots[0].size, 2053);
        assert_eq!(stats.roots[0].size_formatted, "2.0 KB");

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["roots"][0]["files"], 2);
    }

    #[tokio::test]
    async fn suggest_orders_by_count() {
        let state = state_with(sample());
        let Json(body) = handlers::suggest(State(state)).await;
        let exts: Vec<(&str, usize)> = body
            .extensions
            .iter()
            .map(|e| (e.ext.as_str(), e.count))
            .collect();
        assert_eq!(exts, vec![("rs", 2), ("pdf", 1), ("txt", 1)]);
    }

    #[tokio::test]
    async fn reindex_conflicts_while_scanning() {
        let state = state_with(sample());
        let guard = state.indexer.try_begin().unwrap();
        let err = handlers::reindex(State(state.clone())).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        drop(guard);

        let (status, _) = handlers::reindex(State(state)).await.unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
    }
}
