//! Read-only HTTP view over persisted snapshots plus the static viewer.

use crate::store;
use crate::Result;

use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: String,
    pub data_dir: PathBuf,
    pub static_dir: PathBuf,
}

#[derive(Clone)]
struct AppState {
    data_dir: Arc<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct GraphQuery {
    file: Option<String>,
}

/// 500 with the error text, like the JSON endpoints always did.
struct ApiError(anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", self.0)).into_response()
    }
}

pub fn router(data_dir: PathBuf, static_dir: PathBuf) -> Router {
    let state = AppState {
        data_dir: Arc::new(data_dir),
    };
    Router::new()
        .route("/api/graph", get(graph_handler))
        .route("/api/files", get(files_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: ServerConfig) -> Result<()> {
    let app = router(config.data_dir, config.static_dir);
    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("bind {}", config.listen))?;
    tracing::info!("server listening on {}", config.listen);
    axum::serve(listener, app).await.context("serve")?;
    Ok(())
}

async fn graph_handler(
    State(state): State<AppState>,
    Query(query): Query<GraphQuery>,
) -> std::result::Result<Json<serde_json::Value>, ApiError> {
    store::load_snapshot(&state.data_dir, query.file.as_deref())
        .map(Json)
        .map_err(ApiError)
}

async fn files_handler(
    State(state): State<AppState>,
) -> std::result::Result<Json<Vec<String>>, ApiError> {
    store::list_graphs(&state.data_dir).map(Json).map_err(ApiError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EntityKind, Graph, Link, Node};
    use axum::body::Body;
    use axum::http::Request;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn fixture() -> (tempfile::TempDir, tempfile::TempDir) {
        let data = tempfile::tempdir().unwrap();
        let graph = Graph {
            nodes: vec![
                Node::new("pve1", EntityKind::Host),
                Node::new("vmbr0", EntityKind::Bridge),
            ],
            links: vec![Link::new("vmbr0", "pve1")],
        };
        store::save_graph(&data.path().join("graph.json"), &graph).unwrap();
        store::save_graph(&data.path().join("lab.json"), &Graph::default()).unwrap();

        let web = tempfile::tempdir().unwrap();
        std::fs::write(web.path().join("index.html"), "<h1>viewer</h1>").unwrap();
        (data, web)
    }

    #[tokio::test]
    async fn graph_endpoint_serves_default_and_named_snapshots() {
        let (data, web) = fixture();
        let app = router(data.path().to_path_buf(), web.path().to_path_buf());

        let (status, body) = get_body(app.clone(), "/api/graph").await;
        assert_eq!(status, StatusCode::OK);
        let g: Graph = serde_json::from_str(&body).unwrap();
        assert_eq!(g.nodes.len(), 2);
        assert_eq!(g.links, vec![Link::new("vmbr0", "pve1")]);

        let (status, body) = get_body(app, "/api/graph?file=../lab.json").await;
        assert_eq!(status, StatusCode::OK);
        let served: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(served, serde_json::json!({"nodes": [], "links": []}));
    }

    #[tokio::test]
    async fn graph_endpoint_returns_stored_json_unchanged() {
        let (data, web) = fixture();
        let stored = serde_json::json!({
            "nodes": [{
                "id": "pve1",
                "type": "host",
                "name": "pve1",
                "info": {"mem": 1024, "maxmem": 17179869184u64, "ha": true}
            }],
            "links": []
        });
        std::fs::write(data.path().join("raw.json"), stored.to_string()).unwrap();
        let app = router(data.path().to_path_buf(), web.path().to_path_buf());

        let (status, body) = get_body(app, "/api/graph?file=raw.json").await;
        assert_eq!(status, StatusCode::OK);
        let served: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(served, stored);
        assert!(!body.contains("1024.0"));
    }

    #[tokio::test]
    async fn missing_snapshot_is_a_server_error() {
        let (data, web) = fixture();
        let app = router(data.path().to_path_buf(), web.path().to_path_buf());

        let (status, body) = get_body(app, "/api/graph?file=gone.json").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("gone.json"));
    }

    #[tokio::test]
    async fn files_endpoint_lists_snapshots() {
        let (data, web) = fixture();
        let app = router(data.path().to_path_buf(), web.path().to_path_buf());

        let (status, body) = get_body(app, "/api/files").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"["graph.json","lab.json"]"#);
    }

    #[tokio::test]
    async fn other_paths_fall_back_to_static_files() {
        let (data, web) = fixture();
        let app = router(data.path().to_path_buf(), web.path().to_path_buf());

        let (status, body) = get_body(app, "/index.html").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>viewer</h1>");
    }
}
