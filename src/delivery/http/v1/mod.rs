pub mod comments;

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;
use comments::{comment_tree, create_comment, delete_comment, list_comments, update_comment};

/// Builds the application router. Comment routes are nested under `api_prefix`
/// (an empty prefix mounts them at the root).
pub fn router(state: Arc<AppState>, api_prefix: &str) -> Router {
    let comments_api = Router::new()
        .route("/comments", get(list_comments).post(create_comment))
        .route("/comments/tree", get(comment_tree))
        .route("/comments/{id}", put(update_comment).delete(delete_comment));

    let api = if api_prefix.is_empty() {
        comments_api
    } else {
        Router::new().nest(api_prefix, comments_api)
    };

    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .merge(api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn metrics(State(state): State<Arc<AppState>>) -> String {
    metrics_process::Collector::default().collect();
    state.metrics_handle.render()
}

#[tracing::instrument]
async fn healthz() -> &'static str {
    "OK"
}
