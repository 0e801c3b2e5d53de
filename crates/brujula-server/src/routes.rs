//! Routes: `/` (HTML page), `/api/summary` (JSON view) and `/health`.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Json, Router,
};
use brujula_core::render::render_page;
use brujula_core::{Dashboard, DashboardView, ViewRequest};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::debug;

pub type AppState = Arc<Dashboard>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(page))
        .route("/api/summary", get(summary))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
}

async fn page(State(dashboard): State<AppState>, Query(request): Query<ViewRequest>) -> Html<String> {
    debug!(?request, "page requested");
    let view = dashboard.view(&request);
    Html(render_page(&view, &dashboard.page_context()))
}

async fn summary(State(dashboard): State<AppState>, Query(request): Query<ViewRequest>) -> Json<DashboardView> {
    Json(dashboard.view(&request))
}
