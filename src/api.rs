use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::article::Article;
use crate::gate::AccessGate;
use crate::view::{HeadlinesFeed, HeadlinesView};

pub const ACCESS_HEADER: &str = "x-access-token";

#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<HeadlinesFeed>,
    pub gate: Arc<dyn AccessGate>,
}

pub fn create_router(state: AppState) -> Router {
    let headlines = Router::new()
        .route("/headlines", get(load_headlines))
        .route("/headlines/view", get(current_view))
        .route("/headlines/select", post(select_article))
        .route("/headlines/error", delete(clear_error))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_access));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(headlines)
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn require_access(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let token = req
        .headers()
        .get(ACCESS_HEADER)
        .and_then(|v| v.to_str().ok());
    let access = state.gate.check(token);
    if !access.allowed() {
        tracing::warn!(target: "api", path = %req.uri().path(), "access denied");
        return (StatusCode::UNAUTHORIZED, "access denied").into_response();
    }
    next.run(req).await
}

#[derive(serde::Deserialize)]
struct LoadQuery {
    #[serde(default)]
    refresh: bool,
}

async fn load_headlines(
    State(state): State<AppState>,
    Query(q): Query<LoadQuery>,
) -> Json<HeadlinesView> {
    Json(state.feed.load(q.refresh).await)
}

async fn current_view(State(state): State<AppState>) -> Json<HeadlinesView> {
    Json(state.feed.view())
}

#[derive(serde::Deserialize)]
struct SelectReq {
    url: String,
}

async fn select_article(
    State(state): State<AppState>,
    Json(body): Json<SelectReq>,
) -> Result<Json<Article>, (StatusCode, String)> {
    state
        .feed
        .select(&body.url)
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("no article with url {}", body.url)))
}

async fn clear_error(State(state): State<AppState>) -> Json<HeadlinesView> {
    Json(state.feed.clear_error())
}
