use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// 채팅 페이지 + JSON API 라우터
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/sessions", post(handlers::create_session))
        .route("/api/me", get(handlers::me))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route(
            "/api/subscription",
            get(handlers::get_subscription).put(handlers::set_subscription),
        )
        .route("/api/history", get(handlers::history))
        .route("/api/chat", post(handlers::chat))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
