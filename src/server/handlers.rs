use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::error::ApiError;
use super::state::{session_id, AppState};
use crate::auth::AuthError;

const INDEX_HTML: &str = include_str!("index.html");

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionRequest {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state.create_session()?;
    Ok(Json(json!({ "session_id": id })))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let id = session_id(&headers)?;
    let body = state.with_billing(id, |session, billing| {
        json!({
            "logged_in": session.is_logged_in(),
            "user": session.current_user(),
            "subscription": billing.status(session.current_user()),
        })
    })?;
    Ok(Json(body))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = session_id(&headers)?;
    let user = state.with_session(id, |session| {
        session.login(&state.users, payload.username.trim()).cloned()
    })??;
    Ok(Json(json!({ "user": user })))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let id = session_id(&headers)?;
    state.with_session(id, |session| session.logout())?;
    Ok(Json(json!({ "logged_in": false })))
}

pub async fn get_subscription(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let id = session_id(&headers)?;
    let active = state.with_billing(id, |session, billing| billing.status(session.current_user()))?;
    Ok(Json(json!({ "active": active })))
}

pub async fn set_subscription(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SubscriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = session_id(&headers)?;
    let active = state.with_billing(id, |session, billing| {
        billing.toggle(session, payload.active);
        billing.status(session.current_user())
    })?;
    Ok(Json(json!({ "active": active })))
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let id = session_id(&headers)?;
    let messages = state.with_session(id, |session| session.chat_history().to_vec())?;
    Ok(Json(json!({ "messages": messages })))
}

/// 질문 → 답변 (로그인 필수)
///
/// 답변 생성 중에는 세션 락을 풀어두고, 끝난 뒤 기록에 한 턴을 추가합니다.
/// 빈 질문은 안내 문구만 돌려주고 기록하지 않습니다.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = session_id(&headers)?;
    if !state.with_session(id, |session| session.is_logged_in())? {
        return Err(AuthError::NotLoggedIn.into());
    }

    let answer = state.chatbot.ask(&payload.question).await;

    if !payload.question.trim().is_empty() {
        state.with_session(id, |session| session.record_turn(&payload.question, &answer))??;
    }
    Ok(Json(json!({ "answer": answer })))
}
