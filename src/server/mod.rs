//! 웹 서버 모듈
//!
//! 채팅 페이지와 로그인/구독/채팅 JSON API를 제공합니다.
//! 세션은 `x-session-id` 헤더로 구분합니다.

mod error;
mod handlers;
mod router;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};

pub use error::ApiError;
pub use router::router;
pub use state::{AppState, SESSION_HEADER};

/// 서버 실행 (종료 시그널까지 블록)
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("ChatVet listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("Server error")
}
