//! 인증 모듈 - 데모 로그인, 구독 토글, 채팅 기록
//!
//! 모든 상태는 프로세스 메모리에만 있으며 재시작하면 사라집니다.

mod billing;
mod history;
mod session;
mod users;

pub use billing::BillingLedger;
pub use history::{ChatHistory, ChatMessage, InvalidRole, Role};
pub use session::Session;
pub use users::{User, UserDirectory};

/// 인증 오류
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("User does not exist.")]
    UnknownUser,
    #[error("Please login to start chatting with ChatVet.")]
    NotLoggedIn,
}
