//! 세션 상태 - 로그인 사용자 + 채팅 기록

use super::history::{ChatHistory, ChatMessage, Role};
use super::users::{User, UserDirectory};
use super::AuthError;

/// 브라우저 하나에 대응하는 세션
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<User>,
    history: ChatHistory,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// 로그인
    ///
    /// 디렉토리에 없는 사용자면 세션을 그대로 두고 실패합니다.
    pub fn login(&mut self, directory: &UserDirectory, username: &str) -> Result<&User, AuthError> {
        let user = directory
            .get(username)
            .cloned()
            .ok_or(AuthError::UnknownUser)?;

        tracing::info!("User logged in: {}", user.username);
        Ok(self.user.insert(user))
    }

    /// 로그아웃 (사용자 기록도 삭제)
    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            self.history.clear(&user.username);
            tracing::info!("User logged out: {}", user.username);
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub(crate) fn current_user_mut(&mut self) -> Option<&mut User> {
        self.user.as_mut()
    }

    /// 사용자 ID (= username)
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }

    /// 현재 사용자의 채팅 기록
    pub fn chat_history(&self) -> &[ChatMessage] {
        self.history.get(self.user_id())
    }

    /// 현재 사용자에게 한 턴(질문 + 답변) 기록
    pub fn record_turn(&mut self, question: &str, answer: &str) -> Result<(), AuthError> {
        let user_id = self
            .user
            .as_ref()
            .map(|u| u.username.clone())
            .ok_or(AuthError::NotLoggedIn)?;

        self.history.append(&user_id, Role::User, question);
        self.history.append(&user_id, Role::Bot, answer);
        Ok(())
    }
}
