//! 채팅 기록 - 사용자별 메시지 목록

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 메시지 작성자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

/// 허용되지 않은 role 문자열
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Role must be either 'user' or 'bot', got '{0}'")]
pub struct InvalidRole(pub String);

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "bot" => Ok(Role::Bot),
            other => Err(InvalidRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Bot => write!(f, "bot"),
        }
    }
}

/// 채팅 메시지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// 사용자 ID별 채팅 기록
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    by_user: HashMap<String, Vec<ChatMessage>>,
}

impl ChatHistory {
    /// 사용자 기록 조회 (사용자가 없으면 빈 목록)
    pub fn get(&self, user_id: Option<&str>) -> &[ChatMessage] {
        user_id
            .and_then(|id| self.by_user.get(id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 메시지 추가
    pub fn append(&mut self, user_id: &str, role: Role, content: impl Into<String>) {
        self.by_user
            .entry(user_id.to_string())
            .or_default()
            .push(ChatMessage::new(role, content));
    }

    /// 문자열 role 로 메시지 추가 (`user` / `bot` 외에는 실패)
    pub fn append_raw(&mut self, user_id: &str, role: &str, content: &str) -> Result<(), InvalidRole> {
        let role = role.parse()?;
        self.append(user_id, role, content);
        Ok(())
    }

    /// 사용자 기록 삭제
    pub fn clear(&mut self, user_id: &str) {
        self.by_user.remove(user_id);
    }
}
