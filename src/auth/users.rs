//! 데모 사용자 디렉토리

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 사용자 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
    /// 구독 활성 여부
    pub subscription: bool,
}

/// 메모리 내 사용자 목록 (프로토타입용)
#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: HashMap<String, User>,
}

impl UserDirectory {
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|u| (u.username.clone(), u))
                .collect(),
        }
    }

    /// `demo_user` 하나만 있는 디렉토리
    pub fn demo() -> Self {
        Self::new([User {
            username: "demo_user".to_string(),
            email: "demo@chatvet.ai".to_string(),
            subscription: true,
        }])
    }

    pub fn get(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::demo()
    }
}
