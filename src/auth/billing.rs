//! 구독 상태 (결제 시뮬레이션)

use std::collections::HashMap;

use super::session::Session;
use super::users::User;

/// 사용자별 구독 토글 기록 (메모리)
#[derive(Debug, Clone, Default)]
pub struct BillingLedger {
    subscriptions: HashMap<String, bool>,
}

impl BillingLedger {
    /// 구독 활성 여부
    ///
    /// 사용자가 없으면 `false`, 토글 기록이 없으면 사용자 레코드의 기본값을 따릅니다.
    pub fn status(&self, user: Option<&User>) -> bool {
        match user {
            None => false,
            Some(user) => self
                .subscriptions
                .get(&user.username)
                .copied()
                .unwrap_or(user.subscription),
        }
    }

    /// 구독 상태 변경 (세션 사용자 레코드에도 반영)
    ///
    /// 로그인 사용자가 없으면 아무것도 하지 않습니다.
    pub fn toggle(&mut self, session: &mut Session, new_status: bool) {
        let Some(user) = session.current_user_mut() else {
            return;
        };

        self.subscriptions.insert(user.username.clone(), new_status);
        user.subscription = new_status;
        tracing::info!("Subscription for {} set to {}", user.username, new_status);
    }
}
