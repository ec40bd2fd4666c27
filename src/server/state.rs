//! 서버 공유 상태
//!
//! 세션 맵과 구독 기록은 프로세스 메모리에만 있습니다.
//! 락은 `.await` 너머로 들고 가지 않습니다.
//!
//! 세션은 마지막 사용 후 `idle_ttl` 이 지나면 만료되고,
//! 맵 크기는 `max_sessions` 로 제한됩니다 (가득 차면 가장 오래 쉰 세션부터 제거).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use uuid::Uuid;

use super::error::ApiError;
use crate::auth::{BillingLedger, Session, UserDirectory};
use crate::chatbot::Chatbot;

/// 세션 식별 헤더
pub const SESSION_HEADER: &str = "x-session-id";
/// 기본 세션 유휴 만료 시간
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);
/// 기본 최대 세션 수
pub const MAX_SESSIONS: usize = 10_000;

struct SessionEntry {
    session: Session,
    last_seen: Instant,
}

pub struct AppState {
    pub chatbot: Arc<Chatbot>,
    pub users: UserDirectory,
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
    billing: Mutex<BillingLedger>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl AppState {
    pub fn new(chatbot: Arc<Chatbot>, users: UserDirectory) -> Self {
        Self {
            chatbot,
            users,
            sessions: Mutex::new(HashMap::new()),
            billing: Mutex::new(BillingLedger::default()),
            idle_ttl: SESSION_IDLE_TTL,
            max_sessions: MAX_SESSIONS,
        }
    }

    /// 세션 만료 시간과 최대 개수 지정
    pub fn with_session_limits(mut self, idle_ttl: Duration, max_sessions: usize) -> Self {
        self.idle_ttl = idle_ttl;
        self.max_sessions = max_sessions.max(1);
        self
    }

    /// 새 세션 발급
    ///
    /// 만료된 세션을 먼저 정리하고, 그래도 가득 차 있으면 가장 오래 쉰 세션을 제거합니다.
    pub fn create_session(&self) -> Result<Uuid, ApiError> {
        let mut sessions = self.sessions.lock().map_err(ApiError::internal)?;

        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() < self.idle_ttl);
        if sessions.len() < before {
            tracing::debug!("Expired {} idle sessions", before - sessions.len());
        }

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            match oldest {
                Some(oldest) => {
                    sessions.remove(&oldest);
                    tracing::debug!("Session evicted: {}", oldest);
                }
                None => break,
            }
        }

        let id = Uuid::new_v4();
        sessions.insert(
            id,
            SessionEntry {
                session: Session::new(),
                last_seen: Instant::now(),
            },
        );
        tracing::debug!("Session created: {}", id);
        Ok(id)
    }

    /// 세션에 대해 동기 작업 수행
    pub fn with_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Result<R, ApiError> {
        let mut sessions = self.sessions.lock().map_err(ApiError::internal)?;
        let session = touch(&mut sessions, id, self.idle_ttl)?;
        Ok(f(session))
    }

    /// 세션 + 구독 기록 동시 접근 (락 순서: sessions → billing)
    pub fn with_billing<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Session, &mut BillingLedger) -> R,
    ) -> Result<R, ApiError> {
        let mut sessions = self.sessions.lock().map_err(ApiError::internal)?;
        let session = touch(&mut sessions, id, self.idle_ttl)?;
        let mut billing = self.billing.lock().map_err(ApiError::internal)?;
        Ok(f(session, &mut billing))
    }

    #[cfg(test)]
    fn session_count(&self) -> Result<usize, ApiError> {
        Ok(self.sessions.lock().map_err(ApiError::internal)?.len())
    }
}

/// 세션 조회 + 사용 시각 갱신 (만료된 세션은 제거 후 NotFound)
fn touch(
    sessions: &mut HashMap<Uuid, SessionEntry>,
    id: Uuid,
    idle_ttl: Duration,
) -> Result<&mut Session, ApiError> {
    let expired = match sessions.get(&id) {
        Some(entry) => entry.last_seen.elapsed() >= idle_ttl,
        None => return Err(ApiError::NotFound("Session not found".to_string())),
    };
    if expired {
        sessions.remove(&id);
        return Err(ApiError::NotFound("Session not found".to_string()));
    }

    let entry = sessions
        .get_mut(&id)
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;
    entry.last_seen = Instant::now();
    Ok(&mut entry.session)
}

/// 요청 헤더에서 세션 ID 추출
pub fn session_id(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let raw = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest(format!("missing {} header", SESSION_HEADER)))?;

    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::BadRequest(format!("invalid {} header", SESSION_HEADER)))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;

    use super::*;
    use crate::rag::AnswerGenerator;
    use crate::symptom::SymptomChecker;

    struct Silent;

    #[async_trait]
    impl AnswerGenerator for Silent {
        async fn answer(&self, _question: &str) -> Result<String> {
            Ok(String::new())
        }
    }

    fn state() -> AppState {
        let chatbot = Chatbot::new(SymptomChecker::new(Vec::new()), Arc::new(Silent));
        AppState::new(Arc::new(chatbot), UserDirectory::demo())
    }

    #[test]
    fn test_idle_sessions_expire() {
        let state = state().with_session_limits(Duration::ZERO, 100);

        let first = state.create_session().unwrap();
        let second = state.create_session().unwrap();

        // 두 번째 발급 시 첫 세션은 정리됨
        assert_eq!(state.session_count().unwrap(), 1);
        assert!(matches!(
            state.with_session(first, |s| s.is_logged_in()),
            Err(ApiError::NotFound(_))
        ));
        // 만료된 세션은 조회 시에도 제거됨
        assert!(state.with_session(second, |_| ()).is_err());
        assert_eq!(state.session_count().unwrap(), 0);
    }

    #[test]
    fn test_session_cap_evicts_least_recently_used() {
        let state = state().with_session_limits(SESSION_IDLE_TTL, 2);

        let a = state.create_session().unwrap();
        std::thread::sleep(Duration::from_millis(2));
        let b = state.create_session().unwrap();
        std::thread::sleep(Duration::from_millis(2));
        state.with_session(a, |_| ()).unwrap();
        std::thread::sleep(Duration::from_millis(2));

        let c = state.create_session().unwrap();

        assert_eq!(state.session_count().unwrap(), 2);
        assert!(state.with_session(a, |_| ()).is_ok());
        assert!(state.with_session(c, |_| ()).is_ok());
        assert!(matches!(
            state.with_session(b, |_| ()),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_repeated_creation_stays_bounded() {
        let state = state().with_session_limits(SESSION_IDLE_TTL, 5);
        for _ in 0..50 {
            state.create_session().unwrap();
        }
        assert_eq!(state.session_count().unwrap(), 5);
    }

    #[test]
    fn test_session_id_header() {
        let mut headers = HeaderMap::new();
        assert!(matches!(session_id(&headers), Err(ApiError::BadRequest(_))));

        headers.insert(SESSION_HEADER, "not-a-uuid".parse().unwrap());
        assert!(matches!(session_id(&headers), Err(ApiError::BadRequest(_))));

        let id = Uuid::new_v4();
        headers.insert(SESSION_HEADER, id.to_string().parse().unwrap());
        assert_eq!(session_id(&headers).unwrap(), id);
    }
}
