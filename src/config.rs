//! 설정 모듈 - 환경변수 기반 설정
//!
//! 호스팅 서비스(OpenAI, Pinecone) API 키와 데이터 경로를 환경변수에서 읽습니다.
//! 작업 디렉토리에 `.env` 파일이 있으면 먼저 로드합니다.
//!
//! ## 필수 환경변수
//! - `OPENAI_API_KEY`
//! - `PINECONE_API_KEY`
//! - `PINECONE_INDEX_NAME`

use std::path::PathBuf;

use crate::rag::PromptKind;

/// 기본 OpenAI API 엔드포인트
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// 기본 채팅 모델
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4";
/// 기본 임베딩 모델
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
/// 기본 증상 CSV 경로
pub const DEFAULT_SYMPTOM_CSV: &str = "data/vet_guides.csv";
/// 기본 PDF 가이드 폴더
pub const DEFAULT_PDF_DIR: &str = "data/pdf_guides";

// ============================================================================
// Errors
// ============================================================================

/// 설정 오류
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set in environment variables")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

// ============================================================================
// Config
// ============================================================================

/// OpenAI 관련 설정
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
}

/// Pinecone 관련 설정
#[derive(Debug, Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    pub index_name: String,
    /// 데이터 플레인 호스트 (없으면 컨트롤 플레인에서 조회)
    pub index_host: Option<String>,
    /// 구버전 환경 이름 (참고용)
    pub environment: Option<String>,
}

/// 전체 애플리케이션 설정
#[derive(Debug, Clone)]
pub struct Config {
    pub openai: OpenAiConfig,
    pub pinecone: PineconeConfig,
    pub symptom_csv: PathBuf,
    pub pdf_dir: PathBuf,
    pub prompt: PromptKind,
}

impl Config {
    /// 환경변수에서 설정 로드
    ///
    /// 필수 값이 없으면 해당 변수 이름과 함께 실패합니다.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();

        Ok(Self {
            openai: OpenAiConfig::from_env()?,
            pinecone: PineconeConfig::from_env()?,
            symptom_csv: symptom_csv_path(),
            pdf_dir: pdf_dir_path(),
            prompt: match optional_var("CHATVET_PROMPT") {
                Some(value) => value.parse().map_err(|reason| ConfigError::Invalid {
                    name: "CHATVET_PROMPT",
                    reason,
                })?,
                None => PromptKind::default(),
            },
        })
    }
}

impl OpenAiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();

        let base_url = optional_var("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
        url::Url::parse(&base_url).map_err(|e| ConfigError::Invalid {
            name: "OPENAI_BASE_URL",
            reason: e.to_string(),
        })?;

        Ok(Self {
            api_key: required_var("OPENAI_API_KEY")?,
            base_url: base_url.trim_end_matches('/').to_string(),
            chat_model: optional_var("CHATVET_CHAT_MODEL")
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            embedding_model: optional_var("CHATVET_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
        })
    }
}

impl PineconeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();

        Ok(Self {
            api_key: required_var("PINECONE_API_KEY")?,
            index_name: required_var("PINECONE_INDEX_NAME")?,
            index_host: optional_var("PINECONE_INDEX_HOST"),
            environment: optional_var("PINECONE_ENVIRONMENT"),
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// `.env` 파일 로드 (없으면 무시)
pub fn load_dotenv() {
    if let Ok(path) = dotenv::dotenv() {
        tracing::debug!("Loaded environment from {:?}", path);
    }
}

/// 필수 환경변수 (빈 값은 없는 것으로 취급)
fn required_var(name: &'static str) -> Result<String, ConfigError> {
    optional_var(name).ok_or(ConfigError::Missing(name))
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 증상 CSV 경로 (API 키 없이도 사용)
pub fn symptom_csv_path() -> PathBuf {
    load_dotenv();
    PathBuf::from(optional_var("CHATVET_SYMPTOM_CSV").unwrap_or_else(|| DEFAULT_SYMPTOM_CSV.into()))
}

/// PDF 가이드 폴더 경로
pub fn pdf_dir_path() -> PathBuf {
    load_dotenv();
    PathBuf::from(optional_var("CHATVET_PDF_DIR").unwrap_or_else(|| DEFAULT_PDF_DIR.into()))
}

/// 필수 키가 모두 설정되어 있는지 확인 (status 명령어용)
pub fn missing_required_vars() -> Vec<&'static str> {
    load_dotenv();

    ["OPENAI_API_KEY", "PINECONE_API_KEY", "PINECONE_INDEX_NAME"]
        .into_iter()
        .filter(|name| optional_var(name).is_none())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// 환경변수를 바꾸는 테스트는 순서대로 실행
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const REQUIRED: [&str; 3] = ["OPENAI_API_KEY", "PINECONE_API_KEY", "PINECONE_INDEX_NAME"];

    #[test]
    fn test_missing_error_names_variable() {
        let err = ConfigError::Missing("OPENAI_API_KEY");
        assert_eq!(
            err.to_string(),
            "OPENAI_API_KEY is not set in environment variables"
        );
    }

    #[test]
    fn test_optional_var_ignores_blank() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("CHATVET_TEST_BLANK_VAR", "   ");
        assert!(optional_var("CHATVET_TEST_BLANK_VAR").is_none());
        std::env::set_var("CHATVET_TEST_BLANK_VAR", " value ");
        assert_eq!(
            optional_var("CHATVET_TEST_BLANK_VAR").as_deref(),
            Some("value")
        );
        std::env::remove_var("CHATVET_TEST_BLANK_VAR");
    }

    #[test]
    fn test_required_var_missing() {
        let result = required_var("CHATVET_TEST_DEFINITELY_UNSET");
        assert!(matches!(
            result,
            Err(ConfigError::Missing("CHATVET_TEST_DEFINITELY_UNSET"))
        ));
    }

    #[test]
    fn test_from_env_names_missing_index() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let saved: Vec<(&str, Option<String>)> =
            REQUIRED.iter().map(|&name| (name, std::env::var(name).ok())).collect();

        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::set_var("PINECONE_API_KEY", "pc-test");
        std::env::remove_var("PINECONE_INDEX_NAME");

        let pinecone = PineconeConfig::from_env();
        let full = Config::from_env();
        let missing = missing_required_vars();

        for (name, value) in saved {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }

        assert!(matches!(
            pinecone,
            Err(ConfigError::Missing("PINECONE_INDEX_NAME"))
        ));
        let err = full.unwrap_err();
        assert!(matches!(err, ConfigError::Missing("PINECONE_INDEX_NAME")));
        assert_eq!(
            err.to_string(),
            "PINECONE_INDEX_NAME is not set in environment variables"
        );
        assert_eq!(missing, vec!["PINECONE_INDEX_NAME"]);
    }
}
