//! 챗봇 - 답변 선택 정책
//!
//! 1. 빈 질문은 안내 문구로 바로 응답
//! 2. 증상 매칭이 확신할 때 CSV 조언을 그대로 반환
//! 3. 그 외에는 RAG 체인에 질문을 넘기고, 실패하면 고정 사과 문구 반환

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::rag::{AnswerGenerator, RetrievalQa};
use crate::symptom::SymptomChecker;

/// 증상 매칭 확신 임계값
pub const MATCH_THRESHOLD: f32 = 0.5;

pub const EMPTY_QUESTION_MESSAGE: &str =
    "Please ask a valid question about your pet's symptoms or health.";
pub const APOLOGY_MESSAGE: &str =
    "Sorry, I encountered an error while trying to answer. Please try again later.";
const ADVICE_PREFIX: &str = "Based on your symptoms, here is some advice:\n- ";

/// 증상 매칭 + RAG 챗봇
pub struct Chatbot {
    checker: SymptomChecker,
    generator: Arc<dyn AnswerGenerator>,
    threshold: f32,
}

impl Chatbot {
    pub fn new(checker: SymptomChecker, generator: Arc<dyn AnswerGenerator>) -> Self {
        Self {
            checker,
            generator,
            threshold: MATCH_THRESHOLD,
        }
    }

    /// 설정으로 생성 (CSV 로드 + 호스팅 서비스 연결)
    pub async fn from_config(config: &Config) -> Result<Self> {
        let checker = SymptomChecker::from_csv(&config.symptom_csv, "symptom", "suggestion")
            .context("Failed to load symptom table")?;
        let generator = RetrievalQa::from_config(config).await?;
        Ok(Self::new(checker, Arc::new(generator)))
    }

    /// 질문에 답변
    pub async fn ask(&self, question: &str) -> String {
        if question.trim().is_empty() {
            return EMPTY_QUESTION_MESSAGE.to_string();
        }

        let suggestions = self.checker.suggestions(question, self.threshold);
        if !suggestions.is_empty() {
            tracing::debug!("Answered from symptom table ({} matches)", suggestions.len());
            return format!("{}{}", ADVICE_PREFIX, suggestions.join("\n- "));
        }

        match self.generator.answer(question).await {
            Ok(answer) => answer.trim().to_string(),
            Err(e) => {
                tracing::error!("Error during response generation: {:#}", e);
                APOLOGY_MESSAGE.to_string()
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::symptom::SymptomRecord;

    struct Scripted {
        reply: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl AnswerGenerator for Scripted {
        async fn answer(&self, _question: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("upstream timeout"))
        }
    }

    fn checker() -> SymptomChecker {
        SymptomChecker::new(vec![
            SymptomRecord {
                symptom: "puppy worms stool".into(),
                suggestion: "Puppies need regular deworming.".into(),
            },
            SymptomRecord {
                symptom: "cat sneezing".into(),
                suggestion: "Monitor for respiratory infection.".into(),
            },
        ])
    }

    #[tokio::test]
    async fn test_empty_question_short_circuits() {
        let generator = Scripted::ok("unused");
        let bot = Chatbot::new(checker(), generator.clone());

        assert_eq!(bot.ask("").await, EMPTY_QUESTION_MESSAGE);
        assert_eq!(bot.ask("   \n").await, EMPTY_QUESTION_MESSAGE);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_symptom_match_skips_generation() {
        let generator = Scripted::ok("unused");
        let bot = Chatbot::new(checker(), generator.clone());

        let reply = bot.ask("My puppy has worms in her stool").await;
        assert_eq!(
            reply,
            "Based on your symptoms, here is some advice:\n- Puppies need regular deworming."
        );
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unmatched_question_uses_generator_trimmed() {
        let generator = Scripted::ok("  Please consult your vet.\n");
        let bot = Chatbot::new(checker(), generator.clone());

        assert_eq!(bot.ask("Is chocolate toxic?").await, "Please consult your vet.");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generation_error_becomes_apology() {
        let bot = Chatbot::new(checker(), Scripted::failing());
        assert_eq!(bot.ask("Is chocolate toxic?").await, APOLOGY_MESSAGE);
    }
}
