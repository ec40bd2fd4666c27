//! RAG 모듈 - 검색 증강 생성
//!
//! 질문을 임베딩하고 벡터 인덱스에서 관련 청크를 찾은 뒤,
//! 청크를 하나의 컨텍스트로 묶어("stuff") 프롬프트와 함께 LLM에 전달합니다.

mod prompts;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::Config;
use crate::embedding::{EmbeddingProvider, OpenAiEmbedding};
use crate::knowledge::{PineconeIndex, VectorIndex};
use crate::llm::{ChatModel, Message, OpenAiChat};

pub use prompts::{PromptKind, PromptTemplate};

/// 검색할 청크 수
pub const DEFAULT_RETRIEVAL_K: usize = 4;

// ============================================================================
// AnswerGenerator Trait
// ============================================================================

/// 질문에 대한 답변 생성기
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn answer(&self, question: &str) -> Result<String>;
}

// ============================================================================
// RetrievalQa
// ============================================================================

/// 검색 + 생성 체인
pub struct RetrievalQa {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn ChatModel>,
    prompt: PromptTemplate,
    top_k: usize,
}

impl RetrievalQa {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn ChatModel>,
        prompt: PromptTemplate,
    ) -> Self {
        Self {
            embedder,
            index,
            llm,
            prompt,
            top_k: DEFAULT_RETRIEVAL_K,
        }
    }

    /// 검색 청크 수 지정
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// 설정으로 OpenAI + Pinecone 체인 구성
    pub async fn from_config(config: &Config) -> Result<Self> {
        let embedder = OpenAiEmbedding::new(&config.openai).context("Failed to create embedder")?;
        let index = PineconeIndex::connect(&config.pinecone)
            .await
            .context("Failed to connect to Pinecone")?;
        let llm = OpenAiChat::new(&config.openai).context("Failed to create chat model")?;

        tracing::info!(
            "RAG chain ready (llm={}, embedder={}, prompt={})",
            llm.name(),
            embedder.name(),
            config.prompt
        );

        Ok(Self::new(
            Arc::new(embedder),
            Arc::new(index),
            Arc::new(llm),
            config.prompt.template(),
        ))
    }

    /// 질문으로 컨텍스트 문자열 구성
    pub async fn retrieve_context(&self, question: &str) -> Result<String> {
        let embedding = self
            .embedder
            .embed(question)
            .await
            .context("Failed to embed question")?;

        let results = self
            .index
            .query(&embedding, self.top_k)
            .await
            .context("Failed to query vector index")?;

        tracing::debug!("Retrieved {} chunks for question", results.len());

        Ok(results
            .into_iter()
            .map(|r| r.text)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

#[async_trait]
impl AnswerGenerator for RetrievalQa {
    async fn answer(&self, question: &str) -> Result<String> {
        let context = self.retrieve_context(question).await?;
        let prompt = self.prompt.render(&context, question);

        self.llm
            .complete(&[Message::user(prompt)])
            .await
            .context("Chat completion failed")
    }
}

// ============================================================================
// Tests
// ============================================================================
