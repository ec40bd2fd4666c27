//! chatvet - 반려동물 건강 상담 챗봇
//!
//! TF-IDF 증상 매칭으로 알려진 증상에 바로 답하고,
//! 그 외 질문은 Pinecone 검색 + OpenAI 생성(RAG)으로 답합니다.

pub mod auth;
pub mod chatbot;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod extractor;
pub mod ingest;
pub mod knowledge;
pub mod llm;
pub mod rag;
pub mod server;
pub mod symptom;

// Re-exports
pub use auth::{AuthError, BillingLedger, ChatHistory, ChatMessage, Role, Session, User, UserDirectory};
pub use chatbot::Chatbot;
pub use config::{Config, ConfigError};
pub use embedding::{EmbeddingProvider, OpenAiEmbedding};
pub use knowledge::{ChunkConfig, Chunker, PineconeIndex, VectorIndex, WordChunker};
pub use llm::{ChatModel, OpenAiChat};
pub use rag::{AnswerGenerator, PromptKind, PromptTemplate, RetrievalQa};
pub use symptom::{SymptomChecker, SymptomMatch, SymptomRecord};
