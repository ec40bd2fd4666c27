//! Vector Index - 벡터 인덱스 트레이트 및 타입
//!
//! 호스팅 벡터 DB(Pinecone)에 청크 임베딩을 저장하고 검색합니다.

use anyhow::Result;
use async_trait::async_trait;

/// 벡터 임베딩 차원 (OpenAI text-embedding-ada-002)
/// source: https://platform.openai.com/docs/guides/embeddings
pub const EMBEDDING_DIMENSION: usize = 1536;

// ============================================================================
// Types
// ============================================================================

/// 인제스트 대상 텍스트 청크
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// 정제된 청크 텍스트
    pub text: String,
    /// 출처 (PDF 파일 이름, CSV 경로#행 등)
    pub source: String,
}

/// 벡터 엔트리 (업서트용)
#[derive(Debug, Clone)]
pub struct VectorEntry {
    /// 청크 텍스트 (메타데이터 `text`)
    pub text: String,
    /// 출처 (메타데이터 `source`)
    pub source: String,
    /// 임베딩 벡터
    pub embedding: Vec<f32>,
}

/// 검색 결과
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub id: String,
    /// 청크 텍스트
    pub text: String,
    /// 유사도 스코어
    pub score: f32,
}

// ============================================================================
// VectorIndex Trait
// ============================================================================

/// 벡터 인덱스 공통 인터페이스
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// 벡터 배치 업서트, 저장된 개수 반환
    async fn upsert(&self, entries: &[VectorEntry]) -> Result<usize>;

    /// 벡터 검색 (유사도 내림차순)
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;

    /// 인덱스에 저장된 벡터 수
    async fn count(&self) -> Result<usize>;
}

/// 임베딩과 청크를 순서대로 묶어 엔트리 생성
///
/// 개수가 다르면 실패합니다.
pub fn pair_entries(chunks: &[TextChunk], embeddings: Vec<Vec<f32>>) -> Result<Vec<VectorEntry>> {
    if chunks.len() != embeddings.len() {
        anyhow::bail!(
            "Number of embeddings ({}) and texts ({}) must match.",
            embeddings.len(),
            chunks.len()
        );
    }

    Ok(chunks
        .iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| VectorEntry {
            text: chunk.text.clone(),
            source: chunk.source.clone(),
            embedding,
        })
        .collect())
}

// ============================================================================
// Tests
// ============================================================================
