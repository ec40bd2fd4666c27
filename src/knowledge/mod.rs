//! Knowledge 모듈 - 수의학 문서 청킹 및 벡터 인덱스
//!
//! - Chunker: 단어 윈도우 텍스트 분할
//! - Vector: 벡터 인덱스 트레이트 및 공통 타입
//! - Pinecone: 호스팅 벡터 인덱스 구현

mod chunker;
mod pinecone;
mod vector;

// Re-exports
pub use chunker::{chunk_words, ChunkConfig, Chunker, WordChunker};
pub use pinecone::{PineconeIndex, UPSERT_BATCH_SIZE};
pub use vector::{
    pair_entries, SearchResult, TextChunk, VectorEntry, VectorIndex, EMBEDDING_DIMENSION,
};
