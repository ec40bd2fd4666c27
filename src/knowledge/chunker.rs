//! Text Chunking Module
//!
//! 정제된 텍스트를 단어 수 기준 슬라이딩 윈도우로 분할합니다.
//! 인접 청크는 고정된 단어 수만큼 겹칩니다.

use anyhow::Result;

// ============================================================================
// Chunk Configuration
// ============================================================================

/// 청킹 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// 청크 당 최대 단어 수
    pub max_words: usize,
    /// 청크 간 중첩 단어 수
    pub overlap_words: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_words: 500,
            overlap_words: 50,
        }
    }
}

impl ChunkConfig {
    /// 설정 검증 후 생성
    pub fn new(max_words: usize, overlap_words: usize) -> Result<Self> {
        if max_words == 0 {
            anyhow::bail!("max_words must be greater than 0");
        }
        if overlap_words >= max_words {
            anyhow::bail!(
                "overlap ({}) must be smaller than max_words ({})",
                overlap_words,
                max_words
            );
        }
        Ok(Self {
            max_words,
            overlap_words,
        })
    }
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// 텍스트 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 청크로 분할
    fn chunk(&self, text: &str) -> Vec<String>;

    /// 청커 이름
    fn name(&self) -> &'static str;
}

/// 단어 윈도우 청커
#[derive(Debug, Clone, Default)]
pub struct WordChunker {
    config: ChunkConfig,
}

impl WordChunker {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }
}

impl Chunker for WordChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        chunk_words(text, self.config.max_words, self.config.overlap_words)
    }

    fn name(&self) -> &'static str {
        "WordChunker"
    }
}

/// 텍스트를 단어 윈도우로 분할
///
/// 윈도우가 텍스트 끝에 닿으면 멈춥니다. `overlap >= chunk_size` 이면
/// 중첩을 `chunk_size - 1` 로 줄입니다.
/// 중첩 단어만 담긴 꼬리 청크는 만들지 않습니다 (500단어, 크기 500 → 청크 1개).
///
/// # Arguments
/// * `text` - 분할할 텍스트
/// * `chunk_size` - 청크 당 단어 수
/// * `overlap` - 청크 간 중첩 단어 수
pub fn chunk_words(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();

    if words.is_empty() || chunk_size == 0 {
        return vec![];
    }

    let step = chunk_size - overlap.min(chunk_size - 1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));

        if end >= words.len() {
            break;
        }

        start += step;
    }

    chunks
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_words() {
        let chunks = chunk_words("a b c d e f g h i j", 4, 1);
        assert_eq!(chunks, vec!["a b c d", "d e f g", "g h i j"]);
    }

    #[test]
    fn test_chunk_words_empty() {
        assert!(chunk_words("", 4, 1).is_empty());
        assert!(chunk_words("   \n ", 4, 1).is_empty());
    }

    #[test]
    fn test_chunk_words_small_text_normalizes_whitespace() {
        assert_eq!(chunk_words("a  b\nc", 4, 1), vec!["a b c"]);
    }

    #[test]
    fn test_chunk_words_no_overlap() {
        let chunks = chunk_words("a b c d e f g h", 4, 0);
        assert_eq!(chunks, vec!["a b c d", "e f g h"]);
    }

    #[test]
    fn test_chunk_words_oversized_overlap_still_terminates() {
        let chunks = chunk_words("a b c d e", 2, 5);
        assert_eq!(chunks, vec!["a b", "b c", "c d", "d e"]);
    }

    #[test]
    fn test_chunk_words_exact_fit_has_no_overlap_tail() {
        let text = (0..500).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let chunks = chunk_words(&text, 500, 50);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].ends_with("w499"));
    }

    #[test]
    fn test_default_config_bounds() {
        let text = (0..1200).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let chunks = WordChunker::default().chunk(&text);

        assert!(chunks
            .iter()
            .all(|c| c.split_whitespace().count() <= 500));
        // 0..500, 450..950, 900..1200
        assert_eq!(chunks.len(), 3);
        assert!(chunks[1].starts_with("w450 "));
    }

    #[test]
    fn test_config_validation() {
        assert!(ChunkConfig::new(500, 50).is_ok());
        assert!(ChunkConfig::new(10, 10).is_err());
        assert!(ChunkConfig::new(0, 0).is_err());
    }
}
