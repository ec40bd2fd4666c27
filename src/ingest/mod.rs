//! 인제스트 파이프라인 - 오프라인 배치 작업
//!
//! 1. PDF 폴더 + 증상 CSV 전처리 (정제 + 청킹)
//! 2. 청크별 임베딩 생성 (고정 딜레이 재시도)
//! 3. 벡터 인덱스에 업서트

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::embedding::EmbeddingProvider;
use crate::extractor::{extract_pdf_text, load_csv_texts};
use crate::knowledge::{pair_entries, ChunkConfig, Chunker, TextChunk, VectorIndex, WordChunker};

// ============================================================================
// Retry Policy
// ============================================================================

/// 임베딩 재시도 정책 (지수 백오프 없음)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 텍스트 당 최대 시도 횟수
    pub max_attempts: u32,
    /// 실패 후 대기 시간
    pub retry_delay: Duration,
    /// 성공 후 대기 시간 (요청 속도 제한)
    pub pace: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
            pace: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// 대기 없는 정책 (테스트, dry-run 용)
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            retry_delay: Duration::ZERO,
            pace: Duration::ZERO,
        }
    }
}

// ============================================================================
// Preprocessing
// ============================================================================

/// 폴더 안의 PDF 파일 목록 (하위 폴더 제외, 이름순)
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to read directory: {:?}", dir))?;
        let is_pdf = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        if entry.file_type().is_file() && is_pdf {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// PDF 폴더 전처리
pub fn preprocess_pdf_folder(dir: &Path, chunker: &dyn Chunker) -> Result<Vec<TextChunk>> {
    let mut chunks = Vec::new();

    for path in list_pdfs(dir)? {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        tracing::info!("Processing PDF: {}", name);
        let text = extract_pdf_text(&path)?;

        chunks.extend(chunker.chunk(&text).into_iter().map(|text| TextChunk {
            text,
            source: name.clone(),
        }));
    }

    Ok(chunks)
}

/// CSV 파일 전처리
pub fn preprocess_csv_file(
    path: &Path,
    columns: Option<&[String]>,
    chunker: &dyn Chunker,
) -> Result<Vec<TextChunk>> {
    let rows = load_csv_texts(path, columns)?;
    let label = path.display().to_string();

    Ok(rows
        .into_iter()
        .flat_map(|row| {
            let source = format!("{}#{}", label, row.row);
            chunker
                .chunk(&row.text)
                .into_iter()
                .map(move |text| TextChunk {
                    text,
                    source: source.clone(),
                })
        })
        .collect())
}

// ============================================================================
// Embedding
// ============================================================================

/// 텍스트 순차 임베딩
///
/// 텍스트마다 최대 `max_attempts` 번 시도하고, 모두 실패하면 전체 작업을 중단합니다.
pub async fn embed_texts(
    embedder: &dyn EmbeddingProvider,
    texts: &[String],
    policy: RetryPolicy,
) -> Result<Vec<Vec<f32>>> {
    let mut embeddings = Vec::with_capacity(texts.len());

    for (i, text) in texts.iter().enumerate() {
        let mut attempt = 0;

        let embedding = loop {
            match embedder.embed(text).await {
                Ok(embedding) => {
                    tokio::time::sleep(policy.pace).await;
                    break embedding;
                }
                Err(e) => {
                    attempt += 1;
                    tracing::warn!("[Retry {}] Failed to embed text {}: {:#}", attempt, i, e);
                    if attempt >= policy.max_attempts {
                        anyhow::bail!(
                            "Failed to embed text after {} attempts.",
                            policy.max_attempts
                        );
                    }
                    tokio::time::sleep(policy.retry_delay).await;
                }
            }
        };

        tracing::debug!("Embedded {}/{}", i + 1, texts.len());
        embeddings.push(embedding);
    }

    Ok(embeddings)
}

// ============================================================================
// Pipeline
// ============================================================================

/// 파이프라인 입력 설정
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub pdf_dir: Option<PathBuf>,
    pub csv_file: Option<PathBuf>,
    pub csv_columns: Option<Vec<String>>,
    pub chunk: ChunkConfig,
    pub retry: RetryPolicy,
}

/// 파이프라인 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub pdf_chunks: usize,
    pub csv_chunks: usize,
    pub upserted: usize,
}

impl IngestReport {
    pub fn total_chunks(&self) -> usize {
        self.pdf_chunks + self.csv_chunks
    }
}

/// 1단계: 전처리만 수행
pub fn preprocess(options: &IngestOptions) -> Result<(Vec<TextChunk>, IngestReport)> {
    let chunker = WordChunker::new(options.chunk);

    let pdf_chunks = match options.pdf_dir {
        Some(ref dir) => preprocess_pdf_folder(dir, &chunker)?,
        None => Vec::new(),
    };
    let csv_chunks = match options.csv_file {
        Some(ref path) => preprocess_csv_file(path, options.csv_columns.as_deref(), &chunker)?,
        None => Vec::new(),
    };

    let report = IngestReport {
        pdf_chunks: pdf_chunks.len(),
        csv_chunks: csv_chunks.len(),
        upserted: 0,
    };

    let mut all = pdf_chunks;
    all.extend(csv_chunks);
    Ok((all, report))
}

/// 전체 파이프라인 실행
pub async fn run(
    options: &IngestOptions,
    embedder: &dyn EmbeddingProvider,
    index: &dyn VectorIndex,
) -> Result<IngestReport> {
    tracing::info!("Step 1: Preprocessing data...");
    let (chunks, mut report) = preprocess(options)?;
    tracing::info!(
        "Total chunks: {} (pdf={}, csv={})",
        report.total_chunks(),
        report.pdf_chunks,
        report.csv_chunks
    );

    if chunks.is_empty() {
        tracing::warn!("Nothing to embed");
        return Ok(report);
    }

    tracing::info!("Step 2: Generating embeddings ({})...", embedder.name());
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings = embed_texts(embedder, &texts, options.retry).await?;

    tracing::info!("Step 3: Uploading embeddings to vector index...");
    let entries = pair_entries(&chunks, embeddings)?;
    report.upserted = index
        .upsert(&entries)
        .await
        .context("Failed to upsert embeddings")?;

    tracing::info!("Embedding pipeline completed ({} vectors)", report.upserted);
    Ok(report)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::knowledge::{SearchResult, VectorEntry};

    /// 처음 `failures` 번 실패하는 임베더
    struct FlakyEmbedder {
        failures: usize,
        calls: AtomicUsize,
    }

    impl FlakyEmbedder {
        fn new(failures: usize) -> Self {
            Self {
                failures,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FlakyEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                anyhow::bail!("rate limited");
            }
            Ok(vec![text.len() as f32])
        }
        fn dimension(&self) -> usize {
            1
        }
        fn name(&self) -> &str {
            "flaky"
        }
    }

    #[derive(Default)]
    struct MemoryIndex {
        entries: Mutex<Vec<VectorEntry>>,
    }

    #[async_trait]
    impl VectorIndex for MemoryIndex {
        async fn upsert(&self, entries: &[VectorEntry]) -> Result<usize> {
            self.entries.lock().unwrap().extend_from_slice(entries);
            Ok(entries.len())
        }
        async fn query(&self, _embedding: &[f32], _top_k: usize) -> Result<Vec<SearchResult>> {
            Ok(vec![])
        }
        async fn count(&self) -> Result<usize> {
            Ok(self.entries.lock().unwrap().len())
        }
    }

    #[tokio::test]
    async fn test_embed_recovers_within_attempts() {
        let embedder = FlakyEmbedder::new(2);
        let texts = vec!["abc".to_string()];

        let embeddings = embed_texts(&embedder, &texts, RetryPolicy::immediate(3))
            .await
            .unwrap();
        assert_eq!(embeddings, vec![vec![3.0]]);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_embed_gives_up_after_max_attempts() {
        let embedder = FlakyEmbedder::new(10);
        let texts = vec!["abc".to_string()];

        let err = embed_texts(&embedder, &texts, RetryPolicy::immediate(3))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to embed text after 3 attempts.");
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.retry_delay, Duration::from_secs(1));
        assert_eq!(policy.pace, Duration::from_millis(500));
    }

    #[test]
    fn test_list_pdfs_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.pdf"), b"x").unwrap();

        let files = list_pdfs(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[tokio::test]
    async fn test_run_csv_only() {
        let mut csv = tempfile::NamedTempFile::new().unwrap();
        writeln!(csv, "symptom,suggestion").unwrap();
        writeln!(csv, "dog vomiting,Offer small amounts of water").unwrap();
        writeln!(csv, "cat sneezing,Keep her warm").unwrap();
        csv.flush().unwrap();

        let options = IngestOptions {
            pdf_dir: None,
            csv_file: Some(csv.path().to_path_buf()),
            csv_columns: None,
            chunk: ChunkConfig::default(),
            retry: RetryPolicy::immediate(3),
        };
        let embedder = FlakyEmbedder::new(0);
        let index = MemoryIndex::default();

        let report = run(&options, &embedder, &index).await.unwrap();
        assert_eq!(report.csv_chunks, 2);
        assert_eq!(report.upserted, 2);

        let stored = index.entries.lock().unwrap();
        assert_eq!(stored[0].text, "dog vomiting Offer small amounts of water");
        assert!(stored[1].source.ends_with("#2"));
    }
}
