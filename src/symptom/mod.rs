//! 증상 매칭 모듈 - CSV 기반 TF-IDF 증상 검색
//!
//! 증상-조언 CSV를 한 번 로드하고, 사용자 입력과 가장 비슷한 증상의 조언을 반환합니다.
//! 임베딩 기반 검색(RAG)과는 독립적인 빠른 어휘 매칭입니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let checker = SymptomChecker::from_csv("data/vet_guides.csv".as_ref(), "symptom", "suggestion")?;
//! let advice = checker.suggestions("my puppy has worms", DEFAULT_THRESHOLD);
//! ```

mod stop_words;
mod tfidf;

use std::path::Path;

use anyhow::{Context, Result};

pub use stop_words::{is_stop_word, ENGLISH_STOP_WORDS};
pub use tfidf::{cosine_similarity, tokenize, SparseVector, TfidfVectorizer};

/// 단독 사용 시 기본 유사도 임계값
pub const DEFAULT_THRESHOLD: f32 = 0.3;
/// 검색할 상위 매칭 수
pub const DEFAULT_TOP_K: usize = 3;
/// 매칭 결과가 없을 때 안내 문구
pub const NO_MATCH_MESSAGE: &str =
    "No close matches found. Please consult a veterinarian for specific advice.";

// ============================================================================
// Types
// ============================================================================

/// CSV 한 행 (증상, 조언)
#[derive(Debug, Clone, PartialEq)]
pub struct SymptomRecord {
    pub symptom: String,
    pub suggestion: String,
}

/// 매칭 결과
#[derive(Debug, Clone, PartialEq)]
pub struct SymptomMatch {
    pub symptom: String,
    /// 코사인 유사도 (0.0 ~ 1.0)
    pub score: f32,
    pub suggestion: String,
}

// ============================================================================
// SymptomChecker
// ============================================================================

/// TF-IDF 증상 검색기
#[derive(Debug, Clone)]
pub struct SymptomChecker {
    records: Vec<SymptomRecord>,
    vectorizer: TfidfVectorizer,
    symptom_vectors: Vec<SparseVector>,
}

impl SymptomChecker {
    /// 레코드 목록으로 생성 (TF-IDF 학습)
    pub fn new(records: Vec<SymptomRecord>) -> Self {
        let texts: Vec<String> = records.iter().map(|r| r.symptom.clone()).collect();
        let vectorizer = TfidfVectorizer::fit(&texts);
        let symptom_vectors = texts.iter().map(|t| vectorizer.transform(t)).collect();

        tracing::debug!(
            "Symptom checker fitted: {} records, {} terms",
            records.len(),
            vectorizer.vocabulary_len()
        );

        Self {
            records,
            vectorizer,
            symptom_vectors,
        }
    }

    /// CSV 파일에서 로드
    ///
    /// # Arguments
    /// * `path` - CSV 경로 (헤더 필수)
    /// * `symptom_col` - 증상 컬럼 이름
    /// * `suggestion_col` - 조언 컬럼 이름
    pub fn from_csv(path: &Path, symptom_col: &str, suggestion_col: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open symptom CSV: {:?}", path))?;

        let headers = reader
            .headers()
            .with_context(|| format!("Failed to read CSV header: {:?}", path))?
            .clone();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| anyhow::anyhow!("Column '{}' not found in {:?}", name, path))
        };
        let symptom_idx = column(symptom_col)?;
        let suggestion_idx = column(suggestion_col)?;

        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record =
                result.with_context(|| format!("Failed to parse CSV row {} in {:?}", row + 1, path))?;

            // 빈 셀은 빈 문자열로 취급
            records.push(SymptomRecord {
                symptom: record.get(symptom_idx).unwrap_or_default().trim().to_string(),
                suggestion: record.get(suggestion_idx).unwrap_or_default().trim().to_string(),
            });
        }

        tracing::info!("Loaded {} symptom records from {:?}", records.len(), path);
        Ok(Self::new(records))
    }

    /// 레코드 수
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 입력과 가장 비슷한 증상 상위 `top_k` 개
    ///
    /// 유사도 내림차순, 동점이면 CSV 순서를 유지합니다.
    pub fn find_closest(&self, input: &str, top_k: usize) -> Vec<SymptomMatch> {
        let query = self.vectorizer.transform(input);

        let mut scored: Vec<(usize, f32)> = self
            .symptom_vectors
            .iter()
            .map(|v| cosine_similarity(&query, v))
            .enumerate()
            .collect();

        // sort_by는 안정 정렬
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(idx, score)| {
                let record = &self.records[idx];
                SymptomMatch {
                    symptom: record.symptom.clone(),
                    score,
                    suggestion: record.suggestion.clone(),
                }
            })
            .collect()
    }

    /// 임계값 이상인 상위 매칭의 조언 목록
    ///
    /// 해당하는 매칭이 없으면 빈 벡터를 반환합니다 (호출자가 [`NO_MATCH_MESSAGE`] 사용).
    pub fn suggestions(&self, input: &str, threshold: f32) -> Vec<String> {
        self.find_closest(input, DEFAULT_TOP_K)
            .into_iter()
            .filter(|m| m.score >= threshold)
            .map(|m| m.suggestion)
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
