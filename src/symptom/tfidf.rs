//! TF-IDF 벡터화
//!
//! scikit-learn `TfidfVectorizer(stop_words='english')` 기본 동작과 같은 가중치를 사용합니다.
//! - 소문자 변환, 2글자 이상 단어 토큰 (`\b\w\w+\b`)
//! - smooth idf: `ln((1 + n) / (1 + df)) + 1`
//! - L2 정규화

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use super::stop_words::is_stop_word;

/// 희소 벡터 (term index -> weight)
pub type SparseVector = HashMap<usize, f32>;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"))
}

/// 텍스트를 토큰으로 분리 (불용어 제외)
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    token_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

/// 학습된 TF-IDF 모델
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    /// 문서 집합으로 어휘와 idf 학습
    pub fn fit(documents: &[String]) -> Self {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: Vec<usize> = Vec::new();

        for doc in documents {
            let mut seen: Vec<usize> = Vec::new();
            for token in tokenize(doc) {
                let next = vocabulary.len();
                let idx = *vocabulary.entry(token).or_insert(next);
                if idx == doc_freq.len() {
                    doc_freq.push(0);
                }
                if !seen.contains(&idx) {
                    seen.push(idx);
                    doc_freq[idx] += 1;
                }
            }
        }

        let n = documents.len() as f32;
        let idf = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        Self { vocabulary, idf }
    }

    /// 어휘 크기
    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// 텍스트를 정규화된 TF-IDF 벡터로 변환
    ///
    /// 어휘에 없는 토큰은 무시합니다. 매칭되는 토큰이 없으면 빈 벡터입니다.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut vector: SparseVector = HashMap::new();
        for token in tokenize(text) {
            if let Some(&idx) = self.vocabulary.get(&token) {
                *vector.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        for (idx, weight) in vector.iter_mut() {
            *weight *= self.idf[*idx];
        }

        let norm = vector.values().map(|w| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for weight in vector.values_mut() {
                *weight /= norm;
            }
        }

        vector
    }
}

/// 정규화된 희소 벡터 간 코사인 유사도 (0.0 ~ 1.0)
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f32 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f32 = small
        .iter()
        .filter_map(|(idx, w)| large.get(idx).map(|v| w * v))
        .sum();
    dot.clamp(0.0, 1.0)
}

// ============================================================================
// Tests
// ============================================================================
