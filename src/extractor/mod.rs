//! 콘텐츠 추출 모듈
//!
//! 인제스트 대상 파일에서 정제된 텍스트를 추출합니다.
//! - PDF 파일: pdf-extract로 텍스트 추출
//! - CSV 파일: 행별 텍스트 컬럼 결합

mod table;
mod pdf;

use std::sync::OnceLock;

use regex::Regex;

pub use table::{load_csv_texts, CsvRowText};
pub use pdf::extract_pdf_text;

/// 기본 텍스트 정제
///
/// 줄바꿈을 공백으로 바꾸고, 연속 공백을 하나로 줄인 뒤 앞뒤 공백을 제거합니다.
pub fn clean_text(text: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let re = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"));

    let text = text.replace(['\n', '\r'], " ");
    re.replace_all(&text, " ").trim().to_string()
}

// ============================================================================
// Tests
// ============================================================================
