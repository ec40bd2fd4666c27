//! PDF 텍스트 추출 모듈
//!
//! pdf-extract 크레이트를 사용하여 PDF에서 텍스트를 추출합니다.

use std::path::Path;

use anyhow::{Context, Result};

use super::clean_text;

/// PDF 전체 텍스트 추출 (정제됨)
///
/// 페이지 텍스트를 줄바꿈으로 이은 뒤 공백을 정리합니다.
pub fn extract_pdf_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read PDF: {:?}", path))?;

    let text = pdf_extract::extract_text_from_mem(&bytes)
        .with_context(|| format!("Failed to extract text from PDF: {:?}", path))?;

    let joined = split_pdf_pages(&text).join("\n");
    let cleaned = clean_text(&joined);

    if cleaned.is_empty() {
        tracing::warn!(
            "No text extracted from PDF: {:?}. It might be a scanned document.",
            path
        );
    }

    Ok(cleaned)
}

/// PDF 텍스트를 폼피드(\x0c) 기준으로 페이지 분리
fn split_pdf_pages(text: &str) -> Vec<&str> {
    text.split('\x0c')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
