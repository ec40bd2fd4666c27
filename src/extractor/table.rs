//! CSV 텍스트 추출 모듈
//!
//! 행마다 텍스트 컬럼 값을 공백으로 이어 한 문서로 만듭니다.

use std::path::Path;

use anyhow::{Context, Result};

use super::clean_text;

/// CSV 행 텍스트
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRowText {
    /// 1부터 시작하는 데이터 행 번호
    pub row: usize,
    pub text: String,
}

/// CSV에서 행별 텍스트 로드
///
/// # Arguments
/// * `path` - CSV 경로 (헤더 필수)
/// * `columns` - 사용할 컬럼 이름. `None` 이면 숫자가 아닌 값이 있는 모든 컬럼
pub fn load_csv_texts(path: &Path, columns: Option<&[String]>) -> Result<Vec<CsvRowText>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV: {:?}", path))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header: {:?}", path))?
        .clone();

    let rows: Vec<csv::StringRecord> = reader
        .records()
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("Failed to parse CSV: {:?}", path))?;

    let indices: Vec<usize> = match columns {
        Some(names) => names
            .iter()
            .map(|name| {
                headers
                    .iter()
                    .position(|h| h.trim() == name)
                    .ok_or_else(|| anyhow::anyhow!("Column '{}' not found in {:?}", name, path))
            })
            .collect::<Result<_>>()?,
        None => (0..headers.len())
            .filter(|&i| is_text_column(&rows, i))
            .collect(),
    };

    let texts = rows
        .iter()
        .enumerate()
        .filter_map(|(i, record)| {
            let combined = indices
                .iter()
                .filter_map(|&idx| record.get(idx))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            let text = clean_text(&combined);
            (!text.is_empty()).then_some(CsvRowText { row: i + 1, text })
        })
        .collect();

    Ok(texts)
}

/// 비어있지 않은 값 중 숫자로 해석되지 않는 값이 하나라도 있으면 텍스트 컬럼
fn is_text_column(rows: &[csv::StringRecord], idx: usize) -> bool {
    rows.iter()
        .filter_map(|r| r.get(idx))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .any(|v| v.parse::<f64>().is_err())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_default_columns_skip_numeric() {
        let file = write_csv(
            "id,symptom,suggestion\n1,dog vomiting,\"Offer water\nslowly\"\n2,cat sneezing,Monitor\n",
        );
        let texts = load_csv_texts(file.path(), None).unwrap();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].text, "dog vomiting Offer water slowly");
        assert_eq!(texts[1].row, 2);
    }

    #[test]
    fn test_named_columns_and_empty_rows() {
        let file = write_csv("symptom,suggestion\n,\nfever,Rest\n");
        let columns = vec!["suggestion".to_string()];
        let texts = load_csv_texts(file.path(), Some(&columns)).unwrap();
        assert_eq!(
            texts,
            vec![CsvRowText {
                row: 2,
                text: "Rest".to_string()
            }]
        );
    }

    #[test]
    fn test_unknown_column() {
        let file = write_csv("symptom\nfever\n");
        let columns = vec!["advice".to_string()];
        assert!(load_csv_texts(file.path(), Some(&columns)).is_err());
    }
}
