//! Pinecone Vector Index - 호스팅 벡터 인덱스 REST 클라이언트
//!
//! 컨트롤 플레인에서 인덱스 호스트를 조회한 뒤, 데이터 플레인에 업서트/쿼리합니다.
//! ref: https://docs.pinecone.io/reference/api/introduction

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::vector::{SearchResult, VectorEntry, VectorIndex};
use crate::config::PineconeConfig;

/// 컨트롤 플레인 엔드포인트
const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";
/// API 버전 헤더 값
const API_VERSION: &str = "2024-07";
/// 업서트 배치 크기
pub const UPSERT_BATCH_SIZE: usize = 100;

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector<'a>>,
}

#[derive(Debug, Serialize)]
struct UpsertVector<'a> {
    id: String,
    values: &'a [f32],
    metadata: HashMap<&'static str, &'a str>,
}

#[derive(Debug, Deserialize)]
struct UpsertResponse {
    #[serde(rename = "upsertedCount", default)]
    upserted_count: usize,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    #[serde(rename = "topK")]
    top_k: usize,
    #[serde(rename = "includeMetadata")]
    include_metadata: bool,
    #[serde(rename = "includeValues")]
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct IndexStats {
    #[serde(rename = "totalVectorCount", default)]
    total_vector_count: usize,
}

// ============================================================================
// PineconeIndex
// ============================================================================

/// Pinecone 인덱스 클라이언트
#[derive(Debug, Clone)]
pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: String,
    /// 데이터 플레인 base URL (scheme 포함)
    host: String,
}

impl PineconeIndex {
    /// 호스트를 직접 지정하여 생성
    pub fn with_host(api_key: String, host: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            host: normalize_host(host),
        })
    }

    /// 설정으로 연결
    ///
    /// `index_host` 가 없으면 컨트롤 플레인에서 인덱스를 조회합니다.
    /// 인덱스가 없으면 실패합니다.
    pub async fn connect(config: &PineconeConfig) -> Result<Self> {
        Self::connect_with_control_plane(config, CONTROL_PLANE_URL).await
    }

    /// 지정한 컨트롤 플레인으로 연결
    pub async fn connect_with_control_plane(
        config: &PineconeConfig,
        control_plane: &str,
    ) -> Result<Self> {
        if let Some(ref host) = config.index_host {
            return Self::with_host(config.api_key.clone(), host);
        }

        let index = Self::with_host(config.api_key.clone(), control_plane)?;
        let url = format!("{}/indexes/{}", index.host, config.index_name);

        let response = index
            .client
            .get(&url)
            .header("Api-Key", &index.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .context("Failed to describe Pinecone index")?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            anyhow::bail!("Pinecone index '{}' does not exist.", config.index_name);
        }
        let body = response.text().await.context("Failed to read response body")?;
        if !status.is_success() {
            anyhow::bail!("Pinecone API error ({}): {}", status, body);
        }

        let description: IndexDescription =
            serde_json::from_str(&body).context("Failed to parse index description")?;

        tracing::info!(
            "Connected to Pinecone index '{}' at {}",
            config.index_name,
            description.host
        );

        Ok(Self {
            host: normalize_host(&description.host),
            ..index
        })
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String> {
        let url = format!("{}{}", self.host, path);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", path))?;

        let status = response.status();
        let text = response.text().await.context("Failed to read response body")?;
        if !status.is_success() {
            anyhow::bail!("Pinecone API error ({}) on {}: {}", status, path, text);
        }
        Ok(text)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, entries: &[VectorEntry]) -> Result<usize> {
        let mut total = 0;

        for (i, batch) in entries.chunks(UPSERT_BATCH_SIZE).enumerate() {
            let request = UpsertRequest {
                vectors: batch
                    .iter()
                    .map(|entry| UpsertVector {
                        id: uuid::Uuid::new_v4().to_string(),
                        values: &entry.embedding,
                        metadata: HashMap::from([
                            ("text", entry.text.as_str()),
                            ("source", entry.source.as_str()),
                        ]),
                    })
                    .collect(),
            };

            let body = self.post("/vectors/upsert", &request).await?;
            let response: UpsertResponse =
                serde_json::from_str(&body).context("Failed to parse upsert response")?;

            tracing::debug!(
                "Upserted batch {} ({} vectors)",
                i + 1,
                response.upserted_count
            );
            total += response.upserted_count;
        }

        Ok(total)
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let request = QueryRequest {
            vector: embedding,
            top_k,
            include_metadata: true,
            include_values: false,
        };

        let body = self.post("/query", &request).await?;
        let response: QueryResponse =
            serde_json::from_str(&body).context("Failed to parse query response")?;

        Ok(response
            .matches
            .into_iter()
            .filter_map(|m| {
                // text 메타데이터 없는 벡터는 건너뜀
                let text = m
                    .metadata
                    .as_ref()
                    .and_then(|meta| meta.get("text"))
                    .and_then(|v| v.as_str())?
                    .to_string();
                Some(SearchResult {
                    id: m.id,
                    text,
                    score: m.score,
                })
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        let body = self
            .post("/describe_index_stats", &serde_json::json!({}))
            .await?;
        let stats: IndexStats =
            serde_json::from_str(&body).context("Failed to parse index stats")?;
        Ok(stats.total_vector_count)
    }
}

/// scheme 없는 호스트에 https:// 추가, 끝 슬래시 제거
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;

    /// 업서트 요청별로 받은 벡터 (id, source)
    type UpsertLog = Arc<Mutex<Vec<Vec<(String, String)>>>>;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn spawn_mock() -> (String, UpsertLog) {
        let log: UpsertLog = Arc::default();

        let app = Router::new()
            .route(
                "/query",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["topK"], 2);
                    Json(json!({
                        "matches": [
                            {"id": "a", "score": 0.9, "metadata": {"text": "Ear mites cause scratching."}},
                            {"id": "b", "score": 0.5, "metadata": {"other": 1}}
                        ]
                    }))
                }),
            )
            .route(
                "/vectors/upsert",
                post(
                    |State(log): State<UpsertLog>, Json(body): Json<Value>| async move {
                        let vectors = body["vectors"].as_array().cloned().unwrap_or_default();
                        let batch: Vec<(String, String)> = vectors
                            .iter()
                            .map(|v| {
                                assert_eq!(v["metadata"]["text"], "chunk");
                                (
                                    v["id"].as_str().unwrap_or_default().to_string(),
                                    v["metadata"]["source"]
                                        .as_str()
                                        .unwrap_or_default()
                                        .to_string(),
                                )
                            })
                            .collect();
                        let n = batch.len();
                        log.lock().unwrap().push(batch);
                        Json(json!({ "upsertedCount": n }))
                    },
                ),
            )
            .route(
                "/describe_index_stats",
                post(|| async { Json(json!({ "totalVectorCount": 42, "dimension": 1536 })) }),
            )
            .with_state(log.clone());

        (serve(app).await, log)
    }

    /// 컨트롤 플레인: "vet-guides" 만 존재, "broken" 은 서버 오류
    async fn spawn_control_plane() -> String {
        let app = Router::new().route(
            "/indexes/:name",
            get(|Path(name): Path<String>| async move {
                match name.as_str() {
                    "vet-guides" => (
                        StatusCode::OK,
                        Json(json!({ "name": name, "host": "vet-guides-abc.svc.pinecone.io" })),
                    ),
                    "broken" => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": "backend unavailable" })),
                    ),
                    _ => (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))),
                }
            }),
        );
        serve(app).await
    }

    fn pinecone_config(index_name: &str, index_host: Option<&str>) -> PineconeConfig {
        PineconeConfig {
            api_key: "key".into(),
            index_name: index_name.into(),
            index_host: index_host.map(String::from),
            environment: None,
        }
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("vet-abc.svc.pinecone.io/"),
            "https://vet-abc.svc.pinecone.io"
        );
        assert_eq!(normalize_host("http://127.0.0.1:9000"), "http://127.0.0.1:9000");
    }

    #[tokio::test]
    async fn test_connect_resolves_host() {
        let control = spawn_control_plane().await;
        let config = pinecone_config("vet-guides", None);
        let index = PineconeIndex::connect_with_control_plane(&config, &control)
            .await
            .unwrap();
        assert_eq!(index.host, "https://vet-guides-abc.svc.pinecone.io");
    }

    #[tokio::test]
    async fn test_connect_missing_index() {
        let control = spawn_control_plane().await;
        let config = pinecone_config("missing", None);
        let err = PineconeIndex::connect_with_control_plane(&config, &control)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Pinecone index 'missing' does not exist.");
    }

    #[tokio::test]
    async fn test_connect_control_plane_error() {
        let control = spawn_control_plane().await;
        let config = pinecone_config("broken", None);
        let err = PineconeIndex::connect_with_control_plane(&config, &control)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("backend unavailable"));
    }

    #[tokio::test]
    async fn test_connect_with_configured_host_skips_lookup() {
        // 컨트롤 플레인 주소가 닿지 않아도 호스트가 지정되면 조회하지 않음
        let config = pinecone_config("vet-guides", Some("custom.svc.pinecone.io/"));
        let index = PineconeIndex::connect_with_control_plane(&config, "http://127.0.0.1:1")
            .await
            .unwrap();
        assert_eq!(index.host, "https://custom.svc.pinecone.io");
    }

    #[tokio::test]
    async fn test_query_skips_matches_without_text() {
        let (host, _) = spawn_mock().await;
        let index = PineconeIndex::with_host("key".into(), &host).unwrap();

        let results = index.query(&[0.1, 0.2], 2).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "a");
        assert!(results[0].text.contains("Ear mites"));
    }

    #[tokio::test]
    async fn test_upsert_batches() {
        let (host, log) = spawn_mock().await;
        let index = PineconeIndex::with_host("key".into(), &host).unwrap();

        let entries: Vec<VectorEntry> = (0..250)
            .map(|i| VectorEntry {
                text: "chunk".into(),
                source: format!("test.csv#{}", i),
                embedding: vec![0.0, 1.0],
            })
            .collect();

        assert_eq!(index.upsert(&entries).await.unwrap(), 250);

        let batches = log.lock().unwrap().clone();
        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![100, 100, 50]);

        let vectors: Vec<&(String, String)> = batches.iter().flatten().collect();
        let ids: std::collections::HashSet<&str> =
            vectors.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids.len(), 250);
        for id in &ids {
            let parsed = uuid::Uuid::parse_str(id).unwrap();
            assert_eq!(parsed.get_version_num(), 4);
        }

        // 입력 순서대로 source 메타데이터 전달
        assert_eq!(vectors[0].1, "test.csv#0");
        assert_eq!(vectors[249].1, "test.csv#249");
    }

    #[tokio::test]
    async fn test_count() {
        let (host, _) = spawn_mock().await;
        let index = PineconeIndex::with_host("key".into(), &host).unwrap();
        assert_eq!(index.count().await.unwrap(), 42);
    }
}
