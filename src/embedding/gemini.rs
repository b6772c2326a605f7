//! Google Gemini 임베딩 프로바이더
//!
//! `batchEmbedContents`로 최대 100개씩 묶어 요청하고,
//! 요청 간 최소 간격과 429 응답 시 지수 백오프를 적용합니다.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{EmbeddingProvider, TaskType};

const MODEL: &str = "models/gemini-embedding-001";
const BATCH_EMBED_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models/\
                               gemini-embedding-001:batchEmbedContents";

/// 기본 임베딩 차원
pub const DEFAULT_DIMENSION: usize = 768;

/// 지원 차원 (MRL)
const SUPPORTED_DIMENSIONS: &[usize] = &[768, 1536, 3072];

/// 요청당 최대 텍스트 수
const MAX_BATCH: usize = 100;

/// 요청 간 최소 간격 (무료 티어 60 RPM)
const MIN_INTERVAL: Duration = Duration::from_secs(1);
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(2);

// ============================================================================
// Request pacing
// ============================================================================

/// 마지막 요청 시각을 기억해 최소 간격을 보장
#[derive(Debug)]
struct Pacer {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(at) = *last {
            let elapsed = at.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'static str,
    content: Content<'a>,
    task_type: &'static str,
    output_dimensionality: usize,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    embeddings: Vec<Values>,
}

#[derive(Debug, Deserialize)]
struct Values {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    status: String,
}

// ============================================================================
// GeminiEmbedding
// ============================================================================

/// Google Gemini 임베딩 구현체
#[derive(Debug)]
pub struct GeminiEmbedding {
    api_key: String,
    client: reqwest::Client,
    dimension: usize,
    pacer: Pacer,
}

impl GeminiEmbedding {
    /// `dimension`은 768, 1536, 3072 중 하나
    pub fn new(api_key: String, dimension: usize) -> Result<Self> {
        if !SUPPORTED_DIMENSIONS.contains(&dimension) {
            anyhow::bail!(
                "Invalid dimension: {}. Must be one of {:?}",
                dimension,
                SUPPORTED_DIMENSIONS
            );
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            client,
            dimension,
            pacer: Pacer::new(MIN_INTERVAL),
        })
    }

    /// 비어 있지 않은 텍스트 묶음 임베딩 (최대 MAX_BATCH개)
    async fn embed_batch(&self, texts: &[&str], task: TaskType) -> Result<Vec<Vec<f32>>> {
        let request = BatchRequest {
            requests: texts
                .iter()
                .map(|&text| EmbedRequest {
                    model: MODEL,
                    content: Content {
                        parts: [Part { text }],
                    },
                    task_type: task.as_str(),
                    output_dimensionality: self.dimension,
                })
                .collect(),
        };

        let body = self.post_with_retry(&request).await?;
        let response: BatchResponse =
            serde_json::from_str(&body).context("Failed to parse embedding response")?;

        if response.embeddings.len() != texts.len() {
            anyhow::bail!(
                "Embedding count mismatch: sent {}, received {}",
                texts.len(),
                response.embeddings.len()
            );
        }

        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }

    /// 429와 전송 실패는 지수 백오프로 재시도, 그 밖의 오류는 즉시 실패
    async fn post_with_retry<T: Serialize + Sync>(&self, request: &T) -> Result<String> {
        let mut backoff = INITIAL_BACKOFF;
        let mut attempt = 0;

        loop {
            self.pacer.wait().await;

            let result = self
                .client
                .post(BATCH_EMBED_URL)
                .header("x-goog-api-key", &self.api_key)
                .json(request)
                .send()
                .await;

            let retryable = match result {
                Ok(response) => {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .context("Failed to read response body")?;

                    if status.is_success() {
                        return Ok(body);
                    }
                    if status.as_u16() != 429 {
                        match serde_json::from_str::<ApiError>(&body) {
                            Ok(e) => anyhow::bail!(
                                "Gemini API error ({}): {}",
                                e.error.status,
                                e.error.message
                            ),
                            Err(_) => anyhow::bail!("Gemini API error ({}): {}", status, body),
                        }
                    }
                    anyhow::anyhow!("Rate limit exceeded (429)")
                }
                Err(e) => anyhow::Error::new(e).context("Failed to send embedding request"),
            };

            if attempt == MAX_RETRIES {
                return Err(retryable
                    .context(format!("Embedding failed after {} retries", MAX_RETRIES)));
            }

            tracing::warn!(
                "{:#}, retrying in {:?} (attempt {}/{})",
                retryable,
                backoff,
                attempt + 1,
                MAX_RETRIES
            );
            tokio::time::sleep(backoff).await;
            backoff *= 2;
            attempt += 1;
        }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedding {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // 빈 텍스트는 API에 보내지 않고 영벡터
        let mut results = vec![vec![0.0; self.dimension]; texts.len()];
        let pending: Vec<(usize, &str)> = texts
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(i, text)| (i, text.as_str()))
            .collect();

        let total_batches = pending.len().div_ceil(MAX_BATCH);
        for (n, batch) in pending.chunks(MAX_BATCH).enumerate() {
            tracing::debug!("Embedding batch {}/{}", n + 1, total_batches);

            let batch_texts: Vec<&str> = batch.iter().map(|(_, text)| *text).collect();
            let vectors = self
                .embed_batch(&batch_texts, TaskType::RetrievalDocument)
                .await?;

            for ((index, _), vector) in batch.iter().zip(vectors) {
                results[*index] = vector;
            }
        }

        Ok(results)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(vec![0.0; self.dimension]);
        }

        self.embed_batch(&[text], TaskType::RetrievalQuery)
            .await?
            .pop()
            .context("Empty embedding response")
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "gemini-embedding-001"
    }
}
