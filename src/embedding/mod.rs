//! 임베딩 모듈 - 청크/질의 텍스트 벡터화
//!
//! 인덱싱 시에는 문서용, 검색 시에는 질의용 임베딩을 구분해 요청합니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = create_embedder()?;
//! let vectors = embedder.embed_documents(&chunks).await?;
//! let query = embedder.embed_query("como configurar o proxy?").await?;
//! ```

pub mod gemini;

use anyhow::Result;
use async_trait::async_trait;

pub use gemini::{GeminiEmbedding, DEFAULT_DIMENSION};

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 용도
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    /// 인덱스에 저장할 청크
    RetrievalDocument,
    /// 검색 질의
    RetrievalQuery,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::RetrievalDocument => "RETRIEVAL_DOCUMENT",
            TaskType::RetrievalQuery => "RETRIEVAL_QUERY",
        }
    }
}

/// 임베딩 프로바이더 트레이트
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 문서(청크) 임베딩. 입력 순서와 같은 순서로 반환합니다.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// 질의 임베딩
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// 임베딩 차원 수
    fn dimension(&self) -> usize;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// API Key Management
// ============================================================================

/// API 키 환경변수 (우선순위 순)
const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_AI_API_KEY"];

/// 환경변수에서 API 키 로드
pub fn get_api_key() -> Result<String> {
    for var in API_KEY_VARS {
        if let Ok(key) = std::env::var(var) {
            if !key.trim().is_empty() {
                tracing::debug!("Using API key from {}", var);
                return Ok(key);
            }
        }
    }

    anyhow::bail!(
        "API key not found. Set GEMINI_API_KEY or GOOGLE_AI_API_KEY environment variable.\n\
         Get your API key at: https://aistudio.google.com/app/apikey"
    )
}

pub fn has_api_key() -> bool {
    get_api_key().is_ok()
}

// ============================================================================
// Factory Function
// ============================================================================

/// 환경변수의 API 키로 Gemini 임베딩 프로바이더 생성
pub fn create_embedder() -> Result<GeminiEmbedding> {
    let embedder = GeminiEmbedding::new(get_api_key()?, DEFAULT_DIMENSION)?;
    tracing::info!(
        "Using {} (dimension: {})",
        embedder.name(),
        embedder.dimension()
    );
    Ok(embedder)
}
