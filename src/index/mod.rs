//! 인덱스 관리 모듈
//!
//! 컨텍스트 하나 = 인덱스 디렉토리 하나 (`<base_dir>/<context_id>/`).
//!
//! 생성 흐름: 소스 로드 → 청킹 → 임베딩 → 임시 디렉토리에 기록 → 기존 인덱스와 교체.
//! 중간에 실패하면 기존 인덱스는 그대로 남습니다.

pub mod lance;
pub mod vector;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chunker::{ChunkConfig, SentenceChunker};
use crate::config::ContextDefinition;
use crate::document::{Document, META_CHUNK_TYPE};
use crate::embedding::EmbeddingProvider;
use crate::loader::DocumentLoader;

pub use lance::LanceChunkStore;
pub use vector::{ChunkStore, IndexEntry, SearchHit};

/// 인덱스 요약 파일
const MANIFEST_FILE: &str = "index.json";

/// 빌드 중 임시 디렉토리 접미사
const BUILDING_SUFFIX: &str = ".building";

// ============================================================================
// Manifest
// ============================================================================

/// 인덱스 요약 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    pub context_id: String,
    pub display_name: String,
    pub documents: usize,
    pub chunks: usize,
    pub code_chunks: usize,
    pub embedder: String,
    pub dimension: usize,
    pub created_at: DateTime<Utc>,
}

impl IndexManifest {
    fn load(index_dir: &Path) -> Result<Self> {
        let path = index_dir.join(MANIFEST_FILE);
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read manifest: {:?}", path))?;
        serde_json::from_str(&json).with_context(|| format!("Invalid manifest: {:?}", path))
    }

    fn save(&self, index_dir: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(index_dir.join(MANIFEST_FILE), json).context("Failed to write manifest")
    }
}

// ============================================================================
// IndexManager
// ============================================================================

/// 컨텍스트별 인덱스 관리자
pub struct IndexManager {
    base_dir: PathBuf,
    chunker: SentenceChunker,
}

impl IndexManager {
    /// 인덱싱 기본 설정(`ChunkConfig::for_index`)과 내장 문장 분할기 사용
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            chunker: SentenceChunker::with_builtin(ChunkConfig::for_index()),
        }
    }

    /// 청커 교체 (예: 캐시된 분할 모델 사용)
    pub fn with_chunker(mut self, chunker: SentenceChunker) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn index_dir(&self, context_id: &str) -> PathBuf {
        self.base_dir.join(context_id)
    }

    pub fn exists(&self, context_id: &str) -> bool {
        self.index_dir(context_id).join(MANIFEST_FILE).is_file()
    }

    /// 인덱스 생성 또는 재생성
    pub async fn create_or_update(
        &self,
        context_id: &str,
        definition: &ContextDefinition,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<IndexManifest> {
        validate_context_id(context_id)?;

        if definition.sources.is_empty() {
            anyhow::bail!("Context '{}' has no sources", context_id);
        }

        tracing::info!(
            "Indexing '{}' ({}) from {} source(s)",
            context_id,
            definition.display_name,
            definition.sources.len()
        );

        let documents = DocumentLoader::new().load_all(&definition.sources).await;
        let chunks: Vec<Document> = documents
            .iter()
            .flat_map(|doc| self.chunker.chunk_document(doc))
            .collect();

        if chunks.is_empty() {
            anyhow::bail!(
                "No chunks produced for context '{}' ({} document(s) loaded)",
                context_id,
                documents.len()
            );
        }
        tracing::info!(
            "{} document(s) → {} chunk(s)",
            documents.len(),
            chunks.len()
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.content().to_string()).collect();
        let embeddings = embedder
            .embed_documents(&texts)
            .await
            .context("Failed to embed chunks")?;
        if embeddings.len() != chunks.len() {
            anyhow::bail!(
                "Embedder returned {} vector(s) for {} chunk(s)",
                embeddings.len(),
                chunks.len()
            );
        }

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (chunk, embedding))| IndexEntry {
                chunk_index: i as i32,
                is_code: chunk.get(META_CHUNK_TYPE) == Some("code"),
                content: chunk.content().to_string(),
                metadata: chunk.metadata().clone(),
                embedding,
            })
            .collect();

        let manifest = IndexManifest {
            context_id: context_id.to_string(),
            display_name: definition.display_name.clone(),
            documents: documents.len(),
            chunks: entries.len(),
            code_chunks: entries.iter().filter(|e| e.is_code).count(),
            embedder: embedder.name().to_string(),
            dimension: embedder.dimension(),
            created_at: Utc::now(),
        };

        // 임시 디렉토리에 빌드 후 교체
        let staging = self
            .base_dir
            .join(format!("{}{}", context_id, BUILDING_SUFFIX));
        if staging.exists() {
            std::fs::remove_dir_all(&staging).context("Failed to clear staging directory")?;
        }

        let build = async {
            let store = LanceChunkStore::open(&staging).await?;
            store.write_all(&entries).await?;
            manifest.save(&staging)
        };
        if let Err(e) = build.await {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(e.context(format!("Failed to build index '{}'", context_id)));
        }

        let target = self.index_dir(context_id);
        if target.exists() {
            tracing::info!("Replacing existing index: {:?}", target);
            std::fs::remove_dir_all(&target)
                .with_context(|| format!("Failed to remove old index: {:?}", target))?;
        }
        std::fs::rename(&staging, &target)
            .with_context(|| format!("Failed to move index into place: {:?}", target))?;

        tracing::info!("Index '{}' ready at {:?}", context_id, target);
        Ok(manifest)
    }

    /// 인덱스 삭제. 없으면 경고 후 false
    pub fn delete(&self, context_id: &str) -> Result<bool> {
        validate_context_id(context_id)?;

        let dir = self.index_dir(context_id);
        if !dir.exists() {
            tracing::warn!("Index '{}' not found at {:?}", context_id, dir);
            return Ok(false);
        }

        std::fs::remove_dir_all(&dir)
            .with_context(|| format!("Failed to delete index: {:?}", dir))?;
        tracing::info!("Deleted index '{}'", context_id);
        Ok(true)
    }

    /// 인덱스 검색
    pub async fn query(
        &self,
        context_id: &str,
        text: &str,
        limit: usize,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Vec<SearchHit>> {
        validate_context_id(context_id)?;
        if !self.exists(context_id) {
            anyhow::bail!("Index '{}' does not exist. Create it first.", context_id);
        }

        let manifest = IndexManifest::load(&self.index_dir(context_id))?;
        if manifest.dimension != embedder.dimension() {
            anyhow::bail!(
                "Index '{}' was built with dimension {}, embedder has {}",
                context_id,
                manifest.dimension,
                embedder.dimension()
            );
        }

        let query_embedding = embedder.embed_query(text).await?;
        let store = LanceChunkStore::open(&self.index_dir(context_id)).await?;
        store.search(&query_embedding, limit).await
    }

    /// 인덱스 요약 조회
    pub fn manifest(&self, context_id: &str) -> Result<IndexManifest> {
        IndexManifest::load(&self.index_dir(context_id))
    }

    /// 존재하는 인덱스 목록 (이름순)
    pub fn list(&self) -> Result<Vec<IndexManifest>> {
        if !self.base_dir.exists() {
            return Ok(vec![]);
        }

        let mut manifests = Vec::new();
        for entry in std::fs::read_dir(&self.base_dir)
            .with_context(|| format!("Failed to read {:?}", self.base_dir))?
        {
            let path = entry?.path();
            if !path.is_dir() || !path.join(MANIFEST_FILE).is_file() {
                continue;
            }
            match IndexManifest::load(&path) {
                Ok(manifest) => manifests.push(manifest),
                Err(e) => tracing::warn!("Skipping unreadable index {:?}: {:#}", path, e),
            }
        }

        manifests.sort_by(|a, b| a.context_id.cmp(&b.context_id));
        Ok(manifests)
    }
}

/// 컨텍스트 ID는 디렉토리 이름으로 쓰이므로 경로 구분자 금지
fn validate_context_id(context_id: &str) -> Result<()> {
    let valid = !context_id.is_empty()
        && !context_id.starts_with('.')
        && context_id
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !valid {
        anyhow::bail!("Invalid context id: '{}'", context_id);
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
