//! 설정 모듈
//!
//! - 데이터 디렉토리 (~/.rag-indexer/)
//! - 컨텍스트 카탈로그 (contexts.json): 컨텍스트 ID → 표시 이름 + 소스 목록
//!
//! ```json
//! {
//!   "docs_internos": {
//!     "nome_exibicao": "Documentação Interna",
//!     "fontes": ["manual.md", "https://exemplo.com/artigo"]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 기본 컨텍스트 카탈로그 파일
pub const DEFAULT_CONTEXTS_FILE: &str = "contexts.json";

/// 기본 인덱스 디렉토리
pub const DEFAULT_INDEX_DIR: &str = "indices_rag";

// ============================================================================
// Data Directory
// ============================================================================

/// 데이터 디렉토리 경로 (~/.rag-indexer/)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rag-indexer")
}

// ============================================================================
// Context Catalog
// ============================================================================

/// 컨텍스트 정의
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDefinition {
    /// 표시 이름
    #[serde(rename = "nome_exibicao", alias = "display_name")]
    pub display_name: String,

    /// 소스 목록 (URL, 파일, 폴더)
    #[serde(rename = "fontes", alias = "sources", default)]
    pub sources: Vec<String>,
}

/// 컨텍스트 카탈로그
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextCatalog {
    contexts: BTreeMap<String, ContextDefinition>,
}

impl ContextCatalog {
    /// JSON 파일에서 로드
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Context catalog not found: {:?}", path))?;
        Self::from_json(&json).with_context(|| format!("Invalid context catalog: {:?}", path))
    }

    /// JSON 문자열에서 파싱
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json).context("Failed to parse contexts JSON")?;
        tracing::debug!("Loaded {} context(s)", catalog.contexts.len());
        Ok(catalog)
    }

    /// 컨텍스트 조회 (없으면 사용 가능한 ID 목록과 함께 에러)
    pub fn get(&self, id: &str) -> Result<&ContextDefinition> {
        self.contexts.get(id).ok_or_else(|| {
            anyhow::anyhow!(
                "Context '{}' not found. Available: [{}]",
                id,
                self.ids().collect::<Vec<_>>().join(", ")
            )
        })
    }

    /// 컨텍스트 ID 목록 (정렬됨)
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.contexts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextDefinition)> {
        self.contexts.iter().map(|(id, def)| (id.as_str(), def))
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
