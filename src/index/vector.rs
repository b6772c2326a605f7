//! 청크 벡터 저장소 트레이트와 레코드 타입

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// 저장할 청크 레코드
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// 인덱스 내 순번 (0부터)
    pub chunk_index: i32,
    pub content: String,
    pub is_code: bool,
    pub metadata: BTreeMap<String, String>,
    pub embedding: Vec<f32>,
}

/// 검색 결과
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub chunk_index: i32,
    pub content: String,
    pub is_code: bool,
    pub metadata: BTreeMap<String, String>,
    /// 유사도 스코어 (0.0 ~ 1.0, 클수록 가까움)
    pub score: f32,
}

/// 청크 벡터 저장소
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// 엔트리 전체 기록 (기존 내용 대체)
    async fn write_all(&self, entries: &[IndexEntry]) -> Result<usize>;

    /// 최근접 청크 검색 (가까운 순)
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>>;

    /// 저장된 청크 수
    async fn count(&self) -> Result<usize>;
}

/// L2 거리 → 유사도
pub fn distance_to_score(distance: f32) -> f32 {
    1.0 / (1.0 + distance.max(0.0))
}
