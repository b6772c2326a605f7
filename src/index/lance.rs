//! LanceDB 청크 저장소
//!
//! 컨텍스트 인덱스 하나가 LanceDB 데이터베이스 하나(디렉토리)이며
//! 그 안에 `chunks` 테이블 하나를 둡니다. 임베딩 차원은 첫 기록 시 결정됩니다.
//! ref: https://lancedb.github.io/lancedb/

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow_array::{
    Array, BooleanArray, FixedSizeListArray, Float32Array, Int32Array, RecordBatch,
    RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::connection::Connection;
use lancedb::query::{ExecutableQuery, QueryBase};

use super::vector::{distance_to_score, ChunkStore, IndexEntry, SearchHit};

/// 청크 테이블 이름
const TABLE_NAME: &str = "chunks";

/// LanceDB 청크 저장소
pub struct LanceChunkStore {
    db: Connection,
}

impl LanceChunkStore {
    /// 디렉토리의 LanceDB 열기 (없으면 생성)
    pub async fn open(path: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(path)
            .await
            .with_context(|| format!("Failed to create index directory: {:?}", path))?;

        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid path encoding: {:?}", path))?;

        let db = lancedb::connect(path_str)
            .execute()
            .await
            .context("Failed to connect to LanceDB")?;

        Ok(Self { db })
    }

    fn schema(dimension: i32) -> Schema {
        Schema::new(vec![
            Field::new("chunk_index", DataType::Int32, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("is_code", DataType::Boolean, false),
            Field::new("metadata", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    dimension,
                ),
                false,
            ),
        ])
    }

    /// 엔트리 → RecordBatch (모든 임베딩은 같은 차원이어야 함)
    fn entries_to_batch(entries: &[IndexEntry]) -> Result<RecordBatch> {
        let first = entries
            .first()
            .context("Cannot create batch from empty entries")?;
        let dimension = first.embedding.len();
        if dimension == 0 {
            anyhow::bail!("Embedding dimension must be positive");
        }
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimension) {
            anyhow::bail!(
                "Chunk {} has dimension {}, expected {}",
                bad.chunk_index,
                bad.embedding.len(),
                dimension
            );
        }
        let dimension = i32::try_from(dimension).context("Embedding dimension too large")?;

        let metadata = entries
            .iter()
            .map(|e| serde_json::to_string(&e.metadata))
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to serialize chunk metadata")?;

        let values = Float32Array::from(
            entries
                .iter()
                .flat_map(|e| e.embedding.iter().copied())
                .collect::<Vec<f32>>(),
        );
        let embeddings = FixedSizeListArray::try_new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            dimension,
            Arc::new(values) as Arc<dyn Array>,
            None,
        )
        .context("Failed to create embedding array")?;

        RecordBatch::try_new(
            Arc::new(Self::schema(dimension)),
            vec![
                Arc::new(Int32Array::from_iter_values(
                    entries.iter().map(|e| e.chunk_index),
                )),
                Arc::new(StringArray::from_iter_values(
                    entries.iter().map(|e| e.content.as_str()),
                )),
                Arc::new(BooleanArray::from(
                    entries.iter().map(|e| e.is_code).collect::<Vec<bool>>(),
                )),
                Arc::new(StringArray::from(metadata)),
                Arc::new(embeddings),
            ],
        )
        .context("Failed to create RecordBatch")
    }

    /// 검색 결과 배치 → SearchHit
    fn batch_to_hits(batch: &RecordBatch) -> Result<Vec<SearchHit>> {
        fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
            batch
                .column_by_name(name)
                .and_then(|c| c.as_any().downcast_ref::<T>())
                .ok_or_else(|| anyhow::anyhow!("Missing {} column", name))
        }

        let indices = column::<Int32Array>(batch, "chunk_index")?;
        let contents = column::<StringArray>(batch, "content")?;
        let is_code = column::<BooleanArray>(batch, "is_code")?;
        let metadata = column::<StringArray>(batch, "metadata")?;
        // LanceDB가 자동 추가
        let distances = column::<Float32Array>(batch, "_distance")?;

        (0..batch.num_rows())
            .map(|i| {
                let metadata: BTreeMap<String, String> = serde_json::from_str(metadata.value(i))
                    .context("Corrupted chunk metadata")?;
                Ok(SearchHit {
                    chunk_index: indices.value(i),
                    content: contents.value(i).to_string(),
                    is_code: is_code.value(i),
                    metadata,
                    score: distance_to_score(distances.value(i)),
                })
            })
            .collect()
    }

    async fn table_exists(&self) -> Result<bool> {
        let names = self
            .db
            .table_names()
            .execute()
            .await
            .context("Failed to list tables")?;
        Ok(names.iter().any(|name| name == TABLE_NAME))
    }

    async fn open_table(&self) -> Result<Option<lancedb::table::Table>> {
        if !self.table_exists().await? {
            return Ok(None);
        }
        let table = self
            .db
            .open_table(TABLE_NAME)
            .execute()
            .await
            .context("Failed to open chunks table")?;
        Ok(Some(table))
    }
}

#[async_trait]
impl ChunkStore for LanceChunkStore {
    async fn write_all(&self, entries: &[IndexEntry]) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let batch = Self::entries_to_batch(entries)?;
        let schema = batch.schema();

        if self.table_exists().await? {
            self.db
                .drop_table(TABLE_NAME)
                .await
                .context("Failed to drop previous chunks table")?;
        }

        let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);
        self.db
            .create_table(TABLE_NAME, batches)
            .execute()
            .await
            .context("Failed to create chunks table")?;

        tracing::debug!("Wrote {} chunk(s) to LanceDB", entries.len());
        Ok(entries.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        let Some(table) = self.open_table().await? else {
            return Ok(vec![]);
        };

        let stream = table
            .vector_search(query_embedding.to_vec())
            .context("Failed to create vector search")?
            .limit(limit)
            .execute()
            .await
            .context("Failed to execute vector search")?;

        let batches: Vec<RecordBatch> = stream.try_collect().await?;

        let mut hits = Vec::new();
        for batch in &batches {
            hits.extend(Self::batch_to_hits(batch)?);
        }
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(hits)
    }

    async fn count(&self) -> Result<usize> {
        match self.open_table().await? {
            Some(table) => table.count_rows(None).await.context("Failed to count rows"),
            None => Ok(0),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
