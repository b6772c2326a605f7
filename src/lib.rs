//! rag-indexer - 문장 경계 인식 청킹과 컨텍스트별 RAG 인덱싱
//!
//! - `chunker`: 코드 블록 보호 + 문장 분할 + 최소 크기 누적
//! - `loader`: URL/파일/폴더 소스 → 문서
//! - `index`: 청크 임베딩 후 컨텍스트별 LanceDB 인덱스로 저장/검색
//! - `refactor`: 텍스트 파일을 `###` 구분 청크 문서로 정리

pub mod chunker;
pub mod cli;
pub mod collector;
pub mod config;
pub mod document;
pub mod embedding;
pub mod extractor;
pub mod index;
pub mod loader;
pub mod refactor;
pub mod scraper;

// Re-exports
pub use chunker::{
    default_chunker, sentence_chunker, Chunk, ChunkConfig, ChunkStrategy, Chunker,
    CodeBlockEmission, Language, SegmentError, SentenceChunker, SentenceSegmenter,
};
pub use config::{get_data_dir, ContextCatalog, ContextDefinition};
pub use document::Document;
pub use embedding::{create_embedder, get_api_key, has_api_key, EmbeddingProvider, GeminiEmbedding};
pub use index::{IndexManager, IndexManifest, SearchHit};
pub use loader::DocumentLoader;
pub use refactor::{refactor_file, refactor_text};
pub use scraper::{Article, WebScraper};
