//! 문장 경계 인식 청커
//!
//! 원문을 임베딩에 알맞은 크기의 청크 목록으로 변환합니다.
//!
//! 1. 펜스 코드 블록을 플레이스홀더로 보호
//! 2. (선택) 공백 정리, 인라인 서식
//! 3. 문장 분할 (실패 시 줄 단위)
//! 4. 문장 누적 (Greedy 또는 Window)
//! 5. 플레이스홀더 복원, 코드 블록을 독립 청크로 추가
//!
//! ## 사용법
//! ```rust,ignore
//! let chunker = SentenceChunker::with_builtin(ChunkConfig::default());
//! let chunks = chunker.chunk(&text);
//! ```

pub mod accumulator;
pub mod code_block;
pub mod formatting;
pub mod segmenter;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::document::{Document, META_CHUNK_TYPE};

pub use code_block::{CodeBlock, ExtractedText};
pub use segmenter::{
    load_segmenter, Language, ModelCache, NewlineSegmenter, SegmentError, SegmenterModel,
    SentenceSegmenter, UnicodeSegmenter,
};

// ============================================================================
// Chunk Configuration
// ============================================================================

/// 누적 전략
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkStrategy {
    /// 겹치지 않게 최소 크기까지 누적
    #[default]
    Greedy,
    /// 마지막 W개 문장을 다음 청크에 다시 포함
    Window,
}

impl FromStr for ChunkStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "greedy" => Ok(Self::Greedy),
            "window" | "overlap" => Ok(Self::Window),
            other => Err(format!("unknown strategy: {}", other)),
        }
    }
}

/// 코드 블록 출력 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeBlockEmission {
    /// 청크 안에 복원하고, 끝에 독립 청크로도 추가
    #[default]
    InlineAndStandalone,
    /// 청크 안에만 복원
    Inline,
    /// 청크에서는 빼고 독립 청크로만 추가
    Standalone,
}

impl FromStr for CodeBlockEmission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "both" | "inline-and-standalone" => Ok(Self::InlineAndStandalone),
            "inline" => Ok(Self::Inline),
            "standalone" => Ok(Self::Standalone),
            other => Err(format!("unknown code block mode: {}", other)),
        }
    }
}

/// 청킹 설정
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// 최소 청크 크기 (문자 수)
    pub min_characters: usize,
    /// 오버랩 문장 수 (Window 전략)
    pub overlap_sentences: usize,
    /// 누적 전략
    pub strategy: ChunkStrategy,
    /// 최상위 목록 항목 앞에서 강제로 청크 닫기
    ///
    /// Greedy 전략 전용입니다. Window 전략에서는 무시됩니다.
    pub hard_breaks: bool,
    /// 경로/변수/상수에 백틱 서식 적용
    pub inline_formatting: bool,
    /// 분할 전 공백 정리
    pub normalize_whitespace: bool,
    /// 코드 블록 출력 방식
    pub code_blocks: CodeBlockEmission,
    /// 폴백 시 청크당 줄 수
    pub fallback_lines: usize,
    /// 문장 분할 언어
    pub language: Language,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            min_characters: 300,
            overlap_sentences: 0,
            strategy: ChunkStrategy::Greedy,
            hard_breaks: false,
            inline_formatting: false,
            normalize_whitespace: false,
            code_blocks: CodeBlockEmission::InlineAndStandalone,
            fallback_lines: 10,
            language: Language::Portuguese,
        }
    }
}

impl ChunkConfig {
    /// 인덱싱용 설정 (공백 정리 + 인라인 서식)
    pub fn for_index() -> Self {
        Self {
            min_characters: 250,
            inline_formatting: true,
            normalize_whitespace: true,
            ..Self::default()
        }
    }

    /// 문서 정리 도구용 설정 (목록 항목 강제 분리 + 인라인 서식)
    pub fn for_refactor() -> Self {
        Self {
            min_characters: 300,
            hard_breaks: true,
            inline_formatting: true,
            ..Self::default()
        }
    }

    /// 오버랩 윈도우 설정
    pub fn windowed(min_characters: usize, overlap_sentences: usize) -> Self {
        Self {
            min_characters,
            overlap_sentences,
            strategy: ChunkStrategy::Window,
            ..Self::default()
        }
    }
}

// ============================================================================
// Chunk
// ============================================================================

/// 청킹 결과 단위
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub content: String,
    /// 문자 수
    pub char_count: usize,
    /// 코드 블록에서 나온 청크인지
    pub is_code: bool,
}

impl Chunk {
    fn text(content: String) -> Self {
        Self {
            char_count: content.chars().count(),
            content,
            is_code: false,
        }
    }

    fn code(content: String) -> Self {
        Self {
            char_count: content.chars().count(),
            content,
            is_code: true,
        }
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// 텍스트 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 청크로 분할
    fn chunk(&self, text: &str) -> Vec<String>;

    /// 청커 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// SentenceChunker
// ============================================================================

/// 문장 경계 인식 청커
///
/// 설정과 준비된 문장 분할기를 주입받습니다. 상태가 없으므로
/// 여러 호출자가 동시에 사용해도 됩니다.
pub struct SentenceChunker {
    config: ChunkConfig,
    segmenter: Arc<dyn SentenceSegmenter>,
}

impl SentenceChunker {
    pub fn new(config: ChunkConfig, segmenter: Arc<dyn SentenceSegmenter>) -> Self {
        Self { config, segmenter }
    }

    /// 내장 언어 모델로 생성 (파일시스템 접근 없음)
    pub fn with_builtin(config: ChunkConfig) -> Self {
        let segmenter = Arc::new(UnicodeSegmenter::builtin(config.language));
        Self::new(config, segmenter)
    }

    /// 기본 설정으로 생성
    pub fn with_defaults() -> Self {
        Self::with_builtin(ChunkConfig::default())
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// 분할 전 텍스트 가공
    fn prepare<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut text = Cow::Borrowed(text);
        if self.config.normalize_whitespace {
            text = Cow::Owned(formatting::normalize_whitespace(&text));
        }
        if self.config.inline_formatting {
            text = Cow::Owned(formatting::apply_inline_formatting(&text));
        }
        text
    }

    /// 코드 블록 처리 없이 문장 분할 + 누적만 수행
    ///
    /// 플레이스홀더를 직접 관리하는 호출자(문서 정리 도구)용입니다.
    pub fn chunk_plain(&self, text: &str) -> Vec<String> {
        let prepared = self.prepare(text);
        if prepared.trim().is_empty() {
            return vec![];
        }

        let sentences = match self.segmenter.segment(&prepared) {
            Ok(sentences) => sentences,
            Err(e) => {
                tracing::warn!(
                    "{} failed, splitting on newlines: {}",
                    self.segmenter.name(),
                    e
                );
                NewlineSegmenter::split(&prepared)
            }
        };

        let mut chunks = match self.config.strategy {
            ChunkStrategy::Greedy => accumulator::accumulate_greedy(
                &sentences,
                self.config.min_characters,
                self.config.hard_breaks,
            ),
            ChunkStrategy::Window => accumulator::accumulate_windows(
                &sentences,
                self.config.min_characters,
                self.config.overlap_sentences,
            ),
        };
        chunks.retain(|c| !c.trim().is_empty());

        if chunks.is_empty() {
            tracing::warn!(
                "No chunks from {} sentence(s), falling back to {}-line groups",
                sentences.len(),
                self.config.fallback_lines
            );
            chunks = accumulator::fallback_line_groups(&prepared, self.config.fallback_lines);
        }

        chunks
    }

    /// 전체 파이프라인 실행
    pub fn chunk_detailed(&self, text: &str) -> Vec<Chunk> {
        let extracted = code_block::extract(text);
        let mut chunks = Vec::new();

        for raw in self.chunk_plain(extracted.text()) {
            let content = match self.config.code_blocks {
                CodeBlockEmission::InlineAndStandalone => {
                    // 독립 청크로 곧 추가되므로 중복 방지
                    if extracted.is_bare_placeholder(&raw) {
                        continue;
                    }
                    extracted.restore(&raw).into_owned()
                }
                CodeBlockEmission::Inline => extracted.restore(&raw).into_owned(),
                CodeBlockEmission::Standalone => extracted.strip(&raw).trim().to_string(),
            };
            chunks.push(Chunk::text(content));
        }

        if self.config.code_blocks != CodeBlockEmission::Inline {
            chunks.extend(
                extracted
                    .blocks()
                    .iter()
                    .map(|block| Chunk::code(block.content.clone())),
            );
        }

        chunks.retain(|c| !c.content.trim().is_empty());

        tracing::debug!(
            "Chunked {} chars into {} chunk(s) ({} code block(s))",
            text.chars().count(),
            chunks.len(),
            extracted.blocks().len()
        );

        chunks
    }

    /// 문서를 청킹하고 메타데이터를 각 청크 문서에 복사
    pub fn chunk_document(&self, doc: &Document) -> Vec<Document> {
        self.chunk_detailed(doc.content())
            .into_iter()
            .map(|chunk| {
                let kind = if chunk.is_code { "code" } else { "text" };
                doc.with_content(chunk.content)
                    .with_meta(META_CHUNK_TYPE, kind)
            })
            .collect()
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        self.chunk_detailed(text)
            .into_iter()
            .map(|chunk| chunk.content)
            .collect()
    }

    fn name(&self) -> &'static str {
        "SentenceChunker"
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 기본 청커 생성
pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(SentenceChunker::with_defaults())
}

/// 설정과 분할기를 지정한 청커 생성
pub fn sentence_chunker(
    config: ChunkConfig,
    segmenter: Arc<dyn SentenceSegmenter>,
) -> Box<dyn Chunker> {
    Box::new(SentenceChunker::new(config, segmenter))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests;
