//! CLI 모듈
//!
//! rag-indexer CLI 명령어 정의 및 구현

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::chunker::{
    load_segmenter, Chunk, ChunkConfig, ChunkStrategy, CodeBlockEmission, Language, ModelCache,
    SentenceChunker,
};
use crate::config::{get_data_dir, ContextCatalog, DEFAULT_CONTEXTS_FILE, DEFAULT_INDEX_DIR};
use crate::embedding::{create_embedder, has_api_key};
use crate::index::IndexManager;
use crate::refactor::refactor_file;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "rag-indexer")]
#[command(version, about = "문장 경계 인식 청킹 + 컨텍스트별 RAG 인덱서", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 카탈로그/인덱스 위치
#[derive(Args, Clone)]
pub struct Locations {
    /// 컨텍스트 카탈로그 파일
    #[arg(long, default_value = DEFAULT_CONTEXTS_FILE)]
    pub contexts: PathBuf,

    /// 인덱스 디렉토리
    #[arg(long, default_value = DEFAULT_INDEX_DIR)]
    pub index_dir: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 텍스트를 청크로 분할해 출력
    Chunk {
        /// 입력 파일
        file: Option<PathBuf>,

        /// 직접 입력할 텍스트
        #[arg(short, long)]
        text: Option<String>,

        /// 최소 청크 크기 (문자 수)
        #[arg(short, long, default_value = "300")]
        min_chars: usize,

        /// 누적 전략 (greedy | window)
        #[arg(short, long, default_value = "greedy")]
        strategy: ChunkStrategy,

        /// 오버랩 문장 수 (window 전략)
        #[arg(short, long, default_value = "0")]
        overlap: usize,

        /// 최상위 목록 항목 앞에서 청크 분리 (greedy 전략 전용)
        #[arg(long)]
        hard_breaks: bool,

        /// 경로/변수/상수에 백틱 서식 적용
        #[arg(long)]
        format: bool,

        /// 분할 전 공백 정리
        #[arg(long)]
        normalize: bool,

        /// 코드 블록 출력 방식 (both | inline | standalone)
        #[arg(long, default_value = "both")]
        code_blocks: CodeBlockEmission,

        /// 문장 분할 언어
        #[arg(short, long, default_value = "portuguese")]
        language: Language,

        /// JSON으로 출력
        #[arg(long)]
        json: bool,
    },

    /// 텍스트 파일을 `###` 구분 청크 문서로 정리
    Refactor {
        /// 입력 파일
        file: PathBuf,

        /// 최소 청크 크기 (문자 수)
        #[arg(short, long, default_value = "300")]
        min_chars: usize,
    },

    /// 컨텍스트 인덱스 관리
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },

    /// 컨텍스트 인덱스 검색
    Query {
        /// 검색 쿼리
        query: String,

        /// 컨텍스트 ID
        #[arg(short, long)]
        context: String,

        /// 결과 개수 제한
        #[arg(short, long, default_value = "5")]
        limit: usize,

        #[command(flatten)]
        locations: Locations,
    },

    /// 카탈로그의 컨텍스트 목록
    Contexts {
        #[command(flatten)]
        locations: Locations,
    },

    /// 문장 분할 모델 미리 준비
    Setup {
        /// 준비할 언어 (생략 시 전체)
        #[arg(short, long)]
        language: Option<Language>,
    },

    /// 상태 확인
    Status {
        #[command(flatten)]
        locations: Locations,
    },
}

#[derive(Subcommand)]
pub enum IndexAction {
    /// 인덱스 생성 (이미 있으면 재생성)
    Create {
        /// 컨텍스트 ID
        #[arg(short, long)]
        context: String,

        #[command(flatten)]
        locations: Locations,
    },

    /// 인덱스 삭제
    Delete {
        /// 컨텍스트 ID
        #[arg(short, long)]
        context: String,

        #[command(flatten)]
        locations: Locations,
    },
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Chunk {
            file,
            text,
            min_chars,
            strategy,
            overlap,
            hard_breaks,
            format,
            normalize,
            code_blocks,
            language,
            json,
        } => {
            let config = ChunkConfig {
                min_characters: min_chars,
                overlap_sentences: overlap,
                strategy,
                hard_breaks,
                inline_formatting: format,
                normalize_whitespace: normalize,
                code_blocks,
                language,
                ..ChunkConfig::default()
            };
            cmd_chunk(file, text, config, json)
        }
        Commands::Refactor { file, min_chars } => cmd_refactor(&file, min_chars),
        Commands::Index { action } => match action {
            IndexAction::Create { context, locations } => {
                cmd_index_create(&context, &locations).await
            }
            IndexAction::Delete { context, locations } => cmd_index_delete(&context, &locations),
        },
        Commands::Query {
            query,
            context,
            limit,
            locations,
        } => cmd_query(&query, &context, limit, &locations).await,
        Commands::Contexts { locations } => cmd_contexts(&locations),
        Commands::Setup { language } => cmd_setup(language),
        Commands::Status { locations } => cmd_status(&locations),
    }
}

/// 캐시된 분할 모델을 쓰는 청커
fn build_chunker(config: ChunkConfig) -> SentenceChunker {
    let segmenter = load_segmenter(config.language, &ModelCache::default_location());
    SentenceChunker::new(config, segmenter)
}

fn api_key_error() -> anyhow::Error {
    anyhow::anyhow!(
        "API 키가 설정되지 않았습니다.\n\n\
         설정 방법:\n  \
         export GEMINI_API_KEY=your-api-key\n  \
         또는\n  \
         export GOOGLE_AI_API_KEY=your-api-key\n\n\
         API 키 발급: https://aistudio.google.com/app/apikey"
    )
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 청킹 명령어 (chunk)
fn cmd_chunk(
    file: Option<PathBuf>,
    text: Option<String>,
    config: ChunkConfig,
    json: bool,
) -> Result<()> {
    if config.hard_breaks && config.strategy == ChunkStrategy::Window {
        bail!("--hard-breaks는 greedy 전략에서만 사용할 수 있습니다");
    }

    let input = match (file, text) {
        (Some(path), None) => std::fs::read_to_string(&path)
            .with_context(|| format!("파일 읽기 실패: {:?}", path))?,
        (None, Some(text)) => text,
        (Some(_), Some(_)) => bail!("파일과 --text 중 하나만 지정해야 합니다"),
        (None, None) => bail!("입력 파일 또는 --text를 지정해야 합니다"),
    };

    let chunks: Vec<Chunk> = build_chunker(config).chunk_detailed(&input);

    if json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
        return Ok(());
    }

    if chunks.is_empty() {
        println!("[!] 생성된 청크가 없습니다.");
        return Ok(());
    }

    println!("[OK] 청크 {} 개:\n", chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        let kind = if chunk.is_code { "CODE" } else { "TEXT" };
        println!("--- #{} [{}] {} chars ---", i + 1, kind, chunk.char_count);
        println!("{}\n", chunk);
    }

    Ok(())
}

/// 문서 정리 명령어 (refactor)
fn cmd_refactor(file: &Path, min_chars: usize) -> Result<()> {
    println!("[*] 파일 처리 중: {}", file.display());

    let chunker = build_chunker(ChunkConfig {
        min_characters: min_chars,
        ..ChunkConfig::for_refactor()
    });
    let output = refactor_file(file, &chunker)?;

    println!("[OK] 정리된 파일 저장: {}", output.display());
    Ok(())
}

/// 인덱스 생성 명령어 (index create)
async fn cmd_index_create(context_id: &str, locations: &Locations) -> Result<()> {
    let catalog = ContextCatalog::load(&locations.contexts)?;
    let definition = catalog.get(context_id)?;

    if !has_api_key() {
        return Err(api_key_error());
    }
    let embedder = create_embedder()?;

    println!(
        "[*] 인덱스 생성 중: {} ({}), 소스 {} 개",
        context_id,
        definition.display_name,
        definition.sources.len()
    );

    let manager = IndexManager::new(&locations.index_dir)
        .with_chunker(build_chunker(ChunkConfig::for_index()));
    let manifest = manager
        .create_or_update(context_id, definition, &embedder)
        .await
        .context("인덱스 생성 실패")?;

    println!("[OK] 인덱스 '{}' 생성 완료", context_id);
    println!(
        "     문서 {} 건, 청크 {} 개 (코드 {} 개)",
        manifest.documents, manifest.chunks, manifest.code_chunks
    );
    println!("     위치: {}", manager.index_dir(context_id).display());
    Ok(())
}

/// 인덱스 삭제 명령어 (index delete)
fn cmd_index_delete(context_id: &str, locations: &Locations) -> Result<()> {
    let manager = IndexManager::new(&locations.index_dir);

    if manager.delete(context_id)? {
        println!("[OK] 인덱스 '{}' 삭제됨", context_id);
    } else {
        println!("[!] 인덱스 '{}'를 찾을 수 없습니다", context_id);
    }
    Ok(())
}

/// 검색 명령어 (query)
async fn cmd_query(query: &str, context_id: &str, limit: usize, locations: &Locations) -> Result<()> {
    if !has_api_key() {
        return Err(api_key_error());
    }

    println!("[*] 검색 중: \"{}\" (컨텍스트: {})", query, context_id);

    let embedder = create_embedder()?;
    let manager = IndexManager::new(&locations.index_dir);
    let hits = manager
        .query(context_id, query, limit, &embedder)
        .await
        .context("검색 실패")?;

    if hits.is_empty() {
        println!("\n[!] 검색 결과가 없습니다.");
        return Ok(());
    }

    println!("\n[OK] 검색 결과 ({} 건):\n", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        let kind = if hit.is_code { "CODE" } else { "TEXT" };
        println!("{}. [{}] [점수: {:.4}]", i + 1, kind, hit.score);
        if let Some(title) = hit.metadata.get("title") {
            println!("   제목: {}", title);
        }
        if let Some(source) = hit.metadata.get("source") {
            println!("   출처: {}", source);
        }
        println!("   내용: {}", truncate_text(&hit.content, 200));
        println!();
    }

    Ok(())
}

/// 컨텍스트 목록 명령어 (contexts)
fn cmd_contexts(locations: &Locations) -> Result<()> {
    let catalog = ContextCatalog::load(&locations.contexts)?;
    if catalog.is_empty() {
        println!("[!] 카탈로그에 컨텍스트가 없습니다.");
        return Ok(());
    }

    let manager = IndexManager::new(&locations.index_dir);

    println!("[OK] 컨텍스트 ({} 개):\n", catalog.len());
    for (id, definition) in catalog.iter() {
        let indexed = if manager.exists(id) { "인덱스 있음" } else { "인덱스 없음" };
        println!("  {:<20} {} [{}]", id, definition.display_name, indexed);
        for source in &definition.sources {
            println!("        - {}", truncate_text(source, 80));
        }
    }

    Ok(())
}

/// 분할 모델 준비 명령어 (setup)
fn cmd_setup(language: Option<Language>) -> Result<()> {
    let cache = ModelCache::default_location();
    let languages = match language {
        Some(language) => vec![language],
        None => Language::ALL.to_vec(),
    };

    for language in languages {
        let path = cache
            .ensure(language)
            .with_context(|| format!("{} 모델 준비 실패", language))?;
        println!("[OK] {}: {}", language, path.display());
    }

    Ok(())
}

/// 상태 명령어 (status)
fn cmd_status(locations: &Locations) -> Result<()> {
    println!("rag-indexer v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] 데이터 디렉토리: {}", get_data_dir().display());

    let cache = ModelCache::default_location();
    let ready: Vec<String> = Language::ALL
        .iter()
        .filter(|language| cache.model_path(**language).is_file())
        .map(|language| language.to_string())
        .collect();
    if ready.is_empty() {
        println!("[!] 문장 분할 모델: 없음 (rag-indexer setup 실행)");
    } else {
        println!("[OK] 문장 분할 모델: {}", ready.join(", "));
    }

    if has_api_key() {
        println!("[OK] API 키: 설정됨");
    } else {
        println!("[!] API 키: 미설정");
        println!("    설정: export GEMINI_API_KEY=your-key");
    }

    match ContextCatalog::load(&locations.contexts) {
        Ok(catalog) => println!(
            "[OK] 컨텍스트 카탈로그: {} 개 ({})",
            catalog.len(),
            locations.contexts.display()
        ),
        Err(e) => println!("[!] 컨텍스트 카탈로그: {:#}", e),
    }

    let manager = IndexManager::new(&locations.index_dir);
    match manager.list() {
        Ok(indexes) if indexes.is_empty() => println!("[!] 인덱스: 없음"),
        Ok(indexes) => {
            println!("[OK] 인덱스 {} 개:", indexes.len());
            for manifest in indexes {
                let size = dir_size(&manager.index_dir(&manifest.context_id));
                println!(
                    "     {:<20} {} 청크 | {} | {}",
                    manifest.context_id,
                    manifest.chunks,
                    format_bytes(size as usize),
                    manifest.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Err(e) => println!("[!] 인덱스 조회 실패: {:#}", e),
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// 디렉토리 전체 크기 (읽을 수 없는 항목은 무시)
fn dir_size(path: &Path) -> u64 {
    std::fs::read_dir(path)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| {
                    let path = entry.path();
                    if path.is_dir() {
                        dir_size(&path)
                    } else {
                        entry.metadata().map(|m| m.len()).unwrap_or(0)
                    }
                })
                .sum()
        })
        .unwrap_or(0)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_chunk_options() {
        let cli = Cli::try_parse_from([
            "rag-indexer",
            "chunk",
            "--text",
            "Olá.",
            "--strategy",
            "window",
            "--overlap",
            "2",
            "--language",
            "en",
            "--code-blocks",
            "standalone",
        ])
        .unwrap();

        match cli.command {
            Commands::Chunk {
                strategy,
                overlap,
                language,
                code_blocks,
                ..
            } => {
                assert_eq!(strategy, ChunkStrategy::Window);
                assert_eq!(overlap, 2);
                assert_eq!(language, Language::English);
                assert_eq!(code_blocks, CodeBlockEmission::Standalone);
            }
            _ => panic!("expected chunk command"),
        }
    }

    #[test]
    fn test_parse_index_create_defaults() {
        let cli =
            Cli::try_parse_from(["rag-indexer", "index", "create", "--context", "docs"]).unwrap();
        match cli.command {
            Commands::Index {
                action: IndexAction::Create { context, locations },
            } => {
                assert_eq!(context, "docs");
                assert_eq!(locations.contexts, PathBuf::from(DEFAULT_CONTEXTS_FILE));
                assert_eq!(locations.index_dir, PathBuf::from(DEFAULT_INDEX_DIR));
            }
            _ => panic!("expected index create"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_strategy() {
        assert!(
            Cli::try_parse_from(["rag-indexer", "chunk", "--text", "x", "--strategy", "zig"])
                .is_err()
        );
    }

    #[test]
    fn test_chunk_rejects_hard_breaks_with_window() {
        let config = ChunkConfig {
            hard_breaks: true,
            ..ChunkConfig::windowed(100, 1)
        };
        let err = cmd_chunk(None, Some("Intro. 1. Item.".to_string()), config, false).unwrap_err();
        assert!(err.to_string().contains("--hard-breaks"));
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("hello\nworld", 20), "hello world");
        assert_eq!(truncate_text("ação rápida", 4), "ação...");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
    }

    #[test]
    fn test_dir_size() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a"), [0u8; 10]).unwrap();
        std::fs::create_dir(temp_dir.path().join("sub")).unwrap();
        std::fs::write(temp_dir.path().join("sub").join("b"), [0u8; 5]).unwrap();
        assert_eq!(dir_size(temp_dir.path()), 15);
        assert_eq!(dir_size(&temp_dir.path().join("missing")), 0);
    }

    #[test]
    fn test_index_delete_missing_is_not_error() {
        let temp_dir = TempDir::new().unwrap();
        let locations = Locations {
            contexts: temp_dir.path().join("contexts.json"),
            index_dir: temp_dir.path().join("indices"),
        };
        assert!(cmd_index_delete("nada", &locations).is_ok());
    }
}
