use super::*;

use crate::document::META_SOURCE;

/// 항상 실패하는 분할기
struct FailingSegmenter;

impl SentenceSegmenter for FailingSegmenter {
    fn segment<'a>(&self, _text: &'a str) -> Result<Vec<&'a str>, SegmentError> {
        Err(SegmentError::Failed("model corrupted".to_string()))
    }

    fn name(&self) -> &'static str {
        "FailingSegmenter"
    }
}

/// 아무 문장도 돌려주지 않는 분할기
struct SilentSegmenter;

impl SentenceSegmenter for SilentSegmenter {
    fn segment<'a>(&self, _text: &'a str) -> Result<Vec<&'a str>, SegmentError> {
        Ok(vec![])
    }

    fn name(&self) -> &'static str {
        "SilentSegmenter"
    }
}

fn config(min_characters: usize) -> ChunkConfig {
    ChunkConfig {
        min_characters,
        ..ChunkConfig::default()
    }
}

const CODE: &str = "```bash\necho a\necho b\necho c\n```";

#[test]
fn test_chunker_empty() {
    let chunker = SentenceChunker::with_defaults();
    assert!(chunker.chunk("").is_empty());
    assert!(chunker.chunk("  \n\t ").is_empty());
}

#[test]
fn test_small_text_single_chunk() {
    let chunker = SentenceChunker::with_defaults();
    let chunks = chunker.chunk("Uma frase curta. Outra frase curta.");
    assert_eq!(chunks, vec!["Uma frase curta. Outra frase curta."]);
}

#[test]
fn test_completeness_without_code() {
    let text = "O Sr. Costa abriu a reunião. Discutimos o orçamento anual! \
                Houve dúvidas? Sim, várias. A próxima reunião será em março. \
                Todos concordaram com a proposta final.";
    let chunker = SentenceChunker::with_builtin(config(40));

    let sentences = UnicodeSegmenter::builtin(Language::Portuguese)
        .segment(text)
        .unwrap();
    let chunks = chunker.chunk(text);

    assert!(chunks.len() > 1);
    assert_eq!(chunks.join(" "), sentences.join(" "));
}

#[test]
fn test_basic_threshold_split() {
    let s1 = format!("{}.", "a".repeat(99));
    let s2 = format!("{}.", "B".repeat(249));
    let s3 = format!("{}.", "C".repeat(49));
    let text = format!("{} {} {}", s1, s2, s3);

    let chunker = SentenceChunker::with_builtin(config(300));
    let chunks = chunker.chunk(&text);

    assert_eq!(chunks, vec![format!("{} {}", s1, s2), s3]);
}

#[test]
fn test_hard_break_example() {
    let text = "Intro text. 1. First item. 1.1 Sub item continues. 2. Second item.";
    let chunker = SentenceChunker::with_builtin(ChunkConfig {
        min_characters: 10_000,
        hard_breaks: true,
        ..ChunkConfig::default()
    });

    let chunks = chunker.chunk(text);
    assert_eq!(
        chunks,
        vec![
            "Intro text.",
            "1. First item. 1.1 Sub item continues.",
            "2. Second item.",
        ]
    );
}

#[test]
fn test_hard_breaks_off_keeps_single_chunk() {
    let text = "Intro text. 1. First item. 2. Second item.";
    let chunker = SentenceChunker::with_builtin(config(10_000));
    assert_eq!(chunker.chunk(text).len(), 1);
}

#[test]
fn test_overlap_example() {
    let sentences: Vec<String> = (0..10)
        .map(|i| format!("Sentence number {} {}.", i, "x".repeat(31)))
        .collect();
    let text = sentences.join(" ");
    // 각 문장 50자
    assert!(sentences.iter().all(|s| s.chars().count() == 50));

    let chunker = SentenceChunker::with_builtin(ChunkConfig::windowed(120, 1));
    let chunks = chunker.chunk(&text);

    assert_eq!(chunks[0], sentences[0..3].join(" "));
    assert!(chunks[1].starts_with(&sentences[2]));
    // 마지막 윈도우 [8, 9] 뒤에 꼬리 윈도우 [9]
    assert_eq!(chunks.len(), 6);
    assert_eq!(chunks[5], sentences[9]);
}

#[test]
fn test_code_block_round_trip() {
    let text = format!(
        "Esta é a primeira frase do documento.\n\n{}\n\nEsta é a segunda frase do documento.",
        CODE
    );
    let chunker = SentenceChunker::with_builtin(config(10));
    let chunks = chunker.chunk_detailed(&text);

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].content, "Esta é a primeira frase do documento.");
    assert!(!chunks[0].is_code);
    assert!(chunks[1].content.contains(CODE));
    assert!(chunks[1].content.ends_with("segunda frase do documento."));
    assert_eq!(chunks.iter().filter(|c| c.content == CODE).count(), 1);
    assert!(chunks[2].is_code);
}

#[test]
fn test_code_preservation_counts() {
    let other = "```\nfn main() {\n    println!(\"oi\");\n}\n```";
    let text = format!(
        "Primeira frase suficientemente longa.\n{}\nSegunda frase também longa.\n\n{}",
        CODE, other
    );
    let chunker = SentenceChunker::with_builtin(config(20));
    let chunks = chunker.chunk(&text);

    for block in [CODE, other] {
        assert_eq!(chunks.iter().filter(|c| c.as_str() == block).count(), 1);
    }
    // 코드 블록은 끝에 추가됨
    assert_eq!(chunks[chunks.len() - 2], CODE);
    assert_eq!(chunks[chunks.len() - 1], other);
}

#[test]
fn test_only_code_block() {
    let chunker = SentenceChunker::with_defaults();
    let chunks = chunker.chunk_detailed(CODE);
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].is_code);
    assert_eq!(chunks[0].content, CODE);
}

#[test]
fn test_code_block_not_sentence_split() {
    let code = "```\nx = 1. y = 2. Z = 3.\n```";
    let text = format!("Antes. {} Depois.", code);
    let chunker = SentenceChunker::with_builtin(config(1));
    let chunks = chunker.chunk(&text);

    assert!(chunks.iter().any(|c| c == code));
    assert!(chunks.iter().all(|c| !c.contains("Z = 3.") || c.contains(code)));
}

#[test]
fn test_emission_inline_only() {
    let text = format!("Frase antes do código. {} Frase depois.", CODE);
    let chunker = SentenceChunker::with_builtin(ChunkConfig {
        min_characters: 5,
        code_blocks: CodeBlockEmission::Inline,
        ..ChunkConfig::default()
    });
    let chunks = chunker.chunk_detailed(&text);

    assert!(chunks.iter().all(|c| !c.is_code));
    assert_eq!(chunks.iter().filter(|c| c.content.contains(CODE)).count(), 1);
}

#[test]
fn test_emission_standalone_only() {
    let text = format!("Frase antes do código. {} Frase depois.", CODE);
    let chunker = SentenceChunker::with_builtin(ChunkConfig {
        min_characters: 5,
        code_blocks: CodeBlockEmission::Standalone,
        ..ChunkConfig::default()
    });
    let chunks = chunker.chunk_detailed(&text);

    let code_chunks: Vec<_> = chunks.iter().filter(|c| c.content.contains("echo")).collect();
    assert_eq!(code_chunks.len(), 1);
    assert!(code_chunks[0].is_code);
    assert_eq!(chunks.last().map(|c| c.content.as_str()), Some(CODE));
}

#[test]
fn test_no_empty_chunks() {
    let text = "\n\n```a```\n\n   \n```b```\n\n. \n";
    let chunker = SentenceChunker::with_builtin(config(1));
    for chunk in chunker.chunk(text) {
        assert!(!chunk.trim().is_empty());
    }
}

#[test]
fn test_segmentation_failure_falls_back_to_lines() {
    let chunker = SentenceChunker::new(config(1), Arc::new(FailingSegmenter));
    let chunks = chunker.chunk("linha um.\nlinha dois.\n\nlinha três.");
    assert_eq!(chunks, vec!["linha um.", "linha dois.", "linha três."]);
}

#[test]
fn test_zero_sentences_falls_back_to_line_groups() {
    let text: String = (1..=12).map(|i| format!("linha {}\n", i)).collect();
    let chunker = SentenceChunker::new(config(1), Arc::new(SilentSegmenter));
    let chunks = chunker.chunk(&text);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].lines().count(), 10);
    assert_eq!(chunks[1], "linha 11\nlinha 12");
}

#[test]
fn test_index_preset_normalizes_and_formats() {
    let chunker = SentenceChunker::with_builtin(ChunkConfig::for_index());
    let chunks = chunker.chunk("Configure   a variável $HOME   em /etc/profile agora.\n\n\n\nFim.");

    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].contains("`$HOME`"));
    assert!(chunks[0].contains("`/etc/profile`"));
    assert!(!chunks[0].contains("  "));
}

#[test]
fn test_formatting_does_not_touch_code_blocks() {
    let code = "```\nexport PATH=/usr/bin\n```";
    let text = format!("Use $PATH aqui. {}", code);
    let chunker = SentenceChunker::with_builtin(ChunkConfig {
        min_characters: 1,
        inline_formatting: true,
        ..ChunkConfig::default()
    });
    let chunks = chunker.chunk(&text);

    assert_eq!(chunks.last().map(String::as_str), Some(code));
    assert!(chunks[0].contains("`$PATH`"));
}

#[test]
fn test_chunk_document_copies_metadata() {
    let doc = Document::from_source(format!("Uma frase qualquer. {}", CODE), "notas.md");
    let chunker = SentenceChunker::with_builtin(config(1));
    let docs = chunker.chunk_document(&doc);

    assert_eq!(docs.len(), 2);
    for chunk_doc in &docs {
        assert_eq!(chunk_doc.get(META_SOURCE), Some("notas.md"));
    }
    assert_eq!(docs[0].get(META_CHUNK_TYPE), Some("text"));
    assert_eq!(docs[1].get(META_CHUNK_TYPE), Some("code"));
    assert_eq!(docs[1].content(), CODE);
}

#[test]
fn test_chunk_plain_keeps_placeholders() {
    let extracted = code_block::extract(&format!("Texto. {} Mais.", CODE));
    let chunker = SentenceChunker::with_builtin(config(1));
    let chunks = chunker.chunk_plain(extracted.text());

    assert!(chunks.iter().any(|c| c.contains(&code_block::placeholder(0))));
}

#[test]
fn test_char_count_is_unicode_aware() {
    let chunker = SentenceChunker::with_defaults();
    let chunks = chunker.chunk_detailed("Ação rápida.");
    assert_eq!(chunks[0].char_count, 12);
}

#[test]
fn test_config_presets() {
    let default = ChunkConfig::default();
    assert_eq!(default.min_characters, 300);
    assert_eq!(default.strategy, ChunkStrategy::Greedy);
    assert_eq!(default.language, Language::Portuguese);

    let index = ChunkConfig::for_index();
    assert_eq!(index.min_characters, 250);
    assert!(index.normalize_whitespace && index.inline_formatting);

    let refactor = ChunkConfig::for_refactor();
    assert!(refactor.hard_breaks);

    let windowed = ChunkConfig::windowed(120, 2);
    assert_eq!(windowed.strategy, ChunkStrategy::Window);
    assert_eq!(windowed.overlap_sentences, 2);
}

#[test]
fn test_strategy_from_str() {
    assert_eq!("greedy".parse::<ChunkStrategy>(), Ok(ChunkStrategy::Greedy));
    assert_eq!("Window".parse::<ChunkStrategy>(), Ok(ChunkStrategy::Window));
    assert!("zigzag".parse::<ChunkStrategy>().is_err());

    assert_eq!(
        "both".parse::<CodeBlockEmission>(),
        Ok(CodeBlockEmission::InlineAndStandalone)
    );
    assert_eq!("Standalone".parse::<CodeBlockEmission>(), Ok(CodeBlockEmission::Standalone));
    assert!("nenhum".parse::<CodeBlockEmission>().is_err());
}

#[test]
fn test_factory_functions() {
    assert_eq!(default_chunker().name(), "SentenceChunker");
    let chunker = sentence_chunker(ChunkConfig::default(), Arc::new(NewlineSegmenter));
    assert_eq!(chunker.chunk("a\nb"), vec!["a b"]);
}
