//! 문서 정리 도구
//!
//! 텍스트 파일을 `###` 구분자로 나뉜 청크 목록으로 다시 씁니다.
//! 결과 파일은 다른 RAG 도구에 그대로 넣을 수 있는 형태입니다.
//!
//! 코드 블록은 파일 전체에서 먼저 떼어 두었다가 마지막에 제자리로 돌려놓습니다.
//! 따라서 코드 블록 안의 `###`는 구분자로 취급되지 않습니다.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::chunker::{code_block, SentenceChunker};

/// 입력 섹션 구분자
pub const SECTION_MARKER: &str = "###";

/// 출력 청크 구분자
pub const CHUNK_SEPARATOR: &str = "\n\n###\n\n";

/// 출력 파일 이름 접미사
const OUTPUT_SUFFIX: &str = "_refatorado.txt";

/// 텍스트를 정리된 청크 문서로 변환
pub fn refactor_text(text: &str, chunker: &SentenceChunker) -> String {
    let extracted = code_block::extract(text);

    let chunks: Vec<String> = extracted
        .text()
        .split(SECTION_MARKER)
        .map(str::trim)
        .filter(|section| !section.is_empty())
        .flat_map(|section| chunker.chunk_plain(section))
        .collect();

    tracing::debug!(
        "Refactored into {} chunk(s), {} code block(s) restored",
        chunks.len(),
        extracted.blocks().len()
    );

    extracted.restore(&chunks.join(CHUNK_SEPARATOR)).into_owned()
}

/// 출력 경로: 같은 폴더의 `<이름>_refatorado.txt`
pub fn output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    input.with_file_name(format!("{}{}", stem, OUTPUT_SUFFIX))
}

/// 파일을 읽어 정리 후 저장. 저장된 경로 반환
pub fn refactor_file(input: &Path, chunker: &SentenceChunker) -> Result<PathBuf> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {:?}", input))?;

    let output = output_path(input);
    std::fs::write(&output, refactor_text(&text, chunker))
        .with_context(|| format!("Failed to write output file: {:?}", output))?;

    tracing::info!("Refactored {:?} → {:?}", input, output);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::ChunkConfig;
    use tempfile::TempDir;

    fn refactor_chunker(min_characters: usize) -> SentenceChunker {
        SentenceChunker::with_builtin(ChunkConfig {
            min_characters,
            ..ChunkConfig::for_refactor()
        })
    }

    #[test]
    fn test_sections_become_chunks() {
        let text = "### Instalação\nBaixe o pacote. Instale.\n### Uso\nExecute o binário.";
        let result = refactor_text(text, &refactor_chunker(300));

        assert_eq!(
            result,
            "Instalação Baixe o pacote. Instale.\n\n###\n\nUso Execute o binário."
        );
    }

    #[test]
    fn test_hard_breaks_split_numbered_items() {
        let text = "Passos a seguir. 1. Abra o terminal. 2. Rode o comando.";
        let result = refactor_text(text, &refactor_chunker(10_000));

        let chunks: Vec<_> = result.split(CHUNK_SEPARATOR).collect();
        assert_eq!(
            chunks,
            vec!["Passos a seguir.", "1. Abra o terminal.", "2. Rode o comando."]
        );
    }

    #[test]
    fn test_code_blocks_restored_and_protected() {
        let code = "```bash\n### não é seção\necho $HOME\n```";
        let text = format!("Configure o ambiente.\n{}\n### Próxima\nFim.", code);
        let result = refactor_text(&text, &refactor_chunker(300));

        // bloco restaurado sem formatação inline, uma única vez
        assert_eq!(result.matches(code).count(), 1);
        assert_eq!(result.matches(CHUNK_SEPARATOR).count(), 1);
        assert!(!result.contains('\u{E000}'));
    }

    #[test]
    fn test_inline_formatting_applied() {
        let result = refactor_text("Edite o arquivo /etc/hosts agora.", &refactor_chunker(300));
        assert_eq!(result, "Edite o arquivo `/etc/hosts` agora.");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(refactor_text("  ###  ### ", &refactor_chunker(300)), "");
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("/tmp/notas.md")),
            PathBuf::from("/tmp/notas_refatorado.txt")
        );
    }

    #[test]
    fn test_refactor_file() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("guia.txt");
        std::fs::write(&input, "Primeira parte.\n###\nSegunda parte.").unwrap();

        let output = refactor_file(&input, &refactor_chunker(300)).unwrap();
        assert_eq!(output, temp_dir.path().join("guia_refatorado.txt"));
        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            "Primeira parte.\n\n###\n\nSegunda parte."
        );
    }

    #[test]
    fn test_refactor_missing_file() {
        assert!(refactor_file(Path::new("/nao/existe.txt"), &refactor_chunker(300)).is_err());
    }
}
