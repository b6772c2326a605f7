//! 코드 블록 보호
//!
//! 펜스 코드 블록(```...```)을 문장 분할 전에 플레이스홀더로 치환하고,
//! 청킹 후 원래 텍스트로 복원합니다.
//!
//! 치환은 매치 위치(span) 기반으로 수행합니다. 같은 내용의 블록이 여러 번
//! 나와도 각각 별도의 인덱스를 받습니다.

use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// 펜스 코드 블록 패턴 (non-greedy, 여러 줄)
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("Invalid fence regex"));

/// 플레이스홀더 패턴 (Private Use Area 문자로 감싸 자연어와 충돌 방지)
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x{E000}CODE_BLOCK_(\d+)\x{E001}").expect("Invalid placeholder regex")
});

const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

/// 인덱스에 해당하는 플레이스홀더 토큰
pub fn placeholder(index: usize) -> String {
    format!("{PLACEHOLDER_OPEN}CODE_BLOCK_{index}{PLACEHOLDER_CLOSE}")
}

// ============================================================================
// CodeBlock
// ============================================================================

/// 원문에서 추출된 코드 블록
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// 추출 순서 (플레이스홀더에 박히는 번호)
    pub index: usize,
    /// 원문 그대로의 블록 텍스트 (백틱 포함)
    pub content: String,
    /// 원문에서의 바이트 범위
    pub span: Range<usize>,
}

// ============================================================================
// ExtractedText
// ============================================================================

/// 플레이스홀더 치환이 끝난 텍스트와 추출된 블록 목록
#[derive(Debug, Clone, Default)]
pub struct ExtractedText {
    text: String,
    blocks: Vec<CodeBlock>,
}

impl ExtractedText {
    /// 플레이스홀더가 들어간 텍스트
    pub fn text(&self) -> &str {
        &self.text
    }

    /// 추출 순서대로 정렬된 코드 블록
    pub fn blocks(&self) -> &[CodeBlock] {
        &self.blocks
    }

    pub fn has_blocks(&self) -> bool {
        !self.blocks.is_empty()
    }

    /// 청크 안의 모든 플레이스홀더를 원래 블록으로 복원
    ///
    /// 알 수 없는 인덱스는 그대로 둡니다.
    pub fn restore<'a>(&self, chunk: &'a str) -> Cow<'a, str> {
        if self.blocks.is_empty() {
            return Cow::Borrowed(chunk);
        }

        PLACEHOLDER_RE.replace_all(chunk, |caps: &Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| self.blocks.get(i))
                .map(|block| block.content.clone())
                .unwrap_or_else(|| caps[0].to_string())
        })
    }

    /// 플레이스홀더를 제거 (블록을 독립 청크로만 내보낼 때)
    pub fn strip<'a>(&self, chunk: &'a str) -> Cow<'a, str> {
        if self.blocks.is_empty() {
            return Cow::Borrowed(chunk);
        }
        PLACEHOLDER_RE.replace_all(chunk, "")
    }

    /// 청크 전체가 플레이스홀더 하나뿐인지 확인
    pub fn is_bare_placeholder(&self, chunk: &str) -> bool {
        PLACEHOLDER_RE
            .find(chunk.trim())
            .map(|m| m.start() == 0 && m.end() == chunk.trim().len())
            .unwrap_or(false)
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// 코드 블록 추출 및 플레이스홀더 치환
///
/// 매치 위치를 기록한 뒤 그 사이 구간을 잘라 붙여 새 텍스트를 만듭니다.
pub fn extract(text: &str) -> ExtractedText {
    let mut blocks = Vec::new();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for (index, m) in FENCE_RE.find_iter(text).enumerate() {
        out.push_str(&text[cursor..m.start()]);
        out.push_str(&placeholder(index));
        cursor = m.end();

        blocks.push(CodeBlock {
            index,
            content: m.as_str().to_string(),
            span: m.range(),
        });
    }
    out.push_str(&text[cursor..]);

    if !blocks.is_empty() {
        tracing::debug!("Protected {} code block(s)", blocks.len());
    }

    ExtractedText { text: out, blocks }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_no_blocks() {
        let extracted = extract("Apenas texto. Sem código.");
        assert!(!extracted.has_blocks());
        assert_eq!(extracted.text(), "Apenas texto. Sem código.");
    }

    #[test]
    fn test_extract_single_block() {
        let text = "Antes.\n```rust\nfn main() {}\n```\nDepois.";
        let extracted = extract(text);

        assert_eq!(extracted.blocks().len(), 1);
        assert_eq!(extracted.blocks()[0].content, "```rust\nfn main() {}\n```");
        assert_eq!(extracted.text(), format!("Antes.\n{}\nDepois.", placeholder(0)));
        assert_eq!(&text[extracted.blocks()[0].span.clone()], extracted.blocks()[0].content);
    }

    #[test]
    fn test_extract_empty_block() {
        let extracted = extract("a ``````  b");
        assert_eq!(extracted.blocks().len(), 1);
        assert_eq!(extracted.blocks()[0].content, "``````");
    }

    #[test]
    fn test_duplicate_blocks_get_distinct_placeholders() {
        let text = "x ```same``` y ```same``` z";
        let extracted = extract(text);

        assert_eq!(extracted.blocks().len(), 2);
        assert_eq!(
            extracted.text(),
            format!("x {} y {} z", placeholder(0), placeholder(1))
        );
    }

    #[test]
    fn test_restore_round_trip() {
        let text = "Intro ```a\nb``` meio ```c``` fim";
        let extracted = extract(text);
        assert_eq!(extracted.restore(extracted.text()), text);
    }

    #[test]
    fn test_restore_repeated_placeholder() {
        let extracted = extract("```x```");
        let chunk = format!("{} e {}", placeholder(0), placeholder(0));
        assert_eq!(extracted.restore(&chunk), "```x``` e ```x```");
    }

    #[test]
    fn test_restore_unknown_index_kept() {
        let extracted = extract("```x```");
        let chunk = placeholder(7);
        assert_eq!(extracted.restore(&chunk), chunk);
    }

    #[test]
    fn test_strip_and_bare_placeholder() {
        let extracted = extract("```x```");
        assert!(extracted.is_bare_placeholder(&format!("  {} ", placeholder(0))));
        assert!(!extracted.is_bare_placeholder(&format!("{} texto", placeholder(0))));
        assert_eq!(extracted.strip(&format!("a{}b", placeholder(0))), "ab");
    }

    #[test]
    fn test_unclosed_fence_left_alone() {
        let extracted = extract("texto ```sem fim");
        assert!(!extracted.has_blocks());
        assert_eq!(extracted.text(), "texto ```sem fim");
    }
}
