//! 문장 누적 알고리즘
//!
//! - Greedy: 최소 크기에 도달하고 문장 종결 부호로 끝나면 청크를 닫음 (오버랩 없음)
//! - Window: 최소 크기 윈도우를 만들고 마지막 W개 문장을 다음 윈도우에 다시 포함
//!
//! 길이는 바이트가 아닌 문자(char) 수로 셉니다.

use std::sync::LazyLock;

use regex::Regex;

/// 최상위 목록 항목 ("1. ", "  12. ")
static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\.\s").expect("Invalid list item regex"));

/// 하위 항목 ("1.1", "2.3.1")
static SUB_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\.\d+").expect("Invalid sub item regex"));

/// 문장 종결 부호
const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

#[inline]
fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join(sentences: &[&str]) -> String {
    sentences.join(" ").trim().to_string()
}

/// 최상위 목록 항목으로 시작하는 문장인지 확인 (하위 항목 제외)
pub fn is_hard_break(sentence: &str) -> bool {
    LIST_ITEM_RE.is_match(sentence) && !SUB_ITEM_RE.is_match(sentence)
}

/// 문장 종결 부호로 끝나는지 확인
pub fn ends_sentence(sentence: &str) -> bool {
    sentence.trim_end().ends_with(SENTENCE_TERMINATORS)
}

// ============================================================================
// Greedy (non-overlapping)
// ============================================================================

/// 최소 크기까지 문장을 누적
///
/// 누적 길이 >= `min_chars` 이고 방금 추가한 문장이 종결 부호로 끝나면 청크를 닫습니다.
/// `hard_breaks`가 켜져 있으면 최상위 목록 항목 앞에서 크기와 무관하게 닫습니다.
/// 남은 문장은 마지막 청크로 내보냅니다.
pub fn accumulate_greedy(sentences: &[&str], min_chars: usize, hard_breaks: bool) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut count = 0;

    for &sentence in sentences {
        if hard_breaks && !buffer.is_empty() && is_hard_break(sentence.trim()) {
            chunks.push(join(&buffer));
            buffer.clear();
            count = 0;
        }

        buffer.push(sentence);
        count += char_len(sentence);

        if count >= min_chars && ends_sentence(sentence) {
            chunks.push(join(&buffer));
            buffer.clear();
            count = 0;
        }
    }

    if !buffer.is_empty() {
        chunks.push(join(&buffer));
    }

    chunks
}

// ============================================================================
// Window (overlapping)
// ============================================================================

/// 오버랩 윈도우 청킹
///
/// `start`부터 누적 길이가 `min_chars` 이상이 될 때까지 문장을 모아 `[start, end]`를
/// 내보내고, 다음 시작은 `max(start + 1, end + 1 - overlap)`입니다.
/// 다음 시작이 문장 수 이상이 되면 종료하므로, `overlap > 0`이면 마지막 문장들이
/// 짧은 꼬리 윈도우로 한 번 더 나올 수 있습니다.
pub fn accumulate_windows(sentences: &[&str], min_chars: usize, overlap: usize) -> Vec<String> {
    let total = sentences.len();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < total {
        let mut end = start;
        let mut count = 0;

        for (i, sentence) in sentences.iter().enumerate().skip(start) {
            end = i;
            count += char_len(sentence);
            if count >= min_chars {
                break;
            }
        }

        chunks.push(join(&sentences[start..=end]));
        start = (end + 1).saturating_sub(overlap).max(start + 1);
    }

    chunks
}

// ============================================================================
// Fallback
// ============================================================================

/// 최후 수단: 고정 줄 수 단위로 분할
pub fn fallback_line_groups(text: &str, lines_per_chunk: usize) -> Vec<String> {
    let lines: Vec<&str> = text.trim().split('\n').collect();

    lines
        .chunks(lines_per_chunk.max(1))
        .map(|group| group.join("\n"))
        .filter(|chunk| !chunk.trim().is_empty())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
