//! 인라인 서식 및 공백 정리
//!
//! 청크 경계와 무관한 순수 문자열 변환입니다.

use std::sync::LazyLock;

use regex::Regex;

/// 파일 경로 (공백, 쉼표, 여는 괄호 뒤에 오는 `/...` 또는 `./...`)
static PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\s,(])((?:/|\./)[\w./\-]+)").expect("Invalid path regex")
});

/// 셸 변수 참조 (`$HOME`)
static SHELL_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\w+").expect("Invalid shell variable regex"));

/// 대문자 상수 할당 (`API_KEY=value`)
static CONST_ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b[A-Z_]{3,}=[\w"./\-]+"#).expect("Invalid constant regex")
});

static MULTI_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" +").expect("Invalid space regex"));

static MULTI_NEWLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("Invalid newline regex"));

/// 기술 요소를 백틱으로 감싸기
///
/// 경로, `$VAR` 참조, `CONST=value` 할당 순서로 적용합니다.
pub fn apply_inline_formatting(text: &str) -> String {
    let text = PATH_RE.replace_all(text, "$1`$2`");
    let text = SHELL_VAR_RE.replace_all(&text, "`$0`");
    let text = CONST_ASSIGN_RE.replace_all(&text, "`$0`");
    text.into_owned()
}

/// 연속 공백은 하나로, 3줄 이상 빈 줄은 2줄로 줄이고 양끝을 정리
pub fn normalize_whitespace(text: &str) -> String {
    let text = MULTI_SPACE_RE.replace_all(text, " ");
    let text = MULTI_NEWLINE_RE.replace_all(&text, "\n\n");
    text.trim().to_string()
}
