//! 문장 분할기
//!
//! UAX #29 문장 경계(unicode-segmentation)를 기본으로 하고,
//! 언어별 모델(약어 목록)로 잘못된 경계를 보정합니다.
//!
//! 모델 파일은 처음 사용할 때 캐시 디렉토리에 한 번 준비되고
//! 이후에는 그대로 재사용됩니다. 사용자가 파일을 편집해 약어를 추가할 수 있습니다.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

// ============================================================================
// Errors
// ============================================================================

/// 문장 분할 에러
#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("failed to access segmenter model at {path:?}: {source}")]
    ModelIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid segmenter model at {path:?} (line {line}): {reason}")]
    InvalidModel {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("segmentation failed: {0}")]
    Failed(String),
}

// ============================================================================
// Language
// ============================================================================

/// 문장 분할 언어
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    Portuguese,
    English,
    Spanish,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Portuguese, Language::English, Language::Spanish];

    /// 모델 파일 이름 등에 쓰는 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Portuguese => "portuguese",
            Language::English => "english",
            Language::Spanish => "spanish",
        }
    }

    /// 내장 약어 목록 (마침표 제외, 소문자)
    fn builtin_abbreviations(&self) -> &'static [&'static str] {
        match self {
            Language::Portuguese => &[
                "sr", "sra", "srs", "sras", "srta", "dr", "dra", "drs", "dras", "prof", "profa",
                "eng", "exmo", "exma", "av", "pág", "págs", "p", "pp", "cap", "fig", "tel",
                "ex", "obs", "aprox", "núm", "vol", "ed", "cf", "op", "cit", "ltda", "cia",
                "s.a", "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out",
                "nov", "dez",
            ],
            Language::English => &[
                "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "e.g", "i.e", "fig",
                "approx", "dept", "inc", "ltd", "co", "corp", "vol", "ed", "pp", "jan", "feb",
                "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
            ],
            Language::Spanish => &[
                "sr", "sra", "srta", "sres", "dr", "dra", "ud", "uds", "prof", "pág", "págs",
                "av", "ing", "lic", "aprox", "cap", "fig", "tel", "vol", "ed", "cía", "s.a",
                "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov",
                "dic",
            ],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = SegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "portuguese" | "português" | "portugues" | "pt" | "pt-br" | "pt_br" => {
                Ok(Language::Portuguese)
            }
            "english" | "en" | "en-us" | "en_us" => Ok(Language::English),
            "spanish" | "español" | "espanol" | "es" => Ok(Language::Spanish),
            other => Err(SegmentError::UnsupportedLanguage(other.to_string())),
        }
    }
}

// ============================================================================
// SentenceSegmenter Trait
// ============================================================================

/// 문장 분할 트레이트
///
/// 반환되는 문장은 입력의 부분 슬라이스이며, 앞뒤 공백이 제거되고 비어 있지 않습니다.
pub trait SentenceSegmenter: Send + Sync {
    /// 텍스트를 문장 목록으로 분할
    fn segment<'a>(&self, text: &'a str) -> Result<Vec<&'a str>, SegmentError>;

    /// 분할기 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// Segmenter Model
// ============================================================================

/// 언어별 보정 모델
#[derive(Debug, Clone)]
pub struct SegmenterModel {
    language: Language,
    abbreviations: HashSet<String>,
}

impl SegmenterModel {
    /// 내장 목록으로 모델 생성
    pub fn builtin(language: Language) -> Self {
        Self {
            language,
            abbreviations: language
                .builtin_abbreviations()
                .iter()
                .map(|a| a.to_string())
                .collect(),
        }
    }

    /// 모델 파일 내용 파싱 (한 줄에 약어 하나, `#` 주석)
    pub fn parse(language: Language, contents: &str, path: &Path) -> Result<Self, SegmentError> {
        let mut abbreviations = HashSet::new();

        for (i, line) in contents.lines().enumerate() {
            let entry = line.trim();
            if entry.is_empty() || entry.starts_with('#') {
                continue;
            }
            if entry.chars().any(char::is_whitespace) {
                return Err(SegmentError::InvalidModel {
                    path: path.to_path_buf(),
                    line: i + 1,
                    reason: format!("entry contains whitespace: {:?}", entry),
                });
            }
            abbreviations.insert(entry.trim_end_matches('.').to_lowercase());
        }

        Ok(Self {
            language,
            abbreviations,
        })
    }

    /// 파일로 저장할 텍스트
    pub fn to_file_contents(&self) -> String {
        let mut entries: Vec<&str> = self.abbreviations.iter().map(String::as_str).collect();
        entries.sort_unstable();

        let mut out = format!(
            "# sentence segmenter model: {}\n# one abbreviation per line, without the final period\n",
            self.language
        );
        for entry in entries {
            out.push_str(entry);
            out.push('\n');
        }
        out
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn abbreviation_count(&self) -> usize {
        self.abbreviations.len()
    }

    /// 이 구간 끝의 마침표가 문장 끝이 아닌지 판단
    ///
    /// 약어, 단일 대문자 이니셜("J."), 구간 전체가 목록 번호("1.")인 경우.
    /// 소문자 단어 뒤의 한 글자("plano B.")는 다음 구간이 대문자로 시작하면 문장 끝입니다.
    fn continues_after(&self, span: &str, next: Option<&str>) -> bool {
        let span = span.trim_end();
        if !span.ends_with('.') {
            return false;
        }

        let token = span
            .rsplit(char::is_whitespace)
            .next()
            .unwrap_or(span)
            .trim_start_matches(|c: char| !c.is_alphanumeric());
        let word = token.trim_end_matches('.');

        if word.is_empty() {
            return false;
        }

        // 목록 번호만 있는 구간: "1.", "12."
        if word.chars().all(|c| c.is_ascii_digit()) {
            return span.trim_start() == token;
        }

        // 이니셜: "J."
        let mut chars = word.chars();
        if let (Some(first), None) = (chars.next(), chars.next()) {
            if first.is_uppercase() {
                // 짧은 소문자 단어("de", "by")는 이름 앞의 전치사로 봄
                let after_lowercase_word = span[..span.len() - token.len()]
                    .split_whitespace()
                    .next_back()
                    .is_some_and(|w| {
                        w.chars().count() > 3 && w.chars().next().is_some_and(char::is_lowercase)
                    });
                let next_capitalized = next
                    .and_then(|n| n.trim_start().chars().next())
                    .is_some_and(char::is_uppercase);
                return !(after_lowercase_word && next_capitalized);
            }
        }

        self.abbreviations.contains(&word.to_lowercase())
    }
}

// ============================================================================
// UnicodeSegmenter
// ============================================================================

/// UAX #29 + 언어 모델 보정 분할기
#[derive(Debug, Clone)]
pub struct UnicodeSegmenter {
    model: SegmenterModel,
}

impl UnicodeSegmenter {
    pub fn new(model: SegmenterModel) -> Self {
        Self { model }
    }

    /// 내장 모델로 생성 (파일시스템 접근 없음)
    pub fn builtin(language: Language) -> Self {
        Self::new(SegmenterModel::builtin(language))
    }

    pub fn language(&self) -> Language {
        self.model.language()
    }
}

impl SentenceSegmenter for UnicodeSegmenter {
    fn segment<'a>(&self, text: &'a str) -> Result<Vec<&'a str>, SegmentError> {
        let mut sentences = Vec::new();
        let mut pending: Option<usize> = None;

        let pieces: Vec<(usize, &str)> = text.split_sentence_bound_indices().collect();

        for (i, &(offset, piece)) in pieces.iter().enumerate() {
            let start = pending.take().unwrap_or(offset);
            let span = &text[start..offset + piece.len()];
            let next = pieces.get(i + 1).map(|&(_, p)| p);

            if self.model.continues_after(span, next) {
                pending = Some(start);
                continue;
            }

            let sentence = span.trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
        }

        if let Some(start) = pending {
            let sentence = text[start..].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
        }

        Ok(sentences)
    }

    fn name(&self) -> &'static str {
        "UnicodeSegmenter"
    }
}

// ============================================================================
// NewlineSegmenter
// ============================================================================

/// 줄 단위 분할기 (폴백)
///
/// 비어 있지 않은 각 줄을 한 문장으로 취급합니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewlineSegmenter;

impl NewlineSegmenter {
    pub fn split(text: &str) -> Vec<&str> {
        text.split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }
}

impl SentenceSegmenter for NewlineSegmenter {
    fn segment<'a>(&self, text: &'a str) -> Result<Vec<&'a str>, SegmentError> {
        Ok(Self::split(text))
    }

    fn name(&self) -> &'static str {
        "NewlineSegmenter"
    }
}

// ============================================================================
// Model Cache
// ============================================================================

/// 분할 모델 캐시 디렉토리
#[derive(Debug, Clone)]
pub struct ModelCache {
    dir: PathBuf,
}

impl ModelCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 기본 위치 (~/.rag-indexer/segmenter)
    pub fn default_location() -> Self {
        Self::new(crate::config::get_data_dir().join("segmenter"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self, language: Language) -> PathBuf {
        self.dir.join(format!("{}.txt", language))
    }

    /// 모델 파일 준비 (이미 있으면 아무것도 하지 않음)
    pub fn ensure(&self, language: Language) -> Result<PathBuf, SegmentError> {
        let path = self.model_path(language);
        if path.is_file() {
            return Ok(path);
        }

        tracing::info!("Provisioning {} segmenter model at {:?}", language, path);

        std::fs::create_dir_all(&self.dir).map_err(|source| SegmentError::ModelIo {
            path: self.dir.clone(),
            source,
        })?;

        let contents = SegmenterModel::builtin(language).to_file_contents();
        std::fs::write(&path, contents).map_err(|source| SegmentError::ModelIo {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }

    /// 모델 로드 (필요 시 먼저 준비)
    pub fn load(&self, language: Language) -> Result<SegmenterModel, SegmentError> {
        let path = self.ensure(language)?;
        let contents = std::fs::read_to_string(&path).map_err(|source| SegmentError::ModelIo {
            path: path.clone(),
            source,
        })?;
        SegmenterModel::parse(language, &contents, &path)
    }
}

// ============================================================================
// Factory Function
// ============================================================================

/// 사용 준비가 끝난 분할기 생성
///
/// 모델을 준비하거나 읽을 수 없으면 줄 단위 분할기로 대체합니다.
pub fn load_segmenter(language: Language, cache: &ModelCache) -> Arc<dyn SentenceSegmenter> {
    match cache.load(language) {
        Ok(model) => {
            tracing::debug!(
                "Loaded {} segmenter model ({} abbreviations)",
                language,
                model.abbreviation_count()
            );
            Arc::new(UnicodeSegmenter::new(model))
        }
        Err(e) => {
            tracing::warn!("Segmenter model unavailable, splitting on newlines: {}", e);
            Arc::new(NewlineSegmenter)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pt() -> UnicodeSegmenter {
        UnicodeSegmenter::builtin(Language::Portuguese)
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("portuguese".parse::<Language>().ok(), Some(Language::Portuguese));
        assert_eq!("PT-BR".parse::<Language>().ok(), Some(Language::Portuguese));
        assert_eq!("en".parse::<Language>().ok(), Some(Language::English));
        assert_eq!("español".parse::<Language>().ok(), Some(Language::Spanish));
        assert!(matches!(
            "klingon".parse::<Language>(),
            Err(SegmentError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn test_segment_basic() {
        let sentences = pt().segment("Primeira frase. Segunda frase! Terceira?").unwrap();
        assert_eq!(sentences, vec!["Primeira frase.", "Segunda frase!", "Terceira?"]);
    }

    #[test]
    fn test_segment_empty() {
        assert!(pt().segment("").unwrap().is_empty());
        assert!(pt().segment("   \n\n ").unwrap().is_empty());
    }

    #[test]
    fn test_segment_abbreviation_not_split() {
        let sentences = pt()
            .segment("O Sr. Silva chegou cedo. A Dra. Souza também.")
            .unwrap();
        assert_eq!(
            sentences,
            vec!["O Sr. Silva chegou cedo.", "A Dra. Souza também."]
        );
    }

    #[test]
    fn test_segment_list_enumerator_kept_with_item() {
        let sentences = pt()
            .segment("Intro text. 1. First item. 1.1 Sub item continues. 2. Second item.")
            .unwrap();
        assert_eq!(
            sentences,
            vec![
                "Intro text.",
                "1. First item.",
                "1.1 Sub item continues.",
                "2. Second item.",
            ]
        );
    }

    #[test]
    fn test_segment_initials_kept_with_name() {
        let sentences = pt()
            .segment("O livro de J. R. Silva chegou. Segundo A. Souza, é raro.")
            .unwrap();
        assert_eq!(
            sentences,
            vec!["O livro de J. R. Silva chegou.", "Segundo A. Souza, é raro."]
        );
    }

    #[test]
    fn test_segment_single_letter_word_ends_sentence() {
        let sentences = pt()
            .segment("Escolhemos o plano B. Depois saímos. Tome vitamina C. Funciona.")
            .unwrap();
        assert_eq!(
            sentences,
            vec![
                "Escolhemos o plano B.",
                "Depois saímos.",
                "Tome vitamina C.",
                "Funciona."
            ]
        );
    }

    #[test]
    fn test_segment_number_at_sentence_end_still_splits() {
        let sentences = pt().segment("Comprei 3. Depois voltei.").unwrap();
        assert_eq!(sentences, vec!["Comprei 3.", "Depois voltei."]);
    }

    #[test]
    fn test_segment_slices_point_into_input() {
        let text = "Um. Dois.";
        let sentences = pt().segment(text).unwrap();
        for s in sentences {
            let start = s.as_ptr() as usize - text.as_ptr() as usize;
            assert_eq!(&text[start..start + s.len()], s);
        }
    }

    #[test]
    fn test_newline_segmenter() {
        let lines = NewlineSegmenter.segment("a\n\n  b  \nc").unwrap();
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_model_parse_rejects_whitespace_entry() {
        let result = SegmenterModel::parse(Language::English, "mr\nbad entry\n", Path::new("x"));
        assert!(matches!(
            result,
            Err(SegmentError::InvalidModel { line: 2, .. })
        ));
    }

    #[test]
    fn test_model_file_round_trip() {
        let model = SegmenterModel::builtin(Language::Spanish);
        let parsed =
            SegmenterModel::parse(Language::Spanish, &model.to_file_contents(), Path::new("x"))
                .unwrap();
        assert_eq!(parsed.abbreviation_count(), model.abbreviation_count());
    }

    #[test]
    fn test_cache_ensure_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ModelCache::new(temp_dir.path().join("models"));

        let path = cache.ensure(Language::Portuguese).unwrap();
        assert!(path.is_file());

        // 사용자가 편집한 모델은 덮어쓰지 않음
        std::fs::write(&path, "custom\n").unwrap();
        cache.ensure(Language::Portuguese).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "custom\n");

        let model = cache.load(Language::Portuguese).unwrap();
        assert_eq!(model.abbreviation_count(), 1);
    }

    #[test]
    fn test_custom_abbreviation_from_cache() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ModelCache::new(temp_dir.path());
        std::fs::write(cache.model_path(Language::English), "approx\nfoo\n").unwrap();

        let segmenter = load_segmenter(Language::English, &cache);
        let sentences = segmenter.segment("See foo. Bar here. End.").unwrap();
        assert_eq!(sentences, vec!["See foo. Bar here.", "End."]);
    }

    #[test]
    fn test_corrupt_model_falls_back_to_newlines() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ModelCache::new(temp_dir.path());
        std::fs::write(cache.model_path(Language::Portuguese), [0xff, 0xfe, 0x00]).unwrap();

        let segmenter = load_segmenter(Language::Portuguese, &cache);
        assert_eq!(segmenter.name(), "NewlineSegmenter");
    }
}
