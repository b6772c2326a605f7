//! 문서 레코드
//!
//! 파이프라인을 따라 전달되는 불변 레코드: 본문 + 문자열 메타데이터.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 메타데이터 키: 원본 위치 (URL 또는 파일 경로)
pub const META_SOURCE: &str = "source";
/// 메타데이터 키: 제목
pub const META_TITLE: &str = "title";
/// 메타데이터 키: 게시일 (`%Y-%m-%d` 또는 `N/A`)
pub const META_PUBLISH_DATE: &str = "publish_date";
/// 메타데이터 키: PDF 페이지 번호
pub const META_PAGE: &str = "page";
/// 메타데이터 키: 청크 종류 (`text` / `code`)
pub const META_CHUNK_TYPE: &str = "chunk_type";

/// 본문과 메타데이터를 가진 문서
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    content: String,
    metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: BTreeMap<String, String>) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// `source` 메타데이터만 가진 문서
    pub fn from_source(content: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(META_SOURCE.to_string(), source.into());
        Self::new(content, metadata)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn source(&self) -> Option<&str> {
        self.get(META_SOURCE)
    }

    /// 메타데이터를 복사해 본문만 바꾼 새 문서
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self::new(content, self.metadata.clone())
    }

    /// 메타데이터 항목 하나를 더한 새 문서
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_source() {
        let doc = Document::from_source("corpo", "https://exemplo.com");
        assert_eq!(doc.content(), "corpo");
        assert_eq!(doc.source(), Some("https://exemplo.com"));
    }

    #[test]
    fn test_with_content_copies_metadata() {
        let doc = Document::from_source("original", "a.txt").with_meta(META_TITLE, "Título");
        let chunk = doc.with_content("pedaço");

        assert_eq!(chunk.content(), "pedaço");
        assert_eq!(chunk.metadata(), doc.metadata());
        // 원본은 그대로
        assert_eq!(doc.content(), "original");
    }

    #[test]
    fn test_serde_round_trip() {
        let doc = Document::from_source("x", "y");
        let json = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
