//! 콘텐츠 추출 모듈
//!
//! 수집된 파일에서 평문 텍스트를 꺼내 문서로 만듭니다.
//! - 텍스트 파일: 직접 읽기
//! - PDF 파일: pdf-extract로 페이지별 추출

pub mod pdf;

use std::path::Path;

use anyhow::{Context, Result};

use crate::collector::FileType;
use crate::document::{Document, META_PAGE};

/// 추출된 콘텐츠
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub text: String,
    pub source_type: FileType,
    /// PDF 페이지 번호 (1부터 시작)
    pub page_number: Option<usize>,
}

impl ExtractedContent {
    /// `source` 메타데이터와 (있으면) 페이지 번호를 가진 문서로 변환
    pub fn into_document(self, source: &str) -> Document {
        let doc = Document::from_source(self.text, source);
        match self.page_number {
            Some(page) => doc.with_meta(META_PAGE, page.to_string()),
            None => doc,
        }
    }
}

/// 콘텐츠 추출기
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentExtractor;

impl ContentExtractor {
    /// 파일에서 콘텐츠 추출
    pub async fn extract(&self, path: &Path, file_type: FileType) -> Result<Vec<ExtractedContent>> {
        match file_type {
            FileType::Text => self.extract_text(path).await,
            FileType::Pdf => self.extract_pdf(path).await,
        }
    }

    async fn extract_text(&self, path: &Path) -> Result<Vec<ExtractedContent>> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read text file: {:?}", path))?;

        Ok(vec![ExtractedContent {
            text,
            source_type: FileType::Text,
            page_number: None,
        }])
    }

    async fn extract_pdf(&self, path: &Path) -> Result<Vec<ExtractedContent>> {
        // CPU 바운드 작업
        let path = path.to_path_buf();
        let pages = tokio::task::spawn_blocking(move || pdf::extract_text_from_pdf(&path))
            .await
            .context("PDF extraction task failed")??;

        Ok(pages
            .into_iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(page, text)| ExtractedContent {
                text,
                source_type: FileType::Pdf,
                page_number: Some(page),
            })
            .collect())
    }
}
