//! 소스 로더
//!
//! 컨텍스트의 소스 문자열(URL, 파일, 폴더)을 문서 목록으로 변환합니다.
//! 소스 하나가 실패해도 경고만 남기고 나머지를 계속 처리합니다.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use url::Url;

use crate::collector::{FileCollector, FileType};
use crate::document::{Document, META_PUBLISH_DATE, META_TITLE};
use crate::extractor::ContentExtractor;
use crate::scraper::{Article, WebScraper};

/// 메타데이터 값이 없을 때
pub const NOT_AVAILABLE: &str = "N/A";

// ============================================================================
// Source
// ============================================================================

/// 분류된 소스
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(Url),
    File(PathBuf),
    Directory(PathBuf),
}

impl Source {
    /// 소스 문자열 분류 (http/https URL, 존재하는 파일, 존재하는 폴더)
    pub fn classify(raw: &str) -> Option<Self> {
        let raw = raw.trim();

        if let Ok(url) = Url::parse(raw) {
            if matches!(url.scheme(), "http" | "https") {
                return Some(Source::Url(url));
            }
        }

        let path = Path::new(raw);
        if path.is_dir() {
            Some(Source::Directory(path.to_path_buf()))
        } else if path.is_file() {
            Some(Source::File(path.to_path_buf()))
        } else {
            None
        }
    }
}

/// 기사를 문서로 변환
pub fn article_document(article: Article) -> Document {
    let title = article.title.unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let publish_date = article
        .publish_date
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    Document::from_source(format!("Título: {}\n\n{}", title, article.text), article.url)
        .with_meta(META_TITLE, title)
        .with_meta(META_PUBLISH_DATE, publish_date)
}

// ============================================================================
// DocumentLoader
// ============================================================================

/// 소스 → 문서 로더
#[derive(Default)]
pub struct DocumentLoader {
    scraper: Option<WebScraper>,
    collector: FileCollector,
    extractor: ContentExtractor,
}

impl DocumentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// 모든 소스 로드 (실패한 소스는 건너뜀)
    pub async fn load_all(&mut self, sources: &[String]) -> Vec<Document> {
        let mut documents = Vec::new();

        for raw in sources {
            match self.load(raw).await {
                Ok(docs) => {
                    tracing::info!("Loaded {} document(s) from {}", docs.len(), raw);
                    documents.extend(docs);
                }
                Err(e) => tracing::warn!("Skipping source {}: {:#}", raw, e),
            }
        }

        documents
    }

    /// 소스 하나 로드
    pub async fn load(&mut self, raw: &str) -> Result<Vec<Document>> {
        let source = Source::classify(raw)
            .with_context(|| format!("Not a URL or an existing path: {}", raw))?;

        match source {
            Source::Url(url) => {
                let article = self.scraper()?.scrape(url.as_str()).await?;
                if article.text.trim().is_empty() {
                    anyhow::bail!("No article text found at {}", url);
                }
                Ok(vec![article_document(article)])
            }
            Source::File(path) => {
                let file_type = FileType::from_path(&path)
                    .with_context(|| format!("Unsupported file type: {:?}", path))?;
                self.load_file(&path, file_type).await
            }
            Source::Directory(dir) => {
                let mut documents = Vec::new();
                for file in self.collector.collect(&dir)? {
                    match self.load_file(&file.path, file.file_type).await {
                        Ok(docs) => documents.extend(docs),
                        Err(e) => tracing::warn!("Skipping file {:?}: {:#}", file.path, e),
                    }
                }
                Ok(documents)
            }
        }
    }

    async fn load_file(&self, path: &Path, file_type: FileType) -> Result<Vec<Document>> {
        let source = path.to_string_lossy();
        Ok(self
            .extractor
            .extract(path, file_type)
            .await?
            .into_iter()
            .map(|content| content.into_document(&source))
            .collect())
    }

    /// 스크래퍼는 URL 소스가 처음 나올 때 생성
    fn scraper(&mut self) -> Result<&WebScraper> {
        if self.scraper.is_none() {
            self.scraper = Some(WebScraper::new()?);
        }
        self.scraper
            .as_ref()
            .context("Web scraper unavailable")
    }
}
