//! 웹 스크래퍼 모듈 - 기사 본문 추출
//!
//! URL을 내려받아 제목, 본문, 게시일을 뽑아냅니다.
//! 내비게이션/광고 영역은 버리고 본문 컨테이너의 문단과 소제목만 모읍니다.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use scraper::{ElementRef, Html, Selector};

/// 브라우저처럼 보이는 User-Agent (일부 사이트는 봇 UA를 차단)
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// 본문에서 제외할 요소
const NOISE_TAGS: &[&str] = &[
    "script", "style", "header", "footer", "nav", "aside", "form", "button", "iframe",
];

/// 본문 컨테이너 우선순위
const CONTAINER_SELECTORS: &[&str] = &["article", "main", r#"div[class*="content"]"#];

/// 본문으로 모을 요소
const TEXT_SELECTOR: &str = "p, h1, h2, h3, h4";

// ============================================================================
// Article
// ============================================================================

/// 스크랩된 기사
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// 원본 URL
    pub url: String,
    /// 페이지 제목
    pub title: Option<String>,
    /// 본문 (문단마다 줄바꿈)
    pub text: String,
    /// 게시일
    pub publish_date: Option<NaiveDate>,
}

impl Article {
    /// HTML에서 기사 추출
    pub fn parse(url: &str, html: &str) -> Self {
        let document = Html::parse_document(html);

        Self {
            url: url.to_string(),
            title: extract_title(&document),
            text: extract_text(&document),
            publish_date: extract_publish_date(&document),
        }
    }
}

// ============================================================================
// WebScraper
// ============================================================================

/// 웹 스크래퍼
pub struct WebScraper {
    client: reqwest::Client,
}

impl WebScraper {
    /// 새 스크래퍼 생성
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    /// URL에서 기사 추출
    pub async fn scrape(&self, url: &str) -> Result<Article> {
        tracing::info!("Scraping: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("HTTP request failed: {}", url))?
            .error_for_status()
            .with_context(|| format!("HTTP error status: {}", url))?;

        let html = response
            .text()
            .await
            .context("Failed to read response body")?;

        let article = Article::parse(url, &html);
        tracing::debug!(
            "Scraped {} chars (title: {:?})",
            article.text.chars().count(),
            article.title
        );

        Ok(article)
    }
}

// ============================================================================
// Extraction helpers
// ============================================================================

fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 제목: og:title → <title> → <h1>
fn extract_title(document: &Html) -> Option<String> {
    non_empty(
        select_first(document, r#"meta[property="og:title"]"#)
            .and_then(|meta| meta.value().attr("content").map(str::to_string)),
    )
    .or_else(|| non_empty(select_first(document, "title").map(|e| element_text(&e))))
    .or_else(|| non_empty(select_first(document, "h1").map(|e| element_text(&e))))
}

/// 게시일: article:published_time 메타 → <time datetime>
fn extract_publish_date(document: &Html) -> Option<NaiveDate> {
    let meta = select_first(document, r#"meta[property="article:published_time"]"#)
        .and_then(|e| e.value().attr("content"));
    let time = select_first(document, "time[datetime]").and_then(|e| e.value().attr("datetime"));

    meta.into_iter().chain(time).find_map(parse_date)
}

/// RFC 3339 타임스탬프 또는 YYYY-MM-DD로 시작하는 문자열
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

fn inside_noise(element: &ElementRef) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|e| NOISE_TAGS.contains(&e.name()))
    })
}

/// 본문 컨테이너 선택 후 문단/소제목 텍스트를 줄 단위로 결합
fn extract_text(document: &Html) -> String {
    let container = CONTAINER_SELECTORS
        .iter()
        .find_map(|css| select_first(document, css))
        .unwrap_or_else(|| document.root_element());

    let Ok(text_selector) = Selector::parse(TEXT_SELECTOR) else {
        return String::new();
    };

    container
        .select(&text_selector)
        .filter(|element| !inside_noise(element))
        .map(|element| element_text(&element))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
