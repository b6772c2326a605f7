//! PDF 텍스트 추출
//!
//! pdf-extract로 전체 텍스트를 뽑은 뒤 폼피드(\x0c) 기준으로 페이지를 나눕니다.

use std::path::Path;

use anyhow::{Context, Result};

/// PDF에서 (페이지 번호, 텍스트) 목록 추출. 페이지 번호는 1부터 시작합니다.
pub fn extract_text_from_pdf(path: &Path) -> Result<Vec<(usize, String)>> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read PDF: {:?}", path))?;

    let text = pdf_extract::extract_text_from_mem(&bytes)
        .with_context(|| format!("Failed to extract text from PDF: {:?}", path))?;

    if text.trim().is_empty() {
        tracing::warn!(
            "No text extracted from PDF: {:?}. It might be a scanned document.",
            path
        );
        return Ok(vec![]);
    }

    Ok(split_pages(&text)
        .into_iter()
        .enumerate()
        .map(|(i, page)| (i + 1, page))
        .collect())
}

/// 폼피드로 페이지 분리 (빈 페이지 제외). 폼피드가 없으면 전체가 한 페이지입니다.
fn split_pages(text: &str) -> Vec<String> {
    text.split('\x0c')
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .map(str::to_string)
        .collect()
}
