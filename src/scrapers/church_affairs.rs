//! 教会的事务 (Church Affairs) on ezoe.work.
//!
//! Modern, class-annotated markup: the chapter lives in `div.main` (older
//! pages use `#c`), `.cn1` blocks are section headings, `.cn2` blocks are
//! subsection headings, everything else is a paragraph. The chapter title is
//! read from `div.feature-title` on the page itself.

use super::{Site, dedup_by_url, fetch_index};
use crate::config::Politeness;
use crate::error::FetchError;
use crate::extract::{ExtractProfile, Selection, css};
use crate::fetcher::PageFetcher;
use crate::models::IndexEntry;
use crate::outputs::markdown::{Layout, LinkPlacement};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use tracing::{info, instrument};
use url::Url;

const INDEX_URL: &str = "https://ezoe.work/books/3/3007.html";

static CHAPTER_HREF: Lazy<Regex> = Lazy::new(|| Regex::new(r"^3007-\d+\.html").expect("valid chapter href regex"));

/// `第三篇` style ordinal in front of a chapter title.
static ORDINAL_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^第[^篇]+篇\s*").expect("valid ordinal regex"));

static ORDINAL_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"第[^篇]+篇\s*([^\n]+)").expect("valid ordinal title regex"));

pub fn site() -> Site {
    Site {
        key: "church-affairs",
        title: "教会的事务",
        index_url: INDEX_URL,
        encoding: encoding_rs::UTF_8,
        output_file: "教会的事务.md",
        politeness: Politeness::between(500, 1500),
        profile: ExtractProfile::new(Selection::Container(vec![css("div.main"), css("#c")]))
            .marker(".cn1", 3)
            .marker(".cn2", 4),
        layout: Layout {
            link: LinkPlacement::AfterBody,
            ..Layout::default()
        },
        page_title: Some(chapter_title),
        suppress_duplicate_title: false,
    }
}

/// Chapter links (`3007-1.html`, `3007-2.html`, …) in index order.
pub fn chapter_links(html: &str, base: &Url) -> Vec<IndexEntry> {
    let document = Html::parse_document(html);
    document
        .select(&css("a[href]"))
        .filter_map(|a| {
            let href = a.value().attr("href")?.trim();
            if !CHAPTER_HREF.is_match(href) {
                return None;
            }
            let text = a.text().collect::<String>().trim().to_string();
            let url = base.join(href).ok()?;
            Some(IndexEntry::new(text, url.to_string()))
        })
        .collect()
}

/// Chapter title without its `第…篇` ordinal.
///
/// Read from `div.feature-title`; failing that, from the first `第…篇` line
/// anywhere in the page text.
pub fn chapter_title(document: &Html) -> Option<String> {
    if let Some(title) = document.select(&css("div.feature-title")).next() {
        let text = title.text().collect::<String>();
        let text = ORDINAL_PREFIX.replace(text.trim(), "");
        return Some(text.trim().to_string()).filter(|t| !t.is_empty());
    }
    let text = document.root_element().text().collect::<String>();
    ORDINAL_TITLE
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty())
}

#[instrument(level = "info", skip_all)]
pub async fn index<F: PageFetcher>(site: &Site, fetcher: &F) -> Result<Vec<IndexEntry>, FetchError> {
    let page = fetch_index(site, fetcher, site.index_url).await?;
    let chapters = dedup_by_url(chapter_links(&page.html, &page.url));
    info!(count = chapters.len(), "Found chapters");
    Ok(chapters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IndexEntry, Page, SectionBody};
    use crate::scrapers::build_section;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_chapter_links_match_pattern_only() {
        let base = Url::parse(INDEX_URL).unwrap();
        let html = r#"
            <a href="3007.html">目录</a>
            <a href="3007-1.html">第一篇 教会里的职分</a>
            <a href="3007-2.html">第二篇 长老的职责</a>
            <a href="/books/3/3008-1.html">下一本</a>"#;
        let entries = chapter_links(html, &base);
        assert_eq!(
            entries,
            vec![
                IndexEntry::new("第一篇 教会里的职分", "https://ezoe.work/books/3/3007-1.html"),
                IndexEntry::new("第二篇 长老的职责", "https://ezoe.work/books/3/3007-2.html"),
            ]
        );
    }

    #[test]
    fn test_chapter_title_strips_ordinal() {
        let doc = Html::parse_document(r#"<div class="feature-title">第一篇 教会里的职分</div>"#);
        assert_eq!(chapter_title(&doc).as_deref(), Some("教会里的职分"));
        let doc = Html::parse_document(r#"<div class="feature-title">第十二篇教会的交通</div>"#);
        assert_eq!(chapter_title(&doc).as_deref(), Some("教会的交通"));
    }

    #[test]
    fn test_chapter_title_fallback_to_text() {
        let doc = Html::parse_document("<div>首页</div><div>第二篇 长老的职责\n正文</div>");
        assert_eq!(chapter_title(&doc).as_deref(), Some("长老的职责"));
        let doc = Html::parse_document("<div>没有标题</div>");
        assert_eq!(chapter_title(&doc), None);
    }

    #[test]
    fn test_chapter_page_to_section() {
        let page = Page {
            url: Url::parse("https://ezoe.work/books/3/3007-1.html").unwrap(),
            html: r#"<div class="feature-title">第一篇 教会里的职分</div>
            <div class="main">
                <div class="cn1">壹　长老</div>
                <div>长老是地方<br>教会的监督。</div>
                <br>
                <div class="cn2">一　资格</div>
                <div class="cont">要无可指责。</div>
            </div>"#
                .to_string(),
        };
        let entry = IndexEntry::new("第一篇 教会里的职分", page.url.to_string());
        let section = build_section(&site(), entry, &page);
        assert_eq!(section.title, "教会里的职分");
        let SectionBody::Extracted(fragment) = section.body else {
            panic!("expected extracted content");
        };
        assert_eq!(
            fragment.to_markdown(),
            "### 壹 长老\n\n长老是地方\n教会的监督。\n\n#### 一 资格\n\n要无可指责。"
        );
    }
}
