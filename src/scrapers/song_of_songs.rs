//! 歌中之歌 (Song of Songs) on lightinnj.org.
//!
//! Section pages are a run of `<p>`s with `<b>` headings inline: the
//! introduction packs several numbered headings (`一　…` to `八　…`) into
//! one paragraph, later sections open with `壹 羡慕（一章二至三节）` style
//! headings. Numbered headings sit one level below the others. Pages often
//! repeat the section title as their first line, which is dropped.

use super::{Site, dedup_by_url, fetch_index};
use crate::config::Politeness;
use crate::error::FetchError;
use crate::extract::{ExtractProfile, HeadingLevels, Selection, css};
use crate::fetcher::PageFetcher;
use crate::models::IndexEntry;
use crate::outputs::markdown::Layout;
use scraper::Html;
use tracing::{info, instrument};
use url::Url;

const INDEX_URL: &str = "http://www.lightinnj.org/%E5%B1%9E%E7%81%B5%E4%B9%A6%E6%8A%A5/004%E8%AF%BB%E7%BB%8F%E7%B1%BB%20%E7%9B%AE%E5%BD%95/4004%E6%AD%8C%E4%B8%AD%E7%9A%84%E6%AD%8C/%E6%AD%8C%E4%B8%AD%E7%9A%84%E6%AD%8C%20%20%E7%9B%AE%E5%BD%95.htm";

/// Navigation anchors on the index page.
const NAVIGATION: [&str; 1] = ["回首页"];

pub fn site() -> Site {
    Site {
        key: "song-of-songs",
        title: "歌中之歌",
        index_url: INDEX_URL,
        encoding: encoding_rs::GB18030,
        output_file: "歌中之歌.md",
        politeness: Politeness::between(500, 1500),
        profile: ExtractProfile::new(Selection::All {
            selector: css("p"),
            skip: 0,
        })
        .bold_headings(HeadingLevels::default())
        .skip_prefixes(&["回目录", "书名："])
        .tighten_cjk_punctuation(),
        layout: Layout::default(),
        page_title: None,
        suppress_duplicate_title: true,
    }
}

/// Section links, minus navigation and links climbing out of the book.
pub fn section_links(html: &str, base: &Url) -> Vec<IndexEntry> {
    let document = Html::parse_document(html);
    document
        .select(&css("a[href]"))
        .filter_map(|a| {
            let text = a.text().collect::<String>().trim().to_string();
            let href = a.value().attr("href")?.trim();
            if text.is_empty() || NAVIGATION.contains(&text.as_str()) || href.is_empty() || href.starts_with("../") {
                return None;
            }
            let url = base.join(href).ok()?;
            Some(IndexEntry::new(text, url.to_string()))
        })
        .collect()
}

#[instrument(level = "info", skip_all)]
pub async fn index<F: PageFetcher>(site: &Site, fetcher: &F) -> Result<Vec<IndexEntry>, FetchError> {
    let page = fetch_index(site, fetcher, site.index_url).await?;
    let sections = dedup_by_url(section_links(&page.html, &page.url));
    info!(count = sections.len(), "Found sections");
    Ok(sections)
}
