//! 十二篮 (The Twelve Baskets) on pages.uoregon.edu.
//!
//! The index is two levels deep: a main page whose `#table3` links to twelve
//! volume pages, and volume pages whose `td[colspan=5]` lists the articles.
//! Article pages are unstructured GB18030 HTML; the body is the longest
//! paragraph and every `<b>` inside it is a `####` heading.

use super::{Site, dedup_by_url, fetch_index};
use crate::config::Politeness;
use crate::error::FetchError;
use crate::extract::{ExtractProfile, HeadingLevels, Selection, css};
use crate::fetcher::PageFetcher;
use crate::models::IndexEntry;
use crate::outputs::markdown::{Layout, LinkPlacement};
use scraper::{ElementRef, Html};
use tracing::{info, instrument, warn};
use url::Url;

const INDEX_URL: &str = "https://pages.uoregon.edu/fyin/%E7%81%B5%E7%B2%AE/%E5%8D%81%E4%BA%8C%E7%AF%AE/%E5%8D%81%E4%BA%8C%E7%AF%AE%20%E7%9B%AE%E5%BD%95.htm";

const VOLUME_NAMES: [&str; 12] = [
    "第一辑", "第二辑", "第三辑", "第四辑", "第五辑", "第六辑", "第七辑", "第八辑", "第九辑", "第十辑", "第十一辑",
    "第十二辑",
];

/// Articles listed per volume page.
const ARTICLES_PER_VOLUME: usize = 12;

/// Volume links read from the main index, after the leading home link. One
/// more than the named volumes, so a late-added volume is still picked up.
const MAX_VOLUME_LINKS: usize = 13;

pub fn site() -> Site {
    Site {
        key: "twelve-baskets",
        title: "十二篮",
        index_url: INDEX_URL,
        encoding: encoding_rs::GB18030,
        output_file: "十二篮.md",
        politeness: Politeness::between(500, 1500),
        profile: ExtractProfile::new(Selection::Longest).bold_headings(HeadingLevels::flat(4)),
        layout: Layout {
            title_level: 3,
            link: LinkPlacement::BeforeBody,
            placeholder: "_（本条未检测到第三个段落或内容为空）_",
            ..Layout::default()
        },
        page_title: None,
        suppress_duplicate_title: false,
    }
}

pub fn volume_name(index: usize) -> String {
    VOLUME_NAMES
        .get(index)
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("第{}辑", index + 1))
}

fn href_anchors<'a>(scope: ElementRef<'a>) -> impl Iterator<Item = (ElementRef<'a>, &'a str)> {
    let selector = css("a[href]");
    scope
        .select(&selector)
        .filter_map(|a| a.value().attr("href").map(|href| (a, href.trim())))
        .collect::<Vec<_>>()
        .into_iter()
}

/// Volume links from the main index page.
///
/// The first in-table link points back to the site and is skipped; at most
/// thirteen volume links follow.
pub fn volume_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let table = document.select(&css("#table3")).next().or_else(|| {
        document
            .select(&css(r#"a[name="table3"], [name="table3"]"#))
            .next()
            .map(|named| match named.value().name() {
                "a" => named.parent().and_then(ElementRef::wrap).unwrap_or(named),
                _ => named,
            })
    });
    let Some(table) = table else {
        warn!("No #table3 on the main index page");
        return Vec::new();
    };

    href_anchors(table)
        .filter(|(_, href)| !href.starts_with('#'))
        .skip(1)
        .take(MAX_VOLUME_LINKS)
        .filter_map(|(_, href)| base.join(href).ok())
        .collect()
}

/// Text after the first `、` of an anchor, or the whole text.
pub fn title_after_dunhao(text: &str) -> String {
    let text = text.trim();
    match text.split_once('、') {
        Some((_, rest)) if !rest.trim().is_empty() => rest.trim().to_string(),
        _ => text.to_string(),
    }
}

/// Article entries from one volume page.
pub fn volume_entries(html: &str, base: &Url) -> Vec<IndexEntry> {
    let document = Html::parse_document(html);
    let Some(cell) = document
        .select(&css(r#"td[colspan="5"]"#))
        .next()
        .or_else(|| document.select(&css(r#"td[colspan="4"]"#)).next())
    else {
        return Vec::new();
    };

    href_anchors(cell)
        .take(ARTICLES_PER_VOLUME)
        .filter_map(|(a, href)| {
            let text = a.text().collect::<Vec<_>>().join(" ");
            let url = base.join(href).ok()?;
            Some(IndexEntry::new(title_after_dunhao(&text), url.to_string()))
        })
        .collect()
}

#[instrument(level = "info", skip_all)]
pub async fn index<F: PageFetcher>(site: &Site, fetcher: &F) -> Result<Vec<IndexEntry>, FetchError> {
    let main = fetch_index(site, fetcher, site.index_url).await?;
    let volumes = volume_links(&main.html, &main.url);
    if volumes.len() != VOLUME_NAMES.len() {
        warn!(found = volumes.len(), expected = VOLUME_NAMES.len(), "Unexpected volume count; continuing");
    }

    let mut entries = Vec::new();
    for (i, volume_url) in volumes.iter().enumerate() {
        let page = match fetcher.fetch(volume_url.as_str(), site.encoding).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %volume_url, error = %e, "Volume page fetch failed; skipping volume");
                continue;
            }
        };
        let group = volume_name(i);
        let articles = volume_entries(&page.html, &page.url);
        info!(volume = %group, count = articles.len(), "Indexed volume");
        entries.extend(articles.into_iter().map(|e| e.in_group(group.clone())));
    }
    Ok(dedup_by_url(entries))
}
