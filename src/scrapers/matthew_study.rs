//! 马太福音查经记录 (Bible study notes on Matthew) on lightinnj.org.
//!
//! Chapter pages nest the text three tables deep; the body is the third
//! paragraph that has any text, or the longest one on short pages.

use super::{Site, dedup_by_url, fetch_index};
use crate::config::Politeness;
use crate::error::FetchError;
use crate::extract::{ExtractProfile, Selection, css};
use crate::fetcher::PageFetcher;
use crate::models::IndexEntry;
use crate::outputs::markdown::Layout;
use scraper::Html;
use tracing::{info, instrument};
use url::Url;

const INDEX_URL: &str = "http://lightinnj.org/%E5%80%AA%E6%9F%9D%E8%81%B2%E6%96%87%E9%9B%86/%E5%80%AA%E6%9F%9D%E8%81%B2%E6%96%87%E9%9B%86%E7%AC%AC%E4%B8%80%E8%BE%91/15%E9%A9%AC%E5%A4%AA%E7%A6%8F%E9%9F%B3%E6%9F%A5%E7%BB%8F%E8%AE%B0%E5%BD%95/%E9%A9%AC%E5%A4%AA%E7%A6%8F%E9%9F%B3%E6%9F%A5%E7%BB%8F%E8%AE%B0%E5%BD%95%E7%9B%AE%E5%BD%95.htm";

pub fn site() -> Site {
    Site {
        key: "matthew-study",
        title: "马太福音查经记录",
        index_url: INDEX_URL,
        encoding: encoding_rs::GB18030,
        output_file: "马太福音查经记录.md",
        politeness: Politeness::between(500, 1200),
        profile: ExtractProfile::new(Selection::Nth(3)),
        layout: Layout::default(),
        page_title: None,
        suppress_duplicate_title: false,
    }
}

/// Chapter links: anchors whose text names a chapter (`第…章`).
pub fn chapter_links(html: &str, base: &Url) -> Vec<IndexEntry> {
    let document = Html::parse_document(html);
    document
        .select(&css("a[href]"))
        .filter_map(|a| {
            let text = a.text().collect::<String>().trim().to_string();
            let href = a.value().attr("href")?.trim();
            if !(text.contains('第') && text.contains('章')) || href.is_empty() || href.starts_with('#') {
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
    let chapters = dedup_by_url(chapter_links(&page.html, &page.url));
    info!(count = chapters.len(), "Found chapters");
    Ok(chapters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Page;

    #[test]
    fn test_chapter_links() {
        let base = Url::parse("http://lightinnj.org/books/matthew/index.htm").unwrap();
        let html = r##"
            <a href="../index.htm">回目录</a>
            <a href="01.htm">第一章</a>
            <a href="#c2">第二章</a>
            <a href="03.htm">第三章 天国的宪法</a>
            <a href="03.htm">第三章 天国的宪法</a>
            <a href="notes.htm">附录</a>"##;
        let entries = dedup_by_url(chapter_links(html, &base));
        assert_eq!(
            entries,
            vec![
                IndexEntry::new("第一章", "http://lightinnj.org/books/matthew/01.htm"),
                IndexEntry::new("第三章 天国的宪法", "http://lightinnj.org/books/matthew/03.htm"),
            ]
        );
    }

    #[test]
    fn test_third_paragraph_is_body() {
        let page = Page {
            url: Url::parse("http://lightinnj.org/books/matthew/01.htm").unwrap(),
            html: r#"<body><div><table><tr><td><table><tr><td>
                <p>倪柝声文集</p><p>&nbsp;</p><p>第一章</p>
                <p>一　耶稣基督的家谱<br>　　读经：太一1～17。</p>
                <p>回目录</p>
            </td></tr></table></td></tr></table></div></body>"#
                .to_string(),
        };
        let fragment = crate::extract::extract(&page, &site().profile);
        assert_eq!(fragment.to_markdown(), "一 耶稣基督的家谱\n读经：太一1～17。");
    }
}
