//! Site configurations and the generic scrape pipeline.
//!
//! Each submodule describes one website declaratively as a [`Site`] and knows
//! how to read that site's table of contents. Everything else (fetching,
//! extraction, assembly) is shared.
//!
//! # Supported Sites
//!
//! | Key | Module | Content | Encoding |
//! |-----|--------|---------|----------|
//! | `twelve-baskets` | [`twelve_baskets`] | 十二篮, two-level index | GB18030 |
//! | `matthew-study` | [`matthew_study`] | 马太福音查经记录 | GB18030 |
//! | `church-affairs` | [`church_affairs`] | 教会的事务 | UTF-8 |
//! | `gospel-of-john` | [`gospel_of_john`] | Augustine, Tractates on John | UTF-8 |
//! | `song-of-songs` | [`song_of_songs`] | 歌中之歌 | GB18030 |
//! | `wenli-bible` | [`wenli_bible`] | 聖經 (文理和合) | UTF-8 |
//!
//! # Pipeline
//!
//! 1. **Indexing**: the site module turns its index page(s) into [`IndexEntry`]s
//! 2. **Fetching**: pages are fetched in order, `concurrency` at a time, behind one politeness gate
//! 3. **Extraction**: each page goes through [`extract_document`] with the site's profile
//! 4. **Assembly**: results are re-sorted by index position into a [`Document`]
//!
//! A page that fails to fetch or yields nothing becomes a placeholder; only a
//! failed table of contents aborts the run.

pub mod church_affairs;
pub mod gospel_of_john;
pub mod matthew_study;
pub mod song_of_songs;
pub mod twelve_baskets;
pub mod wenli_bible;

use crate::config::Politeness;
use crate::error::FetchError;
use crate::extract::normalize::normalize_heading;
use crate::extract::{ExtractProfile, extract_document};
use crate::fetcher::PageFetcher;
use crate::models::{Document, IndexEntry, Page, Section, SectionBody};
use crate::outputs::markdown::Layout;
use crate::utils::truncate_for_log;
use clap::ValueEnum;
use encoding_rs::Encoding;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use scraper::Html;
use tracing::{debug, error, info, instrument, warn};

/// The known sites, as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SiteKind {
    TwelveBaskets,
    MatthewStudy,
    ChurchAffairs,
    GospelOfJohn,
    SongOfSongs,
    WenliBible,
}

impl SiteKind {
    pub const ALL: [SiteKind; 6] = [
        SiteKind::TwelveBaskets,
        SiteKind::MatthewStudy,
        SiteKind::ChurchAffairs,
        SiteKind::GospelOfJohn,
        SiteKind::SongOfSongs,
        SiteKind::WenliBible,
    ];

    pub fn site(self) -> Site {
        match self {
            SiteKind::TwelveBaskets => twelve_baskets::site(),
            SiteKind::MatthewStudy => matthew_study::site(),
            SiteKind::ChurchAffairs => church_affairs::site(),
            SiteKind::GospelOfJohn => gospel_of_john::site(),
            SiteKind::SongOfSongs => song_of_songs::site(),
            SiteKind::WenliBible => wenli_bible::site(),
        }
    }

    /// Read the site's table of contents.
    pub async fn index<F: PageFetcher>(self, site: &Site, fetcher: &F) -> Result<Vec<IndexEntry>, FetchError> {
        match self {
            SiteKind::TwelveBaskets => twelve_baskets::index(site, fetcher).await,
            SiteKind::MatthewStudy => matthew_study::index(site, fetcher).await,
            SiteKind::ChurchAffairs => church_affairs::index(site, fetcher).await,
            SiteKind::GospelOfJohn => Ok(gospel_of_john::index()),
            SiteKind::SongOfSongs => song_of_songs::index(site, fetcher).await,
            SiteKind::WenliBible => wenli_bible::index(site, fetcher).await,
        }
    }
}

/// Declarative description of one website.
#[derive(Debug, Clone)]
pub struct Site {
    pub key: &'static str,
    pub title: &'static str,
    pub index_url: &'static str,
    pub encoding: &'static Encoding,
    /// Default output path, relative to the working directory.
    pub output_file: &'static str,
    pub politeness: Politeness,
    pub profile: ExtractProfile,
    pub layout: Layout,
    /// Reads the section title from the page itself, overriding the index text.
    pub page_title: Option<fn(&Html) -> Option<String>>,
    /// Drop a first content line that repeats the section title.
    pub suppress_duplicate_title: bool,
}

/// Fetch the index, then every page, and assemble the document.
#[instrument(level = "info", skip_all, fields(site = site.key))]
pub async fn run<F: PageFetcher>(
    kind: SiteKind,
    site: &Site,
    fetcher: &F,
    concurrency: usize,
    limit: Option<usize>,
) -> Result<Document, FetchError> {
    let entries = kind.index(site, fetcher).await?;
    let entries: Vec<IndexEntry> = entries.into_iter().take(limit.unwrap_or(usize::MAX)).collect();
    info!(count = entries.len(), concurrency, "Indexed entries");
    Ok(scrape_entries(site, fetcher, entries, concurrency).await)
}

/// Fetch and extract `entries`, keeping index order whatever the concurrency.
pub async fn scrape_entries<F: PageFetcher>(
    site: &Site,
    fetcher: &F,
    entries: Vec<IndexEntry>,
    concurrency: usize,
) -> Document {
    let total = entries.len();
    let mut results: Vec<(usize, Section)> = stream::iter(entries.into_iter().enumerate())
        .map(|(i, entry)| async move {
            info!(index = i + 1, total, title = %entry.title, "Scraping entry");
            (i, scrape_entry(site, fetcher, entry).await)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;
    results.sort_by_key(|(i, _)| *i);

    let document = Document::new(site.title, results.into_iter().map(|(_, s)| s).collect());
    info!(
        sections = document.sections.len(),
        missing = document.missing_count(),
        "Scrape finished"
    );
    document
}

async fn scrape_entry<F: PageFetcher>(site: &Site, fetcher: &F, entry: IndexEntry) -> Section {
    match fetcher.fetch(&entry.url, site.encoding).await {
        Ok(page) => build_section(site, entry, &page),
        Err(e) => {
            error!(url = %entry.url, error = %e, "Fetch failed; emitting placeholder");
            Section {
                group: entry.group,
                title: entry.title,
                url: entry.url,
                body: SectionBody::Missing(e.to_string()),
            }
        }
    }
}

/// Extract one fetched page into a section.
pub fn build_section(site: &Site, entry: IndexEntry, page: &Page) -> Section {
    let document = Html::parse_document(&page.html);
    let title = site
        .page_title
        .and_then(|read| read(&document))
        .map(|t| normalize_heading(&t))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| normalize_heading(&entry.title));

    let mut fragment = extract_document(&document, &page.url, &site.profile);
    if site.suppress_duplicate_title && fragment.suppress_leading_title(&title) {
        debug!(%title, "Dropped leading line repeating the title");
    }

    let body = if fragment.is_empty() {
        warn!(url = %entry.url, "No content found; emitting placeholder");
        SectionBody::Missing("no content found".to_string())
    } else {
        debug!(preview = %truncate_for_log(&fragment.to_markdown(), 80), "Extracted section");
        SectionBody::Extracted(fragment)
    };

    Section {
        group: entry.group,
        title,
        url: entry.url,
        body,
    }
}

/// Keep the first entry for each URL, in order.
pub(crate) fn dedup_by_url(entries: Vec<IndexEntry>) -> Vec<IndexEntry> {
    let before = entries.len();
    let entries: Vec<IndexEntry> = entries.into_iter().unique_by(|e| e.url.clone()).collect();
    if entries.len() < before {
        debug!(dropped = before - entries.len(), "Dropped duplicate index links");
    }
    entries
}

/// Fetch an index page with the site's encoding.
pub(crate) async fn fetch_index<F: PageFetcher>(site: &Site, fetcher: &F, url: &str) -> Result<Page, FetchError> {
    fetcher.fetch(url, site.encoding).await.inspect_err(|e| {
        error!(%url, error = %e, "Index page fetch failed");
    })
}


#[cfg(test)]
mod tests {
    use super::testing::FakeFetcher;
    use super::*;
    use crate::extract::Selection;
    use crate::outputs::markdown::render;

    fn test_site() -> Site {
        Site {
            key: "test",
            title: "测试",
            index_url: "https://example.com/index.htm",
            encoding: encoding_rs::UTF_8,
            output_file: "test.md",
            politeness: Politeness::fixed(0),
            profile: ExtractProfile::new(Selection::Longest),
            layout: Layout::default(),
            page_title: None,
            suppress_duplicate_title: true,
        }
    }

    fn entries(n: usize) -> Vec<IndexEntry> {
        (1..=n)
            .map(|i| IndexEntry::new(format!("第{i}章"), format!("https://example.com/{i}.htm")))
            .collect()
    }

    fn fetcher(n: usize) -> FakeFetcher {
        (1..=n).fold(FakeFetcher::default(), |f, i| {
            f.with(
                &format!("https://example.com/{i}.htm"),
                &format!("<p>第{i}章</p><p>第{i}章的正文比标题长</p>"),
            )
        })
    }

    #[tokio::test]
    async fn test_concurrent_run_matches_sequential() {
        let site = test_site();
        let sequential = scrape_entries(&site, &fetcher(5), entries(5), 1).await;
        let concurrent = scrape_entries(&site, &fetcher(5), entries(5), 4).await;
        assert_eq!(sequential.sections, concurrent.sections);
        assert_eq!(
            render(&sequential, &site.layout),
            render(&concurrent, &site.layout)
        );
        let titles: Vec<_> = concurrent.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["第1章", "第2章", "第3章", "第4章", "第5章"]);
    }

    #[tokio::test]
    async fn test_failed_page_becomes_placeholder_and_run_continues() {
        let site = test_site();
        let fetcher = FakeFetcher::default()
            .with("https://example.com/1.htm", "<p>一</p>")
            .with("https://example.com/3.htm", "<p>三</p>");
        let doc = scrape_entries(&site, &fetcher, entries(3), 1).await;

        assert_eq!(doc.sections.len(), 3);
        assert_eq!(doc.missing_count(), 1);
        assert!(matches!(doc.sections[1].body, SectionBody::Missing(_)));
        let md = render(&doc, &site.layout);
        assert!(md.contains("## 第2章\n\n_（本章未检测到内容）_"));
        assert!(md.contains("## 第3章\n\n三"));
    }

    #[test]
    fn test_build_section_suppresses_duplicate_title() {
        let site = Site {
            profile: ExtractProfile::new(Selection::All {
                selector: crate::extract::css("p"),
                skip: 0,
            }),
            ..test_site()
        };
        let page = Page {
            url: url::Url::parse("https://example.com/1.htm").unwrap(),
            html: "<p>第1章</p><p>正文</p>".to_string(),
        };
        let section = build_section(&site, entries(1).remove(0), &page);
        assert_eq!(section.body, SectionBody::Extracted(crate::models::Fragment::new(vec![
            crate::models::Block::paragraph("正文")
        ])));
    }

    #[test]
    fn test_build_section_folds_line_breaks_in_index_title() {
        let page = Page {
            url: url::Url::parse("https://example.com/1.htm").unwrap(),
            html: "<p>正文</p>".to_string(),
        };
        let entry = IndexEntry::new("第一章\n  神的爱", "https://example.com/1.htm");
        assert_eq!(build_section(&test_site(), entry, &page).title, "第一章 神的爱");
    }

    #[test]
    fn test_dedup_by_url_keeps_first() {
        let deduped = dedup_by_url(vec![
            IndexEntry::new("a", "https://example.com/1.htm"),
            IndexEntry::new("b", "https://example.com/2.htm"),
            IndexEntry::new("a again", "https://example.com/1.htm"),
        ]);
        let titles: Vec<_> = deduped.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn test_every_site_has_a_distinct_key_and_output() {
        let sites: Vec<Site> = SiteKind::ALL.iter().map(|k| k.site()).collect();
        assert_eq!(sites.iter().map(|s| s.key).unique().count(), SiteKind::ALL.len());
        assert_eq!(sites.iter().map(|s| s.output_file).unique().count(), SiteKind::ALL.len());
        for (kind, site) in SiteKind::ALL.iter().zip(&sites) {
            let value = kind.to_possible_value().unwrap();
            assert_eq!(value.get_name(), site.key);
        }
    }
}
