//! 聖經 (文理和合), the Wenli Union Version, on zh.wikisource.org.
//!
//! The traditional-script index gives the page names used in URLs; the same
//! index rendered through the `zh-hans` variant gives the simplified book
//! names used as titles. Book pages are walked in document order: `<h2>` is
//! a chapter heading, each `<p>` a verse whose `<sup>` number is lifted in
//! front of the text. Verses end in `、○`, rewritten to `。`.

use super::{Site, fetch_index};
use crate::config::Politeness;
use crate::error::FetchError;
use crate::extract::{ExtractProfile, Selection, css};
use crate::fetcher::PageFetcher;
use crate::models::IndexEntry;
use crate::outputs::markdown::Layout;
use itertools::Itertools;
use scraper::Html;
use tracing::{info, instrument, warn};

const INDEX_URL: &str = "https://zh.wikisource.org/wiki/%E8%81%96%E7%B6%93_(%E6%96%87%E7%90%86%E5%92%8C%E5%90%88)";
const SIMPLIFIED_INDEX_URL: &str =
    "https://zh.wikisource.org/zh-hans/%E8%81%96%E7%B6%93_(%E6%96%87%E7%90%86%E5%92%8C%E5%90%88)";

/// Path prefix shared by the index and every book page.
const BIBLE_PATH: &str = "/wiki/%E8%81%96%E7%B6%93";
const HOST: &str = "https://zh.wikisource.org";

/// Leading list links that are not books (preface, table of contents).
const LEADING_NON_BOOKS: usize = 3;

pub fn site() -> Site {
    Site {
        key: "wenli-bible",
        title: "聖經（文理和合）",
        index_url: INDEX_URL,
        encoding: encoding_rs::UTF_8,
        output_file: "bible.txt",
        politeness: Politeness::between(500, 1000),
        profile: ExtractProfile::new(Selection::All {
            selector: css("h2, p"),
            skip: 0,
        })
        .marker("h2", 3)
        .verse_marker("sup")
        .rewrite_trailing("、○", "。"),
        layout: Layout::default(),
        page_title: None,
        suppress_duplicate_title: false,
    }
}

/// Book names from an index page: the first link of each `<li>` that points
/// into the Bible, minus the leading non-book links.
pub fn book_titles(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchor = css("a");
    let absolute = format!("{HOST}{BIBLE_PATH}");
    document
        .select(&css("li"))
        .filter_map(|li| li.select(&anchor).next())
        .filter(|a| {
            a.value()
                .attr("href")
                .is_some_and(|href| href.starts_with(BIBLE_PATH) || href.starts_with(&absolute))
        })
        .map(|a| a.text().collect::<String>().trim().to_string())
        .skip(LEADING_NON_BOOKS)
        .collect()
}

/// Page URL of one book, named by its traditional title.
pub fn book_url(traditional_title: &str) -> String {
    format!("{SIMPLIFIED_INDEX_URL}/{}", urlencoding::encode(traditional_title))
}

/// Pair traditional names (for URLs) with simplified names (for titles).
///
/// Falls back to the traditional name when the simplified list is shorter.
pub fn book_entries(traditional: Vec<String>, simplified: Vec<String>) -> Vec<IndexEntry> {
    if traditional.len() != simplified.len() {
        warn!(
            traditional = traditional.len(),
            simplified = simplified.len(),
            "Index variants disagree on book count"
        );
    }
    traditional
        .into_iter()
        .zip_longest(simplified)
        .filter_map(|pair| {
            let (url_name, title) = match pair {
                itertools::EitherOrBoth::Both(t, s) => (t, s),
                itertools::EitherOrBoth::Left(t) => (t.clone(), t),
                itertools::EitherOrBoth::Right(_) => return None,
            };
            Some(IndexEntry::new(title, book_url(&url_name)))
        })
        .collect()
}

#[instrument(level = "info", skip_all)]
pub async fn index<F: PageFetcher>(site: &Site, fetcher: &F) -> Result<Vec<IndexEntry>, FetchError> {
    let traditional = fetch_index(site, fetcher, site.index_url).await?;
    let simplified = fetch_index(site, fetcher, SIMPLIFIED_INDEX_URL).await?;
    let books = book_entries(book_titles(&traditional.html), book_titles(&simplified.html));
    info!(count = books.len(), "Found books");
    Ok(books)
}
