//! Augustine, *Tractates on the Gospel of John*, from New Advent's Fathers.
//!
//! There is no index page to read: the 124 tractates live at
//! `fathers/1701001.htm` … `fathers/1701124.htm`. Every paragraph after the
//! first (a breadcrumb) is body text; italics, bold and links are kept as
//! inline Markdown. The site asks for a slow crawl.

use super::Site;
use crate::config::Politeness;
use crate::extract::{ExtractProfile, Selection, css};
use crate::models::IndexEntry;
use crate::outputs::markdown::Layout;
use scraper::Html;

const BASE_URL: &str = "https://www.newadvent.org/fathers/";
const FIRST_TRACTATE: u32 = 1;
const LAST_TRACTATE: u32 = 124;

pub fn site() -> Site {
    Site {
        key: "gospel-of-john",
        title: "Tractates on the Gospel of John",
        index_url: BASE_URL,
        encoding: encoding_rs::UTF_8,
        output_file: "fathers.md",
        politeness: Politeness::fixed(5000),
        profile: ExtractProfile::new(Selection::All {
            selector: css("p"),
            skip: 1,
        }),
        layout: Layout {
            separator: true,
            placeholder: "_(no content found)_",
            ..Layout::default()
        },
        page_title: Some(heading_title),
        suppress_duplicate_title: false,
    }
}

pub fn tractate_url(number: u32) -> String {
    format!("{BASE_URL}1701{number:03}.htm")
}

/// One entry per tractate; titles are placeholders until the page's `<h1>` is read.
pub fn index() -> Vec<IndexEntry> {
    (FIRST_TRACTATE..=LAST_TRACTATE)
        .map(|n| IndexEntry::new(format!("Article {n}"), tractate_url(n)))
        .collect()
}

/// The page's first `<h1>`.
pub fn heading_title(document: &Html) -> Option<String> {
    document
        .select(&css("h1"))
        .next()
        .map(|h1| h1.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}
