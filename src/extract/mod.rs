//! Content extraction: locate the content-bearing node of a page and turn its
//! inline markup into Markdown [`Fragment`]s.
//!
//! One generic engine serves every site. What differs between sites is data,
//! captured in an [`ExtractProfile`]:
//!
//! | Knob | Meaning |
//! |------|---------|
//! | [`Selection`] | Which node(s) hold the content |
//! | `markers` | Block selectors that are headings outright (`.cn1`, `h2`) |
//! | [`BoldMode`] | Whether `<b>` is a heading or `**emphasis**` |
//! | [`HeadingLevels`] | Level for ordinary and numbered (subsection) headings |
//! | `verse_marker` | Element whose text is a leading verse number (`sup`) |
//! | `skip_prefixes` | Navigation text to drop (`回目录`, `书名：`) |
//! | `rewrites` | Trailing text substitutions (`、○` → `。`) |
//!
//! Extraction never fails: a page with no usable node yields an empty
//! fragment and the caller decides what to print instead.

pub mod inline;
pub mod normalize;
pub mod select;

use crate::models::{Fragment, Page};
use inline::Reducer;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

/// Compile a selector literal from a site configuration.
///
/// Site selectors are fixed strings, so a parse failure is a programming error.
pub fn css(selector: &str) -> Selector {
    Selector::parse(selector).unwrap_or_else(|e| panic!("invalid selector {selector:?}: {e:?}"))
}

/// How the content-bearing node(s) of a page are found.
#[derive(Debug, Clone)]
pub enum Selection {
    /// The non-empty paragraph with the most visible text; first one wins ties.
    Longest,
    /// The n-th (1-based) non-empty paragraph, else the longest, else nothing.
    Nth(usize),
    /// Element children of the first container matched by the chain, in order.
    Container(Vec<Selector>),
    /// Every element matching the selector in document order, minus the first `skip`.
    All { selector: Selector, skip: usize },
}

/// What a bold element (`<b>`, `<strong>`) turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoldMode {
    /// Promoted to a heading line; buffered text is flushed first.
    Heading,
    /// Wrapped in `**` and kept inline.
    Emphasis,
}

/// Heading levels used for promoted bold elements.
#[derive(Debug, Clone)]
pub struct HeadingLevels {
    pub default: u8,
    /// Used when the text starts with a CJK numeral and U+3000, or the
    /// element carries `subsection_class`.
    pub subsection: u8,
    pub subsection_class: Option<String>,
}

impl Default for HeadingLevels {
    fn default() -> Self {
        Self {
            default: 3,
            subsection: 4,
            subsection_class: None,
        }
    }
}

impl HeadingLevels {
    /// Same level for every heading.
    pub fn flat(level: u8) -> Self {
        Self {
            default: level,
            subsection: level,
            subsection_class: None,
        }
    }

    /// Also treat bold elements carrying `class` as subsection headings.
    pub fn with_subsection_class(mut self, class: &str) -> Self {
        self.subsection_class = Some(class.to_string());
        self
    }

    pub fn level_for(&self, raw_text: &str, element: &ElementRef<'_>) -> u8 {
        let marked = self
            .subsection_class
            .as_deref()
            .is_some_and(|class| element.value().has_class(class, scraper::CaseSensitivity::AsciiCaseInsensitive));
        if marked || normalize::is_subsection_heading(raw_text) {
            self.subsection
        } else {
            self.default
        }
    }
}

/// Per-site extraction rules.
#[derive(Debug, Clone)]
pub struct ExtractProfile {
    pub selection: Selection,
    /// What counts as paragraph-like for [`Selection::Longest`] and [`Selection::Nth`].
    pub paragraphs: Selector,
    /// Blocks matching one of these become a heading of the paired level.
    pub markers: Vec<(Selector, u8)>,
    pub bold: BoldMode,
    pub headings: HeadingLevels,
    pub verse_marker: Option<Selector>,
    pub skip_prefixes: Vec<String>,
    pub rewrites: Vec<(String, String)>,
    pub tighten_cjk_punctuation: bool,
}

impl ExtractProfile {
    pub fn new(selection: Selection) -> Self {
        Self {
            selection,
            paragraphs: css("p"),
            markers: Vec::new(),
            bold: BoldMode::Emphasis,
            headings: HeadingLevels::default(),
            verse_marker: None,
            skip_prefixes: Vec::new(),
            rewrites: Vec::new(),
            tighten_cjk_punctuation: false,
        }
    }

    pub fn bold_headings(mut self, headings: HeadingLevels) -> Self {
        self.bold = BoldMode::Heading;
        self.headings = headings;
        self
    }

    pub fn marker(mut self, selector: &str, level: u8) -> Self {
        self.markers.push((css(selector), level));
        self
    }

    pub fn verse_marker(mut self, selector: &str) -> Self {
        self.verse_marker = Some(css(selector));
        self
    }

    pub fn skip_prefixes(mut self, prefixes: &[&str]) -> Self {
        self.skip_prefixes = prefixes.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn rewrite_trailing(mut self, suffix: &str, replacement: &str) -> Self {
        self.rewrites.push((suffix.to_string(), replacement.to_string()));
        self
    }

    pub fn tighten_cjk_punctuation(mut self) -> Self {
        self.tighten_cjk_punctuation = true;
        self
    }

    pub(crate) fn marker_level(&self, element: &ElementRef<'_>) -> Option<u8> {
        self.markers
            .iter()
            .find(|(selector, _)| selector.matches(element))
            .map(|(_, level)| *level)
    }

    pub(crate) fn is_skipped(&self, text: &str) -> bool {
        self.skip_prefixes
            .iter()
            .any(|prefix| text.starts_with(prefix.as_str()))
    }
}

/// Extract the content of a fetched page.
pub fn extract(page: &Page, profile: &ExtractProfile) -> Fragment {
    let document = Html::parse_document(&page.html);
    extract_document(&document, &page.url, profile)
}

/// Extract from an already parsed document; `base` resolves relative links.
#[instrument(level = "debug", skip_all, fields(base = %base))]
pub fn extract_document(document: &Html, base: &Url, profile: &ExtractProfile) -> Fragment {
    let blocks = select::content_blocks(document, &profile.selection, &profile.paragraphs);
    if blocks.is_empty() {
        debug!("No content-bearing node found");
        return Fragment::default();
    }

    let mut reducer = Reducer::new(profile, base);
    for block in blocks {
        reducer.block(block);
    }
    let fragment = reducer.finish();
    debug!(blocks = fragment.blocks.len(), "Extracted fragment");
    fragment
}
