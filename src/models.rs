//! Data models for pages, extracted fragments and assembled documents.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Page`]: Decoded HTML of one fetched page plus its base URL
//! - [`Block`] / [`Fragment`]: The ordered heading and paragraph lines extracted from one page
//! - [`IndexEntry`]: One child document discovered on a table-of-contents page
//! - [`Section`] / [`Document`]: The assembled book, one section per child page
//!
//! Everything here is transient: built once per run, written once, discarded.

use crate::extract::normalize::canonical;
use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

/// A fetched page: decoded text plus the URL used to resolve relative links.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub html: String,
}

/// One line-level unit of a [`Fragment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    /// A promoted heading at level 3 or 4 (or whatever the site configures).
    Heading { level: u8, text: String },
    /// Paragraph text. `marker` is a leading verse or item number lifted out of
    /// the text, rendered as its own token before it.
    Paragraph {
        #[serde(skip_serializing_if = "Option::is_none")]
        marker: Option<String>,
        text: String,
    },
}

impl Block {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading {
            level,
            text: text.into(),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph {
            marker: None,
            text: text.into(),
        }
    }

    /// Render the block as Markdown, without trailing newline.
    pub fn to_markdown(&self) -> String {
        match self {
            Block::Heading { level, text } => {
                format!("{} {}", "#".repeat(usize::from(*level)), text)
            }
            Block::Paragraph {
                marker: Some(marker),
                text,
            } => format!("{marker} {text}"),
            Block::Paragraph { marker: None, text } => text.clone(),
        }
    }
}

/// The ordered heading and paragraph blocks extracted from one page.
///
/// An empty fragment is the explicit "nothing found" result of extraction; the
/// assembler substitutes a placeholder for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Fragment {
    pub blocks: Vec<Block>,
}

impl Fragment {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks joined by blank lines.
    pub fn to_markdown(&self) -> String {
        self.blocks
            .iter()
            .map(Block::to_markdown)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Drop the first line when it repeats `title`.
    ///
    /// Both sides are compared after heading markers are removed and whitespace
    /// (including U+3000) is collapsed; anything short of an exact match is kept.
    /// Returns `true` when a line was removed.
    pub fn suppress_leading_title(&mut self, title: &str) -> bool {
        let wanted = canonical(title);
        if wanted.is_empty() {
            return false;
        }
        let Some(first) = self.blocks.first_mut() else {
            return false;
        };
        match first {
            Block::Heading { text, .. } => {
                if canonical(text) != wanted {
                    return false;
                }
                self.blocks.remove(0);
                true
            }
            Block::Paragraph { marker, text } => {
                let rendered = match marker {
                    Some(m) => format!("{m} {text}"),
                    None => text.clone(),
                };
                let first_line = rendered.lines().next().unwrap_or_default();
                if canonical(first_line) != wanted {
                    return false;
                }
                let rest = match text.split_once('\n') {
                    Some((_, rest)) => rest.trim_start_matches('\n').to_string(),
                    None => String::new(),
                };
                if rest.is_empty() {
                    self.blocks.remove(0);
                } else {
                    *marker = None;
                    *text = rest;
                }
                true
            }
        }
    }
}

/// A child document discovered on an index page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    /// Volume heading this entry belongs to, if the site groups entries.
    pub group: Option<String>,
    pub title: String,
    pub url: String,
}

impl IndexEntry {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            group: None,
            title: title.into(),
            url: url.into(),
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// What stands under a section title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "content", rename_all = "snake_case")]
pub enum SectionBody {
    Extracted(Fragment),
    /// Fetch failed or nothing was found; the reason is kept for the JSON dump.
    Missing(String),
}

/// One assembled entry of a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub group: Option<String>,
    pub title: String,
    pub url: String,
    pub body: SectionBody,
}

/// The whole output of one run.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn new(title: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            title: title.into(),
            generated_at: Utc::now(),
            sections,
        }
    }

    /// Number of sections that ended up as placeholders.
    pub fn missing_count(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| matches!(s.body, SectionBody::Missing(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_rendering() {
        assert_eq!(Block::heading(4, "一　起头").to_markdown(), "#### 一　起头");
        assert_eq!(Block::paragraph("text").to_markdown(), "text");
        let verse = Block::Paragraph {
            marker: Some("3".to_string()),
            text: "For God so loved。".to_string(),
        };
        assert_eq!(verse.to_markdown(), "3 For God so loved。");
    }

    #[test]
    fn test_fragment_markdown_separates_blocks_with_blank_line() {
        let fragment = Fragment::new(vec![
            Block::heading(3, "壹 羡慕"),
            Block::paragraph("第一段"),
            Block::paragraph("第二段"),
        ]);
        assert_eq!(fragment.to_markdown(), "### 壹 羡慕\n\n第一段\n\n第二段");
    }

    #[test]
    fn test_suppress_title_with_fullwidth_space() {
        let mut fragment = Fragment::new(vec![
            Block::heading(3, "壹\u{3000}羡慕"),
            Block::paragraph("正文"),
        ]);
        assert!(fragment.suppress_leading_title("壹 羡慕"));
        assert_eq!(fragment.blocks, vec![Block::paragraph("正文")]);
    }

    #[test]
    fn test_suppress_title_near_miss_is_kept() {
        let mut fragment = Fragment::new(vec![
            Block::heading(3, "壹 羡慕（一章二至三节）"),
            Block::paragraph("正文"),
        ]);
        assert!(!fragment.suppress_leading_title("壹 羡慕"));
        assert_eq!(fragment.blocks.len(), 2);
    }

    #[test]
    fn test_suppress_title_drops_only_first_paragraph_line() {
        let mut fragment = Fragment::new(vec![Block::paragraph("导言\n正文第一行")]);
        assert!(fragment.suppress_leading_title("导言"));
        assert_eq!(fragment.blocks, vec![Block::paragraph("正文第一行")]);
    }

    #[test]
    fn test_suppress_title_on_empty_fragment() {
        let mut fragment = Fragment::default();
        assert!(!fragment.suppress_leading_title("导言"));
    }

    #[test]
    fn test_document_serialization() {
        let doc = Document::new(
            "十二篮",
            vec![
                Section {
                    group: Some("第一辑".to_string()),
                    title: "神的爱".to_string(),
                    url: "https://example.com/1.htm".to_string(),
                    body: SectionBody::Extracted(Fragment::new(vec![Block::paragraph("正文")])),
                },
                Section {
                    group: None,
                    title: "缺".to_string(),
                    url: "https://example.com/2.htm".to_string(),
                    body: SectionBody::Missing("HTTP 404".to_string()),
                },
            ],
        );
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"title\":\"十二篮\""));
        assert!(json.contains("\"status\":\"extracted\""));
        assert!(json.contains("\"kind\":\"paragraph\""));
        assert!(json.contains("\"status\":\"missing\""));
        assert_eq!(doc.missing_count(), 1);
    }
}
