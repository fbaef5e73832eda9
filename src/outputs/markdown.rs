//! Markdown assembly of a [`Document`].
//!
//! # Output Shape
//!
//! ```text
//! # 十二篮
//!
//! ## 第一辑                 <- group heading, only when the group changes
//!
//! ### 神的爱               <- section title
//!
//! [原文链接](https://…)     <- optional source link, before or after the body
//!
//! #### 一　起头             <- fragment blocks
//!
//! 正文……
//!
//! ---                      <- optional separator
//! ```
//!
//! Sections whose page failed or yielded nothing get the site's placeholder
//! line, so a partial run still lines up with the index.

use crate::extract::normalize::{collapse_blank_lines, normalize_heading};
use crate::models::{Document, Section, SectionBody};
use tracing::{debug, instrument};

/// Where the link to the source page goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPlacement {
    Omit,
    BeforeBody,
    AfterBody,
}

/// Per-site assembly options.
#[derive(Debug, Clone)]
pub struct Layout {
    pub group_level: u8,
    pub title_level: u8,
    pub link: LinkPlacement,
    pub link_label: &'static str,
    /// Horizontal rule after every section.
    pub separator: bool,
    pub placeholder: &'static str,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            group_level: 2,
            title_level: 2,
            link: LinkPlacement::Omit,
            link_label: "原文链接",
            separator: false,
            placeholder: "_（本章未检测到内容）_",
        }
    }
}

fn heading(level: u8, text: &str) -> String {
    format!("{} {}", "#".repeat(usize::from(level)), normalize_heading(text))
}

fn section_parts(section: &Section, layout: &Layout) -> Vec<String> {
    let mut parts = vec![heading(layout.title_level, &section.title)];
    let link = format!("[{}]({})", layout.link_label, section.url);

    if layout.link == LinkPlacement::BeforeBody {
        parts.push(link.clone());
    }
    match &section.body {
        SectionBody::Extracted(fragment) if !fragment.is_empty() => parts.push(fragment.to_markdown()),
        _ => parts.push(layout.placeholder.to_string()),
    }
    if layout.link == LinkPlacement::AfterBody {
        parts.push(link);
    }
    if layout.separator {
        parts.push("---".to_string());
    }
    parts
}

/// Render the whole document.
///
/// Blocks are separated by one blank line, runs of blank lines are collapsed
/// and the text ends with exactly one newline.
#[instrument(level = "info", skip_all, fields(title = %document.title, sections = document.sections.len()))]
pub fn render(document: &Document, layout: &Layout) -> String {
    let mut parts = vec![heading(1, &document.title)];
    let mut current_group: Option<&str> = None;

    for section in &document.sections {
        let group = section.group.as_deref();
        if group != current_group {
            if let Some(group) = group {
                parts.push(heading(layout.group_level, group));
            }
            current_group = group;
        }
        parts.extend(section_parts(section, layout));
    }

    let md = collapse_blank_lines(&parts.join("\n\n"));
    let md = format!("{}\n", md.trim());
    debug!(bytes = md.len(), "Rendered Markdown");
    md
}
