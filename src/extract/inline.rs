//! Inline conversion: a single-pass reducer from an element tree to blocks.
//!
//! The reducer has two states. In [`State::Idle`] nothing is buffered; text
//! moves it to [`State::Collecting`]. A heading or the end of a block triggers
//! a flush, which turns the buffer into paragraph blocks through the pure
//! [`flush_paragraphs`] and returns to `Idle`. Headings are only ever pushed
//! after the flush, so no text can end up behind a heading that followed it
//! in the source.

use super::ExtractProfile;
use super::normalize::{normalize_heading, rewrite_trailing, split_paragraphs, strip_heading_markers, tighten_cjk_punctuation};
use crate::models::{Block, Fragment};
use scraper::{ElementRef, Node};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Collecting,
}

pub(crate) struct Reducer<'p> {
    profile: &'p ExtractProfile,
    base: &'p Url,
    state: State,
    buffer: String,
    marker: Option<String>,
    blocks: Vec<Block>,
}

impl<'p> Reducer<'p> {
    pub(crate) fn new(profile: &'p ExtractProfile, base: &'p Url) -> Self {
        Self {
            profile,
            base,
            state: State::Idle,
            buffer: String::new(),
            marker: None,
            blocks: Vec::new(),
        }
    }

    /// Convert one content block; paragraph boundaries close with it.
    pub(crate) fn block(&mut self, element: ElementRef<'_>) {
        let text = normalize_heading(&flat_text(&element));
        if text.is_empty() || self.profile.is_skipped(&text) {
            return;
        }

        if let Some(level) = self.profile.marker_level(&element) {
            self.heading(level, &text);
            return;
        }

        self.marker = self
            .profile
            .verse_marker
            .as_ref()
            .and_then(|selector| element.select(selector).next())
            .map(|sup| normalize_heading(&flat_text(&sup)))
            .filter(|m| !m.is_empty());
        self.walk(element);
        self.flush();
        self.marker = None;
    }

    pub(crate) fn finish(mut self) -> Fragment {
        self.flush();
        Fragment::new(self.blocks)
    }

    fn walk(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.element(child);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, element: ElementRef<'_>) {
        match element.value().name() {
            "br" => self.line_break(),
            "b" | "strong" if self.profile.bold == super::BoldMode::Heading => self.promote(element),
            name if is_ignored(name) => {}
            "b" | "strong" | "i" | "em" | "a" => {
                let inline = render_inline(element, self.base);
                self.append(&inline);
            }
            _ => self.walk(element),
        }
    }

    /// Buffer a source text node.
    fn push(&mut self, text: &str) {
        self.append(&fold_source_breaks(text));
    }

    /// Buffer already rendered text, whose `\n` are real `<br>` breaks.
    fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.buffer.push_str(text);
        if self.state == State::Idle && !text.trim().is_empty() {
            self.state = State::Collecting;
        }
    }

    fn line_break(&mut self) {
        self.buffer.push('\n');
    }

    fn promote(&mut self, element: ElementRef<'_>) {
        let raw = flat_text(&element);
        let level = self.profile.headings.level_for(raw.trim_start(), &element);
        let text = normalize_heading(&raw);
        if text.is_empty() || self.profile.is_skipped(&text) {
            return;
        }
        self.heading(level, &text);
    }

    fn heading(&mut self, level: u8, text: &str) {
        self.flush();
        let heading = Block::heading(level, strip_heading_markers(text).trim());
        if self.blocks.last() != Some(&heading) {
            self.blocks.push(heading);
        }
    }

    fn flush(&mut self) {
        let buffer = std::mem::take(&mut self.buffer);
        if self.state == State::Collecting {
            let marker = self.marker.take();
            self.blocks
                .extend(flush_paragraphs(&buffer, marker.as_deref(), self.profile));
        }
        self.state = State::Idle;
    }
}

/// Turn buffered text into paragraph blocks.
///
/// A verse `marker` is lifted off the first paragraph only when that paragraph
/// starts with exactly the marker text and has text left after it.
pub(crate) fn flush_paragraphs(buffer: &str, marker: Option<&str>, profile: &ExtractProfile) -> Vec<Block> {
    split_paragraphs(buffer)
        .into_iter()
        .enumerate()
        .map(|(i, paragraph)| {
            let mut paragraph = rewrite_trailing(&paragraph, &profile.rewrites);
            if profile.tighten_cjk_punctuation {
                paragraph = tighten_cjk_punctuation(&paragraph);
            }
            let lifted = marker
                .filter(|_| i == 0)
                .and_then(|m| paragraph.strip_prefix(m).map(|rest| (m, rest.trim_start())))
                .filter(|(_, rest)| !rest.is_empty());
            match lifted {
                Some((m, rest)) => Block::Paragraph {
                    marker: Some(m.to_string()),
                    text: rest.to_string(),
                },
                None => Block::paragraph(paragraph),
            }
        })
        .collect()
}

/// Markdown for an inline element and everything under it.
///
/// Italic becomes `*…*`, bold `**…**`; in-page anchors keep only their text
/// and other anchors become links resolved against `base`.
pub fn render_inline(element: ElementRef<'_>, base: &Url) -> String {
    let name = element.value().name();
    match name {
        "br" => "\n".to_string(),
        _ if is_ignored(name) => String::new(),
        "i" | "em" => wrap(&render_children(element, base), "*"),
        "b" | "strong" => wrap(&render_children(element, base), "**"),
        "a" => anchor(element, base),
        _ => render_children(element, base),
    }
}

fn render_children(element: ElementRef<'_>, base: &Url) -> String {
    let mut out = String::new();
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&fold_source_breaks(text)),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    out.push_str(&render_inline(child, base));
                }
            }
            _ => {}
        }
    }
    out
}

fn anchor(element: ElementRef<'_>, base: &Url) -> String {
    let text = render_children(element, base);
    let href = element.value().attr("href").map(str::trim).unwrap_or_default();
    if href.is_empty() || href.starts_with('#') || text.trim().is_empty() {
        return text;
    }
    match base.join(href) {
        Ok(target) => {
            let (lead, body, trail) = split_padding(&text);
            format!("{lead}[{body}]({target}){trail}")
        }
        Err(_) => text,
    }
}

/// Wrap the non-whitespace core of `inner` in `marker`, keeping its padding outside.
fn wrap(inner: &str, marker: &str) -> String {
    let (lead, body, trail) = split_padding(inner);
    if body.is_empty() {
        return inner.to_string();
    }
    format!("{lead}{marker}{body}{marker}{trail}")
}

fn split_padding(text: &str) -> (&str, &str, &str) {
    let body = text.trim();
    if body.is_empty() {
        return (text, "", "");
    }
    let start = text.len() - text.trim_start().len();
    let end = start + body.len();
    (&text[..start], body, &text[end..])
}

/// Source line wrapping is whitespace; only `<br>` breaks lines.
fn fold_source_breaks(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

fn flat_text(element: &ElementRef<'_>) -> String {
    element.text().collect()
}

fn is_ignored(name: &str) -> bool {
    matches!(name, "script" | "style" | "noscript")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{HeadingLevels, Selection, css};
    use scraper::Html;

    fn first(html: &Html, selector: &str) -> String {
        let base = Url::parse("https://www.newadvent.org/fathers/1701001.htm").unwrap();
        let el = html.select(&css(selector)).next().unwrap();
        render_inline(el, &base)
    }

    #[test]
    fn test_nested_inline_markup() {
        let html = Html::parse_fragment(r#"<b>See <i>also</i> <a href="1701002.htm">Tractate 2</a></b>"#);
        assert_eq!(
            first(&html, "b"),
            "**See *also* [Tractate 2](https://www.newadvent.org/fathers/1701002.htm)**"
        );
    }

    #[test]
    fn test_whitespace_only_emphasis_has_no_markers() {
        let html = Html::parse_fragment("<i> </i>");
        assert_eq!(first(&html, "i"), " ");
    }

    #[test]
    fn test_emphasis_padding_stays_outside_markers() {
        let html = Html::parse_fragment("<i> word </i>");
        assert_eq!(first(&html, "i"), " *word* ");
    }

    #[test]
    fn test_anchor_without_href_keeps_text() {
        let html = Html::parse_fragment("<a name=\"top\">Top</a>");
        assert_eq!(first(&html, "a"), "Top");
    }

    #[test]
    fn test_marker_only_lifted_on_exact_prefix() {
        let profile = ExtractProfile::new(Selection::Longest);
        let blocks = flush_paragraphs("16神愛世人\n\n次段", Some("16"), &profile);
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph {
                    marker: Some("16".to_string()),
                    text: "神愛世人".to_string()
                },
                Block::paragraph("次段"),
            ]
        );
        let blocks = flush_paragraphs("和合本1", Some("1"), &profile);
        assert_eq!(blocks, vec![Block::paragraph("和合本1")]);
        let blocks = flush_paragraphs("7", Some("7"), &profile);
        assert_eq!(blocks, vec![Block::paragraph("7")]);
    }

    #[test]
    fn test_heading_promotion_is_idempotent() {
        let profile = ExtractProfile::new(Selection::Longest).bold_headings(HeadingLevels::flat(4));
        let base = Url::parse("https://example.com/").unwrap();

        let once = Html::parse_document("<p><b>起头</b>正文</p>");
        let once = crate::extract::extract_document(&once, &base, &profile);
        assert_eq!(once.to_markdown(), "#### 起头\n\n正文");

        // Feed the rendered heading back in as bold text.
        let again = Html::parse_document("<p><b>#### 起头</b>正文</p>");
        let again = crate::extract::extract_document(&again, &base, &profile);
        assert_eq!(again, once);
    }

    #[test]
    fn test_repeated_heading_is_not_duplicated() {
        let profile = ExtractProfile::new(Selection::Longest).bold_headings(HeadingLevels::flat(4));
        let base = Url::parse("https://example.com/").unwrap();
        let html = Html::parse_document("<p><b>导言</b><br><b>导言</b>正文</p>");
        let fragment = crate::extract::extract_document(&html, &base, &profile);
        assert_eq!(fragment.to_markdown(), "#### 导言\n\n正文");
    }

    #[test]
    fn test_break_only_buffer_emits_nothing() {
        let profile = ExtractProfile::new(Selection::Longest).bold_headings(HeadingLevels::flat(4));
        let base = Url::parse("https://example.com/").unwrap();
        let html = Html::parse_document("<p><br><br><b>标题</b><br>正文</p>");
        let fragment = crate::extract::extract_document(&html, &base, &profile);
        assert_eq!(fragment.blocks, vec![Block::heading(4, "标题"), Block::paragraph("正文")]);
    }
}
