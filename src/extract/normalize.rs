//! Whitespace and line normalization shared by extraction and assembly.
//!
//! Every function here is idempotent: applying it to its own output changes
//! nothing.

use once_cell::sync::Lazy;
use regex::Regex;

/// Horizontal whitespace, including U+3000 (ideographic space) and NBSP.
static HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\t\x0B\x0C\r \u{00A0}\u{1680}\u{2000}-\u{200A}\u{202F}\u{205F}\u{3000}]+")
        .expect("valid horizontal whitespace regex")
});

/// Three or more line breaks, allowing whitespace-only lines in between.
static BLANK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").expect("valid blank-run regex"));

static HEADING_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#+\s+").expect("valid heading-marker regex"));

static ANY_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// CJK numerals followed by an ideographic space: `一　`, `十二　`.
static SUBSECTION_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[一二三四五六七八九十百]+\u{3000}").expect("valid subsection regex"));

static SPACE_AFTER_FULL_STOP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"。 +").expect("valid full-stop regex"));

/// Collapse runs of horizontal whitespace to one space and trim the line.
pub fn normalize_line(line: &str) -> String {
    HORIZONTAL_WS.replace_all(line, " ").trim().to_string()
}

/// Single-line form of heading or title text: line breaks become spaces,
/// then [`normalize_line`] applies.
pub fn normalize_heading(text: &str) -> String {
    normalize_line(&text.replace(['\r', '\n'], " "))
}

/// Split buffered text into paragraphs.
///
/// Lines are normalized with [`normalize_line`]; one or more blank lines mark a
/// paragraph boundary, single line breaks stay inside the paragraph.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for raw in text.split('\n') {
        let line = normalize_line(raw);
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }
    paragraphs
}

/// Collapse three or more consecutive line breaks to exactly one blank line.
pub fn collapse_blank_lines(text: &str) -> String {
    BLANK_RUN.replace_all(text, "\n\n").into_owned()
}

/// Remove leading Markdown heading markers (`### `).
pub fn strip_heading_markers(text: &str) -> &str {
    match HEADING_MARKERS.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Comparison form of a line: no heading markers, whitespace collapsed.
pub fn canonical(text: &str) -> String {
    let text = text.trim();
    let text = strip_heading_markers(text).replace('\u{3000}', " ");
    ANY_WS.replace_all(&text, " ").trim().to_string()
}

/// Whether raw heading text starts with a CJK numeral and an ideographic space.
///
/// Must be called before whitespace normalization turns U+3000 into a space.
pub fn is_subsection_heading(raw: &str) -> bool {
    SUBSECTION_PREFIX.is_match(raw.trim_start_matches([' ', '\t', '\n', '\r']))
}

/// Drop spaces after `。`; CJK text never wants them.
pub fn tighten_cjk_punctuation(text: &str) -> String {
    SPACE_AFTER_FULL_STOP.replace_all(text, "。").into_owned()
}

/// Replace the first matching suffix of `text` with its substitute.
pub fn rewrite_trailing(text: &str, rewrites: &[(String, String)]) -> String {
    for (suffix, replacement) in rewrites {
        if let Some(head) = text.strip_suffix(suffix.as_str()) {
            return format!("{head}{replacement}");
        }
    }
    text.to_string()
}
