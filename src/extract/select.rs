//! Candidate selection: which nodes of a page hold the content.

use super::Selection;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Length of the visible text of an element, ignoring surrounding whitespace
/// of each text node.
pub fn visible_len(element: &ElementRef<'_>) -> usize {
    element
        .text()
        .map(|t| t.trim().chars().count())
        .sum()
}

/// The element with the most visible text. Ties keep the earliest element.
pub fn longest<'a>(candidates: &[ElementRef<'a>]) -> Option<ElementRef<'a>> {
    let mut best: Option<(ElementRef<'a>, usize)> = None;
    for candidate in candidates {
        let len = visible_len(candidate);
        match best {
            Some((_, best_len)) if len <= best_len => {}
            _ => best = Some((*candidate, len)),
        }
    }
    best.map(|(element, _)| element)
}

/// The `n`-th (1-based) candidate, or the longest when there are fewer.
pub fn nth_or_longest<'a>(candidates: &[ElementRef<'a>], n: usize) -> Option<ElementRef<'a>> {
    match n.checked_sub(1).and_then(|i| candidates.get(i)) {
        Some(element) => Some(*element),
        None => longest(candidates),
    }
}

/// Paragraph-like elements that carry any visible text, in document order.
pub fn non_empty<'a>(document: &'a Html, paragraphs: &Selector) -> Vec<ElementRef<'a>> {
    document
        .select(paragraphs)
        .filter(|p| visible_len(p) > 0)
        .collect()
}

/// Resolve a [`Selection`] to the ordered list of blocks to convert.
pub fn content_blocks<'a>(
    document: &'a Html,
    selection: &Selection,
    paragraphs: &Selector,
) -> Vec<ElementRef<'a>> {
    match selection {
        Selection::Longest => longest(&non_empty(document, paragraphs)).into_iter().collect(),
        Selection::Nth(n) => {
            let candidates = non_empty(document, paragraphs);
            if candidates.len() < *n {
                debug!(found = candidates.len(), wanted = n, "Too few paragraphs; using the longest");
            }
            nth_or_longest(&candidates, *n).into_iter().collect()
        }
        Selection::Container(chain) => {
            for (i, selector) in chain.iter().enumerate() {
                if let Some(container) = document.select(selector).next() {
                    if i > 0 {
                        debug!(fallback = i, "Primary container missing; using fallback");
                    }
                    return container
                        .children()
                        .filter_map(ElementRef::wrap)
                        .filter(|child| child.value().name() != "br")
                        .collect();
                }
            }
            debug!("No container in the selector chain matched");
            Vec::new()
        }
        Selection::All { selector, skip } => document.select(selector).skip(*skip).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::css;

    fn texts(blocks: &[ElementRef<'_>]) -> Vec<String> {
        blocks
            .iter()
            .map(|b| b.text().collect::<String>().trim().to_string())
            .collect()
    }

    #[test]
    fn test_nth_skips_interspersed_empty_paragraphs() {
        let html = Html::parse_document(
            "<p></p><p>nav</p><p> \u{3000} </p><p>title</p><p></p><p>the body text</p><p>footer that is longest of all</p>",
        );
        let blocks = content_blocks(&html, &Selection::Nth(3), &css("p"));
        assert_eq!(texts(&blocks), vec!["the body text"]);
    }

    #[test]
    fn test_nth_falls_back_to_longest() {
        let html = Html::parse_document("<p>short</p><p></p><p>much longer text</p>");
        let blocks = content_blocks(&html, &Selection::Nth(3), &css("p"));
        assert_eq!(texts(&blocks), vec!["much longer text"]);
    }

    #[test]
    fn test_nth_with_no_paragraphs_is_empty() {
        let html = Html::parse_document("<div>text outside paragraphs</div><p> </p>");
        assert!(content_blocks(&html, &Selection::Nth(3), &css("p")).is_empty());
    }

    #[test]
    fn test_longest_keeps_first_of_equal_candidates() {
        let html = Html::parse_document("<p>aaaa</p><p>bbbb</p><p>cc</p>");
        let blocks = content_blocks(&html, &Selection::Longest, &css("p"));
        assert_eq!(texts(&blocks), vec!["aaaa"]);
    }

    #[test]
    fn test_longest_ignores_whitespace_padding() {
        let html = Html::parse_document("<p>\u{3000}\u{3000}\u{3000}ab</p><p>abc</p>");
        let blocks = content_blocks(&html, &Selection::Longest, &css("p"));
        assert_eq!(texts(&blocks), vec!["abc"]);
    }

    #[test]
    fn test_container_chain_falls_back_then_empties() {
        let chain = Selection::Container(vec![css("div.main"), css("#c")]);
        let html = Html::parse_document(r#"<div id="c"><div>one</div><br><div>two</div></div>"#);
        assert_eq!(texts(&content_blocks(&html, &chain, &css("p"))), vec!["one", "two"]);

        let html = Html::parse_document(r#"<div class="other"><div>one</div></div>"#);
        assert!(content_blocks(&html, &chain, &css("p")).is_empty());
    }

    #[test]
    fn test_all_skips_leading_matches() {
        let html = Html::parse_document("<p>breadcrumb</p><h2>I</h2><p>one</p><p>two</p>");
        let selection = Selection::All {
            selector: css("h2, p"),
            skip: 1,
        };
        assert_eq!(
            texts(&content_blocks(&html, &selection, &css("p"))),
            vec!["I", "one", "two"]
        );
    }
}
