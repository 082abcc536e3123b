//! Splitting answer text into plain text and citation markers.
use std::sync::LazyLock;

use regex::Regex;

use crate::Citation;

// ASCII digits only; `\d` would also accept other scripts' digits.
static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[0-9]+\]").expect("marker pattern is valid"));

/// One renderable piece of an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Plain answer text between markers.
    Text(String),
    /// A marker that resolved to a citation.
    Cited(CitedRef),
    /// A marker with no matching citation; rendered but inert.
    Unresolved { marker: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitedRef {
    /// The marker exactly as it appeared, e.g. `"[3]"`.
    pub marker: String,
    /// Position of `citation` in the answer's citation list.
    pub citation_index: usize,
    pub citation: Citation,
    /// First page of the citation's page range, always >= 1.
    pub first_page: u32,
}

impl CitedRef {
    /// Short description shown next to a focused marker.
    pub fn label(&self) -> String {
        format!("{} - {}", self.citation.document_title, self.citation.pages)
    }
}

impl Segment {
    /// The exact slice of answer text this segment covers.
    pub fn text(&self) -> &str {
        match self {
            Segment::Text(text) => text,
            Segment::Cited(cited) => &cited.marker,
            Segment::Unresolved { marker } => marker,
        }
    }

    pub fn is_marker(&self) -> bool {
        !matches!(self, Segment::Text(_))
    }

    pub fn as_cited(&self) -> Option<&CitedRef> {
        match self {
            Segment::Cited(cited) => Some(cited),
            _ => None,
        }
    }
}

/// Split `text` on `[n]` markers and resolve each marker against `citations`.
///
/// Concatenating the text of the returned segments yields `text` again.
pub fn resolve_citations(text: &str, citations: &[Citation]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    for found in MARKER.find_iter(text) {
        if found.start() > cursor {
            segments.push(Segment::Text(text[cursor..found.start()].to_string()));
        }
        segments.push(resolve_marker(found.as_str(), citations));
        cursor = found.end();
    }
    if cursor < text.len() {
        segments.push(Segment::Text(text[cursor..].to_string()));
    }
    segments
}

fn resolve_marker(marker: &str, citations: &[Citation]) -> Segment {
    let number = marker[1..marker.len() - 1].parse::<u64>().ok();
    match number.and_then(|n| find_citation(n, citations)) {
        Some(index) => {
            let citation = citations[index].clone();
            Segment::Cited(CitedRef {
                marker: marker.to_string(),
                citation_index: index,
                first_page: first_page(&citation.pages),
                citation,
            })
        }
        None => Segment::Unresolved {
            marker: marker.to_string(),
        },
    }
}

/// Index of the citation marker `number` refers to.
///
/// Tried in order: an explicit `reference`, the 1-based position in
/// `citations`, then the document id.
pub fn find_citation(number: u64, citations: &[Citation]) -> Option<usize> {
    citations
        .iter()
        .position(|c| c.reference == Some(number))
        .or_else(|| {
            usize::try_from(number)
                .ok()
                .filter(|n| (1..=citations.len()).contains(n))
                .map(|n| n - 1)
        })
        .or_else(|| citations.iter().position(|c| c.document_id == number))
}

/// First page of a page range such as `"s.12-13"`; 1 when nothing parses.
pub fn first_page(pages: &str) -> u32 {
    let start = pages
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(pages.len());
    let head = pages[start..].split('-').next().unwrap_or_default();
    head.trim()
        .parse::<u32>()
        .ok()
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_handles_labels_and_ranges() {
        assert_eq!(first_page("s.12-13"), 12);
        assert_eq!(first_page("5"), 5);
        assert_eq!(first_page("pp. 7 - 9"), 7);
        assert_eq!(first_page(""), 1);
        assert_eq!(first_page("s."), 1);
        assert_eq!(first_page("12a-13"), 1);
        assert_eq!(first_page("0"), 1);
        assert_eq!(first_page("99999999999"), 1);
    }

    #[test]
    fn marker_without_number_is_plain_text() {
        let segments = resolve_citations("see [] and [x]", &[]);
        assert_eq!(segments, vec![Segment::Text("see [] and [x]".to_string())]);
    }
}
