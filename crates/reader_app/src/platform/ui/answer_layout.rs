//! Flowing answer segments and page text into terminal rows, remembering where markers land.
use reader_core::Segment;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpanKind {
    Text,
    /// A resolved marker; clickable.
    Cited,
    /// A marker with no citation; shown dimmed, inert.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FlowSpan {
    pub text: String,
    pub kind: SpanKind,
    /// Index of the marker's segment, for marker spans.
    pub segment: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CitationZone {
    pub line: usize,
    pub start_col: u16,
    pub end_col: u16,
    pub segment: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AnswerFlow {
    pub lines: Vec<Vec<FlowSpan>>,
    pub zones: Vec<CitationZone>,
}

impl AnswerFlow {
    /// The resolved marker drawn at `col` on flowed line `line`.
    pub(crate) fn segment_at(&self, line: usize, col: u16) -> Option<usize> {
        self.zones
            .iter()
            .find(|zone| zone.line == line && zone.start_col <= col && col < zone.end_col)
            .map(|zone| zone.segment)
    }

    /// Flowed line holding the marker of `segment`.
    pub(crate) fn line_of(&self, segment: usize) -> Option<usize> {
        self.zones
            .iter()
            .find(|zone| zone.segment == segment)
            .map(|zone| zone.line)
    }
}

struct Flow {
    width: u16,
    col: u16,
    out: AnswerFlow,
}

impl Flow {
    fn new(width: u16) -> Self {
        Self {
            width: width.max(1),
            col: 0,
            out: AnswerFlow {
                lines: vec![Vec::new()],
                zones: Vec::new(),
            },
        }
    }

    fn break_line(&mut self) {
        self.out.lines.push(Vec::new());
        self.col = 0;
    }

    fn push(&mut self, text: &str, kind: SpanKind, segment: Option<usize>) {
        let width = text_width(text);
        let line = self.out.lines.len() - 1;
        if kind == SpanKind::Cited {
            if let Some(segment) = segment {
                self.out.zones.push(CitationZone {
                    line,
                    start_col: self.col,
                    end_col: self.col.saturating_add(width),
                    segment,
                });
            }
        }
        self.col = self.col.saturating_add(width);
        let spans = &mut self.out.lines[line];
        match spans.last_mut() {
            Some(last) if kind == SpanKind::Text && last.kind == SpanKind::Text => {
                last.text.push_str(text);
            }
            _ => spans.push(FlowSpan {
                text: text.to_string(),
                kind,
                segment,
            }),
        }
    }

    fn space(&mut self) {
        if self.col == 0 {
            return;
        }
        if self.col + 1 > self.width {
            self.break_line();
        } else {
            self.push(" ", SpanKind::Text, None);
        }
    }

    /// Place an unbreakable token, wrapping first if it does not fit.
    fn token(&mut self, text: &str, kind: SpanKind, segment: Option<usize>) {
        let width = text_width(text);
        if self.col > 0 && self.col.saturating_add(width) > self.width {
            self.break_line();
        }
        if width <= self.width || kind != SpanKind::Text {
            self.push(text, kind, segment);
            return;
        }
        // Words longer than a line are split hard.
        let mut chunk = String::new();
        for ch in text.chars() {
            chunk.push(ch);
            if self.col.saturating_add(text_width(&chunk)) > self.width {
                chunk.pop();
                if !chunk.is_empty() {
                    self.push(&chunk, kind, None);
                }
                self.break_line();
                chunk.clear();
                chunk.push(ch);
            }
        }
        if !chunk.is_empty() {
            self.push(&chunk, kind, None);
        }
    }

    fn text(&mut self, text: &str) {
        for (n, line) in text.split('\n').enumerate() {
            if n > 0 {
                self.break_line();
            }
            let mut word = String::new();
            for ch in line.chars() {
                if ch.is_whitespace() {
                    if !word.is_empty() {
                        self.token(&word, SpanKind::Text, None);
                        word.clear();
                    }
                    self.space();
                } else {
                    word.push(ch);
                }
            }
            if !word.is_empty() {
                self.token(&word, SpanKind::Text, None);
            }
        }
    }
}

/// Flow `segments` into lines at most `width` columns wide.
pub(crate) fn flow_segments(segments: &[Segment], width: u16) -> AnswerFlow {
    let mut flow = Flow::new(width);
    for (index, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Text(text) => flow.text(text),
            Segment::Cited(cited) => flow.token(&cited.marker, SpanKind::Cited, Some(index)),
            Segment::Unresolved { marker } => {
                flow.token(marker, SpanKind::Unresolved, Some(index))
            }
        }
    }
    flow.out
}

/// One terminal row of a flowed page, tagged with the text line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageRow {
    pub line: usize,
    pub text: String,
}

/// Wrap page text lines into rows at most `width` columns wide.
pub(crate) fn flow_page_lines(lines: &[String], width: u16) -> Vec<PageRow> {
    let mut rows = Vec::new();
    for (line, text) in lines.iter().enumerate() {
        let mut flow = Flow::new(width);
        flow.text(text);
        rows.extend(flow.out.lines.into_iter().map(|spans| PageRow {
            line,
            text: spans
                .into_iter()
                .map(|span| span.text)
                .collect::<String>()
                .trim_end()
                .to_string(),
        }));
    }
    rows
}

/// Scroll offset that brings the first highlighted line into a viewport `height` rows tall.
pub(crate) fn highlight_scroll(rows: &[PageRow], highlighted: &[usize], height: u16) -> u16 {
    let Some(first) = highlighted.iter().min() else {
        return 0;
    };
    rows.iter()
        .position(|row| row.line == *first)
        .and_then(|row| u16::try_from(row).ok())
        .filter(|row| *row >= height)
        .map(|row| row.saturating_sub(2))
        .unwrap_or(0)
}

fn text_width(text: &str) -> u16 {
    u16::try_from(UnicodeWidthStr::width(text)).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use reader_core::{resolve_citations, Citation};

    use super::*;

    fn citation(document_id: u64, reference: u64) -> Citation {
        Citation {
            document_id,
            document_title: format!("Doc {document_id}"),
            section: None,
            pages: "3".into(),
            excerpt: String::new(),
            reference: Some(reference),
        }
    }

    fn line_text(flow: &AnswerFlow, line: usize) -> String {
        flow.lines[line].iter().map(|span| span.text.as_str()).collect()
    }

    #[test]
    fn markers_are_clickable_where_they_are_drawn() {
        let segments = resolve_citations("War ends [1] and peace [9].", &[citation(4, 1)]);
        let flow = flow_segments(&segments, 80);
        assert_eq!(line_text(&flow, 0), "War ends [1] and peace [9].");
        assert_eq!(flow.zones.len(), 1);
        // "[1]" occupies columns 9..12.
        assert_eq!(flow.segment_at(0, 9), Some(1));
        assert_eq!(flow.segment_at(0, 11), Some(1));
        assert_eq!(flow.segment_at(0, 12), None);
        // Unresolved markers are drawn but inert.
        assert_eq!(flow.segment_at(0, 24), None);
        let kinds: Vec<SpanKind> = flow.lines[0].iter().map(|span| span.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SpanKind::Text,
                SpanKind::Cited,
                SpanKind::Text,
                SpanKind::Unresolved,
                SpanKind::Text,
            ]
        );
    }

    #[test]
    fn wraps_words_and_keeps_markers_whole() {
        let segments = resolve_citations("alpha beta gamma[1]", &[citation(1, 1)]);
        let flow = flow_segments(&segments, 12);
        assert_eq!(line_text(&flow, 0), "alpha beta ");
        assert_eq!(line_text(&flow, 1), "gamma[1]");
        assert_eq!(flow.line_of(1), Some(1));
        assert_eq!(flow.segment_at(1, 5), Some(1));
    }

    #[test]
    fn newlines_break_lines_and_long_words_split() {
        let flow = flow_segments(&[Segment::Text("ab\nabcdefgh".into())], 4);
        let lines: Vec<String> = (0..flow.lines.len()).map(|n| line_text(&flow, n)).collect();
        assert_eq!(lines, vec!["ab", "abcd", "efgh"]);
    }

    #[test]
    fn page_rows_follow_wrapping() {
        let lines = vec!["alpha beta gamma delta".to_string(), "target".to_string()];
        let rows = flow_page_lines(&lines, 10);
        let texts: Vec<&str> = rows.iter().map(|row| row.text.as_str()).collect();
        assert_eq!(texts, vec!["alpha beta", "gamma", "delta", "target"]);
        assert_eq!(
            rows.iter().map(|row| row.line).collect::<Vec<_>>(),
            vec![0, 0, 0, 1]
        );
    }

    #[test]
    fn highlight_scroll_counts_wrapped_rows() {
        let lines = vec!["alpha beta gamma delta".to_string(), "target".to_string()];
        let rows = flow_page_lines(&lines, 10);
        // The highlight sits on row 3, below a three-row viewport.
        assert_eq!(highlight_scroll(&rows, &[1], 3), 1);
        assert_eq!(highlight_scroll(&rows, &[1], 10), 0);
        assert_eq!(highlight_scroll(&rows, &[], 3), 0);
    }
}
