use ratatui::layout::{Constraint, Layout, Rect};
use reader_core::{split_widths, PaneBounds};
use unicode_width::UnicodeWidthStr;

use super::answer_layout::AnswerFlow;
use super::constants::*;

/// Screen regions of the last drawn frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ScreenLayout {
    /// Everything above the status line; the split container.
    pub body: Rect,
    pub left: Rect,
    pub divider: Rect,
    pub right: Rect,
    pub header: Rect,
    pub sources: Rect,
    pub suggestions: Rect,
    pub input: Rect,
    pub answer: Rect,
    pub status: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HitTarget {
    Divider,
    /// Index into the visible window of the source list.
    SourceRow { row: usize, checkbox: bool },
    Suggestion(usize),
    /// Segment index of a resolved marker.
    Citation(usize),
    Answer,
    Viewer,
}

pub(crate) fn compute_layout(
    area: Rect,
    ratio: f32,
    source_count: usize,
    has_suggestions: bool,
) -> ScreenLayout {
    let [body, status] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(STATUS_HEIGHT)]).areas(area);

    let (left_width, right_width) = split_widths(body.width, DIVIDER_WIDTH, ratio);
    let left = Rect {
        width: left_width,
        ..body
    };
    let divider = Rect {
        x: body.x + left_width,
        width: body.width.saturating_sub(left_width + right_width),
        ..body
    };
    let right = Rect {
        x: divider.x + divider.width,
        width: right_width,
        ..body
    };

    let source_rows = (source_count.max(1) as u16).min(MAX_SOURCE_ROWS);
    let suggestion_height = u16::from(has_suggestions);
    let [header, sources, suggestions, input, answer] = Layout::vertical([
        Constraint::Length(HEADER_HEIGHT),
        Constraint::Length(source_rows + 2),
        Constraint::Length(suggestion_height),
        Constraint::Length(INPUT_HEIGHT),
        Constraint::Min(3),
    ])
    .areas(left);

    ScreenLayout {
        body,
        left,
        divider,
        right,
        header,
        sources,
        suggestions,
        input,
        answer,
        status,
    }
}

impl ScreenLayout {
    /// Container bounds handed to the split controller.
    pub(crate) fn pane_bounds(&self) -> PaneBounds {
        PaneBounds {
            left: f32::from(self.body.x),
            width: f32::from(self.body.width),
        }
    }

    pub(crate) fn answer_inner(&self) -> Rect {
        inner(self.answer)
    }

    pub(crate) fn sources_inner(&self) -> Rect {
        inner(self.sources)
    }

    pub(crate) fn viewer_inner(&self) -> Rect {
        inner(self.right)
    }

    /// What sits under the pointer at (`column`, `row`).
    pub(crate) fn hit_test(
        &self,
        column: u16,
        row: u16,
        flow: &AnswerFlow,
        answer_scroll: u16,
        suggestions: &[String],
    ) -> Option<HitTarget> {
        if contains(self.divider, column, row) {
            return Some(HitTarget::Divider);
        }
        let sources = self.sources_inner();
        if contains(sources, column, row) {
            return Some(HitTarget::SourceRow {
                row: usize::from(row - sources.y),
                checkbox: column - sources.x < SOURCE_CHECKBOX_COLS,
            });
        }
        if contains(self.suggestions, column, row) {
            return suggestion_zones(self.suggestions, suggestions)
                .into_iter()
                .find(|(zone, _)| contains(*zone, column, row))
                .map(|(_, index)| HitTarget::Suggestion(index));
        }
        let answer = self.answer_inner();
        if contains(answer, column, row) {
            let line = usize::from(row - answer.y) + usize::from(answer_scroll);
            return Some(
                flow.segment_at(line, column - answer.x)
                    .map(HitTarget::Citation)
                    .unwrap_or(HitTarget::Answer),
            );
        }
        if contains(self.right, column, row) {
            return Some(HitTarget::Viewer);
        }
        None
    }
}

/// Chips for suggested questions laid out left to right; ones that do not fit are dropped.
pub(crate) fn suggestion_zones(area: Rect, suggestions: &[String]) -> Vec<(Rect, usize)> {
    let mut zones = Vec::new();
    let mut x = area.x;
    let end = area.x.saturating_add(area.width);
    for (index, text) in suggestions.iter().enumerate() {
        let width = u16::try_from(chip_label(index, text).width()).unwrap_or(u16::MAX);
        if x.saturating_add(width) > end {
            break;
        }
        zones.push((
            Rect {
                x,
                y: area.y,
                width,
                height: area.height.min(1),
            },
            index,
        ));
        x = x.saturating_add(width + SUGGESTION_GAP);
    }
    zones
}

pub(crate) fn chip_label(index: usize, text: &str) -> String {
    format!(" {}:{} ", index + 1, text)
}

/// First row of a `rows`-tall window over `len` items that keeps `cursor` visible.
pub(crate) fn window_start(len: usize, cursor: Option<usize>, rows: usize) -> usize {
    let Some(cursor) = cursor else {
        return 0;
    };
    if rows == 0 || len <= rows {
        return 0;
    }
    cursor.saturating_sub(rows - 1).min(len - rows)
}

fn inner(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}
