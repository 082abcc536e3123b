use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use reader_core::{AppViewModel, InputMode, Segment, ViewerPaneView};

use super::answer_layout::{
    flow_page_lines, flow_segments, highlight_scroll, AnswerFlow, SpanKind,
};
use super::layout::{chip_label, compute_layout, suggestion_zones, window_start, ScreenLayout};

#[derive(Debug, Clone, Copy)]
struct Theme {
    fg: Color,
    bg: Color,
    dim: Color,
    accent: Color,
    border: Color,
    highlight_bg: Color,
    chip_bg: Color,
}

const LIGHT: Theme = Theme {
    fg: Color::Black,
    bg: Color::White,
    dim: Color::Gray,
    accent: Color::Blue,
    border: Color::DarkGray,
    highlight_bg: Color::LightYellow,
    chip_bg: Color::LightBlue,
};

const DARK: Theme = Theme {
    fg: Color::White,
    bg: Color::Black,
    dim: Color::DarkGray,
    accent: Color::LightCyan,
    border: Color::Gray,
    highlight_bg: Color::Rgb(90, 80, 20),
    chip_bg: Color::Rgb(30, 50, 80),
};

/// What the event loop needs from the frame it just drew.
#[derive(Debug, Clone, Default)]
pub(crate) struct DrawnFrame {
    pub layout: ScreenLayout,
    pub flow: AnswerFlow,
    pub source_window_start: usize,
}

pub(crate) fn draw(frame: &mut Frame<'_>, view: &AppViewModel, answer_scroll: u16) -> DrawnFrame {
    let theme = if view.dark_mode { DARK } else { LIGHT };
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().fg(theme.fg).bg(theme.bg)),
        area,
    );

    let layout = compute_layout(
        area,
        view.split_ratio,
        view.sources.len(),
        !view.suggestions.is_empty(),
    );
    let flow = flow_segments(&view.segments, layout.answer_inner().width);

    draw_header(frame, view, &theme, layout.header);
    let source_window_start = draw_sources(frame, view, &theme, &layout);
    draw_suggestions(frame, view, &theme, layout.suggestions);
    draw_input(frame, view, &theme, layout.input);
    draw_answer(frame, view, &theme, &layout, &flow, answer_scroll);
    draw_divider(frame, view, &theme, layout.divider);
    draw_viewer(frame, view, &theme, &layout);
    draw_status(frame, view, &theme, layout.status);

    if let Some(title) = &view.pending_delete {
        draw_modal(
            frame,
            &theme,
            "Delete document",
            &format!("Delete \"{title}\"? Press y to confirm, any other key to cancel."),
        );
    } else if let Some(note) = &view.notification {
        draw_modal(
            frame,
            &theme,
            &note.title,
            &format!("{}\n\nPress any key to dismiss.", note.message),
        );
    }

    DrawnFrame {
        layout,
        flow,
        source_window_start,
    }
}

fn bordered<'a>(title: impl Into<Line<'a>>, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(title)
}

fn draw_header(frame: &mut Frame<'_>, view: &AppViewModel, theme: &Theme, area: Rect) {
    let model = view.backend_model.as_deref().unwrap_or("unknown model");
    let scope = match view.scoped_count {
        0 => "all sources".to_string(),
        n => format!("{n} selected sources"),
    };
    let line = Line::from(vec![
        Span::styled(
            " Reader ",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("model: {model}  searching {scope}"), Style::default().fg(theme.dim)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_sources(
    frame: &mut Frame<'_>,
    view: &AppViewModel,
    theme: &Theme,
    layout: &ScreenLayout,
) -> usize {
    let inner = layout.sources_inner();
    let rows = usize::from(inner.height);
    let cursor = view.sources.iter().position(|row| row.cursor);
    let start = window_start(view.sources.len(), cursor, rows);

    let title = if view.uploading {
        "Sources (uploading...)".to_string()
    } else {
        format!("Sources ({})", view.sources.len())
    };
    let lines: Vec<Line> = if view.sources.is_empty() {
        vec![Line::styled(
            "No documents yet. Ctrl-U uploads one.",
            Style::default().fg(theme.dim),
        )]
    } else {
        view.sources
            .iter()
            .skip(start)
            .take(rows)
            .map(|row| {
                let mut spans = vec![
                    Span::raw(if row.cursor { "> " } else { "  " }),
                    Span::raw(if row.in_scope { "[x] " } else { "[ ] " }),
                ];
                let mut title_style = Style::default().fg(theme.fg);
                if row.showing {
                    title_style = title_style.fg(theme.accent).add_modifier(Modifier::BOLD);
                }
                spans.push(Span::styled(row.title.clone(), title_style));
                if !row.has_text_layer {
                    spans.push(Span::styled(" (no text)", Style::default().fg(theme.dim)));
                }
                Line::from(spans)
            })
            .collect()
    };
    frame.render_widget(
        Paragraph::new(lines).block(bordered(title, theme)),
        layout.sources,
    );
    start
}

fn draw_suggestions(frame: &mut Frame<'_>, view: &AppViewModel, theme: &Theme, area: Rect) {
    let chip = Style::default().fg(theme.accent).bg(theme.chip_bg);
    for (zone, index) in suggestion_zones(area, &view.suggestions) {
        let label = chip_label(index, &view.suggestions[index]);
        frame.render_widget(Paragraph::new(Span::styled(label, chip)), zone);
    }
}

fn draw_input(frame: &mut Frame<'_>, view: &AppViewModel, theme: &Theme, area: Rect) {
    let (title, text) = match view.input_mode {
        InputMode::Question if view.asking => ("Question (asking...)", view.question.as_str()),
        InputMode::Question => ("Question (Enter to ask)", view.question.as_str()),
        InputMode::UploadPath => (
            "Upload file path (Enter to upload, Esc to cancel)",
            view.upload_path.as_str(),
        ),
    };
    let line = Line::from(vec![
        Span::raw(text.to_string()),
        Span::styled("_", Style::default().fg(theme.accent)),
    ]);
    frame.render_widget(Paragraph::new(line).block(bordered(title, theme)), area);
}

fn draw_answer(
    frame: &mut Frame<'_>,
    view: &AppViewModel,
    theme: &Theme,
    layout: &ScreenLayout,
    flow: &AnswerFlow,
    scroll: u16,
) {
    let mut block = bordered("Answer", theme);
    if let Some(cited) = view
        .focused_segment
        .and_then(|index| view.segments.get(index))
        .and_then(Segment::as_cited)
    {
        block = block.title_bottom(Line::styled(
            format!(" {} ", cited.label()),
            Style::default().fg(theme.accent),
        ));
    }

    let lines: Vec<Line> = if view.segments.is_empty() {
        let hint = if view.asking {
            "Waiting for the answer..."
        } else {
            "Ask a question to see an answer with citations."
        };
        vec![Line::styled(hint, Style::default().fg(theme.dim))]
    } else {
        flow.lines
            .iter()
            .map(|spans| {
                Line::from(
                    spans
                        .iter()
                        .map(|span| {
                            let style = match span.kind {
                                SpanKind::Text => Style::default().fg(theme.fg),
                                SpanKind::Cited => {
                                    let style = Style::default()
                                        .fg(theme.accent)
                                        .add_modifier(Modifier::UNDERLINED);
                                    if span.segment.is_some() && span.segment == view.focused_segment
                                    {
                                        style.add_modifier(Modifier::REVERSED)
                                    } else {
                                        style
                                    }
                                }
                                SpanKind::Unresolved => Style::default().fg(theme.dim),
                            };
                            Span::styled(span.text.clone(), style)
                        })
                        .collect::<Vec<_>>(),
                )
            })
            .collect()
    };
    frame.render_widget(
        Paragraph::new(lines).block(block).scroll((scroll, 0)),
        layout.answer,
    );
}

fn draw_divider(frame: &mut Frame<'_>, view: &AppViewModel, theme: &Theme, area: Rect) {
    let style = if view.dragging {
        Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.border)
    };
    let lines: Vec<Line> = (0..area.height)
        .map(|_| Line::styled("\u{2502}", style))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_viewer(frame: &mut Frame<'_>, view: &AppViewModel, theme: &Theme, layout: &ScreenLayout) {
    let title = match (&view.viewer_title, &view.viewer) {
        (Some(title), ViewerPaneView::Page(page)) => {
            format!("{title}  Page {} / {}", page.page, page.page_count)
        }
        (Some(title), _) => format!("{title}  Page {}", view.viewer_page),
        (None, _) => "Viewer".to_string(),
    };
    let block = bordered(title, theme);
    let dim = Style::default().fg(theme.dim);

    let (lines, scroll): (Vec<Line>, u16) = match &view.viewer {
        ViewerPaneView::Placeholder => (
            vec![Line::styled(
                "Select a source or click a citation to open it here.",
                dim,
            )],
            0,
        ),
        ViewerPaneView::Loading => (vec![Line::styled("Loading document...", dim)], 0),
        ViewerPaneView::Unavailable { message } => (
            vec![
                Line::styled("Document unavailable.", dim),
                Line::styled(message.clone(), dim),
            ],
            0,
        ),
        ViewerPaneView::Page(page) => {
            let inner = layout.viewer_inner();
            let rows = flow_page_lines(&page.lines, inner.width);
            let scroll = highlight_scroll(&rows, &page.highlighted, inner.height);
            let lines = rows
                .into_iter()
                .map(|row| {
                    let style = if page.highlighted.contains(&row.line) {
                        Style::default().fg(theme.fg).bg(theme.highlight_bg)
                    } else {
                        Style::default().fg(theme.fg)
                    };
                    Line::styled(row.text, style)
                })
                .collect();
            (lines, scroll)
        }
    };
    // Rows are pre-wrapped so the scroll offset matches what is drawn.
    frame.render_widget(
        Paragraph::new(lines).block(block).scroll((scroll, 0)),
        layout.right,
    );
}

fn draw_status(frame: &mut Frame<'_>, view: &AppViewModel, theme: &Theme, area: Rect) {
    let text = if view.text_selection_suppressed {
        format!(" Resizing: {:.0}% | release to finish", view.split_ratio)
    } else {
        " Enter ask | Tab citations | PgUp/PgDn page | Ctrl-O show | Ctrl-S scope | Ctrl-U upload | Ctrl-D delete | Ctrl-R refresh | Ctrl-T theme | Esc quit".to_string()
    };
    frame.render_widget(
        Paragraph::new(Span::styled(text, Style::default().fg(theme.dim))),
        area,
    );
}

fn draw_modal(frame: &mut Frame<'_>, theme: &Theme, title: &str, body: &str) {
    let area = centered(frame.area(), 60, 7);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(body.to_string())
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(theme.fg).bg(theme.bg))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.accent))
                    .title(format!(" {title} ")),
            ),
        area,
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [rect] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    rect
}
