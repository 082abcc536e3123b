use std::io::{stdout, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use reader_core::{update, AppState, AppViewModel, Effect, InputMode, Msg, NUDGE_STEP};
use reader_engine::EngineHandle;
use reader_logging::{reader_debug, reader_error, reader_info};

use super::config::{config_dir, ReaderConfig};
use super::effects::EffectRunner;
use super::persistence::load_ui_state;
use super::ui::layout::HitTarget;
use super::ui::render::{draw, DrawnFrame};

const TICK: Duration = Duration::from_millis(50);
const SCROLL_STEP: u16 = 3;

pub fn run_app() -> Result<()> {
    let dir = config_dir();
    let config = ReaderConfig::load(&dir)?.with_env(|key| std::env::var(key).ok());
    reader_info!("Starting reader against {}", config.api_base);

    let engine = EngineHandle::new(config.engine_settings())?;
    let runner = EffectRunner::new(engine, dir.clone(), config.llm_update());
    let state = AppState::new()
        .with_suggestions(config.suggestions.clone())
        .with_top_k(config.top_k);
    let saved = load_ui_state(&dir);

    let mut terminal = TerminalGuard::enter()?;
    let mut app = App::new(state, runner);
    app.dispatch(Msg::RestoreUiState {
        split_ratio: saved.split_ratio,
        dark_mode: saved.dark_mode,
    });
    app.dispatch(Msg::Started);

    let result = app.run(&mut terminal.terminal);
    drop(terminal);
    if let Err(err) = &result {
        reader_error!("Application error: {err:?}");
    }
    reader_info!("Shutting down reader");
    result
}

/// Raw mode, alternate screen and mouse capture for as long as it lives.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut out = stdout();
        execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(out))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}

/// Routes drag and release events to the split controller while it lives.
struct PointerCapture;

impl PointerCapture {
    fn acquire() -> Self {
        reader_debug!("Pointer captured for split drag");
        Self
    }
}

impl Drop for PointerCapture {
    fn drop(&mut self) {
        reader_debug!("Pointer capture released");
    }
}

struct App {
    state: AppState,
    view: AppViewModel,
    runner: EffectRunner,
    drawn: DrawnFrame,
    /// Held between `AcquirePointer` and `ReleasePointer`; only then do drags reach the core.
    pointer: Option<PointerCapture>,
    /// Tab moved focus onto a marker; Enter opens it instead of asking.
    citation_focus: bool,
    answer_scroll: u16,
    needs_draw: bool,
    quit: bool,
}

impl App {
    fn new(state: AppState, runner: EffectRunner) -> Self {
        let view = state.view();
        Self {
            state,
            view,
            runner,
            drawn: DrawnFrame::default(),
            pointer: None,
            citation_focus: false,
            answer_scroll: 0,
            needs_draw: true,
            quit: false,
        }
    }

    fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        while !self.quit {
            for msg in self.runner.poll() {
                self.dispatch(msg);
            }
            if self.needs_draw {
                let view = &self.view;
                let scroll = self.answer_scroll;
                let mut drawn = DrawnFrame::default();
                terminal.draw(|frame| drawn = draw(frame, view, scroll))?;
                self.drawn = drawn;
                self.needs_draw = false;
            }
            if event::poll(TICK)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key(key),
                    Event::Mouse(mouse) => self.on_mouse(mouse),
                    Event::Resize(..) => self.needs_draw = true,
                    _ => {}
                }
            } else {
                self.dispatch(Msg::Tick);
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.view = state.view();
            self.needs_draw = true;
        }
        self.state = state;
        for effect in effects {
            match effect {
                Effect::AcquirePointer => {
                    self.pointer.get_or_insert_with(PointerCapture::acquire);
                }
                Effect::ReleasePointer => self.pointer = None,
                Effect::Ask { .. } => {
                    self.answer_scroll = 0;
                    self.runner.run(effect);
                }
                other => self.runner.run(other),
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.view.notification.is_some() {
            self.dispatch(Msg::NotificationDismissed);
            return;
        }
        if self.view.pending_delete.is_some() {
            let confirmed = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
            self.dispatch(if confirmed {
                Msg::DeleteConfirmed
            } else {
                Msg::DeleteCancelled
            });
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Char('c') if ctrl => self.quit = true,
            KeyCode::Char('u') if ctrl => self.dispatch(Msg::UploadPromptOpened),
            KeyCode::Char('r') if ctrl => self.dispatch(Msg::RefreshRequested),
            KeyCode::Char('t') if ctrl => self.dispatch(Msg::ThemeToggled),
            KeyCode::Char('d') if ctrl => {
                if let Some(id) = self.cursor_source() {
                    self.dispatch(Msg::DeleteRequested(id));
                }
            }
            KeyCode::Char('o') if ctrl => {
                if let Some(id) = self.cursor_source() {
                    self.dispatch(Msg::ShowDocumentClicked(id));
                }
            }
            KeyCode::Char('s') if ctrl => {
                if let Some(id) = self.cursor_source() {
                    self.dispatch(Msg::SourceToggled(id));
                }
            }
            KeyCode::Left if ctrl => self.dispatch(Msg::SplitNudged(-NUDGE_STEP)),
            KeyCode::Right if ctrl => self.dispatch(Msg::SplitNudged(NUDGE_STEP)),
            KeyCode::Char(digit @ '1'..='9') if alt => {
                let index = digit as usize - '1' as usize;
                self.dispatch(Msg::SuggestionChosen(index));
            }
            KeyCode::Up => self.dispatch(Msg::SourceCursorMoved { delta: -1 }),
            KeyCode::Down => self.dispatch(Msg::SourceCursorMoved { delta: 1 }),
            KeyCode::PageUp => self.dispatch(Msg::PageStepped { delta: -1 }),
            KeyCode::PageDown => self.dispatch(Msg::PageStepped { delta: 1 }),
            KeyCode::Tab => {
                self.citation_focus = true;
                self.dispatch(Msg::CitationFocusMoved { delta: 1 });
                self.scroll_to_focus();
            }
            KeyCode::BackTab => {
                self.citation_focus = true;
                self.dispatch(Msg::CitationFocusMoved { delta: -1 });
                self.scroll_to_focus();
            }
            KeyCode::Enter => match self.view.input_mode {
                InputMode::UploadPath => self.dispatch(Msg::UploadSubmitted),
                InputMode::Question if self.citation_focus => {
                    self.dispatch(Msg::FocusedCitationActivated)
                }
                InputMode::Question => self.dispatch(Msg::AskSubmitted),
            },
            KeyCode::Esc => match self.view.input_mode {
                InputMode::UploadPath => self.dispatch(Msg::UploadCancelled),
                InputMode::Question if self.citation_focus => self.citation_focus = false,
                InputMode::Question => self.quit = true,
            },
            KeyCode::Backspace => self.edit(|text| {
                text.pop();
            }),
            KeyCode::Char(ch) if !ctrl && !alt => self.edit(|text| text.push(ch)),
            _ => {}
        }
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.on_click(mouse.column, mouse.row),
            MouseEventKind::Drag(MouseButton::Left) if self.pointer.is_some() => {
                self.dispatch(Msg::PointerMoved {
                    x: f32::from(mouse.column),
                    bounds: self.drawn.layout.pane_bounds(),
                });
            }
            MouseEventKind::Up(MouseButton::Left) if self.pointer.is_some() => {
                self.dispatch(Msg::PointerReleased);
            }
            MouseEventKind::ScrollDown => self.scroll_answer(SCROLL_STEP as i32),
            MouseEventKind::ScrollUp => self.scroll_answer(-(SCROLL_STEP as i32)),
            _ => {}
        }
    }

    fn on_click(&mut self, column: u16, row: u16) {
        if self.view.notification.is_some() {
            self.dispatch(Msg::NotificationDismissed);
            return;
        }
        if self.view.pending_delete.is_some() {
            self.dispatch(Msg::DeleteCancelled);
            return;
        }
        let hit = self.drawn.layout.hit_test(
            column,
            row,
            &self.drawn.flow,
            self.answer_scroll,
            &self.view.suggestions,
        );
        match hit {
            Some(HitTarget::Divider) => self.dispatch(Msg::DividerPressed),
            Some(HitTarget::SourceRow { row, checkbox }) => {
                let index = self.drawn.source_window_start + row;
                let Some(id) = self.view.sources.get(index).map(|source| source.id) else {
                    return;
                };
                if let Some(current) = self.view.sources.iter().position(|source| source.cursor) {
                    let delta = index as isize - current as isize;
                    if delta != 0 {
                        self.dispatch(Msg::SourceCursorMoved { delta });
                    }
                }
                self.dispatch(if checkbox {
                    Msg::SourceToggled(id)
                } else {
                    Msg::ShowDocumentClicked(id)
                });
            }
            Some(HitTarget::Suggestion(index)) => self.dispatch(Msg::SuggestionChosen(index)),
            Some(HitTarget::Citation(segment)) => {
                self.citation_focus = true;
                self.dispatch(Msg::CitationClicked(segment));
            }
            Some(HitTarget::Answer) | Some(HitTarget::Viewer) | None => {}
        }
    }

    fn edit(&mut self, apply: impl FnOnce(&mut String)) {
        self.citation_focus = false;
        match self.view.input_mode {
            InputMode::Question => {
                let mut text = self.view.question.clone();
                apply(&mut text);
                self.dispatch(Msg::QuestionChanged(text));
            }
            InputMode::UploadPath => {
                let mut text = self.view.upload_path.clone();
                apply(&mut text);
                self.dispatch(Msg::UploadPathChanged(text));
            }
        }
    }

    fn cursor_source(&self) -> Option<u64> {
        self.view
            .sources
            .iter()
            .find(|source| source.cursor)
            .map(|source| source.id)
    }

    fn scroll_answer(&mut self, delta: i32) {
        let lines = self.drawn.flow.lines.len();
        let visible = usize::from(self.drawn.layout.answer_inner().height);
        let max = u16::try_from(lines.saturating_sub(visible)).unwrap_or(u16::MAX);
        let next = (i32::from(self.answer_scroll) + delta).clamp(0, i32::from(max));
        let next = u16::try_from(next).unwrap_or(0);
        if next != self.answer_scroll {
            self.answer_scroll = next;
            self.needs_draw = true;
        }
    }

    /// Keep the focused marker's line inside the answer pane.
    fn scroll_to_focus(&mut self) {
        let Some(line) = self
            .view
            .focused_segment
            .and_then(|segment| self.drawn.flow.line_of(segment))
        else {
            return;
        };
        let line = u16::try_from(line).unwrap_or(u16::MAX);
        let height = self.drawn.layout.answer_inner().height.max(1);
        if line < self.answer_scroll {
            self.answer_scroll = line;
        } else if line >= self.answer_scroll + height {
            self.answer_scroll = line + 1 - height;
        }
        self.needs_draw = true;
    }
}
