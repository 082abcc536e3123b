use crate::state::ViewerStatus;
use crate::view_model::InputMode;
use crate::{AppState, Document, Effect, Msg, Segment, SplitState};

/// Longest highlight probe taken from a citation excerpt, in bytes.
const HIGHLIGHT_PROBE_LEN: usize = 40;

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => vec![Effect::RefreshDocuments, Effect::LoadBackendSettings],
        Msg::RestoreUiState {
            split_ratio,
            dark_mode,
        } => {
            state.split = SplitState::with_ratio(split_ratio);
            state.dark_mode = dark_mode;
            state.mark_dirty();
            Vec::new()
        }
        Msg::QuestionChanged(text) => {
            if state.question != text {
                state.question = text;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SuggestionChosen(index) => match state.suggestions.get(index).cloned() {
            Some(question) => {
                state.question = question;
                state.mark_dirty();
                ask(&mut state)
            }
            None => Vec::new(),
        },
        Msg::AskSubmitted => ask(&mut state),
        Msg::UploadPromptOpened => {
            if !state.uploading && state.input_mode != InputMode::UploadPath {
                state.input_mode = InputMode::UploadPath;
                state.upload_path.clear();
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::UploadPathChanged(path) => {
            if state.input_mode == InputMode::UploadPath && state.upload_path != path {
                state.upload_path = path;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::UploadSubmitted => {
            let path = state.upload_path.trim().to_string();
            if state.input_mode != InputMode::UploadPath || path.is_empty() || state.uploading {
                return (state, Vec::new());
            }
            state.uploading = true;
            state.input_mode = InputMode::Question;
            state.upload_path.clear();
            state.mark_dirty();
            vec![Effect::Upload { path }]
        }
        Msg::UploadCancelled => {
            if state.input_mode == InputMode::UploadPath {
                state.input_mode = InputMode::Question;
                state.upload_path.clear();
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::RefreshRequested => vec![Effect::RefreshDocuments],
        Msg::SourceCursorMoved { delta } => {
            if let Some(last) = state.documents.len().checked_sub(1) {
                let next = match state.source_cursor {
                    None => 0,
                    Some(current) => current.saturating_add_signed(delta).min(last),
                };
                if state.source_cursor != Some(next) {
                    state.source_cursor = Some(next);
                    state.mark_dirty();
                }
            }
            Vec::new()
        }
        Msg::SourceToggled(id) => {
            if state.document(id).is_some() {
                if let Some(pos) = state.source_ids.iter().position(|x| *x == id) {
                    state.source_ids.remove(pos);
                } else {
                    state.source_ids.push(id);
                }
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ShowDocumentClicked(id) => {
            if state.document(id).is_some() && state.selection.open(id, 1, None) {
                state.mark_dirty();
                vec![viewer_effect(&state)]
            } else {
                Vec::new()
            }
        }
        Msg::DeleteRequested(id) => {
            if state.document(id).is_some() {
                state.pending_delete = Some(id);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::DeleteConfirmed => match state.pending_delete.take() {
            Some(document_id) => {
                state.mark_dirty();
                vec![Effect::DeleteDocument { document_id }]
            }
            None => Vec::new(),
        },
        Msg::DeleteCancelled => {
            if state.pending_delete.take().is_some() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::CitationClicked(index) => open_citation(&mut state, index),
        Msg::CitationFocusMoved { delta } => {
            let positions = state.cited_positions();
            if !positions.is_empty() {
                let len = positions.len() as isize;
                let next = match state
                    .focused_segment
                    .and_then(|focused| positions.iter().position(|p| *p == focused))
                {
                    Some(current) => (current as isize + delta).rem_euclid(len),
                    None if delta < 0 => len - 1,
                    None => 0,
                };
                state.focused_segment = Some(positions[next as usize]);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::FocusedCitationActivated => match state.focused_segment {
            Some(index) => open_citation(&mut state, index),
            None => Vec::new(),
        },
        Msg::PageStepped { delta } => {
            if state.selection.document_id().is_none() {
                return (state, Vec::new());
            }
            let mut next = (i64::from(state.selection.page()) + i64::from(delta)).max(1);
            if let Some(count) = state.known_page_count() {
                next = next.min(i64::from(count.max(1)));
            }
            let next = u32::try_from(next).unwrap_or(u32::MAX);
            if state.selection.set_page(next) {
                state.mark_dirty();
                vec![viewer_effect(&state)]
            } else {
                Vec::new()
            }
        }
        Msg::DividerPressed => {
            if state.split.press() {
                state.mark_dirty();
                vec![Effect::AcquirePointer]
            } else {
                Vec::new()
            }
        }
        Msg::PointerMoved { x, bounds } => {
            if state.split.pointer_moved(x, bounds) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::PointerReleased => {
            if state.split.release() {
                state.mark_dirty();
                vec![Effect::ReleasePointer, persist_effect(&state)]
            } else {
                Vec::new()
            }
        }
        Msg::SplitNudged(delta) => {
            if state.split.nudge(delta) {
                state.mark_dirty();
                vec![persist_effect(&state)]
            } else {
                Vec::new()
            }
        }
        Msg::ThemeToggled => {
            state.dark_mode = !state.dark_mode;
            state.mark_dirty();
            vec![persist_effect(&state)]
        }
        Msg::NotificationDismissed => {
            if state.notification.take().is_some() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::DocumentsLoaded(Ok(documents)) => apply_documents(&mut state, documents),
        Msg::DocumentsLoaded(Err(message)) => {
            state.notify("Could not load documents", message);
            state.mark_dirty();
            Vec::new()
        }
        Msg::AnswerReceived(result) => {
            state.asking = false;
            match result {
                Ok(answer) => state.set_answer(answer),
                Err(message) => state.notify("Question failed", message),
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::UploadFinished(result) => {
            state.uploading = false;
            state.mark_dirty();
            match result {
                Ok(_) => vec![Effect::RefreshDocuments],
                Err(message) => {
                    state.notify("Upload failed", message);
                    Vec::new()
                }
            }
        }
        Msg::DeleteFinished {
            document_id,
            result,
        } => {
            state.mark_dirty();
            match result {
                Ok(()) => {
                    state.source_ids.retain(|id| *id != document_id);
                    let mut effects = vec![Effect::RefreshDocuments];
                    if state.selection.document_id() == Some(document_id) {
                        state.selection.clear();
                        state.viewer = ViewerStatus::Idle;
                        effects.push(Effect::CloseViewer);
                    }
                    effects
                }
                Err(message) => {
                    state.notify("Delete failed", message);
                    Vec::new()
                }
            }
        }
        Msg::BackendSettingsLoaded(result) => {
            state.backend_model = result.ok();
            state.mark_dirty();
            Vec::new()
        }
        Msg::ViewerLoading { document_id } => {
            if state.selection.document_id() == Some(document_id) {
                state.viewer = ViewerStatus::Loading { document_id };
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ViewerPageShown { document_id, page } => {
            if state.selection.document_id() == Some(document_id) {
                state.selection.sync_page(page.page);
                state.viewer = ViewerStatus::Ready { document_id, page };
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ViewerHighlighted {
            document_id,
            page,
            nodes,
        } => {
            if let ViewerStatus::Ready {
                document_id: shown,
                page: view,
            } = &mut state.viewer
            {
                if *shown == document_id && view.page == page {
                    view.highlighted = nodes;
                    state.mark_dirty();
                }
            }
            Vec::new()
        }
        Msg::ViewerFailed {
            document_id,
            message,
        } => {
            if state.selection.document_id() == Some(document_id) {
                state.viewer = ViewerStatus::Failed {
                    document_id,
                    message,
                };
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn ask(state: &mut AppState) -> Vec<Effect> {
    if state.asking || state.question.trim().is_empty() {
        return Vec::new();
    }
    state.asking = true;
    // Stale citations must never attach to the next answer.
    state.clear_answer();
    state.mark_dirty();
    let source_ids = (!state.source_ids.is_empty()).then(|| state.source_ids.clone());
    vec![Effect::Ask {
        question: state.question.clone(),
        top_k: state.top_k,
        source_ids,
    }]
}

fn open_citation(state: &mut AppState, index: usize) -> Vec<Effect> {
    let Some(cited) = state.segments().get(index).and_then(Segment::as_cited) else {
        return Vec::new();
    };
    let document_id = cited.citation.document_id;
    let page = cited.first_page;
    let highlight = highlight_probe(&cited.citation.excerpt);

    state.focused_segment = Some(index);
    state.mark_dirty();
    if state.document(document_id).is_none() {
        state.notify(
            "Source unavailable",
            format!("Document #{document_id} is not in the document list."),
        );
        return Vec::new();
    }
    if state.selection.open(document_id, page, highlight) {
        vec![viewer_effect(state)]
    } else {
        Vec::new()
    }
}

fn apply_documents(state: &mut AppState, documents: Vec<Document>) -> Vec<Effect> {
    state.source_ids
        .retain(|id| documents.iter().any(|doc| doc.id == *id));
    state.source_cursor = documents
        .len()
        .checked_sub(1)
        .map(|last| state.source_cursor.unwrap_or(0).min(last));
    if let Some(pending) = state.pending_delete {
        if !documents.iter().any(|doc| doc.id == pending) {
            state.pending_delete = None;
        }
    }
    state.documents = documents;
    state.mark_dirty();

    match state.selection.document_id() {
        Some(id) if state.document(id).is_none() => {
            state.selection.clear();
            state.viewer = ViewerStatus::Idle;
            vec![Effect::CloseViewer]
        }
        None => match state.documents.first().map(|doc| doc.id) {
            Some(first) => {
                state.selection.open(first, 1, None);
                vec![viewer_effect(state)]
            }
            None => Vec::new(),
        },
        Some(_) => Vec::new(),
    }
}

fn viewer_effect(state: &AppState) -> Effect {
    match state.selection.target() {
        Some(target) => Effect::ShowInViewer {
            document_id: target.document_id,
            page: target.page,
            highlight: target.highlight,
        },
        None => Effect::CloseViewer,
    }
}

fn persist_effect(state: &AppState) -> Effect {
    Effect::PersistUiState {
        split_ratio: state.split.ratio(),
        dark_mode: state.dark_mode,
    }
}

/// Leading words of an excerpt, short enough to sit inside one text-layer line.
fn highlight_probe(excerpt: &str) -> Option<String> {
    let mut probe = String::new();
    for word in excerpt.split_whitespace() {
        let extra = if probe.is_empty() { 0 } else { 1 };
        if !probe.is_empty() && probe.len() + extra + word.len() > HIGHLIGHT_PROBE_LEN {
            break;
        }
        if !probe.is_empty() {
            probe.push(' ');
        }
        probe.push_str(word);
    }
    (!probe.is_empty()).then_some(probe)
}
