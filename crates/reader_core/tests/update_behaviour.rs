use std::sync::Once;

use pretty_assertions::assert_eq;
use reader_core::{
    update, AnswerResult, AppState, Citation, Document, Effect, InputMode, Msg, PageView,
    ViewerPaneView,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(reader_logging::initialize_for_tests);
}

fn doc(id: u64, title: &str) -> Document {
    Document {
        id,
        title: title.to_string(),
        filename: format!("{title}.pdf"),
        has_text_layer: true,
    }
}

fn citation(document_id: u64, pages: &str, excerpt: &str) -> Citation {
    Citation {
        document_id,
        document_title: format!("Doc {document_id}"),
        section: None,
        pages: pages.to_string(),
        excerpt: excerpt.to_string(),
        reference: None,
    }
}

fn loaded(documents: Vec<Document>) -> AppState {
    update(AppState::new(), Msg::DocumentsLoaded(Ok(documents))).0
}

fn ask(state: AppState, question: &str) -> (AppState, Vec<Effect>) {
    let (state, _) = update(state, Msg::QuestionChanged(question.to_string()));
    update(state, Msg::AskSubmitted)
}

fn answered(state: AppState, text: &str, citations: Vec<Citation>) -> AppState {
    let (state, _) = ask(state, "question");
    update(
        state,
        Msg::AnswerReceived(Ok(AnswerResult {
            text: text.to_string(),
            citations,
        })),
    )
    .0
}

fn page(page: u32, page_count: u32) -> PageView {
    PageView {
        page,
        page_count,
        lines: vec![format!("page {page}")],
        highlighted: Vec::new(),
    }
}

#[test]
fn started_requests_documents_and_settings() {
    init_logging();
    let (_, effects) = update(AppState::new(), Msg::Started);
    assert_eq!(
        effects,
        vec![Effect::RefreshDocuments, Effect::LoadBackendSettings]
    );
}

#[test]
fn first_document_is_selected_when_list_arrives() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::DocumentsLoaded(Ok(vec![doc(5, "Treaties"), doc(2, "Armies")])),
    );

    assert_eq!(state.selection().document_id(), Some(5));
    assert_eq!(state.selection().page(), 1);
    assert_eq!(
        effects,
        vec![Effect::ShowInViewer {
            document_id: 5,
            page: 1,
            highlight: None,
        }]
    );
    assert_eq!(state.view().viewer, ViewerPaneView::Loading);
}

#[test]
fn empty_list_keeps_placeholder() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::DocumentsLoaded(Ok(Vec::new())));
    assert!(effects.is_empty());
    assert_eq!(state.view().viewer, ViewerPaneView::Placeholder);
}

#[test]
fn ask_clears_previous_answer_before_request() {
    init_logging();
    let state = answered(loaded(vec![doc(1, "A")]), "Old [1]", vec![citation(1, "s.2", "x")]);
    assert_eq!(state.segments().len(), 2);

    let (state, effects) = ask(state, "What is peace?");
    assert!(state.answer().is_empty());
    assert!(state.segments().is_empty());
    assert!(state.view().asking);
    assert_eq!(
        effects,
        vec![Effect::Ask {
            question: "What is peace?".to_string(),
            top_k: 8,
            source_ids: None,
        }]
    );
}

#[test]
fn ask_is_ignored_while_in_flight_or_blank() {
    init_logging();
    let (state, effects) = ask(AppState::new(), "   ");
    assert!(effects.is_empty());

    let (state, _) = ask(state, "first");
    let (_state, effects) = ask(state, "second");
    assert!(effects.is_empty());
}

#[test]
fn ask_scopes_to_selected_sources() {
    init_logging();
    let state = loaded(vec![doc(1, "A"), doc(2, "B"), doc(3, "C")]);
    let (state, _) = update(state, Msg::SourceToggled(3));
    let (state, _) = update(state, Msg::SourceToggled(1));
    let (state, _) = update(state, Msg::SourceToggled(42));
    assert_eq!(state.view().scoped_count, 2);

    let (_state, effects) = ask(state.with_top_k(4), "war");
    assert_eq!(
        effects,
        vec![Effect::Ask {
            question: "war".to_string(),
            top_k: 4,
            source_ids: Some(vec![3, 1]),
        }]
    );
}

#[test]
fn failed_answer_resets_asking_and_notifies() {
    init_logging();
    let (state, _) = ask(AppState::new(), "q");
    let (state, effects) = update(state, Msg::AnswerReceived(Err("http status 500".into())));

    assert!(effects.is_empty());
    let view = state.view();
    assert!(!view.asking);
    assert_eq!(
        view.notification.map(|n| n.message),
        Some("http status 500".to_string())
    );

    let (state, _) = update(state, Msg::NotificationDismissed);
    assert!(state.view().notification.is_none());
}

#[test]
fn suggestion_sets_question_and_asks() {
    init_logging();
    let state = AppState::new().with_suggestions(vec!["Why wage war?".to_string()]);
    let (state, effects) = update(state, Msg::SuggestionChosen(0));
    assert_eq!(state.view().question, "Why wage war?");
    assert_eq!(effects.len(), 1);

    let (_, effects) = update(AppState::new(), Msg::SuggestionChosen(3));
    assert!(effects.is_empty());
}

#[test]
fn citation_click_writes_document_and_first_page() {
    init_logging();
    let state = loaded(vec![doc(7, "Seven"), doc(9, "Nine")]);
    let state = answered(
        state,
        "Armies march [2].",
        vec![
            citation(7, "s.1", "first"),
            citation(9, "s.12-13", "The janissary corps was disbanded in 1826"),
        ],
    );

    let (state, effects) = update(state, Msg::CitationClicked(1));
    assert_eq!(state.selection().document_id(), Some(9));
    assert_eq!(state.selection().page(), 12);
    assert_eq!(
        effects,
        vec![Effect::ShowInViewer {
            document_id: 9,
            page: 12,
            highlight: Some("The janissary corps was disbanded in".to_string()),
        }]
    );
    assert_eq!(state.view().focused_segment, Some(1));
}

#[test]
fn clicking_plain_or_unresolved_segments_does_nothing() {
    init_logging();
    let state = answered(loaded(vec![doc(1, "A")]), "Text [8]", Vec::new());
    let before = state.selection().clone();

    let (state, effects) = update(state, Msg::CitationClicked(0));
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::CitationClicked(1));
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::CitationClicked(99));
    assert!(effects.is_empty());
    assert_eq!(state.selection(), &before);
}

#[test]
fn citation_to_unknown_document_notifies_instead_of_selecting() {
    init_logging();
    let state = answered(loaded(vec![doc(1, "A")]), "[1]", vec![citation(77, "s.3", "x")]);
    let (state, effects) = update(state, Msg::CitationClicked(0));
    assert!(effects.is_empty());
    assert_eq!(state.selection().document_id(), Some(1));
    assert!(state.view().notification.is_some());
}

#[test]
fn focus_cycles_over_resolved_markers_only() {
    init_logging();
    let state = answered(
        loaded(vec![doc(1, "A"), doc(2, "B")]),
        "a [1] b [9] c [2]",
        vec![citation(1, "s.1", "x"), citation(2, "s.4", "y")],
    );
    let (state, _) = update(state, Msg::CitationFocusMoved { delta: 1 });
    assert_eq!(state.view().focused_segment, Some(1));
    let (state, _) = update(state, Msg::CitationFocusMoved { delta: 1 });
    assert_eq!(state.view().focused_segment, Some(5));
    let (state, _) = update(state, Msg::CitationFocusMoved { delta: 1 });
    assert_eq!(state.view().focused_segment, Some(1));
    let (state, _) = update(state, Msg::CitationFocusMoved { delta: -1 });
    assert_eq!(state.view().focused_segment, Some(5));

    let (state, effects) = update(state, Msg::FocusedCitationActivated);
    assert_eq!(state.selection().document_id(), Some(2));
    assert_eq!(state.selection().page(), 4);
    assert_eq!(effects.len(), 1);
}

#[test]
fn source_show_opens_page_one_last_write_wins() {
    init_logging();
    let state = answered(
        loaded(vec![doc(1, "A"), doc(2, "B")]),
        "[1]",
        vec![citation(2, "s.30", "x")],
    );
    let (state, _) = update(state, Msg::CitationClicked(0));
    assert_eq!(state.selection().page(), 30);

    let (state, effects) = update(state, Msg::ShowDocumentClicked(2));
    assert_eq!(state.selection().document_id(), Some(2));
    assert_eq!(state.selection().page(), 1);
    assert_eq!(
        effects,
        vec![Effect::ShowInViewer {
            document_id: 2,
            page: 1,
            highlight: None,
        }]
    );

    // Showing what is already shown changes nothing.
    let (_, effects) = update(state, Msg::ShowDocumentClicked(2));
    assert!(effects.is_empty());
}

#[test]
fn page_steps_stay_within_known_page_count() {
    init_logging();
    let state = loaded(vec![doc(1, "A")]);
    let (state, effects) = update(state, Msg::PageStepped { delta: -1 });
    assert!(effects.is_empty());

    let (state, _) = update(
        state,
        Msg::ViewerPageShown {
            document_id: 1,
            page: page(1, 3),
        },
    );
    let (state, effects) = update(state, Msg::PageStepped { delta: 5 });
    assert_eq!(state.selection().page(), 3);
    assert_eq!(
        effects,
        vec![Effect::ShowInViewer {
            document_id: 1,
            page: 3,
            highlight: None,
        }]
    );
}

#[test]
fn viewer_messages_for_other_documents_are_ignored() {
    init_logging();
    let state = loaded(vec![doc(1, "A"), doc(2, "B")]);
    let (state, _) = update(state, Msg::ShowDocumentClicked(2));

    let (mut state, _) = update(
        state,
        Msg::ViewerPageShown {
            document_id: 1,
            page: page(1, 9),
        },
    );
    state.consume_dirty();
    assert_eq!(state.view().viewer, ViewerPaneView::Loading);

    let (mut state, _) = update(
        state,
        Msg::ViewerFailed {
            document_id: 1,
            message: "gone".into(),
        },
    );
    assert!(!state.consume_dirty());

    let (state, _) = update(
        state,
        Msg::ViewerPageShown {
            document_id: 2,
            page: page(1, 2),
        },
    );
    assert_eq!(state.view().viewer, ViewerPaneView::Page(page(1, 2)));
}

#[test]
fn viewer_clamped_page_is_synced_and_highlights_apply() {
    init_logging();
    let state = answered(loaded(vec![doc(1, "A")]), "[1]", vec![citation(1, "s.40", "x")]);
    let (state, _) = update(state, Msg::CitationClicked(0));
    let (state, _) = update(
        state,
        Msg::ViewerPageShown {
            document_id: 1,
            page: page(12, 12),
        },
    );
    assert_eq!(state.selection().page(), 12);

    let (state, _) = update(
        state,
        Msg::ViewerHighlighted {
            document_id: 1,
            page: 11,
            nodes: vec![0],
        },
    );
    let (state, _) = update(
        state,
        Msg::ViewerHighlighted {
            document_id: 1,
            page: 12,
            nodes: vec![0],
        },
    );
    match state.view().viewer {
        ViewerPaneView::Page(view) => assert_eq!(view.highlighted, vec![0]),
        other => panic!("unexpected viewer state {other:?}"),
    }
}

#[test]
fn viewer_failure_degrades_to_unavailable() {
    init_logging();
    let state = loaded(vec![doc(1, "A")]);
    let (state, _) = update(
        state,
        Msg::ViewerFailed {
            document_id: 1,
            message: "network error".into(),
        },
    );
    assert_eq!(
        state.view().viewer,
        ViewerPaneView::Unavailable {
            message: "network error".into()
        }
    );
    assert!(state.view().notification.is_none());
}

#[test]
fn delete_requires_confirmation_and_clears_selection() {
    init_logging();
    let state = loaded(vec![doc(1, "A"), doc(2, "B")]);
    let (state, _) = update(state, Msg::SourceToggled(1));
    let (state, effects) = update(state, Msg::DeleteRequested(1));
    assert!(effects.is_empty());
    assert_eq!(state.view().pending_delete, Some("A".to_string()));

    let (state, effects) = update(state, Msg::DeleteConfirmed);
    assert_eq!(effects, vec![Effect::DeleteDocument { document_id: 1 }]);

    let (state, effects) = update(
        state,
        Msg::DeleteFinished {
            document_id: 1,
            result: Ok(()),
        },
    );
    assert_eq!(effects, vec![Effect::RefreshDocuments, Effect::CloseViewer]);
    assert_eq!(state.selection().document_id(), None);
    assert_eq!(state.view().scoped_count, 0);

    let (state, effects) = update(state, Msg::DocumentsLoaded(Ok(vec![doc(2, "B")])));
    assert_eq!(state.selection().document_id(), Some(2));
    assert_eq!(effects.len(), 1);
}

#[test]
fn delete_cancel_and_failure() {
    init_logging();
    let state = loaded(vec![doc(1, "A")]);
    let (state, _) = update(state, Msg::DeleteRequested(1));
    let (state, _) = update(state, Msg::DeleteCancelled);
    let (state, effects) = update(state, Msg::DeleteConfirmed);
    assert!(effects.is_empty());

    let (state, effects) = update(
        state,
        Msg::DeleteFinished {
            document_id: 1,
            result: Err("http status 404".into()),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.selection().document_id(), Some(1));
    assert!(state.view().notification.is_some());
}

#[test]
fn refreshed_list_without_selected_document_closes_viewer() {
    init_logging();
    let state = loaded(vec![doc(1, "A"), doc(2, "B")]);
    let (state, _) = update(state, Msg::ShowDocumentClicked(2));
    let (state, effects) = update(state, Msg::DocumentsLoaded(Ok(vec![doc(1, "A")])));
    assert_eq!(effects, vec![Effect::CloseViewer]);
    assert_eq!(state.selection().document_id(), None);
}

#[test]
fn upload_prompt_flow() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::UploadPromptOpened);
    assert_eq!(state.view().input_mode, InputMode::UploadPath);

    let (state, effects) = update(state, Msg::UploadSubmitted);
    assert!(effects.is_empty());

    let (state, _) = update(state, Msg::UploadPathChanged(" /tmp/a.pdf ".into()));
    let (state, effects) = update(state, Msg::UploadSubmitted);
    assert_eq!(
        effects,
        vec![Effect::Upload {
            path: "/tmp/a.pdf".into()
        }]
    );
    let view = state.view();
    assert!(view.uploading);
    assert_eq!(view.input_mode, InputMode::Question);

    let (state, effects) = update(state, Msg::UploadFinished(Err("only PDF".into())));
    assert!(effects.is_empty());
    assert!(!state.view().uploading);

    let (_, effects) = update(state, Msg::UploadFinished(Ok(doc(3, "C"))));
    assert_eq!(effects, vec![Effect::RefreshDocuments]);
}

#[test]
fn source_cursor_stays_in_range() {
    init_logging();
    let state = loaded(vec![doc(1, "A"), doc(2, "B")]);
    let (state, _) = update(state, Msg::SourceCursorMoved { delta: 5 });
    assert!(state.view().sources[1].cursor);
    let (state, _) = update(state, Msg::SourceCursorMoved { delta: -9 });
    assert!(state.view().sources[0].cursor);
}

#[test]
fn theme_toggle_persists() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::ThemeToggled);
    assert!(state.view().dark_mode);
    assert_eq!(
        effects,
        vec![Effect::PersistUiState {
            split_ratio: 50.0,
            dark_mode: true,
        }]
    );
}
