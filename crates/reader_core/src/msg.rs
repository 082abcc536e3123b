use crate::{AnswerResult, Document, DocumentId, PaneBounds, PageView};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Host is up; kick off the initial loads.
    Started,
    /// Restore persisted layout preferences.
    RestoreUiState { split_ratio: f32, dark_mode: bool },
    /// User edited the question input.
    QuestionChanged(String),
    /// User picked one of the suggested questions.
    SuggestionChosen(usize),
    /// User submitted the current question.
    AskSubmitted,
    /// User opened the upload path prompt.
    UploadPromptOpened,
    UploadPathChanged(String),
    UploadSubmitted,
    UploadCancelled,
    /// User asked for a fresh document list.
    RefreshRequested,
    /// Move the source list cursor by `delta` rows.
    SourceCursorMoved { delta: isize },
    /// Include/exclude a document from the search scope.
    SourceToggled(DocumentId),
    /// User chose to show a document from the source list.
    ShowDocumentClicked(DocumentId),
    /// User asked to delete a document; waits for confirmation.
    DeleteRequested(DocumentId),
    DeleteConfirmed,
    DeleteCancelled,
    /// User clicked the marker at this position in the answer's segments.
    CitationClicked(usize),
    /// Move keyboard focus across resolved markers.
    CitationFocusMoved { delta: isize },
    /// Open the focused marker, as if clicked.
    FocusedCitationActivated,
    /// Step the viewer page within the current document.
    PageStepped { delta: i32 },
    /// Pointer pressed on the pane divider.
    DividerPressed,
    /// Pointer moved while the pointer is captured.
    PointerMoved { x: f32, bounds: PaneBounds },
    /// Pointer released anywhere.
    PointerReleased,
    /// Keyboard resize of the split, in percentage points.
    SplitNudged(f32),
    ThemeToggled,
    NotificationDismissed,
    /// Backend returned the document list.
    DocumentsLoaded(Result<Vec<Document>, String>),
    /// Backend answered the question in flight.
    AnswerReceived(Result<AnswerResult, String>),
    UploadFinished(Result<Document, String>),
    DeleteFinished {
        document_id: DocumentId,
        result: Result<(), String>,
    },
    /// Backend reported the configured chat model.
    BackendSettingsLoaded(Result<String, String>),
    ViewerLoading { document_id: DocumentId },
    ViewerPageShown { document_id: DocumentId, page: PageView },
    ViewerHighlighted {
        document_id: DocumentId,
        page: u32,
        nodes: Vec<usize>,
    },
    ViewerFailed { document_id: DocumentId, message: String },
    /// UI/render tick.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
