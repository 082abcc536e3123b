use crate::view_model::{
    AppViewModel, InputMode, Notification, PageView, SourceRowView, ViewerPaneView,
};
use crate::{
    resolve_citations, AnswerResult, Document, DocumentId, Segment, SplitState, ViewerSelection,
};

pub const DEFAULT_TOP_K: u32 = 8;

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) enum ViewerStatus {
    #[default]
    Idle,
    Loading {
        document_id: DocumentId,
    },
    Ready {
        document_id: DocumentId,
        page: PageView,
    },
    Failed {
        document_id: DocumentId,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub(crate) documents: Vec<Document>,
    pub(crate) source_ids: Vec<DocumentId>,
    pub(crate) source_cursor: Option<usize>,
    pub(crate) suggestions: Vec<String>,
    pub(crate) top_k: u32,
    pub(crate) input_mode: InputMode,
    pub(crate) question: String,
    pub(crate) upload_path: String,
    pub(crate) asking: bool,
    pub(crate) uploading: bool,
    answer: AnswerResult,
    segments: Vec<Segment>,
    pub(crate) focused_segment: Option<usize>,
    pub(crate) selection: ViewerSelection,
    pub(crate) viewer: ViewerStatus,
    pub(crate) split: SplitState,
    pub(crate) pending_delete: Option<DocumentId>,
    pub(crate) notification: Option<Notification>,
    pub(crate) backend_model: Option<String>,
    pub(crate) dark_mode: bool,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            documents: Vec::new(),
            source_ids: Vec::new(),
            source_cursor: None,
            suggestions: Vec::new(),
            top_k: DEFAULT_TOP_K,
            input_mode: InputMode::Question,
            question: String::new(),
            upload_path: String::new(),
            asking: false,
            uploading: false,
            answer: AnswerResult::default(),
            segments: Vec::new(),
            focused_segment: None,
            selection: ViewerSelection::default(),
            viewer: ViewerStatus::Idle,
            split: SplitState::default(),
            pending_delete: None,
            notification: None,
            backend_model: None,
            dark_mode: false,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn selection(&self) -> &ViewerSelection {
        &self.selection
    }

    pub fn split(&self) -> &SplitState {
        &self.split
    }

    pub fn answer(&self) -> &AnswerResult {
        &self.answer
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn view(&self) -> AppViewModel {
        let showing = self.selection.document_id();
        let sources = self
            .documents
            .iter()
            .enumerate()
            .map(|(index, doc)| SourceRowView {
                id: doc.id,
                title: doc.title.clone(),
                has_text_layer: doc.has_text_layer,
                in_scope: self.source_ids.contains(&doc.id),
                showing: showing == Some(doc.id),
                cursor: self.source_cursor == Some(index),
            })
            .collect();

        let viewer = match (&self.viewer, showing) {
            (_, None) => ViewerPaneView::Placeholder,
            (ViewerStatus::Ready { document_id, page }, Some(id)) if *document_id == id => {
                ViewerPaneView::Page(page.clone())
            }
            (ViewerStatus::Failed { document_id, message }, Some(id)) if *document_id == id => {
                ViewerPaneView::Unavailable {
                    message: message.clone(),
                }
            }
            _ => ViewerPaneView::Loading,
        };

        AppViewModel {
            sources,
            scoped_count: self.source_ids.len(),
            suggestions: self.suggestions.clone(),
            input_mode: self.input_mode,
            question: self.question.clone(),
            upload_path: self.upload_path.clone(),
            asking: self.asking,
            uploading: self.uploading,
            segments: self.segments.clone(),
            focused_segment: self.focused_segment,
            viewer_title: showing.and_then(|id| self.document(id)).map(|d| d.title.clone()),
            viewer_page: self.selection.page(),
            viewer,
            split_ratio: self.split.ratio(),
            dragging: self.split.is_dragging(),
            text_selection_suppressed: self.split.text_selection_suppressed(),
            notification: self.notification.clone(),
            pending_delete: self
                .pending_delete
                .and_then(|id| self.document(id))
                .map(|d| d.title.clone()),
            backend_model: self.backend_model.clone(),
            dark_mode: self.dark_mode,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    /// Drop the previous answer before a new request goes out.
    pub(crate) fn clear_answer(&mut self) {
        self.answer = AnswerResult::default();
        self.segments.clear();
        self.focused_segment = None;
    }

    pub(crate) fn set_answer(&mut self, answer: AnswerResult) {
        self.segments = resolve_citations(&answer.text, &answer.citations);
        self.answer = answer;
        self.focused_segment = None;
    }

    pub(crate) fn notify(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.notification = Some(Notification {
            title: title.into(),
            message: message.into(),
        });
    }

    /// Positions of resolved markers in `segments`, in order.
    pub(crate) fn cited_positions(&self) -> Vec<usize> {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| segment.as_cited().is_some())
            .map(|(index, _)| index)
            .collect()
    }

    /// Page count of the shown document, once the viewer has reported it.
    pub(crate) fn known_page_count(&self) -> Option<u32> {
        match &self.viewer {
            ViewerStatus::Ready { document_id, page }
                if Some(*document_id) == self.selection.document_id() =>
            {
                Some(page.page_count)
            }
            _ => None,
        }
    }
}
