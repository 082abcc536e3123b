use crate::{DocumentId, Segment};

/// Text of one rendered page as the viewer reported it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageView {
    pub page: u32,
    pub page_count: u32,
    /// Text layer nodes in reading order.
    pub lines: Vec<String>,
    /// Indices into `lines` marked by the last highlight scan.
    pub highlighted: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewerPaneView {
    /// Nothing selected.
    #[default]
    Placeholder,
    Loading,
    Page(PageView),
    /// Load failed; the pane stays empty.
    Unavailable { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Question,
    UploadPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRowView {
    pub id: DocumentId,
    pub title: String,
    pub has_text_layer: bool,
    /// Included in the search scope.
    pub in_scope: bool,
    /// Currently shown in the viewer.
    pub showing: bool,
    pub cursor: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub sources: Vec<SourceRowView>,
    pub scoped_count: usize,
    pub suggestions: Vec<String>,
    pub input_mode: InputMode,
    pub question: String,
    pub upload_path: String,
    pub asking: bool,
    pub uploading: bool,
    pub segments: Vec<Segment>,
    /// Index into `segments` of the keyboard-focused marker.
    pub focused_segment: Option<usize>,
    pub viewer_title: Option<String>,
    pub viewer_page: u32,
    pub viewer: ViewerPaneView,
    pub split_ratio: f32,
    pub dragging: bool,
    pub text_selection_suppressed: bool,
    pub notification: Option<Notification>,
    /// Title of the document awaiting delete confirmation.
    pub pending_delete: Option<String>,
    pub backend_model: Option<String>,
    pub dark_mode: bool,
    pub dirty: bool,
}
