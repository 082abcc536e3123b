use crate::DocumentId;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    RefreshDocuments,
    LoadBackendSettings,
    Ask {
        question: String,
        top_k: u32,
        /// `None` searches every document.
        source_ids: Option<Vec<DocumentId>>,
    },
    Upload {
        path: String,
    },
    DeleteDocument {
        document_id: DocumentId,
    },
    /// Point the document viewer at a document and page.
    ShowInViewer {
        document_id: DocumentId,
        page: u32,
        highlight: Option<String>,
    },
    /// Tear down the document viewer; nothing is selected.
    CloseViewer,
    /// Start routing pointer move/release events to the split controller.
    AcquirePointer,
    /// Stop routing pointer events; the drag is over.
    ReleasePointer,
    PersistUiState {
        split_ratio: f32,
        dark_mode: bool,
    },
}
