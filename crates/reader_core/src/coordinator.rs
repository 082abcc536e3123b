use crate::DocumentId;

/// What the document pane should show: one document at one page.
///
/// `page` is never 0. Writes are last-write-wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerSelection {
    document_id: Option<DocumentId>,
    page: u32,
    highlight: Option<String>,
}

impl Default for ViewerSelection {
    fn default() -> Self {
        Self {
            document_id: None,
            page: 1,
            highlight: None,
        }
    }
}

/// A selection that has a document, ready to hand to the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerTarget {
    pub document_id: DocumentId,
    pub page: u32,
    pub highlight: Option<String>,
}

impl ViewerSelection {
    pub fn document_id(&self) -> Option<DocumentId> {
        self.document_id
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn highlight(&self) -> Option<&str> {
        self.highlight.as_deref()
    }

    /// Open `document_id` at `page`. Returns true if the selection changed.
    pub fn open(&mut self, document_id: DocumentId, page: u32, highlight: Option<String>) -> bool {
        let highlight = highlight.filter(|text| !text.trim().is_empty());
        let next = Self {
            document_id: Some(document_id),
            page: page.max(1),
            highlight,
        };
        if *self == next {
            return false;
        }
        *self = next;
        true
    }

    /// Move to `page` within the current document, dropping any highlight.
    pub fn set_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        if self.document_id.is_none() || (self.page == page && self.highlight.is_none()) {
            return false;
        }
        self.page = page;
        self.highlight = None;
        true
    }

    /// Record the page the viewer actually settled on, without re-targeting it.
    pub(crate) fn sync_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn clear(&mut self) -> bool {
        if self.document_id.is_none() {
            return false;
        }
        *self = Self::default();
        true
    }

    pub fn target(&self) -> Option<ViewerTarget> {
        self.document_id.map(|document_id| ViewerTarget {
            document_id,
            page: self.page,
            highlight: self.highlight.clone(),
        })
    }
}
