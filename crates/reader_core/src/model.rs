pub type DocumentId = u64;

/// A document in the user's collection, as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub filename: String,
    pub has_text_layer: bool,
}

/// A pointer from an answer to a document page range and excerpt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub document_id: DocumentId,
    pub document_title: String,
    pub section: Option<String>,
    /// Human readable page range, e.g. `"s.12-13"`.
    pub pages: String,
    pub excerpt: String,
    /// Explicit marker number assigned by the backend, when it sends one.
    pub reference: Option<u64>,
}

/// Generated answer text plus the citations its markers point into.
///
/// The order of `citations` is significant: a marker `[n]` may refer to the
/// n-th citation when nothing more specific matches.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnswerResult {
    pub text: String,
    pub citations: Vec<Citation>,
}

impl AnswerResult {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.citations.is_empty()
    }
}
