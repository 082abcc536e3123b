use std::fmt;

use serde::{Deserialize, Serialize};

use crate::viewer::ViewerEvent;

pub type DocumentId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOut {
    pub id: DocumentId,
    pub title: String,
    pub filename: String,
    #[serde(default)]
    pub has_text_layer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationOut {
    pub document_id: DocumentId,
    #[serde(rename = "document")]
    pub document_title: String,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub pages: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceOut {
    pub chunk_id: u64,
    pub document_id: DocumentId,
    pub document_title: String,
    #[serde(default)]
    pub section_path: Option<String>,
    pub page_start: u32,
    pub page_end: u32,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub top_k: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ids: Option<Vec<DocumentId>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AskResponse {
    /// Missing or null answers decode as empty.
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub citations: Option<Vec<CitationOut>>,
    #[serde(default)]
    pub evidence: Vec<EvidenceOut>,
}

impl AskResponse {
    pub fn answer_text(&self) -> &str {
        self.answer.as_deref().unwrap_or_default()
    }

    pub fn citations(&self) -> &[CitationOut] {
        self.citations.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub document: DocumentOut,
    #[serde(default)]
    pub ingest_started: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub chat_base_url: String,
    pub chat_model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LlmSettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_api_key: Option<String>,
}

impl LlmSettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.chat_base_url.is_none() && self.chat_model.is_none() && self.chat_api_key.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    DocumentsLoaded(Result<Vec<DocumentOut>, ApiError>),
    AnswerReady(Result<AskResponse, ApiError>),
    UploadFinished(Result<UploadResponse, ApiError>),
    DeleteFinished {
        document_id: DocumentId,
        result: Result<(), ApiError>,
    },
    SettingsLoaded(Result<LlmSettings, ApiError>),
    Viewer(ViewerEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Io,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
