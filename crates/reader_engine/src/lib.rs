//! Reader engine: backend client, document viewer and effect execution.
mod client;
mod decode;
mod engine;
#[cfg(feature = "pdf")]
mod mupdf_render;
mod render;
mod types;
mod viewer;

pub use client::{
    normalize_api_base, Backend, ClientSettings, DocumentSource, ReqwestBackend, DEFAULT_API_BASE,
};
pub use decode::{decode_text, DecodeError, DecodedText};
pub use engine::{EngineError, EngineHandle, EngineSettings};
#[cfg(feature = "pdf")]
pub use mupdf_render::MupdfRenderer;
pub use render::{
    matching_nodes, DefaultRendererFactory, DocumentRenderer, PlainTextRenderer, RenderError,
    RendererFactory, TextNode,
};
pub use types::{
    ApiError, AskRequest, AskResponse, CitationOut, DocumentId, DocumentOut, EngineEvent,
    EvidenceOut, FailureKind, LlmSettings, LlmSettingsUpdate, UploadResponse,
};
pub use viewer::{
    ChannelSink, EventSink, PageFrame, ViewerEvent, ViewerHandle, ViewerRequest, ViewerSettings,
};
