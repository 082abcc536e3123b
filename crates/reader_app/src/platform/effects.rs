use std::path::PathBuf;

use reader_core::{AnswerResult, Citation, Document, Effect, Msg, PageView};
use reader_engine::{
    ApiError, AskRequest, AskResponse, CitationOut, DocumentOut, EngineEvent, EngineHandle,
    LlmSettingsUpdate, ViewerEvent, ViewerRequest,
};
use reader_logging::{reader_debug, reader_info, reader_warn};

use super::persistence::{save_ui_state, UiState};

/// Executes core effects through the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    state_dir: PathBuf,
    /// Pushed instead of a plain settings read the first time settings load.
    llm_update: Option<LlmSettingsUpdate>,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        state_dir: PathBuf,
        llm_update: Option<LlmSettingsUpdate>,
    ) -> Self {
        Self {
            engine,
            state_dir,
            llm_update,
        }
    }

    pub fn run(&mut self, effect: Effect) {
        match effect {
            Effect::RefreshDocuments => self.engine.refresh_documents(),
            Effect::LoadBackendSettings => match self.llm_update.take() {
                Some(update) => {
                    reader_info!("Pushing LLM settings overrides to the backend");
                    self.engine.update_settings(update);
                }
                None => self.engine.load_settings(),
            },
            Effect::Ask {
                question,
                top_k,
                source_ids,
            } => {
                reader_info!(
                    "Ask question_len={} top_k={} scoped={}",
                    question.len(),
                    top_k,
                    source_ids.as_ref().map_or(0, Vec::len)
                );
                self.engine.ask(AskRequest {
                    question,
                    top_k,
                    source_ids,
                });
            }
            Effect::Upload { path } => {
                reader_info!("Upload path={}", path);
                self.engine.upload(path);
            }
            Effect::DeleteDocument { document_id } => {
                reader_info!("Delete document_id={}", document_id);
                self.engine.delete(document_id);
            }
            Effect::ShowInViewer {
                document_id,
                page,
                highlight,
            } => {
                reader_debug!("Show document_id={} page={}", document_id, page);
                self.engine.show(ViewerRequest {
                    document_id,
                    page,
                    highlight,
                });
            }
            Effect::CloseViewer => self.engine.close_viewer(),
            Effect::PersistUiState {
                split_ratio,
                dark_mode,
            } => save_ui_state(
                &self.state_dir,
                UiState {
                    split_ratio,
                    dark_mode,
                },
            ),
            // Pointer routing belongs to the event loop.
            Effect::AcquirePointer | Effect::ReleasePointer => {}
        }
    }

    /// Drain pending engine events as messages.
    pub fn poll(&self) -> Vec<Msg> {
        let mut msgs = Vec::new();
        while let Some(event) = self.engine.try_recv() {
            if let Some(msg) = map_event(event) {
                msgs.push(msg);
            }
        }
        msgs
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::DocumentsLoaded(result) => Msg::DocumentsLoaded(
            result
                .map(|docs| docs.into_iter().map(document).collect())
                .map_err(describe("Document list")),
        ),
        EngineEvent::AnswerReady(result) => {
            Msg::AnswerReceived(result.map(answer).map_err(describe("Question")))
        }
        EngineEvent::UploadFinished(result) => Msg::UploadFinished(
            result
                .map(|response| document(response.document))
                .map_err(describe("Upload")),
        ),
        EngineEvent::DeleteFinished {
            document_id,
            result,
        } => Msg::DeleteFinished {
            document_id,
            result: result.map_err(describe("Delete")),
        },
        EngineEvent::SettingsLoaded(result) => Msg::BackendSettingsLoaded(
            result
                .map(|settings| settings.chat_model)
                .map_err(describe("Settings")),
        ),
        EngineEvent::Viewer(event) => match event {
            ViewerEvent::Loading { document_id } => Msg::ViewerLoading { document_id },
            ViewerEvent::PageShown(frame) => Msg::ViewerPageShown {
                document_id: frame.document_id,
                page: PageView {
                    page: frame.page,
                    page_count: frame.page_count,
                    lines: frame.nodes.into_iter().map(|node| node.text).collect(),
                    highlighted: Vec::new(),
                },
            },
            ViewerEvent::Highlighted {
                document_id,
                page,
                nodes,
            } => Msg::ViewerHighlighted {
                document_id,
                page,
                nodes,
            },
            ViewerEvent::Failed { document_id, error } => Msg::ViewerFailed {
                document_id,
                message: error,
            },
            ViewerEvent::Closed => return None,
        },
    };
    Some(msg)
}

fn describe(action: &'static str) -> impl Fn(ApiError) -> String {
    move |err| {
        reader_warn!("{} failed: {}", action, err);
        err.to_string()
    }
}

fn document(doc: DocumentOut) -> Document {
    Document {
        id: doc.id,
        title: doc.title,
        filename: doc.filename,
        has_text_layer: doc.has_text_layer,
    }
}

fn citation(out: &CitationOut) -> Citation {
    Citation {
        document_id: out.document_id,
        document_title: out.document_title.clone(),
        section: out.section.clone(),
        pages: out.pages.clone(),
        excerpt: out.excerpt.clone(),
        reference: out.reference,
    }
}

fn answer(response: AskResponse) -> AnswerResult {
    AnswerResult {
        text: response.answer_text().to_string(),
        citations: response.citations().iter().map(citation).collect(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use reader_engine::{FailureKind, PageFrame, TextNode};

    use super::*;

    #[test]
    fn answer_keeps_citation_order_and_refs() {
        let response: AskResponse = serde_json::from_value(serde_json::json!({
            "answer": "See [2].",
            "citations": [
                {"ref": 2, "document_id": 5, "document": "Letters", "pages": "7", "excerpt": "x"},
                {"document_id": 6, "document": "Diary", "pages": "1-2", "excerpt": "y"}
            ]
        }))
        .unwrap();
        let msg = map_event(EngineEvent::AnswerReady(Ok(response))).unwrap();
        let Msg::AnswerReceived(Ok(answer)) = msg else {
            panic!("unexpected {msg:?}");
        };
        assert_eq!(answer.text, "See [2].");
        assert_eq!(answer.citations[0].reference, Some(2));
        assert_eq!(answer.citations[1].document_title, "Diary");
        assert_eq!(answer.citations[1].reference, None);
    }

    #[test]
    fn failures_become_notification_text() {
        let err = ApiError::new(FailureKind::HttpStatus(400), "Only PDF files are supported.");
        let msg = map_event(EngineEvent::UploadFinished(Err(err))).unwrap();
        assert_eq!(
            msg,
            Msg::UploadFinished(Err(
                "http status 400: Only PDF files are supported.".to_string()
            ))
        );
    }

    #[test]
    fn page_frames_become_page_views() {
        let msg = map_event(EngineEvent::Viewer(ViewerEvent::PageShown(PageFrame {
            document_id: 3,
            page: 2,
            page_count: 9,
            nodes: vec![TextNode {
                index: 0,
                text: "heading".into(),
            }],
        })))
        .unwrap();
        assert_eq!(
            msg,
            Msg::ViewerPageShown {
                document_id: 3,
                page: PageView {
                    page: 2,
                    page_count: 9,
                    lines: vec!["heading".into()],
                    highlighted: Vec::new(),
                },
            }
        );
        assert_eq!(map_event(EngineEvent::Viewer(ViewerEvent::Closed)), None);
    }
}
