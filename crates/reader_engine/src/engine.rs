use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;

use reader_logging::{reader_info, reader_warn};

use crate::client::{Backend, ClientSettings, DocumentSource, ReqwestBackend};
use crate::render::{DefaultRendererFactory, RendererFactory};
use crate::viewer::{ChannelSink, ViewerHandle, ViewerRequest, ViewerSettings};
use crate::{ApiError, AskRequest, DocumentId, EngineEvent, FailureKind, LlmSettingsUpdate};

#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    pub client: ClientSettings,
    pub viewer: ViewerSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Client(#[from] ApiError),
}

enum EngineCommand {
    RefreshDocuments,
    Ask(AskRequest),
    Upload { path: PathBuf },
    Delete { document_id: DocumentId },
    LoadSettings,
    UpdateSettings(LlmSettingsUpdate),
    Show(ViewerRequest),
    CloseViewer,
}

pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        let backend = Arc::new(ReqwestBackend::new(settings.client)?);
        reader_info!("Engine using backend at {}", backend.base_url());
        Self::with_parts(
            backend.clone(),
            backend,
            Arc::new(DefaultRendererFactory),
            settings.viewer,
        )
    }

    /// Build an engine over explicit collaborators.
    pub fn with_parts(
        backend: Arc<dyn Backend>,
        source: Arc<dyn DocumentSource>,
        factory: Arc<dyn RendererFactory>,
        viewer_settings: ViewerSettings,
    ) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("reader-engine")
            .build()?;

        thread::spawn(move || {
            let viewer = {
                let _guard = runtime.enter();
                ViewerHandle::spawn(
                    source,
                    factory,
                    Arc::new(ChannelSink::new(event_tx.clone())),
                    viewer_settings,
                )
            };
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Show(request) => viewer.show(request),
                    EngineCommand::CloseViewer => viewer.close(),
                    command => {
                        let backend = backend.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            handle_command(backend.as_ref(), command, event_tx).await;
                        });
                    }
                }
            }
            reader_info!("Engine command channel closed, shutting down");
            runtime.block_on(viewer.shutdown());
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn refresh_documents(&self) {
        self.send(EngineCommand::RefreshDocuments);
    }

    pub fn ask(&self, request: AskRequest) {
        self.send(EngineCommand::Ask(request));
    }

    pub fn upload(&self, path: impl Into<PathBuf>) {
        self.send(EngineCommand::Upload { path: path.into() });
    }

    pub fn delete(&self, document_id: DocumentId) {
        self.send(EngineCommand::Delete { document_id });
    }

    pub fn load_settings(&self) {
        self.send(EngineCommand::LoadSettings);
    }

    pub fn update_settings(&self, update: LlmSettingsUpdate) {
        self.send(EngineCommand::UpdateSettings(update));
    }

    pub fn show(&self, request: ViewerRequest) {
        self.send(EngineCommand::Show(request));
    }

    pub fn close_viewer(&self) {
        self.send(EngineCommand::CloseViewer);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            reader_warn!("Engine thread is gone; command dropped");
        }
    }
}

async fn handle_command(
    backend: &dyn Backend,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::RefreshDocuments => {
            EngineEvent::DocumentsLoaded(backend.list_documents().await)
        }
        EngineCommand::Ask(request) => EngineEvent::AnswerReady(backend.ask(&request).await),
        EngineCommand::Upload { path } => EngineEvent::UploadFinished(upload(backend, path).await),
        EngineCommand::Delete { document_id } => EngineEvent::DeleteFinished {
            document_id,
            result: backend.delete_document(document_id).await,
        },
        EngineCommand::LoadSettings => EngineEvent::SettingsLoaded(backend.settings().await),
        EngineCommand::UpdateSettings(update) => {
            EngineEvent::SettingsLoaded(backend.update_settings(&update).await)
        }
        EngineCommand::Show(_) | EngineCommand::CloseViewer => return,
    };
    let _ = event_tx.send(event);
}

async fn upload(
    backend: &dyn Backend,
    path: PathBuf,
) -> Result<crate::UploadResponse, ApiError> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ApiError::new(
                FailureKind::Io,
                format!("not a file path: {}", path.display()),
            )
        })?;
    let bytes = tokio::fs::read(&path).await.map_err(|err| {
        ApiError::new(
            FailureKind::Io,
            format!("failed to read {}: {err}", path.display()),
        )
    })?;
    reader_info!("Uploading {filename} ({} bytes)", bytes.len());
    backend.upload(&filename, bytes).await
}
