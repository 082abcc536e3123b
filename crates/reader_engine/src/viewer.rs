//! Embedded document viewer.
//!
//! One actor task owns the viewer surface. Fetching, renderer construction and
//! text-layer scans run as side tasks that report back over the actor's own
//! channel; every result is tagged so the actor can drop work that a later
//! request superseded. Each loaded document gets a [`CancellationToken`], and
//! each page scan a child of it, so tearing a document down stops its fetch
//! and its scans together.
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reader_logging::{reader_debug, reader_info, reader_warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::client::DocumentSource;
use crate::render::{matching_nodes, DocumentRenderer, RenderError, RendererFactory, TextNode};
use crate::{DocumentId, EngineEvent};

#[derive(Debug, Clone)]
pub struct ViewerSettings {
    /// Minimum wait after a page is shown before looking for highlight matches.
    pub settle_delay: Duration,
    pub poll_interval: Duration,
    /// How long to keep polling for a text layer before giving up.
    pub highlight_deadline: Duration,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(100),
            highlight_deadline: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerRequest {
    pub document_id: DocumentId,
    pub page: u32,
    pub highlight: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFrame {
    pub document_id: DocumentId,
    pub page: u32,
    pub page_count: u32,
    pub nodes: Vec<TextNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    Loading { document_id: DocumentId },
    PageShown(PageFrame),
    Highlighted {
        document_id: DocumentId,
        page: u32,
        nodes: Vec<usize>,
    },
    Failed { document_id: DocumentId, error: String },
    Closed,
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: ViewerEvent);
}

/// Forwards viewer events into the engine's event channel.
pub struct ChannelSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ViewerEvent) {
        let _ = self.tx.send(EngineEvent::Viewer(event));
    }
}

enum ViewerCommand {
    Show(ViewerRequest),
    Close,
    Shutdown,
}

/// Handle to a running viewer actor. Dropping it tears the viewer down.
pub struct ViewerHandle {
    tx: mpsc::UnboundedSender<ViewerCommand>,
    task: JoinHandle<()>,
}

impl ViewerHandle {
    /// Start the actor on the current tokio runtime.
    pub fn spawn(
        source: Arc<dyn DocumentSource>,
        factory: Arc<dyn RendererFactory>,
        sink: Arc<dyn EventSink>,
        settings: ViewerSettings,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let actor = ViewerActor {
            source,
            factory,
            sink,
            settings,
            phase: Phase::Uninitialized,
            generation: 0,
            scan: 0,
            doc_token: None,
            scan_token: None,
            done_tx,
        };
        let task = tokio::spawn(actor.run(rx, done_rx));
        Self { tx, task }
    }

    pub fn show(&self, request: ViewerRequest) {
        let _ = self.tx.send(ViewerCommand::Show(request));
    }

    pub fn close(&self) {
        let _ = self.tx.send(ViewerCommand::Close);
    }

    /// Tear down and wait for the actor to exit.
    pub async fn shutdown(self) {
        let _ = self.tx.send(ViewerCommand::Shutdown);
        let _ = self.task.await;
    }
}

type SharedRenderer = Arc<Mutex<Box<dyn DocumentRenderer>>>;

enum Phase {
    Uninitialized,
    Loading {
        document_id: DocumentId,
        pending: ViewerRequest,
    },
    Ready {
        document_id: DocumentId,
        renderer: SharedRenderer,
        page_count: u32,
    },
    TornDown,
}

enum Completion {
    Loaded {
        generation: u64,
        document_id: DocumentId,
        result: Result<(Box<dyn DocumentRenderer>, u32), String>,
    },
    TextLayer {
        scan: u64,
        frame: PageFrame,
    },
    Highlight {
        scan: u64,
        document_id: DocumentId,
        page: u32,
        nodes: Vec<usize>,
    },
}

struct ViewerActor {
    source: Arc<dyn DocumentSource>,
    factory: Arc<dyn RendererFactory>,
    sink: Arc<dyn EventSink>,
    settings: ViewerSettings,
    phase: Phase,
    generation: u64,
    scan: u64,
    doc_token: Option<CancellationToken>,
    scan_token: Option<CancellationToken>,
    done_tx: mpsc::UnboundedSender<Completion>,
}

impl ViewerActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<ViewerCommand>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(ViewerCommand::Show(request)) => self.show(request),
                    Some(ViewerCommand::Close) => {
                        self.teardown();
                        self.phase = Phase::Uninitialized;
                        self.sink.emit(ViewerEvent::Closed);
                    }
                    Some(ViewerCommand::Shutdown) | None => break,
                },
                Some(done) = completions.recv() => self.complete(done),
            }
        }
        self.teardown();
        self.phase = Phase::TornDown;
        reader_debug!("Viewer actor stopped");
    }

    fn show(&mut self, request: ViewerRequest) {
        match &mut self.phase {
            Phase::Loading {
                document_id,
                pending,
            } if *document_id == request.document_id => {
                *pending = request;
            }
            Phase::Ready { document_id, .. } if *document_id == request.document_id => {
                self.show_page(request);
            }
            _ => self.start_load(request),
        }
    }

    fn start_load(&mut self, request: ViewerRequest) {
        self.teardown();
        self.generation += 1;
        let generation = self.generation;
        let document_id = request.document_id;
        let token = CancellationToken::new();
        self.doc_token = Some(token.clone());
        self.phase = Phase::Loading {
            document_id,
            pending: request,
        };
        reader_info!("Viewer loading document {document_id} (generation {generation})");
        self.sink.emit(ViewerEvent::Loading { document_id });

        let source = self.source.clone();
        let factory = self.factory.clone();
        let done_tx = self.done_tx.clone();
        tokio::spawn(async move {
            let Some(result) = load_document(source, factory, document_id, &token).await else {
                return;
            };
            let _ = done_tx.send(Completion::Loaded {
                generation,
                document_id,
                result,
            });
        });
    }

    fn complete(&mut self, done: Completion) {
        match done {
            Completion::Loaded {
                generation,
                document_id,
                result,
            } => {
                if generation != self.generation {
                    if let Ok((mut renderer, _)) = result {
                        renderer.dispose();
                    }
                    reader_debug!("Dropping stale load of document {document_id}");
                    return;
                }
                let pending = match &self.phase {
                    Phase::Loading { pending, .. } => pending.clone(),
                    _ => return,
                };
                match result {
                    Ok((renderer, page_count)) => {
                        self.phase = Phase::Ready {
                            document_id,
                            renderer: Arc::new(Mutex::new(renderer)),
                            page_count,
                        };
                        self.show_page(pending);
                    }
                    Err(error) => self.fail(document_id, error),
                }
            }
            Completion::TextLayer { scan, frame } => {
                if scan == self.scan && self.is_ready_for(frame.document_id) {
                    self.sink.emit(ViewerEvent::PageShown(frame));
                }
            }
            Completion::Highlight {
                scan,
                document_id,
                page,
                nodes,
            } => {
                if scan == self.scan && self.is_ready_for(document_id) {
                    self.sink.emit(ViewerEvent::Highlighted {
                        document_id,
                        page,
                        nodes,
                    });
                }
            }
        }
    }

    fn show_page(&mut self, request: ViewerRequest) {
        let Phase::Ready {
            document_id,
            renderer,
            page_count,
        } = &self.phase
        else {
            return;
        };
        let (document_id, renderer, page_count) = (*document_id, renderer.clone(), *page_count);
        let shown = match goto_page(&renderer, request.page) {
            Ok(page) => page,
            Err(err) => {
                self.fail(document_id, err.to_string());
                return;
            }
        };

        if let Some(previous) = self.scan_token.take() {
            previous.cancel();
        }
        let Some(doc_token) = &self.doc_token else {
            return;
        };
        let token = doc_token.child_token();
        self.scan_token = Some(token.clone());
        self.scan += 1;

        let scan = ScanJob {
            scan: self.scan,
            document_id,
            page: shown,
            page_count,
            highlight: request.highlight.filter(|text| !text.trim().is_empty()),
            renderer,
            settings: self.settings.clone(),
            token,
            done_tx: self.done_tx.clone(),
        };
        tokio::spawn(scan.run());
    }

    fn fail(&mut self, document_id: DocumentId, error: String) {
        reader_warn!("Viewer failed for document {document_id}: {error}");
        self.teardown();
        self.phase = Phase::Uninitialized;
        self.sink.emit(ViewerEvent::Failed { document_id, error });
    }

    fn is_ready_for(&self, id: DocumentId) -> bool {
        matches!(&self.phase, Phase::Ready { document_id, .. } if *document_id == id)
    }

    /// Cancel in-flight work and release the current renderer.
    fn teardown(&mut self) {
        if let Some(token) = self.scan_token.take() {
            token.cancel();
        }
        if let Some(token) = self.doc_token.take() {
            token.cancel();
        }
        if let Phase::Ready { renderer, .. } = &self.phase {
            match renderer.lock() {
                Ok(mut renderer) => renderer.dispose(),
                Err(poisoned) => poisoned.into_inner().dispose(),
            }
        }
        if !matches!(self.phase, Phase::TornDown) {
            self.phase = Phase::Uninitialized;
        }
    }
}

/// Fetch and parse a document; `None` once the load has been cancelled.
async fn load_document(
    source: Arc<dyn DocumentSource>,
    factory: Arc<dyn RendererFactory>,
    document_id: DocumentId,
    token: &CancellationToken,
) -> Option<Result<(Box<dyn DocumentRenderer>, u32), String>> {
    let fetched = tokio::select! {
        _ = token.cancelled() => return None,
        fetched = source.fetch_document(document_id) => fetched,
    };
    if token.is_cancelled() {
        return None;
    }
    let bytes = match fetched {
        Ok(bytes) => bytes,
        Err(err) => return Some(Err(err.to_string())),
    };

    let built = tokio::task::spawn_blocking(move || {
        let mut renderer = factory.create();
        match renderer.load(&bytes) {
            Ok(page_count) => Ok((renderer, page_count)),
            Err(err) => {
                renderer.dispose();
                Err(err)
            }
        }
    })
    .await;

    let result = match built {
        Ok(Ok(loaded)) => Ok(loaded),
        Ok(Err(err)) => Err(err.to_string()),
        Err(join_err) => Err(format!("renderer task failed: {join_err}")),
    };
    if token.is_cancelled() {
        if let Ok((mut renderer, _)) = result {
            renderer.dispose();
        }
        return None;
    }
    Some(result)
}

fn goto_page(renderer: &SharedRenderer, page: u32) -> Result<u32, RenderError> {
    renderer
        .lock()
        .map_err(|_| RenderError::Engine("renderer lock poisoned".to_string()))?
        .goto_page(page)
}

fn read_nodes(renderer: &SharedRenderer, page: u32) -> Option<Vec<TextNode>> {
    renderer.lock().ok()?.rendered_text_nodes(page)
}

struct ScanJob {
    scan: u64,
    document_id: DocumentId,
    page: u32,
    page_count: u32,
    highlight: Option<String>,
    renderer: SharedRenderer,
    settings: ViewerSettings,
    token: CancellationToken,
    done_tx: mpsc::UnboundedSender<Completion>,
}

impl ScanJob {
    async fn run(self) {
        let started = Instant::now();
        let nodes = self
            .wait_for_text_layer(started + self.settings.highlight_deadline)
            .await;
        if self.token.is_cancelled() {
            return;
        }
        let _ = self.done_tx.send(Completion::TextLayer {
            scan: self.scan,
            frame: PageFrame {
                document_id: self.document_id,
                page: self.page,
                page_count: self.page_count,
                nodes: nodes.unwrap_or_default(),
            },
        });

        let Some(needle) = self.highlight.as_deref() else {
            return;
        };
        let settled = started + self.settings.settle_delay;
        tokio::select! {
            _ = self.token.cancelled() => return,
            _ = sleep_until(settled) => {}
        }
        let Some(nodes) = self
            .wait_for_text_layer(settled + self.settings.highlight_deadline)
            .await
        else {
            reader_debug!(
                "No text layer for document {} page {}",
                self.document_id,
                self.page
            );
            return;
        };
        let matched = matching_nodes(&nodes, needle);
        if matched.is_empty() || self.token.is_cancelled() {
            return;
        }
        let _ = self.done_tx.send(Completion::Highlight {
            scan: self.scan,
            document_id: self.document_id,
            page: self.page,
            nodes: matched,
        });
    }

    async fn wait_for_text_layer(&self, deadline: Instant) -> Option<Vec<TextNode>> {
        loop {
            if self.token.is_cancelled() {
                return None;
            }
            if let Some(nodes) = read_nodes(&self.renderer, self.page) {
                return Some(nodes);
            }
            if Instant::now() >= deadline {
                return None;
            }
            tokio::select! {
                _ = self.token.cancelled() => return None,
                _ = sleep(self.settings.poll_interval) => {}
            }
        }
    }
}
