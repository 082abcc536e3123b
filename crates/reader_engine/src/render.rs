//! Facade over a stateful document rendering engine.
use std::collections::BTreeSet;

use crate::decode::{decode_text, DecodeError};

const PDF_MAGIC: &[u8] = b"%PDF-";
/// Plain-text documents break pages on form feed.
const PAGE_BREAK: char = '\u{000C}';

/// One element of a page's text layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub index: usize,
    pub text: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("document has no pages")]
    Empty,
    #[error("unsupported document: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("no document loaded")]
    NotLoaded,
    #[error("renderer failed: {0}")]
    Engine(String),
}

/// A rendering engine bound to one viewer surface.
///
/// The text layer of a page is populated some time after the page is shown;
/// `rendered_text_nodes` returns `None` until then.
pub trait DocumentRenderer: Send {
    /// Parse `bytes`, returning the page count.
    fn load(&mut self, bytes: &[u8]) -> Result<u32, RenderError>;
    /// Show `page` (1-based), clamped to the document; returns the page shown.
    fn goto_page(&mut self, page: u32) -> Result<u32, RenderError>;
    fn rendered_text_nodes(&self, page: u32) -> Option<Vec<TextNode>>;
    /// Release everything held for the current document.
    fn dispose(&mut self);
}

pub trait RendererFactory: Send + Sync {
    fn create(&self) -> Box<dyn DocumentRenderer>;
}

/// Picks a renderer from the document's leading bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRendererFactory;

impl RendererFactory for DefaultRendererFactory {
    fn create(&self) -> Box<dyn DocumentRenderer> {
        Box::new(SniffingRenderer::default())
    }
}

#[derive(Default)]
struct SniffingRenderer {
    inner: Option<Box<dyn DocumentRenderer>>,
}

impl DocumentRenderer for SniffingRenderer {
    fn load(&mut self, bytes: &[u8]) -> Result<u32, RenderError> {
        self.dispose();
        let mut inner = renderer_for(bytes)?;
        let pages = inner.load(bytes)?;
        self.inner = Some(inner);
        Ok(pages)
    }

    fn goto_page(&mut self, page: u32) -> Result<u32, RenderError> {
        self.inner
            .as_mut()
            .ok_or(RenderError::NotLoaded)?
            .goto_page(page)
    }

    fn rendered_text_nodes(&self, page: u32) -> Option<Vec<TextNode>> {
        self.inner.as_ref()?.rendered_text_nodes(page)
    }

    fn dispose(&mut self) {
        if let Some(mut inner) = self.inner.take() {
            inner.dispose();
        }
    }
}

#[cfg(feature = "pdf")]
fn renderer_for(bytes: &[u8]) -> Result<Box<dyn DocumentRenderer>, RenderError> {
    if bytes.starts_with(PDF_MAGIC) {
        Ok(Box::new(crate::mupdf_render::MupdfRenderer::default()))
    } else {
        Ok(Box::new(PlainTextRenderer::default()))
    }
}

#[cfg(not(feature = "pdf"))]
fn renderer_for(bytes: &[u8]) -> Result<Box<dyn DocumentRenderer>, RenderError> {
    if bytes.starts_with(PDF_MAGIC) {
        Err(RenderError::Unsupported(
            "PDF rendering needs the `pdf` feature".to_string(),
        ))
    } else {
        Ok(Box::new(PlainTextRenderer::default()))
    }
}

/// Pages of text lines kept in memory, shared by the concrete renderers.
#[derive(Debug, Default)]
pub(crate) struct PageStore {
    pages: Vec<Vec<String>>,
    current: Option<u32>,
    rendered: BTreeSet<u32>,
}

impl PageStore {
    pub(crate) fn replace(&mut self, pages: Vec<Vec<String>>) -> Result<u32, RenderError> {
        self.clear();
        if pages.is_empty() {
            return Err(RenderError::Empty);
        }
        let count = u32::try_from(pages.len())
            .map_err(|_| RenderError::Engine("too many pages".to_string()))?;
        self.pages = pages;
        Ok(count)
    }

    pub(crate) fn show(&mut self, page: u32) -> Result<u32, RenderError> {
        let count = self.pages.len() as u32;
        if count == 0 {
            return Err(RenderError::NotLoaded);
        }
        let page = page.clamp(1, count);
        self.current = Some(page);
        self.rendered.insert(page);
        Ok(page)
    }

    pub(crate) fn nodes(&self, page: u32) -> Option<Vec<TextNode>> {
        if !self.rendered.contains(&page) {
            return None;
        }
        let lines = self.pages.get(page.checked_sub(1)? as usize)?;
        Some(
            lines
                .iter()
                .enumerate()
                .map(|(index, text)| TextNode {
                    index,
                    text: text.clone(),
                })
                .collect(),
        )
    }

    pub(crate) fn clear(&mut self) {
        self.pages.clear();
        self.current = None;
        self.rendered.clear();
    }
}

/// Renders text documents; pages are separated by form feeds.
#[derive(Debug, Default)]
pub struct PlainTextRenderer {
    store: PageStore,
}

impl DocumentRenderer for PlainTextRenderer {
    fn load(&mut self, bytes: &[u8]) -> Result<u32, RenderError> {
        let decoded = decode_text(bytes)?;
        if decoded.text.trim().is_empty() {
            self.store.clear();
            return Err(RenderError::Empty);
        }
        let pages = decoded
            .text
            .split(PAGE_BREAK)
            .map(|page| {
                page.lines()
                    .map(str::trim_end)
                    .filter(|line| !line.is_empty())
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .collect();
        self.store.replace(pages)
    }

    fn goto_page(&mut self, page: u32) -> Result<u32, RenderError> {
        self.store.show(page)
    }

    fn rendered_text_nodes(&self, page: u32) -> Option<Vec<TextNode>> {
        self.store.nodes(page)
    }

    fn dispose(&mut self) {
        self.store.clear();
    }
}

/// Indices of nodes whose text contains `needle`.
pub fn matching_nodes(nodes: &[TextNode], needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    nodes
        .iter()
        .filter(|node| node.text.contains(needle))
        .map(|node| node.index)
        .collect()
}
