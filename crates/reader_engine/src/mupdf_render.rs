use mupdf::text_page::TextBlockType;
use mupdf::{Document, TextPageFlags};
use reader_logging::reader_warn;

use crate::render::{DocumentRenderer, PageStore, RenderError, TextNode};

/// PDF renderer backed by MuPDF.
///
/// MuPDF handles are not `Send`, so the text of every page is extracted at
/// load time and the document is dropped before `load` returns.
#[derive(Debug, Default)]
pub struct MupdfRenderer {
    store: PageStore,
}

impl DocumentRenderer for MupdfRenderer {
    fn load(&mut self, bytes: &[u8]) -> Result<u32, RenderError> {
        let doc = Document::from_bytes(bytes, "application/pdf")
            .map_err(|err| RenderError::Engine(err.to_string()))?;
        let page_count = doc
            .page_count()
            .map_err(|err| RenderError::Engine(err.to_string()))?;

        let mut pages = Vec::with_capacity(page_count.max(0) as usize);
        for page_num in 0..page_count {
            let lines = match doc.load_page(page_num) {
                Ok(page) => page_lines(&page),
                Err(err) => {
                    reader_warn!("Skipping unreadable PDF page {}: {err}", page_num + 1);
                    Vec::new()
                }
            };
            pages.push(lines);
        }
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

fn page_lines(page: &mupdf::Page) -> Vec<String> {
    let Ok(text_page) = page.to_text_page(TextPageFlags::empty()) else {
        return Vec::new();
    };
    let mut lines = Vec::new();
    for block in text_page.blocks() {
        if block.r#type() != TextBlockType::Text {
            continue;
        }
        for line in block.lines() {
            let text: String = line.chars().filter_map(|ch| ch.char()).collect();
            if !text.trim().is_empty() {
                lines.push(text);
            }
        }
    }
    lines
}
