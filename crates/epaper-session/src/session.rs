//! One open remote document in the navigation stack.

use epaper_config::ViewerConfig;
use epaper_ir::page::Page;
use epaper_ir::protocol::OpenedDocument;
use epaper_ir::{Chapter, DocumentDescriptor, DocumentId};
use epaper_scene::{BandHover, RenderedPage};

use crate::channel::ChannelKind;

/// Local identity of a session, stable for its whole life. Server ids change
/// when a chapter is reopened; keys never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(pub(crate) u64);

impl SessionKey {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Open request in flight; no server id yet.
    Opening,
    /// Server document open and its push handler registered.
    Loaded,
    /// Topmost, visible session.
    Active,
    /// Covered by a drill-down.
    Background,
    Closed,
}

/// Server id and page extent of a freshly opened document.
#[derive(Debug, Clone, PartialEq)]
pub struct Opened {
    pub id: DocumentId,
    pub width: f64,
    pub height: f64,
}

impl Opened {
    /// Apply page-size fallbacks to an open response.
    pub fn from_document(document: OpenedDocument, viewer: &ViewerConfig) -> Self {
        let width = document
            .width
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(viewer.default_page_width);
        let height = match document.height {
            Some(h) if h.is_finite() && h >= 0.0 => h,
            Some(_) => viewer.fallback_page_height,
            None => viewer.default_page_height,
        };
        Self {
            id: document.id,
            width,
            height,
        }
    }
}

#[derive(Debug)]
pub struct DocumentSession {
    pub(crate) key: SessionKey,
    pub(crate) state: SessionState,
    pub(crate) channel: ChannelKind,
    pub descriptor: DocumentDescriptor,
    pub chapter_index: usize,
    /// Page within the current chapter, 1-based.
    pub chapter_page: u32,
    pub server_id: Option<DocumentId>,
    pub width: f64,
    pub height: f64,
    pub last_page: Option<Page>,
    pub rendered: Option<RenderedPage>,
    pub hover: BandHover,
}

impl DocumentSession {
    pub(crate) fn new(
        key: SessionKey,
        descriptor: DocumentDescriptor,
        channel: ChannelKind,
        viewer: &ViewerConfig,
    ) -> Self {
        Self {
            key,
            state: SessionState::Opening,
            channel,
            descriptor,
            chapter_index: 0,
            chapter_page: 1,
            server_id: None,
            width: viewer.default_page_width,
            height: viewer.default_page_height,
            last_page: None,
            rendered: None,
            hover: BandHover::new(),
        }
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn channel(&self) -> ChannelKind {
        self.channel
    }

    pub fn chapter(&self) -> Option<&Chapter> {
        self.descriptor.chapters.get(self.chapter_index)
    }

    pub fn chapter_count(&self) -> usize {
        self.descriptor.chapters.len()
    }

    pub fn editable(&self) -> bool {
        self.chapter().is_some_and(|chapter| chapter.editable)
    }

    pub fn title(&self) -> &str {
        &self.descriptor.title
    }

    /// 1-based page number across all chapters.
    pub fn page_number(&self) -> u32 {
        self.descriptor
            .chapters
            .iter()
            .take(self.chapter_index)
            .fold(self.chapter_page, |page, chapter| {
                page.saturating_add(chapter.page_count)
            })
    }

    pub fn total_page_count(&self) -> u32 {
        self.descriptor.total_page_count()
    }

    pub(crate) fn apply_opened(&mut self, opened: Opened) {
        self.server_id = Some(opened.id);
        self.width = opened.width;
        self.height = opened.height;
        self.state = SessionState::Loaded;
    }
}
