//! Remote document channel and the UI collaborators the viewer drives.

use anyhow::Result;
use epaper_ir::DocumentId;
use epaper_ir::protocol::{
    CloseRequest, FocusBinding, HintRect, LinkTarget, LoadRequest, LoadResponse, OpenRequest,
    OpenResponse,
};

/// Generation of the server protocol a channel speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelKind {
    #[default]
    Legacy,
    Epaper2,
}

impl ChannelKind {
    pub fn for_descriptor(epaper2: bool) -> Self {
        if epaper2 {
            ChannelKind::Epaper2
        } else {
            ChannelKind::Legacy
        }
    }
}

/// Request/response side of the server connection. Push messages arrive
/// separately, through [`crate::inbox::PushSender`].
#[allow(async_fn_in_trait)]
pub trait DocumentChannel {
    fn kind(&self) -> ChannelKind;

    async fn open_document(&mut self, request: &OpenRequest) -> Result<OpenResponse>;

    async fn load_document(&mut self, request: &LoadRequest) -> Result<LoadResponse>;

    async fn close_document(&mut self, request: &CloseRequest) -> Result<()>;

    async fn goto_page(&mut self, id: &DocumentId, page: u32) -> Result<()>;

    async fn resolve_link(&mut self, id: &DocumentId, x: f64, y: f64) -> Result<LinkTarget>;

    async fn fetch_hints(&mut self, id: &DocumentId) -> Result<Vec<HintRect>>;

    async fn add_document_line(&mut self, id: &DocumentId, band: usize) -> Result<LoadResponse>;

    async fn remove_document_line(&mut self, id: &DocumentId, band: usize)
    -> Result<LoadResponse>;

    /// Ping run periodically while a document of this channel is open.
    /// `None` when the channel needs no keep-alive.
    fn keep_alive(&self) -> Option<Box<dyn FnMut() + Send>> {
        None
    }
}

/// Editable-field overlay attached to the page on focus bindings.
pub trait FocusWidget {
    fn attach(&mut self, document: &DocumentId, binding: &FocusBinding);

    fn detach(&mut self);
}

/// Where failures are shown to the user.
pub trait StatusOverlay {
    fn show_error(&mut self, message: &str);

    fn clear(&mut self) {}
}

/// Focus widget that ignores bindings.
#[derive(Debug, Default)]
pub struct NoFocusWidget;

impl FocusWidget for NoFocusWidget {
    fn attach(&mut self, document: &DocumentId, binding: &FocusBinding) {
        tracing::debug!(%document, widget = ?binding.widget(), "focus binding ignored");
    }

    fn detach(&mut self) {}
}

/// Overlay that only logs.
#[derive(Debug, Default)]
pub struct LogOverlay;

impl StatusOverlay for LogOverlay {
    fn show_error(&mut self, message: &str) {
        tracing::warn!(%message, "epaper error");
    }
}
