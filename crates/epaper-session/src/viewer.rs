//! Epaper viewer: drives the session stack against the remote channels and
//! renders what the server pushes.
//!
//! # Usage
//!
//! ```ignore
//! let mut viewer = EpaperViewer::new(EpaperConfig::load()).with_channel(socket);
//! let push = viewer.push_sender(); // handed to the transport task
//! viewer.open(descriptor).await?;
//! // ... later, on the UI tick:
//! viewer.pump();
//! ```

use std::collections::HashMap;

use epaper_config::EpaperConfig;
use epaper_ir::protocol::{CloseRequest, LoadRequest};
use epaper_ir::{DocumentDescriptor, DocumentId};
use epaper_scene::{HoverChange, NodeId, RenderOptions, RuleList, SceneRenderer, StyleSheet};
use tracing::{debug, info, warn};

use crate::channel::{
    ChannelKind, DocumentChannel, FocusWidget, LogOverlay, NoFocusWidget, StatusOverlay,
};
use crate::error::SessionError;
use crate::inbox::{PushInbox, PushSender};
use crate::keepalive::KeepAlive;
use crate::link;
use crate::router::{DispatchOutcome, ProtocolRouter};
use crate::session::{DocumentSession, Opened, SessionKey};
use crate::stack::{OpenCompletion, PendingOpen, SessionStack};

/// Zoom factor applied per zoom step.
const ZOOM_IN_STEP: f64 = 1.2;
const ZOOM_OUT_STEP: f64 = 0.8;

/// Hover result of a pointer move over the visible page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerUpdate {
    pub change: HoverChange,
    /// Vertical anchor for the add/remove line menu, on editable documents.
    pub line_menu_y: Option<f64>,
}

pub struct EpaperViewer<C, S = RuleList> {
    config: EpaperConfig,
    channels: HashMap<ChannelKind, C>,
    stack: SessionStack,
    router: ProtocolRouter,
    renderer: SceneRenderer<S>,
    inbox: PushInbox,
    keep_alive: KeepAlive,
    focus: Box<dyn FocusWidget>,
    overlay: Box<dyn StatusOverlay>,
    zoom: f64,
}

impl<C: DocumentChannel> EpaperViewer<C, RuleList> {
    pub fn new(config: EpaperConfig) -> Self {
        let renderer = SceneRenderer::new(RuleList::new(), RenderOptions::from(&config.render));
        Self::with_renderer(config, renderer)
    }
}

impl<C: DocumentChannel, S: StyleSheet> EpaperViewer<C, S> {
    pub fn with_renderer(config: EpaperConfig, renderer: SceneRenderer<S>) -> Self {
        Self {
            stack: SessionStack::new(config.session.max_depth, config.viewer.clone()),
            keep_alive: KeepAlive::from_secs(config.session.keep_alive_secs),
            config,
            channels: HashMap::new(),
            router: ProtocolRouter::new(),
            renderer,
            inbox: PushInbox::new(),
            focus: Box::new(NoFocusWidget),
            overlay: Box::new(LogOverlay),
            zoom: 1.0,
        }
    }

    /// Add a channel, replacing any previous channel of the same kind.
    pub fn with_channel(mut self, channel: C) -> Self {
        self.channels.insert(channel.kind(), channel);
        self
    }

    pub fn with_focus_widget(mut self, focus: Box<dyn FocusWidget>) -> Self {
        self.focus = focus;
        self
    }

    pub fn with_status_overlay(mut self, overlay: Box<dyn StatusOverlay>) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn config(&self) -> &EpaperConfig {
        &self.config
    }

    pub fn stack(&self) -> &SessionStack {
        &self.stack
    }

    pub fn router(&self) -> &ProtocolRouter {
        &self.router
    }

    pub fn renderer(&self) -> &SceneRenderer<S> {
        &self.renderer
    }

    pub fn channel_ref(&self, kind: ChannelKind) -> Option<&C> {
        self.channels.get(&kind)
    }

    pub fn top(&self) -> Option<&DocumentSession> {
        self.stack.top()
    }

    /// Sender for the transport to queue push messages with.
    pub fn push_sender(&self) -> PushSender {
        self.inbox.sender()
    }

    // ---------------------------------------------------------------------
    // Stack lifecycle
    // ---------------------------------------------------------------------

    /// Open `descriptor` as the new root document, closing everything open.
    pub async fn open(&mut self, descriptor: DocumentDescriptor) -> Result<SessionKey, SessionError> {
        let descriptor = descriptor.normalized(&self.config.session.default_locale);
        let kind = ChannelKind::for_descriptor(descriptor.epaper2);
        self.channel(kind)?;

        let (pending, cleared) = match self.stack.begin_open(descriptor, kind, &mut self.router) {
            Ok(begun) => begun,
            Err(err) => {
                self.report(&err);
                return Err(err);
            }
        };
        self.focus.detach();
        self.close_sessions(cleared).await;
        self.finish_open(pending).await
    }

    /// Open `descriptor` on top of the current document.
    pub async fn push(&mut self, descriptor: DocumentDescriptor) -> Result<SessionKey, SessionError> {
        let descriptor = descriptor.normalized(&self.config.session.default_locale);
        let kind = ChannelKind::for_descriptor(descriptor.epaper2);
        self.channel(kind)?;

        let pending = self.stack.begin_push(descriptor, kind)?;
        self.focus.detach();
        self.finish_open(pending).await
    }

    /// Close every document at or above `index`. Returns the closed keys,
    /// top first.
    pub async fn pop(&mut self, index: usize) -> Vec<SessionKey> {
        let closed = self.stack.pop_to(index, &mut self.router);
        if !closed.is_empty() {
            self.focus.detach();
        }
        let keys = closed.iter().map(DocumentSession::key).collect();
        self.close_sessions(closed).await;
        self.stop_keep_alive_if_idle();
        keys
    }

    pub async fn close_all(&mut self) -> Vec<SessionKey> {
        self.pop(0).await
    }

    async fn finish_open(&mut self, pending: PendingOpen) -> Result<SessionKey, SessionError> {
        let result = self.request_open(&pending).await;
        match self.stack.complete_open(pending.key, result, &mut self.router) {
            Ok(OpenCompletion::Loaded { key, server_id, .. }) => {
                self.restart_keep_alive(pending.channel);
                let request = self.load_request(key, &server_id, 0, 1)?;
                match self.request_load(pending.channel, &request).await {
                    Ok(()) => {
                        self.stack.activate(key)?;
                        info!(?key, depth = self.stack.len(), "document active");
                        Ok(key)
                    }
                    Err(err) => {
                        if let Some(session) = self.stack.abort_open(key, &mut self.router) {
                            self.close_sessions(vec![session]).await;
                        }
                        self.stop_keep_alive_if_idle();
                        self.report(&err);
                        Err(err)
                    }
                }
            }
            Ok(OpenCompletion::Stale { key, server_id }) => {
                if let Some(id) = server_id {
                    self.close_remote(pending.channel, id).await;
                }
                self.stop_keep_alive_if_idle();
                Err(SessionError::Stale(key))
            }
            Err(err) => {
                self.stop_keep_alive_if_idle();
                self.report(&err);
                Err(err)
            }
        }
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    /// Follow the link under `node` of the visible page, clicked at
    /// (`x`, `y`). `Ok(None)` when the node is not part of a link.
    pub async fn follow_link(
        &mut self,
        node: NodeId,
        x: f64,
        y: f64,
    ) -> Result<Option<SessionKey>, SessionError> {
        let top = self.stack.top().ok_or(SessionError::NoDocument)?;
        let Some(rendered) = &top.rendered else {
            return Ok(None);
        };
        let Some(link_text) = rendered.roles.link_at(&rendered.tree, node) else {
            return Ok(None);
        };
        let link_text = link_text.to_string();
        let server_id = top.server_id.clone().ok_or(SessionError::NoDocument)?;
        let kind = top.channel();
        debug!(%link_text, x, y, "following link");

        let target = match self.channel(kind)?.resolve_link(&server_id, x, y).await {
            Ok(target) => target,
            Err(err) => {
                let err = SessionError::from(err);
                self.report(&err);
                return Err(err);
            }
        };
        let top = self.stack.top().ok_or(SessionError::NoDocument)?;
        let descriptor = link::push_descriptor(&target, top, &link_text)?;
        self.push(descriptor).await.map(Some)
    }

    /// Show chapter `index` of the visible document at `page`.
    ///
    /// A chapter with the same template and locale as the current one, and
    /// not flagged `close_previous`, is only reloaded. Anything else opens a
    /// new server document and closes the old one.
    pub async fn goto_chapter(&mut self, index: usize, page: u32) -> Result<(), SessionError> {
        let top = self.stack.top().ok_or(SessionError::NoDocument)?;
        let target = top
            .descriptor
            .chapters
            .get(index)
            .ok_or(SessionError::NoChapter(index))?;
        let reuse = !target.close_previous
            && top.server_id.is_some()
            && top.chapter().is_some_and(|current| current.same_identity(target));
        let key = top.key();
        let kind = top.channel();
        let page = page.max(1);

        if reuse {
            let server_id = top.server_id.clone().ok_or(SessionError::NoDocument)?;
            let request = self.load_request(key, &server_id, index, page)?;
            if let Err(err) = self.request_load(kind, &request).await {
                self.report(&err);
                return Err(err);
            }
            if let Some(session) = self.stack.get_mut(key) {
                session.chapter_index = index;
                session.chapter_page = page;
            }
            debug!(?key, chapter = index, page, "chapter reloaded in place");
            return Ok(());
        }

        let pending = self.stack.begin_reopen(key, index)?;
        let result = self.request_open(&pending).await;
        match self.stack.complete_reopen(&pending, result, &mut self.router) {
            Ok(OpenCompletion::Loaded {
                server_id,
                previous,
                ..
            }) => {
                if let Some(previous) = previous {
                    self.close_remote(kind, previous).await;
                }
                self.restart_keep_alive(kind);
                let request = self.load_request(key, &server_id, index, page)?;
                if let Err(err) = self.request_load(kind, &request).await {
                    self.report(&err);
                    return Err(err);
                }
                if let Some(session) = self.stack.get_mut(key) {
                    session.chapter_page = page;
                }
                if self.stack.top().is_some_and(|top| top.key() == key) {
                    self.stack.activate(key)?;
                }
                Ok(())
            }
            Ok(OpenCompletion::Stale { key, server_id }) => {
                if let Some(id) = server_id {
                    self.close_remote(kind, id).await;
                }
                Err(SessionError::Stale(key))
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Show the 1-based global page `page_number` of the visible document.
    pub async fn goto_page(&mut self, page_number: u32) -> Result<(), SessionError> {
        let top = self.stack.top().ok_or(SessionError::NoDocument)?;
        let (chapter, page) = top
            .descriptor
            .locate_page(page_number)
            .ok_or(SessionError::PageOutOfRange(page_number))?;

        if chapter != top.chapter_index {
            return self.goto_chapter(chapter, page).await;
        }
        if top.chapter_page == page {
            return Ok(());
        }
        let server_id = top.server_id.clone().ok_or(SessionError::NoDocument)?;
        let kind = top.channel();
        if let Err(err) = self.channel(kind)?.goto_page(&server_id, page).await {
            let err = SessionError::from(err);
            self.report(&err);
            return Err(err);
        }
        if let Some(top) = self.stack.top_mut() {
            top.chapter_page = page;
        }
        Ok(())
    }

    /// Advance one page; `false` on the last page.
    pub async fn next_page(&mut self) -> Result<bool, SessionError> {
        let top = self.stack.top().ok_or(SessionError::NoDocument)?;
        let current = top.page_number();
        if current >= top.total_page_count() {
            return Ok(false);
        }
        self.goto_page(current + 1).await.map(|_| true)
    }

    /// Go back one page; `false` on the first page.
    pub async fn previous_page(&mut self) -> Result<bool, SessionError> {
        let top = self.stack.top().ok_or(SessionError::NoDocument)?;
        let current = top.page_number();
        if current <= 1 {
            return Ok(false);
        }
        self.goto_page(current - 1).await.map(|_| true)
    }

    // ---------------------------------------------------------------------
    // Zoom
    // ---------------------------------------------------------------------

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn zoom_in(&mut self) -> f64 {
        if self.zoom < self.config.viewer.max_zoom {
            self.zoom *= ZOOM_IN_STEP;
        }
        self.zoom
    }

    pub fn zoom_out(&mut self) -> f64 {
        if self.zoom > self.config.viewer.min_zoom {
            self.zoom *= ZOOM_OUT_STEP;
        }
        self.zoom
    }

    /// On-screen size of the visible page.
    pub fn page_size(&self) -> Option<(f64, f64)> {
        self.stack
            .top()
            .map(|top| (top.width * self.zoom, top.height * self.zoom))
    }

    // ---------------------------------------------------------------------
    // Push messages and rendering
    // ---------------------------------------------------------------------

    /// Apply every queued push message in arrival order.
    pub fn pump(&mut self) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::new();
        for envelope in self.inbox.drain() {
            match self.handle_push(&envelope.document, &envelope.message) {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    warn!(document = %envelope.document, %err, "push message failed");
                    self.report(&err);
                }
            }
        }
        outcomes
    }

    pub fn handle_push(
        &mut self,
        document: &DocumentId,
        message: &str,
    ) -> Result<DispatchOutcome, SessionError> {
        self.router.dispatch(
            document,
            message,
            &mut self.stack,
            &mut self.renderer,
            self.focus.as_mut(),
        )
    }

    /// Render the last page of `key` again, e.g. when its tab is hovered.
    pub fn render_session(&mut self, key: SessionKey) -> Result<(), SessionError> {
        let session = self
            .stack
            .get_mut(key)
            .ok_or(SessionError::UnknownSession(key))?;
        let Some(page) = &session.last_page else {
            return Ok(());
        };
        let rendered = self.renderer.render_page(page)?;
        session.rendered = Some(rendered);
        session.hover.reset();
        Ok(())
    }

    /// Fetch tooltip hints for the visible page and lay them over it.
    /// Returns the number of hints.
    pub async fn refresh_hints(&mut self) -> Result<usize, SessionError> {
        let top = self.stack.top().ok_or(SessionError::NoDocument)?;
        let server_id = top.server_id.clone().ok_or(SessionError::NoDocument)?;
        let kind = top.channel();
        let hints = self.channel(kind)?.fetch_hints(&server_id).await?;

        if let Some(rendered) = self
            .stack
            .top_mut()
            .and_then(|top| top.rendered.as_mut())
        {
            self.renderer.render_tooltips(rendered, &hints);
        }
        Ok(hints.len())
    }

    /// Track the detail band under pointer `y` (page coordinates).
    pub fn pointer_moved(&mut self, y: f64) -> PointerUpdate {
        let Some(top) = self.stack.top_mut() else {
            return PointerUpdate::default();
        };
        let editable = top.editable();
        let Some(rendered) = top.rendered.as_mut() else {
            return PointerUpdate::default();
        };
        let change = top
            .hover
            .pointer_moved(&rendered.band_index, &mut rendered.tree, y);
        PointerUpdate {
            change,
            line_menu_y: change
                .entered
                .filter(|_| editable)
                .map(|entry| entry.midpoint()),
        }
    }

    // ---------------------------------------------------------------------
    // Editing
    // ---------------------------------------------------------------------

    /// Ask the server to add a line after detail band `band`.
    pub async fn add_line(&mut self, band: usize) -> Result<(), SessionError> {
        let (server_id, kind) = self.editable_band(band)?;
        let response = self.channel(kind)?.add_document_line(&server_id, band).await?;
        response.into_result().map_err(SessionError::from)
    }

    /// Ask the server to remove detail band `band`.
    pub async fn remove_line(&mut self, band: usize) -> Result<(), SessionError> {
        let (server_id, kind) = self.editable_band(band)?;
        let response = self
            .channel(kind)?
            .remove_document_line(&server_id, band)
            .await?;
        response.into_result().map_err(SessionError::from)
    }

    fn editable_band(&self, band: usize) -> Result<(DocumentId, ChannelKind), SessionError> {
        let top = self.stack.top().ok_or(SessionError::NoDocument)?;
        if !top.editable() {
            return Err(SessionError::NotEditable);
        }
        let known = top
            .rendered
            .as_ref()
            .is_some_and(|rendered| rendered.band_index.by_source_index(band).is_some());
        if !known {
            return Err(SessionError::UnknownBand(band));
        }
        let server_id = top.server_id.clone().ok_or(SessionError::NoDocument)?;
        Ok((server_id, top.channel()))
    }

    // ---------------------------------------------------------------------
    // Channel plumbing
    // ---------------------------------------------------------------------

    fn channel(&mut self, kind: ChannelKind) -> Result<&mut C, SessionError> {
        self.channels
            .get_mut(&kind)
            .ok_or(SessionError::NoChannel(kind))
    }

    async fn request_open(&mut self, pending: &PendingOpen) -> Result<Opened, SessionError> {
        let response = self
            .channel(pending.channel)?
            .open_document(&pending.request)
            .await?;
        let document = response.into_result()?;
        Ok(Opened::from_document(document, &self.config.viewer))
    }

    async fn request_load(
        &mut self,
        kind: ChannelKind,
        request: &LoadRequest,
    ) -> Result<(), SessionError> {
        let response = self.channel(kind)?.load_document(request).await?;
        response.into_result().map_err(SessionError::from)
    }

    fn load_request(
        &self,
        key: SessionKey,
        server_id: &DocumentId,
        chapter_index: usize,
        page: u32,
    ) -> Result<LoadRequest, SessionError> {
        let session = self
            .stack
            .get(key)
            .ok_or(SessionError::UnknownSession(key))?;
        let chapter = session
            .descriptor
            .chapters
            .get(chapter_index)
            .ok_or(SessionError::NoChapter(chapter_index))?;
        Ok(LoadRequest::for_chapter(server_id.clone(), chapter, page))
    }

    async fn close_sessions(&mut self, sessions: Vec<DocumentSession>) {
        for session in sessions {
            let kind = session.channel();
            if let Some(id) = session.server_id {
                self.close_remote(kind, id).await;
            }
        }
    }

    async fn close_remote(&mut self, kind: ChannelKind, id: DocumentId) {
        let request = CloseRequest {
            id,
            keep_server_state: self.config.session.close_keeps_server_state,
        };
        match self.channels.get_mut(&kind) {
            Some(channel) => {
                if let Err(err) = channel.close_document(&request).await {
                    warn!(id = %request.id, error = %err, "close document failed");
                }
            }
            None => warn!(?kind, id = %request.id, "no channel to close document"),
        }
    }

    fn restart_keep_alive(&mut self, kind: ChannelKind) {
        if let Some(ping) = self.channels.get(&kind).and_then(|channel| channel.keep_alive()) {
            self.keep_alive.restart(kind, ping);
        }
    }

    fn stop_keep_alive_if_idle(&mut self) {
        if self.stack.is_empty() {
            self.keep_alive.stop_all();
        }
    }

    fn report(&mut self, err: &SessionError) {
        warn!(%err, "epaper operation failed");
        self.overlay.show_error(&err.to_string());
    }
}
