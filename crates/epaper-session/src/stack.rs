//! Bounded navigation stack of document sessions.
//!
//! Every transition that waits on the server is split in two: `begin_*`
//! changes local state and returns the request to send, `complete_*` applies
//! the answer. A session popped between the two halves is remembered as
//! closed until its late answer arrives and is recognised as stale.

use std::collections::{HashMap, HashSet};

use epaper_config::ViewerConfig;
use epaper_ir::protocol::OpenRequest;
use epaper_ir::{DocumentDescriptor, DocumentId};
use tracing::{debug, info};

use crate::channel::ChannelKind;
use crate::error::SessionError;
use crate::router::ProtocolRouter;
use crate::session::{DocumentSession, Opened, SessionKey, SessionState};

/// Open request for a session that is not on the stack yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOpen {
    pub key: SessionKey,
    pub channel: ChannelKind,
    pub chapter_index: usize,
    pub request: OpenRequest,
}

/// Result of applying an open answer.
#[derive(Debug, Clone, PartialEq)]
pub enum OpenCompletion {
    /// Registered and on the stack, waiting for its first load. `previous`
    /// is the server document a reopen replaced.
    Loaded {
        key: SessionKey,
        server_id: DocumentId,
        previous: Option<DocumentId>,
    },
    /// Closed while the request was in flight. The server document exists but
    /// nothing was registered or displayed.
    Stale {
        key: SessionKey,
        server_id: Option<DocumentId>,
    },
}

#[derive(Debug)]
enum OpenSlot {
    Root,
    Push,
}

#[derive(Debug)]
pub struct SessionStack {
    sessions: Vec<DocumentSession>,
    opening: HashMap<SessionKey, (DocumentSession, OpenSlot)>,
    /// Loaded sessions with a reopen request in flight.
    reopening: HashSet<SessionKey>,
    /// Sessions closed while a request was in flight, until the answer arrives.
    closed: HashSet<SessionKey>,
    max_depth: usize,
    next_key: u64,
    viewer: ViewerConfig,
}

impl SessionStack {
    pub fn new(max_depth: usize, viewer: ViewerConfig) -> Self {
        Self {
            sessions: Vec::new(),
            opening: HashMap::new(),
            reopening: HashSet::new(),
            closed: HashSet::new(),
            max_depth: max_depth.max(1),
            next_key: 1,
            viewer,
        }
    }

    /// Start opening a root document. Every current session is closed first
    /// and handed back so the caller can close its server document. A
    /// descriptor without chapters is refused before anything is closed.
    pub fn begin_open(
        &mut self,
        descriptor: DocumentDescriptor,
        channel: ChannelKind,
        router: &mut ProtocolRouter,
    ) -> Result<(PendingOpen, Vec<DocumentSession>), SessionError> {
        if descriptor.chapters.is_empty() {
            return Err(SessionError::NoChapter(0));
        }
        let cleared = self.close_all(router);
        let pending = self.begin(descriptor, channel, OpenSlot::Root)?;
        Ok((pending, cleared))
    }

    /// Start opening a drill-down document on top of the current one.
    /// Fails without touching state when the stack is full.
    pub fn begin_push(
        &mut self,
        descriptor: DocumentDescriptor,
        channel: ChannelKind,
    ) -> Result<PendingOpen, SessionError> {
        if self.depth_in_use() >= self.max_depth {
            return Err(SessionError::DepthLimit {
                max: self.max_depth,
            });
        }
        let pending = self.begin(descriptor, channel, OpenSlot::Push)?;
        if let Some(top) = self.sessions.last_mut() {
            top.state = SessionState::Background;
        }
        Ok(pending)
    }

    fn begin(
        &mut self,
        descriptor: DocumentDescriptor,
        channel: ChannelKind,
        slot: OpenSlot,
    ) -> Result<PendingOpen, SessionError> {
        let request = descriptor
            .chapters
            .first()
            .map(OpenRequest::from)
            .ok_or(SessionError::NoChapter(0))?;
        let key = SessionKey(self.next_key);
        self.next_key += 1;

        let session = DocumentSession::new(key, descriptor, channel, &self.viewer);
        debug!(?key, template = %request.template, "opening document");
        self.opening.insert(key, (session, slot));
        Ok(PendingOpen {
            key,
            channel,
            chapter_index: 0,
            request,
        })
    }

    /// Apply the answer to an open request.
    ///
    /// On failure the would-be session is discarded and the previous top, if
    /// any, is active again.
    pub fn complete_open(
        &mut self,
        key: SessionKey,
        result: Result<Opened, SessionError>,
        router: &mut ProtocolRouter,
    ) -> Result<OpenCompletion, SessionError> {
        if self.closed.remove(&key) {
            let server_id = result.ok().map(|opened| opened.id);
            debug!(?key, ?server_id, "open answer for a closed session");
            return Ok(OpenCompletion::Stale { key, server_id });
        }
        let Some((mut session, _slot)) = self.opening.remove(&key) else {
            return Err(SessionError::UnknownSession(key));
        };

        let opened = match result {
            Ok(opened) => opened,
            Err(err) => {
                debug!(?key, %err, "open failed");
                self.reactivate_top();
                return Err(err);
            }
        };

        let server_id = opened.id.clone();
        session.apply_opened(opened);
        router.register(server_id.clone(), key);
        self.sessions.push(session);
        info!(?key, %server_id, depth = self.sessions.len(), "document opened");
        Ok(OpenCompletion::Loaded {
            key,
            server_id,
            previous: None,
        })
    }

    /// Make a loaded session the visible one.
    pub fn activate(&mut self, key: SessionKey) -> Result<(), SessionError> {
        let top = self
            .sessions
            .last_mut()
            .filter(|session| session.key == key)
            .ok_or(SessionError::UnknownSession(key))?;
        top.state = SessionState::Active;
        Ok(())
    }

    /// Undo a completed open whose first load failed. Returns the session so
    /// the caller can close its server document.
    pub fn abort_open(
        &mut self,
        key: SessionKey,
        router: &mut ProtocolRouter,
    ) -> Option<DocumentSession> {
        let position = self.position(key)?;
        let mut session = self.sessions.remove(position);
        if let Some(id) = &session.server_id {
            router.unregister(id);
        }
        session.state = SessionState::Closed;
        if self.reopening.remove(&key) {
            self.closed.insert(key);
        }
        self.reactivate_top();
        Some(session)
    }

    /// Remove every session at or above `index`, top first, unregistering
    /// each before the next is touched. Pushes still opening are marked
    /// stale. Returns the removed sessions in removal order.
    pub fn pop_to(&mut self, index: usize, router: &mut ProtocolRouter) -> Vec<DocumentSession> {
        let covers_pushes = index <= self.sessions.len();
        let pending: Vec<SessionKey> = self
            .opening
            .iter()
            .filter(|(_, (_, slot))| match slot {
                OpenSlot::Push => covers_pushes,
                OpenSlot::Root => index == 0,
            })
            .map(|(key, _)| *key)
            .collect();
        for key in pending {
            self.opening.remove(&key);
            self.closed.insert(key);
        }

        let mut removed = Vec::new();
        while self.sessions.len() > index {
            let Some(mut session) = self.sessions.pop() else {
                break;
            };
            if let Some(id) = &session.server_id {
                router.unregister(id);
            }
            session.state = SessionState::Closed;
            if self.reopening.remove(&session.key) {
                self.closed.insert(session.key);
            }
            debug!(key = ?session.key, "session closed");
            removed.push(session);
        }
        self.reactivate_top();
        removed
    }

    /// Close every session, including the root.
    pub fn close_all(&mut self, router: &mut ProtocolRouter) -> Vec<DocumentSession> {
        self.pop_to(0, router)
    }

    /// Start reopening a session on another chapter. The session keeps its
    /// current server document until the new one is open.
    pub fn begin_reopen(
        &mut self,
        key: SessionKey,
        chapter_index: usize,
    ) -> Result<PendingOpen, SessionError> {
        let session = self.get(key).ok_or(SessionError::UnknownSession(key))?;
        let request = session
            .descriptor
            .chapters
            .get(chapter_index)
            .map(OpenRequest::from)
            .ok_or(SessionError::NoChapter(chapter_index))?;
        let pending = PendingOpen {
            key,
            channel: session.channel,
            chapter_index,
            request,
        };
        self.reopening.insert(key);
        Ok(pending)
    }

    /// Move a session onto its newly opened server document. The previous
    /// server id is unregistered and returned in `previous` for closing.
    /// On failure nothing changes.
    pub fn complete_reopen(
        &mut self,
        pending: &PendingOpen,
        result: Result<Opened, SessionError>,
        router: &mut ProtocolRouter,
    ) -> Result<OpenCompletion, SessionError> {
        let key = pending.key;
        self.reopening.remove(&key);
        if self.closed.remove(&key) {
            let server_id = result.ok().map(|opened| opened.id);
            return Ok(OpenCompletion::Stale { key, server_id });
        }
        let opened = result?;
        let is_top = self.top().is_some_and(|top| top.key == key);
        let session = self.get_mut(key).ok_or(SessionError::UnknownSession(key))?;

        let previous = session.server_id.take();
        if let Some(id) = &previous {
            router.unregister(id);
        }
        let server_id = opened.id.clone();
        session.apply_opened(opened);
        session.chapter_index = pending.chapter_index;
        session.chapter_page = 1;
        session.hover.reset();
        if !is_top {
            session.state = SessionState::Background;
        }
        router.register(server_id.clone(), key);
        info!(?key, %server_id, chapter = pending.chapter_index, "chapter reopened");
        Ok(OpenCompletion::Loaded {
            key,
            server_id,
            previous,
        })
    }

    fn reactivate_top(&mut self) {
        if let Some(top) = self.sessions.last_mut() {
            top.state = SessionState::Active;
        }
    }

    fn depth_in_use(&self) -> usize {
        self.sessions.len() + self.opening.len()
    }

    /// Whether `key` was closed with an answer still outstanding.
    pub fn is_stale(&self, key: SessionKey) -> bool {
        self.closed.contains(&key)
    }

    /// Number of closed sessions still waiting for a late answer.
    pub fn stale_count(&self) -> usize {
        self.closed.len()
    }

    pub fn is_opening(&self, key: SessionKey) -> bool {
        self.opening.contains_key(&key)
    }

    pub fn top(&self) -> Option<&DocumentSession> {
        self.sessions.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut DocumentSession> {
        self.sessions.last_mut()
    }

    pub fn get(&self, key: SessionKey) -> Option<&DocumentSession> {
        self.sessions.iter().find(|session| session.key == key)
    }

    pub fn get_mut(&mut self, key: SessionKey) -> Option<&mut DocumentSession> {
        self.sessions.iter_mut().find(|session| session.key == key)
    }

    pub fn position(&self, key: SessionKey) -> Option<usize> {
        self.sessions.iter().position(|session| session.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentSession> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}
