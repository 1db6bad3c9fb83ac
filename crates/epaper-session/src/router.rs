//! Routing of push messages to the session that owns them.

use std::collections::HashMap;

use epaper_ir::{DocumentId, PushMessage};
use epaper_scene::{SceneRenderer, StyleSheet};
use tracing::debug;

use crate::channel::FocusWidget;
use crate::error::SessionError;
use crate::session::SessionKey;
use crate::stack::SessionStack;

/// What a dispatched push message did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A page replaced the session's last page and was rendered.
    Rendered(SessionKey),
    FocusForwarded(SessionKey),
    /// Recognised and deliberately ignored (legacy draw orders, unknown tags).
    Ignored,
    /// No registered session owns the document id.
    Dropped,
}

/// Server document id → session registrations.
#[derive(Debug, Default)]
pub struct ProtocolRouter {
    handlers: HashMap<DocumentId, SessionKey>,
}

impl ProtocolRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: DocumentId, key: SessionKey) {
        debug!(%id, ?key, "push handler registered");
        self.handlers.insert(id, key);
    }

    pub fn unregister(&mut self, id: &DocumentId) -> Option<SessionKey> {
        let removed = self.handlers.remove(id);
        if removed.is_some() {
            debug!(%id, "push handler unregistered");
        }
        removed
    }

    pub fn resolve(&self, id: &DocumentId) -> Option<SessionKey> {
        self.handlers.get(id).copied()
    }

    pub fn is_registered(&self, id: &DocumentId) -> bool {
        self.handlers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Apply one push message for document `id`.
    ///
    /// Messages for unregistered ids are dropped before parsing. A page that
    /// fails to render leaves the session's last page and tree untouched.
    pub fn dispatch<S: StyleSheet>(
        &self,
        id: &DocumentId,
        message: &str,
        stack: &mut SessionStack,
        renderer: &mut SceneRenderer<S>,
        focus: &mut dyn FocusWidget,
    ) -> Result<DispatchOutcome, SessionError> {
        let Some(key) = self.resolve(id) else {
            debug!(%id, "push for unregistered document dropped");
            return Ok(DispatchOutcome::Dropped);
        };
        let Some(session) = stack.get_mut(key) else {
            debug!(%id, ?key, "push for a session no longer on the stack dropped");
            return Ok(DispatchOutcome::Dropped);
        };

        match PushMessage::parse(message)? {
            PushMessage::Page(page) => {
                let rendered = renderer.render_page(&page)?;
                session.last_page = Some(*page);
                session.rendered = Some(rendered);
                session.hover.reset();
                Ok(DispatchOutcome::Rendered(key))
            }
            PushMessage::FocusBinding(binding) => {
                focus.attach(id, &binding);
                Ok(DispatchOutcome::FocusForwarded(key))
            }
            PushMessage::LegacyDraw => Ok(DispatchOutcome::Ignored),
            PushMessage::Unknown(tag) => {
                debug!(%id, %tag, "unknown push message ignored");
                Ok(DispatchOutcome::Ignored)
            }
        }
    }
}
