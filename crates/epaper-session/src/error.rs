use epaper_ir::protocol::ServerErrors;
use epaper_ir::MessageError;
use epaper_scene::SceneError;
use thiserror::Error;

use crate::channel::ChannelKind;
use crate::session::SessionKey;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Push refused before any request was made.
    #[error("document stack is full ({max} documents)")]
    DepthLimit { max: usize },

    /// The server answered with an `errors` member.
    #[error("server error: {0}")]
    Server(ServerErrors),

    #[error("transport failure: {0:#}")]
    Transport(#[from] anyhow::Error),

    #[error("unknown session {0:?}")]
    UnknownSession(SessionKey),

    /// The session was popped or closed while its open request was in flight.
    #[error("session {0:?} was closed before its document opened")]
    Stale(SessionKey),

    #[error("no document is open")]
    NoDocument,

    #[error("document has no chapter {0}")]
    NoChapter(usize),

    #[error("page {0} is outside the document")]
    PageOutOfRange(u32),

    #[error("page has no detail band {0}")]
    UnknownBand(usize),

    #[error("no {0:?} channel configured")]
    NoChannel(ChannelKind),

    #[error("document is not editable")]
    NotEditable,

    #[error("link expression: {0}")]
    LinkExpression(String),

    #[error(transparent)]
    Message(#[from] MessageError),

    #[error(transparent)]
    Render(#[from] SceneError),
}

impl From<ServerErrors> for SessionError {
    fn from(errors: ServerErrors) -> Self {
        SessionError::Server(errors)
    }
}
