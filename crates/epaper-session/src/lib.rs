//! Document sessions of the epaper viewer.
//!
//! A bounded stack of open remote documents, the routing of server push
//! messages to the session that owns them, and the [`viewer::EpaperViewer`]
//! that ties both to a [`channel::DocumentChannel`].

pub mod channel;
pub mod error;
pub mod inbox;
pub mod keepalive;
pub mod link;
pub mod router;
pub mod session;
pub mod stack;
pub mod viewer;

pub use channel::{ChannelKind, DocumentChannel, FocusWidget, StatusOverlay};
pub use error::SessionError;
pub use inbox::{PushEnvelope, PushInbox, PushSender};
pub use keepalive::KeepAlive;
pub use router::{DispatchOutcome, ProtocolRouter};
pub use session::{DocumentSession, Opened, SessionKey, SessionState};
pub use stack::{OpenCompletion, PendingOpen, SessionStack};
pub use viewer::{EpaperViewer, PointerUpdate};
