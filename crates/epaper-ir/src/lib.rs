//! Wire model for server-rendered epaper documents.
//!
//! The server pushes pages as compact JSON (single-letter keys). This crate
//! decodes them into typed [`page::Page`] values, validates their structure,
//! and describes the request/response shapes of the remote document protocol.

pub mod document;
pub mod error;
pub mod page;
pub mod protocol;
pub mod schema;

pub use document::{Chapter, DocumentDescriptor};
pub use error::{MessageError, PageError};
pub use page::{Band, BandKind, Element, ElementKind, Page};
pub use protocol::{DocumentId, PushMessage};
