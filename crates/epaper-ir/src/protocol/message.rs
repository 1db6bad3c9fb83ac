//! Push message envelope: a one-character tag, a `:` separator, a payload
//! and an optional newline terminator.

use serde_json::Value;

use crate::{error::MessageError, page::Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageTag {
    /// `J`: a full page model.
    Page,
    /// `F`: an editable-field binding for the focus widget.
    FocusBinding,
    /// `D`: drawing orders of the first-generation protocol.
    LegacyDraw,
    Unknown(char),
}

impl MessageTag {
    pub fn of(message: &str) -> Option<Self> {
        message.chars().next().map(|tag| match tag {
            'J' => MessageTag::Page,
            'F' => MessageTag::FocusBinding,
            'D' => MessageTag::LegacyDraw,
            other => MessageTag::Unknown(other),
        })
    }
}

/// Editable-field binding, forwarded verbatim to the focus widget.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusBinding(pub Value);

impl FocusBinding {
    /// Widget kind requested by the server (`text`, `date`, `combo`, ...).
    pub fn widget(&self) -> Option<&str> {
        self.0.get("widget").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PushMessage {
    Page(Box<Page>),
    FocusBinding(FocusBinding),
    LegacyDraw,
    Unknown(char),
}

impl PushMessage {
    pub fn parse(message: &str) -> Result<Self, MessageError> {
        let tag = MessageTag::of(message).ok_or(MessageError::Empty)?;
        match tag {
            MessageTag::Page => {
                let body = payload(message).ok_or(MessageError::Truncated { tag: 'J' })?;
                let page = Page::from_json_str(body)?;
                Ok(PushMessage::Page(Box::new(page)))
            }
            MessageTag::FocusBinding => {
                let body = payload(message).ok_or(MessageError::Truncated { tag: 'F' })?;
                let value: Value = serde_json::from_str(body).map_err(MessageError::Binding)?;
                Ok(PushMessage::FocusBinding(FocusBinding(value)))
            }
            MessageTag::LegacyDraw => Ok(PushMessage::LegacyDraw),
            MessageTag::Unknown(tag) => Ok(PushMessage::Unknown(tag)),
        }
    }
}

fn payload(message: &str) -> Option<&str> {
    let body = message.get(2..)?;
    let body = body.strip_suffix('\n').unwrap_or(body);
    (!body.is_empty()).then_some(body)
}
