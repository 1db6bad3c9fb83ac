//! Request/response shapes of the remote document protocol.
//!
//! Transport framing is not modelled here; these are the JSON bodies that
//! travel over whatever channel the host provides.

pub mod message;

pub use message::{FocusBinding, MessageTag, PushMessage};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::document::Chapter;

/// Server-assigned identifier of an open document.
pub type DocumentId = String;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenRequest {
    #[serde(rename = "jrxml")]
    pub template: String,
    pub locale: String,
    pub path: String,
    pub editable: bool,
    #[serde(rename = "limit")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_limit: Option<u32>,
    pub close_previous: bool,
}

impl From<&Chapter> for OpenRequest {
    fn from(chapter: &Chapter) -> Self {
        Self {
            template: chapter.template.clone(),
            locale: chapter.locale.clone(),
            path: chapter.path.clone(),
            editable: chapter.editable,
            page_limit: chapter.limit,
            close_previous: chapter.close_previous,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PageSize {
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OpenResponse {
    #[serde(default, deserialize_with = "document_id")]
    pub id: Option<DocumentId>,
    #[serde(default)]
    pub page: Option<PageSize>,
    #[serde(default)]
    pub errors: Option<Value>,
}

/// A successfully opened remote document.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedDocument {
    pub id: DocumentId,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl OpenResponse {
    pub fn opened(id: impl Into<DocumentId>, width: f64, height: f64) -> Self {
        Self {
            id: Some(id.into()),
            page: Some(PageSize {
                width: Some(width),
                height: Some(height),
            }),
            errors: None,
        }
    }

    pub fn failed(errors: Value) -> Self {
        Self {
            id: None,
            page: None,
            errors: Some(errors),
        }
    }

    pub fn into_result(self) -> Result<OpenedDocument, ServerErrors> {
        if let Some(errors) = self.errors {
            return Err(ServerErrors(errors));
        }
        let Some(id) = self.id else {
            return Err(ServerErrors(Value::String(
                "open response carries no document id".into(),
            )));
        };
        let page = self.page.unwrap_or(PageSize {
            width: None,
            height: None,
        });
        Ok(OpenedDocument {
            id,
            width: page.width,
            height: page.height,
        })
    }
}

/// Where the server should place the input focus after loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusHint {
    #[default]
    None,
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadRequest {
    pub id: DocumentId,
    pub path: String,
    pub scale: f64,
    pub page: u32,
    pub focus: FocusHint,
    pub editable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl LoadRequest {
    pub fn for_chapter(id: DocumentId, chapter: &Chapter, page: u32) -> Self {
        let focus = if !chapter.editable {
            FocusHint::None
        } else if page > 0 {
            FocusHint::Start
        } else {
            FocusHint::End
        };
        Self {
            id,
            path: chapter.path.clone(),
            scale: 1.0,
            page: page.max(1),
            focus,
            editable: chapter.editable,
            limit: chapter.limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct LoadResponse {
    #[serde(default)]
    pub errors: Option<Value>,
}

impl LoadResponse {
    pub fn into_result(self) -> Result<(), ServerErrors> {
        match self.errors {
            Some(errors) => Err(ServerErrors(errors)),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloseRequest {
    pub id: DocumentId,
    pub keep_server_state: bool,
}

/// Answer to a link-resolution request. `path` and `title` are expressions
/// evaluated against the session the link was clicked in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkTarget {
    #[serde(default)]
    pub handler: Option<String>,
    #[serde(default, rename = "jrxml", alias = "template")]
    pub template: Option<String>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub title: String,
}

/// Tooltip hot spot returned by a hint request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HintRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(alias = "ht")]
    pub text: String,
}

/// The `errors` member of a failed response.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerErrors(pub Value);

impl fmt::Display for ServerErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(message) => f.write_str(message),
            Value::Array(items) => {
                let messages: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        Value::Object(map) => map
                            .get("detail")
                            .or_else(|| map.get("title"))
                            .and_then(Value::as_str)
                            .map(str::to_string)
                            .unwrap_or_else(|| item.to_string()),
                        other => other.to_string(),
                    })
                    .collect();
                f.write_str(&messages.join("; "))
            }
            other => write!(f, "{other}"),
        }
    }
}

fn document_id<'de, D>(deserializer: D) -> Result<Option<DocumentId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(id)) => Some(id),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}
