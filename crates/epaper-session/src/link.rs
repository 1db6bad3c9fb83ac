//! Drill-down links: expression evaluation and push descriptors.
//!
//! A resolved link carries `path` and `title` expressions such as
//! `account_statement/0?filter[first_account]=${link}`. Variables come from
//! the session the link was clicked in.

use std::collections::HashMap;

use epaper_ir::protocol::LinkTarget;
use epaper_ir::{Chapter, DocumentDescriptor};
use serde_json::Value;

use crate::error::SessionError;
use crate::session::DocumentSession;

/// Named values available to link expressions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkVariables {
    values: HashMap<String, String>,
}

impl LinkVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variables of `session` plus the clicked link text as `link`.
    ///
    /// Exposes `link`, `id`, `path`, `template`, `locale`, `title` and every
    /// scalar member of the chapter's `params`.
    pub fn for_session(session: &DocumentSession, link_text: &str) -> Self {
        let mut vars = Self::new();
        if let Some(chapter) = session.chapter() {
            if let Some(Value::Object(params)) = &chapter.params {
                for (name, value) in params {
                    match value {
                        Value::String(text) => vars.set(name, text.clone()),
                        Value::Number(number) => vars.set(name, number.to_string()),
                        Value::Bool(flag) => vars.set(name, flag.to_string()),
                        _ => {}
                    }
                }
            }
            vars.set("path", chapter.path.clone());
            vars.set("template", chapter.template.clone());
            vars.set("locale", chapter.locale.clone());
        }
        if let Some(id) = &session.server_id {
            vars.set("id", id.clone());
        }
        vars.set("title", session.title().to_string());
        vars.set("link", link_text.to_string());
        vars
    }

    pub fn set(&mut self, name: &str, value: String) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Substitute `${name}` references in `expression`.
pub fn evaluate(expression: &str, vars: &LinkVariables) -> Result<String, SessionError> {
    let mut out = String::with_capacity(expression.len());
    let mut rest = expression;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let end = tail.find('}').ok_or_else(|| {
            SessionError::LinkExpression(format!("unterminated reference in '{expression}'"))
        })?;
        let name = tail[..end].trim();
        let value = vars.get(name).ok_or_else(|| {
            SessionError::LinkExpression(format!("unknown variable '{name}' in '{expression}'"))
        })?;
        out.push_str(value);
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Descriptor of the document a link drills into.
pub fn push_descriptor(
    target: &LinkTarget,
    session: &DocumentSession,
    link_text: &str,
) -> Result<DocumentDescriptor, SessionError> {
    let vars = LinkVariables::for_session(session, link_text);
    let template = match &target.template {
        Some(template) => template.clone(),
        None => session
            .chapter()
            .map(|chapter| chapter.template.clone())
            .ok_or(SessionError::NoChapter(session.chapter_index))?,
    };
    let path = evaluate(&target.path, &vars)?;
    let title = evaluate(&target.title, &vars)?;

    let mut descriptor = DocumentDescriptor::single(title, Chapter::new(template, path));
    descriptor.epaper2 = session.descriptor.epaper2;
    Ok(descriptor)
}
