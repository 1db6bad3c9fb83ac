//! Document descriptors handed to the viewer by the host application.

use serde::{Deserialize, Serialize};

/// Locale applied to chapters that do not name one.
pub const DEFAULT_LOCALE: &str = "pt_PT";

/// A remote document made of one or more chapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    #[serde(default)]
    pub title: String,
    pub chapters: Vec<Chapter>,
    /// Page count applied to every chapter on normalization.
    #[serde(default, alias = "pageCount")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    /// Served by the second-generation document channel.
    #[serde(default)]
    pub epaper2: bool,
}

/// A named sub-report: one server template rendered against one data path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(rename = "jrxml")]
    pub template: String,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    #[serde(default)]
    pub editable: bool,
    #[serde(default, alias = "pageCount")]
    pub page_count: u32,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default)]
    pub close_previous: bool,
}

impl Chapter {
    pub fn new(template: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            locale: String::new(),
            path: path.into(),
            params: None,
            editable: false,
            page_count: 0,
            limit: None,
            close_previous: false,
        }
    }

    /// Two chapters with the same template and locale target the same remote
    /// document and can share an open server session.
    pub fn same_identity(&self, other: &Chapter) -> bool {
        self.template == other.template && self.locale == other.locale
    }
}

impl DocumentDescriptor {
    pub fn single(title: impl Into<String>, chapter: Chapter) -> Self {
        Self {
            title: title.into(),
            chapters: vec![chapter],
            page_count: None,
            epaper2: false,
        }
    }

    /// Fill chapter defaults: locale, page counts.
    pub fn normalized(mut self, default_locale: &str) -> Self {
        let page_count = self.page_count.unwrap_or(1).max(1);
        for chapter in &mut self.chapters {
            if chapter.locale.is_empty() {
                chapter.locale = default_locale.to_string();
            }
            chapter.page_count = page_count;
        }
        self
    }

    pub fn total_page_count(&self) -> u32 {
        self.chapters
            .iter()
            .fold(0u32, |total, chapter| total.saturating_add(chapter.page_count))
    }

    /// Map a 1-based global page number to `(chapter index, page in chapter)`.
    pub fn locate_page(&self, page_number: u32) -> Option<(usize, u32)> {
        let mut first = 1u32;
        for (index, chapter) in self.chapters.iter().enumerate() {
            let end = first.saturating_add(chapter.page_count);
            if page_number >= first && page_number < end {
                return Some((index, 1 + page_number - first));
            }
            first = end;
        }
        None
    }
}
