#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use epaper_config::EpaperConfig;
use epaper_ir::protocol::{
    CloseRequest, FocusBinding, HintRect, LinkTarget, LoadRequest, LoadResponse, OpenRequest,
    OpenResponse,
};
use epaper_ir::{Chapter, DocumentDescriptor, DocumentId};
use epaper_session::{ChannelKind, DocumentChannel, EpaperViewer, FocusWidget, StatusOverlay};
use serde_json::json;

/// One request seen by the mock server.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Open { template: String, path: String },
    Load { id: DocumentId, page: u32 },
    Close(DocumentId),
    GotoPage { id: DocumentId, page: u32 },
    ResolveLink { id: DocumentId },
    Hints(DocumentId),
    AddLine { id: DocumentId, band: usize },
    RemoveLine { id: DocumentId, band: usize },
}

/// Behaviour of the mock server, shared with the test body.
#[derive(Debug, Default)]
pub struct Script {
    pub next_id: u32,
    pub fail_open: bool,
    pub fail_load: bool,
    pub link: Option<LinkTarget>,
    pub hints: Vec<HintRect>,
}

#[derive(Clone)]
pub struct MockChannel {
    kind: ChannelKind,
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub script: Arc<Mutex<Script>>,
    pub pings: Arc<AtomicUsize>,
}

impl MockChannel {
    pub fn new(kind: ChannelKind) -> Self {
        Self {
            kind,
            calls: Arc::default(),
            script: Arc::default(),
            pings: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn closed(&self) -> Vec<DocumentId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Close(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn opens(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Open { .. }))
            .count()
    }

    pub fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl DocumentChannel for MockChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn open_document(&mut self, request: &OpenRequest) -> Result<OpenResponse> {
        self.record(Call::Open {
            template: request.template.clone(),
            path: request.path.clone(),
        });
        let mut script = self.script.lock().unwrap();
        if script.fail_open {
            return Ok(OpenResponse::failed(json!("template not found")));
        }
        script.next_id += 1;
        Ok(OpenResponse::opened(script.next_id.to_string(), 595.0, 842.0))
    }

    async fn load_document(&mut self, request: &LoadRequest) -> Result<LoadResponse> {
        self.record(Call::Load {
            id: request.id.clone(),
            page: request.page,
        });
        if self.script.lock().unwrap().fail_load {
            return Ok(LoadResponse {
                errors: Some(json!(["no data for path"])),
            });
        }
        Ok(LoadResponse::default())
    }

    async fn close_document(&mut self, request: &CloseRequest) -> Result<()> {
        self.record(Call::Close(request.id.clone()));
        Ok(())
    }

    async fn goto_page(&mut self, id: &DocumentId, page: u32) -> Result<()> {
        self.record(Call::GotoPage {
            id: id.clone(),
            page,
        });
        Ok(())
    }

    async fn resolve_link(&mut self, id: &DocumentId, _x: f64, _y: f64) -> Result<LinkTarget> {
        self.record(Call::ResolveLink { id: id.clone() });
        self.script
            .lock()
            .unwrap()
            .link
            .clone()
            .ok_or_else(|| anyhow!("no link at point"))
    }

    async fn fetch_hints(&mut self, id: &DocumentId) -> Result<Vec<HintRect>> {
        self.record(Call::Hints(id.clone()));
        Ok(self.script.lock().unwrap().hints.clone())
    }

    async fn add_document_line(&mut self, id: &DocumentId, band: usize) -> Result<LoadResponse> {
        self.record(Call::AddLine {
            id: id.clone(),
            band,
        });
        Ok(LoadResponse::default())
    }

    async fn remove_document_line(
        &mut self,
        id: &DocumentId,
        band: usize,
    ) -> Result<LoadResponse> {
        self.record(Call::RemoveLine {
            id: id.clone(),
            band,
        });
        Ok(LoadResponse::default())
    }

    fn keep_alive(&self) -> Option<Box<dyn FnMut() + Send>> {
        let pings = self.pings.clone();
        Some(Box::new(move || {
            pings.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

#[derive(Clone, Default)]
pub struct RecordingFocus {
    pub attached: Arc<Mutex<Vec<(DocumentId, Option<String>)>>>,
    pub detached: Arc<AtomicUsize>,
}

impl FocusWidget for RecordingFocus {
    fn attach(&mut self, document: &DocumentId, binding: &FocusBinding) {
        self.attached
            .lock()
            .unwrap()
            .push((document.clone(), binding.widget().map(str::to_string)));
    }

    fn detach(&mut self) {
        self.detached.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
pub struct RecordingOverlay {
    pub errors: Arc<Mutex<Vec<String>>>,
}

impl RecordingOverlay {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl StatusOverlay for RecordingOverlay {
    fn show_error(&mut self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

pub struct Harness {
    pub viewer: EpaperViewer<MockChannel>,
    pub channel: MockChannel,
    pub focus: RecordingFocus,
    pub overlay: RecordingOverlay,
}

/// A viewer with a legacy mock channel and keep-alive disabled.
pub fn harness() -> Harness {
    let mut config = EpaperConfig::default();
    config.session.keep_alive_secs = 0;
    harness_with(config)
}

pub fn harness_with(config: EpaperConfig) -> Harness {
    let channel = MockChannel::new(ChannelKind::Legacy);
    let focus = RecordingFocus::default();
    let overlay = RecordingOverlay::default();
    let viewer = EpaperViewer::new(config)
        .with_channel(channel.clone())
        .with_focus_widget(Box::new(focus.clone()))
        .with_status_overlay(Box::new(overlay.clone()));
    Harness {
        viewer,
        channel,
        focus,
        overlay,
    }
}

pub fn descriptor(name: &str) -> DocumentDescriptor {
    DocumentDescriptor::single(name, Chapter::new(format!("default/{name}"), name))
}

/// Minimal page message with one detail band per label.
pub fn page_message(labels: &[&str]) -> String {
    let bands: Vec<_> = labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let y = 20.0 * index as f64;
            json!({
                "t": "DT",
                "p": { "oy": y, "h": 20 },
                "e": [{
                    "t": "T",
                    "p": { "l": true },
                    "ts": [{ "x": 10, "y": y + 14.0, "t": label }]
                }]
            })
        })
        .collect();
    let page = json!({ "p": { "w": 595, "h": 842 }, "e": bands });
    format!("J:{page}\n")
}
