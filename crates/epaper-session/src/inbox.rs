//! Queue of push messages between the transport and the viewer.
//!
//! The transport task holds a [`PushSender`]; the viewer drains the inbox
//! on its own schedule. Messages come out in arrival order.

use epaper_ir::DocumentId;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEnvelope {
    pub document: DocumentId,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct PushSender {
    tx: mpsc::UnboundedSender<PushEnvelope>,
}

impl PushSender {
    /// Queue a message; `false` once the inbox is gone.
    pub fn send(&self, document: impl Into<DocumentId>, message: impl Into<String>) -> bool {
        self.tx
            .send(PushEnvelope {
                document: document.into(),
                message: message.into(),
            })
            .is_ok()
    }
}

#[derive(Debug)]
pub struct PushInbox {
    sender: PushSender,
    rx: mpsc::UnboundedReceiver<PushEnvelope>,
}

impl PushInbox {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            sender: PushSender { tx },
            rx,
        }
    }

    pub fn sender(&self) -> PushSender {
        self.sender.clone()
    }

    /// Everything queued so far, oldest first. Never waits.
    pub fn drain(&mut self) -> Vec<PushEnvelope> {
        let mut ready = Vec::new();
        while let Ok(envelope) = self.rx.try_recv() {
            ready.push(envelope);
        }
        ready
    }

    /// Wait for the next message.
    pub async fn recv(&mut self) -> Option<PushEnvelope> {
        self.rx.recv().await
    }
}

impl Default for PushInbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_arrival_order() {
        let mut inbox = PushInbox::new();
        let sender = inbox.sender();

        assert!(sender.send("1", "J:first"));
        assert!(sender.send("2", "F:{}"));
        assert!(sender.send("1", "J:second"));

        let drained: Vec<(String, String)> = inbox
            .drain()
            .into_iter()
            .map(|e| (e.document, e.message))
            .collect();
        assert_eq!(
            drained,
            vec![
                ("1".to_string(), "J:first".to_string()),
                ("2".to_string(), "F:{}".to_string()),
                ("1".to_string(), "J:second".to_string()),
            ]
        );
        assert!(inbox.drain().is_empty());
    }

    #[tokio::test]
    async fn recv_waits_for_sender_task() {
        let mut inbox = PushInbox::new();
        let sender = inbox.sender();

        tokio::spawn(async move {
            sender.send("9", "D:legacy");
        });

        let envelope = inbox.recv().await.unwrap();
        assert_eq!(envelope.document, "9");
    }
}
