//! Periodic keep-alive pings, one timer per channel kind.

use std::collections::HashMap;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, warn};

use crate::channel::ChannelKind;

/// Keep-alive timers. Starting a timer for a kind replaces the previous one
/// of that kind; timers never stack.
#[derive(Debug)]
pub struct KeepAlive {
    period: Duration,
    timers: HashMap<ChannelKind, JoinHandle<()>>,
}

impl KeepAlive {
    /// A zero period disables every timer.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            timers: HashMap::new(),
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// (Re)start the timer of `kind`. Returns whether a timer is running.
    pub fn restart(&mut self, kind: ChannelKind, mut ping: Box<dyn FnMut() + Send>) -> bool {
        self.stop(kind);
        if self.period.is_zero() {
            return false;
        }
        let Ok(handle) = Handle::try_current() else {
            warn!(?kind, "no async runtime, keep-alive disabled");
            return false;
        };

        let period = self.period;
        let task = handle.spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            loop {
                ticks.tick().await;
                ping();
            }
        });
        debug!(?kind, ?period, "keep-alive started");
        self.timers.insert(kind, task);
        true
    }

    pub fn stop(&mut self, kind: ChannelKind) {
        if let Some(task) = self.timers.remove(&kind) {
            task.abort();
        }
    }

    pub fn stop_all(&mut self) {
        for (_, task) in self.timers.drain() {
            task.abort();
        }
    }

    pub fn is_running(&self, kind: ChannelKind) -> bool {
        self.timers.get(&kind).is_some_and(|task| !task.is_finished())
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.stop_all();
    }
}
