//! Started/Exited notifications for process invocations.
//!
//! Observers implement [`LifecycleListener`] or drain a channel through
//! [`ChannelListener`]. Notifications are fire-and-forget: listeners cannot
//! influence the invocation.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A lifecycle notification for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// The child process was spawned.
    Started { started_at: DateTime<Utc> },
    /// The child process exited, normally or after forced termination.
    Exited {
        exit_code: i32,
        exited_at: DateTime<Utc>,
    },
}

impl LifecycleEvent {
    /// Event timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Started { started_at } => *started_at,
            Self::Exited { exited_at, .. } => *exited_at,
        }
    }
}

/// Observer for invocation lifecycle notifications.
pub trait LifecycleListener: Send + Sync {
    fn on_started(&self, _started_at: DateTime<Utc>) {}

    fn on_exited(&self, _exit_code: i32, _exited_at: DateTime<Utc>) {}
}

/// Fan-out over zero or more listeners.
#[derive(Clone, Default)]
pub struct Listeners {
    inner: Vec<Arc<dyn LifecycleListener>>,
}

impl Listeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, listener: Arc<dyn LifecycleListener>) {
        self.inner.push(listener);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.inner.len())
            .finish()
    }
}

impl LifecycleListener for Listeners {
    fn on_started(&self, started_at: DateTime<Utc>) {
        for listener in &self.inner {
            listener.on_started(started_at);
        }
    }

    fn on_exited(&self, exit_code: i32, exited_at: DateTime<Utc>) {
        for listener in &self.inner {
            listener.on_exited(exit_code, exited_at);
        }
    }
}

/// Forwards notifications into an `mpsc` channel the caller drains.
///
/// Send failures (receiver dropped) are ignored.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: Sender<LifecycleEvent>,
}

impl ChannelListener {
    /// Create a listener and the receiving half of its channel.
    #[must_use]
    pub fn channel() -> (Self, Receiver<LifecycleEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl LifecycleListener for ChannelListener {
    fn on_started(&self, started_at: DateTime<Utc>) {
        let _ = self.tx.send(LifecycleEvent::Started { started_at });
    }

    fn on_exited(&self, exit_code: i32, exited_at: DateTime<Utc>) {
        let _ = self.tx.send(LifecycleEvent::Exited {
            exit_code,
            exited_at,
        });
    }
}
