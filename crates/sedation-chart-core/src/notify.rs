//! Toast surface: short messages the host shows and auto-dismisses.

use serde::{Deserialize, Serialize};

use crate::config::FormConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        }
    }
}

/// One user-visible message with its suggested display time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub text: String,
    pub duration_ms: u64,
}

/// Messages waiting for the host to display them.
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    queue: Vec<Notification>,
    info_ms: u64,
    error_ms: u64,
}

impl Notifications {
    pub fn new(config: &FormConfig) -> Self {
        Self {
            queue: Vec::new(),
            info_ms: millis(config.info_toast()),
            error_ms: millis(config.error_toast()),
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(NotificationKind::Info, text.into());
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(NotificationKind::Success, text.into());
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(NotificationKind::Error, text.into());
    }

    fn push(&mut self, kind: NotificationKind, text: String) {
        let duration_ms = match kind {
            NotificationKind::Error => self.error_ms,
            NotificationKind::Info | NotificationKind::Success => self.info_ms,
        };
        self.queue.push(Notification {
            kind,
            text,
            duration_ms,
        });
    }

    pub fn pending(&self) -> &[Notification] {
        &self.queue
    }

    /// Hand every queued message to the host.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.queue)
    }

    /// Dismiss whatever is showing.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

fn millis(duration: chrono::Duration) -> u64 {
    u64::try_from(duration.num_milliseconds()).unwrap_or(0)
}
