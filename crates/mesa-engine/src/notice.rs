//! User-facing status notices.
//!
//! The engine surfaces problems (a failed decode, a missing input device)
//! and confirmations (state saved) as notices rather than hard errors, so
//! one bad file never takes the rack down.

use std::collections::VecDeque;

/// How a notice should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Neutral status information.
    Info,
    /// Confirmation of a completed action.
    Success,
    /// Something went wrong but the rack keeps running.
    Warning,
    /// An operation failed outright.
    Error,
}

/// One message destined for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Presentation severity.
    pub severity: Severity,
    /// Human-readable message text.
    pub message: String,
    /// Whether the notice clears on its own after a short interval.
    pub auto_dismiss: bool,
}

impl Notice {
    /// Build an informational notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            auto_dismiss: false,
        }
    }

    /// Build a success notice. Successes auto-dismiss.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
            auto_dismiss: true,
        }
    }

    /// Build a warning notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            auto_dismiss: false,
        }
    }

    /// Build an error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            auto_dismiss: false,
        }
    }
}

/// FIFO queue of pending notices.
///
/// The engine pushes, the frontend drains. Nothing here blocks the audio
/// path; notices are posted from control-plane calls only.
#[derive(Debug, Default)]
pub struct NoticeCenter {
    pending: VecDeque<Notice>,
}

impl NoticeCenter {
    /// Create an empty notice queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notice for display.
    pub fn post(&mut self, notice: Notice) {
        match notice.severity {
            Severity::Info => tracing::info!(message = %notice.message, "notice"),
            Severity::Success => tracing::debug!(message = %notice.message, "notice"),
            Severity::Warning => tracing::warn!(message = %notice.message, "notice"),
            Severity::Error => tracing::error!(message = %notice.message, "notice"),
        }
        self.pending.push_back(notice);
    }

    /// Take the oldest pending notice.
    pub fn pop(&mut self) -> Option<Notice> {
        self.pending.pop_front()
    }

    /// Remove and return everything queued, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.pending.drain(..).collect()
    }

    /// Number of queued notices.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
