//! Transient user-facing notices.
//!
//! A view shows at most one notice at a time. Showing a new one replaces
//! the old one and restarts its clock.

use chrono::{DateTime, Duration, Utc};

use crate::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub shown_at: DateTime<Utc>,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
            shown_at: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
            shown_at: Utc::now(),
        }
    }

    /// Error notice carrying the best message the error can offer
    pub fn from_error(err: &Error) -> Self {
        Self::error(err.user_message())
    }
}

/// Holds the currently displayed notice, if any
#[derive(Clone, Debug)]
pub struct NoticeBoard {
    ttl: Duration,
    current: Option<Notice>,
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    pub fn show(&mut self, notice: Notice) {
        tracing::debug!("Notice ({:?}): {}", notice.kind, notice.message);
        self.current = Some(notice);
    }

    /// The notice still visible at `now`
    pub fn visible(&self, now: DateTime<Utc>) -> Option<&Notice> {
        self.current
            .as_ref()
            .filter(|notice| now - notice.shown_at < self.ttl)
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}
