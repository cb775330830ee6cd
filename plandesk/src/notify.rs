//! Ephemeral notifications ("toasts").
//!
//! Toasts expire after a fixed time to live and the center keeps at most a
//! fixed number, dropping the oldest first. Warnings and errors are also
//! written to the log.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default time a toast stays visible.
pub const DEFAULT_TOAST_TTL: Duration = Duration::from_secs(4);

/// Default maximum number of visible toasts.
pub const DEFAULT_MAX_TOASTS: usize = 5;

/// How prominent a toast is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Neutral information.
    Info,
    /// An operation completed.
    Success,
    /// Something was refused but nothing failed.
    Warning,
    /// An operation failed.
    Error,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Sequence number, unique per center.
    pub id: u64,
    /// Prominence.
    pub level: Level,
    /// Text to show.
    pub message: String,
    /// When it was raised.
    pub created: Instant,
}

impl Toast {
    fn expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created) >= ttl
    }
}

/// Queue of live toasts.
#[derive(Debug)]
pub struct NotificationCenter {
    toasts: VecDeque<Toast>,
    ttl: Duration,
    capacity: usize,
    next_id: u64,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_TTL, DEFAULT_MAX_TOASTS)
    }
}

impl NotificationCenter {
    /// Creates a center. A capacity of zero is treated as one.
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            toasts: VecDeque::new(),
            ttl,
            capacity: capacity.max(1),
            next_id: 0,
        }
    }

    /// Raises a toast at `now`. Returns its id.
    pub fn push_at(&mut self, level: Level, message: impl Into<String>, now: Instant) -> u64 {
        let message = message.into();
        match level {
            Level::Warning => tracing::warn!(%message, "notification"),
            Level::Error => tracing::error!(%message, "notification"),
            Level::Info | Level::Success => tracing::debug!(%level, %message, "notification"),
        }

        self.prune(now);
        while self.toasts.len() >= self.capacity {
            self.toasts.pop_front();
        }
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push_back(Toast {
            id,
            level,
            message,
            created: now,
        });
        id
    }

    /// Raises a toast now.
    pub fn push(&mut self, level: Level, message: impl Into<String>) -> u64 {
        self.push_at(level, message, Instant::now())
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.push(Level::Info, message)
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.push(Level::Success, message)
    }

    pub fn warning(&mut self, message: impl Into<String>) -> u64 {
        self.push(Level::Warning, message)
    }

    /// Raises an error toast describing `error`.
    pub fn error(&mut self, error: &dyn std::error::Error) -> u64 {
        self.push(Level::Error, error.to_string())
    }

    /// Dismisses a toast early. Returns `false` if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    /// Drops every toast older than the time to live.
    pub fn prune(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.toasts.retain(|t| !t.expired(now, ttl));
    }

    /// Toasts still visible at `now`, oldest first.
    pub fn active(&self, now: Instant) -> impl Iterator<Item = &Toast> {
        let ttl = self.ttl;
        self.toasts.iter().filter(move |t| !t.expired(now, ttl))
    }

    /// Removes and returns every toast still visible at `now`.
    pub fn drain(&mut self, now: Instant) -> Vec<Toast> {
        self.prune(now);
        self.toasts.drain(..).collect()
    }
}
