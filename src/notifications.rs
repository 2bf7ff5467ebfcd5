//! Transient on-screen notifications.
//!
//! Failures and state changes the user should see (a shell that would not
//! spawn, a window whose PTY died, a yank) become short toasts in the top
//! right corner. Each carries a [`Severity`] and fades out after the
//! configured duration.
//!
//! # Example
//!
//! ```ignore
//! let mut center = NotificationCenter::new(Duration::from_secs(3));
//! center.push(Severity::Error, "Failed to spawn shell", Instant::now());
//! center.expire(Instant::now());
//! ```

use std::time::{Duration, Instant};

/// How a notification is tagged and colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Neutral information.
    Info,
    /// Something completed.
    Success,
    /// Degraded but still running.
    Warning,
    /// An operation failed.
    Error,
}

impl Severity {
    /// Short tag shown before the message.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "ok",
            Severity::Warning => "warn",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One queued notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity tag.
    pub severity: Severity,
    /// Message text.
    pub message: String,
    /// When it was raised.
    pub created_at: Instant,
}

impl Notification {
    /// Fraction of the lifetime left, in `[0, 1]`. Renderers dim the toast
    /// as this approaches zero.
    pub fn remaining(&self, now: Instant, lifetime: Duration) -> f64 {
        if lifetime.is_zero() {
            return 0.0;
        }
        let age = now.saturating_duration_since(self.created_at);
        (1.0 - age.as_secs_f64() / lifetime.as_secs_f64()).clamp(0.0, 1.0)
    }
}

/// Most recent notifications, newest last.
#[derive(Debug)]
pub struct NotificationCenter {
    items: Vec<Notification>,
    lifetime: Duration,
}

/// Oldest notifications are dropped past this many.
const MAX_VISIBLE: usize = 5;

impl NotificationCenter {
    /// Create an empty center whose notifications live for `lifetime`.
    pub fn new(lifetime: Duration) -> Self {
        Self {
            items: Vec::new(),
            lifetime,
        }
    }

    /// Raise a notification. Also logged at the matching level.
    pub fn push(&mut self, severity: Severity, message: impl Into<String>, now: Instant) {
        let message = message.into();
        match severity {
            Severity::Error => log::error!("{message}"),
            Severity::Warning => log::warn!("{message}"),
            Severity::Info | Severity::Success => log::info!("{message}"),
        }
        if self.items.len() == MAX_VISIBLE {
            self.items.remove(0);
        }
        self.items.push(Notification {
            severity,
            message,
            created_at: now,
        });
    }

    /// Drop expired notifications. Returns `true` if any were removed.
    pub fn expire(&mut self, now: Instant) -> bool {
        let before = self.items.len();
        let lifetime = self.lifetime;
        self.items
            .retain(|n| now.saturating_duration_since(n.created_at) < lifetime);
        self.items.len() != before
    }

    /// Live notifications, oldest first.
    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    /// How long each notification lives.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Whether nothing is showing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
