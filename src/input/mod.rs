//! Input routing: modes, the prefix chain, key encoding and mouse handling.
//!
//! # Mode machine
//!
//! ```text
//!                 i / Enter
//!   WindowManagement ─────────► Terminal
//!          ▲      ◄──────────────  │
//!          │       prefix d        │ keys go to the focused shell
//!
//!   Prefix chain (either mode):
//!
//!   None ──prefix──► Prefix ──w──► Workspace ──key──► None
//!                       │ ──m──► Minimize  ──key──► None
//!                       │ ──t──► Tiling    ──key──► None
//!                       └─key─► None
//! ```
//!
//! The whole chain shares one activation timestamp and expires together.

pub mod keys;
pub mod mouse;
pub mod router;

use std::time::{Duration, Instant};

pub use keys::{key_to_pty_bytes, paste_bytes, KeyCombo};
pub use router::InputRouter;

/// Top-level input mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Single keys drive the window manager.
    #[default]
    WindowManagement,
    /// Keys pass through to the focused window's shell.
    Terminal,
}

impl InputMode {
    /// Label for the dock's mode indicator.
    pub fn label(&self) -> &'static str {
        match self {
            InputMode::WindowManagement => "WM",
            InputMode::Terminal => "TERM",
        }
    }
}

/// Position in the prefix chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrefixState {
    /// No prefix pending.
    #[default]
    None,
    /// Prefix pressed; waiting for a command key.
    Prefix,
    /// `prefix w`: waiting for a workspace number.
    Workspace,
    /// `prefix m`: waiting for a minimize/restore key.
    Minimize,
    /// `prefix t`: waiting for a tiling key.
    Tiling,
}

impl PrefixState {
    /// Dock label while armed.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            PrefixState::None => None,
            PrefixState::Prefix => Some("PREFIX"),
            PrefixState::Workspace => Some("WORKSPACE"),
            PrefixState::Minimize => Some("MINIMIZE"),
            PrefixState::Tiling => Some("TILING"),
        }
    }
}

/// The prefix state plus the single timestamp the chain expires from.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixChain {
    state: PrefixState,
    since: Option<Instant>,
}

impl PrefixChain {
    /// Current state.
    pub fn state(&self) -> PrefixState {
        self.state
    }

    /// Whether any part of the chain is armed.
    pub fn is_armed(&self) -> bool {
        self.state != PrefixState::None
    }

    /// When the chain was armed.
    pub fn since(&self) -> Option<Instant> {
        self.since
    }

    /// Arm the bare prefix.
    pub fn arm(&mut self, now: Instant) {
        self.state = PrefixState::Prefix;
        self.since = Some(now);
    }

    /// Step into a sub-prefix. The activation time is kept, so the chain
    /// still expires relative to the original prefix press.
    pub fn descend(&mut self, state: PrefixState) {
        self.state = state;
    }

    /// Disarm.
    pub fn clear(&mut self) {
        self.state = PrefixState::None;
        self.since = None;
    }

    /// Disarm if `timeout` has passed since activation. Returns `true` if it
    /// expired on this call.
    pub fn expire(&mut self, now: Instant, timeout: Duration) -> bool {
        match self.since {
            Some(t) if self.is_armed() && now.saturating_duration_since(t) >= timeout => {
                self.clear();
                true
            }
            _ => false,
        }
    }

    /// Whether the which-key hint should show: armed for at least `delay`.
    pub fn hint_due(&self, now: Instant, delay: Duration) -> bool {
        self.is_armed()
            && self
                .since
                .is_some_and(|t| now.saturating_duration_since(t) >= delay)
    }
}
