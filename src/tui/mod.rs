//! TUI - the event loop and terminal state handling.
//!
//! # Modules
//!
//! - [`guard`] - Terminal state RAII guard for cleanup
//! - [`runner`] - `Runner` struct and the event loop

// Rust guideline compliant 2026-02

pub mod guard;
pub mod runner;

#[doc(inline)]
pub use guard::{restore_terminal, TerminalGuard};
#[doc(inline)]
pub use runner::{CrosstermEvents, EventSource, Runner};
