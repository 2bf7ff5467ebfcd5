//! Shelldock - a terminal window manager.
//!
//! Hosts several shell sessions as floating or tiled windows inside one
//! terminal, with workspaces, a dock of minimized windows, tmux-style prefix
//! bindings and a vim-style copy mode over each window's scrollback.
//!
//! # Architecture
//!
//! - **WindowManager** - Owns every window and all UI state; driven by one
//!   event loop
//! - **Window** - One shell: PTY session, terminal emulator, selection,
//!   copy mode and render caches
//! - **InputRouter** - Turns key and mouse events into manager operations
//! - **Renderer** - Composes cached window layers, the dock and overlays
//!
//! # Modules
//!
//! - [`manager`] - Focus, z-order, workspaces, minimize, tiling
//! - [`window`] - Windows, PTY sessions and the shared emulator
//! - [`copy_mode`] - Scrollback navigation, search and visual selection
//! - [`input`] - Key parsing, prefix state machine, mouse hit-testing
//! - [`layout`] - Tiling and dock geometry
//! - [`animation`] - Geometry transitions
//! - [`render`] - Frame composition and the style cache
//! - [`tui`] - Event loop and terminal guard
//! - [`config`] - Configuration loading/saving

// Rust guideline compliant 2026-02

pub mod animation;
pub mod clipboard;
pub mod config;
pub mod constants;
pub mod copy_mode;
pub mod geometry;
pub mod input;
pub mod layout;
pub mod logging;
pub mod manager;
pub mod notifications;
pub mod render;
pub mod sysstats;
pub mod tui;
pub mod window;

pub use config::Config;
pub use geometry::Geometry;
pub use manager::WindowManager;
pub use window::{Window, WindowId};
