//! The window manager: every window, the focus, workspaces, animations and
//! input modes.
//!
//! `WindowManager` is owned by the event loop and never shared across
//! threads. Background PTY threads only touch their own window's emulator
//! and report exits through a bounded channel that [`WindowManager::tick`]
//! drains.
//!
//! # Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────┐ row 0
//! │  windows of the current workspace            │
//! │  (floating or tiled, drawn by ascending z)   │
//! │                                              │
//! ├──────────────────────────────────────────────┤ row h-1
//! │ dock: mode │ workspaces │ minimized pills    │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Operations are split by concern:
//!
//! - `focus`: focus changes and z renumbering
//! - `lifecycle`: add/delete, exits, I/O failures, rename, resize
//! - `workspace`: switching and moving between workspaces
//! - `minimize`: minimize/restore and dock ordering
//! - `arrange`: snapping, tiling, swapping, animations
//! - `copy`: copy mode, selection and scrolling

// Rust guideline compliant 2026-02

mod arrange;
mod copy;
mod focus;
mod lifecycle;
mod minimize;
mod workspace;

use std::collections::HashMap;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::animation::Animation;
use crate::clipboard::Clipboard;
use crate::config::Config;
use crate::constants::{DOCK_HEIGHT, EXIT_CHANNEL_CAPACITY};
use crate::geometry::Geometry;
use crate::input::{InputMode, KeyCombo, PrefixChain};
use crate::logging::LogBuffer;
use crate::notifications::{NotificationCenter, Severity};
use crate::sysstats::SystemStats;
use crate::window::{ProcessExit, SessionSpawner, Window, WindowId};

pub use arrange::SnapTarget;

/// A full-screen panel drawn over the windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    /// Key binding reference.
    Help {
        /// First line shown.
        scroll: u16,
    },
    /// Recent log lines.
    Logs {
        /// Lines scrolled up from the newest entry.
        scroll: u16,
    },
    /// Style cache counters.
    CacheStats,
}

/// In-progress window rename.
#[derive(Debug)]
pub struct Rename {
    /// Window being renamed.
    pub window: WindowId,
    /// Name being typed.
    pub input: tui_input::Input,
}

/// Owns and arranges all windows.
pub struct WindowManager {
    windows: Vec<Window>,
    focused: Option<usize>,
    current_workspace: usize,
    workspace_focus: HashMap<usize, WindowId>,
    animations: Vec<Animation>,
    mode: InputMode,
    prefix: PrefixChain,
    prefix_key: KeyCombo,
    selection_mode: bool,
    rename: Option<Rename>,
    overlay: Option<Overlay>,
    notifications: NotificationCenter,
    tiling: bool,
    config: Config,
    spawner: Box<dyn SessionSpawner>,
    exit_tx: mpsc::Sender<ProcessExit>,
    exit_rx: mpsc::Receiver<ProcessExit>,
    clipboard: Clipboard,
    log_buffer: Option<LogBuffer>,
    stats: SystemStats,
    term_size: (u16, u16),
    last_pointer: Option<(i32, i32)>,
    last_minimize_stamp: u64,
    next_tile_order: u64,
    windows_created: usize,
    cache_reset_requested: bool,
    quit: bool,
}

impl std::fmt::Debug for WindowManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowManager")
            .field("windows", &self.windows.len())
            .field("focused", &self.focused)
            .field("workspace", &self.current_workspace)
            .field("mode", &self.mode)
            .field("tiling", &self.tiling)
            .field("animations", &self.animations.len())
            .finish_non_exhaustive()
    }
}

impl WindowManager {
    /// Create an empty manager for a terminal of `term_size` (columns, rows).
    pub fn new(config: Config, spawner: Box<dyn SessionSpawner>, term_size: (u16, u16)) -> Self {
        let (exit_tx, exit_rx) = mpsc::channel(EXIT_CHANNEL_CAPACITY);
        let mut notifications = NotificationCenter::new(config.notification_duration());
        let prefix_key = match KeyCombo::parse(&config.prefix) {
            Ok(combo) => combo,
            Err(e) => {
                notifications.push(
                    Severity::Warning,
                    format!("Invalid prefix {:?} ({e}); using ctrl+b", config.prefix),
                    Instant::now(),
                );
                KeyCombo {
                    code: crossterm::event::KeyCode::Char('b'),
                    modifiers: crossterm::event::KeyModifiers::CONTROL,
                }
            }
        };
        Self {
            windows: Vec::new(),
            focused: None,
            current_workspace: 1,
            workspace_focus: HashMap::new(),
            animations: Vec::new(),
            mode: InputMode::WindowManagement,
            prefix: PrefixChain::default(),
            prefix_key,
            selection_mode: false,
            rename: None,
            overlay: None,
            notifications,
            tiling: config.tiling,
            config,
            spawner,
            exit_tx,
            exit_rx,
            clipboard: Clipboard::memory(),
            log_buffer: None,
            stats: SystemStats::new(),
            term_size,
            last_pointer: None,
            last_minimize_stamp: 0,
            next_tile_order: 0,
            windows_created: 0,
            cache_reset_requested: false,
            quit: false,
        }
    }

    /// Use `clipboard` for yanks.
    pub fn with_clipboard(mut self, clipboard: Clipboard) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// Show `buffer` in the log viewer.
    pub fn with_log_buffer(mut self, buffer: LogBuffer) -> Self {
        self.log_buffer = Some(buffer);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// All windows, in list order.
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    /// Window at `index`.
    pub fn window(&self, index: usize) -> Option<&Window> {
        self.windows.get(index)
    }

    /// Mutable window at `index`.
    pub fn window_mut(&mut self, index: usize) -> Option<&mut Window> {
        self.windows.get_mut(index)
    }

    /// Index of the window with `id`.
    pub fn index_of(&self, id: &WindowId) -> Option<usize> {
        self.windows.iter().position(|w| &w.id == id)
    }

    /// Number of windows across all workspaces.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether there are no windows.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Focused window index.
    pub fn focused_index(&self) -> Option<usize> {
        self.focused
    }

    /// Focused window.
    pub fn focused_window(&self) -> Option<&Window> {
        self.focused.and_then(|i| self.windows.get(i))
    }

    /// Focused window, mutably.
    pub fn focused_window_mut(&mut self) -> Option<&mut Window> {
        self.focused.and_then(|i| self.windows.get_mut(i))
    }

    /// Current workspace (1-based).
    pub fn current_workspace(&self) -> usize {
        self.current_workspace
    }

    /// Workspaces that hold at least one window.
    pub fn occupied_workspaces(&self) -> Vec<usize> {
        let mut ws: Vec<usize> = self.windows.iter().map(|w| w.workspace).collect();
        ws.sort_unstable();
        ws.dedup();
        ws
    }

    /// Active animations.
    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    /// Whether `id` is mid-animation.
    pub fn is_animating(&self, id: &WindowId) -> bool {
        self.animations.iter().any(|a| &a.window_id == id)
    }

    /// Input mode.
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Prefix chain.
    pub fn prefix(&self) -> &PrefixChain {
        &self.prefix
    }

    /// Prefix chain, mutably.
    pub fn prefix_mut(&mut self) -> &mut PrefixChain {
        &mut self.prefix
    }

    /// The configured prefix chord.
    pub fn prefix_key(&self) -> KeyCombo {
        self.prefix_key
    }

    /// Whether tiling is on.
    pub fn is_tiling(&self) -> bool {
        self.tiling
    }

    /// Settings the manager was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether selection mode is on.
    pub fn selection_mode(&self) -> bool {
        self.selection_mode
    }

    /// Active rename, if any.
    pub fn rename(&self) -> Option<&Rename> {
        self.rename.as_ref()
    }

    /// Open overlay.
    pub fn overlay(&self) -> Option<Overlay> {
        self.overlay
    }

    /// Notifications.
    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// Clipboard.
    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// Log buffer shown by the log viewer.
    pub fn log_buffer(&self) -> Option<&LogBuffer> {
        self.log_buffer.as_ref()
    }

    /// CPU/RAM figures.
    pub fn stats(&self) -> &SystemStats {
        &self.stats
    }

    /// Terminal size as (columns, rows).
    pub fn term_size(&self) -> (u16, u16) {
        self.term_size
    }

    /// Area windows may occupy: the terminal minus the dock row.
    pub fn viewport(&self) -> Geometry {
        let (w, h) = self.term_size;
        Geometry::new(0, 0, i32::from(w), (i32::from(h) - DOCK_HEIGHT).max(1))
    }

    /// Whether quit was requested.
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Ask the event loop to exit.
    pub fn request_quit(&mut self) {
        log::info!("Quit requested");
        self.quit = true;
    }

    /// Remember the pointer position; new floating windows open there.
    pub fn set_pointer(&mut self, x: i32, y: i32) {
        self.last_pointer = Some((x, y));
    }

    // ========================================================================
    // Modes and overlays
    // ========================================================================

    /// Switch to Terminal mode. Requires a focused, visible window.
    pub fn enter_terminal_mode(&mut self) -> bool {
        match self.focused_window() {
            Some(w) if w.is_visible() => {
                self.mode = InputMode::Terminal;
                self.selection_mode = false;
                true
            }
            _ => false,
        }
    }

    /// Switch to WindowManagement mode.
    pub fn enter_wm_mode(&mut self) {
        self.mode = InputMode::WindowManagement;
    }

    /// Toggle keyboard/mouse selection mode on the focused window.
    pub fn toggle_selection_mode(&mut self) {
        self.selection_mode = !self.selection_mode && self.focused.is_some();
        if let Some(w) = self.focused_window_mut() {
            w.selection = None;
            w.selection_cursor = (0, 0);
            w.mark_content_dirty();
        }
    }

    /// Open `overlay`, replacing any other.
    pub fn show_overlay(&mut self, overlay: Overlay) {
        self.overlay = Some(overlay);
    }

    /// Close the overlay.
    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    /// Scroll the help or log overlay by `delta` lines.
    pub fn scroll_overlay(&mut self, delta: i32) {
        let apply = |v: u16| -> u16 { (i32::from(v) + delta).clamp(0, i32::from(u16::MAX)) as u16 };
        self.overlay = match self.overlay {
            Some(Overlay::Help { scroll }) => Some(Overlay::Help { scroll: apply(scroll) }),
            Some(Overlay::Logs { scroll }) => Some(Overlay::Logs { scroll: apply(scroll) }),
            other => other,
        };
    }

    /// Ask the renderer to reset its style cache.
    pub fn request_cache_reset(&mut self) {
        self.cache_reset_requested = true;
    }

    /// Consume a pending cache reset request.
    pub fn take_cache_reset(&mut self) -> bool {
        std::mem::take(&mut self.cache_reset_requested)
    }

    /// Begin renaming the focused window.
    pub fn start_rename(&mut self) {
        if let Some(w) = self.focused_window() {
            let input = tui_input::Input::new(w.custom_name.clone().unwrap_or_default());
            self.rename = Some(Rename {
                window: w.id.clone(),
                input,
            });
        }
    }

    /// Rename input, mutably.
    pub fn rename_mut(&mut self) -> Option<&mut Rename> {
        self.rename.as_mut()
    }

    /// Apply or abandon the rename in progress.
    pub fn finish_rename(&mut self, apply: bool) {
        let Some(rename) = self.rename.take() else {
            return;
        };
        if apply {
            if let Some(idx) = self.index_of(&rename.window) {
                self.rename_window(idx, rename.input.value());
            }
        }
    }

    /// Raise a notification.
    pub fn notify(&mut self, severity: Severity, message: impl Into<String>, now: Instant) {
        self.notifications.push(severity, message, now);
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance time-driven state. Returns `true` when anything visible
    /// changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = self.reap_exits(now);
        changed |= self.handle_io_failures(now);
        changed |= self.tick_animations(now);
        changed |= self.notifications.expire(now);
        changed |= self.prefix.expire(now, self.config.prefix_timeout());
        changed |= self.stats.refresh_if_due(now);
        changed
    }

    /// Whether any visible window has output the renderer has not drawn.
    pub fn content_changed(&self) -> bool {
        self.windows
            .iter()
            .any(|w| w.workspace == self.current_workspace && w.is_visible() && w.content_stale())
    }

    /// Close every session. Called once on shutdown.
    pub fn shutdown(&mut self) {
        log::info!("Closing {} window(s)", self.windows.len());
        for w in &mut self.windows {
            w.close();
        }
        self.animations.clear();
    }

    /// Indices of visible windows in the current workspace, in list order.
    fn visible_in_workspace(&self) -> Vec<usize> {
        self.windows
            .iter()
            .enumerate()
            .filter(|(_, w)| w.workspace == self.current_workspace && w.is_visible())
            .map(|(i, _)| i)
            .collect()
    }
}

impl Drop for WindowManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::window::DetachedSpawner;

    /// Manager on a 120x41 terminal (viewport 120x40) without animations.
    pub(crate) fn manager() -> WindowManager {
        let config = Config {
            animations: false,
            ..Config::default()
        };
        WindowManager::new(config, Box::new(DetachedSpawner::default()), (120, 41))
    }

    /// Same, with animations on.
    pub(crate) fn animated_manager() -> WindowManager {
        WindowManager::new(Config::default(), Box::new(DetachedSpawner::default()), (120, 41))
    }

    /// Assert z values are exactly 0..len.
    pub(crate) fn assert_contiguous_z(wm: &WindowManager) {
        let mut zs: Vec<usize> = wm.windows().iter().map(|w| w.z).collect();
        zs.sort_unstable();
        assert_eq!(zs, (0..wm.len()).collect::<Vec<_>>());
    }
}
