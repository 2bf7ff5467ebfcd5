//! Windows: one shell session each.
//!
//! A [`Window`] bundles the session ([`PtySession`]), its emulator
//! ([`SharedTerminal`]), placement (geometry, z, workspace, minimize and snap
//! bookkeeping), text selection, copy mode, and the render caches.
//!
//! # Dirty tracking
//!
//! Two caches sit between the emulator and the frame:
//!
//! | Cache            | Holds                         | Invalidated by            |
//! |------------------|-------------------------------|---------------------------|
//! | content cache    | styled text lines             | new output, resize, scroll|
//! | layer cache      | bordered, titled `Buffer`     | anything above, plus move |
//!
//! [`Window::mark_position_dirty`] drops only the layer; moving a window
//! re-blits cached text without re-reading the emulator.
//! [`Window::mark_content_dirty`] drops both.

pub mod pty;
pub mod selection;
pub mod shell;
pub mod terminal;

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use ratatui::buffer::Buffer;
use ratatui::text::Line;

use crate::copy_mode::CopyMode;
use crate::geometry::Geometry;
pub use pty::{DetachedSpawner, ProcessExit, PtySession, SessionSpawner, ShellSpawner, SpawnRequest};
use selection::Selection;
pub use terminal::{FrozenScreen, SharedTerminal};

/// Stable window identifier (UUID v4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(String);

impl WindowId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Full id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for logs.
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl From<&str> for WindowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which caches need rebuilding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirtyFlags {
    /// Geometry, z or decoration changed.
    pub position: bool,
    /// Terminal content changed.
    pub content: bool,
}

/// Styled text rendered from the emulator.
#[derive(Debug, Clone)]
pub struct ContentCache {
    /// One line per content row.
    pub lines: Vec<Line<'static>>,
    /// Emulator generation the lines were built from.
    pub generation: u64,
    /// Scroll offset the lines were built at.
    pub scroll_offset: usize,
}

/// A composed window layer ready to blit.
#[derive(Debug, Clone)]
pub struct LayerCache {
    /// Full window image, border included, origin at (0, 0).
    pub buffer: Buffer,
    /// Geometry the layer was composed for.
    pub geometry: Geometry,
    /// Z the layer was composed at.
    pub z: usize,
    /// Whether the window was focused when composed.
    pub focused: bool,
}

/// One managed shell window.
pub struct Window {
    /// Stable id.
    pub id: WindowId,
    /// Default title (used when neither a custom name nor an OSC title exists).
    pub title: String,
    /// Name set by the user via rename.
    pub custom_name: Option<String>,
    /// Displayed geometry (animated).
    pub geometry: Geometry,
    /// Stacking order; higher is on top.
    pub z: usize,
    /// Workspace this window lives on (1-based).
    pub workspace: usize,
    /// Fully minimized to the dock.
    pub minimized: bool,
    /// Minimize animation in flight.
    pub minimizing: bool,
    /// Monotonic stamp of the last minimize; orders dock slots.
    pub minimize_order: u64,
    /// Geometry before minimizing, restored on un-minimize.
    pub pre_minimize: Option<Geometry>,
    /// Geometry before the first snap, restored on unsnap.
    pub pre_snap: Option<Geometry>,
    /// Position in the tiling order; swapping trades these.
    pub tile_order: u64,
    /// Text selection in the visible content.
    pub selection: Option<Selection>,
    /// Keyboard cursor for selection mode, `(row, col)`.
    pub selection_cursor: (u16, u16),
    /// Lines scrolled back outside copy mode.
    pub scroll_offset: usize,
    /// Copy mode state, created on first use.
    pub copy_mode: Option<CopyMode>,
    /// Emulator copy that copy mode reads and draws while active.
    frozen: Option<FrozenScreen>,
    /// Cached styled content.
    pub content_cache: Option<ContentCache>,
    /// Cached composed layer.
    pub layer_cache: Option<LayerCache>,
    dirty: DirtyFlags,
    degraded: bool,
    terminal: Arc<SharedTerminal>,
    session: PtySession,
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id.short())
            .field("title", &self.display_name())
            .field("geometry", &self.geometry)
            .field("z", &self.z)
            .field("workspace", &self.workspace)
            .field("minimized", &self.minimized)
            .field("minimizing", &self.minimizing)
            .finish_non_exhaustive()
    }
}

impl Window {
    /// Wrap a started session.
    pub fn new(
        id: WindowId,
        title: impl Into<String>,
        geometry: Geometry,
        workspace: usize,
        terminal: Arc<SharedTerminal>,
        session: PtySession,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            custom_name: None,
            geometry,
            z: 0,
            workspace,
            minimized: false,
            minimizing: false,
            minimize_order: 0,
            pre_minimize: None,
            pre_snap: None,
            tile_order: 0,
            selection: None,
            selection_cursor: (0, 0),
            scroll_offset: 0,
            copy_mode: None,
            frozen: None,
            content_cache: None,
            layer_cache: None,
            dirty: DirtyFlags {
                position: true,
                content: true,
            },
            degraded: false,
            terminal,
            session,
        }
    }

    /// Name shown in the title bar and dock: custom name, then the
    /// program's OSC title, then the default title.
    pub fn display_name(&self) -> String {
        self.custom_name
            .clone()
            .or_else(|| self.terminal.title())
            .unwrap_or_else(|| self.title.clone())
    }

    /// The window's emulator.
    pub fn terminal(&self) -> &Arc<SharedTerminal> {
        &self.terminal
    }

    /// The window's session.
    pub fn session(&self) -> &PtySession {
        &self.session
    }

    /// Whether the window shows on screen (not minimized or minimizing).
    pub fn is_visible(&self) -> bool {
        !self.minimized && !self.minimizing
    }

    /// Current dirty flags.
    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    /// Clear both dirty flags after a render.
    pub fn clear_dirty(&mut self) {
        self.dirty = DirtyFlags::default();
    }

    /// Geometry, z or decoration changed: drop the composed layer only.
    pub fn mark_position_dirty(&mut self) {
        self.dirty.position = true;
        self.layer_cache = None;
    }

    /// Content changed: drop both caches.
    pub fn mark_content_dirty(&mut self) {
        self.dirty.content = true;
        self.dirty.position = true;
        self.content_cache = None;
        self.layer_cache = None;
    }

    /// Scroll offset the content should be rendered at.
    pub fn view_offset(&self) -> usize {
        match &self.copy_mode {
            Some(cm) if cm.active => cm.scroll_offset,
            _ => self.scroll_offset,
        }
    }

    /// Whether cached text no longer matches what the window shows.
    pub fn content_stale(&self) -> bool {
        self.content_cache.as_ref().is_none_or(|c| {
            c.generation != self.content_generation() || c.scroll_offset != self.view_offset()
        })
    }

    /// Generation of the grid the window draws: the frozen copy while copy
    /// mode is active, the live emulator otherwise.
    pub fn content_generation(&self) -> u64 {
        match self.frozen_screen() {
            Some(frozen) => frozen.generation(),
            None => self.terminal.generation(),
        }
    }

    /// The frozen grid copy mode is drawn from, while copy mode is active.
    pub fn frozen_screen(&self) -> Option<&FrozenScreen> {
        self.frozen.as_ref().filter(|_| self.in_copy_mode())
    }

    /// Mutable access to the frozen grid, while copy mode is active.
    pub fn frozen_screen_mut(&mut self) -> Option<&mut FrozenScreen> {
        if !self.in_copy_mode() {
            return None;
        }
        self.frozen.as_mut()
    }

    /// Move/resize the displayed geometry without touching the PTY.
    ///
    /// Used for animation frames and drags; call
    /// [`sync_terminal_size`](Self::sync_terminal_size) once the geometry
    /// settles.
    pub fn place(&mut self, geometry: Geometry) {
        if geometry != self.geometry {
            self.geometry = geometry;
            self.mark_position_dirty();
        }
    }

    /// Set geometry and resize the PTY to match.
    pub fn set_geometry(&mut self, geometry: Geometry) -> Result<bool> {
        self.place(geometry);
        self.sync_terminal_size()
    }

    /// Resize the emulator and PTY to the current geometry. Returns `true`
    /// when the size changed.
    pub fn sync_terminal_size(&mut self) -> Result<bool> {
        let (rows, cols) = self.geometry.content_size();
        let changed = self.session.resize(rows, cols)?;
        if changed {
            self.scroll_offset = 0;
            if let Some(cm) = self.copy_mode.as_mut() {
                cm.exit();
            }
            self.frozen = None;
            self.selection = None;
            self.mark_content_dirty();
        }
        Ok(changed)
    }

    /// Send bytes to the shell. Typing always returns the view to the live
    /// screen.
    pub fn write_input(&mut self, bytes: &[u8]) -> Result<()> {
        if self.scroll_offset != 0 {
            self.scroll_offset = 0;
            self.mark_content_dirty();
        }
        self.session.write(bytes)
    }

    /// Scroll the plain (non copy-mode) view by `delta` lines; positive is up.
    pub fn scroll_view(&mut self, delta: isize) {
        let max = self.terminal.scrollback_len();
        let next = self.scroll_offset.saturating_add_signed(delta).min(max);
        if next != self.scroll_offset {
            self.scroll_offset = next;
            self.mark_content_dirty();
        }
    }

    /// Whether copy mode is active.
    pub fn in_copy_mode(&self) -> bool {
        self.copy_mode.as_ref().is_some_and(|cm| cm.active)
    }

    /// Enter copy mode over a fresh snapshot, reusing the existing state.
    ///
    /// The emulator is copied once here. Copy mode draws, searches and yanks
    /// from that copy until it exits, so later output cannot move text away
    /// from the cursor or highlights.
    pub fn enter_copy_mode(&mut self) {
        let mut frozen = self.terminal.freeze();
        let lines = frozen.lines();
        let (rows, cols) = frozen.screen_mut().size();
        self.frozen = Some(frozen);
        self.scroll_offset = 0;
        self.copy_mode
            .get_or_insert_with(CopyMode::default)
            .enter(lines, rows, cols);
        self.mark_content_dirty();
    }

    /// Leave copy mode; the view returns to the live screen.
    pub fn exit_copy_mode(&mut self) {
        if let Some(cm) = self.copy_mode.as_mut() {
            cm.exit();
        }
        self.frozen = None;
        self.mark_content_dirty();
    }

    /// The visible rows as plain text (at the current view offset).
    pub fn visible_rows(&self) -> Vec<String> {
        let offset = self.view_offset();
        let mut parser = self.terminal.write();
        let saved = parser.screen().scrollback();
        parser.screen_mut().set_scrollback(offset);
        let (_, cols) = parser.screen().size();
        let rows: Vec<String> = parser.screen().rows(0, cols).collect();
        parser.screen_mut().set_scrollback(saved);
        rows
    }

    /// Whether this window has already been degraded after an I/O failure.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Record that an I/O failure was handled. Returns `true` the first time.
    pub fn mark_degraded(&mut self) -> bool {
        let first = !self.degraded;
        self.degraded = true;
        self.mark_content_dirty();
        first
    }

    /// Stop the session and drop render state. Idempotent.
    pub fn close(&mut self) {
        self.session.close();
        self.content_cache = None;
        self.layer_cache = None;
        self.copy_mode = None;
        self.frozen = None;
        self.selection = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> Window {
        let id = WindowId::from("0123456789");
        let terminal = Arc::new(SharedTerminal::new(8, 38, 100));
        let session = PtySession::detached(id.clone(), Arc::clone(&terminal));
        Window::new(id, "Terminal 1", Geometry::new(0, 0, 40, 10), 1, terminal, session)
    }

    #[test]
    fn test_short_id() {
        assert_eq!(WindowId::from("0123456789").short(), "01234567");
        assert_eq!(WindowId::from("abc").short(), "abc");
        assert_eq!(WindowId::generate().as_str().len(), 36);
    }

    #[test]
    fn test_display_name_priority() {
        let mut w = window();
        assert_eq!(w.display_name(), "Terminal 1");
        w.terminal().process(b"\x1b]2;vim\x07");
        assert_eq!(w.display_name(), "vim");
        w.custom_name = Some("editor".into());
        assert_eq!(w.display_name(), "editor");
    }

    #[test]
    fn test_place_only_marks_position() {
        let mut w = window();
        w.clear_dirty();
        w.place(Geometry::new(5, 5, 40, 10));
        assert!(w.dirty().position);
        assert!(!w.dirty().content);
    }

    #[test]
    fn test_set_geometry_resizes_terminal() {
        let mut w = window();
        w.clear_dirty();
        assert!(w.set_geometry(Geometry::new(0, 0, 62, 22)).unwrap());
        assert_eq!(w.terminal().size(), (20, 60));
        assert!(w.dirty().content);
    }

    #[test]
    fn test_content_stale_tracks_generation() {
        let mut w = window();
        w.content_cache = Some(ContentCache {
            lines: Vec::new(),
            generation: w.terminal().generation(),
            scroll_offset: 0,
        });
        assert!(!w.content_stale());
        w.terminal().process(b"x");
        assert!(w.content_stale());
    }

    #[test]
    fn test_write_input_resets_scroll() {
        let mut w = window();
        for i in 0..40 {
            w.terminal().process(format!("{i}\r\n").as_bytes());
        }
        w.scroll_view(5);
        assert_eq!(w.scroll_offset, 5);
        w.write_input(b"a").unwrap();
        assert_eq!(w.scroll_offset, 0);
        assert_eq!(w.session().captured_input(), b"a");
    }

    #[test]
    fn test_copy_mode_roundtrip() {
        let mut w = window();
        w.enter_copy_mode();
        assert!(w.in_copy_mode());
        w.exit_copy_mode();
        assert!(!w.in_copy_mode());
        assert_eq!(w.view_offset(), 0);
    }

    #[test]
    fn test_copy_mode_reads_frozen_grid() {
        let mut w = window();
        w.terminal().process(b"before");
        w.enter_copy_mode();
        w.content_cache = Some(ContentCache {
            lines: Vec::new(),
            generation: w.content_generation(),
            scroll_offset: 0,
        });
        w.terminal().process(b" after");
        assert!(!w.content_stale());
        assert!(w.frozen_screen().is_some());

        w.exit_copy_mode();
        assert!(w.frozen_screen().is_none());
        assert_eq!(w.content_generation(), w.terminal().generation());
    }

    #[test]
    fn test_close_twice() {
        let mut w = window();
        w.enter_copy_mode();
        w.close();
        w.close();
        assert!(w.copy_mode.is_none());
        assert!(w.session().is_closed());
    }
}
