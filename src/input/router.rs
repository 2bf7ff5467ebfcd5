//! Dispatches crossterm events into window manager operations.
//!
//! # Key precedence (highest first)
//!
//! 1. Rename capture
//! 2. Copy mode on the focused window
//! 3. Armed prefix chain
//! 4. The prefix chord itself
//! 5. Open overlay (help / logs / cache stats)
//! 6. Selection mode
//! 7. Mode defaults (WindowManagement bindings or Terminal passthrough)
//!
//! Mouse events are hit-tested by descending z. In Terminal mode, a window
//! whose program owns the alternate screen and asked for mouse reporting
//! receives the events instead.

// Rust guideline compliant 2026-02

use std::time::Instant;

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use super::keys::{key_to_pty_bytes, paste_bytes};
use super::mouse::{clamp_to_content, encode_mouse, hit_test, HitZone, TitleButton};
use super::{InputMode, PrefixState};
use crate::constants::{DRAG_SWAP_THRESHOLD, MULTI_CLICK_WINDOW, WHEEL_SCROLL_LINES};
use crate::copy_mode::input_request;
use crate::layout::DockLayout;
use crate::manager::{Overlay, SnapTarget, WindowManager};
use crate::window::WindowId;

/// What a left-button drag is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragKind {
    /// Moving a floating window; offset of the grab point from its origin.
    Move { dx: i32, dy: i32 },
    /// Resizing from the bottom-right corner.
    Resize,
    /// Dragging a tiled window's title; swaps on release past a threshold.
    TileSwap { origin: (i32, i32) },
    /// Extending a text selection.
    Select,
    /// Forwarding to the program in the window.
    Forward,
}

#[derive(Debug, Clone)]
struct Drag {
    window: WindowId,
    kind: DragKind,
}

#[derive(Debug, Clone, Copy)]
struct Click {
    at: Instant,
    pos: (i32, i32),
    count: u8,
}

/// Mouse gesture state carried between events.
#[derive(Debug, Default)]
pub struct InputRouter {
    drag: Option<Drag>,
    last_click: Option<Click>,
}

/// Digit for a workspace key, and whether it was shifted (`shift+1` arrives
/// as `!` on US layouts).
fn workspace_digit(key: &KeyEvent) -> Option<(usize, bool)> {
    let KeyCode::Char(c) = key.code else {
        return None;
    };
    let shifted = "!@#$%^&*(";
    if let Some(pos) = shifted.find(c) {
        return Some((pos + 1, true));
    }
    let d = c.to_digit(10).filter(|d| (1..=9).contains(d))?;
    Some((d as usize, key.modifiers.contains(KeyModifiers::SHIFT)))
}

impl InputRouter {
    /// Create a router with no gesture in progress.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a drag or resize is in progress (the loop slows its frame
    /// rate while this holds).
    pub fn is_interactive(&self) -> bool {
        self.drag.as_ref().is_some_and(|d| {
            matches!(
                d.kind,
                DragKind::Move { .. } | DragKind::Resize | DragKind::TileSwap { .. }
            )
        })
    }

    /// Handle one terminal event.
    pub fn handle_event(&mut self, wm: &mut WindowManager, event: &Event, now: Instant) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(wm, *key, now),
            Event::Mouse(mouse) => self.handle_mouse(wm, *mouse, now),
            Event::Paste(text) => handle_paste(wm, text),
            Event::Resize(cols, rows) => wm.resize_viewport(*cols, *rows, now),
            _ => {}
        }
    }

    // ========================================================================
    // Keyboard
    // ========================================================================

    fn handle_key(&mut self, wm: &mut WindowManager, key: KeyEvent, now: Instant) {
        if wm.rename().is_some() {
            handle_rename_key(wm, key);
            return;
        }
        if wm.focused_in_copy_mode() {
            wm.copy_mode_key(key, now);
            return;
        }
        if wm.prefix().is_armed() {
            handle_prefix_key(wm, key, now);
            return;
        }
        if wm.prefix_key().matches(&key) {
            wm.prefix_mut().arm(now);
            return;
        }
        if let Some(overlay) = wm.overlay() {
            handle_overlay_key(wm, overlay, key);
            return;
        }
        if wm.selection_mode() {
            handle_selection_key(wm, key, now);
            return;
        }
        match wm.mode() {
            InputMode::Terminal => forward_key(wm, key),
            InputMode::WindowManagement => handle_wm_key(wm, key, now),
        }
    }

    // ========================================================================
    // Mouse
    // ========================================================================

    fn handle_mouse(&mut self, wm: &mut WindowManager, mouse: MouseEvent, now: Instant) {
        let (col, row) = (i32::from(mouse.column), i32::from(mouse.row));
        wm.set_pointer(col, row);

        match mouse.kind {
            MouseEventKind::Down(button) => self.mouse_down(wm, mouse, button, now),
            MouseEventKind::Drag(_) => self.mouse_drag(wm, mouse),
            MouseEventKind::Up(_) => self.mouse_up(wm, mouse, now),
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
                let up = mouse.kind == MouseEventKind::ScrollUp;
                if wm.overlay().is_some() {
                    wm.scroll_overlay(if up { -3 } else { 3 });
                    return;
                }
                let Some((index, zone)) = hit_test(wm, col, row) else {
                    return;
                };
                if try_forward_mouse(wm, index, zone, mouse) {
                    return;
                }
                let lines = WHEEL_SCROLL_LINES as isize;
                wm.scroll_window(index, if up { lines } else { -lines });
            }
            MouseEventKind::Moved => {
                if let Some((index, zone)) = hit_test(wm, col, row) {
                    try_forward_mouse(wm, index, zone, mouse);
                }
            }
            MouseEventKind::ScrollLeft | MouseEventKind::ScrollRight => {}
        }
    }

    /// Consecutive clicks at the same cell within the multi-click window.
    fn click_count(&mut self, pos: (i32, i32), now: Instant) -> u8 {
        let count = match self.last_click {
            Some(c) if c.pos == pos && now.saturating_duration_since(c.at) <= MULTI_CLICK_WINDOW => {
                (c.count % 3) + 1
            }
            _ => 1,
        };
        self.last_click = Some(Click { at: now, pos, count });
        count
    }

    fn mouse_down(&mut self, wm: &mut WindowManager, mouse: MouseEvent, button: MouseButton, now: Instant) {
        let (col, row) = (i32::from(mouse.column), i32::from(mouse.row));
        self.drag = None;

        let (term_w, term_h) = wm.term_size();
        let dock = DockLayout::new(term_w, term_h);
        if row == dock.row {
            if button == MouseButton::Left {
                if let Some(slot) = dock.slot_at(col) {
                    wm.restore_dock_slot(slot, now);
                } else if let Some(ws) = dock.workspace_at(col) {
                    wm.switch_workspace(ws, now);
                }
            }
            return;
        }

        let Some((index, zone)) = hit_test(wm, col, row) else {
            return;
        };
        wm.focus_window(index);
        if try_forward_mouse(wm, index, zone, mouse) {
            self.drag = Some(Drag {
                window: wm.windows()[index].id.clone(),
                kind: DragKind::Forward,
            });
            return;
        }
        if button != MouseButton::Left {
            return;
        }

        let g = wm.windows()[index].geometry;
        let id = wm.windows()[index].id.clone();
        let kind = match zone {
            HitZone::Button(TitleButton::Close) => {
                wm.delete_window(index, now);
                None
            }
            HitZone::Button(TitleButton::Minimize) => {
                wm.minimize_window(index, now);
                None
            }
            HitZone::Button(TitleButton::Maximize) => {
                if wm.windows()[index].pre_snap.is_some() {
                    wm.unsnap_focused(now);
                } else {
                    wm.snap_focused(SnapTarget::Full, now);
                }
                None
            }
            HitZone::Title if wm.is_tiling() => Some(DragKind::TileSwap { origin: (col, row) }),
            HitZone::Title => Some(DragKind::Move {
                dx: col - g.x,
                dy: row - g.y,
            }),
            HitZone::ResizeCorner if !wm.is_tiling() => Some(DragKind::Resize),
            HitZone::Content(r, c) if wm.selection_mode() => {
                let clicks = self.click_count((col, row), now);
                wm.begin_selection(index, (r, c), clicks);
                Some(DragKind::Select)
            }
            _ => None,
        };
        self.drag = kind.map(|kind| Drag { window: id, kind });
    }

    fn mouse_drag(&mut self, wm: &mut WindowManager, mouse: MouseEvent) {
        let (col, row) = (i32::from(mouse.column), i32::from(mouse.row));
        let Some(drag) = self.drag.clone() else {
            return;
        };
        let Some(index) = wm.index_of(&drag.window) else {
            self.drag = None;
            return;
        };
        let g = wm.windows()[index].geometry;
        match drag.kind {
            DragKind::Move { dx, dy } => wm.move_window(index, col - dx, row - dy),
            DragKind::Resize => wm.resize_window(index, col - g.x + 1, row - g.y + 1),
            DragKind::Select => wm.extend_selection(index, clamp_to_content(&g, col, row)),
            DragKind::Forward => {
                let (r, c) = clamp_to_content(&g, col, row);
                forward_mouse_at(wm, index, r, c, mouse);
            }
            DragKind::TileSwap { .. } => {}
        }
    }

    fn mouse_up(&mut self, wm: &mut WindowManager, mouse: MouseEvent, now: Instant) {
        let (col, row) = (i32::from(mouse.column), i32::from(mouse.row));
        let Some(drag) = self.drag.take() else {
            return;
        };
        let Some(index) = wm.index_of(&drag.window) else {
            return;
        };
        match drag.kind {
            DragKind::TileSwap { origin } => {
                let moved = (col - origin.0).abs().max((row - origin.1).abs());
                if moved <= DRAG_SWAP_THRESHOLD {
                    return;
                }
                if let Some((target, _)) = hit_test(wm, col, row).filter(|(t, _)| *t != index) {
                    wm.swap_windows(index, target, now);
                }
            }
            DragKind::Select => {
                let empty = wm.windows()[index].selection.is_none_or(|s| s.is_empty());
                if empty {
                    if let Some(w) = wm.window_mut(index) {
                        w.selection = None;
                        w.mark_content_dirty();
                    }
                } else {
                    wm.yank_selection(index, now);
                }
            }
            DragKind::Forward => {
                let g = wm.windows()[index].geometry;
                let (r, c) = clamp_to_content(&g, col, row);
                forward_mouse_at(wm, index, r, c, mouse);
            }
            DragKind::Move { .. } | DragKind::Resize => {}
        }
    }
}

/// Forward `mouse` to window `index` if we are in Terminal mode, the hit is
/// on content, and the program owns the alternate screen with mouse
/// reporting on. Returns whether it was forwarded.
fn try_forward_mouse(wm: &mut WindowManager, index: usize, zone: HitZone, mouse: MouseEvent) -> bool {
    let HitZone::Content(r, c) = zone else {
        return false;
    };
    if wm.mode() != InputMode::Terminal || wm.selection_mode() {
        return false;
    }
    let w = &wm.windows()[index];
    if !w.terminal().is_alternate_screen() || w.terminal().mouse_reporting().is_none() {
        return false;
    }
    forward_mouse_at(wm, index, r, c, mouse);
    true
}

fn forward_mouse_at(wm: &mut WindowManager, index: usize, row: u16, col: u16, mouse: MouseEvent) {
    let Some(w) = wm.window_mut(index) else {
        return;
    };
    let Some((mode, encoding)) = w.terminal().mouse_reporting() else {
        return;
    };
    if let Some(bytes) = encode_mouse(mouse.kind, mouse.modifiers, row, col, mode, encoding) {
        if let Err(e) = w.session().write(&bytes) {
            log::debug!("Mouse forward failed: {e:#}");
        }
    }
}

// ============================================================================
// Key handlers
// ============================================================================

fn handle_rename_key(wm: &mut WindowManager, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => wm.finish_rename(true),
        KeyCode::Esc => wm.finish_rename(false),
        code => {
            let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
            if let (Some(req), Some(rename)) = (input_request(code, ctrl), wm.rename_mut()) {
                rename.input.handle(req);
            }
        }
    }
}

fn handle_prefix_key(wm: &mut WindowManager, key: KeyEvent, now: Instant) {
    let state = wm.prefix().state();
    let since = wm.prefix().since().unwrap_or(now);
    wm.prefix_mut().clear();
    if key.code == KeyCode::Esc {
        return;
    }
    match state {
        PrefixState::None => {}
        PrefixState::Prefix => prefix_command(wm, key, since, now),
        PrefixState::Workspace => {
            if let Some((ws, shifted)) = workspace_digit(&key) {
                if shifted {
                    wm.move_focused_to_workspace(ws, now);
                } else {
                    wm.switch_workspace(ws, now);
                }
            }
        }
        PrefixState::Minimize => match key.code {
            KeyCode::Char('m') => wm.minimize_focused(now),
            KeyCode::Char('M') => wm.restore_all(now),
            KeyCode::Char(c @ '1'..='9') => {
                let slot = c as usize - '1' as usize;
                wm.restore_dock_slot(slot, now);
            }
            _ => {}
        },
        PrefixState::Tiling => match key.code {
            KeyCode::Char('t') => wm.toggle_tiling(now),
            KeyCode::Char('r') => wm.retile(now),
            KeyCode::Char('n') => wm.swap_focused(true, now),
            KeyCode::Char('p') => wm.swap_focused(false, now),
            KeyCode::Char('h') => wm.snap_focused(SnapTarget::Left, now),
            KeyCode::Char('l') => wm.snap_focused(SnapTarget::Right, now),
            KeyCode::Char('k') => wm.snap_focused(SnapTarget::Full, now),
            KeyCode::Char('j') => wm.unsnap_focused(now),
            _ => {}
        },
    }
}

fn prefix_command(wm: &mut WindowManager, key: KeyEvent, since: Instant, now: Instant) {
    if wm.prefix_key().matches(&key) {
        if let (Some(bytes), Some(w)) = (wm.prefix_key().to_pty_bytes(), wm.focused_window_mut()) {
            if let Err(e) = w.write_input(&bytes) {
                log::debug!("Literal prefix write failed: {e:#}");
            }
        }
        return;
    }
    match key.code {
        KeyCode::Char('c') => {
            wm.add_window(None, now);
        }
        KeyCode::Char('x') => wm.close_focused(now),
        KeyCode::Char('n') => wm.cycle_focus(true),
        KeyCode::Char('p') => wm.cycle_focus(false),
        KeyCode::Char(',') => wm.start_rename(),
        KeyCode::Char('[') => {
            wm.enter_copy_mode();
        }
        KeyCode::Char('d') => wm.enter_wm_mode(),
        KeyCode::Char('?') => wm.show_overlay(Overlay::Help { scroll: 0 }),
        KeyCode::Char('L') => wm.show_overlay(Overlay::Logs { scroll: 0 }),
        KeyCode::Char('S') => wm.show_overlay(Overlay::CacheStats),
        KeyCode::Char('w') => descend(wm, PrefixState::Workspace, since),
        KeyCode::Char('m') => descend(wm, PrefixState::Minimize, since),
        KeyCode::Char('t') => descend(wm, PrefixState::Tiling, since),
        _ => {}
    }
}

/// Re-arm the chain in a sub-state, keeping the first prefix press as the
/// activation time.
fn descend(wm: &mut WindowManager, state: PrefixState, since: Instant) {
    let chain = wm.prefix_mut();
    chain.arm(since);
    chain.descend(state);
}

fn handle_overlay_key(wm: &mut WindowManager, overlay: Overlay, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => wm.close_overlay(),
        KeyCode::Char('?') if matches!(overlay, Overlay::Help { .. }) => wm.close_overlay(),
        KeyCode::Char('r') if overlay == Overlay::CacheStats => wm.request_cache_reset(),
        KeyCode::Char('j') | KeyCode::Down => wm.scroll_overlay(1),
        KeyCode::Char('k') | KeyCode::Up => wm.scroll_overlay(-1),
        KeyCode::PageDown => wm.scroll_overlay(10),
        KeyCode::PageUp => wm.scroll_overlay(-10),
        _ => {}
    }
}

fn handle_selection_key(wm: &mut WindowManager, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('s') => wm.toggle_selection_mode(),
        KeyCode::Char('h') | KeyCode::Left => wm.move_selection_cursor(0, -1),
        KeyCode::Char('l') | KeyCode::Right => wm.move_selection_cursor(0, 1),
        KeyCode::Char('k') | KeyCode::Up => wm.move_selection_cursor(-1, 0),
        KeyCode::Char('j') | KeyCode::Down => wm.move_selection_cursor(1, 0),
        KeyCode::Char('v') | KeyCode::Char(' ') => wm.toggle_selection_anchor(),
        KeyCode::Char('y') | KeyCode::Enter => {
            if let Some(i) = wm.focused_index() {
                wm.yank_selection(i, now);
            }
        }
        _ => {}
    }
}

fn handle_wm_key(wm: &mut WindowManager, key: KeyEvent, now: Instant) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => wm.request_quit(),
        KeyCode::Char('q') => wm.request_quit(),
        KeyCode::Char('n') => {
            wm.add_window(None, now);
        }
        KeyCode::Char('w' | 'x') => wm.close_focused(now),
        KeyCode::Char('m') => wm.minimize_focused(now),
        KeyCode::Tab => wm.cycle_focus(true),
        KeyCode::BackTab => wm.cycle_focus(false),
        KeyCode::Char(c @ '1'..='4') => {
            if let Some(target) = SnapTarget::corner(c as u8 - b'0') {
                wm.snap_focused(target, now);
            }
        }
        KeyCode::Char('h') => wm.snap_focused(SnapTarget::Left, now),
        KeyCode::Char('l') => wm.snap_focused(SnapTarget::Right, now),
        KeyCode::Char('k') => wm.snap_focused(SnapTarget::Full, now),
        KeyCode::Char('j') => wm.unsnap_focused(now),
        KeyCode::Char('s') => wm.toggle_selection_mode(),
        KeyCode::Char('t') => wm.toggle_tiling(now),
        KeyCode::Char('i') | KeyCode::Enter => {
            wm.enter_terminal_mode();
        }
        KeyCode::Char('?') => wm.show_overlay(Overlay::Help { scroll: 0 }),
        KeyCode::Char('[') => {
            wm.enter_copy_mode();
        }
        _ => {}
    }
}

fn forward_key(wm: &mut WindowManager, key: KeyEvent) {
    let Some(w) = wm.focused_window_mut() else {
        return;
    };
    let app_cursor = w.terminal().read().screen().application_cursor();
    if let Some(bytes) = key_to_pty_bytes(key.code, key.modifiers, app_cursor) {
        if let Err(e) = w.write_input(&bytes) {
            log::debug!("Key forward failed: {e:#}");
        }
    }
}

fn handle_paste(wm: &mut WindowManager, text: &str) {
    if let Some(rename) = wm.rename_mut() {
        for c in text.chars().filter(|c| !c.is_control()) {
            rename.input.handle(tui_input::InputRequest::InsertChar(c));
        }
        return;
    }
    if wm.mode() != InputMode::Terminal {
        return;
    }
    let Some(w) = wm.focused_window_mut() else {
        return;
    };
    let bracketed = w.terminal().read().screen().bracketed_paste();
    if let Err(e) = w.write_input(&paste_bytes(text, bracketed)) {
        log::debug!("Paste failed: {e:#}");
    }
}
