//! Copy mode, selection mode and scrollback on the focused window.

use std::time::Instant;

use crossterm::event::KeyEvent;

use super::WindowManager;
use crate::copy_mode::CopyAction;
use crate::input::InputMode;
use crate::notifications::Severity;
use crate::window::selection::{Selection, SelectionMode};

impl WindowManager {
    /// Enter copy mode on the focused window.
    pub fn enter_copy_mode(&mut self) -> bool {
        match self.focused_window_mut() {
            Some(w) if w.is_visible() => {
                w.enter_copy_mode();
                true
            }
            _ => false,
        }
    }

    /// Whether the focused window is in copy mode.
    pub fn focused_in_copy_mode(&self) -> bool {
        self.focused_window().is_some_and(|w| w.in_copy_mode())
    }

    /// Feed a key to the focused window's copy mode.
    pub fn copy_mode_key(&mut self, key: KeyEvent, now: Instant) {
        let Some(w) = self.focused_window_mut() else {
            return;
        };
        let Some(cm) = w.copy_mode.as_mut().filter(|cm| cm.active) else {
            return;
        };
        let action = cm.handle_key(key, now);
        w.mark_content_dirty();
        match action {
            CopyAction::None => {}
            CopyAction::Exit => w.exit_copy_mode(),
            CopyAction::ExitToTerminal => {
                w.exit_copy_mode();
                self.enter_terminal_mode();
            }
            CopyAction::Yank(text) => {
                w.exit_copy_mode();
                self.copy_to_clipboard(&text, now);
            }
        }
    }

    /// Copy `text`, with a notification either way.
    pub fn copy_to_clipboard(&mut self, text: &str, now: Instant) {
        if text.is_empty() {
            return;
        }
        match self.clipboard.set_text(text) {
            Ok(()) => {
                let n = text.chars().count();
                self.notify(Severity::Success, format!("Copied {n} characters"), now);
            }
            Err(e) => self.notify(Severity::Error, format!("{e:#}"), now),
        }
    }

    /// Scroll window `index` by `lines` (positive = back in history).
    ///
    /// Scrolling up enters copy mode; scrolling back to the live screen
    /// leaves it.
    pub fn scroll_window(&mut self, index: usize, lines: isize) {
        let Some(w) = self.windows.get_mut(index) else {
            return;
        };
        if !w.in_copy_mode() {
            if lines <= 0 {
                return;
            }
            w.enter_copy_mode();
        }
        if let Some(cm) = w.copy_mode.as_mut() {
            cm.scroll_by(lines);
            let at_bottom = cm.scroll_offset == 0;
            w.mark_content_dirty();
            if at_bottom && lines < 0 {
                w.exit_copy_mode();
            }
        }
    }

    // ========================================================================
    // Selection mode
    // ========================================================================

    /// Start a selection at content cell `pos` of window `index`.
    pub fn begin_selection(&mut self, index: usize, pos: (u16, u16), clicks: u8) {
        let Some(w) = self.windows.get_mut(index) else {
            return;
        };
        // Word and line modes expand to their bounds when resolved.
        w.selection = Some(Selection::start(pos, SelectionMode::from_clicks(clicks)));
        w.selection_cursor = pos;
        w.mark_content_dirty();
    }

    /// Extend the selection of window `index` to `pos`.
    pub fn extend_selection(&mut self, index: usize, pos: (u16, u16)) {
        let Some(w) = self.windows.get_mut(index) else {
            return;
        };
        if let Some(sel) = w.selection.as_mut() {
            sel.extend_to(pos);
            w.selection_cursor = pos;
            w.mark_content_dirty();
        }
    }

    /// Move the keyboard selection cursor by `(drow, dcol)`; extends an
    /// active selection.
    pub fn move_selection_cursor(&mut self, drow: i32, dcol: i32) {
        let Some(w) = self.focused_window_mut() else {
            return;
        };
        let (rows, cols) = w.terminal().size();
        let row = (i32::from(w.selection_cursor.0) + drow).clamp(0, i32::from(rows) - 1) as u16;
        let col = (i32::from(w.selection_cursor.1) + dcol).clamp(0, i32::from(cols) - 1) as u16;
        w.selection_cursor = (row, col);
        if let Some(sel) = w.selection.as_mut().filter(|s| s.active) {
            sel.extend_to((row, col));
        }
        w.mark_content_dirty();
    }

    /// Start (or restart) a keyboard selection at the selection cursor.
    pub fn toggle_selection_anchor(&mut self) {
        let Some(w) = self.focused_window_mut() else {
            return;
        };
        w.selection = match w.selection.take() {
            Some(sel) if sel.active => None,
            _ => Some(Selection::start(w.selection_cursor, SelectionMode::Char)),
        };
        w.mark_content_dirty();
    }

    /// Copy the selection of window `index` and clear it.
    pub fn yank_selection(&mut self, index: usize, now: Instant) {
        let Some(w) = self.windows.get_mut(index) else {
            return;
        };
        let Some(sel) = w.selection.take() else {
            return;
        };
        let text = sel.text(&w.visible_rows());
        w.mark_content_dirty();
        self.copy_to_clipboard(&text, now);
        if self.mode == InputMode::WindowManagement {
            self.selection_mode = false;
        }
    }
}
