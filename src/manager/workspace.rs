//! Workspaces 1..=9.

use std::time::Instant;

use super::WindowManager;
use crate::constants::WORKSPACE_COUNT;
use crate::notifications::Severity;

impl WindowManager {
    /// Switch to workspace `ws`.
    ///
    /// The current focus is remembered for when we come back; the target's
    /// remembered focus is restored if that window still lives there and is
    /// visible, else its first visible window is focused. With nothing to
    /// focus, Terminal mode is left.
    pub fn switch_workspace(&mut self, ws: usize, now: Instant) {
        if ws == self.current_workspace || !(1..=WORKSPACE_COUNT).contains(&ws) {
            return;
        }
        if let Some(w) = self.focused_window() {
            self.workspace_focus.insert(self.current_workspace, w.id.clone());
        }
        log::debug!("Workspace {} -> {ws}", self.current_workspace);
        self.current_workspace = ws;
        self.selection_mode = false;
        if let Some(old) = self.focused.take().and_then(|i| self.windows.get_mut(i)) {
            old.mark_position_dirty();
        }

        let remembered = self
            .workspace_focus
            .get(&ws)
            .and_then(|id| self.index_of(id))
            .filter(|&i| self.windows[i].workspace == ws && self.windows[i].is_visible());
        match remembered.or_else(|| self.next_focus_candidate(0, None)) {
            Some(index) => self.focus_window(index),
            None => self.clear_focus(),
        }

        for w in self.windows.iter_mut().filter(|w| w.workspace == ws) {
            w.mark_position_dirty();
        }
        if self.tiling {
            self.retile(now);
        }
    }

    /// Move window `index` to workspace `ws`.
    ///
    /// Focus in the current workspace moves on; the window becomes the
    /// remembered focus of its new workspace.
    pub fn move_window_to_workspace(&mut self, index: usize, ws: usize, now: Instant) {
        if !(1..=WORKSPACE_COUNT).contains(&ws) {
            return;
        }
        let Some(w) = self.windows.get_mut(index) else {
            return;
        };
        if w.workspace == ws {
            return;
        }
        w.workspace = ws;
        w.mark_position_dirty();
        let id = w.id.clone();
        let name = w.display_name();
        self.workspace_focus.insert(ws, id);
        self.advance_focus_from(index);
        if self.tiling {
            self.retile(now);
        }
        self.notify(Severity::Info, format!("Moved {name} to workspace {ws}"), now);
    }

    /// Move the focused window to workspace `ws`.
    pub fn move_focused_to_workspace(&mut self, ws: usize, now: Instant) {
        if let Some(i) = self.focused {
            self.move_window_to_workspace(i, ws, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::input::InputMode;
    use std::time::Instant;

    #[test]
    fn test_switch_to_empty_workspace_clears_terminal_mode() {
        let mut wm = manager();
        let now = Instant::now();
        wm.add_window(None, now);
        wm.enter_terminal_mode();
        wm.switch_workspace(2, now);
        assert_eq!(wm.current_workspace(), 2);
        assert_eq!(wm.focused_index(), None);
        assert_eq!(wm.mode(), InputMode::WindowManagement);
    }

    #[test]
    fn test_switch_restores_remembered_focus() {
        let mut wm = manager();
        let now = Instant::now();
        wm.add_window(None, now);
        wm.add_window(None, now);
        wm.focus_window(0);
        wm.switch_workspace(3, now);
        wm.add_window(None, now);
        wm.switch_workspace(1, now);
        assert_eq!(wm.focused_index(), Some(0));
        wm.switch_workspace(3, now);
        assert_eq!(wm.focused_index(), Some(2));
    }

    #[test]
    fn test_out_of_range_workspace_ignored() {
        let mut wm = manager();
        wm.switch_workspace(0, Instant::now());
        wm.switch_workspace(10, Instant::now());
        assert_eq!(wm.current_workspace(), 1);
    }

    #[test]
    fn test_move_window_advances_focus() {
        let mut wm = manager();
        let now = Instant::now();
        wm.add_window(None, now);
        wm.add_window(None, now);
        wm.move_focused_to_workspace(4, now);
        assert_eq!(wm.windows()[1].workspace, 4);
        assert_eq!(wm.focused_index(), Some(0));
        wm.switch_workspace(4, now);
        assert_eq!(wm.focused_index(), Some(1));
    }
}
