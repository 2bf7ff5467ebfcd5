//! Focus changes and z renumbering.

use super::WindowManager;
use crate::input::InputMode;

impl WindowManager {
    /// Focus window `index` and raise it to the top.
    ///
    /// The focused window gets `z = count - 1`; every other window is
    /// renumbered `0..count - 1` in list order. Only composed layers are
    /// invalidated, never cached content.
    pub fn focus_window(&mut self, index: usize) {
        if index >= self.windows.len() || self.focused == Some(index) {
            return;
        }
        let old = self.focused;

        let count = self.windows.len();
        let mut next_z = 0;
        for (i, w) in self.windows.iter_mut().enumerate() {
            let z = if i == index {
                count - 1
            } else {
                let z = next_z;
                next_z += 1;
                z
            };
            if w.z != z {
                w.z = z;
                w.mark_position_dirty();
            }
        }

        if let Some(old) = old.and_then(|i| self.windows.get_mut(i)) {
            old.mark_position_dirty();
        }
        let w = &mut self.windows[index];
        w.mark_position_dirty();
        self.workspace_focus.insert(w.workspace, w.id.clone());
        self.focused = Some(index);
        log::debug!("Focused window {} (z {})", w.id.short(), w.z);
    }

    /// Move focus to the next (or previous) visible window in the current
    /// workspace, wrapping around.
    pub fn cycle_focus(&mut self, forward: bool) {
        let visible = self.visible_in_workspace();
        if visible.is_empty() {
            return;
        }
        let pos = self
            .focused
            .and_then(|f| visible.iter().position(|&i| i == f));
        let next = match (pos, forward) {
            (None, _) => visible[0],
            (Some(p), true) => visible[(p + 1) % visible.len()],
            (Some(p), false) => visible[(p + visible.len() - 1) % visible.len()],
        };
        self.focus_window(next);
    }

    /// First visible window in the current workspace at or after `start`
    /// (wrapping), skipping `exclude`.
    pub(super) fn next_focus_candidate(&self, start: usize, exclude: Option<usize>) -> Option<usize> {
        let n = self.windows.len();
        (0..n)
            .map(|k| (start + k) % n)
            .find(|&i| {
                Some(i) != exclude
                    && self.windows[i].workspace == self.current_workspace
                    && self.windows[i].is_visible()
            })
    }

    /// Window `index` stopped being focusable: pass focus on, or clear it and
    /// fall back to WindowManagement mode.
    pub(super) fn advance_focus_from(&mut self, index: usize) {
        if self.focused != Some(index) {
            return;
        }
        match self.next_focus_candidate(index + 1, Some(index)) {
            Some(next) => self.focus_window(next),
            None => self.clear_focus(),
        }
    }

    /// No focusable window: drop focus and leave Terminal mode.
    pub(super) fn clear_focus(&mut self) {
        if let Some(old) = self.focused.take().and_then(|i| self.windows.get_mut(i)) {
            old.mark_position_dirty();
        }
        self.mode = InputMode::WindowManagement;
        self.selection_mode = false;
    }
}
