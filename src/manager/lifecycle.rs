//! Creating and destroying windows, process exits, I/O failures, rename
//! and terminal resize.

use std::sync::Arc;
use std::time::Instant;

use super::WindowManager;
use crate::geometry::Geometry;
use crate::notifications::Severity;
use crate::window::{SharedTerminal, SpawnRequest, Window, WindowId};

impl WindowManager {
    /// Open a new shell window and focus it.
    ///
    /// Returns the new index, or `None` when the shell could not be started
    /// (an error notification is raised and nothing else changes).
    pub fn add_window(&mut self, title: Option<&str>, now: Instant) -> Option<usize> {
        let vp = self.viewport();
        let (min_w, min_h) = (self.config.min_window_width, self.config.min_window_height);
        let width = (vp.width / 2).max(min_w);
        let height = (vp.height / 2).max(min_h);

        let geometry = if self.tiling {
            // Overwritten by the retile below.
            Geometry::new(vp.x, vp.y, width, height)
        } else if let Some((px, py)) = self.last_pointer {
            Geometry::new(px, py, width, height).clamped_into(&vp)
        } else {
            Geometry::new(vp.x + vp.width / 4, vp.y + vp.height / 4, width, height)
        };

        let id = WindowId::generate();
        let (rows, cols) = geometry.content_size();
        let terminal = Arc::new(SharedTerminal::new(rows, cols, self.config.scrollback_lines));
        let request = SpawnRequest {
            window_id: id.clone(),
            rows,
            cols,
            terminal: Arc::clone(&terminal),
            exit_tx: self.exit_tx.clone(),
        };
        let session = match self.spawner.spawn(request) {
            Ok(session) => session,
            Err(e) => {
                self.notify(Severity::Error, format!("Failed to start shell: {e:#}"), now);
                return None;
            }
        };

        self.windows_created += 1;
        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| format!("Terminal {}", self.windows_created));
        let mut window = Window::new(id, title, geometry, self.current_workspace, terminal, session);
        window.z = self.windows.len();
        window.tile_order = self.next_tile_order;
        self.next_tile_order += 1;
        log::info!("Opened window {} ({})", window.id.short(), window.title);

        self.windows.push(window);
        let index = self.windows.len() - 1;
        self.focus_window(index);
        if self.tiling {
            self.retile(now);
        }
        Some(index)
    }

    /// Close window `index` and remove it.
    ///
    /// Windows stacked above it move down one z so no gap remains. If it was
    /// focused, focus passes to the next visible window in the workspace, or
    /// is cleared (and Terminal mode left) when there is none.
    pub fn delete_window(&mut self, index: usize, now: Instant) {
        if index >= self.windows.len() {
            return;
        }
        let id = self.windows[index].id.clone();
        self.windows[index].close();
        self.animations.retain(|a| a.window_id != id);

        let removed_z = self.windows[index].z;
        for w in &mut self.windows {
            if w.z > removed_z {
                w.z -= 1;
                w.mark_position_dirty();
            }
        }

        let was_focused = self.focused == Some(index);
        self.windows.remove(index);
        self.workspace_focus.retain(|_, v| *v != id);
        if self.rename.as_ref().is_some_and(|r| r.window == id) {
            self.rename = None;
        }
        log::info!("Closed window {}", id.short());

        self.focused = match self.focused {
            Some(f) if f > index => Some(f - 1),
            Some(f) if f == index => None,
            other => other,
        };
        if was_focused {
            match self.next_focus_candidate(index, None) {
                Some(next) => self.focus_window(next),
                None => self.clear_focus(),
            }
        }
        if self.tiling {
            self.retile(now);
        }
    }

    /// Close the focused window.
    pub fn close_focused(&mut self, now: Instant) {
        if let Some(i) = self.focused {
            self.delete_window(i, now);
        }
    }

    /// Remove windows whose shell has exited. Returns `true` if any did.
    pub(super) fn reap_exits(&mut self, now: Instant) -> bool {
        let mut changed = false;
        while let Ok(exit) = self.exit_rx.try_recv() {
            let Some(index) = self.index_of(&exit.window_id) else {
                continue;
            };
            let name = self.windows[index].display_name();
            let message = match exit.exit_code {
                Some(0) | None => format!("{name} exited"),
                Some(code) => format!("{name} exited with status {code}"),
            };
            self.delete_window(index, now);
            self.notify(Severity::Info, message, now);
            changed = true;
        }
        changed
    }

    /// Degrade windows whose PTY read or write failed, once each.
    pub(super) fn handle_io_failures(&mut self, now: Instant) -> bool {
        let failed: Vec<usize> = self
            .windows
            .iter()
            .enumerate()
            .filter(|(_, w)| w.session().has_io_failed() && !w.is_degraded())
            .map(|(i, _)| i)
            .collect();
        for &index in &failed {
            if !self.windows[index].mark_degraded() {
                continue;
            }
            if self.focused == Some(index) {
                self.enter_wm_mode();
            }
            let name = self.windows[index].display_name();
            self.notify(Severity::Warning, format!("{name}: terminal I/O failed"), now);
        }
        !failed.is_empty()
    }

    /// Set a custom name; an empty name restores the automatic title.
    pub fn rename_window(&mut self, index: usize, name: &str) {
        let Some(w) = self.windows.get_mut(index) else {
            return;
        };
        let name = name.trim();
        w.custom_name = (!name.is_empty()).then(|| name.to_string());
        w.mark_position_dirty();
    }

    /// The terminal was resized to `cols` x `rows`.
    ///
    /// Floating windows are pulled back on-screen, tiled windows re-laid
    /// out, and every composed layer is dropped.
    pub fn resize_viewport(&mut self, cols: u16, rows: u16, now: Instant) {
        if self.term_size == (cols, rows) {
            return;
        }
        self.term_size = (cols, rows);
        let vp = self.viewport();
        for w in &mut self.windows {
            w.mark_position_dirty();
            if self.tiling || !w.is_visible() {
                continue;
            }
            let clamped = w.geometry.clamped_into(&vp);
            if let Err(e) = w.set_geometry(clamped) {
                log::warn!("Resize of window {} failed: {e:#}", w.id.short());
            }
            if let Some(pre) = w.pre_snap.as_mut() {
                *pre = pre.clamped_into(&vp);
            }
        }
        if self.tiling {
            self.retile(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::config::Config;
    use crate::input::InputMode;
    use crate::window::{DetachedSpawner, ProcessExit};

    #[test]
    fn test_first_window_is_focused_at_z0() {
        let mut wm = manager();
        let idx = wm.add_window(None, Instant::now());
        assert_eq!(idx, Some(0));
        assert_eq!(wm.focused_index(), Some(0));
        assert_eq!(wm.windows()[0].z, 0);
        assert_eq!(wm.windows()[0].title, "Terminal 1");
    }

    #[test]
    fn test_default_geometry_is_half_viewport_at_quarter_offset() {
        let mut wm = manager();
        wm.add_window(None, Instant::now());
        assert_eq!(wm.windows()[0].geometry, Geometry::new(30, 10, 60, 20));
    }

    #[test]
    fn test_spawns_at_pointer_clamped() {
        let mut wm = manager();
        wm.set_pointer(110, 35);
        wm.add_window(None, Instant::now());
        let g = wm.windows()[0].geometry;
        assert_eq!((g.x, g.y), (60, 20));
    }

    #[test]
    fn test_spawn_failure_leaves_no_window() {
        let mut wm = crate::manager::WindowManager::new(
            Config::default(),
            Box::new(DetachedSpawner::failing()),
            (80, 24),
        );
        assert_eq!(wm.add_window(None, Instant::now()), None);
        assert!(wm.is_empty());
        assert_eq!(wm.notifications().items().len(), 1);
    }

    #[test]
    fn test_delete_closes_z_gap() {
        let mut wm = manager();
        let now = Instant::now();
        for _ in 0..3 {
            wm.add_window(None, now);
        }
        wm.focus_window(1);
        wm.delete_window(1, now);
        assert_eq!(wm.len(), 2);
        assert_contiguous_z(&wm);
        let f = wm.focused_index().unwrap();
        assert!(wm.windows()[f].is_visible());
    }

    #[test]
    fn test_delete_last_window_leaves_terminal_mode() {
        let mut wm = manager();
        let now = Instant::now();
        wm.add_window(None, now);
        wm.enter_terminal_mode();
        wm.delete_window(0, now);
        assert_eq!(wm.focused_index(), None);
        assert_eq!(wm.mode(), InputMode::WindowManagement);
    }

    #[test]
    fn test_delete_unfocused_shifts_focus_index() {
        let mut wm = manager();
        let now = Instant::now();
        for _ in 0..3 {
            wm.add_window(None, now);
        }
        let focused_id = wm.windows()[2].id.clone();
        wm.delete_window(0, now);
        assert_eq!(wm.focused_window().map(|w| w.id.clone()), Some(focused_id));
    }

    #[test]
    fn test_exit_notification_removes_window() {
        let mut wm = manager();
        let now = Instant::now();
        wm.add_window(None, now);
        let id = wm.windows()[0].id.clone();
        wm.exit_tx
            .try_send(ProcessExit {
                window_id: id,
                exit_code: Some(0),
            })
            .unwrap();
        assert!(wm.tick(now));
        assert!(wm.is_empty());
    }

    #[test]
    fn test_rename_empty_clears() {
        let mut wm = manager();
        wm.add_window(None, Instant::now());
        wm.rename_window(0, "  build ");
        assert_eq!(wm.windows()[0].custom_name.as_deref(), Some("build"));
        wm.rename_window(0, "");
        assert_eq!(wm.windows()[0].custom_name, None);
    }

    #[test]
    fn test_resize_pulls_windows_on_screen() {
        let mut wm = manager();
        let now = Instant::now();
        wm.add_window(None, now);
        wm.resize_viewport(70, 25, now);
        let g = wm.windows()[0].geometry;
        assert!(g.right() <= 70 || g.x == 0);
        assert!(g.bottom() <= 24 || g.y == 0);
    }
}
