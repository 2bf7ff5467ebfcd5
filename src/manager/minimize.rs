//! Minimize to the dock and restore from it.
//!
//! Dock order is the ascending minimize stamp of every window in the current
//! workspace that is minimized or on its way there. The same index feeds
//! [`dock_slot_geometry`], so the minimize animation ends exactly on the pill
//! the dock draws for it.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use super::WindowManager;
use crate::animation::{Animation, AnimationKind};
use crate::geometry::Geometry;
use crate::layout::dock_slot_geometry;

impl WindowManager {
    /// Windows on the dock, in slot order.
    pub fn dock_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = self
            .windows
            .iter()
            .enumerate()
            .filter(|(_, w)| w.workspace == self.current_workspace && (w.minimized || w.minimizing))
            .map(|(i, _)| i)
            .collect();
        order.sort_by_key(|&i| self.windows[i].minimize_order);
        order
    }

    /// Dock slot geometry for window `index`.
    fn dock_target(&self, index: usize) -> Geometry {
        let slot = self
            .dock_order()
            .iter()
            .position(|&i| i == index)
            .unwrap_or(usize::MAX);
        let (w, h) = self.term_size;
        dock_slot_geometry(slot, w, h)
    }

    /// Strictly increasing stamp derived from wall-clock nanoseconds.
    fn next_minimize_stamp(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        self.last_minimize_stamp = now.max(self.last_minimize_stamp + 1);
        self.last_minimize_stamp
    }

    /// Minimize window `index` to the dock.
    ///
    /// With animations on in floating mode the window shrinks into its dock
    /// slot first and focus moves on when the animation completes. Otherwise
    /// the change is immediate.
    pub fn minimize_window(&mut self, index: usize, now: Instant) {
        if !self.windows.get(index).is_some_and(|w| w.is_visible()) {
            return;
        }
        let stamp = self.next_minimize_stamp();
        let animate = self.config.animations && !self.tiling;
        {
            let w = &mut self.windows[index];
            w.pre_minimize = Some(w.geometry);
            w.minimize_order = stamp;
            w.selection = None;
            if w.in_copy_mode() {
                w.exit_copy_mode();
            }
            w.mark_position_dirty();
        }
        self.animations.retain(|a| a.window_id != self.windows[index].id);

        if animate {
            self.windows[index].minimizing = true;
            let target = self.dock_target(index);
            let w = &self.windows[index];
            log::debug!("Minimizing {} towards {target:?}", w.id.short());
            self.animations.push(Animation::new(
                w.id.clone(),
                AnimationKind::Minimize,
                w.geometry,
                target,
                now,
                self.config.animation_duration(),
            ));
        } else {
            self.windows[index].minimized = true;
            self.advance_focus_from(index);
            if self.tiling {
                self.retile(now);
            }
        }
    }

    /// Minimize the focused window.
    pub fn minimize_focused(&mut self, now: Instant) {
        if let Some(i) = self.focused {
            self.minimize_window(i, now);
        }
    }

    /// A Minimize animation landed: the window is now fully minimized.
    pub(super) fn finish_minimize(&mut self, index: usize, now: Instant) {
        let Some(w) = self.windows.get_mut(index) else {
            return;
        };
        w.minimizing = false;
        w.minimized = true;
        w.mark_position_dirty();
        self.advance_focus_from(index);
        if self.tiling {
            self.retile(now);
        }
    }

    /// Restore window `index` from the dock and focus it.
    pub fn restore_window(&mut self, index: usize, now: Instant) {
        let Some(w) = self.windows.get(index) else {
            return;
        };
        if !w.minimized && !w.minimizing {
            return;
        }
        let id = w.id.clone();
        let start = self.dock_target(index);
        let saved = w.pre_minimize.unwrap_or(w.geometry);
        self.animations.retain(|a| a.window_id != id);

        let vp = self.viewport();
        let animate = self.config.animations;
        let tiling = self.tiling;
        let duration = self.config.animation_duration();
        let w = &mut self.windows[index];
        w.minimized = false;
        w.minimizing = false;
        w.mark_position_dirty();

        if tiling {
            self.focus_window(index);
            self.retile(now);
            return;
        }

        let target = saved.clamped_into(&vp);
        w.pre_minimize = None;
        if animate {
            w.place(start);
            self.animations.push(Animation::new(
                id,
                AnimationKind::Restore,
                start,
                target,
                now,
                duration,
            ));
        } else if let Err(e) = w.set_geometry(target) {
            log::warn!("Restore resize failed: {e:#}");
        }
        self.focus_window(index);
    }

    /// Restore the window in dock slot `slot` (0-based).
    pub fn restore_dock_slot(&mut self, slot: usize, now: Instant) {
        if let Some(&index) = self.dock_order().get(slot) {
            self.restore_window(index, now);
        }
    }

    /// Restore every minimized window in the current workspace.
    pub fn restore_all(&mut self, now: Instant) {
        let ids: Vec<_> = self
            .dock_order()
            .into_iter()
            .map(|i| self.windows[i].id.clone())
            .collect();
        for id in ids {
            if let Some(i) = self.index_of(&id) {
                self.restore_window(i, now);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::constants::MAX_DOCK_SLOTS;
    use std::time::{Duration, Instant};

    #[test]
    fn test_minimize_advances_focus_and_appends_to_dock() {
        let mut wm = manager();
        let now = Instant::now();
        for _ in 0..3 {
            wm.add_window(None, now);
        }
        wm.minimize_window(0, now);
        wm.focus_window(1);
        wm.minimize_focused(now);
        assert_eq!(wm.focused_index(), Some(2));
        assert_eq!(wm.dock_order(), vec![0, 1]);
    }

    #[test]
    fn test_minimize_stamps_strictly_increase() {
        let mut wm = manager();
        let now = Instant::now();
        for _ in 0..12 {
            wm.add_window(None, now);
        }
        for i in 0..12 {
            wm.minimize_window(i, now);
        }
        let order = wm.dock_order();
        assert_eq!(order, (0..12).collect::<Vec<_>>());
        let stamps: Vec<u64> = order.iter().map(|&i| wm.windows()[i].minimize_order).collect();
        assert!(stamps.windows(2).all(|p| p[0] < p[1]));
        assert!(order.len() > MAX_DOCK_SLOTS);
    }

    #[test]
    fn test_animated_minimize_defers_focus() {
        let mut wm = animated_manager();
        let now = Instant::now();
        wm.add_window(None, now);
        wm.add_window(None, now);
        wm.minimize_focused(now);
        assert_eq!(wm.focused_index(), Some(1));
        assert!(wm.windows()[1].minimizing);
        wm.tick(now + Duration::from_secs(1));
        assert!(wm.windows()[1].minimized);
        assert!(!wm.windows()[1].minimizing);
        assert_eq!(wm.focused_index(), Some(0));
        assert!(wm.animations().is_empty());
    }

    #[test]
    fn test_restore_returns_to_saved_geometry() {
        let mut wm = manager();
        let now = Instant::now();
        wm.add_window(None, now);
        let before = wm.windows()[0].geometry;
        wm.minimize_window(0, now);
        assert_eq!(wm.focused_index(), None);
        wm.restore_dock_slot(0, now);
        assert!(wm.windows()[0].is_visible());
        assert_eq!(wm.windows()[0].geometry, before);
        assert_eq!(wm.focused_index(), Some(0));
    }

    #[test]
    fn test_animated_restore_starts_at_dock_slot() {
        let mut wm = animated_manager();
        let now = Instant::now();
        wm.add_window(None, now);
        wm.minimize_window(0, now);
        wm.tick(now + Duration::from_secs(1));
        let slot = wm.windows()[0].geometry;
        let later = now + Duration::from_secs(2);
        wm.restore_window(0, later);
        assert_eq!(wm.windows()[0].geometry, slot);
        wm.tick(later + Duration::from_secs(1));
        assert_eq!(wm.windows()[0].geometry, crate::geometry::Geometry::new(30, 10, 60, 20));
    }

    #[test]
    fn test_restore_all() {
        let mut wm = manager();
        let now = Instant::now();
        for _ in 0..3 {
            wm.add_window(None, now);
        }
        for i in 0..3 {
            wm.minimize_window(i, now);
        }
        wm.restore_all(now);
        assert!(wm.dock_order().is_empty());
        assert!(wm.focused_index().is_some());
    }
}
