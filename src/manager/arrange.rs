//! Snapping, tiling, swapping, direct move/resize, and driving animations.

use std::time::Instant;

use super::WindowManager;
use crate::animation::{Animation, AnimationKind};
use crate::geometry::Geometry;
use crate::layout::tile_layout;
use crate::notifications::Severity;

/// Where a floating window can be snapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapTarget {
    /// Left half.
    Left,
    /// Right half.
    Right,
    /// Whole viewport.
    Full,
    /// Top-left quarter.
    TopLeft,
    /// Top-right quarter.
    TopRight,
    /// Bottom-left quarter.
    BottomLeft,
    /// Bottom-right quarter.
    BottomRight,
}

impl SnapTarget {
    /// Corner for keys `1`..`4`.
    pub fn corner(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::TopLeft),
            2 => Some(Self::TopRight),
            3 => Some(Self::BottomLeft),
            4 => Some(Self::BottomRight),
            _ => None,
        }
    }

    /// Rectangle inside `vp`. Odd remainders go to the right/bottom half.
    pub fn geometry(self, vp: &Geometry) -> Geometry {
        let half_w = vp.width / 2;
        let half_h = vp.height / 2;
        let (x, y, w, h) = match self {
            Self::Left => (0, 0, half_w, vp.height),
            Self::Right => (half_w, 0, vp.width - half_w, vp.height),
            Self::Full => (0, 0, vp.width, vp.height),
            Self::TopLeft => (0, 0, half_w, half_h),
            Self::TopRight => (half_w, 0, vp.width - half_w, half_h),
            Self::BottomLeft => (0, half_h, half_w, vp.height - half_h),
            Self::BottomRight => (half_w, half_h, vp.width - half_w, vp.height - half_h),
        };
        Geometry::new(vp.x + x, vp.y + y, w, h)
    }
}

impl WindowManager {
    /// Move window `index` to `target`, animated when enabled.
    ///
    /// The PTY is resized once the geometry settles.
    fn animate_to(&mut self, index: usize, kind: AnimationKind, target: Geometry, now: Instant) {
        let Some(w) = self.windows.get_mut(index) else {
            return;
        };
        self.animations.retain(|a| a.window_id != w.id);
        if w.geometry == target {
            return;
        }
        if self.config.animations {
            self.animations.push(Animation::new(
                w.id.clone(),
                kind,
                w.geometry,
                target,
                now,
                self.config.animation_duration(),
            ));
        } else if let Err(e) = w.set_geometry(target) {
            log::warn!("Resize of window {} failed: {e:#}", w.id.short());
        }
    }

    /// Snap the focused window. Snapping leaves tiling mode.
    pub fn snap_focused(&mut self, target: SnapTarget, now: Instant) {
        let Some(index) = self.focused else {
            return;
        };
        if self.tiling {
            self.tiling = false;
            self.notify(Severity::Info, "Tiling off", now);
        }
        let vp = self.viewport();
        let (min_w, min_h) = (self.config.min_window_width, self.config.min_window_height);
        let w = &mut self.windows[index];
        if w.pre_snap.is_none() {
            w.pre_snap = Some(w.geometry);
        }
        let geometry = target.geometry(&vp).with_min_size(min_w, min_h);
        self.animate_to(index, AnimationKind::Snap, geometry, now);
    }

    /// Return the focused window to where it was before it was first
    /// snapped.
    pub fn unsnap_focused(&mut self, now: Instant) {
        let Some(index) = self.focused else {
            return;
        };
        if let Some(saved) = self.windows[index].pre_snap.take() {
            let vp = self.viewport();
            self.animate_to(index, AnimationKind::Snap, saved.clamped_into(&vp), now);
        }
    }

    /// Turn tiling on or off. Turning it on re-lays out immediately.
    pub fn toggle_tiling(&mut self, now: Instant) {
        self.tiling = !self.tiling;
        log::info!("Tiling {}", if self.tiling { "on" } else { "off" });
        if self.tiling {
            self.retile(now);
            self.notify(Severity::Info, "Tiling on", now);
        } else {
            self.notify(Severity::Info, "Tiling off", now);
        }
    }

    /// Visible windows of the current workspace in tile order.
    pub(super) fn tiled_windows(&self) -> Vec<usize> {
        let mut tiled = self.visible_in_workspace();
        tiled.sort_by_key(|&i| self.windows[i].tile_order);
        tiled
    }

    /// Lay out the current workspace's visible windows.
    pub fn retile(&mut self, now: Instant) {
        self.retile_with(AnimationKind::Tile, now);
    }

    fn retile_with(&mut self, kind: AnimationKind, now: Instant) {
        let tiled = self.tiled_windows();
        let vp = self.viewport();
        let rects = tile_layout(tiled.len(), vp.width, vp.height);
        let (min_w, min_h) = (self.config.min_window_width, self.config.min_window_height);
        for (index, rect) in tiled.into_iter().zip(rects) {
            let target = Geometry::new(vp.x + rect.x, vp.y + rect.y, rect.width, rect.height)
                .with_min_size(min_w, min_h);
            self.windows[index].pre_snap = None;
            self.animate_to(index, kind, target, now);
        }
    }

    /// Trade tile positions between windows `a` and `b`.
    pub fn swap_windows(&mut self, a: usize, b: usize, now: Instant) {
        if a == b || a >= self.windows.len() || b >= self.windows.len() {
            return;
        }
        let oa = self.windows[a].tile_order;
        self.windows[a].tile_order = self.windows[b].tile_order;
        self.windows[b].tile_order = oa;
        if self.tiling {
            self.retile_with(AnimationKind::Swap, now);
        }
    }

    /// Swap the focused window with its next (or previous) tiling neighbour.
    pub fn swap_focused(&mut self, forward: bool, now: Instant) {
        if !self.tiling {
            return;
        }
        let Some(focused) = self.focused else {
            return;
        };
        let tiled = self.tiled_windows();
        let Some(pos) = tiled.iter().position(|&i| i == focused) else {
            return;
        };
        if tiled.len() < 2 {
            return;
        }
        let other = if forward {
            tiled[(pos + 1) % tiled.len()]
        } else {
            tiled[(pos + tiled.len() - 1) % tiled.len()]
        };
        self.swap_windows(focused, other, now);
    }

    /// Move window `index` to `(x, y)` without resizing its PTY.
    pub fn move_window(&mut self, index: usize, x: i32, y: i32) {
        let vp = self.viewport();
        if let Some(w) = self.windows.get_mut(index) {
            let g = Geometry { x, y, ..w.geometry }.clamped_into(&vp);
            w.place(g);
            w.pre_snap = None;
        }
    }

    /// Resize window `index` to `width` x `height` (clamped to the minimum
    /// size) and resize its PTY.
    pub fn resize_window(&mut self, index: usize, width: i32, height: i32) {
        let (min_w, min_h) = (self.config.min_window_width, self.config.min_window_height);
        if let Some(w) = self.windows.get_mut(index) {
            let g = Geometry {
                width,
                height,
                ..w.geometry
            }
            .with_min_size(min_w, min_h);
            w.pre_snap = None;
            if let Err(e) = w.set_geometry(g) {
                log::warn!("Resize of window {} failed: {e:#}", w.id.short());
            }
        }
    }

    /// Advance every animation. Returns `true` while anything moved.
    pub(super) fn tick_animations(&mut self, now: Instant) -> bool {
        if self.animations.is_empty() {
            return false;
        }
        let mut completed = Vec::new();
        for anim in &mut self.animations {
            let Some(w) = self.windows.iter_mut().find(|w| w.id == anim.window_id) else {
                continue;
            };
            let step = anim.update(now);
            w.place(step.geometry);
            if step.just_completed {
                completed.push((w.id.clone(), anim.kind));
            }
        }
        let windows = &self.windows;
        self.animations
            .retain(|a| !a.is_complete() && windows.iter().any(|w| w.id == a.window_id));

        for (id, kind) in completed {
            let Some(index) = self.index_of(&id) else {
                continue;
            };
            if kind == AnimationKind::Minimize {
                self.finish_minimize(index, now);
            } else if let Err(e) = self.windows[index].sync_terminal_size() {
                log::warn!("Resize of window {} failed: {e:#}", id.short());
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_snap_geometry_halves() {
        let vp = Geometry::new(0, 0, 121, 40);
        assert_eq!(SnapTarget::Left.geometry(&vp), Geometry::new(0, 0, 60, 40));
        assert_eq!(SnapTarget::Right.geometry(&vp), Geometry::new(60, 0, 61, 40));
        assert_eq!(SnapTarget::BottomRight.geometry(&vp), Geometry::new(60, 20, 61, 20));
        assert_eq!(SnapTarget::corner(5), None);
    }

    #[test]
    fn test_snap_then_unsnap() {
        let mut wm = manager();
        let now = Instant::now();
        wm.add_window(None, now);
        let before = wm.windows()[0].geometry;
        wm.snap_focused(SnapTarget::Left, now);
        wm.snap_focused(SnapTarget::Full, now);
        assert_eq!(wm.windows()[0].geometry, wm.viewport());
        wm.unsnap_focused(now);
        assert_eq!(wm.windows()[0].geometry, before);
    }

    #[test]
    fn test_tiling_covers_viewport() {
        let mut wm = manager();
        let now = Instant::now();
        for _ in 0..3 {
            wm.add_window(None, now);
        }
        wm.toggle_tiling(now);
        let area: i64 = wm.windows().iter().map(|w| w.geometry.area()).sum();
        assert_eq!(area, wm.viewport().area());
    }

    #[test]
    fn test_minimized_excluded_from_tiling() {
        let mut wm = manager();
        let now = Instant::now();
        wm.add_window(None, now);
        wm.add_window(None, now);
        wm.toggle_tiling(now);
        wm.minimize_window(0, now);
        assert_eq!(wm.windows()[1].geometry, wm.viewport());
    }

    #[test]
    fn test_swap_trades_rectangles() {
        let mut wm = manager();
        let now = Instant::now();
        wm.add_window(None, now);
        wm.add_window(None, now);
        wm.toggle_tiling(now);
        let (a, b) = (wm.windows()[0].geometry, wm.windows()[1].geometry);
        wm.swap_focused(true, now);
        assert_eq!(wm.windows()[0].geometry, b);
        assert_eq!(wm.windows()[1].geometry, a);
    }

    #[test]
    fn test_animation_dropped_with_window() {
        let mut wm = animated_manager();
        let now = Instant::now();
        wm.add_window(None, now);
        wm.snap_focused(SnapTarget::Full, now);
        assert_eq!(wm.animations().len(), 1);
        wm.delete_window(0, now);
        assert!(wm.animations().is_empty());
    }

    #[test]
    fn test_animation_resizes_pty_on_completion() {
        let mut wm = animated_manager();
        let now = Instant::now();
        wm.add_window(None, now);
        wm.snap_focused(SnapTarget::Full, now);
        wm.tick(now + Duration::from_millis(50));
        assert_eq!(wm.windows()[0].terminal().size(), (18, 58));
        wm.tick(now + Duration::from_secs(1));
        assert_eq!(wm.windows()[0].terminal().size(), (38, 118));
    }
}
