//! Frame composition.
//!
//! # Pipeline
//!
//! ```text
//! emulator ──(content stale?)──► ContentCache ──(layer stale?)──► LayerCache
//!                                                                     │
//!      frame ◄── blit by z (animating windows on top) ◄───────────────┘
//!        │
//!        └── dock, prefix badge, which-key, toasts, modal overlay, rename
//! ```
//!
//! Content is rebuilt only when the emulator generation or the view offset
//! changed. Layers are recomposed from cached content when geometry, z or
//! focus changed, so dragging a window never reads the emulator.

// Rust guideline compliant 2026-02

pub mod content;
pub mod dock;
pub mod layer;
pub mod overlays;
pub mod style_cache;

use std::time::Instant;

use ratatui::layout::Rect;
use ratatui::Frame;

use crate::constants::ANIMATION_RENDER_MARGIN;
use crate::geometry::Geometry;
use crate::manager::{Overlay, WindowManager};
use crate::notifications::Severity;
use crate::window::LayerCache;
use content::{render_content, render_frozen};
use layer::{blit, compose_layer};
pub use style_cache::{StyleCache, StyleCacheStats};

/// Cumulative work counters, for the cache-stats overlay and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames drawn.
    pub frames: u64,
    /// Times a window's text was rebuilt from its emulator.
    pub content_rebuilds: u64,
    /// Times a window layer was composed.
    pub layers_composed: u64,
    /// Times a cached layer was blitted as-is.
    pub layers_reused: u64,
    /// Windows skipped because they were off screen.
    pub windows_culled: u64,
}

/// Owns the style cache and draws frames from a [`WindowManager`].
pub struct Renderer {
    styles: StyleCache,
    stats: FrameStats,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("styles", &self.styles.stats())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Create a renderer whose style cache holds up to `style_capacity`
    /// entries.
    pub fn new(style_capacity: usize) -> Self {
        Self {
            styles: StyleCache::new(style_capacity),
            stats: FrameStats::default(),
        }
    }

    /// Style cache counters.
    pub fn style_stats(&self) -> StyleCacheStats {
        self.styles.stats()
    }

    /// Frame work counters.
    pub fn frame_stats(&self) -> FrameStats {
        self.stats
    }

    /// Draw one frame.
    pub fn draw(&mut self, f: &mut Frame, wm: &mut WindowManager, now: Instant) {
        if wm.take_cache_reset() {
            self.styles.reset();
            wm.notify(Severity::Info, "Style cache reset", now);
        }
        self.stats.frames += 1;

        let area = f.area();
        let vp = wm.viewport();
        let clip = Rect::new(
            area.x,
            area.y,
            area.width,
            area.height.min(vp.height.max(0) as u16),
        );

        for index in self.paint_order(wm) {
            self.draw_window(f, wm, index, vp, clip);
        }

        let clock = chrono::Local::now().format("%H:%M").to_string();
        dock::render_dock(f.buffer_mut(), wm, &clock);
        self.draw_overlays(f, wm, now);
    }

    /// Windows to draw, bottom first. Animating windows are lifted above
    /// every settled window so they stay visible mid-transition.
    fn paint_order(&self, wm: &WindowManager) -> Vec<usize> {
        let elevated = wm.len();
        let mut order: Vec<(usize, usize)> = wm
            .windows()
            .iter()
            .enumerate()
            .filter(|(_, w)| w.workspace == wm.current_workspace())
            .filter_map(|(i, w)| {
                let animating = wm.is_animating(&w.id);
                if !w.is_visible() && !animating {
                    return None;
                }
                let z = if animating { w.z + elevated } else { w.z };
                Some((z, i))
            })
            .collect();
        order.sort_unstable();
        order.into_iter().map(|(_, i)| i).collect()
    }

    fn draw_window(&mut self, f: &mut Frame, wm: &mut WindowManager, index: usize, vp: Geometry, clip: Rect) {
        let focused = wm.focused_index() == Some(index);
        let selecting = focused && wm.selection_mode();
        let Some(id) = wm.window(index).map(|w| w.id.clone()) else {
            return;
        };
        let margin = if wm.is_animating(&id) { ANIMATION_RENDER_MARGIN } else { 0 };
        let Some(w) = wm.window_mut(index) else {
            return;
        };

        let g = w.geometry;
        if g.area() == 0 || !g.intersects(&vp.expanded(margin)) {
            self.stats.windows_culled += 1;
            return;
        }

        if w.content_stale() {
            let offset = w.view_offset();
            let content = match w.frozen_screen_mut() {
                Some(frozen) => render_frozen(frozen, offset, &mut self.styles),
                None => render_content(w.terminal(), offset, &mut self.styles),
            };
            w.content_cache = Some(content);
            w.layer_cache = None;
            self.stats.content_rebuilds += 1;
        }

        let reusable = w
            .layer_cache
            .as_ref()
            .is_some_and(|l| l.geometry == g && l.z == w.z && l.focused == focused);
        if reusable {
            self.stats.layers_reused += 1;
        } else if let Some(content) = w.content_cache.as_ref() {
            let buffer = compose_layer(w, focused, selecting, content);
            w.layer_cache = Some(LayerCache {
                buffer,
                geometry: g,
                z: w.z,
                focused,
            });
            self.stats.layers_composed += 1;
        }

        if let Some(layer) = w.layer_cache.as_ref() {
            blit(f.buffer_mut(), &layer.buffer, g, clip);
        }
        w.clear_dirty();
    }

    fn draw_overlays(&self, f: &mut Frame, wm: &WindowManager, now: Instant) {
        let prefix_label = wm.prefix_key().label();
        let state = wm.prefix().state();
        overlays::render_prefix_indicator(f, state);

        match wm.overlay() {
            Some(Overlay::Help { scroll }) => overlays::render_help(f, &prefix_label, scroll),
            Some(Overlay::Logs { scroll }) => overlays::render_logs(f, wm.log_buffer(), scroll),
            Some(Overlay::CacheStats) => overlays::render_cache_stats(f, self.styles.stats(), wm),
            None => {}
        }

        if wm.prefix().hint_due(now, wm.config().which_key_delay()) {
            overlays::render_which_key(f, state, &prefix_label);
        }
        overlays::render_notifications(f, wm.notifications(), now);

        if let Some(rename) = wm.rename() {
            overlays::render_rename(f, rename);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::test_support::{animated_manager, manager};
    use crate::manager::SnapTarget;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::time::Duration;

    fn terminal() -> Terminal<TestBackend> {
        Terminal::new(TestBackend::new(120, 41)).unwrap()
    }

    fn draw(term: &mut Terminal<TestBackend>, r: &mut Renderer, wm: &mut WindowManager, now: Instant) {
        term.draw(|f| r.draw(f, wm, now)).unwrap();
    }

    #[test]
    fn test_move_reuses_content() {
        let mut wm = manager();
        let mut r = Renderer::new(64);
        let mut term = terminal();
        let now = Instant::now();
        wm.add_window(None, now);
        draw(&mut term, &mut r, &mut wm, now);
        let first = r.frame_stats();
        assert_eq!(first.content_rebuilds, 1);

        wm.move_window(0, 5, 5);
        draw(&mut term, &mut r, &mut wm, now);
        let second = r.frame_stats();
        assert_eq!(second.content_rebuilds, 1);
        assert_eq!(second.layers_composed, first.layers_composed + 1);
    }

    #[test]
    fn test_unchanged_window_reuses_layer() {
        let mut wm = manager();
        let mut r = Renderer::new(64);
        let mut term = terminal();
        let now = Instant::now();
        wm.add_window(None, now);
        draw(&mut term, &mut r, &mut wm, now);
        draw(&mut term, &mut r, &mut wm, now);
        assert_eq!(r.frame_stats().layers_reused, 1);
    }

    #[test]
    fn test_output_rebuilds_content() {
        let mut wm = manager();
        let mut r = Renderer::new(64);
        let mut term = terminal();
        let now = Instant::now();
        wm.add_window(None, now);
        draw(&mut term, &mut r, &mut wm, now);
        wm.windows()[0].terminal().process(b"fresh output");
        assert!(wm.content_changed());
        draw(&mut term, &mut r, &mut wm, now);
        assert_eq!(r.frame_stats().content_rebuilds, 2);
        assert!(!wm.content_changed());
    }

    #[test]
    fn test_focused_window_drawn_on_top() {
        let mut wm = manager();
        let mut r = Renderer::new(64);
        let mut term = terminal();
        let now = Instant::now();
        wm.add_window(Some("bottom"), now);
        wm.add_window(Some("top"), now);
        draw(&mut term, &mut r, &mut wm, now);
        let buf = term.backend().buffer().clone();
        let g = wm.windows()[1].geometry;
        let title: String = (g.x..g.right())
            .map(|x| buf[(x as u16, g.y as u16)].symbol().to_string())
            .collect();
        assert!(title.contains("top"));
        assert!(!title.contains("bottom"));
    }

    #[test]
    fn test_minimized_window_not_drawn() {
        let mut wm = manager();
        let mut r = Renderer::new(64);
        let mut term = terminal();
        let now = Instant::now();
        wm.add_window(None, now);
        wm.minimize_window(0, now);
        draw(&mut term, &mut r, &mut wm, now);
        assert_eq!(r.frame_stats().layers_composed, 0);
    }

    #[test]
    fn test_animating_window_is_elevated() {
        let mut wm = animated_manager();
        let r = Renderer::new(64);
        let now = Instant::now();
        wm.add_window(None, now);
        wm.add_window(None, now);
        wm.focus_window(0);
        wm.snap_focused(SnapTarget::Left, now);
        // Window 0 keeps animating after window 1 is raised above it.
        wm.focus_window(1);
        let id = wm.windows()[0].id.clone();
        assert!(wm.is_animating(&id));
        assert_eq!(r.paint_order(&wm), vec![1, 0]);
        wm.tick(now + Duration::from_secs(1));
        assert!(!wm.is_animating(&id));
        assert_eq!(r.paint_order(&wm), vec![0, 1]);
    }

    #[test]
    fn test_cache_reset_request() {
        let mut wm = manager();
        let mut r = Renderer::new(64);
        let mut term = terminal();
        let now = Instant::now();
        wm.add_window(None, now);
        draw(&mut term, &mut r, &mut wm, now);
        assert!(r.style_stats().misses > 0);
        wm.request_cache_reset();
        draw(&mut term, &mut r, &mut wm, now);
        assert_eq!(r.style_stats().misses, 0);
        assert_eq!(wm.notifications().items().len(), 1);
    }

    #[test]
    fn test_help_overlay_drawn() {
        let mut wm = manager();
        let mut r = Renderer::new(64);
        let mut term = terminal();
        let now = Instant::now();
        wm.show_overlay(Overlay::Help { scroll: 0 });
        draw(&mut term, &mut r, &mut wm, now);
        let buf = term.backend().buffer();
        let all: String = (0..buf.area.height)
            .flat_map(|y| (0..buf.area.width).map(move |x| (x, y)))
            .map(|p| buf[p].symbol().to_string())
            .collect();
        assert!(all.contains("Help"));
        assert!(all.contains("Prefix (C-b)"));
    }
}
