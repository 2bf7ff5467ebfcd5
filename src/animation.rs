//! Time-based geometry animations.
//!
//! An [`Animation`] interpolates a window's displayed geometry from a start
//! rectangle to a target rectangle with an ease-out curve. Animations refer
//! to their window by [`WindowId`] and are resolved through the window
//! manager on every tick, so a destroyed window simply leaves an orphaned
//! animation that the manager drops.
//!
//! Progress is computed from wall-clock time, not frame count: a stalled
//! frame jumps ahead rather than slowing the animation down.

use std::time::{Duration, Instant};

use crate::geometry::Geometry;
use crate::window::WindowId;

/// What an animation is doing, which decides its completion side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationKind {
    /// Window shrinking into its dock slot.
    Minimize,
    /// Window growing out of its dock slot.
    Restore,
    /// Window moving to a snap target.
    Snap,
    /// Window moving to its tiled rectangle.
    Tile,
    /// Two tiled windows trading places.
    Swap,
}

/// Result of advancing an animation by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationStep {
    /// Geometry to display this frame.
    pub geometry: Geometry,
    /// True exactly once: on the tick that reached the target.
    pub just_completed: bool,
}

/// A single geometry transition for one window.
#[derive(Debug, Clone)]
pub struct Animation {
    /// Window being animated.
    pub window_id: WindowId,
    /// Kind of transition.
    pub kind: AnimationKind,
    /// Geometry at the start of the animation.
    pub start: Geometry,
    /// Geometry at completion.
    pub target: Geometry,
    started_at: Instant,
    duration: Duration,
    progress: f64,
    complete: bool,
}

impl Animation {
    /// Create an animation starting at `now`.
    pub fn new(
        window_id: WindowId,
        kind: AnimationKind,
        start: Geometry,
        target: Geometry,
        now: Instant,
        duration: Duration,
    ) -> Self {
        Self {
            window_id,
            kind,
            start,
            target,
            started_at: now,
            duration,
            progress: 0.0,
            complete: false,
        }
    }

    /// Advance to `now`.
    ///
    /// The displayed geometry equals `target` exactly once progress reaches 1.
    /// A zero duration completes on the first call.
    pub fn update(&mut self, now: Instant) -> AnimationStep {
        if self.complete {
            return AnimationStep {
                geometry: self.target,
                just_completed: false,
            };
        }

        let elapsed = now.saturating_duration_since(self.started_at);
        self.progress = if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
        };

        if self.progress >= 1.0 {
            self.complete = true;
            return AnimationStep {
                geometry: self.target,
                just_completed: true,
            };
        }

        AnimationStep {
            geometry: self.start.lerp(&self.target, ease_out_cubic(self.progress)),
            just_completed: false,
        }
    }

    /// Progress in `[0, 1]` as of the last [`update`](Self::update).
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Whether the animation has reached its target.
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

/// Ease-out cubic: fast start, gentle landing.
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anim(duration: Duration, now: Instant) -> Animation {
        Animation::new(
            WindowId::from("w1"),
            AnimationKind::Snap,
            Geometry::new(0, 0, 10, 10),
            Geometry::new(40, 20, 30, 12),
            now,
            duration,
        )
    }

    #[test]
    fn test_reaches_target_exactly() {
        let t0 = Instant::now();
        let mut a = anim(Duration::from_millis(200), t0);
        let step = a.update(t0 + Duration::from_millis(500));
        assert_eq!(step.geometry, a.target);
        assert!(step.just_completed);
        assert!(a.is_complete());
    }

    #[test]
    fn test_completion_signalled_once() {
        let t0 = Instant::now();
        let mut a = anim(Duration::from_millis(100), t0);
        assert!(a.update(t0 + Duration::from_millis(150)).just_completed);
        assert!(!a.update(t0 + Duration::from_millis(200)).just_completed);
        assert!(!a.update(t0 + Duration::from_millis(300)).just_completed);
    }

    #[test]
    fn test_midway_is_between_endpoints() {
        let t0 = Instant::now();
        let mut a = anim(Duration::from_millis(200), t0);
        let step = a.update(t0 + Duration::from_millis(100));
        assert!(!step.just_completed);
        assert!(step.geometry.x > 0 && step.geometry.x < 40);
        // ease-out is ahead of linear at the midpoint
        assert!(step.geometry.x > 20);
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let t0 = Instant::now();
        let mut a = anim(Duration::ZERO, t0);
        let step = a.update(t0);
        assert!(step.just_completed);
        assert_eq!(step.geometry, a.target);
    }

    #[test]
    fn test_progress_monotonic() {
        let t0 = Instant::now();
        let mut a = anim(Duration::from_millis(100), t0);
        let mut last = 0.0;
        for ms in (0..=120).step_by(10) {
            a.update(t0 + Duration::from_millis(ms));
            assert!(a.progress() >= last);
            last = a.progress();
        }
        assert!((a.progress() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ease_bounds() {
        assert!(ease_out_cubic(0.0).abs() < f64::EPSILON);
        assert!((ease_out_cubic(1.0) - 1.0).abs() < f64::EPSILON);
        assert!((ease_out_cubic(2.0) - 1.0).abs() < f64::EPSILON);
    }
}
