//! The event loop.
//!
//! ```text
//! ┌────────────── one iteration ──────────────┐
//! │ wait for input (16 ms, 33 ms while drag)  │
//! │   └─ drain every queued event → router    │
//! │ wm.tick(): exits, animations, stats,      │
//! │            toasts, prefix expiry          │
//! │ render if input, tick or output changed   │
//! └───────────────────────────────────────────┘
//! ```
//!
//! The loop is the only owner of the [`WindowManager`]. PTY threads reach
//! it solely through their emulators and the exit channel the manager
//! drains in `tick`.

// Rust guideline compliant 2026-02

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event};
use ratatui::backend::Backend;
use ratatui::Terminal;

use crate::constants::{FRAME_INTERVAL, FRAME_INTERVAL_INTERACTIVE};
use crate::input::InputRouter;
use crate::manager::WindowManager;
use crate::render::{FrameStats, Renderer};

/// Where the loop gets its input from.
pub trait EventSource {
    /// Wait up to `timeout` for the next event. `Ok(None)` on timeout.
    fn next_event(&mut self, timeout: Duration) -> Result<Option<Event>>;
}

/// Reads events from the real terminal.
#[derive(Debug, Default)]
pub struct CrosstermEvents;

impl EventSource for CrosstermEvents {
    fn next_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if event::poll(timeout)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }
}

/// Owns the terminal, the manager and the renderer, and runs the loop.
pub struct Runner<B: Backend> {
    terminal: Terminal<B>,
    wm: WindowManager,
    router: InputRouter,
    renderer: Renderer,
    shutdown: Arc<AtomicBool>,
    needs_redraw: bool,
}

impl<B: Backend> std::fmt::Debug for Runner<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("wm", &self.wm)
            .field("renderer", &self.renderer)
            .field("needs_redraw", &self.needs_redraw)
            .finish_non_exhaustive()
    }
}

impl<B> Runner<B>
where
    B: Backend,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    /// Create a runner. `shutdown` is set by signal handlers to end the
    /// loop from outside.
    pub fn new(terminal: Terminal<B>, wm: WindowManager, shutdown: Arc<AtomicBool>) -> Self {
        let renderer = Renderer::new(wm.config().style_cache_capacity);
        Self {
            terminal,
            wm,
            router: InputRouter::new(),
            renderer,
            shutdown,
            needs_redraw: true,
        }
    }

    /// The window manager.
    pub fn manager(&self) -> &WindowManager {
        &self.wm
    }

    /// The window manager, mutably.
    pub fn manager_mut(&mut self) -> &mut WindowManager {
        &mut self.wm
    }

    /// The ratatui terminal.
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    /// Renderer counters.
    pub fn frame_stats(&self) -> FrameStats {
        self.renderer.frame_stats()
    }

    /// Whether the loop should stop.
    pub fn should_quit(&self) -> bool {
        self.wm.should_quit() || self.shutdown.load(Ordering::Relaxed)
    }

    /// Run until quit is requested or the shutdown flag is set, then close
    /// every session.
    pub fn run(&mut self, events: &mut impl EventSource) -> Result<()> {
        log::info!("Event loop starting");
        let result = self.run_loop(events);
        self.wm.shutdown();
        log::info!("Event loop exiting");
        result
    }

    fn run_loop(&mut self, events: &mut impl EventSource) -> Result<()> {
        while !self.should_quit() {
            self.step(events)?;
        }
        Ok(())
    }

    /// One iteration: input, tick, and a frame when anything changed.
    /// Returns `true` when a frame was drawn.
    pub fn step(&mut self, events: &mut impl EventSource) -> Result<bool> {
        let timeout = if self.router.is_interactive() {
            FRAME_INTERVAL_INTERACTIVE
        } else {
            FRAME_INTERVAL
        };

        if let Some(first) = events.next_event(timeout)? {
            self.dispatch(&first);
            // Drain what queued up during the wait so a burst of motion
            // events costs one frame.
            while !self.should_quit() {
                match events.next_event(Duration::ZERO)? {
                    Some(event) => self.dispatch(&event),
                    None => break,
                }
            }
        }

        let now = Instant::now();
        self.needs_redraw |= self.wm.tick(now);
        self.needs_redraw |= self.wm.content_changed();
        // Toasts fade and the which-key hint appears on a timer.
        self.needs_redraw |= self.wm.prefix().is_armed() || !self.wm.notifications().items().is_empty();

        if !self.needs_redraw || self.should_quit() {
            return Ok(false);
        }
        self.render(now)?;
        Ok(true)
    }

    fn dispatch(&mut self, event: &Event) {
        if let Event::Resize(cols, rows) = event {
            log::debug!("Terminal resized to {cols}x{rows}");
        }
        self.router.handle_event(&mut self.wm, event, Instant::now());
        self.needs_redraw = true;
    }

    fn render(&mut self, now: Instant) -> Result<()> {
        let wm = &mut self.wm;
        let renderer = &mut self.renderer;
        self.terminal.draw(|f| renderer.draw(f, wm, now))?;
        self.needs_redraw = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;

    use crate::manager::test_support::manager;

    /// Replays a fixed list of events, then reports timeouts.
    #[derive(Default)]
    struct Scripted {
        events: VecDeque<Event>,
        waits: Vec<Duration>,
    }

    impl Scripted {
        fn keys(keys: &[KeyEvent]) -> Self {
            Self {
                events: keys.iter().map(|k| Event::Key(*k)).collect(),
                waits: Vec::new(),
            }
        }
    }

    impl EventSource for Scripted {
        fn next_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
            self.waits.push(timeout);
            Ok(self.events.pop_front())
        }
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn runner() -> Runner<TestBackend> {
        let terminal = Terminal::new(TestBackend::new(120, 41)).unwrap();
        Runner::new(terminal, manager(), Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn test_first_step_draws() {
        let mut r = runner();
        assert!(r.step(&mut Scripted::default()).unwrap());
        assert_eq!(r.frame_stats().frames, 1);
    }

    #[test]
    fn test_idle_step_skips_frame() {
        let mut r = runner();
        let mut events = Scripted::default();
        r.step(&mut events).unwrap();
        assert!(!r.step(&mut events).unwrap());
        assert_eq!(r.frame_stats().frames, 1);
    }

    #[test]
    fn test_queued_events_share_one_frame() {
        let mut r = runner();
        let mut events = Scripted::keys(&[key('n'), key('n'), key('n')]);
        assert!(r.step(&mut events).unwrap());
        assert_eq!(r.manager().len(), 3);
        assert_eq!(r.frame_stats().frames, 1);
    }

    #[test]
    fn test_output_triggers_frame() {
        let mut r = runner();
        let mut events = Scripted::keys(&[key('n')]);
        r.step(&mut events).unwrap();
        r.manager().windows()[0].terminal().process(b"tick");
        assert!(r.step(&mut events).unwrap());
        assert_eq!(r.frame_stats().content_rebuilds, 2);
    }

    #[test]
    fn test_quit_key_ends_run() {
        let mut r = runner();
        let mut events = Scripted::keys(&[key('n'), key('q')]);
        r.run(&mut events).unwrap();
        assert!(r.should_quit());
        assert!(r.manager().windows()[0].session().is_closed());
    }

    #[test]
    fn test_shutdown_flag_ends_run() {
        let terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        let mut r = Runner::new(terminal, manager(), Arc::clone(&flag));
        let mut events = Scripted::default();
        r.run(&mut events).unwrap();
        assert!(events.waits.is_empty());
    }

    #[test]
    fn test_normal_frame_interval_when_idle() {
        let mut r = runner();
        let mut events = Scripted::default();
        r.step(&mut events).unwrap();
        assert_eq!(events.waits, vec![FRAME_INTERVAL]);
    }
}
