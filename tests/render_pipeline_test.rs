//! Render pipeline: dirty tracking, layer reuse and the style cache,
//! drawn into a `TestBackend`.

use std::time::{Duration, Instant};

use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;
use ratatui::Terminal;
use shelldock::render::Renderer;
use shelldock::window::DetachedSpawner;
use shelldock::{Config, WindowManager};

struct Harness {
    term: Terminal<TestBackend>,
    renderer: Renderer,
    wm: WindowManager,
}

impl Harness {
    fn new(animations: bool) -> Self {
        let config = Config {
            animations,
            ..Config::default()
        };
        Self {
            term: Terminal::new(TestBackend::new(100, 31)).unwrap(),
            renderer: Renderer::new(256),
            wm: WindowManager::new(config, Box::new(DetachedSpawner::default()), (100, 31)),
        }
    }

    fn draw(&mut self, now: Instant) {
        let Self { term, renderer, wm } = self;
        term.draw(|f| renderer.draw(f, wm, now)).unwrap();
    }

    fn screen(&self) -> String {
        buffer_text(self.term.backend().buffer())
    }
}

fn buffer_text(buf: &Buffer) -> String {
    let mut out = String::new();
    for y in 0..buf.area.height {
        for x in 0..buf.area.width {
            out.push_str(buf[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

#[test]
fn test_shell_output_reaches_the_screen() {
    let mut h = Harness::new(false);
    let now = Instant::now();
    h.wm.add_window(Some("build"), now);
    h.wm.windows()[0].terminal().process(b"$ cargo --version\r\n");
    h.draw(now);
    let screen = h.screen();
    assert!(screen.contains("build"));
    assert!(screen.contains("$ cargo --version"));
}

#[test]
fn test_dragging_never_rerenders_content() {
    let mut h = Harness::new(false);
    let now = Instant::now();
    h.wm.add_window(None, now);
    h.wm.windows()[0].terminal().process(b"static text");
    h.draw(now);

    for step in 0..10 {
        h.wm.move_window(0, step, step / 2);
        h.draw(now);
    }
    let stats = h.renderer.frame_stats();
    assert_eq!(stats.content_rebuilds, 1);
    assert_eq!(stats.layers_composed, 11);
    assert!(h.screen().contains("static text"));
}

#[test]
fn test_idle_frames_reuse_layers_and_hit_the_style_cache() {
    let mut h = Harness::new(false);
    let now = Instant::now();
    h.wm.add_window(None, now);
    h.wm.add_window(None, now);
    h.draw(now);
    let misses = h.renderer.style_stats().misses;

    h.draw(now);
    h.draw(now);
    let stats = h.renderer.frame_stats();
    assert_eq!(stats.layers_reused, 4);
    assert_eq!(h.renderer.style_stats().misses, misses);
}

#[test]
fn test_focus_change_recomposes_both_layers() {
    let mut h = Harness::new(false);
    let now = Instant::now();
    h.wm.add_window(None, now);
    h.wm.add_window(None, now);
    h.draw(now);
    let before = h.renderer.frame_stats().layers_composed;
    h.wm.focus_window(0);
    h.draw(now);
    assert_eq!(h.renderer.frame_stats().layers_composed, before + 2);
    assert_eq!(h.renderer.frame_stats().content_rebuilds, 2);
}

#[test]
fn test_minimized_window_shows_on_dock_after_animation() {
    let mut h = Harness::new(true);
    let now = Instant::now();
    h.wm.add_window(Some("logs"), now);
    h.wm.minimize_focused(now);
    h.draw(now);
    let dock_row = |s: &str| s.lines().last().unwrap_or_default().to_string();
    assert!(!dock_row(&h.screen()).contains("logs"));

    let later = now + Duration::from_secs(2);
    h.wm.tick(later);
    h.draw(later);
    assert!(dock_row(&h.screen()).contains("[1 logs"));
}

#[test]
fn test_copy_mode_highlights_stay_on_their_text_while_output_arrives() {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    let mut h = Harness::new(false);
    let now = Instant::now();
    h.wm.add_window(Some("tail"), now);
    h.wm.resize_window(0, 40, 7);
    for i in 0..30 {
        h.wm.windows()[0].terminal().process(format!("line {i:02}\r\n").as_bytes());
    }

    assert!(h.wm.enter_copy_mode());
    for c in "?line 03".chars() {
        h.wm.copy_mode_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE), now);
    }
    h.wm.copy_mode_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), now);
    h.draw(now);

    let cursor_row = |h: &Harness| {
        let w = &h.wm.windows()[0];
        let row = w.copy_mode.as_ref().map_or(0, |cm| cm.cursor.0);
        let g = w.geometry;
        let y = (g.y + 1) as u16 + row;
        let buf = h.term.backend().buffer();
        ((g.x + 1)..(g.right() - 1))
            .map(|x| buf[(x as u16, y)].symbol().to_string())
            .collect::<String>()
    };
    assert!(cursor_row(&h).contains("line 03"));

    h.wm.windows()[0].terminal().process(b"line 30\r\nline 31\r\nline 32\r\n");
    assert!(!h.wm.content_changed());
    if let Some(w) = h.wm.window_mut(0) {
        w.mark_content_dirty();
    }
    h.draw(now);
    assert!(cursor_row(&h).contains("line 03"));

    h.wm.copy_mode_key(KeyEvent::new(KeyCode::Char('V'), KeyModifiers::NONE), now);
    h.wm.copy_mode_key(KeyEvent::new(KeyCode::Char('y'), KeyModifiers::NONE), now);
    assert_eq!(h.wm.clipboard().last(), Some("line 03"));

    h.draw(now);
    assert!(h.screen().contains("line 32"));
}
