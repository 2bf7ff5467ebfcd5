//! Window manager scenarios driven through the public API.
//!
//! Sessions come from `DetachedSpawner`, so no shell is started; output is
//! fed straight into each window's emulator.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use shelldock::manager::SnapTarget;
use shelldock::window::DetachedSpawner;
use shelldock::{Config, WindowManager};

fn manager(animations: bool) -> WindowManager {
    let config = Config {
        animations,
        ..Config::default()
    };
    WindowManager::new(config, Box::new(DetachedSpawner::default()), (120, 41))
}

fn z_values(wm: &WindowManager) -> Vec<usize> {
    wm.windows().iter().map(|w| w.z).collect()
}

fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

#[test]
fn test_add_to_empty_manager_focuses_at_z0() {
    let mut wm = manager(false);
    let index = wm.add_window(None, Instant::now());
    assert_eq!(index, Some(0));
    assert_eq!(wm.len(), 1);
    assert_eq!(wm.focused_index(), Some(0));
    assert_eq!(wm.windows()[0].z, 0);
}

#[test]
fn test_focusing_bottom_window_raises_it() {
    let mut wm = manager(false);
    let now = Instant::now();
    wm.add_window(None, now);
    wm.add_window(None, now);
    wm.focus_window(0);
    assert_eq!(z_values(&wm), vec![1, 0]);
    assert_eq!(wm.focused_index(), Some(0));
}

#[test]
fn test_minimize_advances_focus_and_appends_to_dock() {
    let mut wm = manager(false);
    let now = Instant::now();
    wm.add_window(Some("first"), now);
    wm.add_window(Some("second"), now);
    wm.add_window(Some("third"), now);

    wm.minimize_window(0, now);
    assert_eq!(wm.focused_index(), Some(2));

    wm.minimize_focused(now);
    assert_eq!(wm.focused_index(), Some(1));
    assert_eq!(wm.dock_order(), vec![0, 2]);
}

#[test]
fn test_animated_minimize_moves_focus_on_completion() {
    let mut wm = manager(true);
    let now = Instant::now();
    wm.add_window(None, now);
    wm.add_window(None, now);

    wm.minimize_focused(now);
    assert_eq!(wm.dock_order(), vec![1]);
    assert_eq!(wm.focused_index(), Some(1));

    wm.tick(now + Duration::from_secs(2));
    assert!(wm.animations().is_empty());
    assert!(wm.windows()[1].minimized);
    assert_eq!(wm.focused_index(), Some(0));
}

#[test]
fn test_search_in_scrollback_lands_on_screen() {
    let mut wm = manager(false);
    let now = Instant::now();
    wm.add_window(None, now);
    {
        let term = wm.windows()[0].terminal();
        term.process(b"needle in the haystack\r\n");
        for i in 0..200 {
            term.process(format!("filler line {i}\r\n").as_bytes());
        }
    }
    assert!(wm.enter_copy_mode());

    for k in "/needle".chars() {
        wm.copy_mode_key(key(k), now);
    }
    wm.copy_mode_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), now);

    let w = &wm.windows()[0];
    let cm = w.copy_mode.as_ref().unwrap();
    let current = cm.search.current_match().unwrap();
    assert_eq!(current.pos().line, 0);
    assert!(cm.scroll_offset > 0);
    assert_eq!(cm.viewport_row(current.pos().line), Some(cm.cursor.0));
    assert_eq!(cm.cursor_abs(), current.pos());
}

#[test]
fn test_delete_focused_leaves_contiguous_z() {
    let mut wm = manager(false);
    let now = Instant::now();
    for _ in 0..3 {
        wm.add_window(None, now);
    }
    wm.focus_window(1);
    wm.close_focused(now);

    assert_eq!(wm.len(), 2);
    let mut zs = z_values(&wm);
    zs.sort_unstable();
    assert_eq!(zs, vec![0, 1]);
    let focused = wm.focused_index().unwrap();
    assert!(focused < wm.len());
    assert!(wm.windows()[focused].is_visible());
}

#[test]
fn test_close_twice_is_harmless() {
    let mut wm = manager(false);
    let now = Instant::now();
    wm.add_window(None, now);
    wm.close_focused(now);
    wm.close_focused(now);
    wm.delete_window(5, now);
    assert!(wm.is_empty());
    assert_eq!(wm.focused_index(), None);
}

#[test]
fn test_spawn_failure_adds_nothing() {
    let mut wm = WindowManager::new(Config::default(), Box::new(DetachedSpawner::failing()), (120, 41));
    assert_eq!(wm.add_window(None, Instant::now()), None);
    assert!(wm.is_empty());
    assert_eq!(wm.notifications().items().len(), 1);
}

#[test]
fn test_workspaces_keep_their_windows() {
    let mut wm = manager(false);
    let now = Instant::now();
    wm.add_window(Some("one"), now);
    wm.switch_workspace(2, now);
    assert_eq!(wm.focused_index(), None);
    wm.add_window(Some("two"), now);
    assert_eq!(wm.windows()[1].workspace, 2);

    wm.switch_workspace(1, now);
    assert_eq!(wm.focused_index(), Some(0));
    assert_eq!(wm.occupied_workspaces(), vec![1, 2]);
}

#[test]
fn test_tiling_covers_viewport() {
    let mut wm = manager(false);
    let now = Instant::now();
    for _ in 0..3 {
        wm.add_window(None, now);
    }
    wm.toggle_tiling(now);
    assert!(wm.is_tiling());

    let vp = wm.viewport();
    let area: i64 = wm.windows().iter().map(|w| w.geometry.area()).sum();
    assert_eq!(area, vp.area());
    for (i, a) in wm.windows().iter().enumerate() {
        for b in &wm.windows()[i + 1..] {
            assert!(!a.geometry.intersects(&b.geometry));
        }
    }
}

#[test]
fn test_snap_then_unsnap_restores_geometry() {
    let mut wm = manager(false);
    let now = Instant::now();
    wm.add_window(None, now);
    let before = wm.windows()[0].geometry;
    wm.snap_focused(SnapTarget::Left, now);
    let vp = wm.viewport();
    assert_eq!(wm.windows()[0].geometry.width, vp.width / 2);
    wm.unsnap_focused(now);
    assert_eq!(wm.windows()[0].geometry, before);
}
