//! The dock bar on the last terminal row.

use ratatui::buffer::Buffer;
use ratatui::style::{Color, Modifier, Style};

use crate::constants::{DOCK_MODE_WIDTH, DOCK_PILL_WIDTH, DOCK_WORKSPACE_CELL_WIDTH, WORKSPACE_COUNT};
use crate::input::InputMode;
use crate::layout::DockLayout;
use crate::manager::WindowManager;

const DOCK_BG: Color = Color::Rgb(30, 30, 40);

/// Key reminder shown while the focused window is in copy mode.
pub const COPY_MODE_HELP: &str = "hjkl move  w/b word  v/V select  y yank  / ? search  n/N next  q exit";

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Draw the dock into `buf`.
pub fn render_dock(buf: &mut Buffer, wm: &WindowManager, clock: &str) {
    let (term_w, term_h) = wm.term_size();
    let dock = DockLayout::new(term_w, term_h);
    if term_h == 0 || dock.row >= i32::from(buf.area.bottom()) {
        return;
    }
    let row = dock.row as u16;
    let width = buf.area.width;
    let base = Style::default().bg(DOCK_BG).fg(Color::Gray);
    buf.set_string(0, row, " ".repeat(usize::from(width)), base);

    // Mode
    let (label, color) = if wm.focused_in_copy_mode() {
        ("COPY", Color::Yellow)
    } else if wm.selection_mode() {
        ("SEL", Color::Magenta)
    } else {
        match wm.mode() {
            InputMode::WindowManagement => (wm.mode().label(), Color::Cyan),
            InputMode::Terminal => (wm.mode().label(), Color::Green),
        }
    };
    let mode = format!("{label:^w$}", w = DOCK_MODE_WIDTH as usize);
    buf.set_string(
        dock.mode_x as u16,
        row,
        mode,
        Style::default().bg(color).fg(Color::Black).add_modifier(Modifier::BOLD),
    );

    // Workspaces
    let occupied = wm.occupied_workspaces();
    for ws in 1..=WORKSPACE_COUNT {
        let x = dock.workspaces_x + (ws as i32 - 1) * DOCK_WORKSPACE_CELL_WIDTH;
        if x >= i32::from(width) {
            break;
        }
        let style = if ws == wm.current_workspace() {
            Style::default().bg(Color::Cyan).fg(Color::Black).add_modifier(Modifier::BOLD)
        } else if occupied.contains(&ws) {
            base.fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            base.fg(Color::DarkGray)
        };
        buf.set_string(x as u16, row, ws.to_string(), style);
    }

    // Minimized pills
    let order = wm.dock_order();
    let visible = dock.visible_slots();
    let mut last_right = dock.pills_x;
    for (slot, &index) in order.iter().enumerate().take(visible) {
        let w = &wm.windows()[index];
        let g = dock.slot(slot);
        last_right = g.right();
        if w.minimizing {
            continue;
        }
        let name = truncate(&w.display_name(), (DOCK_PILL_WIDTH - 4) as usize);
        let text = format!("{:<w$}", format!("{} {name}", slot + 1), w = (DOCK_PILL_WIDTH - 2) as usize);
        buf.set_string(g.x as u16, row, format!("[{text}]"), base.fg(Color::White).bg(Color::Rgb(60, 60, 80)));
    }
    if order.len() > visible && last_right + 4 < i32::from(width) {
        buf.set_string(
            (last_right + 1) as u16,
            row,
            format!("+{}", order.len() - visible),
            base.fg(Color::Yellow),
        );
    }

    // Right side
    let right = if wm.focused_in_copy_mode() {
        COPY_MODE_HELP.to_string()
    } else {
        let stats = wm.stats();
        let pct = |v: Option<f32>| v.map_or_else(|| "--".to_string(), |p| format!("{p:.0}%"));
        format!("CPU {} RAM {}  {clock} ", pct(stats.cpu_percent()), pct(stats.mem_percent()))
    };
    let len = right.chars().count() as u16;
    let min_x = (last_right.max(dock.pills_x) + 1).clamp(0, i32::from(u16::MAX)) as u16;
    if len < width && width - len >= min_x {
        buf.set_string(width - len, row, right, base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::test_support::manager;
    use ratatui::layout::Rect;
    use std::time::Instant;

    fn dock_text(buf: &Buffer, row: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, row)].symbol().to_string()).collect()
    }

    #[test]
    fn test_dock_shows_mode_workspaces_and_pills() {
        let mut wm = manager();
        let now = Instant::now();
        wm.add_window(Some("alpha"), now);
        wm.add_window(Some("beta"), now);
        wm.minimize_window(0, now);
        let mut buf = Buffer::empty(Rect::new(0, 0, 120, 41));
        render_dock(&mut buf, &wm, "12:00");
        let text = dock_text(&buf, 40);
        assert!(text.starts_with("   WM   "));
        assert!(text.contains("1 2 3"));
        assert!(text.contains("[1 alpha"));
        assert!(!text.contains("beta"));
        assert!(text.trim_end().ends_with("12:00"));
    }

    #[test]
    fn test_copy_mode_help_replaces_stats() {
        let mut wm = manager();
        let now = Instant::now();
        wm.add_window(None, now);
        wm.enter_copy_mode();
        let mut buf = Buffer::empty(Rect::new(0, 0, 160, 41));
        render_dock(&mut buf, &wm, "12:00");
        let text = dock_text(&buf, 40);
        assert!(text.contains("COPY"));
        assert!(text.contains("y yank"));
        assert!(!text.contains("CPU"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-name", 6), "a-ver…");
    }
}
