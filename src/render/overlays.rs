//! Modal and floating overlays drawn above the windows.
//!
//! ```text
//! ┌───────────────────────────────────────── [PREFIX] ┐  <- prefix indicator
//! │                                   ┌ ok ─────────┐ │  <- notifications
//! │         ┌ Help ──────────┐        └─────────────┘ │
//! │         │ ...            │                        │
//! │         └────────────────┘             ┌ C-b … ┐  │  <- which-key hint
//! └───────────────────────────────────────────────────┘
//! ```

use std::time::Instant;

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::style_cache::StyleCacheStats;
use crate::input::PrefixState;
use crate::logging::LogBuffer;
use crate::manager::{Rename, WindowManager};
use crate::notifications::{NotificationCenter, Severity};

/// Centered rectangle taking `percent_x` x `percent_y` of `parent`.
pub fn centered_rect(percent_x: u16, percent_y: u16, parent: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(parent);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn modal_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            title,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ))
}

// ============================================================================
// Help
// ============================================================================

/// Help text; `{prefix}` is replaced with the configured chord.
const HELP: &[(&str, &[(&str, &str)])] = &[
    (
        "Window management mode",
        &[
            ("n", "new window"),
            ("w / x", "close focused window"),
            ("m", "minimize focused window"),
            ("tab / shift-tab", "cycle focus"),
            ("1 2 3 4", "snap to a quarter"),
            ("h / l / k", "snap left / right / full"),
            ("j", "unsnap"),
            ("s", "selection mode"),
            ("t", "toggle tiling"),
            ("i / enter", "terminal mode"),
            ("[", "copy mode"),
            ("?", "this help"),
            ("q / ctrl-c", "quit"),
        ],
    ),
    (
        "Prefix ({prefix})",
        &[
            ("c", "new window"),
            ("x", "close window"),
            ("n / p", "next / previous window"),
            (",", "rename window"),
            ("[", "copy mode"),
            ("d", "back to window management"),
            ("?", "help"),
            ("L", "log viewer"),
            ("S", "style cache stats"),
            ("w 1-9", "switch workspace"),
            ("w shift+1-9", "move window to workspace"),
            ("m m / m 1-9 / m M", "minimize / restore slot / restore all"),
            ("t t r n p", "tiling toggle / retile / swap next / prev"),
            ("t h l k j", "snap left / right / full / unsnap"),
            ("{prefix}", "send the prefix to the shell"),
        ],
    ),
    (
        "Copy mode",
        &[
            ("h j k l", "move"),
            ("w b e", "word motions"),
            ("0 ^ $", "line start / first char / end"),
            ("gg G", "top / bottom"),
            ("ctrl-u ctrl-d", "half page"),
            ("f F t T ; ,", "find character"),
            ("v V", "visual / visual line"),
            ("y enter", "yank"),
            ("/ ? n N", "search"),
            ("q esc", "exit"),
        ],
    ),
    (
        "Mouse",
        &[
            ("drag title", "move (floating) / swap (tiling)"),
            ("drag corner", "resize"),
            ("[_] [□] [x]", "minimize / maximize / close"),
            ("wheel", "scroll back"),
            ("dock", "restore window / switch workspace"),
        ],
    ),
];

/// Help lines with the prefix label filled in.
pub fn help_lines(prefix: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (section, entries) in HELP {
        lines.push(Line::from(Span::styled(
            section.replace("{prefix}", prefix),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        for (keys, what) in *entries {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {:<20}", keys.replace("{prefix}", prefix)),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw((*what).to_string()),
            ]));
        }
        lines.push(Line::from(""));
    }
    lines
}

/// Scrollable help modal.
pub fn render_help(f: &mut Frame, prefix: &str, scroll: u16) {
    let area = centered_rect(70, 80, f.area());
    let lines = help_lines(prefix);
    let max_scroll = (lines.len() as u16).saturating_sub(area.height.saturating_sub(2));
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .block(modal_block(" Help [j/k scroll | Esc close] "))
            .scroll((scroll.min(max_scroll), 0)),
        area,
    );
}

// ============================================================================
// Logs
// ============================================================================

fn level_color(level: log::Level) -> Color {
    match level {
        log::Level::Error => Color::Red,
        log::Level::Warn => Color::Yellow,
        log::Level::Info => Color::Green,
        log::Level::Debug => Color::Blue,
        log::Level::Trace => Color::DarkGray,
    }
}

/// Log viewer modal. `scroll` counts lines up from the newest entry.
pub fn render_logs(f: &mut Frame, logs: Option<&LogBuffer>, scroll: u16) {
    let area = centered_rect(90, 80, f.area());
    let visible = usize::from(area.height.saturating_sub(2));
    let entries = logs.map(LogBuffer::snapshot).unwrap_or_default();

    let end = entries.len().saturating_sub(usize::from(scroll));
    let start = end.saturating_sub(visible);
    let lines: Vec<Line> = if entries.is_empty() {
        vec![Line::from(Span::styled("No log entries", Style::default().add_modifier(Modifier::DIM)))]
    } else {
        entries[start..end]
            .iter()
            .map(|e| {
                Line::from(vec![
                    Span::styled(e.time.format("%H:%M:%S ").to_string(), Style::default().fg(Color::DarkGray)),
                    Span::styled(format!("{:<5} ", e.level), Style::default().fg(level_color(e.level))),
                    Span::styled(format!("{}: ", e.target), Style::default().fg(Color::Gray)),
                    Span::raw(e.message.clone()),
                ])
            })
            .collect()
    };
    let title = format!(" Logs ({}) [j/k scroll | Esc close] ", entries.len());
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(modal_block(&title)), area);
}

// ============================================================================
// Cache stats
// ============================================================================

/// Style cache counters plus window cache occupancy.
pub fn render_cache_stats(f: &mut Frame, stats: StyleCacheStats, wm: &WindowManager) {
    let area = centered_rect(50, 40, f.area());
    let cached_layers = wm.windows().iter().filter(|w| w.layer_cache.is_some()).count();
    let cached_content = wm.windows().iter().filter(|w| w.content_cache.is_some()).count();
    let row = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label:<16}"), Style::default().fg(Color::Cyan)),
            Span::raw(value),
        ])
    };
    let lines = vec![
        Line::from(Span::styled("Style cache", Style::default().add_modifier(Modifier::BOLD))),
        row("hits", stats.hits.to_string()),
        row("misses", stats.misses.to_string()),
        row("evictions", stats.evictions.to_string()),
        row("size", format!("{} / {}", stats.size, stats.capacity)),
        row("hit rate", format!("{:.1}%", stats.hit_rate() * 100.0)),
        Line::from(""),
        Line::from(Span::styled("Windows", Style::default().add_modifier(Modifier::BOLD))),
        row("cached layers", format!("{cached_layers} / {}", wm.len())),
        row("cached content", format!("{cached_content} / {}", wm.len())),
        row("animations", wm.animations().len().to_string()),
    ];
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(modal_block(" Cache stats [r reset | Esc close] ")),
        area,
    );
}

// ============================================================================
// Prefix indicator and which-key
// ============================================================================

/// Keys offered in each prefix state.
pub fn which_key_entries(state: PrefixState) -> &'static [(&'static str, &'static str)] {
    match state {
        PrefixState::None => &[],
        PrefixState::Prefix => &[
            ("c", "new"),
            ("x", "close"),
            ("n/p", "cycle"),
            (",", "rename"),
            ("[", "copy"),
            ("d", "wm mode"),
            ("w", "workspace…"),
            ("m", "minimize…"),
            ("t", "tiling…"),
            ("?", "help"),
            ("L", "logs"),
            ("S", "cache"),
        ],
        PrefixState::Workspace => &[("1-9", "switch"), ("⇧1-9", "move window")],
        PrefixState::Minimize => &[("m", "minimize"), ("1-9", "restore slot"), ("M", "restore all")],
        PrefixState::Tiling => &[
            ("t", "toggle"),
            ("r", "retile"),
            ("n/p", "swap"),
            ("h/l/k", "snap"),
            ("j", "unsnap"),
        ],
    }
}

/// Top-right badge while the prefix chain is armed.
pub fn render_prefix_indicator(f: &mut Frame, state: PrefixState) {
    let Some(label) = state.label() else {
        return;
    };
    let text = format!(" {label} ");
    let width = text.chars().count() as u16;
    let area = f.area();
    if width > area.width {
        return;
    }
    let rect = Rect::new(area.right() - width, area.y, width, 1);
    f.render_widget(
        Paragraph::new(Span::styled(
            text,
            Style::default().bg(Color::Magenta).fg(Color::Black).add_modifier(Modifier::BOLD),
        )),
        rect,
    );
}

/// Bottom-right hint box listing the keys the armed chain accepts.
pub fn render_which_key(f: &mut Frame, state: PrefixState, prefix: &str) {
    let entries = which_key_entries(state);
    if entries.is_empty() {
        return;
    }
    let lines: Vec<Line> = entries
        .iter()
        .map(|(k, what)| {
            Line::from(vec![
                Span::styled(format!(" {k:<5}"), Style::default().fg(Color::Yellow)),
                Span::raw((*what).to_string()),
            ])
        })
        .collect();
    let area = f.area();
    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(1));
    let width = 24.min(area.width);
    let rect = Rect::new(
        area.right() - width,
        area.bottom().saturating_sub(height + 1),
        width,
        height,
    );
    let title = format!(" {prefix} {} ", state.label().unwrap_or_default().to_lowercase());
    f.render_widget(Clear, rect);
    f.render_widget(Paragraph::new(lines).block(modal_block(&title)), rect);
}

// ============================================================================
// Notifications and rename
// ============================================================================

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Blue,
        Severity::Success => Color::Green,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
    }
}

/// Stack toasts in the top-right corner, newest at the top. Toasts dim in
/// the last third of their lifetime.
pub fn render_notifications(f: &mut Frame, center: &NotificationCenter, now: Instant) {
    let area = f.area();
    let width = 44.min(area.width);
    let mut y = area.y + 1;
    for n in center.items().iter().rev() {
        if y + 3 > area.bottom().saturating_sub(1) {
            break;
        }
        let color = severity_color(n.severity);
        let mut style = Style::default().fg(color);
        if n.remaining(now, center.lifetime()) < 0.33 {
            style = style.add_modifier(Modifier::DIM);
        }
        let rect = Rect::new(area.right() - width, y, width, 3);
        f.render_widget(Clear, rect);
        f.render_widget(
            Paragraph::new(Line::from(n.message.clone()))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(style)
                        .title(Span::styled(format!(" {} ", n.severity), style)),
                )
                .style(style),
            rect,
        );
        y += 3;
    }
}

/// Rename prompt with the input cursor placed.
pub fn render_rename(f: &mut Frame, rename: &Rename) {
    let area = centered_rect(50, 20, f.area());
    let rect = Rect::new(area.x, area.y + area.height.saturating_sub(3) / 2, area.width, 3);
    let inner_width = rect.width.saturating_sub(2) as usize;
    let scroll = rename.input.visual_scroll(inner_width);
    f.render_widget(Clear, rect);
    f.render_widget(
        Paragraph::new(rename.input.value())
            .scroll((0, scroll as u16))
            .block(modal_block(" Rename [Enter apply | Esc cancel] "))
            .alignment(Alignment::Left),
        rect,
    );
    let cursor = rename.input.visual_cursor().max(scroll) - scroll;
    f.set_cursor_position((rect.x + 1 + cursor as u16, rect.y + 1));
}
