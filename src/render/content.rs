//! Emulator grid to styled text.
//!
//! Adjacent cells with the same style are merged into one [`Span`], so a
//! typical shell row becomes a few spans instead of one per column.

use ratatui::style::Style;
use ratatui::text::{Line, Span};

use super::style_cache::{StyleCache, StyleKey};
use crate::window::{ContentCache, FrozenScreen, SharedTerminal};

/// Render the grid at scroll `offset` into styled lines.
///
/// The scrollback view is moved for the duration of the read and restored
/// afterwards.
pub fn render_content(terminal: &SharedTerminal, offset: usize, styles: &mut StyleCache) -> ContentCache {
    let generation = terminal.generation();
    let mut parser = terminal.write();
    let lines = screen_lines(parser.screen_mut(), offset, styles);
    ContentCache {
        lines,
        generation,
        scroll_offset: offset,
    }
}

/// Render a copy mode snapshot at scroll `offset`.
pub fn render_frozen(frozen: &mut FrozenScreen, offset: usize, styles: &mut StyleCache) -> ContentCache {
    let generation = frozen.generation();
    let lines = screen_lines(frozen.screen_mut(), offset, styles);
    ContentCache {
        lines,
        generation,
        scroll_offset: offset,
    }
}

fn screen_lines(screen: &mut vt100::Screen, offset: usize, styles: &mut StyleCache) -> Vec<Line<'static>> {
    let saved = screen.scrollback();
    screen.set_scrollback(offset);
    let view: &vt100::Screen = screen;
    let (rows, cols) = view.size();
    let lines = (0..rows).map(|row| row_line(view, row, cols, styles)).collect();
    screen.set_scrollback(saved);
    lines
}

fn row_line(screen: &vt100::Screen, row: u16, cols: u16, styles: &mut StyleCache) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_style: Option<Style> = None;

    for col in 0..cols {
        let Some(cell) = screen.cell(row, col) else {
            continue;
        };
        if cell.is_wide_continuation() {
            continue;
        }
        let style = styles.get(StyleKey::from_cell(cell));
        if run_style.is_some_and(|s| s != style) {
            spans.push(Span::styled(std::mem::take(&mut run), run_style.unwrap_or_default()));
        }
        run_style = Some(style);
        if cell.has_contents() {
            run.push_str(cell.contents());
        } else {
            run.push(' ');
        }
    }
    if let Some(style) = run_style {
        spans.push(Span::styled(run, style));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_are_batched() {
        let term = SharedTerminal::new(3, 20, 100);
        term.process(b"\x1b[31mred\x1b[0m plain");
        let mut styles = StyleCache::new(64);
        let content = render_content(&term, 0, &mut styles);
        assert_eq!(content.lines.len(), 3);
        let first = &content.lines[0];
        assert_eq!(first.spans.len(), 2);
        assert_eq!(first.spans[0].content, "red");
        assert!(first.spans[1].content.starts_with(" plain"));
        assert_eq!(first.spans[1].content.chars().count(), 17);
    }

    #[test]
    fn test_offset_reads_history_and_restores_view() {
        let term = SharedTerminal::new(3, 10, 100);
        for i in 0..10 {
            term.process(format!("L{i}\r\n").as_bytes());
        }
        let mut styles = StyleCache::new(64);
        let content = render_content(&term, 2, &mut styles);
        assert_eq!(content.scroll_offset, 2);
        assert!(content.lines[0].spans[0].content.starts_with("L6"));
        assert_eq!(term.read().screen().scrollback(), 0);
    }

    #[test]
    fn test_style_cache_is_consulted() {
        let term = SharedTerminal::new(2, 5, 0);
        term.process(b"abc");
        let mut styles = StyleCache::new(64);
        render_content(&term, 0, &mut styles);
        let stats = styles.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 9);
    }
}
