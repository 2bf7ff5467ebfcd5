//! Composing one window into a standalone buffer.
//!
//! A layer is the full window image (border, title, buttons, content and
//! highlights) with its origin at `(0, 0)`. The renderer caches it per
//! window and blits it into the frame at the window's position, so moving a
//! window costs one copy and no emulator access.

use ratatui::buffer::{Buffer, Cell};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Widget};

use crate::copy_mode::Highlight;
use crate::geometry::Geometry;
use crate::input::mouse::TitleButton;
use crate::window::selection::Selection;
use crate::window::{ContentCache, Window};

/// Border and title colors.
const FOCUSED_BORDER: Color = Color::Cyan;
const UNFOCUSED_BORDER: Color = Color::DarkGray;
const COPY_MODE_BORDER: Color = Color::Yellow;
const DEGRADED_BORDER: Color = Color::Red;

fn highlight_style(h: Highlight) -> Style {
    match h {
        Highlight::Cursor => Style::default().add_modifier(Modifier::REVERSED),
        Highlight::Selection => Style::default().bg(Color::Blue).fg(Color::White),
        Highlight::CurrentMatch => Style::default().bg(Color::Yellow).fg(Color::Black),
        Highlight::Match => Style::default().bg(Color::Rgb(120, 100, 0)).fg(Color::Black),
    }
}

/// Compose `window` with the given cached `content`. `selecting` shows the
/// keyboard selection cursor instead of the terminal cursor.
pub fn compose_layer(window: &Window, focused: bool, selecting: bool, content: &ContentCache) -> Buffer {
    let g = window.geometry;
    let area = Rect::new(0, 0, g.width.max(0) as u16, g.height.max(0) as u16);
    let mut buf = Buffer::empty(area);
    if area.is_empty() {
        return buf;
    }

    let in_copy = window.in_copy_mode();
    let border_color = if window.is_degraded() {
        DEGRADED_BORDER
    } else if in_copy {
        COPY_MODE_BORDER
    } else if focused {
        FOCUSED_BORDER
    } else {
        UNFOCUSED_BORDER
    };
    let border_style = Style::default().fg(border_color);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if focused { BorderType::Thick } else { BorderType::Rounded })
        .border_style(border_style)
        .title(title_line(window, focused, in_copy));
    let inner = block.inner(area);
    block.render(area, &mut buf);

    draw_content(&mut buf, inner, content);
    draw_highlights(&mut buf, inner, window, focused, selecting);

    let local = Geometry::new(0, 0, g.width, g.height);
    if TitleButton::fits(&local) {
        for button in TitleButton::ALL {
            let style = match button {
                TitleButton::Close => Style::default().fg(Color::Red),
                _ => border_style,
            };
            buf.set_string(button.x(&local) as u16, 0, button.label(), style);
        }
    }
    buf
}

fn title_line(window: &Window, focused: bool, in_copy: bool) -> Line<'static> {
    let name_style = if focused {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let mut spans = vec![Span::styled(format!(" {} ", window.display_name()), name_style)];
    if in_copy {
        let offset = window.view_offset();
        let total = window.terminal().scrollback_len();
        spans.push(Span::styled(
            format!("[COPY {offset}/{total}] "),
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ));
    } else if window.view_offset() > 0 {
        spans.push(Span::styled(
            format!("[+{}] ", window.view_offset()),
            Style::default().fg(Color::Yellow),
        ));
    }
    if window.is_degraded() {
        spans.push(Span::styled("[dead] ", Style::default().fg(Color::Red)));
    }
    Line::from(spans)
}

/// Copy cached lines into `inner`, clipped to it. Mid-animation the emulator
/// grid may be larger or smaller than the window.
fn draw_content(buf: &mut Buffer, inner: Rect, content: &ContentCache) {
    for (row, line) in content.lines.iter().take(usize::from(inner.height)).enumerate() {
        buf.set_line(inner.x, inner.y + row as u16, line, inner.width);
    }
}

/// Content cell `(row, col)` of `inner`, if it lies inside.
fn content_cell(buf: &mut Buffer, inner: Rect, row: u16, col: u16) -> Option<&mut Cell> {
    if row < inner.height && col < inner.width {
        buf.cell_mut((inner.x + col, inner.y + row))
    } else {
        None
    }
}

fn draw_highlights(buf: &mut Buffer, inner: Rect, window: &Window, focused: bool, selecting: bool) {
    if let Some(cm) = window.copy_mode.as_ref().filter(|cm| cm.active) {
        for row in 0..inner.height {
            for col in 0..inner.width {
                if let Some(h) = cm.highlight_at(row, col) {
                    if let Some(cell) = content_cell(buf, inner, row, col) {
                        cell.set_style(highlight_style(h));
                    }
                }
            }
        }
        return;
    }

    if let Some(sel) = window.selection {
        let span = sel.span(&window.visible_rows());
        for row in 0..inner.height {
            for col in 0..inner.width {
                if Selection::span_contains(span, row, col) {
                    if let Some(cell) = content_cell(buf, inner, row, col) {
                        cell.set_style(highlight_style(Highlight::Selection));
                    }
                }
            }
        }
    }

    if focused && selecting {
        let (row, col) = window.selection_cursor;
        if let Some(cell) = content_cell(buf, inner, row, col) {
            cell.set_style(
                Style::default()
                    .add_modifier(Modifier::REVERSED)
                    .add_modifier(Modifier::UNDERLINED),
            );
        }
    } else if focused && window.view_offset() == 0 {
        let parser = window.terminal().read();
        let screen = parser.screen();
        if !screen.hide_cursor() {
            let (row, col) = screen.cursor_position();
            if let Some(cell) = content_cell(buf, inner, row, col) {
                cell.set_style(Style::default().add_modifier(Modifier::REVERSED));
            }
        }
    }
}

/// Copy `layer` into `buf` with its origin at `g`, clipped to `clip`.
pub fn blit(buf: &mut Buffer, layer: &Buffer, g: Geometry, clip: Rect) {
    let Some(visible) = g.visible_rect(clip) else {
        return;
    };
    for y in visible.top()..visible.bottom() {
        for x in visible.left()..visible.right() {
            let lx = (i32::from(x) - g.x) as u16;
            let ly = (i32::from(y) - g.y) as u16;
            if let (Some(src), Some(dst)) = (layer.cell((lx, ly)), buf.cell_mut((x, y))) {
                *dst = src.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::render::content::render_content;
    use crate::render::style_cache::StyleCache;
    use crate::window::{PtySession, SharedTerminal, WindowId};

    fn window(g: Geometry) -> Window {
        let (rows, cols) = g.content_size();
        let term = Arc::new(SharedTerminal::new(rows, cols, 100));
        let id = WindowId::generate();
        let session = PtySession::detached(id.clone(), Arc::clone(&term));
        Window::new(id, "Terminal 1", g, 1, term, session)
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol().to_string()).collect()
    }

    #[test]
    fn test_layer_has_title_buttons_and_content() {
        let w = window(Geometry::new(5, 5, 30, 6));
        w.terminal().process(b"hello");
        let content = render_content(w.terminal(), 0, &mut StyleCache::new(16));
        let layer = compose_layer(&w, true, false, &content);
        assert_eq!(layer.area, Rect::new(0, 0, 30, 6));
        let top = row_text(&layer, 0);
        assert!(top.contains("Terminal 1"));
        assert!(top.contains("[_][□][x]"));
        assert!(row_text(&layer, 1).contains("hello"));
    }

    #[test]
    fn test_selection_is_highlighted() {
        let mut w = window(Geometry::new(0, 0, 30, 6));
        w.terminal().process(b"select");
        let mut sel = Selection::start((0, 0), crate::window::selection::SelectionMode::Char);
        sel.extend_to((0, 2));
        w.selection = Some(sel);
        let content = render_content(w.terminal(), 0, &mut StyleCache::new(16));
        let layer = compose_layer(&w, false, false, &content);
        assert_eq!(layer[(1, 1)].bg, Color::Blue);
        assert_eq!(layer[(3, 1)].bg, Color::Blue);
        assert_ne!(layer[(4, 1)].bg, Color::Blue);
    }

    #[test]
    fn test_blit_clips_negative_origin() {
        let w = window(Geometry::new(0, 0, 20, 5));
        let content = render_content(w.terminal(), 0, &mut StyleCache::new(16));
        let layer = compose_layer(&w, false, false, &content);
        let mut frame = Buffer::empty(Rect::new(0, 0, 40, 10));
        let area = frame.area;
        blit(&mut frame, &layer, Geometry::new(-5, -2, 20, 5), area);
        // Bottom-right corner of the layer lands at (14, 2).
        assert_eq!(frame[(14, 2)].symbol(), layer[(19, 4)].symbol());
        assert_eq!(frame[(15, 2)].symbol(), " ");
    }
}
