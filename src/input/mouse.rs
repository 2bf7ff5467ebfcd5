//! Mouse hit-testing and mouse-report encoding.
//!
//! # Window chrome
//!
//! ```text
//!  x                                   right-1
//!  ┌ Terminal 1 ──────────── [_][□][x] ┐   <- title row: drag / buttons
//!  │ content (row 0, col 0) ...        │
//!  │                                   │
//!  └───────────────────────────────────┘◢  <- bottom-right corner: resize
//! ```
//!
//! Buttons sit flush against the right border, [`TITLE_BUTTON_WIDTH`] cells
//! each, and are tested before anything else on the title row.

use crossterm::event::{KeyModifiers, MouseButton, MouseEventKind};
use vt100::{MouseProtocolEncoding, MouseProtocolMode};

use crate::constants::TITLE_BUTTON_WIDTH;
use crate::geometry::Geometry;
use crate::manager::WindowManager;

/// Title bar buttons, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleButton {
    /// Send to the dock.
    Minimize,
    /// Toggle full-viewport snap.
    Maximize,
    /// Close the window.
    Close,
}

impl TitleButton {
    /// All buttons in drawing order.
    pub const ALL: [TitleButton; 3] = [TitleButton::Minimize, TitleButton::Maximize, TitleButton::Close];

    /// Label drawn on the title bar.
    pub fn label(&self) -> &'static str {
        match self {
            TitleButton::Minimize => "[_]",
            TitleButton::Maximize => "[□]",
            TitleButton::Close => "[x]",
        }
    }

    /// First column of this button for a window at `g`.
    pub fn x(&self, g: &Geometry) -> i32 {
        let slot = match self {
            TitleButton::Minimize => 3,
            TitleButton::Maximize => 2,
            TitleButton::Close => 1,
        };
        g.right() - 1 - slot * TITLE_BUTTON_WIDTH
    }

    /// Whether the window is wide enough to draw the buttons.
    pub fn fits(g: &Geometry) -> bool {
        g.width >= 3 * TITLE_BUTTON_WIDTH + 4
    }
}

/// What part of a window was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitZone {
    /// A title bar button.
    Button(TitleButton),
    /// Title bar (drag handle).
    Title,
    /// Bottom-right corner (resize handle).
    ResizeCorner,
    /// Any other border cell.
    Border,
    /// Content cell, `(row, col)` inside the border.
    Content(u16, u16),
}

/// Zone of `g` under `(col, row)`, assuming the point is inside `g`.
pub fn zone_at(g: &Geometry, col: i32, row: i32) -> HitZone {
    if row == g.y {
        if TitleButton::fits(g) {
            for button in TitleButton::ALL {
                let x = button.x(g);
                if col >= x && col < x + TITLE_BUTTON_WIDTH {
                    return HitZone::Button(button);
                }
            }
        }
        return HitZone::Title;
    }
    if col == g.right() - 1 && row == g.bottom() - 1 {
        return HitZone::ResizeCorner;
    }
    if col == g.x || col == g.right() - 1 || row == g.bottom() - 1 {
        return HitZone::Border;
    }
    HitZone::Content((row - g.y - 1) as u16, (col - g.x - 1) as u16)
}

/// Topmost visible window of the current workspace under `(col, row)`.
///
/// Windows are tested by descending z; the first hit wins.
pub fn hit_test(wm: &WindowManager, col: i32, row: i32) -> Option<(usize, HitZone)> {
    let mut candidates: Vec<usize> = wm
        .windows()
        .iter()
        .enumerate()
        .filter(|(_, w)| w.workspace == wm.current_workspace() && w.is_visible())
        .map(|(i, _)| i)
        .collect();
    candidates.sort_by_key(|&i| std::cmp::Reverse(wm.windows()[i].z));
    candidates.into_iter().find_map(|i| {
        let g = wm.windows()[i].geometry;
        g.contains(col, row).then(|| (i, zone_at(&g, col, row)))
    })
}

/// Content cell of `g` nearest to `(col, row)`, for drags that leave the
/// window.
pub fn clamp_to_content(g: &Geometry, col: i32, row: i32) -> (u16, u16) {
    let (rows, cols) = g.content_size();
    let r = (row - g.y - 1).clamp(0, i32::from(rows) - 1);
    let c = (col - g.x - 1).clamp(0, i32::from(cols) - 1);
    (r as u16, c as u16)
}

/// Encode a mouse event for a program that asked for mouse reporting.
///
/// `row`/`col` are 0-based content coordinates. Returns `None` when the
/// program's mode does not want this kind of event or the position cannot
/// be encoded.
pub fn encode_mouse(
    kind: MouseEventKind,
    modifiers: KeyModifiers,
    row: u16,
    col: u16,
    mode: MouseProtocolMode,
    encoding: MouseProtocolEncoding,
) -> Option<Vec<u8>> {
    let button_code = |b: MouseButton| match b {
        MouseButton::Left => 0u16,
        MouseButton::Middle => 1,
        MouseButton::Right => 2,
    };
    let (mut code, release) = match kind {
        MouseEventKind::Down(b) => (button_code(b), false),
        MouseEventKind::Up(b) => {
            if mode == MouseProtocolMode::Press {
                return None;
            }
            // Legacy encodings cannot say which button was released.
            let code = if encoding == MouseProtocolEncoding::Sgr { button_code(b) } else { 3 };
            (code, true)
        }
        MouseEventKind::Drag(b) => {
            if !matches!(mode, MouseProtocolMode::ButtonMotion | MouseProtocolMode::AnyMotion) {
                return None;
            }
            (button_code(b) + 32, false)
        }
        MouseEventKind::Moved => {
            if mode != MouseProtocolMode::AnyMotion {
                return None;
            }
            (3 + 32, false)
        }
        MouseEventKind::ScrollUp => (64, false),
        MouseEventKind::ScrollDown => (65, false),
        MouseEventKind::ScrollLeft => (66, false),
        MouseEventKind::ScrollRight => (67, false),
    };
    if modifiers.contains(KeyModifiers::SHIFT) {
        code += 4;
    }
    if modifiers.contains(KeyModifiers::ALT) {
        code += 8;
    }
    if modifiers.contains(KeyModifiers::CONTROL) {
        code += 16;
    }

    let (x, y) = (u32::from(col) + 1, u32::from(row) + 1);
    match encoding {
        MouseProtocolEncoding::Sgr => {
            let suffix = if release { 'm' } else { 'M' };
            Some(format!("\x1b[<{code};{x};{y}{suffix}").into_bytes())
        }
        MouseProtocolEncoding::Default => {
            let (cb, cx, cy) = (u32::from(code) + 32, x + 32, y + 32);
            if cb > 255 || cx > 255 || cy > 255 {
                return None;
            }
            Some(vec![0x1b, b'[', b'M', cb as u8, cx as u8, cy as u8])
        }
        MouseProtocolEncoding::Utf8 => {
            let mut out = b"\x1b[M".to_vec();
            for v in [u32::from(code) + 32, x + 32, y + 32] {
                let c = char::from_u32(v).filter(|_| v < 2048)?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            Some(out)
        }
    }
}
