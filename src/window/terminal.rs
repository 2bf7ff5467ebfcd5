//! Per-window terminal emulator shared with the PTY reader thread.
//!
//! [`SharedTerminal`] is the only piece of window state that crosses a thread
//! boundary. The reader thread feeds PTY output in through
//! [`SharedTerminal::process`]; the event loop reads the grid for rendering
//! and copy mode. Everything else about a window is owned by the event loop.
//!
//! # Generation counter
//!
//! Every processed chunk bumps [`SharedTerminal::generation`]. The render
//! path compares it with the generation its cached text was built from, so
//! new output marks the window content-dirty without the reader thread ever
//! touching window state.
//!
//! # Things vt100 does not do
//!
//! - CSI 3 J (clear scrollback) is ignored by vt100, so the parser is replaced
//!   with a fresh one seeded from the visible screen.
//! - Device status and attribute queries get no reply from vt100; replies are
//!   synthesized here and handed back to the caller for the PTY writer.
//! - Window titles (OSC 0 / OSC 2) are scanned from the raw bytes.

// Rust guideline compliant 2026-02

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use vt100::{MouseProtocolEncoding, MouseProtocolMode, Parser};

/// Minimum parser rows. vt100 can overflow on 1-row grids.
pub const MIN_PARSER_ROWS: u16 = 2;

/// A vt100 parser behind a lock plus lock-free change tracking.
pub struct SharedTerminal {
    parser: RwLock<Parser>,
    scrollback_lines: usize,
    generation: AtomicU64,
    alternate_screen: AtomicBool,
    title: Mutex<Option<String>>,
}

impl std::fmt::Debug for SharedTerminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedTerminal")
            .field("scrollback_lines", &self.scrollback_lines)
            .field("generation", &self.generation())
            .field("alternate_screen", &self.is_alternate_screen())
            .finish_non_exhaustive()
    }
}

impl SharedTerminal {
    /// Create an emulator with the given grid size and scrollback capacity.
    pub fn new(rows: u16, cols: u16, scrollback_lines: usize) -> Self {
        Self {
            parser: RwLock::new(Parser::new(
                rows.max(MIN_PARSER_ROWS),
                cols.max(1),
                scrollback_lines,
            )),
            scrollback_lines,
            generation: AtomicU64::new(0),
            alternate_screen: AtomicBool::new(false),
            title: Mutex::new(None),
        }
    }

    /// Shared read access to the parser.
    pub fn read(&self) -> RwLockReadGuard<'_, Parser> {
        self.parser.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive access to the parser (needed to move the scrollback view).
    pub fn write(&self) -> RwLockWriteGuard<'_, Parser> {
        self.parser.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Monotonic counter bumped on every processed chunk, resize and reset.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Whether the running program has switched to the alternate screen.
    pub fn is_alternate_screen(&self) -> bool {
        self.alternate_screen.load(Ordering::Acquire)
    }

    /// Most recent title set by the program via OSC 0/2.
    pub fn title(&self) -> Option<String> {
        self.title
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current grid size as `(rows, cols)`.
    pub fn size(&self) -> (u16, u16) {
        self.read().screen().size()
    }

    /// Mouse reporting requested by the program, if any.
    pub fn mouse_reporting(&self) -> Option<(MouseProtocolMode, MouseProtocolEncoding)> {
        let parser = self.read();
        let screen = parser.screen();
        match screen.mouse_protocol_mode() {
            MouseProtocolMode::None => None,
            mode => Some((mode, screen.mouse_protocol_encoding())),
        }
    }

    /// Feed PTY output into the emulator.
    ///
    /// Returns bytes that must be written back to the PTY (replies to status
    /// queries found in `data`). Each reply is computed after processing the
    /// bytes up to its query, so cursor position reports are exact.
    pub fn process(&self, data: &[u8]) -> Vec<u8> {
        let mut replies = Vec::new();
        {
            let mut parser = self.write();
            let mut cursor = 0;
            for query in scan_queries(data) {
                self.process_guarded(&mut parser, &data[cursor..query.end]);
                cursor = query.end;
                replies.extend(query.kind.reply(parser.screen()));
            }
            self.process_guarded(&mut parser, &data[cursor..]);

            if contains_clear_scrollback(data) {
                let (rows, cols) = parser.screen().size();
                let visible = parser.screen().contents_formatted();
                let mut fresh = Parser::new(rows, cols, self.scrollback_lines);
                fresh.process(&visible);
                *parser = fresh;
                log::debug!("Scrollback cleared (CSI 3 J)");
            }

            self.alternate_screen
                .store(parser.screen().alternate_screen(), Ordering::Release);
        }

        if let Some(title) = scan_osc_title(data) {
            *self.title.lock().unwrap_or_else(PoisonError::into_inner) = Some(title);
        }

        self.generation.fetch_add(1, Ordering::AcqRel);
        replies
    }

    /// Run `parser.process` with a panic guard. On panic the parser is reset
    /// to a blank grid of the same size.
    fn process_guarded(&self, parser: &mut Parser, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        // AssertUnwindSafe: on panic the parser is replaced, discarding any
        // inconsistent state.
        let result = catch_unwind(AssertUnwindSafe(|| parser.process(data)));
        if let Err(panic_info) = result {
            let msg = panic_info
                .downcast_ref::<String>()
                .map(String::as_str)
                .or_else(|| panic_info.downcast_ref::<&str>().copied())
                .unwrap_or("unknown panic");
            let (rows, cols) = parser.screen().size();
            let rows = rows.max(MIN_PARSER_ROWS);
            *parser = Parser::new(rows, cols, self.scrollback_lines);
            log::error!("vt100 parser panicked (reset {rows}x{cols}): {msg}");
        }
    }

    /// Resize the grid. Returns `true` when the size actually changed.
    pub fn resize(&self, rows: u16, cols: u16) -> bool {
        let rows = rows.max(MIN_PARSER_ROWS);
        let cols = cols.max(1);
        let mut parser = self.write();
        if parser.screen().size() == (rows, cols) {
            return false;
        }
        parser.screen_mut().set_size(rows, cols);
        drop(parser);
        self.generation.fetch_add(1, Ordering::AcqRel);
        true
    }

    /// Number of lines currently held in scrollback.
    pub fn scrollback_len(&self) -> usize {
        let mut parser = self.write();
        let saved = parser.screen().scrollback();
        parser.screen_mut().set_scrollback(usize::MAX);
        let len = parser.screen().scrollback();
        parser.screen_mut().set_scrollback(saved);
        len
    }

    /// Capture every line in absolute order: scrollback oldest-first, then
    /// the live screen. The scrollback view offset is left untouched.
    pub fn capture_lines(&self) -> Vec<String> {
        let mut parser = self.write();
        screen_lines(parser.screen_mut())
    }

    /// Copy the whole emulator, scrollback included, as it is right now.
    pub fn freeze(&self) -> FrozenScreen {
        let parser = self.read();
        let mut screen = parser.screen().clone();
        drop(parser);
        screen.set_scrollback(0);
        FrozenScreen {
            screen,
            generation: self.generation(),
        }
    }
}

/// A copy of a window's emulator taken when copy mode was entered.
///
/// Copy mode draws and searches this copy, so output that arrives while the
/// user is reading cannot shift lines under the cursor.
#[derive(Clone)]
pub struct FrozenScreen {
    screen: vt100::Screen,
    generation: u64,
}

impl std::fmt::Debug for FrozenScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrozenScreen")
            .field("size", &self.screen.size())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl FrozenScreen {
    /// Generation of the live emulator when the copy was taken.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The copied grid. Callers that move its scrollback view must put it
    /// back to 0.
    pub fn screen_mut(&mut self) -> &mut vt100::Screen {
        &mut self.screen
    }

    /// Every line in absolute order, like [`SharedTerminal::capture_lines`].
    pub fn lines(&mut self) -> Vec<String> {
        screen_lines(&mut self.screen)
    }
}

/// Walk `screen` from the oldest scrollback line to the last screen row.
/// The view offset is restored before returning.
fn screen_lines(screen: &mut vt100::Screen) -> Vec<String> {
    let saved = screen.scrollback();
    let mut screen = scopeguard::guard(screen, move |s| {
        s.set_scrollback(saved);
    });

    let (rows, cols) = screen.size();
    let rows = usize::from(rows);
    screen.set_scrollback(usize::MAX);
    let sb_len = screen.scrollback();

    let mut lines = Vec::with_capacity(sb_len + rows);
    // Walk the scrollback one page at a time from the oldest line. With
    // offset `o` the first visible row is absolute line `sb_len - o`.
    let mut offset = sb_len;
    while offset > 0 {
        screen.set_scrollback(offset);
        let take = offset.min(rows);
        lines.extend(screen.rows(0, cols).take(take).map(trim_row));
        offset -= take;
    }
    screen.set_scrollback(0);
    lines.extend(screen.rows(0, cols).map(trim_row));
    lines
}

fn trim_row(row: String) -> String {
    let trimmed = row.trim_end();
    if trimmed.len() == row.len() {
        row
    } else {
        trimmed.to_string()
    }
}

// ============================================================================
// Byte scanning
// ============================================================================

/// A status query found in PTY output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryKind {
    /// `CSI 6 n` - cursor position report.
    CursorPosition,
    /// `CSI 5 n` - device status.
    DeviceStatus,
    /// `CSI c` / `CSI 0 c` - primary device attributes.
    PrimaryAttributes,
    /// `CSI > c` / `CSI > 0 c` - secondary device attributes.
    SecondaryAttributes,
}

impl QueryKind {
    fn reply(self, screen: &vt100::Screen) -> Vec<u8> {
        match self {
            Self::CursorPosition => {
                let (row, col) = screen.cursor_position();
                format!("\x1b[{};{}R", row + 1, col + 1).into_bytes()
            }
            Self::DeviceStatus => b"\x1b[0n".to_vec(),
            Self::PrimaryAttributes => b"\x1b[?62;22c".to_vec(),
            Self::SecondaryAttributes => b"\x1b[>0;10;1c".to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Query {
    kind: QueryKind,
    /// Index one past the final byte of the sequence.
    end: usize,
}

/// Find status queries in a chunk of PTY output, in order.
fn scan_queries(data: &[u8]) -> Vec<Query> {
    let mut out = Vec::new();
    let mut i = 0;
    while i + 1 < data.len() {
        if data[i] != 0x1b || data[i + 1] != b'[' {
            i += 1;
            continue;
        }
        let rest = &data[i + 2..];
        let matched = [
            (&b"6n"[..], QueryKind::CursorPosition),
            (&b"5n"[..], QueryKind::DeviceStatus),
            (&b"c"[..], QueryKind::PrimaryAttributes),
            (&b"0c"[..], QueryKind::PrimaryAttributes),
            (&b">c"[..], QueryKind::SecondaryAttributes),
            (&b">0c"[..], QueryKind::SecondaryAttributes),
        ]
        .into_iter()
        .find(|(pat, _)| rest.starts_with(pat));

        match matched {
            Some((pat, kind)) => {
                let end = i + 2 + pat.len();
                out.push(Query { kind, end });
                i = end;
            }
            None => i += 2,
        }
    }
    out
}

/// Check if a byte buffer contains the CSI 3 J (clear scrollback) sequence.
fn contains_clear_scrollback(data: &[u8]) -> bool {
    data.windows(4).any(|w| w == b"\x1b[3J")
}

/// Extract the last OSC 0 or OSC 2 title in `data`.
///
/// Accepts both BEL and ST (`ESC \`) terminators. Titles split across reads
/// are missed; the next title update corrects it.
pub fn scan_osc_title(data: &[u8]) -> Option<String> {
    let mut result = None;
    let mut i = 0;
    while i + 3 < data.len() {
        let is_title = data[i] == 0x1b
            && data[i + 1] == b']'
            && matches!(data[i + 2], b'0' | b'2')
            && data[i + 3] == b';';
        if !is_title {
            i += 1;
            continue;
        }
        let start = i + 4;
        let mut j = start;
        let mut end = None;
        while j < data.len() {
            if data[j] == 0x07 {
                end = Some((j, j + 1));
                break;
            }
            if data[j] == 0x1b && data.get(j + 1) == Some(&b'\\') {
                end = Some((j, j + 2));
                break;
            }
            j += 1;
        }
        match end {
            Some((text_end, next)) => {
                let title = String::from_utf8_lossy(&data[start..text_end]).trim().to_string();
                result = Some(title);
                i = next;
            }
            None => break,
        }
    }
    result.filter(|t| !t.is_empty())
}
