//! Vim-style copy mode for a single window.
//!
//! Copy mode freezes a snapshot of the window's lines (scrollback
//! oldest-first, then the live screen) and lets the user move a cursor over
//! it, search it, and select text from it.
//!
//! # Coordinates
//!
//! The snapshot is one absolute index space. With `S` scrollback lines and a
//! view offset `o` (lines scrolled up from the live screen), viewport row `r`
//! shows absolute line `S - o + r`. The cursor is stored viewport-relative;
//! selections and search matches are stored absolute and mapped back
//! through the offset only when drawn.
//!
//! # States
//!
//! ```text
//!            /  ?              v            V
//!   Normal ───────► Search   Normal ──► VisualChar ◄──► VisualLine
//!     ▲   Enter/Esc   │        ▲   Esc / y  │               │
//!     └───────────────┘        └────────────┴───────────────┘
//! ```
//!
//! Leaving copy mode always returns the view to the live screen.

pub mod motion;
pub mod search;

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tui_input::InputRequest;

use crate::constants::DOUBLE_KEY_WINDOW;
use motion::{CharSearch, Pos};
use search::{find_matches, SearchDirection, SearchState};

/// Copy mode sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyState {
    /// Cursor movement.
    #[default]
    Normal,
    /// Typing a search query.
    Search,
    /// Character-wise selection.
    VisualChar,
    /// Line-wise selection.
    VisualLine,
}

/// What the owner must do after a key was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyAction {
    /// Key consumed; redraw.
    None,
    /// Leave copy mode, stay in the current input mode.
    Exit,
    /// Leave copy mode and go to terminal input.
    ExitToTerminal,
    /// Copy the text to the clipboard, then leave copy mode.
    Yank(String),
}

/// How a cell should be highlighted while copy mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    /// The copy mode cursor.
    Cursor,
    /// Inside the visual selection.
    Selection,
    /// The match the cursor is on.
    CurrentMatch,
    /// Any other search match.
    Match,
}

/// Copy mode state for one window. Created on first entry and reused.
#[derive(Debug, Default)]
pub struct CopyMode {
    /// Whether copy mode is currently active.
    pub active: bool,
    /// Current sub-state.
    pub state: CopyState,
    /// Cursor as `(row, col)` within the viewport.
    pub cursor: (u16, u16),
    /// Lines scrolled up from the live screen.
    pub scroll_offset: usize,
    /// Absolute start of the visual selection.
    pub visual_start: Pos,
    /// Absolute end of the visual selection (follows the cursor).
    pub visual_end: Pos,
    /// Search input and results.
    pub search: SearchState,
    count: Option<usize>,
    pending_g: Option<Instant>,
    pending_char: Option<CharSearch>,
    last_char_search: Option<(CharSearch, char)>,
    lines: Vec<String>,
    rows: u16,
    cols: u16,
}

impl CopyMode {
    /// Activate over a fresh snapshot.
    ///
    /// `lines` must hold the scrollback followed by exactly `rows` screen
    /// lines. The cursor starts at mid-viewport, column 0, on the live
    /// screen. Search case sensitivity survives re-entry.
    pub fn enter(&mut self, lines: Vec<String>, rows: u16, cols: u16) {
        let case_sensitive = self.search.case_sensitive;
        *self = Self {
            active: true,
            rows: rows.max(1),
            cols: cols.max(1),
            lines,
            ..Self::default()
        };
        self.search.case_sensitive = case_sensitive;
        self.cursor = (self.rows / 2, 0);
        let start = self.cursor_abs();
        self.visual_start = start;
        self.visual_end = start;
    }

    /// Deactivate. The view offset always returns to 0.
    pub fn exit(&mut self) {
        self.active = false;
        self.state = CopyState::Normal;
        self.scroll_offset = 0;
        self.count = None;
        self.pending_g = None;
        self.pending_char = None;
        self.search.input.reset();
    }

    /// Number of scrollback lines in the snapshot.
    pub fn scrollback_len(&self) -> usize {
        self.lines.len().saturating_sub(usize::from(self.rows))
    }

    /// The captured snapshot.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Absolute line shown on viewport row 0.
    fn top(&self) -> usize {
        self.scrollback_len().saturating_sub(self.scroll_offset)
    }

    /// Cursor position in absolute coordinates.
    pub fn cursor_abs(&self) -> Pos {
        Pos::new(
            self.top() + usize::from(self.cursor.0),
            usize::from(self.cursor.1),
        )
    }

    /// Map an absolute line to a viewport row, if visible.
    pub fn viewport_row(&self, line: usize) -> Option<u16> {
        let top = self.top();
        (line >= top && line < top + usize::from(self.rows)).then(|| (line - top) as u16)
    }

    /// Move the cursor to an absolute position, scrolling just enough to
    /// keep it on screen.
    pub fn set_cursor_abs(&mut self, pos: Pos) {
        let last = self.lines.len().saturating_sub(1);
        let line = pos.line.min(last);
        let rows = usize::from(self.rows);
        let top = self.top();
        let new_top = if line < top {
            line
        } else if line >= top + rows {
            line + 1 - rows
        } else {
            top
        };
        let sb = self.scrollback_len();
        self.scroll_offset = sb.saturating_sub(new_top);
        let top = self.top();
        let col = pos.col.min(usize::from(self.cols) - 1);
        self.cursor = ((line.saturating_sub(top)) as u16, col as u16);
        if matches!(self.state, CopyState::VisualChar | CopyState::VisualLine) {
            self.visual_end = self.cursor_abs();
        }
    }

    /// Scroll the view by `delta` lines (positive = towards older lines),
    /// keeping the cursor on the same absolute line when it stays visible.
    pub fn scroll_by(&mut self, delta: isize) {
        let sb = self.scrollback_len();
        let abs = self.cursor_abs();
        self.scroll_offset = self.scroll_offset.saturating_add_signed(delta).min(sb);
        let top = self.top();
        let rows = usize::from(self.rows);
        let line = abs.line.clamp(top, top + rows - 1);
        self.cursor.0 = (line - top) as u16;
        if matches!(self.state, CopyState::VisualChar | CopyState::VisualLine) {
            self.visual_end = self.cursor_abs();
        }
    }

    /// Pending numeric prefix, if any.
    pub fn pending_count(&self) -> Option<usize> {
        self.count
    }

    /// Highlight for viewport cell `(row, col)`.
    pub fn highlight_at(&self, row: u16, col: u16) -> Option<Highlight> {
        if (row, col) == self.cursor {
            return Some(Highlight::Cursor);
        }
        let line = self.top() + usize::from(row);
        let col = usize::from(col);

        if self.in_visual(line, col) {
            return Some(Highlight::Selection);
        }
        if let Some(m) = self.search.current_match() {
            if m.covers(line, col) {
                return Some(Highlight::CurrentMatch);
            }
        }
        if self.search.matches.iter().any(|m| m.covers(line, col)) {
            return Some(Highlight::Match);
        }
        None
    }

    fn in_visual(&self, line: usize, col: usize) -> bool {
        let (start, end) = ordered(self.visual_start, self.visual_end);
        match self.state {
            CopyState::VisualLine => line >= start.line && line <= end.line,
            CopyState::VisualChar => {
                let p = Pos::new(line, col);
                p >= start && p <= end
            }
            _ => false,
        }
    }

    /// Text covered by the visual selection.
    pub fn selected_text(&self) -> String {
        let (start, end) = ordered(self.visual_start, self.visual_end);
        let mut out = Vec::new();
        for line in start.line..=end.line.min(self.lines.len().saturating_sub(1)) {
            let chars: Vec<char> = self.lines.get(line).map(|l| l.chars().collect()).unwrap_or_default();
            let piece: String = if self.state == CopyState::VisualLine {
                chars.iter().collect()
            } else {
                let from = if line == start.line { start.col } else { 0 };
                let to = if line == end.line {
                    (end.col + 1).min(chars.len())
                } else {
                    chars.len()
                };
                chars.get(from.min(to)..to).unwrap_or(&[]).iter().collect()
            };
            out.push(piece.trim_end().to_string());
        }
        out.join("\n")
    }

    // ========================================================================
    // Key handling
    // ========================================================================

    /// Handle one key press.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> CopyAction {
        if self.state == CopyState::Search {
            return self.handle_search_key(key);
        }

        if let Some(kind) = self.pending_char.take() {
            if let KeyCode::Char(c) = key.code {
                self.last_char_search = Some((kind, c));
                self.char_search(kind, c);
            }
            self.count = None;
            return CopyAction::None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let g_armed = self
            .pending_g
            .take()
            .is_some_and(|t| now.saturating_duration_since(t) <= DOUBLE_KEY_WINDOW);

        if let KeyCode::Char(c @ '0'..='9') = key.code {
            if !ctrl && (c != '0' || self.count.is_some()) {
                let digit = c.to_digit(10).unwrap_or(0) as usize;
                self.count = Some(self.count.unwrap_or(0).saturating_mul(10).saturating_add(digit));
                return CopyAction::None;
            }
        }

        let explicit_count = self.count.take();
        let n = explicit_count.unwrap_or(1);
        let half = usize::from(self.rows / 2).max(1);
        let page = usize::from(self.rows).max(1);
        let pos = self.cursor_abs();

        match (key.code, ctrl) {
            (KeyCode::Char('u'), true) => self.page_scroll(-(half as isize)),
            (KeyCode::Char('d'), true) => self.page_scroll(half as isize),
            (KeyCode::Char('b'), true) => self.page_scroll(-(page as isize)),
            (KeyCode::Char('f'), true) => self.page_scroll(page as isize),
            (KeyCode::Char('c'), true) => {
                self.exit();
                return CopyAction::Exit;
            }

            (KeyCode::Char('h') | KeyCode::Left, _) => {
                self.set_cursor_abs(Pos::new(pos.line, pos.col.saturating_sub(n)));
            }
            (KeyCode::Char('l') | KeyCode::Right, _) => {
                let max = motion::max_col(&self.lines, pos.line);
                self.set_cursor_abs(Pos::new(pos.line, (pos.col + n).min(max)));
            }
            (KeyCode::Char('k') | KeyCode::Up, _) => self.move_vertical(pos, -(n as isize)),
            (KeyCode::Char('j') | KeyCode::Down, _) => self.move_vertical(pos, n as isize),
            (KeyCode::Char('w'), _) => {
                let to = motion::word_forward(&self.lines, pos, n);
                self.set_cursor_abs(to);
            }
            (KeyCode::Char('b'), _) => {
                let to = motion::word_backward(&self.lines, pos, n);
                self.set_cursor_abs(to);
            }
            (KeyCode::Char('e'), _) => {
                let to = motion::word_end(&self.lines, pos, n);
                self.set_cursor_abs(to);
            }
            (KeyCode::Char('0') | KeyCode::Home, _) => self.set_cursor_abs(Pos::new(pos.line, 0)),
            (KeyCode::Char('^'), _) => {
                let col = motion::first_non_blank(&self.lines, pos.line);
                self.set_cursor_abs(Pos::new(pos.line, col));
            }
            (KeyCode::Char('$') | KeyCode::End, _) => {
                let col = motion::max_col(&self.lines, pos.line);
                self.set_cursor_abs(Pos::new(pos.line, col));
            }
            (KeyCode::Char('g'), _) => {
                if g_armed {
                    let line = explicit_count.map_or(0, |c| c.saturating_sub(1));
                    self.set_cursor_abs(Pos::new(line, 0));
                } else {
                    self.pending_g = Some(now);
                    self.count = explicit_count;
                }
            }
            (KeyCode::Char('G'), _) => {
                let line = explicit_count.map_or(self.lines.len().saturating_sub(1), |c| c.saturating_sub(1));
                self.set_cursor_abs(Pos::new(line, 0));
            }
            (KeyCode::Char('H'), _) => self.cursor_to_row(0),
            (KeyCode::Char('M'), _) => self.cursor_to_row(self.rows / 2),
            (KeyCode::Char('L'), _) => self.cursor_to_row(self.rows.saturating_sub(1)),
            (KeyCode::PageUp, _) => self.page_scroll(-(page as isize)),
            (KeyCode::PageDown, _) => self.page_scroll(page as isize),

            (KeyCode::Char('f'), _) => self.pending_char = Some(CharSearch::ForwardTo),
            (KeyCode::Char('F'), _) => self.pending_char = Some(CharSearch::BackwardTo),
            (KeyCode::Char('t'), _) => self.pending_char = Some(CharSearch::ForwardTill),
            (KeyCode::Char('T'), _) => self.pending_char = Some(CharSearch::BackwardTill),
            (KeyCode::Char(';'), _) => {
                if let Some((kind, c)) = self.last_char_search {
                    for _ in 0..n {
                        self.char_search(kind, c);
                    }
                }
            }
            (KeyCode::Char(','), _) => {
                if let Some((kind, c)) = self.last_char_search {
                    for _ in 0..n {
                        self.char_search(kind.reversed(), c);
                    }
                }
            }

            (KeyCode::Char('/'), _) => self.begin_search(SearchDirection::Forward),
            (KeyCode::Char('?'), _) => self.begin_search(SearchDirection::Backward),
            (KeyCode::Char('n'), _) => {
                let forward = self.search.direction == SearchDirection::Forward;
                self.jump_to_match(forward, n);
            }
            (KeyCode::Char('N'), _) => {
                let forward = self.search.direction != SearchDirection::Forward;
                self.jump_to_match(forward, n);
            }

            (KeyCode::Char('v'), _) => self.toggle_visual(CopyState::VisualChar),
            (KeyCode::Char('V'), _) => self.toggle_visual(CopyState::VisualLine),
            (KeyCode::Char('y') | KeyCode::Enter, _) if self.is_visual() => {
                let text = self.selected_text();
                self.exit();
                return CopyAction::Yank(text);
            }

            (KeyCode::Esc, _) if self.is_visual() => self.state = CopyState::Normal,
            (KeyCode::Esc | KeyCode::Char('q'), _) => {
                self.exit();
                return CopyAction::Exit;
            }
            (KeyCode::Char('i'), _) => {
                self.exit();
                return CopyAction::ExitToTerminal;
            }
            _ => {}
        }
        CopyAction::None
    }

    fn is_visual(&self) -> bool {
        matches!(self.state, CopyState::VisualChar | CopyState::VisualLine)
    }

    fn toggle_visual(&mut self, target: CopyState) {
        if self.state == target {
            self.state = CopyState::Normal;
        } else {
            if !self.is_visual() {
                self.visual_start = self.cursor_abs();
            }
            self.state = target;
            self.visual_end = self.cursor_abs();
        }
    }

    fn move_vertical(&mut self, pos: Pos, delta: isize) {
        let line = pos.line.saturating_add_signed(delta);
        let col = pos.col.min(motion::max_col(&self.lines, line));
        self.set_cursor_abs(Pos::new(line, col));
    }

    fn cursor_to_row(&mut self, row: u16) {
        let line = self.top() + usize::from(row);
        let col = usize::from(self.cursor.1).min(motion::max_col(&self.lines, line));
        self.set_cursor_abs(Pos::new(line, col));
    }

    /// Half/full page motion: the view and the cursor move together.
    fn page_scroll(&mut self, delta: isize) {
        // Negative delta moves up (towards older lines), which is a larger
        // offset.
        self.scroll_by(-delta);
        let pos = self.cursor_abs();
        self.move_vertical(pos, delta);
    }

    fn char_search(&mut self, kind: CharSearch, c: char) {
        let pos = self.cursor_abs();
        if let Some(col) = motion::find_char(&self.lines, pos, kind, c, 1) {
            self.set_cursor_abs(Pos::new(pos.line, col));
        }
    }

    // ========================================================================
    // Search
    // ========================================================================

    fn begin_search(&mut self, direction: SearchDirection) {
        self.search.input.reset();
        self.search.direction = direction;
        self.state = CopyState::Search;
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> CopyAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.search.input.reset();
                self.state = CopyState::Normal;
            }
            KeyCode::Enter => {
                self.state = CopyState::Normal;
                let query = self.search.input.value().to_string();
                self.confirm_search(&query);
            }
            KeyCode::Tab => {
                self.search.case_sensitive = !self.search.case_sensitive;
            }
            KeyCode::Backspace if self.search.input.value().is_empty() => {
                self.state = CopyState::Normal;
            }
            code => {
                if let Some(req) = input_request(code, ctrl) {
                    self.search.input.handle(req);
                }
            }
        }
        CopyAction::None
    }

    /// Run `query` against the snapshot and move to the first match in the
    /// search direction.
    pub fn confirm_search(&mut self, query: &str) {
        self.search.query = query.to_string();
        self.search.matches = find_matches(&self.lines, query, self.search.case_sensitive);
        self.search.current = None;
        let forward = self.search.direction == SearchDirection::Forward;
        self.jump_to_match(forward, 1);
    }

    fn jump_to_match(&mut self, forward: bool, count: usize) {
        for _ in 0..count.max(1) {
            // Repeat from the current match while the cursor sits on it,
            // otherwise from wherever the cursor was moved to.
            let cursor = self.cursor_abs();
            let from = self
                .search
                .current_match()
                .filter(|m| m.covers(cursor.line, cursor.col))
                .map_or(cursor, |m| m.pos());
            let Some(idx) = self.search.next_index(from, forward) else {
                return;
            };
            self.search.current = Some(idx);
            let target = self.search.matches[idx].pos();
            self.set_cursor_abs(target);
        }
    }
}

fn ordered(a: Pos, b: Pos) -> (Pos, Pos) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Map a key to a single-line text edit.
pub fn input_request(code: KeyCode, ctrl: bool) -> Option<InputRequest> {
    match (code, ctrl) {
        (KeyCode::Char('w'), true) => Some(InputRequest::DeletePrevWord),
        (KeyCode::Char('u'), true) => Some(InputRequest::DeleteLine),
        (KeyCode::Char('a'), true) | (KeyCode::Home, _) => Some(InputRequest::GoToStart),
        (KeyCode::Char('e'), true) | (KeyCode::End, _) => Some(InputRequest::GoToEnd),
        (KeyCode::Char(c), false) => Some(InputRequest::InsertChar(c)),
        (KeyCode::Backspace, _) => Some(InputRequest::DeletePrevChar),
        (KeyCode::Delete, _) => Some(InputRequest::DeleteNextChar),
        (KeyCode::Left, _) => Some(InputRequest::GoToPrevChar),
        (KeyCode::Right, _) => Some(InputRequest::GoToNextChar),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// 20 scrollback lines + 5 screen lines.
    fn entered() -> CopyMode {
        let lines: Vec<String> = (0..25).map(|i| format!("line {i:02} word")).collect();
        let mut cm = CopyMode::default();
        cm.enter(lines, 5, 40);
        cm
    }

    fn press(cm: &mut CopyMode, keys: &str) {
        let now = Instant::now();
        for c in keys.chars() {
            cm.handle_key(key(KeyCode::Char(c)), now);
        }
    }

    #[test]
    fn test_enter_centers_cursor_on_live_screen() {
        let cm = entered();
        assert!(cm.active);
        assert_eq!(cm.scroll_offset, 0);
        assert_eq!(cm.cursor, (2, 0));
        assert_eq!(cm.cursor_abs(), Pos::new(22, 0));
    }

    #[test]
    fn test_moving_up_past_top_scrolls() {
        let mut cm = entered();
        press(&mut cm, "kkk");
        assert_eq!(cm.cursor, (0, 0));
        assert_eq!(cm.scroll_offset, 1);
        assert_eq!(cm.cursor_abs(), Pos::new(19, 0));
    }

    #[test]
    fn test_count_prefix() {
        let mut cm = entered();
        press(&mut cm, "12k");
        assert_eq!(cm.cursor_abs().line, 10);
        press(&mut cm, "3l");
        assert_eq!(cm.cursor_abs().col, 3);
    }

    #[test]
    fn test_gg_and_g() {
        let mut cm = entered();
        press(&mut cm, "gg");
        assert_eq!(cm.cursor_abs(), Pos::new(0, 0));
        assert_eq!(cm.scroll_offset, 20);
        press(&mut cm, "G");
        assert_eq!(cm.cursor_abs(), Pos::new(24, 0));
        assert_eq!(cm.scroll_offset, 0);
    }

    #[test]
    fn test_single_g_expires() {
        let mut cm = entered();
        let t0 = Instant::now();
        cm.handle_key(key(KeyCode::Char('g')), t0);
        cm.handle_key(
            key(KeyCode::Char('g')),
            t0 + DOUBLE_KEY_WINDOW + std::time::Duration::from_millis(1),
        );
        assert_eq!(cm.cursor_abs().line, 22);
    }

    #[test]
    fn test_line_motions() {
        let mut cm = entered();
        press(&mut cm, "$");
        assert_eq!(cm.cursor_abs().col, "line 22 word".len() - 1);
        press(&mut cm, "0");
        assert_eq!(cm.cursor_abs().col, 0);
        press(&mut cm, "w");
        assert_eq!(cm.cursor_abs().col, 5);
    }

    #[test]
    fn test_char_search_and_repeat() {
        let mut cm = entered();
        press(&mut cm, "fe");
        // "line 22 word": first 'e' after col 0 is col 3
        assert_eq!(cm.cursor_abs().col, 3);
        press(&mut cm, "0fo");
        assert_eq!(cm.cursor_abs().col, 9);
        press(&mut cm, "0");
        press(&mut cm, ";");
        assert_eq!(cm.cursor_abs().col, 9);
    }

    #[test]
    fn test_half_page_scroll() {
        let mut cm = entered();
        cm.handle_key(ctrl('u'), Instant::now());
        assert_eq!(cm.scroll_offset, 2);
        assert_eq!(cm.cursor_abs().line, 20);
        cm.handle_key(ctrl('d'), Instant::now());
        assert_eq!(cm.scroll_offset, 0);
        assert_eq!(cm.cursor_abs().line, 22);
    }

    #[test]
    fn test_visual_line_yank() {
        let mut cm = entered();
        press(&mut cm, "Vk");
        let action = cm.handle_key(key(KeyCode::Char('y')), Instant::now());
        assert_eq!(action, CopyAction::Yank("line 21 word\nline 22 word".into()));
        assert!(!cm.active);
        assert_eq!(cm.scroll_offset, 0);
    }

    #[test]
    fn test_visual_char_yank() {
        let mut cm = entered();
        press(&mut cm, "wve");
        let action = cm.handle_key(key(KeyCode::Char('y')), Instant::now());
        assert_eq!(action, CopyAction::Yank("22".into()));
    }

    #[test]
    fn test_search_forward_and_next() {
        let mut cm = entered();
        press(&mut cm, "gg");
        cm.handle_key(key(KeyCode::Char('/')), Instant::now());
        assert_eq!(cm.state, CopyState::Search);
        press(&mut cm, "line 1");
        cm.handle_key(key(KeyCode::Enter), Instant::now());
        assert_eq!(cm.state, CopyState::Normal);
        assert_eq!(cm.search.matches.len(), 10);
        assert_eq!(cm.cursor_abs(), Pos::new(10, 0));
        press(&mut cm, "n");
        assert_eq!(cm.cursor_abs(), Pos::new(11, 0));
        press(&mut cm, "N");
        assert_eq!(cm.cursor_abs(), Pos::new(10, 0));
    }

    #[test]
    fn test_next_match_starts_from_moved_cursor() {
        let mut cm = entered();
        press(&mut cm, "/word");
        cm.handle_key(key(KeyCode::Enter), Instant::now());
        assert_eq!(cm.cursor_abs(), Pos::new(22, 8));

        press(&mut cm, "gg");
        press(&mut cm, "n");
        assert_eq!(cm.cursor_abs(), Pos::new(0, 8));

        press(&mut cm, "G");
        press(&mut cm, "N");
        assert_eq!(cm.cursor_abs(), Pos::new(23, 8));
    }

    #[test]
    fn test_search_escape_cancels() {
        let mut cm = entered();
        cm.handle_key(key(KeyCode::Char('/')), Instant::now());
        press(&mut cm, "zzz");
        cm.handle_key(key(KeyCode::Esc), Instant::now());
        assert_eq!(cm.state, CopyState::Normal);
        assert!(cm.search.matches.is_empty());
        assert!(cm.active);
    }

    #[test]
    fn test_tab_toggles_case() {
        let mut cm = entered();
        cm.handle_key(key(KeyCode::Char('/')), Instant::now());
        cm.handle_key(key(KeyCode::Tab), Instant::now());
        assert!(cm.search.case_sensitive);
        press(&mut cm, "LINE");
        cm.handle_key(key(KeyCode::Enter), Instant::now());
        assert!(cm.search.matches.is_empty());
    }

    #[test]
    fn test_match_in_scrollback_maps_to_viewport() {
        let mut cm = entered();
        cm.search.direction = SearchDirection::Backward;
        cm.confirm_search("line 03");
        let m = cm.search.current_match().unwrap();
        assert_eq!(m.line, 3);
        let row = cm.viewport_row(3).unwrap();
        assert_eq!(cm.highlight_at(row, 0), Some(Highlight::Cursor));
        assert_eq!(cm.highlight_at(row, 1), Some(Highlight::CurrentMatch));
    }

    #[test]
    fn test_exit_resets_offset() {
        let mut cm = entered();
        press(&mut cm, "gg");
        assert!(cm.scroll_offset > 0);
        assert_eq!(cm.handle_key(key(KeyCode::Char('q')), Instant::now()), CopyAction::Exit);
        assert_eq!(cm.scroll_offset, 0);
        assert!(!cm.active);
    }

    #[test]
    fn test_reentry_keeps_case_setting() {
        let mut cm = entered();
        cm.search.case_sensitive = true;
        cm.exit();
        cm.enter(vec!["a".into(); 5], 5, 10);
        assert!(cm.search.case_sensitive);
        assert!(cm.search.matches.is_empty());
    }
}
