//! Mouse and keyboard text selection in a window's visible content.
//!
//! Coordinates are `(row, col)` relative to the content area (inside the
//! border). Selection is independent of copy mode: it works on whatever is
//! currently on screen.

/// Selection granularity, picked by click count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Character-wise (single click + drag).
    #[default]
    Char,
    /// Whole words (double click).
    Word,
    /// Whole lines (triple click).
    Line,
}

impl SelectionMode {
    /// Mode for a given consecutive click count.
    pub fn from_clicks(clicks: u8) -> Self {
        match clicks {
            0 | 1 => Self::Char,
            2 => Self::Word,
            _ => Self::Line,
        }
    }
}

/// An in-progress or finished selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Where the selection started.
    pub anchor: (u16, u16),
    /// Where the selection currently ends.
    pub head: (u16, u16),
    /// Granularity.
    pub mode: SelectionMode,
    /// True while the mouse button (or shift) is held.
    pub active: bool,
}

impl Selection {
    /// Start a selection at `pos`.
    pub fn start(pos: (u16, u16), mode: SelectionMode) -> Self {
        Self {
            anchor: pos,
            head: pos,
            mode,
            active: true,
        }
    }

    /// Move the head of the selection.
    pub fn extend_to(&mut self, pos: (u16, u16)) {
        self.head = pos;
    }

    /// Start and end in reading order.
    pub fn ordered(&self) -> ((u16, u16), (u16, u16)) {
        if self.anchor <= self.head {
            (self.anchor, self.head)
        } else {
            (self.head, self.anchor)
        }
    }

    /// Whether the selection covers a single cell and nothing was dragged.
    pub fn is_empty(&self) -> bool {
        self.mode == SelectionMode::Char && self.anchor == self.head
    }

    /// Resolve the selection against the visible rows into
    /// `(start, end)` cell positions, inclusive, after word/line expansion.
    pub fn span(&self, rows: &[String]) -> ((u16, u16), (u16, u16)) {
        let (mut start, mut end) = self.ordered();
        match self.mode {
            SelectionMode::Char => {}
            SelectionMode::Word => {
                if let Some(row) = rows.get(usize::from(start.0)) {
                    start.1 = word_bounds(row, usize::from(start.1)).0 as u16;
                }
                if let Some(row) = rows.get(usize::from(end.0)) {
                    end.1 = word_bounds(row, usize::from(end.1)).1 as u16;
                }
            }
            SelectionMode::Line => {
                start.1 = 0;
                end.1 = rows
                    .get(usize::from(end.0))
                    .map_or(0, |r| r.chars().count().saturating_sub(1) as u16);
            }
        }
        (start, end)
    }

    /// Whether cell `(row, col)` is selected, given the expanded span.
    pub fn span_contains(span: ((u16, u16), (u16, u16)), row: u16, col: u16) -> bool {
        let ((sr, sc), (er, ec)) = span;
        if row < sr || row > er {
            return false;
        }
        let after_start = row > sr || col >= sc;
        let before_end = row < er || col <= ec;
        after_start && before_end
    }

    /// Extract the selected text from the visible rows. Trailing blanks on
    /// each line are dropped; lines are joined with `\n`.
    pub fn text(&self, rows: &[String]) -> String {
        let ((sr, sc), (er, ec)) = self.span(rows);
        let mut out = Vec::new();
        for r in sr..=er {
            let Some(row) = rows.get(usize::from(r)) else {
                break;
            };
            let chars: Vec<char> = row.chars().collect();
            let from = if r == sr { usize::from(sc) } else { 0 };
            let to = if r == er {
                (usize::from(ec) + 1).min(chars.len())
            } else {
                chars.len()
            };
            let piece: String = chars.get(from..to.max(from)).unwrap_or(&[]).iter().collect();
            out.push(piece.trim_end().to_string());
        }
        out.join("\n")
    }
}

/// Character class used for word boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharClass {
    Blank,
    Word,
    Punct,
}

pub(crate) fn char_class(c: char) -> CharClass {
    if c.is_whitespace() {
        CharClass::Blank
    } else if c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else {
        CharClass::Punct
    }
}

/// Inclusive `(start, end)` column bounds of the run of same-class
/// characters at `col`.
pub(crate) fn word_bounds(line: &str, col: usize) -> (usize, usize) {
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        return (col, col);
    }
    let col = col.min(chars.len() - 1);
    let class = char_class(chars[col]);
    let mut start = col;
    while start > 0 && char_class(chars[start - 1]) == class {
        start -= 1;
    }
    let mut end = col;
    while end + 1 < chars.len() && char_class(chars[end + 1]) == class {
        end += 1;
    }
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_char_selection_across_lines() {
        let visible = rows(&["hello world", "second line", "third"]);
        let mut sel = Selection::start((0, 6), SelectionMode::Char);
        sel.extend_to((1, 5));
        assert_eq!(sel.text(&visible), "world\nsecond");
    }

    #[test]
    fn test_backwards_drag_is_ordered() {
        let visible = rows(&["abcdef"]);
        let mut sel = Selection::start((0, 4), SelectionMode::Char);
        sel.extend_to((0, 1));
        assert_eq!(sel.text(&visible), "bcde");
    }

    #[test]
    fn test_word_selection_expands() {
        let visible = rows(&["cargo build --release"]);
        let sel = Selection::start((0, 8), SelectionMode::Word);
        assert_eq!(sel.text(&visible), "build");
    }

    #[test]
    fn test_line_selection_takes_whole_rows() {
        let visible = rows(&["one", "two", "three"]);
        let mut sel = Selection::start((0, 2), SelectionMode::Line);
        sel.extend_to((1, 0));
        assert_eq!(sel.text(&visible), "one\ntwo");
    }

    #[test]
    fn test_span_contains() {
        let span = ((1, 4), (3, 2));
        assert!(!Selection::span_contains(span, 1, 3));
        assert!(Selection::span_contains(span, 1, 4));
        assert!(Selection::span_contains(span, 2, 0));
        assert!(Selection::span_contains(span, 3, 2));
        assert!(!Selection::span_contains(span, 3, 3));
    }

    #[test]
    fn test_click_count_modes() {
        assert_eq!(SelectionMode::from_clicks(1), SelectionMode::Char);
        assert_eq!(SelectionMode::from_clicks(2), SelectionMode::Word);
        assert_eq!(SelectionMode::from_clicks(3), SelectionMode::Line);
    }
}
