//! Cursor motions over a captured line snapshot.
//!
//! Positions are absolute: `line` indexes the full scrollback + screen
//! snapshot, `col` is a character index within the line. Every function is
//! pure and clamps instead of failing.

use crate::window::selection::{char_class, CharClass};

/// An absolute position in the line snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Pos {
    /// Absolute line index (0 = oldest scrollback line).
    pub line: usize,
    /// Character column.
    pub col: usize,
}

impl Pos {
    /// Create a position.
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// Which way an `f`/`F`/`t`/`T` search goes and where it stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharSearch {
    /// `f`: forward, onto the character.
    ForwardTo,
    /// `F`: backward, onto the character.
    BackwardTo,
    /// `t`: forward, just before the character.
    ForwardTill,
    /// `T`: backward, just after the character.
    BackwardTill,
}

impl CharSearch {
    /// The same search in the opposite direction (for `,`).
    pub fn reversed(self) -> Self {
        match self {
            Self::ForwardTo => Self::BackwardTo,
            Self::BackwardTo => Self::ForwardTo,
            Self::ForwardTill => Self::BackwardTill,
            Self::BackwardTill => Self::ForwardTill,
        }
    }
}

fn chars_of(lines: &[String], line: usize) -> Vec<char> {
    lines.get(line).map(|l| l.chars().collect()).unwrap_or_default()
}

fn line_len(lines: &[String], line: usize) -> usize {
    lines.get(line).map_or(0, |l| l.chars().count())
}

fn class_at(lines: &[String], pos: Pos) -> CharClass {
    lines
        .get(pos.line)
        .and_then(|l| l.chars().nth(pos.col))
        .map_or(CharClass::Blank, char_class)
}

fn next_pos(lines: &[String], pos: Pos) -> Option<Pos> {
    if pos.col + 1 < line_len(lines, pos.line) {
        Some(Pos::new(pos.line, pos.col + 1))
    } else if pos.line + 1 < lines.len() {
        Some(Pos::new(pos.line + 1, 0))
    } else {
        None
    }
}

fn prev_pos(lines: &[String], pos: Pos) -> Option<Pos> {
    if pos.col > 0 {
        Some(Pos::new(pos.line, pos.col - 1))
    } else if pos.line > 0 {
        let prev = pos.line - 1;
        Some(Pos::new(prev, line_len(lines, prev).saturating_sub(1)))
    } else {
        None
    }
}

/// Largest valid column on `line` (0 for empty lines).
pub fn max_col(lines: &[String], line: usize) -> usize {
    line_len(lines, line).saturating_sub(1)
}

/// `w`: start of the next word, `count` times.
pub fn word_forward(lines: &[String], mut pos: Pos, count: usize) -> Pos {
    for _ in 0..count.max(1) {
        let class = class_at(lines, pos);
        let mut cur = pos;
        // Leave the current run (never across a line break).
        if class != CharClass::Blank {
            while let Some(next) = next_pos(lines, cur) {
                if next.line != cur.line || class_at(lines, next) != class {
                    cur = next;
                    break;
                }
                cur = next;
            }
            if cur == pos {
                break;
            }
        }
        // Skip blanks and line breaks.
        while class_at(lines, cur) == CharClass::Blank {
            match next_pos(lines, cur) {
                Some(next) => cur = next,
                None => break,
            }
        }
        pos = cur;
    }
    pos
}

/// `b`: start of the previous word, `count` times.
pub fn word_backward(lines: &[String], mut pos: Pos, count: usize) -> Pos {
    for _ in 0..count.max(1) {
        let Some(mut cur) = prev_pos(lines, pos) else {
            break;
        };
        while class_at(lines, cur) == CharClass::Blank {
            match prev_pos(lines, cur) {
                Some(prev) => cur = prev,
                None => break,
            }
        }
        let class = class_at(lines, cur);
        while let Some(prev) = prev_pos(lines, cur) {
            if prev.line != cur.line || class_at(lines, prev) != class {
                break;
            }
            cur = prev;
        }
        pos = cur;
    }
    pos
}

/// `e`: end of the current or next word, `count` times.
pub fn word_end(lines: &[String], mut pos: Pos, count: usize) -> Pos {
    for _ in 0..count.max(1) {
        let Some(mut cur) = next_pos(lines, pos) else {
            break;
        };
        while class_at(lines, cur) == CharClass::Blank {
            match next_pos(lines, cur) {
                Some(next) => cur = next,
                None => break,
            }
        }
        let class = class_at(lines, cur);
        while let Some(next) = next_pos(lines, cur) {
            if next.line != cur.line || class_at(lines, next) != class {
                break;
            }
            cur = next;
        }
        pos = cur;
    }
    pos
}

/// `^`: first non-blank column of `line`.
pub fn first_non_blank(lines: &[String], line: usize) -> usize {
    chars_of(lines, line)
        .iter()
        .position(|c| !c.is_whitespace())
        .unwrap_or(0)
}

/// `f`/`F`/`t`/`T`: target column for a character search on `pos.line`.
///
/// Returns `None` when the character does not occur `count` times in the
/// search direction; the cursor then stays put.
pub fn find_char(
    lines: &[String],
    pos: Pos,
    kind: CharSearch,
    target: char,
    count: usize,
) -> Option<usize> {
    let chars = chars_of(lines, pos.line);
    let count = count.max(1);
    match kind {
        CharSearch::ForwardTo | CharSearch::ForwardTill => {
            // `t` starting right before a match would not move; skip it.
            let skip = usize::from(kind == CharSearch::ForwardTill);
            let found = chars
                .iter()
                .enumerate()
                .skip(pos.col + 1 + skip)
                .filter(|(_, c)| **c == target)
                .nth(count - 1)
                .map(|(i, _)| i)?;
            Some(if kind == CharSearch::ForwardTill {
                found - 1
            } else {
                found
            })
        }
        CharSearch::BackwardTo | CharSearch::BackwardTill => {
            let skip = usize::from(kind == CharSearch::BackwardTill);
            let end = pos.col.saturating_sub(skip).min(chars.len());
            let found = chars[..end]
                .iter()
                .enumerate()
                .rev()
                .filter(|(_, c)| **c == target)
                .nth(count - 1)
                .map(|(i, _)| i)?;
            Some(if kind == CharSearch::BackwardTill {
                found + 1
            } else {
                found
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(src: &[&str]) -> Vec<String> {
        src.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_word_forward_within_line() {
        let l = lines(&["foo bar.baz qux"]);
        assert_eq!(word_forward(&l, Pos::new(0, 0), 1), Pos::new(0, 4));
        assert_eq!(word_forward(&l, Pos::new(0, 4), 1), Pos::new(0, 7));
        assert_eq!(word_forward(&l, Pos::new(0, 0), 3), Pos::new(0, 8));
    }

    #[test]
    fn test_word_forward_crosses_lines() {
        let l = lines(&["foo", "", "  bar"]);
        assert_eq!(word_forward(&l, Pos::new(0, 1), 1), Pos::new(2, 2));
    }

    #[test]
    fn test_word_forward_at_end_stays() {
        let l = lines(&["foo"]);
        assert_eq!(word_forward(&l, Pos::new(0, 1), 1), Pos::new(0, 2));
    }

    #[test]
    fn test_word_backward() {
        let l = lines(&["foo bar", "baz"]);
        assert_eq!(word_backward(&l, Pos::new(1, 0), 1), Pos::new(0, 4));
        assert_eq!(word_backward(&l, Pos::new(0, 6), 1), Pos::new(0, 4));
        assert_eq!(word_backward(&l, Pos::new(0, 4), 1), Pos::new(0, 0));
        assert_eq!(word_backward(&l, Pos::new(0, 0), 1), Pos::new(0, 0));
    }

    #[test]
    fn test_word_end() {
        let l = lines(&["foo bar", "baz"]);
        assert_eq!(word_end(&l, Pos::new(0, 0), 1), Pos::new(0, 2));
        assert_eq!(word_end(&l, Pos::new(0, 2), 1), Pos::new(0, 6));
        assert_eq!(word_end(&l, Pos::new(0, 6), 1), Pos::new(1, 2));
    }

    #[test]
    fn test_first_non_blank() {
        let l = lines(&["    indented", "", "x"]);
        assert_eq!(first_non_blank(&l, 0), 4);
        assert_eq!(first_non_blank(&l, 1), 0);
        assert_eq!(first_non_blank(&l, 2), 0);
    }

    #[test]
    fn test_find_char_variants() {
        let l = lines(&["a,b,c,d"]);
        let p = Pos::new(0, 0);
        assert_eq!(find_char(&l, p, CharSearch::ForwardTo, ',', 1), Some(1));
        assert_eq!(find_char(&l, p, CharSearch::ForwardTo, ',', 2), Some(3));
        assert_eq!(find_char(&l, p, CharSearch::ForwardTill, 'c', 1), Some(3));
        assert_eq!(find_char(&l, p, CharSearch::ForwardTo, 'z', 1), None);

        let p = Pos::new(0, 6);
        assert_eq!(find_char(&l, p, CharSearch::BackwardTo, ',', 1), Some(5));
        assert_eq!(find_char(&l, p, CharSearch::BackwardTill, 'b', 1), Some(3));
    }

    #[test]
    fn test_till_repeat_does_not_stick() {
        let l = lines(&["x.y.z"]);
        // Cursor just before '.', `t.` should reach the next '.'
        let p = Pos::new(0, 0);
        assert_eq!(find_char(&l, p, CharSearch::ForwardTill, '.', 1), Some(2));
    }

    #[test]
    fn test_reversed() {
        assert_eq!(CharSearch::ForwardTo.reversed(), CharSearch::BackwardTo);
        assert_eq!(CharSearch::BackwardTill.reversed(), CharSearch::ForwardTill);
    }
}
