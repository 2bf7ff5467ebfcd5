//! Incremental search over the scrollback + screen snapshot.

use tui_input::Input;

use super::motion::Pos;

/// Direction a search was started in (`/` forward, `?` backward).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDirection {
    /// `/`
    #[default]
    Forward,
    /// `?`
    Backward,
}

/// One occurrence of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    /// Absolute line.
    pub line: usize,
    /// Starting character column.
    pub col: usize,
    /// Length in characters.
    pub len: usize,
}

impl SearchMatch {
    /// Start position of the match.
    pub fn pos(&self) -> Pos {
        Pos::new(self.line, self.col)
    }

    /// Whether `(line, col)` falls inside this match.
    pub fn covers(&self, line: usize, col: usize) -> bool {
        line == self.line && col >= self.col && col < self.col + self.len
    }
}

/// Search input and results.
#[derive(Debug, Default)]
pub struct SearchState {
    /// Query being typed.
    pub input: Input,
    /// Last confirmed query.
    pub query: String,
    /// Matches of `query`, in absolute order.
    pub matches: Vec<SearchMatch>,
    /// Index into `matches` of the match the cursor is on.
    pub current: Option<usize>,
    /// Match case exactly when true.
    pub case_sensitive: bool,
    /// Direction of the last confirmed search.
    pub direction: SearchDirection,
}

impl SearchState {
    /// Drop results and the typed query. Case sensitivity is kept.
    pub fn clear(&mut self) {
        self.input.reset();
        self.query.clear();
        self.matches.clear();
        self.current = None;
    }

    /// Index of the next match strictly after (`forward`) or before `from`,
    /// wrapping around the ends.
    pub fn next_index(&self, from: Pos, forward: bool) -> Option<usize> {
        if self.matches.is_empty() {
            return None;
        }
        if forward {
            self.matches
                .iter()
                .position(|m| m.pos() > from)
                .or(Some(0))
        } else {
            self.matches
                .iter()
                .rposition(|m| m.pos() < from)
                .or(Some(self.matches.len() - 1))
        }
    }

    /// The match under the cursor, if any.
    pub fn current_match(&self) -> Option<SearchMatch> {
        self.current.and_then(|i| self.matches.get(i).copied())
    }
}

/// Find every non-overlapping occurrence of `query` in `lines`.
///
/// Columns and lengths are in characters, not bytes, so they line up with
/// terminal cells for single-width text.
pub fn find_matches(lines: &[String], query: &str, case_sensitive: bool) -> Vec<SearchMatch> {
    let needle: Vec<char> = fold(query, case_sensitive);
    if needle.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    for (line_idx, line) in lines.iter().enumerate() {
        let hay = fold(line, case_sensitive);
        if hay.len() < needle.len() {
            continue;
        }
        let mut col = 0;
        while col + needle.len() <= hay.len() {
            if hay[col..col + needle.len()] == needle[..] {
                out.push(SearchMatch {
                    line: line_idx,
                    col,
                    len: needle.len(),
                });
                col += needle.len();
            } else {
                col += 1;
            }
        }
    }
    out
}

/// Characters of `s`, lowercased one-for-one when matching is
/// case-insensitive so columns are preserved.
fn fold(s: &str, case_sensitive: bool) -> Vec<char> {
    if case_sensitive {
        s.chars().collect()
    } else {
        s.chars()
            .map(|c| c.to_lowercase().next().unwrap_or(c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(src: &[&str]) -> Vec<String> {
        src.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_case_insensitive_default() {
        let l = lines(&["Error: foo", "no match", "ERROR again error"]);
        let found = find_matches(&l, "error", false);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0], SearchMatch { line: 0, col: 0, len: 5 });
        assert_eq!(found[2], SearchMatch { line: 2, col: 12, len: 5 });
    }

    #[test]
    fn test_case_sensitive() {
        let l = lines(&["Error error"]);
        let found = find_matches(&l, "error", true);
        assert_eq!(found, vec![SearchMatch { line: 0, col: 6, len: 5 }]);
    }

    #[test]
    fn test_non_overlapping() {
        let l = lines(&["aaaa"]);
        assert_eq!(find_matches(&l, "aa", true).len(), 2);
    }

    #[test]
    fn test_columns_are_char_based() {
        let l = lines(&["héllo wörld"]);
        let found = find_matches(&l, "wörld", true);
        assert_eq!(found[0].col, 6);
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        assert!(find_matches(&lines(&["abc"]), "", false).is_empty());
    }

    #[test]
    fn test_next_index_wraps() {
        let state = SearchState {
            matches: vec![
                SearchMatch { line: 1, col: 0, len: 1 },
                SearchMatch { line: 5, col: 2, len: 1 },
            ],
            ..SearchState::default()
        };
        assert_eq!(state.next_index(Pos::new(0, 0), true), Some(0));
        assert_eq!(state.next_index(Pos::new(1, 0), true), Some(1));
        assert_eq!(state.next_index(Pos::new(9, 0), true), Some(0));
        assert_eq!(state.next_index(Pos::new(5, 2), false), Some(0));
        assert_eq!(state.next_index(Pos::new(0, 0), false), Some(1));
    }
}
