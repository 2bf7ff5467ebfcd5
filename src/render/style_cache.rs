//! Bounded memo of ratatui styles keyed by emulator cell attributes.
//!
//! Every content cell maps to a [`Style`] built from its colors and
//! attribute bits. Screens reuse a handful of combinations, so the renderer
//! looks them up here instead of rebuilding them per cell. The cache is
//! owned by the [`Renderer`](super::Renderer) and can be reset from the
//! cache-stats overlay.

use std::collections::{HashMap, VecDeque};

use ratatui::style::{Color, Modifier, Style};

/// Cell attributes that determine a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleKey {
    /// Foreground color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
    /// Attribute bits, see the `ATTR_*` constants.
    pub attrs: u8,
}

/// Bold attribute bit.
pub const ATTR_BOLD: u8 = 1;
/// Italic attribute bit.
pub const ATTR_ITALIC: u8 = 1 << 1;
/// Underline attribute bit.
pub const ATTR_UNDERLINE: u8 = 1 << 2;
/// Inverse attribute bit.
pub const ATTR_INVERSE: u8 = 1 << 3;

impl StyleKey {
    /// Key for a vt100 cell.
    pub fn from_cell(cell: &vt100::Cell) -> Self {
        let mut attrs = 0;
        if cell.bold() {
            attrs |= ATTR_BOLD;
        }
        if cell.italic() {
            attrs |= ATTR_ITALIC;
        }
        if cell.underline() {
            attrs |= ATTR_UNDERLINE;
        }
        if cell.inverse() {
            attrs |= ATTR_INVERSE;
        }
        Self {
            fg: convert_color(cell.fgcolor()),
            bg: convert_color(cell.bgcolor()),
            attrs,
        }
    }

    /// Build the style this key describes.
    pub fn build(&self) -> Style {
        let mut style = Style::default().fg(self.fg).bg(self.bg);
        for (bit, modifier) in [
            (ATTR_BOLD, Modifier::BOLD),
            (ATTR_ITALIC, Modifier::ITALIC),
            (ATTR_UNDERLINE, Modifier::UNDERLINED),
            (ATTR_INVERSE, Modifier::REVERSED),
        ] {
            if self.attrs & bit != 0 {
                style = style.add_modifier(modifier);
            }
        }
        style
    }
}

/// Convert a vt100 color to a ratatui color.
pub fn convert_color(color: vt100::Color) -> Color {
    match color {
        vt100::Color::Default => Color::Reset,
        vt100::Color::Idx(i) => Color::Indexed(i),
        vt100::Color::Rgb(r, g, b) => Color::Rgb(r, g, b),
    }
}

/// Hit/miss/eviction counters plus current size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyleCacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that built a new style.
    pub misses: u64,
    /// Entries dropped to stay within capacity.
    pub evictions: u64,
    /// Entries currently held.
    pub size: usize,
    /// Maximum entries.
    pub capacity: usize,
}

impl StyleCacheStats {
    /// Hits as a fraction of all lookups, `0.0` before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// FIFO-bounded style memo.
#[derive(Debug)]
pub struct StyleCache {
    entries: HashMap<StyleKey, Style>,
    order: VecDeque<StyleKey>,
    capacity: usize,
    stats: StyleCacheStats,
}

impl StyleCache {
    /// Create a cache holding at most `capacity` styles (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
            stats: StyleCacheStats {
                capacity,
                ..StyleCacheStats::default()
            },
        }
    }

    /// Style for `key`, built and remembered on a miss.
    pub fn get(&mut self, key: StyleKey) -> Style {
        if let Some(style) = self.entries.get(&key) {
            self.stats.hits += 1;
            return *style;
        }
        self.stats.misses += 1;
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                self.stats.evictions += 1;
            }
        }
        let style = key.build();
        self.entries.insert(key, style);
        self.order.push_back(key);
        style
    }

    /// Current counters.
    pub fn stats(&self) -> StyleCacheStats {
        StyleCacheStats {
            size: self.entries.len(),
            ..self.stats
        }
    }

    /// Drop every entry and zero the counters.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.stats = StyleCacheStats {
            capacity: self.capacity,
            ..StyleCacheStats::default()
        };
        log::debug!("Style cache reset");
    }
}
