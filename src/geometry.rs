//! Cell-space rectangles for window placement.
//!
//! Window geometry is signed so windows can be dragged partially off the
//! left or top edge. Conversion to a ratatui [`Rect`] happens only at render
//! time, after clipping against the viewport.

use ratatui::layout::Rect;

/// A rectangle in terminal cells. `x`/`y` may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Geometry {
    /// Left edge column.
    pub x: i32,
    /// Top edge row.
    pub y: i32,
    /// Width in columns.
    pub width: i32,
    /// Height in rows.
    pub height: i32,
}

impl Geometry {
    /// Create a geometry from its four components.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Whether the cell at `(col, row)` lies inside this rectangle.
    pub const fn contains(&self, col: i32, row: i32) -> bool {
        col >= self.x && col < self.right() && row >= self.y && row < self.bottom()
    }

    /// Whether two rectangles share at least one cell.
    pub const fn intersects(&self, other: &Self) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Cell count covered by this rectangle. Degenerate rectangles have zero area.
    pub fn area(&self) -> i64 {
        i64::from(self.width.max(0)) * i64::from(self.height.max(0))
    }

    /// Grow the rectangle by `margin` cells on every side.
    pub const fn expanded(&self, margin: i32) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2,
            self.height + margin * 2,
        )
    }

    /// Clamp width and height to at least the given minimum.
    pub fn with_min_size(self, min_width: i32, min_height: i32) -> Self {
        Self {
            width: self.width.max(min_width),
            height: self.height.max(min_height),
            ..self
        }
    }

    /// Shift the rectangle so at least its title row stays reachable inside
    /// `bounds`. Size is never changed.
    pub fn clamped_into(self, bounds: &Self) -> Self {
        let max_x = (bounds.right() - self.width).max(bounds.x);
        let max_y = (bounds.bottom() - self.height).max(bounds.y);
        Self {
            x: self.x.clamp(bounds.x, max_x),
            y: self.y.clamp(bounds.y, max_y),
            ..self
        }
    }

    /// Inner content size after removing a one-cell border, as `(rows, cols)`.
    ///
    /// Never returns zero so the emulator always has a valid grid.
    pub fn content_size(&self) -> (u16, u16) {
        let rows = (self.height - 2).clamp(1, i32::from(u16::MAX));
        let cols = (self.width - 2).clamp(1, i32::from(u16::MAX));
        (rows as u16, cols as u16)
    }

    /// Linear interpolation towards `target` at `t` in `[0, 1]`.
    pub fn lerp(&self, target: &Self, t: f64) -> Self {
        let mix = |a: i32, b: i32| -> i32 {
            (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as i32
        };
        Self {
            x: mix(self.x, target.x),
            y: mix(self.y, target.y),
            width: mix(self.width, target.width),
            height: mix(self.height, target.height),
        }
    }

    /// Intersection with the viewport as a ratatui [`Rect`], or `None` when
    /// nothing is visible.
    pub fn visible_rect(&self, viewport: Rect) -> Option<Rect> {
        let left = self.x.max(i32::from(viewport.x));
        let top = self.y.max(i32::from(viewport.y));
        let right = self.right().min(i32::from(viewport.right()));
        let bottom = self.bottom().min(i32::from(viewport.bottom()));
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect::new(
            left as u16,
            top as u16,
            (right - left) as u16,
            (bottom - top) as u16,
        ))
    }
}

impl From<Rect> for Geometry {
    fn from(rect: Rect) -> Self {
        Self::new(
            i32::from(rect.x),
            i32::from(rect.y),
            i32::from(rect.width),
            i32::from(rect.height),
        )
    }
}
