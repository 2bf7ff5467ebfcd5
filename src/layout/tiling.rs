//! Tiling layout calculator.
//!
//! Computes rectangles that cover the viewport with no overlaps and no gaps.
//! The arrangement depends only on the window count:
//!
//! ```text
//! n=1        n=2          n=3          n=4          n=5 (cols=3)
//! ┌──────┐   ┌───┬───┐    ┌───┬───┐    ┌───┬───┐    ┌──┬──┬──┐
//! │      │   │   │   │    │   │   │    │   │   │    │  │  │  │
//! │      │   │   │   │    │   ├───┤    ├───┼───┤    ├──┴┬─┴──┤
//! │      │   │   │   │    │   │   │    │   │   │    │   │    │
//! └──────┘   └───┴───┘    └───┴───┘    └───┴───┘    └───┴────┘
//! ```
//!
//! Integer remainders go to the last column and row so edges meet exactly.
//! Minimum window sizes are the caller's concern.

use crate::geometry::Geometry;

/// Compute tiled rectangles for `count` windows inside a `width` x `height`
/// viewport anchored at the origin.
///
/// Returns an empty vector for zero windows. Deterministic for identical
/// inputs.
pub fn tile_layout(count: usize, width: i32, height: i32) -> Vec<Geometry> {
    let width = width.max(0);
    let height = height.max(0);

    match count {
        0 => Vec::new(),
        1 => vec![Geometry::new(0, 0, width, height)],
        2 => split(width, 2)
            .into_iter()
            .map(|(x, w)| Geometry::new(x, 0, w, height))
            .collect(),
        3 => {
            let cols = split(width, 2);
            let (left_x, left_w) = cols[0];
            let (right_x, right_w) = cols[1];
            let mut out = vec![Geometry::new(left_x, 0, left_w, height)];
            out.extend(
                split(height, 2)
                    .into_iter()
                    .map(|(y, h)| Geometry::new(right_x, y, right_w, h)),
            );
            out
        }
        n => grid(n, width, height),
    }
}

/// Grid layout for four or more windows. The last row stretches its cells to
/// fill the full width when it is not complete.
fn grid(count: usize, width: i32, height: i32) -> Vec<Geometry> {
    let cols = ceil_sqrt(count);
    let rows = count.div_ceil(cols);
    let row_bands = split(height, rows);

    let mut out = Vec::with_capacity(count);
    for (row, (y, h)) in row_bands.into_iter().enumerate() {
        let remaining = count - row * cols;
        let in_row = remaining.min(cols);
        for (x, w) in split(width, in_row) {
            out.push(Geometry::new(x, y, w, h));
        }
    }
    out
}

/// Split `total` cells into `parts` bands, returning `(offset, size)` pairs.
/// The final band absorbs the remainder.
fn split(total: i32, parts: usize) -> Vec<(i32, i32)> {
    let parts_i = i32::try_from(parts.max(1)).unwrap_or(i32::MAX);
    let base = total / parts_i;
    (0..parts_i)
        .map(|i| {
            let offset = base * i;
            let size = if i == parts_i - 1 { total - offset } else { base };
            (offset, size)
        })
        .collect()
}

fn ceil_sqrt(n: usize) -> usize {
    let mut root = 1;
    while root * root < n {
        root += 1;
    }
    root
}
