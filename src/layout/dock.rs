//! Dock bar geometry.
//!
//! The dock occupies the last terminal row:
//!
//! ```text
//! [ TERM ] 1 2 3 4 5 6 7 8 9  [ bash    ] [ htop    ]        CPU 3% RAM 41%  12:04
//!  mode    workspaces          minimized pills (slots 0..9)   stats/clock
//! ```
//!
//! Both the dock renderer and the minimize/restore animations call
//! [`dock_slot_geometry`], so a minimizing window always lands exactly where
//! its pill is drawn.

use crate::constants::{
    DOCK_HEIGHT, DOCK_MODE_WIDTH, DOCK_PILL_GAP, DOCK_PILL_WIDTH, DOCK_WORKSPACE_CELL_WIDTH,
    MAX_DOCK_SLOTS, WORKSPACE_COUNT,
};
use crate::geometry::Geometry;

/// Column positions of every dock element for a given terminal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DockLayout {
    /// Row the dock is drawn on.
    pub row: i32,
    /// Total terminal width.
    pub width: i32,
    /// First column of the mode indicator.
    pub mode_x: i32,
    /// First column of the workspace indicators.
    pub workspaces_x: i32,
    /// First column of slot 0.
    pub pills_x: i32,
}

impl DockLayout {
    /// Compute the dock layout for a terminal of the given size.
    pub fn new(term_width: u16, term_height: u16) -> Self {
        let workspaces_x = DOCK_MODE_WIDTH + 1;
        let pills_x = workspaces_x + DOCK_WORKSPACE_CELL_WIDTH * WORKSPACE_COUNT as i32 + 1;
        Self {
            row: (i32::from(term_height) - DOCK_HEIGHT).max(0),
            width: i32::from(term_width),
            mode_x: 0,
            workspaces_x,
            pills_x,
        }
    }

    /// How many pills fit on the row, at most [`MAX_DOCK_SLOTS`].
    pub fn visible_slots(&self) -> usize {
        let stride = DOCK_PILL_WIDTH + DOCK_PILL_GAP;
        let room = self.width - self.pills_x - DOCK_PILL_WIDTH;
        if room < 0 {
            return 0;
        }
        usize::try_from(room / stride + 1).map_or(0, |n| n.min(MAX_DOCK_SLOTS))
    }

    /// Geometry of the pill at `slot`.
    ///
    /// Slots that do not fit (past the cap or past the right edge) share the
    /// append position just after the last visible pill, where the overflow
    /// count is drawn. That position may extend past the edge; no pill is
    /// ever drawn there.
    pub fn slot(&self, slot: usize) -> Geometry {
        let slot = slot.min(self.visible_slots()) as i32;
        let x = self.pills_x + slot * (DOCK_PILL_WIDTH + DOCK_PILL_GAP);
        let x = x.min((self.width - 1).max(0));
        Geometry::new(x, self.row, DOCK_PILL_WIDTH, DOCK_HEIGHT)
    }

    /// Visible slot under column `col`, if any.
    pub fn slot_at(&self, col: i32) -> Option<usize> {
        (0..self.visible_slots()).find(|&i| {
            let g = self.slot(i);
            col >= g.x && col < g.right()
        })
    }

    /// Workspace indicator (1-based) under column `col`, if any.
    pub fn workspace_at(&self, col: i32) -> Option<usize> {
        if col < self.workspaces_x {
            return None;
        }
        let idx = (col - self.workspaces_x) / DOCK_WORKSPACE_CELL_WIDTH;
        let idx = usize::try_from(idx).ok()?;
        (idx < WORKSPACE_COUNT).then_some(idx + 1)
    }
}

/// Geometry of dock slot `slot` for a terminal of the given size.
pub fn dock_slot_geometry(slot: usize, term_width: u16, term_height: u16) -> Geometry {
    DockLayout::new(term_width, term_height).slot(slot)
}
