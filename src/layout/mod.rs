//! Pure layout functions.
//!
//! - [`tiling`] - Window count + viewport to non-overlapping rectangles
//! - [`dock`] - Dock bar slot positions shared by the renderer and the
//!   minimize/restore animations

pub mod dock;
pub mod tiling;

pub use dock::{dock_slot_geometry, DockLayout};
pub use tiling::tile_layout;
