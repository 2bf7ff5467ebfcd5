//! Application-wide constants for shelldock.
//!
//! Values that users may want to tune live in [`crate::config::Config`];
//! the constants here are structural (dock geometry, hitbox widths) or
//! defaults the config falls back to.
//!
//! # Categories
//!
//! - **Frame pacing**: Event loop intervals
//! - **Input**: Prefix timeout, double-key and drag thresholds
//! - **Dock**: Dock bar dimensions
//! - **Windows**: Minimum sizes and title bar buttons

use std::time::Duration;

// ============================================================================
// Frame pacing
// ============================================================================

/// Normal frame interval (approximately 60fps).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Frame interval while a window is being dragged or resized.
///
/// Every motion event resizes a PTY during a resize drag; halving the frame
/// rate keeps the shell from being flooded with SIGWINCH.
pub const FRAME_INTERVAL_INTERACTIVE: Duration = Duration::from_millis(33);

/// How often CPU/RAM figures on the dock are refreshed.
pub const STATS_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

// ============================================================================
// Input
// ============================================================================

/// Default prefix chord.
pub const DEFAULT_PREFIX: &str = "ctrl+b";

/// How long the prefix (and any sub-prefix) stays armed.
pub const PREFIX_TIMEOUT: Duration = Duration::from_secs(2);

/// Delay before the which-key hint appears after the prefix is pressed.
pub const WHICH_KEY_DELAY: Duration = Duration::from_millis(500);

/// Window in which a second `g` completes `gg` in copy mode.
pub const DOUBLE_KEY_WINDOW: Duration = Duration::from_millis(500);

/// Window in which consecutive clicks count as a double/triple click.
pub const MULTI_CLICK_WINDOW: Duration = Duration::from_millis(400);

/// Cells a tiled window must be dragged before release swaps it.
pub const DRAG_SWAP_THRESHOLD: i32 = 2;

/// Lines scrolled per mouse wheel notch.
pub const WHEEL_SCROLL_LINES: usize = 3;

// ============================================================================
// Dock
// ============================================================================

/// Rows reserved for the dock at the bottom of the terminal.
pub const DOCK_HEIGHT: i32 = 1;

/// Maximum number of minimized pills drawn on the dock.
pub const MAX_DOCK_SLOTS: usize = 9;

/// Width of a minimized-window pill.
pub const DOCK_PILL_WIDTH: i32 = 14;

/// Blank columns between pills.
pub const DOCK_PILL_GAP: i32 = 1;

/// Width of the mode indicator at the left edge of the dock.
pub const DOCK_MODE_WIDTH: i32 = 8;

/// Width of one workspace indicator cell.
pub const DOCK_WORKSPACE_CELL_WIDTH: i32 = 2;

/// Number of workspaces.
pub const WORKSPACE_COUNT: usize = 9;

// ============================================================================
// Windows
// ============================================================================

/// Default minimum window width (border included).
pub const MIN_WINDOW_WIDTH: i32 = 20;

/// Default minimum window height (border included).
pub const MIN_WINDOW_HEIGHT: i32 = 5;

/// Width of one title bar button hitbox (`[x]`).
pub const TITLE_BUTTON_WIDTH: i32 = 3;

/// Extra margin around the viewport within which animating windows are
/// still rendered.
pub const ANIMATION_RENDER_MARGIN: i32 = 20;

/// Default scrollback lines per window.
pub const DEFAULT_SCROLLBACK: usize = 10_000;

/// Bounded wait when killing a child process on close.
pub const CLOSE_WAIT: Duration = Duration::from_millis(200);

/// Capacity of the process-exit notification channel.
pub const EXIT_CHANNEL_CAPACITY: usize = 64;
