//! Terminal state guard for RAII cleanup.
//!
//! Raw mode, the alternate screen, mouse capture and bracketed paste are
//! switched on by `main` before the event loop starts. This guard switches
//! them off again however the loop ends, including by panic.

use crossterm::{
    cursor,
    event::{DisableBracketedPaste, DisableMouseCapture},
    execute,
    terminal::{disable_raw_mode, LeaveAlternateScreen},
};

/// Guard struct that ensures terminal cleanup on drop (including panics).
///
/// # Example
///
/// ```ignore
/// enable_raw_mode()?;
/// execute!(stdout(), EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
/// let _guard = TerminalGuard::new();
/// runner.run()?;
/// ```
#[derive(Debug)]
pub struct TerminalGuard;

impl TerminalGuard {
    /// Creates a new terminal guard.
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Put the terminal back into cooked mode on the main screen. Errors are
/// ignored; this also runs from the panic hook where nothing can be
/// reported.
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(
        std::io::stdout(),
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen
    );
    let _ = execute!(std::io::stdout(), cursor::Show);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_guard_creation() {
        let _guard = TerminalGuard::new();
        let _guard2 = TerminalGuard::default();
    }
}
