//! Shell resolution and PTY command construction.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use portable_pty::{native_pty_system, CommandBuilder, PtyPair, PtySize};

use super::WindowId;

/// Environment variable set in every window so scripts can tell they run
/// inside shelldock (and which window).
pub const WINDOW_ID_ENV: &str = "SHELLDOCK_WINDOW_ID";

#[cfg(unix)]
const FALLBACK_SHELLS: &[&str] = &["/bin/bash", "/usr/bin/bash", "/bin/zsh", "/bin/sh"];

#[cfg(windows)]
const FALLBACK_SHELLS: &[&str] = &["pwsh.exe", "powershell.exe", "cmd.exe"];

/// Pick the shell for a new window.
///
/// Priority: explicit configuration, then `$SHELL`, then the first fallback
/// that exists on disk, then the last fallback unconditionally.
pub fn resolve_shell(configured: Option<&str>) -> String {
    if let Some(shell) = configured.filter(|s| !s.trim().is_empty()) {
        return shell.to_string();
    }

    if let Ok(shell) = std::env::var("SHELL") {
        if !shell.trim().is_empty() {
            return shell;
        }
    }

    FALLBACK_SHELLS
        .iter()
        .find(|candidate| {
            let path = Path::new(candidate);
            !path.is_absolute() || path.exists()
        })
        .or_else(|| FALLBACK_SHELLS.last())
        .map_or_else(|| "sh".to_string(), |s| (*s).to_string())
}

/// Open a new PTY pair with the given dimensions.
pub fn open_pty(rows: u16, cols: u16) -> Result<PtyPair> {
    let pty_system = native_pty_system();
    let size = PtySize {
        rows,
        cols,
        pixel_width: 0,
        pixel_height: 0,
    };
    pty_system.openpty(size).context("Failed to open PTY")
}

/// Build the command for a window's shell.
///
/// The shell string may carry arguments (`"zsh -l"`).
pub fn build_command(shell: &str, cwd: Option<&Path>, window_id: &WindowId) -> CommandBuilder {
    let mut parts = shell.split_whitespace();
    let program = parts.next().unwrap_or("sh");
    let mut cmd = CommandBuilder::new(program);
    for arg in parts {
        cmd.arg(arg);
    }

    let cwd = cwd
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("/"));
    cmd.cwd(cwd);

    cmd.env("TERM", "xterm-256color");
    cmd.env("COLORTERM", "truecolor");
    cmd.env(WINDOW_ID_ENV, window_id.as_str());
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_shell_wins() {
        assert_eq!(resolve_shell(Some("/opt/fish")), "/opt/fish");
    }

    #[test]
    fn test_blank_configured_shell_ignored() {
        let shell = resolve_shell(Some("   "));
        assert!(!shell.trim().is_empty());
    }

    #[test]
    fn test_build_command_sets_environment() {
        let id = WindowId::from("abc");
        let cmd = build_command("bash -l", Some(Path::new("/tmp")), &id);
        let argv: Vec<String> = cmd
            .get_argv()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(argv, vec!["bash", "-l"]);
        assert_eq!(
            cmd.get_env(WINDOW_ID_ENV).map(|v| v.to_string_lossy().into_owned()),
            Some("abc".to_string())
        );
        assert_eq!(
            cmd.get_env("TERM").map(|v| v.to_string_lossy().into_owned()),
            Some("xterm-256color".to_string())
        );
    }
}
