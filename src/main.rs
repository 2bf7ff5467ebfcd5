//! Shelldock - terminal window manager.
//!
//! This is the main binary entry point. See the `shelldock` library for
//! the core functionality.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{enable_raw_mode, EnterAlternateScreen},
};
use mimalloc::MiMalloc;
use ratatui::{backend::CrosstermBackend, Terminal};
use shelldock::{clipboard::Clipboard, logging, tui, window::ShellSpawner, Config, WindowManager};

/// Global allocator configured per M-MIMALLOC-APPS guideline.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Global flag for signal-triggered shutdown (as Arc for signal-hook compatibility)
static SHUTDOWN_FLAG: std::sync::LazyLock<Arc<AtomicBool>> =
    std::sync::LazyLock::new(|| Arc::new(AtomicBool::new(false)));

#[derive(Parser, Debug)]
#[command(name = "shelldock", version, about = "Terminal window manager")]
struct Cli {
    /// Shell to run in new windows (default: $SHELL)
    #[arg(long)]
    shell: Option<String>,

    /// Start with automatic tiling
    #[arg(long)]
    tiling: bool,

    /// Disable window animations
    #[arg(long)]
    no_animations: bool,

    /// Prefix chord, e.g. "ctrl+a"
    #[arg(long)]
    prefix: Option<String>,

    /// Read configuration from this file instead of the config directory
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Flags override the file and the environment.
    fn apply(&self, config: &mut Config) {
        if let Some(shell) = &self.shell {
            config.shell = Some(shell.clone());
        }
        if self.tiling {
            config.tiling = true;
        }
        if self.no_animations {
            config.animations = false;
        }
        if let Some(prefix) = &self.prefix {
            config.prefix.clone_from(prefix);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_file(path)?,
        None => Config::load(),
    };
    cli.apply(&mut config);

    // Log to a file so log lines never land on the TUI
    let log_buffer = logging::init(config.log_buffer_lines)?;

    // Set up panic hook to log panics and ensure terminal cleanup
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        log::error!("PANIC: {panic_info}");
        tui::restore_terminal();
        default_hook(panic_info);
    }));

    use signal_hook::consts::signal::{SIGHUP, SIGTERM};
    use signal_hook::flag;
    flag::register(SIGTERM, Arc::clone(&SHUTDOWN_FLAG))?;
    flag::register(SIGHUP, Arc::clone(&SHUTDOWN_FLAG))?;

    let (cols, rows) = crossterm::terminal::size()?;
    let spawner = ShellSpawner::new(config.shell.clone());
    let mut wm = WindowManager::new(config, Box::new(spawner), (cols, rows))
        .with_clipboard(Clipboard::detect())
        .with_log_buffer(log_buffer);

    log::info!("Shelldock v{} starting on a {cols}x{rows} terminal", env!("CARGO_PKG_VERSION"));

    // Setup terminal after everything that could fail with a readable error
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let _terminal_guard = tui::TerminalGuard::new();

    wm.add_window(None, Instant::now());

    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    let mut runner = tui::Runner::new(terminal, wm, Arc::clone(&SHUTDOWN_FLAG));
    runner.run(&mut tui::CrosstermEvents)?;

    Ok(())
}
