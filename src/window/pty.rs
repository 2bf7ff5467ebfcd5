//! PTY session lifecycle for one window.
//!
//! A [`PtySession`] owns the PTY master, the child killer and three
//! background threads:
//!
//! ```text
//!              ┌──────────── reader ─────────────┐
//!  PTY master ─┤ read → SharedTerminal::process  ├─ replies ─┐
//!              └─────────────────────────────────┘           │
//!              ┌──────────── writer ─────────────┐           │
//!  PTY master ◄┤ recv (input + replies) → write  │◄──────────┘
//!              └─────────────────────────────────┘
//!              ┌────────── supervisor ───────────┐
//!  child      ─┤ wait → exited flag → try_send   ├─► ProcessExit channel
//!              └─────────────────────────────────┘
//! ```
//!
//! The threads never touch window or manager state. They write into the
//! window's [`SharedTerminal`], set atomic flags, and send a bounded
//! exit notification. Closing cancels the session's
//! [`CancellationToken`], kills the child and drops the master; the reader
//! unblocks once the slave side closes.

// Rust guideline compliant 2026-02

use std::io::{ErrorKind, Read, Write};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use portable_pty::{Child, ChildKiller, MasterPty, PtySize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::shell::{build_command, open_pty, resolve_shell};
use super::terminal::SharedTerminal;
use super::WindowId;
use crate::constants::CLOSE_WAIT;

/// How often the writer thread re-checks cancellation while idle.
const WRITER_POLL: Duration = Duration::from_millis(50);

/// Sent by a session's supervisor when its child process exits on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    /// Window whose process exited.
    pub window_id: WindowId,
    /// Exit code, if the platform reported one.
    pub exit_code: Option<u32>,
}

/// Everything a spawner needs to start a session for a window.
#[derive(Debug)]
pub struct SpawnRequest {
    /// Window the session belongs to.
    pub window_id: WindowId,
    /// Initial content rows.
    pub rows: u16,
    /// Initial content columns.
    pub cols: u16,
    /// Emulator the reader thread feeds.
    pub terminal: Arc<SharedTerminal>,
    /// Exit notification channel.
    pub exit_tx: mpsc::Sender<ProcessExit>,
}

/// Starts sessions for new windows.
///
/// The window manager only sees this trait, so tests run against
/// [`DetachedSpawner`] without opening real PTYs.
pub trait SessionSpawner: std::fmt::Debug {
    /// Start a session. Errors leave no window behind.
    fn spawn(&self, request: SpawnRequest) -> Result<PtySession>;
}

/// Spawns the user's shell in a real PTY.
#[derive(Debug, Clone, Default)]
pub struct ShellSpawner {
    shell: Option<String>,
    cwd: Option<std::path::PathBuf>,
}

impl ShellSpawner {
    /// Create a spawner. `shell` overrides `$SHELL`.
    pub fn new(shell: Option<String>) -> Self {
        Self { shell, cwd: None }
    }

    /// Start shells in `cwd` instead of the current directory.
    pub fn with_cwd(mut self, cwd: impl Into<std::path::PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

impl SessionSpawner for ShellSpawner {
    fn spawn(&self, request: SpawnRequest) -> Result<PtySession> {
        let shell = resolve_shell(self.shell.as_deref());
        let pair = open_pty(request.rows, request.cols)?;
        let cmd = build_command(&shell, self.cwd.as_deref(), &request.window_id);
        let child = pair
            .slave
            .spawn_command(cmd)
            .with_context(|| format!("Failed to spawn {shell}"))?;
        // The slave must be released here or the reader never sees EOF.
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .context("Failed to clone PTY reader")?;
        let writer = pair.master.take_writer().context("Failed to take PTY writer")?;

        log::info!(
            "Spawned {shell} (pid {:?}) for window {}",
            child.process_id(),
            request.window_id.short()
        );
        PtySession::start(request, pair.master, child, reader, writer)
    }
}

/// Spawner that starts no process. Input written to its sessions is
/// captured in memory.
#[derive(Debug, Clone, Default)]
pub struct DetachedSpawner {
    fail: bool,
}

impl DetachedSpawner {
    /// A spawner whose every spawn fails, for exercising error paths.
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl SessionSpawner for DetachedSpawner {
    fn spawn(&self, request: SpawnRequest) -> Result<PtySession> {
        if self.fail {
            anyhow::bail!("spawning disabled");
        }
        Ok(PtySession::detached(request.window_id, request.terminal))
    }
}

/// Where input bytes go.
enum InputSink {
    /// Writer thread channel.
    Thread(std_mpsc::Sender<Vec<u8>>),
    /// In-memory capture for detached sessions.
    Capture(Arc<Mutex<Vec<u8>>>),
    /// Closed; writes fail.
    Closed,
}

/// A running (or detached) shell session.
pub struct PtySession {
    window_id: WindowId,
    terminal: Arc<SharedTerminal>,
    master: Option<Box<dyn MasterPty + Send>>,
    killer: Option<Box<dyn ChildKiller + Send + Sync>>,
    pid: Option<u32>,
    input: InputSink,
    cancel: CancellationToken,
    exited: Arc<AtomicBool>,
    io_failed: Arc<AtomicBool>,
    closed: bool,
}

impl std::fmt::Debug for PtySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtySession")
            .field("window_id", &self.window_id)
            .field("pid", &self.pid)
            .field("has_master", &self.master.is_some())
            .field("exited", &self.has_exited())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl PtySession {
    /// A session with no process behind it. Input is captured and
    /// retrievable with [`captured_input`](Self::captured_input).
    pub fn detached(window_id: WindowId, terminal: Arc<SharedTerminal>) -> Self {
        Self {
            window_id,
            terminal,
            master: None,
            killer: None,
            pid: None,
            input: InputSink::Capture(Arc::new(Mutex::new(Vec::new()))),
            cancel: CancellationToken::new(),
            exited: Arc::new(AtomicBool::new(false)),
            io_failed: Arc::new(AtomicBool::new(false)),
            closed: false,
        }
    }

    /// Start the reader, writer and supervisor threads for a spawned child.
    pub fn start(
        request: SpawnRequest,
        master: Box<dyn MasterPty + Send>,
        child: Box<dyn Child + Send + Sync>,
        reader: Box<dyn Read + Send>,
        writer: Box<dyn Write + Send>,
    ) -> Result<Self> {
        let SpawnRequest {
            window_id,
            terminal,
            exit_tx,
            ..
        } = request;

        let cancel = CancellationToken::new();
        let exited = Arc::new(AtomicBool::new(false));
        let io_failed = Arc::new(AtomicBool::new(false));
        let (input_tx, input_rx) = std_mpsc::channel::<Vec<u8>>();
        let killer = child.clone_killer();
        let pid = child.process_id();
        let tag = window_id.short().to_string();

        spawn_guarded(&format!("pty-writer-{tag}"), {
            let cancel = cancel.clone();
            let io_failed = Arc::clone(&io_failed);
            move || run_writer(writer, &input_rx, &cancel, &io_failed)
        })?;

        spawn_guarded(&format!("pty-reader-{tag}"), {
            let terminal = Arc::clone(&terminal);
            let cancel = cancel.clone();
            let io_failed = Arc::clone(&io_failed);
            let replies = input_tx.clone();
            move || run_reader(reader, &terminal, &replies, &cancel, &io_failed)
        })?;

        spawn_guarded(&format!("pty-supervisor-{tag}"), {
            let cancel = cancel.clone();
            let exited = Arc::clone(&exited);
            let window_id = window_id.clone();
            move || run_supervisor(child, window_id, &exited, &cancel, &exit_tx)
        })?;

        Ok(Self {
            window_id,
            terminal,
            master: Some(master),
            killer: Some(killer),
            pid,
            input: InputSink::Thread(input_tx),
            cancel,
            exited,
            io_failed,
            closed: false,
        })
    }

    /// Child process id, if a process was spawned.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Whether the child has exited.
    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    /// Whether a read or write on the PTY failed while the session was live.
    pub fn has_io_failed(&self) -> bool {
        self.io_failed.load(Ordering::Acquire)
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Queue bytes for the child's stdin.
    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        match &self.input {
            InputSink::Thread(tx) => tx
                .send(bytes.to_vec())
                .map_err(|e| anyhow::anyhow!("PTY writer for window {} is gone: {e}", self.window_id.short())),
            InputSink::Capture(buf) => {
                buf.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend_from_slice(bytes);
                Ok(())
            }
            InputSink::Closed => anyhow::bail!("window {} is closed", self.window_id.short()),
        }
    }

    /// Input captured by a detached session (empty for real sessions).
    pub fn captured_input(&self) -> Vec<u8> {
        match &self.input {
            InputSink::Capture(buf) => buf.lock().unwrap_or_else(PoisonError::into_inner).clone(),
            _ => Vec::new(),
        }
    }

    /// Resize the emulator, then the PTY.
    ///
    /// The emulator goes first so output the program redraws for the new
    /// size is parsed against the right grid. If the PTY refuses the new size
    /// the emulator is reverted. Returns `true` when the size changed.
    pub fn resize(&mut self, rows: u16, cols: u16) -> Result<bool> {
        let old = self.terminal.size();
        if !self.terminal.resize(rows, cols) {
            return Ok(false);
        }

        if let Some(master) = &self.master {
            let size = PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            };
            if let Err(e) = master.resize(size) {
                self.terminal.resize(old.0, old.1);
                return Err(e).context("Failed to resize PTY");
            }
            self.signal_winch();
        }
        Ok(true)
    }

    #[cfg(unix)]
    fn signal_winch(&self) {
        let Some(pid) = self.pid.and_then(|p| libc::pid_t::try_from(p).ok()) else {
            return;
        };
        // SAFETY: kill(2) with a valid signal number has no memory-safety
        // preconditions; a stale pid only yields ESRCH.
        let rc = unsafe { libc::kill(pid, libc::SIGWINCH) };
        if rc != 0 {
            log::debug!("SIGWINCH to {pid} failed: {}", std::io::Error::last_os_error());
        }
    }

    #[cfg(not(unix))]
    fn signal_winch(&self) {}

    /// Stop the session. Safe to call any number of times, including on a
    /// detached session.
    ///
    /// Cancels the pumps, kills the child, releases the PTY master and waits
    /// up to [`CLOSE_WAIT`] for the supervisor to observe the exit.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.cancel.cancel();
        self.input = InputSink::Closed;

        if let Some(mut killer) = self.killer.take() {
            if !self.has_exited() {
                if let Err(e) = killer.kill() {
                    log::debug!("Kill for window {} failed: {e}", self.window_id.short());
                }
            }
        }
        drop(self.master.take());

        if self.pid.is_some() {
            let deadline = Instant::now() + CLOSE_WAIT;
            while !self.has_exited() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(5));
            }
            if !self.has_exited() {
                log::warn!(
                    "Window {} child did not exit within {:?}",
                    self.window_id.short(),
                    CLOSE_WAIT
                );
            }
        }
        log::info!("Closed session for window {}", self.window_id.short());
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// Thread bodies
// ============================================================================

/// Spawn a named thread whose body cannot unwind past its boundary.
fn spawn_guarded<F>(name: &str, body: F) -> Result<()>
where
    F: FnOnce() + Send + 'static,
{
    let label = name.to_string();
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            if catch_unwind(AssertUnwindSafe(body)).is_err() {
                log::error!("{label} thread panicked");
            }
        })
        .with_context(|| format!("Failed to start {name} thread"))?;
    Ok(())
}

fn run_reader(
    mut reader: Box<dyn Read + Send>,
    terminal: &SharedTerminal,
    replies: &std_mpsc::Sender<Vec<u8>>,
    cancel: &CancellationToken,
    io_failed: &AtomicBool,
) {
    let mut buf = [0u8; 4096];
    loop {
        if cancel.is_cancelled() {
            break;
        }
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                let reply = terminal.process(&buf[..n]);
                if !reply.is_empty() {
                    if let Err(e) = replies.send(reply) {
                        log::debug!("Dropped terminal reply, writer is gone: {e}");
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                // EIO is how Linux reports the slave side closing.
                if !cancel.is_cancelled() && !is_hangup(&e) {
                    log::error!("PTY read error: {e}");
                    io_failed.store(true, Ordering::Release);
                }
                break;
            }
        }
    }
    log::debug!("PTY reader exiting");
}

#[cfg(unix)]
fn is_hangup(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(libc::EIO)
}

#[cfg(not(unix))]
fn is_hangup(e: &std::io::Error) -> bool {
    e.kind() == ErrorKind::BrokenPipe
}

fn run_writer(
    mut writer: Box<dyn Write + Send>,
    input: &std_mpsc::Receiver<Vec<u8>>,
    cancel: &CancellationToken,
    io_failed: &AtomicBool,
) {
    loop {
        if cancel.is_cancelled() {
            break;
        }
        match input.recv_timeout(WRITER_POLL) {
            Ok(bytes) => {
                if let Err(e) = writer.write_all(&bytes).and_then(|()| writer.flush()) {
                    if !cancel.is_cancelled() {
                        log::error!("PTY write error: {e}");
                        io_failed.store(true, Ordering::Release);
                    }
                    break;
                }
            }
            Err(std_mpsc::RecvTimeoutError::Timeout) => continue,
            Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    log::debug!("PTY writer exiting");
}

fn run_supervisor(
    mut child: Box<dyn Child + Send + Sync>,
    window_id: WindowId,
    exited: &AtomicBool,
    cancel: &CancellationToken,
    exit_tx: &mpsc::Sender<ProcessExit>,
) {
    let status = child.wait();
    exited.store(true, Ordering::Release);
    let exit_code = match status {
        Ok(status) => Some(status.exit_code()),
        Err(e) => {
            log::warn!("Waiting on window {} child failed: {e}", window_id.short());
            None
        }
    };
    log::info!("Window {} process exited ({exit_code:?})", window_id.short());

    if cancel.is_cancelled() {
        return;
    }
    if let Err(e) = exit_tx.try_send(ProcessExit {
        window_id,
        exit_code,
    }) {
        log::warn!("Dropped exit notification: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached() -> PtySession {
        PtySession::detached(
            WindowId::from("w-test"),
            Arc::new(SharedTerminal::new(24, 80, 100)),
        )
    }

    #[test]
    fn test_detached_captures_input() {
        let session = detached();
        session.write(b"ls\r").unwrap();
        session.write(b"").unwrap();
        assert_eq!(session.captured_input(), b"ls\r");
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut session = detached();
        session.close();
        session.close();
        assert!(session.is_closed());
        assert!(session.write(b"x").is_err());
    }

    #[test]
    fn test_detached_resize_updates_terminal() {
        let mut session = detached();
        assert!(session.resize(10, 40).unwrap());
        assert!(!session.resize(10, 40).unwrap());
        assert_eq!(session.terminal.size(), (10, 40));
    }

    #[test]
    fn test_failing_spawner() {
        let (tx, _rx) = mpsc::channel(1);
        let request = SpawnRequest {
            window_id: WindowId::from("x"),
            rows: 10,
            cols: 10,
            terminal: Arc::new(SharedTerminal::new(10, 10, 10)),
            exit_tx: tx,
        };
        assert!(DetachedSpawner::failing().spawn(request).is_err());
    }

    /// Reader that yields one chunk then EOF.
    struct OneShot(Option<Vec<u8>>);

    impl Read for OneShot {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.0.take() {
                Some(data) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(data.len())
                }
                None => Ok(0),
            }
        }
    }

    #[test]
    fn test_reader_feeds_terminal_and_forwards_replies() {
        let terminal = SharedTerminal::new(24, 80, 100);
        let (tx, rx) = std_mpsc::channel();
        let failed = AtomicBool::new(false);
        run_reader(
            Box::new(OneShot(Some(b"hi\x1b[6n".to_vec()))),
            &terminal,
            &tx,
            &CancellationToken::new(),
            &failed,
        );
        assert!(terminal.read().screen().contents().contains("hi"));
        assert_eq!(rx.try_recv().unwrap(), b"\x1b[1;3R");
        assert!(!failed.load(Ordering::Acquire));
    }

    /// Writer that always fails.
    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::Other, "boom"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writer_failure_sets_flag() {
        let (tx, rx) = std_mpsc::channel();
        tx.send(b"data".to_vec()).unwrap();
        let failed = AtomicBool::new(false);
        run_writer(Box::new(Broken), &rx, &CancellationToken::new(), &failed);
        assert!(failed.load(Ordering::Acquire));
    }

    #[test]
    fn test_writer_stops_on_cancel() {
        let (_tx, rx) = std_mpsc::channel::<Vec<u8>>();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let failed = AtomicBool::new(false);
        run_writer(Box::new(Vec::new()), &rx, &cancel, &failed);
        assert!(!failed.load(Ordering::Acquire));
    }
}
