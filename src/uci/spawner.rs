//! Engine process spawner.
//!
//! Launches the engine with:
//! - stdin and stdout connected to dedicated pipes owned by the analyser;
//!   the child's ends are closed in the parent by the process builder, so no
//!   pipe end leaks into either process.
//! - stderr inherited or discarded, never captured.
//! - no arguments beyond the executable itself.
//! - `kill_on_drop(true)` so a session dropped mid-analysis does not leave
//!   a searching engine behind.
//!
//! Platform differences are confined to the private `platform` module: one
//! implementation for unix and one for windows, selected at build time.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{info, warn};

use crate::config::{EngineConfig, StderrMode};
use crate::{AppError, Result};

// ── Configuration ────────────────────────────────────────────────────────────

/// Configuration for spawning an engine process.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Engine executable, a path or a name resolved through `PATH`.
    pub engine: PathBuf,
    /// What happens to the engine's stderr.
    pub stderr: StderrMode,
}

impl From<&EngineConfig> for SpawnConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            engine: config.engine.clone(),
            stderr: config.stderr,
        }
    }
}

// ── Connection handle ────────────────────────────────────────────────────────

/// Stdio connection to a freshly spawned engine.
///
/// No protocol data has been exchanged yet. The streams are opened together
/// here and must be closed together by the owner.
#[derive(Debug)]
pub struct EngineConnection {
    /// Child process handle; dropping it kills the engine.
    pub child: Child,
    /// Engine's stdin, for commands.
    pub stdin: ChildStdin,
    /// Engine's stdout, for responses.
    pub stdout: ChildStdout,
}

// ── Spawner ──────────────────────────────────────────────────────────────────

/// Spawn the engine process described by `config`.
///
/// # Errors
///
/// - `AppError::LaunchFailed("failed to spawn engine …")` — pipe creation or
///   process creation failed (missing executable, permission denied, …).
/// - `AppError::LaunchFailed("failed to capture engine stdin/stdout")` — a
///   pipe end was not available; the child is killed before returning.
pub fn spawn_engine(config: &SpawnConfig) -> Result<EngineConnection> {
    let mut std_cmd = std::process::Command::new(&config.engine);
    platform::configure(&mut std_cmd);

    let mut cmd = Command::from(std_cmd);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(match config.stderr {
            StderrMode::Inherit => Stdio::inherit(),
            StderrMode::Null => Stdio::null(),
        })
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|err| {
        AppError::LaunchFailed(format!(
            "failed to spawn engine {}: {err}",
            config.engine.display()
        ))
    })?;

    // Dropping `child` on the error paths below kills it (kill_on_drop).
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| AppError::LaunchFailed("failed to capture engine stdin".into()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::LaunchFailed("failed to capture engine stdout".into()))?;

    info!(
        engine = %config.engine.display(),
        pid = child.id().unwrap_or(0),
        "engine process spawned"
    );

    Ok(EngineConnection {
        child,
        stdin,
        stdout,
    })
}

// ── Termination ──────────────────────────────────────────────────────────────

/// Stop an engine that did not exit on its own and reap it.
///
/// Asks the process to exit (`SIGTERM` on unix, a hard kill on windows),
/// waits up to `grace`, then kills it outright.
///
/// # Errors
///
/// Returns `AppError::Io` if the process cannot be waited on or killed.
pub async fn terminate(child: &mut Child, grace: Duration) -> Result<ExitStatus> {
    if let Err(err) = platform::request_exit(child) {
        warn!(error = %err, "failed to ask engine to exit");
    }

    if let Ok(waited) = tokio::time::timeout(grace, child.wait()).await {
        return waited.map_err(|err| AppError::Io(format!("wait for engine failed: {err}")));
    }

    warn!(?grace, "engine ignored termination request, killing it");
    child
        .kill()
        .await
        .map_err(|err| AppError::Io(format!("kill engine failed: {err}")))?;
    child
        .wait()
        .await
        .map_err(|err| AppError::Io(format!("wait for engine failed: {err}")))
}

// ── Platform specifics ───────────────────────────────────────────────────────

#[cfg(unix)]
mod platform {
    use std::io;
    use std::os::unix::process::CommandExt;
    use std::process::Command;

    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    use tokio::process::Child;

    /// Run the engine in its own process group so a terminal Ctrl-C reaches
    /// the analyser only; the analyser then shuts the engine down in order.
    pub(super) fn configure(cmd: &mut Command) {
        cmd.process_group(0);
    }

    pub(super) fn request_exit(child: &mut Child) -> io::Result<()> {
        // Already reaped.
        let Some(pid) = child.id() else {
            return Ok(());
        };
        let pid = i32::try_from(pid)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
        kill(Pid::from_raw(pid), Signal::SIGTERM).map_err(io::Error::from)
    }
}

#[cfg(windows)]
mod platform {
    use std::io;
    use std::os::windows::process::CommandExt;
    use std::process::Command;

    use tokio::process::Child;

    /// `CREATE_NO_WINDOW`: console engines must not pop up a window.
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    pub(super) fn configure(cmd: &mut Command) {
        cmd.creation_flags(CREATE_NO_WINDOW);
    }

    pub(super) fn request_exit(child: &mut Child) -> io::Result<()> {
        child.start_kill()
    }
}
