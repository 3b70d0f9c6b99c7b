//! UCI engine session.
//!
//! An [`EngineSession`] owns one engine process, the command writer on its
//! stdin and the line reader on its stdout. Its lifecycle:
//!
//! ```text
//! start ──▶ Launched ──uci/id name──▶ Identified ──uciok──▶ Ready
//!                                                            │ position / go
//!                                                            ▼
//!                       Terminated ◀──────── quit ──────── Active
//! ```
//!
//! Every operation takes `&mut self`: one session is driven by one task at
//! a time. Concurrent analyses need one session (process, streams, buffer)
//! per engine.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::process::ExitStatus;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tracing::{debug, info, warn};

use crate::uci::command::UciCommand;
use crate::uci::handshake::{self, READY_OK, UCI_OK};
use crate::uci::reader::{Deadline, Line, LineReader};
use crate::uci::spawner::{self, SpawnConfig};
use crate::uci::writer::CommandWriter;
use crate::{AppError, Result};

/// Default command announcing a new game.
pub const DEFAULT_NEW_GAME_COMMAND: &str = "ucinewgame";

/// Lifecycle state of an [`EngineSession`].
///
/// A launch that fails produces no session at all, so there is no
/// "unstarted" value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Process running, nothing exchanged yet.
    Launched,
    /// `id name` received.
    Identified,
    /// `uciok` received.
    Ready,
    /// At least one position or search command sent.
    Active,
    /// `quit` sent; no further I/O is performed.
    Terminated,
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Launched => "launched",
            Self::Identified => "identified",
            Self::Ready => "ready",
            Self::Active => "active",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Session with one UCI engine.
#[derive(Debug)]
pub struct EngineSession<W = ChildStdin, R = ChildStdout> {
    /// Label used in logs (the engine path for spawned engines).
    engine: String,
    child: Option<Child>,
    writer: CommandWriter<W>,
    reader: LineReader<R>,
    state: SessionState,
    /// Set when the configure phase finished with `readyok`.
    configured: bool,
    identity: Option<String>,
    search_depth: u32,
    variations: u32,
    new_game_command: String,
    response_timeout: Option<Duration>,
}

impl EngineSession {
    /// Spawn the engine and wrap its stdio in a new session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::LaunchFailed` if the process cannot be started; no
    /// session or open stream is left behind.
    pub fn start(config: &SpawnConfig) -> Result<Self> {
        let connection = spawner::spawn_engine(config)?;
        let mut session = Self::from_streams(
            config.engine.display().to_string(),
            connection.stdin,
            connection.stdout,
        );
        session.child = Some(connection.child);
        Ok(session)
    }
}

impl<W, R> EngineSession<W, R>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    /// Build a session over already-open streams in the `Launched` state.
    ///
    /// Used for engines reached through something other than a child
    /// process (and for scripted engines in tests).
    #[must_use]
    pub fn from_streams(engine: impl Into<String>, writer: W, reader: R) -> Self {
        Self {
            engine: engine.into(),
            child: None,
            writer: CommandWriter::new(writer),
            reader: LineReader::new(reader),
            state: SessionState::Launched,
            configured: false,
            identity: None,
            search_depth: 0,
            variations: 0,
            new_game_command: DEFAULT_NEW_GAME_COMMAND.to_owned(),
            response_timeout: None,
        }
    }

    /// Bound every wait for an engine response; `None` waits indefinitely.
    #[must_use]
    pub fn with_response_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Replace the command sent to announce a new game.
    #[must_use]
    pub fn with_new_game_command(mut self, command: impl Into<String>) -> Self {
        self.new_game_command = command.into();
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Engine name from the handshake, once identified.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Depth used by every search, 0 before [`init`](Self::init).
    #[must_use]
    pub fn search_depth(&self) -> u32 {
        self.search_depth
    }

    /// `MultiPV` value, 0 before [`init`](Self::init).
    #[must_use]
    pub fn variations(&self) -> u32 {
        self.variations
    }

    /// OS process id of a spawned engine that has not been reaped.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Perform the handshake and configure the engine for analysis.
    ///
    /// Sends `uci`, captures the `id name` identity, waits for `uciok`, then
    /// sets `UCI_AnalyseMode`, `MultiPV` and every entry of `options` (in
    /// name order), announces a new game and waits for `readyok`.
    ///
    /// On any error the session must be discarded; it never accepts
    /// position or search commands.
    ///
    /// # Errors
    ///
    /// - `AppError::Config` — `search_depth` or `variations` is zero.
    /// - `AppError::InvalidState` — the session is not freshly launched.
    /// - `AppError::IdentityNotFound` — no `id name` line before end of stream.
    /// - `AppError::HandshakeIncomplete` — no `uciok` before end of stream.
    /// - `AppError::InitializationFailed` — no `readyok` before end of stream.
    /// - `AppError::Timeout` — a configured response timeout elapsed.
    /// - `AppError::Io` — the engine's streams failed.
    pub async fn init(
        &mut self,
        search_depth: u32,
        variations: u32,
        options: &BTreeMap<String, String>,
    ) -> Result<()> {
        if search_depth == 0 || variations == 0 {
            return Err(AppError::Config(
                "search depth and variations must be greater than zero".into(),
            ));
        }
        self.expect_state(&[SessionState::Launched], "init")?;

        self.search_depth = search_depth;
        self.variations = variations;

        self.writer.send(&UciCommand::Uci).await?;
        let identity = handshake::identify(&mut self.reader, self.response_timeout).await?;
        info!(
            engine = self.engine.as_str(),
            identity = identity.as_str(),
            "engine identified"
        );
        self.identity = Some(identity);
        self.state = SessionState::Identified;

        handshake::wait_for(
            &mut self.reader,
            UCI_OK,
            self.response_timeout,
            AppError::HandshakeIncomplete,
        )
        .await?;
        self.state = SessionState::Ready;

        self.writer
            .send(&UciCommand::set_option("UCI_AnalyseMode", true))
            .await?;
        self.writer
            .send(&UciCommand::set_option("MultiPV", variations))
            .await?;
        for (name, value) in options {
            self.writer
                .send(&UciCommand::set_option(name.as_str(), value))
                .await?;
        }

        self.writer
            .send(&UciCommand::NewGame(self.new_game_command.clone()))
            .await?;
        self.writer.send(&UciCommand::IsReady).await?;
        handshake::wait_for(
            &mut self.reader,
            READY_OK,
            self.response_timeout,
            AppError::InitializationFailed,
        )
        .await?;
        self.configured = true;

        info!(
            engine = self.engine.as_str(),
            search_depth,
            variations,
            options = options.len(),
            "engine ready"
        );
        Ok(())
    }

    /// Set the position to analyse.
    ///
    /// An empty or absent `fen` selects the standard start position. No
    /// response is expected.
    ///
    /// # Errors
    ///
    /// - `AppError::InvalidState` — the session is not initialized or has
    ///   been terminated.
    /// - `AppError::Io` — the write failed.
    pub async fn set_position(&mut self, moves: &str, fen: Option<&str>) -> Result<()> {
        self.send_active(&UciCommand::position(moves, fen), "set_position")
            .await
    }

    /// Start a fixed-depth search at the session's search depth.
    ///
    /// The search output is not consumed here; read it with
    /// [`next_line`](Self::next_line).
    ///
    /// # Errors
    ///
    /// Same as [`set_position`](Self::set_position).
    pub async fn go(&mut self) -> Result<()> {
        let command = UciCommand::Go {
            depth: self.search_depth,
            search_moves: None,
        };
        self.send_active(&command, "go").await
    }

    /// Start a fixed-depth search restricted to the space-separated `moves`.
    ///
    /// # Errors
    ///
    /// Same as [`set_position`](Self::set_position).
    pub async fn search_moves(&mut self, moves: &str) -> Result<()> {
        let command = UciCommand::Go {
            depth: self.search_depth,
            search_moves: Some(moves.to_owned()),
        };
        self.send_active(&command, "search_moves").await
    }

    /// Send `isready` and report whether the very next line is `readyok`.
    ///
    /// Unlike the handshake waits this does not skip other output: any
    /// other line, or end of stream, yields `false`. Search output still in
    /// flight therefore makes the check fail.
    ///
    /// # Errors
    ///
    /// - `AppError::InvalidState` — the session is not initialized or has
    ///   been terminated.
    /// - `AppError::Timeout` — a configured response timeout elapsed.
    /// - `AppError::Io` — the engine's streams failed.
    pub async fn check_is_ready(&mut self) -> Result<bool> {
        self.send_active(&UciCommand::IsReady, "check_is_ready")
            .await?;

        let deadline = Deadline::after(self.response_timeout);
        match self.reader.read_line_before(deadline, READY_OK).await? {
            Line::Text(line) => {
                let ready = line == READY_OK;
                if !ready {
                    debug!(line = line.as_str(), "isready answered with another line");
                }
                Ok(ready)
            }
            Line::Eof(_) => {
                warn!(engine = self.engine.as_str(), "engine closed stdout after isready");
                Ok(false)
            }
        }
    }

    /// Next raw line of engine output, for callers consuming search output.
    ///
    /// The line is returned as-is; the session does not interpret it.
    ///
    /// # Errors
    ///
    /// - `AppError::InvalidState` — the session is not initialized or has
    ///   been terminated.
    /// - `AppError::UnexpectedEof` — the engine closed its stdout.
    /// - `AppError::Io` / `AppError::Protocol` — read failure.
    pub async fn next_line(&mut self) -> Result<String> {
        self.expect_initialized("next_line")?;

        match self.reader.read_line().await? {
            Line::Text(line) => Ok(line),
            Line::Eof(partial) => Err(AppError::UnexpectedEof(format!(
                "engine closed stdout while output was expected (partial line: {partial:?})"
            ))),
        }
    }

    /// Send `quit` and enter `Terminated`.
    ///
    /// Calling it again is a no-op with no I/O. The state changes even when
    /// the write fails because the engine has already gone.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if `quit` could not be written.
    pub async fn quit(&mut self) -> Result<()> {
        if self.state == SessionState::Terminated {
            debug!(engine = self.engine.as_str(), "quit: session already terminated");
            return Ok(());
        }

        self.state = SessionState::Terminated;
        self.writer.send(&UciCommand::Quit).await
    }

    /// End the session and release every resource it owns.
    ///
    /// Sends `quit` unless already terminated, closes stdin and stdout
    /// together, then waits up to `grace` for the engine to exit before
    /// terminating it. Returns the exit status of a spawned engine, or
    /// `None` for sessions built from plain streams.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the engine process cannot be reaped.
    pub async fn shutdown(mut self, grace: Duration) -> Result<Option<ExitStatus>> {
        if let Err(err) = self.quit().await {
            warn!(engine = self.engine.as_str(), error = %err, "quit failed during shutdown");
        }

        let Self {
            engine,
            child,
            mut writer,
            reader,
            ..
        } = self;

        if let Err(err) = writer.close().await {
            debug!(engine = engine.as_str(), error = %err, "engine stdin already closed");
        }
        drop(writer);
        drop(reader);

        let Some(mut child) = child else {
            return Ok(None);
        };

        let status = match tokio::time::timeout(grace, child.wait()).await {
            Ok(waited) => {
                waited.map_err(|err| AppError::Io(format!("wait for engine failed: {err}")))?
            }
            Err(_) => spawner::terminate(&mut child, grace).await?,
        };

        info!(engine = engine.as_str(), %status, "engine exited");
        Ok(Some(status))
    }

    // ── Private helpers ──────────────────────────────────────────────────────

    async fn send_active(&mut self, command: &UciCommand, operation: &str) -> Result<()> {
        self.expect_initialized(operation)?;
        self.writer.send(command).await?;
        self.state = SessionState::Active;
        Ok(())
    }

    fn expect_initialized(&self, operation: &str) -> Result<()> {
        self.expect_state(&[SessionState::Ready, SessionState::Active], operation)?;
        if self.configured {
            Ok(())
        } else {
            Err(AppError::InvalidState(format!(
                "{operation} requires a fully initialized session"
            )))
        }
    }

    fn expect_state(&self, allowed: &[SessionState], operation: &str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(AppError::InvalidState(format!(
                "{operation} not allowed while session is {}",
                self.state
            )))
        }
    }
}
