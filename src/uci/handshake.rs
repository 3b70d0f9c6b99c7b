//! UCI handshake waits.
//!
//! After `uci` is sent the engine prints its identity, its option list and
//! finally `uciok`; after `isready` it eventually prints `readyok`. Both
//! waits read line after line and silently discard everything that is not
//! the expected sentinel:
//!
//! 1. **`identify`** — reads until a line starts with `id name ` and returns
//!    the rest of that line.
//! 2. **`wait_for`** — reads until a line is exactly equal to a sentinel
//!    such as `uciok` or `readyok`.
//!
//! Both take an optional timeout; `None` waits as long as the engine keeps
//! its stdout open. `check_is_ready` on the session deliberately does not
//! use these loops: it inspects only the very next line.

use std::time::Duration;

use tokio::io::AsyncRead;
use tracing::debug;

use crate::uci::reader::{Deadline, Line, LineReader};
use crate::{AppError, Result};

/// Prefix of the line carrying the engine's name.
pub const ID_NAME_PREFIX: &str = "id name ";

/// Sentinel ending the handshake.
pub const UCI_OK: &str = "uciok";

/// Sentinel answering `isready`.
pub const READY_OK: &str = "readyok";

/// Read lines until one starts with [`ID_NAME_PREFIX`] and return the rest
/// of it as the engine's identity.
///
/// # Errors
///
/// - `AppError::IdentityNotFound("no \"id name\" line before end of stream")`
///   — the engine closed its stdout first.
/// - `AppError::Timeout` — `timeout` elapsed first.
/// - `AppError::Io` / `AppError::Protocol` — read failure.
pub async fn identify<R>(reader: &mut LineReader<R>, timeout: Option<Duration>) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let deadline = Deadline::after(timeout);

    loop {
        match reader.read_line_before(deadline, "id name").await? {
            Line::Text(line) => {
                if let Some(identity) = line.strip_prefix(ID_NAME_PREFIX) {
                    return Ok(identity.to_owned());
                }
                debug!(line = line.as_str(), "handshake: skipping line before 'id name'");
            }
            Line::Eof(_) => {
                return Err(AppError::IdentityNotFound(
                    "no \"id name\" line before end of stream".into(),
                ));
            }
        }
    }
}

/// Read lines until one is exactly `sentinel`.
///
/// End of stream is reported through `on_eof`, which receives a message
/// naming the missing sentinel, so each phase can surface its own error
/// kind (e.g. `AppError::HandshakeIncomplete` for `uciok`).
///
/// # Errors
///
/// - `on_eof(…)` — the engine closed its stdout first.
/// - `AppError::Timeout` — `timeout` elapsed first.
/// - `AppError::Io` / `AppError::Protocol` — read failure.
pub async fn wait_for<R>(
    reader: &mut LineReader<R>,
    sentinel: &str,
    timeout: Option<Duration>,
    on_eof: fn(String) -> AppError,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let deadline = Deadline::after(timeout);

    loop {
        match reader.read_line_before(deadline, sentinel).await? {
            Line::Text(line) if line == sentinel => {
                debug!(sentinel, "handshake: sentinel received");
                return Ok(());
            }
            Line::Text(line) => {
                debug!(
                    sentinel,
                    line = line.as_str(),
                    "handshake: skipping line before sentinel"
                );
            }
            Line::Eof(_) => {
                return Err(on_eof(format!(
                    "no \"{sentinel}\" line before end of stream"
                )));
            }
        }
    }
}
