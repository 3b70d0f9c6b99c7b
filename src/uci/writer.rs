//! Engine command writer.
//!
//! Serialises each [`UciCommand`] to its text form, appends the `\n`
//! terminator via [`UciLineCodec`], writes the line to the engine's stdin
//! and flushes before returning. UCI is strictly request/response, so no
//! command may linger in a buffer while the caller waits for an answer.

use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;
use tracing::{debug, warn};

use crate::uci::codec::UciLineCodec;
use crate::uci::command::UciCommand;
use crate::{AppError, Result};

/// Writer half of an engine session.
#[derive(Debug)]
pub struct CommandWriter<W> {
    inner: W,
    codec: UciLineCodec,
}

impl<W> CommandWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Wrap the engine's stdin.
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            codec: UciLineCodec::new(),
        }
    }

    /// Write `command` followed by `\n` and flush.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`]`("write failed: …")` if the write or flush
    /// fails (e.g. the engine process has exited). Callers treat this as
    /// fatal to the session.
    pub async fn send(&mut self, command: &UciCommand) -> Result<()> {
        let text = command.to_string();
        let mut bytes = BytesMut::with_capacity(text.len() + 1);
        self.codec.encode(text.as_str(), &mut bytes)?;

        self.inner.write_all(&bytes).await.map_err(|err| {
            warn!(command = text.as_str(), error = %err, "write to engine stdin failed");
            AppError::Io(format!("write failed: {err}"))
        })?;
        self.inner
            .flush()
            .await
            .map_err(|err| AppError::Io(format!("flush failed: {err}")))?;

        debug!(command = text.as_str(), "sent to engine");
        Ok(())
    }

    /// Close the engine's stdin so it observes end of input.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the stream cannot be shut down cleanly.
    pub async fn close(&mut self) -> Result<()> {
        self.inner
            .shutdown()
            .await
            .map_err(|err| AppError::Io(format!("close failed: {err}")))
    }

    /// Release the underlying stream.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.inner
    }
}
