//! Engine output reader.
//!
//! [`LineReader`] turns the raw bytes of an engine's stdout into logical
//! lines using [`UciLineCodec`]. Bytes read past a line boundary stay in the
//! reader's own pending buffer and are served before the stream is read
//! again, so every session must own its reader; two engines never share a
//! buffer.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::Instant;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::uci::codec::UciLineCodec;
use crate::{AppError, Result};

/// Initial capacity reserved before each physical read.
const READ_CHUNK: usize = 4096;

/// One result of [`LineReader::read_line`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A complete line with its terminator stripped.
    Text(String),
    /// The stream ended. Carries any unterminated text read before the end,
    /// which is normally empty.
    Eof(String),
}

impl Line {
    /// `true` when the stream has ended.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof(_))
    }

    /// The complete line, or `None` at end of stream.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Eof(_) => None,
        }
    }
}

/// Point in time by which an expected line must have arrived.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    timeout: Duration,
}

impl Deadline {
    /// Deadline `timeout` from now, or `None` for an unbounded wait.
    #[must_use]
    pub fn after(timeout: Option<Duration>) -> Option<Self> {
        timeout.map(|timeout| Self {
            at: Instant::now() + timeout,
            timeout,
        })
    }
}

/// Line reader over an engine's stdout with a per-instance pending buffer.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    codec: UciLineCodec,
    buffer: BytesMut,
    eof: bool,
}

impl<R> LineReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Wrap `inner` with an empty pending buffer.
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self::with_codec(inner, UciLineCodec::new())
    }

    /// Wrap `inner` using a custom-configured codec.
    #[must_use]
    pub fn with_codec(inner: R, codec: UciLineCodec) -> Self {
        Self {
            inner,
            codec,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            eof: false,
        }
    }

    /// Read the next logical line.
    ///
    /// Buffered bytes are decoded first; the underlying stream is only read
    /// when they hold no complete line. Once end of stream has been seen,
    /// every further call returns [`Line::Eof`] without touching the stream.
    ///
    /// # Errors
    ///
    /// - [`AppError::Io`] — the underlying read failed.
    /// - [`AppError::Protocol`] — the line exceeds the codec's length limit.
    pub async fn read_line(&mut self) -> Result<Line> {
        loop {
            if let Some(line) = self.codec.decode(&mut self.buffer)? {
                trace!(line = line.as_str(), "engine line");
                return Ok(Line::Text(line));
            }

            if self.eof {
                let partial = self.buffer.split();
                return Ok(Line::Eof(String::from_utf8_lossy(&partial).into_owned()));
            }

            self.buffer.reserve(READ_CHUNK);
            let n = self
                .inner
                .read_buf(&mut self.buffer)
                .await
                .map_err(|err| AppError::Io(format!("engine read failed: {err}")))?;

            if n == 0 {
                self.eof = true;
            }
        }
    }

    /// Read the next line, giving up at `deadline` when one is set.
    ///
    /// Bytes already read when the deadline passes stay buffered.
    ///
    /// # Errors
    ///
    /// - [`AppError::Timeout`] — the deadline passed first; the message
    ///   names `expected`.
    /// - Any error from [`read_line`](Self::read_line).
    pub async fn read_line_before(
        &mut self,
        deadline: Option<Deadline>,
        expected: &str,
    ) -> Result<Line> {
        let Some(deadline) = deadline else {
            return self.read_line().await;
        };

        tokio::time::timeout_at(deadline.at, self.read_line())
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "'{expected}' not received within {:?}",
                    deadline.timeout
                ))
            })?
    }

    /// `true` once the underlying stream has reported end of stream.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Release the underlying stream, discarding any pending bytes.
    #[must_use]
    pub fn into_inner(self) -> R {
        self.inner
    }
}
