//! Line codec for UCI engine streams.
//!
//! Engines are inconsistent about line endings: most emit `\n`, some emit
//! `\r\n`, and a few older Windows builds emit `\r` or even `\n\r`. The
//! decoder ends a line at the first `\n` or `\r` and swallows the second
//! byte of a `\r\n` / `\n\r` pair, even when the pair is split across two
//! physical reads.
//!
//! # Usage
//!
//! [`UciLineCodec`] is driven by [`LineReader`](super::reader::LineReader)
//! on the inbound side and by
//! [`CommandWriter`](super::writer::CommandWriter) on the outbound side,
//! where encoding is simply `item\n`.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{AppError, Result};

/// Maximum line length accepted by the decoder: 1 MiB.
///
/// UCI `info` lines with long principal variations stay far below this;
/// anything larger means the engine is not speaking UCI.
pub const MAX_LINE_BYTES: usize = 1_048_576;

/// Line codec for UCI engine streams.
///
/// # Decoder
///
/// Returns each line without its terminator, decoding invalid UTF-8
/// lossily. A line longer than the configured maximum returns
/// [`AppError::Protocol`]`("line too long: …")`.
///
/// When a line's terminator is the last byte currently buffered, the codec
/// remembers it and drops a complementary terminator byte at the start of
/// the next read, so a `\r\n` split across reads does not produce a
/// spurious empty line.
///
/// # Encoder
///
/// Outbound commands are encoded as `item\n`.
#[derive(Debug)]
pub struct UciLineCodec {
    /// Terminator that ended the last line with nothing buffered after it.
    trailing_terminator: Option<u8>,
    max_length: usize,
}

impl UciLineCodec {
    /// Create a codec with the default [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_max_length(MAX_LINE_BYTES)
    }

    /// Create a codec rejecting lines longer than `max_length` bytes.
    #[must_use]
    pub fn new_with_max_length(max_length: usize) -> Self {
        Self {
            trailing_terminator: None,
            max_length,
        }
    }
}

impl Default for UciLineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for UciLineCodec {
    type Item = String;
    type Error = AppError;

    /// Decode the next line from `src`.
    ///
    /// Returns `Ok(None)` when `src` holds no complete line yet; the partial
    /// bytes stay in `src` for the next call.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(previous) = self.trailing_terminator {
            let Some(&first) = src.first() else {
                return Ok(None);
            };
            if is_terminator_pair(previous, first) {
                src.advance(1);
            }
            self.trailing_terminator = None;
        }

        let Some(end) = src.iter().position(|&b| is_terminator(b)) else {
            if src.len() > self.max_length {
                return Err(line_too_long(self.max_length));
            }
            return Ok(None);
        };

        if end > self.max_length {
            return Err(line_too_long(self.max_length));
        }

        let line = src.split_to(end);
        let terminator = src.get_u8();

        match src.first() {
            Some(&next) if is_terminator_pair(terminator, next) => src.advance(1),
            Some(_) => {}
            None => self.trailing_terminator = Some(terminator),
        }

        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }
}

impl Encoder<&str> for UciLineCodec {
    type Error = AppError;

    /// Encode `item` as a `\n`-terminated line into `dst`.
    fn encode(&mut self, item: &str, dst: &mut BytesMut) -> Result<()> {
        dst.reserve(item.len() + 1);
        dst.put_slice(item.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn is_terminator(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

/// `\r\n` and `\n\r` form a single boundary; `\n\n` is two lines.
fn is_terminator_pair(first: u8, second: u8) -> bool {
    matches!((first, second), (b'\r', b'\n') | (b'\n', b'\r'))
}

fn line_too_long(max_length: usize) -> AppError {
    AppError::Protocol(format!("line too long: exceeded {max_length} bytes"))
}
