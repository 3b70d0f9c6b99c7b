//! Universal Chess Interface (UCI) engine session handling.
//!
//! This module drives an external chess engine over its stdio. Each
//! [`EngineSession`](session::EngineSession) owns one child process, one
//! outbound command stream and one inbound line reader with its own pending
//! buffer.
//!
//! Submodules:
//! - `spawner`: Process launch with piped stdin/stdout and platform-specific
//!   process setup and termination.
//! - `codec`: Line framing tolerant of `\n`, `\r`, `\r\n` and `\n\r`.
//! - `reader`: Line reader over the engine's stdout.
//! - `command`: Outbound UCI command formatting.
//! - `writer`: Newline-terminated, immediately flushed command sender.
//! - `handshake`: Sentinel waits used during `uci` / `isready` exchanges.
//! - `session`: The session state machine tying the above together.

pub mod codec;
pub mod command;
pub mod handshake;
pub mod reader;
pub mod session;
pub mod spawner;
pub mod writer;
