//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all engine session failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Pipe or process creation failed; no session was produced.
    LaunchFailed(String),
    /// The handshake ended before an `id name` line appeared.
    IdentityNotFound(String),
    /// End of stream before `uciok` arrived.
    HandshakeIncomplete(String),
    /// End of stream before the configure-phase `readyok` arrived.
    InitializationFailed(String),
    /// End of stream during an active-phase read that required a response.
    UnexpectedEof(String),
    /// A bounded wait elapsed before the expected line arrived.
    Timeout(String),
    /// Operation issued in a session state that does not accept it.
    InvalidState(String),
    /// Inbound framing violation (e.g. an oversized line).
    Protocol(String),
    /// Stream read or write failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::LaunchFailed(msg) => write!(f, "launch failed: {msg}"),
            Self::IdentityNotFound(msg) => write!(f, "identity not found: {msg}"),
            Self::HandshakeIncomplete(msg) => write!(f, "handshake incomplete: {msg}"),
            Self::InitializationFailed(msg) => write!(f, "initialization failed: {msg}"),
            Self::UnexpectedEof(msg) => write!(f, "unexpected eof: {msg}"),
            Self::Timeout(msg) => write!(f, "timeout: {msg}"),
            Self::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
