#![forbid(unsafe_code)]

//! Drive a UCI chess engine over its standard input and output.

pub mod config;
pub mod errors;
pub mod uci;

pub use config::EngineConfig;
pub use errors::{AppError, Result};
pub use uci::session::{EngineSession, SessionState};
