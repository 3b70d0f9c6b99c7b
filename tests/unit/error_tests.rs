//! Unit tests for `AppError` display format and error behavior.

use uci_analyser::AppError;

#[test]
fn each_kind_has_a_distinct_prefix() {
    let cases = [
        (AppError::Config("x".into()), "config: x"),
        (AppError::LaunchFailed("x".into()), "launch failed: x"),
        (AppError::IdentityNotFound("x".into()), "identity not found: x"),
        (AppError::HandshakeIncomplete("x".into()), "handshake incomplete: x"),
        (
            AppError::InitializationFailed("x".into()),
            "initialization failed: x",
        ),
        (AppError::UnexpectedEof("x".into()), "unexpected eof: x"),
        (AppError::Timeout("x".into()), "timeout: x"),
        (AppError::InvalidState("x".into()), "invalid state: x"),
        (AppError::Protocol("x".into()), "protocol: x"),
        (AppError::Io("x".into()), "io: x"),
    ];

    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

/// Operators must be able to tell a wrong executable from a hung engine
/// from an unexpected output format by the message alone.
#[test]
fn handshake_failures_are_distinguishable() {
    let missing_identity = AppError::IdentityNotFound("no \"id name\" line".into());
    let missing_uciok = AppError::HandshakeIncomplete("no \"uciok\" line".into());
    let hung = AppError::Timeout("'uciok' not received within 5s".into());

    assert_ne!(missing_identity.to_string(), missing_uciok.to_string());
    assert!(missing_identity.to_string().contains("id name"));
    assert!(missing_uciok.to_string().contains("uciok"));
    assert!(hung.to_string().starts_with("timeout:"));
}

#[test]
fn message_has_no_trailing_period() {
    let s = AppError::LaunchFailed("failed to spawn engine sf: not found".into()).to_string();
    assert!(!s.ends_with('.'), "error message must not end with a period: {s}");
}

#[test]
fn io_error_converts_to_io_kind() {
    let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
    let err = AppError::from(io);
    assert!(matches!(err, AppError::Io(ref msg) if msg == "pipe closed"));
}

#[test]
fn implements_std_error_trait() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    assert_error(&AppError::Protocol("test".into()));
}
