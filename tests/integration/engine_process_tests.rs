//! Integration tests driving real engine processes.
//!
//! The engines are small shell scripts written to a temp directory, so the
//! unix tests exercise the actual spawn, pipe and teardown paths without a
//! chess engine installed. Tests run serially: executing a script another
//! thread is still writing fails with `ETXTBSY`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serial_test::serial;
use uci_analyser::config::StderrMode;
use uci_analyser::uci::spawner::SpawnConfig;
use uci_analyser::{AppError, EngineSession, SessionState};

fn spawn_config(engine: impl Into<PathBuf>) -> SpawnConfig {
    SpawnConfig {
        engine: engine.into(),
        stderr: StderrMode::Null,
    }
}

#[tokio::test]
#[serial]
async fn missing_executable_is_launch_failed() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = spawn_config(temp.path().join("no-such-engine"));

    match EngineSession::start(&config) {
        Err(AppError::LaunchFailed(msg)) => {
            assert!(msg.contains("no-such-engine"), "message must name the engine: {msg}");
        }
        Err(other) => panic!("expected Err(AppError::LaunchFailed), got: {other:?}"),
        Ok(_) => panic!("expected Err(AppError::LaunchFailed), got a session"),
    }
}

#[cfg(unix)]
mod scripted_engines {
    use std::os::unix::fs::PermissionsExt;
    use std::os::unix::process::ExitStatusExt;
    use std::path::{Path, PathBuf};

    use super::{
        serial, spawn_config, AppError, BTreeMap, Duration, EngineSession, SessionState,
    };

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).expect("write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod script");
        path
    }

    /// A well-behaved engine that answers in CRLF and logs every command.
    fn crlf_engine(dir: &Path, log: &Path) -> PathBuf {
        let body = format!(
            r#"log='{log}'
while IFS= read -r line; do
  printf '%s\n' "$line" >> "$log"
  case "$line" in
    uci) printf 'Scripted Engine by nobody\r\nid name Scripted Engine 1.0\r\nid author Nobody\r\noption name Hash type spin default 16 min 1 max 1024\r\nuciok\r\n' ;;
    isready) printf 'readyok\r\n' ;;
    go*) printf 'info depth 1 score cp 20 pv e2e4\r\nbestmove e2e4\r\n' ;;
    quit) exit 0 ;;
  esac
done
"#,
            log = log.display()
        );
        write_script(dir, "engine.sh", &body)
    }

    #[tokio::test]
    #[serial]
    async fn full_lifecycle_against_a_process() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = temp.path().join("commands.log");
        let engine = crlf_engine(temp.path(), &log);

        let mut session = EngineSession::start(&spawn_config(&engine))
            .expect("engine starts")
            .with_response_timeout(Some(Duration::from_secs(10)));
        assert!(session.pid().is_some());
        assert_eq!(session.state(), SessionState::Launched);

        let mut options = BTreeMap::new();
        options.insert("Hash".to_owned(), "32".to_owned());
        session.init(8, 2, &options).await.expect("init");
        assert_eq!(session.identity(), Some("Scripted Engine 1.0"));

        session
            .set_position("e2e4 e7e5", None)
            .await
            .expect("position");
        session.go().await.expect("go");

        let mut output = Vec::new();
        loop {
            let line = session.next_line().await.expect("search output");
            let done = line.starts_with("bestmove");
            output.push(line);
            if done {
                break;
            }
        }
        assert_eq!(
            output,
            vec!["info depth 1 score cp 20 pv e2e4", "bestmove e2e4"],
            "CRLF output must not produce blank lines"
        );

        assert!(session.check_is_ready().await.expect("isready"));

        let status = session
            .shutdown(Duration::from_secs(5))
            .await
            .expect("shutdown")
            .expect("process exit status");
        assert!(status.success(), "engine should exit on quit: {status}");

        let commands = std::fs::read_to_string(&log).expect("read command log");
        let commands: Vec<&str> = commands.lines().collect();
        assert_eq!(
            commands,
            vec![
                "uci",
                "setoption name UCI_AnalyseMode value true",
                "setoption name MultiPV value 2",
                "setoption name Hash value 32",
                "ucinewgame",
                "isready",
                "position startpos moves e2e4 e7e5",
                "go depth 8",
                "isready",
                "quit",
            ]
        );
    }

    #[tokio::test]
    #[serial]
    async fn engine_exiting_at_once_is_identity_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        let engine = write_script(temp.path(), "mute.sh", "exit 0\n");

        let mut session = EngineSession::start(&spawn_config(&engine)).expect("engine starts");

        match session.init(10, 1, &BTreeMap::new()).await {
            Err(AppError::IdentityNotFound(_)) => {}
            // The write of `uci` can race the exit and hit a closed pipe.
            Err(AppError::Io(_)) => {}
            other => panic!("expected Err(AppError::IdentityNotFound), got: {other:?}"),
        }

        let status = session
            .shutdown(Duration::from_secs(5))
            .await
            .expect("shutdown")
            .expect("process exit status");
        assert!(status.success());
    }

    #[tokio::test]
    #[serial]
    async fn engine_ignoring_quit_and_sigterm_is_killed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let engine = write_script(
            temp.path(),
            "stubborn.sh",
            "trap '' TERM\nwhile IFS= read -r line; do :; done\nwhile :; do sleep 1; done\n",
        );

        let session = EngineSession::start(&spawn_config(&engine)).expect("engine starts");

        let status = session
            .shutdown(Duration::from_millis(200))
            .await
            .expect("shutdown")
            .expect("process exit status");

        assert!(!status.success());
        assert_eq!(status.signal(), Some(9), "engine must be killed: {status}");
    }
}
