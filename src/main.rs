#![forbid(unsafe_code)]

//! `uci-analyser` — UCI engine probe.
//!
//! Launches an engine, performs the handshake, and optionally analyses one
//! position, echoing the engine's raw output to stdout. Logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use uci_analyser::uci::spawner::SpawnConfig;
use uci_analyser::{AppError, EngineConfig, EngineSession, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "uci-analyser", about = "Drive a UCI chess engine", version, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Engine executable; overrides the configuration file.
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Fixed search depth.
    #[arg(long = "searchdepth")]
    search_depth: Option<u32>,

    /// Number of principal variations (`MultiPV`).
    #[arg(long)]
    variations: Option<u32>,

    /// Extra engine option as NAME=VALUE; may be repeated.
    #[arg(long = "option", value_name = "NAME=VALUE", value_parser = parse_option)]
    options: Vec<(String, String)>,

    /// Board state to analyse instead of the start position.
    #[arg(long)]
    fen: Option<String>,

    /// Moves played from the position, in long algebraic notation.
    #[arg(long)]
    moves: Option<String>,

    /// Restrict the search to these moves.
    #[arg(long = "searchmoves")]
    search_moves: Option<String>,

    /// Stop echoing engine output after a line starting with this token.
    #[arg(long, default_value = "bestmove")]
    until: String,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let config = resolve_config(&args)?;
    info!(engine = %config.engine.display(), "starting engine");

    let mut session = EngineSession::start(&SpawnConfig::from(&config))?
        .with_response_timeout(config.response_timeout())
        .with_new_game_command(config.new_game_command.clone());

    if let Err(err) = session
        .init(config.search_depth, config.variations, &config.options)
        .await
    {
        warn!(%err, "engine initialization failed");
        // Reap the engine before reporting; the init error is returned.
        if let Err(shutdown_err) = session.shutdown(config.shutdown_grace()).await {
            warn!(%shutdown_err, "engine shutdown failed");
        }
        return Err(err);
    }

    if let Some(identity) = session.identity() {
        println!("engine: {identity}");
    }

    if args.moves.is_some() || args.fen.is_some() {
        analyse(&mut session, &args).await?;
    }

    let ready = session.check_is_ready().await?;
    info!(ready, "readiness check after analysis");

    let status = session.shutdown(config.shutdown_grace()).await?;
    info!(?status, "uci-analyser finished");
    Ok(())
}

/// Set the requested position, search it, and echo engine output until the
/// `--until` token.
async fn analyse(session: &mut EngineSession, args: &Cli) -> Result<()> {
    let moves = args.moves.as_deref().unwrap_or_default();
    session.set_position(moves, args.fen.as_deref()).await?;

    match args.search_moves.as_deref() {
        Some(candidates) => session.search_moves(candidates).await?,
        None => session.go().await?,
    }

    loop {
        let line = session.next_line().await?;
        println!("{line}");
        if line.starts_with(args.until.as_str()) {
            return Ok(());
        }
    }
}

/// Merge the optional configuration file with command-line overrides.
fn resolve_config(args: &Cli) -> Result<EngineConfig> {
    let mut config = match (&args.config, &args.engine) {
        (Some(path), _) => EngineConfig::load_from_path(path)?,
        (None, Some(engine)) => EngineConfig::for_engine(engine),
        (None, None) => {
            return Err(AppError::Config(
                "either --config or --engine must be given".into(),
            ))
        }
    };

    if let Some(engine) = &args.engine {
        config.engine.clone_from(engine);
    }
    if let Some(depth) = args.search_depth {
        config.search_depth = depth;
    }
    if let Some(variations) = args.variations {
        config.variations = variations;
    }
    for (name, value) in &args.options {
        config.options.insert(name.clone(), value.clone());
    }

    config.validate()?;
    Ok(config)
}

fn parse_option(raw: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("option name must not be empty".into());
    }
    Ok((name.to_owned(), value.trim().to_owned()))
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
