//! Outbound UCI commands.
//!
//! | Command                    | Text sent                                   |
//! |----------------------------|---------------------------------------------|
//! | [`UciCommand::Uci`]        | `uci`                                       |
//! | [`UciCommand::SetOption`]  | `setoption name <name> value <value>`       |
//! | [`UciCommand::IsReady`]    | `isready`                                   |
//! | [`UciCommand::NewGame`]    | the configured new-game command             |
//! | [`UciCommand::Position`]   | `position startpos moves <moves>` or        |
//! |                            | `position fen <fen> moves <moves>`          |
//! | [`UciCommand::Go`]         | `go depth <d>` or                           |
//! |                            | `go depth <d> searchmoves <moves>`          |
//! | [`UciCommand::Quit`]       | `quit`                                      |

use std::fmt::{Display, Formatter};

/// A command sent from the analyser to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    /// Start the handshake.
    Uci,
    /// Set an engine option.
    SetOption {
        /// Option name, sent verbatim.
        name: String,
        /// Option value, already rendered as text.
        value: String,
    },
    /// Ask the engine to answer `readyok`.
    IsReady,
    /// Announce a new game; carries the command text (normally `ucinewgame`).
    NewGame(String),
    /// Set up a position.
    Position {
        /// Board state in FEN; `None` means the standard start position.
        fen: Option<String>,
        /// Space-separated moves in long algebraic notation.
        moves: String,
    },
    /// Start a fixed-depth search.
    Go {
        /// Search depth in plies.
        depth: u32,
        /// Restrict the search to these space-separated moves.
        search_moves: Option<String>,
    },
    /// Ask the engine to exit.
    Quit,
}

impl UciCommand {
    /// `setoption` with any displayable value (`true`, `3`, `"Hash"`, …).
    #[must_use]
    pub fn set_option(name: impl Into<String>, value: impl Display) -> Self {
        Self::SetOption {
            name: name.into(),
            value: value.to_string(),
        }
    }

    /// `position` command; an empty `fen` selects the start position.
    #[must_use]
    pub fn position(moves: impl Into<String>, fen: Option<&str>) -> Self {
        Self::Position {
            fen: fen.filter(|f| !f.is_empty()).map(str::to_owned),
            moves: moves.into(),
        }
    }
}

impl Display for UciCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uci => f.write_str("uci"),
            Self::SetOption { name, value } => write!(f, "setoption name {name} value {value}"),
            Self::IsReady => f.write_str("isready"),
            Self::NewGame(command) => f.write_str(command),
            Self::Position { fen: None, moves } => write!(f, "position startpos moves {moves}"),
            Self::Position {
                fen: Some(fen),
                moves,
            } => write!(f, "position fen {fen} moves {moves}"),
            Self::Go {
                depth,
                search_moves: None,
            } => write!(f, "go depth {depth}"),
            Self::Go {
                depth,
                search_moves: Some(moves),
            } => write!(f, "go depth {depth} searchmoves {moves}"),
            Self::Quit => f.write_str("quit"),
        }
    }
}
