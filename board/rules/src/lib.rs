//! The rules of chess, played out on a [`board::Board`]

use core::fmt;

use board::{Color, Position, PositionError};

mod castling;
mod game_manager;
mod move_manager;
mod recorder;

pub use crate::castling::{CastleRights, CastleSquares};
pub use crate::game_manager::GameManager;
pub use crate::move_manager::MoveManager;
pub use crate::recorder::{MoveHistory, MoveInfo, RecordedMove, Recorder};

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Misuse of the engine, as opposed to a player trying an illegal move
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("no piece at {0} to move")]
    NoPieceAt(Position),
    #[error(transparent)]
    Position(#[from] PositionError),
}

/// Why a move was turned down
///
/// The game is left exactly as it was, so the player can try again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("it is {0}'s turn to move")]
    WrongTurn(Color),
    #[error("that piece can't move there")]
    IllegalMove,
    #[error("castling is not allowed right now")]
    IllegalCastle,
    #[error("that move would leave your king in check")]
    ExposesKing,
}

/// How the last accepted move is classified
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveKind {
    Move,
    Capture,
    Castle,
    Promotion,
    /// The move put the opponent in check
    Check,
    /// The move checkmated the opponent
    Mate,
}

/// Whether the side to move is in check(mate)
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CheckStatus {
    None,
    Check,
    Checkmate,
}
/// Returns the status as appended to a move in algebraic notation
impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "",
            Self::Check => "+",
            Self::Checkmate => "#",
        })
    }
}

/// What happened when a move was accepted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveReport {
    /// Move, capture, castle or promotion
    pub kind: MoveKind,
    /// The state of the opponent, who is now to move
    pub check: CheckStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveStatus {
    Accepted(MoveReport),
    Rejected(Rejection),
}
impl MoveStatus {
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// The possible outcomes of a game
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameResult {
    /// White checkmated black
    WhiteWins,
    /// Black checkmated white
    BlackWins,
    /// Stalemate, or not enough material left to mate
    Draw,
}
impl GameResult {
    pub const fn win_for(color: Color) -> Self {
        match color {
            Color::White => Self::WhiteWins,
            Color::Black => Self::BlackWins,
        }
    }

    /// Parse the score notation written by [`fmt::Display`]
    pub fn from_score(score: &str) -> Option<Self> {
        match score {
            "1-0" => Some(Self::WhiteWins),
            "0-1" => Some(Self::BlackWins),
            "1/2-1/2" => Some(Self::Draw),
            _ => None,
        }
    }
}
/// Displays the score, as in PGN
impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
        })
    }
}
