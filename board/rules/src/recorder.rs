//! The interface to whoever keeps the record of the game

use board::{Color, PieceKind, Position};

use crate::GameResult;

/// A move which was made on the board
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveInfo {
    pub kind: PieceKind,
    pub color: Color,
    pub from: Position,
    pub to: Position,
}
impl MoveInfo {
    /// Whether this was a pawn advancing two squares from its starting row
    pub fn is_double_pawn_advance(&self) -> bool {
        self.kind == PieceKind::Pawn
            && self.from.column() == self.to.column()
            && self.from.row() == self.color.pawn_row()
            && self.from.row().abs_diff(self.to.row()) == 2
    }
}

/// Keeps the record of a game
///
/// The engine asks it about history it can't see on the board, and tells it about every move it
/// commits (except while replaying a saved game).
pub trait Recorder {
    /// The most recently recorded move
    fn last_move(&self) -> Option<MoveInfo>;

    /// Whether the king or rook of `color` that started in `column` has moved
    ///
    /// Only moves away from the piece's home square on the back row count. Always false for other
    /// kinds of pieces.
    fn has_piece_moved(&self, kind: PieceKind, color: Color, column: char) -> bool;

    /// Record a committed move
    ///
    /// `special` is the notation for castling (`O-O`, `O-O-O`) or promotion (`e7 -> e8=Q`), and
    /// empty for everything else.
    fn record_move(&mut self, turn: u16, mv: MoveInfo, special: &str);

    /// Record how the game ended
    fn record_result(&mut self, _result: GameResult) {}
}

/// One entry in a [`MoveHistory`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedMove {
    pub turn: u16,
    pub mv: MoveInfo,
    pub special: String,
}
impl RecordedMove {
    /// The column of the rook this entry moved by castling, if it was a castle
    fn castled_rook_column(&self) -> Option<char> {
        match self.special.as_str() {
            "O-O" => Some('h'),
            "O-O-O" => Some('a'),
            _ => None,
        }
    }
}

/// A recorder which only keeps the game in memory
#[derive(Clone, Debug, Default)]
pub struct MoveHistory {
    moves: Vec<RecordedMove>,
    result: Option<GameResult>,
}

impl MoveHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn moves(&self) -> &[RecordedMove] {
        &self.moves
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }
}

impl Recorder for MoveHistory {
    fn last_move(&self) -> Option<MoveInfo> {
        self.moves.last().map(|entry| entry.mv)
    }

    fn has_piece_moved(&self, kind: PieceKind, color: Color, column: char) -> bool {
        if !matches!(kind, PieceKind::King | PieceKind::Rook) {
            return false;
        }
        let Ok(home) = Position::new(column, color.back_row()) else {
            return false;
        };
        self.moves
            .iter()
            .filter(|entry| entry.mv.color == color)
            .any(|entry| {
                (entry.mv.kind == kind && entry.mv.from == home)
                    || (kind == PieceKind::Rook && entry.castled_rook_column() == Some(column))
            })
    }

    fn record_move(&mut self, turn: u16, mv: MoveInfo, special: &str) {
        self.moves.push(RecordedMove {
            turn,
            mv,
            special: special.to_string(),
        });
    }

    fn record_result(&mut self, result: GameResult) {
        self.result = Some(result);
    }
}
