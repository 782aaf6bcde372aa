//! Whether a piece may move from one square to another

use board::{Board, Piece, PieceKind, Position};
use log::trace;

use crate::MoveInfo;

/// The legality oracle
///
/// Answers whether the rules of a piece's movement allow it to get from one square to another on
/// a given board. It does not care whose turn it is, and does not check whether the move would
/// leave the mover's own king in check; both of those are up to the [`crate::GameManager`].
///
/// The only history it needs is the last move made, for en passant.
#[derive(Clone, Copy, Debug, Default)]
pub struct MoveManager {
    last_move: Option<MoveInfo>,
}

impl MoveManager {
    pub const fn new(last_move: Option<MoveInfo>) -> Self {
        Self { last_move }
    }

    /// Check whether `piece`, standing on `from`, may move to `to`
    ///
    /// Castling is not considered here.
    pub fn is_valid_move(&self, from: Position, to: Position, board: &Board, piece: &Piece) -> bool {
        if from == to {
            return false;
        }
        if board
            .piece_at(to)
            .is_some_and(|target| target.color() == piece.color())
        {
            return false;
        }
        let valid = match piece.kind() {
            PieceKind::Pawn => self.is_pawn_move_valid(from, to, board, piece),
            PieceKind::Knight => Self::is_knight_move_valid(from, to),
            PieceKind::Bishop => Self::is_bishop_move_valid(from, to, board),
            PieceKind::Rook => Self::is_rook_move_valid(from, to, board),
            PieceKind::Queen => Self::is_queen_move_valid(from, to, board),
            PieceKind::King => Self::is_king_move_valid(from, to),
        };
        if !valid {
            trace!("{} can't move {from} -> {to}", piece.kind());
        }
        valid
    }

    /// Check whether `piece`, standing on `from`, threatens `target`
    ///
    /// This is the movement geometry without the same-color rule, and with pawns threatening
    /// both forward diagonals whether or not anything stands there.
    pub fn attacks(&self, from: Position, target: Position, board: &Board, piece: &Piece) -> bool {
        if from == target {
            return false;
        }
        match piece.kind() {
            PieceKind::Pawn => {
                let (columns, rows) = from.delta_to(target);
                columns.abs() == 1 && rows == piece.color().forward()
            }
            PieceKind::Knight => Self::is_knight_move_valid(from, target),
            PieceKind::Bishop => Self::is_bishop_move_valid(from, target, board),
            PieceKind::Rook => Self::is_rook_move_valid(from, target, board),
            PieceKind::Queen => Self::is_queen_move_valid(from, target, board),
            PieceKind::King => Self::is_king_move_valid(from, target),
        }
    }

    fn is_pawn_move_valid(&self, from: Position, to: Position, board: &Board, piece: &Piece) -> bool {
        let color = piece.color();
        let forward = color.forward();
        let (columns, rows) = from.delta_to(to);
        if columns == 0 {
            if rows == forward {
                return !board.is_occupied(to);
            }
            if rows == 2 * forward && from.row() == color.pawn_row() {
                // Double pawn move only if the middle square is clear
                return from
                    .offset(0, forward)
                    .is_some_and(|middle| !board.is_occupied(middle))
                    && !board.is_occupied(to);
            }
            return false;
        }
        if columns.abs() != 1 || rows != forward {
            return false;
        }
        match board.piece_at(to) {
            Some(target) => target.color() != color,
            None => self.is_en_passant(piece, from, to, board),
        }
    }

    const fn is_knight_move_valid(from: Position, to: Position) -> bool {
        let (columns, rows) = from.delta_to(to);
        let (columns, rows) = (columns.unsigned_abs(), rows.unsigned_abs());
        (columns == 1 && rows == 2) || (columns == 2 && rows == 1)
    }

    fn is_bishop_move_valid(from: Position, to: Position, board: &Board) -> bool {
        let (columns, rows) = from.delta_to(to);
        columns != 0 && columns.abs() == rows.abs() && Self::is_path_clear(from, to, board)
    }

    fn is_rook_move_valid(from: Position, to: Position, board: &Board) -> bool {
        let (columns, rows) = from.delta_to(to);
        ((columns == 0) != (rows == 0)) && Self::is_path_clear(from, to, board)
    }

    fn is_queen_move_valid(from: Position, to: Position, board: &Board) -> bool {
        Self::is_rook_move_valid(from, to, board) || Self::is_bishop_move_valid(from, to, board)
    }

    const fn is_king_move_valid(from: Position, to: Position) -> bool {
        let (columns, rows) = from.delta_to(to);
        columns.unsigned_abs() <= 1 && rows.unsigned_abs() <= 1
    }

    /// Whether every square strictly between `from` and `to` is empty
    ///
    /// False when the squares are equal or don't share a row, column or diagonal.
    pub fn is_path_clear(from: Position, to: Position, board: &Board) -> bool {
        let (columns, rows) = from.delta_to(to);
        let aligned = columns == 0 || rows == 0 || columns.abs() == rows.abs();
        if from == to || !aligned {
            return false;
        }
        let (column_step, row_step) = (columns.signum(), rows.signum());
        let mut current = from;
        while let Some(next) = current.offset(column_step, row_step) {
            if next == to {
                return true;
            }
            if board.is_occupied(next) {
                return false;
            }
            current = next;
        }
        false
    }

    /// Check whether `piece` moving from `from` to `to` is an en passant capture
    ///
    /// That is a pawn moving diagonally forward next to an enemy pawn that has just advanced two
    /// squares to stand beside it.
    pub fn is_en_passant(&self, piece: &Piece, from: Position, to: Position, board: &Board) -> bool {
        if piece.kind() != PieceKind::Pawn {
            return false;
        }
        let color = piece.color();
        let enemy = color.other();
        // The row an enemy pawn lands on after its double advance
        let capture_row = enemy.pawn_row() as i8 + 2 * enemy.forward();
        let (columns, rows) = from.delta_to(to);
        if from.row() as i8 != capture_row || rows != color.forward() || columns.abs() != 1 {
            return false;
        }
        if board.is_occupied(to) {
            return false;
        }
        let Some(last_move) = self.last_move else {
            return false;
        };
        let Some(victim) = Self::en_passant_victim(from, to) else {
            return false;
        };
        last_move.color == enemy
            && last_move.is_double_pawn_advance()
            && last_move.to == victim
            && board
                .piece_at(victim)
                .is_some_and(|pawn| pawn.kind() == PieceKind::Pawn && pawn.color() == enemy)
    }

    /// The square of the pawn taken by an en passant capture from `from` to `to`
    pub const fn en_passant_victim(from: Position, to: Position) -> Option<Position> {
        Position::from_indices(to.column_index(), from.row_index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use board::Color;

    fn place(board: &mut Board, kind: PieceKind, color: Color, position: Position) -> Piece {
        let piece = Piece::new(kind, color, position);
        board.put_piece(piece);
        piece
    }

    fn valid(board: &Board, from: Position, to: Position) -> bool {
        let piece = board.piece_at(from).expect("no piece to move");
        MoveManager::default().is_valid_move(from, to, board, piece)
    }

    #[test]
    fn test_pawn_advances() {
        let board = Board::standard();
        assert!(valid(&board, Position::E2, Position::E3));
        assert!(valid(&board, Position::E2, Position::E4));
        assert!(!valid(&board, Position::E2, Position::E5));
        assert!(!valid(&board, Position::E2, Position::D3));
        assert!(valid(&board, Position::D7, Position::D5));
        assert!(!valid(&board, Position::D7, Position::D8));
    }

    #[test]
    fn test_pawn_double_advance_needs_clear_path() {
        let mut board = Board::standard();
        place(&mut board, PieceKind::Knight, Color::Black, Position::E3);
        assert!(!valid(&board, Position::E2, Position::E4));
        assert!(!valid(&board, Position::E2, Position::E3));
        // But it can now capture diagonally onto e3 from d2 and f2
        assert!(valid(&board, Position::D2, Position::E3));
        assert!(valid(&board, Position::F2, Position::E3));
    }

    #[test]
    fn test_pawn_double_advance_only_from_start() {
        let mut board = Board::empty();
        place(&mut board, PieceKind::Pawn, Color::White, Position::E3);
        assert!(!valid(&board, Position::E3, Position::E5));
        assert!(valid(&board, Position::E3, Position::E4));
    }

    #[test]
    fn test_knight_jumps() {
        let board = Board::standard();
        assert!(valid(&board, Position::G1, Position::F3));
        assert!(valid(&board, Position::G1, Position::H3));
        assert!(!valid(&board, Position::G1, Position::E2));
        assert!(!valid(&board, Position::G1, Position::G3));
    }

    #[test]
    fn test_sliders_are_blocked() {
        let board = Board::standard();
        assert!(!valid(&board, Position::A1, Position::A3));
        assert!(!valid(&board, Position::C1, Position::E3));
        assert!(!valid(&board, Position::D1, Position::D3));

        let mut board = Board::empty();
        place(&mut board, PieceKind::Queen, Color::White, Position::D4);
        place(&mut board, PieceKind::Pawn, Color::Black, Position::F6);
        place(&mut board, PieceKind::Pawn, Color::White, Position::D6);
        assert!(!valid(&board, Position::D4, Position::H8));
        assert!(valid(&board, Position::D4, Position::F6));
        assert!(valid(&board, Position::D4, Position::D5));
        assert!(!valid(&board, Position::D4, Position::D6));
        assert!(!valid(&board, Position::D4, Position::D7));
        assert!(valid(&board, Position::D4, Position::A1));
        assert!(valid(&board, Position::D4, Position::H4));
        assert!(!valid(&board, Position::D4, Position::E6));
    }

    #[test]
    fn test_rook_and_bishop_geometry() {
        let mut board = Board::empty();
        place(&mut board, PieceKind::Rook, Color::White, Position::D4);
        place(&mut board, PieceKind::Bishop, Color::Black, Position::E4);
        assert!(valid(&board, Position::D4, Position::D8));
        assert!(valid(&board, Position::D4, Position::A4));
        assert!(valid(&board, Position::D4, Position::E4));
        assert!(!valid(&board, Position::D4, Position::F4));
        assert!(!valid(&board, Position::D4, Position::E5));
        assert!(valid(&board, Position::E4, Position::H7));
        assert!(valid(&board, Position::E4, Position::B1));
        assert!(!valid(&board, Position::E4, Position::E5));
    }

    #[test]
    fn test_king_steps() {
        let mut board = Board::empty();
        place(&mut board, PieceKind::King, Color::White, Position::E1);
        assert!(valid(&board, Position::E1, Position::D2));
        assert!(valid(&board, Position::E1, Position::F1));
        assert!(!valid(&board, Position::E1, Position::G1));
        assert!(!valid(&board, Position::E1, Position::E3));
        assert!(!valid(&board, Position::E1, Position::E1));
    }

    #[test]
    fn test_en_passant() {
        let mut board = Board::empty();
        let pawn = place(&mut board, PieceKind::Pawn, Color::White, Position::E5);
        place(&mut board, PieceKind::Pawn, Color::Black, Position::D5);
        let double_advance = MoveInfo {
            kind: PieceKind::Pawn,
            color: Color::Black,
            from: Position::D7,
            to: Position::D5,
        };
        let manager = MoveManager::new(Some(double_advance));
        assert!(manager.is_en_passant(&pawn, Position::E5, Position::D6, &board));
        assert!(manager.is_valid_move(Position::E5, Position::D6, &board, &pawn));
        assert_eq!(
            MoveManager::en_passant_victim(Position::E5, Position::D6),
            Some(Position::D5)
        );
        // Not towards the other side
        assert!(!manager.is_en_passant(&pawn, Position::E5, Position::F6, &board));

        // Only right after the double advance
        let single_advance = MoveInfo {
            from: Position::D6,
            ..double_advance
        };
        let manager = MoveManager::new(Some(single_advance));
        assert!(!manager.is_en_passant(&pawn, Position::E5, Position::D6, &board));
        assert!(!MoveManager::default().is_en_passant(&pawn, Position::E5, Position::D6, &board));
    }

    #[test]
    fn test_black_en_passant() {
        let mut board = Board::empty();
        let pawn = place(&mut board, PieceKind::Pawn, Color::Black, Position::C4);
        place(&mut board, PieceKind::Pawn, Color::White, Position::B4);
        let manager = MoveManager::new(Some(MoveInfo {
            kind: PieceKind::Pawn,
            color: Color::White,
            from: Position::B2,
            to: Position::B4,
        }));
        assert!(manager.is_en_passant(&pawn, Position::C4, Position::B3, &board));
        assert!(!manager.is_en_passant(&pawn, Position::C4, Position::D3, &board));
    }

    #[test]
    fn test_pawn_attacks_empty_diagonals() {
        let mut board = Board::empty();
        let pawn = place(&mut board, PieceKind::Pawn, Color::White, Position::E4);
        let manager = MoveManager::default();
        assert!(manager.attacks(Position::E4, Position::D5, &board, &pawn));
        assert!(manager.attacks(Position::E4, Position::F5, &board, &pawn));
        assert!(!manager.attacks(Position::E4, Position::E5, &board, &pawn));
        assert!(!manager.is_valid_move(Position::E4, Position::D5, &board, &pawn));
    }

    #[test]
    fn test_attacks_ignore_own_pieces() {
        let mut board = Board::empty();
        let rook = place(&mut board, PieceKind::Rook, Color::White, Position::A1);
        place(&mut board, PieceKind::Knight, Color::White, Position::A4);
        let manager = MoveManager::default();
        assert!(manager.attacks(Position::A1, Position::A4, &board, &rook));
        assert!(!manager.attacks(Position::A1, Position::A5, &board, &rook));
        assert!(!manager.is_valid_move(Position::A1, Position::A4, &board, &rook));
    }

    #[test]
    fn test_path_needs_a_line() {
        let mut board = Board::empty();
        assert!(MoveManager::is_path_clear(Position::A1, Position::H8, &board));
        assert!(MoveManager::is_path_clear(Position::A1, Position::A2, &board));
        assert!(!MoveManager::is_path_clear(Position::A1, Position::B3, &board));
        assert!(!MoveManager::is_path_clear(Position::A1, Position::A1, &board));
        place(&mut board, PieceKind::Pawn, Color::Black, Position::D4);
        assert!(!MoveManager::is_path_clear(Position::A1, Position::H8, &board));
        assert!(MoveManager::is_path_clear(Position::A1, Position::D4, &board));
    }
}
