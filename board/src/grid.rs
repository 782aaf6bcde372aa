//! The 8×8 grid the pieces stand on
//!
//! The board knows nothing about the rules. It only keeps every piece on the square matching its
//! recorded position.

use core::fmt;

use crate::{Color, Piece, PieceKind, Position, PositionError};

/// The shade of a square
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SquareShade {
    Light,
    Dark,
}

/// A mailbox board: one optional piece per square
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    /// Indexed `[column][row]`, both 0-based
    squares: [[Option<Piece>; 8]; 8],
    shades: [[SquareShade; 8]; 8],
}

impl Board {
    /// A board with no pieces on it
    pub fn empty() -> Self {
        let mut shades = [[SquareShade::Light; 8]; 8];
        for position in Position::all() {
            // a1 is dark: column index 0 + row 1 is odd
            shades[position.column_index() as usize][position.row_index() as usize] =
                if (position.column_index() + position.row()) % 2 == 1 {
                    SquareShade::Dark
                } else {
                    SquareShade::Light
                };
        }
        Self {
            squares: [[None; 8]; 8],
            shades,
        }
    }

    /// The board at the start of a chess game
    pub fn standard() -> Self {
        const BACK_ROW: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut board = Self::empty();
        for color in [Color::White, Color::Black] {
            for (column, kind) in (0..8).zip(BACK_ROW) {
                let back = Position::from_indices(column, color.back_row() - 1);
                let pawn = Position::from_indices(column, color.pawn_row() - 1);
                if let (Some(back), Some(pawn)) = (back, pawn) {
                    board.put_piece(Piece::new(kind, color, back));
                    board.put_piece(Piece::new(PieceKind::Pawn, color, pawn));
                }
            }
        }
        board
    }

    const fn slot(position: Position) -> (usize, usize) {
        (
            position.column_index() as usize,
            position.row_index() as usize,
        )
    }

    /// Place `piece` on the square it records as its position
    ///
    /// Whatever was on that square before is replaced and returned.
    pub fn put_piece(&mut self, piece: Piece) -> Option<Piece> {
        let (column, row) = Self::slot(piece.position());
        self.squares[column][row].replace(piece)
    }

    /// Detach the piece on `position` without destroying it, so it can be placed again
    pub fn take_piece(&mut self, position: Position) -> Option<Piece> {
        let (column, row) = Self::slot(position);
        self.squares[column][row].take()
    }

    /// Remove and destroy the piece on `position`
    ///
    /// Returns whether there was a piece to remove.
    pub fn remove_piece(&mut self, position: Position) -> bool {
        self.take_piece(position).is_some()
    }

    /// The piece on `position`, if any
    pub fn piece_at(&self, position: Position) -> Option<&Piece> {
        let (column, row) = Self::slot(position);
        self.squares[column][row].as_ref()
    }

    /// Like [`Self::piece_at`], for an unchecked column letter and row
    pub fn piece_at_coords(&self, column: char, row: u8) -> Result<Option<&Piece>, PositionError> {
        Ok(self.piece_at(Position::new(column, row)?))
    }

    pub fn is_occupied(&self, position: Position) -> bool {
        self.piece_at(position).is_some()
    }

    pub fn shade(&self, position: Position) -> SquareShade {
        let (column, row) = Self::slot(position);
        self.shades[column][row]
    }

    /// Every piece on the board, in `a1, b1, ..., h8` order
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> + '_ {
        Position::all().filter_map(move |position| self.piece_at(position))
    }

    /// Where the king of the given color stands
    pub fn find_king(&self, color: Color) -> Option<Position> {
        self.pieces()
            .find(|piece| piece.kind() == PieceKind::King && piece.color() == color)
            .map(Piece::position)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

/// Display as a grid, with black at the top
///
/// ```
/// let rendered = board::Board::standard().to_string();
/// let mut lines = rendered.lines();
/// assert_eq!(lines.next(), Some("    a  b  c  d  e  f  g  h"));
/// assert_eq!(lines.next(), Some("8  BR BN BB BQ BK BB BN BR  8"));
/// assert_eq!(lines.next(), Some("7  BP BP BP BP BP BP BP BP  7"));
/// assert_eq!(lines.next(), Some("6   .  .  .  .  .  .  .  .  6"));
/// ```
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const HEADER: &str = "    a  b  c  d  e  f  g  h";
        writeln!(f, "{HEADER}")?;
        for row in (1..=8).rev() {
            write!(f, "{row} ")?;
            for column in 0..8 {
                match Position::from_indices(column, row - 1).and_then(|p| self.piece_at(p)) {
                    Some(piece) => write!(f, " {piece}")?,
                    None => f.write_str("  .")?,
                }
            }
            writeln!(f, "  {row}")?;
        }
        writeln!(f, "{HEADER}")
    }
}
