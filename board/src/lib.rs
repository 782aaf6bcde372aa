use core::{fmt, str::FromStr};

mod grid;

pub use grid::{Board, SquareShade};

/// The types of pieces there are
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}
impl PieceKind {
    /// All the kinds of pieces there are
    pub const KINDS: [PieceKind; 6] = [
        Self::Pawn,
        Self::Knight,
        Self::Bishop,
        Self::Rook,
        Self::Queen,
        Self::King,
    ];

    /// The letter shown for this piece on the board and in the move log
    pub const fn symbol(self) -> char {
        match self {
            Self::Pawn => 'P',
            Self::Knight => 'N',
            Self::Bishop => 'B',
            Self::Rook => 'R',
            Self::Queen => 'Q',
            Self::King => 'K',
        }
    }

    /// The material value of this kind of piece
    ///
    /// The king is never captured, so it has no value (`None`).
    pub const fn value(self) -> Option<u8> {
        match self {
            Self::Pawn => Some(1),
            Self::Knight | Self::Bishop => Some(3),
            Self::Rook => Some(5),
            Self::Queen => Some(9),
            Self::King => None,
        }
    }

    /// Whether a pawn can promote into this kind of piece
    pub const fn is_promotable(self) -> bool {
        match self {
            PieceKind::Pawn | PieceKind::King => false,
            PieceKind::Rook | PieceKind::Queen | PieceKind::Knight | PieceKind::Bishop => true,
        }
    }

    /// Knights and bishops
    pub const fn is_minor(self) -> bool {
        matches!(self, PieceKind::Knight | PieceKind::Bishop)
    }

    /// Look up a kind by its symbol, ignoring case
    pub const fn from_symbol(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'P' => Some(Self::Pawn),
            'N' => Some(Self::Knight),
            'B' => Some(Self::Bishop),
            'R' => Some(Self::Rook),
            'Q' => Some(Self::Queen),
            'K' => Some(Self::King),
            _ => None,
        }
    }
}
impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pawn => "pawn",
            Self::Knight => "knight",
            Self::Bishop => "bishop",
            Self::Rook => "rook",
            Self::Queen => "queen",
            Self::King => "king",
        })
    }
}

/// The colors a piece can have
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}
impl Color {
    pub const fn other(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub const fn is_white(self) -> bool {
        match self {
            Color::White => true,
            Color::Black => false,
        }
    }

    /// The row change of a single pawn step
    pub const fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// The row this color's pawns start on
    pub const fn pawn_row(self) -> u8 {
        match self {
            Color::White => 2,
            Color::Black => 7,
        }
    }

    /// The row this color's pieces start on, which is where the opponent promotes
    pub const fn back_row(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 8,
        }
    }

    /// The row this color's pawns promote on
    pub const fn promotion_row(self) -> u8 {
        self.other().back_row()
    }

    /// The single letter used to prefix pieces on the console board
    pub const fn letter(self) -> char {
        match self {
            Color::White => 'W',
            Color::Black => 'B',
        }
    }
}
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Color::White => "White",
            Color::Black => "Black",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("column {0:?} is outside a-h")]
    Column(char),
    #[error("row {0} is outside 1-8")]
    Row(i16),
    #[error("square {0:?} is not of the form <column><row>")]
    Malformed(String),
}

/// A square on the board, `a1` through `h8`
///
/// Every constructor validates its input, so a `Position` always names a real square.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    column: char,
    row: u8,
}

macro_rules! named_positions {
    ($($name:ident = ($column:literal, $row:literal),)*) => {
        impl Position {
            $(pub const $name: Self = Self { column: $column, row: $row };)*
        }
    };
}

named_positions! {
    A1 = ('a', 1), B1 = ('b', 1), C1 = ('c', 1), D1 = ('d', 1),
    E1 = ('e', 1), F1 = ('f', 1), G1 = ('g', 1), H1 = ('h', 1),
    A2 = ('a', 2), B2 = ('b', 2), C2 = ('c', 2), D2 = ('d', 2),
    E2 = ('e', 2), F2 = ('f', 2), G2 = ('g', 2), H2 = ('h', 2),
    A3 = ('a', 3), B3 = ('b', 3), C3 = ('c', 3), D3 = ('d', 3),
    E3 = ('e', 3), F3 = ('f', 3), G3 = ('g', 3), H3 = ('h', 3),
    A4 = ('a', 4), B4 = ('b', 4), C4 = ('c', 4), D4 = ('d', 4),
    E4 = ('e', 4), F4 = ('f', 4), G4 = ('g', 4), H4 = ('h', 4),
    A5 = ('a', 5), B5 = ('b', 5), C5 = ('c', 5), D5 = ('d', 5),
    E5 = ('e', 5), F5 = ('f', 5), G5 = ('g', 5), H5 = ('h', 5),
    A6 = ('a', 6), B6 = ('b', 6), C6 = ('c', 6), D6 = ('d', 6),
    E6 = ('e', 6), F6 = ('f', 6), G6 = ('g', 6), H6 = ('h', 6),
    A7 = ('a', 7), B7 = ('b', 7), C7 = ('c', 7), D7 = ('d', 7),
    E7 = ('e', 7), F7 = ('f', 7), G7 = ('g', 7), H7 = ('h', 7),
    A8 = ('a', 8), B8 = ('b', 8), C8 = ('c', 8), D8 = ('d', 8),
    E8 = ('e', 8), F8 = ('f', 8), G8 = ('g', 8), H8 = ('h', 8),
}

impl Position {
    /// Build a position from a column letter and a 1-based row
    ///
    /// ```
    /// use board::{Position, PositionError};
    /// assert_eq!(Position::new('e', 4), Ok(Position::E4));
    /// assert_eq!(Position::new('i', 4), Err(PositionError::Column('i')));
    /// assert_eq!(Position::new('a', 9), Err(PositionError::Row(9)));
    /// ```
    pub const fn new(column: char, row: u8) -> Result<Self, PositionError> {
        if !matches!(column, 'a'..='h') {
            return Err(PositionError::Column(column));
        }
        if row < 1 || row > 8 {
            return Err(PositionError::Row(row as i16));
        }
        Ok(Self { column, row })
    }

    /// Build a position from 0-based column and row indices, if they are on the board
    pub const fn from_indices(column: u8, row: u8) -> Option<Self> {
        if column < 8 && row < 8 {
            Some(Self {
                column: (b'a' + column) as char,
                row: row + 1,
            })
        } else {
            None
        }
    }

    pub const fn column(self) -> char {
        self.column
    }

    pub const fn row(self) -> u8 {
        self.row
    }

    /// The column as an index, `a` being 0
    pub const fn column_index(self) -> u8 {
        self.column as u8 - b'a'
    }

    /// The row as an index, row 1 being 0
    pub const fn row_index(self) -> u8 {
        self.row - 1
    }

    /// Move by the given number of columns and rows, if the result is still on the board
    ///
    /// ```
    /// use board::Position;
    /// assert_eq!(Position::A1.offset(3, 1), Some(Position::D2));
    /// assert_eq!(Position::D2.offset(-3, -1), Some(Position::A1));
    /// assert_eq!(Position::D1.offset(0, -1), None);
    /// assert_eq!(Position::H4.offset(1, 0), None);
    /// ```
    pub const fn offset(self, columns: i8, rows: i8) -> Option<Self> {
        let column = self.column_index() as i8 + columns;
        let row = self.row_index() as i8 + rows;
        if column < 0 || row < 0 {
            return None;
        }
        Self::from_indices(column as u8, row as u8)
    }

    /// Signed `(columns, rows)` needed to get from `self` to `other`
    pub const fn delta_to(self, other: Self) -> (i8, i8) {
        (
            other.column_index() as i8 - self.column_index() as i8,
            other.row as i8 - self.row as i8,
        )
    }

    /// The same column on another row
    pub fn with_row(self, row: u8) -> Result<Self, PositionError> {
        Self::new(self.column, row)
    }

    /// The same row in another column
    pub fn with_column(self, column: char) -> Result<Self, PositionError> {
        Self::new(column, self.row)
    }

    /// An iterator over all squares on the board, `a1, b1, ..., h8`
    ///
    /// ```
    /// assert_eq!(board::Position::all().count(), 64);
    /// ```
    pub fn all() -> impl Iterator<Item = Self> {
        (0..64).filter_map(|idx| Self::from_indices(idx & 0x07, idx >> 3))
    }
}
impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({}{})", self.column, self.row)
    }
}
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column, self.row)
    }
}
impl FromStr for Position {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(column), Some(row), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(PositionError::Malformed(s.to_string()));
        };
        let Some(row) = row.to_digit(10) else {
            return Err(PositionError::Malformed(s.to_string()));
        };
        Self::new(column, row as u8)
    }
}

/// A piece, and the square it stands on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    color: Color,
    position: Position,
}
impl Piece {
    /// Make a piece of the given kind and color, standing at `position`
    pub const fn new(kind: PieceKind, color: Color, position: Position) -> Self {
        Self {
            kind,
            color,
            position,
        }
    }

    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    pub const fn color(&self) -> Color {
        self.color
    }

    pub const fn position(&self) -> Position {
        self.position
    }

    pub const fn value(&self) -> Option<u8> {
        self.kind.value()
    }

    pub const fn symbol(&self) -> char {
        self.kind.symbol()
    }

    /// Relocate the piece to `to`
    ///
    /// This only updates the recorded position. The board has to be updated separately.
    pub fn move_to(&mut self, to: Position) {
        self.position = to;
    }

    /// Relocate the piece onto a captured piece's square
    ///
    /// Has the same effect as [`Self::move_to`]; removing the captured piece is up to the board.
    pub fn capture(&mut self, to: Position) {
        self.position = to;
    }
}
impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.color.letter(), self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_name_round_trip() {
        for position in Position::all() {
            assert_eq!(position, Position::from_str(&position.to_string()).unwrap());
        }
    }

    #[test]
    fn test_position_rejects_malformed() {
        assert_eq!(Position::from_str("i1"), Err(PositionError::Column('i')));
        assert_eq!(Position::from_str("a0"), Err(PositionError::Row(0)));
        assert!(matches!(
            Position::from_str("a10"),
            Err(PositionError::Malformed(_))
        ));
        assert!(matches!(
            Position::from_str("E"),
            Err(PositionError::Malformed(_))
        ));
    }

    #[test]
    fn test_delta_to() {
        assert_eq!(Position::E2.delta_to(Position::E4), (0, 2));
        assert_eq!(Position::G8.delta_to(Position::F6), (-1, -2));
    }

    #[test]
    fn test_piece_values() {
        assert_eq!(PieceKind::Pawn.value(), Some(1));
        assert_eq!(PieceKind::Knight.value(), Some(3));
        assert_eq!(PieceKind::Bishop.value(), Some(3));
        assert_eq!(PieceKind::Rook.value(), Some(5));
        assert_eq!(PieceKind::Queen.value(), Some(9));
        assert_eq!(PieceKind::King.value(), None);
    }

    #[test]
    fn test_symbols_parse_back() {
        for kind in PieceKind::KINDS {
            assert_eq!(PieceKind::from_symbol(kind.symbol()), Some(kind));
            assert_eq!(
                PieceKind::from_symbol(kind.symbol().to_ascii_lowercase()),
                Some(kind)
            );
        }
        assert_eq!(PieceKind::from_symbol('x'), None);
    }

    #[test]
    fn test_move_and_capture_both_relocate() {
        let mut moved = Piece::new(PieceKind::Rook, Color::White, Position::A1);
        let mut captured = moved;
        moved.move_to(Position::A5);
        captured.capture(Position::A5);
        assert_eq!(moved, captured);
        assert_eq!(moved.position(), Position::A5);
    }

    quickcheck::quickcheck! {
        fn prop_offset_stays_on_board(idx: u8, columns: i8, rows: i8) -> bool {
            let Some(start) = Position::from_indices(idx % 8, (idx / 8) % 8) else {
                return false;
            };
            let columns = columns % 8;
            let rows = rows % 8;
            match start.offset(columns, rows) {
                Some(end) => start.delta_to(end) == (columns, rows),
                None => {
                    let column = start.column_index() as i8 + columns;
                    let row = start.row_index() as i8 + rows;
                    !(0..8).contains(&column) || !(0..8).contains(&row)
                }
            }
        }
    }
}
