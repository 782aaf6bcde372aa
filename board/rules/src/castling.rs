//! Bookkeeping for castling

use board::{Board, Color, PieceKind, Position};

bitflags::bitflags! {
    /// Which castles are allowed (the king and rook haven't moved yet)
    ///
    /// These castles aren't necessarily legal right now, as it may be blocked by intervening
    /// pieces and/or checks.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CastleRights: u8 {
        const WhiteKingside = 0b0000_0001;
        const WhiteQueenside = 0b0000_0010;
        /// A mask for whether white can castle in either direction
        const White = 0b0000_0011;
        const BlackKingside = 0b0000_0100;
        const BlackQueenside = 0b0000_1000;
        /// A mask for whether black can castle in either direction
        const Black = 0b0000_1100;
    }
}

impl CastleRights {
    /// The right to castle on one side
    pub const fn side(color: Color, kingside: bool) -> Self {
        match (kingside, color) {
            (true, Color::White) => Self::WhiteKingside,
            (false, Color::White) => Self::WhiteQueenside,
            (true, Color::Black) => Self::BlackKingside,
            (false, Color::Black) => Self::BlackQueenside,
        }
    }

    /// Both rights of one color
    pub const fn color(color: Color) -> Self {
        match color {
            Color::White => Self::White,
            Color::Black => Self::Black,
        }
    }

    /// The right lost when something leaves or lands on the given rook corner
    const fn corner(square: Position) -> Self {
        match (square.column(), square.row()) {
            ('a', 1) => Self::WhiteQueenside,
            ('h', 1) => Self::WhiteKingside,
            ('a', 8) => Self::BlackQueenside,
            ('h', 8) => Self::BlackKingside,
            _ => Self::empty(),
        }
    }

    /// Infer the rights from where the pieces stand
    ///
    /// A king on its home square with a rook of its color in the corner is assumed to not have
    /// moved.
    pub fn from_board(board: &Board) -> Self {
        let mut rights = Self::empty();
        for color in [Color::White, Color::Black] {
            for kingside in [true, false] {
                let squares = CastleSquares::new(color, kingside);
                let in_place = |square: Position, kind: PieceKind| {
                    board
                        .piece_at(square)
                        .is_some_and(|piece| piece.kind() == kind && piece.color() == color)
                };
                if in_place(squares.king_from, PieceKind::King)
                    && in_place(squares.rook_from, PieceKind::Rook)
                {
                    rights |= Self::side(color, kingside);
                }
            }
        }
        rights
    }

    /// Update the rights according to a piece moving from `source` to `target`
    pub fn after_move(
        self,
        kind: PieceKind,
        color: Color,
        source: Position,
        target: Position,
    ) -> Self {
        // The piece being moved can't castle anymore
        let rights = match kind {
            PieceKind::King => self & !Self::color(color),
            PieceKind::Rook => self & !Self::corner(source),
            _ => self,
        };
        // Neither can a rook captured in its corner
        rights & !Self::corner(target)
    }
}

/// The squares involved in one castle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CastleSquares {
    pub color: Color,
    pub kingside: bool,
    pub king_from: Position,
    pub king_to: Position,
    pub rook_from: Position,
    pub rook_to: Position,
}

impl CastleSquares {
    /// Black is castling to their queen side
    pub const BLACK_QUEENSIDE: Self = Self {
        color: Color::Black,
        kingside: false,
        king_from: Position::E8,
        king_to: Position::C8,
        rook_from: Position::A8,
        rook_to: Position::D8,
    };
    /// Black is castling to their king side
    pub const BLACK_KINGSIDE: Self = Self {
        color: Color::Black,
        kingside: true,
        king_from: Position::E8,
        king_to: Position::G8,
        rook_from: Position::H8,
        rook_to: Position::F8,
    };
    /// White is castling to their queen side
    pub const WHITE_QUEENSIDE: Self = Self {
        color: Color::White,
        kingside: false,
        king_from: Position::E1,
        king_to: Position::C1,
        rook_from: Position::A1,
        rook_to: Position::D1,
    };
    /// White is castling to their king side
    pub const WHITE_KINGSIDE: Self = Self {
        color: Color::White,
        kingside: true,
        king_from: Position::E1,
        king_to: Position::G1,
        rook_from: Position::H1,
        rook_to: Position::F1,
    };

    pub const fn new(color: Color, kingside: bool) -> Self {
        match (color, kingside) {
            (Color::White, true) => Self::WHITE_KINGSIDE,
            (Color::White, false) => Self::WHITE_QUEENSIDE,
            (Color::Black, true) => Self::BLACK_KINGSIDE,
            (Color::Black, false) => Self::BLACK_QUEENSIDE,
        }
    }

    /// The castle a king moving from `from` to `to` would be, if any
    pub fn for_king_move(color: Color, from: Position, to: Position) -> Option<Self> {
        [Self::new(color, true), Self::new(color, false)]
            .into_iter()
            .find(|castle| castle.king_from == from && castle.king_to == to)
    }

    /// How the castle is written in the move log
    pub const fn notation(&self) -> &'static str {
        if self.kingside {
            "O-O"
        } else {
            "O-O-O"
        }
    }

    /// Squares strictly between the king and the rook, which must all be empty
    pub fn between(&self) -> impl Iterator<Item = Position> {
        let row = self.king_from.row_index();
        let (low, high) = if self.kingside {
            (self.king_from.column_index(), self.rook_from.column_index())
        } else {
            (self.rook_from.column_index(), self.king_from.column_index())
        };
        (low + 1..high).filter_map(move |column| Position::from_indices(column, row))
    }

    /// The king's origin, the square it passes and its destination, none of which may be
    /// attacked
    pub const fn king_path(&self) -> [Position; 3] {
        [self.king_from, self.rook_to, self.king_to]
    }
}
