//! The state of a game in progress
//!
//! [`GameManager`] is the only thing that changes the board. Every call to
//! [`GameManager::move_piece`] either commits one whole move or leaves the game exactly as it
//! was.

use board::{Board, Color, Piece, PieceKind, Position};
use log::{debug, info};

use crate::{
    CastleRights, CastleSquares, CheckStatus, Error, GameResult, MoveInfo, MoveKind, MoveManager,
    MoveReport, MoveStatus, Recorder, Rejection, Result,
};

/// Runs a game: sequences the turns, enforces the rules and spots the end of the game
#[derive(Debug)]
pub struct GameManager<R> {
    board: Board,
    recorder: R,
    side_to_move: Color,
    /// The number of turns elapsed in the game, starting at 1
    turn_number: u16,
    last_move_kind: Option<MoveKind>,
    /// The last move committed through this manager, replays included
    last_move: Option<MoveInfo>,
    castle_rights: CastleRights,
    result: Option<GameResult>,
}

impl<R: Recorder> GameManager<R> {
    /// Start a game from the standard position
    pub fn new(recorder: R) -> Self {
        Self::with_board(Board::standard(), Color::White, recorder)
    }

    /// Start a game from an arbitrary position
    ///
    /// Castling rights are inferred from the board: kings and rooks on their starting squares
    /// are taken to not have moved. The recorder may still veto them.
    pub fn with_board(board: Board, side_to_move: Color, recorder: R) -> Self {
        Self {
            castle_rights: CastleRights::from_board(&board),
            board,
            recorder,
            side_to_move,
            turn_number: 1,
            last_move_kind: None,
            last_move: None,
            result: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Look up a square by its column letter and row number
    pub fn piece_at_coords(&self, column: char, row: u8) -> Result<Option<&Piece>> {
        Ok(self.board.piece_at_coords(column, row)?)
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut R {
        &mut self.recorder
    }

    pub fn current_turn_color(&self) -> Color {
        self.side_to_move
    }

    pub fn turn_number(&self) -> u16 {
        self.turn_number
    }

    /// How the last accepted move was classified, with check and mate taking precedence
    pub fn last_move_kind(&self) -> Option<MoveKind> {
        self.last_move_kind
    }

    pub fn castle_rights(&self) -> CastleRights {
        self.castle_rights
    }

    /// How the game ended, if it has
    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    /// The oracle for the current position
    ///
    /// Falls back to the recorder's history when nothing has been played through this manager
    /// yet, e.g. when a game was just loaded.
    fn move_manager(&self) -> MoveManager {
        MoveManager::new(self.last_move.or_else(|| self.recorder.last_move()))
    }

    /// Whether moving from `from` to `to` would promote a pawn
    ///
    /// Drivers use this to know when to ask for the piece to promote into.
    pub fn is_promotion_move(&self, from: Position, to: Position) -> bool {
        self.board.piece_at(from).is_some_and(|piece| {
            piece.kind() == PieceKind::Pawn && to.row() == piece.color().promotion_row()
        })
    }

    /// Move the piece on `from` to `to`, promoting into a queen if it's a pawn reaching the end
    ///
    /// See [`Self::move_piece_promoting`].
    pub fn move_piece(&mut self, from: Position, to: Position, replay: bool) -> Result<MoveStatus> {
        self.move_piece_promoting(from, to, None, replay)
    }

    /// Move the piece on `from` to `to`
    ///
    /// A pawn reaching the far row is promoted into `promotion`, or a queen if that isn't
    /// something a pawn can promote into.
    ///
    /// When `replay` is set, the move is part of reconstructing a saved game: whose turn it is
    /// and whether the king is left in check are not enforced, and nothing is recorded.
    ///
    /// Returns `Err(..)` if there is no piece on `from`. Illegal moves are
    /// `Ok(MoveStatus::Rejected(..))` and leave the game untouched.
    pub fn move_piece_promoting(
        &mut self,
        from: Position,
        to: Position,
        promotion: Option<PieceKind>,
        replay: bool,
    ) -> Result<MoveStatus> {
        let Some(&piece) = self.board.piece_at(from) else {
            return Err(Error::NoPieceAt(from));
        };
        let color = piece.color();
        if !replay && color != self.side_to_move {
            debug!("{color} tried to move {from} -> {to} on {}'s turn", self.side_to_move);
            return Ok(MoveStatus::Rejected(Rejection::WrongTurn(self.side_to_move)));
        }
        if !replay && self.with_trial_move(from, to, |game| game.is_king_in_check(color)) {
            debug!("{from} -> {to} would leave the {color} king in check");
            return Ok(MoveStatus::Rejected(Rejection::ExposesKing));
        }

        if piece.kind() == PieceKind::King && from.delta_to(to).0.abs() == 2 {
            let Some(castle) = CastleSquares::for_king_move(color, from, to)
                .filter(|castle| self.can_castle(castle, !replay))
            else {
                debug!("{color} can't castle {from} -> {to}");
                return Ok(MoveStatus::Rejected(Rejection::IllegalCastle));
            };
            self.castle(&castle)?;
            let mv = MoveInfo {
                kind: PieceKind::King,
                color,
                from,
                to,
            };
            if !replay {
                self.recorder
                    .record_move(self.turn_number, mv, castle.notation());
            }
            self.last_move = Some(mv);
            return Ok(self.finish_move(MoveKind::Castle, replay));
        }

        let manager = self.move_manager();
        if !manager.is_valid_move(from, to, &self.board, &piece) {
            debug!("{} can't move {from} -> {to}", piece.kind());
            return Ok(MoveStatus::Rejected(Rejection::IllegalMove));
        }

        let mut kind = MoveKind::Move;
        if manager.is_en_passant(&piece, from, to, &self.board) {
            if let Some(victim) = MoveManager::en_passant_victim(from, to) {
                self.board.remove_piece(victim);
                kind = MoveKind::Capture;
            }
        } else if self.board.remove_piece(to) {
            kind = MoveKind::Capture;
        }
        let mut mover = self.board.take_piece(from).ok_or(Error::NoPieceAt(from))?;
        if kind == MoveKind::Capture {
            mover.capture(to);
        } else {
            mover.move_to(to);
        }
        self.board.put_piece(mover);
        self.castle_rights = self
            .castle_rights
            .after_move(piece.kind(), color, from, to);

        let mv = MoveInfo {
            kind: piece.kind(),
            color,
            from,
            to,
        };
        let mut special = String::new();
        if piece.kind() == PieceKind::Pawn && to.row() == color.promotion_row() {
            let promoted = self.promote(to, color, promotion);
            special = format!("{from} -> {to}={}", promoted.symbol());
            kind = MoveKind::Promotion;
        }
        if !replay {
            self.recorder.record_move(self.turn_number, mv, &special);
        }
        self.last_move = Some(mv);
        info!("{color} {} {from} -> {to} ({kind:?})", piece.kind());
        Ok(self.finish_move(kind, replay))
    }

    /// Hand the move over to the other side and see where that leaves them
    fn finish_move(&mut self, kind: MoveKind, replay: bool) -> MoveStatus {
        self.side_to_move = self.side_to_move.other();
        if self.side_to_move == Color::White {
            self.turn_number += 1;
        }
        let defender = self.side_to_move;
        let in_check = self.is_king_in_check(defender);
        let can_move = self.has_legal_move(defender);
        let check = match (in_check, can_move) {
            (true, false) => CheckStatus::Checkmate,
            (true, true) => CheckStatus::Check,
            (false, _) => CheckStatus::None,
        };
        let result = if check == CheckStatus::Checkmate {
            Some(GameResult::win_for(defender.other()))
        } else if !can_move || self.has_insufficient_material() {
            Some(GameResult::Draw)
        } else {
            None
        };
        self.last_move_kind = Some(match check {
            CheckStatus::Checkmate => MoveKind::Mate,
            CheckStatus::Check => MoveKind::Check,
            CheckStatus::None => kind,
        });
        if let Some(result) = result {
            info!("Game over: {result}");
            self.result = Some(result);
            if !replay {
                self.recorder.record_result(result);
            }
        }
        MoveStatus::Accepted(MoveReport { kind, check })
    }

    /// Replace the pawn on `at` with a freshly made piece
    fn promote(&mut self, at: Position, color: Color, choice: Option<PieceKind>) -> PieceKind {
        let kind = choice
            .filter(|kind| kind.is_promotable())
            .unwrap_or(PieceKind::Queen);
        self.board.remove_piece(at);
        self.board.put_piece(Piece::new(kind, color, at));
        info!("{color} pawn on {at} promoted to {kind}");
        kind
    }

    /// Whether the given castle is allowed right now
    ///
    /// A loaded game's recorder already holds the moves being replayed, so it is only consulted
    /// when `consult_recorder` is set.
    fn can_castle(&self, castle: &CastleSquares, consult_recorder: bool) -> bool {
        let color = castle.color;
        let in_place = |square: Position, kind: PieceKind| {
            self.board
                .piece_at(square)
                .is_some_and(|piece| piece.kind() == kind && piece.color() == color)
        };
        self.castle_rights
            .contains(CastleRights::side(color, castle.kingside))
            && !(consult_recorder
                && (self.recorder.has_piece_moved(
                    PieceKind::King,
                    color,
                    castle.king_from.column(),
                ) || self.recorder.has_piece_moved(
                    PieceKind::Rook,
                    color,
                    castle.rook_from.column(),
                )))
            && in_place(castle.king_from, PieceKind::King)
            && in_place(castle.rook_from, PieceKind::Rook)
            && castle.between().all(|square| !self.board.is_occupied(square))
            && castle
                .king_path()
                .into_iter()
                .all(|square| !self.is_square_under_attack(square, color))
    }

    /// Move the king and rook for a castle that [`Self::can_castle`] allowed
    fn castle(&mut self, castle: &CastleSquares) -> Result<()> {
        let mut king = self
            .board
            .take_piece(castle.king_from)
            .ok_or(Error::NoPieceAt(castle.king_from))?;
        let Some(mut rook) = self.board.take_piece(castle.rook_from) else {
            self.board.put_piece(king);
            return Err(Error::NoPieceAt(castle.rook_from));
        };
        king.move_to(castle.king_to);
        rook.move_to(castle.rook_to);
        self.board.put_piece(king);
        self.board.put_piece(rook);
        self.castle_rights &= !CastleRights::color(castle.color);
        info!("{} castled {}", castle.color, castle.notation());
        Ok(())
    }

    /// Play `from` -> `to` on the board, run `f` on the result, then take the move back
    ///
    /// Captures, en passant included, are taken off for the duration. The board is always
    /// restored before returning, whatever `f` finds.
    fn with_trial_move<T>(&mut self, from: Position, to: Position, f: impl FnOnce(&Self) -> T) -> T {
        let Some(&piece) = self.board.piece_at(from) else {
            return f(&*self);
        };
        let captured_at = if self.board.is_occupied(to) {
            Some(to)
        } else if self
            .move_manager()
            .is_en_passant(&piece, from, to, &self.board)
        {
            MoveManager::en_passant_victim(from, to)
        } else {
            None
        };
        let captured = captured_at.and_then(|square| self.board.take_piece(square));
        if let Some(mut mover) = self.board.take_piece(from) {
            mover.move_to(to);
            self.board.put_piece(mover);
        }

        let result = f(&*self);

        if let Some(mut mover) = self.board.take_piece(to) {
            mover.move_to(from);
            self.board.put_piece(mover);
        }
        if let Some(captured) = captured {
            self.board.put_piece(captured);
        }
        result
    }

    /// Whether any piece of the other color than `defending` threatens `position`
    ///
    /// Whose turn it is, and whether the attacker is pinned, don't matter.
    pub fn is_square_under_attack(&self, position: Position, defending: Color) -> bool {
        let manager = self.move_manager();
        self.board
            .pieces()
            .filter(|piece| piece.color() != defending)
            .any(|piece| manager.attacks(piece.position(), position, &self.board, piece))
    }

    /// Whether the king of `color` is attacked
    ///
    /// A side without a king is never in check.
    pub fn is_king_in_check(&self, color: Color) -> bool {
        self.board
            .find_king(color)
            .is_some_and(|king| self.is_square_under_attack(king, color))
    }

    /// Every move the pieces of `color` could make, ignoring checks and castling
    fn candidate_moves(&self, color: Color) -> Vec<(Position, Position)> {
        let manager = self.move_manager();
        let board = &self.board;
        board
            .pieces()
            .filter(|piece| piece.color() == color)
            .flat_map(move |piece| {
                let from = piece.position();
                Position::all()
                    .filter(move |&to| manager.is_valid_move(from, to, board, piece))
                    .map(move |to| (from, to))
            })
            .collect()
    }

    /// Whether `from` -> `to` leaves the mover's king safe
    fn keeps_king_safe(&mut self, from: Position, to: Position, color: Color) -> bool {
        !self.with_trial_move(from, to, |game| game.is_king_in_check(color))
    }

    /// Whether `color` has any legal move at all
    fn has_legal_move(&mut self, color: Color) -> bool {
        // Castling never matters here: if a castle is legal, so is the king's step towards the
        // rook
        self.candidate_moves(color)
            .into_iter()
            .any(|(from, to)| self.keeps_king_safe(from, to, color))
    }

    /// Every legal move for `color`, castling included, as `(from, to)` pairs
    pub fn legal_moves(&mut self, color: Color) -> Vec<(Position, Position)> {
        let mut moves = self.candidate_moves(color);
        moves.retain(|&(from, to)| self.keeps_king_safe(from, to, color));
        for kingside in [true, false] {
            let castle = CastleSquares::new(color, kingside);
            if self.can_castle(&castle, true) {
                moves.push((castle.king_from, castle.king_to));
            }
        }
        moves
    }

    /// Whether `color` is in check and no move gets them out of it
    ///
    /// Tries every move of every piece of `color` on the board and takes it back again, so the
    /// board is unchanged afterwards.
    pub fn is_checkmate(&mut self, color: Color) -> bool {
        self.is_king_in_check(color) && !self.has_legal_move(color)
    }

    /// Whether `color` is not in check but has no legal move
    pub fn is_stalemate(&mut self, color: Color) -> bool {
        !self.is_king_in_check(color) && !self.has_legal_move(color)
    }

    /// Whether neither side can possibly mate
    ///
    /// That is the case with only kings left, with one knight or bishop besides the kings, or
    /// with one bishop each on squares of the same shade.
    pub fn has_insufficient_material(&self) -> bool {
        let mut minors = Vec::with_capacity(2);
        for piece in self.board.pieces() {
            match piece.kind() {
                PieceKind::King => {}
                kind if kind.is_minor() => minors.push(piece),
                _ => return false,
            }
        }
        match minors.as_slice() {
            [] | [_] => true,
            [first, second] => {
                first.kind() == PieceKind::Bishop
                    && second.kind() == PieceKind::Bishop
                    && first.color() != second.color()
                    && self.board.shade(first.position()) == self.board.shade(second.position())
            }
            _ => false,
        }
    }
}
