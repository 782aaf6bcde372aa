//! The interactive loop: read moves from a player, play them, and report how the game goes

use core::str::FromStr;
use std::io::{self, BufRead, Write};

use board::{PieceKind, Position, PositionError};
use log::{debug, info};
use notation::{LogError, LoggedMove};
use rules::{CheckStatus, GameManager, GameResult, MoveStatus, Recorder, Rejection};

/// Something the player typed that isn't a command
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("expected a move like `e2 e4`, found {0:?}")]
    Shape(String),
    #[error(transparent)]
    Position(#[from] PositionError),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Log(#[from] LogError),
    #[error(transparent)]
    Rules(#[from] rules::Error),
    #[error("can't replay turn {} ({mv}) from the saved game: {why}", .mv.turn)]
    BadReplay { mv: LoggedMove, why: Rejection },
}

/// A line of player input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Move the piece on `from` to `to`, written as `e2 e4`
    Move { from: Position, to: Position },
    /// List the legal moves
    Moves,
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "quit" | "exit" => Ok(Self::Quit),
            "moves" => Ok(Self::Moves),
            text => {
                let Some((from, to)) = text
                    .split_once(' ')
                    .filter(|(from, to)| from.len() == 2 && to.len() == 2)
                else {
                    return Err(CommandError::Shape(text.to_string()));
                };
                Ok(Self::Move {
                    from: from.parse()?,
                    to: to.parse()?,
                })
            }
        }
    }
}

/// A game played over a pair of text streams, usually stdin and stdout
pub struct Session<L, I, O> {
    game: GameManager<L>,
    input: I,
    output: O,
}

impl<L: Recorder, I: BufRead, O: Write> Session<L, I, O> {
    pub fn new(game: GameManager<L>, input: I, output: O) -> Self {
        Self {
            game,
            input,
            output,
        }
    }

    pub fn game(&self) -> &GameManager<L> {
        &self.game
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// Play the moves of a saved game, without recording them again
    pub fn replay(&mut self, moves: &[LoggedMove]) -> Result<(), SessionError> {
        for mv in moves {
            let status = self
                .game
                .move_piece_promoting(mv.from, mv.to, mv.promotion, true)?;
            if let MoveStatus::Rejected(why) = status {
                return Err(SessionError::BadReplay { mv: *mv, why });
            }
        }
        info!("Replayed {} moves", moves.len());
        Ok(())
    }

    /// Play until the game ends, the player quits or the input runs out
    pub fn run(&mut self) -> Result<(), SessionError> {
        if let Some(result) = self.game.result() {
            writeln!(self.output, "{}\nThis game is already over: {result}", self.game.board())?;
            return Ok(());
        }
        loop {
            writeln!(self.output, "\n{}", self.game.board())?;
            write!(self.output, "{} to move: ", self.game.current_turn_color())?;
            self.output.flush()?;
            let Some(line) = self.read_line()? else {
                debug!("Input closed");
                return Ok(());
            };
            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(err) => {
                    writeln!(
                        self.output,
                        "{err}\nEnter a move like `e2 e4`, `moves` or `quit`."
                    )?;
                    continue;
                }
            };
            match command {
                Command::Quit => return Ok(()),
                Command::Moves => self.list_moves()?,
                Command::Move { from, to } => {
                    if self.play(from, to)? {
                        writeln!(self.output, "\n{}", self.game.board())?;
                        return Ok(());
                    }
                }
            }
        }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn list_moves(&mut self) -> Result<(), SessionError> {
        let color = self.game.current_turn_color();
        let moves: Vec<_> = self
            .game
            .legal_moves(color)
            .into_iter()
            .map(|(from, to)| format!("{from} {to}"))
            .collect();
        writeln!(self.output, "{}", moves.join(", "))?;
        Ok(())
    }

    /// Ask which piece a pawn becomes, a queen unless the player picks something else
    fn ask_promotion(&mut self) -> Result<PieceKind, SessionError> {
        write!(self.output, "Promote to (Q/R/B/N): ")?;
        self.output.flush()?;
        let line = self.read_line()?.unwrap_or_default();
        let mut chars = line.chars();
        let choice = match (chars.next(), chars.next()) {
            (Some(symbol), None) => {
                PieceKind::from_symbol(symbol).filter(|kind| kind.is_promotable())
            }
            _ => None,
        };
        Ok(choice.unwrap_or(PieceKind::Queen))
    }

    /// Try a move, and return whether the game is over
    fn play(&mut self, from: Position, to: Position) -> Result<bool, SessionError> {
        let color = self.game.current_turn_color();
        let promotion = if self.game.is_promotion_move(from, to)
            && self.game.legal_moves(color).contains(&(from, to))
        {
            Some(self.ask_promotion()?)
        } else {
            None
        };
        let status = match self.game.move_piece_promoting(from, to, promotion, false) {
            Ok(status) => status,
            Err(err) => {
                writeln!(self.output, "{err}")?;
                return Ok(false);
            }
        };
        let report = match status {
            MoveStatus::Accepted(report) => report,
            MoveStatus::Rejected(why) => {
                writeln!(self.output, "Illegal move: {why}")?;
                return Ok(false);
            }
        };

        let defender = self.game.current_turn_color();
        if report.check == CheckStatus::Check {
            writeln!(self.output, "{defender} is in check!")?;
        }
        let Some(result) = self.game.result() else {
            return Ok(false);
        };
        match result {
            GameResult::Draw if self.game.has_insufficient_material() => {
                writeln!(self.output, "Draw: neither side can checkmate.")?
            }
            GameResult::Draw => writeln!(self.output, "Stalemate! {defender} has no legal move.")?,
            _ => writeln!(self.output, "Checkmate! {} wins.", defender.other())?,
        }
        writeln!(self.output, "Result: {result}")?;
        Ok(true)
    }
}
