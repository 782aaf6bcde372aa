//! Game logs in a human-readable notation
//!
//! A log looks like this:
//!
//! ```text
//! [Started "1700000000"]
//! 1. e2 -> e4 | e7 -> e5
//! 2. Ng1 -> Nf3 | Nb8 -> Nc6
//! 3. O-O | e5 -> e4
//!
//! Result: 1-0
//! ```
//!
//! [`GameLog`] writes one as a game goes, and reads it back so the game can be resumed.

use core::fmt;
use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use board::{Color, PieceKind, Position};
use log::{debug, info, warn};
use rules::{CastleSquares, GameResult, MoveHistory, MoveInfo, Recorder};

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("no saved game at {}", .0.display())]
    Missing(PathBuf),
}

/// One move as written in a log
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoggedMove {
    pub turn: u16,
    pub color: Color,
    pub kind: PieceKind,
    pub from: Position,
    pub to: Position,
    /// What a pawn was promoted into
    pub promotion: Option<PieceKind>,
    /// Whether this was a castle, in which case `from` and `to` are the king's squares
    pub castle: bool,
}

impl LoggedMove {
    pub const fn info(&self) -> MoveInfo {
        MoveInfo {
            kind: self.kind,
            color: self.color,
            from: self.from,
            to: self.to,
        }
    }

    /// The special notation the engine gave this move, empty for ordinary moves
    pub fn special(&self) -> String {
        if self.castle {
            let kingside = self.to.column_index() > self.from.column_index();
            CastleSquares::new(self.color, kingside).notation().to_string()
        } else if let Some(promotion) = self.promotion {
            format!("{} -> {}={}", self.from, self.to, promotion.symbol())
        } else {
            String::new()
        }
    }
}

/// Writes the move the way it appears in the log
impl fmt::Display for LoggedMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&move_text(&self.info(), &self.special()))
    }
}

/// The text of one move in the log
///
/// Pieces other than pawns are prefixed with their symbol, e.g. `Ng1 -> Nf3`.
fn move_text(mv: &MoveInfo, special: &str) -> String {
    if !special.is_empty() {
        return special.to_string();
    }
    let symbol = match mv.kind {
        PieceKind::Pawn => String::new(),
        kind => kind.symbol().to_string(),
    };
    format!("{symbol}{} -> {symbol}{}", mv.from, mv.to)
}

/// Split a square with an optional piece symbol, like `Nf3` or `e4`
fn split_symbol(text: &str) -> Result<(PieceKind, Position), String> {
    let (kind, square) = match text.chars().next() {
        Some(symbol) if symbol.is_ascii_uppercase() => (
            PieceKind::from_symbol(symbol).ok_or_else(|| format!("unknown piece {symbol:?}"))?,
            &text[symbol.len_utf8()..],
        ),
        _ => (PieceKind::Pawn, text),
    };
    let square = square
        .parse::<Position>()
        .map_err(|err| format!("{text:?}: {err}"))?;
    Ok((kind, square))
}

fn parse_move(text: &str, turn: u16, color: Color) -> Result<LoggedMove, String> {
    let castle = match text {
        "O-O" => Some(true),
        "O-O-O" => Some(false),
        _ => None,
    };
    if let Some(kingside) = castle {
        let squares = CastleSquares::new(color, kingside);
        return Ok(LoggedMove {
            turn,
            color,
            kind: PieceKind::King,
            from: squares.king_from,
            to: squares.king_to,
            promotion: None,
            castle: true,
        });
    }

    let (from, to) = text
        .split_once(" -> ")
        .ok_or_else(|| format!("expected `<from> -> <to>`, found {text:?}"))?;
    let (to, promotion) = match to.split_once('=') {
        Some((to, symbol)) => {
            let kind = symbol
                .chars()
                .next()
                .and_then(PieceKind::from_symbol)
                .filter(|kind| symbol.len() == 1 && kind.is_promotable())
                .ok_or_else(|| format!("can't promote into {symbol:?}"))?;
            (to, Some(kind))
        }
        None => (to, None),
    };
    let (kind, from) = split_symbol(from)?;
    let (to_kind, to) = split_symbol(to)?;
    if kind != to_kind {
        return Err(format!("{kind} turned into {to_kind} in {text:?}"));
    }
    Ok(LoggedMove {
        turn,
        color,
        kind,
        from,
        to,
        promotion,
        castle: false,
    })
}

/// Parse one turn of the log, e.g. `12. Ng1 -> Nf3 | e7 -> e5`
///
/// The black half is missing if the game stopped after white's move.
pub fn parse_turn_line(line: &str) -> Result<Vec<LoggedMove>, String> {
    let (turn, rest) = line.split_once(". ").ok_or("missing turn number")?;
    let turn = turn
        .trim()
        .parse::<u16>()
        .map_err(|err| format!("bad turn number {turn:?}: {err}"))?;
    let (white, black) = rest.split_once('|').unwrap_or((rest, ""));
    let mut moves = vec![parse_move(white.trim(), turn, Color::White)?];
    let black = black.trim();
    if !black.is_empty() {
        moves.push(parse_move(black, turn, Color::Black)?);
    }
    Ok(moves)
}

/// The contents of a log
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedLog {
    pub moves: Vec<LoggedMove>,
    pub result: Option<GameResult>,
}

/// Parse a whole log, skipping the header and blank lines
pub fn parse_log(reader: impl BufRead) -> Result<ParsedLog, LogError> {
    let mut parsed = ParsedLog::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        let parse_error = |reason| LogError::Parse {
            line: idx + 1,
            reason,
        };
        match line.chars().next() {
            None | Some('[') => continue,
            _ => {}
        }
        if let Some(score) = line.strip_prefix("Result:") {
            let result = GameResult::from_score(score.trim())
                .ok_or_else(|| parse_error(format!("unknown result {:?}", score.trim())))?;
            parsed.result = Some(result);
            continue;
        }
        parsed
            .moves
            .extend(parse_turn_line(line).map_err(parse_error)?);
    }
    Ok(parsed)
}

/// The names of the saved games in `games_dir`, sorted
///
/// A directory which doesn't exist yet holds no games.
pub fn list_saved_games(games_dir: impl AsRef<Path>) -> Result<Vec<String>, LogError> {
    let entries = match fs::read_dir(games_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    let mut names = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "txt") {
            if let Some(name) = path.file_name() {
                names.push(name.to_string_lossy().into_owned());
            }
        }
    }
    names.sort();
    Ok(names)
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// A recorder which writes the game to a file as it goes
///
/// Write failures are logged and otherwise ignored, so a game can go on when its log can't.
#[derive(Debug)]
pub struct GameLog {
    path: PathBuf,
    /// `None` once writing has failed
    file: Option<File>,
    history: MoveHistory,
}

impl GameLog {
    /// Start the log for a new game in `games_dir`, creating the directory if needed
    pub fn create(games_dir: impl AsRef<Path>) -> Result<Self, LogError> {
        let games_dir = games_dir.as_ref();
        fs::create_dir_all(games_dir)?;
        let started = unix_secs();
        let mut suffix = 0;
        let (path, file) = loop {
            let name = match suffix {
                0 => format!("game-{started}.txt"),
                n => format!("game-{started}-{n}.txt"),
            };
            let path = games_dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => break (path, file),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
                Err(err) => return Err(err.into()),
            }
        };
        info!("Saving the game to {}", path.display());
        let mut log = Self {
            path,
            file: Some(file),
            history: MoveHistory::new(),
        };
        log.append(&format!("[Started \"{started}\"]\n"));
        Ok(log)
    }

    /// Open the saved game `name` in `games_dir` to continue it
    ///
    /// Returns the log, positioned to append further moves, and the moves to replay.
    pub fn load(
        games_dir: impl AsRef<Path>,
        name: &str,
    ) -> Result<(Self, Vec<LoggedMove>), LogError> {
        let path = games_dir.as_ref().join(name);
        let reader = match File::open(&path) {
            Ok(file) => BufReader::new(file),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(LogError::Missing(path))
            }
            Err(err) => return Err(err.into()),
        };
        let ParsedLog { moves, result } = parse_log(reader)?;
        let mut history = MoveHistory::new();
        for mv in &moves {
            history.record_move(mv.turn, mv.info(), &mv.special());
        }
        if let Some(result) = result {
            history.record_result(result);
        }
        let file = OpenOptions::new().append(true).open(&path)?;
        debug!("Loaded {} moves from {}", moves.len(), path.display());
        Ok((
            Self {
                path,
                file: Some(file),
                history,
            },
            moves,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Everything recorded so far, loaded moves included
    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    pub fn result(&self) -> Option<GameResult> {
        self.history.result()
    }

    fn append(&mut self, text: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        if let Err(err) = file.write_all(text.as_bytes()).and_then(|()| file.flush()) {
            warn!("Failed to write to {}: {err}", self.path.display());
            self.file = None;
        }
    }
}

impl Recorder for GameLog {
    fn last_move(&self) -> Option<MoveInfo> {
        self.history.last_move()
    }

    fn has_piece_moved(&self, kind: PieceKind, color: Color, column: char) -> bool {
        self.history.has_piece_moved(kind, color, column)
    }

    fn record_move(&mut self, turn: u16, mv: MoveInfo, special: &str) {
        let text = move_text(&mv, special);
        let line = match mv.color {
            Color::White => format!("{turn}. {text} | "),
            Color::Black => format!("{text}\n"),
        };
        self.append(&line);
        self.history.record_move(turn, mv, special);
    }

    fn record_result(&mut self, result: GameResult) {
        self.append(&format!("\nResult: {result}\n"));
        self.history.record_result(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use board::{Board, Piece};
    use rules::GameManager;

    /// A fresh directory for one test to write into
    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("chess-notation-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn logged(color: Color, kind: PieceKind, from: Position, to: Position) -> LoggedMove {
        LoggedMove {
            turn: 1,
            color,
            kind,
            from,
            to,
            promotion: None,
            castle: false,
        }
    }

    #[test]
    fn test_parse_turn_line() {
        assert_eq!(
            parse_turn_line("1. e2 -> e4 | Nb8 -> Nc6"),
            Ok(vec![
                logged(Color::White, PieceKind::Pawn, Position::E2, Position::E4),
                logged(Color::Black, PieceKind::Knight, Position::B8, Position::C6),
            ])
        );
        // The game stopped after white's move
        assert_eq!(
            parse_turn_line("1. Ke1 -> Ke2 | "),
            Ok(vec![logged(Color::White, PieceKind::King, Position::E1, Position::E2)])
        );
    }

    #[test]
    fn test_parse_special_moves() {
        let moves = parse_turn_line("14. O-O | O-O-O").unwrap();
        assert_eq!(moves.len(), 2);
        assert!(moves.iter().all(|mv| mv.castle && mv.kind == PieceKind::King));
        assert_eq!((moves[0].from, moves[0].to), (Position::E1, Position::G1));
        assert_eq!((moves[1].from, moves[1].to), (Position::E8, Position::C8));
        assert_eq!(moves[0].turn, 14);
        assert_eq!(moves[1].special(), "O-O-O");

        let moves = parse_turn_line("30. e7 -> e8=Q | b2 -> b1=N").unwrap();
        assert_eq!(moves[0].promotion, Some(PieceKind::Queen));
        assert_eq!(moves[1].promotion, Some(PieceKind::Knight));
        assert_eq!(moves[1].kind, PieceKind::Pawn);
        assert_eq!(moves[1].to_string(), "b2 -> b1=N");
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_turn_line("e2 -> e4").is_err());
        assert!(parse_turn_line("x. e2 -> e4").is_err());
        assert!(parse_turn_line("1. e2 e4").is_err());
        assert!(parse_turn_line("1. e2 -> e9").is_err());
        assert!(parse_turn_line("1. Xe2 -> Xe4").is_err());
        assert!(parse_turn_line("1. Ng1 -> Bf3").is_err());
        assert!(parse_turn_line("1. e7 -> e8=K").is_err());

        let log = "[Started \"0\"]\n1. e2 -> e4 | e7 -> e5\n2. nonsense\n";
        match parse_log(log.as_bytes()) {
            Err(LogError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_log() {
        let log = "[Started \"0\"]\n1. e2 -> e4 | e7 -> e5\n2. Qd1 -> Qh5 | \n\nResult: 1/2-1/2\n";
        let parsed = parse_log(log.as_bytes()).unwrap();
        assert_eq!(parsed.moves.len(), 3);
        assert_eq!(parsed.moves[2].kind, PieceKind::Queen);
        assert_eq!(parsed.moves[2].turn, 2);
        assert_eq!(parsed.result, Some(GameResult::Draw));
    }

    #[test]
    fn test_create_writes_header() {
        let dir = scratch_dir("create");
        let first = GameLog::create(&dir).unwrap();
        let second = GameLog::create(&dir).unwrap();
        assert_ne!(first.path(), second.path());

        let contents = fs::read_to_string(first.path()).unwrap();
        assert!(contents.starts_with("[Started \""));
        assert!(contents.ends_with("\"]\n"));

        let names = list_saved_games(&dir).unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|name| name.starts_with("game-")));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_list_missing_dir() {
        let dir = scratch_dir("missing");
        assert_eq!(list_saved_games(&dir).unwrap(), Vec::<String>::new());
        assert!(matches!(
            GameLog::load(&dir, "game-0.txt"),
            Err(LogError::Missing(_))
        ));
    }

    #[test]
    fn test_log_format() {
        let dir = scratch_dir("format");
        let log = GameLog::create(&dir).unwrap();
        let mut game = GameManager::new(log);
        for (from, to) in [
            (Position::F2, Position::F3),
            (Position::E7, Position::E5),
            (Position::G2, Position::G4),
            (Position::D8, Position::H4),
        ] {
            assert!(game.move_piece(from, to, false).unwrap().is_accepted());
        }
        let contents = fs::read_to_string(game.recorder().path()).unwrap();
        let body = contents.split_once('\n').unwrap().1;
        assert_eq!(
            body,
            "1. f2 -> f3 | e7 -> e5\n2. g2 -> g4 | Qd8 -> Qh4\n\nResult: 0-1\n"
        );
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_saved_game_resumes() {
        let dir = scratch_dir("resume");
        let mut board = Board::empty();
        for piece in [
            Piece::new(PieceKind::King, Color::White, Position::E1),
            Piece::new(PieceKind::Rook, Color::White, Position::H1),
            Piece::new(PieceKind::Pawn, Color::White, Position::B7),
            Piece::new(PieceKind::King, Color::Black, Position::E8),
        ] {
            board.put_piece(piece);
        }

        let log = GameLog::create(&dir).unwrap();
        let mut game = GameManager::with_board(board.clone(), Color::White, log);
        for (from, to, promotion) in [
            (Position::E1, Position::G1, None),
            (Position::E8, Position::D7, None),
            (Position::B7, Position::B8, Some(PieceKind::Knight)),
            (Position::D7, Position::E6, None),
        ] {
            let status = game.move_piece_promoting(from, to, promotion, false).unwrap();
            assert!(status.is_accepted(), "{from} -> {to}: {status:?}");
        }
        let name = game
            .recorder()
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        let contents = fs::read_to_string(game.recorder().path()).unwrap();
        assert!(contents.ends_with("1. O-O | Ke8 -> Kd7\n2. b7 -> b8=N | Kd7 -> Ke6\n"));

        let (log, moves) = GameLog::load(&dir, &name).unwrap();
        assert_eq!(moves.len(), 4);
        assert!(moves[0].castle);
        assert_eq!(moves[2].promotion, Some(PieceKind::Knight));
        assert!(log.has_piece_moved(PieceKind::King, Color::White, 'e'));
        assert!(log.has_piece_moved(PieceKind::Rook, Color::White, 'h'));
        assert_eq!(log.last_move(), Some(moves[3].info()));
        assert_eq!(log.history().moves(), game.recorder().history().moves());

        let mut resumed = GameManager::with_board(board, Color::White, log);
        for mv in &moves {
            let status = resumed
                .move_piece_promoting(mv.from, mv.to, mv.promotion, true)
                .unwrap();
            assert!(status.is_accepted());
        }
        assert_eq!(resumed.board(), game.board());
        assert_eq!(resumed.turn_number(), game.turn_number());

        // Further moves go on the end of the same file
        assert!(resumed
            .move_piece(Position::G1, Position::H1, false)
            .unwrap()
            .is_accepted());
        let contents = fs::read_to_string(resumed.recorder().path()).unwrap();
        assert!(contents.ends_with("Kd7 -> Ke6\n3. Kg1 -> Kh1 | "));
        let _ = fs::remove_dir_all(&dir);
    }
}
