use std::{io, path::PathBuf, process::ExitCode};

use backend::{Session, SessionError};
use clap::Parser;
use env_logger::Env;
use log::info;
use notation::GameLog;
use rules::{GameManager, MoveHistory};

/// Two-player chess in the terminal
#[derive(Parser)]
#[command(name = "chess", version, about)]
struct Cli {
    /// Where saved games are kept
    #[arg(long, env = "CHESS_GAMES_DIR", default_value = "games")]
    games_dir: PathBuf,
    /// Resume the saved game with this file name
    #[arg(long, value_name = "FILE", conflicts_with = "no_save")]
    load: Option<String>,
    /// List the saved games and exit
    #[arg(long)]
    list: bool,
    /// Don't save the game
    #[arg(long)]
    no_save: bool,
}

fn main() -> ExitCode {
    let env = Env::default().filter_or("CHESS_LOG", "warn");
    env_logger::Builder::from_env(env).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), SessionError> {
    if cli.list {
        for name in notation::list_saved_games(&cli.games_dir)? {
            println!("{name}");
        }
        return Ok(());
    }

    let input = io::stdin().lock();
    let output = io::stdout().lock();
    if cli.no_save {
        let game = GameManager::new(MoveHistory::new());
        return Session::new(game, input, output).run();
    }
    let (log, moves) = match &cli.load {
        Some(name) => GameLog::load(&cli.games_dir, name)?,
        None => (GameLog::create(&cli.games_dir)?, Vec::new()),
    };
    info!("Recording the game in {}", log.path().display());
    let mut session = Session::new(GameManager::new(log), input, output);
    session.replay(&moves)?;
    session.run()
}
