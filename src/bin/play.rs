use std::fs::File;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use ludo_rs::cli::TuiApp;
use ludo_rs::game::Game;
use ludo_rs::presentation::SharedPresentation;
use ludo_rs::GameConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser, Clone)]
#[command(name = "ludo-play")]
#[command(about = "Two-player hot-seat Ludo in the terminal")]
struct Args {
    /// Random seed for the dice (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// TOML config file; every field is optional
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the debug log
    #[arg(long, default_value = "ludo.log")]
    log_file: PathBuf,

    /// Write the match log as JSON here on exit
    #[arg(long)]
    export_log: Option<PathBuf>,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GameConfig::load(path).unwrap_or_else(|err| {
            eprintln!("Error: {err}");
            process::exit(1);
        }),
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    if args.print_config {
        match config.to_toml_string() {
            Ok(text) => print!("{text}"),
            Err(err) => {
                eprintln!("Error: {err}");
                process::exit(1);
            }
        }
        return;
    }

    // the terminal belongs to the UI, so logs go to a file
    match File::create(&args.log_file) {
        Ok(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("info,ludo_rs=debug")),
                )
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .try_init();
        }
        Err(err) => eprintln!("Warning: cannot open log file {}: {err}", args.log_file.display()),
    }

    let game = Game::new(config).unwrap_or_else(|err| {
        eprintln!("Error: {err}");
        process::exit(1);
    });
    for warning in game.setup_warnings() {
        eprintln!("Warning: {warning}");
    }
    info!(game = %game.id, seed = game.seed, "starting match");

    let presentation = SharedPresentation::new(game.player_names());
    let view = presentation.handle();
    let mut app = TuiApp::new(game.with_presentation(presentation), view);
    if let Err(err) = app.run() {
        error!(%err, "terminal error");
        eprintln!("Error: {err}");
        process::exit(1);
    }

    let game = app.into_game();
    info!(game = %game.id, turns = game.engine.turn(), "match closed");

    if let Some(path) = args.export_log {
        let written = File::create(&path)
            .map_err(|err| err.to_string())
            .and_then(|file| {
                serde_json::to_writer_pretty(file, &game.match_log()).map_err(|err| err.to_string())
            });
        match written {
            Ok(()) => println!("Match log written to {}", path.display()),
            Err(err) => {
                eprintln!("Error: cannot write {}: {err}", path.display());
                process::exit(1);
            }
        }
    }
}
