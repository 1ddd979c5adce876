#![warn(clippy::all)]
#![deny(rust_2018_idioms)]

pub mod board;
pub mod cli;
pub mod config;
pub mod game;
pub mod observation;
pub mod presentation;
pub mod types;

pub use board::{Board, BoardConfig, PathModel, SetupError, SetupWarning, SlotId};
pub use config::{ConfigError, GameConfig};
pub use game::{Game, GameEvent, OutOfTurnRoll, TurnEngine, TurnError};
pub use observation::{MatchLog, Observation, PlayerObservation};
pub use presentation::Presentation;
pub use types::{Color, TokenId, TurnPhase};
