pub mod action;
pub mod dice;
pub mod game;
pub mod movement;
pub mod roster;
pub mod state;

pub use action::{ActionPayload, GameAction};
pub use dice::{RollSource, ScriptedDice, SeededDice};
pub use game::Game;
pub use movement::{
    InstantMovement, MoveOutcome, MoveProgress, MoveRequest, MoveStep, MoveWalk,
    MovementCollaborator, StepTiming, TimingError,
};
pub use roster::{Roster, Token, TokenPosition};
pub use state::{
    GameEvent, OutOfTurnRoll, SelectionRejection, StepOutcome, TokenSet, TurnEngine, TurnError,
    TurnState,
};
