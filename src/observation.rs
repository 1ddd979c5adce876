use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board::SetupWarning;
use crate::game::{GameAction, GameEvent, TokenPosition, TurnEngine};
use crate::types::{Color, TokenId, TurnPhase};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenObservation {
    pub id: TokenId,
    pub position: TokenPosition,
    pub entry_index: Option<usize>,
    pub selectable: bool,
    pub moving: bool,
}

impl TokenObservation {
    pub fn path_index(&self) -> Option<usize> {
        match self.position {
            TokenPosition::OnPath(index) => Some(index),
            TokenPosition::Base => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerObservation {
    pub color: Color,
    pub name: String,
    pub in_base: usize,
    pub on_path: usize,
    pub tokens: Vec<TokenObservation>,
}

/// Read-only picture of a match, safe to hand to presentation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub current_player: usize,
    pub phase: TurnPhase,
    pub turn: u32,
    pub last_roll: Option<u8>,
    pub selectable: Vec<TokenId>,
    pub moving: Option<TokenId>,
    pub path_length: usize,
    pub missing_slots: Vec<usize>,
    pub players: Vec<PlayerObservation>,
}

impl Observation {
    /// Tokens standing on path slot `index`.
    pub fn tokens_at(&self, index: usize) -> impl Iterator<Item = &TokenObservation> + '_ {
        self.players
            .iter()
            .flat_map(|player| player.tokens.iter())
            .filter(move |token| token.position == TokenPosition::OnPath(index))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchLog {
    pub id: Uuid,
    pub seed: u64,
    pub warnings: Vec<SetupWarning>,
    pub actions: Vec<GameAction>,
    pub events: Vec<GameEvent>,
    pub final_state: Observation,
}

pub fn observation_from_engine(engine: &TurnEngine) -> Observation {
    Observation {
        current_player: engine.current_player(),
        phase: engine.phase(),
        turn: engine.turn(),
        last_roll: engine.last_roll(),
        selectable: engine.selectable_tokens().to_vec(),
        moving: engine.moving_token(),
        path_length: engine.path().length(),
        missing_slots: engine
            .path()
            .slots()
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.is_none().then_some(index))
            .collect(),
        players: engine
            .rosters()
            .iter()
            .map(|roster| PlayerObservation {
                color: roster.color,
                name: roster.name.clone(),
                in_base: roster.in_base(),
                on_path: roster.len() - roster.in_base(),
                tokens: roster
                    .tokens()
                    .iter()
                    .map(|token| TokenObservation {
                        id: token.id,
                        position: token.position,
                        entry_index: token.entry_index,
                        selectable: token.is_selectable,
                        moving: token.is_moving,
                    })
                    .collect(),
            })
            .collect(),
    }
}
