use serde::{Deserialize, Serialize};

use crate::types::{ActionType, TokenId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GameAction {
    pub player_index: usize,
    pub action_type: ActionType,
    pub payload: ActionPayload,
}

impl GameAction {
    pub fn new(player_index: usize, action_type: ActionType) -> Self {
        Self {
            player_index,
            action_type,
            payload: ActionPayload::None,
        }
    }

    pub fn with_payload(mut self, payload: ActionPayload) -> Self {
        self.payload = payload;
        self
    }

    pub fn roll(player_index: usize, value: u8) -> Self {
        Self::new(player_index, ActionType::Roll).with_payload(ActionPayload::Die(value))
    }

    pub fn select(player_index: usize, token: TokenId) -> Self {
        Self::new(player_index, ActionType::SelectToken).with_payload(ActionPayload::Token(token))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ActionPayload {
    #[default]
    None,
    Die(u8),
    Token(TokenId),
}
