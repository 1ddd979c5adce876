use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

pub const NUM_PLAYERS: usize = 2;
pub const SIX: u8 = 6;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    Red,
    Blue,
}

impl Color {
    pub const ORDERED: [Color; NUM_PLAYERS] = [Color::Red, Color::Blue];

    pub fn for_player(player_index: usize) -> Option<Color> {
        Self::ORDERED.get(player_index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Blue => 1,
        }
    }

    /// Lower-case marker used when drawing tokens (`r`, `b`).
    pub fn marker(self) -> char {
        match self {
            Color::Red => 'r',
            Color::Blue => 'b',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnPhase {
    AwaitingRoll,
    AwaitingSelection,
    Moving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Roll,
    SelectToken,
}

/// Identifies a token by owning player and its spawn order in that roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenId {
    pub player: usize,
    pub index: usize,
}

impl TokenId {
    pub fn new(player: usize, index: usize) -> Self {
        Self { player, index }
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = Color::for_player(self.player)
            .map(Color::marker)
            .unwrap_or('?');
        write!(f, "{}{}", marker, self.index + 1)
    }
}
