use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{Color, NUM_PLAYERS, TokenId};

pub const STANDARD_PATH_LENGTH: usize = 52;
pub const STANDARD_TOKENS_PER_PLAYER: usize = 4;
/// Tokens are picked with the keys 1-9 and labelled with one digit.
pub const MAX_TOKENS_PER_PLAYER: usize = 9;

/// Identity of one placed path marker. Entry points are matched against the
/// path by this id, never by position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(String);

impl SlotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SlotId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("invalid path: no slots")]
    Empty,
    #[error("invalid path: slot id {0} appears more than once")]
    DuplicateSlot(SlotId),
    #[error("invalid path: missing slot {index} lies outside a path of length {length}")]
    MissingSlotOutOfRange { index: usize, length: usize },
}

/// The shared circular track. A slot may be absent (`None`) when its marker
/// was never placed; such a slot can never be occupied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathModel {
    slots: Vec<Option<SlotId>>,
}

impl PathModel {
    pub fn new(slots: Vec<Option<SlotId>>) -> Result<Self, PathError> {
        if slots.is_empty() {
            return Err(PathError::Empty);
        }
        let mut seen = HashSet::new();
        for slot in slots.iter().flatten() {
            if !seen.insert(slot) {
                return Err(PathError::DuplicateSlot(slot.clone()));
            }
        }
        Ok(Self { slots })
    }

    pub fn from_ids<I, S>(ids: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ids.into_iter().map(|id| Some(SlotId::new(id))).collect())
    }

    /// Never zero: construction rejects empty paths.
    pub fn length(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[Option<SlotId>] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&SlotId> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn is_occupiable(&self, index: usize) -> bool {
        self.slot(index).is_some()
    }

    /// `(index + steps) mod length`, computed without overflow.
    pub fn advance(&self, index: usize, steps: usize) -> usize {
        let length = self.length();
        (index % length + steps % length) % length
    }

    pub fn index_of(&self, id: &SlotId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref() == Some(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub name: String,
    pub tokens: usize,
    /// Entry slot id for each token, by spawn order. Tokens past the end of
    /// this list have no entry point.
    #[serde(default)]
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub path: Vec<String>,
    /// Indices of path markers that were never placed.
    pub missing_slots: Vec<usize>,
    pub players: Vec<PlayerConfig>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl BoardConfig {
    /// 52-cell track; Red enters at the first cell, Blue directly opposite.
    pub fn standard() -> Self {
        Self::ring(
            STANDARD_PATH_LENGTH,
            [0, STANDARD_PATH_LENGTH / 2],
            STANDARD_TOKENS_PER_PLAYER,
        )
    }

    pub fn ring(length: usize, entry_indices: [usize; NUM_PLAYERS], tokens: usize) -> Self {
        let width = length.saturating_sub(1).to_string().len().max(2);
        let path: Vec<String> = (0..length).map(|i| format!("p{:0width$}", i)).collect();
        let players = Color::ORDERED
            .iter()
            .zip(entry_indices)
            .map(|(color, entry)| PlayerConfig {
                name: display_name(*color),
                tokens,
                entries: path
                    .get(entry)
                    .map(|id| vec![id.clone(); tokens])
                    .unwrap_or_default(),
            })
            .collect();
        Self {
            path,
            missing_slots: Vec::new(),
            players,
        }
    }
}

fn display_name(color: Color) -> String {
    match color {
        Color::Red => "Red".to_string(),
        Color::Blue => "Blue".to_string(),
    }
}

/// Found once while building the board; the affected token stays in base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupWarning {
    UnresolvedEntryPoint {
        token: TokenId,
        entry: Option<String>,
    },
}

impl fmt::Display for SetupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupWarning::UnresolvedEntryPoint {
                token,
                entry: Some(entry),
            } => write!(
                f,
                "token {token} entry point {entry} is not on the path; it can never leave base"
            ),
            SetupWarning::UnresolvedEntryPoint { token, entry: None } => write!(
                f,
                "token {token} has no configured entry point; it can never leave base"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("board must seat exactly {expected} players, found {found}")]
    PlayerCount { expected: usize, found: usize },
    #[error("{name} has {tokens} tokens; at most {max} are allowed")]
    TooManyTokens {
        name: String,
        tokens: usize,
        max: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub name: String,
    pub color: Color,
    /// Resolved entry index per token; `None` when the entry was not found.
    pub entry_indices: Vec<Option<usize>>,
}

#[derive(Debug, Clone)]
pub struct Board {
    path: PathModel,
    seats: Vec<Seat>,
}

impl Board {
    pub fn from_config(config: &BoardConfig) -> Result<(Self, Vec<SetupWarning>), SetupError> {
        if config.players.len() != NUM_PLAYERS {
            return Err(SetupError::PlayerCount {
                expected: NUM_PLAYERS,
                found: config.players.len(),
            });
        }
        if let Some(player) = config
            .players
            .iter()
            .find(|player| player.tokens > MAX_TOKENS_PER_PLAYER)
        {
            return Err(SetupError::TooManyTokens {
                name: player.name.clone(),
                tokens: player.tokens,
                max: MAX_TOKENS_PER_PLAYER,
            });
        }

        let length = config.path.len();
        let mut slots: Vec<Option<SlotId>> =
            config.path.iter().map(|id| Some(SlotId::new(id.as_str()))).collect();
        for &index in &config.missing_slots {
            match slots.get_mut(index) {
                Some(slot) => *slot = None,
                None => return Err(PathError::MissingSlotOutOfRange { index, length }.into()),
            }
        }
        let path = PathModel::new(slots)?;

        let mut warnings = Vec::new();
        let seats = config
            .players
            .iter()
            .zip(Color::ORDERED)
            .enumerate()
            .map(|(player, (player_config, color))| {
                let entry_indices = (0..player_config.tokens)
                    .map(|index| {
                        let entry = player_config.entries.get(index);
                        let resolved = entry.and_then(|id| path.index_of(&SlotId::new(id.as_str())));
                        if resolved.is_none() {
                            warnings.push(SetupWarning::UnresolvedEntryPoint {
                                token: TokenId::new(player, index),
                                entry: entry.cloned(),
                            });
                        }
                        resolved
                    })
                    .collect();
                Seat {
                    name: player_config.name.clone(),
                    color,
                    entry_indices,
                }
            })
            .collect();

        for warning in &warnings {
            warn!(%warning, "board setup");
        }

        Ok((Self { path, seats }, warnings))
    }

    pub fn path(&self) -> &PathModel {
        &self.path
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat(&self, player: usize) -> Option<&Seat> {
        self.seats.get(player)
    }

    /// Path index a token enters at, if its entry point was resolved.
    pub fn index_of_entry(&self, player: usize, token_index: usize) -> Option<usize> {
        self.seats
            .get(player)
            .and_then(|seat| seat.entry_indices.get(token_index).copied().flatten())
    }
}
