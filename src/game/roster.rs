use serde::{Deserialize, Serialize};

use crate::board::Seat;
use crate::types::{Color, TokenId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenPosition {
    Base,
    OnPath(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub owner: usize,
    pub entry_index: Option<usize>,
    pub position: TokenPosition,
    pub is_selectable: bool,
    pub is_interactive: bool,
    pub is_moving: bool,
}

impl Token {
    pub fn new(id: TokenId, entry_index: Option<usize>) -> Self {
        Self {
            id,
            owner: id.player,
            entry_index,
            position: TokenPosition::Base,
            is_selectable: false,
            is_interactive: false,
            is_moving: false,
        }
    }

    pub fn is_in_base(&self) -> bool {
        matches!(self.position, TokenPosition::Base)
    }

    pub fn path_index(&self) -> Option<usize> {
        match self.position {
            TokenPosition::Base => None,
            TokenPosition::OnPath(index) => Some(index),
        }
    }

    pub fn set_interaction(&mut self, enabled: bool) {
        self.is_selectable = enabled;
        self.is_interactive = enabled;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub color: Color,
    pub name: String,
    tokens: Vec<Token>,
}

impl Roster {
    pub fn spawn(player: usize, seat: &Seat) -> Self {
        let tokens = seat
            .entry_indices
            .iter()
            .enumerate()
            .map(|(index, entry)| Token::new(TokenId::new(player, index), *entry))
            .collect();
        Self {
            color: seat.color,
            name: seat.name.clone(),
            tokens,
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Token> {
        self.tokens.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn in_base(&self) -> usize {
        self.tokens.iter().filter(|t| t.is_in_base()).count()
    }

    pub fn any_moving(&self) -> bool {
        self.tokens.iter().any(|t| t.is_moving)
    }

    pub fn clear_interaction(&mut self) {
        for token in &mut self.tokens {
            token.set_interaction(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawned_tokens_start_in_base_with_their_entry() {
        let seat = Seat {
            name: "Blue".into(),
            color: Color::Blue,
            entry_indices: vec![Some(26), None],
        };
        let roster = Roster::spawn(1, &seat);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.in_base(), 2);
        let first = roster.get(0).unwrap();
        assert_eq!(first.id, TokenId::new(1, 0));
        assert_eq!(first.owner, 1);
        assert_eq!(first.entry_index, Some(26));
        assert_eq!(first.path_index(), None);
        assert_eq!(roster.get(1).unwrap().entry_index, None);
        assert!(!roster.any_moving());
    }
}
