//! Notifications the game sends to whatever draws it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::game::MoveOutcome;
use crate::types::TokenId;

/// Fire-and-forget sink for turn notifications. Implementations must not
/// call back into the game.
pub trait Presentation {
    fn on_turn_changed(&mut self, player: usize);

    fn on_selectable_tokens_changed(&mut self, tokens: &[TokenId]);

    fn on_roll_button_enabled(&mut self, enabled: bool);

    fn on_dice_rolled(&mut self, _player: usize, _value: u8) {}

    fn on_move_finished(&mut self, _token: TokenId, _outcome: MoveOutcome) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresentation;

impl Presentation for NullPresentation {
    fn on_turn_changed(&mut self, _player: usize) {}

    fn on_selectable_tokens_changed(&mut self, _tokens: &[TokenId]) {}

    fn on_roll_button_enabled(&mut self, _enabled: bool) {}
}

pub fn roll_button_label(name: &str) -> String {
    format!("Roll Dice ({name})")
}

pub fn turn_banner(name: &str) -> String {
    format!("{name}'s Turn - Roll the Dice")
}

/// Latest state of the on-screen widgets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentationState {
    pub current_player: usize,
    pub banner: String,
    pub roll_enabled: bool,
    pub highlighted: Vec<TokenId>,
    pub last_roll: Option<u8>,
    pub last_outcome: Option<MoveOutcome>,
}

/// Keeps [`PresentationState`] behind a shared handle so a front end can
/// read what the game last told it.
#[derive(Debug, Clone)]
pub struct SharedPresentation {
    names: Vec<String>,
    state: Rc<RefCell<PresentationState>>,
}

impl SharedPresentation {
    pub fn new(names: Vec<String>) -> Self {
        let banner = names.first().map(|n| turn_banner(n)).unwrap_or_default();
        Self {
            names,
            state: Rc::new(RefCell::new(PresentationState {
                banner,
                roll_enabled: true,
                ..PresentationState::default()
            })),
        }
    }

    pub fn handle(&self) -> Rc<RefCell<PresentationState>> {
        Rc::clone(&self.state)
    }

    pub fn snapshot(&self) -> PresentationState {
        self.state.borrow().clone()
    }

    fn name(&self, player: usize) -> String {
        self.names
            .get(player)
            .cloned()
            .unwrap_or_else(|| format!("Player {player}"))
    }
}

impl Presentation for SharedPresentation {
    fn on_turn_changed(&mut self, player: usize) {
        let banner = turn_banner(&self.name(player));
        let mut state = self.state.borrow_mut();
        state.current_player = player;
        state.banner = banner;
    }

    fn on_selectable_tokens_changed(&mut self, tokens: &[TokenId]) {
        self.state.borrow_mut().highlighted = tokens.to_vec();
    }

    fn on_roll_button_enabled(&mut self, enabled: bool) {
        self.state.borrow_mut().roll_enabled = enabled;
    }

    fn on_dice_rolled(&mut self, _player: usize, value: u8) {
        self.state.borrow_mut().last_roll = Some(value);
    }

    fn on_move_finished(&mut self, _token: TokenId, outcome: MoveOutcome) {
        self.state.borrow_mut().last_outcome = Some(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_the_board_text() {
        assert_eq!(roll_button_label("Red"), "Roll Dice (Red)");
        assert_eq!(turn_banner("Blue"), "Blue's Turn - Roll the Dice");
    }

    #[test]
    fn shared_presentation_tracks_notifications() {
        let mut presentation = SharedPresentation::new(vec!["Red".into(), "Blue".into()]);
        let handle = presentation.handle();
        assert!(handle.borrow().roll_enabled);
        assert_eq!(handle.borrow().banner, "Red's Turn - Roll the Dice");

        presentation.on_roll_button_enabled(false);
        presentation.on_selectable_tokens_changed(&[TokenId::new(0, 1)]);
        presentation.on_turn_changed(1);

        let state = presentation.snapshot();
        assert!(!state.roll_enabled);
        assert_eq!(state.highlighted, vec![TokenId::new(0, 1)]);
        assert_eq!(state.current_player, 1);
        assert_eq!(state.banner, "Blue's Turn - Roll the Dice");
        assert_eq!(*handle.borrow(), state);
    }
}
