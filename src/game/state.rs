use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::{Display, EnumString};
use tracing::{debug, info, warn};

use crate::{
    board::{Board, PathModel},
    types::{NUM_PLAYERS, SIX, TokenId, TurnPhase},
};

use super::{
    action::GameAction,
    dice::{MAX_FACE, MIN_FACE},
    movement::{MoveOutcome, MoveProgress, MoveRequest, MoveStep, MoveWalk, StepTiming},
    roster::{Roster, Token, TokenPosition},
};

pub type TokenSet = SmallVec<[TokenId; 4]>;

/// What to do when a roll arrives for a player other than the current one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutOfTurnRoll {
    /// Hand the turn to the acting player and evaluate the roll for them.
    #[default]
    Resync,
    /// Refuse the roll; nothing changes.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnState {
    pub current_player: usize,
    pub last_roll: Option<u8>,
    pub phase: TurnPhase,
    pub selectable: TokenSet,
}

impl Default for TurnState {
    fn default() -> Self {
        Self {
            current_player: 0,
            last_roll: None,
            phase: TurnPhase::AwaitingRoll,
            selectable: TokenSet::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    DiceRolled {
        player: usize,
        value: u8,
    },
    CurrentPlayerResynced {
        from: usize,
        to: usize,
    },
    RollEnabled {
        enabled: bool,
    },
    SelectableTokensChanged {
        player: usize,
        tokens: Vec<TokenId>,
    },
    NoLegalMove {
        player: usize,
        roll: u8,
    },
    MoveStarted {
        request: MoveRequest,
    },
    TokenStepped {
        token: TokenId,
        step: MoveStep,
    },
    MoveFinished {
        token: TokenId,
        outcome: MoveOutcome,
    },
    ExtraTurn {
        player: usize,
    },
    TurnAdvanced {
        next_player: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    pub events: Vec<GameEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SelectionRejection {
    #[strum(to_string = "not awaiting a selection")]
    NotAwaitingSelection,
    #[strum(to_string = "no such token")]
    UnknownToken,
    #[strum(to_string = "token belongs to the other player")]
    NotOwner,
    #[strum(to_string = "token cannot move with this roll")]
    NotSelectable,
    #[strum(to_string = "token is already moving")]
    AlreadyMoving,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("roll {0} outside 1..=6")]
    InvalidRoll(u8),
    #[error("invalid player index {0}")]
    InvalidPlayer(usize),
    #[error("roll by player {actual} but expected {expected}")]
    ActionOutOfTurn { expected: usize, actual: usize },
    #[error("roll rejected while {0}")]
    RollRejected(TurnPhase),
    #[error("invalid selection of {token}: {reason}")]
    InvalidSelection {
        token: TokenId,
        reason: SelectionRejection,
    },
    #[error("no move in flight")]
    NoMoveInFlight,
    #[error("move in flight belongs to {expected}, not {actual}")]
    UnexpectedToken { expected: TokenId, actual: TokenId },
}

/// Turn and move state machine for one match.
///
/// Every entry point either applies a whole transition and reports its
/// events, or returns an error and leaves the engine untouched.
#[derive(Debug, Clone)]
pub struct TurnEngine {
    board: Board,
    rosters: Vec<Roster>,
    state: TurnState,
    out_of_turn_roll: OutOfTurnRoll,
    timing: StepTiming,
    pending_move: Option<MoveWalk>,
    turn: u32,
    actions: Vec<GameAction>,
}

impl TurnEngine {
    pub fn new(board: Board, out_of_turn_roll: OutOfTurnRoll, timing: StepTiming) -> Self {
        let rosters = spawn_rosters(&board);
        Self {
            board,
            rosters,
            state: TurnState::default(),
            out_of_turn_roll,
            timing,
            pending_move: None,
            turn: 0,
            actions: Vec::new(),
        }
    }

    /// Back to the opening position on the same board.
    pub fn reset(&mut self) {
        self.rosters = spawn_rosters(&self.board);
        self.state = TurnState::default();
        self.pending_move = None;
        self.turn = 0;
        self.actions.clear();
    }

    pub fn on_roll(
        &mut self,
        value: u8,
        acting_player: Option<usize>,
    ) -> Result<StepOutcome, TurnError> {
        if !(MIN_FACE..=MAX_FACE).contains(&value) {
            return Err(TurnError::InvalidRoll(value));
        }
        if self.state.phase != TurnPhase::AwaitingRoll || self.any_token_moving() {
            return Err(TurnError::RollRejected(self.state.phase));
        }
        let acting = acting_player.unwrap_or(self.state.current_player);
        if acting >= NUM_PLAYERS {
            return Err(TurnError::InvalidPlayer(acting));
        }

        let mut outcome = StepOutcome::default();
        if acting != self.state.current_player {
            match self.out_of_turn_roll {
                OutOfTurnRoll::Reject => {
                    return Err(TurnError::ActionOutOfTurn {
                        expected: self.state.current_player,
                        actual: acting,
                    });
                }
                OutOfTurnRoll::Resync => {
                    warn!(
                        from = self.state.current_player,
                        to = acting,
                        "roll from out-of-turn player, re-syncing current player"
                    );
                    outcome.events.push(GameEvent::CurrentPlayerResynced {
                        from: self.state.current_player,
                        to: acting,
                    });
                    self.state.current_player = acting;
                }
            }
        }

        let player = self.state.current_player;
        self.state.last_roll = Some(value);
        self.actions.push(GameAction::roll(player, value));
        outcome.events.push(GameEvent::RollEnabled { enabled: false });
        outcome.events.push(GameEvent::DiceRolled { player, value });

        let selectable = self.selectable_for(player, value);
        for roster in &mut self.rosters {
            roster.clear_interaction();
        }
        for id in &selectable {
            if let Some(token) = self.token_mut(*id) {
                token.set_interaction(true);
            }
        }

        if selectable.is_empty() {
            debug!(player, roll = value, "no valid moves available");
            outcome
                .events
                .push(GameEvent::NoLegalMove { player, roll: value });
            self.end_turn(&mut outcome);
        } else {
            outcome.events.push(GameEvent::SelectableTokensChanged {
                player,
                tokens: selectable.to_vec(),
            });
            self.state.selectable = selectable;
            self.state.phase = TurnPhase::AwaitingSelection;
        }
        Ok(outcome)
    }

    pub fn on_select(&mut self, token_id: TokenId) -> Result<StepOutcome, TurnError> {
        let reject = |reason| {
            Err(TurnError::InvalidSelection {
                token: token_id,
                reason,
            })
        };

        let Some(token) = self.token(token_id) else {
            return reject(SelectionRejection::UnknownToken);
        };
        if token.is_moving {
            return reject(SelectionRejection::AlreadyMoving);
        }
        let from = token.position;
        let (TurnPhase::AwaitingSelection, Some(steps)) = (self.state.phase, self.state.last_roll)
        else {
            return reject(SelectionRejection::NotAwaitingSelection);
        };
        let player = self.state.current_player;
        if token.owner != player {
            return reject(SelectionRejection::NotOwner);
        }
        if !self.state.selectable.contains(&token_id) {
            return reject(SelectionRejection::NotSelectable);
        }

        for roster in &mut self.rosters {
            roster.clear_interaction();
        }
        if let Some(token) = self.token_mut(token_id) {
            token.is_moving = true;
        }
        self.state.selectable.clear();
        self.state.phase = TurnPhase::Moving;
        self.pending_move = Some(MoveWalk::new(token_id, steps));
        self.actions.push(GameAction::select(player, token_id));

        let request = MoveRequest {
            token: token_id,
            steps,
            from,
            timing: self.timing,
        };
        debug!(token = %token_id, steps, "move started");
        Ok(StepOutcome {
            events: vec![
                GameEvent::SelectableTokensChanged {
                    player,
                    tokens: Vec::new(),
                },
                GameEvent::MoveStarted { request },
            ],
        })
    }

    /// Performs the next placement or single-cell advance of the move in
    /// flight. The walk is reported finished but the turn does not resolve
    /// until [`TurnEngine::on_move_finished`] is called.
    pub fn advance_move(&mut self) -> Result<MoveProgress, TurnError> {
        let walk = self.pending_move.as_mut().ok_or(TurnError::NoMoveInFlight)?;
        let id = walk.token();
        let token = self
            .rosters
            .get_mut(id.player)
            .and_then(|roster| roster.get_mut(id.index))
            .ok_or(TurnError::NoMoveInFlight)?;
        let progress = walk.advance(self.board.path(), token);
        match progress {
            MoveProgress::Step(step) => debug!(token = %id, ?step, "token stepped"),
            MoveProgress::Finished(MoveOutcome::Completed) => {}
            MoveProgress::Finished(MoveOutcome::EntryFailed) => {
                warn!(token = %id, "cannot leave base: invalid entry point")
            }
            MoveProgress::Finished(MoveOutcome::Incomplete {
                stopped_at,
                remaining,
            }) => warn!(token = %id, stopped_at, remaining, "move exceeds valid path"),
        }
        Ok(progress)
    }

    pub fn on_move_finished(&mut self, token_id: TokenId) -> Result<StepOutcome, TurnError> {
        let walk = self.pending_move.as_ref().ok_or(TurnError::NoMoveInFlight)?;
        if walk.token() != token_id {
            return Err(TurnError::UnexpectedToken {
                expected: walk.token(),
                actual: token_id,
            });
        }
        self.token(token_id).ok_or(TurnError::NoMoveInFlight)?;

        let Some(walk) = self.pending_move.take() else {
            return Err(TurnError::NoMoveInFlight);
        };
        let path = self.board.path();
        let Some(token) = self
            .rosters
            .get_mut(token_id.player)
            .and_then(|roster| roster.get_mut(token_id.index))
        else {
            return Err(TurnError::NoMoveInFlight);
        };
        let move_outcome = walk
            .outcome()
            .unwrap_or_else(|| settle_unfinished(&walk, path, token));
        token.is_moving = false;

        let mut outcome = StepOutcome::default();
        outcome.events.push(GameEvent::MoveFinished {
            token: token_id,
            outcome: move_outcome,
        });

        let player = self.state.current_player;
        if self.state.last_roll == Some(SIX) {
            info!(player, "extra turn for rolling 6");
            self.state.phase = TurnPhase::AwaitingRoll;
            outcome.events.push(GameEvent::ExtraTurn { player });
            outcome.events.push(GameEvent::RollEnabled { enabled: true });
        } else {
            self.end_turn(&mut outcome);
        }
        Ok(outcome)
    }

    fn end_turn(&mut self, outcome: &mut StepOutcome) {
        self.state.selectable.clear();
        for roster in &mut self.rosters {
            roster.clear_interaction();
        }
        self.state.current_player = (self.state.current_player + 1) % NUM_PLAYERS;
        self.state.phase = TurnPhase::AwaitingRoll;
        self.turn += 1;
        info!(
            next_player = self.state.current_player,
            turn = self.turn,
            "turn advanced"
        );
        outcome.events.push(GameEvent::TurnAdvanced {
            next_player: self.state.current_player,
        });
        outcome.events.push(GameEvent::RollEnabled { enabled: true });
    }

    fn selectable_for(&self, player: usize, roll: u8) -> TokenSet {
        self.rosters
            .get(player)
            .map(|roster| {
                roster
                    .tokens()
                    .iter()
                    .filter(|token| self.can_move(token, roll))
                    .map(|token| token.id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether `token` could be chosen for `roll`. Other tokens never block.
    pub fn can_move(&self, token: &Token, roll: u8) -> bool {
        let path = self.board.path();
        match token.position {
            TokenPosition::Base => {
                roll == SIX
                    && token
                        .entry_index
                        .is_some_and(|entry| path.is_occupiable(entry))
            }
            TokenPosition::OnPath(index) => path.is_occupiable(path.advance(index, roll as usize)),
        }
    }

    fn token_mut(&mut self, id: TokenId) -> Option<&mut Token> {
        self.rosters
            .get_mut(id.player)
            .and_then(|roster| roster.get_mut(id.index))
    }
}

impl TurnEngine {
    pub fn state(&self) -> &TurnState {
        &self.state
    }

    pub fn current_player(&self) -> usize {
        self.state.current_player
    }

    pub fn phase(&self) -> TurnPhase {
        self.state.phase
    }

    pub fn last_roll(&self) -> Option<u8> {
        self.state.last_roll
    }

    pub fn selectable_tokens(&self) -> &[TokenId] {
        &self.state.selectable
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn path(&self) -> &PathModel {
        self.board.path()
    }

    pub fn rosters(&self) -> &[Roster] {
        &self.rosters
    }

    pub fn roster(&self, player: usize) -> Option<&Roster> {
        self.rosters.get(player)
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.rosters
            .get(id.player)
            .and_then(|roster| roster.get(id.index))
    }

    pub fn moving_token(&self) -> Option<TokenId> {
        self.pending_move.as_ref().map(MoveWalk::token)
    }

    pub fn any_token_moving(&self) -> bool {
        self.rosters.iter().any(Roster::any_moving)
    }

    pub fn can_roll(&self) -> bool {
        self.state.phase == TurnPhase::AwaitingRoll && !self.any_token_moving()
    }

    pub fn timing(&self) -> &StepTiming {
        &self.timing
    }

    pub fn out_of_turn_roll(&self) -> OutOfTurnRoll {
        self.out_of_turn_roll
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn action_log(&self) -> &[GameAction] {
        &self.actions
    }
}

fn spawn_rosters(board: &Board) -> Vec<Roster> {
    board
        .seats()
        .iter()
        .enumerate()
        .map(|(player, seat)| Roster::spawn(player, seat))
        .collect()
}

/// Outcome for a walk whose completion was reported before it ran out. A
/// token still in base with a usable entry is placed there first, since the
/// placement is never counted against the roll.
fn settle_unfinished(walk: &MoveWalk, path: &PathModel, token: &mut Token) -> MoveOutcome {
    match token.position {
        TokenPosition::Base => match token.entry_index.filter(|&e| path.is_occupiable(e)) {
            Some(entry) => {
                token.position = TokenPosition::OnPath(entry);
                MoveOutcome::Incomplete {
                    stopped_at: entry,
                    remaining: walk.remaining(),
                }
            }
            None => MoveOutcome::EntryFailed,
        },
        TokenPosition::OnPath(_) if walk.remaining() == 0 => MoveOutcome::Completed,
        TokenPosition::OnPath(index) => MoveOutcome::Incomplete {
            stopped_at: index,
            remaining: walk.remaining(),
        },
    }
}
