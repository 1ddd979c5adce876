use tracing::{debug, instrument};
use uuid::Uuid;

use crate::board::{Board, SetupError, SetupWarning};
use crate::config::GameConfig;
use crate::game::action::GameAction;
use crate::game::dice::{RollSource, SeededDice};
use crate::game::movement::{MoveOutcome, MoveProgress, MoveRequest, MovementCollaborator};
use crate::game::state::{GameEvent, StepOutcome, TurnEngine, TurnError};
use crate::observation::{MatchLog, Observation, observation_from_engine};
use crate::presentation::{NullPresentation, Presentation};
use crate::types::TokenId;

/// One match: the engine plus the collaborators it talks to. Nothing here is
/// global, so any number of games can run side by side.
pub struct Game {
    pub id: Uuid,
    pub seed: u64,
    pub engine: TurnEngine,
    dice: Box<dyn RollSource>,
    presentation: Box<dyn Presentation>,
    events: Vec<GameEvent>,
    warnings: Vec<SetupWarning>,
}

impl Game {
    pub fn new(config: GameConfig) -> Result<Self, SetupError> {
        let dice = SeededDice::new(config.seed);
        Self::with_dice(config, dice)
    }

    pub fn with_dice(
        config: GameConfig,
        dice: impl RollSource + 'static,
    ) -> Result<Self, SetupError> {
        let (board, warnings) = Board::from_config(&config.board)?;
        Ok(Self {
            id: Uuid::new_v4(),
            seed: config.seed,
            engine: TurnEngine::new(board, config.out_of_turn_roll, config.timing),
            dice: Box::new(dice),
            presentation: Box::new(NullPresentation),
            events: Vec::new(),
            warnings,
        })
    }

    pub fn with_presentation(mut self, presentation: impl Presentation + 'static) -> Self {
        self.presentation = Box::new(presentation);
        self.announce();
        self
    }

    pub fn player_names(&self) -> Vec<String> {
        self.engine
            .rosters()
            .iter()
            .map(|roster| roster.name.clone())
            .collect()
    }

    pub fn setup_warnings(&self) -> &[SetupWarning] {
        &self.warnings
    }

    /// Rolls the die for the current player. Refused while a selection or a
    /// move is pending.
    #[instrument(skip(self), fields(game = %self.id))]
    pub fn request_roll(&mut self) -> Result<u8, TurnError> {
        if !self.engine.can_roll() {
            let err = TurnError::RollRejected(self.engine.phase());
            debug!(%err, "roll request ignored");
            return Err(err);
        }
        let value = self.dice.next();
        let player = self.engine.current_player();
        self.on_dice_rolled(value, Some(player))?;
        Ok(value)
    }

    /// Feeds a roll produced elsewhere. `acting_player` defaults to the
    /// current player.
    #[instrument(skip(self), fields(game = %self.id))]
    pub fn on_dice_rolled(
        &mut self,
        value: u8,
        acting_player: Option<usize>,
    ) -> Result<(), TurnError> {
        let outcome = self
            .engine
            .on_roll(value, acting_player)
            .inspect_err(|err| debug!(%err, "roll ignored"))?;
        self.dispatch(outcome);
        Ok(())
    }

    /// Starts moving `token`. The walk is then driven by [`Game::step_move`]
    /// or all at once by [`Game::play_selection`].
    #[instrument(skip(self, token), fields(game = %self.id, token = %token))]
    pub fn select(&mut self, token: TokenId) -> Result<MoveRequest, TurnError> {
        let outcome = self
            .engine
            .on_select(token)
            .inspect_err(|err| debug!(%err, "selection ignored"))?;
        let request = outcome
            .events
            .iter()
            .find_map(|event| match event {
                GameEvent::MoveStarted { request } => Some(*request),
                _ => None,
            })
            .ok_or(TurnError::NoMoveInFlight)?;
        self.dispatch(outcome);
        Ok(request)
    }

    /// Advances the move in flight by one cell. When the walk ends, the
    /// turn is resolved before returning.
    pub fn step_move(&mut self) -> Result<MoveProgress, TurnError> {
        let token = self.engine.moving_token().ok_or(TurnError::NoMoveInFlight)?;
        let progress = self.engine.advance_move()?;
        match progress {
            MoveProgress::Step(step) => self.record(GameEvent::TokenStepped { token, step }),
            MoveProgress::Finished(_) => self.finish_move(token)?,
        }
        Ok(progress)
    }

    /// Completion callback from a movement collaborator.
    pub fn finish_move(&mut self, token: TokenId) -> Result<(), TurnError> {
        let outcome = self
            .engine
            .on_move_finished(token)
            .inspect_err(|err| debug!(%err, "move completion ignored"))?;
        self.dispatch(outcome);
        Ok(())
    }

    /// Selects `token` and walks it to the end, handing every step to
    /// `movement` before taking the next.
    pub fn play_selection(
        &mut self,
        token: TokenId,
        movement: &mut impl MovementCollaborator,
    ) -> Result<MoveOutcome, TurnError> {
        let request = self.select(token)?;
        movement.begin_move(&request);
        loop {
            match self.engine.advance_move()? {
                MoveProgress::Step(step) => {
                    self.record(GameEvent::TokenStepped { token, step });
                    if let Some(moved) = self.engine.token(token) {
                        movement.animate_step(moved, step, &request.timing);
                    }
                }
                MoveProgress::Finished(outcome) => {
                    if let Some(moved) = self.engine.token(token) {
                        movement.end_move(moved, outcome);
                    }
                    self.finish_move(token)?;
                    return Ok(outcome);
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.engine.reset();
        self.events.clear();
        self.announce();
    }

    pub fn event_log(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn action_log(&self) -> &[GameAction] {
        self.engine.action_log()
    }

    pub fn observation(&self) -> Observation {
        observation_from_engine(&self.engine)
    }

    pub fn match_log(&self) -> MatchLog {
        MatchLog {
            id: self.id,
            seed: self.seed,
            warnings: self.warnings.clone(),
            actions: self.action_log().to_vec(),
            events: self.events.clone(),
            final_state: self.observation(),
        }
    }

    fn announce(&mut self) {
        self.presentation
            .on_turn_changed(self.engine.current_player());
        self.presentation
            .on_selectable_tokens_changed(self.engine.selectable_tokens());
        self.presentation
            .on_roll_button_enabled(self.engine.can_roll());
    }

    fn dispatch(&mut self, outcome: StepOutcome) {
        for event in outcome.events {
            self.record(event);
        }
    }

    fn record(&mut self, event: GameEvent) {
        let presentation = &mut self.presentation;
        match &event {
            GameEvent::DiceRolled { player, value } => presentation.on_dice_rolled(*player, *value),
            GameEvent::CurrentPlayerResynced { to, .. } => presentation.on_turn_changed(*to),
            GameEvent::RollEnabled { enabled } => presentation.on_roll_button_enabled(*enabled),
            GameEvent::SelectableTokensChanged { tokens, .. } => {
                presentation.on_selectable_tokens_changed(tokens)
            }
            GameEvent::MoveFinished { token, outcome } => {
                presentation.on_move_finished(*token, *outcome)
            }
            GameEvent::TurnAdvanced { next_player } => presentation.on_turn_changed(*next_player),
            GameEvent::NoLegalMove { .. }
            | GameEvent::MoveStarted { .. }
            | GameEvent::TokenStepped { .. }
            | GameEvent::ExtraTurn { .. } => {}
        }
        self.events.push(event);
    }
}
