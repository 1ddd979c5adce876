use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::PathModel;
use crate::game::roster::{Token, TokenPosition};
use crate::types::TokenId;

/// Time budget for one single-cell step. The collaborator decides how to
/// spend it; the core only hands it over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepTiming {
    pub step_secs: f32,
    pub lift_fraction: f32,
    pub glide_fraction: f32,
    pub drop_fraction: f32,
    pub settle_secs: f32,
}

impl Default for StepTiming {
    fn default() -> Self {
        Self {
            step_secs: 0.18,
            lift_fraction: 0.2,
            glide_fraction: 0.6,
            drop_fraction: 0.2,
            settle_secs: 0.02,
        }
    }
}

impl StepTiming {
    /// Longest step or settle pause accepted from configuration.
    pub const MAX_SECS: f32 = 10.0;

    /// Checks every field is finite and in range: durations within
    /// `0..=MAX_SECS`, fractions within `0..=1`.
    pub fn validate(&self) -> Result<(), TimingError> {
        let durations = [
            ("step_secs", self.step_secs),
            ("settle_secs", self.settle_secs),
        ];
        for (field, value) in durations {
            if !(0.0..=Self::MAX_SECS).contains(&value) {
                return Err(TimingError { field, value });
            }
        }
        let fractions = [
            ("lift_fraction", self.lift_fraction),
            ("glide_fraction", self.glide_fraction),
            ("drop_fraction", self.drop_fraction),
        ];
        for (field, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(TimingError { field, value });
            }
        }
        Ok(())
    }

    pub fn step_duration(&self) -> Duration {
        secs(self.step_secs)
    }

    pub fn lift(&self) -> Duration {
        secs(self.step_secs * self.lift_fraction)
    }

    pub fn glide(&self) -> Duration {
        secs(self.step_secs * self.glide_fraction)
    }

    pub fn drop(&self) -> Duration {
        secs(self.step_secs * self.drop_fraction)
    }

    /// Step plus the pause before the next one may start.
    pub fn total_per_step(&self) -> Duration {
        self.step_duration() + secs(self.settle_secs)
    }
}

fn secs(value: f32) -> Duration {
    if value > 0.0 {
        Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO)
    } else {
        Duration::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("timing {field} = {value} is out of range")]
pub struct TimingError {
    pub field: &'static str,
    pub value: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveStep {
    /// Placed from base onto the entry slot. Not counted against the roll.
    Entered { slot: usize },
    Advanced { from: usize, to: usize },
}

impl MoveStep {
    pub fn destination(&self) -> usize {
        match *self {
            MoveStep::Entered { slot } => slot,
            MoveStep::Advanced { to, .. } => to,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    Completed,
    /// The next slot was missing; the token rests where it stopped.
    Incomplete { stopped_at: usize, remaining: u8 },
    /// Token could not leave base.
    EntryFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveProgress {
    Step(MoveStep),
    Finished(MoveOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub token: TokenId,
    pub steps: u8,
    pub from: TokenPosition,
    pub timing: StepTiming,
}

/// The move currently in flight: one token walking `steps` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveWalk {
    token: TokenId,
    steps: u8,
    taken: u8,
    finished: Option<MoveOutcome>,
}

impl MoveWalk {
    pub fn new(token: TokenId, steps: u8) -> Self {
        Self {
            token,
            steps,
            taken: 0,
            finished: None,
        }
    }

    pub fn token(&self) -> TokenId {
        self.token
    }

    pub fn remaining(&self) -> u8 {
        self.steps - self.taken
    }

    pub fn outcome(&self) -> Option<MoveOutcome> {
        self.finished
    }

    /// Performs exactly one placement or advance, writing the token's new
    /// position before returning it. Once finished, keeps returning the same
    /// outcome.
    pub fn advance(&mut self, path: &PathModel, token: &mut Token) -> MoveProgress {
        if let Some(outcome) = self.finished {
            return MoveProgress::Finished(outcome);
        }

        let current = match token.position {
            TokenPosition::Base => {
                return match token.entry_index.filter(|&e| path.is_occupiable(e)) {
                    Some(slot) => {
                        token.position = TokenPosition::OnPath(slot);
                        MoveProgress::Step(MoveStep::Entered { slot })
                    }
                    None => self.finish(MoveOutcome::EntryFailed),
                };
            }
            TokenPosition::OnPath(index) => index,
        };

        if self.taken >= self.steps {
            return self.finish(MoveOutcome::Completed);
        }

        let next = path.advance(current, 1);
        if !path.is_occupiable(next) {
            return self.finish(MoveOutcome::Incomplete {
                stopped_at: current,
                remaining: self.remaining(),
            });
        }
        token.position = TokenPosition::OnPath(next);
        self.taken += 1;
        MoveProgress::Step(MoveStep::Advanced {
            from: current,
            to: next,
        })
    }

    fn finish(&mut self, outcome: MoveOutcome) -> MoveProgress {
        self.finished = Some(outcome);
        MoveProgress::Finished(outcome)
    }
}

/// Animates a token one cell at a time. Each call may take real time; the
/// token already sits on `step`'s destination when it is called.
pub trait MovementCollaborator {
    fn begin_move(&mut self, _request: &MoveRequest) {}

    fn animate_step(&mut self, token: &Token, step: MoveStep, timing: &StepTiming);

    fn end_move(&mut self, _token: &Token, _outcome: MoveOutcome) {}
}

/// Teleports: every step completes immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantMovement;

impl MovementCollaborator for InstantMovement {
    fn animate_step(&mut self, _token: &Token, _step: MoveStep, _timing: &StepTiming) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::SlotId;

    fn path_with_hole(length: usize, hole: Option<usize>) -> PathModel {
        let slots = (0..length)
            .map(|i| (Some(i) != hole).then(|| SlotId::new(format!("s{i}"))))
            .collect();
        PathModel::new(slots).unwrap()
    }

    fn run(walk: &mut MoveWalk, path: &PathModel, token: &mut Token) -> (Vec<MoveStep>, MoveOutcome) {
        let mut steps = Vec::new();
        loop {
            match walk.advance(path, token) {
                MoveProgress::Step(step) => steps.push(step),
                MoveProgress::Finished(outcome) => return (steps, outcome),
            }
        }
    }

    #[test]
    fn walk_from_base_enters_then_spends_every_step() {
        let path = path_with_hole(4, None);
        let mut token = Token::new(TokenId::new(0, 0), Some(2));
        let mut walk = MoveWalk::new(token.id, 6);
        let (steps, outcome) = run(&mut walk, &path, &mut token);
        assert_eq!(outcome, MoveOutcome::Completed);
        assert_eq!(steps[0], MoveStep::Entered { slot: 2 });
        assert_eq!(steps.len(), 7);
        assert_eq!(steps[1], MoveStep::Advanced { from: 2, to: 3 });
        assert_eq!(steps[2], MoveStep::Advanced { from: 3, to: 0 });
        assert_eq!(token.position, TokenPosition::OnPath(0));
    }

    #[test]
    fn walk_wraps_around_the_track() {
        let path = path_with_hole(4, None);
        let mut token = Token::new(TokenId::new(0, 0), Some(0));
        token.position = TokenPosition::OnPath(2);
        let mut walk = MoveWalk::new(token.id, 3);
        let (steps, outcome) = run(&mut walk, &path, &mut token);
        assert_eq!(outcome, MoveOutcome::Completed);
        assert_eq!(steps.len(), 3);
        assert_eq!(token.position, TokenPosition::OnPath(1));
    }

    #[test]
    fn walk_stops_before_a_missing_slot() {
        let path = path_with_hole(6, Some(3));
        let mut token = Token::new(TokenId::new(0, 0), Some(0));
        token.position = TokenPosition::OnPath(1);
        let mut walk = MoveWalk::new(token.id, 4);
        let (steps, outcome) = run(&mut walk, &path, &mut token);
        assert_eq!(steps, vec![MoveStep::Advanced { from: 1, to: 2 }]);
        assert_eq!(
            outcome,
            MoveOutcome::Incomplete {
                stopped_at: 2,
                remaining: 3
            }
        );
        assert_eq!(token.position, TokenPosition::OnPath(2));
        assert_eq!(walk.advance(&path, &mut token), MoveProgress::Finished(outcome));
    }

    #[test]
    fn walk_without_entry_fails_and_leaves_token_in_base() {
        let path = path_with_hole(4, None);
        let mut token = Token::new(TokenId::new(1, 0), None);
        let mut walk = MoveWalk::new(token.id, 6);
        let (steps, outcome) = run(&mut walk, &path, &mut token);
        assert!(steps.is_empty());
        assert_eq!(outcome, MoveOutcome::EntryFailed);
        assert!(token.is_in_base());
    }

    #[test]
    fn timing_splits_step_into_phases() {
        let timing = StepTiming::default();
        let total = timing.lift() + timing.glide() + timing.drop();
        let diff = total.as_secs_f32() - timing.step_duration().as_secs_f32();
        assert!(diff.abs() < 1e-4);
        assert!(timing.total_per_step() > timing.step_duration());
        let broken = StepTiming {
            step_secs: -1.0,
            ..StepTiming::default()
        };
        assert_eq!(broken.step_duration(), Duration::ZERO);
    }

    #[test]
    fn oversized_timings_never_panic_and_fail_validation() {
        let huge = StepTiming {
            step_secs: 1e20,
            ..StepTiming::default()
        };
        assert_eq!(huge.step_duration(), Duration::ZERO);
        assert_eq!(huge.total_per_step(), secs(huge.settle_secs));
        assert_eq!(
            huge.validate(),
            Err(TimingError {
                field: "step_secs",
                value: 1e20
            })
        );

        let lopsided = StepTiming {
            glide_fraction: 1.5,
            ..StepTiming::default()
        };
        assert!(lopsided.validate().is_err());
        assert_eq!(StepTiming::default().validate(), Ok(()));
    }
}
