//! Turn rules driven straight through the engine.

use ludo_rs::board::{Board, BoardConfig, PathModel, PlayerConfig, SetupWarning};
use ludo_rs::game::{
    GameEvent, MoveOutcome, MoveProgress, MoveStep, OutOfTurnRoll, SelectionRejection,
    StepTiming, TokenPosition, TurnEngine, TurnError,
};
use ludo_rs::types::{TokenId, TurnPhase};

fn engine_for(config: BoardConfig) -> TurnEngine {
    let (board, _) = Board::from_config(&config).unwrap();
    TurnEngine::new(board, OutOfTurnRoll::Resync, StepTiming::default())
}

/// Walks the move in flight to the end and reports completion.
fn finish_move(engine: &mut TurnEngine) -> (Vec<MoveStep>, MoveOutcome, Vec<GameEvent>) {
    let token = engine.moving_token().unwrap();
    let mut steps = Vec::new();
    let outcome = loop {
        match engine.advance_move().unwrap() {
            MoveProgress::Step(step) => steps.push(step),
            MoveProgress::Finished(outcome) => break outcome,
        }
    };
    let events = engine.on_move_finished(token).unwrap().events;
    (steps, outcome, events)
}

fn position(engine: &TurnEngine, id: TokenId) -> TokenPosition {
    engine.token(id).unwrap().position
}

const RED_1: TokenId = TokenId {
    player: 0,
    index: 0,
};

#[test]
fn six_from_base_enters_and_keeps_the_turn() {
    let mut engine = engine_for(BoardConfig::ring(4, [2, 0], 1));

    engine.on_roll(6, None).unwrap();
    assert_eq!(engine.selectable_tokens(), &[RED_1]);
    engine.on_select(RED_1).unwrap();
    let (steps, outcome, events) = finish_move(&mut engine);

    assert_eq!(steps.first(), Some(&MoveStep::Entered { slot: 2 }));
    assert_eq!(steps.len(), 7);
    assert_eq!(outcome, MoveOutcome::Completed);
    assert_eq!(position(&engine, RED_1), TokenPosition::OnPath(0));
    assert!(events.contains(&GameEvent::ExtraTurn { player: 0 }));
    assert_eq!(engine.current_player(), 0);
    assert_eq!(engine.phase(), TurnPhase::AwaitingRoll);
    assert!(engine.can_roll());
}

#[test]
fn path_moves_wrap_modulo_length() {
    let mut engine = engine_for(BoardConfig::ring(4, [2, 0], 1));

    // enter and lap round to slot 0, then step to slot 2
    engine.on_roll(6, None).unwrap();
    engine.on_select(RED_1).unwrap();
    finish_move(&mut engine);
    engine.on_roll(2, None).unwrap();
    engine.on_select(RED_1).unwrap();
    finish_move(&mut engine);
    assert_eq!(position(&engine, RED_1), TokenPosition::OnPath(2));
    assert_eq!(engine.current_player(), 1);

    // blue has nothing out, so the turn comes straight back
    engine.on_roll(1, None).unwrap();
    assert_eq!(engine.current_player(), 0);

    engine.on_roll(3, None).unwrap();
    engine.on_select(RED_1).unwrap();
    let (_, outcome, _) = finish_move(&mut engine);
    assert_eq!(outcome, MoveOutcome::Completed);
    assert_eq!(position(&engine, RED_1), TokenPosition::OnPath(1));
    assert_eq!(engine.current_player(), 1);
}

#[test]
fn empty_selection_passes_the_turn_immediately() {
    let mut engine = engine_for(BoardConfig::standard());

    let events = engine.on_roll(4, None).unwrap().events;

    assert!(events.contains(&GameEvent::NoLegalMove { player: 0, roll: 4 }));
    assert!(events.contains(&GameEvent::TurnAdvanced { next_player: 1 }));
    assert_eq!(engine.current_player(), 1);
    assert_eq!(engine.phase(), TurnPhase::AwaitingRoll);
    assert!(engine.selectable_tokens().is_empty());
    assert_eq!(engine.turn(), 1);
}

#[test]
fn second_selection_of_a_moving_token_is_ignored() {
    let mut engine = engine_for(BoardConfig::standard());
    engine.on_roll(6, None).unwrap();
    engine.on_select(RED_1).unwrap();
    engine.advance_move().unwrap();

    let state = engine.state().clone();
    let rosters = engine.rosters().to_vec();
    assert_eq!(
        engine.on_select(RED_1),
        Err(TurnError::InvalidSelection {
            token: RED_1,
            reason: SelectionRejection::AlreadyMoving,
        })
    );
    assert_eq!(engine.state(), &state);
    assert_eq!(engine.rosters(), rosters.as_slice());
    assert_eq!(engine.moving_token(), Some(RED_1));
}

#[test]
fn base_tokens_are_never_selectable_without_a_six() {
    for roll in 1..=5 {
        let mut engine = engine_for(BoardConfig::standard());
        engine.on_roll(roll, None).unwrap();
        assert!(engine.selectable_tokens().is_empty(), "roll {roll}");
        assert_eq!(engine.current_player(), 1, "roll {roll}");
    }
}

#[test]
fn unresolved_entry_points_keep_tokens_in_base() {
    let mut config = BoardConfig::ring(8, [0, 4], 2);
    config.players[0] = PlayerConfig {
        name: "Red".into(),
        tokens: 2,
        entries: vec!["p00".into(), "not-on-board".into()],
    };
    let (board, warnings) = Board::from_config(&config).unwrap();
    assert_eq!(
        warnings,
        vec![SetupWarning::UnresolvedEntryPoint {
            token: TokenId::new(0, 1),
            entry: Some("not-on-board".into()),
        }]
    );

    let mut engine = TurnEngine::new(board, OutOfTurnRoll::Resync, StepTiming::default());
    engine.on_roll(6, None).unwrap();
    assert_eq!(engine.selectable_tokens(), &[RED_1]);
    assert_eq!(
        engine.on_select(TokenId::new(0, 1)),
        Err(TurnError::InvalidSelection {
            token: TokenId::new(0, 1),
            reason: SelectionRejection::NotSelectable,
        })
    );
}

#[test]
fn turn_alternates_unless_six_was_rolled() {
    let mut engine = engine_for(BoardConfig::ring(12, [0, 6], 1));
    engine.on_roll(6, None).unwrap();
    engine.on_select(RED_1).unwrap();
    finish_move(&mut engine);
    assert_eq!(engine.current_player(), 0);

    for roll in 1..=5 {
        let before = engine.current_player();
        engine.on_roll(roll, None).unwrap();
        if let Some(&token) = engine.selectable_tokens().first() {
            engine.on_select(token).unwrap();
            finish_move(&mut engine);
        }
        assert_ne!(engine.current_player(), before, "roll {roll}");
    }
}

#[test]
fn rejected_selection_leaves_state_unchanged() {
    let mut engine = engine_for(BoardConfig::standard());
    engine.on_roll(6, None).unwrap();
    let state = engine.state().clone();

    let blue = TokenId::new(1, 0);
    assert_eq!(
        engine.on_select(blue),
        Err(TurnError::InvalidSelection {
            token: blue,
            reason: SelectionRejection::NotOwner,
        })
    );
    let stranger = TokenId::new(0, 9);
    assert_eq!(
        engine.on_select(stranger),
        Err(TurnError::InvalidSelection {
            token: stranger,
            reason: SelectionRejection::UnknownToken,
        })
    );
    assert_eq!(engine.state(), &state);
    assert_eq!(engine.phase(), TurnPhase::AwaitingSelection);
}

#[test]
fn selection_before_rolling_is_rejected() {
    let mut engine = engine_for(BoardConfig::standard());
    assert_eq!(
        engine.on_select(RED_1),
        Err(TurnError::InvalidSelection {
            token: RED_1,
            reason: SelectionRejection::NotAwaitingSelection,
        })
    );
}

#[test]
fn walk_halts_in_front_of_a_missing_slot() {
    let mut config = BoardConfig::ring(8, [0, 4], 1);
    config.missing_slots = vec![4];
    let mut engine = engine_for(config);

    engine.on_roll(6, None).unwrap();
    engine.on_select(RED_1).unwrap();
    let (_, outcome, events) = finish_move(&mut engine);
    assert_eq!(
        outcome,
        MoveOutcome::Incomplete {
            stopped_at: 3,
            remaining: 3
        }
    );
    assert!(events.contains(&GameEvent::ExtraTurn { player: 0 }));
    assert_eq!(position(&engine, RED_1), TokenPosition::OnPath(3));

    // landing on the hole itself is never offered
    engine.on_roll(1, None).unwrap();
    assert!(engine.selectable_tokens().is_empty());
    assert_eq!(engine.current_player(), 1);
}

#[test]
fn missing_entry_slot_blocks_the_whole_roster() {
    let mut config = BoardConfig::ring(8, [0, 4], 2);
    config.missing_slots = vec![0];
    let mut engine = engine_for(config);
    engine.on_roll(6, None).unwrap();
    assert!(engine.selectable_tokens().is_empty());
    assert_eq!(engine.current_player(), 1);
}

#[test]
fn advance_is_modular_for_any_length() {
    for length in 1..=13 {
        let path = PathModel::from_ids((0..length).map(|i| format!("s{i}"))).unwrap();
        for index in 0..length {
            for steps in 0..=20 {
                let next = path.advance(index, steps);
                assert!(next < length);
                assert_eq!(next, (index + steps) % length);
            }
        }
    }
}
