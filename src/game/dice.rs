use rand::{Rng, SeedableRng, rngs::StdRng};

pub const MIN_FACE: u8 = 1;
pub const MAX_FACE: u8 = 6;

/// Anything that can produce a single die value in `1..=6`.
pub trait RollSource {
    fn next(&mut self) -> u8;
}

#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: StdRng,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RollSource for SeededDice {
    fn next(&mut self) -> u8 {
        self.rng.gen_range(MIN_FACE..=MAX_FACE)
    }
}

/// Replays a fixed list of rolls, starting over once exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    rolls: Vec<u8>,
    cursor: usize,
}

impl ScriptedDice {
    pub fn new(rolls: impl Into<Vec<u8>>) -> Self {
        let rolls = rolls
            .into()
            .into_iter()
            .map(|roll| roll.clamp(MIN_FACE, MAX_FACE))
            .collect();
        Self { rolls, cursor: 0 }
    }
}

impl RollSource for ScriptedDice {
    fn next(&mut self) -> u8 {
        if self.rolls.is_empty() {
            return MAX_FACE;
        }
        let roll = self.rolls[self.cursor % self.rolls.len()];
        self.cursor += 1;
        roll
    }
}

impl<R: RollSource + ?Sized> RollSource for Box<R> {
    fn next(&mut self) -> u8 {
        (**self).next()
    }
}
