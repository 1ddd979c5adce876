use std::collections::HashMap;

use itertools::Itertools;

use crate::observation::{Observation, TokenObservation};
use crate::types::{Color, TokenId};

const CELL_WIDTH: usize = 4;

/// Where one path cell landed in the rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpan {
    pub index: usize,
    pub row: usize,
    pub col_start: usize,
    pub len: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RenderedBoard {
    pub text: String,
    pub cells: Vec<CellSpan>,
}

// Lays the ring out clockwise around a square, starting top-left.
fn ring_position(index: usize, side: usize) -> (usize, usize) {
    if index < side {
        (0, index)
    } else if index < 2 * side {
        (index - side, side)
    } else if index < 3 * side {
        (side, side - (index - 2 * side))
    } else {
        (side - (index - 3 * side), 0)
    }
}

fn cell_label(
    index: usize,
    occupants: &[&TokenObservation],
    holes: &[usize],
    entries: &HashMap<usize, Color>,
) -> String {
    if holes.contains(&index) {
        return " ".repeat(CELL_WIDTH);
    }
    let inner = match occupants {
        [] => match entries.get(&index) {
            Some(color) => format!("{}.", color.marker().to_ascii_uppercase()),
            None => "..".to_string(),
        },
        [only] => only.id.to_string(),
        [first, rest @ ..] => {
            let mixed = rest.iter().any(|t| t.id.player != first.id.player);
            let marker = if mixed { '*' } else { marker_for(first.id) };
            format!("{}{}", occupants.len(), marker)
        }
    };
    format!("[{inner:<2}]")
}

fn marker_for(id: TokenId) -> char {
    Color::for_player(id.player).map(Color::marker).unwrap_or('?')
}

/// Renders the track and both bases. Missing slots are left blank.
pub fn render_board(observation: &Observation) -> RenderedBoard {
    let length = observation.path_length;
    let side = length.div_ceil(4).max(1);

    let mut entries: HashMap<usize, Color> = HashMap::new();
    for player in &observation.players {
        for token in &player.tokens {
            if let Some(entry) = token.entry_index {
                entries.entry(entry).or_insert(player.color);
            }
        }
    }

    let mut grid = vec![vec![' '; (side + 1) * CELL_WIDTH]; side + 1];
    let mut cells = Vec::with_capacity(length);
    for index in 0..length {
        let (row, col) = ring_position(index, side);
        let occupants: Vec<&TokenObservation> = observation.tokens_at(index).collect();
        let label = cell_label(
            index,
            &occupants,
            &observation.missing_slots,
            &entries,
        );
        let col_start = col * CELL_WIDTH;
        for (offset, ch) in label.chars().take(CELL_WIDTH).enumerate() {
            grid[row][col_start + offset] = ch;
        }
        cells.push(CellSpan {
            index,
            row,
            col_start,
            len: CELL_WIDTH,
        });
    }

    let mut lines: Vec<String> = grid
        .into_iter()
        .map(|row| row.into_iter().collect::<String>().trim_end().to_string())
        .collect();
    lines.push(String::new());
    for player in &observation.players {
        let waiting = player
            .tokens
            .iter()
            .filter(|t| t.path_index().is_none())
            .map(|t| t.id.to_string())
            .join(" ");
        lines.push(format!("{} base: {}", player.name, waiting));
    }

    RenderedBoard {
        text: lines.join("\n"),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, BoardConfig};
    use crate::game::{OutOfTurnRoll, StepTiming, TurnEngine};
    use crate::observation::observation_from_engine;

    fn observation(config: BoardConfig) -> Observation {
        let (board, _) = Board::from_config(&config).unwrap();
        observation_from_engine(&TurnEngine::new(
            board,
            OutOfTurnRoll::default(),
            StepTiming::default(),
        ))
    }

    #[test]
    fn ring_positions_are_distinct() {
        for length in 1usize..60 {
            let side = length.div_ceil(4).max(1);
            let positions: Vec<_> = (0..length).map(|i| ring_position(i, side)).collect();
            assert_eq!(positions.iter().unique().count(), length, "length {length}");
        }
    }

    #[test]
    fn standard_board_shows_entries_and_bases() {
        let rendered = render_board(&observation(BoardConfig::standard()));
        assert_eq!(rendered.cells.len(), 52);
        let first = rendered.text.lines().next().unwrap();
        assert!(first.starts_with("[R.][..]"));
        assert!(rendered.text.contains("Red base: r1 r2 r3 r4"));
        assert!(rendered.text.contains("Blue base: b1 b2 b3 b4"));
    }

    #[test]
    fn missing_slots_render_blank() {
        let mut config = BoardConfig::ring(8, [0, 4], 1);
        config.missing_slots = vec![1];
        let rendered = render_board(&observation(config));
        let first = rendered.text.lines().next().unwrap();
        assert!(first.starts_with("[R.]    [..]"));
    }
}
