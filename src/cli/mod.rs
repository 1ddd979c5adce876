pub mod board_display;
pub mod tui;

pub use board_display::{RenderedBoard, render_board};
pub use tui::{DiceFlicker, Terminal, TuiApp};
