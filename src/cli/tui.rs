use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Stdout, stdout};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use itertools::Itertools;
use ratatui::Frame;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use tracing::debug;

use crate::cli::board_display::{CellSpan, render_board};
use crate::game::dice::{RollSource, SeededDice};
use crate::game::{Game, GameEvent, MoveOutcome, MoveStep};
use crate::presentation::{PresentationState, roll_button_label};
use crate::types::{Color as PlayerColor, TokenId};

pub type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

pub const FLICKER_FRAMES: u32 = 15;
pub const FLICKER_INTERVAL: Duration = Duration::from_millis(50);

const MENU_ITEMS: [&str; 2] = ["Play", "Quit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Playing,
}

/// Cosmetic dice animation: random faces shown before the real roll.
#[derive(Debug, Clone)]
pub struct DiceFlicker {
    frames_left: u32,
    face: u8,
    next_frame: Instant,
}

impl DiceFlicker {
    pub fn start(now: Instant, faces: &mut impl RollSource) -> Self {
        Self {
            frames_left: FLICKER_FRAMES,
            face: faces.next(),
            next_frame: now + FLICKER_INTERVAL,
        }
    }

    pub fn face(&self) -> u8 {
        self.face
    }

    /// Advances the animation. Returns true once the last frame has shown.
    pub fn tick(&mut self, now: Instant, faces: &mut impl RollSource) -> bool {
        while self.frames_left > 0 && now >= self.next_frame {
            self.frames_left -= 1;
            self.face = faces.next();
            self.next_frame += FLICKER_INTERVAL;
        }
        self.frames_left == 0
    }
}

pub struct TuiApp {
    game: Game,
    view: Rc<RefCell<PresentationState>>,
    screen: Screen,
    menu_index: usize,
    flicker: Option<DiceFlicker>,
    next_step: Option<Instant>,
    // kept apart from the game's dice so the flicker never previews a roll
    flicker_faces: SeededDice,
    status: Option<String>,
    show_help: bool,
    should_quit: bool,
    history_scroll: u16,
}

impl TuiApp {
    /// `view` must be the handle of the presentation installed on `game`.
    pub fn new(game: Game, view: Rc<RefCell<PresentationState>>) -> Self {
        Self {
            game,
            view,
            screen: Screen::Menu,
            menu_index: 0,
            flicker: None,
            next_step: None,
            flicker_faces: SeededDice::from_entropy(),
            status: None,
            show_help: false,
            should_quit: false,
            history_scroll: 0,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn into_game(self) -> Game {
        self.game
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        // restore the terminal even when the loop failed
        let _ = disable_raw_mode();
        let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal) -> io::Result<()> {
        while !self.should_quit {
            self.tick(Instant::now());
            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
        }
        Ok(())
    }

    /// Drives the time-based parts: the dice flicker and step pacing.
    fn tick(&mut self, now: Instant) {
        if let Some(flicker) = self.flicker.as_mut() {
            if flicker.tick(now, &mut self.flicker_faces) {
                self.flicker = None;
                if let Err(err) = self.game.request_roll() {
                    self.status = Some(err.to_string());
                }
            }
        }

        let Some(due) = self.next_step else {
            return;
        };
        if now < due {
            return;
        }
        if self.game.engine.moving_token().is_none() {
            self.next_step = None;
            return;
        }
        match self.game.step_move() {
            Ok(_) => {
                self.next_step = self
                    .game
                    .engine
                    .moving_token()
                    .map(|_| now + self.game.engine.timing().total_per_step());
            }
            Err(err) => {
                debug!(%err, "step failed");
                self.status = Some(err.to_string());
                self.next_step = None;
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match self.screen {
            Screen::Menu => self.handle_menu_key(key),
            Screen::Playing => self.handle_game_key(key),
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.menu_index = self.menu_index.saturating_sub(1),
            KeyCode::Down => self.menu_index = (self.menu_index + 1).min(MENU_ITEMS.len() - 1),
            KeyCode::Enter => match MENU_ITEMS[self.menu_index] {
                "Play" => self.screen = Screen::Playing,
                _ => self.should_quit = true,
            },
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_game_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('h') => self.show_help = !self.show_help,
            KeyCode::Char('r') | KeyCode::Char(' ') => self.start_roll(),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                self.select(TokenId::new(self.game.engine.current_player(), index));
            }
            KeyCode::PageUp => self.history_scroll = self.history_scroll.saturating_sub(5),
            KeyCode::PageDown => self.history_scroll = self.history_scroll.saturating_add(5),
            _ => {}
        }
    }

    fn start_roll(&mut self) {
        if self.flicker.is_some() {
            return;
        }
        if !self.view.borrow().roll_enabled || !self.game.engine.can_roll() {
            self.status = Some("Roll is not available right now".to_string());
            return;
        }
        self.status = None;
        self.flicker = Some(DiceFlicker::start(Instant::now(), &mut self.flicker_faces));
    }

    fn select(&mut self, token: TokenId) {
        if self.flicker.is_some() {
            return;
        }
        match self.game.select(token) {
            Ok(_) => {
                self.status = None;
                self.next_step = Some(Instant::now());
            }
            Err(err) => self.status = Some(err.to_string()),
        }
    }

    fn render(&mut self, f: &mut Frame<'_>) {
        match self.screen {
            Screen::Menu => self.render_menu(f),
            Screen::Playing => self.render_game(f),
        }
    }

    fn render_menu(&self, f: &mut Frame<'_>) {
        let area = centered(f.size(), 30, 8);
        let items: Vec<ListItem<'_>> = MENU_ITEMS.iter().map(|item| ListItem::new(*item)).collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Ludo")
                    .title_style(
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(self.menu_index));
        f.render_stateful_widget(list, area, &mut state);
    }

    fn render_game(&mut self, f: &mut Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(16),
                Constraint::Length(3),
            ])
            .split(f.size());

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(chunks[1]);

        let side_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(main_chunks[1]);

        self.render_banner(f, chunks[0]);
        self.render_board(f, main_chunks[0]);
        self.render_turn_panel(f, side_chunks[0]);
        self.render_history(f, side_chunks[1]);
        self.render_status_bar(f, chunks[2]);
    }

    fn render_banner(&self, f: &mut Frame<'_>, area: Rect) {
        let view = self.view.borrow();
        let paragraph = Paragraph::new(view.banner.clone())
            .block(Block::default().borders(Borders::ALL))
            .style(
                Style::default()
                    .fg(player_color(view.current_player))
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
    }

    fn render_board(&self, f: &mut Frame<'_>, area: Rect) {
        let observation = self.game.observation();
        let rendered = render_board(&observation);
        let highlighted = self.view.borrow().highlighted.clone();

        let mut span_lookup: HashMap<(usize, usize), CellSpan> = HashMap::new();
        for span in &rendered.cells {
            span_lookup.insert((span.row, span.col_start), *span);
        }
        let highlighted_cells: Vec<usize> = observation
            .players
            .iter()
            .flat_map(|player| player.tokens.iter())
            .filter(|token| highlighted.contains(&token.id))
            .filter_map(|token| token.path_index())
            .collect();
        let moving_cell = observation.moving.and_then(|id| {
            observation
                .players
                .iter()
                .flat_map(|player| player.tokens.iter())
                .find(|token| token.id == id)
                .and_then(|token| token.path_index())
        });

        let lines: Vec<Line<'_>> = rendered
            .text
            .lines()
            .enumerate()
            .map(|(row, line)| {
                let chars: Vec<char> = line.chars().collect();
                let mut spans: Vec<Span<'_>> = Vec::new();
                let mut col = 0;
                while col < chars.len() {
                    if let Some(span) = span_lookup.get(&(row, col)) {
                        let end = (col + span.len).min(chars.len());
                        let segment: String = chars[col..end].iter().collect();
                        let mut style = style_for_cell(&segment);
                        if moving_cell == Some(span.index) {
                            style = style.add_modifier(Modifier::REVERSED);
                        } else if highlighted_cells.contains(&span.index) {
                            style = style.bg(Color::Yellow).fg(Color::Black);
                        }
                        spans.push(Span::styled(segment, style));
                        col = end;
                        continue;
                    }
                    spans.push(Span::raw(chars[col].to_string()));
                    col += 1;
                }
                Line::from(spans)
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Board")
            .title_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        let paragraph = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    fn render_turn_panel(&self, f: &mut Frame<'_>, area: Rect) {
        let view = self.view.borrow();
        let observation = self.game.observation();
        let mut lines: Vec<Line<'_>> = vec![Line::from(vec![
            Span::raw("Turn "),
            Span::styled(
                observation.turn.to_string(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
        ])];

        let dice = match (&self.flicker, view.last_roll) {
            (Some(flicker), _) => Span::styled(
                format!("[ {} ]", flicker.face()),
                Style::default().fg(Color::DarkGray),
            ),
            (None, Some(value)) => Span::styled(
                format!("[ {value} ]"),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            (None, None) => Span::raw("[ - ]"),
        };
        lines.push(Line::from(vec![Span::raw("Dice: "), dice]));

        for (idx, player) in observation.players.iter().enumerate() {
            let marker = if idx == observation.current_player { "→ " } else { "  " };
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Yellow)),
                Span::styled(
                    player.name.clone(),
                    Style::default()
                        .fg(player_color(idx))
                        .add_modifier(Modifier::BOLD),
                ),
            ]));
            lines.push(Line::from(format!(
                "  In base: {}  On track: {}",
                player.in_base, player.on_path
            )));
        }

        let current_name = observation
            .players
            .get(observation.current_player)
            .map(|p| p.name.as_str())
            .unwrap_or("?");
        let roll_style = if view.roll_enabled && self.flicker.is_none() {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("[r] {}", roll_button_label(current_name)),
            roll_style,
        )));
        if !view.highlighted.is_empty() {
            let choices = view
                .highlighted
                .iter()
                .map(|id| format!("[{}] {}", id.index + 1, id))
                .join("  ");
            lines.push(Line::from(Span::styled(
                format!("Move: {choices}"),
                Style::default().fg(Color::Yellow),
            )));
        }
        if let Some(status) = &self.status {
            lines.push(Line::from(Span::styled(
                status.clone(),
                Style::default().fg(Color::LightRed),
            )));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Turn"))
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    fn render_history(&mut self, f: &mut Frame<'_>, area: Rect) {
        let names = self.game.player_names();
        let lines: Vec<Line<'_>> = self
            .game
            .event_log()
            .iter()
            .filter_map(|event| format_history_entry(&names, event))
            .map(Line::from)
            .collect();
        let lines = if lines.is_empty() {
            vec![Line::from("Nothing has happened yet.")]
        } else {
            lines
        };

        let viewport = area.height.saturating_sub(2);
        let max_scroll = line_count(lines.len()).saturating_sub(viewport);
        // pinned to the newest entries unless scrolled back
        let scroll = max_scroll.saturating_sub(self.history_scroll.min(max_scroll));
        self.history_scroll = self.history_scroll.min(max_scroll);

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("History"))
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0));
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&self, f: &mut Frame<'_>, area: Rect) {
        let help_text = if self.show_help {
            "r/Space: Roll | 1-9: Move token | PgUp/PgDn: Scroll history | h: Toggle help | q/Esc: Quit"
        } else {
            "Press 'h' for help"
        };
        let paragraph = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::White))
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
    }
}

fn line_count(lines: usize) -> u16 {
    u16::try_from(lines).unwrap_or(u16::MAX)
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn player_color(player: usize) -> Color {
    match PlayerColor::for_player(player) {
        Some(PlayerColor::Red) => Color::Red,
        Some(PlayerColor::Blue) => Color::Blue,
        None => Color::White,
    }
}

fn style_for_cell(label: &str) -> Style {
    if label.contains('r') || label.contains('R') {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else if label.contains('b') || label.contains('B') {
        Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
    } else if label.contains('*') {
        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

/// One history line per event worth showing; bookkeeping events are skipped.
pub fn format_history_entry(names: &[String], event: &GameEvent) -> Option<String> {
    let name = |player: usize| {
        names
            .get(player)
            .cloned()
            .unwrap_or_else(|| format!("Player {player}"))
    };
    let line = match event {
        GameEvent::DiceRolled { player, value } => format!("{} rolled {value}", name(*player)),
        GameEvent::CurrentPlayerResynced { to, .. } => {
            format!("Turn handed to {} (out-of-turn roll)", name(*to))
        }
        GameEvent::NoLegalMove { player, .. } => format!("{} has no move", name(*player)),
        GameEvent::MoveStarted { request } => {
            format!("{} moves {} steps", request.token, request.steps)
        }
        GameEvent::TokenStepped {
            token,
            step: MoveStep::Entered { slot },
        } => format!("{token} enters the track at {slot}"),
        GameEvent::MoveFinished { token, outcome } => match outcome {
            MoveOutcome::Completed => return None,
            MoveOutcome::Incomplete {
                stopped_at,
                remaining,
            } => format!("{token} blocked at {stopped_at} ({remaining} steps lost)"),
            MoveOutcome::EntryFailed => format!("{token} could not leave base"),
        },
        GameEvent::ExtraTurn { player } => format!("{} rolls again", name(*player)),
        GameEvent::TurnAdvanced { next_player } => format!("--- {}'s turn", name(*next_player)),
        GameEvent::TokenStepped { .. }
        | GameEvent::RollEnabled { .. }
        | GameEvent::SelectableTokensChanged { .. } => return None,
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ScriptedDice;

    #[test]
    fn flicker_runs_fifteen_frames_then_finishes() {
        let mut faces = SeededDice::new(3);
        let start = Instant::now();
        let mut flicker = DiceFlicker::start(start, &mut faces);
        assert!(!flicker.tick(start, &mut faces));
        assert!(!flicker.tick(start + FLICKER_INTERVAL * 14, &mut faces));
        assert!(flicker.tick(start + FLICKER_INTERVAL * 15, &mut faces));
        assert!((1..=6).contains(&flicker.face()));
    }

    #[test]
    fn flicker_faces_come_from_their_own_source() {
        let mut faces = ScriptedDice::new([2, 5]);
        let start = Instant::now();
        let mut flicker = DiceFlicker::start(start, &mut faces);
        assert_eq!(flicker.face(), 2);
        flicker.tick(start + FLICKER_INTERVAL, &mut faces);
        assert_eq!(flicker.face(), 5);
    }

    #[test]
    fn history_scroll_saturates_on_huge_logs() {
        assert_eq!(line_count(70_000), u16::MAX);
        assert_eq!(line_count(12), 12);
    }

    #[test]
    fn history_skips_bookkeeping_events() {
        let names = vec!["Red".to_string(), "Blue".to_string()];
        assert_eq!(
            format_history_entry(&names, &GameEvent::DiceRolled { player: 1, value: 4 }),
            Some("Blue rolled 4".to_string())
        );
        assert_eq!(
            format_history_entry(&names, &GameEvent::RollEnabled { enabled: true }),
            None
        );
        assert_eq!(
            format_history_entry(&names, &GameEvent::TurnAdvanced { next_player: 0 }),
            Some("--- Red's turn".to_string())
        );
    }
}
