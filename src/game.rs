use std::time::{Duration, Instant};

use crate::{Coords, TermInt};
use crate::config::{fitted, Settings};
use crate::engine::{Engine, GameState, Phase};
use crate::input::{is_ctrl_c, Control, InputHandler};
use crate::term::TermManager;
use crate::ticker::Ticker;

use anyhow::Result;
use crossterm::event::{Event, KeyCode};
use log::{error, info, warn};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

// Longest wait for input while no tick is due
const IDLE_WAIT: Duration = Duration::from_millis(100);

// Board origin on screen: a header row, then the border
const BOARD_LEFT: TermInt = 1;
const BOARD_TOP: TermInt = 2;

const SNAKE_BODY_CHAR: char = '█';
const FOOD_CHAR: char = 'O';
const DEAD_SNAKE_CHAR: char = 'X';

/// Host loop. Owns the one live `GameState` and swaps in a new value after
/// every tick or control.
pub struct SnakeGame {
    term: TermManager,
    engine: Engine<StdRng>,
    state: GameState,
    ticker: Ticker,
    input: InputHandler,
}

impl SnakeGame {
    pub fn new(mut settings: Settings) -> Result<Self> {
        let term = TermManager::new()?;
        settings.fit_to(term.size());

        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let engine = Engine::new(settings.rules, rng);
        let state = engine.reset();

        Ok(SnakeGame { term, engine, state, ticker: Ticker::new(settings.interval), input: InputHandler::new() })
    }

    pub fn run(&mut self) -> Result<()> {
        self.term.setup()?;
        let res = self.intro().and_then(|quit| if quit { Ok(()) } else { self.play() });
        self.ticker.stop();
        let restored = self.term.restore();
        first_error(res, restored)
    }

    ///////////////////////////////////////////////////////////////////////////

    /// Shows the controls. Returns whether the player chose to quit.
    fn intro(&mut self) -> Result<bool> {
        self.term.show_message(&[
            "Drag with the mouse, arrow keys or WASD to steer",
            "Space or Esc to pause, r to restart",
            "q or CTRL+C to quit",
            "",
            "Press any key to begin",
        ])?;

        let key = self.term.read_key_blocking()?;
        self.term.hide_message()?;
        Ok(is_ctrl_c(&key) || key.code == KeyCode::Char('q'))
    }

    fn play(&mut self) -> Result<()> {
        self.start()?;

        loop {
            let wait = self.ticker.time_left(Instant::now()).map_or(IDLE_WAIT, |left| left.min(IDLE_WAIT));

            for ev in self.term.read_events(wait)? {
                if let Event::Resize(width, height) = ev {
                    self.resize(width, height)?;
                    continue;
                }

                match self.input.handle_event(&ev) {
                    Some(Control::Quit) => return Ok(()),
                    Some(Control::Turn(dir)) => self.state = self.state.clone().set_direction(dir),
                    Some(Control::TogglePause) => self.toggle_pause()?,
                    Some(Control::Reset) => self.start()?,
                    None => {},
                }
            }

            if let Some(next) = drive(&mut self.engine, &mut self.ticker, &self.state, Instant::now()) {
                let prev = std::mem::replace(&mut self.state, next);
                if self.state.is_game_over {
                    self.game_over()?;
                } else {
                    self.draw_update(&prev)?;
                }
            }
        }
    }

    fn start(&mut self) -> Result<()> {
        self.state = restart(&self.engine, &mut self.ticker, Instant::now());
        let bounds = self.engine.rules().bounds;
        info!("New game on a {}x{} board", bounds.x_max + 1, bounds.y_max + 1);

        self.redraw()
    }

    fn resize(&mut self, width: TermInt, height: TermInt) -> Result<()> {
        self.term.resize(width, height);

        let bounds = self.engine.rules().bounds;
        if fitted(bounds, (width, height)) != bounds {
            warn!("Board {}x{} no longer fits a {}x{} terminal", bounds.x_max + 1, bounds.y_max + 1, width, height);
        }

        self.redraw()
    }

    fn toggle_pause(&mut self) -> Result<()> {
        if self.state.is_game_over {
            return Ok(());
        }

        self.state = self.state.clone().toggle_pause();
        self.draw_header()?;
        self.show_status()
    }

    fn game_over(&mut self) -> Result<()> {
        for pos in self.state.snake.body().to_vec() {
            self.print_cell(pos, DEAD_SNAKE_CHAR)?;
        }
        self.draw_header()?;
        self.show_status()
    }

    /// Puts up the box matching the current phase, or takes it down while running.
    fn show_status(&mut self) -> Result<()> {
        match status_message(&self.state) {
            Some(lines) => {
                let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
                self.term.show_message(&lines)
            },
            None => self.term.hide_message(),
        }
    }

    fn redraw(&mut self) -> Result<()> {
        let bounds = self.engine.rules().bounds;
        let size = ((bounds.x_max + 3) as TermInt, (bounds.y_max + 3) as TermInt);

        self.term.clear()?;
        self.term.draw_borders((BOARD_LEFT - 1, BOARD_TOP - 1), size)?;
        self.draw_header()?;

        let food = self.state.food;
        self.print_cell(food, FOOD_CHAR)?;
        let body_char = if self.state.is_game_over { DEAD_SNAKE_CHAR } else { SNAKE_BODY_CHAR };
        for (i, pos) in self.state.snake.body().to_vec().into_iter().enumerate() {
            let ch = if i == 0 && !self.state.is_game_over { self.state.direction.head_char() } else { body_char };
            self.print_cell(pos, ch)?;
        }

        self.term.flush()?;
        self.show_status()
    }

    fn draw_update(&mut self, prev: &GameState) -> Result<()> {
        for (pos, ch) in changed_cells(prev, &self.state) {
            self.print_cell(pos, ch)?;
        }
        if self.state.score != prev.score {
            self.draw_header()?;
        }

        self.term.flush()
    }

    fn draw_header(&mut self) -> Result<()> {
        let status = match self.state.phase() {
            Phase::Running => "",
            Phase::Paused => "  [Paused]",
            Phase::GameOver => "  [Game over]",
        };
        self.term.print_line((0, 0), &format!(" Score: {}{}", self.state.score, status))?;
        self.term.flush()
    }

    /// Board cells outside the bounds are never drawn.
    fn print_cell(&mut self, pos: Coords, ch: char) -> Result<()> {
        if !self.engine.rules().bounds.contains(pos) {
            return Ok(());
        }

        let screen = ((pos.0 + BOARD_LEFT as i32) as TermInt, (pos.1 + BOARD_TOP as i32) as TermInt);
        self.term.print_at(screen, ch)
    }
}

/// Runs a move if a beat is due. A paused game lets the beat pass, and the
/// move that ends the game stops the ticker.
fn drive<R: Rng>(engine: &mut Engine<R>, ticker: &mut Ticker, state: &GameState, now: Instant) -> Option<GameState> {
    if !ticker.poll(now) || state.phase() != Phase::Running {
        return None;
    }

    let next = engine.advance(state, state.direction);
    if next.is_game_over {
        ticker.stop();
    }
    Some(next)
}

fn restart<R: Rng>(engine: &Engine<R>, ticker: &mut Ticker, now: Instant) -> GameState {
    ticker.start(now);
    engine.reset()
}

/// Cells to repaint between two consecutive states. Blanks come first so a
/// cell that is both vacated and reoccupied ends up drawn.
fn changed_cells(prev: &GameState, next: &GameState) -> Vec<(Coords, char)> {
    let mut cells = vec![];
    let old_tail = prev.snake.tail();
    let food_moved = next.food != prev.food;

    if !next.snake.contains(&old_tail) {
        cells.push((old_tail, ' '));
    }
    // with some tolerance the head eats food it never steps on
    if food_moved && !next.snake.contains(&prev.food) {
        cells.push((prev.food, ' '));
    }

    if next.snake.len() > 1 {
        cells.push((prev.snake.head(), SNAKE_BODY_CHAR));
    }
    cells.push((next.snake.head(), next.direction.head_char()));

    if food_moved {
        cells.push((next.food, FOOD_CHAR));
    }
    cells
}

fn status_message(state: &GameState) -> Option<Vec<String>> {
    match state.phase() {
        Phase::Running => None,
        Phase::Paused => Some(vec![
            "Paused".to_string(),
            "Press Space or Esc to resume".to_string(),
            "or q to quit".to_string(),
        ]),
        Phase::GameOver => Some(vec![
            "Game over!".to_string(),
            format!("Score: {}", state.score),
            String::new(),
            "Press r to play again,".to_string(),
            "or q to quit.".to_string(),
        ]),
    }
}

/// The game's own error wins over a failed terminal restore.
fn first_error(res: Result<()>, restored: Result<()>) -> Result<()> {
    if let (Err(_), Err(err)) = (&res, &restored) {
        error!("Failed to restore terminal: {:#}", err);
    }
    res.and(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Bounds, BoundsPolicy, Rules};
    use crate::snake::{Direction::*, Snake};
    use anyhow::anyhow;

    const BEAT: Duration = Duration::from_millis(50);

    fn engine(rules: Rules) -> Engine<StdRng> {
        Engine::new(rules, StdRng::seed_from_u64(3))
    }

    fn running_ticker(t0: Instant) -> Ticker {
        let mut ticker = Ticker::new(BEAT);
        ticker.start(t0);
        ticker
    }

    #[test]
    fn test_drive_moves_on_each_beat() {
        let t0 = Instant::now();
        let mut engine = engine(Rules::default());
        let mut ticker = running_ticker(t0);
        let state = engine.reset();

        assert_eq!(drive(&mut engine, &mut ticker, &state, t0 + Duration::from_millis(10)), None);

        let next = drive(&mut engine, &mut ticker, &state, t0 + BEAT).unwrap();
        assert_eq!(next.snake.head(), (6, 5));
        assert!(ticker.is_running());
    }

    #[test]
    fn test_drive_skips_paused_game() {
        let t0 = Instant::now();
        let mut engine = engine(Rules::default());
        let mut ticker = running_ticker(t0);
        let paused = engine.reset().toggle_pause();

        assert_eq!(drive(&mut engine, &mut ticker, &paused, t0 + BEAT), None);
        assert!(ticker.is_running());

        let resumed = paused.toggle_pause();
        let next = drive(&mut engine, &mut ticker, &resumed, t0 + 2 * BEAT).unwrap();
        assert_eq!(next.snake.head(), (6, 5));
    }

    #[test]
    fn test_drive_stops_ticker_on_game_over() {
        let t0 = Instant::now();
        let mut rules = Rules::new(Bounds::new(35, 63));
        rules.policy = BoundsPolicy::Candidate;
        let mut engine = engine(rules);
        let mut ticker = running_ticker(t0);
        let state = GameState { snake: Snake::new((35, 5)), ..engine.reset() };

        let next = drive(&mut engine, &mut ticker, &state, t0 + BEAT).unwrap();
        assert!(next.is_game_over);
        assert!(!ticker.is_running());
        assert_eq!(drive(&mut engine, &mut ticker, &next, t0 + 10 * BEAT), None);
    }

    #[test]
    fn test_drive_ignores_finished_game() {
        let t0 = Instant::now();
        let mut engine = engine(Rules::default());
        let mut ticker = running_ticker(t0);
        let over = GameState { is_game_over: true, ..engine.reset() };

        assert_eq!(drive(&mut engine, &mut ticker, &over, t0 + BEAT), None);
    }

    #[test]
    fn test_restart_runs_ticker_again() {
        let t0 = Instant::now();
        let engine = engine(Rules::default());
        let mut ticker = Ticker::new(BEAT);

        let state = restart(&engine, &mut ticker, t0);
        assert!(ticker.is_running());
        assert_eq!(state, engine.reset());
        assert!(ticker.poll(t0 + BEAT));
    }

    #[test]
    fn test_changed_cells_clear_food_eaten_from_a_distance() {
        let mut rules = Rules::default();
        rules.tolerance = 1;
        let mut engine = engine(rules);
        let prev = GameState { food: (6, 6), ..engine.reset() };

        let next = engine.advance(&prev, Right);
        assert_eq!(next.snake.head(), (6, 5));
        assert_eq!(next.snake.len(), 2);

        let cells = changed_cells(&prev, &next);
        let last_paint = cells.iter().rev().find(|(pos, _)| *pos == (6, 6)).map(|(_, ch)| *ch);
        if next.food == (6, 6) {
            assert_eq!(last_paint, None);
        } else {
            assert_eq!(last_paint, Some(' '));
        }
        assert!(cells.contains(&((next.food), FOOD_CHAR)));
        assert!(cells.contains(&((5, 5), SNAKE_BODY_CHAR)));
        assert!(!cells.contains(&((5, 5), ' ')));
    }

    #[test]
    fn test_changed_cells_plain_move() {
        let mut engine = engine(Rules::default());
        let prev = engine.reset();
        let next = engine.advance(&prev, Down);

        assert_eq!(changed_cells(&prev, &next), vec![((5, 5), ' '), ((5, 6), 'v')]);
    }

    #[test]
    fn test_changed_cells_keep_food_eaten_under_head() {
        let mut engine = engine(Rules::default());
        let prev = GameState { food: (6, 5), ..engine.reset() };
        let next = engine.advance(&prev, Right);

        let cells = changed_cells(&prev, &next);
        assert!(!cells.iter().any(|(pos, ch)| *ch == ' ' && next.snake.contains(pos)));
        assert_eq!(cells.last(), Some(&(next.food, FOOD_CHAR)));
    }

    #[test]
    fn test_status_message_per_phase() {
        let state = engine(Rules::default()).reset();
        assert_eq!(status_message(&state), None);

        let paused = status_message(&state.clone().toggle_pause()).unwrap();
        assert_eq!(paused[0], "Paused");

        let over = GameState { is_game_over: true, score: 30, ..state };
        let lines = status_message(&over).unwrap();
        assert_eq!(lines[0], "Game over!");
        assert_eq!(lines[1], "Score: 30");
    }

    #[test]
    fn test_first_error_keeps_game_error() {
        let err = first_error(Err(anyhow!("lost input")), Err(anyhow!("restore failed"))).unwrap_err();
        assert_eq!(err.to_string(), "lost input");

        let err = first_error(Ok(()), Err(anyhow!("restore failed"))).unwrap_err();
        assert_eq!(err.to_string(), "restore failed");

        assert!(first_error(Ok(()), Ok(())).is_ok());
    }
}
