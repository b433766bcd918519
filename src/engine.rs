use crate::Coords;
use crate::snake::{step, Direction, Snake};

use log::{debug, info, trace};
use rand::Rng;
use rand::seq::SliceRandom;

pub const INITIAL_HEAD: Coords = (5, 5);
pub const INITIAL_FOOD: Coords = (5, 20);
pub const SCORE_INCREMENT: u32 = 10;

/// Inclusive playable area, `[0, x_max] x [0, y_max]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Bounds {
    pub x_max: i32,
    pub y_max: i32,
}

impl Bounds {
    pub fn new(x_max: i32, y_max: i32) -> Self {
        Bounds { x_max: x_max.max(0), y_max: y_max.max(0) }
    }

    pub fn contains(&self, pos: Coords) -> bool {
        pos.0 >= 0 && pos.1 >= 0 && pos.0 <= self.x_max && pos.1 <= self.y_max
    }

    pub fn clamp(&self, pos: Coords) -> Coords {
        (pos.0.max(0).min(self.x_max), pos.1.max(0).min(self.y_max))
    }

    pub fn cells(&self) -> impl Iterator<Item = Coords> {
        let (x_max, y_max) = (self.x_max, self.y_max);
        (0..=y_max).flat_map(move |y| (0..=x_max).map(move |x| (x, y)))
    }
}

/// Which head gets checked against the bounds on every tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BoundsPolicy {
    /// The head before moving. A snake leaving the board spends one tick
    /// outside it before the game ends.
    PreMove,
    /// The head after moving. The game ends on the tick that would leave the board.
    Candidate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rules {
    pub bounds: Bounds,
    pub policy: BoundsPolicy,
    /// Max per-axis distance in cells at which the head still eats the food.
    pub tolerance: i32,
    pub score_increment: u32,
}

impl Rules {
    pub fn new(bounds: Bounds) -> Self {
        Rules { bounds, policy: BoundsPolicy::PreMove, tolerance: 0, score_increment: SCORE_INCREMENT }
    }

    pub fn coincides(&self, head: Coords, food: Coords) -> bool {
        (head.0 - food.0).abs() <= self.tolerance && (head.1 - food.1).abs() <= self.tolerance
    }
}

impl Default for Rules {
    fn default() -> Self {
        Rules::new(Bounds::new(35, 63))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    Running,
    Paused,
    GameOver,
}

/// A snapshot of the whole game. Transitions never mutate a snapshot in
/// place, they build the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub snake: Snake,
    pub food: Coords,
    pub direction: Direction,
    pub score: u32,
    pub is_game_over: bool,
    pub is_paused: bool,
}

impl GameState {
    pub fn initial(rules: &Rules) -> Self {
        let head = rules.bounds.clamp(INITIAL_HEAD);
        let mut food = rules.bounds.clamp(INITIAL_FOOD);
        // Small boards can clamp both onto one cell; take the first free one instead
        if food == head {
            food = rules.bounds.cells().find(|pos| *pos != head).unwrap_or(food);
        }

        GameState {
            snake: Snake::new(head),
            food,
            direction: Direction::Right,
            score: 0,
            is_game_over: false,
            is_paused: false,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.is_game_over {
            Phase::GameOver
        } else if self.is_paused {
            Phase::Paused
        } else {
            Phase::Running
        }
    }

    /// Plain assignment of the heading, reversals included.
    pub fn set_direction(self, direction: Direction) -> Self {
        GameState { direction, ..self }
    }

    /// Flips the pause flag. A finished game stays as it is.
    pub fn toggle_pause(self) -> Self {
        if self.is_game_over {
            return self;
        }

        let is_paused = !self.is_paused;
        debug!("{}", if is_paused { "paused" } else { "resumed" });
        GameState { is_paused, ..self }
    }

    fn finished(&self) -> Self {
        GameState { is_game_over: true, ..self.clone() }
    }
}

/// Uniform draw over the whole grid, snake or not.
pub fn random_food_position<R: Rng + ?Sized>(x_max: i32, y_max: i32, rng: &mut R) -> Coords {
    (rng.gen_range(0..=x_max), rng.gen_range(0..=y_max))
}

pub struct Engine<R: Rng> {
    rules: Rules,
    rng: R,
}

impl<R: Rng> Engine<R> {
    pub fn new(rules: Rules, rng: R) -> Self {
        Engine { rules, rng }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn reset(&self) -> GameState {
        GameState::initial(&self.rules)
    }

    /// Runs one tick moving towards `direction`. Finished games come back unchanged.
    pub fn advance(&mut self, state: &GameState, direction: Direction) -> GameState {
        if state.is_game_over {
            return state.clone();
        }

        let head = state.snake.head();
        let new_head = step(head, direction);

        let checked = match self.rules.policy {
            BoundsPolicy::PreMove => head,
            BoundsPolicy::Candidate => new_head,
        };
        if !self.rules.bounds.contains(checked) {
            info!("Game over: hit the wall at {:?}, score {}", checked, state.score);
            return state.finished();
        }

        let growing = self.rules.coincides(new_head, state.food);
        if state.snake.bites(new_head, growing) {
            info!("Game over: bit itself at {:?}, score {}", new_head, state.score);
            return state.finished();
        }

        let snake = state.snake.moved(new_head, growing);
        trace!("head {:?} -> {:?}", head, new_head);

        let (food, score) = if growing {
            let food = self.place_food(&snake);
            let score = state.score + self.rules.score_increment;
            debug!("Ate food at {:?}, length {}, score {}, next food at {:?}", state.food, snake.len(), score, food);
            (food, score)
        } else {
            (state.food, state.score)
        };

        GameState { snake, food, direction, score, ..state.clone() }
    }

    /// Picks a free cell, or any cell at all once the snake fills the board.
    fn place_food(&mut self, snake: &Snake) -> Coords {
        let choices: Vec<Coords> = self.rules.bounds.cells().filter(|pos| !snake.contains(pos)).collect();

        match choices.choose(&mut self.rng) {
            Some(pos) => *pos,
            None => {
                let Bounds { x_max, y_max } = self.rules.bounds;
                random_food_position(x_max, y_max, &mut self.rng)
            }
        }
    }
}
