use std::time::Duration;

use clap::Parser;
use log::warn;

use crate::engine::{Bounds, BoundsPolicy, Rules};

#[derive(Parser, Debug)]
#[command(name = "swipe-snake")]
#[command(version, about = "Snake in the terminal. Drag with the mouse or use the arrow keys to steer.")]
#[command(after_help = "Set RUST_LOG (e.g. RUST_LOG=debug) and redirect stderr to a file to get a game log.")]
pub struct Cli {
    /// Largest x coordinate of the board (inclusive)
    #[arg(long, default_value_t = 35)]
    pub x_max: u16,

    /// Largest y coordinate of the board (inclusive)
    #[arg(long, default_value_t = 63)]
    pub y_max: u16,

    /// Milliseconds between two moves
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: u64,

    /// Cells of slack allowed between the head and the food when eating
    #[arg(long, default_value_t = 0)]
    pub tolerance: u16,

    /// End the game on the move that leaves the board rather than one move later
    #[arg(long)]
    pub strict_bounds: bool,

    /// Seed for food placement, for reproducible games
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub rules: Rules,
    pub interval: Duration,
    pub seed: Option<u64>,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        let policy = if self.strict_bounds { BoundsPolicy::Candidate } else { BoundsPolicy::PreMove };
        let rules = Rules {
            policy,
            tolerance: self.tolerance as i32,
            ..Rules::new(Bounds::new(self.x_max as i32, self.y_max as i32))
        };

        Settings { rules, interval: Duration::from_millis(self.interval_ms), seed: self.seed }
    }
}

impl Settings {
    /// Shrinks the board so that it fits, with its border and header row, in a
    /// terminal of the given size.
    pub fn fit_to(&mut self, (width, height): (u16, u16)) {
        let bounds = self.rules.bounds;
        let fitted = fitted(bounds, (width, height));

        if fitted != bounds {
            warn!(
                "Board {}x{} does not fit a {}x{} terminal, shrinking to {}x{}",
                bounds.x_max + 1, bounds.y_max + 1, width, height, fitted.x_max + 1, fitted.y_max + 1
            );
            self.rules.bounds = fitted;
        }
    }
}

/// Largest board no bigger than `bounds` that fits the terminal.
pub fn fitted(bounds: Bounds, (width, height): (u16, u16)) -> Bounds {
    // two border columns; a header row plus two border rows
    Bounds::new(
        bounds.x_max.min(width as i32 - 3),
        bounds.y_max.min(height as i32 - 4),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Cli::parse_from(["swipe-snake"]).settings();
        assert_eq!(settings.rules, Rules::default());
        assert_eq!(settings.interval, Duration::from_millis(50));
        assert_eq!(settings.seed, None);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "swipe-snake", "--x-max", "20", "--y-max", "30", "--interval-ms", "120",
            "--tolerance", "1", "--strict-bounds", "--seed", "9",
        ]);
        let settings = cli.settings();
        assert_eq!(settings.rules.bounds, Bounds::new(20, 30));
        assert_eq!(settings.rules.policy, BoundsPolicy::Candidate);
        assert_eq!(settings.rules.tolerance, 1);
        assert_eq!(settings.interval, Duration::from_millis(120));
        assert_eq!(settings.seed, Some(9));
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(Cli::try_parse_from(["swipe-snake", "--interval-ms", "0"]).is_err());
    }

    #[test]
    fn test_fit_to_small_terminal() {
        let mut settings = Cli::parse_from(["swipe-snake"]).settings();
        settings.fit_to((80, 24));
        assert_eq!(settings.rules.bounds, Bounds::new(35, 20));

        settings.fit_to((200, 100));
        assert_eq!(settings.rules.bounds, Bounds::new(35, 20));
    }
}
