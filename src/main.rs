mod config;
mod engine;
mod game;
mod input;
mod snake;
mod term;
mod ticker;

use clap::Parser;
use log::info;

pub type TermInt = u16;
pub type TermPos = (u16, u16);
/// Board cell. Signed so that a head one step past the wall is representable.
pub type Coords = (i32, i32);

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let settings = config::Cli::parse().settings();
    info!("Starting with {:?}", settings);

    let mut game = game::SnakeGame::new(settings)?;
    // The terminal is restored before any error gets printed
    game.run()
}
