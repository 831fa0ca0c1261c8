pub mod config;
pub mod simulation;
pub mod track;
pub mod editor;
pub mod input;
pub mod compute;
pub mod game;

pub use config::*;
pub use game::Game;
