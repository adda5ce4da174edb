pub mod game;
pub mod input;
pub mod share;
pub mod streak;
