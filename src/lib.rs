// Game core: puzzle selection, the per-letter input model, streak tracking and
// persistence. The terminal front end lives in the binary (main.rs, app.rs, ui/)
// and only talks to the core through `session::game::Game` and its events.

pub mod config;
pub mod error;
pub mod puzzle;
pub mod session;
pub mod store;
