//! The library components of the game. They hold the session state machine and its physics, the
//! store the high score is kept in, and the terminal front end that plays it.
//!
//! The starting point of the library is the game.rs file, which contains the main game loop. The
//! `engine` and `store` modules are public so the game can be driven without a terminal.

#![expect(
    clippy::cargo_common_metadata,
    reason = "The package has not yet been pushed to a remote."
)]

pub mod engine;
mod frame;
mod game;
mod input;
pub mod store;
mod ticker;

pub use game::init;
