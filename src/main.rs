//! # unicorn-jump
//!
//! This crate is a tiny arcade game played in the terminal. A unicorn falls towards the ground,
//! and every hit on the space bar sends it back up and scores a point. The session ends when the
//! unicorn lands, and the best score is kept between runs.
//!
//! It is inspired on the browser clicker games where you keep something in the air for as long as
//! you can.

#![expect(
    unused_crate_dependencies,
    reason = "The dependencies are used in the library crate."
)]

use anyhow::Result;
use unicorn_jump::init;

fn main() -> Result<()> {
    init()
}
