//! The game module wires everything together: it parses the command line, opens the store, and
//! runs the event loop that feeds key presses and frames to the engine and draws the result.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Parser;
use console::Term;
use fastrand::Rng;
use log::{debug, info};

use crate::engine::{Event, GameEngine, Physics};
use crate::frame::{draw, layout, Scenery};
use crate::input::{command_for, confirm_reset, require_terminal, spawn_key_reader, Command};
use crate::store::{FileStore, KeyValueStore};
use crate::ticker::{FrameClock, Signal};

/// This struct holds the command-line interface of the game, parsed with clap's derive API. Every
/// option may also be given through its environment variable.
#[derive(Parser)]
#[command(name = "unicorn-jump", version, about)]
#[command(next_line_help = true)]
struct Cli {
    /// The number of frames simulated per second.
    ///
    /// The physics advance by a fixed step on every frame, so this also sets how fast the unicorn
    /// falls.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=240))]
    #[arg(env = "UNICORN_JUMP_FPS", value_name = "FRAMES")]
    fps: u32,
    /// Forget the stored high score before playing; asks for confirmation first.
    #[arg(long)]
    reset_high_score: bool,
    /// The file the high score is kept in.
    ///
    /// It is created on the first high score and holds a single TOML table of string values.
    #[arg(long, default_value = "unicorn-jump.toml")]
    #[arg(env = "UNICORN_JUMP_STORE", value_name = "PATH")]
    store: PathBuf,
}

/// This struct hides the cursor for as long as it lives and restores the terminal when dropped,
/// whichever way the game loop exits.
struct TerminalGuard<'term> {
    /// The terminal the game is drawn on.
    term: &'term Term,
}

impl<'term> TerminalGuard<'term> {
    /// This function takes over `term`: the screen is cleared, the cursor hidden and the title set.
    fn acquire(term: &'term Term) -> Result<Self> {
        term.clear_screen()?;
        term.hide_cursor()?;
        term.set_title("unicorn-jump");
        Ok(Self { term })
    }
}

impl Drop for TerminalGuard<'_> {
    fn drop(&mut self) {
        // nothing sensible is left to do with a failure while giving the terminal back
        let _ = self.term.clear_screen();
        let _ = self.term.show_cursor();
    }
}

/// Starts the game and runs it until the player quits. This is the `main()` of the game, called
/// from main.rs.
///
/// # Errors
///
/// The function fails when it is not run in a terminal, when the terminal cannot be written to or
/// read from, or when a helper thread cannot be spawned. Losing the store is not an error: the game
/// is played without a stored high score.
pub fn init() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let term = Term::stdout();
    require_terminal(&term)?;

    let store = FileStore::open(&cli.store);
    info!("using store {}", store.path().display());

    let mut engine = GameEngine::new(store, Physics::default());

    if cli.reset_high_score && confirm_reset(&term, engine.state().high_score)? {
        let _ = engine.reset_high_score();
    }

    let frame_interval = Duration::from_secs(1) / cli.fps;
    run(&term, &mut engine, frame_interval)
}

/// This function runs the event loop. Every key press and every frame is applied to the engine on
/// this thread, one at a time, and the screen is redrawn after each of them.
///
/// The frame clock is synced with the phase after every event, so a ticker runs exactly while a
/// session is active, and is stopped whichever way the loop exits.
fn run<S: KeyValueStore>(
    term: &Term,
    engine: &mut GameEngine<S>,
    frame_interval: Duration,
) -> Result<()> {
    let _guard = TerminalGuard::acquire(term)?;
    let (sender, receiver): (Sender<Signal>, Receiver<Signal>) = mpsc::channel();
    let mut rng = Rng::new();
    let scenery = Scenery::new(&mut rng);
    let mut clock = FrameClock::new(frame_interval);

    let reader = term.clone();
    spawn_key_reader(move || reader.read_key_raw(), sender.clone())?;
    draw(term, &layout(engine.state(), engine.physics(), &scenery, term.size()))?;

    let outcome: Result<()> = loop {
        let event = match receiver.recv()? {
            Signal::Closed(err) => {
                break Err(err).context("could not read from the terminal");
            }
            Signal::Frame(stamp) => {
                // frames queued by a ticker that has since been cancelled
                if !clock.accepts(stamp) {
                    continue;
                }
                Event::Tick
            }
            Signal::Key(key) => match command_for(&key, engine.state().phase) {
                Command::Ignore => continue,
                Command::Jump => Event::Jump,
                Command::Quit => break Ok(()),
                Command::Start => Event::Start,
            },
        };

        let previous = engine.state().phase;
        let phase = engine.dispatch(event).phase;
        clock.sync(phase, &sender)?;

        if phase != previous {
            debug!(
                "phase {previous:?} -> {phase:?}, frame clock at generation {}",
                clock.generation()
            );
            term.clear_screen()?;
        }

        draw(term, &layout(engine.state(), engine.physics(), &scenery, term.size()))?;
    };

    clock.stop();
    info!("quitting with high score {}", engine.state().high_score);
    outcome
}
