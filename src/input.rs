//! This module contains everything related to taking input from the player: the mapping from key
//! presses to game commands, the thread that reads those key presses, and the one `dialoguer`
//! prompt the game asks before it starts.

use std::io;
use std::sync::mpsc::Sender;
use std::thread;

use anyhow::{bail, Result};
use console::{style, Key, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use log::debug;

use crate::engine::Phase;
use crate::ticker::Signal;

/// This enum holds what a key press asks the game to do.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Command {
    /// The key does nothing in the current phase.
    Ignore,
    /// The sprite was hit.
    Jump,
    /// The player wants to leave the game.
    Quit,
    /// The start or replay button was pressed.
    Start,
}

/// This function maps a key press to a command, given the phase the game is in.
///
/// Jumps are forwarded in every phase and left for the engine to ignore. Starting is only offered
/// while no session is running, the same way the start button is only shown then.
pub(crate) fn command_for(key: &Key, phase: Phase) -> Command {
    match *key {
        Key::Escape | Key::CtrlC | Key::Char('q' | 'Q') => Command::Quit,
        Key::Char(' ' | 'j' | 'k') | Key::ArrowUp => Command::Jump,
        Key::Enter | Key::Char('s' | 'S') if phase != Phase::Active => Command::Start,
        _ => Command::Ignore,
    }
}

/// This function makes sure the game is attached to a terminal. Without one there is nothing to
/// draw on and no key presses to read.
pub(crate) fn require_terminal(term: &Term) -> Result<()> {
    if !term.is_term() {
        bail!("unicorn-jump must be run in an interactive terminal");
    }
    Ok(())
}

/// This function spawns the thread that forwards key presses to the game thread, reading them with
/// `read_key`, which for the game is `Term::read_key_raw` so that Ctrl+C arrives as a key.
///
/// The thread is detached: it blocks on the terminal and ends with the process, as soon as the
/// game thread hangs up, or after a failed read, which it reports as `Signal::Closed`.
pub(crate) fn spawn_key_reader<R>(mut read_key: R, sender: Sender<Signal>) -> Result<()>
where
    R: FnMut() -> io::Result<Key> + Send + 'static,
{
    let reader = thread::Builder::new()
        .name("key-reader".to_owned())
        .spawn(move || loop {
            match read_key() {
                Ok(key) => {
                    if sender.send(Signal::Key(key)).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    debug!("key reader stopping: {err}");
                    let _ = sender.send(Signal::Closed(err));
                    break;
                }
            }
        })?;

    drop(reader);
    Ok(())
}

/// This function asks the player to confirm that the stored high score should be forgotten.
pub(crate) fn confirm_reset(term: &Term, high_score: u32) -> Result<bool> {
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "{}",
            style(format!("Reset the high score of {high_score}?")).bold()
        ))
        .default(false)
        .interact_on(term)?;

    Ok(confirmed)
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn quit_keys_work_in_every_phase() {
        for phase in [Phase::Idle, Phase::Active, Phase::Over] {
            assert_eq!(command_for(&Key::Char('q'), phase), Command::Quit);
            assert_eq!(command_for(&Key::Escape, phase), Command::Quit);
        }
    }

    #[test]
    fn ctrl_c_quits() {
        for phase in [Phase::Idle, Phase::Active, Phase::Over] {
            assert_eq!(command_for(&Key::CtrlC, phase), Command::Quit);
        }
    }

    #[test]
    fn jump_keys_are_always_forwarded() {
        for phase in [Phase::Idle, Phase::Active, Phase::Over] {
            assert_eq!(command_for(&Key::Char(' '), phase), Command::Jump);
            assert_eq!(command_for(&Key::ArrowUp, phase), Command::Jump);
        }
    }

    #[test]
    fn start_is_only_offered_outside_a_session() {
        assert_eq!(command_for(&Key::Enter, Phase::Idle), Command::Start);
        assert_eq!(command_for(&Key::Char('s'), Phase::Over), Command::Start);
        assert_eq!(command_for(&Key::Enter, Phase::Active), Command::Ignore);
    }

    #[test]
    fn other_keys_are_ignored() {
        assert_eq!(command_for(&Key::Char('x'), Phase::Active), Command::Ignore);
        assert_eq!(command_for(&Key::Tab, Phase::Idle), Command::Ignore);
    }

    #[test]
    fn reader_forwards_keys_then_reports_failure() {
        let mut keys = vec![
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone")),
            Ok(Key::Char(' ')),
        ];
        let (sender, receiver) = mpsc::channel();
        spawn_key_reader(move || keys.pop().unwrap(), sender).unwrap();

        let timeout = Duration::from_secs(5);
        assert!(matches!(
            receiver.recv_timeout(timeout).unwrap(),
            Signal::Key(Key::Char(' '))
        ));
        match receiver.recv_timeout(timeout).unwrap() {
            Signal::Closed(err) => assert_eq!(err.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected the reader to close, got {other:?}"),
        }

        // the reader exits after reporting, dropping its end of the channel
        assert!(matches!(
            receiver.recv_timeout(timeout),
            Err(mpsc::RecvTimeoutError::Disconnected)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn plain_files_are_not_terminals() {
        let path = std::env::temp_dir().join(format!(
            "unicorn-jump-input-{}.txt",
            std::process::id()
        ));
        let read = File::create(&path).unwrap();
        let write = read.try_clone().unwrap();
        let term = Term::read_write_pair(read, write);

        let err = require_terminal(&term).unwrap_err();
        assert!(err.to_string().contains("interactive terminal"));

        let _ = fs::remove_file(&path);
    }
}
