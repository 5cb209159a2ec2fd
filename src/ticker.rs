//! This module contains the frame clock of the game. The engine owns no clock of its own; it is
//! fed one `Signal::Frame` per frame by a `FrameTicker` for as long as a session is active.
//!
//! Frames and key presses travel over the same channel so the game thread applies them strictly
//! one after the other. `FrameClock` decides when a ticker runs and which frames still count.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use console::Key;
use log::{debug, warn};

use crate::engine::Phase;

/// This enum holds everything the game thread may be woken up by.
#[derive(Debug)]
pub(crate) enum Signal {
    /// The terminal can no longer be read from; no key press will ever follow.
    Closed(io::Error),
    /// A frame is due. It carries the generation of the ticker that produced it, so frames left in
    /// the channel by a cancelled ticker can be told apart.
    Frame(u64),
    /// A key was pressed.
    Key(Key),
}

/// This struct is a handle to a repeating frame task. The task runs until the handle is cancelled
/// or dropped, and dropping it waits for the task to stop.
#[derive(Debug)]
pub(crate) struct FrameTicker {
    /// This field contains the generation stamped on every frame this ticker sends.
    generation: u64,
    /// This field contains the flag the task checks before sending each frame.
    stop: Arc<AtomicBool>,
    /// This field contains the thread running the task, until it has been joined.
    worker: Option<JoinHandle<()>>,
}

impl FrameTicker {
    /// This function spawns the task, which sends a `Signal::Frame(generation)` on `sender` every
    /// `interval` until cancelled or until the receiving end goes away.
    pub(crate) fn start(generation: u64, interval: Duration, sender: Sender<Signal>) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let worker = thread::Builder::new()
            .name(format!("frame-ticker-{generation}"))
            .spawn(move || loop {
                thread::sleep(interval);

                if flag.load(Ordering::Acquire) || sender.send(Signal::Frame(generation)).is_err() {
                    break;
                }
            })?;

        debug!("frame ticker {generation} started");

        Ok(Self {
            generation,
            stop,
            worker: Some(worker),
        })
    }

    /// This function stops the task and waits for its thread to finish.
    pub(crate) fn cancel(mut self) {
        self.shutdown();
    }

    /// This function returns the generation stamped on this ticker's frames.
    pub(crate) const fn generation(&self) -> u64 {
        self.generation
    }

    /// This function raises the stop flag and joins the worker, once.
    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("frame ticker {} panicked", self.generation);
            } else {
                debug!("frame ticker {} stopped", self.generation);
            }
        }
    }
}

impl Drop for FrameTicker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// This struct keeps a frame ticker running exactly while a session is active, and numbers the
/// tickers it starts so frames from a cancelled one are recognised.
#[derive(Debug)]
pub(crate) struct FrameClock {
    /// This field contains the generation of the most recently started ticker; zero before any.
    generation: u64,
    /// This field contains the time between two frames.
    interval: Duration,
    /// This field contains the running ticker, if a session is active.
    ticker: Option<FrameTicker>,
}

impl FrameClock {
    /// This function creates a clock with no ticker running.
    pub(crate) const fn new(interval: Duration) -> Self {
        Self {
            generation: 0,
            interval,
            ticker: None,
        }
    }

    /// This function returns whether a frame stamped with `stamp` comes from the running ticker.
    pub(crate) fn accepts(&self, stamp: u64) -> bool {
        self.ticker.as_ref().map(FrameTicker::generation) == Some(stamp)
    }

    /// This function returns the generation of the most recently started ticker.
    pub(crate) const fn generation(&self) -> u64 {
        self.generation
    }

    /// This function returns whether a ticker is currently running.
    pub(crate) const fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// This function cancels the running ticker, if any.
    pub(crate) fn stop(&mut self) {
        if let Some(stopped) = self.ticker.take() {
            stopped.cancel();
        }
    }

    /// This function brings the ticker in line with `phase`: a new ticker sending on `sender` is
    /// started when a session has just become active, and the running one is cancelled as soon as
    /// the session is no longer active.
    pub(crate) fn sync(&mut self, phase: Phase, sender: &Sender<Signal>) -> Result<()> {
        match (self.is_running(), phase) {
            (false, Phase::Active) => {
                self.generation += 1;
                self.ticker = Some(FrameTicker::start(
                    self.generation,
                    self.interval,
                    sender.clone(),
                )?);
            }
            (true, Phase::Idle | Phase::Over) => self.stop(),
            (true, Phase::Active) | (false, Phase::Idle | Phase::Over) => {}
        }
        Ok(())
    }
}
