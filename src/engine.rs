//! The engine module contains the game itself: the state of one session, the events that move it
//! forward and the physics constants they are evaluated with.
//!
//! Every transition goes through `GameState::step`, a pure function from a state and an event to
//! the next state. `GameEngine` wraps it with the one side effect the game has, which is writing
//! the high score to a `KeyValueStore` whenever a session beats it.

use log::{debug, info, warn};

use crate::store::{load_high_score, KeyValueStore, HIGH_SCORE_KEY};

/// The coarse lifecycle stage of a session.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// The sprite is falling and taking jumps.
    Active,
    /// Nothing has been played since the game was opened.
    Idle,
    /// The sprite hit the ground; a new session may be started.
    Over,
}

/// The inputs a session reacts to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Event {
    /// Give the sprite an upward impulse and score a point.
    Jump,
    /// Start a fresh session.
    Start,
    /// Advance the physics by one frame.
    Tick,
}

/// The fixed constants a session is simulated with. Positions grow downwards, from the top of the
/// play area at zero to the ground.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Physics {
    /// Downward acceleration added to the velocity on every tick.
    pub gravity: f64,
    /// Position at which the session ends.
    pub ground_level: f64,
    /// Position a session starts from, high enough above the ground to leave time to react.
    pub initial_position: f64,
    /// Velocity set by a jump; negative, as it points upwards.
    pub jump_impulse: f64,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            gravity: 0.2,
            ground_level: 350.0,
            initial_position: 100.0,
            jump_impulse: -15.0,
        }
    }
}

/// A snapshot of one session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GameState {
    /// Best score ever observed, including previous runs of the game.
    pub high_score: u32,
    /// Lifecycle stage of the session.
    pub phase: Phase,
    /// Vertical offset of the sprite from the top of the play area, within `[0, ground_level]`
    /// while the session runs.
    pub position: f64,
    /// Jumps performed in the current session.
    pub score: u32,
    /// Current vertical speed; positive values point downwards.
    pub velocity: f64,
}

impl GameState {
    /// Creates the state shown before anything has been played.
    #[must_use]
    pub const fn new(high_score: u32, physics: &Physics) -> Self {
        Self {
            high_score,
            phase: Phase::Idle,
            position: physics.initial_position,
            score: 0,
            velocity: 0.0,
        }
    }

    /// Returns whether the sprite is currently in the air.
    #[must_use]
    pub fn is_airborne(&self) -> bool {
        self.phase == Phase::Active
    }

    /// Returns whether the session that just ended set the high score.
    #[must_use]
    pub fn is_new_high_score(&self) -> bool {
        self.phase == Phase::Over && self.score > 0 && self.score == self.high_score
    }

    /// Returns the state that follows `self` once `event` has been applied.
    ///
    /// Jumps and ticks outside of an active session leave the state untouched. A tick moves the
    /// sprite with the velocity of the previous tick before gravity is added, and ends the session
    /// once the ground is reached, which is the only place the high score is raised.
    #[must_use]
    pub fn step(self, event: Event, physics: &Physics) -> Self {
        match (event, self.phase) {
            (Event::Start, _) => Self {
                phase: Phase::Active,
                position: physics.initial_position,
                score: 0,
                velocity: 0.0,
                ..self
            },
            (Event::Jump, Phase::Active) => Self {
                score: self.score.saturating_add(1),
                velocity: physics.jump_impulse,
                ..self
            },
            (Event::Tick, Phase::Active) => {
                let position = (self.position + self.velocity).max(0.0);

                if position >= physics.ground_level {
                    Self {
                        high_score: self.high_score.max(self.score),
                        phase: Phase::Over,
                        position: physics.ground_level,
                        ..self
                    }
                } else {
                    Self {
                        position,
                        velocity: self.velocity + physics.gravity,
                        ..self
                    }
                }
            }
            (Event::Jump | Event::Tick, Phase::Idle | Phase::Over) => self,
        }
    }
}

/// This struct drives sessions one event at a time and keeps the persisted high score in sync
/// with them.
#[derive(Debug)]
pub struct GameEngine<S> {
    /// The constants every transition is evaluated with.
    physics: Physics,
    /// The current snapshot.
    state: GameState,
    /// Where the high score is read from on creation and written to when beaten.
    store: S,
}

impl<S: KeyValueStore> GameEngine<S> {
    /// Creates an idle engine, loading the high score out of `store`. A missing or malformed entry
    /// counts as a high score of zero.
    pub fn new(store: S, physics: Physics) -> Self {
        let high_score = load_high_score(&store);
        debug!("loaded high score {high_score}");

        Self {
            physics,
            state: GameState::new(high_score, &physics),
            store,
        }
    }

    /// Applies `event` and returns the resulting state.
    ///
    /// When the event ends a session with a better score than the stored one, the new high score
    /// is written to the store. A store that fails to write is logged; the game goes on with the
    /// new high score in memory.
    pub fn dispatch(&mut self, event: Event) -> &GameState {
        let previous = self.state;
        self.state = previous.step(event, &self.physics);

        match (previous.phase, self.state.phase) {
            (Phase::Idle | Phase::Over, Phase::Active) => info!("session started"),
            (Phase::Active, Phase::Over) => {
                info!("session over with score {}", self.state.score);
            }
            _ => {}
        }

        if self.state.high_score != previous.high_score {
            self.persist_high_score();
        }

        &self.state
    }

    /// Gives the sprite an upward impulse; ignored unless a session is active.
    pub fn jump(&mut self) -> &GameState {
        self.dispatch(Event::Jump)
    }

    /// Returns the constants the engine simulates with.
    pub const fn physics(&self) -> &Physics {
        &self.physics
    }

    /// Forgets the high score, both in memory and in the store.
    pub fn reset_high_score(&mut self) -> &GameState {
        self.state.high_score = 0;
        self.persist_high_score();
        &self.state
    }

    /// Starts a fresh session from wherever the previous one left off.
    pub fn start(&mut self) -> &GameState {
        self.dispatch(Event::Start)
    }

    /// Returns the current snapshot.
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Returns the store the high score is persisted to.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Advances the physics by one frame; ignored unless a session is active.
    pub fn tick(&mut self) -> &GameState {
        self.dispatch(Event::Tick)
    }

    /// This function writes the in-memory high score to the store.
    fn persist_high_score(&mut self) {
        let high_score = self.state.high_score;

        match self.store.set(HIGH_SCORE_KEY, &high_score.to_string()) {
            Ok(()) => debug!("persisted high score {high_score}"),
            Err(err) => warn!("could not persist high score {high_score}: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::store::MemoryStore;

    /// This function returns an engine over an empty in-memory store.
    fn engine() -> GameEngine<MemoryStore> {
        GameEngine::new(MemoryStore::new(), Physics::default())
    }

    /// This function ticks `engine` until its session is over and returns how many ticks it took.
    fn fall_to_ground(engine: &mut GameEngine<MemoryStore>) -> usize {
        let mut ticks = 0;
        while engine.state().phase == Phase::Active {
            let _ = engine.tick();
            ticks += 1;
            assert!(ticks < 10_000, "the sprite never reached the ground");
        }
        ticks
    }

    #[test]
    fn new_engine_is_idle() {
        let engine = engine();
        let state = engine.state();

        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.score, 0);
        assert_eq!(state.high_score, 0);
        assert!(!state.is_airborne());
    }

    #[test]
    fn new_engine_loads_high_score() {
        let store = MemoryStore::with_entry(HIGH_SCORE_KEY, "17");
        let engine = GameEngine::new(store, Physics::default());
        assert_eq!(engine.state().high_score, 17);
    }

    #[test]
    fn new_engine_ignores_corrupt_high_score() {
        let store = MemoryStore::with_entry(HIGH_SCORE_KEY, "seventeen");
        let engine = GameEngine::new(store, Physics::default());
        assert_eq!(engine.state().high_score, 0);
    }

    #[test]
    fn start_resets_session() {
        let physics = Physics::default();
        let ended = GameState {
            high_score: 9,
            phase: Phase::Over,
            position: physics.ground_level,
            score: 4,
            velocity: 12.6,
        };

        let state = ended.step(Event::Start, &physics);

        assert_eq!(state.phase, Phase::Active);
        assert_eq!(state.score, 0);
        assert_eq!(state.high_score, 9);
        assert_relative_eq!(state.position, physics.initial_position);
        assert_relative_eq!(state.velocity, 0.0);
    }

    #[test]
    fn jump_outside_session_changes_nothing() {
        let physics = Physics::default();
        let idle = GameState::new(3, &physics);
        assert_eq!(idle.step(Event::Jump, &physics), idle);

        let over = GameState {
            high_score: 3,
            phase: Phase::Over,
            position: physics.ground_level,
            score: 2,
            velocity: 4.0,
        };
        assert_eq!(over.step(Event::Jump, &physics), over);
    }

    #[test]
    fn tick_outside_session_changes_nothing() {
        let physics = Physics::default();
        let idle = GameState::new(0, &physics);
        assert_eq!(idle.step(Event::Tick, &physics), idle);
    }

    #[test]
    fn jump_sets_impulse_and_scores() {
        let mut engine = engine();
        let _ = engine.start();
        let state = *engine.jump();

        assert_eq!(state.score, 1);
        assert_relative_eq!(state.velocity, engine.physics().jump_impulse);
    }

    #[test]
    fn jumps_accrue_without_cooldown() {
        let mut engine = engine();
        let _ = engine.start();
        for _ in 0..3 {
            let _ = engine.jump();
        }

        assert_eq!(engine.state().phase, Phase::Active);
        assert_eq!(engine.state().score, 3);
    }

    #[test]
    fn position_integrates_before_velocity() {
        let physics = Physics {
            gravity: 0.2,
            ..Physics::default()
        };
        let state = GameState {
            high_score: 0,
            phase: Phase::Active,
            position: 100.0,
            score: 0,
            velocity: 0.0,
        };

        let state = state.step(Event::Tick, &physics);
        assert_relative_eq!(state.position, 100.0);
        assert_relative_eq!(state.velocity, 0.2);

        let state = state.step(Event::Tick, &physics);
        assert_relative_eq!(state.position, 100.2);
        assert_relative_eq!(state.velocity, 0.4);
    }

    #[test]
    fn ground_contact_clamps_and_ends_session() {
        let physics = Physics::default();
        let state = GameState {
            high_score: 0,
            phase: Phase::Active,
            position: physics.ground_level - 1.0,
            score: 0,
            velocity: 5.0,
        };

        let state = state.step(Event::Tick, &physics);

        assert_eq!(state.phase, Phase::Over);
        assert_eq!(state.position.to_bits(), physics.ground_level.to_bits());
        assert_relative_eq!(state.velocity, 5.0);
    }

    #[test]
    fn jumping_above_the_top_clamps_to_zero() {
        let physics = Physics::default();
        let state = GameState {
            high_score: 0,
            phase: Phase::Active,
            position: 5.0,
            score: 1,
            velocity: physics.jump_impulse,
        };

        let state = state.step(Event::Tick, &physics);
        assert_eq!(state.phase, Phase::Active);
        assert_relative_eq!(state.position, 0.0);
    }

    #[test]
    fn unplayed_session_keeps_zero_high_score() {
        let mut engine = engine();
        let _ = engine.start();
        let _ = fall_to_ground(&mut engine);

        let state = engine.state();
        assert_eq!(state.phase, Phase::Over);
        assert_eq!(state.score, 0);
        assert_eq!(state.high_score, 0);
        assert!(!state.is_new_high_score());
        assert_eq!(engine.store().get(HIGH_SCORE_KEY), None);
    }

    #[test]
    fn beating_high_score_persists_it() {
        let mut engine = engine();
        let _ = engine.start();
        let _ = engine.jump();
        let _ = engine.jump();
        let _ = fall_to_ground(&mut engine);

        let state = engine.state();
        assert_eq!(state.high_score, 2);
        assert!(state.is_new_high_score());
        assert_eq!(engine.store().get(HIGH_SCORE_KEY).as_deref(), Some("2"));
    }

    #[test]
    fn worse_session_keeps_high_score() {
        let store = MemoryStore::with_entry(HIGH_SCORE_KEY, "5");
        let mut engine = GameEngine::new(store, Physics::default());
        let _ = engine.start();
        let _ = engine.jump();
        let _ = fall_to_ground(&mut engine);

        let state = engine.state();
        assert_eq!(state.score, 1);
        assert_eq!(state.high_score, 5);
        assert!(!state.is_new_high_score());
        assert_eq!(engine.store().get(HIGH_SCORE_KEY).as_deref(), Some("5"));
    }

    #[test]
    fn reset_high_score_writes_zero() {
        let store = MemoryStore::with_entry(HIGH_SCORE_KEY, "8");
        let mut engine = GameEngine::new(store, Physics::default());

        assert_eq!(engine.reset_high_score().high_score, 0);
        assert_eq!(engine.store().get(HIGH_SCORE_KEY).as_deref(), Some("0"));
    }
}
