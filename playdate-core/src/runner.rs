//! Runner: drives a [`Game`] from system events and update callbacks.

use crate::config::{RunnerConfig, DEFAULT_RUNNER_CONFIG};
use crate::event::SystemEvent;
use crate::platform::Playdate;
use crate::system::System;

/// A game driven by [`Runner`].
///
/// Methods are generic over the platform so the same game runs on the
/// device and against a host test double.
pub trait Game: Sized {
    /// Applied before [`init`](Self::init).
    const CONFIG: RunnerConfig = DEFAULT_RUNNER_CONFIG;

    type Error: core::fmt::Debug;

    /// Build the game on [`SystemEvent::Init`].
    fn init<P: Playdate>(pd: &P) -> Result<Self, Self::Error>;

    /// Called once per frame. Return `true` if the screen changed.
    fn update<P: Playdate>(&mut self, pd: &P) -> bool;

    /// Every event after `Init`, including `Terminate`.
    fn event<P: Playdate>(&mut self, _pd: &P, _event: SystemEvent) {}
}

/// Error type for runner operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunnerError<E> {
    /// [`Game::init`] failed. The runner stays stopped.
    Init(E),
    /// `Init` arrived twice.
    AlreadyStarted,
    /// No game: not yet started, init failed or terminated.
    NotRunning,
}

enum State<G> {
    Idle,
    Running(G),
    Failed,
    Terminated,
}

/// Forwards system events and update callbacks to a game.
///
/// After a failed init or a `Terminate` event the game is never called
/// again.
pub struct Runner<G> {
    state: State<G>,
    frames: u32,
}

impl<G: Game> Runner<G> {
    /// Create an idle runner. `const` so it can live in a static.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: State::Idle,
            frames: 0,
        }
    }

    /// Handle a system event.
    ///
    /// `Init` applies [`Game::CONFIG`] and builds the game. Everything else
    /// is forwarded to [`Game::event`]; `Terminate` then drops the game.
    pub fn handle_event<P: Playdate>(
        &mut self,
        pd: &P,
        event: SystemEvent,
    ) -> Result<(), RunnerError<G::Error>> {
        if event == SystemEvent::Init {
            return self.start(pd);
        }

        let State::Running(game) = &mut self.state else {
            return Err(RunnerError::NotRunning);
        };
        game.event(pd, event);
        if event == SystemEvent::Terminate {
            self.state = State::Terminated;
        }
        Ok(())
    }

    fn start<P: Playdate>(&mut self, pd: &P) -> Result<(), RunnerError<G::Error>> {
        if !matches!(self.state, State::Idle) {
            return Err(RunnerError::AlreadyStarted);
        }
        G::CONFIG.apply(pd);
        match G::init(pd) {
            Ok(game) => {
                self.state = State::Running(game);
                Ok(())
            }
            Err(e) => {
                self.state = State::Failed;
                Err(RunnerError::Init(e))
            }
        }
    }

    /// Run one frame. Returns whether the screen changed.
    pub fn update<P: Playdate>(&mut self, pd: &P) -> Result<bool, RunnerError<G::Error>> {
        let State::Running(game) = &mut self.state else {
            return Err(RunnerError::NotRunning);
        };
        let changed = game.update(pd);
        self.frames = self.frames.wrapping_add(1);
        if let Some((x, y)) = G::CONFIG.fps_overlay {
            pd.system().draw_fps(x, y);
        }
        Ok(changed)
    }

    /// Frames run so far.
    #[must_use]
    pub fn frames(&self) -> u32 {
        self.frames
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running(_))
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.state, State::Failed)
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        matches!(self.state, State::Terminated)
    }

    pub fn game(&self) -> Option<&G> {
        match &self.state {
            State::Running(game) => Some(game),
            _ => None,
        }
    }

    pub fn game_mut(&mut self) -> Option<&mut G> {
        match &mut self.state {
            State::Running(game) => Some(game),
            _ => None,
        }
    }
}

impl<G: Game> Default for Runner<G> {
    fn default() -> Self {
        Self::new()
    }
}
