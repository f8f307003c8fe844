//! # Session Lifecycle
//!
//! ```text
//! Stopped ──start()──→ Starting ──→ Running ──stop()──→ Stopping ──→ Stopped
//!    │                                                                  │
//!    └────────────────────────── destroy() ──→ Destroyed ←──────────────┘
//! ```
//!
//! A session starts at most once: after it has run, `Stopped` is final except
//! for `destroy()`. `Destroyed` is terminal.

use parking_lot::Mutex;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Stopped,
    Starting,
    Running,
    Stopping,
    Destroyed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// An operation was attempted in the wrong lifecycle state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("session is {state}, not running")]
    NotRunning { state: LifecycleState },

    #[error("session has already been started once")]
    AlreadyStarted,

    #[error("session is destroyed")]
    Destroyed,

    #[error("no async runtime available to run the dispatch task")]
    NoRuntime,
}

#[derive(Debug)]
struct Inner {
    state: LifecycleState,
    started: bool,
}

/// Thread-safe lifecycle state machine.
#[derive(Debug)]
pub struct Lifecycle {
    inner: Mutex<Inner>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: LifecycleState::Stopped,
                started: false,
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.inner.lock().state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    pub fn ensure_running(&self) -> Result<(), LifecycleError> {
        match self.state() {
            LifecycleState::Running => Ok(()),
            LifecycleState::Destroyed => Err(LifecycleError::Destroyed),
            state => Err(LifecycleError::NotRunning { state }),
        }
    }

    /// Run `f` while holding the state lock, only if `Running`.
    ///
    /// `begin_stop` and `destroy` take the same lock, so work done here is
    /// ordered strictly before or after a concurrent shutdown.
    pub fn while_running<T>(&self, f: impl FnOnce() -> T) -> Result<T, LifecycleError> {
        let inner = self.inner.lock();
        match inner.state {
            LifecycleState::Running => Ok(f()),
            LifecycleState::Destroyed => Err(LifecycleError::Destroyed),
            state => Err(LifecycleError::NotRunning { state }),
        }
    }

    /// `Stopped → Starting`, only for a session that has never run.
    pub fn begin_start(&self) -> Result<(), LifecycleError> {
        let mut inner = self.inner.lock();
        match inner.state {
            LifecycleState::Destroyed => Err(LifecycleError::Destroyed),
            LifecycleState::Stopped if !inner.started => {
                inner.state = LifecycleState::Starting;
                inner.started = true;
                Ok(())
            }
            _ => Err(LifecycleError::AlreadyStarted),
        }
    }

    /// `Starting → Running`.
    pub fn finish_start(&self) -> Result<(), LifecycleError> {
        self.transition(LifecycleState::Starting, LifecycleState::Running)
    }

    /// `Running → Stopping`.
    pub fn begin_stop(&self) -> Result<(), LifecycleError> {
        self.transition(LifecycleState::Running, LifecycleState::Stopping)
    }

    /// `Stopping → Stopped`.
    pub fn finish_stop(&self) -> Result<(), LifecycleError> {
        self.transition(LifecycleState::Stopping, LifecycleState::Stopped)
    }

    /// Enter `Destroyed`, returning the state it left.
    pub fn destroy(&self) -> Result<LifecycleState, LifecycleError> {
        let mut inner = self.inner.lock();
        if inner.state == LifecycleState::Destroyed {
            return Err(LifecycleError::Destroyed);
        }
        let previous = inner.state;
        inner.state = LifecycleState::Destroyed;
        Ok(previous)
    }

    fn transition(&self, from: LifecycleState, to: LifecycleState) -> Result<(), LifecycleError> {
        let mut inner = self.inner.lock();
        match inner.state {
            state if state == from => {
                inner.state = to;
                Ok(())
            }
            LifecycleState::Destroyed => Err(LifecycleError::Destroyed),
            state => Err(LifecycleError::NotRunning { state }),
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
