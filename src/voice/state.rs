//! Voice interaction lifecycle.

use std::sync::Mutex;
use strum::Display;

/// Phases of the voice interaction loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum VoiceState {
    /// Waiting for the wake word. Initial state in wake-word mode.
    Sleeping,
    /// Actively capturing user speech. Initial state otherwise.
    Listening,
    /// A command is being processed.
    Thinking,
    /// Audio playback in progress. The only interruptible state.
    Speaking,
}

type StateListener = Box<dyn Fn(VoiceState, VoiceState) + Send + Sync>;

struct StateFields {
    state: VoiceState,
    interrupted: bool,
}

/// Tracks the current phase and the interrupt flag under one lock.
///
/// Callbacks fire after the lock is released, in registration order, so a
/// listener may itself call back into the machine without deadlocking.
pub struct VoiceStateMachine {
    inner: Mutex<StateFields>,
    listeners: Mutex<Vec<StateListener>>,
}

impl VoiceStateMachine {
    pub fn new(use_wake_word: bool) -> Self {
        let initial = if use_wake_word {
            VoiceState::Sleeping
        } else {
            VoiceState::Listening
        };
        Self {
            inner: Mutex::new(StateFields {
                state: initial,
                interrupted: false,
            }),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn state(&self) -> VoiceState {
        self.inner.lock().unwrap().state
    }

    pub fn interrupted(&self) -> bool {
        self.inner.lock().unwrap().interrupted
    }

    /// Current state and interrupt flag read under a single lock, so the
    /// pair is mutually consistent.
    pub fn snapshot(&self) -> (VoiceState, bool) {
        let fields = self.inner.lock().unwrap();
        (fields.state, fields.interrupted)
    }

    pub fn is_sleeping(&self) -> bool {
        self.state() == VoiceState::Sleeping
    }

    pub fn is_speaking(&self) -> bool {
        self.state() == VoiceState::Speaking
    }

    /// Move to `new_state`. Leaving `Speaking` clears the interrupt flag.
    /// Listeners observe the transition after the state is already current;
    /// a self-transition still notifies.
    pub fn transition(&self, new_state: VoiceState) {
        let old_state = {
            let mut fields = self.inner.lock().unwrap();
            let old = fields.state;
            if old == VoiceState::Speaking && new_state != VoiceState::Speaking {
                fields.interrupted = false;
            }
            fields.state = new_state;
            old
        };

        let listeners = self.listeners.lock().unwrap();
        for listener in listeners.iter() {
            listener(old_state, new_state);
        }
    }

    /// Request an interrupt. Effective only while speaking; returns whether
    /// the flag was set.
    pub fn interrupt(&self) -> bool {
        let mut fields = self.inner.lock().unwrap();
        if fields.state == VoiceState::Speaking {
            fields.interrupted = true;
            true
        } else {
            false
        }
    }

    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(VoiceState, VoiceState) + Send + Sync + 'static,
    {
        self.listeners.lock().unwrap().push(Box::new(listener));
    }
}
