//! Shared session state and the global shutdown signal.
//!
//! Three execution contexts (text loop, voice pipeline, controller loop)
//! read and write this state concurrently. Each field has independent
//! read-modify-write semantics; no invariant couples one field to another,
//! so the accessors are individually atomic and nothing more.

use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

struct SessionFields {
    current_language: String,
    humor: f32,
    honesty: f32,
}

/// Thread-safe session state shared by all execution contexts.
pub struct SharedState {
    inner: Mutex<SessionFields>,
    text_only: bool,
}

impl SharedState {
    pub fn new(language: impl Into<String>, humor: f32, honesty: f32, text_only: bool) -> Self {
        Self {
            inner: Mutex::new(SessionFields {
                current_language: language.into(),
                humor,
                honesty,
            }),
            text_only,
        }
    }

    pub fn current_language(&self) -> String {
        self.inner.lock().unwrap().current_language.clone()
    }

    pub fn set_current_language(&self, language: impl Into<String>) {
        self.inner.lock().unwrap().current_language = language.into();
    }

    pub fn humor(&self) -> f32 {
        self.inner.lock().unwrap().humor
    }

    pub fn set_humor(&self, value: f32) {
        self.inner.lock().unwrap().humor = value;
    }

    pub fn honesty(&self) -> f32 {
        self.inner.lock().unwrap().honesty
    }

    pub fn set_honesty(&self, value: f32) {
        self.inner.lock().unwrap().honesty = value;
    }

    /// Whether audio capture/playback is disabled for this session.
    /// Fixed at startup; never mutated.
    pub fn text_only(&self) -> bool {
        self.text_only
    }
}

/// Cooperative shutdown signal. Any context may request shutdown; every
/// loop checks it at each suspension or poll point and exits cleanly.
#[derive(Clone)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub fn request(&self) {
        self.token.cancel();
    }

    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when shutdown has been requested.
    pub async fn requested(&self) {
        self.token.cancelled().await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn accessors_round_trip() {
        let state = SharedState::new("english", 0.5, 0.5, false);
        state.set_current_language("spanish");
        state.set_humor(0.8);
        state.set_honesty(0.9);
        assert_eq!(state.current_language(), "spanish");
        assert_eq!(state.humor(), 0.8);
        assert_eq!(state.honesty(), 0.9);
        assert!(!state.text_only());
    }

    #[test]
    fn concurrent_humor_writes_never_tear() {
        let state = Arc::new(SharedState::new("english", 0.5, 0.5, false));

        let a = Arc::clone(&state);
        let writer_a = std::thread::spawn(move || {
            for _ in 0..1000 {
                a.set_humor(0.25);
            }
        });
        let b = Arc::clone(&state);
        let writer_b = std::thread::spawn(move || {
            for _ in 0..1000 {
                b.set_humor(0.75);
            }
        });

        writer_a.join().unwrap();
        writer_b.join().unwrap();

        let humor = state.humor();
        assert!(
            humor == 0.25 || humor == 0.75,
            "torn value observed: {}",
            humor
        );
    }

    #[test]
    fn shutdown_is_observable_from_clones() {
        let shutdown = Shutdown::new();
        let other = shutdown.clone();
        assert!(!other.is_requested());
        shutdown.request();
        assert!(other.is_requested());
    }
}
