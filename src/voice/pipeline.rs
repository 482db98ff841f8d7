//! The voice loop: wake, listen, route, repeat.

use crate::commands::{CommandRouter, Outcome};
use crate::config::Timings;
use crate::state::Shutdown;
use crate::terminal;
use crate::voice::capture::MicCapture;
use crate::voice::listener::Listener;
use crate::voice::speaker::SpeechOutput;
use crate::voice::wake::WakeWordDetector;
use crate::voice::{VoiceState, VoiceStateMachine};
use std::sync::Arc;

pub struct VoicePipeline {
    router: Arc<CommandRouter>,
    voice: Arc<VoiceStateMachine>,
    listener: Listener,
    wake: WakeWordDetector,
    speaker: Arc<dyn SpeechOutput>,
    shutdown: Shutdown,
    timings: Timings,
    use_wake_word: bool,
}

impl VoicePipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        router: Arc<CommandRouter>,
        voice: Arc<VoiceStateMachine>,
        listener: Listener,
        wake: WakeWordDetector,
        speaker: Arc<dyn SpeechOutput>,
        shutdown: Shutdown,
        timings: Timings,
        use_wake_word: bool,
    ) -> Self {
        Self {
            router,
            voice,
            listener,
            wake,
            speaker,
            shutdown,
            timings,
            use_wake_word,
        }
    }

    /// Run until shutdown. Owns the microphone for the whole session; the
    /// text loop keeps running in parallel and shares the router.
    pub async fn run(mut self, mut mic: MicCapture) {
        if !self.listener.available() {
            log::warn!("Speech recognition not configured, voice pipeline disabled");
            return;
        }
        log::info!(
            "Voice pipeline running ({} mode)",
            if self.use_wake_word { "wake-word" } else { "always-listening" }
        );

        while !self.shutdown.is_requested() {
            if self.use_wake_word {
                self.voice.transition(VoiceState::Sleeping);
                if !self
                    .wake
                    .listen_for_wake_word(&mut mic, &self.shutdown)
                    .await
                {
                    break;
                }
            }

            self.voice.transition(VoiceState::Listening);
            if !self.wait_for_quiet().await {
                break;
            }

            match self.listener.listen(&mut mic, &self.shutdown).await {
                Ok(Some(command)) => {
                    terminal::print_user(&command);
                    self.voice.transition(VoiceState::Thinking);
                    if self.router.process_command(&command).await == Outcome::Stop {
                        self.shutdown.request();
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("Speech recognition failed: {}", e),
            }

            tokio::time::sleep(self.timings.poll_interval).await;
        }
        log::info!("Voice pipeline stopped");
    }

    /// Hold off listening while our own playback is audible, then a short
    /// guard so the tail end does not get transcribed. Returns `false` on
    /// shutdown.
    async fn wait_for_quiet(&mut self) -> bool {
        while self.speaker.is_speaking() {
            if self.shutdown.is_requested() {
                return false;
            }
            tokio::time::sleep(self.timings.poll_interval).await;
        }
        tokio::time::sleep(self.timings.post_speech_guard).await;
        !self.shutdown.is_requested()
    }
}
