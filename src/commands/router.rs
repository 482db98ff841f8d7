//! Command routing.
//!
//! Every input channel (typed, spoken, gamepad) lands here. Built-in
//! phrases are matched first in a fixed priority order; anything left over
//! goes to the AI. Replies are printed and, outside text-only mode, spoken
//! while the voice state machine shows `Speaking`.

use crate::ai::ChatResponder;
use crate::commands::info::InfoService;
use crate::commands::language::{self, Motion};
use crate::commands::movement::Movement;
use crate::commands::settings as slider;
use crate::config::Settings;
use crate::hardware::camera::Camera;
use crate::remote::TaskAgent;
use crate::state::SharedState;
use crate::terminal;
use crate::voice::speaker::SpeechOutput;
use crate::voice::{VoiceState, VoiceStateMachine};
use std::sync::Arc;
use std::time::Duration;

/// What the calling loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Stop,
}

/// Gamepad buttons, already mapped from raw input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerCommand {
    MoveForward,
    TurnLeft,
    TurnRight,
    Neutral,
    Stop,
}

pub struct CommandRouter {
    state: Arc<SharedState>,
    voice: Arc<VoiceStateMachine>,
    ai: Arc<dyn ChatResponder>,
    speaker: Arc<dyn SpeechOutput>,
    movement: Arc<dyn Movement>,
    camera: Arc<dyn Camera>,
    remote: Arc<dyn TaskAgent>,
    info: Arc<InfoService>,
    remote_triggers: Vec<String>,
    summary_threshold: usize,
    stop_linger: Duration,
}

impl CommandRouter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: Arc<SharedState>,
        voice: Arc<VoiceStateMachine>,
        ai: Arc<dyn ChatResponder>,
        speaker: Arc<dyn SpeechOutput>,
        movement: Arc<dyn Movement>,
        camera: Arc<dyn Camera>,
        remote: Arc<dyn TaskAgent>,
        info: Arc<InfoService>,
        settings: &Settings,
    ) -> Self {
        Self {
            state,
            voice,
            ai,
            speaker,
            movement,
            camera,
            remote,
            info,
            remote_triggers: settings.remote_triggers.clone(),
            summary_threshold: settings.summary_threshold,
            stop_linger: settings.timings.stop_linger,
        }
    }

    /// Route one command. Matching is case-insensitive substring matching
    /// in a fixed priority order; the AI is the fallback, never a peer.
    pub async fn process_command(&self, input: &str) -> Outcome {
        let input = input.trim().to_lowercase();
        if input.is_empty() {
            return Outcome::Continue;
        }

        // Language switch goes first: "speak spanish" must not fall through
        // to the AI as a chat request.
        if input.starts_with("speak ") {
            if let Some(profile) = language::supported(&input) {
                self.state.set_current_language(profile.name);
                let confirmation = self
                    .ask_ai(&format!(
                        "Confirm in one short sentence that you are now speaking {}.",
                        profile.name
                    ))
                    .await;
                self.respond(&confirmation).await;
                return Outcome::Continue;
            }
            self.respond("I don't speak that one. Try english, spanish, french or german.")
                .await;
            return Outcome::Continue;
        }

        if let Some(motion) = match_motion(&input) {
            self.perform_motion(motion).await;
            return Outcome::Continue;
        }

        if is_stop_command(&input) {
            return self.shut_down().await;
        }

        if input.contains("time") || input.contains("date") {
            let answer = if input.contains("date") {
                self.info.current_date()
            } else {
                self.info.current_time()
            };
            self.respond(&answer).await;
            return Outcome::Continue;
        }

        if input.contains("weather") {
            let report = self.info.weather().await;
            self.respond(&report).await;
            return Outcome::Continue;
        }

        if input.contains("humor") && (input.contains("set") || input.contains("%")) {
            return self.adjust_slider(&input, Slider::Humor).await;
        }
        if input.contains("honesty") && (input.contains("set") || input.contains("%")) {
            return self.adjust_slider(&input, Slider::Honesty).await;
        }

        if input.contains("what do you see")
            || input.contains("describe what you see")
            || input.contains("look around")
        {
            self.describe_scene().await;
            return Outcome::Continue;
        }
        if input.contains("how many people") || input.contains("count people") {
            self.count_people().await;
            return Outcome::Continue;
        }
        if input.contains("greet everyone") || input.contains("say hello to everyone") {
            self.greet_everyone().await;
            return Outcome::Continue;
        }

        if let Some(task) = self.match_remote_task(&input) {
            self.delegate_task(&task).await;
            return Outcome::Continue;
        }

        let honesty = self.state.honesty();
        let humor = self.state.humor();
        let lang = self.state.current_language();
        let reply = self.ai.get_response(&input, honesty, humor, &lang).await;
        self.respond(&reply).await;
        Outcome::Continue
    }

    /// Gamepad path: motions skip narration priority rules and run directly.
    pub async fn process_controller_command(&self, command: ControllerCommand) -> Outcome {
        match command {
            ControllerCommand::MoveForward => {
                self.perform_motion(Motion::StepForward).await;
                Outcome::Continue
            }
            ControllerCommand::TurnLeft => {
                self.perform_motion(Motion::TurnLeft).await;
                Outcome::Continue
            }
            ControllerCommand::TurnRight => {
                self.perform_motion(Motion::TurnRight).await;
                Outcome::Continue
            }
            ControllerCommand::Neutral => {
                if let Err(e) = self.movement.neutral().await {
                    terminal::print_error(&format!("Servo fault: {}", e));
                }
                Outcome::Continue
            }
            ControllerCommand::Stop => self.shut_down().await,
        }
    }

    /// Print the reply and speak it. While speaking, the state machine
    /// shows `Speaking` so the interrupt path has something to interrupt.
    async fn respond(&self, text: &str) {
        terminal::print_tars(text);
        if self.state.text_only() {
            return;
        }
        let lang = self.state.current_language();
        self.voice.transition(VoiceState::Speaking);
        if let Err(e) = self.speaker.speak(text, &lang).await {
            log::warn!("Speech failed: {}", e);
        }
        self.voice.transition(VoiceState::Listening);
    }

    async fn ask_ai(&self, prompt: &str) -> String {
        let honesty = self.state.honesty();
        let humor = self.state.humor();
        let lang = self.state.current_language();
        self.ai.get_response(prompt, honesty, humor, &lang).await
    }

    /// Move first, then let the AI narrate what just happened, seeded with
    /// the canned phrase in the active language.
    async fn perform_motion(&self, motion: Motion) {
        let result = match motion {
            Motion::StepForward => self.movement.step_forward().await,
            Motion::TurnLeft => self.movement.turn_left().await,
            Motion::TurnRight => self.movement.turn_right().await,
        };
        if let Err(e) = result {
            terminal::print_error(&format!("Servo fault: {}", e));
            self.respond("My servos are acting up. That didn't go anywhere.")
                .await;
            return;
        }
        let lang = self.state.current_language();
        let narration = self
            .ask_ai(&format!(
                "You just did this: '{}'. Announce it in one short sentence.",
                language::movement_message(&lang, motion)
            ))
            .await;
        self.respond(&narration).await;
    }

    /// One farewell, then a short linger so playback can drain before the
    /// caller tears everything down.
    async fn shut_down(&self) -> Outcome {
        let farewell = self.ask_ai("Say a short goodbye, you are powering down.").await;
        self.respond(&farewell).await;
        tokio::time::sleep(self.stop_linger).await;
        Outcome::Stop
    }

    async fn adjust_slider(&self, input: &str, slider: Slider) -> Outcome {
        match slider::parse_percentage(input) {
            Some(value) => {
                let percent = (value * 100.0).round() as i32;
                match slider {
                    Slider::Humor => {
                        self.state.set_humor(value);
                        self.respond(&format!("Humor set to {}%.", percent)).await;
                    }
                    Slider::Honesty => {
                        self.state.set_honesty(value);
                        self.respond(&format!("Honesty set to {}%.", percent)).await;
                    }
                }
            }
            None => {
                let name = match slider {
                    Slider::Humor => "humor",
                    Slider::Honesty => "honesty",
                };
                self.respond(&format!("I need a number. Try 'set {} to 80%'.", name))
                    .await;
            }
        }
        Outcome::Continue
    }

    async fn describe_scene(&self) {
        if !self.camera.is_available() {
            self.respond("My eyes are offline. No camera detected.").await;
            return;
        }
        match self.camera.describe_scene().await {
            Some(description) => self.respond(&description).await,
            None => self.respond("I'm drawing a blank. The camera gave me nothing.").await,
        }
    }

    async fn count_people(&self) {
        if !self.camera.is_available() {
            self.respond("My eyes are offline. No camera detected.").await;
            return;
        }
        if !self.camera.is_detector_available() {
            self.respond("My people detector is offline.").await;
            return;
        }
        match self.camera.count_people().await {
            Some(0) => self.respond("I don't see anyone. Just you and me, presumably.").await,
            Some(1) => self.respond("I can see 1 person.").await,
            Some(n) => self.respond(&format!("I can see {} people.", n)).await,
            None => self.respond("My people detector is offline.").await,
        }
    }

    async fn greet_everyone(&self) {
        if !self.camera.is_available() {
            self.respond("My eyes are offline. No camera detected.").await;
            return;
        }
        let count = match self.camera.count_people().await {
            Some(n) if n > 0 => n,
            _ => {
                self.respond("There's nobody here to greet.").await;
                return;
            }
        };
        let greeting = self
            .ask_ai(&format!("Greet the {} people in front of you.", count))
            .await;
        self.respond(&greeting).await;
    }

    fn match_remote_task(&self, input: &str) -> Option<String> {
        self.remote_triggers
            .iter()
            .any(|trigger| input.contains(trigger.as_str()))
            .then(|| input.to_string())
    }

    async fn delegate_task(&self, task: &str) {
        if !self.remote.is_available() {
            self.respond("My remote agent is offline. Start the relay on your computer.")
                .await;
            return;
        }
        self.respond("On it. Give me a moment.").await;
        match self.remote.send_task(task).await {
            Ok(answer) if answer.len() > self.summary_threshold => {
                let summary = self
                    .ask_ai(&format!(
                        "Summarize this result in two short sentences: {}",
                        answer
                    ))
                    .await;
                self.respond(&summary).await;
            }
            Ok(answer) => self.respond(&answer).await,
            Err(e) => {
                log::warn!("Remote task failed: {}", e);
                self.respond("I couldn't finish that task. The relay let me down.")
                    .await;
            }
        }
    }
}

enum Slider {
    Humor,
    Honesty,
}

fn match_motion(input: &str) -> Option<Motion> {
    if input.contains("move forward")
        || input.contains("step forward")
        || input.contains("take a step")
        || input.contains("walk forward")
    {
        Some(Motion::StepForward)
    } else if input.contains("turn left") {
        Some(Motion::TurnLeft)
    } else if input.contains("turn right") {
        Some(Motion::TurnRight)
    } else {
        None
    }
}

fn is_stop_command(input: &str) -> bool {
    input == "exit" || input == "quit" || input.contains("stop")
}
