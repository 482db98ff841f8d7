//! Command routing behavior with mocked collaborators.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tars::ai::ChatResponder;
use tars::commands::info::InfoService;
use tars::commands::movement::Movement;
use tars::commands::{CommandRouter, Outcome};
use tars::config::Settings;
use tars::hardware::servos::ServoError;
use tars::hardware::Camera;
use tars::remote::{RemoteError, TaskAgent};
use tars::state::SharedState;
use tars::voice::speaker::{SpeechOutput, TtsError};
use tars::voice::VoiceStateMachine;

#[derive(Default)]
struct MockResponder {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ChatResponder for MockResponder {
    async fn get_response(
        &self,
        user_input: &str,
        _honesty: f32,
        _humor: f32,
        _target_language: &str,
    ) -> String {
        self.prompts.lock().unwrap().push(user_input.to_string());
        format!("ai says: {}", user_input)
    }
}

#[derive(Default)]
struct RecordingSpeech {
    spoken: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechOutput for RecordingSpeech {
    async fn speak(&self, text: &str, _language: &str) -> Result<(), TtsError> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn stop(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}

struct MockCamera {
    people: Option<usize>,
}

#[async_trait]
impl Camera for MockCamera {
    fn is_available(&self) -> bool {
        self.people.is_some()
    }

    fn is_detector_available(&self) -> bool {
        self.people.is_some()
    }

    async fn describe_scene(&self) -> Option<String> {
        self.people.map(|_| "A cluttered workshop.".to_string())
    }

    async fn count_people(&self) -> Option<usize> {
        self.people
    }
}

struct MockAgent {
    available: bool,
    answer: &'static str,
}

#[async_trait]
impl TaskAgent for MockAgent {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn send_task(&self, _task: &str) -> Result<String, RemoteError> {
        if self.available {
            Ok(self.answer.to_string())
        } else {
            Err(RemoteError::NotConfigured)
        }
    }
}

#[derive(Default)]
struct MockMovement {
    steps: AtomicUsize,
    left_turns: AtomicUsize,
    right_turns: AtomicUsize,
    neutrals: AtomicUsize,
}

#[async_trait]
impl Movement for MockMovement {
    async fn step_forward(&self) -> Result<(), ServoError> {
        self.steps.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn turn_left(&self) -> Result<(), ServoError> {
        self.left_turns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn turn_right(&self) -> Result<(), ServoError> {
        self.right_turns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn neutral(&self) -> Result<(), ServoError> {
        self.neutrals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Harness {
    router: CommandRouter,
    state: Arc<SharedState>,
    ai: Arc<MockResponder>,
    speech: Arc<RecordingSpeech>,
    movement: Arc<MockMovement>,
}

fn harness_with(camera_people: Option<usize>, agent: MockAgent) -> Harness {
    let settings = Settings::offline();
    let state = Arc::new(SharedState::new("english", 0.5, 0.5, false));
    let voice = Arc::new(VoiceStateMachine::new(false));
    let ai = Arc::new(MockResponder::default());
    let speech = Arc::new(RecordingSpeech::default());
    let movement = Arc::new(MockMovement::default());

    let router = CommandRouter::new(
        Arc::clone(&state),
        voice,
        Arc::clone(&ai) as Arc<dyn ChatResponder>,
        Arc::clone(&speech) as Arc<dyn SpeechOutput>,
        Arc::clone(&movement) as Arc<dyn Movement>,
        Arc::new(MockCamera {
            people: camera_people,
        }),
        Arc::new(agent),
        Arc::new(InfoService::new(&settings)),
        &settings,
    );

    Harness {
        router,
        state,
        ai,
        speech,
        movement,
    }
}

fn harness() -> Harness {
    harness_with(
        None,
        MockAgent {
            available: false,
            answer: "",
        },
    )
}

#[tokio::test]
async fn humor_slider_accepts_percentages() {
    let h = harness();
    assert_eq!(h.router.process_command("set humor to 80%").await, Outcome::Continue);
    assert_eq!(h.state.humor(), 0.8);
    assert_eq!(
        h.speech.spoken.lock().unwrap().last().unwrap(),
        "Humor set to 80%."
    );
}

#[tokio::test]
async fn slider_values_over_100_clamp() {
    let h = harness();
    h.router.process_command("set honesty to 150%").await;
    assert_eq!(h.state.honesty(), 1.0);
}

#[tokio::test]
async fn slider_without_number_asks_for_one() {
    let h = harness();
    h.router.process_command("set humor to banana").await;
    assert_eq!(h.state.humor(), 0.5);
    assert_eq!(
        h.speech.spoken.lock().unwrap().last().unwrap(),
        "I need a number. Try 'set humor to 80%'."
    );
    assert!(h.ai.prompts.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_says_exactly_one_farewell() {
    let h = harness();
    assert_eq!(h.router.process_command("stop").await, Outcome::Stop);
    assert_eq!(h.ai.prompts.lock().unwrap().len(), 1);
    assert_eq!(h.speech.spoken.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_input_touches_nothing() {
    let h = harness();
    assert_eq!(h.router.process_command("   ").await, Outcome::Continue);
    assert!(h.ai.prompts.lock().unwrap().is_empty());
    assert!(h.speech.spoken.lock().unwrap().is_empty());
    assert_eq!(h.movement.steps.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn time_answer_is_spoken_with_a_clock() {
    let h = harness();
    h.router.process_command("what time is it").await;
    let spoken = h.speech.spoken.lock().unwrap();
    let answer = spoken.last().unwrap();
    assert!(answer.starts_with("It's about time you asked!"));
    assert!(answer.contains("AM") || answer.contains("PM"));
    assert!(h.ai.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn language_switch_updates_state_and_confirms() {
    let h = harness();
    h.router.process_command("speak spanish").await;
    assert_eq!(h.state.current_language(), "spanish");
    let prompts = h.ai.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("spanish"));
}

#[tokio::test]
async fn unknown_language_is_refused_without_state_change() {
    let h = harness();
    h.router.process_command("speak klingon").await;
    assert_eq!(h.state.current_language(), "english");
    assert!(h.ai.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn movement_moves_then_narrates() {
    let h = harness();
    h.router.process_command("turn left").await;
    assert_eq!(h.movement.left_turns.load(Ordering::SeqCst), 1);
    // Narration is AI-generated, seeded with the localized phrase.
    let prompts = h.ai.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Turning left."));
    assert_eq!(h.speech.spoken.lock().unwrap().len(), 1);
    drop(prompts);

    h.router.process_command("please move forward").await;
    assert_eq!(h.movement.steps.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn narration_follows_the_session_language() {
    let h = harness();
    h.state.set_current_language("spanish");
    h.router.process_command("move forward").await;
    let prompts = h.ai.prompts.lock().unwrap();
    assert!(prompts[0].contains("Dando un paso adelante."));
}

#[tokio::test]
async fn vision_without_camera_reports_offline_eyes() {
    let h = harness();
    h.router.process_command("what do you see").await;
    assert_eq!(
        h.speech.spoken.lock().unwrap().last().unwrap(),
        "My eyes are offline. No camera detected."
    );
}

#[tokio::test]
async fn people_are_counted_when_detector_is_up() {
    let h = harness_with(
        Some(3),
        MockAgent {
            available: false,
            answer: "",
        },
    );
    h.router.process_command("how many people do you see").await;
    assert_eq!(
        h.speech.spoken.lock().unwrap().last().unwrap(),
        "I can see 3 people."
    );
}

#[tokio::test]
async fn remote_task_answer_is_relayed() {
    let h = harness_with(
        None,
        MockAgent {
            available: true,
            answer: "Found three results.",
        },
    );
    h.router.process_command("search for rust tutorials").await;
    let spoken = h.speech.spoken.lock().unwrap();
    assert_eq!(spoken.last().unwrap(), "Found three results.");
    // Short answers are relayed verbatim, no summarization round-trip.
    assert!(h.ai.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn remote_task_without_relay_reports_offline() {
    let h = harness();
    h.router.process_command("search for rust tutorials").await;
    assert_eq!(
        h.speech.spoken.lock().unwrap().last().unwrap(),
        "My remote agent is offline. Start the relay on your computer."
    );
}

#[tokio::test]
async fn unmatched_input_goes_to_the_ai() {
    let h = harness();
    h.router.process_command("tell me a joke").await;
    assert_eq!(
        h.speech.spoken.lock().unwrap().last().unwrap(),
        "ai says: tell me a joke"
    );
}
