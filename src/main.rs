use clap::Parser;
use std::sync::Arc;
use tars::ai::{AiResponder, ChatResponder};
use tars::commands::info::InfoService;
use tars::commands::movement::{Movement, MovementController};
use tars::commands::{CommandRouter, Outcome};
use tars::config::load_settings;
use tars::hardware::controller::Gamepad;
use tars::hardware::{Camera, OfflineCamera, ServoController, SimServoBus};
use tars::remote::{RelayClient, TaskAgent};
use tars::state::{SharedState, Shutdown};
use tars::terminal;
use tars::voice::capture::MicCapture;
use tars::voice::listener::Listener;
use tars::voice::pipeline::VoicePipeline;
use tars::voice::speaker::{NullSpeech, Speaker, SpeechOutput};
use tars::voice::wake::WakeWordDetector;
use tars::voice::VoiceStateMachine;

#[derive(Parser, Debug)]
#[command(name = "tars", about = "Voice assistant robot controller")]
struct Cli {
    /// Disable audio entirely; interact through the terminal only.
    #[arg(long)]
    text_only: bool,

    /// Sleep until the wake word (or Enter) instead of always listening.
    #[arg(long)]
    wake_word: bool,

    /// Session language, overriding the configured default.
    #[arg(long)]
    language: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let settings = load_settings()?;

    log::info!("🚀 Initializing tars-rs");
    terminal::print_banner();

    let language = cli
        .language
        .map(|l| l.to_lowercase())
        .unwrap_or_else(|| settings.default_language.clone());
    let state = Arc::new(SharedState::new(
        language,
        settings.default_humor,
        settings.default_honesty,
        cli.text_only,
    ));
    let shutdown = Shutdown::new();

    let use_wake_word = cli.wake_word && !cli.text_only;
    let voice = Arc::new(VoiceStateMachine::new(use_wake_word));
    voice.add_listener(|old, new| log::debug!("Voice state: {} -> {}", old, new));

    let speaker: Arc<dyn SpeechOutput> = if cli.text_only {
        Arc::new(NullSpeech)
    } else {
        Arc::new(Speaker::new(&settings))
    };

    let ai: Arc<dyn ChatResponder> = Arc::new(AiResponder::initialize(&settings).await);
    let remote: Arc<dyn TaskAgent> = Arc::new(
        RelayClient::connect(
            settings.relay_url.as_deref(),
            settings.timings.health_timeout,
            settings.timings.remote_timeout,
        )
        .await,
    );

    let servos = ServoController::new(Box::new(SimServoBus));
    let movement: Arc<dyn Movement> = Arc::new(MovementController::new(servos));
    let camera: Arc<dyn Camera> = Arc::new(OfflineCamera);
    let info = Arc::new(InfoService::new(&settings));

    let router = Arc::new(CommandRouter::new(
        Arc::clone(&state),
        Arc::clone(&voice),
        Arc::clone(&ai),
        Arc::clone(&speaker),
        Arc::clone(&movement),
        camera,
        remote,
        info,
        &settings,
    ));

    if let Err(e) = movement.neutral().await {
        log::warn!("Could not reach neutral pose: {}", e);
    }

    if !cli.text_only {
        match MicCapture::open(settings.timings.chunk_poll) {
            Ok(mic) => {
                let pipeline = VoicePipeline::new(
                    Arc::clone(&router),
                    Arc::clone(&voice),
                    Listener::new(&settings),
                    WakeWordDetector::new(
                        settings.wake_model_path.as_deref(),
                        settings.wake_threshold,
                        settings.timings.wake_poll,
                    ),
                    Arc::clone(&speaker),
                    shutdown.clone(),
                    settings.timings.clone(),
                    use_wake_word,
                );
                tokio::spawn(pipeline.run(mic));
                log::info!("🎤 Voice pipeline started");
            }
            Err(e) => log::warn!("Microphone unavailable ({}), voice input disabled", e),
        }
    }

    if let Some(mut gamepad) = (!cli.text_only).then(Gamepad::find).flatten() {
        let router = Arc::clone(&router);
        let shutdown_handle = shutdown.clone();
        tokio::spawn(async move {
            log::info!("🎮 Controller loop running ({})", gamepad.name());
            while let Some(command) = gamepad.next_command(&shutdown_handle).await {
                if router.process_controller_command(command).await == Outcome::Stop {
                    shutdown_handle.request();
                    break;
                }
            }
            log::info!("Controller loop stopped");
        });
    }

    run_text_loop(&router, &state, &shutdown).await;

    speaker.stop();
    if let Err(e) = movement.neutral().await {
        log::warn!("Could not reach neutral pose: {}", e);
    }
    tokio::time::sleep(settings.timings.shutdown_grace).await;
    terminal::print_system("Goodbye.");
    Ok(())
}

/// Read stdin on a blocking thread and route each line. `help` and
/// `settings` are terminal conveniences handled here; everything else goes
/// through the shared router.
async fn run_text_loop(router: &CommandRouter, state: &SharedState, shutdown: &Shutdown) {
    let (line_tx, mut line_rx) = tokio::sync::mpsc::channel::<String>(8);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if line_tx.blocking_send(line.trim().to_string()).is_err() {
                        break;
                    }
                }
            }
        }
    });

    loop {
        let line = tokio::select! {
            _ = shutdown.requested() => break,
            _ = tokio::signal::ctrl_c() => {
                log::info!("Received Ctrl+C, shutting down...");
                shutdown.request();
                break;
            }
            line = line_rx.recv() => match line {
                Some(line) => line,
                None => {
                    shutdown.request();
                    break;
                }
            },
        };

        match line.to_lowercase().as_str() {
            "" => continue,
            "help" => terminal::print_help(),
            "settings" => terminal::print_settings(state),
            _ => {
                terminal::print_user(&line);
                if router.process_command(&line).await == Outcome::Stop {
                    shutdown.request();
                    break;
                }
            }
        }
    }
}
