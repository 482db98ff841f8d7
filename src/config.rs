use crate::ai::prompts::Persona;
use secrecy::{ExposeSecret, SecretBox};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
    #[error("Environment error: {0}")]
    Env(#[from] std::env::VarError),
}

/// Timing knobs for every poll loop and bounded wait in the runtime.
///
/// These are explicit configuration rather than inline constants so tests
/// can shrink them.
#[derive(Debug, Clone)]
pub struct Timings {
    /// How often the steady-state loops check the shutdown signal.
    pub poll_interval: Duration,
    /// Poll interval for the manual wake trigger fallback.
    pub wake_poll: Duration,
    /// Poll interval when draining the microphone buffer.
    pub chunk_poll: Duration,
    /// How long the listener waits for speech to start before giving up.
    pub listen_timeout: Duration,
    /// Hard cap on a single recorded utterance.
    pub phrase_time_limit: Duration,
    /// Trailing silence that ends an utterance.
    pub pause_threshold: Duration,
    /// Guard delay after playback ends before the mic is trusted again.
    pub post_speech_guard: Duration,
    /// Pause after the farewell so playback can finish before shutdown.
    pub stop_linger: Duration,
    /// Per-call timeout for cloud chat backends.
    pub cloud_timeout: Duration,
    /// Per-call timeout for the local (Ollama) backend.
    pub local_timeout: Duration,
    /// Timeout for the Ollama availability probe.
    pub ollama_probe_timeout: Duration,
    /// Timeout for one speech-to-text request.
    pub stt_timeout: Duration,
    /// Timeout for one speech synthesis request.
    pub tts_timeout: Duration,
    /// Deadline for a delegated web task.
    pub remote_timeout: Duration,
    /// Timeout for the relay /health probe.
    pub health_timeout: Duration,
    /// How long shutdown waits for background contexts to notice.
    pub shutdown_grace: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            wake_poll: Duration::from_millis(200),
            chunk_poll: Duration::from_millis(10),
            listen_timeout: Duration::from_secs(3),
            phrase_time_limit: Duration::from_secs(6),
            pause_threshold: Duration::from_millis(600),
            post_speech_guard: Duration::from_millis(200),
            stop_linger: Duration::from_secs(1),
            cloud_timeout: Duration::from_secs(10),
            local_timeout: Duration::from_secs(30),
            ollama_probe_timeout: Duration::from_secs(2),
            stt_timeout: Duration::from_secs(10),
            tts_timeout: Duration::from_secs(30),
            remote_timeout: Duration::from_secs(90),
            health_timeout: Duration::from_secs(5),
            shutdown_grace: Duration::from_millis(500),
        }
    }
}

/// Runtime configuration, loaded once at startup from the environment
/// (plus a `.env` file if present). Missing API keys degrade the matching
/// capability instead of failing startup.
#[derive(Debug)]
pub struct Settings {
    cerebras_key: Option<SecretBox<String>>,
    openai_key: Option<SecretBox<String>>,
    groq_key: Option<SecretBox<String>>,
    elevenlabs_key: Option<SecretBox<String>>,
    weather_key: Option<SecretBox<String>>,

    pub city_name: Option<String>,
    pub relay_url: Option<String>,

    pub backend_order: Vec<String>,
    pub persona: Persona,
    pub cerebras_model: String,
    pub openai_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub ai_max_tokens: u32,
    pub ai_temperature: f32,
    pub history_capacity: usize,

    pub default_language: String,
    pub default_humor: f32,
    pub default_honesty: f32,

    pub voice_id: Option<String>,
    pub wake_model_path: Option<PathBuf>,
    pub wake_threshold: f32,
    pub energy_threshold: i32,

    pub remote_triggers: Vec<String>,
    pub summary_threshold: usize,

    pub timings: Timings,
}

impl Settings {
    /// Load settings from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (for development)
        dotenvy::dotenv().ok();

        let persona = match std::env::var("TARS_PERSONA") {
            Ok(raw) => Persona::from_str(raw.trim()).map_err(|_| ConfigError::InvalidValue {
                var: "TARS_PERSONA".to_string(),
                reason: format!("unknown persona '{}' (use 'assistant' or 'tars')", raw),
            })?,
            Err(_) => Persona::Assistant,
        };

        Ok(Self {
            cerebras_key: secret("CEREBRAS_API_KEY"),
            openai_key: secret("OPENAI_API_KEY"),
            groq_key: secret("GROQ_API_KEY"),
            elevenlabs_key: secret("ELEVENLABS_API_KEY"),
            weather_key: secret("WEATHER_API_KEY"),
            city_name: non_empty("CITY_NAME"),
            relay_url: non_empty("TARS_RELAY_URL"),
            backend_order: list_or("TARS_BACKEND_ORDER", &["cerebras", "openai", "ollama"]),
            persona,
            cerebras_model: string_or("TARS_CEREBRAS_MODEL", "llama3.1-8b"),
            openai_model: string_or("TARS_OPENAI_MODEL", "gpt-4o-mini"),
            ollama_url: string_or("TARS_OLLAMA_URL", "http://localhost:11434"),
            ollama_model: string_or("TARS_OLLAMA_MODEL", "phi3"),
            ai_max_tokens: parse_or("TARS_AI_MAX_TOKENS", 60)?,
            ai_temperature: parse_or("TARS_AI_TEMPERATURE", 0.9)?,
            history_capacity: parse_or("TARS_HISTORY_CAPACITY", 20)?,
            default_language: string_or("TARS_LANGUAGE", "english").to_lowercase(),
            default_humor: parse_or::<f32>("TARS_HUMOR", 50.0)? / 100.0,
            default_honesty: parse_or::<f32>("TARS_HONESTY", 50.0)? / 100.0,
            voice_id: non_empty("TARS_VOICE_ID"),
            wake_model_path: non_empty("TARS_WAKE_MODEL").map(PathBuf::from),
            wake_threshold: parse_or("TARS_WAKE_THRESHOLD", 0.5)?,
            energy_threshold: parse_or("TARS_ENERGY_THRESHOLD", 500)?,
            remote_triggers: list_or(
                "TARS_REMOTE_TRIGGERS",
                &["search for", "search the web", "google", "look up", "browse", "order", "book"],
            ),
            summary_threshold: parse_or("TARS_SUMMARY_THRESHOLD", 300)?,
            timings: Timings::default(),
        })
    }

    /// A keyless configuration with defaults only. Every network-backed
    /// capability reports unavailable. Used by tests and dry runs.
    pub fn offline() -> Self {
        Self {
            cerebras_key: None,
            openai_key: None,
            groq_key: None,
            elevenlabs_key: None,
            weather_key: None,
            city_name: None,
            relay_url: None,
            backend_order: vec![
                "cerebras".to_string(),
                "openai".to_string(),
                "ollama".to_string(),
            ],
            persona: Persona::Assistant,
            cerebras_model: "llama3.1-8b".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "phi3".to_string(),
            ai_max_tokens: 60,
            ai_temperature: 0.9,
            history_capacity: 20,
            default_language: "english".to_string(),
            default_humor: 0.5,
            default_honesty: 0.5,
            voice_id: None,
            wake_model_path: None,
            wake_threshold: 0.5,
            energy_threshold: 500,
            remote_triggers: vec!["search for".to_string(), "look up".to_string()],
            summary_threshold: 300,
            timings: Timings::default(),
        }
    }

    /// Get Cerebras API key (use only when making API calls)
    pub fn cerebras_key(&self) -> Option<&str> {
        self.cerebras_key.as_ref().map(|k| k.expose_secret().as_str())
    }

    /// Get OpenAI API key (use only when making API calls)
    pub fn openai_key(&self) -> Option<&str> {
        self.openai_key.as_ref().map(|k| k.expose_secret().as_str())
    }

    /// Get Groq API key for speech recognition (use only when making API calls)
    pub fn groq_key(&self) -> Option<&str> {
        self.groq_key.as_ref().map(|k| k.expose_secret().as_str())
    }

    /// Get ElevenLabs API key for speech synthesis (use only when making API calls)
    pub fn elevenlabs_key(&self) -> Option<&str> {
        self.elevenlabs_key.as_ref().map(|k| k.expose_secret().as_str())
    }

    /// Get OpenWeatherMap API key (use only when making API calls)
    pub fn weather_key(&self) -> Option<&str> {
        self.weather_key.as_ref().map(|k| k.expose_secret().as_str())
    }
}

fn secret(var: &str) -> Option<SecretBox<String>> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| SecretBox::new(Box::new(v)))
}

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn string_or(var: &str, default: &str) -> String {
    non_empty(var).unwrap_or_else(|| default.to_string())
}

fn list_or(var: &str, default: &[&str]) -> Vec<String> {
    match non_empty(var) {
        Some(raw) => raw
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect(),
        None => default.iter().map(|s| s.to_string()).collect(),
    }
}

fn parse_or<T: FromStr>(var: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match non_empty(var) {
        Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidValue {
            var: var.to_string(),
            reason: format!("{}", e),
        }),
        None => Ok(default),
    }
}

/// Load configuration with helpful log output for development.
pub fn load_settings() -> Result<Settings, ConfigError> {
    match Settings::load() {
        Ok(settings) => {
            let mut missing = Vec::new();
            if settings.cerebras_key().is_none() && settings.openai_key().is_none() {
                missing.push("CEREBRAS_API_KEY or OPENAI_API_KEY (AI chat)");
            }
            if settings.groq_key().is_none() {
                missing.push("GROQ_API_KEY (speech recognition)");
            }
            if settings.elevenlabs_key().is_none() {
                missing.push("ELEVENLABS_API_KEY (speech synthesis)");
            }
            for item in &missing {
                log::warn!("Not configured: {}", item);
            }
            Ok(settings)
        }
        Err(e) => {
            log::error!("Configuration error: {}", e);
            Err(e)
        }
    }
}
