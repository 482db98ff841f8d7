use thiserror::Error;

pub type Result<T> = std::result::Result<T, TarsError>;

#[derive(Error, Debug)]
pub enum TarsError {
    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("AI backend error: {0}")]
    Backend(#[from] crate::ai::backend::BackendError),

    #[error("Speech synthesis error: {0}")]
    Tts(#[from] crate::voice::speaker::TtsError),

    #[error("Speech recognition error: {0}")]
    Stt(#[from] crate::voice::listener::SttError),

    #[error("Servo error: {0}")]
    Servo(#[from] crate::hardware::servos::ServoError),

    #[error("Remote agent error: {0}")]
    Remote(#[from] crate::remote::RemoteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
