//! Speech synthesis and playback.
//!
//! Synthesis requests raw 16 kHz PCM so playback needs no decoder. The
//! rodio output stream is not `Send`, so a dedicated thread owns it and
//! receives play requests over a channel; `stop()` and `is_speaking()` act
//! through shared playback state and work from any context.

use crate::commands::language;
use crate::config::Settings;
use async_trait::async_trait;
use reqwest::Client;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use serde_json::json;
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1";
const TTS_MODEL: &str = "eleven_multilingual_v2";
const PCM_SAMPLE_RATE: u32 = 16_000;

#[derive(Error, Debug)]
pub enum TtsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Audio playback error: {0}")]
    Audio(String),
}

/// Audio output seam. The router speaks through this trait so tests can
/// count utterances without a sound card.
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Synthesize and play `text`, returning once playback finishes or is
    /// stopped. A missing key or output device makes this a silent no-op.
    async fn speak(&self, text: &str, language: &str) -> Result<(), TtsError>;

    /// Cut playback immediately.
    fn stop(&self);

    fn is_speaking(&self) -> bool;
}

struct PlayRequest {
    samples: Vec<i16>,
    done: tokio::sync::oneshot::Sender<()>,
}

#[derive(Default)]
struct Playback {
    sink: Option<Sink>,
    speaking: bool,
}

pub struct Speaker {
    client: Client,
    api_key: Option<String>,
    voice_override: Option<String>,
    playback: Arc<Mutex<Playback>>,
    requests: Option<mpsc::Sender<PlayRequest>>,
}

impl Speaker {
    pub fn new(settings: &Settings) -> Self {
        let client = Client::builder()
            .timeout(settings.timings.tts_timeout)
            .build()
            .expect("Failed to create HTTP client");

        let playback = Arc::new(Mutex::new(Playback::default()));
        let requests = spawn_playback_thread(Arc::clone(&playback));
        if requests.is_none() {
            log::warn!("No audio output device, speech will be text-only");
        }

        Self {
            client,
            api_key: settings.elevenlabs_key().map(str::to_string),
            voice_override: settings.voice_id.clone(),
            playback,
            requests,
        }
    }

    pub fn available(&self) -> bool {
        self.api_key.is_some() && self.requests.is_some()
    }

    fn voice_for(&self, lang: &str) -> String {
        self.voice_override
            .clone()
            .unwrap_or_else(|| language::voice_id(lang).to_string())
    }

    async fn synthesize(
        &self,
        api_key: &str,
        text: &str,
        voice_id: &str,
    ) -> Result<Vec<i16>, TtsError> {
        let url = format!(
            "{}/text-to-speech/{}?output_format=pcm_16000",
            ELEVENLABS_BASE_URL, voice_id
        );

        let payload = json!({
            "text": text,
            "model_id": TTS_MODEL,
            "voice_settings": {
                "stability": 0.5,
                "similarity_boost": 0.75
            }
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TtsError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let bytes = response.bytes().await?;
        Ok(pcm_bytes_to_samples(&bytes))
    }
}

#[async_trait]
impl SpeechOutput for Speaker {
    async fn speak(&self, text: &str, language: &str) -> Result<(), TtsError> {
        let (api_key, requests) = match (&self.api_key, &self.requests) {
            (Some(key), Some(requests)) => (key.clone(), requests),
            _ => return Ok(()),
        };

        let voice_id = self.voice_for(language);
        let samples = self.synthesize(&api_key, text, &voice_id).await?;
        if samples.is_empty() {
            return Ok(());
        }

        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        requests
            .send(PlayRequest {
                samples,
                done: done_tx,
            })
            .map_err(|_| TtsError::Audio("Playback thread is gone".to_string()))?;

        // Completes when playback ends or is stopped.
        let _ = done_rx.await;
        Ok(())
    }

    fn stop(&self) {
        let mut playback = self.playback.lock().unwrap();
        if let Some(sink) = playback.sink.take() {
            sink.stop();
        }
        playback.speaking = false;
    }

    fn is_speaking(&self) -> bool {
        self.playback.lock().unwrap().speaking
    }
}

/// Always-silent output for text-only sessions.
pub struct NullSpeech;

#[async_trait]
impl SpeechOutput for NullSpeech {
    async fn speak(&self, _text: &str, _language: &str) -> Result<(), TtsError> {
        Ok(())
    }

    fn stop(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}

/// Start the thread that owns the rodio output stream. Returns `None` when
/// no output device can be opened.
fn spawn_playback_thread(playback: Arc<Mutex<Playback>>) -> Option<mpsc::Sender<PlayRequest>> {
    let (tx, rx) = mpsc::channel::<PlayRequest>();
    let (ready_tx, ready_rx) = mpsc::channel::<bool>();

    let spawned = std::thread::Builder::new()
        .name("audio-playback".to_string())
        .spawn(move || {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("Failed to open output device: {}", e);
                    let _ = ready_tx.send(false);
                    return;
                }
            };
            let _ = ready_tx.send(true);

            while let Ok(request) = rx.recv() {
                let sink = match Sink::try_new(&handle) {
                    Ok(sink) => sink,
                    Err(e) => {
                        log::warn!("Failed to create playback sink: {}", e);
                        let _ = request.done.send(());
                        continue;
                    }
                };
                sink.append(SamplesBuffer::new(1, PCM_SAMPLE_RATE, request.samples));

                {
                    let mut state = playback.lock().unwrap();
                    state.sink = Some(sink);
                    state.speaking = true;
                }

                // Poll until playback drains or stop() removes the sink.
                loop {
                    let finished = {
                        let state = playback.lock().unwrap();
                        match &state.sink {
                            Some(sink) => sink.empty(),
                            None => true,
                        }
                    };
                    if finished {
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(20));
                }

                {
                    let mut state = playback.lock().unwrap();
                    state.sink = None;
                    state.speaking = false;
                }
                let _ = request.done.send(());
            }
            drop(stream);
        });

    if spawned.is_err() {
        return None;
    }
    match ready_rx.recv() {
        Ok(true) => Some(tx),
        _ => None,
    }
}

fn pcm_bytes_to_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm_decoding_is_little_endian() {
        let bytes = [0x00, 0x00, 0xFF, 0x7F, 0x00, 0x80];
        assert_eq!(pcm_bytes_to_samples(&bytes), vec![0, 32767, -32768]);
    }

    #[test]
    fn pcm_decoding_drops_trailing_odd_byte() {
        let bytes = [0x01, 0x00, 0x02];
        assert_eq!(pcm_bytes_to_samples(&bytes), vec![1]);
    }

    #[tokio::test]
    async fn null_speech_is_inert() {
        let speech = NullSpeech;
        assert!(speech.speak("hello", "english").await.is_ok());
        assert!(!speech.is_speaking());
        speech.stop();
    }
}
