//! Speech recognition: energy-gated capture plus a hosted Whisper call.
//!
//! Endpointing is local and cheap: mean absolute amplitude against a fixed
//! threshold. Capture stops after a configured run of trailing silence or at
//! the phrase time limit, then the utterance goes to the transcription API
//! as a single WAV upload.

use crate::config::{Settings, Timings};
use crate::state::Shutdown;
use crate::voice::capture::{MicCapture, SAMPLE_RATE};
use reqwest::multipart;
use reqwest::Client;
use serde_json::Value;
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "whisper-large-v3";

/// Capture granularity for endpointing: 100ms at 16 kHz.
const FRAME_LEN: usize = (SAMPLE_RATE as usize) / 10;

#[derive(Error, Debug)]
pub enum SttError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Response parsing error: {0}")]
    ParseError(String),
    #[error("Audio encoding error: {0}")]
    Encode(String),
}

pub struct Listener {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    energy_threshold: i32,
    timings: Timings,
}

impl Listener {
    pub fn new(settings: &Settings) -> Self {
        let client = Client::builder()
            .timeout(settings.timings.stt_timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            api_key: settings.groq_key().map(str::to_string),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            energy_threshold: settings.energy_threshold,
            timings: settings.timings.clone(),
        }
    }

    pub fn available(&self) -> bool {
        self.api_key.is_some()
    }

    /// Capture one utterance and transcribe it. `Ok(None)` means nothing
    /// was said (no speech onset within the listen window, or the
    /// transcript came back empty); it is not an error.
    pub async fn listen(
        &self,
        mic: &mut MicCapture,
        shutdown: &Shutdown,
    ) -> Result<Option<String>, SttError> {
        let api_key = match &self.api_key {
            Some(key) => key.clone(),
            None => return Ok(None),
        };

        mic.clear();
        let samples = match self.capture_utterance(mic, shutdown).await {
            Some(samples) => samples,
            None => return Ok(None),
        };

        let wav = encode_wav(&samples)?;
        let text = self.transcribe(&api_key, wav).await?;
        let cleaned = text.trim().to_lowercase();
        if cleaned.is_empty() {
            Ok(None)
        } else {
            Ok(Some(cleaned))
        }
    }

    /// Energy-gated recording. Waits up to `listen_timeout` for speech
    /// onset, then records until `pause_threshold` of trailing silence or
    /// `phrase_time_limit`, whichever comes first.
    async fn capture_utterance(
        &self,
        mic: &mut MicCapture,
        shutdown: &Shutdown,
    ) -> Option<Vec<i16>> {
        let frame_duration = Duration::from_millis(100);
        let mut samples: Vec<i16> = Vec::new();
        let mut speech_started = false;
        let mut waited = Duration::ZERO;
        let mut silence = Duration::ZERO;
        let mut recorded = Duration::ZERO;

        loop {
            if shutdown.is_requested() {
                return None;
            }
            let frame = mic
                .read_chunk(FRAME_LEN, Duration::from_secs(1), shutdown)
                .await?;

            let loud = frame_energy(&frame) >= self.energy_threshold;

            if !speech_started {
                if loud {
                    speech_started = true;
                    samples.extend_from_slice(&frame);
                } else {
                    waited += frame_duration;
                    if waited >= self.timings.listen_timeout {
                        return None;
                    }
                }
                continue;
            }

            samples.extend_from_slice(&frame);
            recorded += frame_duration;

            if loud {
                silence = Duration::ZERO;
            } else {
                silence += frame_duration;
                if silence >= self.timings.pause_threshold {
                    break;
                }
            }
            if recorded >= self.timings.phrase_time_limit {
                break;
            }
        }

        log::debug!(
            "Captured utterance: {:.1}s of audio",
            samples.len() as f32 / SAMPLE_RATE as f32
        );
        Some(samples)
    }

    async fn transcribe(&self, api_key: &str, wav: Vec<u8>) -> Result<String, SttError> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let part = multipart::Part::bytes(wav)
            .file_name("speech.wav")
            .mime_str("audio/wav")
            .map_err(|e| SttError::Encode(format!("Invalid MIME type: {}", e)))?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SttError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| SttError::ParseError(format!("Invalid JSON: {}", e)))?;
        json["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SttError::ParseError("Missing 'text' field".to_string()))
    }
}

/// Mean absolute amplitude of one frame.
fn frame_energy(frame: &[i16]) -> i32 {
    if frame.is_empty() {
        return 0;
    }
    let sum: i64 = frame.iter().map(|&s| (s as i64).abs()).sum();
    (sum / frame.len() as i64) as i32
}

fn encode_wav(samples: &[i16]) -> Result<Vec<u8>, SttError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| SttError::Encode(format!("WAV header: {}", e)))?;
        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| SttError::Encode(format!("WAV sample: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| SttError::Encode(format!("WAV finalize: {}", e)))?;
    }
    Ok(cursor.into_inner())
}
