//! Microphone capture.
//!
//! A dedicated thread owns the cpal input stream (cpal streams are not
//! `Send`); the async side only sees the shared sample buffer. Samples are
//! downmixed to mono and resampled to 16 kHz i16, the format every consumer
//! (wake word, speech recognition) expects.

use crate::error::{Result, TarsError};
use crate::state::Shutdown;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

pub const SAMPLE_RATE: u32 = 16_000;

/// Overflow cap: ten seconds of audio. Nobody reading for that long has a
/// use for older samples.
const MAX_BUFFERED_SAMPLES: usize = SAMPLE_RATE as usize * 10;

pub struct MicCapture {
    buffer: Arc<Mutex<VecDeque<i16>>>,
    stop: Arc<AtomicBool>,
    chunk_poll: Duration,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl MicCapture {
    /// Open the default input device and start capturing. Fails if there is
    /// no usable input device; callers degrade to text-only in that case.
    pub fn open(chunk_poll: Duration) -> Result<Self> {
        let buffer = Arc::new(Mutex::new(VecDeque::new()));
        let stop = Arc::new(AtomicBool::new(false));

        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();
        let thread_buffer = Arc::clone(&buffer);
        let thread_stop = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("mic-capture".to_string())
            .spawn(move || {
                let stream = match build_input_stream(thread_buffer) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(TarsError::Audio(format!(
                        "Failed to start input stream: {}",
                        e
                    ))));
                    return;
                }
                let _ = ready_tx.send(Ok(()));

                // Keep the stream alive until asked to stop.
                while !thread_stop.load(Ordering::Relaxed) {
                    std::thread::sleep(Duration::from_millis(50));
                }
                drop(stream);
            })?;

        ready_rx
            .recv()
            .map_err(|_| TarsError::Audio("Capture thread exited during setup".to_string()))??;

        Ok(Self {
            buffer,
            stop,
            chunk_poll,
            thread: Some(thread),
        })
    }

    /// Drop any buffered audio. Called before each fresh listen so stale
    /// samples (including our own playback bleed) are not interpreted as
    /// speech.
    pub fn clear(&self) {
        self.buffer.lock().unwrap().clear();
    }

    pub fn available_samples(&self) -> usize {
        self.buffer.lock().unwrap().len()
    }

    /// Wait until `frame_len` samples are buffered and return them. Returns
    /// `None` on timeout or when shutdown is requested; never blocks the
    /// executor, polling at the configured interval instead.
    pub async fn read_chunk(
        &mut self,
        frame_len: usize,
        timeout: Duration,
        shutdown: &Shutdown,
    ) -> Option<Vec<i16>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if shutdown.is_requested() {
                return None;
            }
            {
                let mut buffer = self.buffer.lock().unwrap();
                if buffer.len() >= frame_len {
                    return Some(buffer.drain(..frame_len).collect());
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(self.chunk_poll).await;
        }
    }
}

impl Drop for MicCapture {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn build_input_stream(buffer: Arc<Mutex<VecDeque<i16>>>) -> Result<Stream> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| TarsError::Device("No default input device available".to_string()))?;

    let supported = device
        .default_input_config()
        .map_err(|e| TarsError::Device(format!("Failed to query input config: {}", e)))?;

    let sample_format = supported.sample_format();
    let config = supported.config();
    let channels = config.channels as usize;
    let source_rate = config.sample_rate.0;

    log::info!(
        "Microphone: {} ({:?}, {} ch, {} Hz)",
        device.name().unwrap_or_else(|_| "unknown".to_string()),
        sample_format,
        channels,
        source_rate
    );

    let err_fn = |err| log::error!("Input stream error: {}", err);

    let stream = match sample_format {
        SampleFormat::F32 => device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    ingest(&buffer, data, channels, source_rate);
                },
                err_fn,
                None,
            )
            .map_err(|e| TarsError::Audio(format!("Failed to build input stream: {}", e)))?,
        SampleFormat::I16 => device
            .build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let as_f32: Vec<f32> = data.iter().map(|&s| s as f32 / 32768.0).collect();
                    ingest(&buffer, &as_f32, channels, source_rate);
                },
                err_fn,
                None,
            )
            .map_err(|e| TarsError::Audio(format!("Failed to build input stream: {}", e)))?,
        format => {
            return Err(TarsError::Audio(format!(
                "Unsupported input sample format: {:?}",
                format
            )))
        }
    };

    Ok(stream)
}

/// Downmix to mono, resample to 16 kHz, append to the shared buffer.
fn ingest(buffer: &Mutex<VecDeque<i16>>, data: &[f32], channels: usize, source_rate: u32) {
    let mono: Vec<f32> = if channels == 1 {
        data.to_vec()
    } else {
        data.chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    let resampled = resample_to_i16(&mono, source_rate);

    let mut buffer = buffer.lock().unwrap();
    buffer.extend(resampled);
    if buffer.len() > MAX_BUFFERED_SAMPLES {
        let excess = buffer.len() - MAX_BUFFERED_SAMPLES;
        buffer.drain(..excess);
    }
}

/// Linear interpolation resampler. Good enough for speech; per-callback
/// boundary error is inaudible at these chunk sizes.
fn resample_to_i16(mono: &[f32], source_rate: u32) -> Vec<i16> {
    if source_rate == SAMPLE_RATE {
        return mono
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
            .collect();
    }

    let ratio = source_rate as f32 / SAMPLE_RATE as f32;
    let output_len = (mono.len() as f32 / ratio) as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src = i as f32 * ratio;
        let lo = src.floor() as usize;
        let hi = (lo + 1).min(mono.len().saturating_sub(1));
        let frac = src - lo as f32;

        let sample = if lo >= mono.len() {
            0.0
        } else {
            mono[lo] * (1.0 - frac) + mono[hi] * frac
        };
        output.push((sample.clamp(-1.0, 1.0) * 32767.0) as i16);
    }
    output
}
