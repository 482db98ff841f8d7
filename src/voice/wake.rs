//! Wake word detection with a keyboard fallback.
//!
//! The detector runs a rustpotter model over live microphone frames. When no
//! model is configured or the microphone fails mid-listen, an Enter-key
//! fallback keeps wake-word mode usable.

use crate::error::{Result, TarsError};
use crate::state::Shutdown;
use crate::voice::capture::{MicCapture, SAMPLE_RATE};
use rustpotter::{Rustpotter, RustpotterConfig, SampleFormat};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

pub struct WakeWordDetector {
    detector: Option<Rustpotter>,
    model_path: Option<PathBuf>,
    threshold: f32,
    wake_poll: Duration,
}

impl WakeWordDetector {
    /// Build the detector from an optional model path. A missing or broken
    /// model degrades to keyboard-only wake, it never fails startup.
    pub fn new(model_path: Option<&Path>, threshold: f32, wake_poll: Duration) -> Self {
        let detector = model_path.and_then(|path| match build_detector(path, threshold) {
            Ok(detector) => {
                log::info!("Wake word model loaded from {}", path.display());
                Some(detector)
            }
            Err(e) => {
                log::warn!("Wake word model unavailable ({}), falling back to Enter key", e);
                None
            }
        });

        Self {
            detector,
            model_path: model_path.map(Path::to_path_buf),
            threshold,
            wake_poll,
        }
    }

    pub fn available(&self) -> bool {
        self.detector.is_some()
    }

    /// Block (cooperatively) until the wake word is heard, Enter is pressed,
    /// or shutdown is requested. Returns `true` when woken, `false` on
    /// shutdown.
    pub async fn listen_for_wake_word(
        &mut self,
        mic: &mut MicCapture,
        shutdown: &Shutdown,
    ) -> bool {
        if self.detector.is_none() {
            return self.keyboard_fallback(shutdown).await;
        }

        mic.clear();
        let frame_len = self
            .detector
            .as_ref()
            .map(|d| d.get_samples_per_frame())
            .unwrap_or(0);

        loop {
            if shutdown.is_requested() {
                return false;
            }

            let chunk = match mic
                .read_chunk(frame_len, Duration::from_secs(1), shutdown)
                .await
            {
                Some(chunk) => chunk,
                // Timeout just means silence from the driver; keep waiting
                // unless we are shutting down.
                None if shutdown.is_requested() => return false,
                None => continue,
            };

            let frame: Vec<f32> = chunk.iter().map(|&s| s as f32 / 32768.0).collect();
            let detector = match self.detector.as_mut() {
                Some(d) => d,
                None => return self.keyboard_fallback(shutdown).await,
            };

            if let Some(detection) = detector.process_samples(frame) {
                log::info!(
                    "Wake word '{}' detected (score {:.2})",
                    detection.name,
                    detection.score
                );
                self.reset();
                mic.clear();
                return true;
            }
        }
    }

    /// Rebuild the detector so residual frame state from one detection
    /// cannot bias the next.
    fn reset(&mut self) {
        if let Some(path) = &self.model_path {
            match build_detector(path, self.threshold) {
                Ok(detector) => self.detector = Some(detector),
                Err(e) => {
                    log::warn!("Wake word detector reset failed: {}", e);
                    self.detector = None;
                }
            }
        }
    }

    /// Wait for Enter on stdin. The blocking read lives on its own thread;
    /// this side polls a channel so shutdown is observed within one poll
    /// interval.
    async fn keyboard_fallback(&mut self, shutdown: &Shutdown) -> bool {
        log::info!("Press Enter to wake");
        let (tx, rx) = mpsc::channel::<()>();
        std::thread::spawn(move || {
            let mut line = String::new();
            if std::io::stdin().read_line(&mut line).is_ok() {
                let _ = tx.send(());
            }
        });

        loop {
            if shutdown.is_requested() {
                return false;
            }
            if rx.try_recv().is_ok() {
                return true;
            }
            tokio::time::sleep(self.wake_poll).await;
        }
    }
}

fn build_detector(path: &Path, threshold: f32) -> Result<Rustpotter> {
    let mut config = RustpotterConfig::default();
    config.fmt.sample_rate = SAMPLE_RATE as usize;
    config.fmt.channels = 1;
    config.fmt.sample_format = SampleFormat::F32;
    config.detector.threshold = threshold;

    let mut detector = Rustpotter::new(&config)
        .map_err(|e| TarsError::Audio(format!("Failed to create wake word detector: {}", e)))?;
    detector
        .add_wakeword_from_file("tars", &path.to_string_lossy())
        .map_err(|e| TarsError::Audio(format!("Failed to load wake word model: {}", e)))?;
    Ok(detector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_degrades_to_fallback() {
        let detector = WakeWordDetector::new(None, 0.5, Duration::from_millis(200));
        assert!(!detector.available());
    }

    #[test]
    fn broken_model_path_degrades_to_fallback() {
        let detector = WakeWordDetector::new(
            Some(Path::new("/nonexistent/model.rpw")),
            0.5,
            Duration::from_millis(200),
        );
        assert!(!detector.available());
    }
}
