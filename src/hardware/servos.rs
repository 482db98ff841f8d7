//! Servo control over a 50 Hz PWM bus.
//!
//! [`ServoBus`] is the hardware seam: the real robot drives a PCA9685-style
//! 16-bit PWM controller, development machines use the logging simulator.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServoError {
    #[error("Servo channel {0} out of range")]
    BadChannel(u8),
    #[error("Angle {0} out of range (-180 to 180)")]
    BadAngle(f32),
    #[error("Bus error: {0}")]
    Bus(String),
}

/// Raw PWM output. Duty is a 16-bit fraction of the 20 ms servo period.
pub trait ServoBus: Send + Sync {
    fn set_duty(&self, channel: u8, duty: u16) -> Result<(), ServoError>;
}

/// Simulator bus: logs what real hardware would do.
pub struct SimServoBus;

impl ServoBus for SimServoBus {
    fn set_duty(&self, channel: u8, duty: u16) -> Result<(), ServoError> {
        log::info!("[SIM] servo channel {} duty {}", channel, duty);
        Ok(())
    }
}

const CHANNEL_COUNT: u8 = 16;
const PERIOD_US: u32 = 20_000;
const PULSE_MIN_US: u32 = 1_000;
const PULSE_MAX_US: u32 = 2_000;

/// Angle-addressed servo interface over a [`ServoBus`].
pub struct ServoController {
    bus: Box<dyn ServoBus>,
}

impl ServoController {
    pub fn new(bus: Box<dyn ServoBus>) -> Self {
        Self { bus }
    }

    /// Move `channel` to `angle` degrees, -180 to 180 mapping linearly onto
    /// the 1-2 ms pulse range.
    pub fn set_angle(&self, channel: u8, angle: f32) -> Result<(), ServoError> {
        if channel >= CHANNEL_COUNT {
            return Err(ServoError::BadChannel(channel));
        }
        if !(-180.0..=180.0).contains(&angle) {
            return Err(ServoError::BadAngle(angle));
        }
        self.bus.set_duty(channel, angle_to_duty(angle))
    }
}

fn angle_to_duty(angle: f32) -> u16 {
    let span = (PULSE_MAX_US - PULSE_MIN_US) as f32;
    let pulse_us = PULSE_MIN_US as f32 + span * (angle + 180.0) / 360.0;
    (pulse_us * 65_535.0 / PERIOD_US as f32) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingBus {
        writes: Arc<Mutex<Vec<(u8, u16)>>>,
    }

    impl ServoBus for RecordingBus {
        fn set_duty(&self, channel: u8, duty: u16) -> Result<(), ServoError> {
            self.writes.lock().unwrap().push((channel, duty));
            Ok(())
        }
    }

    #[test]
    fn angle_endpoints_map_to_pulse_range() {
        // -180° -> 1.0 ms, 0° -> 1.5 ms, +180° -> 2.0 ms of a 20 ms period.
        assert_eq!(angle_to_duty(-180.0), 3276);
        assert_eq!(angle_to_duty(0.0), 4915);
        assert_eq!(angle_to_duty(180.0), 6553);
    }

    #[test]
    fn out_of_range_inputs_are_rejected() {
        let servo = ServoController::new(Box::new(SimServoBus));
        assert!(matches!(
            servo.set_angle(16, 0.0),
            Err(ServoError::BadChannel(16))
        ));
        assert!(matches!(
            servo.set_angle(0, 200.0),
            Err(ServoError::BadAngle(_))
        ));
    }

    #[test]
    fn set_angle_writes_one_duty() {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let servo = ServoController::new(Box::new(RecordingBus {
            writes: Arc::clone(&writes),
        }));
        servo.set_angle(3, 0.0).unwrap();
        assert_eq!(*writes.lock().unwrap(), vec![(3, 4915)]);
    }
}
