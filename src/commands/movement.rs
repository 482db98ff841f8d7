//! Walking and turning sequences.
//!
//! The chassis has a central lift servo and one drive servo per side.
//! Forward motion is lift, swing, drop; turns swing the sides in opposite
//! directions. Sequences run open-loop with fixed dwell times.

use crate::hardware::servos::{ServoController, ServoError};
use async_trait::async_trait;
use std::time::Duration;

const CHANNEL_LIFT: u8 = 0;
const CHANNEL_PORT: u8 = 1;
const CHANNEL_STARBOARD: u8 = 2;

const LIFT_UP: f32 = -40.0;
const LIFT_DOWN: f32 = 0.0;
const SWING_FORWARD: f32 = 45.0;
const SWING_NEUTRAL: f32 = 0.0;
const TURN_SWING: f32 = 35.0;

const LIFT_DWELL: Duration = Duration::from_millis(250);
const SWING_DWELL: Duration = Duration::from_millis(400);

/// Locomotion seam. The router narrates through the speech output and then
/// drives through this trait; tests substitute a counter.
#[async_trait]
pub trait Movement: Send + Sync {
    async fn step_forward(&self) -> Result<(), ServoError>;
    async fn turn_left(&self) -> Result<(), ServoError>;
    async fn turn_right(&self) -> Result<(), ServoError>;

    /// Return every servo to its rest position.
    async fn neutral(&self) -> Result<(), ServoError>;
}

pub struct MovementController {
    servos: ServoController,
}

impl MovementController {
    pub fn new(servos: ServoController) -> Self {
        Self { servos }
    }

    async fn lift(&self) -> Result<(), ServoError> {
        self.servos.set_angle(CHANNEL_LIFT, LIFT_UP)?;
        tokio::time::sleep(LIFT_DWELL).await;
        Ok(())
    }

    async fn drop(&self) -> Result<(), ServoError> {
        self.servos.set_angle(CHANNEL_LIFT, LIFT_DOWN)?;
        tokio::time::sleep(LIFT_DWELL).await;
        Ok(())
    }

    async fn swing(&self, port: f32, starboard: f32) -> Result<(), ServoError> {
        self.servos.set_angle(CHANNEL_PORT, port)?;
        self.servos.set_angle(CHANNEL_STARBOARD, starboard)?;
        tokio::time::sleep(SWING_DWELL).await;
        Ok(())
    }
}

#[async_trait]
impl Movement for MovementController {
    async fn step_forward(&self) -> Result<(), ServoError> {
        self.lift().await?;
        self.swing(SWING_FORWARD, SWING_FORWARD).await?;
        self.drop().await?;
        self.swing(SWING_NEUTRAL, SWING_NEUTRAL).await?;
        Ok(())
    }

    async fn turn_left(&self) -> Result<(), ServoError> {
        self.lift().await?;
        self.swing(-TURN_SWING, TURN_SWING).await?;
        self.drop().await?;
        self.swing(SWING_NEUTRAL, SWING_NEUTRAL).await?;
        Ok(())
    }

    async fn turn_right(&self) -> Result<(), ServoError> {
        self.lift().await?;
        self.swing(TURN_SWING, -TURN_SWING).await?;
        self.drop().await?;
        self.swing(SWING_NEUTRAL, SWING_NEUTRAL).await?;
        Ok(())
    }

    async fn neutral(&self) -> Result<(), ServoError> {
        self.servos.set_angle(CHANNEL_LIFT, LIFT_DOWN)?;
        self.servos.set_angle(CHANNEL_PORT, SWING_NEUTRAL)?;
        self.servos.set_angle(CHANNEL_STARBOARD, SWING_NEUTRAL)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::servos::ServoBus;
    use std::sync::{Arc, Mutex};

    struct RecordingBus {
        writes: Arc<Mutex<Vec<u8>>>,
    }

    impl ServoBus for RecordingBus {
        fn set_duty(&self, channel: u8, _duty: u16) -> Result<(), ServoError> {
            self.writes.lock().unwrap().push(channel);
            Ok(())
        }
    }

    fn recorded_controller() -> (MovementController, Arc<Mutex<Vec<u8>>>) {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let bus = RecordingBus {
            writes: Arc::clone(&writes),
        };
        let controller = MovementController::new(ServoController::new(Box::new(bus)));
        (controller, writes)
    }

    #[tokio::test(start_paused = true)]
    async fn step_lifts_before_swinging() {
        let (controller, writes) = recorded_controller();
        controller.step_forward().await.unwrap();
        let channels = writes.lock().unwrap();
        assert_eq!(channels[0], CHANNEL_LIFT);
        assert!(channels.contains(&CHANNEL_PORT));
        assert!(channels.contains(&CHANNEL_STARBOARD));
    }

    #[tokio::test]
    async fn neutral_touches_every_channel_once() {
        let (controller, writes) = recorded_controller();
        controller.neutral().await.unwrap();
        assert_eq!(
            *writes.lock().unwrap(),
            vec![CHANNEL_LIFT, CHANNEL_PORT, CHANNEL_STARBOARD]
        );
    }
}
