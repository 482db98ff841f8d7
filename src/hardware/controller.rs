//! Gamepad input via the Linux event interface.
//!
//! Button presses map to [`ControllerCommand`]s which the main loop feeds
//! through the same router as spoken and typed commands. Built only with
//! the `controller` feature on Linux; elsewhere a stub reports no device.

use crate::commands::ControllerCommand;

#[cfg(all(target_os = "linux", feature = "controller"))]
mod imp {
    use super::*;
    use crate::state::Shutdown;
    use evdev::{Device, EventStream, InputEventKind, Key};

    pub struct Gamepad {
        events: EventStream,
        name: String,
    }

    impl Gamepad {
        /// Scan /dev/input for something that looks like a gamepad.
        pub fn find() -> Option<Self> {
            for (path, device) in evdev::enumerate() {
                let name = device.name().unwrap_or("").to_lowercase();
                if name.contains("controller")
                    || name.contains("gamepad")
                    || name.contains("joystick")
                {
                    log::info!("Gamepad found: {} at {}", name, path.display());
                    return Self::from_device(device, name);
                }
            }
            log::info!("No gamepad detected");
            None
        }

        fn from_device(device: Device, name: String) -> Option<Self> {
            match device.into_event_stream() {
                Ok(events) => Some(Self { events, name }),
                Err(e) => {
                    log::warn!("Failed to open gamepad event stream: {}", e);
                    None
                }
            }
        }

        pub fn name(&self) -> &str {
            &self.name
        }

        /// Next mapped button press, or `None` on shutdown or device loss.
        pub async fn next_command(&mut self, shutdown: &Shutdown) -> Option<ControllerCommand> {
            loop {
                let event = tokio::select! {
                    _ = shutdown.requested() => return None,
                    event = self.events.next_event() => event,
                };
                let event = match event {
                    Ok(event) => event,
                    Err(e) => {
                        log::warn!("Gamepad read error: {}", e);
                        return None;
                    }
                };
                // Key-down only; releases and repeats are ignored.
                if let InputEventKind::Key(key) = event.kind() {
                    if event.value() == 1 {
                        if let Some(command) = map_button(key) {
                            return Some(command);
                        }
                    }
                }
            }
        }
    }

    fn map_button(key: Key) -> Option<ControllerCommand> {
        match key {
            Key::BTN_SOUTH => Some(ControllerCommand::MoveForward),
            Key::BTN_WEST => Some(ControllerCommand::TurnLeft),
            Key::BTN_EAST => Some(ControllerCommand::TurnRight),
            Key::BTN_NORTH => Some(ControllerCommand::Neutral),
            Key::BTN_START => Some(ControllerCommand::Stop),
            _ => None,
        }
    }
}

#[cfg(all(target_os = "linux", feature = "controller"))]
pub use imp::Gamepad;

#[cfg(not(all(target_os = "linux", feature = "controller")))]
mod imp {
    use super::*;
    use crate::state::Shutdown;

    /// Stub for platforms without the event interface: never finds a device.
    pub struct Gamepad;

    impl Gamepad {
        pub fn find() -> Option<Self> {
            log::info!("Gamepad support not built in");
            None
        }

        pub fn name(&self) -> &str {
            "none"
        }

        pub async fn next_command(&mut self, _shutdown: &Shutdown) -> Option<ControllerCommand> {
            None
        }
    }
}

#[cfg(not(all(target_os = "linux", feature = "controller")))]
pub use imp::Gamepad;
