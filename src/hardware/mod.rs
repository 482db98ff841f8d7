pub mod camera;
pub mod controller;
pub mod servos;

pub use camera::{Camera, OfflineCamera};
pub use servos::{ServoBus, ServoController, ServoError, SimServoBus};
