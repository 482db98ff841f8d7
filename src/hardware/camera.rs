//! Vision seam.
//!
//! The router asks the camera for capabilities before each vision command
//! and answers with a capability message when something is missing, so the
//! offline implementation here is a complete, honest stand-in.

use async_trait::async_trait;

#[async_trait]
pub trait Camera: Send + Sync {
    /// A capture device is attached and working.
    fn is_available(&self) -> bool;

    /// The person-detection model is loaded.
    fn is_detector_available(&self) -> bool;

    /// Natural-language description of the current frame.
    async fn describe_scene(&self) -> Option<String>;

    async fn count_people(&self) -> Option<usize>;
}

/// No-camera implementation used when no capture hardware is present.
pub struct OfflineCamera;

#[async_trait]
impl Camera for OfflineCamera {
    fn is_available(&self) -> bool {
        false
    }

    fn is_detector_available(&self) -> bool {
        false
    }

    async fn describe_scene(&self) -> Option<String> {
        None
    }

    async fn count_people(&self) -> Option<usize> {
        None
    }
}
