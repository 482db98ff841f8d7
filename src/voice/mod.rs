pub mod capture;
pub mod listener;
pub mod pipeline;
pub mod speaker;
pub mod state;
pub mod wake;

pub use state::{VoiceState, VoiceStateMachine};
