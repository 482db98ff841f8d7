pub mod backend;
pub mod context;
pub mod prompts;
pub mod responder;

pub use responder::{AiResponder, ChatResponder};
