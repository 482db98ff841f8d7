pub mod ai;
pub mod commands;
pub mod config;
pub mod error;
pub mod hardware;
pub mod remote;
pub mod state;
pub mod terminal;
pub mod voice;

pub use error::{Result, TarsError};
