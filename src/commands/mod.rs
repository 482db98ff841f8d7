pub mod info;
pub mod language;
pub mod movement;
pub mod router;
pub mod settings;

pub use router::{CommandRouter, ControllerCommand, Outcome};
