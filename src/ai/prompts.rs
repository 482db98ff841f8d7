//! System prompt construction.

use strum::{Display, EnumString};

/// Selects the assistant's voice. Personality sliders and language are
/// interpolated into the prompt per request, so changing them mid-session
/// takes effect on the very next reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Persona {
    Assistant,
    Tars,
}

pub fn system_prompt(persona: Persona, honesty: f32, humor: f32, language: &str) -> String {
    let honesty_pct = (honesty * 100.0).round() as i32;
    let humor_pct = (humor * 100.0).round() as i32;
    match persona {
        Persona::Assistant => format!(
            "You are TARS, a helpful robot assistant. Keep answers short and \
             conversational, suitable for speech. \
             Honesty: {}%. Humor: {}%. Respond in {}.",
            honesty_pct, humor_pct, language
        ),
        Persona::Tars => format!(
            "You are TARS, the sarcastic robot from Interstellar. Reply with \
             dry one-liners, never more than two sentences. \
             Honesty: {}%. Humor: {}%. Respond in {}.",
            honesty_pct, humor_pct, language
        ),
    }
}
