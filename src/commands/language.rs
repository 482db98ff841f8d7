//! Supported languages, their synthesis voices, and canned motion phrases.

/// Motions that get a spoken narration in the active language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    StepForward,
    TurnLeft,
    TurnRight,
}

pub struct LanguageProfile {
    pub name: &'static str,
    pub voice_id: &'static str,
    step_forward: &'static str,
    turn_left: &'static str,
    turn_right: &'static str,
}

static LANGUAGES: &[LanguageProfile] = &[
    LanguageProfile {
        name: "english",
        voice_id: "21m00Tcm4TlvDq8ikWAM",
        step_forward: "Taking a step forward.",
        turn_left: "Turning left.",
        turn_right: "Turning right.",
    },
    LanguageProfile {
        name: "spanish",
        voice_id: "VR6AewLTigWG4xSOukaG",
        step_forward: "Dando un paso adelante.",
        turn_left: "Girando a la izquierda.",
        turn_right: "Girando a la derecha.",
    },
    LanguageProfile {
        name: "french",
        voice_id: "EXAVITQu4vr4xnSDxMaL",
        step_forward: "Je fais un pas en avant.",
        turn_left: "Je tourne à gauche.",
        turn_right: "Je tourne à droite.",
    },
    LanguageProfile {
        name: "german",
        voice_id: "ErXwobaYiN019PkySvjV",
        step_forward: "Ich mache einen Schritt nach vorne.",
        turn_left: "Ich drehe mich nach links.",
        turn_right: "Ich drehe mich nach rechts.",
    },
];

/// Find the language named inside `input`, e.g. "speak spanish".
pub fn supported(input: &str) -> Option<&'static LanguageProfile> {
    LANGUAGES.iter().find(|profile| input.contains(profile.name))
}

/// Synthesis voice for a language; unknown languages use the English voice.
pub fn voice_id(lang: &str) -> &'static str {
    LANGUAGES
        .iter()
        .find(|profile| profile.name == lang)
        .unwrap_or(&LANGUAGES[0])
        .voice_id
}

/// Narration for a motion in the active language.
pub fn movement_message(lang: &str, motion: Motion) -> &'static str {
    let profile = LANGUAGES
        .iter()
        .find(|p| p.name == lang)
        .unwrap_or(&LANGUAGES[0]);
    match motion {
        Motion::StepForward => profile.step_forward,
        Motion::TurnLeft => profile.turn_left,
        Motion::TurnRight => profile.turn_right,
    }
}
