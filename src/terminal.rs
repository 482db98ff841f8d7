//! Console output helpers shared by every execution context.
//!
//! Printing and speaking both funnel through the command router; these
//! helpers only format. Any context may call them concurrently — each call
//! is a single `println!`, which locks stdout internally.

use crate::state::SharedState;

pub fn print_banner() {
    println!("TARS v2.0 — voice assistant robot controller");
}

pub fn print_user(text: &str) {
    println!("H: {}", text);
}

pub fn print_tars(text: &str) {
    println!("TARS: {}", text);
}

pub fn print_system(text: &str) {
    println!("· {}", text);
}

pub fn print_error(text: &str) {
    eprintln!("Error: {}", text);
}

pub fn print_settings(state: &SharedState) {
    println!("  Language : {}", state.current_language());
    println!("  Humor    : {}%", (state.humor() * 100.0).round() as i32);
    println!("  Honesty  : {}%", (state.honesty() * 100.0).round() as i32);
}

pub fn print_help() {
    println!("Commands:");
    println!("  move forward            Walk forward one step");
    println!("  turn left / turn right  Turn in place");
    println!("  speak [language]        Switch language (e.g. 'speak spanish')");
    println!("  time                    Get current time");
    println!("  weather                 Get weather report");
    println!("  what do you see         Describe the scene (camera)");
    println!("  how many people         Count people (detector)");
    println!("  greet everyone          Greet visible people");
    println!("  set humor to [N]%       Adjust humor level");
    println!("  set honesty to [N]%     Adjust honesty level");
    println!("  search for [task]       Delegate a web task to the relay");
    println!("  settings                Show current settings");
    println!("  help                    Show this help");
    println!("  stop / exit / quit      Shut down");
    println!();
    println!("  anything else           Chat with TARS via AI");
}
