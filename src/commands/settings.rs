//! Personality slider parsing.

use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").expect("valid regex"));

/// Extract a percentage from free-form input like "set humor to 80%".
/// Values above 100 clamp to 100; the result is normalized to 0.0..=1.0.
/// Returns `None` when no number is present.
pub fn parse_percentage(input: &str) -> Option<f32> {
    let captures = NUMBER.captures(input)?;
    let raw: u32 = captures.get(1)?.as_str().parse().ok()?;
    Some(raw.min(100) as f32 / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_percentages() {
        assert_eq!(parse_percentage("set humor to 80%"), Some(0.8));
        assert_eq!(parse_percentage("honesty 0"), Some(0.0));
        assert_eq!(parse_percentage("make it 100"), Some(1.0));
    }

    #[test]
    fn values_over_100_clamp() {
        assert_eq!(parse_percentage("set humor to 150%"), Some(1.0));
        assert_eq!(parse_percentage("set honesty to 9999"), Some(1.0));
    }

    #[test]
    fn non_numeric_input_is_none() {
        assert_eq!(parse_percentage("set humor to banana"), None);
        assert_eq!(parse_percentage(""), None);
    }

    #[test]
    fn first_number_wins() {
        assert_eq!(parse_percentage("set humor to 30 or maybe 90"), Some(0.3));
    }
}
