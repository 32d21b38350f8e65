use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::limits::{CAPS_MIN_LEN, CAPS_RATIO};

/// Combining-mark abuse characters that break chat rendering.
static FORBIDDEN_SYMBOLS: Lazy<Regex> =
    Lazy::new(|| Regex::new("꙰|ᡃ⃝|⃟").expect("forbidden symbol pattern is valid"));

/// A content rule violation detected in an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Rendering-breaking symbols; the message is deleted outright.
    ForbiddenSymbols,
    /// Mostly-uppercase shouting; deleted and warned.
    ExcessiveCaps,
}

/// Classify one message, most severe rule first.
pub fn classify(text: &str) -> Option<Violation> {
    if FORBIDDEN_SYMBOLS.is_match(text) {
        return Some(Violation::ForbiddenSymbols);
    }
    if is_shouting(text) {
        return Some(Violation::ExcessiveCaps);
    }
    None
}

fn is_shouting(text: &str) -> bool {
    let total = text.chars().count();
    if total <= CAPS_MIN_LEN {
        return false;
    }
    let upper = text.chars().filter(|c| c.is_uppercase()).count();
    upper as f64 / total as f64 > CAPS_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes() {
        assert_eq!(classify("hello there, how are you"), None);
    }

    #[test]
    fn forbidden_symbols_detected() {
        assert_eq!(
            classify("nice chat ꙰ indeed"),
            Some(Violation::ForbiddenSymbols)
        );
    }

    #[test]
    fn shouting_detected() {
        assert_eq!(
            classify("STOP SHOUTING IN THE CHAT"),
            Some(Violation::ExcessiveCaps)
        );
    }

    #[test]
    fn short_caps_are_tolerated() {
        // At most CAPS_MIN_LEN characters is never shouting.
        assert_eq!(classify("OK GO NOW"), None);
    }

    #[test]
    fn mixed_case_below_ratio_passes() {
        assert_eq!(classify("This Is A Perfectly Normal Sentence"), None);
    }
}
