//! PII scrubbing for explanation text

use once_cell::sync::Lazy;
use regex::Regex;

pub const REDACTION_MARKER: &str = "[REDACTED]";

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[\w.%-]+@[\w.-]+\.[A-Za-z]{2,6}\b").expect("static regex"));
static LONG_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{5,}").expect("static regex"));
static HANDLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[\w.-]+@[\w.-]+\b").expect("static regex"));

/// Redact emails, digit runs of 5+ (accounts, phones) and `local@domain` handles, in that order
pub fn scrub_pii(text: &str) -> String {
    let text = EMAIL.replace_all(text, REDACTION_MARKER);
    let text = LONG_DIGITS.replace_all(&text, REDACTION_MARKER);
    HANDLE.replace_all(&text, REDACTION_MARKER).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert_eq!(scrub_pii("Contact jane.doe@example.com now"), "Contact [REDACTED] now");
    }

    #[test]
    fn test_long_digits() {
        assert_eq!(scrub_pii("Account 123456789 and PIN 1234"), "Account [REDACTED] and PIN 1234");
    }

    #[test]
    fn test_upi_handle() {
        assert_eq!(scrub_pii("Paid to merchant@okbank yesterday"), "Paid to [REDACTED] yesterday");
    }

    #[test]
    fn test_clean_text_untouched() {
        let text = "Velocity above 7 transactions in 24 hours is unusual.";
        assert_eq!(scrub_pii(text), text);
    }
}
