//! Shared validation patterns

use once_cell::sync::Lazy;
use regex::Regex;

/// `HH:mm`, 24-hour clock
pub static TIME_OF_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("valid time regex"));

/// Loose phone number: optional leading +, digits and common separators
pub static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 ().-]{5,19}$").expect("valid phone regex"));

/// Strip separators so numbers compare and send consistently
pub fn normalize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_of_day() {
        assert!(TIME_OF_DAY_RE.is_match("09:00"));
        assert!(TIME_OF_DAY_RE.is_match("23:59"));
        assert!(!TIME_OF_DAY_RE.is_match("24:00"));
        assert!(!TIME_OF_DAY_RE.is_match("9:00"));
    }

    #[test]
    fn test_phone() {
        assert!(PHONE_RE.is_match("+33 6 12 34 56 78"));
        assert!(!PHONE_RE.is_match("call me"));
        assert_eq!(normalize_phone("+33 (6) 12-34"), "+3361234");
    }
}
