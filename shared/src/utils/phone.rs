//! Phone number utilities
//!
//! Phones are accepted only in strict E.164 form: a leading `+` followed by
//! 8 to 15 digits, the first of which is non-zero. No normalization happens
//! here; anything else is rejected at the boundary.

use once_cell::sync::Lazy;
use regex::Regex;

static E164_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+[1-9][0-9]{7,14}$").expect("E.164 pattern is valid")
});

/// Check if a phone number is in strict E.164 format
pub fn is_valid_e164(phone: &str) -> bool {
    E164_REGEX.is_match(phone)
}

/// Mask a phone number for logs (e.g. +14****0123)
pub fn mask_phone_number(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() >= 8 {
        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}****{}", head, tail)
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_e164_numbers() {
        assert!(is_valid_e164("+14155550123"));
        assert!(is_valid_e164("+8613812345678"));
        assert!(is_valid_e164("+61412345678"));
        // 8 digits is the shortest accepted form
        assert!(is_valid_e164("+12345678"));
        // 15 digits is the longest
        assert!(is_valid_e164("+123456789012345"));
    }

    #[test]
    fn test_invalid_e164_numbers() {
        assert!(!is_valid_e164("14155550123"));
        assert!(!is_valid_e164("+04155550123"));
        assert!(!is_valid_e164("+1234567"));
        assert!(!is_valid_e164("+1234567890123456"));
        assert!(!is_valid_e164("+1 415 555 0123"));
        assert!(!is_valid_e164("+1-415-555-0123"));
        assert!(!is_valid_e164(""));
        assert!(!is_valid_e164("+"));
    }

    #[test]
    fn test_mask_phone_number() {
        assert_eq!(mask_phone_number("+14155550123"), "+14****0123");
        assert_eq!(mask_phone_number("+12"), "****");
    }
}
