// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use regex::Regex;
use std::sync::LazyLock;

pub const MOBILE_MESSAGE: &str = "Mobile number must be between 8 and 10 digits.";
pub const EMAIL_MESSAGE: &str = "Please enter a valid email address.";
pub const NAME_MESSAGE: &str = "Please enter a valid Name.";

static MOBILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{8,10}$").expect("mobile pattern compiles"));
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));
// ASCII letters only: "John Doe" and "Anne-Marie" are rejected.
static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+$").expect("name pattern compiles"));

/// Outcome of checking one raw field value. `message` is empty when valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub message: &'static str,
}

impl Validation {
    const fn check(valid: bool, message: &'static str) -> Self {
        if valid {
            Self { valid, message: "" }
        } else {
            Self { valid, message }
        }
    }
}

pub type Validator = fn(&str) -> Validation;

pub fn validate_mobile(raw: &str) -> Validation {
    Validation::check(MOBILE_PATTERN.is_match(raw), MOBILE_MESSAGE)
}

pub fn validate_email(raw: &str) -> Validation {
    Validation::check(EMAIL_PATTERN.is_match(raw), EMAIL_MESSAGE)
}

pub fn validate_name(raw: &str) -> Validation {
    Validation::check(NAME_PATTERN.is_match(raw), NAME_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::{
        EMAIL_MESSAGE, MOBILE_MESSAGE, NAME_MESSAGE, validate_email, validate_mobile,
        validate_name,
    };

    #[test]
    fn mobile_requires_eight_to_ten_digits() {
        for input in ["12345678", "123456789", "1234567890", "36112233"] {
            assert!(validate_mobile(input).valid, "input {input}");
            assert!(validate_mobile(input).message.is_empty(), "input {input}");
        }
        for input in ["", "1234567", "12345678901", "1234a678", " 12345678", "12345678\n"] {
            let result = validate_mobile(input);
            assert!(!result.valid, "input {input:?}");
            assert_eq!(result.message, MOBILE_MESSAGE);
        }
    }

    #[test]
    fn mobile_rejects_non_ascii_digits() {
        assert!(!validate_mobile("١٢٣٤٥٦٧٨").valid);
    }

    #[test]
    fn email_requires_local_domain_and_tld() {
        for input in ["a@b.com", "first.last@mail.example.bh", "x@y.z"] {
            assert!(validate_email(input).valid, "input {input}");
        }
        for input in ["", "a@b", "a b@c.com", "a@b .com", "@b.com", "a@@b.com", "a@b.com "] {
            let result = validate_email(input);
            assert!(!result.valid, "input {input:?}");
            assert_eq!(result.message, EMAIL_MESSAGE);
        }
    }

    #[test]
    fn name_accepts_only_ascii_letters() {
        assert!(validate_name("John").valid);
        assert!(validate_name("layla").valid);

        for input in ["", "John Doe", "Anne-Marie", "R2D2", "José"] {
            let result = validate_name(input);
            assert!(!result.valid, "input {input:?}");
            assert_eq!(result.message, NAME_MESSAGE);
        }
    }

    #[test]
    fn validators_never_panic_on_odd_input() {
        let long = "9".repeat(10_000);
        for input in ["\u{0}", "\u{feff}", long.as_str(), "@.@."] {
            let _ = validate_mobile(input);
            let _ = validate_email(input);
            let _ = validate_name(input);
        }
    }
}
