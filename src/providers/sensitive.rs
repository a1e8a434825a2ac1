//! Sensitive-data scan shared by the email and search providers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SSN: Regex = Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("valid SSN pattern");
    static ref CARD_NUMBER: Regex =
        Regex::new(r"\b(?:\d[ -]*?){13,16}\b").expect("valid card pattern");
    static ref PASSWORD: Regex =
        Regex::new(r"(?i)password\s*[:=]\s*\S+").expect("valid password pattern");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensitiveKind {
    SocialSecurityNumber,
    CardNumber,
    Password,
}

impl SensitiveKind {
    pub fn describe(&self) -> &'static str {
        match self {
            SensitiveKind::SocialSecurityNumber => "a social security number",
            SensitiveKind::CardNumber => "a card number",
            SensitiveKind::Password => "a password",
        }
    }
}

/// First kind of sensitive data found in `text`, if any
pub fn scan(text: &str) -> Option<SensitiveKind> {
    if SSN.is_match(text) {
        Some(SensitiveKind::SocialSecurityNumber)
    } else if CARD_NUMBER.is_match(text) {
        Some(SensitiveKind::CardNumber)
    } else if PASSWORD.is_match(text) {
        Some(SensitiveKind::Password)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_each_kind() {
        assert_eq!(
            scan("my ssn is 123-45-6789"),
            Some(SensitiveKind::SocialSecurityNumber)
        );
        assert_eq!(
            scan("card 4111 1111 1111 1111 exp 12/29"),
            Some(SensitiveKind::CardNumber)
        );
        assert_eq!(scan("Password: hunter2"), Some(SensitiveKind::Password));
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(scan("latest rust release notes"), None);
        assert_eq!(scan("meeting at 10:30 on 2024-05-01"), None);
    }
}
