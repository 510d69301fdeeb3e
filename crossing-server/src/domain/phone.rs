//! Subscriber phone numbers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Shortest and longest digit runs accepted (E.164 caps numbers at 15).
const MIN_DIGITS: usize = 7;
const MAX_DIGITS: usize = 15;

/// A phone number in E.164-like form: an optional leading `+` followed by
/// 7 to 15 ASCII digits.
///
/// # Examples
///
/// ```
/// use crossing_server::domain::PhoneNumber;
///
/// let phone = PhoneNumber::parse("+12815550100").unwrap();
/// assert_eq!(phone.as_str(), "+12815550100");
///
/// // Surrounding whitespace is trimmed
/// assert!(PhoneNumber::parse("  +12815550100 ").is_ok());
///
/// // Letters and empty strings are rejected
/// assert!(PhoneNumber::parse("call me").is_err());
/// assert!(PhoneNumber::parse("").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse and validate a phone number.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::InvalidPhoneNumber("must not be empty"));
        }

        let digits = s.strip_prefix('+').unwrap_or(s);
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::InvalidPhoneNumber(
                "must contain only digits after an optional '+'",
            ));
        }
        if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits.len()) {
            return Err(DomainError::InvalidPhoneNumber("must have 7 to 15 digits"));
        }

        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhoneNumber({})", self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}
