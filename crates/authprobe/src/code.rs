//! One-time email verification codes.

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of digits (and input boxes) in a verification code
pub const CODE_LENGTH: usize = 6;

/// A six-digit verification code.
///
/// Construction validates, so every value holds exactly [`CODE_LENGTH`]
/// ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Parse a code
    ///
    /// # Errors
    ///
    /// Returns `InvalidCode` unless `raw` is exactly six ASCII digits
    pub fn parse(raw: &str) -> ProbeResult<Self> {
        if raw.len() != CODE_LENGTH {
            return Err(ProbeError::InvalidCode {
                message: format!("expected {CODE_LENGTH} digits, got {raw:?}"),
            });
        }
        if let Some(bad) = raw.chars().find(|c| !c.is_ascii_digit()) {
            return Err(ProbeError::InvalidCode {
                message: format!("{bad:?} is not a digit"),
            });
        }
        Ok(Self(raw.to_string()))
    }

    /// The code as a string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digits paired with their 1-based box position
    pub fn positions(&self) -> impl Iterator<Item = (usize, char)> + '_ {
        self.0.chars().enumerate().map(|(i, c)| (i + 1, c))
    }
}

impl Default for VerificationCode {
    /// `000000`, which no issued code is expected to equal
    fn default() -> Self {
        Self("0".repeat(CODE_LENGTH))
    }
}

impl FromStr for VerificationCode {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VerificationCode {
    type Error = ProbeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VerificationCode> for String {
    fn from(code: VerificationCode) -> Self {
        code.0
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_valid() {
        let code: VerificationCode = "012345".parse().unwrap();
        assert_eq!(code.as_str(), "012345");
        assert_eq!(code.to_string(), "012345");
    }

    #[test]
    fn test_parse_rejects_length() {
        assert!(VerificationCode::parse("12345").is_err());
        assert!(VerificationCode::parse("1234567").is_err());
        assert!(VerificationCode::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_non_digits() {
        let err = VerificationCode::parse("12a456").unwrap_err();
        assert!(err.to_string().contains("'a'"));
        // multi-byte digits are not ASCII digits
        assert!(VerificationCode::parse("١٢٣٤٥٦").is_err());
    }

    #[test]
    fn test_positions_are_one_based() {
        let code = VerificationCode::parse("908172").unwrap();
        let positions: Vec<_> = code.positions().collect();
        assert_eq!(positions.first(), Some(&(1, '9')));
        assert_eq!(positions.last(), Some(&(6, '2')));
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let code: VerificationCode = serde_json::from_str("\"111111\"").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"111111\"");
        assert!(serde_json::from_str::<VerificationCode>("\"11\"").is_err());
    }

    proptest! {
        #[test]
        fn any_six_digits_parse(raw in "[0-9]{6}") {
            let code = VerificationCode::parse(&raw).unwrap();
            prop_assert_eq!(code.positions().count(), CODE_LENGTH);
        }

        #[test]
        fn other_lengths_fail(raw in "[0-9]{0,5}|[0-9]{7,12}") {
            prop_assert!(VerificationCode::parse(&raw).is_err());
        }
    }
}
