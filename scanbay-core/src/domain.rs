use crate::error::{Result, ScanError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One-or-more dot-separated labels of letters, digits, and hyphens,
/// ending in an alphabetic top-level label of at least two characters.
static DOMAIN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}$").expect("domain regex should compile"));

/// A validated scan target. The only way to construct one is through
/// [`Domain::parse`], so holding a `Domain` means the format check has
/// already passed. Deserialization routes through the same check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Domain(String);

impl Domain {
    pub fn parse(input: &str) -> Result<Self> {
        let candidate = input.trim();
        if DOMAIN_REGEX.is_match(candidate) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(ScanError::InvalidDomain(format!(
                "{input:?} is not a valid domain name"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Domain {
    type Error = ScanError;

    fn try_from(value: String) -> Result<Self> {
        Domain::parse(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_two_label_domain() {
        assert!(Domain::parse("example.com").is_ok());
    }

    #[test]
    fn accepts_short_multi_label_domain() {
        assert!(Domain::parse("a.b.co").is_ok());
    }

    #[test]
    fn accepts_subdomains_with_digits_and_hyphens() {
        assert!(Domain::parse("scan-01.staging.example.org").is_ok());
    }

    #[test]
    fn rejects_domain_without_a_dot() {
        assert!(Domain::parse("example").is_err());
    }

    #[test]
    fn rejects_domain_with_whitespace() {
        assert!(Domain::parse("exa mple.com").is_err());
    }

    #[test]
    fn rejects_single_character_tld() {
        assert!(Domain::parse("example.c").is_err());
    }

    #[test]
    fn rejects_numeric_tld() {
        assert!(Domain::parse("example.123").is_err());
    }

    #[test]
    fn rejects_empty_and_dot_only_input() {
        assert!(Domain::parse("").is_err());
        assert!(Domain::parse(".").is_err());
        assert!(Domain::parse(".com").is_err());
    }

    #[test]
    fn rejects_trailing_dot() {
        assert!(Domain::parse("example.com.").is_err());
    }

    #[test]
    fn rejects_path_and_scheme_noise() {
        assert!(Domain::parse("https://example.com").is_err());
        assert!(Domain::parse("example.com/path").is_err());
        assert!(Domain::parse("../etc/passwd").is_err());
    }

    #[test]
    fn trims_surrounding_whitespace_before_validating() {
        let domain = Domain::parse("  example.com  ").unwrap();
        assert_eq!(domain.as_str(), "example.com");
    }

    #[test]
    fn deserialization_rejects_invalid_domains() {
        assert!(serde_json::from_str::<Domain>(r#""example""#).is_err());
        assert!(serde_json::from_str::<Domain>(r#""example.com; rm -rf /""#).is_err());
    }

    #[test]
    fn deserialization_accepts_valid_domains() {
        let domain: Domain = serde_json::from_str(r#""example.com""#).unwrap();
        assert_eq!(domain.as_str(), "example.com");
    }

    #[test]
    fn serializes_as_a_bare_string() {
        let domain = Domain::parse("example.com").unwrap();
        assert_eq!(serde_json::to_string(&domain).unwrap(), r#""example.com""#);
    }
}
