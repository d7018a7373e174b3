//! Authentication tokens.

use std::fmt;
use std::time::SystemTime;

/// A credential plus the header field it is sent in.
///
/// A token with no value is legal: the client simply adds no header for it.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    header_field: String,
    value: Option<String>,
    valid: bool,
    expires_at: Option<SystemTime>,
}

impl Token {
    pub fn new(header_field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            header_field: header_field.into(),
            value: Some(value.into()),
            valid: true,
            expires_at: None,
        }
    }

    /// `Authorization: Bearer <access_token>`.
    pub fn bearer(access_token: impl AsRef<str>) -> Self {
        Self::new("Authorization", format!("Bearer {}", access_token.as_ref()))
    }

    /// A token for `header_field` that carries no value.
    pub fn empty(header_field: impl Into<String>) -> Self {
        Self {
            header_field: header_field.into(),
            value: None,
            valid: false,
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: SystemTime) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Same token, marked as no longer usable.
    pub fn invalidated(mut self) -> Self {
        self.valid = false;
        self
    }

    pub fn header_field(&self) -> &str {
        &self.header_field
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }

    /// Usable as-is: not invalidated, non-empty value, not past its expiry.
    pub fn is_valid(&self) -> bool {
        self.valid
            && self.value.as_deref().is_some_and(|v| !v.is_empty())
            && self.expires_at.map_or(true, |at| SystemTime::now() < at)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("header_field", &self.header_field)
            .field("value", &self.value.as_ref().map(|_| "<redacted>"))
            .field("valid", &self.valid)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn bearer_targets_authorization() {
        let token = Token::bearer("abc");
        assert_eq!(token.header_field(), "Authorization");
        assert_eq!(token.value(), Some("Bearer abc"));
        assert!(token.is_valid());
    }

    #[test]
    fn empty_and_blank_tokens_are_invalid() {
        assert!(!Token::empty("X-Api-Key").is_valid());
        assert!(Token::empty("X-Api-Key").value().is_none());
        assert!(!Token::new("X-Api-Key", "").is_valid());
    }

    #[test]
    fn expiry_and_invalidation() {
        let past = SystemTime::now() - Duration::from_secs(60);
        let future = SystemTime::now() + Duration::from_secs(3600);
        assert!(!Token::bearer("a").with_expiry(past).is_valid());
        assert!(Token::bearer("a").with_expiry(future).is_valid());
        assert!(!Token::bearer("a").invalidated().is_valid());
    }

    #[test]
    fn debug_redacts_value() {
        let rendered = format!("{:?}", Token::bearer("s3cret"));
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}
