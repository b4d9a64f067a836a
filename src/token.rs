//! Bearer token.
//!
//! The token is opaque to this crate: it is stored, sent and cleared, but
//! never parsed or validated. Validation happens on the server.

use std::{fmt, ops::Deref};

use veil::Redact;

/// An opaque bearer credential.
///
/// Debug output is redacted so that the token does not end up in logs.
/// [`Display`](fmt::Display) yields the raw value for use in headers.
#[derive(Clone, PartialEq, Eq, Hash, Redact)]
#[redact(all)]
pub struct Token(String);

impl Token {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Whether the token holds no characters at all.
    ///
    /// An empty token counts as no token.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Token {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Token {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Token {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_redacted() {
        let token = Token::new("abc123");
        assert!(!format!("{token:?}").contains("abc123"));
        assert_eq!(token.to_string(), "abc123");
    }
}
