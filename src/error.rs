//! Error handling for profile-viewer.
//!
//! Provides a unified error type that carries a coarse [`ErrorKind`] next to
//! the underlying error, so that callers can decide on recovery by category
//! instead of by concrete type.
//!
//! # Error Categories
//!
//! * Session failures: no token at all ([`ErrorKind::Unauthenticated`]) or a
//!   token the server refused ([`ErrorKind::Unauthorized`])
//! * Remote failures: unexpected status codes and transport errors
//!   ([`ErrorKind::Network`], [`ErrorKind::DeadlineExceeded`])
//! * Local failures: configuration, storage and decoding problems
//!
//! # Example
//!
//! ```rust
//! use profile_viewer::error::{Error, ErrorKind, Result};
//!
//! fn check(status: u16) -> Result<()> {
//!     if status == 401 {
//!         return Err(Error::unauthorized("token rejected"));
//!     }
//!     Ok(())
//! }
//!
//! let err = check(401).unwrap_err();
//! assert_eq!(err.kind, ErrorKind::Unauthorized);
//! ```

use std::fmt;
use thiserror::Error;

/// Main error type combining error kind and details.
#[derive(Debug)]
pub struct Error {
    /// Classification of the error
    pub kind: ErrorKind,

    /// Details of the underlying error
    pub error: Box<dyn std::error::Error + Send + Sync>,
}

impl Error {
    /// Attempts to downcast the underlying error to a concrete type.
    ///
    /// # Returns
    /// * `Some(&E)` - If the underlying error is of type `E`
    /// * `None` - If the underlying error is not of type `E`
    #[must_use]
    pub fn downcast<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        self.error.downcast_ref::<E>()
    }

    /// Whether the server refused the session token.
    ///
    /// The token has already been cleared and navigation to the login page
    /// is underway when this is `true`.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }
}

/// Standard result type for profile-viewer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories.
///
/// The first three variants are the session outcomes the page reacts to.
/// The remaining ones classify local failures.
#[expect(clippy::module_name_repetitions)]
#[derive(Clone, Copy, Debug, Eq, Error, Hash, Ord, PartialEq, PartialOrd)]
pub enum ErrorKind {
    /// No token is stored. Resolved by navigating to the login page.
    #[error("not authenticated")]
    Unauthenticated,

    /// HTTP 401: the server rejected the token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Any other non-2xx response or a transport failure.
    #[error("network error")]
    Network,

    /// Request or response took too long.
    #[error("operation timed out")]
    DeadlineExceeded,

    /// Malformed input: configuration, headers, response bodies.
    #[error("invalid argument specified")]
    InvalidArgument,

    /// A file or entry does not exist.
    #[error("not found")]
    NotFound,

    /// Access to a local resource was refused.
    #[error("permission denied")]
    PermissionDenied,

    /// Broken invariant inside this crate.
    #[error("internal error")]
    Internal,

    #[error("unknown error")]
    Unknown,
}

impl Error {
    /// Creates a new error with specified kind and details.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let err = Error::new(ErrorKind::NotFound, "storage file missing");
    /// assert_eq!(err.kind, ErrorKind::NotFound);
    /// ```
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self {
            kind,
            error: error.into(),
        }
    }

    /// Creates an error for a missing session token.
    pub fn unauthenticated<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Unauthenticated, error)
    }

    /// Creates an error for a token the server refused with HTTP 401.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let err = Error::unauthorized("Unauthorized");
    /// assert!(err.is_unauthorized());
    /// ```
    pub fn unauthorized<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Unauthorized, error)
    }

    /// Creates an error for unexpected responses and transport failures.
    pub fn network<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Network, error)
    }

    /// Creates an error for operations that exceeded their deadline.
    pub fn deadline_exceeded<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::DeadlineExceeded, error)
    }

    /// Creates an error for malformed input.
    ///
    /// Use when configuration values, header values or response bodies
    /// cannot be interpreted.
    pub fn invalid_argument<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::InvalidArgument, error)
    }

    pub fn not_found<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::NotFound, error)
    }

    pub fn permission_denied<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::PermissionDenied, error)
    }

    /// Creates an error for internal errors.
    ///
    /// Use for unexpected internal errors that shouldn't occur during normal
    /// operation, like a poisoned lock.
    pub fn internal<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Internal, error)
    }

    pub fn unknown<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Unknown, error)
    }
}

/// Formats the error for display.
///
/// Shows the underlying error message. The kind is left out because the
/// page shows these to users and the message already says what went wrong.
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error.as_ref())
    }
}

/// Converts I/O errors into appropriate error kinds.
///
/// Maps standard I/O errors to their closest equivalent:
/// * `NotFound` -> `NotFound`
/// * `PermissionDenied` -> `PermissionDenied`
/// * `TimedOut` -> `DeadlineExceeded`
/// * connection failures -> `Network`
/// * etc.
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind::*;
        match err.kind() {
            NotFound => Self::not_found(err),
            PermissionDenied => Self::permission_denied(err),
            AddrNotAvailable | ConnectionRefused | NotConnected | BrokenPipe
            | ConnectionReset | ConnectionAborted => Self::network(err),
            TimedOut => Self::deadline_exceeded(err),
            InvalidInput | InvalidData | UnexpectedEof => Self::invalid_argument(err),
            _ => Self::unknown(err),
        }
    }
}

/// Converts HTTP client errors into appropriate error kinds.
///
/// * Timeout errors -> `DeadlineExceeded`
/// * Decode errors -> `InvalidArgument`
/// * Builder errors -> `Internal`
/// * Everything else on the wire -> `Network`
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::deadline_exceeded(err);
        }

        if err.is_decode() {
            return Self::invalid_argument(err);
        }

        if err.is_builder() {
            return Self::internal(err);
        }

        Self::network(err)
    }
}

/// Converts JSON errors through IO error mapping.
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        std::io::Error::from(err).into()
    }
}

/// Converts TOML deserialization errors to `InvalidArgument`.
impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::invalid_argument(e)
    }
}

/// Converts TOML serialization errors to `Internal`.
impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Self::internal(e)
    }
}

/// Converts header size errors to `InvalidArgument`.
impl From<http::header::MaxSizeReached> for Error {
    fn from(e: http::header::MaxSizeReached) -> Self {
        Self::invalid_argument(e.to_string())
    }
}

/// Converts invalid header errors to `InvalidArgument`.
impl From<http::header::InvalidHeaderValue> for Error {
    fn from(e: http::header::InvalidHeaderValue) -> Self {
        Self::invalid_argument(e.to_string())
    }
}

/// Converts URL parsing errors to `InvalidArgument`.
impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::invalid_argument(e.to_string())
    }
}

/// Converts cookie store errors into appropriate error kinds.
///
/// * `Expired` -> `DeadlineExceeded`
/// * `DomainMismatch` -> `PermissionDenied`
/// * Others -> `InvalidArgument` (malformed cookie data)
impl From<cookie_store::CookieError> for Error {
    fn from(e: cookie_store::CookieError) -> Self {
        use cookie_store::CookieError::*;
        match e {
            Expired => Self::deadline_exceeded(e),
            DomainMismatch => Self::permission_denied(e),
            _ => Self::invalid_argument(e),
        }
    }
}

/// Converts mutex poisoning errors to `Internal`.
impl<T> From<std::sync::PoisonError<std::sync::MutexGuard<'_, T>>> for Error {
    fn from(e: std::sync::PoisonError<std::sync::MutexGuard<'_, T>>) -> Self {
        Self::internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_underlying_message() {
        let err = Error::unauthorized("Unauthorized");
        assert_eq!(err.to_string(), "Unauthorized");
        assert!(err.is_unauthorized());
    }

    #[test]
    fn maps_io_errors_by_kind() {
        let err = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.kind, ErrorKind::NotFound);

        let err = Error::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert_eq!(err.kind, ErrorKind::Network);
    }

    #[test]
    fn downcasts_to_source() {
        let err = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "oh no"));
        assert!(err.downcast::<std::io::Error>().is_some());
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn toml_errors_are_invalid_arguments() {
        let parsed = toml::from_str::<toml::Table>("key = ");
        let err = Error::from(parsed.unwrap_err());
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }
}
