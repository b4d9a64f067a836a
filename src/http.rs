//! HTTP client with cookie management for the identity server.
//!
//! This module provides a wrapper around `reqwest::Client` that adds:
//! * A cookie jar shared with the credential [`handoff`](crate::handoff)
//! * Consistent timeouts and headers
//! * JSON body parsing with logging of what came back
//!
//! # Example
//!
//! ```rust
//! use profile_viewer::http::Client;
//!
//! let client = Client::with_cookies(&config, handoff.cookie_jar())?;
//! let request = client.request(Method::GET, url, None::<String>);
//! let response = client.execute(request).await?;
//! ```

use std::{fmt::Debug, future::Future, sync::Arc, time::Duration};

use futures_util::TryFutureExt;
use reqwest::{
    self,
    header::{HeaderValue, ACCEPT_LANGUAGE},
    Body, Method, Url,
};
use reqwest_cookie_store::CookieStoreMutex;
use serde::Deserialize;

use crate::{config::Config, error::Result};

/// HTTP client with optional cookie support.
pub struct Client {
    inner: reqwest::Client,
}

impl Client {
    /// Duration to keep idle connections alive.
    const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Duration to wait for individual network reads.
    const READ_TIMEOUT: Duration = Duration::from_secs(10);

    /// Duration after which a whole request is abandoned.
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a new client with optional cookie storage.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built, for example because
    /// no TLS backend could be initialized.
    pub fn new(config: &Config, cookie_jar: Option<Arc<CookieStoreMutex>>) -> Result<Self> {
        // Not having `Accept-Language` set is non-fatal.
        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(lang) = HeaderValue::from_str(&config.app_lang) {
            headers.insert(ACCEPT_LANGUAGE, lang);
        }

        let mut http_client = reqwest::Client::builder()
            .tcp_keepalive(Self::KEEPALIVE_TIMEOUT)
            .read_timeout(Self::READ_TIMEOUT)
            .timeout(Self::REQUEST_TIMEOUT)
            .default_headers(headers)
            .user_agent(&config.user_agent);

        if let Some(jar) = cookie_jar {
            http_client = http_client.cookie_provider(jar);
        }

        Ok(Self {
            inner: http_client.build()?,
        })
    }

    /// Creates a new client that stores and sends cookies through `cookie_jar`.
    ///
    /// # Errors
    ///
    /// Returns error if client creation fails.
    pub fn with_cookies(config: &Config, cookie_jar: Arc<CookieStoreMutex>) -> Result<Self> {
        Self::new(config, Some(cookie_jar))
    }

    /// Builds a request with specified method, URL and optional body.
    pub fn request<U, T>(&self, method: Method, url: U, body: Option<T>) -> reqwest::Request
    where
        U: Into<Url>,
        T: Into<Body>,
    {
        let mut request = reqwest::Request::new(method, url.into());
        let body_mut = request.body_mut();
        *body_mut = body.map(Into::into);

        request
    }

    /// Executes a request.
    ///
    /// # Errors
    ///
    /// Returns error if the connection fails, the request times out or a
    /// redirect loop is detected. Error statuses are not errors here; they
    /// are for the caller to interpret.
    pub fn execute(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = Result<reqwest::Response>> + '_ {
        self.inner.execute(request).map_err(Into::into)
    }
}

/// Parses and logs a JSON response body.
///
/// # Arguments
///
/// * `body` - Response body text to parse
/// * `origin` - Description of the endpoint for logging
///
/// # Errors
///
/// Returns error if the body is not valid JSON or does not match `T`.
///
/// # Logging
///
/// * Success: logs the parsed structure at TRACE level
/// * Mismatched JSON: logs the JSON value at TRACE level
/// * Invalid JSON: logs at ERROR level
pub fn json<T>(body: &str, origin: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Debug,
{
    match serde_json::from_str(body) {
        Ok(result) => {
            trace!("{origin}: {result:#?}");
            Ok(result)
        }
        Err(e) => {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
                trace!("{origin}: {json:#?}");
            } else {
                error!("{origin}: failed parsing response ({e:?})");
            }
            Err(e.into())
        }
    }
}
