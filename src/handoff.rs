//! One-shot credential handoff.
//!
//! Right after a login redirect, the login flow leaves the fresh token in a
//! short-lived cookie (`temp_token` by default). On the next page load that
//! cookie is a pending credential: it is read once, promoted into persistent
//! storage by [`AuthStore::init`](crate::auth::AuthStore::init), and expired
//! on the spot so that it can never be promoted again.
//!
//! The cookie jar is shared with the HTTP client, so a `Set-Cookie` from the
//! login flow lands here as well as a cookie deposited by hand.

use std::sync::Arc;

use cookie_store::CookieStore;
use reqwest_cookie_store::CookieStoreMutex;
use url::Url;

use crate::{
    error::{Error, Result},
    token::Token,
};

pub struct Handoff {
    cookie_jar: Arc<CookieStoreMutex>,
    origin: Url,
    cookie_name: String,
}

impl Handoff {
    /// Creates a handoff reading cookie `cookie_name` as sent to `origin`.
    pub fn new(cookie_jar: Arc<CookieStoreMutex>, origin: Url, cookie_name: &str) -> Self {
        Self {
            cookie_jar,
            origin,
            cookie_name: cookie_name.to_owned(),
        }
    }

    /// Creates a handoff with a fresh, empty cookie jar.
    pub fn with_empty_jar(origin: Url, cookie_name: &str) -> Self {
        let cookie_jar = Arc::new(CookieStoreMutex::new(CookieStore::default()));
        Self::new(cookie_jar, origin, cookie_name)
    }

    /// The jar backing this handoff, for sharing with an HTTP client.
    #[must_use]
    pub fn cookie_jar(&self) -> Arc<CookieStoreMutex> {
        Arc::clone(&self.cookie_jar)
    }

    /// Deposits a cookie as if the origin had sent it in a `Set-Cookie`
    /// header, e.g. `temp_token=abc123; Path=/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cookie cannot be parsed or does not belong to
    /// the origin.
    pub fn deposit(&self, cookie: &str) -> Result<()> {
        let mut jar = self.cookie_jar.lock()?;
        jar.parse(cookie, &self.origin)?;
        Ok(())
    }

    /// Whether a pending credential is waiting to be consumed.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        let Ok(jar) = self.cookie_jar.lock() else {
            return false;
        };

        let pending = jar
            .get_request_values(&self.origin)
            .any(|(name, _)| name == self.cookie_name);
        pending
    }

    /// Consumes the pending credential.
    ///
    /// Reads the cookie and expires it while holding the jar's lock, so two
    /// concurrent calls can never both observe the same credential. The
    /// cookie is expired even when its value is empty; an empty value yields
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the jar is poisoned or the cookie cannot be
    /// expired.
    pub fn take(&self) -> Result<Option<Token>> {
        let mut jar = self.cookie_jar.lock()?;

        // Cookies are keyed by domain, path and name, so each match has to
        // be removed under the key it was stored with.
        let mut value = None;
        let mut keys = Vec::new();
        for cookie in jar.iter_unexpired() {
            if cookie.name() != self.cookie_name || !cookie.matches(&self.origin) {
                continue;
            }
            value.get_or_insert_with(|| cookie.value().to_owned());
            keys.push((String::from(&cookie.domain), String::from(&cookie.path)));
        }

        let Some(value) = value else {
            return Ok(None);
        };

        for (domain, path) in &keys {
            jar.remove(domain, path, &self.cookie_name);
        }

        // The cookie must be gone before the credential is handed out.
        if jar
            .get_request_values(&self.origin)
            .any(|(name, _)| name == self.cookie_name)
        {
            return Err(Error::internal(format!(
                "could not expire {} cookie",
                self.cookie_name
            )));
        }

        debug!("consumed {} cookie", self.cookie_name);
        if value.is_empty() {
            return Ok(None);
        }

        Ok(Some(Token::new(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handoff() -> Handoff {
        let origin = Url::parse("https://identity.example.com/").unwrap();
        Handoff::with_empty_jar(origin, "temp_token")
    }

    #[test]
    fn takes_cookie_exactly_once() {
        let handoff = handoff();
        handoff.deposit("temp_token=abc123; Path=/").unwrap();
        assert!(handoff.is_pending());

        assert_eq!(handoff.take().unwrap(), Some(Token::new("abc123")));
        assert!(!handoff.is_pending());
        assert_eq!(handoff.take().unwrap(), None);
    }

    #[test]
    fn leaves_other_cookies_alone() {
        let handoff = handoff();
        handoff.deposit("lang=en; Path=/").unwrap();
        handoff.deposit("temp_token=abc123; Path=/").unwrap();

        handoff.take().unwrap();

        let jar = handoff.cookie_jar();
        let jar = jar.lock().unwrap();
        let origin = Url::parse("https://identity.example.com/").unwrap();
        let names: Vec<_> = jar
            .get_request_values(&origin)
            .map(|(name, _)| name.to_owned())
            .collect();
        assert_eq!(names, vec!["lang".to_owned()]);
    }

    #[test]
    fn empty_cookie_is_expired_but_yields_nothing() {
        let handoff = handoff();
        handoff.deposit("temp_token=; Path=/").unwrap();

        assert_eq!(handoff.take().unwrap(), None);
        assert!(!handoff.is_pending());
    }

    #[test]
    fn takes_domain_cookie() {
        let handoff = handoff();
        handoff
            .deposit("temp_token=abc123; Domain=example.com; Path=/")
            .unwrap();

        assert_eq!(handoff.take().unwrap(), Some(Token::new("abc123")));
        assert!(!handoff.is_pending());
    }

    #[test]
    fn takes_cookie_scoped_below_root() {
        let origin = Url::parse("https://identity.example.com/app/").unwrap();
        let handoff = Handoff::with_empty_jar(origin, "temp_token");
        handoff.deposit("temp_token=abc123").unwrap();
        assert!(handoff.is_pending());

        assert_eq!(handoff.take().unwrap(), Some(Token::new("abc123")));
        assert!(!handoff.is_pending());
        assert_eq!(handoff.take().unwrap(), None);
    }

    #[test]
    fn nothing_pending_without_cookie() {
        let handoff = handoff();
        assert!(!handoff.is_pending());
        assert_eq!(handoff.take().unwrap(), None);
    }
}
