//! Session token lifecycle and authenticated requests.
//!
//! [`AuthStore`] is the single source of truth for the bearer token and the
//! only place that decides the page must go to the login route. It:
//!
//! * Promotes a one-shot [`Handoff`] credential into persistent storage
//! * Reads, writes and clears the token under one storage key
//! * Issues requests with the `Authorization` header attached
//! * Clears the token and navigates to login when the server answers 401
//!
//! # Example
//!
//! ```rust
//! let auth = AuthStore::new(&config, storage, navigator, handoff)?;
//! if auth.init()? {
//!     let profile: Option<UserProfile> = auth
//!         .fetch_with_auth(config.profile_url()?, RequestOptions::default())
//!         .await?;
//! }
//! ```

use std::{fmt::Debug, sync::Arc};

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method, StatusCode, Url,
};
use serde::Deserialize;

use crate::{
    config::Config,
    error::{Error, Result},
    handoff::Handoff,
    http::{self, Client as HttpClient},
    navigation::Navigator,
    storage::Storage,
    token::Token,
};

/// Caller-supplied request settings for [`AuthStore::fetch_with_auth`].
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// Defaults to `GET`.
    pub method: Option<Method>,

    /// Merged on top of the authentication headers, one header name at a
    /// time. A header given here replaces the default of the same name;
    /// every other default is kept.
    pub headers: HeaderMap,

    pub body: Option<String>,
}

impl RequestOptions {
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    #[must_use]
    pub fn header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

pub struct AuthStore {
    storage: Arc<dyn Storage>,
    navigator: Arc<dyn Navigator>,
    handoff: Handoff,
    http_client: HttpClient,

    token_key: String,
    login_url: Url,
}

impl AuthStore {
    /// Creates a session over `storage` that navigates through `navigator`
    /// and sends cookies from the `handoff` jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the login URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(
        config: &Config,
        storage: Arc<dyn Storage>,
        navigator: Arc<dyn Navigator>,
        handoff: Handoff,
    ) -> Result<Self> {
        let login_url = config.login_url()?;
        let http_client = HttpClient::with_cookies(config, handoff.cookie_jar())?;

        Ok(Self {
            storage,
            navigator,
            handoff,
            http_client,
            token_key: config.token_key.clone(),
            login_url,
        })
    }

    /// Boots the session on page load.
    ///
    /// Promotes a pending handoff credential into persistent storage, then
    /// checks for a token. Without one, navigates to the login page and
    /// returns `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the handoff cookie cannot be consumed or the
    /// promoted token cannot be stored.
    pub fn init(&self) -> Result<bool> {
        if let Some(token) = self.handoff.take()? {
            info!("promoting handed off token into storage");
            self.set_token(&token)?;
        }

        if !self.is_authenticated() {
            debug!("no token stored");
            self.redirect_to_login();
            return Ok(false);
        }

        Ok(true)
    }

    #[must_use]
    pub fn get_token(&self) -> Option<Token> {
        self.storage.get_item(&self.token_key).map(Token::from)
    }

    /// Stores `token`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    pub fn set_token(&self, token: &Token) -> Result<()> {
        self.storage.set_item(&self.token_key, token.as_str())
    }

    /// Removes the stored token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    pub fn remove_token(&self) -> Result<()> {
        self.storage.remove_item(&self.token_key)
    }

    /// Whether a non-empty token is stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.get_token().is_some_and(|token| !token.is_empty())
    }

    /// Clears the token and navigates to the login page. Calling this
    /// without a session is harmless.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be removed. Navigation happens
    /// regardless.
    pub fn logout(&self) -> Result<()> {
        info!("logging out");
        let result = self.remove_token();
        self.redirect_to_login();
        result
    }

    /// Headers for an authenticated JSON request.
    ///
    /// Without a stored token the `Authorization` value is `Bearer null`;
    /// check [`is_authenticated`](Self::is_authenticated) first.
    ///
    /// # Errors
    ///
    /// Returns an error if the token contains characters that are not
    /// allowed in a header value.
    pub fn auth_headers(&self) -> Result<HeaderMap> {
        let token = self.get_token();
        let bearer = format!("Bearer {}", token.as_deref().unwrap_or("null"));

        let mut authorization = HeaderValue::from_str(&bearer)?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.try_insert(AUTHORIZATION, authorization)?;
        headers.try_insert(CONTENT_TYPE, HeaderValue::from_static("application/json"))?;

        Ok(headers)
    }

    /// Issues an authenticated request and parses the JSON response.
    ///
    /// Without a token, navigates to the login page and returns `Ok(None)`
    /// without sending anything.
    ///
    /// # Errors
    ///
    /// * `Unauthorized` if the server answers 401; the token has been
    ///   removed and the page sent to login by then
    /// * `Network` for any other non-2xx status or a transport failure
    /// * `InvalidArgument` if the body does not parse as `T`
    pub async fn fetch_with_auth<T>(&self, url: Url, options: RequestOptions) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de> + Debug,
    {
        if !self.is_authenticated() {
            debug!("{}", Error::unauthenticated("no token, request not sent"));
            self.redirect_to_login();
            return Ok(None);
        }

        match self.send(url, options).await {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                error!("API call failed: {e}");
                Err(e)
            }
        }
    }

    async fn send<T>(&self, url: Url, options: RequestOptions) -> Result<T>
    where
        T: for<'de> Deserialize<'de> + Debug,
    {
        let RequestOptions {
            method,
            headers,
            body,
        } = options;

        let method = method.unwrap_or(Method::GET);
        debug!("{method} {url}");

        let mut request = self.http_client.request(method, url.clone(), body);

        let request_headers = request.headers_mut();
        request_headers.extend(self.auth_headers()?);
        // `HeaderMap::extend` replaces every value of a name it brings in.
        request_headers.extend(headers);

        // Whatever goes wrong on the wire is a network failure to callers.
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| Error::network(e.error))?;
        let body = self.handle_response(response).await?;
        http::json(&body, url.path())
    }

    /// Checks the response status and returns the body text.
    ///
    /// # Errors
    ///
    /// On 401, removes the token, navigates to the login page and then
    /// returns `Unauthorized`. Any other non-2xx status is `Network` and
    /// leaves the token alone.
    pub async fn handle_response(&self, response: reqwest::Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                warn!("token rejected by server");
                if let Err(e) = self.remove_token() {
                    error!("could not remove rejected token: {e}");
                }
                self.redirect_to_login();
                return Err(Error::unauthorized("Unauthorized"));
            }

            return Err(Error::network(format!(
                "Network response was not ok: {status}"
            )));
        }

        response.text().await.map_err(Error::network)
    }

    fn redirect_to_login(&self) {
        self.navigator.navigate(&self.login_url);
    }

    #[must_use]
    pub fn login_url(&self) -> &Url {
        &self.login_url
    }
}
