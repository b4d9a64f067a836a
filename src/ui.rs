//! Profile page controller.
//!
//! Fetches the current user's profile through the [`AuthStore`], renders it
//! into the [`Page`] and reacts to the refresh and logout buttons.
//!
//! Refreshes are not coordinated: two refreshes in flight race and the one
//! that resolves last is what the page shows.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use reqwest::Url;

use crate::{
    auth::{AuthStore, RequestOptions},
    config::Config,
    error::Result,
    profile::UserProfile,
    render::{self, Button, Page},
};

pub struct ProfileController {
    auth: AuthStore,
    page: Arc<Page>,
    profile_url: Url,

    refresh_bound: AtomicBool,
    logout_bound: AtomicBool,
}

impl ProfileController {
    /// Alert shown when the profile could not be loaded for any reason other
    /// than a rejected token.
    pub const LOAD_FAILED: &'static str = "Failed to load user information";

    /// Creates a controller that owns the session `auth` and renders into
    /// `page`.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile URL is invalid.
    pub fn new(config: &Config, auth: AuthStore, page: Arc<Page>) -> Result<Self> {
        Ok(Self {
            auth,
            page,
            profile_url: config.profile_url()?,
            refresh_bound: AtomicBool::new(false),
            logout_bound: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Fetches the current user's profile.
    ///
    /// Yields `None` when there is no session; the page has been sent to the
    /// login route in that case and nothing should be rendered.
    ///
    /// # Errors
    ///
    /// `Unauthorized` when the server rejected the token, `Network` for other
    /// failed responses and transport errors.
    pub async fn fetch_profile(&self) -> Result<Option<UserProfile>> {
        self.auth
            .fetch_with_auth(self.profile_url.clone(), RequestOptions::default())
            .await
            .inspect_err(|e| error!("error fetching user info: {e}"))
    }

    /// Writes `profile` into the page.
    pub fn render(&self, profile: &UserProfile) {
        render::render(&self.page, profile);
        debug!("rendered profile");
    }

    /// Fetches and renders the profile.
    ///
    /// A rejected token is silent since the page is already on its way to
    /// the login route. Any other failure alerts the user.
    pub async fn refresh(&self) {
        match self.fetch_profile().await {
            Ok(Some(profile)) => self.render(&profile),
            Ok(None) => {}
            Err(e) if e.is_unauthorized() => {}
            Err(_) => self.page.alert(Self::LOAD_FAILED),
        }
    }

    /// Attaches handlers to the buttons the page has, then loads the
    /// profile once.
    pub async fn init(&self) {
        for button in [Button::Refresh, Button::Logout] {
            if self.page.has_button(button) {
                self.binding(button).store(true, Ordering::Relaxed);
                debug!("bound {button}");
            }
        }

        self.refresh().await;
    }

    /// Handles a press of `button`. Presses on buttons without a handler
    /// are ignored.
    pub async fn click(&self, button: Button) {
        if !self.binding(button).load(Ordering::Relaxed) {
            trace!("ignoring press on unbound {button}");
            return;
        }

        match button {
            Button::Refresh => self.refresh().await,
            Button::Logout => {
                if let Err(e) = self.auth.logout() {
                    error!("logout failed: {e}");
                }
            }
        }
    }

    fn binding(&self, button: Button) -> &AtomicBool {
        match button {
            Button::Refresh => &self.refresh_bound,
            Button::Logout => &self.logout_bound,
        }
    }
}
