//! Page navigation.
//!
//! Whenever the session is missing or invalidated, the page navigates to the
//! login route. A [`Navigator`] receives that request; [`Location`] is the
//! implementation used by the command line front end, which records where the
//! page was sent so the caller can stop and point the user there.

use std::sync::Mutex;

use url::Url;

/// Receives navigation requests.
pub trait Navigator: Send + Sync {
    /// Navigates the page to `url`. Navigating is fire-and-forget: work that
    /// is still in flight is simply abandoned by the caller.
    fn navigate(&self, url: &Url);
}

/// The page's current location.
#[derive(Debug, Default)]
pub struct Location {
    target: Mutex<Option<Url>>,
}

impl Location {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last URL the page was sent to, or `None` while the page is still
    /// being shown.
    #[must_use]
    pub fn redirected_to(&self) -> Option<Url> {
        self.target
            .lock()
            .ok()
            .and_then(|target| target.as_ref().cloned())
    }

    #[must_use]
    pub fn has_navigated(&self) -> bool {
        self.redirected_to().is_some()
    }
}

impl Navigator for Location {
    fn navigate(&self, url: &Url) {
        info!("navigating to {url}");
        match self.target.lock() {
            Ok(mut target) => *target = Some(url.clone()),
            Err(e) => error!("could not record navigation to {url}: {e}"),
        }
    }
}
