//! Profile of the authenticated user.
//!
//! # Wire Format
//!
//! ```json
//! {
//!     "name": "Ann",
//!     "email": "a@x.com",
//!     "provider": "google",
//!     "picture": "https://example.com/ann.png"
//! }
//! ```
//!
//! `provider` and `picture` may be missing or `null`.

use serde::{Deserialize, Serialize};

/// A read-only snapshot of the current user, fetched fresh for every render.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,

    /// Identity provider the account signed in with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl UserProfile {
    /// Label shown for accounts without an external identity provider.
    pub const LOCAL_PROVIDER: &'static str = "Local";

    /// The provider to display, falling back to [`Self::LOCAL_PROVIDER`].
    ///
    /// An empty provider counts as no provider.
    #[must_use]
    pub fn provider_label(&self) -> &str {
        self.provider
            .as_deref()
            .filter(|provider| !provider.is_empty())
            .unwrap_or(Self::LOCAL_PROVIDER)
    }

    /// The picture URL, if one is set and not empty.
    #[must_use]
    pub fn picture(&self) -> Option<&str> {
        self.picture
            .as_deref()
            .filter(|picture| !picture.is_empty())
    }

    /// Uppercase first character of the name, for the generated avatar.
    ///
    /// Empty for an empty name. Some characters uppercase to more than one
    /// character, e.g. `ß` becomes `SS`.
    #[must_use]
    pub fn initial(&self) -> String {
        self.name
            .chars()
            .next()
            .map(|first| first.to_uppercase().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_default_to_none() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"name":"Ann","email":"a@x.com"}"#).unwrap();

        assert_eq!(profile.provider, None);
        assert_eq!(profile.picture, None);
        assert_eq!(profile.provider_label(), "Local");
        assert_eq!(profile.initial(), "A");
    }

    #[test]
    fn null_fields_are_absent() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"name":"bob","email":"b@x.com","provider":null,"picture":""}"#,
        )
        .unwrap();

        assert_eq!(profile.provider_label(), "Local");
        assert_eq!(profile.picture(), None);
        assert_eq!(profile.initial(), "B");
    }

    #[test]
    fn name_and_email_are_required() {
        assert!(serde_json::from_str::<UserProfile>(r#"{"name":"Ann"}"#).is_err());
    }

    #[test]
    fn initial_of_empty_name_is_empty() {
        let profile = UserProfile {
            name: String::new(),
            email: "a@x.com".to_owned(),
            provider: Some("github".to_owned()),
            picture: None,
        };

        assert_eq!(profile.initial(), "");
        assert_eq!(profile.provider_label(), "github");
    }
}
