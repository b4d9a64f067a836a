//! Configuration for the profile viewer.
//!
//! A [`Config`] names the server to talk to, the routes on it, and where the
//! session token is persisted. Defaults match the page contract:
//!
//! * login route `/login`
//! * profile endpoint `/api/user/info`
//! * storage key `jwt_token`
//! * handoff cookie `temp_token`
//!
//! Any of these can be overridden from a TOML file:
//!
//! ```toml
//! base_url = "https://identity.example.com"
//! storage_file = "session.toml"
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Config {
    pub app_name: String,
    pub app_version: String,
    pub app_lang: String,

    pub user_agent: String,

    /// Origin of the identity server. Routes are resolved against it.
    pub base_url: Url,

    pub login_path: String,
    pub profile_path: String,

    /// Key under which the bearer token is persisted.
    pub token_key: String,

    /// Name of the one-shot cookie that carries a fresh token after login.
    pub handoff_cookie: String,

    /// File backing the persistent client storage.
    pub storage_file: PathBuf,
}

/// Overrides as read from a configuration file. Every field is optional.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    base_url: Option<Url>,
    login_path: Option<String>,
    profile_path: Option<String>,
    token_key: Option<String>,
    handoff_cookie: Option<String>,
    storage_file: Option<PathBuf>,
}

impl Config {
    pub const DEFAULT_LOGIN_PATH: &'static str = "/login";
    pub const DEFAULT_PROFILE_PATH: &'static str = "/api/user/info";
    pub const DEFAULT_TOKEN_KEY: &'static str = "jwt_token";
    pub const DEFAULT_HANDOFF_COOKIE: &'static str = "temp_token";
    pub const DEFAULT_STORAGE_FILE: &'static str = "session.toml";

    /// Configuration files are a handful of lines; refuse anything larger.
    const MAX_FILE_SIZE: u64 = 16 * 1024;

    /// Creates a configuration for the server at `base_url` with all other
    /// settings at their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the application name, version or the operating
    /// system name cannot be put into a `User-Agent` header.
    pub fn new(base_url: Url) -> Result<Self> {
        let app_name = env!("CARGO_PKG_NAME").to_owned();
        let app_version = env!("CARGO_PKG_VERSION").to_owned();
        let app_lang = "en".to_owned();

        // Additional `User-Agent` string checks on top of `reqwest::HeaderValue`.
        let illegal_chars = |chr| chr == '/' || chr == ';';
        if app_name.is_empty()
            || app_name.contains(illegal_chars)
            || app_version.is_empty()
            || app_version.contains(illegal_chars)
            || app_lang.chars().count() != 2
            || app_lang.contains(illegal_chars)
        {
            return Err(Error::invalid_argument(format!(
                "application name, version and/or language invalid (\"{app_name}\"; \"{app_version}\"; \"{app_lang}\")"
            )));
        }

        let os_name = std::env::consts::OS;
        let os_version = sysinfo::System::os_version().unwrap_or_else(|| String::from("0"));
        if os_name.is_empty()
            || os_name.contains(illegal_chars)
            || os_version.contains(illegal_chars)
        {
            return Err(Error::invalid_argument(format!(
                "os name and/or version invalid (\"{os_name}\"; \"{os_version}\")"
            )));
        }

        let user_agent = format!("{app_name}/{app_version} (Rust; {os_name}/{os_version}; {app_lang})");
        trace!("user agent: {user_agent}");

        Ok(Self {
            app_name,
            app_version,
            app_lang,

            user_agent,

            base_url,

            login_path: Self::DEFAULT_LOGIN_PATH.to_owned(),
            profile_path: Self::DEFAULT_PROFILE_PATH.to_owned(),
            token_key: Self::DEFAULT_TOKEN_KEY.to_owned(),
            handoff_cookie: Self::DEFAULT_HANDOFF_COOKIE.to_owned(),
            storage_file: PathBuf::from(Self::DEFAULT_STORAGE_FILE),
        })
    }

    /// Loads overrides from the TOML file at `path` on top of `self`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is too large, contains
    /// unknown keys or has values of the wrong type.
    pub fn merge_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();

        // Prevent out-of-memory condition: the file should be small.
        let file_size = fs::metadata(path)?.len();
        if file_size > Self::MAX_FILE_SIZE {
            return Err(Error::invalid_argument(format!(
                "{} is too large ({file_size} bytes)",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&contents)?;
        debug!("loaded configuration from {}", path.display());

        if let Some(base_url) = file.base_url {
            self.base_url = base_url;
        }
        if let Some(login_path) = file.login_path {
            self.login_path = login_path;
        }
        if let Some(profile_path) = file.profile_path {
            self.profile_path = profile_path;
        }
        if let Some(token_key) = file.token_key {
            self.token_key = token_key;
        }
        if let Some(handoff_cookie) = file.handoff_cookie {
            self.handoff_cookie = handoff_cookie;
        }
        if let Some(storage_file) = file.storage_file {
            self.storage_file = storage_file;
        }

        self.validate()?;
        Ok(self)
    }

    /// Checks that the configured keys can be used as storage and cookie names.
    ///
    /// # Errors
    ///
    /// Returns an error if the token key or cookie name is empty, or if the
    /// cookie name contains characters not allowed in a cookie name.
    pub fn validate(&self) -> Result<()> {
        if self.token_key.is_empty() {
            return Err(Error::invalid_argument("token key must not be empty"));
        }

        let illegal_cookie_char = |chr: char| {
            chr.is_whitespace() || chr.is_control() || matches!(chr, '=' | ';' | ',')
        };
        if self.handoff_cookie.is_empty() || self.handoff_cookie.contains(illegal_cookie_char) {
            return Err(Error::invalid_argument(format!(
                "handoff cookie name invalid (\"{}\")",
                self.handoff_cookie
            )));
        }

        Ok(())
    }

    /// URL of the login page.
    ///
    /// # Errors
    ///
    /// Returns an error if the login path does not form a valid URL.
    pub fn login_url(&self) -> Result<Url> {
        self.base_url.join(&self.login_path).map_err(Into::into)
    }

    /// URL of the current user's profile endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile path does not form a valid URL.
    pub fn profile_url(&self) -> Result<Url> {
        self.base_url.join(&self.profile_path).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::ErrorKind;

    fn base_url() -> Url {
        Url::parse("https://identity.example.com").unwrap()
    }

    #[test]
    fn defaults_match_page_contract() {
        let config = Config::new(base_url()).unwrap();

        assert_eq!(
            config.login_url().unwrap().as_str(),
            "https://identity.example.com/login"
        );
        assert_eq!(
            config.profile_url().unwrap().as_str(),
            "https://identity.example.com/api/user/info"
        );
        assert_eq!(config.token_key, "jwt_token");
        assert_eq!(config.handoff_cookie, "temp_token");
        assert!(config.user_agent.starts_with("profile-viewer/"));
    }

    #[test]
    fn file_overrides_selected_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "base_url = \"http://127.0.0.1:8080\"\nstorage_file = \"/tmp/session.toml\""
        )
        .unwrap();

        let config = Config::new(base_url())
            .unwrap()
            .merge_file(file.path())
            .unwrap();

        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:8080/");
        assert_eq!(config.storage_file, PathBuf::from("/tmp/session.toml"));
        assert_eq!(config.login_path, "/login");
    }

    #[test]
    fn rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "refresh_interval = 5").unwrap();

        let err = Config::new(base_url())
            .unwrap()
            .merge_file(file.path())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn rejects_cookie_names_with_separators() {
        let mut config = Config::new(base_url()).unwrap();
        config.handoff_cookie = "temp token".to_owned();
        assert!(config.validate().is_err());

        config.handoff_cookie = "temp_token".to_owned();
        assert!(config.validate().is_ok());
    }
}
