//! Render targets of the profile page.
//!
//! The page is a fixed set of named output slots plus the optional buttons
//! the user can press. Each slot holds either plain text or an HTML
//! fragment, mirroring the element identifiers of the profile page:
//!
//! | Slot | Identifier | Content |
//! |---|---|---|
//! | [`Slot::ProfilePicture`] | `profilePicture` | HTML |
//! | [`Slot::UserName`] | `userName` | text |
//! | [`Slot::UserEmail`] | `userEmail` | text |
//! | [`Slot::UserProvider`] | `userProvider` | text |
//! | [`Slot::TableUserName`] | `tableUserName` | text |
//! | [`Slot::TableUserEmail`] | `tableUserEmail` | text |
//! | [`Slot::TableUserProvider`] | `tableUserProvider` | text |

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Mutex,
};

use crate::profile::UserProfile;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    ProfilePicture,
    UserName,
    UserEmail,
    UserProvider,
    TableUserName,
    TableUserEmail,
    TableUserProvider,
}

impl Slot {
    pub const ALL: [Self; 7] = [
        Self::ProfilePicture,
        Self::UserName,
        Self::UserEmail,
        Self::UserProvider,
        Self::TableUserName,
        Self::TableUserEmail,
        Self::TableUserProvider,
    ];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::ProfilePicture => "profilePicture",
            Self::UserName => "userName",
            Self::UserEmail => "userEmail",
            Self::UserProvider => "userProvider",
            Self::TableUserName => "tableUserName",
            Self::TableUserEmail => "tableUserEmail",
            Self::TableUserProvider => "tableUserProvider",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Button {
    Refresh,
    Logout,
}

impl Button {
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Refresh => "refreshButton",
            Self::Logout => "logoutButton",
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Content {
    Text(String),
    Html(String),
}

impl Content {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) | Self::Html(s) => s,
        }
    }
}

/// The page the profile is rendered into.
#[derive(Debug)]
pub struct Page {
    slots: Mutex<BTreeMap<Slot, Content>>,
    buttons: BTreeSet<Button>,
    alerts: Mutex<Vec<String>>,
}

impl Default for Page {
    fn default() -> Self {
        Self::with_buttons([Button::Refresh, Button::Logout])
    }
}

impl Page {
    /// Creates a page with both the refresh and the logout button.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a page that only has the given buttons.
    pub fn with_buttons<I>(buttons: I) -> Self
    where
        I: IntoIterator<Item = Button>,
    {
        Self {
            slots: Mutex::new(BTreeMap::new()),
            buttons: buttons.into_iter().collect(),
            alerts: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn has_button(&self, button: Button) -> bool {
        self.buttons.contains(&button)
    }

    pub fn set_text(&self, slot: Slot, text: &str) {
        self.set(slot, Content::Text(text.to_owned()));
    }

    pub fn set_html(&self, slot: Slot, html: String) {
        self.set(slot, Content::Html(html));
    }

    fn set(&self, slot: Slot, content: Content) {
        match self.slots.lock() {
            Ok(mut slots) => {
                slots.insert(slot, content);
            }
            Err(e) => error!("could not write {slot}: {e}"),
        }
    }

    #[must_use]
    pub fn content(&self, slot: Slot) -> Option<Content> {
        self.slots
            .lock()
            .ok()
            .and_then(|slots| slots.get(&slot).cloned())
    }

    /// The slot's content as a string, whether text or HTML.
    #[must_use]
    pub fn get(&self, slot: Slot) -> Option<String> {
        self.content(slot).map(|content| content.as_str().to_owned())
    }

    #[must_use]
    pub fn is_rendered(&self) -> bool {
        self.slots.lock().is_ok_and(|slots| !slots.is_empty())
    }

    /// Shows a blocking message to the user.
    pub fn alert(&self, message: &str) {
        warn!("alert: {message}");
        match self.alerts.lock() {
            Ok(mut alerts) => alerts.push(message.to_owned()),
            Err(e) => error!("could not show alert: {e}"),
        }
    }

    /// Removes and returns the alerts shown so far.
    #[must_use]
    pub fn take_alerts(&self) -> Vec<String> {
        self.alerts
            .lock()
            .map(|mut alerts| std::mem::take(&mut *alerts))
            .unwrap_or_default()
    }
}

/// Prints the summary card followed by the detail table.
impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = |slot| self.get(slot).unwrap_or_default();

        writeln!(f, "{} <{}>", text(Slot::UserName), text(Slot::UserEmail))?;
        writeln!(f, "{}", text(Slot::UserProvider))?;
        writeln!(f)?;
        writeln!(f, "{:<10}{}", "Name", text(Slot::TableUserName))?;
        writeln!(f, "{:<10}{}", "Email", text(Slot::TableUserEmail))?;
        write!(f, "{:<10}{}", "Provider", text(Slot::TableUserProvider))
    }
}

/// Writes `profile` into every slot of `page`.
pub fn render(page: &Page, profile: &UserProfile) {
    page.set_html(Slot::ProfilePicture, picture_html(profile));

    let provider = profile.provider_label();

    page.set_text(Slot::UserName, &profile.name);
    page.set_text(Slot::UserEmail, &profile.email);
    page.set_text(Slot::UserProvider, provider);

    page.set_text(Slot::TableUserName, &profile.name);
    page.set_text(Slot::TableUserEmail, &profile.email);
    page.set_text(Slot::TableUserProvider, provider);
}

/// The picture if there is one, otherwise a circle with the user's initial.
#[must_use]
pub fn picture_html(profile: &UserProfile) -> String {
    match profile.picture() {
        Some(picture) => format!(
            r#"<img src="{}" class="rounded-circle" style="width: 150px; height: 150px; object-fit: cover;" alt="Profile Picture">"#,
            escape(picture)
        ),
        None => format!(
            r#"<div class="rounded-circle bg-secondary d-flex align-items-center justify-content-center mx-auto" style="width: 150px; height: 150px;"><span class="text-white" style="font-size: 3em;">{}</span></div>"#,
            escape(&profile.initial())
        ),
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann() -> UserProfile {
        UserProfile {
            name: "ann".to_owned(),
            email: "a@x.com".to_owned(),
            provider: None,
            picture: None,
        }
    }

    #[test]
    fn avatar_shows_uppercase_initial() {
        let page = Page::new();
        render(&page, &ann());

        let html = page.get(Slot::ProfilePicture).unwrap();
        assert!(html.contains(r#"<span class="text-white" style="font-size: 3em;">A</span>"#));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn picture_renders_image() {
        let page = Page::new();
        let profile = UserProfile {
            picture: Some("https://example.com/ann.png".to_owned()),
            ..ann()
        };
        render(&page, &profile);

        let content = page.content(Slot::ProfilePicture).unwrap();
        assert!(matches!(content, Content::Html(_)));
        assert!(content
            .as_str()
            .starts_with(r#"<img src="https://example.com/ann.png""#));
    }

    #[test]
    fn missing_provider_shows_local_twice() {
        let page = Page::new();
        render(&page, &ann());

        assert_eq!(page.get(Slot::UserProvider).as_deref(), Some("Local"));
        assert_eq!(page.get(Slot::TableUserProvider).as_deref(), Some("Local"));
    }

    #[test]
    fn summary_and_table_match() {
        let page = Page::new();
        let profile = UserProfile {
            provider: Some("google".to_owned()),
            ..ann()
        };
        render(&page, &profile);

        for (summary, table) in [
            (Slot::UserName, Slot::TableUserName),
            (Slot::UserEmail, Slot::TableUserEmail),
            (Slot::UserProvider, Slot::TableUserProvider),
        ] {
            assert_eq!(page.content(summary), page.content(table));
        }
        assert_eq!(
            page.content(Slot::UserName),
            Some(Content::Text("ann".to_owned()))
        );
    }

    #[test]
    fn html_is_escaped() {
        let profile = UserProfile {
            name: "<script>".to_owned(),
            picture: Some(r#"x" onerror="alert(1)"#.to_owned()),
            ..ann()
        };
        let html = picture_html(&profile);
        assert!(html.contains("x&quot; onerror=&quot;alert(1)"));

        let profile = UserProfile {
            picture: None,
            ..profile
        };
        assert!(picture_html(&profile).contains(">&lt;</span>"));
    }

    #[test]
    fn alerts_are_taken_once() {
        let page = Page::with_buttons([Button::Refresh]);
        assert!(page.has_button(Button::Refresh));
        assert!(!page.has_button(Button::Logout));

        page.alert("Failed to load user information");
        assert_eq!(page.take_alerts(), vec!["Failed to load user information"]);
        assert!(page.take_alerts().is_empty());
    }

    #[test]
    fn slot_ids_match_page_elements() {
        let ids: Vec<_> = Slot::ALL.iter().map(|slot| slot.id()).collect();
        assert_eq!(
            ids,
            [
                "profilePicture",
                "userName",
                "userEmail",
                "userProvider",
                "tableUserName",
                "tableUserEmail",
                "tableUserProvider"
            ]
        );
        assert_eq!(Button::Logout.to_string(), "logoutButton");
    }
}
