//! crates/dashboard_client/src/context.rs
//!
//! Observable session and theme state. Views subscribe to the watch channels
//! and re-render when the value changes.

use crate::client::{ApiClient, AuthSession, ProfileUpdate};
use crate::error::{ClientError, ClientResult};
use dashboard_core::domain::{Theme, User};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

//=========================================================================================
// AuthContext
//=========================================================================================

/// The signed-in user, or `None`.
pub struct AuthContext {
    client: Arc<ApiClient>,
    user: watch::Sender<Option<User>>,
}

impl AuthContext {
    pub fn new(client: Arc<ApiClient>) -> Self {
        let (user, _) = watch::channel(None);
        Self { client, user }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.user.subscribe()
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.borrow().is_some()
    }

    /// Restores the session from a stored token, if there is one.
    ///
    /// A rejected token is dropped and leaves the context signed out.
    pub async fn refresh(&self) -> ClientResult<Option<User>> {
        if !self.client.is_authenticated() {
            self.user.send_replace(None);
            return Ok(None);
        }
        match self.client.profile().await {
            Ok(user) => {
                self.user.send_replace(Some(user.clone()));
                Ok(Some(user))
            }
            Err(ClientError::Unauthorized(_)) => {
                self.user.send_replace(None);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        let session = self.client.login(email, password).await?;
        self.user.send_replace(Some(session.user.clone()));
        Ok(session)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> ClientResult<AuthSession> {
        let session = self.client.register(name, email, password).await?;
        self.user.send_replace(Some(session.user.clone()));
        Ok(session)
    }

    /// Always ends signed out; a failed server call is only logged.
    pub async fn logout(&self) {
        if let Err(e) = self.client.logout().await {
            warn!("Logout error: {}", e);
        }
        self.user.send_replace(None);
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<User> {
        let user = self.client.update_profile(update).await?;
        self.user.send_replace(Some(user.clone()));
        Ok(user)
    }
}

//=========================================================================================
// ThemeContext
//=========================================================================================

/// The active color theme.
pub struct ThemeContext {
    theme: watch::Sender<Theme>,
}

impl Default for ThemeContext {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl ThemeContext {
    pub fn new(initial: Theme) -> Self {
        let (theme, _) = watch::channel(initial);
        Self { theme }
    }

    /// Starts from the user's saved preference.
    pub fn for_user(user: &User) -> Self {
        Self::new(user.preferences.theme)
    }

    pub fn current(&self) -> Theme {
        *self.theme.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.theme.subscribe()
    }

    pub fn set(&self, theme: Theme) {
        self.theme.send_if_modified(|current| {
            let changed = *current != theme;
            *current = theme;
            changed
        });
    }

    /// Flips between light and dark. `system` toggles to dark.
    pub fn toggle(&self) -> Theme {
        let next = match self.current() {
            Theme::Dark => Theme::Light,
            Theme::Light | Theme::System => Theme::Dark,
        };
        self.set(next);
        next
    }
}
