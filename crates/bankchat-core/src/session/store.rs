use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

use super::kv::KeyValueStore;
use crate::models::LoginResponse;

/// Namespace prefix for every persisted key
const KEY_PREFIX: &str = "bankchat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    AuthToken,
    UserId,
    AccountId,
}

impl SessionKey {
    pub const ALL: [SessionKey; 3] = [SessionKey::AuthToken, SessionKey::UserId, SessionKey::AccountId];

    /// Key under which the value is persisted
    pub fn storage_key(&self) -> &'static str {
        match self {
            SessionKey::AuthToken => "bankchat.auth_token",
            SessionKey::UserId => "bankchat.user_id",
            SessionKey::AccountId => "bankchat.account_id",
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .storage_key()
            .trim_start_matches(KEY_PREFIX)
            .trim_start_matches('.');
        f.write_str(name)
    }
}

/// Point-in-time copy of the persisted session.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub auth_token: Option<String>,
    pub user_id: Option<String>,
    pub account_id: Option<String>,
}

impl Session {
    /// All three identifiers are present
    pub fn is_complete(&self) -> bool {
        self.auth_token.is_some() && self.user_id.is_some() && self.account_id.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.auth_token.is_none() && self.user_id.is_none() && self.account_id.is_none()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("user_id", &self.user_id)
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Persists the session triple.
///
/// Storage failures never reach the caller: writes log and return, reads
/// log and come back empty. Clone is cheap and clones share the backend.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub async fn save(&self, key: SessionKey, value: &str) {
        self.try_save(key, value).await;
    }

    async fn try_save(&self, key: SessionKey, value: &str) -> bool {
        match self.backend.set(key.storage_key(), value).await {
            Ok(()) => {
                debug!(key = %key, "Saved session value");
                true
            }
            Err(e) => {
                error!(key = %key, error = %e, "Failed to save session value");
                false
            }
        }
    }

    pub async fn get(&self, key: SessionKey) -> Option<String> {
        match self.backend.get(key.storage_key()).await {
            Ok(value) => value,
            Err(e) => {
                error!(key = %key, error = %e, "Failed to read session value");
                None
            }
        }
    }

    /// Remove all three keys; the backend leaves them untouched on failure.
    pub async fn clear_all(&self) {
        let keys = SessionKey::ALL.map(|k| k.storage_key());
        match self.backend.remove_all(&keys).await {
            Ok(()) => debug!("Cleared session"),
            Err(e) => error!(error = %e, "Failed to clear session"),
        }
    }

    pub async fn is_logged_in(&self) -> bool {
        self.get(SessionKey::AuthToken).await.is_some()
    }

    pub async fn snapshot(&self) -> Session {
        Session {
            auth_token: self.get(SessionKey::AuthToken).await,
            user_id: self.get(SessionKey::UserId).await,
            account_id: self.get(SessionKey::AccountId).await,
        }
    }

    /// Persist the identifiers returned by a successful login.
    ///
    /// Returns whether all three were stored. If any write fails the keys
    /// already written are cleared again, so the store never holds a
    /// partial session.
    pub async fn save_login(&self, login: &LoginResponse) -> bool {
        let values = [
            (SessionKey::AuthToken, login.token.as_str()),
            (SessionKey::UserId, login.user_id.as_str()),
            (SessionKey::AccountId, login.account_id.as_str()),
        ];
        for (key, value) in values {
            if !self.try_save(key, value).await {
                error!(key = %key, "Session only partly saved, clearing it");
                self.clear_all().await;
                return false;
            }
        }
        true
    }

    pub async fn auth_token(&self) -> Option<String> {
        self.get(SessionKey::AuthToken).await
    }

    pub async fn user_id(&self) -> Option<String> {
        self.get(SessionKey::UserId).await
    }

    pub async fn account_id(&self) -> Option<String> {
        self.get(SessionKey::AccountId).await
    }
}
