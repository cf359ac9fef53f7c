//! CLI Supabase auth/session helpers with secure keychain persistence.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use sportmatch_core::auth::{
    AuthResult, SessionPersistence, SignUpOutcome, SupabaseAuthClient,
};
use sportmatch_core::config::SupabaseSettings;
pub use sportmatch_core::auth::{AuthError, AuthSession};

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "sportmatch-cli";

/// Keychain slot holding the session of one Supabase project.
#[derive(Clone)]
pub struct SessionStore {
    username: String,
}

impl SessionStore {
    pub fn new(project_url: &str) -> Self {
        Self {
            username: format!("supabase_session:{}", project_url.trim_end_matches('/')),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| AuthError::SessionStorage(error.to_string()))
    }
}

impl SessionPersistence for SessionStore {
    #[cfg(not(test))]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        match self.entry()?.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::SessionStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SessionStorage(error.to_string()))?;
        guard
            .get(&self.username)
            .map(|raw| serde_json::from_str(raw))
            .transpose()
            .map_err(AuthError::from)
    }

    #[cfg(not(test))]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&raw)
            .map_err(|error| AuthError::SessionStorage(error.to_string()))
    }

    #[cfg(test)]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SessionStorage(error.to_string()))?;
        guard.insert(self.username.clone(), raw);
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_session(&self) -> AuthResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::SessionStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear_session(&self) -> AuthResult<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SessionStorage(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

#[derive(Clone)]
pub struct SupabaseAuthService {
    inner: SupabaseAuthClient<SessionStore>,
}

impl SupabaseAuthService {
    pub fn new(settings: &SupabaseSettings) -> AuthResult<Self> {
        Ok(Self {
            inner: SupabaseAuthClient::new(
                &settings.url,
                settings.anon_key.clone(),
                SessionStore::new(&settings.url),
            )?,
        })
    }

    /// Service for the configured project, or `NotConfigured`.
    pub fn from_settings(settings: Option<&SupabaseSettings>) -> AuthResult<Self> {
        settings.map_or(Err(AuthError::NotConfigured), Self::new)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        self.inner.sign_up(email, password).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        self.inner.sign_in(email, password).await
    }

    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        self.inner.restore_session().await
    }

    pub async fn sign_out(&self) -> AuthResult<()> {
        match self.inner.store().load_session()? {
            Some(session) => self.inner.sign_out(&session.access_token).await,
            None => Ok(()),
        }
    }

    pub fn stored_session(&self) -> AuthResult<Option<AuthSession>> {
        self.inner.store().load_session()
    }
}

#[cfg(test)]
mod tests {
    use sportmatch_core::auth::AuthUser;

    use super::*;

    fn session(user: &str) -> AuthSession {
        AuthSession {
            access_token: "secret-access-token".to_string(),
            refresh_token: "secret-refresh-token".to_string(),
            expires_at: 4_000_000_000,
            user: AuthUser {
                id: user.to_string(),
                email: Some(format!("{user}@example.com")),
            },
        }
    }

    #[test]
    fn session_store_is_scoped_per_project() {
        let first = SessionStore::new("https://one.supabase.co/");
        let second = SessionStore::new("https://two.supabase.co");

        first.save_session(&session("alice")).unwrap();
        assert_eq!(first.load_session().unwrap().unwrap().user.id, "alice");
        assert!(second.load_session().unwrap().is_none());

        first.clear_session().unwrap();
        assert!(first.load_session().unwrap().is_none());
    }

    #[test]
    fn service_requires_configuration() {
        assert!(matches!(
            SupabaseAuthService::from_settings(None),
            Err(AuthError::NotConfigured)
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restore_returns_unexpired_stored_session() {
        let settings = SupabaseSettings {
            url: "https://restore.supabase.co".to_string(),
            anon_key: "anon".to_string(),
        };
        let service = SupabaseAuthService::new(&settings).unwrap();
        SessionStore::new(&settings.url)
            .save_session(&session("bob"))
            .unwrap();

        let restored = service.restore_session().await.unwrap().unwrap();
        assert_eq!(restored.user.id, "bob");
        assert!(!format!("{restored:?}").contains("secret-access-token"));
    }
}
