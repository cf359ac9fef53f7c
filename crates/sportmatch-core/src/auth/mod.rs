//! Supabase GoTrue email/password auth.
//!
//! The auth backend issues the account ids every other module keys on.
//! Sessions are persisted through a [`SessionPersistence`] implementation
//! supplied by the front end (keyring, file, memory).

mod signup;

pub use signup::{is_valid_email, is_valid_password, SignupRequest, MIN_PASSWORD_LEN};

use std::fmt;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::AccountId;
use crate::util::{is_http_url, normalize_text_option};

/// Sessions this close to expiry are refreshed before use.
const EXPIRY_SKEW_SECONDS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

impl AuthUser {
    /// The account id this user's profile is stored under.
    pub fn account_id(&self) -> AuthResult<AccountId> {
        AccountId::new(self.id.clone())
            .map_err(|_| AuthError::Api("Auth backend returned an empty user id".to_string()))
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry as Unix seconds
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_seconds_now() + EXPIRY_SKEW_SECONDS
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Result of a sign-up call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The backend auto-confirmed the address and opened a session
    SignedIn(AuthSession),
    /// The user must confirm their email before signing in
    ConfirmationRequired { user: AuthUser },
}

impl SignUpOutcome {
    /// The newly created user, whether or not a session was opened.
    pub const fn user(&self) -> &AuthUser {
        match self {
            Self::SignedIn(session) => &session.user,
            Self::ConfirmationRequired { user } => user,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Supabase auth is not configured. Set SUPABASE_URL and SUPABASE_ANON_KEY.")]
    NotConfigured,
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Session storage error: {0}")]
    SessionStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Where the current session lives between runs.
pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

#[derive(Clone)]
pub struct SupabaseAuthClient<S: SessionPersistence> {
    auth_url: String,
    anon_key: String,
    client: Client,
    store: S,
}

impl<S: SessionPersistence> SupabaseAuthClient<S> {
    pub fn new(url: impl AsRef<str>, anon_key: impl Into<String>, store: S) -> AuthResult<Self> {
        let auth_url = normalize_auth_url(url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Supabase anon key must not be empty",
            ));
        }

        Ok(Self {
            auth_url,
            anon_key,
            client: Client::builder().build()?,
            store,
        })
    }

    /// The session store backing this client.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Load the persisted session, refreshing it when it is about to expire.
    ///
    /// A session that can no longer be refreshed is cleared and `None` returned.
    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(stored) = self.store.load_session()? else {
            return Ok(None);
        };

        if !stored.is_expired() {
            return Ok(Some(stored));
        }

        match self.refresh_session(&stored.refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(error) => {
                tracing::warn!(%error, "failed to refresh persisted session");
                self.store.clear_session()?;
                Ok(None)
            }
        }
    }

    /// Create an email/password user.
    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email.trim(),
            "password": password,
        });
        let request = self.public_request(
            self.client
                .post(format!("{}/signup", self.auth_url))
                .json(&payload),
        );
        let response = self.send_auth_request(request).await?;
        match response.into_session()? {
            SessionFields::Session(session) => {
                self.store.save_session(&session)?;
                tracing::info!(user = %session.user.id, "signed up and signed in");
                Ok(SignUpOutcome::SignedIn(session))
            }
            SessionFields::UserOnly(user) => {
                tracing::info!(user = %user.id, "signed up, email confirmation pending");
                Ok(SignUpOutcome::ConfirmationRequired { user })
            }
        }
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        if !is_valid_email(email) {
            return Err(AuthError::InvalidCredentials("Invalid email".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials(
                "Password is required".to_string(),
            ));
        }

        let payload = serde_json::json!({
            "email": email.trim(),
            "password": password,
        });
        let request = self.public_request(
            self.client
                .post(format!("{}/token", self.auth_url))
                .query(&[("grant_type", "password")])
                .json(&payload),
        );

        let session = self
            .send_auth_request(request)
            .await?
            .into_session()?
            .require("Sign-in")?;
        self.store.save_session(&session)?;
        Ok(session)
    }

    /// Exchange a refresh token for a new session.
    pub async fn refresh_session(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Refresh token must not be empty",
            ));
        }

        let payload = serde_json::json!({
            "refresh_token": refresh_token,
        });
        let request = self.public_request(
            self.client
                .post(format!("{}/token", self.auth_url))
                .query(&[("grant_type", "refresh_token")])
                .json(&payload),
        );
        let session = self
            .send_auth_request(request)
            .await?
            .into_session()?
            .require("Refresh")?;

        self.store.save_session(&session)?;
        Ok(session)
    }

    /// Revoke the session server-side and forget it locally.
    ///
    /// An already-expired token (401) still clears the local session.
    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let request = self
            .client
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token);

        let response = request.send().await?;
        let status = response.status();
        if !(status.is_success() || status == StatusCode::UNAUTHORIZED) {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }

        self.store.clear_session()?;
        Ok(())
    }

    fn public_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
    }

    async fn send_auth_request(&self, request: RequestBuilder) -> AuthResult<GoTrueResponse> {
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }
        Ok(response.json::<GoTrueResponse>().await?)
    }
}

/// Append `/auth/v1` to a Supabase project URL unless already present.
pub fn normalize_auth_url(url: &str) -> AuthResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AuthError::InvalidConfiguration(
            "Supabase URL must not be empty",
        ));
    }
    if !is_http_url(trimmed) {
        return Err(AuthError::InvalidConfiguration(
            "Supabase URL must include http:// or https://",
        ));
    }
    if trimmed.ends_with("/auth/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/auth/v1"))
    }
}

/// Both values or neither; a lone URL or key is a configuration error.
pub fn resolve_optional_supabase_config(
    url: Option<String>,
    anon_key: Option<String>,
) -> AuthResult<Option<(String, String)>> {
    match (normalize_text_option(url), normalize_text_option(anon_key)) {
        (None, None) => Ok(None),
        (Some(url), Some(anon_key)) => Ok(Some((url, anon_key))),
        _ => Err(AuthError::NotConfigured),
    }
}

fn validate_credentials(email: &str, password: &str) -> AuthResult<()> {
    if !is_valid_email(email) {
        return Err(AuthError::InvalidCredentials("Invalid email".to_string()));
    }
    if !is_valid_password(password) {
        return Err(AuthError::InvalidCredentials(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

enum SessionFields {
    Session(AuthSession),
    UserOnly(AuthUser),
}

impl SessionFields {
    fn require(self, operation: &str) -> AuthResult<AuthSession> {
        match self {
            Self::Session(session) => Ok(session),
            Self::UserOnly(_) => Err(AuthError::Api(format!(
                "{operation} response did not include an active session"
            ))),
        }
    }
}

/// GoTrue responses put session fields either at the top level or under
/// `session`, and report expiry either absolutely or relatively.
#[derive(Debug, Deserialize)]
struct GoTrueResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<GoTrueUser>,
    session: Option<Box<GoTrueResponse>>,
}

impl GoTrueResponse {
    fn flatten(mut self) -> Self {
        let Some(nested) = self.session.take().map(|nested| nested.flatten()) else {
            return self;
        };
        Self {
            access_token: self.access_token.or(nested.access_token),
            refresh_token: self.refresh_token.or(nested.refresh_token),
            expires_at: self.expires_at.or(nested.expires_at),
            expires_in: self.expires_in.or(nested.expires_in),
            user: self.user.or(nested.user),
            session: None,
        }
    }

    fn into_session(self) -> AuthResult<SessionFields> {
        let flat = self.flatten();
        let expires_at = flat.expires_at.or_else(|| {
            flat.expires_in
                .map(|expires_in| unix_seconds_now().saturating_add(expires_in))
        });
        let user = flat.user.map(AuthUser::from);

        match (flat.access_token, flat.refresh_token, expires_at, user) {
            (Some(access_token), Some(refresh_token), Some(expires_at), Some(user)) => {
                Ok(SessionFields::Session(AuthSession {
                    access_token,
                    refresh_token,
                    expires_at,
                    user,
                }))
            }
            (None, None, None, Some(user)) => Ok(SessionFields::UserOnly(user)),
            _ => Err(AuthError::Api(
                "Auth response did not include enough session fields".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    email: Option<String>,
}

impl From<GoTrueUser> for AuthUser {
    fn from(value: GoTrueUser) -> Self {
        Self {
            id: value.id,
            email: value.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    msg: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<GoTrueErrorResponse>(body) {
        if let Some(message) = payload
            .message
            .or(payload.msg)
            .or(payload.error_description)
            .or(payload.error)
        {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn unix_seconds_now() -> i64 {
    chrono::Utc::now().timestamp()
}
