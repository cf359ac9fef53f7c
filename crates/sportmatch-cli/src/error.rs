use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] sportmatch_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] sportmatch_core::config::ConfigError),
    #[error("Authentication error: {0}")]
    Auth(#[from] sportmatch_core::auth::AuthError),
    #[error("Not signed in. Run `sportmatch auth login` or pass --as <ACCOUNT_ID>.")]
    NotSignedIn,
    #[error("Message text cannot be empty")]
    EmptyMessage,
    #[error("Refusing to delete the account without --yes")]
    DeleteNotConfirmed,
    #[error(
        "Sync is not configured. Set TURSO_DATABASE_URL and TURSO_AUTH_TOKEN to enable it."
    )]
    SyncNotConfigured,
}
