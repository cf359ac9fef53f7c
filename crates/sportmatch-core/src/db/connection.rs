//! Database connection management

use crate::error::{Error, Result};
use libsql::{Builder, Connection, Database as LibSqlDatabase};
use std::path::Path;
use std::time::Duration;

use super::migrations;

/// Remote backend settings for an embedded replica
#[derive(Clone, Default)]
pub struct SyncConfig {
    /// Remote database URL (e.g., `libsql://sportmatch.turso.io`)
    pub url: Option<String>,
    /// Authentication token for the remote database
    pub auth_token: Option<String>,
    /// Automatic pull interval (default: 30 seconds)
    pub sync_interval: Option<Duration>,
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("url", &self.url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("sync_interval", &self.sync_interval)
            .finish()
    }
}

impl SyncConfig {
    /// Create a new sync configuration
    pub fn new(url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            auth_token: Some(auth_token.into()),
            sync_interval: Some(Duration::from_secs(30)),
        }
    }

    /// Set the automatic sync interval
    #[must_use]
    pub const fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = Some(interval);
        self
    }

    /// Disable automatic sync (manual sync only)
    #[must_use]
    pub const fn without_auto_sync(mut self) -> Self {
        self.sync_interval = None;
        self
    }

    /// Check if both the URL and token are present
    pub const fn is_configured(&self) -> bool {
        self.url.is_some() && self.auth_token.is_some()
    }
}

/// Owns the libSQL database handle and its single connection
pub struct Database {
    db: LibSqlDatabase,
    conn: Connection,
    sync_config: Option<SyncConfig>,
}

impl Database {
    /// Open a local-only database at the given path, creating it if needed.
    ///
    /// Runs migrations automatically.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let db = Builder::new_local(&path_str).build().await?;
        Self::initialize(db, None).await
    }

    /// Open an in-memory database (useful for testing)
    pub async fn open_in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::initialize(db, None).await
    }

    /// Open an embedded replica of the shared backend database.
    ///
    /// Reads are served from the local file; writes go to the remote primary
    /// and are pulled back on sync.
    pub async fn open_with_sync(
        local_path: impl AsRef<Path>,
        sync_config: SyncConfig,
    ) -> Result<Self> {
        let path_str = local_path.as_ref().to_string_lossy().to_string();

        let url = sync_config
            .url
            .clone()
            .ok_or_else(|| Error::InvalidInput("Sync URL is required".into()))?;
        let token = sync_config
            .auth_token
            .clone()
            .ok_or_else(|| Error::InvalidInput("Auth token is required".into()))?;

        let mut builder = Builder::new_remote_replica(&path_str, url, token);
        if let Some(interval) = sync_config.sync_interval {
            builder = builder.sync_interval(interval);
            tracing::debug!(?interval, "automatic replica sync enabled");
        }

        let db = builder.build().await?;
        db.sync().await?;
        tracing::debug!("initial replica sync complete");

        Self::initialize(db, Some(sync_config)).await
    }

    async fn initialize(db: LibSqlDatabase, sync_config: Option<SyncConfig>) -> Result<Self> {
        let conn = db.connect()?;
        let database = Self {
            db,
            conn,
            sync_config,
        };
        database.configure().await?;
        migrations::run(&database.conn).await?;
        Ok(database)
    }

    async fn configure(&self) -> Result<()> {
        // Remote replicas reject some pragmas; only foreign keys are mandatory.
        self.conn
            .execute("PRAGMA journal_mode = WAL;", ())
            .await
            .ok();
        self.conn
            .execute("PRAGMA busy_timeout = 5000;", ())
            .await
            .ok();
        self.conn.execute("PRAGMA foreign_keys = ON;", ()).await?;
        Ok(())
    }

    /// Pull remote changes (no-op for local-only databases).
    pub async fn sync(&self) -> Result<()> {
        if self.sync_config.is_some() {
            self.db.sync().await?;
            tracing::debug!("database synced with remote");
        }
        Ok(())
    }

    /// Check if sync is configured
    pub const fn is_sync_enabled(&self) -> bool {
        self.sync_config.is_some()
    }

    /// Get a reference to the underlying connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}
