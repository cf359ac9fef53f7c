//! Shared database service used by every higher-level service.
//!
//! Wraps the single libSQL connection in `Arc<Mutex<_>>` and publishes a
//! [`ChangeEvent`] after each successful write so live feeds can re-query.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};

use crate::db::{
    resolve_swipe, AccountRepository, Database, LibSqlAccountRepository, LibSqlMatchRepository,
    LibSqlMessageRepository, LibSqlSwipeRepository, MatchRepository, MessageRepository,
    SwipeOutcome, SwipeRepository, SyncConfig,
};
use crate::models::{Account, AccountId, Match, MatchId, Message, SwipeRecord};
use crate::Result;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A write that went through [`DatabaseService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    AccountSaved(AccountId),
    AccountDeleted(AccountId),
    SwipeRecorded { actor: AccountId, target: AccountId },
    MatchCreated(Match),
    MessageSent { match_id: MatchId },
    MessagesSeen { match_id: MatchId },
}

impl ChangeEvent {
    /// Whether the event can change the message list of `match_id`.
    pub fn touches_match_messages(&self, match_id: &MatchId) -> bool {
        match self {
            Self::MessageSent { match_id: changed } | Self::MessagesSeen { match_id: changed } => {
                changed == match_id
            }
            Self::AccountDeleted(_) => true,
            Self::AccountSaved(_) | Self::SwipeRecorded { .. } | Self::MatchCreated(_) => false,
        }
    }

    /// Whether the event can change the match list of `account`.
    pub fn touches_account_matches(&self, account: &AccountId) -> bool {
        match self {
            Self::MatchCreated(record) => record.involves(account),
            Self::AccountDeleted(_) | Self::MessageSent { .. } | Self::MessagesSeen { .. } => true,
            Self::AccountSaved(_) | Self::SwipeRecorded { .. } => false,
        }
    }
}

/// Thread-safe service for DB and repository operations.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
    events: broadcast::Sender<ChangeEvent>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    pub async fn open_path(
        db_path: impl Into<PathBuf>,
        sync_config: Option<SyncConfig>,
    ) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = match sync_config {
            Some(config) => Self::open_replica_with_recovery(&db_path, config).await?,
            None => {
                tracing::info!(path = %db_path.display(), "running in local-only mode");
                Database::open(&db_path).await?
            }
        };
        Ok(Self::from_database(db))
    }

    /// Open a local-only database service at the given path.
    pub async fn open_local_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_path(db_path, None).await
    }

    /// Open an in-memory database service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        Ok(Self::from_database(Database::open_in_memory().await?))
    }

    fn from_database(db: Database) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            db: Arc::new(Mutex::new(db)),
            events,
        }
    }

    async fn open_replica_with_recovery(db_path: &Path, sync_config: SyncConfig) -> Result<Database> {
        tracing::info!(
            url = sync_config.url.as_deref().unwrap_or("unknown"),
            "sync enabled with Turso"
        );
        match Database::open_with_sync(db_path, sync_config.clone()).await {
            Ok(db) => Ok(db),
            Err(error) if Self::is_recoverable_local_replica_error(&error) => {
                tracing::warn!(
                    path = %db_path.display(),
                    %error,
                    "inconsistent local replica; resetting local files and retrying once"
                );
                Self::quarantine_local_replica_files(db_path)?;
                Database::open_with_sync(db_path, sync_config).await
            }
            Err(error) => Err(error),
        }
    }

    fn is_recoverable_local_replica_error(error: &crate::Error) -> bool {
        let message = error.to_string().to_ascii_lowercase();
        message.contains("file is not a database")
            || message.contains("invalid local state")
            || message.contains("metadata file exists but db file does not")
    }

    /// Move the broken database file aside and drop its replica sidecars.
    fn quarantine_local_replica_files(db_path: &Path) -> Result<()> {
        let Some(base_name) = db_path.file_name().and_then(|name| name.to_str()) else {
            return Ok(());
        };

        if db_path.exists() {
            let timestamp = chrono::Utc::now().timestamp_millis();
            let backup_path = db_path.with_file_name(format!("{base_name}.corrupt-{timestamp}"));
            std::fs::rename(db_path, &backup_path)?;
            tracing::warn!(backup = %backup_path.display(), "moved corrupted local database");
        }

        let Some(parent) = db_path.parent() else {
            return Ok(());
        };
        let sidecar_prefix = format!("{base_name}-");
        for entry in std::fs::read_dir(parent)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with(&sidecar_prefix) {
                let path = entry.path();
                std::fs::remove_file(&path)?;
                tracing::warn!(path = %path.display(), "removed stale replica file");
            }
        }
        Ok(())
    }

    /// Subscribe to writes made through this service (and its clones).
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: ChangeEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    /// Pull remote changes when sync is enabled.
    pub async fn sync(&self) -> Result<()> {
        let db = self.db.lock().await;
        db.sync().await
    }

    /// Returns whether sync is configured for this DB.
    pub async fn is_sync_enabled(&self) -> bool {
        let db = self.db.lock().await;
        db.is_sync_enabled()
    }

    /// Store a new account.
    pub async fn insert_account(&self, account: &Account) -> Result<()> {
        {
            let db = self.db.lock().await;
            LibSqlAccountRepository::new(db.connection())
                .insert(account)
                .await?;
        }
        self.publish(ChangeEvent::AccountSaved(account.id.clone()));
        Ok(())
    }

    /// Fetch an account by id.
    pub async fn get_account(&self, id: &AccountId) -> Result<Option<Account>> {
        let db = self.db.lock().await;
        LibSqlAccountRepository::new(db.connection()).get(id).await
    }

    /// Overwrite an existing account.
    pub async fn update_account(&self, account: &Account) -> Result<()> {
        {
            let db = self.db.lock().await;
            LibSqlAccountRepository::new(db.connection())
                .update(account)
                .await?;
        }
        self.publish(ChangeEvent::AccountSaved(account.id.clone()));
        Ok(())
    }

    /// Hard-delete an account together with its swipes, matches and messages.
    pub async fn delete_account(&self, id: &AccountId) -> Result<()> {
        {
            let db = self.db.lock().await;
            LibSqlAccountRepository::new(db.connection())
                .delete(id)
                .await?;
        }
        self.publish(ChangeEvent::AccountDeleted(id.clone()));
        Ok(())
    }

    /// Accounts other than `exclude`, optionally limited to one gender.
    pub async fn list_candidates(
        &self,
        exclude: &AccountId,
        gender: Option<&str>,
    ) -> Result<Vec<Account>> {
        let db = self.db.lock().await;
        LibSqlAccountRepository::new(db.connection())
            .list_candidates(exclude, gender)
            .await
    }

    /// Record a swipe and resolve a possible match atomically.
    pub async fn record_swipe(&self, swipe: &SwipeRecord) -> Result<SwipeOutcome> {
        let outcome = {
            let db = self.db.lock().await;
            resolve_swipe(db.connection(), swipe).await?
        };
        self.publish(ChangeEvent::SwipeRecorded {
            actor: swipe.actor_id.clone(),
            target: swipe.target_id.clone(),
        });
        if let SwipeOutcome::NewMatch(record) = &outcome {
            self.publish(ChangeEvent::MatchCreated(record.clone()));
        }
        Ok(outcome)
    }

    /// Every account `actor` has already swiped on.
    pub async fn swiped_target_ids(&self, actor: &AccountId) -> Result<HashSet<AccountId>> {
        let db = self.db.lock().await;
        LibSqlSwipeRepository::new(db.connection())
            .swiped_target_ids(actor)
            .await
    }

    /// Fetch a match by id.
    pub async fn get_match(&self, id: &MatchId) -> Result<Option<Match>> {
        let db = self.db.lock().await;
        LibSqlMatchRepository::new(db.connection()).get(id).await
    }

    /// Matches of `account`, newest first.
    pub async fn list_matches(&self, account: &AccountId) -> Result<Vec<Match>> {
        let db = self.db.lock().await;
        LibSqlMatchRepository::new(db.connection())
            .list_for(account)
            .await
    }

    /// Store a chat message.
    pub async fn insert_message(&self, message: &Message) -> Result<()> {
        {
            let db = self.db.lock().await;
            LibSqlMessageRepository::new(db.connection())
                .insert(message)
                .await?;
        }
        self.publish(ChangeEvent::MessageSent {
            match_id: message.match_id.clone(),
        });
        Ok(())
    }

    /// Most recent `limit` messages of a match, oldest first.
    pub async fn list_recent_messages(
        &self,
        match_id: &MatchId,
        limit: usize,
    ) -> Result<Vec<Message>> {
        let db = self.db.lock().await;
        LibSqlMessageRepository::new(db.connection())
            .list_recent(match_id, limit)
            .await
    }

    /// Every message of a match, oldest first.
    pub async fn list_all_messages(&self, match_id: &MatchId) -> Result<Vec<Message>> {
        let db = self.db.lock().await;
        LibSqlMessageRepository::new(db.connection())
            .list_all(match_id)
            .await
    }

    /// Newest message of a match.
    pub async fn last_message(&self, match_id: &MatchId) -> Result<Option<Message>> {
        let db = self.db.lock().await;
        LibSqlMessageRepository::new(db.connection())
            .last(match_id)
            .await
    }

    /// Mark messages received by `reader` as seen; returns how many changed.
    pub async fn mark_seen(&self, match_id: &MatchId, reader: &AccountId) -> Result<u64> {
        let updated = {
            let db = self.db.lock().await;
            LibSqlMessageRepository::new(db.connection())
                .mark_seen(match_id, reader)
                .await?
        };
        if updated > 0 {
            self.publish(ChangeEvent::MessagesSeen {
                match_id: match_id.clone(),
            });
        }
        Ok(updated)
    }

    /// Unseen messages addressed to `reader`.
    pub async fn unread_count(&self, match_id: &MatchId, reader: &AccountId) -> Result<u64> {
        let db = self.db.lock().await;
        LibSqlMessageRepository::new(db.connection())
            .unread_count(match_id, reader)
            .await
    }
}
