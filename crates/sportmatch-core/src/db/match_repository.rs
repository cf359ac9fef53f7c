//! Match repository implementation

use libsql::{params, Connection, Row};

use crate::error::Result;
use crate::models::{AccountId, Match, MatchId};

use super::values::account_id;

/// Trait for match storage operations (async)
#[allow(async_fn_in_trait)]
pub trait MatchRepository {
    /// Insert a match unless one already exists for the pair.
    ///
    /// Returns `true` when this call created the record.
    async fn insert_if_absent(&self, record: &Match) -> Result<bool>;

    /// Get a match by id
    async fn get(&self, id: &MatchId) -> Result<Option<Match>>;

    /// Every match `account` takes part in, newest first
    async fn list_for(&self, account: &AccountId) -> Result<Vec<Match>>;
}

/// libSQL implementation of `MatchRepository`
pub struct LibSqlMatchRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlMatchRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_match(row: &Row) -> Result<Match> {
        let id: String = row.get(0)?;
        Ok(Match {
            id: MatchId::from_raw(id)?,
            users: [account_id(row, 1)?, account_id(row, 2)?],
            created_at: row.get(3)?,
        })
    }
}

impl MatchRepository for LibSqlMatchRepository<'_> {
    async fn insert_if_absent(&self, record: &Match) -> Result<bool> {
        let [first, second] = &record.users;
        let rows = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO matches (id, first_user_id, second_user_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.id.as_str(),
                    first.as_str(),
                    second.as_str(),
                    record.created_at
                ],
            )
            .await?;
        Ok(rows > 0)
    }

    async fn get(&self, id: &MatchId) -> Result<Option<Match>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, first_user_id, second_user_id, created_at FROM matches WHERE id = ?1",
                [id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_match(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_for(&self, account: &AccountId) -> Result<Vec<Match>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, first_user_id, second_user_id, created_at FROM matches
                 WHERE first_user_id = ?1 OR second_user_id = ?1
                 ORDER BY created_at DESC, id",
                [account.as_str()],
            )
            .await?;

        let mut matches = Vec::new();
        while let Some(row) = rows.next().await? {
            matches.push(Self::parse_match(&row)?);
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{AccountRepository, Database, LibSqlAccountRepository};
    use crate::models::Account;
    use pretty_assertions::assert_eq;

    fn id(raw: &str) -> AccountId {
        AccountId::new(raw).unwrap()
    }

    async fn setup() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlAccountRepository::new(db.connection());
        for raw in ["amy", "bob", "zed"] {
            repo.insert(&Account::new(id(raw), "Someone", None)).await.unwrap();
        }
        db
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_insert_if_absent_is_idempotent() {
        let db = setup().await;
        let repo = LibSqlMatchRepository::new(db.connection());

        let record = Match::between(&id("zed"), &id("amy")).unwrap();
        assert!(repo.insert_if_absent(&record).await.unwrap());
        assert!(!repo.insert_if_absent(&record).await.unwrap());

        let stored = repo.get(&record.id).await.unwrap().unwrap();
        assert_eq!(stored, record);
        assert_eq!(stored.id.as_str(), "amy_zed");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_for_returns_newest_first() {
        let db = setup().await;
        let repo = LibSqlMatchRepository::new(db.connection());

        let mut older = Match::between(&id("amy"), &id("bob")).unwrap();
        older.created_at = 1_000;
        let mut newer = Match::between(&id("amy"), &id("zed")).unwrap();
        newer.created_at = 2_000;
        repo.insert_if_absent(&older).await.unwrap();
        repo.insert_if_absent(&newer).await.unwrap();

        let listed = repo.list_for(&id("amy")).await.unwrap();
        assert_eq!(listed, vec![newer.clone(), older]);
        assert_eq!(repo.list_for(&id("zed")).await.unwrap(), vec![newer]);
        assert!(repo.get(&MatchId::from_raw("bob_zed").unwrap()).await.unwrap().is_none());
    }
}
