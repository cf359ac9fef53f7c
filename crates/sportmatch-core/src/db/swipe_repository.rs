//! Swipe repository implementation

use std::collections::HashSet;

use libsql::{params, Connection, Row};

use crate::error::{Error, Result};
use crate::models::{AccountId, SwipeDecision, SwipeRecord};

use super::values::account_id;

/// Trait for swipe storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SwipeRepository {
    /// Record a swipe, replacing any earlier decision on the same target
    async fn upsert(&self, swipe: &SwipeRecord) -> Result<()>;

    /// The swipe `actor` made on `target`, if any
    async fn get(&self, actor: &AccountId, target: &AccountId) -> Result<Option<SwipeRecord>>;

    /// Whether `actor` has a positive (like or super like) swipe on `target`
    async fn has_liked(&self, actor: &AccountId, target: &AccountId) -> Result<bool>;

    /// Every account `actor` has swiped on, regardless of decision
    async fn swiped_target_ids(&self, actor: &AccountId) -> Result<HashSet<AccountId>>;
}

/// libSQL implementation of `SwipeRepository`
pub struct LibSqlSwipeRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSwipeRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_swipe(row: &Row) -> Result<SwipeRecord> {
        let decision: String = row.get(2)?;
        Ok(SwipeRecord {
            actor_id: account_id(row, 0)?,
            target_id: account_id(row, 1)?,
            decision: decision
                .parse()
                .map_err(|_| Error::Database(format!("unknown swipe decision '{decision}'")))?,
            swiped_at: row.get(3)?,
        })
    }
}

impl SwipeRepository for LibSqlSwipeRepository<'_> {
    async fn upsert(&self, swipe: &SwipeRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO swipes (actor_id, target_id, decision, swiped_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(actor_id, target_id)
                 DO UPDATE SET decision = excluded.decision, swiped_at = excluded.swiped_at",
                params![
                    swipe.actor_id.as_str(),
                    swipe.target_id.as_str(),
                    swipe.decision.as_str(),
                    swipe.swiped_at
                ],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, actor: &AccountId, target: &AccountId) -> Result<Option<SwipeRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT actor_id, target_id, decision, swiped_at
                 FROM swipes WHERE actor_id = ?1 AND target_id = ?2",
                [actor.as_str(), target.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_swipe(&row)?)),
            None => Ok(None),
        }
    }

    async fn has_liked(&self, actor: &AccountId, target: &AccountId) -> Result<bool> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM swipes
                 WHERE actor_id = ?1 AND target_id = ?2 AND decision IN (?3, ?4)",
                [
                    actor.as_str(),
                    target.as_str(),
                    SwipeDecision::Like.as_str(),
                    SwipeDecision::SuperLike.as_str(),
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)? > 0),
            None => Ok(false),
        }
    }

    async fn swiped_target_ids(&self, actor: &AccountId) -> Result<HashSet<AccountId>> {
        let mut rows = self
            .conn
            .query("SELECT target_id FROM swipes WHERE actor_id = ?1", [actor.as_str()])
            .await?;

        let mut targets = HashSet::new();
        while let Some(row) = rows.next().await? {
            targets.insert(account_id(&row, 0)?);
        }
        Ok(targets)
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

    async fn setup(accounts: &[&str]) -> Database {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlAccountRepository::new(db.connection());
        for raw in accounts {
            repo.insert(&Account::new(id(raw), "Someone", None)).await.unwrap();
        }
        db
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_upsert_replaces_previous_decision() {
        let db = setup(&["a", "b"]).await;
        let repo = LibSqlSwipeRepository::new(db.connection());

        let like = SwipeRecord::new(id("a"), id("b"), SwipeDecision::Like).unwrap();
        repo.upsert(&like).await.unwrap();
        assert!(repo.has_liked(&id("a"), &id("b")).await.unwrap());

        let pass = SwipeRecord::new(id("a"), id("b"), SwipeDecision::Pass).unwrap();
        repo.upsert(&pass).await.unwrap();
        assert!(!repo.has_liked(&id("a"), &id("b")).await.unwrap());

        let stored = repo.get(&id("a"), &id("b")).await.unwrap().unwrap();
        assert_eq!(stored.decision, SwipeDecision::Pass);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_super_like_counts_as_like() {
        let db = setup(&["a", "b"]).await;
        let repo = LibSqlSwipeRepository::new(db.connection());

        let swipe = SwipeRecord::new(id("a"), id("b"), SwipeDecision::SuperLike).unwrap();
        repo.upsert(&swipe).await.unwrap();
        assert!(repo.has_liked(&id("a"), &id("b")).await.unwrap());
        assert!(!repo.has_liked(&id("b"), &id("a")).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_swiped_target_ids_includes_passes() {
        let db = setup(&["a", "b", "c", "d"]).await;
        let repo = LibSqlSwipeRepository::new(db.connection());

        for (target, decision) in [("b", SwipeDecision::Like), ("c", SwipeDecision::Pass)] {
            let swipe = SwipeRecord::new(id("a"), id(target), decision).unwrap();
            repo.upsert(&swipe).await.unwrap();
        }

        let swiped = repo.swiped_target_ids(&id("a")).await.unwrap();
        assert_eq!(swiped, HashSet::from([id("b"), id("c")]));
        assert!(repo.swiped_target_ids(&id("d")).await.unwrap().is_empty());
    }
}
