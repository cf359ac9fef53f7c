//! Message repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use libsql::{params, Connection, Row};

use crate::error::{Error, Result};
use crate::models::{AccountId, MatchId, Message};

use super::values::{account_id, optional_text, text_or_null};

const MESSAGE_COLUMNS: &str = "id, match_id, sender_id, text, image_url, sent_at, seen";

/// Trait for chat message storage operations (async)
#[allow(async_fn_in_trait)]
pub trait MessageRepository {
    /// Store a new message
    async fn insert(&self, message: &Message) -> Result<()>;

    /// The most recent `limit` messages of a match, returned oldest first
    async fn list_recent(&self, match_id: &MatchId, limit: usize) -> Result<Vec<Message>>;

    /// Every message of a match, oldest first
    async fn list_all(&self, match_id: &MatchId) -> Result<Vec<Message>>;

    /// The newest message of a match
    async fn last(&self, match_id: &MatchId) -> Result<Option<Message>>;

    /// Mark every unseen message not sent by `reader` as seen.
    ///
    /// Returns the number of messages updated.
    async fn mark_seen(&self, match_id: &MatchId, reader: &AccountId) -> Result<u64>;

    /// Count unseen messages addressed to `reader`
    async fn unread_count(&self, match_id: &MatchId, reader: &AccountId) -> Result<u64>;
}

/// libSQL implementation of `MessageRepository`
pub struct LibSqlMessageRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlMessageRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_message(row: &Row) -> Result<Message> {
        let id: String = row.get(0)?;
        let match_id: String = row.get(1)?;
        Ok(Message {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("invalid message id '{id}'")))?,
            match_id: MatchId::from_raw(match_id)?,
            sender_id: account_id(row, 2)?,
            text: optional_text(row, 3)?,
            image_url: optional_text(row, 4)?,
            sent_at: row.get(5)?,
            seen: row.get::<i64>(6)? != 0,
        })
    }

    async fn collect(mut rows: libsql::Rows) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        while let Some(row) = rows.next().await? {
            messages.push(Self::parse_message(&row)?);
        }
        Ok(messages)
    }
}

impl MessageRepository for LibSqlMessageRepository<'_> {
    async fn insert(&self, message: &Message) -> Result<()> {
        self.conn
            .execute(
                &format!(
                    "INSERT INTO messages ({MESSAGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ),
                params![
                    message.id.as_str(),
                    message.match_id.as_str(),
                    message.sender_id.as_str(),
                    text_or_null(message.text.as_deref()),
                    text_or_null(message.image_url.as_deref()),
                    message.sent_at,
                    i64::from(message.seen)
                ],
            )
            .await?;
        Ok(())
    }

    async fn list_recent(&self, match_id: &MatchId, limit: usize) -> Result<Vec<Message>> {
        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages
                     WHERE match_id = ?1
                     ORDER BY sent_at DESC, id DESC
                     LIMIT ?2"
                ),
                params![match_id.as_str(), limit as i64],
            )
            .await?;

        let mut messages = Self::collect(rows).await?;
        messages.reverse();
        Ok(messages)
    }

    async fn list_all(&self, match_id: &MatchId) -> Result<Vec<Message>> {
        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages
                     WHERE match_id = ?1
                     ORDER BY sent_at ASC, id ASC"
                ),
                [match_id.as_str()],
            )
            .await?;
        Self::collect(rows).await
    }

    async fn last(&self, match_id: &MatchId) -> Result<Option<Message>> {
        Ok(self.list_recent(match_id, 1).await?.pop())
    }

    async fn mark_seen(&self, match_id: &MatchId, reader: &AccountId) -> Result<u64> {
        let updated = self
            .conn
            .execute(
                "UPDATE messages SET seen = 1
                 WHERE match_id = ?1 AND sender_id <> ?2 AND seen = 0",
                [match_id.as_str(), reader.as_str()],
            )
            .await?;
        Ok(updated)
    }

    async fn unread_count(&self, match_id: &MatchId, reader: &AccountId) -> Result<u64> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM messages
                 WHERE match_id = ?1 AND sender_id <> ?2 AND seen = 0",
                [match_id.as_str(), reader.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(u64::try_from(row.get::<i64>(0)?).unwrap_or(0)),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        AccountRepository, Database, LibSqlAccountRepository, LibSqlMatchRepository,
        MatchRepository,
    };
    use crate::models::{Account, Match};
    use pretty_assertions::assert_eq;

    fn id(raw: &str) -> AccountId {
        AccountId::new(raw).unwrap()
    }

    async fn setup() -> (Database, MatchId) {
        let db = Database::open_in_memory().await.unwrap();
        let accounts = LibSqlAccountRepository::new(db.connection());
        for raw in ["amy", "zed"] {
            accounts
                .insert(&Account::new(id(raw), "Someone", None))
                .await
                .unwrap();
        }
        let record = Match::between(&id("amy"), &id("zed")).unwrap();
        LibSqlMatchRepository::new(db.connection())
            .insert_if_absent(&record)
            .await
            .unwrap();
        (db, record.id)
    }

    fn message(match_id: &MatchId, sender: &str, text: &str, sent_at: i64) -> Message {
        let mut message =
            Message::new(match_id.clone(), id(sender), Some(text.to_string()), None).unwrap();
        message.sent_at = sent_at;
        message
    }

    fn texts(messages: &[Message]) -> Vec<&str> {
        messages
            .iter()
            .filter_map(|message| message.text.as_deref())
            .collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_recent_returns_tail_oldest_first() {
        let (db, match_id) = setup().await;
        let repo = LibSqlMessageRepository::new(db.connection());

        for (i, text) in ["one", "two", "three", "four"].into_iter().enumerate() {
            repo.insert(&message(&match_id, "amy", text, i as i64 * 10))
                .await
                .unwrap();
        }

        let recent = repo.list_recent(&match_id, 2).await.unwrap();
        assert_eq!(texts(&recent), vec!["three", "four"]);

        let all = repo.list_all(&match_id).await.unwrap();
        assert_eq!(texts(&all), vec!["one", "two", "three", "four"]);

        let last = repo.last(&match_id).await.unwrap().unwrap();
        assert_eq!(last.text.as_deref(), Some("four"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_image_only_message_roundtrip() {
        let (db, match_id) = setup().await;
        let repo = LibSqlMessageRepository::new(db.connection());

        let photo = Message::new(
            match_id.clone(),
            id("zed"),
            None,
            Some("https://cdn.example/m.jpg".to_string()),
        )
        .unwrap();
        repo.insert(&photo).await.unwrap();

        let stored = repo.list_all(&match_id).await.unwrap();
        assert_eq!(stored, vec![photo]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mark_seen_only_touches_incoming_messages() {
        let (db, match_id) = setup().await;
        let repo = LibSqlMessageRepository::new(db.connection());

        repo.insert(&message(&match_id, "amy", "hi", 1)).await.unwrap();
        repo.insert(&message(&match_id, "zed", "hey", 2)).await.unwrap();
        repo.insert(&message(&match_id, "zed", "how are you", 3))
            .await
            .unwrap();

        assert_eq!(repo.unread_count(&match_id, &id("amy")).await.unwrap(), 2);
        assert_eq!(repo.unread_count(&match_id, &id("zed")).await.unwrap(), 1);

        assert_eq!(repo.mark_seen(&match_id, &id("amy")).await.unwrap(), 2);
        assert_eq!(repo.mark_seen(&match_id, &id("amy")).await.unwrap(), 0);
        assert_eq!(repo.unread_count(&match_id, &id("amy")).await.unwrap(), 0);

        let all = repo.list_all(&match_id).await.unwrap();
        let own = all.iter().find(|m| m.sender_id == id("amy")).unwrap();
        assert!(!own.seen);
    }
}
