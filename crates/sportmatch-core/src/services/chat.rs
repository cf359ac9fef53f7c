//! Messaging inside a match.

use crate::config::DEFAULT_MESSAGE_PAGE_SIZE;
use crate::models::{AccountId, Match, MatchId, Message, MessageId};
use crate::storage::{chat_image_key, BlobStore, JPEG_CONTENT_TYPE};
use crate::{Error, Result};

use super::database::DatabaseService;
use super::feeds::MessageFeed;

pub struct ChatService<B: BlobStore> {
    db: DatabaseService,
    blobs: B,
    page_size: usize,
}

impl<B: BlobStore> ChatService<B> {
    pub const fn new(db: DatabaseService, blobs: B) -> Self {
        Self {
            db,
            blobs,
            page_size: DEFAULT_MESSAGE_PAGE_SIZE,
        }
    }

    /// Override how many messages a page holds.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Load a match and check that `account` takes part in it.
    async fn participant_match(&self, match_id: &MatchId, account: &AccountId) -> Result<Match> {
        let record = self
            .db
            .get_match(match_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("match {match_id}")))?;
        if !record.involves(account) {
            return Err(Error::PermissionDenied(format!(
                "{account} is not part of match {match_id}"
            )));
        }
        Ok(record)
    }

    /// Send a text message.
    pub async fn send_text(
        &self,
        match_id: &MatchId,
        sender: &AccountId,
        text: &str,
    ) -> Result<Message> {
        self.participant_match(match_id, sender).await?;
        let message = Message::new(match_id.clone(), sender.clone(), Some(text.to_string()), None)?;
        self.db.insert_message(&message).await?;
        tracing::debug!(%match_id, message = %message.id, "sent text message");
        Ok(message)
    }

    /// Upload an image and send it, optionally with a caption.
    pub async fn send_image(
        &self,
        match_id: &MatchId,
        sender: &AccountId,
        bytes: &[u8],
        caption: Option<String>,
    ) -> Result<Message> {
        if bytes.is_empty() {
            return Err(Error::InvalidInput("Image is empty".to_string()));
        }
        self.participant_match(match_id, sender).await?;

        let id = MessageId::new();
        let key = chat_image_key(match_id, &id);
        let url = self.blobs.put(&key, bytes, Some(JPEG_CONTENT_TYPE)).await?;

        let stored = match Message::with_id(id, match_id.clone(), sender.clone(), caption, Some(url))
        {
            Ok(message) => self.db.insert_message(&message).await.map(|()| message),
            Err(error) => Err(error),
        };
        if stored.is_err() {
            if let Err(error) = self.blobs.delete(&key).await {
                tracing::warn!(%key, %error, "failed to remove orphaned chat image");
            }
        }
        stored
    }

    /// Most recent `limit` messages (default: one page), oldest first.
    pub async fn list_messages(
        &self,
        match_id: &MatchId,
        reader: &AccountId,
        limit: Option<usize>,
    ) -> Result<Vec<Message>> {
        self.participant_match(match_id, reader).await?;
        self.db
            .list_recent_messages(match_id, limit.unwrap_or(self.page_size))
            .await
    }

    /// Newest message of a match.
    pub async fn last_message(&self, match_id: &MatchId) -> Result<Option<Message>> {
        self.db.last_message(match_id).await
    }

    /// Mark the messages `reader` received in a match as seen.
    pub async fn mark_seen(&self, match_id: &MatchId, reader: &AccountId) -> Result<u64> {
        self.participant_match(match_id, reader).await?;
        self.db.mark_seen(match_id, reader).await
    }

    /// Live view of a match's latest page of messages.
    pub async fn observe_messages(
        &self,
        match_id: &MatchId,
        reader: &AccountId,
    ) -> Result<MessageFeed> {
        self.participant_match(match_id, reader).await?;
        Ok(MessageFeed::new(
            self.db.clone(),
            match_id.clone(),
            self.page_size,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, SwipeDecision, SwipeRecord};
    use crate::storage::LocalBlobStore;
    use pretty_assertions::assert_eq;

    fn id(raw: &str) -> AccountId {
        AccountId::new(raw).unwrap()
    }

    async fn setup(dir: &std::path::Path) -> (ChatService<LocalBlobStore>, MatchId) {
        let db = DatabaseService::open_in_memory().await.unwrap();
        for raw in ["amy", "bob", "zed"] {
            db.insert_account(&Account::new(id(raw), "Someone", None))
                .await
                .unwrap();
        }
        for (actor, target) in [("amy", "zed"), ("zed", "amy")] {
            db.record_swipe(&SwipeRecord::new(id(actor), id(target), SwipeDecision::Like).unwrap())
                .await
                .unwrap();
        }
        let service = ChatService::new(db, LocalBlobStore::new(dir)).with_page_size(2);
        (service, MatchId::for_pair(&id("amy"), &id("zed")).unwrap())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn send_and_page_messages() {
        let dir = tempfile::tempdir().unwrap();
        let (chat, match_id) = setup(dir.path()).await;

        for (sender, text) in [("amy", "hi"), ("zed", "hey"), ("amy", "run tomorrow?")] {
            chat.send_text(&match_id, &id(sender), text).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let page = chat.list_messages(&match_id, &id("amy"), None).await.unwrap();
        let texts: Vec<_> = page.iter().filter_map(|m| m.text.as_deref()).collect();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[1], "run tomorrow?");

        let all = chat
            .list_messages(&match_id, &id("zed"), Some(10))
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let last = chat.last_message(&match_id).await.unwrap().unwrap();
        assert_eq!(last.text.as_deref(), Some("run tomorrow?"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn outsiders_cannot_read_or_write() {
        let dir = tempfile::tempdir().unwrap();
        let (chat, match_id) = setup(dir.path()).await;

        assert!(matches!(
            chat.send_text(&match_id, &id("bob"), "hello").await,
            Err(Error::PermissionDenied(_))
        ));
        assert!(matches!(
            chat.list_messages(&match_id, &id("bob"), None).await,
            Err(Error::PermissionDenied(_))
        ));
        let unknown = MatchId::from_raw("amy_bob").unwrap();
        assert!(chat
            .send_text(&unknown, &id("amy"), "hello")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn blank_text_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (chat, match_id) = setup(dir.path()).await;
        assert!(matches!(
            chat.send_text(&match_id, &id("amy"), "   ").await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn send_image_stores_blob_under_message_key() {
        let dir = tempfile::tempdir().unwrap();
        let (chat, match_id) = setup(dir.path()).await;

        let message = chat
            .send_image(&match_id, &id("zed"), b"jpeg-bytes", None)
            .await
            .unwrap();
        assert_eq!(message.text, None);
        let expected = dir
            .path()
            .join(format!("matches/amy_zed/messages/{}.jpg", message.id));
        assert_eq!(std::fs::read(expected).unwrap(), b"jpeg-bytes");
        assert_eq!(message.preview(20), "[photo]");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn mark_seen_counts_only_received_messages() {
        let dir = tempfile::tempdir().unwrap();
        let (chat, match_id) = setup(dir.path()).await;

        chat.send_text(&match_id, &id("amy"), "one").await.unwrap();
        chat.send_text(&match_id, &id("zed"), "two").await.unwrap();
        chat.send_text(&match_id, &id("zed"), "three").await.unwrap();

        assert_eq!(chat.mark_seen(&match_id, &id("amy")).await.unwrap(), 2);
        assert_eq!(chat.mark_seen(&match_id, &id("zed")).await.unwrap(), 1);
        assert_eq!(chat.mark_seen(&match_id, &id("zed")).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn observe_messages_sees_new_message() {
        let dir = tempfile::tempdir().unwrap();
        let (chat, match_id) = setup(dir.path()).await;

        let mut feed = chat.observe_messages(&match_id, &id("amy")).await.unwrap();
        assert!(feed.next().await.unwrap().is_empty());

        chat.send_text(&match_id, &id("zed"), "ping").await.unwrap();
        let snapshot = feed.next().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].text.as_deref(), Some("ping"));
    }
}
