//! Live snapshot feeds.
//!
//! A feed yields the current list first, then a fresh list after every
//! relevant [`ChangeEvent`]. A receiver that lags behind the channel simply
//! re-queries. With a poll interval the feed also pulls remote changes
//! (embedded replica sync) and yields when the list differs.
//!
//! Feeds do not end: each one holds a [`DatabaseService`] clone, which keeps
//! the change channel open for as long as the feed exists.

use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};

use crate::models::{AccountId, Match, MatchId, Message};
use crate::Result;

use super::database::{ChangeEvent, DatabaseService};

enum Wake {
    Changed,
    Poll,
}

async fn wait_for_change(
    events: &mut broadcast::Receiver<ChangeEvent>,
    poll_interval: Option<Duration>,
    relevant: impl Fn(&ChangeEvent) -> bool,
) -> Wake {
    loop {
        let received = match poll_interval {
            Some(interval) => {
                tokio::select! {
                    received = events.recv() => received,
                    () = tokio::time::sleep(interval) => return Wake::Poll,
                }
            }
            None => events.recv().await,
        };
        match received {
            Ok(event) if relevant(&event) => return Wake::Changed,
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "feed lagged behind change events");
                return Wake::Changed;
            }
            // the feed's own DatabaseService owns the sender
            Err(RecvError::Closed) => return Wake::Changed,
        }
    }
}

/// Live view of the most recent messages of one match.
pub struct MessageFeed {
    db: DatabaseService,
    match_id: MatchId,
    limit: usize,
    events: broadcast::Receiver<ChangeEvent>,
    poll_interval: Option<Duration>,
    last: Option<Vec<Message>>,
}

impl MessageFeed {
    pub(crate) fn new(db: DatabaseService, match_id: MatchId, limit: usize) -> Self {
        let events = db.subscribe();
        Self {
            db,
            match_id,
            limit,
            events,
            poll_interval: None,
            last: None,
        }
    }

    /// Also sync and re-query every `interval`, yielding only on change.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Wait for the next snapshot.
    pub async fn next(&mut self) -> Result<Vec<Message>> {
        if self.last.is_some() {
            loop {
                let match_id = &self.match_id;
                let wake = wait_for_change(&mut self.events, self.poll_interval, |event| {
                    event.touches_match_messages(match_id)
                })
                .await;
                if matches!(wake, Wake::Changed) {
                    break;
                }
                self.db.sync().await?;
                let messages = self.snapshot().await?;
                if self.last.as_ref() != Some(&messages) {
                    return Ok(self.remember(messages));
                }
            }
        }
        let messages = self.snapshot().await?;
        Ok(self.remember(messages))
    }

    async fn snapshot(&self) -> Result<Vec<Message>> {
        self.db.list_recent_messages(&self.match_id, self.limit).await
    }

    fn remember(&mut self, messages: Vec<Message>) -> Vec<Message> {
        self.last = Some(messages.clone());
        messages
    }
}

/// Live view of an account's matches, newest first.
pub struct MatchFeed {
    db: DatabaseService,
    account: AccountId,
    events: broadcast::Receiver<ChangeEvent>,
    primed: bool,
}

impl MatchFeed {
    pub(crate) fn new(db: DatabaseService, account: AccountId) -> Self {
        let events = db.subscribe();
        Self {
            db,
            account,
            events,
            primed: false,
        }
    }

    /// Wait for the next snapshot.
    pub async fn next(&mut self) -> Result<Vec<Match>> {
        if self.primed {
            let account = &self.account;
            wait_for_change(&mut self.events, None, |event| {
                event.touches_account_matches(account)
            })
            .await;
        }
        self.primed = true;
        self.db.list_matches(&self.account).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, SwipeDecision, SwipeRecord};

    fn id(raw: &str) -> AccountId {
        AccountId::new(raw).unwrap()
    }

    async fn matched_pair() -> (DatabaseService, MatchId) {
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
        (db, MatchId::for_pair(&id("amy"), &id("zed")).unwrap())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn message_feed_yields_snapshot_then_updates() {
        let (db, match_id) = matched_pair().await;
        let mut feed = MessageFeed::new(db.clone(), match_id.clone(), 10);

        assert!(feed.next().await.unwrap().is_empty());

        let hello = Message::new(match_id.clone(), id("amy"), Some("hello".into()), None).unwrap();
        db.insert_message(&hello).await.unwrap();
        let snapshot = feed.next().await.unwrap();
        assert_eq!(snapshot, vec![hello]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn message_feed_ignores_other_matches() {
        let (db, match_id) = matched_pair().await;
        for (actor, target) in [("amy", "bob"), ("bob", "amy")] {
            db.record_swipe(&SwipeRecord::new(id(actor), id(target), SwipeDecision::Like).unwrap())
                .await
                .unwrap();
        }
        let other = MatchId::for_pair(&id("amy"), &id("bob")).unwrap();
        let mut feed = MessageFeed::new(db.clone(), match_id.clone(), 10);
        feed.next().await.unwrap();

        db.insert_message(&Message::new(other, id("bob"), Some("elsewhere".into()), None).unwrap())
            .await
            .unwrap();
        let wait = tokio::time::timeout(Duration::from_millis(100), feed.next()).await;
        assert!(wait.is_err(), "feed should still be waiting");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn match_feed_reports_new_matches() {
        let (db, _) = matched_pair().await;
        let mut feed = MatchFeed::new(db.clone(), id("bob"));
        assert!(feed.next().await.unwrap().is_empty());

        for (actor, target) in [("bob", "zed"), ("zed", "bob")] {
            db.record_swipe(&SwipeRecord::new(id(actor), id(target), SwipeDecision::Like).unwrap())
                .await
                .unwrap();
        }
        let matches = feed.next().await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id.as_str(), "bob_zed");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn polling_feed_stays_quiet_without_changes() {
        let (db, match_id) = matched_pair().await;
        let mut feed =
            MessageFeed::new(db, match_id, 10).with_poll_interval(Duration::from_millis(10));
        feed.next().await.unwrap();

        let wait = tokio::time::timeout(Duration::from_millis(100), feed.next()).await;
        assert!(wait.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn feed_keeps_waiting_after_caller_drops_service() {
        let (db, match_id) = matched_pair().await;
        let mut feed = MessageFeed::new(db.clone(), match_id, 10);
        feed.next().await.unwrap();
        drop(db);

        let wait = tokio::time::timeout(Duration::from_millis(100), feed.next()).await;
        assert!(wait.is_err(), "feed should not end or spin on its own");
    }
}
