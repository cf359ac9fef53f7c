//! Swipe deck, swiping and the match list.

use serde::Serialize;

use crate::db::SwipeOutcome;
use crate::deck::{build_deck, DeckCandidate};
use crate::models::{Account, AccountId, Match, MatchId, Message, SwipeDecision, SwipeRecord};
use crate::{Error, Result};

use super::database::DatabaseService;
use super::feeds::MatchFeed;

/// A match as shown in the conversation list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    pub record: Match,
    /// The other participant; `None` if their account is gone
    pub counterpart: Option<Account>,
    pub last_message: Option<Message>,
    pub unread: u64,
}

#[derive(Clone)]
pub struct MatchmakingService {
    db: DatabaseService,
}

impl MatchmakingService {
    pub const fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Candidates `requester` can swipe on, nearest first.
    pub async fn swipe_deck(
        &self,
        requester: &AccountId,
        limit: Option<usize>,
    ) -> Result<Vec<DeckCandidate>> {
        let account = self
            .db
            .get_account(requester)
            .await?
            .ok_or_else(|| Error::NotFound(format!("account {requester}")))?;

        let candidates = self
            .db
            .list_candidates(requester, account.preferences.gender.as_filter())
            .await?;
        let swiped = self.db.swiped_target_ids(requester).await?;
        let fetched = candidates.len();

        let deck = build_deck(&account, candidates, &swiped, limit);
        tracing::debug!(%requester, fetched, shown = deck.len(), "built swipe deck");
        Ok(deck)
    }

    /// Record a swipe; a mutual positive swipe creates the match.
    pub async fn swipe(
        &self,
        actor: &AccountId,
        target: &AccountId,
        decision: SwipeDecision,
    ) -> Result<SwipeOutcome> {
        let record = SwipeRecord::new(actor.clone(), target.clone(), decision)?;
        self.db.record_swipe(&record).await
    }

    /// Matches of `account`, newest first.
    pub async fn list_matches(&self, account: &AccountId) -> Result<Vec<Match>> {
        self.db.list_matches(account).await
    }

    /// Matches of `account` with counterpart, last message and unread count.
    pub async fn list_match_summaries(&self, account: &AccountId) -> Result<Vec<MatchSummary>> {
        let matches = self.db.list_matches(account).await?;
        let mut summaries = Vec::with_capacity(matches.len());
        for record in matches {
            let counterpart = match record.other_participant(account) {
                Some(other) => self.db.get_account(other).await?,
                None => None,
            };
            let last_message = self.db.last_message(&record.id).await?;
            let unread = self.db.unread_count(&record.id, account).await?;
            summaries.push(MatchSummary {
                record,
                counterpart,
                last_message,
                unread,
            });
        }
        Ok(summaries)
    }

    /// Fetch a match by id.
    pub async fn get_match(&self, id: &MatchId) -> Result<Match> {
        self.db
            .get_match(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("match {id}")))
    }

    /// Live match list of `account`.
    pub fn observe_matches(&self, account: &AccountId) -> MatchFeed {
        MatchFeed::new(self.db.clone(), account.clone())
    }
}
