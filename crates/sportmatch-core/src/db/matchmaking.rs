//! Atomic swipe resolution
//!
//! Recording a swipe and creating the resulting match happen in one
//! `BEGIN IMMEDIATE` transaction. The write lock is taken up front, so two
//! accounts liking each other at the same moment are serialized and the pair
//! ends up with exactly one match record.

use libsql::Connection;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{Match, SwipeRecord};

use super::account_repository::{AccountRepository, LibSqlAccountRepository};
use super::match_repository::{LibSqlMatchRepository, MatchRepository};
use super::swipe_repository::{LibSqlSwipeRepository, SwipeRepository};

/// What a swipe led to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "match", rename_all = "snake_case")]
pub enum SwipeOutcome {
    /// The swipe was recorded; no mutual like exists
    NoMatch,
    /// This swipe completed a mutual like and created the match
    NewMatch(Match),
    /// The pair already had a match before this swipe
    AlreadyMatched(Match),
}

impl SwipeOutcome {
    /// The match involved, if any
    pub const fn matched(&self) -> Option<&Match> {
        match self {
            Self::NoMatch => None,
            Self::NewMatch(record) | Self::AlreadyMatched(record) => Some(record),
        }
    }
}

/// Record `swipe` and create the match when it completes a mutual like.
pub async fn resolve_swipe(conn: &Connection, swipe: &SwipeRecord) -> Result<SwipeOutcome> {
    conn.execute("BEGIN IMMEDIATE", ()).await?;

    match resolve_in_transaction(conn, swipe).await {
        Ok(outcome) => {
            conn.execute("COMMIT", ()).await?;
            Ok(outcome)
        }
        Err(e) => {
            conn.execute("ROLLBACK", ()).await.ok();
            Err(e)
        }
    }
}

async fn resolve_in_transaction(conn: &Connection, swipe: &SwipeRecord) -> Result<SwipeOutcome> {
    let accounts = LibSqlAccountRepository::new(conn);
    for id in [&swipe.actor_id, &swipe.target_id] {
        if accounts.get(id).await?.is_none() {
            return Err(Error::NotFound(format!("account {id}")));
        }
    }

    let swipes = LibSqlSwipeRepository::new(conn);
    swipes.upsert(swipe).await?;

    if !swipe.decision.is_positive()
        || !swipes.has_liked(&swipe.target_id, &swipe.actor_id).await?
    {
        return Ok(SwipeOutcome::NoMatch);
    }

    let matches = LibSqlMatchRepository::new(conn);
    let candidate = Match::between(&swipe.actor_id, &swipe.target_id)?;
    if matches.insert_if_absent(&candidate).await? {
        tracing::info!(match_id = %candidate.id, "mutual like created a match");
        return Ok(SwipeOutcome::NewMatch(candidate));
    }

    let existing = matches
        .get(&candidate.id)
        .await?
        .ok_or_else(|| Error::Database(format!("match {} vanished mid-transaction", candidate.id)))?;
    if existing.users != candidate.users {
        return Err(Error::Conflict(format!(
            "match id {} already belongs to another pair",
            candidate.id
        )));
    }
    Ok(SwipeOutcome::AlreadyMatched(existing))
}
