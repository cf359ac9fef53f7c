//! Match model

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

use super::account::AccountId;

/// Joins the two participant ids inside a match id.
pub const MATCH_ID_SEPARATOR: char = '_';

/// Canonical identifier of the match between two accounts.
///
/// Built as `min(a, b) + "_" + max(a, b)` under lexicographic ordering, so both
/// participants derive the same id independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    /// Derive the match id for an unordered pair of distinct accounts.
    pub fn for_pair(a: &AccountId, b: &AccountId) -> Result<Self> {
        let (first, second) = ordered_pair(a, b)?;
        Ok(Self(format!("{first}{MATCH_ID_SEPARATOR}{second}")))
    }

    /// Wrap a stored match id without re-deriving it.
    pub fn from_raw(id: impl Into<String>) -> Result<Self> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(Error::InvalidInput("Match id cannot be empty".to_string()));
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Order two distinct account ids lexicographically.
pub fn ordered_pair<'a>(a: &'a AccountId, b: &'a AccountId) -> Result<(&'a AccountId, &'a AccountId)> {
    if a == b {
        return Err(Error::InvalidInput(
            "A match needs two distinct accounts".to_string(),
        ));
    }
    Ok(if a < b { (a, b) } else { (b, a) })
}

/// A mutually agreed connection between two accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    /// Participants in canonical (lexicographic) order
    pub users: [AccountId; 2],
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}

impl Match {
    /// Create the match record for two accounts, stamped now.
    pub fn between(a: &AccountId, b: &AccountId) -> Result<Self> {
        let id = MatchId::for_pair(a, b)?;
        let (first, second) = ordered_pair(a, b)?;
        Ok(Self {
            id,
            users: [first.clone(), second.clone()],
            created_at: chrono::Utc::now().timestamp_millis(),
        })
    }

    /// Whether `account` is one of the two participants.
    #[must_use]
    pub fn involves(&self, account: &AccountId) -> bool {
        self.users.contains(account)
    }

    /// The participant that is not `me`, if `me` takes part in the match.
    #[must_use]
    pub fn other_participant(&self, me: &AccountId) -> Option<&AccountId> {
        if !self.involves(me) {
            return None;
        }
        self.users.iter().find(|user| *user != me)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> AccountId {
        AccountId::new(value).unwrap()
    }

    #[test]
    fn test_match_id_is_order_independent() {
        let pairs = [("alice", "bob"), ("zed", "amy"), ("u10", "u9"), ("A", "a")];
        for (a, b) in pairs {
            assert_eq!(
                MatchId::for_pair(&id(a), &id(b)).unwrap(),
                MatchId::for_pair(&id(b), &id(a)).unwrap()
            );
        }
    }

    #[test]
    fn test_match_id_puts_smaller_id_first() {
        let match_id = MatchId::for_pair(&id("zed"), &id("amy")).unwrap();
        assert_eq!(match_id.as_str(), "amy_zed");
    }

    #[test]
    fn test_match_id_rejects_same_account() {
        assert!(MatchId::for_pair(&id("alice"), &id("alice")).is_err());
    }

    #[test]
    fn test_other_participant() {
        let record = Match::between(&id("bob"), &id("alice")).unwrap();
        assert_eq!(record.users, [id("alice"), id("bob")]);
        assert_eq!(record.other_participant(&id("alice")), Some(&id("bob")));
        assert_eq!(record.other_participant(&id("bob")), Some(&id("alice")));
        assert_eq!(record.other_participant(&id("carol")), None);
    }
}
