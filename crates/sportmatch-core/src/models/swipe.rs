//! Swipe model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

use super::account::AccountId;

/// A unilateral decision by one account about another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDecision {
    Like,
    Pass,
    SuperLike,
}

impl SwipeDecision {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Pass => "pass",
            Self::SuperLike => "super_like",
        }
    }

    /// Likes and super-likes count towards a match; passes never do.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        matches!(self, Self::Like | Self::SuperLike)
    }
}

impl fmt::Display for SwipeDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwipeDecision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "like" => Ok(Self::Like),
            "pass" => Ok(Self::Pass),
            "super_like" | "superlike" => Ok(Self::SuperLike),
            other => Err(Error::InvalidInput(format!(
                "Unknown swipe decision '{other}'"
            ))),
        }
    }
}

/// The latest decision `actor_id` made about `target_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeRecord {
    pub actor_id: AccountId,
    pub target_id: AccountId,
    pub decision: SwipeDecision,
    /// Swipe timestamp (Unix ms)
    pub swiped_at: i64,
}

impl SwipeRecord {
    /// Create a swipe record stamped with the current time.
    pub fn new(actor_id: AccountId, target_id: AccountId, decision: SwipeDecision) -> Result<Self> {
        if actor_id == target_id {
            return Err(Error::InvalidInput(
                "An account cannot swipe on itself".to_string(),
            ));
        }
        Ok(Self {
            actor_id,
            target_id,
            decision,
            swiped_at: chrono::Utc::now().timestamp_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_parse_roundtrip() {
        for decision in [SwipeDecision::Like, SwipeDecision::Pass, SwipeDecision::SuperLike] {
            assert_eq!(decision.as_str().parse::<SwipeDecision>().unwrap(), decision);
        }
        assert_eq!(
            "Super-Like".parse::<SwipeDecision>().unwrap(),
            SwipeDecision::SuperLike
        );
        assert!("maybe".parse::<SwipeDecision>().is_err());
    }

    #[test]
    fn test_only_pass_is_negative() {
        assert!(SwipeDecision::Like.is_positive());
        assert!(SwipeDecision::SuperLike.is_positive());
        assert!(!SwipeDecision::Pass.is_positive());
    }

    #[test]
    fn test_self_swipe_rejected() {
        let me = AccountId::new("me").unwrap();
        assert!(SwipeRecord::new(me.clone(), me, SwipeDecision::Like).is_err());
    }
}
