//! Database layer for SportMatch

mod account_repository;
mod connection;
mod match_repository;
mod matchmaking;
mod message_repository;
mod migrations;
mod swipe_repository;
mod values;

pub use account_repository::{AccountRepository, LibSqlAccountRepository};
pub use connection::{Database, SyncConfig};
pub use match_repository::{LibSqlMatchRepository, MatchRepository};
pub use matchmaking::{resolve_swipe, SwipeOutcome};
pub use message_repository::{LibSqlMessageRepository, MessageRepository};
pub use swipe_repository::{LibSqlSwipeRepository, SwipeRepository};
