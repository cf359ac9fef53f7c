//! Aggregation layer consumed by front ends.

mod chat;
mod database;
mod feeds;
mod matchmaking;
mod profile;

pub use chat::ChatService;
pub use database::{ChangeEvent, DatabaseService};
pub use feeds::{MatchFeed, MessageFeed};
pub use matchmaking::{MatchSummary, MatchmakingService};
pub use profile::ProfileService;
