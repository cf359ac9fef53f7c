//! sportmatch-core - Core library for SportMatch
//!
//! Shared models, the libSQL-backed data layer, blob storage, auth, and the
//! matching/chat services used by every SportMatch front end.

pub mod auth;
pub mod config;
pub mod db;
pub mod deck;
pub mod error;
pub mod geo;
pub mod models;
pub mod services;
pub mod storage;
mod util;

pub use error::{Error, Result};
pub use models::{
    Account, AccountId, GeoPoint, Match, MatchId, Message, MessageId, SwipeDecision, SwipeRecord,
};
