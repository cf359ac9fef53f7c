//! Data models for SportMatch

mod account;
mod location;
mod matches;
mod message;
mod swipe;

pub use account::{
    age_on, is_adult, normalize_interests, validate_name, Account, AccountId, GenderPreference,
    Preferences, ProfileUpdate, DEFAULT_MAX_DISTANCE_KM, MAX_PHOTOS, MINIMUM_AGE,
};
pub use location::GeoPoint;
pub use matches::{ordered_pair, Match, MatchId, MATCH_ID_SEPARATOR};
pub use message::{Message, MessageId};
pub use swipe::{SwipeDecision, SwipeRecord};
