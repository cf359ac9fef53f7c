pub mod auth_cmd;
pub mod chat;
pub mod common;
pub mod completions;
pub mod deck;
pub mod matches;
pub mod photo;
pub mod profile;
pub mod swipe;
pub mod sync;
