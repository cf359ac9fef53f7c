use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use sportmatch_core::config::AppConfig;
use sportmatch_core::deck::DeckCandidate;
use sportmatch_core::services::{
    ChatService, DatabaseService, MatchSummary, MatchmakingService, ProfileService,
};
use sportmatch_core::storage::ConfiguredBlobStore;
use sportmatch_core::{Account, AccountId, MatchId, Message, MessageId};

use crate::auth::SupabaseAuthService;
use crate::error::CliError;

/// Everything a command needs: configuration, the open database and the
/// blob store media goes to.
pub struct Context {
    pub config: AppConfig,
    pub db: DatabaseService,
    pub blobs: ConfiguredBlobStore,
    act_as: Option<String>,
}

impl Context {
    pub async fn open(
        cli_db_path: Option<PathBuf>,
        act_as: Option<String>,
    ) -> Result<Self, CliError> {
        let config = AppConfig::from_env()?;
        let db_path = resolve_db_path(cli_db_path, &config);
        tracing::debug!(path = %db_path.display(), sync = config.sync.is_some(), "opening database");
        let db = DatabaseService::open_path(db_path, config.sync.clone()).await?;
        let blobs = config.blob_store(&default_media_dir());
        Ok(Self::new(config, db, blobs, act_as))
    }

    pub const fn new(
        config: AppConfig,
        db: DatabaseService,
        blobs: ConfiguredBlobStore,
        act_as: Option<String>,
    ) -> Self {
        Self {
            config,
            db,
            blobs,
            act_as,
        }
    }

    pub fn profiles(&self) -> ProfileService<ConfiguredBlobStore> {
        ProfileService::new(self.db.clone(), self.blobs.clone())
    }

    pub fn matchmaking(&self) -> MatchmakingService {
        MatchmakingService::new(self.db.clone())
    }

    pub fn chat(&self) -> ChatService<ConfiguredBlobStore> {
        ChatService::new(self.db.clone(), self.blobs.clone())
            .with_page_size(self.config.message_page_size)
    }

    /// The account commands act on: `--as` when given, else the signed-in user.
    pub async fn current_account(&self) -> Result<AccountId, CliError> {
        if let Some(id) = &self.act_as {
            return Ok(AccountId::new(id.as_str())?);
        }
        let Some(settings) = self.config.supabase.as_ref() else {
            return Err(CliError::NotSignedIn);
        };
        let session = SupabaseAuthService::new(settings)?
            .restore_session()
            .await?
            .ok_or(CliError::NotSignedIn)?;
        Ok(session.user.account_id()?)
    }
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>, config: &AppConfig) -> PathBuf {
    cli_db_path.unwrap_or_else(|| config.db_path_or(&default_db_path()))
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sportmatch")
}

pub fn default_db_path() -> PathBuf {
    data_dir().join("sportmatch.db")
}

pub fn default_media_dir() -> PathBuf {
    data_dir().join("media")
}

pub fn parse_match_id(raw: &str) -> Result<MatchId, CliError> {
    Ok(MatchId::from_raw(raw.trim())?)
}

pub fn read_image(path: &Path) -> Result<Vec<u8>, CliError> {
    Ok(std::fs::read(path)?)
}

/// Join message words and reject blank text.
pub fn normalize_message_text(parts: &[String]) -> Result<String, CliError> {
    let text = parts.join(" ");
    let text = text.trim();
    if text.is_empty() {
        return Err(CliError::EmptyMessage);
    }
    Ok(text.to_string())
}

#[derive(Debug, Serialize)]
pub struct MatchListItem {
    pub id: String,
    pub counterpart_id: Option<String>,
    pub counterpart_name: Option<String>,
    pub last_message: Option<String>,
    pub unread: u64,
    pub created_at: i64,
    pub relative_time: String,
}

pub fn match_to_list_item(summary: &MatchSummary, me: &AccountId) -> MatchListItem {
    let now_ms = Utc::now().timestamp_millis();
    let activity = summary
        .last_message
        .as_ref()
        .map_or(summary.record.created_at, |message| message.sent_at);

    MatchListItem {
        id: summary.record.id.to_string(),
        counterpart_id: summary
            .record
            .other_participant(me)
            .map(ToString::to_string),
        counterpart_name: summary.counterpart.as_ref().map(|account| account.name.clone()),
        last_message: summary.last_message.as_ref().map(|message| message.preview(60)),
        unread: summary.unread,
        created_at: summary.record.created_at,
        relative_time: format_relative_time(activity, now_ms),
    }
}

pub fn format_match_lines(summaries: &[MatchSummary], me: &AccountId) -> Vec<String> {
    summaries
        .iter()
        .map(|summary| {
            let item = match_to_list_item(summary, me);
            let name = item
                .counterpart_name
                .unwrap_or_else(|| "(deleted account)".to_string());
            let preview = item
                .last_message
                .unwrap_or_else(|| "Say hi!".to_string());
            let unread = if item.unread > 0 {
                format!("  ({} new)", item.unread)
            } else {
                String::new()
            };
            format!(
                "{:<24}  {name:<16}  {preview:<40}  {}{unread}",
                item.id, item.relative_time
            )
        })
        .collect()
}

pub fn format_deck_lines(deck: &[DeckCandidate]) -> Vec<String> {
    deck.iter()
        .map(|candidate| {
            let account = &candidate.account;
            let interests = account.interests.join(", ");
            format!(
                "{:<20}  {:<16}  {:>3}  {:>7.1} km  {interests}",
                account.id, account.name, account.age, candidate.distance_km
            )
        })
        .collect()
}

pub fn format_message_lines(messages: &[Message], me: &AccountId) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    messages
        .iter()
        .map(|message| {
            let who = if &message.sender_id == me {
                "you".to_string()
            } else {
                message.sender_id.to_string()
            };
            let mut body = message.text.clone().unwrap_or_default();
            if let Some(url) = &message.image_url {
                if !body.is_empty() {
                    body.push(' ');
                }
                body.push_str(&format!("[image {url}]"));
            }
            let seen = if &message.sender_id == me && message.seen {
                " ✓"
            } else {
                ""
            };
            format!(
                "{:<10} {who}: {body}{seen}",
                format_relative_time(message.sent_at, now_ms)
            )
        })
        .collect()
}

/// Messages that came after `last_printed`; everything when it scrolled out.
pub fn messages_after<'a>(
    messages: &'a [Message],
    last_printed: Option<&MessageId>,
) -> &'a [Message] {
    let Some(last_printed) = last_printed else {
        return messages;
    };
    messages
        .iter()
        .position(|message| &message.id == last_printed)
        .map_or(messages, |index| &messages[index + 1..])
}

pub fn format_profile(account: &Account) -> Vec<String> {
    let mut lines = vec![
        format!("{} ({})", account.name, account.id),
        format!("Age:        {}", account.age),
    ];
    if !account.gender.is_empty() {
        lines.push(format!("Gender:     {}", account.gender));
    }
    if !account.experience_level.is_empty() {
        lines.push(format!("Level:      {}", account.experience_level));
    }
    if !account.interests.is_empty() {
        lines.push(format!("Interests:  {}", account.interests.join(", ")));
    }
    if !account.bio.is_empty() {
        lines.push(format!("Bio:        {}", account.bio));
    }
    let looking_for = account
        .preferences
        .gender
        .as_filter()
        .unwrap_or("everyone");
    lines.push(format!(
        "Looking for {looking_for} within {} km",
        account.preferences.max_distance_km
    ));
    if let Some(location) = account.location {
        lines.push(format!("Location:   {:.4}, {:.4}", location.lat, location.lon));
    }
    lines.push(format!(
        "Photos:     {}{}",
        account.photos.len(),
        if account.has_complete_photos() {
            ""
        } else {
            " (add at least one to complete your profile)"
        }
    ));
    lines
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format!("{}w ago", diff / week)
    }
}
