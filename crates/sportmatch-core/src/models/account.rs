//! Account (user profile) model

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{Error, Result};

use super::location::GeoPoint;
use super::matches::MATCH_ID_SEPARATOR;

/// Maximum number of profile photos an account can hold.
pub const MAX_PHOTOS: usize = 5;

/// Default search radius for the swipe deck, in kilometres.
pub const DEFAULT_MAX_DISTANCE_KM: u32 = 50;

/// Minimum age to hold an account.
pub const MINIMUM_AGE: u32 = 18;

/// Identifier issued by the auth backend for an account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wrap a backend-issued identifier.
    ///
    /// Blank ids are rejected, and so are ids containing the match id
    /// separator, which would let two different pairs share one match id.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(Error::InvalidInput("Account id cannot be empty".to_string()));
        }
        if id.contains(MATCH_ID_SEPARATOR) {
            return Err(Error::InvalidInput(format!(
                "Account id cannot contain '{MATCH_ID_SEPARATOR}'"
            )));
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl std::str::FromStr for AccountId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Which genders an account wants to see in its deck.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenderPreference {
    /// No gender filtering
    #[default]
    Any,
    /// Only accounts whose gender equals this value
    Only(String),
}

impl GenderPreference {
    /// Parse a stored/user-entered value. Empty and "all" mean [`GenderPreference::Any`].
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") || value.eq_ignore_ascii_case("any")
        {
            Self::Any
        } else {
            Self::Only(value.to_string())
        }
    }

    /// The gender value to filter on, if any.
    pub fn as_filter(&self) -> Option<&str> {
        match self {
            Self::Any => None,
            Self::Only(gender) => Some(gender),
        }
    }

    /// Whether an account with `gender` satisfies this preference.
    pub fn accepts(&self, gender: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Only(wanted) => wanted.eq_ignore_ascii_case(gender.trim()),
        }
    }
}

/// Matching preferences of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Preferred gender of candidates
    pub gender: GenderPreference,
    /// Maximum candidate distance in kilometres
    pub max_distance_km: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            gender: GenderPreference::Any,
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
        }
    }
}

/// A user profile in the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    /// Age in years, derived from `birth_date` when one is known
    pub age: u32,
    pub birth_date: Option<NaiveDate>,
    pub bio: String,
    pub gender: String,
    /// Interest tags (trimmed, deduplicated case-insensitively)
    pub interests: Vec<String>,
    /// Photo URLs, at most [`MAX_PHOTOS`]
    pub photos: Vec<String>,
    pub location: Option<GeoPoint>,
    pub preferences: Preferences,
    pub experience_level: String,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Account {
    /// Create a fresh account with the given name and optional birth date.
    pub fn new(id: AccountId, name: impl Into<String>, birth_date: Option<NaiveDate>) -> Self {
        let now = chrono::Utc::now();
        let today = now.date_naive();
        Self {
            id,
            name: name.into().trim().to_string(),
            age: birth_date.map_or(0, |birth| age_on(birth, today)),
            birth_date,
            bio: String::new(),
            gender: String::new(),
            interests: Vec::new(),
            photos: Vec::new(),
            location: None,
            preferences: Preferences::default(),
            experience_level: String::new(),
            created_at: now.timestamp_millis(),
            updated_at: now.timestamp_millis(),
        }
    }

    /// A profile is complete once it has between 1 and [`MAX_PHOTOS`] photos.
    #[must_use]
    pub fn has_complete_photos(&self) -> bool {
        (1..=MAX_PHOTOS).contains(&self.photos.len())
    }

    /// Location used for distance checks; a missing location counts as the origin.
    #[must_use]
    pub fn location_or_origin(&self) -> GeoPoint {
        self.location.unwrap_or_default()
    }
}

/// Partial profile edit. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub interests: Option<Vec<String>>,
    pub experience_level: Option<String>,
    pub birth_date: Option<NaiveDate>,
    /// Which genders to see in the deck
    pub looking_for: Option<GenderPreference>,
    pub max_distance_km: Option<u32>,
    pub location: Option<GeoPoint>,
}

impl ProfileUpdate {
    /// Apply the edit to `account`, validating the edited fields.
    pub fn apply(self, account: &mut Account, today: NaiveDate) -> Result<()> {
        if let Some(name) = self.name {
            account.name = validate_name(&name)?;
        }
        if let Some(bio) = self.bio {
            account.bio = bio.trim().to_string();
        }
        if let Some(gender) = self.gender {
            account.gender = gender.trim().to_string();
        }
        if let Some(interests) = self.interests {
            account.interests = normalize_interests(interests);
        }
        if let Some(level) = self.experience_level {
            account.experience_level = level.trim().to_string();
        }
        if let Some(birth_date) = self.birth_date {
            let age = age_on(birth_date, today);
            if age < MINIMUM_AGE {
                return Err(Error::InvalidInput(format!(
                    "You must be at least {MINIMUM_AGE} years old"
                )));
            }
            account.birth_date = Some(birth_date);
            account.age = age;
        }
        if let Some(looking_for) = self.looking_for {
            account.preferences.gender = looking_for;
        }
        if let Some(max_distance_km) = self.max_distance_km {
            account.preferences.max_distance_km = max_distance_km;
        }
        if let Some(location) = self.location {
            account.location = Some(location.validated()?);
        }
        account.updated_at = chrono::Utc::now().timestamp_millis();
        Ok(())
    }
}

/// Whole years elapsed between `birth_date` and `today`.
#[must_use]
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}

/// Whether someone born on `birth_date` is an adult on `today`.
#[must_use]
pub fn is_adult(birth_date: NaiveDate, today: NaiveDate) -> bool {
    age_on(birth_date, today) >= MINIMUM_AGE
}

/// Trim a display name and require at least two characters.
pub fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.chars().count() < 2 {
        return Err(Error::InvalidInput(
            "Name must be at least 2 characters".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// Trim interest tags, drop empties, and remove case-insensitive duplicates.
#[must_use]
pub fn normalize_interests(interests: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    interests
        .into_iter()
        .map(|interest| interest.trim().to_string())
        .filter(|interest| !interest.is_empty())
        .filter(|interest| seen.insert(interest.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_account_id_rejects_blank() {
        assert!(AccountId::new("   ").is_err());
        assert_eq!(AccountId::new(" abc ").unwrap().as_str(), "abc");
    }

    #[test]
    fn test_account_id_rejects_match_separator() {
        let error = AccountId::new("a_b").unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
        assert!("b_c".parse::<AccountId>().is_err());
        assert!(AccountId::new("0190a5b2-7c1e-7d33-9f10-6a2b3c4d5e6f").is_ok());
    }

    #[test]
    fn test_age_before_and_after_birthday() {
        let birth = date(2000, 6, 15);
        assert_eq!(age_on(birth, date(2024, 6, 14)), 23);
        assert_eq!(age_on(birth, date(2024, 6, 15)), 24);
        assert_eq!(age_on(birth, date(2024, 12, 1)), 24);
    }

    #[test]
    fn test_is_adult_boundary() {
        let birth = date(2006, 3, 10);
        assert!(!is_adult(birth, date(2024, 3, 9)));
        assert!(is_adult(birth, date(2024, 3, 10)));
    }

    #[test]
    fn test_gender_preference_parse() {
        assert_eq!(GenderPreference::parse(""), GenderPreference::Any);
        assert_eq!(GenderPreference::parse("All"), GenderPreference::Any);
        assert_eq!(
            GenderPreference::parse(" Female "),
            GenderPreference::Only("Female".to_string())
        );
        assert!(GenderPreference::parse("Female").accepts("female"));
        assert!(!GenderPreference::parse("Female").accepts("Male"));
    }

    #[test]
    fn test_normalize_interests_dedups_case_insensitively() {
        let interests = normalize_interests(vec![
            " Running ".to_string(),
            "running".to_string(),
            String::new(),
            "Climbing".to_string(),
        ]);
        assert_eq!(interests, vec!["Running", "Climbing"]);
    }

    #[test]
    fn test_profile_update_recomputes_age() {
        let mut account = Account::new(AccountId::new("u1").unwrap(), "Alex", None);
        let update = ProfileUpdate {
            birth_date: Some(date(1990, 1, 1)),
            bio: Some("  trail runner ".to_string()),
            ..ProfileUpdate::default()
        };
        update.apply(&mut account, date(2020, 1, 1)).unwrap();
        assert_eq!(account.age, 30);
        assert_eq!(account.bio, "trail runner");
    }

    #[test]
    fn test_profile_update_rejects_minor_and_short_name() {
        let mut account = Account::new(AccountId::new("u1").unwrap(), "Alex", None);
        let minor = ProfileUpdate {
            birth_date: Some(date(2010, 1, 1)),
            ..ProfileUpdate::default()
        };
        assert!(minor.apply(&mut account, date(2020, 1, 1)).is_err());

        let short = ProfileUpdate {
            name: Some(" A ".to_string()),
            ..ProfileUpdate::default()
        };
        assert!(short.apply(&mut account, date(2020, 1, 1)).is_err());
    }

    #[test]
    fn test_complete_photos_bounds() {
        let mut account = Account::new(AccountId::new("u1").unwrap(), "Alex", None);
        assert!(!account.has_complete_photos());
        account.photos = vec!["a".to_string(); 5];
        assert!(account.has_complete_photos());
        account.photos.push("b".to_string());
        assert!(!account.has_complete_photos());
    }
}
