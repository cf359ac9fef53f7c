//! Account repository implementation

use chrono::NaiveDate;
use libsql::{params, Connection, Row};

use crate::error::{Error, Result};
use crate::models::{Account, AccountId, GenderPreference, GeoPoint, Preferences};

use super::values::{account_id, optional_real, optional_text, real_or_null, string_list, text_or_null};

const ACCOUNT_COLUMNS: &str = "id, name, age, birth_date, bio, gender, interests, photos, \
     latitude, longitude, preferred_gender, max_distance_km, experience_level, created_at, updated_at";

const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";

/// Trait for account storage operations (async)
#[allow(async_fn_in_trait)]
pub trait AccountRepository {
    /// Insert a new account; fails with `Conflict` when the id is taken
    async fn insert(&self, account: &Account) -> Result<()>;

    /// Get an account by id
    async fn get(&self, id: &AccountId) -> Result<Option<Account>>;

    /// Overwrite every mutable field of an existing account
    async fn update(&self, account: &Account) -> Result<()>;

    /// Hard delete an account (cascades to swipes, matches, messages)
    async fn delete(&self, id: &AccountId) -> Result<()>;

    /// Every account except `exclude`, optionally restricted to one gender
    async fn list_candidates(&self, exclude: &AccountId, gender: Option<&str>)
        -> Result<Vec<Account>>;
}

/// libSQL implementation of `AccountRepository`
pub struct LibSqlAccountRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlAccountRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_account(row: &Row) -> Result<Account> {
        let birth_date = optional_text(row, 3)?
            .map(|raw| {
                NaiveDate::parse_from_str(&raw, BIRTH_DATE_FORMAT)
                    .map_err(|error| Error::Database(format!("invalid birth_date '{raw}': {error}")))
            })
            .transpose()?;
        let location = match (optional_real(row, 8)?, optional_real(row, 9)?) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        };
        let gender = optional_text(row, 10)?
            .map_or(GenderPreference::Any, |value| GenderPreference::parse(&value));

        Ok(Account {
            id: account_id(row, 0)?,
            name: row.get(1)?,
            age: u32::try_from(row.get::<i64>(2)?).unwrap_or(0),
            birth_date,
            bio: row.get(4)?,
            gender: row.get(5)?,
            interests: string_list(row, 6)?,
            photos: string_list(row, 7)?,
            location,
            preferences: Preferences {
                gender,
                max_distance_km: u32::try_from(row.get::<i64>(11)?).unwrap_or(0),
            },
            experience_level: row.get(12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }

    async fn collect(&self, mut rows: libsql::Rows) -> Result<Vec<Account>> {
        let mut accounts = Vec::new();
        while let Some(row) = rows.next().await? {
            accounts.push(Self::parse_account(&row)?);
        }
        Ok(accounts)
    }
}

impl AccountRepository for LibSqlAccountRepository<'_> {
    async fn insert(&self, account: &Account) -> Result<()> {
        let birth_date = account
            .birth_date
            .map(|date| date.format(BIRTH_DATE_FORMAT).to_string());
        let rows = self
            .conn
            .execute(
                &format!(
                    "INSERT INTO accounts ({ACCOUNT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                     ON CONFLICT(id) DO NOTHING"
                ),
                params![
                    account.id.as_str(),
                    account.name.as_str(),
                    i64::from(account.age),
                    text_or_null(birth_date.as_deref()),
                    account.bio.as_str(),
                    account.gender.as_str(),
                    serde_json::to_string(&account.interests)?,
                    serde_json::to_string(&account.photos)?,
                    real_or_null(account.location.map(|point| point.lat)),
                    real_or_null(account.location.map(|point| point.lon)),
                    text_or_null(account.preferences.gender.as_filter()),
                    i64::from(account.preferences.max_distance_km),
                    account.experience_level.as_str(),
                    account.created_at,
                    account.updated_at
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::Conflict(format!(
                "account {} already exists",
                account.id
            )));
        }
        Ok(())
    }

    async fn get(&self, id: &AccountId) -> Result<Option<Account>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
                [id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_account(&row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, account: &Account) -> Result<()> {
        let birth_date = account
            .birth_date
            .map(|date| date.format(BIRTH_DATE_FORMAT).to_string());
        let rows = self
            .conn
            .execute(
                "UPDATE accounts SET
                    name = ?2, age = ?3, birth_date = ?4, bio = ?5, gender = ?6,
                    interests = ?7, photos = ?8, latitude = ?9, longitude = ?10,
                    preferred_gender = ?11, max_distance_km = ?12, experience_level = ?13,
                    updated_at = ?14
                 WHERE id = ?1",
                params![
                    account.id.as_str(),
                    account.name.as_str(),
                    i64::from(account.age),
                    text_or_null(birth_date.as_deref()),
                    account.bio.as_str(),
                    account.gender.as_str(),
                    serde_json::to_string(&account.interests)?,
                    serde_json::to_string(&account.photos)?,
                    real_or_null(account.location.map(|point| point.lat)),
                    real_or_null(account.location.map(|point| point.lon)),
                    text_or_null(account.preferences.gender.as_filter()),
                    i64::from(account.preferences.max_distance_km),
                    account.experience_level.as_str(),
                    account.updated_at
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("account {}", account.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: &AccountId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM accounts WHERE id = ?1", [id.as_str()])
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("account {id}")));
        }
        Ok(())
    }

    async fn list_candidates(
        &self,
        exclude: &AccountId,
        gender: Option<&str>,
    ) -> Result<Vec<Account>> {
        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT {ACCOUNT_COLUMNS} FROM accounts
                     WHERE id <> ?1 AND (?2 IS NULL OR gender = ?2 COLLATE NOCASE)
                     ORDER BY created_at DESC"
                ),
                params![exclude.as_str(), text_or_null(gender)],
            )
            .await?;
        tracing::debug!(requester = %exclude, ?gender, "loaded deck candidates");
        self.collect(rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn sample(id: &str, gender: &str) -> Account {
        let mut account = Account::new(
            AccountId::new(id).unwrap(),
            "Sam",
            NaiveDate::from_ymd_opt(1995, 4, 2),
        );
        account.gender = gender.to_string();
        account.interests = vec!["Climbing".to_string(), "Yoga".to_string()];
        account.photos = vec!["https://cdn.example/p0.jpg".to_string()];
        account.location = Some(GeoPoint::new(48.85, 2.35));
        account.preferences = Preferences {
            gender: GenderPreference::Only("Female".to_string()),
            max_distance_km: 25,
        };
        account.experience_level = "Intermediate".to_string();
        account
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_insert_and_get_roundtrip() {
        let db = setup().await;
        let repo = LibSqlAccountRepository::new(db.connection());

        let account = sample("u1", "Male");
        repo.insert(&account).await.unwrap();

        let fetched = repo.get(&account.id).await.unwrap().unwrap();
        assert_eq!(fetched, account);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_insert_duplicate_is_conflict() {
        let db = setup().await;
        let repo = LibSqlAccountRepository::new(db.connection());

        repo.insert(&sample("u1", "Male")).await.unwrap();
        let error = repo.insert(&sample("u1", "Male")).await.unwrap_err();
        assert!(matches!(error, Error::Conflict(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_and_delete() {
        let db = setup().await;
        let repo = LibSqlAccountRepository::new(db.connection());

        let mut account = sample("u1", "Male");
        repo.insert(&account).await.unwrap();

        account.bio = "Marathons on weekends".to_string();
        account.location = None;
        repo.update(&account).await.unwrap();
        let fetched = repo.get(&account.id).await.unwrap().unwrap();
        assert_eq!(fetched.bio, "Marathons on weekends");
        assert_eq!(fetched.location, None);

        repo.delete(&account.id).await.unwrap();
        assert!(repo.get(&account.id).await.unwrap().is_none());
        assert!(repo.delete(&account.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_candidates_excludes_requester_and_filters_gender() {
        let db = setup().await;
        let repo = LibSqlAccountRepository::new(db.connection());

        repo.insert(&sample("me", "Male")).await.unwrap();
        repo.insert(&sample("f1", "Female")).await.unwrap();
        repo.insert(&sample("m1", "Male")).await.unwrap();

        let me = AccountId::new("me").unwrap();
        let all = repo.list_candidates(&me, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|account| account.id != me));

        let women = repo.list_candidates(&me, Some("female")).await.unwrap();
        assert_eq!(women.len(), 1);
        assert_eq!(women[0].id.as_str(), "f1");
    }
}
