//! Account registration, profile edits, photos and account deletion.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::auth::SignupRequest;
use crate::models::{
    is_adult, validate_name, Account, AccountId, ProfileUpdate, MAX_PHOTOS, MINIMUM_AGE,
};
use crate::storage::{profile_photo_key, BlobStore, JPEG_CONTENT_TYPE};
use crate::{Error, Result};

use super::database::DatabaseService;

pub struct ProfileService<B: BlobStore> {
    db: DatabaseService,
    blobs: B,
}

impl<B: BlobStore> ProfileService<B> {
    pub const fn new(db: DatabaseService, blobs: B) -> Self {
        Self { db, blobs }
    }

    /// Create the profile of a freshly signed-up user.
    pub async fn register(&self, id: AccountId, request: &SignupRequest) -> Result<Account> {
        request.validate(today())?;
        self.create_profile(id, &request.name, request.birth_date).await
    }

    /// Create the profile of an account the auth backend already knows.
    pub async fn create_profile(
        &self,
        id: AccountId,
        name: &str,
        birth_date: NaiveDate,
    ) -> Result<Account> {
        let name = validate_name(name)?;
        if !is_adult(birth_date, today()) {
            return Err(Error::InvalidInput(format!(
                "You must be at least {MINIMUM_AGE} years old"
            )));
        }
        let account = Account::new(id, name, Some(birth_date));
        self.db.insert_account(&account).await?;
        tracing::info!(account = %account.id, "registered account");
        Ok(account)
    }

    pub async fn get_account(&self, id: &AccountId) -> Result<Account> {
        self.db
            .get_account(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("account {id}")))
    }

    /// Apply a partial edit and return the saved account.
    pub async fn update_profile(&self, id: &AccountId, update: ProfileUpdate) -> Result<Account> {
        let mut account = self.get_account(id).await?;
        update.apply(&mut account, today())?;
        self.db.update_account(&account).await?;
        Ok(account)
    }

    /// Upload a photo into slot `index`, replacing the photo there or
    /// appending when `index` is past the end. Returns the photo URL.
    pub async fn upload_profile_photo(
        &self,
        id: &AccountId,
        index: usize,
        bytes: &[u8],
    ) -> Result<String> {
        if index >= MAX_PHOTOS {
            return Err(Error::InvalidInput(format!(
                "Photo index must be below {MAX_PHOTOS}"
            )));
        }
        if bytes.is_empty() {
            return Err(Error::InvalidInput("Photo is empty".to_string()));
        }
        let mut account = self.get_account(id).await?;

        let key = self.photo_key_for_slot(&account, index)?;
        let url = self.blobs.put(&key, bytes, Some(JPEG_CONTENT_TYPE)).await?;

        let appended = index >= account.photos.len();
        if appended {
            account.photos.push(url.clone());
        } else {
            account.photos[index] = url.clone();
        }
        account.updated_at = crate::util::unix_millis_now();
        if let Err(error) = self.db.update_account(&account).await {
            // a replaced slot's key is still referenced by the stored profile
            if appended {
                if let Err(cleanup) = self.blobs.delete(&key).await {
                    tracing::warn!(%key, error = %cleanup, "failed to remove orphaned profile photo");
                }
            }
            return Err(error);
        }
        Ok(url)
    }

    /// Pick the object key a photo for slot `index` is written to.
    ///
    /// Replacing reuses the key of the photo being replaced. Appending takes
    /// the lowest `photo_{n}` key no current photo uses, so a photo that
    /// shifted position after a deletion is never overwritten.
    fn photo_key_for_slot(&self, account: &Account, index: usize) -> Result<String> {
        if let Some(existing) = account.photos.get(index) {
            if let Some(key) = self.blobs.key_for_url(existing) {
                return Ok(key);
            }
            return profile_photo_key(&account.id, index);
        }
        if account.photos.len() >= MAX_PHOTOS {
            return Err(Error::InvalidInput(format!(
                "A profile holds at most {MAX_PHOTOS} photos"
            )));
        }

        let used: HashSet<String> = account
            .photos
            .iter()
            .filter_map(|url| self.blobs.key_for_url(url))
            .collect();
        (0..MAX_PHOTOS)
            .map(|slot| profile_photo_key(&account.id, slot))
            .find(|key| key.as_ref().map_or(true, |key| !used.contains(key)))
            .unwrap_or_else(|| profile_photo_key(&account.id, index))
    }

    /// Remove the photo in slot `index`; later photos move up one slot.
    pub async fn delete_profile_photo(&self, id: &AccountId, index: usize) -> Result<Account> {
        let mut account = self.get_account(id).await?;
        if index >= account.photos.len() {
            return Err(Error::NotFound(format!("photo {index} of account {id}")));
        }
        let url = account.photos.remove(index);
        account.updated_at = crate::util::unix_millis_now();
        self.db.update_account(&account).await?;
        self.delete_blob_best_effort(&url).await;
        Ok(account)
    }

    /// Delete the account, its swipes, matches and messages, then its media.
    pub async fn delete_account(&self, id: &AccountId) -> Result<()> {
        let account = self.get_account(id).await?;

        let mut media = account.photos.clone();
        for record in self.db.list_matches(id).await? {
            let messages = self.db.list_all_messages(&record.id).await?;
            media.extend(messages.into_iter().filter_map(|message| message.image_url));
        }

        self.db.delete_account(id).await?;
        tracing::info!(account = %id, media = media.len(), "deleted account");

        for url in media {
            self.delete_blob_best_effort(&url).await;
        }
        Ok(())
    }

    async fn delete_blob_best_effort(&self, url: &str) {
        let Some(key) = self.blobs.key_for_url(url) else {
            tracing::warn!(%url, "cannot map media URL to a storage key; leaving it");
            return;
        };
        if let Err(error) = self.blobs.delete(&key).await {
            tracing::warn!(%key, %error, "failed to delete media");
        }
    }
}

fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
