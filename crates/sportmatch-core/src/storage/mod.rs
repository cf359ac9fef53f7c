//! Blob storage for profile photos and chat images.

mod local;
mod r2;

pub use local::LocalBlobStore;
pub use r2::{R2Config, R2Storage};

use crate::error::{Error, Result};
use crate::models::{AccountId, MatchId, MessageId, MAX_PHOTOS};

/// Content type used for every uploaded image.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Object storage operations shared by blob backends.
#[allow(async_fn_in_trait)]
pub trait BlobStore {
    /// Store `bytes` under `key`, overwriting any existing object, and return
    /// the URL the object can be fetched from.
    async fn put(&self, key: &str, bytes: &[u8], content_type: Option<&str>) -> Result<String>;

    /// Delete the object stored under `key`.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Recover the object key from a URL previously returned by [`BlobStore::put`].
    fn key_for_url(&self, url: &str) -> Option<String>;
}

/// Key of the profile photo stored in slot `index` for `account`.
pub fn profile_photo_key(account: &AccountId, index: usize) -> Result<String> {
    if index >= MAX_PHOTOS {
        return Err(Error::InvalidInput(format!(
            "Photo index must be below {MAX_PHOTOS}"
        )));
    }
    Ok(format!("users/{account}/photos/photo_{index}.jpg"))
}

/// Key of the image attached to `message` in `match_id`.
#[must_use]
pub fn chat_image_key(match_id: &MatchId, message: &MessageId) -> String {
    format!("matches/{match_id}/messages/{message}.jpg")
}

/// The blob backend selected at startup.
#[derive(Clone, Debug)]
pub enum ConfiguredBlobStore {
    R2(R2Storage),
    Local(LocalBlobStore),
}

impl BlobStore for ConfiguredBlobStore {
    async fn put(&self, key: &str, bytes: &[u8], content_type: Option<&str>) -> Result<String> {
        match self {
            Self::R2(store) => store.put(key, bytes, content_type).await,
            Self::Local(store) => store.put(key, bytes, content_type).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self {
            Self::R2(store) => store.delete(key).await,
            Self::Local(store) => store.delete(key).await,
        }
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        match self {
            Self::R2(store) => store.key_for_url(url),
            Self::Local(store) => store.key_for_url(url),
        }
    }
}

pub(crate) fn normalize_object_key(object_key: &str) -> Result<String> {
    let object_key = object_key.trim().trim_matches('/').to_string();
    if object_key.is_empty() {
        return Err(Error::InvalidInput("Object key cannot be empty".to_string()));
    }
    if object_key.split('/').any(|segment| segment == ".." || segment == ".") {
        return Err(Error::InvalidInput(format!(
            "Object key '{object_key}' contains relative segments"
        )));
    }
    Ok(object_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_photo_key_layout() {
        let account = AccountId::new("uid42").unwrap();
        assert_eq!(
            profile_photo_key(&account, 3).unwrap(),
            "users/uid42/photos/photo_3.jpg"
        );
        assert!(profile_photo_key(&account, MAX_PHOTOS).is_err());
    }

    #[test]
    fn test_chat_image_key_layout() {
        let match_id = MatchId::from_raw("amy_zed").unwrap();
        let message: MessageId = "01890a5d-ac96-774b-bcce-b302099a8057".parse().unwrap();
        assert_eq!(
            chat_image_key(&match_id, &message),
            "matches/amy_zed/messages/01890a5d-ac96-774b-bcce-b302099a8057.jpg"
        );
    }

    #[test]
    fn test_normalize_object_key() {
        assert_eq!(normalize_object_key(" /a/b.jpg/ ").unwrap(), "a/b.jpg");
        assert!(normalize_object_key("   ").is_err());
        assert!(normalize_object_key("users/../etc").is_err());
    }
}
