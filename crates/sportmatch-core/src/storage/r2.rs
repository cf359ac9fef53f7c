//! Cloudflare R2 blob store (S3-compatible API).

use std::env;

use aws_credential_types::Credentials;
use aws_sdk_s3::{primitives::ByteStream, Client};
use aws_types::region::Region;

use crate::{Error, Result};

use super::{normalize_object_key, BlobStore};

const ENV_ACCOUNT_ID: &str = "R2_ACCOUNT_ID";
const ENV_BUCKET: &str = "R2_BUCKET";
const ENV_ACCESS_KEY_ID: &str = "R2_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "R2_SECRET_ACCESS_KEY";
const ENV_PUBLIC_BASE_URL: &str = "R2_PUBLIC_BASE_URL";

/// Cloudflare R2 configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct R2Config {
    /// Cloudflare account identifier.
    pub account_id: String,
    /// R2 bucket name.
    pub bucket: String,
    /// Access key id for S3-compatible auth.
    pub access_key_id: String,
    /// Secret access key for S3-compatible auth.
    pub secret_access_key: String,
    /// Public URL base photos and chat images are served from.
    pub public_base_url: Option<String>,
}

impl std::fmt::Debug for R2Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("R2Config")
            .field("account_id", &self.account_id)
            .field("bucket", &self.bucket)
            .field("access_key_id", &"<redacted>")
            .field("secret_access_key", &"<redacted>")
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

impl R2Config {
    /// Load R2 configuration from environment variables.
    ///
    /// Returns `Ok(None)` when no R2 variables are set and an error when only
    /// some of the required ones are.
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`R2Config::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>> {
        parse_config(lookup)
    }

    /// Cloudflare R2 S3-compatible endpoint URL.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }

    /// Base URL objects are addressed by: the public base when configured,
    /// the path-style bucket endpoint otherwise.
    #[must_use]
    pub fn object_base_url(&self) -> String {
        self.public_base_url
            .clone()
            .unwrap_or_else(|| format!("{}/{}", self.endpoint_url(), self.bucket))
    }
}

/// R2-backed [`BlobStore`].
#[derive(Clone, Debug)]
pub struct R2Storage {
    config: R2Config,
    client: Client,
}

impl R2Storage {
    #[must_use]
    pub fn new(config: R2Config) -> Self {
        let client = build_s3_client(&config);
        Self { config, client }
    }

    #[must_use]
    pub const fn config(&self) -> &R2Config {
        &self.config
    }

    /// Check that the configured bucket is reachable with current credentials.
    pub async fn bucket_is_reachable(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|error| storage_error("head_bucket", &self.config.bucket, None, error))?;
        Ok(())
    }

    /// Check whether an object exists in the configured bucket.
    pub async fn object_exists(&self, object_key: &str) -> Result<bool> {
        let object_key = normalize_object_key(object_key)?;

        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.config.bucket)
            .prefix(&object_key)
            .max_keys(1)
            .send()
            .await
            .map_err(|error| {
                storage_error(
                    "list_objects_v2",
                    &self.config.bucket,
                    Some(&object_key),
                    error,
                )
            })?;

        Ok(response
            .contents()
            .iter()
            .filter_map(|object| object.key())
            .any(|candidate| candidate == object_key))
    }

    fn object_url(&self, object_key: &str) -> String {
        format!("{}/{object_key}", self.config.object_base_url())
    }
}

impl BlobStore for R2Storage {
    async fn put(&self, key: &str, bytes: &[u8], content_type: Option<&str>) -> Result<String> {
        let object_key = normalize_object_key(key)?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&object_key)
            .body(ByteStream::from(bytes.to_vec()));

        if let Some(content_type) = normalize_content_type(content_type) {
            request = request.content_type(content_type);
        }

        request.send().await.map_err(|error| {
            storage_error("put_object", &self.config.bucket, Some(&object_key), error)
        })?;

        tracing::debug!(key = %object_key, size = bytes.len(), "uploaded object to R2");
        Ok(self.object_url(&object_key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let object_key = normalize_object_key(key)?;

        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(&object_key)
            .send()
            .await
            .map_err(|error| {
                storage_error(
                    "delete_object",
                    &self.config.bucket,
                    Some(&object_key),
                    error,
                )
            })?;

        Ok(())
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        let base = self.config.object_base_url();
        let key = url.strip_prefix(&base)?.trim_matches('/');
        (!key.is_empty()).then(|| key.to_string())
    }
}

fn parse_config(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<R2Config>> {
    let read = |key: &str| lookup(key).map(|value| value.trim().to_string());
    let account_id = read(ENV_ACCOUNT_ID);
    let bucket = read(ENV_BUCKET);
    let access_key_id = read(ENV_ACCESS_KEY_ID);
    let secret_access_key = read(ENV_SECRET_ACCESS_KEY);
    let public_base_url = read(ENV_PUBLIC_BASE_URL);

    let any_present = account_id.is_some()
        || bucket.is_some()
        || access_key_id.is_some()
        || secret_access_key.is_some()
        || public_base_url.is_some();

    if !any_present {
        return Ok(None);
    }

    let required = [
        (ENV_ACCOUNT_ID, account_id),
        (ENV_BUCKET, bucket),
        (ENV_ACCESS_KEY_ID, access_key_id),
        (ENV_SECRET_ACCESS_KEY, secret_access_key),
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
        .map(|(name, _)| *name)
        .collect();

    if !missing.is_empty() {
        return Err(Error::InvalidInput(format!(
            "R2 configuration is incomplete. Missing: {}",
            missing.join(", ")
        )));
    }

    let [account_id, bucket, access_key_id, secret_access_key] =
        required.map(|(_, value)| value.unwrap_or_default());

    Ok(Some(R2Config {
        account_id,
        bucket,
        access_key_id,
        secret_access_key,
        public_base_url: normalize_public_base_url(public_base_url)?,
    }))
}

fn build_s3_client(config: &R2Config) -> Client {
    let credentials = Credentials::new(
        config.access_key_id.clone(),
        config.secret_access_key.clone(),
        None,
        None,
        "sportmatch-core-r2-storage",
    );

    let sdk_config = aws_sdk_s3::config::Builder::new()
        .region(Region::new("auto"))
        .credentials_provider(credentials)
        .endpoint_url(config.endpoint_url())
        .force_path_style(true)
        .build();

    Client::from_conf(sdk_config)
}

fn storage_error(
    operation: &str,
    bucket: &str,
    object_key: Option<&str>,
    error: impl std::fmt::Display,
) -> Error {
    let target = object_key.map_or_else(|| bucket.to_string(), |key| format!("{bucket}/{key}"));
    Error::Storage(format!("R2 {operation} failed for {target}: {error}"))
}

fn normalize_content_type(content_type: Option<&str>) -> Option<String> {
    content_type
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn normalize_public_base_url(public_base_url: Option<String>) -> Result<Option<String>> {
    let Some(value) = public_base_url.filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    if !crate::util::is_http_url(&value) {
        return Err(Error::InvalidInput(
            "R2_PUBLIC_BASE_URL must start with http:// or https://".to_string(),
        ));
    }

    Ok(Some(value.trim_end_matches('/').to_string()))
}
