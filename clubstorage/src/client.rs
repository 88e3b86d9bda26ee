//! HTTP resolver for the object storage REST API

use crate::error::{Error, Result};
use crate::models::{SignBatchRequest, SignRequest, SignResponse, SignedEntry};
use async_trait::async_trait;
use clubmedia::UrlResolver;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Default storage base URL (local development stack)
pub const DEFAULT_BASE_URL: &str = "http://localhost:54321";

pub const DEFAULT_BUCKET: &str = "media";

/// Default lifetime of signed URLs
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;

/// Default timeout for signing requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_USER_AGENT: &str = "clubstorage/0.1.0";

/// Path of the storage API below the base URL
const STORAGE_API_PATH: [&str; 2] = ["storage", "v1"];

/// How objects of the bucket are exposed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketAccess {
    /// Public bucket: URLs are built locally, no request is made
    Public,
    /// Private bucket: every URL is signed by the API and expires
    Signed,
}

/// Resolver turning storage keys into displayable URLs
///
/// # Example
///
/// ```no_run
/// use clubstorage::{BucketAccess, StorageResolver};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = StorageResolver::builder()
///     .base_url("https://project.storage.example.org")
///     .bucket("avatars")
///     .access(BucketAccess::Public)
///     .build()?;
///
/// let url = resolver.public_url("members/alice.jpg")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StorageResolver {
    client: Client,
    base_url: Url,
    bucket: String,
    access: BucketAccess,
    api_key: Option<String>,
    signed_url_ttl: Duration,
}

impl StorageResolver {
    pub fn builder() -> StorageResolverBuilder {
        StorageResolverBuilder::default()
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn access(&self) -> BucketAccess {
        self.access
    }

    /// Public URL of an object: `{base}/storage/v1/object/public/{bucket}/{key}`
    ///
    /// Each `/`-separated segment of the key is percent-encoded.
    pub fn public_url(&self, key: &str) -> Result<String> {
        let url = self.endpoint(&["object", "public"], Some(key))?;
        Ok(url.into())
    }

    /// Asks the API for a signed URL of one object
    pub async fn sign_one(&self, key: &str) -> Result<String> {
        let url = self.endpoint(&["object", "sign"], Some(key))?;
        let body = SignRequest {
            expires_in: self.signed_url_ttl.as_secs(),
        };

        tracing::debug!("Signing storage object {}", key);
        let response: SignResponse = self.post_json(url, &body).await?;

        response
            .signed_url
            .map(|signed| self.absolute(&signed))
            .ok_or_else(|| Error::MissingSignedUrl(key.to_string()))
    }

    /// Asks the API for signed URLs of several objects in one request
    ///
    /// Keys the API could not sign are absent from the returned map.
    pub async fn sign_batch(&self, keys: &[String]) -> Result<HashMap<String, String>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let url = self.endpoint(&["object", "sign"], None)?;
        let body = SignBatchRequest {
            expires_in: self.signed_url_ttl.as_secs(),
            paths: keys,
        };

        tracing::debug!("Signing {} storage objects", keys.len());
        let entries: Vec<SignedEntry> = self.post_json(url, &body).await?;

        let mut urls = HashMap::with_capacity(entries.len());
        for entry in entries {
            match entry {
                SignedEntry {
                    path: Some(path),
                    signed_url: Some(signed),
                    error: None,
                } => {
                    urls.insert(path, self.absolute(&signed));
                }
                SignedEntry { path, error, .. } => {
                    tracing::warn!(
                        "Storage API could not sign {}: {}",
                        path.as_deref().unwrap_or("<unknown>"),
                        error.as_deref().unwrap_or("no URL returned")
                    );
                }
            }
        }
        Ok(urls)
    }

    /// Builds `{base}/storage/v1/{segments}/{bucket}[/{key}]`
    fn endpoint(&self, segments: &[&str], key: Option<&str>) -> Result<Url> {
        if let Some(key) = key {
            if key.trim().is_empty() {
                return Err(Error::EmptyKey);
            }
        }

        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| Error::InvalidBaseUrl(self.base_url.to_string()))?;
            path.pop_if_empty();
            path.extend(STORAGE_API_PATH);
            path.extend(segments);
            path.push(&self.bucket);
            if let Some(key) = key {
                path.extend(key.split('/'));
            }
        }
        Ok(url)
    }

    /// Joins a URL returned by the API (relative to `/storage/v1`) to the base URL
    fn absolute(&self, signed: &str) -> String {
        if signed.starts_with("http://") || signed.starts_with("https://") {
            return signed.to_string();
        }

        let root = self.base_url.as_str().trim_end_matches('/');
        let api = STORAGE_API_PATH.join("/");
        if signed.starts_with('/') {
            format!("{}/{}{}", root, api, signed)
        } else {
            format!("{}/{}/{}", root, api, signed)
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .authorize(self.client.post(url))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl UrlResolver for StorageResolver {
    async fn resolve_one(&self, key: &str) -> anyhow::Result<String> {
        let url = match self.access {
            BucketAccess::Public => self.public_url(key)?,
            BucketAccess::Signed => self.sign_one(key).await?,
        };
        Ok(url)
    }

    async fn resolve_batch(&self, keys: &[String]) -> anyhow::Result<HashMap<String, String>> {
        match self.access {
            BucketAccess::Public => {
                let mut urls = HashMap::with_capacity(keys.len());
                for key in keys {
                    match self.public_url(key) {
                        Ok(url) => {
                            urls.insert(key.clone(), url);
                        }
                        Err(e) => tracing::warn!("Cannot build public URL for {:?}: {}", key, e),
                    }
                }
                Ok(urls)
            }
            BucketAccess::Signed => Ok(self.sign_batch(keys).await?),
        }
    }
}

/// Builder for [`StorageResolver`]
#[derive(Debug)]
pub struct StorageResolverBuilder {
    client: Option<Client>,
    base_url: String,
    bucket: String,
    access: BucketAccess,
    api_key: Option<String>,
    signed_url_ttl: Duration,
    request_timeout: Duration,
    user_agent: String,
}

impl Default for StorageResolverBuilder {
    fn default() -> Self {
        Self {
            client: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            access: BucketAccess::Public,
            api_key: None,
            signed_url_ttl: Duration::from_secs(DEFAULT_SIGNED_URL_TTL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl StorageResolverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn access(mut self, access: BucketAccess) -> Self {
        self.access = access;
        self
    }

    /// API key sent as `apikey` and bearer token. An empty key disables both headers.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = (!key.is_empty()).then_some(key);
        self
    }

    pub fn signed_url_ttl(mut self, ttl: Duration) -> Self {
        self.signed_url_ttl = ttl;
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> Result<StorageResolver> {
        let base_url = Url::parse(&self.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl(self.base_url));
        }
        if self.bucket.trim().is_empty() {
            return Err(Error::other("Bucket name must not be empty"));
        }

        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(&self.user_agent)
                .timeout(self.request_timeout)
                .build()?,
        };

        tracing::debug!(
            "Storage resolver for bucket {} at {} ({:?})",
            self.bucket,
            base_url,
            self.access
        );

        Ok(StorageResolver {
            client,
            base_url,
            bucket: self.bucket,
            access: self.access,
            api_key: self.api_key,
            signed_url_ttl: self.signed_url_ttl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(base: &str) -> StorageResolver {
        StorageResolver::builder()
            .base_url(base)
            .bucket("media")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let builder = StorageResolverBuilder::default();
        assert_eq!(builder.base_url, DEFAULT_BASE_URL);
        assert_eq!(builder.access, BucketAccess::Public);
        assert!(builder.api_key.is_none());
    }

    #[test]
    fn test_public_url_encodes_segments() {
        let resolver = resolver("https://cdn.example.org/");
        assert_eq!(
            resolver.public_url("events/summer fair.jpg").unwrap(),
            "https://cdn.example.org/storage/v1/object/public/media/events/summer%20fair.jpg"
        );
        assert!(matches!(resolver.public_url(""), Err(Error::EmptyKey)));
    }

    #[test]
    fn test_absolute_signed_url() {
        let resolver = resolver("http://localhost:54321");
        assert_eq!(
            resolver.absolute("/object/sign/media/a.jpg?token=t"),
            "http://localhost:54321/storage/v1/object/sign/media/a.jpg?token=t"
        );
        assert_eq!(
            resolver.absolute("https://other.example.org/a.jpg"),
            "https://other.example.org/a.jpg"
        );
    }

    #[test]
    fn test_rejects_bad_base() {
        assert!(
            StorageResolver::builder()
                .base_url("mailto:someone@example.org")
                .build()
                .is_err()
        );
        assert!(StorageResolver::builder().bucket(" ").build().is_err());
    }
}
