//! Extension pour intégrer le stockage dans clubconfig
//!
//! ```rust,ignore
//! use clubconfig::get_config;
//! use clubstorage::StorageConfigExt;
//!
//! let resolver = get_config().create_storage_resolver()?;
//! ```

use crate::client::{BucketAccess, DEFAULT_BASE_URL, DEFAULT_BUCKET, StorageResolver};
use anyhow::Result;
use clubconfig::Config;
use serde_yaml::Value;
use std::time::Duration;

/// Trait d'extension pour la section `storage` de la configuration
pub trait StorageConfigExt {
    /// URL de base du service de stockage (`storage.base_url`)
    fn get_storage_base_url(&self) -> Result<String>;

    fn get_storage_bucket(&self) -> Result<String>;

    /// Clé d'API, `None` si absente ou vide
    fn get_storage_api_key(&self) -> Result<Option<String>>;

    fn set_storage_api_key(&self, key: &str) -> Result<()>;

    /// Construit un résolveur à partir de toute la section `storage`
    fn create_storage_resolver(&self) -> Result<StorageResolver>;
}

impl StorageConfigExt for Config {
    fn get_storage_base_url(&self) -> Result<String> {
        Ok(self.get_string_or(&["storage", "base_url"], DEFAULT_BASE_URL))
    }

    fn get_storage_bucket(&self) -> Result<String> {
        Ok(self.get_string_or(&["storage", "bucket"], DEFAULT_BUCKET))
    }

    fn get_storage_api_key(&self) -> Result<Option<String>> {
        match self.get_value(&["storage", "api_key"]) {
            Ok(Value::String(key)) if !key.is_empty() => Ok(Some(key)),
            _ => Ok(None),
        }
    }

    fn set_storage_api_key(&self, key: &str) -> Result<()> {
        self.set_value(&["storage", "api_key"], Value::String(key.to_string()))
    }

    fn create_storage_resolver(&self) -> Result<StorageResolver> {
        let access = if self.get_storage_public()? {
            BucketAccess::Public
        } else {
            BucketAccess::Signed
        };

        let mut builder = StorageResolver::builder()
            .base_url(self.get_storage_base_url()?)
            .bucket(self.get_storage_bucket()?)
            .access(access)
            .signed_url_ttl(Duration::from_secs(self.get_signed_url_ttl()? as u64))
            .timeout(Duration::from_secs(self.get_storage_timeout_secs()? as u64));

        if let Some(key) = self.get_storage_api_key()? {
            builder = builder.api_key(key);
        }

        tracing::info!(
            "Storage resolver configured for bucket {} ({:?})",
            self.get_storage_bucket()?,
            access
        );
        Ok(builder.build()?)
    }
}
