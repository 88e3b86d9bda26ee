//! Extension pour intégrer le cache d'URLs dans clubconfig
//!
//! Ce module fournit le trait `MediaCacheConfigExt` qui construit un
//! [`MediaUrlCache`](crate::MediaUrlCache) dimensionné par la configuration.

use crate::{MediaUrlCache, UrlResolver};
use anyhow::Result;
use clubconfig::Config;
use std::sync::Arc;

/// Trait d'extension pour gérer le cache d'URLs dans clubconfig
///
/// # Exemple
///
/// ```rust,ignore
/// use clubconfig::get_config;
/// use clubmedia::MediaCacheConfigExt;
///
/// let cache = get_config().create_media_cache(resolver)?;
/// ```
pub trait MediaCacheConfigExt {
    /// Crée un cache d'URLs dont la capacité vient de `media_cache.size`
    fn create_media_cache(&self, resolver: Arc<dyn UrlResolver>) -> Result<MediaUrlCache>;
}

impl MediaCacheConfigExt for Config {
    fn create_media_cache(&self, resolver: Arc<dyn UrlResolver>) -> Result<MediaUrlCache> {
        let size = self.get_media_cache_size()?;
        tracing::info!("Creating media URL cache (capacity: {})", size);
        Ok(MediaUrlCache::new(resolver, size))
    }
}
