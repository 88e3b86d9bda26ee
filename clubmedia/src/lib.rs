//! # clubmedia - Cache des URLs de médias du site
//!
//! Cette crate transforme les clés opaques du stockage objet (photos des membres,
//! images et vidéos du carrousel) en URLs affichables, en minimisant les appels
//! au service de stockage.
//!
//! ## Vue d'ensemble
//!
//! - Mémorisation des URLs résolues dans un cache LRU borné
//! - Résolution par lot avec repli clé par clé si le lot échoue
//! - Une seule résolution en vol par clé, partagée entre appelants concurrents
//! - Échecs convertis en URL vide (placeholder côté rendu), jamais propagés
//!
//! ## Architecture
//!
//! ```text
//! clubmedia
//!     ├── media.rs     - MediaRef / MediaKind
//!     ├── resolver.rs  - Trait UrlResolver (service externe)
//!     └── cache.rs     - MediaUrlCache (LRU + résolutions en vol)
//!
//! clubstorage (résolveur HTTP)
//!     └── Implémente UrlResolver pour l'API de stockage
//! ```
//!
//! ## Utilisation
//!
//! ```rust,no_run
//! use clubmedia::{MediaUrlCache, UrlResolver};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! struct Public;
//!
//! #[async_trait::async_trait]
//! impl UrlResolver for Public {
//!     async fn resolve_one(&self, key: &str) -> anyhow::Result<String> {
//!         Ok(format!("https://cdn.example.org/{key}"))
//!     }
//!     async fn resolve_batch(&self, keys: &[String]) -> anyhow::Result<HashMap<String, String>> {
//!         Ok(keys.iter().map(|k| (k.clone(), format!("https://cdn.example.org/{k}"))).collect())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache = MediaUrlCache::new(Arc::new(Public), 256);
//!     let urls = cache.resolve_batch(&["a.jpg", "b.jpg", "a.jpg"]).await;
//!     assert_eq!(urls[0], urls[2]);
//! }
//! ```

pub mod cache;
pub mod media;
pub mod resolver;

#[cfg(feature = "clubconfig")]
pub mod config_ext;

pub use cache::{CacheStats, DEFAULT_CAPACITY, MediaUrlCache, ResolvedUrl};
pub use media::{MediaError, MediaKind, MediaRef, ResolvedMedia};
pub use resolver::UrlResolver;

#[cfg(feature = "clubconfig")]
pub use config_ext::MediaCacheConfigExt;
