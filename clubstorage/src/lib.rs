//! # clubstorage
//!
//! Resolver turning object storage keys into URLs the site can display.
//!
//! - Public buckets: URLs are built locally, without any request
//! - Private buckets: URLs are signed by the storage REST API, one by one
//!   or in a single batch request
//!
//! [`StorageResolver`] implements [`clubmedia::UrlResolver`] and is meant to
//! sit behind a [`clubmedia::MediaUrlCache`].

pub mod client;
pub mod error;
mod models;

#[cfg(feature = "clubconfig")]
pub mod config_ext;

pub use client::{BucketAccess, StorageResolver, StorageResolverBuilder};
pub use error::{Error, Result};

#[cfg(feature = "clubconfig")]
pub use config_ext::StorageConfigExt;
