#![cfg(feature = "clubconfig")]

use clubconfig::Config;
use clubstorage::{BucketAccess, StorageConfigExt};

#[test]
fn test_resolver_from_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();

    assert_eq!(config.get_storage_bucket().unwrap(), "media");
    assert_eq!(config.get_storage_api_key().unwrap(), None);

    let resolver = config.create_storage_resolver().unwrap();
    assert_eq!(resolver.access(), BucketAccess::Public);
    assert_eq!(
        resolver.public_url("a.jpg").unwrap(),
        "http://localhost:54321/storage/v1/object/public/media/a.jpg"
    );
}

#[test]
fn test_private_bucket_from_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.yaml"),
        "storage:\n  public: false\n  bucket: avatars\n  base_url: https://storage.example.org\n",
    )
    .unwrap();
    let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
    config.set_storage_api_key("service-key").unwrap();

    assert_eq!(
        config.get_storage_api_key().unwrap().as_deref(),
        Some("service-key")
    );

    let resolver = config.create_storage_resolver().unwrap();
    assert_eq!(resolver.access(), BucketAccess::Signed);
    assert_eq!(resolver.bucket(), "avatars");
}
