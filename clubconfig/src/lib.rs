//! # ClubSite Configuration Module
//!
//! This module provides configuration management for the club site, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//! - Thread-safe singleton access pattern
//!
//! Crates of the workspace extend [`Config`] with their own typed accessors
//! (media cache size, marquee lanes, storage endpoint) through extension traits.
//!
//! ## Usage
//!
//! ```no_run
//! use clubconfig::get_config;
//!
//! let config = get_config();
//! let level = config.get_log_level()?;
//! config.set_log_level("debug".to_string())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

mod tree;

use anyhow::{Result, anyhow};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Number, Value};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("clubsite.yaml");

const CONFIG_FILE_NAME: &str = "config.yaml";

/// Variable d'environnement désignant le répertoire de configuration
pub const ENV_CONFIG_DIR: &str = "CLUBSITE_CONFIG";
/// Préfixe des surcharges `CLUBSITE_CONFIG__SECTION__KEY=valeur`
pub const ENV_PREFIX: &str = "CLUBSITE_CONFIG__";
pub const CONFIG_DIR_NAME: &str = ".clubsite";

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_MEDIA_CACHE_SIZE: usize = 512;
const DEFAULT_STORAGE_PUBLIC: bool = true;
const DEFAULT_SIGNED_URL_TTL: usize = 3600;
const DEFAULT_STORAGE_TIMEOUT_SECS: usize = 30;
const DEFAULT_FRAME_RATE: usize = 60;

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load ClubSite configuration"));
}

/// Generates typed getter/setter pairs falling back to a default value
macro_rules! config_accessors {
    ($( $kind:ident $getter:ident / $setter:ident at [$($segment:literal),+] = $default:expr; )+) => {
        $( config_accessors!(@$kind $getter, $setter, &[$($segment),+], $default); )+
    };
    (@usize $getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<usize> {
            Ok(self
                .lookup($path, |value| value.as_u64())
                .map(|n| n as usize)
                .unwrap_or($default))
        }

        pub fn $setter(&self, value: usize) -> Result<()> {
            self.set_value($path, Value::Number(Number::from(value as u64)))
        }
    };
    (@bool $getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<bool> {
            Ok(self.lookup($path, Value::as_bool).unwrap_or($default))
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Configuration manager for the club site
///
/// The merged configuration lives in memory behind a mutex and is written
/// back to `config.yaml` after every change.
///
/// # Examples
///
/// ```no_run
/// use clubconfig::get_config;
///
/// let config = get_config();
/// println!("Log level: {}", config.get_log_level()?);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct Config {
    dir: PathBuf,
    file: PathBuf,
    data: Mutex<Value>,
}

impl Clone for Config {
    fn clone(&self) -> Self {
        Self {
            dir: self.dir.clone(),
            file: self.file.clone(),
            data: Mutex::new(self.lock_data().clone()),
        }
    }
}

impl Config {
    /// Picks the configuration directory
    ///
    /// In order: the `directory` argument when not empty, the
    /// `CLUBSITE_CONFIG` environment variable, an existing `.clubsite` in the
    /// current directory, an existing `~/.clubsite`, and finally `.clubsite`.
    fn locate_dir(directory: &str) -> PathBuf {
        if !directory.is_empty() {
            return PathBuf::from(directory);
        }

        if let Ok(from_env) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %from_env, "Config directory from environment");
            return PathBuf::from(from_env);
        }

        let local = PathBuf::from(CONFIG_DIR_NAME);
        let in_home = home_dir().map(|home| home.join(CONFIG_DIR_NAME));

        [Some(local.clone()), in_home]
            .into_iter()
            .flatten()
            .find(|candidate| candidate.is_dir())
            .unwrap_or(local)
    }

    /// Creates the directory if needed and checks that it is writable
    fn prepare_dir(dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .map_err(|e| anyhow!("Cannot create config directory {}: {}", dir.display(), e))?;

        if !dir.is_dir() {
            return Err(anyhow!(
                "Le chemin spécifié n'est pas un répertoire: {}",
                dir.display()
            ));
        }

        let probe = dir.join(".write_test");
        fs::write(&probe, b"ok")?;
        fs::remove_file(&probe)?;
        Ok(())
    }

    /// Resolves and prepares the configuration directory
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir = Self::locate_dir(directory);
        Self::prepare_dir(&dir)?;
        Ok(dir.to_string_lossy().into_owned())
    }

    /// Loads the configuration
    ///
    /// Embedded defaults are overlaid with `<dir>/config.yaml` when present,
    /// keys are lower-cased, `CLUBSITE_CONFIG__*` variables are applied and
    /// the result is saved back to `config.yaml`.
    pub fn load_config(directory: &str) -> Result<Self> {
        let dir = Self::locate_dir(directory);
        Self::prepare_dir(&dir)?;
        let file = dir.join(CONFIG_FILE_NAME);
        info!(config_dir = %dir.display(), "Using config directory");

        let mut data = tree::lowercase_keys(serde_yaml::from_str(DEFAULT_CONFIG)?);

        match fs::read_to_string(&file) {
            Ok(text) => {
                let external: Value = serde_yaml::from_str(&text)
                    .map_err(|e| anyhow!("Invalid YAML in {}: {}", file.display(), e))?;
                tree::merge(&mut data, tree::lowercase_keys(external));
                info!(config_file = %file.display(), "Loaded config file");
            }
            Err(_) => {
                info!(config_file = %file.display(), "Config file not found, using embedded defaults");
            }
        }

        let overrides = tree::apply_env(&mut data, ENV_PREFIX, env::vars());
        if overrides > 0 {
            info!("Applied {} configuration override(s) from environment", overrides);
        }

        let config = Config {
            dir,
            file,
            data: Mutex::new(data),
        };
        config.save()?;
        Ok(config)
    }

    fn lock_data(&self) -> MutexGuard<'_, Value> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `read` to the value at `path`, `None` when absent
    fn lookup<T>(&self, path: &[&str], read: impl FnOnce(&Value) -> Option<T>) -> Option<T> {
        let data = self.lock_data();
        tree::lookup(&data, path).ok().and_then(read)
    }

    /// Directory holding `config.yaml`
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Writes the current configuration to `config.yaml`
    pub fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&*self.lock_data())?;
        fs::write(&self.file, yaml)?;
        Ok(())
    }

    /// Sets the value at `path` (e.g. `&["media_cache", "size"]`) and saves
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        tree::assign(&mut self.lock_data(), path, value)?;
        self.save()
    }

    /// Returns a copy of the value at `path`, or an error if it doesn't exist
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        tree::lookup(&self.lock_data(), path).cloned()
    }

    /// Gets a string value, or `default` when absent or not a string
    pub fn get_string_or(&self, path: &[&str], default: &str) -> String {
        self.lookup(path, |value| value.as_str().map(str::to_string))
            .unwrap_or_else(|| default.to_string())
    }

    /// Deserializes the subtree at `path` into `T`
    pub fn get_typed<T: serde::de::DeserializeOwned>(&self, path: &[&str]) -> Result<T> {
        let value = self.get_value(path)?;
        serde_yaml::from_value(value)
            .map_err(|e| anyhow!("Invalid value at {}: {}", path.join("."), e))
    }

    /// Serializes `value` and stores it at `path`
    pub fn set_typed<T: serde::Serialize>(&self, path: &[&str], value: &T) -> Result<()> {
        self.set_value(path, serde_yaml::to_value(value)?)
    }

    /// Récupère le niveau de log (filtre `tracing`) depuis la configuration
    pub fn get_log_level(&self) -> Result<String> {
        Ok(self
            .lookup(&["host", "log_level"], |value| {
                value.as_str().filter(|s| !s.is_empty()).map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()))
    }

    /// Définit le niveau de log dans la configuration
    pub fn set_log_level(&self, level: String) -> Result<()> {
        self.set_value(&["host", "log_level"], Value::String(level))
    }

    config_accessors! {
        usize get_media_cache_size / set_media_cache_size at ["media_cache", "size"] = DEFAULT_MEDIA_CACHE_SIZE;
        bool get_storage_public / set_storage_public at ["storage", "public"] = DEFAULT_STORAGE_PUBLIC;
        usize get_signed_url_ttl / set_signed_url_ttl at ["storage", "signed_url_ttl"] = DEFAULT_SIGNED_URL_TTL;
        usize get_storage_timeout_secs / set_storage_timeout_secs at ["storage", "timeout_secs"] = DEFAULT_STORAGE_TIMEOUT_SECS;
        usize get_frame_rate / set_frame_rate at ["marquee", "frame_rate"] = DEFAULT_FRAME_RATE;
    }
}

/// Returns the global configuration instance
///
/// The configuration is lazily loaded on first access.
///
/// # Panics
///
/// Panics on first access if the configuration directory cannot be created
/// or the configuration file is not valid YAML.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}
