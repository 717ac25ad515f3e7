//! Durable key-value storage for recipe state
//!
//! The store persists three keys (current recipe, recent history, language).
//! [`FileStorage`] keeps one file per key with security hardening:
//! - Restricted permissions for the data directory and its files
//! - Key validation so a key can never name a path outside the directory
//! - Atomic replacement through a uniquely named temporary file

use anyhow::{bail, Context, Result};
use rust_i18n::t;
use std::collections::HashMap;
use std::fs::{self, OpenOptions, Permissions};
use std::io::Write;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::PathBuf;
use uuid::Uuid;

/// Key holding the JSON-serialized current recipe
pub const CURRENT_RECIPE_KEY: &str = "currentRecipe";
/// Key holding the JSON array of recent recipes
pub const RECENT_RECIPES_KEY: &str = "recentRecipes";
/// Key holding the plain language code
pub const CURRENT_LANGUAGE_KEY: &str = "currentLanguage";

/// Secure file permissions: owner read/write only (0600)
const DATA_FILE_PERMS: u32 = 0o600;
/// Secure directory permissions: owner read/write/execute only (0700)
const DATA_DIR_PERMS: u32 = 0o700;

const MAX_KEY_LEN: usize = 128;

/// Upper bound for a stored value (4 MiB)
const MAX_VALUE_LEN: u64 = 4 * 1024 * 1024;

/// Synchronous local key-value storage
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    /// Removing a missing key is not an error
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory storage, lost when dropped
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Storage backed by one file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// The directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }

    /// Create the data directory with secure permissions
    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .context(t!("storage.failed_create_dir", path = self.dir.display().to_string()).to_string())?;
            fs::set_permissions(&self.dir, Permissions::from_mode(DATA_DIR_PERMS))
                .context(t!("storage.failed_set_dir_perms").to_string())?;
        }
        Ok(())
    }
}

/// Validate key format
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        bail!("{}", t!("storage.key_invalid_length"));
    }

    // Keys become file names: no separators, no dot files, no traversal
    if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        bail!("{}", t!("storage.key_invalid_chars", key = key));
    }

    Ok(())
}

impl Storage for FileStorage {
    /// # Security
    /// - Refuses anything but a regular file (no symlink following)
    /// - Bounds the size of what is read
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;

        let metadata = match fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).context(t!("storage.failed_get_metadata", key = key).to_string())
            }
        };

        if !metadata.is_file() {
            bail!("{}", t!("storage.not_regular_file", key = key));
        }

        if metadata.len() > MAX_VALUE_LEN {
            bail!("{}", t!("storage.content_too_large", key = key));
        }

        let content = fs::read_to_string(&path)
            .context(t!("storage.failed_read_file", key = key).to_string())?;

        Ok(Some(content))
    }

    /// # Security
    /// - Creates the data directory with restricted permissions (0700)
    /// - Creates files with restricted permissions (0600)
    /// - Writes to a temporary file and renames it over the target
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        self.ensure_dir()?;

        let tmp_path = self.dir.join(format!(".{}.{}.tmp", key, Uuid::new_v4()));

        let result = (|| -> Result<()> {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .mode(DATA_FILE_PERMS)
                .open(&tmp_path)
                .context(t!("storage.failed_create_file", key = key).to_string())?;

            file.write_all(value.as_bytes())
                .context(t!("storage.failed_write_file", key = key).to_string())?;

            // Ensure data is flushed to disk before it replaces the old value
            file.sync_all()
                .context(t!("storage.failed_sync_file", key = key).to_string())?;

            fs::rename(&tmp_path, &path)
                .context(t!("storage.failed_rename_file", key = key).to_string())?;

            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }

        result
    }

    /// # Security
    /// - Verifies the target is a regular file before removing it
    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;

        let metadata = match fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(e).context(t!("storage.failed_get_metadata", key = key).to_string())
            }
        };

        if !metadata.is_file() {
            bail!("{}", t!("storage.not_regular_file", key = key));
        }

        fs::remove_file(&path)
            .context(t!("storage.failed_remove_file", key = key).to_string())?;

        Ok(())
    }
}
