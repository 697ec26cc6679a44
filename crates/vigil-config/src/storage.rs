// ── Persisted local storage ──
//
// A small JSON key-value file shared with the login flow. Keys follow
// the backend's session shape: `userData` holds `{ token, user }`,
// `profileData` the cached profile, `notificationCount` the unread badge.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ConfigError;

pub const USER_DATA: &str = "userData";
pub const PROFILE_DATA: &str = "profileData";
pub const NOTIFICATION_COUNT: &str = "notificationCount";

/// The `userData` record written at login.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
}

/// JSON key-value file.
///
/// Every call reads or rewrites the whole file, so concurrent processes
/// see each other's writes; the file is tiny.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at the platform data directory.
    pub fn open_default() -> Self {
        Self::new(storage_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── Generic access ───────────────────────────────────────────────

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let mut entries = self.read()?;
        match entries.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        let mut entries = self.read()?;
        entries.insert(key.to_owned(), serde_json::to_value(value)?);
        self.write(&entries)
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&self, key: &str) -> Result<bool, ConfigError> {
        let mut entries = self.read()?;
        let existed = entries.remove(key).is_some();
        if existed {
            self.write(&entries)?;
        }
        Ok(existed)
    }

    /// Drop every key (full logout).
    pub fn clear(&self) -> Result<(), ConfigError> {
        self.write(&Map::new())
    }

    // ── Typed keys ───────────────────────────────────────────────────

    pub fn user_data(&self) -> Result<Option<UserData>, ConfigError> {
        self.get(USER_DATA)
    }

    pub fn set_user_data(&self, data: &UserData) -> Result<(), ConfigError> {
        self.set(USER_DATA, data)
    }

    /// The stored bearer token, if any. Empty strings count as absent.
    pub fn token(&self) -> Result<Option<String>, ConfigError> {
        Ok(self
            .user_data()?
            .and_then(|d| d.token)
            .filter(|t| !t.is_empty()))
    }

    pub fn profile_data(&self) -> Result<Option<Value>, ConfigError> {
        self.get(PROFILE_DATA)
    }

    pub fn set_profile_data(&self, data: &Value) -> Result<(), ConfigError> {
        self.set(PROFILE_DATA, data)
    }

    pub fn notification_count(&self) -> Result<u64, ConfigError> {
        Ok(self.get(NOTIFICATION_COUNT)?.unwrap_or(0))
    }

    pub fn set_notification_count(&self, count: u64) -> Result<(), ConfigError> {
        self.set(NOTIFICATION_COUNT, &count)
    }

    // ── File IO ──────────────────────────────────────────────────────

    fn read(&self) -> Result<Map<String, Value>, ConfigError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(Map::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, entries: &Map<String, Value>) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

/// `storage.json` in the platform data directory.
pub fn storage_path() -> PathBuf {
    ProjectDirs::from("io", "vigil", "vigil").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".local");
            p.push("share");
            p.push("vigil");
            p.push("storage.json");
            p
        },
        |dirs| dirs.data_dir().join("storage.json"),
    )
}
