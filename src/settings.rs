//! Per-guild LinkGuard settings, persisted as JSON.
//!
//! File layout:
//! ```json
//! { "guilds": { "<guild_id>": { "enabled": false, "channels": {}, "exempt_roles": [], "restrict_roles": [] } } }
//! ```
//!
//! Files written with `exemptRoles`/`restrictRoles` keys and string role ids
//! are read as well.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{LinkGuardError, Result, StoreErrorKind};

/// Settings of one guild
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildSettings {
    /// Server-wide switch
    pub enabled: bool,
    /// channel id -> override
    pub channels: BTreeMap<u64, bool>,
    /// Roles that may always post links
    #[serde(alias = "exemptRoles", deserialize_with = "role_ids")]
    pub exempt_roles: Vec<u64>,
    /// When non-empty, only members with one of these roles are checked
    #[serde(alias = "restrictRoles", deserialize_with = "role_ids")]
    pub restrict_roles: Vec<u64>,
}

/// Role ids as numbers or numeric strings. Anything else fails the whole file.
fn role_ids<'de, D>(deserializer: D) -> std::result::Result<Vec<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Vec::<RawId>::deserialize(deserializer)?
        .into_iter()
        .map(|id| match id {
            RawId::Number(n) => Ok(n),
            RawId::Text(s) => s.trim().parse().map_err(|_| {
                serde::de::Error::custom(format!("invalid role id '{}'", s))
            }),
        })
        .collect()
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct SettingsFile {
    guilds: BTreeMap<u64, GuildSettings>,
}

/// JSON-file settings store
pub struct SettingsStore {
    path: PathBuf,
    enabled_by_default: bool,
    lock: Mutex<()>,
}

impl SettingsStore {
    /// Open the store, creating `{"guilds": {}}` if the file is missing.
    pub fn open(path: impl AsRef<Path>, enabled_by_default: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            let create = || -> Result<()> {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent)?;
                    }
                }
                let initial = serde_json::to_string_pretty(&SettingsFile::default())?;
                fs::write(&path, initial)?;
                Ok(())
            };
            create().map_err(|e| {
                LinkGuardError::settings(
                    StoreErrorKind::FileError,
                    format!("Failed to create '{}': {}", path.display(), e),
                )
            })?;
        }

        Ok(Self {
            path,
            enabled_by_default,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode all settings. Undecodable content is `InvalidData`.
    fn read_all(&self) -> Result<SettingsFile> {
        let text = fs::read_to_string(&self.path).map_err(|e| {
            LinkGuardError::settings(
                StoreErrorKind::FileError,
                format!("Failed to read '{}': {}", self.path.display(), e),
            )
        })?;
        serde_json::from_str(&text).map_err(|e| {
            LinkGuardError::settings(
                StoreErrorKind::InvalidData,
                format!("Failed to decode '{}': {}", self.path.display(), e),
            )
        })
    }

    /// Settings for lookups. Undecodable content reads as empty; the file is
    /// left untouched.
    fn read_lenient(&self) -> Result<SettingsFile> {
        match self.read_all() {
            Err(LinkGuardError::SettingsError {
                kind: StoreErrorKind::InvalidData,
                message,
            }) => {
                tracing::warn!(error = %message, "unreadable settings, using empty");
                Ok(SettingsFile::default())
            }
            other => other,
        }
    }

    fn write_all(&self, data: &SettingsFile) -> Result<()> {
        let text = serde_json::to_string_pretty(data)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, text)?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            LinkGuardError::settings(
                StoreErrorKind::FileError,
                format!("Failed to replace '{}': {}", self.path.display(), e),
            )
        })
    }

    fn default_guild(&self) -> GuildSettings {
        GuildSettings {
            enabled: self.enabled_by_default,
            ..GuildSettings::default()
        }
    }

    /// Settings of a guild, defaulted if never stored
    pub fn status(&self, guild_id: u64) -> Result<GuildSettings> {
        let data = self.read_lenient()?;
        Ok(data
            .guilds
            .get(&guild_id)
            .cloned()
            .unwrap_or_else(|| self.default_guild()))
    }

    /// Read-modify-write one guild. Refuses to overwrite a file it cannot decode.
    fn update<F>(&self, guild_id: u64, f: F) -> Result<()>
    where
        F: FnOnce(&mut GuildSettings),
    {
        let _lock = self.lock.lock();
        let mut data = self.read_all()?;
        let default = self.default_guild();
        f(data.guilds.entry(guild_id).or_insert(default));
        self.write_all(&data)
    }

    pub fn is_server_enabled(&self, guild_id: u64) -> Result<bool> {
        Ok(self.status(guild_id)?.enabled)
    }

    pub fn set_server_enabled(&self, guild_id: u64, enabled: bool) -> Result<()> {
        self.update(guild_id, |g| g.enabled = enabled)?;
        tracing::info!(guild_id, enabled, "linkguard server toggle");
        Ok(())
    }

    /// Channel override, or `None` when the channel follows the server switch
    pub fn channel_override(&self, guild_id: u64, channel_id: u64) -> Result<Option<bool>> {
        Ok(self.status(guild_id)?.channels.get(&channel_id).copied())
    }

    pub fn set_channel_enabled(&self, guild_id: u64, channel_id: u64, enabled: bool) -> Result<()> {
        self.update(guild_id, |g| {
            g.channels.insert(channel_id, enabled);
        })?;
        tracing::info!(guild_id, channel_id, enabled, "linkguard channel override");
        Ok(())
    }

    pub fn exempt_roles(&self, guild_id: u64) -> Result<Vec<u64>> {
        Ok(self.status(guild_id)?.exempt_roles)
    }

    /// Replace the exempt roles. Duplicates are dropped, first occurrence kept.
    pub fn set_exempt_roles(&self, guild_id: u64, role_ids: &[u64]) -> Result<()> {
        let roles = dedup_roles(role_ids);
        self.update(guild_id, |g| g.exempt_roles = roles)
    }

    pub fn restrict_roles(&self, guild_id: u64) -> Result<Vec<u64>> {
        Ok(self.status(guild_id)?.restrict_roles)
    }

    /// Replace the restricted roles. Duplicates are dropped, first occurrence kept.
    pub fn set_restrict_roles(&self, guild_id: u64, role_ids: &[u64]) -> Result<()> {
        let roles = dedup_roles(role_ids);
        self.update(guild_id, |g| g.restrict_roles = roles)
    }
}

fn dedup_roles(role_ids: &[u64]) -> Vec<u64> {
    let mut seen = HashSet::with_capacity(role_ids.len());
    role_ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store(enabled_by_default: bool) -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store =
            SettingsStore::open(dir.path().join("linkguard_settings.json"), enabled_by_default)
                .unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_creates_empty_file() {
        let (_dir, store) = open_store(false);
        let text = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, serde_json::json!({ "guilds": {} }));
    }

    #[test]
    fn test_defaults_for_unknown_guild() {
        let (_dir, store) = open_store(false);
        assert!(!store.is_server_enabled(1).unwrap());
        assert_eq!(store.channel_override(1, 2).unwrap(), None);
        assert!(store.exempt_roles(1).unwrap().is_empty());

        let (_dir, store) = open_store(true);
        assert!(store.is_server_enabled(1).unwrap());
    }

    #[test]
    fn test_server_and_channel_toggles() {
        let (_dir, store) = open_store(false);
        store.set_server_enabled(10, true).unwrap();
        store.set_channel_enabled(10, 20, false).unwrap();

        assert!(store.is_server_enabled(10).unwrap());
        assert_eq!(store.channel_override(10, 20).unwrap(), Some(false));
        assert_eq!(store.channel_override(10, 21).unwrap(), None);
        assert!(!store.is_server_enabled(11).unwrap());
    }

    #[test]
    fn test_roles_are_deduplicated() {
        let (_dir, store) = open_store(false);
        store.set_exempt_roles(1, &[5, 3, 5, 7, 3]).unwrap();
        store.set_restrict_roles(1, &[9, 9]).unwrap();
        assert_eq!(store.exempt_roles(1).unwrap(), vec![5, 3, 7]);
        assert_eq!(store.restrict_roles(1).unwrap(), vec![9]);

        store.set_exempt_roles(1, &[]).unwrap();
        assert!(store.exempt_roles(1).unwrap().is_empty());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        {
            let store = SettingsStore::open(&path, false).unwrap();
            store.set_server_enabled(42, true).unwrap();
        }
        let store = SettingsStore::open(&path, false).unwrap();
        assert!(store.is_server_enabled(42).unwrap());
        assert_eq!(store.status(42).unwrap().channels.len(), 0);
    }

    #[test]
    fn test_corrupt_file_reads_as_empty_and_is_kept() {
        let (_dir, store) = open_store(false);
        fs::write(store.path(), "{ not json").unwrap();
        assert!(!store.is_server_enabled(1).unwrap());

        let err = store.set_server_enabled(1, true).unwrap_err();
        assert!(matches!(
            err,
            LinkGuardError::SettingsError {
                kind: StoreErrorKind::InvalidData,
                ..
            }
        ));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{ not json");
    }

    #[test]
    fn test_reads_camel_case_string_ids() {
        let (_dir, store) = open_store(false);
        fs::write(
            store.path(),
            r#"{"guilds":{"5":{"enabled":true,"channels":{"9":false},"exemptRoles":["7"],"restrictRoles":["8", 9]}}}"#,
        )
        .unwrap();

        assert!(store.is_server_enabled(5).unwrap());
        assert_eq!(store.channel_override(5, 9).unwrap(), Some(false));
        assert_eq!(store.exempt_roles(5).unwrap(), vec![7]);
        assert_eq!(store.restrict_roles(5).unwrap(), vec![8, 9]);

        // Rewritten in snake_case without losing roles
        store.set_channel_enabled(5, 10, true).unwrap();
        assert_eq!(store.exempt_roles(5).unwrap(), vec![7]);
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("exempt_roles"));
    }

    #[test]
    fn test_bad_role_id_is_rejected() {
        let (_dir, store) = open_store(false);
        fs::write(
            store.path(),
            r#"{"guilds":{"5":{"enabled":true,"exemptRoles":["mods"]}}}"#,
        )
        .unwrap();
        assert!(store.set_exempt_roles(5, &[1]).is_err());
        assert!(fs::read_to_string(store.path()).unwrap().contains("mods"));
    }
}
