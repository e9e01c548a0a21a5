use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::Mutex;

use super::{entry_key, DomainStore};
use crate::error::{LinkGuardError, Result, StoreErrorKind};
use crate::parser::rule_lines;

/// Flat-file store: UTF-8 text, one entry per line, `#` comments.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open a store, creating the file (and its directory) with `defaults`
    /// if it does not exist yet.
    pub fn open(path: impl AsRef<Path>, defaults: &[&str]) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_file(&path, defaults)?;
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| {
            LinkGuardError::store(
                StoreErrorKind::FileError,
                format!("Failed to read '{}': {}", self.path.display(), e),
            )
        })
    }

    fn write_atomic(&self, contents: &str) -> Result<()> {
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, contents)?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(LinkGuardError::store(
                StoreErrorKind::FileError,
                format!("Failed to replace '{}': {}", self.path.display(), e),
            ));
        }
        Ok(())
    }
}

fn ensure_file(path: &Path, defaults: &[&str]) -> Result<()> {
    if path.exists() {
        return Ok(());
    }

    let create = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, defaults.join("\n"))
    };

    create().map_err(|e| {
        LinkGuardError::store(
            StoreErrorKind::FileError,
            format!("Failed to create '{}': {}", path.display(), e),
        )
    })?;
    tracing::info!(path = %path.display(), "created store file with defaults");
    Ok(())
}

impl DomainStore for FileStore {
    fn list(&self) -> Result<Vec<String>> {
        let text = self.read()?;
        Ok(rule_lines(&text).map(|(_, line)| line.to_string()).collect())
    }

    fn add(&self, entry: &str) -> Result<bool> {
        let entry = entry.trim();
        if entry.is_empty() {
            return Ok(false);
        }

        let _lock = self.write_lock.lock();
        let text = self.read()?;
        let key = entry_key(entry);
        if rule_lines(&text).any(|(_, line)| entry_key(line) == key) {
            return Ok(false);
        }

        let separator = if text.is_empty() || text.ends_with('\n') {
            ""
        } else {
            "\n"
        };
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        write!(file, "{}{}", separator, entry)?;
        file.flush()?;
        Ok(true)
    }

    fn remove(&self, entry: &str) -> Result<bool> {
        let _lock = self.write_lock.lock();
        let text = self.read()?;
        let key = entry_key(entry);

        let mut lines: Vec<&str> = text.split('\n').collect();
        let Some(idx) = lines.iter().position(|line| entry_key(line) == key) else {
            return Ok(false);
        };
        lines.remove(idx);

        self.write_atomic(&lines.join("\n"))?;
        Ok(true)
    }

    fn revision(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }
}
