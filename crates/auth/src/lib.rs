use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

type Credentials = BTreeMap<String, String>;

/// API keys per profile, kept in a JSON file readable only by the owner.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at `~/.bugzilla-cli/credentials`.
    pub fn new() -> Result<Self> {
        let path = dirs::home_dir()
            .map(|h| h.join(".bugzilla-cli").join("credentials"))
            .context("Cannot determine home directory")?;
        Ok(Self { path })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_secret(&self, profile: &str, secret: &str) -> Result<()> {
        let mut creds = self.read()?;
        creds.insert(profile.to_string(), secret.to_string());
        self.write(&creds)
    }

    pub fn get_secret(&self, profile: &str) -> Result<Option<String>> {
        Ok(self.read()?.remove(profile))
    }

    /// Removes the key for `profile`. Returns whether one was stored.
    pub fn delete_secret(&self, profile: &str) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        let mut creds = self.read()?;
        let removed = creds.remove(profile).is_some();
        if removed {
            self.write(&creds)?;
        }
        Ok(removed)
    }

    fn read(&self) -> Result<Credentials> {
        if !self.path.exists() {
            return Ok(Credentials::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Unable to read credentials at {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Malformed credentials file {}", self.path.display()))
    }

    fn write(&self, creds: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let file = options
            .open(&self.path)
            .with_context(|| format!("Unable to write credentials at {}", self.path.display()))?;
        serde_json::to_writer_pretty(file, creds)?;
        debug!(path = %self.path.display(), entries = creds.len(), "Saved credentials");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, CredentialStore) {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::at(dir.path().join("nested").join("credentials"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_has_no_secret() {
        let (_dir, store) = store();
        assert!(store.get_secret("bmo").unwrap().is_none());
        assert!(!store.delete_secret("bmo").unwrap());
    }

    #[test]
    fn test_set_get_delete() {
        let (_dir, store) = store();
        store.set_secret("bmo", "key-1").unwrap();
        store.set_secret("local", "key-2").unwrap();

        assert_eq!(store.get_secret("bmo").unwrap().as_deref(), Some("key-1"));
        assert!(store.delete_secret("bmo").unwrap());
        assert!(store.get_secret("bmo").unwrap().is_none());
        assert_eq!(store.get_secret("local").unwrap().as_deref(), Some("key-2"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = store();
        store.set_secret("bmo", "key-1").unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_malformed_file() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "not json").unwrap();
        let err = store.get_secret("bmo").unwrap_err();
        assert!(err.to_string().contains("Malformed credentials"));
    }
}
