// File-backed key-value store.
// Each key maps to `<dir>/<key>.json`; writes go through a temp file and a rename.
// Keys must be file-name safe; anything else is rejected rather than rewritten.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{KeyValueStore, StoreError, StoreResult};

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: PathBuf) -> StoreResult<Self> {
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        if !is_valid_key(key) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let io_err = |source: std::io::Error| StoreError::Io {
            key: key.to_string(),
            source,
        };

        // Write atomically via temp file
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, value).await.map_err(io_err)?;
        fs::rename(&temp_path, &path).await.map_err(io_err)?;

        debug!(key, bytes = value.len(), "Stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// Keys become file names as-is: ASCII letters, digits, `-` and `_` only.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_validation() {
        assert!(is_valid_key("jokes"));
        assert!(is_valid_key("joke_2-b"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("../etc/passwd"));
        assert!(!is_valid_key("a/b"));
        assert!(!is_valid_key("a.b"));
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().to_path_buf()).unwrap();

        store.set("joke", r#"{"setup":"a","punchline":"b"}"#).await.unwrap();

        let value = store.get("joke").await.unwrap();
        assert_eq!(value.as_deref(), Some(r#"{"setup":"a","punchline":"b"}"#));
        assert!(temp_dir.path().join("joke.json").exists());
        assert!(!temp_dir.path().join("joke.tmp").exists());
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().to_path_buf()).unwrap();

        assert!(store.get("jokes").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().to_path_buf()).unwrap();

        store.set("jokes", "[]").await.unwrap();
        store.set("jokes", "[1]").await.unwrap();
        assert_eq!(store.get("jokes").await.unwrap().as_deref(), Some("[1]"));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().to_path_buf()).unwrap();

        store.set("joke", "{}").await.unwrap();
        store.remove("joke").await.unwrap();
        store.remove("joke").await.unwrap();
        assert!(store.get("joke").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unsafe_keys_never_share_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().to_path_buf()).unwrap();

        store.set("a_b", "underscore").await.unwrap();
        assert!(matches!(
            store.set("a/b", "slash").await,
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(
            store.get("a:b").await,
            Err(StoreError::InvalidKey(_))
        ));
        assert_eq!(store.get("a_b").await.unwrap().as_deref(), Some("underscore"));
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().to_path_buf()).unwrap();

        assert!(matches!(
            store.set("", "x").await,
            Err(StoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_new_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");

        let store = FileStore::new(nested.clone()).unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.dir(), nested.as_path());
    }
}
