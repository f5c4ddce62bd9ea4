//! File-backed key-value store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{validate_key, KeyValueStore, StoreError};

/// Stores each key as a file under `<root>/<namespace>/`.
///
/// Writes go to a temporary file that is renamed over the target, so a
/// crash mid-write leaves the previous value intact. On Unix the namespace
/// directory is `0700` and value files are `0600`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) the namespace directory under `root`.
    pub async fn open(root: &Path, namespace: &str) -> Result<Self, StoreError> {
        validate_key(namespace)?;
        let dir = root.join(namespace);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StoreError::Io {
                path: dir.clone(),
                source,
            })?;
        set_permissions(&dir, 0o700).await?;
        Ok(Self { dir })
    }

    /// Directory holding this namespace's files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp.clone(),
                source,
            })?;
        set_permissions(&tmp, 0o600).await?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| StoreError::Io { path, source })
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

/// Set Unix permission bits. No-op on non-Unix platforms.
async fn set_permissions(path: &Path, mode: u32) -> Result<(), StoreError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .await
            .map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn file_store_roundtrip() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path(), "cleanout").await.unwrap();

        store.set("sync_queue", "[]").await.unwrap();

        assert_eq!(store.get("sync_queue").await.unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("cleanout/sync_queue.json").exists());
    }

    #[tokio::test]
    async fn value_survives_reopen() {
        let dir = tempdir().unwrap();
        FileStore::open(dir.path(), "cleanout")
            .await
            .unwrap()
            .set("auth_token", "abc")
            .await
            .unwrap();

        let reopened = FileStore::open(dir.path(), "cleanout").await.unwrap();
        assert_eq!(
            reopened.get("auth_token").await.unwrap().as_deref(),
            Some("abc")
        );
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let dir = tempdir().unwrap();
        let a = FileStore::open(dir.path(), "a").await.unwrap();
        let b = FileStore::open(dir.path(), "b").await.unwrap();

        a.set("k", "from-a").await.unwrap();

        assert_eq!(b.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_missing_key_succeeds() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path(), "cleanout").await.unwrap();
        store.remove("never-set").await.unwrap();
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path(), "cleanout").await.unwrap();
        let result = store.set("../escape", "x").await;
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn value_file_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path(), "cleanout").await.unwrap();
        store.set("auth_token", "secret").await.unwrap();

        let path = store.dir().join("auth_token.json");
        let perms = tokio::fs::metadata(&path).await.unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600, "file should be 0600");

        let perms = tokio::fs::metadata(store.dir()).await.unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o700, "dir should be 0700");
    }
}
