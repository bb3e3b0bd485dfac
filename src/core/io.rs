use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Byte store behind document intake and export.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn read(&self, path: &str) -> Result<Vec<u8>>;
    async fn write(&self, path: &str, content: &[u8]) -> Result<()>;
    /// Entries directly under `prefix`, sorted. Empty if it does not exist.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
    /// Last modification time in unix millis, if the backend tracks one.
    async fn modified_millis(&self, _path: &str) -> Result<Option<u64>> {
        Ok(None)
    }
}

pub struct NativeStorage;

impl NativeStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NativeStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for NativeStorage {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path))
    }

    async fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write {}", path))?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let path = Path::new(prefix);
        let mut entries = Vec::new();

        if path.is_dir() {
            let mut dir = tokio::fs::read_dir(path).await?;
            while let Some(entry) = dir.next_entry().await? {
                entries.push(entry.path().to_string_lossy().to_string());
            }
        } else if path.exists() {
            entries.push(prefix.to_string());
        }

        entries.sort();
        Ok(entries)
    }

    async fn modified_millis(&self, path: &str) -> Result<Option<u64>> {
        let metadata = tokio::fs::metadata(path).await?;
        Ok(metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_native_storage_write_creates_parents() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let nested = temp_dir.path().join("a/b/c.txt");
        let nested = nested.to_str().unwrap();

        let storage = NativeStorage::new();
        storage.write(nested, "林渊".as_bytes()).await?;

        assert_eq!(storage.read(nested).await?, "林渊".as_bytes());
        assert!(storage.modified_millis(nested).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_native_storage_list_is_sorted_and_tolerates_missing() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let root = temp_dir.path();
        std::fs::write(root.join("b.txt"), "b")?;
        std::fs::write(root.join("a.txt"), "a")?;

        let storage = NativeStorage::new();
        let listed = storage.list(root.to_str().unwrap()).await?;
        assert_eq!(listed.len(), 2);
        assert!(listed[0].ends_with("a.txt"));
        assert!(listed[1].ends_with("b.txt"));

        let missing = root.join("nope");
        assert!(storage.list(missing.to_str().unwrap()).await?.is_empty());
        Ok(())
    }
}
