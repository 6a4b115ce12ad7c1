//! Object storage for SPJ attachments.
//!
//! Objects live flat under one directory and are addressed by a generated
//! key of the form `{UTC timestamp}-{random}_{original name}`. The prefix
//! never contains `_`, so the original name is everything after the first `_`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::utils::sanitize_filename;

/// Timestamp prefix format for object keys.
const KEY_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%3fZ";

/// Fresh keys tried before an upload gives up.
const MAX_KEY_ATTEMPTS: usize = 5;

/// Errors from the object store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("no free object key for {0}")]
    KeyExhausted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Directory-backed object store.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store bytes under a freshly generated key and return the key.
    ///
    /// Existing objects are never overwritten.
    pub async fn upload(&self, original_name: &str, content: &[u8]) -> Result<String, StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;

        for _ in 0..MAX_KEY_ATTEMPTS {
            let key = object_key(original_name, Utc::now());
            let path = self.root.join(&key);
            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!("Object key {} taken, retrying", key);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = write_all(&mut file, content).await {
                drop(file);
                let _ = tokio::fs::remove_file(&path).await;
                return Err(e.into());
            }
            tracing::debug!("Stored object {} ({} bytes)", key, content.len());
            return Ok(key);
        }

        Err(StorageError::KeyExhausted(original_name.to_string()))
    }

    /// Read an object by key or file reference.
    pub async fn fetch(&self, reference: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(reference)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(reference.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove an object. Returns false if it did not exist.
    pub async fn delete(&self, reference: &str) -> Result<bool, StorageError> {
        let path = self.object_path(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, reference: &str) -> bool {
        match self.object_path(reference) {
            Ok(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    fn object_path(&self, reference: &str) -> Result<PathBuf, StorageError> {
        let key = key_from_reference(reference);
        if key.is_empty() || key == "." || key == ".." {
            return Err(StorageError::InvalidKey(reference.to_string()));
        }
        Ok(self.root.join(key))
    }
}

async fn write_all(file: &mut tokio::fs::File, content: &[u8]) -> std::io::Result<()> {
    file.write_all(content).await?;
    file.flush().await
}

/// Build an object key for an upload made at `now`.
///
/// Each call draws a new random segment, so two uploads of the same name in
/// the same millisecond still get distinct keys.
pub fn object_key(original_name: &str, now: DateTime<Utc>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}_{}",
        now.format(KEY_TIMESTAMP_FORMAT),
        &random[..8],
        sanitize_filename(original_name)
    )
}

/// The object key of a file reference: its last `/`-separated segment.
///
/// References may be bare keys or full URLs to the object.
pub fn key_from_reference(reference: &str) -> &str {
    let without_query = reference.split(['?', '#']).next().unwrap_or(reference);
    without_query.rsplit('/').next().unwrap_or(without_query)
}

/// Recover the uploaded file's name from a reference by dropping the
/// timestamp prefix (everything up to and including the first `_`).
///
/// A key without `_` is returned whole.
pub fn original_filename(reference: &str) -> String {
    let key = key_from_reference(reference);
    let stripped = match key.find('_') {
        Some(idx) => &key[idx + 1..],
        None => key,
    };
    if stripped.is_empty() {
        key.to_string()
    } else {
        stripped.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_object_key_has_single_leading_separator() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let key = object_key("nota_belanja.pdf", now);
        assert!(key.starts_with("20240501T083000000Z-"));
        assert!(key.ends_with("_nota_belanja.pdf"));
        assert_eq!(key.find('_'), Some("20240501T083000000Z-".len() + 8));
        assert_eq!(original_filename(&key), "nota_belanja.pdf");
    }

    #[test]
    fn test_object_key_differs_within_one_instant() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        assert_ne!(object_key("scan.pdf", now), object_key("scan.pdf", now));
    }

    #[test]
    fn test_object_key_sanitizes_path_components() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let key = object_key("../scan.pdf", now);
        assert!(!key.contains('/'));
    }

    #[test]
    fn test_original_filename_from_url_reference() {
        assert_eq!(
            original_filename("https://files.example.go.id/files/20240101T000000000Z_kwitansi.jpg"),
            "kwitansi.jpg"
        );
        assert_eq!(original_filename("noprefix.pdf"), "noprefix.pdf");
        assert_eq!(original_filename("stamp_"), "stamp_");
    }

    #[test]
    fn test_key_from_reference_ignores_query() {
        assert_eq!(key_from_reference("http://h/files/k_a.pdf?download=1"), "k_a.pdf");
        assert_eq!(key_from_reference("k_a.pdf"), "k_a.pdf");
    }

    #[tokio::test]
    async fn test_upload_fetch_delete() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("files"));

        let key = store.upload("bukti.pdf", b"%PDF-1.4").await.unwrap();
        assert!(store.exists(&key).await);
        assert_eq!(store.fetch(&key).await.unwrap(), b"%PDF-1.4");

        assert!(store.delete(&key).await.unwrap());
        assert!(!store.delete(&key).await.unwrap());
        assert!(matches!(
            store.fetch(&key).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_repeated_uploads_keep_every_object() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let mut keys = Vec::new();
        for i in 0..200 {
            let body = format!("record-{}", i);
            keys.push(store.upload("scan.pdf", body.as_bytes()).await.unwrap());
        }

        let distinct: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(distinct.len(), keys.len());
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(original_filename(key), "scan.pdf");
            assert_eq!(store.fetch(key).await.unwrap(), format!("record-{}", i).as_bytes());
        }

        // Removing one object leaves the others alone
        assert!(store.delete(&keys[0]).await.unwrap());
        assert_eq!(store.fetch(&keys[1]).await.unwrap(), b"record-1");
    }

    #[tokio::test]
    async fn test_rejects_empty_key() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(matches!(
            store.fetch("https://host/files/").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
