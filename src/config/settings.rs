//! Resolved runtime settings.

use std::fs;
use std::path::PathBuf;

use url::Url;

use crate::models::DEFAULT_MAX_UPLOAD_BYTES;
use crate::repository::{DbPool, Repositories};
use crate::services::{DriveClient, DriveError, FetchError, HttpFileFetcher, DRIVE_UPLOAD_URL};
use crate::storage::FileStore;

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "espj.db";

/// Default server bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1:3030";

/// Default attachments subdirectory name.
const FILES_SUBDIR: &str = "files";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    pub database_url: Option<String>,
    /// Directory for stored attachments.
    pub files_dir: PathBuf,
    /// Base URL of the object endpoint, used when fetching over HTTP.
    pub files_base_url: Option<String>,
    pub bind: String,
    pub max_upload_bytes: usize,
    pub drive_upload_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: Documents dir -> Home dir -> Current dir
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("espj");

        Self {
            files_dir: data_dir.join(FILES_SUBDIR),
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            files_base_url: None,
            bind: DEFAULT_BIND.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            drive_upload_url: DRIVE_UPLOAD_URL.to_string(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        let mut settings = Self::default();
        settings.set_data_dir(data_dir);
        settings
    }

    /// Move the data directory; the files directory follows it.
    pub fn set_data_dir(&mut self, data_dir: PathBuf) {
        self.files_dir = data_dir.join(FILES_SUBDIR);
        self.data_dir = data_dir;
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        match self.database_url {
            Some(ref url) => url.clone(),
            None => format!("sqlite:{}", self.database_path().display()),
        }
    }

    /// Full path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Check if the database appears to be initialized.
    pub fn database_exists(&self) -> bool {
        self.database_url.is_some() || self.database_path().exists()
    }

    /// Ensure all directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for (dir, label) in [(&self.data_dir, "data"), (&self.files_dir, "files")] {
            tracing::debug!("Ensuring {} directory {}", label, dir.display());
            fs::create_dir_all(dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!("Failed to create {} directory '{}': {}", label, dir.display(), e),
                )
            })?;
        }
        Ok(())
    }

    /// Repository bundle over the configured database.
    pub fn repositories(&self) -> Repositories {
        Repositories::new(DbPool::new(&self.database_url()))
    }

    pub fn file_store(&self) -> FileStore {
        FileStore::new(self.files_dir.clone())
    }

    pub fn drive_client(&self) -> Result<DriveClient, DriveError> {
        DriveClient::new(self.drive_upload_url.clone())
    }

    /// HTTP fetcher rooted at `files_base_url`, if one is configured.
    pub fn http_fetcher(&self) -> Result<Option<HttpFileFetcher>, FetchError> {
        let Some(ref base) = self.files_base_url else {
            return Ok(None);
        };
        // Ensure join() appends rather than replaces the last segment
        let normalized = if base.ends_with('/') {
            base.clone()
        } else {
            format!("{}/", base)
        };
        let url = Url::parse(&normalized).map_err(|_| FetchError::Unresolvable(base.clone()))?;
        HttpFileFetcher::new(Some(url)).map(Some)
    }
}
