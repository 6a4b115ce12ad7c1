//! ZIP export of attached SPJ files.
//!
//! Files are fetched one at a time; a file that cannot be fetched is
//! logged and left out of the archive.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::filter::{month_range, year_range};
use crate::models::{Bidang, Spj};
use crate::repository::{DieselError, DieselSpjRepository, SpjQuery};
use crate::storage::{key_from_reference, original_filename, FileStore, StorageError};
use crate::utils::{disambiguate, month_label};

/// Error fetching a single attached file.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("cannot resolve file reference: {0}")]
    Unresolvable(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Source of attached file bytes.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, FetchError>;
}

#[async_trait]
impl FileFetcher for FileStore {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, FetchError> {
        Ok(FileStore::fetch(self, reference).await?)
    }
}

/// Fetches files over HTTP.
///
/// Absolute references are requested as-is; bare object keys are resolved
/// against `base_url` when one is configured.
#[derive(Clone)]
pub struct HttpFileFetcher {
    client: reqwest::Client,
    base_url: Option<Url>,
}

impl HttpFileFetcher {
    pub fn new(base_url: Option<Url>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;
        Ok(Self { client, base_url })
    }

    fn resolve(&self, reference: &str) -> Result<Url, FetchError> {
        if let Ok(url) = Url::parse(reference) {
            return Ok(url);
        }
        let base = self
            .base_url
            .as_ref()
            .ok_or_else(|| FetchError::Unresolvable(reference.to_string()))?;
        base.join(key_from_reference(reference))
            .map_err(|_| FetchError::Unresolvable(reference.to_string()))
    }
}

#[async_trait]
impl FileFetcher for HttpFileFetcher {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.resolve(reference)?;
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Errors that abort an archive export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Tidak ada file arsip yang ditemukan untuk kriteria yang dipilih.")]
    NoMatchingRecords,

    #[error("Tidak ada file yang berhasil diunduh untuk di-zip.")]
    NoFilesFetched,

    #[error("Gagal memuat data: {0}")]
    Store(#[from] DieselError),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which records an archive covers. `None` means "all".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveSelection {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub bidang: Option<Bidang>,
}

impl ArchiveSelection {
    /// Store predicates: the narrowest date range both selections allow.
    pub fn store_query(&self) -> SpjQuery {
        let date_range = match (self.year, self.month) {
            (Some(year), Some(month)) => month_range(year, month),
            (Some(year), None) => year_range(year),
            (None, _) => None,
        };
        SpjQuery {
            date_range,
            bidang: self.bidang,
            with_file_only: true,
        }
    }

    /// Month predicate for rows the store could not narrow.
    pub fn matches_month(&self, spj: &Spj) -> bool {
        use chrono::Datelike;
        self.month.map_or(true, |m| spj.tanggal.month() == m)
    }

    /// Download name, e.g. `arsip_spj_2024_Maret_Ekonomi.zip`.
    pub fn archive_name(&self) -> String {
        let mut name = String::from("arsip_spj");
        let month = self.month.and_then(month_label);
        match (self.year, month) {
            (Some(year), Some(label)) => name.push_str(&format!("_{}_{}", year, label)),
            (Some(year), None) => name.push_str(&format!("_{}", year)),
            (None, Some(label)) => name.push_str(&format!("_semua_tahun_{}", label)),
            (None, None) => {}
        }
        if let Some(bidang) = self.bidang {
            name.push('_');
            name.push_str(bidang.as_str());
        }
        name.push_str(".zip");
        name
    }
}

/// A finished archive.
#[derive(Debug)]
pub struct ArchiveOutcome {
    pub name: String,
    pub bytes: Vec<u8>,
    pub file_count: usize,
}

/// Entry name for a record's file: `{nomor_pembukuan}_{original name}`.
///
/// Path separators in the booking number are replaced so that every entry
/// sits at the archive root.
pub fn entry_name(spj: &Spj, reference: &str) -> String {
    let nomor: String = spj
        .nomor_pembukuan
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect();
    format!("{}_{}", nomor, original_filename(reference))
}

/// Build a ZIP of the files attached to `records`.
///
/// Records without a file are ignored.
pub async fn build_archive(
    records: &[Spj],
    fetcher: &dyn FileFetcher,
) -> Result<(Vec<u8>, usize), ExportError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut used = HashSet::new();
    let mut added = 0;

    for spj in records {
        let Some(reference) = spj.file_url.as_deref() else {
            continue;
        };
        let content = match fetcher.fetch(reference).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to fetch {}: {}. Skipping", reference, e);
                continue;
            }
        };
        let name = disambiguate(&entry_name(spj, reference), &mut used);
        debug!("Adding {} ({} bytes)", name, content.len());
        zip.start_file(name, options)?;
        zip.write_all(&content)?;
        added += 1;
    }

    let cursor = zip.finish()?;
    Ok((cursor.into_inner(), added))
}

/// Query, fetch and archive every attached file matching `selection`.
pub async fn export_zip(
    repo: &DieselSpjRepository,
    fetcher: &dyn FileFetcher,
    selection: &ArchiveSelection,
) -> Result<ArchiveOutcome, ExportError> {
    let records: Vec<Spj> = repo
        .query(&selection.store_query())
        .await?
        .into_iter()
        .filter(|spj| selection.matches_month(spj))
        .collect();

    if records.is_empty() {
        return Err(ExportError::NoMatchingRecords);
    }

    let (bytes, file_count) = build_archive(&records, fetcher).await?;
    if file_count == 0 {
        return Err(ExportError::NoFilesFetched);
    }

    let name = selection.archive_name();
    info!("{} file arsip berhasil diunduh dalam format ZIP ({})", file_count, name);
    Ok(ArchiveOutcome {
        name,
        bytes,
        file_count,
    })
}
