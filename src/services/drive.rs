//! Google Drive transfers.
//!
//! Tokens are obtained by the caller; this client only attaches them.
//! Picked files are always downloaded from the Drive files API. A caller
//! names the file, never the address it is fetched from.

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use super::archive::{FetchError, FileFetcher};
use crate::models::Spj;
use crate::storage::key_from_reference;
use crate::utils::guess_mime;

/// Default multipart upload endpoint.
pub const DRIVE_UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart";

/// Files API base that picked files are downloaded from.
pub const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files/";

const DRIVE_HOST: &str = "www.googleapis.com";

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("Gagal mengunduh file dari Google Drive: HTTP {0}")]
    Download(u16),

    #[error("Gagal mengunggah ke Google Drive: {0}")]
    Upload(String),

    #[error("Tidak ada file untuk ditransfer.")]
    NoFile,

    #[error("Referensi file Google Drive tidak valid: {0}")]
    InvalidFile(String),

    #[error("Ukuran file melebihi batas maksimal ({size} > {limit} byte)")]
    TooLarge { size: u64, limit: usize },

    #[error("Invalid Drive endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("Gagal mengambil file: {0}")]
    Fetch(#[from] FetchError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A file picked from Drive, to be copied into the archive store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveFile {
    /// A bare Drive file id, or the picker's
    /// `https://www.googleapis.com/drive/v3/files/{id}?alt=media` URL.
    pub url: String,
    pub name: String,
    pub token: String,
}

impl DriveFile {
    /// The Drive file id this pick refers to.
    ///
    /// Anything other than a bare id or an `https` files API URL on the
    /// Drive host is rejected.
    pub fn file_id(&self) -> Result<String, DriveError> {
        let raw = self.url.trim();
        if is_file_id(raw) {
            return Ok(raw.to_string());
        }

        let invalid = || DriveError::InvalidFile(raw.to_string());
        let url = Url::parse(raw).map_err(|_| invalid())?;
        if url.scheme() != "https"
            || url.host_str() != Some(DRIVE_HOST)
            || url.port().is_some()
            || !url.username().is_empty()
            || url.password().is_some()
        {
            return Err(invalid());
        }

        let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
        match segments.as_slice() {
            ["drive", "v3", "files", id] if is_file_id(id) => Ok(id.to_string()),
            _ => Err(invalid()),
        }
    }
}

fn is_file_id(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 256
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata<'a> {
    name: &'a str,
    mime_type: &'a str,
}

#[derive(Deserialize)]
struct UploadedFile {
    id: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct DriveClient {
    client: reqwest::Client,
    upload_url: String,
    files_url: Url,
}

impl DriveClient {
    pub fn new(upload_url: impl Into<String>) -> Result<Self, DriveError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            upload_url: upload_url.into(),
            files_url: Url::parse(DRIVE_FILES_URL)?,
        })
    }

    /// Use another files API base. Must end with `/`.
    pub fn with_files_url(mut self, files_url: Url) -> Self {
        self.files_url = files_url;
        self
    }

    /// Download a picked file with its bearer token.
    ///
    /// Fails with [`DriveError::TooLarge`] as soon as the declared or
    /// received size passes `max_bytes`.
    pub async fn download(&self, file: &DriveFile, max_bytes: usize) -> Result<Vec<u8>, DriveError> {
        let mut url = self.files_url.join(&file.file_id()?)?;
        url.set_query(Some("alt=media"));
        debug!("Downloading {} from Drive", file.name);

        let mut response = self
            .client
            .get(url)
            .bearer_auth(&file.token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(DriveError::Download(response.status().as_u16()));
        }

        if let Some(size) = response.content_length() {
            if size > max_bytes as u64 {
                return Err(DriveError::TooLarge {
                    size,
                    limit: max_bytes,
                });
            }
        }

        let mut content = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if content.len() + chunk.len() > max_bytes {
                return Err(DriveError::TooLarge {
                    size: (content.len() + chunk.len()) as u64,
                    limit: max_bytes,
                });
            }
            content.extend_from_slice(&chunk);
        }
        Ok(content)
    }

    /// Multipart upload; returns the new Drive file id.
    pub async fn upload(
        &self,
        name: &str,
        content: Vec<u8>,
        token: &str,
    ) -> Result<String, DriveError> {
        let mime = guess_mime(name);
        let metadata = serde_json::to_string(&FileMetadata {
            name,
            mime_type: &mime,
        })
        .map_err(|e| DriveError::Upload(e.to_string()))?;

        let form = Form::new()
            .part(
                "metadata",
                Part::text(metadata).mime_str("application/json")?,
            )
            .part(
                "file",
                Part::bytes(content)
                    .file_name(name.to_string())
                    .mime_str(&mime)?,
            );

        let response = self
            .client
            .post(&self.upload_url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ApiErrorBody>().await {
                Ok(body) if !body.error.message.is_empty() => body.error.message,
                _ => status.to_string(),
            };
            return Err(DriveError::Upload(message));
        }

        let uploaded: UploadedFile = response.json().await?;
        Ok(uploaded.id)
    }

    /// Copy a record's attachment to Drive.
    pub async fn transfer(
        &self,
        spj: &Spj,
        fetcher: &dyn FileFetcher,
        token: &str,
    ) -> Result<String, DriveError> {
        let reference = spj.file_url.as_deref().ok_or(DriveError::NoFile)?;
        let content = fetcher.fetch(reference).await?;
        let name = drive_filename(spj, reference);
        let id = self.upload(&name, content, token).await?;
        info!("File berhasil ditransfer ke Google Drive! ID: {}", id);
        Ok(id)
    }
}

/// Name of a transferred file: `{nomor}_{original}`, or `{nomor}_arsip_{nomor}`
/// when the object key carries no original name.
pub fn drive_filename(spj: &Spj, reference: &str) -> String {
    let key = key_from_reference(reference);
    let original = match key.split_once('_') {
        Some((_, rest)) => rest.to_string(),
        None => format!("arsip_{}", spj.nomor_pembukuan),
    };
    format!("{}_{}", spj.nomor_pembukuan, original)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JenisSpj;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn spj(file: Option<&str>) -> Spj {
        Spj {
            id: "1".to_string(),
            nomor_pembukuan: "017".to_string(),
            kode_rekening: "5.1".to_string(),
            jenis_spj: JenisSpj::Gu,
            bidang: None,
            tanggal: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            uraian: "Perjalanan dinas".to_string(),
            jumlah: 10,
            file_url: file.map(String::from),
        }
    }

    #[test]
    fn test_drive_filename() {
        let record = spj(None);
        assert_eq!(
            drive_filename(&record, "http://h/files/20240102T000000000Z_sppd_final.pdf"),
            "017_sppd_final.pdf"
        );
        assert_eq!(drive_filename(&record, "scan.pdf"), "017_arsip_017");
    }

    fn pick(url: &str) -> DriveFile {
        DriveFile {
            url: url.to_string(),
            name: "scan.pdf".to_string(),
            token: "tok".to_string(),
        }
    }

    /// Serve `body` for any file id, counting requests.
    async fn serve_files(body: Vec<u8>) -> (Url, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = axum::Router::new().route(
            "/files/:id",
            axum::routing::get(move || {
                let body = body.clone();
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    body
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let base = Url::parse(&format!("http://{}/files/", addr)).unwrap();
        (base, hits)
    }

    #[test]
    fn test_file_id_from_picker_url_or_bare_id() {
        assert_eq!(
            pick("https://www.googleapis.com/drive/v3/files/1AbC-d_9?alt=media")
                .file_id()
                .unwrap(),
            "1AbC-d_9"
        );
        assert_eq!(pick("1AbC-d_9").file_id().unwrap(), "1AbC-d_9");
    }

    #[test]
    fn test_file_id_rejects_other_addresses() {
        for url in [
            "http://127.0.0.1:8080/admin/secret",
            "http://www.googleapis.com/drive/v3/files/abc",
            "https://www.googleapis.com:8443/drive/v3/files/abc",
            "https://www.googleapis.com.attacker.test/drive/v3/files/abc",
            "https://user@www.googleapis.com/drive/v3/files/abc",
            "https://www.googleapis.com/drive/v3/files/abc/../../../admin",
            "https://www.googleapis.com/upload/drive/v3/files/abc",
            "file:///etc/passwd",
            "../../etc/passwd",
            "",
        ] {
            assert!(
                matches!(pick(url).file_id(), Err(DriveError::InvalidFile(_))),
                "accepted {}",
                url
            );
        }
    }

    #[tokio::test]
    async fn test_download_never_requests_caller_address() {
        let (base, hits) = serve_files(b"INTERNAL".to_vec()).await;
        let client = DriveClient::new(DRIVE_UPLOAD_URL).unwrap();
        let caller_url = base.join("secret").unwrap().to_string();

        let err = client.download(&pick(&caller_url), 1024).await.unwrap_err();
        assert!(matches!(err, DriveError::InvalidFile(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_download_within_limit() {
        let (base, hits) = serve_files(vec![7; 1024]).await;
        let client = DriveClient::new(DRIVE_UPLOAD_URL)
            .unwrap()
            .with_files_url(base);

        let content = client.download(&pick("abc123"), 4096).await.unwrap();
        assert_eq!(content.len(), 1024);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_download_over_limit_fails() {
        let (base, _hits) = serve_files(vec![7; 1024]).await;
        let client = DriveClient::new(DRIVE_UPLOAD_URL)
            .unwrap()
            .with_files_url(base);

        let err = client.download(&pick("abc123"), 100).await.unwrap_err();
        assert!(matches!(err, DriveError::TooLarge { limit: 100, .. }));
    }

    #[tokio::test]
    async fn test_transfer_without_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = crate::storage::FileStore::new(dir.path());
        let client = DriveClient::new(DRIVE_UPLOAD_URL).unwrap();
        let err = client.transfer(&spj(None), &store, "token").await.unwrap_err();
        assert!(matches!(err, DriveError::NoFile));
    }

    #[tokio::test]
    async fn test_transfer_of_missing_object_fails_before_upload() {
        let dir = tempfile::tempdir().unwrap();
        let store = crate::storage::FileStore::new(dir.path());
        let client = DriveClient::new("http://127.0.0.1:9/upload").unwrap();
        let err = client
            .transfer(&spj(Some("20240102T000000000Z_gone.pdf")), &store, "token")
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::Fetch(_)));
    }
}
