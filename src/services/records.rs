//! Record lifecycle: create, replace, delete and attachment access.
//!
//! Role checks live here rather than in the repository.

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::drive::{DriveClient, DriveError, DriveFile};
use crate::models::{Spj, SpjInput, UserProfile, ValidationErrors, FILE_TOO_LARGE};
use crate::repository::{DieselError, DieselSpjRepository};
use crate::storage::{original_filename, FileStore, StorageError};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("SPJ not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(&'static str),

    #[error("Tidak ada file untuk diunduh.")]
    NoFile,

    #[error("Drive integration is not configured")]
    DriveUnavailable,

    #[error("Database error: {0}")]
    Store(#[from] DieselError),

    #[error("Gagal mengunggah file: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Drive(#[from] DriveError),
}

/// A file attached to a save request.
#[derive(Debug, Clone)]
pub enum Attachment {
    Upload { name: String, content: Vec<u8> },
    Drive(DriveFile),
}

/// An attachment ready for download.
#[derive(Debug)]
pub struct StoredFile {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Clone)]
pub struct RecordService {
    repo: DieselSpjRepository,
    store: FileStore,
    drive: Option<DriveClient>,
    max_upload_bytes: usize,
}

impl RecordService {
    pub fn new(repo: DieselSpjRepository, store: FileStore, max_upload_bytes: usize) -> Self {
        Self {
            repo,
            store,
            drive: None,
            max_upload_bytes,
        }
    }

    pub fn with_drive(mut self, drive: DriveClient) -> Self {
        self.drive = Some(drive);
        self
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub async fn get(&self, id: &str) -> Result<Spj, RecordError> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| RecordError::NotFound(id.to_string()))
    }

    /// Create a record, or fully replace `existing_id`.
    ///
    /// A new attachment replaces the file reference; without one, an edit
    /// keeps the existing reference.
    pub async fn save(
        &self,
        actor: &UserProfile,
        input: &SpjInput,
        attachment: Option<Attachment>,
        existing_id: Option<&str>,
    ) -> Result<Spj, RecordError> {
        let existing = match existing_id {
            Some(id) => {
                let current = self.get(id).await?;
                if !actor.can_edit(&current) {
                    return Err(RecordError::Forbidden(
                        "only the treasurer or the owning division may edit this SPJ",
                    ));
                }
                Some(current)
            }
            None => None,
        };

        let file = match attachment {
            Some(Attachment::Upload { name, content }) => Some((name, content)),
            Some(Attachment::Drive(picked)) => {
                if let Err(e) = picked.file_id() {
                    return Err(ValidationErrors::single("drive_file", e.to_string()).into());
                }
                let drive = self.drive.as_ref().ok_or(RecordError::DriveUnavailable)?;
                let content = match drive.download(&picked, self.max_upload_bytes).await {
                    Ok(content) => content,
                    Err(DriveError::TooLarge { .. }) => {
                        return Err(ValidationErrors::single("file", FILE_TOO_LARGE).into());
                    }
                    Err(e) => return Err(e.into()),
                };
                Some((picked.name, content))
            }
            None => None,
        };

        let fields = input.validate(
            file.as_ref().map(|(_, content)| content.len()),
            self.max_upload_bytes,
        )?;

        let uploaded = match file {
            Some((name, content)) => Some(self.store.upload(&name, &content).await?),
            None => None,
        };

        let result = match existing {
            Some(current) => {
                let file_url = uploaded.clone().or(current.file_url);
                let record = fields.into_spj(current.id, file_url);
                self.repo.update(&record).await.and_then(|updated| {
                    if updated {
                        Ok(record)
                    } else {
                        Err(diesel::result::Error::NotFound)
                    }
                })
            }
            None => {
                let record = fields.into_spj(Uuid::new_v4().to_string(), uploaded.clone());
                self.repo.insert(&record).await.map(|_| record)
            }
        };

        match result {
            Ok(record) => {
                info!("Saved SPJ {} ({})", record.nomor_pembukuan, record.id);
                Ok(record)
            }
            Err(e) => {
                if let Some(key) = uploaded {
                    if let Err(cleanup) = self.store.delete(&key).await {
                        warn!("Failed to remove orphaned upload {}: {}", key, cleanup);
                    }
                }
                match e {
                    diesel::result::Error::NotFound => {
                        Err(RecordError::NotFound(existing_id.unwrap_or_default().to_string()))
                    }
                    e => Err(e.into()),
                }
            }
        }
    }

    /// Delete a record and its stored object. Treasurer only.
    ///
    /// A failure to remove the object is logged and does not stop the row
    /// from being deleted.
    pub async fn delete(&self, actor: &UserProfile, id: &str) -> Result<Spj, RecordError> {
        if !actor.can_delete() {
            return Err(RecordError::Forbidden("only the treasurer may delete SPJ"));
        }
        let record = self.get(id).await?;

        if let Some(ref reference) = record.file_url {
            match self.store.delete(reference).await {
                Ok(true) => debug!("Removed object {}", reference),
                Ok(false) => debug!("Object {} was already gone", reference),
                Err(e) => warn!("Failed to remove object {}: {}", reference, e),
            }
        }

        if !self.repo.delete(id).await? {
            return Err(RecordError::NotFound(id.to_string()));
        }
        info!("Deleted SPJ {} ({})", record.nomor_pembukuan, id);
        Ok(record)
    }

    /// Attachment bytes plus the name it was uploaded under.
    pub async fn open_file(&self, id: &str) -> Result<StoredFile, RecordError> {
        let record = self.get(id).await?;
        let reference = record.file_url.ok_or(RecordError::NoFile)?;
        let content = self.store.fetch(&reference).await?;
        Ok(StoredFile {
            filename: original_filename(&reference),
            content,
        })
    }

    /// Copy a record's attachment to Drive; returns the Drive file id.
    pub async fn transfer_to_drive(&self, id: &str, token: &str) -> Result<String, RecordError> {
        let drive = self.drive.as_ref().ok_or(RecordError::DriveUnavailable)?;
        let record = self.get(id).await?;
        if !record.has_file() {
            return Err(RecordError::NoFile);
        }
        Ok(drive.transfer(&record, &self.store, token).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bidang, ADMIN_JABATAN, DEFAULT_MAX_UPLOAD_BYTES};
    use crate::services::drive::DRIVE_UPLOAD_URL;
    use crate::repository::{DbPool, Repositories};
    use tempfile::{tempdir, TempDir};

    async fn setup() -> (RecordService, Repositories, TempDir) {
        let dir = tempdir().unwrap();
        let repos = Repositories::new(DbPool::from_path(&dir.path().join("espj.db")));
        repos.init_schema().await.unwrap();
        let service = RecordService::new(
            repos.spj.clone(),
            FileStore::new(dir.path().join("files")),
            DEFAULT_MAX_UPLOAD_BYTES,
        );
        (service, repos, dir)
    }

    fn admin() -> UserProfile {
        UserProfile {
            id: "admin".to_string(),
            jabatan: Some(ADMIN_JABATAN.to_string()),
            ..Default::default()
        }
    }

    fn staff(bidang: Bidang) -> UserProfile {
        UserProfile {
            id: "staff".to_string(),
            jabatan: Some("Pengadministrasi Umum".to_string()),
            bidang: Some(bidang),
            ..Default::default()
        }
    }

    fn input(bidang: &str) -> SpjInput {
        SpjInput {
            nomor_pembukuan: "012/GU/2024".to_string(),
            kode_rekening: "5.1.02.01".to_string(),
            jenis_spj: Some("GU".to_string()),
            bidang: Some(bidang.to_string()),
            tanggal: Some("2024-04-02".to_string()),
            uraian: "Belanja makan minum rapat".to_string(),
            jumlah: 450_000,
        }
    }

    fn upload(name: &str) -> Option<Attachment> {
        Some(Attachment::Upload {
            name: name.to_string(),
            content: b"%PDF-1.7".to_vec(),
        })
    }

    #[tokio::test]
    async fn test_create_with_upload_and_download_original_name() {
        let (service, _repos, _dir) = setup().await;
        let saved = service
            .save(&staff(Bidang::Ekonomi), &input("Ekonomi"), upload("kwitansi.pdf"), None)
            .await
            .unwrap();
        let key = saved.file_url.clone().unwrap();
        assert!(key.ends_with("_kwitansi.pdf"));
        assert!(service.store().exists(&key).await);

        let file = service.open_file(&saved.id).await.unwrap();
        assert_eq!(file.filename, "kwitansi.pdf");
        assert_eq!(file.content, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_edit_without_file_keeps_reference() {
        let (service, _repos, _dir) = setup().await;
        let user = staff(Bidang::Sosbud);
        let saved = service
            .save(&user, &input("Sosbud"), upload("a.pdf"), None)
            .await
            .unwrap();

        let mut changed = input("Sosbud");
        changed.uraian = "Revisi".to_string();
        let edited = service
            .save(&user, &changed, None, Some(&saved.id))
            .await
            .unwrap();
        assert_eq!(edited.id, saved.id);
        assert_eq!(edited.uraian, "Revisi");
        assert_eq!(edited.file_url, saved.file_url);
    }

    #[tokio::test]
    async fn test_validation_errors_are_collected() {
        let (service, repos, _dir) = setup().await;
        let mut bad = input("Ekonomi");
        bad.nomor_pembukuan.clear();
        bad.jumlah = 0;
        let err = service.save(&admin(), &bad, None, None).await.unwrap_err();
        match err {
            RecordError::Validation(errors) => {
                assert!(errors.has("nomor_pembukuan"));
                assert!(errors.has("jumlah"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(repos.spj.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected_before_storing() {
        let (service, _repos, dir) = setup().await;
        let big = Some(Attachment::Upload {
            name: "big.pdf".to_string(),
            content: vec![0; DEFAULT_MAX_UPLOAD_BYTES + 1],
        });
        let err = service.save(&admin(), &input("Ekonomi"), big, None).await.unwrap_err();
        assert!(matches!(err, RecordError::Validation(ref e) if e.has("file")));
        assert!(!dir.path().join("files").exists());
    }

    #[tokio::test]
    async fn test_other_division_cannot_edit() {
        let (service, _repos, _dir) = setup().await;
        let saved = service
            .save(&staff(Bidang::Ekonomi), &input("Ekonomi"), None, None)
            .await
            .unwrap();
        let err = service
            .save(&staff(Bidang::Sosbud), &input("Ekonomi"), None, Some(&saved.id))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::Forbidden(_)));

        assert!(service
            .save(&admin(), &input("Sosbud"), None, Some(&saved.id))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_owner_may_reassign_division() {
        let (service, repos, _dir) = setup().await;
        let saved = service
            .save(&staff(Bidang::Ekonomi), &input("Ekonomi"), None, None)
            .await
            .unwrap();
        let moved = service
            .save(&staff(Bidang::Ekonomi), &input("Sosbud"), None, Some(&saved.id))
            .await
            .unwrap();
        assert_eq!(moved.bidang, Some(Bidang::Sosbud));

        // Once moved, the record belongs to the other division
        let err = service
            .save(&staff(Bidang::Ekonomi), &input("Ekonomi"), None, Some(&saved.id))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::Forbidden(_)));
        let stored = repos.spj.get(&saved.id).await.unwrap().unwrap();
        assert_eq!(stored.bidang, Some(Bidang::Sosbud));
    }

    #[tokio::test]
    async fn test_edit_missing_record() {
        let (service, _repos, _dir) = setup().await;
        let err = service
            .save(&admin(), &input("Ekonomi"), None, Some("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_with_file_removes_row_and_object() {
        let (service, repos, _dir) = setup().await;
        let saved = service
            .save(&admin(), &input("Ekonomi"), upload("bukti.jpg"), None)
            .await
            .unwrap();
        let key = saved.file_url.clone().unwrap();

        service.delete(&admin(), &saved.id).await.unwrap();
        assert!(repos.spj.get(&saved.id).await.unwrap().is_none());
        assert!(!service.store().exists(&key).await);
    }

    #[tokio::test]
    async fn test_delete_keeps_other_records_with_same_file_name() {
        let (service, repos, _dir) = setup().await;
        let mut saved = Vec::new();
        for i in 0..20 {
            let attachment = Some(Attachment::Upload {
                name: "scan.pdf".to_string(),
                content: format!("record-{}", i).into_bytes(),
            });
            saved.push(
                service
                    .save(&admin(), &input("Ekonomi"), attachment, None)
                    .await
                    .unwrap(),
            );
        }

        service.delete(&admin(), &saved[0].id).await.unwrap();
        assert_eq!(repos.spj.count().await.unwrap(), 19);
        for (i, spj) in saved.iter().enumerate().skip(1) {
            let file = service.open_file(&spj.id).await.unwrap();
            assert_eq!(file.filename, "scan.pdf");
            assert_eq!(file.content, format!("record-{}", i).into_bytes());
        }
    }

    #[tokio::test]
    async fn test_delete_without_file_removes_row_only() {
        let (service, repos, _dir) = setup().await;
        let saved = service
            .save(&admin(), &input("Ekonomi"), None, None)
            .await
            .unwrap();
        service.delete(&admin(), &saved.id).await.unwrap();
        assert!(repos.spj.get(&saved.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_survives_missing_object() {
        let (service, repos, _dir) = setup().await;
        let saved = service
            .save(&admin(), &input("Ekonomi"), upload("x.pdf"), None)
            .await
            .unwrap();
        let key = saved.file_url.clone().unwrap();
        service.store().delete(&key).await.unwrap();

        service.delete(&admin(), &saved.id).await.unwrap();
        assert_eq!(repos.spj.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_requires_treasurer() {
        let (service, repos, _dir) = setup().await;
        let user = staff(Bidang::Ekonomi);
        let saved = service.save(&user, &input("Ekonomi"), None, None).await.unwrap();
        let err = service.delete(&user, &saved.id).await.unwrap_err();
        assert!(matches!(err, RecordError::Forbidden(_)));
        assert_eq!(repos.spj.count().await.unwrap(), 1);

        let err = service.delete(&admin(), "missing").await.unwrap_err();
        assert!(matches!(err, RecordError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_open_file_without_attachment() {
        let (service, _repos, _dir) = setup().await;
        let saved = service
            .save(&admin(), &input("Ekonomi"), None, None)
            .await
            .unwrap();
        assert!(matches!(
            service.open_file(&saved.id).await,
            Err(RecordError::NoFile)
        ));
    }

    #[tokio::test]
    async fn test_drive_operations_need_client() {
        let (service, _repos, _dir) = setup().await;
        let picked = Some(Attachment::Drive(DriveFile {
            url: "https://www.googleapis.com/drive/v3/files/abc?alt=media".to_string(),
            name: "scan.pdf".to_string(),
            token: "t".to_string(),
        }));
        let err = service
            .save(&admin(), &input("Ekonomi"), picked, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::DriveUnavailable));
    }

    #[tokio::test]
    async fn test_drive_pick_outside_drive_is_a_field_error() {
        let (service, repos, dir) = setup().await;
        let service = service.with_drive(DriveClient::new(DRIVE_UPLOAD_URL).unwrap());
        let picked = Some(Attachment::Drive(DriveFile {
            url: "http://127.0.0.1:9/admin/secret".to_string(),
            name: "secret.txt".to_string(),
            token: "tok".to_string(),
        }));

        let err = service
            .save(&staff(Bidang::Ekonomi), &input("Ekonomi"), picked, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::Validation(ref e) if e.has("drive_file")));
        assert_eq!(repos.spj.count().await.unwrap(), 0);
        assert!(!dir.path().join("files").exists());
    }
}
