//! Archive export tests against a real database and file store.

use std::collections::HashSet;
use std::io::Cursor;

use chrono::NaiveDate;
use espj::models::{Bidang, JenisSpj, Spj};
use espj::repository::{DbPool, Repositories};
use espj::services::{export_zip, ArchiveSelection, ExportError};
use espj::storage::FileStore;
use tempfile::TempDir;
use zip::ZipArchive;

struct Fixture {
    repos: Repositories,
    store: FileStore,
    _dir: TempDir,
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let repos = Repositories::new(DbPool::from_path(&dir.path().join("espj.db")));
    repos.init_schema().await.unwrap();
    let store = FileStore::new(dir.path().join("files"));
    Fixture {
        repos,
        store,
        _dir: dir,
    }
}

impl Fixture {
    /// Insert a record, uploading `file` as its attachment when given.
    async fn add(&self, nomor: &str, date: (i32, u32, u32), bidang: Bidang, file: Option<&str>) {
        let file_url = match file {
            Some(name) => Some(self.store.upload(name, nomor.as_bytes()).await.unwrap()),
            None => None,
        };
        let spj = Spj {
            id: uuid::Uuid::new_v4().to_string(),
            nomor_pembukuan: nomor.to_string(),
            kode_rekening: "5.1.02.01.01".to_string(),
            jenis_spj: JenisSpj::Gu,
            bidang: Some(bidang),
            tanggal: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            uraian: format!("SPJ {}", nomor),
            jumlah: 100_000,
            file_url,
        };
        self.repos.spj.insert(&spj).await.unwrap();
    }
}

fn entry_names(bytes: Vec<u8>) -> HashSet<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

#[tokio::test]
async fn test_year_and_division_selection() {
    let f = fixture().await;
    f.add("A-01", (2024, 1, 10), Bidang::Ekonomi, Some("nota.pdf")).await;
    f.add("A-02", (2024, 7, 1), Bidang::Ekonomi, Some("kwitansi.jpg")).await;
    f.add("A-03", (2024, 7, 2), Bidang::Sosbud, Some("sppd.pdf")).await;
    f.add("A-04", (2023, 7, 2), Bidang::Ekonomi, Some("lama.pdf")).await;
    f.add("A-05", (2024, 3, 3), Bidang::Ekonomi, None).await;

    let selection = ArchiveSelection {
        year: Some(2024),
        month: None,
        bidang: Some(Bidang::Ekonomi),
    };
    let outcome = export_zip(&f.repos.spj, &f.store, &selection).await.unwrap();

    assert_eq!(outcome.name, "arsip_spj_2024_Ekonomi.zip");
    assert_eq!(outcome.file_count, 2);
    let names = entry_names(outcome.bytes);
    assert_eq!(
        names,
        HashSet::from(["A-01_nota.pdf".to_string(), "A-02_kwitansi.jpg".to_string()])
    );
}

#[tokio::test]
async fn test_month_without_year_spans_all_years() {
    let f = fixture().await;
    f.add("B-01", (2022, 7, 5), Bidang::Sekretariat, Some("a.pdf")).await;
    f.add("B-02", (2024, 7, 9), Bidang::Sosbud, Some("b.pdf")).await;
    f.add("B-03", (2024, 8, 1), Bidang::Sosbud, Some("c.pdf")).await;

    let selection = ArchiveSelection {
        year: None,
        month: Some(7),
        bidang: None,
    };
    let outcome = export_zip(&f.repos.spj, &f.store, &selection).await.unwrap();

    assert_eq!(outcome.name, "arsip_spj_semua_tahun_Juli.zip");
    assert_eq!(outcome.file_count, 2);
    let names = entry_names(outcome.bytes);
    assert!(names.contains("B-01_a.pdf"));
    assert!(names.contains("B-02_b.pdf"));
}

#[tokio::test]
async fn test_year_and_month_selection() {
    let f = fixture().await;
    f.add("C-01", (2024, 2, 29), Bidang::SarprasWil, Some("akhir.pdf")).await;
    f.add("C-02", (2024, 3, 1), Bidang::SarprasWil, Some("awal.pdf")).await;

    let selection = ArchiveSelection {
        year: Some(2024),
        month: Some(2),
        bidang: Some(Bidang::SarprasWil),
    };
    let outcome = export_zip(&f.repos.spj, &f.store, &selection).await.unwrap();
    assert_eq!(outcome.name, "arsip_spj_2024_Februari_SarprasWil.zip");
    assert_eq!(outcome.file_count, 1);
    assert!(entry_names(outcome.bytes).contains("C-01_akhir.pdf"));
}

#[tokio::test]
async fn test_no_matching_records() {
    let f = fixture().await;
    f.add("D-01", (2024, 5, 5), Bidang::Ekonomi, None).await;

    let selection = ArchiveSelection {
        year: Some(2024),
        ..Default::default()
    };
    let err = export_zip(&f.repos.spj, &f.store, &selection)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::NoMatchingRecords));
}

#[tokio::test]
async fn test_every_fetch_failing() {
    let f = fixture().await;
    f.add("E-01", (2024, 5, 5), Bidang::Ekonomi, Some("hilang.pdf")).await;
    f.add("E-02", (2024, 5, 6), Bidang::Ekonomi, Some("juga.pdf")).await;

    // Remove the stored objects behind the records' backs
    for spj in f.repos.spj.query(&Default::default()).await.unwrap() {
        f.store.delete(spj.file_url.as_deref().unwrap()).await.unwrap();
    }

    let err = export_zip(&f.repos.spj, &f.store, &ArchiveSelection::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::NoFilesFetched));
}

#[tokio::test]
async fn test_partial_fetch_failure_is_skipped() {
    let f = fixture().await;
    f.add("F-01", (2024, 5, 5), Bidang::Ekonomi, Some("ada.pdf")).await;
    f.add("F-02", (2024, 5, 6), Bidang::Ekonomi, Some("hilang.pdf")).await;

    let missing = f
        .repos
        .spj
        .query(&Default::default())
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.nomor_pembukuan == "F-02")
        .unwrap();
    f.store
        .delete(missing.file_url.as_deref().unwrap())
        .await
        .unwrap();

    let outcome = export_zip(&f.repos.spj, &f.store, &ArchiveSelection::default())
        .await
        .unwrap();
    assert_eq!(outcome.file_count, 1);
    assert_eq!(
        entry_names(outcome.bytes),
        HashSet::from(["F-01_ada.pdf".to_string()])
    );
    assert_eq!(outcome.name, "arsip_spj.zip");
}
