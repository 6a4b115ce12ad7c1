//! SPJ (expense accountability document) models.
//!
//! An SPJ is one booked expense document with an optional scanned
//! attachment, owned by one of the office divisions.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum upload size (3 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 3 * 1024 * 1024;

/// Message for an attachment over the upload limit.
pub const FILE_TOO_LARGE: &str = "Ukuran file melebihi batas maksimal";

/// Date format accepted on input.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Document type: reimbursement (GU) or direct payment (LS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JenisSpj {
    #[serde(rename = "GU")]
    Gu,
    #[serde(rename = "LS")]
    Ls,
}

impl JenisSpj {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gu => "GU",
            Self::Ls => "LS",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GU" => Some(Self::Gu),
            "LS" => Some(Self::Ls),
            _ => None,
        }
    }
}

impl fmt::Display for JenisSpj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Organizational division. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bidang {
    #[serde(rename = "Sekretariat")]
    Sekretariat,
    #[serde(rename = "Litbang Renbang")]
    LitbangRenbang,
    #[serde(rename = "Ekonomi")]
    Ekonomi,
    #[serde(rename = "Sosbud")]
    Sosbud,
    #[serde(rename = "SarprasWil")]
    SarprasWil,
}

impl Bidang {
    /// All divisions in display order.
    pub const ALL: [Bidang; 5] = [
        Self::Sekretariat,
        Self::LitbangRenbang,
        Self::Ekonomi,
        Self::Sosbud,
        Self::SarprasWil,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sekretariat => "Sekretariat",
            Self::LitbangRenbang => "Litbang Renbang",
            Self::Ekonomi => "Ekonomi",
            Self::Sosbud => "Sosbud",
            Self::SarprasWil => "SarprasWil",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Bidang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored SPJ record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spj {
    /// Storage-assigned identifier.
    pub id: String,
    /// Booking number (not unique).
    pub nomor_pembukuan: String,
    /// Account code.
    pub kode_rekening: String,
    pub jenis_spj: JenisSpj,
    pub bidang: Option<Bidang>,
    pub tanggal: NaiveDate,
    /// Free-text description.
    pub uraian: String,
    /// Amount in whole rupiah.
    pub jumlah: i64,
    /// Storage key of the attached file, if any.
    pub file_url: Option<String>,
}

impl Spj {
    pub fn has_file(&self) -> bool {
        self.file_url.as_deref().is_some_and(|f| !f.is_empty())
    }
}

/// Form input for creating or replacing an SPJ.
///
/// Fields are loosely typed so that every problem can be reported at once
/// instead of failing on the first bad field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpjInput {
    #[serde(default)]
    pub nomor_pembukuan: String,
    #[serde(default)]
    pub kode_rekening: String,
    #[serde(default)]
    pub jenis_spj: Option<String>,
    #[serde(default)]
    pub bidang: Option<String>,
    /// `YYYY-MM-DD`; parsed during validation.
    #[serde(default)]
    pub tanggal: Option<String>,
    #[serde(default)]
    pub uraian: String,
    #[serde(default)]
    pub jumlah: i64,
}

/// Validated SPJ fields, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpjFields {
    pub nomor_pembukuan: String,
    pub kode_rekening: String,
    pub jenis_spj: JenisSpj,
    pub bidang: Bidang,
    pub tanggal: NaiveDate,
    pub uraian: String,
    pub jumlah: i64,
}

impl SpjFields {
    /// Attach an id and file reference to produce a full record.
    pub fn into_spj(self, id: String, file_url: Option<String>) -> Spj {
        Spj {
            id,
            nomor_pembukuan: self.nomor_pembukuan,
            kode_rekening: self.kode_rekening,
            jenis_spj: self.jenis_spj,
            bidang: Some(self.bidang),
            tanggal: self.tanggal,
            uraian: self.uraian,
            jumlah: self.jumlah,
            file_url,
        }
    }
}

/// A single field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All validation failures for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("invalid input: {}", summarize(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// A failure on one field.
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field,
                message: message.into(),
            }],
        }
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl SpjInput {
    /// Validate the form, collecting every field-level problem.
    ///
    /// `file_size` is the size of an attached upload, if one is present.
    pub fn validate(
        &self,
        file_size: Option<usize>,
        max_upload_bytes: usize,
    ) -> Result<SpjFields, ValidationErrors> {
        let mut errors = Vec::new();
        let mut push = |field: &'static str, message: &str| {
            errors.push(FieldError {
                field,
                message: message.to_string(),
            })
        };

        let nomor = self.nomor_pembukuan.trim();
        if nomor.is_empty() {
            push("nomor_pembukuan", "No. Pembukuan harus diisi");
        }
        let kode = self.kode_rekening.trim();
        if kode.is_empty() {
            push("kode_rekening", "Kode Rekening harus diisi");
        }
        let jenis = self.jenis_spj.as_deref().and_then(JenisSpj::from_str);
        if jenis.is_none() {
            push("jenis_spj", "Jenis SPJ harus dipilih");
        }
        let bidang = self.bidang.as_deref().and_then(Bidang::from_str);
        if bidang.is_none() {
            push("bidang", "Bidang harus dipilih");
        }
        let tanggal = match self.tanggal.as_deref().map(str::trim) {
            None | Some("") => {
                push("tanggal", "Tanggal harus diisi");
                None
            }
            Some(raw) => match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(_) => {
                    push("tanggal", "Format tanggal tidak valid (YYYY-MM-DD)");
                    None
                }
            },
        };
        let uraian = self.uraian.trim();
        if uraian.is_empty() {
            push("uraian", "Uraian harus diisi");
        }
        if self.jumlah < 1 {
            push("jumlah", "Jumlah harus lebih dari 0");
        }
        if file_size.is_some_and(|size| size > max_upload_bytes) {
            push("file", FILE_TOO_LARGE);
        }

        match (jenis, bidang, tanggal) {
            (Some(jenis_spj), Some(bidang), Some(tanggal)) if errors.is_empty() => {
                Ok(SpjFields {
                    nomor_pembukuan: nomor.to_string(),
                    kode_rekening: kode.to_string(),
                    jenis_spj,
                    bidang,
                    tanggal,
                    uraian: uraian.to_string(),
                    jumlah: self.jumlah,
                })
            }
            _ => Err(ValidationErrors { errors }),
        }
    }
}
