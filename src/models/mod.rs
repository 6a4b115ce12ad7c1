//! Data models for e-SPJ.

mod profile;
mod spj;

pub use profile::{UserProfile, ADMIN_JABATAN};
pub use spj::{
    Bidang, FieldError, JenisSpj, Spj, SpjFields, SpjInput, ValidationErrors,
    DATE_FORMAT, DEFAULT_MAX_UPLOAD_BYTES, FILE_TOO_LARGE,
};
