//! Shared utility functions.
//!
//! - `format`: Indonesian month names, dates, and rupiah amounts
//! - `mime`: content types for stored attachments
//! - `filename`: filesystem-safe names

mod filename;
mod format;
mod mime;

pub use filename::{disambiguate, sanitize_filename};
pub use format::{format_date_id, format_rupiah, month_label, MONTH_LABELS};
pub use mime::{content_disposition, guess_mime};
