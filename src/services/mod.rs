//! Service layer for e-SPJ business logic.
//!
//! This module contains domain logic separated from UI concerns.
//! Services are used by both the CLI and the web server.

pub mod archive;
pub mod drive;
pub mod filter;
pub mod records;
pub mod spreadsheet;

pub use archive::{
    export_zip, ArchiveOutcome, ArchiveSelection, ExportError, FetchError, FileFetcher,
    HttpFileFetcher,
};
pub use drive::{DriveClient, DriveError, DriveFile, DRIVE_FILES_URL, DRIVE_UPLOAD_URL};
pub use filter::{
    load_listing, FilterError, FilterParams, Listing, ListingState, SpjFilter, SpjSummary,
};
pub use records::{Attachment, RecordError, RecordService, StoredFile};
pub use spreadsheet::{render_spreadsheet, SpreadsheetError, SPREADSHEET_FILENAME};
