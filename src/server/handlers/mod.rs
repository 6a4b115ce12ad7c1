//! HTTP request handlers for the web server.

mod export_api;
mod files;
mod helpers;
mod spj_api;

// Re-export handlers for use by the router
pub use export_api::{export_archive, export_spreadsheet};
pub use files::serve_object;
pub use spj_api::{
    create_spj, current_profile, delete_spj, download_attachment, get_spj, health, list_spj,
    transfer_to_drive, update_spj,
};
