//! Export endpoints: ZIP of attachments and spreadsheet report.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::helpers::{attachment, current_user, json_error};
use super::super::AppState;
use crate::services::filter::{parse_bidang, parse_month, parse_year};
use crate::services::{
    export_zip, load_listing, render_spreadsheet, ArchiveSelection, ExportError, FilterParams,
    SpjFilter, SPREADSHEET_FILENAME,
};
use crate::utils::content_disposition;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Query params for archive export. Absent values mean "all".
#[derive(Debug, Deserialize)]
pub struct ArchiveParams {
    pub year: Option<String>,
    pub month: Option<String>,
    pub bidang: Option<String>,
}

/// ZIP of every attachment matching year, month and division.
pub async fn export_archive(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ArchiveParams>,
) -> Response {
    let user = match current_user(&state, &headers).await {
        Ok(u) => u,
        Err(response) => return response,
    };

    let selection = match parse_selection(&params, user.default_bidang()) {
        Ok(s) => s,
        Err(message) => return json_error(StatusCode::BAD_REQUEST, message),
    };

    match export_zip(&state.spj_repo, state.fetcher.as_ref(), &selection).await {
        Ok(outcome) => (
            [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (header::CONTENT_DISPOSITION, content_disposition(&outcome.name)),
                (
                    HeaderName::from_static("x-file-count"),
                    outcome.file_count.to_string(),
                ),
            ],
            outcome.bytes,
        )
            .into_response(),
        Err(e @ (ExportError::NoMatchingRecords | ExportError::NoFilesFetched)) => {
            json_error(StatusCode::NOT_FOUND, e.to_string())
        }
        Err(e) => {
            tracing::error!("Archive export failed: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn parse_selection(
    params: &ArchiveParams,
    default_bidang: Option<crate::models::Bidang>,
) -> Result<ArchiveSelection, String> {
    let year = params.year.as_deref().map(parse_year).transpose();
    let month = params.month.as_deref().map(parse_month).transpose();
    let bidang = params.bidang.as_deref().map(parse_bidang).transpose();
    Ok(ArchiveSelection {
        year: year.map_err(|e| e.to_string())?.flatten(),
        month: month.map_err(|e| e.to_string())?.flatten(),
        bidang: match bidang.map_err(|e| e.to_string())? {
            Some(selected) => selected,
            None => default_bidang,
        },
    })
}

/// Spreadsheet of the filtered listing.
pub async fn export_spreadsheet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<FilterParams>,
) -> Response {
    let user = match current_user(&state, &headers).await {
        Ok(u) => u,
        Err(response) => return response,
    };
    let filter = match SpjFilter::from_params(&params, Some(&user)) {
        Ok(f) => f,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let listing = match load_listing(&state.spj_repo, &filter).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to load SPJ listing: {}", e);
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Gagal memuat data: {}", e),
            );
        }
    };

    match render_spreadsheet(&listing.records) {
        Ok(bytes) => attachment(SPREADSHEET_FILENAME, XLSX_MIME, bytes),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
