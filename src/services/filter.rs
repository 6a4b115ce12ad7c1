//! Listing filters and aggregates.
//!
//! Year and division selections become store predicates; month, keyword
//! and booking-number predicates are applied to the returned rows because
//! the store is not indexed per month.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Bidang, JenisSpj, Spj, UserProfile};
use crate::repository::{DieselError, DieselSpjRepository, SpjQuery};

/// Value meaning "no restriction" in every selection.
pub const ALL: &str = "all";

/// A selection string that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("invalid year: {0}")]
    Year(String),
    #[error("invalid month: {0}")]
    Month(String),
    #[error("invalid division: {0}")]
    Bidang(String),
}

/// Parse a year selection (`all` or `YYYY`).
pub fn parse_year(s: &str) -> Result<Option<i32>, FilterError> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case(ALL) {
        return Ok(None);
    }
    match s.parse::<i32>() {
        Ok(year) if (1..=9999).contains(&year) => Ok(Some(year)),
        _ => Err(FilterError::Year(s.to_string())),
    }
}

/// Parse a month selection (`all` or `1`..`12`).
pub fn parse_month(s: &str) -> Result<Option<u32>, FilterError> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case(ALL) {
        return Ok(None);
    }
    match s.parse::<u32>() {
        Ok(month) if (1..=12).contains(&month) => Ok(Some(month)),
        _ => Err(FilterError::Month(s.to_string())),
    }
}

/// Parse a division selection (`all` or a division name).
pub fn parse_bidang(s: &str) -> Result<Option<Bidang>, FilterError> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case(ALL) {
        return Ok(None);
    }
    Bidang::from_str(s)
        .map(Some)
        .ok_or_else(|| FilterError::Bidang(s.to_string()))
}

/// Inclusive date range covering a whole year.
pub fn year_range(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

/// Inclusive date range covering one month of a year.
pub fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next.pred_opt()?))
}

/// Raw selections as they arrive from a query string or CLI flags.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    pub year: Option<String>,
    pub month: Option<String>,
    pub bidang: Option<String>,
    pub keyword: Option<String>,
    pub nomor: Option<String>,
}

/// Listing filter. `None` selections mean "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpjFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub bidang: Option<Bidang>,
    /// Case-insensitive substring of the description.
    pub keyword: String,
    /// Case-insensitive substring of the booking number.
    pub nomor: String,
}

impl SpjFilter {
    /// Default filter for a user: non-administrators see their own division.
    pub fn for_profile(profile: Option<&UserProfile>) -> Self {
        Self {
            bidang: profile.and_then(UserProfile::default_bidang),
            ..Default::default()
        }
    }

    /// Build a filter from raw params.
    ///
    /// A missing division param falls back to the profile's default scope.
    pub fn from_params(
        params: &FilterParams,
        profile: Option<&UserProfile>,
    ) -> Result<Self, FilterError> {
        let mut filter = Self::for_profile(profile);
        if let Some(ref year) = params.year {
            filter.year = parse_year(year)?;
        }
        if let Some(ref month) = params.month {
            filter.month = parse_month(month)?;
        }
        if let Some(ref bidang) = params.bidang {
            filter.bidang = parse_bidang(bidang)?;
        }
        filter.keyword = params.keyword.clone().unwrap_or_default();
        filter.nomor = params.nomor.clone().unwrap_or_default();
        Ok(filter)
    }

    /// Restore the defaults for this user.
    pub fn reset(&mut self, profile: Option<&UserProfile>) {
        *self = Self::for_profile(profile);
    }

    /// Whether any selection differs from the user's defaults.
    pub fn is_customized(&self, profile: Option<&UserProfile>) -> bool {
        *self != Self::for_profile(profile)
    }

    /// Predicates delegated to the store.
    pub fn store_query(&self) -> SpjQuery {
        SpjQuery {
            date_range: self.year.and_then(year_range),
            bidang: self.bidang,
            with_file_only: false,
        }
    }

    /// Local month predicate.
    pub fn matches_month(&self, spj: &Spj) -> bool {
        self.month.map_or(true, |m| spj.tanggal.month() == m)
    }

    /// Local keyword and booking-number predicates.
    pub fn matches_search(&self, spj: &Spj) -> bool {
        contains_ignore_case(&spj.uraian, &self.keyword)
            && contains_ignore_case(&spj.nomor_pembukuan, &self.nomor)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Aggregate counts over a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpjSummary {
    pub total_gu: usize,
    pub total_ls: usize,
    /// Divisions with no records are absent.
    pub count_by_bidang: BTreeMap<Bidang, usize>,
}

impl SpjSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Spj>) -> Self {
        let mut summary = Self::default();
        for spj in records {
            match spj.jenis_spj {
                JenisSpj::Gu => summary.total_gu += 1,
                JenisSpj::Ls => summary.total_ls += 1,
            }
            if let Some(bidang) = spj.bidang {
                *summary.count_by_bidang.entry(bidang).or_default() += 1;
            }
        }
        summary
    }
}

/// Result of assembling a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Listing {
    /// Records matching every predicate, newest date first.
    pub records: Vec<Spj>,
    /// Counts over the year/division/month selection, before text search.
    pub summary: SpjSummary,
}

/// Apply local predicates to rows returned by the store.
pub fn assemble(filter: &SpjFilter, rows: Vec<Spj>) -> Listing {
    let in_period: Vec<Spj> = rows
        .into_iter()
        .filter(|spj| filter.matches_month(spj))
        .collect();
    let summary = SpjSummary::from_records(&in_period);
    let records = in_period
        .into_iter()
        .filter(|spj| filter.matches_search(spj))
        .collect();
    Listing { records, summary }
}

/// Query the store and assemble a listing.
pub async fn load_listing(
    repo: &DieselSpjRepository,
    filter: &SpjFilter,
) -> Result<Listing, DieselError> {
    let rows = repo.query(&filter.store_query()).await?;
    Ok(assemble(filter, rows))
}

/// Holds the most recent successful listing.
///
/// A failed refresh leaves the previous listing in place.
#[derive(Debug, Default)]
pub struct ListingState {
    listing: Listing,
    loaded: bool,
}

impl ListingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    /// Whether any refresh has succeeded yet.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Re-run the query; on error the current listing is kept.
    pub async fn refresh(
        &mut self,
        repo: &DieselSpjRepository,
        filter: &SpjFilter,
    ) -> Result<&Listing, DieselError> {
        match load_listing(repo, filter).await {
            Ok(listing) => {
                self.listing = listing;
                self.loaded = true;
                Ok(&self.listing)
            }
            Err(e) => {
                tracing::error!("Failed to load SPJ listing: {}", e);
                Err(e)
            }
        }
    }
}
