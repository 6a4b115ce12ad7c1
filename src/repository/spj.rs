//! Diesel-based SPJ repository.
//!
//! The store only knows date-range and equality predicates; month and
//! keyword filtering happen in [`crate::services::filter`].

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use diesel_async::RunQueryDsl;

use super::models::{NewSpj, SpjChanges, SpjRecord};
use super::pool::{DbPool, DieselError};
use super::util::{bad_column, format_date, parse_date};
use crate::models::{Bidang, JenisSpj, Spj};
use crate::schema::spj;

/// Predicates pushed down to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpjQuery {
    /// Inclusive date range.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub bidang: Option<Bidang>,
    /// Only rows with an attached file.
    pub with_file_only: bool,
}

/// Convert a database record to a domain model.
impl TryFrom<SpjRecord> for Spj {
    type Error = DieselError;

    fn try_from(record: SpjRecord) -> Result<Self, Self::Error> {
        let jenis_spj = JenisSpj::from_str(&record.jenis_spj)
            .ok_or_else(|| bad_column("jenis_spj", &record.jenis_spj))?;
        let bidang = match record.bidang.as_deref() {
            None | Some("") => None,
            Some(b) => Some(Bidang::from_str(b).ok_or_else(|| bad_column("bidang", b))?),
        };

        Ok(Spj {
            id: record.id,
            nomor_pembukuan: record.nomor_pembukuan,
            kode_rekening: record.kode_rekening,
            jenis_spj,
            bidang,
            tanggal: parse_date(&record.tanggal)?,
            uraian: record.uraian,
            jumlah: record.jumlah,
            file_url: record.file_url.filter(|f| !f.is_empty()),
        })
    }
}

/// Diesel-based SPJ repository with compile-time query checking.
#[derive(Clone)]
pub struct DieselSpjRepository {
    pool: DbPool,
}

impl DieselSpjRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get an SPJ by ID.
    pub async fn get(&self, id: &str) -> Result<Option<Spj>, DieselError> {
        let mut conn = self.pool.get().await?;
        spj::table
            .find(id)
            .select(SpjRecord::as_select())
            .first::<SpjRecord>(&mut conn)
            .await
            .optional()
            .and_then(|opt| opt.map(Spj::try_from).transpose())
    }

    /// Load rows matching the pushed-down predicates, newest date first.
    pub async fn query(&self, query: &SpjQuery) -> Result<Vec<Spj>, DieselError> {
        let mut q: spj::BoxedQuery<'_, Sqlite> = spj::table.into_boxed();

        if let Some((start, end)) = query.date_range {
            q = q
                .filter(spj::tanggal.ge(format_date(start)))
                .filter(spj::tanggal.le(format_date(end)));
        }
        if let Some(bidang) = query.bidang {
            q = q.filter(spj::bidang.eq(bidang.as_str()));
        }
        if query.with_file_only {
            q = q.filter(spj::file_url.is_not_null()).filter(spj::file_url.ne(""));
        }

        let mut conn = self.pool.get().await?;
        let records = q
            .order((spj::tanggal.desc(), spj::created_at.desc()))
            .select(SpjRecord::as_select())
            .load::<SpjRecord>(&mut conn)
            .await?;

        records.into_iter().map(Spj::try_from).collect()
    }

    /// Insert a new row. The record's `id` must already be assigned.
    pub async fn insert(&self, record: &Spj) -> Result<(), DieselError> {
        let now = Utc::now().to_rfc3339();
        let tanggal = format_date(record.tanggal);
        let new = NewSpj {
            id: &record.id,
            nomor_pembukuan: &record.nomor_pembukuan,
            kode_rekening: &record.kode_rekening,
            jenis_spj: record.jenis_spj.as_str(),
            bidang: record.bidang.map(|b| b.as_str()),
            tanggal: &tanggal,
            uraian: &record.uraian,
            jumlah: record.jumlah,
            file_url: record.file_url.as_deref(),
            created_at: &now,
            updated_at: &now,
        };

        let mut conn = self.pool.get().await?;
        diesel::insert_into(spj::table)
            .values(&new)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Replace every editable column of an existing row.
    ///
    /// Returns false if no row has that id.
    pub async fn update(&self, record: &Spj) -> Result<bool, DieselError> {
        let now = Utc::now().to_rfc3339();
        let tanggal = format_date(record.tanggal);
        let changes = SpjChanges {
            nomor_pembukuan: &record.nomor_pembukuan,
            kode_rekening: &record.kode_rekening,
            jenis_spj: record.jenis_spj.as_str(),
            bidang: record.bidang.map(|b| b.as_str()),
            tanggal: &tanggal,
            uraian: &record.uraian,
            jumlah: record.jumlah,
            file_url: record.file_url.as_deref(),
            updated_at: &now,
        };

        let mut conn = self.pool.get().await?;
        let rows = diesel::update(spj::table.find(&record.id))
            .set(&changes)
            .execute(&mut conn)
            .await?;
        Ok(rows > 0)
    }

    /// Delete a row.
    pub async fn delete(&self, id: &str) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;
        let rows = diesel::delete(spj::table.find(id))
            .execute(&mut conn)
            .await?;
        Ok(rows > 0)
    }

    /// Count all rows.
    pub async fn count(&self) -> Result<u64, DieselError> {
        use diesel::dsl::count_star;
        let mut conn = self.pool.get().await?;
        let count: i64 = spj::table.select(count_star()).first(&mut conn).await?;
        Ok(count as u64)
    }
}
