//! Repository utilities.

use chrono::NaiveDate;
use diesel::result::DatabaseErrorInformation;

/// Date format used for the `tanggal` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Simple error info wrapper for database errors.
#[derive(Debug)]
pub struct DbErrorInfo(pub String);

impl DatabaseErrorInformation for DbErrorInfo {
    fn message(&self) -> &str {
        &self.0
    }
    fn details(&self) -> Option<&str> {
        None
    }
    fn hint(&self) -> Option<&str> {
        None
    }
    fn table_name(&self) -> Option<&str> {
        None
    }
    fn column_name(&self) -> Option<&str> {
        None
    }
    fn constraint_name(&self) -> Option<&str> {
        None
    }
    fn statement_position(&self) -> Option<i32> {
        None
    }
}

/// Convert any displayable error to a diesel error with proper message.
pub fn to_diesel_error(e: impl std::fmt::Display) -> diesel::result::Error {
    diesel::result::Error::DatabaseError(
        diesel::result::DatabaseErrorKind::Unknown,
        Box::new(DbErrorInfo(e.to_string())),
    )
}

/// Error for a column value that does not parse into its domain type.
pub fn bad_column(column: &str, value: &str) -> diesel::result::Error {
    diesel::result::Error::DeserializationError(
        format!("invalid value for {}: {:?}", column, value).into(),
    )
}

/// Format a date for storage.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a stored date.
pub fn parse_date(s: &str) -> Result<NaiveDate, diesel::result::Error> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| bad_column("tanggal", s))
}

/// Check whether a database URL points at a backend this build supports.
pub fn validate_database_url(url: &str) -> Result<(), String> {
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        return Err(format!(
            "Unsupported database URL '{}': only SQLite databases are supported",
            url
        ));
    }
    Ok(())
}
