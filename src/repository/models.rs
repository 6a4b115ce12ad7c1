//! Diesel ORM models for database tables.

use diesel::prelude::*;

use crate::schema;

/// SPJ row from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::spj)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SpjRecord {
    pub id: String,
    pub nomor_pembukuan: String,
    pub kode_rekening: String,
    pub jenis_spj: String,
    pub bidang: Option<String>,
    pub tanggal: String,
    pub uraian: String,
    pub jumlah: i64,
    pub file_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New SPJ row for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::spj)]
pub struct NewSpj<'a> {
    pub id: &'a str,
    pub nomor_pembukuan: &'a str,
    pub kode_rekening: &'a str,
    pub jenis_spj: &'a str,
    pub bidang: Option<&'a str>,
    pub tanggal: &'a str,
    pub uraian: &'a str,
    pub jumlah: i64,
    pub file_url: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Full replacement of an SPJ row's editable columns.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = schema::spj)]
#[diesel(treat_none_as_null = true)]
pub struct SpjChanges<'a> {
    pub nomor_pembukuan: &'a str,
    pub kode_rekening: &'a str,
    pub jenis_spj: &'a str,
    pub bidang: Option<&'a str>,
    pub tanggal: &'a str,
    pub uraian: &'a str,
    pub jumlah: i64,
    pub file_url: Option<&'a str>,
    pub updated_at: &'a str,
}

/// Profile row from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::profiles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProfileRecord {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nip: Option<String>,
    pub jabatan: Option<String>,
    pub bidang: Option<String>,
    pub updated_at: String,
}

/// Profile row for insert-or-replace.
#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = schema::profiles)]
#[diesel(treat_none_as_null = true)]
pub struct NewProfile<'a> {
    pub id: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub nip: Option<&'a str>,
    pub jabatan: Option<&'a str>,
    pub bidang: Option<&'a str>,
    pub updated_at: &'a str,
}
