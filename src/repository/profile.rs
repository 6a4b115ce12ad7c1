//! Diesel-based profile repository.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{NewProfile, ProfileRecord};
use super::pool::{DbPool, DieselError};
use super::util::bad_column;
use crate::models::{Bidang, UserProfile};
use crate::schema::profiles;

impl TryFrom<ProfileRecord> for UserProfile {
    type Error = DieselError;

    fn try_from(record: ProfileRecord) -> Result<Self, Self::Error> {
        let bidang = match record.bidang.as_deref() {
            None | Some("") => None,
            Some(b) => Some(Bidang::from_str(b).ok_or_else(|| bad_column("bidang", b))?),
        };

        Ok(UserProfile {
            id: record.id,
            first_name: record.first_name,
            last_name: record.last_name,
            nip: record.nip,
            jabatan: record.jabatan,
            bidang,
        })
    }
}

/// Profile lookup by the authenticated account id.
#[derive(Clone)]
pub struct DieselProfileRepository {
    pool: DbPool,
}

impl DieselProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a profile by account id.
    pub async fn get(&self, id: &str) -> Result<Option<UserProfile>, DieselError> {
        let mut conn = self.pool.get().await?;
        profiles::table
            .find(id)
            .select(ProfileRecord::as_select())
            .first::<ProfileRecord>(&mut conn)
            .await
            .optional()
            .and_then(|opt| opt.map(UserProfile::try_from).transpose())
    }

    /// List all profiles ordered by id.
    pub async fn get_all(&self) -> Result<Vec<UserProfile>, DieselError> {
        let mut conn = self.pool.get().await?;
        profiles::table
            .order(profiles::id.asc())
            .select(ProfileRecord::as_select())
            .load::<ProfileRecord>(&mut conn)
            .await
            .and_then(|records| records.into_iter().map(UserProfile::try_from).collect())
    }

    /// Save a profile (insert or update).
    pub async fn save(&self, profile: &UserProfile) -> Result<(), DieselError> {
        let now = Utc::now().to_rfc3339();
        let row = NewProfile {
            id: &profile.id,
            first_name: profile.first_name.as_deref(),
            last_name: profile.last_name.as_deref(),
            nip: profile.nip.as_deref(),
            jabatan: profile.jabatan.as_deref(),
            bidang: profile.bidang.map(|b| b.as_str()),
            updated_at: &now,
        };

        let mut conn = self.pool.get().await?;
        diesel::insert_into(profiles::table)
            .values(&row)
            .on_conflict(profiles::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}
