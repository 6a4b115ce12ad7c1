//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! against a SQLite database.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod profile;
pub mod spj;
pub mod util;

pub use migrations::run_migrations;
pub use pool::{DbPool, DieselError};
pub use profile::DieselProfileRepository;
pub use spj::{DieselSpjRepository, SpjQuery};

/// Bundled repository access for all database operations.
///
/// Constructed via [`crate::config::Settings::repositories()`].
#[derive(Clone)]
pub struct Repositories {
    pub spj: DieselSpjRepository,
    pub profiles: DieselProfileRepository,
    pool: DbPool,
}

impl Repositories {
    pub fn new(pool: DbPool) -> Self {
        Self {
            spj: DieselSpjRepository::new(pool.clone()),
            profiles: DieselProfileRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Apply pending schema migrations.
    pub async fn init_schema(&self) -> Result<Vec<String>, DieselError> {
        run_migrations(self.pool.database_url()).await
    }
}
