//! Web API for the SPJ archive.
//!
//! JSON endpoints for listing, editing and exporting SPJ records, plus raw
//! access to stored attachments.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::repository::{DieselProfileRepository, DieselSpjRepository, Repositories};
use crate::services::{FileFetcher, RecordService};
use crate::storage::FileStore;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub spj_repo: Arc<DieselSpjRepository>,
    pub profile_repo: Arc<DieselProfileRepository>,
    pub records: Arc<RecordService>,
    pub store: FileStore,
    /// Source of attachment bytes for archive export.
    pub fetcher: Arc<dyn FileFetcher>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let repos = settings.repositories();
        let store = settings.file_store();
        let records = RecordService::new(repos.spj.clone(), store.clone(), settings.max_upload_bytes)
            .with_drive(settings.drive_client()?);

        let fetcher: Arc<dyn FileFetcher> = match settings.http_fetcher()? {
            Some(http) => {
                tracing::info!("Fetching attachments over HTTP");
                Arc::new(http)
            }
            None => Arc::new(store.clone()),
        };

        Ok(Self::from_parts(repos, records, store, fetcher, settings.max_upload_bytes))
    }

    pub fn from_parts(
        repos: Repositories,
        records: RecordService,
        store: FileStore,
        fetcher: Arc<dyn FileFetcher>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            spj_repo: Arc::new(repos.spj),
            profile_repo: Arc::new(repos.profiles),
            records: Arc::new(records),
            store,
            fetcher,
            max_upload_bytes,
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings).await?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
