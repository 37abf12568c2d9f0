//! Document store access.
//!
//! [`PatientRepository`] is the seam between the service layer and the
//! store. Two backends exist: PostgreSQL (JSONB documents) and an
//! in-memory map used when no database is configured and in tests.

mod memory;
mod postgres;
mod repository;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;
pub use repository::PatientRepository;

use std::sync::Arc;

use deadpool_postgres::{Config, Pool, Runtime};
use patient_core::PatientError;
use tokio_postgres::NoTls;

/// Create a connection pool from a database URL
pub async fn create_pool(database_url: &str) -> Result<Pool, deadpool_postgres::CreatePoolError> {
    let mut cfg = Config::new();
    cfg.url = Some(database_url.to_string());
    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
}

/// Open the configured backend and make sure its search indexes exist.
pub async fn connect(database_url: Option<&str>) -> Result<Arc<dyn PatientRepository>, PatientError> {
    let repo: Arc<dyn PatientRepository> = match database_url {
        Some(url) => {
            let pool = create_pool(url)
                .await
                .map_err(|e| PatientError::StoreUnavailable(e.to_string()))?;
            Arc::new(PostgresRepository::new(pool))
        }
        None => Arc::new(InMemoryRepository::new()),
    };

    repo.ensure_indexes().await?;
    tracing::info!(backend = repo.backend_name(), "Patient repository ready");

    Ok(repo)
}
