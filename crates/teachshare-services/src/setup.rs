//! Wiring from configuration to a ready [`TeachShare`].

use anyhow::{Context, Result};
use teachshare_core::Config;
use teachshare_db::{setup_database, Repositories};
use teachshare_storage::create_storage;

use crate::facade::{TeachShare, TeachShareSettings};

/// Connect the database (running migrations), open the configured document
/// store, and build the facade over them.
pub async fn build_from_config(config: &Config) -> Result<TeachShare> {
    let pool = setup_database(config).await?;
    let repositories = Repositories::postgres(pool, config.db_timeout());

    let storage = create_storage(config)
        .await
        .context("Failed to initialize document store")?;
    tracing::info!(
        backend = %storage.backend_type(),
        bucket = %storage.bucket(),
        "Document store ready"
    );

    Ok(TeachShare::new(
        repositories,
        storage,
        TeachShareSettings::from_config(config),
    ))
}
