//! One-shot database setup: schema, bulk CSV load, verification.
//!
//! The stages run strictly in order:
//!
//! 1. [`schema::recreate_schema`] drops and recreates `users` and `orders`
//! 2. customers are loaded from the users CSV
//! 3. orders are loaded from the orders CSV (after customers, so the foreign
//!    key holds at insert time)
//! 4. [`verify::run_verification`] reports counts, integrity and status mix
//!
//! Each stage checks one connection out of the pool and holds it until the
//! stage finishes. The pool itself is owned by [`setup_database`], which
//! closes it on every exit path.

mod error;
pub mod loader;
pub mod records;
pub mod schema;
mod stats;
pub mod verify;

pub use error::SetupError;
pub use loader::{BATCH_SIZE, LoaderOptions, MAX_BATCH_SIZE, load_csv};
pub use records::{CustomerRecord, LoadRecord, OrderRecord};
pub use stats::LoadSummary;
pub use verify::VerificationReport;

use crate::config::DbConfig;
use rocket_db_pools::sqlx::PgPool;
use rocket_db_pools::sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use std::time::Duration;

/// Locations of the two input files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupPaths {
    pub users_csv: PathBuf,
    pub orders_csv: PathBuf,
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct SetupReport {
    pub customers: LoadSummary,
    pub orders: LoadSummary,
    pub verification: VerificationReport,
}

/// Open the pool used by a setup run.
pub async fn connect(config: &DbConfig) -> Result<PgPool, SetupError> {
    let options = config.connect_options().map_err(SetupError::Connect)?;
    PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
        .map_err(SetupError::Connect)
}

/// Run every stage against an existing pool.
///
/// The pool is left open; callers that own it are responsible for closing it.
pub async fn run_setup(
    pool: &PgPool,
    paths: &SetupPaths,
    options: &LoaderOptions,
) -> Result<SetupReport, SetupError> {
    {
        let mut conn = pool.acquire().await.map_err(SetupError::Connect)?;
        schema::recreate_schema(&mut conn).await?;
    }

    let customers = {
        let mut conn = pool.acquire().await.map_err(SetupError::Connect)?;
        load_csv::<CustomerRecord>(&mut conn, &paths.users_csv, options).await?
    };

    let orders = {
        let mut conn = pool.acquire().await.map_err(SetupError::Connect)?;
        load_csv::<OrderRecord>(&mut conn, &paths.orders_csv, options).await?
    };

    let verification = {
        let mut conn = pool.acquire().await.map_err(SetupError::Connect)?;
        verify::run_verification(&mut conn).await?
    };
    verification.log();

    Ok(SetupReport {
        customers,
        orders,
        verification,
    })
}

/// Connect, run every stage and close the pool whatever the outcome.
pub async fn setup_database(
    config: &DbConfig,
    paths: &SetupPaths,
    options: &LoaderOptions,
) -> Result<SetupReport, SetupError> {
    let pool = connect(config).await?;
    let result = run_setup(&pool, paths, options).await;
    pool.close().await;
    result
}
