use rocket_db_pools::sqlx;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures of the database setup run.
///
/// Per-row coercion problems and primary-key conflicts are not errors; they
/// are counted in [`LoadSummary`](super::LoadSummary) instead.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("cannot connect to database: {0}")]
    Connect(sqlx::Error),
    #[error("schema creation failed: {0}")]
    Schema(sqlx::Error),
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed CSV in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        source: csv_async::Error,
    },
    #[error("{} is missing required column '{header}'", path.display())]
    MissingHeader { path: PathBuf, header: String },
    #[error("insert into {table} failed in batch {batch}: {source}")]
    Insert {
        table: &'static str,
        batch: usize,
        source: sqlx::Error,
    },
    #[error("verification query failed: {0}")]
    Verify(sqlx::Error),
}
