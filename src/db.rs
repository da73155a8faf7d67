use rocket_db_pools::{Database, sqlx};

/// Pooled connection to the customer database, configured under
/// `databases.customer_db` in the Rocket figment.
#[derive(Database)]
#[database("customer_db")]
pub struct CustomerDb(sqlx::PgPool);
