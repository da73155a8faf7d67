//! Destructive (re)creation of the `users` and `orders` tables.
//!
//! Every setup run starts from a clean slate: existing tables are dropped,
//! child before parent, and recreated together with their secondary indexes.

use super::SetupError;
use rocket_db_pools::sqlx::{self, PgConnection, PgPool};

const DROP_STATEMENTS: &[&str] = &[
    "DROP TABLE IF EXISTS orders CASCADE",
    "DROP TABLE IF EXISTS users CASCADE",
];

const CREATE_USERS: &str = r#"
    CREATE TABLE users (
        id INTEGER PRIMARY KEY,
        first_name VARCHAR(100) NOT NULL,
        last_name VARCHAR(100) NOT NULL,
        email VARCHAR(255) NOT NULL,
        age INTEGER CHECK (age >= 0 AND age <= 150),
        gender CHAR(1) CHECK (gender IN ('M', 'F')),
        state VARCHAR(100),
        street_address TEXT,
        postal_code VARCHAR(20),
        city VARCHAR(100),
        country VARCHAR(100),
        latitude DECIMAL(10, 8),
        longitude DECIMAL(11, 8),
        traffic_source VARCHAR(50),
        created_at TIMESTAMP WITH TIME ZONE NOT NULL
    )
"#;

const CREATE_ORDERS: &str = r#"
    CREATE TABLE orders (
        order_id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        status VARCHAR(50) NOT NULL,
        gender CHAR(1) CHECK (gender IN ('M', 'F')),
        created_at TIMESTAMP WITH TIME ZONE NOT NULL,
        returned_at TIMESTAMP WITH TIME ZONE,
        shipped_at TIMESTAMP WITH TIME ZONE,
        delivered_at TIMESTAMP WITH TIME ZONE,
        num_of_item INTEGER CHECK (num_of_item > 0),
        FOREIGN KEY (user_id) REFERENCES users(id)
    )
"#;

/// Secondary indexes on the columns the API filters, sorts and joins on.
pub const INDEXES: &[(&str, &str, &str)] = &[
    ("idx_users_email", "users", "email"),
    ("idx_users_state", "users", "state"),
    ("idx_users_country", "users", "country"),
    ("idx_users_created_at", "users", "created_at"),
    ("idx_orders_user_id", "orders", "user_id"),
    ("idx_orders_status", "orders", "status"),
    ("idx_orders_created_at", "orders", "created_at"),
];

/// Drop both tables if present, `orders` first.
pub async fn drop_schema(conn: &mut PgConnection) -> Result<(), SetupError> {
    for statement in DROP_STATEMENTS {
        sqlx::query(statement)
            .execute(&mut *conn)
            .await
            .map_err(SetupError::Schema)?;
    }
    Ok(())
}

/// Drop and recreate `users` and `orders` with constraints and indexes.
///
/// **WARNING**: destroys every row in both tables.
pub async fn recreate_schema(conn: &mut PgConnection) -> Result<(), SetupError> {
    log::info!("dropping existing tables");
    drop_schema(conn).await?;

    log::info!("creating tables");
    for statement in [CREATE_USERS, CREATE_ORDERS] {
        sqlx::query(statement)
            .execute(&mut *conn)
            .await
            .map_err(SetupError::Schema)?;
    }

    for (name, table, column) in INDEXES {
        sqlx::query(&format!("CREATE INDEX {name} ON {table}({column})"))
            .execute(&mut *conn)
            .await
            .map_err(SetupError::Schema)?;
    }

    log::info!("tables created ({} indexes)", INDEXES.len());
    Ok(())
}

/// Whether both tables exist. Used by the API server at startup.
pub async fn schema_present(pool: &PgPool) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT to_regclass('public.users') IS NOT NULL AND to_regclass('public.orders') IS NOT NULL",
    )
    .fetch_one(pool)
    .await
}
