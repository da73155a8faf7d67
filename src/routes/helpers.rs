//! Shared helper functions for Rocket route handlers.

use crate::db::CustomerDb;
use crate::error::ApiError;
use rocket_db_pools::{Connection, sqlx};

/// Fail with [`ApiError::NotFound`] unless a customer with `customer_id` exists.
pub async fn ensure_customer_exists(
    customer_id: i32,
    db: &mut Connection<CustomerDb>,
) -> Result<(), ApiError> {
    if customer_exists(customer_id, db).await? {
        Ok(())
    } else {
        Err(ApiError::customer_not_found(customer_id))
    }
}

pub async fn customer_exists(
    customer_id: i32,
    db: &mut Connection<CustomerDb>,
) -> Result<bool, ApiError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(customer_id)
        .fetch_one(&mut ***db)
        .await?;

    Ok(exists)
}

/// Customer ids are positive; reject anything else before touching the database.
pub fn require_positive_id(customer_id: i32) -> Result<(), ApiError> {
    if customer_id <= 0 {
        return Err(ApiError::BadRequest(
            "Customer ID must be a positive integer".to_string(),
        ));
    }
    Ok(())
}
