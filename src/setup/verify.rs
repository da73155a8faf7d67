//! Post-load verification queries.
//!
//! Everything here is read-only and purely informational; the numbers are
//! logged for the operator and never fail the run.

use super::SetupError;
use rocket_db_pools::sqlx::{self, FromRow, PgConnection};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TableCount {
    pub table_name: String,
    pub total_records: i64,
}

/// Orders split by whether their `user_id` resolves to a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct IntegrityCheck {
    pub total_orders: i64,
    pub orders_with_valid_users: i64,
    pub orders_with_invalid_users: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct StatusShare {
    pub status: String,
    pub order_count: i64,
    /// Share of all orders, rounded to two decimals.
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub counts: Vec<TableCount>,
    pub integrity: IntegrityCheck,
    /// Most frequent status first.
    pub statuses: Vec<StatusShare>,
}

impl VerificationReport {
    /// Row count for `table_name` (`Users` or `Orders`), if reported.
    pub fn count_for(&self, table_name: &str) -> Option<i64> {
        self.counts
            .iter()
            .find(|count| count.table_name == table_name)
            .map(|count| count.total_records)
    }

    pub fn log(&self) {
        log::info!("database verification");
        for count in &self.counts {
            log::info!("  {}: {}", count.table_name, count.total_records);
        }

        log::info!(
            "  integrity: {} orders, {} with valid users, {} with invalid users",
            self.integrity.total_orders,
            self.integrity.orders_with_valid_users,
            self.integrity.orders_with_invalid_users
        );
        if self.integrity.orders_with_invalid_users > 0 {
            log::warn!(
                "{} orders reference missing customers",
                self.integrity.orders_with_invalid_users
            );
        }

        for share in &self.statuses {
            log::info!(
                "  {}: {} ({}%)",
                share.status,
                share.order_count,
                share.percentage
            );
        }
    }
}

pub async fn run_verification(conn: &mut PgConnection) -> Result<VerificationReport, SetupError> {
    let counts = sqlx::query_as::<_, TableCount>(
        r#"SELECT 'Users' AS table_name, COUNT(*) AS total_records FROM users
           UNION ALL
           SELECT 'Orders' AS table_name, COUNT(*) AS total_records FROM orders"#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(SetupError::Verify)?;

    let integrity = sqlx::query_as::<_, IntegrityCheck>(
        r#"SELECT
               COUNT(*) AS total_orders,
               COUNT(CASE WHEN u.id IS NOT NULL THEN 1 END) AS orders_with_valid_users,
               COUNT(CASE WHEN u.id IS NULL THEN 1 END) AS orders_with_invalid_users
           FROM orders o
           LEFT JOIN users u ON o.user_id = u.id"#,
    )
    .fetch_one(&mut *conn)
    .await
    .map_err(SetupError::Verify)?;

    let statuses = sqlx::query_as::<_, StatusShare>(
        r#"SELECT
               status,
               COUNT(*) AS order_count,
               ROUND(COUNT(*) * 100.0 / (SELECT COUNT(*) FROM orders), 2) AS percentage
           FROM orders
           GROUP BY status
           ORDER BY order_count DESC, status"#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(SetupError::Verify)?;

    Ok(VerificationReport {
        counts,
        integrity,
        statuses,
    })
}
