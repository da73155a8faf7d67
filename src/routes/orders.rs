//! Order endpoints, both scoped to a customer and global by order id.

use crate::db::CustomerDb;
use crate::error::ApiError;
use crate::models::{OrderResponse, PagedResponse};
use crate::routes::helpers::ensure_customer_exists;
use crate::routes::params::OrderPageParams;
use rocket::serde::json::Json;
use rocket_db_pools::{Connection, sqlx};
use rocket_okapi::openapi;

const ORDER_SELECT: &str = r#"
    SELECT
        o.order_id, o.user_id, o.status, o.gender, o.created_at,
        o.returned_at, o.shipped_at, o.delivered_at, o.num_of_item,
        u.first_name || ' ' || u.last_name AS customer_name,
        u.email AS customer_email
    FROM orders o
    JOIN users u ON u.id = o.user_id
"#;

/// List a customer's orders, newest first.
#[openapi(tag = "Orders")]
#[get("/customers/<customer_id>/orders?<params..>")]
pub async fn list_customer_orders(
    customer_id: i32,
    mut db: Connection<CustomerDb>,
    params: OrderPageParams,
) -> Result<Json<PagedResponse<OrderResponse>>, ApiError> {
    let request = params.page_request()?;
    ensure_customer_exists(customer_id, &mut db).await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(customer_id)
        .fetch_one(&mut **db)
        .await?;

    let orders = sqlx::query_as::<_, OrderResponse>(&format!(
        "{ORDER_SELECT} WHERE o.user_id = $1 ORDER BY o.created_at DESC, o.order_id LIMIT $2 OFFSET $3"
    ))
    .bind(customer_id)
    .bind(request.size)
    .bind(request.offset())
    .fetch_all(&mut **db)
    .await?;

    Ok(Json(PagedResponse::new(
        orders,
        request.page,
        request.size,
        total.0,
    )))
}

/// Number of orders placed by a customer.
#[openapi(tag = "Orders")]
#[get("/customers/<customer_id>/orders/count")]
pub async fn count_customer_orders(
    customer_id: i32,
    mut db: Connection<CustomerDb>,
) -> Result<Json<i64>, ApiError> {
    ensure_customer_exists(customer_id, &mut db).await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(customer_id)
        .fetch_one(&mut **db)
        .await?;

    Ok(Json(total))
}

/// Retrieve one order, verifying that it belongs to the customer.
#[openapi(tag = "Orders")]
#[get("/customers/<customer_id>/orders/<order_id>", rank = 2)]
pub async fn get_customer_order(
    customer_id: i32,
    order_id: i32,
    mut db: Connection<CustomerDb>,
) -> Result<Json<OrderResponse>, ApiError> {
    ensure_customer_exists(customer_id, &mut db).await?;

    let order = sqlx::query_as::<_, OrderResponse>(&format!(
        "{ORDER_SELECT} WHERE o.order_id = $1 AND o.user_id = $2"
    ))
    .bind(order_id)
    .bind(customer_id)
    .fetch_optional(&mut **db)
    .await?
    .ok_or_else(|| {
        ApiError::NotFound(format!(
            "Order not found with ID: {order_id} for customer: {customer_id}"
        ))
    })?;

    Ok(Json(order))
}

/// Retrieve one order by id regardless of its customer.
#[openapi(tag = "Orders")]
#[get("/orders/<order_id>")]
pub async fn get_order(
    order_id: i32,
    mut db: Connection<CustomerDb>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = sqlx::query_as::<_, OrderResponse>(&format!("{ORDER_SELECT} WHERE o.order_id = $1"))
        .bind(order_id)
        .fetch_optional(&mut **db)
        .await?
        .ok_or_else(|| ApiError::order_not_found(order_id))?;

    Ok(Json(order))
}
