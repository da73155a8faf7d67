//! Customer-focused REST endpoints.
//!
//! Listings carry each customer's order count and are always ordered by id so
//! that pages are stable between requests.

use crate::db::CustomerDb;
use crate::error::ApiError;
use crate::models::{CustomerResponse, PagedResponse};
use crate::routes::helpers::{customer_exists as lookup_customer, require_positive_id};
use crate::routes::params::{CustomerFilter, CustomerListParams};
use rocket::serde::json::Json;
use rocket_db_pools::sqlx::{self, Postgres, QueryBuilder};
use rocket_db_pools::Connection;
use rocket_okapi::openapi;

const CUSTOMER_COLUMNS: &str = r#"
    u.id, u.first_name, u.last_name, u.email, u.age, u.gender, u.state,
    u.street_address, u.postal_code, u.city, u.country, u.latitude, u.longitude,
    u.traffic_source, u.created_at,
    COUNT(o.order_id) AS order_count
"#;

impl CustomerFilter {
    fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            CustomerFilter::All => {}
            CustomerFilter::Search(term) => {
                let pattern = format!("%{}%", term.to_lowercase());
                builder
                    .push(" WHERE LOWER(u.first_name) LIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR LOWER(u.last_name) LIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR LOWER(u.email) LIKE ")
                    .push_bind(pattern);
            }
            CustomerFilter::Country(country) => {
                builder.push(" WHERE u.country = ").push_bind(country.clone());
            }
        }
    }
}

/// List customers with their order counts.
///
/// `search` matches first name, last name or email (case-insensitive
/// substring) and wins over `country` when both are supplied.
#[openapi(tag = "Customers")]
#[get("/customers?<params..>")]
pub async fn list_customers(
    mut db: Connection<CustomerDb>,
    params: CustomerListParams,
) -> Result<Json<PagedResponse<CustomerResponse>>, ApiError> {
    let request = params.page_request()?;
    let filter = params.filter();

    let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u");
    filter.push_where(&mut count_query);
    let total_elements: i64 = count_query
        .build_query_scalar()
        .fetch_one(&mut **db)
        .await?;

    let mut page_query = QueryBuilder::<Postgres>::new(format!(
        "SELECT {CUSTOMER_COLUMNS} FROM users u LEFT JOIN orders o ON o.user_id = u.id"
    ));
    filter.push_where(&mut page_query);
    page_query
        .push(" GROUP BY u.id ORDER BY u.id LIMIT ")
        .push_bind(request.size)
        .push(" OFFSET ")
        .push_bind(request.offset());

    let customers = page_query
        .build_query_as::<CustomerResponse>()
        .fetch_all(&mut **db)
        .await?;

    Ok(Json(PagedResponse::new(
        customers,
        request.page,
        request.size,
        total_elements,
    )))
}

/// Total number of customers.
#[openapi(tag = "Customers")]
#[get("/customers/count")]
pub async fn customer_count(mut db: Connection<CustomerDb>) -> Result<Json<i64>, ApiError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&mut **db)
        .await?;

    Ok(Json(total))
}

/// Retrieve one customer with their order count.
#[openapi(tag = "Customers")]
#[get("/customers/<customer_id>")]
pub async fn get_customer(
    customer_id: i32,
    mut db: Connection<CustomerDb>,
) -> Result<Json<CustomerResponse>, ApiError> {
    require_positive_id(customer_id)?;

    let customer = sqlx::query_as::<_, CustomerResponse>(&format!(
        r#"SELECT {CUSTOMER_COLUMNS}
           FROM users u
           LEFT JOIN orders o ON o.user_id = u.id
           WHERE u.id = $1
           GROUP BY u.id"#
    ))
    .bind(customer_id)
    .fetch_optional(&mut **db)
    .await?
    .ok_or_else(|| ApiError::customer_not_found(customer_id))?;

    Ok(Json(customer))
}

/// Whether a customer with the given id exists.
#[openapi(tag = "Customers")]
#[get("/customers/<customer_id>/exists")]
pub async fn customer_exists(
    customer_id: i32,
    mut db: Connection<CustomerDb>,
) -> Result<Json<bool>, ApiError> {
    require_positive_id(customer_id)?;

    Ok(Json(lookup_customer(customer_id, &mut db).await?))
}
