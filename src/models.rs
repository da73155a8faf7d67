use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx::FromRow;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ===== Customers =====

/// A row of `users` together with the number of orders it owns.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct CustomerResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub state: Option<String>,
    pub street_address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub traffic_source: Option<String>,
    pub created_at: DateTime<Utc>,
    pub order_count: i64,
}

// ===== Orders =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct OrderResponse {
    pub order_id: i32,
    pub user_id: i32,
    pub status: String,
    pub gender: Option<String>,
    pub created_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub num_of_item: Option<i32>,
    pub customer_name: String,
    pub customer_email: String,
}

// ===== Pagination =====

/// One page of results plus the metadata the UI needs to render pagers.
///
/// `page_number` is zero-based.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PagedResponse<T> {
    pub content: Vec<T>,
    pub page_number: i64,
    pub page_size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
    pub is_first: bool,
    pub is_last: bool,
}

impl<T> PagedResponse<T> {
    pub fn new(content: Vec<T>, page_number: i64, page_size: i64, total_elements: i64) -> Self {
        let total_pages = if page_size > 0 {
            (total_elements + page_size - 1) / page_size
        } else {
            0
        };

        Self {
            content,
            page_number,
            page_size,
            total_elements,
            total_pages,
            is_first: page_number == 0,
            is_last: page_number.saturating_add(1) >= total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_page_counts() {
        let page = PagedResponse::new(vec![1, 2], 0, 20, 41);
        assert_eq!(page.total_pages, 3);
        assert!(page.is_first);
        assert!(!page.is_last);

        let last = PagedResponse::new(vec![41], 2, 20, 41);
        assert!(!last.is_first);
        assert!(last.is_last);
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        let page = PagedResponse::new(Vec::<i32>::new(), 1, 10, 20);
        assert_eq!(page.total_pages, 2);
        assert!(page.is_last);
    }

    #[test]
    fn empty_result_is_first_and_last() {
        let page = PagedResponse::new(Vec::<i32>::new(), 0, 10, 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.is_first);
        assert!(page.is_last);
    }

    #[test]
    fn last_page_flag_saturates_at_max_page() {
        let page = PagedResponse::new(Vec::<i32>::new(), i64::MAX, 100, 5);
        assert!(page.is_last);
        assert!(!page.is_first);
    }

    #[test]
    fn serializes_snake_case_keys() {
        let page = PagedResponse::new(vec!["a"], 0, 5, 1);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["page_number"], 0);
        assert_eq!(json["page_size"], 5);
        assert_eq!(json["total_elements"], 1);
        assert_eq!(json["is_first"], true);
        assert_eq!(json["is_last"], true);
        assert_eq!(json["content"][0], "a");
    }
}
