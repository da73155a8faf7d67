//! Query parameter helpers shared by the list endpoints.
//!
//! Pages are zero-based to match the UI's pager. Out-of-range values are
//! rejected with `400 Bad Request` instead of being clamped, so a client bug
//! shows up as an error rather than as a silently different page.

use crate::error::ApiError;
use rocket::form::FromForm;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

const fn default_page() -> i64 {
    0
}

const fn default_customer_page_size() -> i64 {
    20
}

const fn default_order_page_size() -> i64 {
    10
}

const MAX_PAGE_SIZE: i64 = 100;

const MAX_PAGE: i64 = i32::MAX as i64;

fn default_optional_string() -> Option<String> {
    None
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Validated page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
}

impl PageRequest {
    pub fn new(page: i64, size: i64) -> Result<Self, ApiError> {
        if page < 0 {
            return Err(ApiError::BadRequest(
                "Page number cannot be negative".to_string(),
            ));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&size) {
            return Err(ApiError::BadRequest(format!(
                "Page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if page > MAX_PAGE {
            return Err(ApiError::BadRequest(format!(
                "Page number cannot exceed {MAX_PAGE}"
            )));
        }
        Ok(Self { page, size })
    }

    /// Row offset for `LIMIT .. OFFSET ..` queries.
    ///
    /// Cannot overflow: `page` is at most `i32::MAX` and `size` at most 100.
    pub fn offset(&self) -> i64 {
        self.page * self.size
    }
}

/// How the customer listing is narrowed down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerFilter {
    All,
    /// Case-insensitive substring match on first name, last name or email.
    Search(String),
    /// Exact match on country.
    Country(String),
}

/// Query parameters accepted by `GET /customers`.
#[derive(Debug, Clone, Serialize, Deserialize, FromForm, JsonSchema)]
pub struct CustomerListParams {
    /// Zero-based page index (defaults to 0).
    #[field(default = 0)]
    #[serde(default = "default_page")]
    pub page: i64,
    /// Page size between 1 and 100 (defaults to 20).
    #[field(default = 20)]
    #[serde(default = "default_customer_page_size")]
    pub size: i64,
    /// Free-text term matched against first name, last name and email.
    #[serde(default = "default_optional_string")]
    pub search: Option<String>,
    /// Restrict results to one country. Ignored when `search` is present.
    #[serde(default = "default_optional_string")]
    pub country: Option<String>,
}


impl CustomerListParams {
    pub fn page_request(&self) -> Result<PageRequest, ApiError> {
        PageRequest::new(self.page, self.size)
    }

    /// Search takes precedence over the country filter.
    pub fn filter(&self) -> CustomerFilter {
        if let Some(term) = non_blank(self.search.as_ref()) {
            CustomerFilter::Search(term)
        } else if let Some(country) = non_blank(self.country.as_ref()) {
            CustomerFilter::Country(country)
        } else {
            CustomerFilter::All
        }
    }
}

/// Pagination for a customer's order history.
#[derive(Debug, Clone, Serialize, Deserialize, FromForm, JsonSchema)]
pub struct OrderPageParams {
    /// Zero-based page index (defaults to 0).
    #[field(default = 0)]
    #[serde(default = "default_page")]
    pub page: i64,
    /// Page size between 1 and 100 (defaults to 10).
    #[field(default = 10)]
    #[serde(default = "default_order_page_size")]
    pub size: i64,
}


impl OrderPageParams {
    pub fn page_request(&self) -> Result<PageRequest, ApiError> {
        PageRequest::new(self.page, self.size)
    }
}
