//! HTTP route handlers grouped by resource.
//!
//! Every handler is annotated with `#[openapi]` so `rocket_okapi` can derive
//! the OpenAPI document served next to the API.

pub mod customers;
pub mod health;
pub(crate) mod helpers;
pub mod orders;
pub mod params;
