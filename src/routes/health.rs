//! Liveness endpoint polled by the console UI before it loads customer data.
//!
//! It never touches the database, so it answers even while `setup_db` is
//! still recreating the tables.

use rocket::serde::json::Json;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    /// Always `"ok"` when the process is serving requests.
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Report that the API process is up.
#[openapi(tag = "Health")]
#[get("/health")]
pub fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_status_object() {
        let body = serde_json::to_value(HealthResponse::ok()).unwrap();
        assert_eq!(body, serde_json::json!({ "status": "ok" }));
    }
}
