use chrono::{DateTime, Utc};
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::{Request, Response};
use rocket_db_pools::sqlx;
use rocket_okapi::OpenApiError;
use rocket_okapi::r#gen::OpenApiGenerator;
use okapi::openapi3::{RefOr, Response as OpenApiResponse, Responses};
use rocket_okapi::response::OpenApiResponderInner;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

const GENERIC_FAILURE: &str = "An unexpected error occurred. Please try again later.";

#[derive(Debug)]
pub enum ApiError {
    DatabaseError(sqlx::Error),
    NotFound(String),
    BadRequest(String),
}

impl ApiError {
    pub fn customer_not_found(customer_id: i32) -> Self {
        ApiError::NotFound(format!("Customer not found with ID: {customer_id}"))
    }

    pub fn order_not_found(order_id: i32) -> Self {
        ApiError::NotFound(format!("Order not found with ID: {order_id}"))
    }

    pub fn status(&self) -> Status {
        match self {
            ApiError::DatabaseError(_) => Status::InternalServerError,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::BadRequest(_) => Status::BadRequest,
        }
    }
}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let (error_type, message) = match self {
            ApiError::DatabaseError(e) => {
                log::error!("database error on {}: {}", request.uri(), e);
                ("Internal Server Error", GENERIC_FAILURE.to_string())
            }
            ApiError::NotFound(msg) => {
                log::debug!("not found: {}", msg);
                ("Not Found", msg)
            }
            ApiError::BadRequest(msg) => {
                log::debug!("bad request: {}", msg);
                ("Invalid Request", msg)
            }
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
            status: status.code,
            path: request.uri().path().to_string(),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&error_response).unwrap_or_else(|_| {
            r#"{"error":"SerializationError","message":"Failed to serialize error"}"#.to_string()
        });

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

impl OpenApiResponderInner for ApiError {
    fn responses(_generator: &mut OpenApiGenerator) -> Result<Responses, OpenApiError> {
        let mut responses = okapi::Map::new();
        for (code, description) in [
            ("400", "Invalid request parameters."),
            ("404", "The requested customer or order does not exist."),
            ("500", "Unexpected server or database failure."),
        ] {
            responses.insert(
                code.to_string(),
                RefOr::Object(OpenApiResponse {
                    description: description.to_string(),
                    ..Default::default()
                }),
            );
        }

        Ok(Responses {
            responses,
            ..Default::default()
        })
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            _ => ApiError::DatabaseError(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_404() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), Status::NotFound);
    }

    #[test]
    fn other_sqlx_errors_are_500() {
        let err = ApiError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status(), Status::InternalServerError);
    }

    #[test]
    fn not_found_messages_name_the_id() {
        match ApiError::customer_not_found(42) {
            ApiError::NotFound(msg) => assert_eq!(msg, "Customer not found with ID: 42"),
            other => panic!("unexpected variant: {other:?}"),
        }
        match ApiError::order_not_found(7) {
            ApiError::NotFound(msg) => assert_eq!(msg, "Order not found with ID: 7"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
