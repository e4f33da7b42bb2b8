//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a route can produce is one of its variants, and each variant maps to
//! exactly one HTTP status code.
//!
//! `AppError` implements `actix_web::error::ResponseError`, so handlers simply return
//! `Result<_, AppError>` and the error is rendered as a JSON body of the form
//! `{"message": "..."}`. Internal failures (store or crypto) are logged in full but
//! reach the client only as a generic message.
//!
//! `From` implementations for `sqlx::Error`, `validator::ValidationErrors`,
//! `jsonwebtoken::errors::Error` and `bcrypt::BcryptError` allow the `?` operator to be
//! used directly on those results.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use validator::ValidationErrors;

/// Message returned to clients for every 500-class failure.
const INTERNAL_MESSAGE: &str = "Internal server error";

/// Represents all possible errors that can occur within the application.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed request: missing fields, wrong JSON types, missing ids (HTTP 400).
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// Input that parsed but failed a business rule, e.g. a short password
    /// or an unknown status value (HTTP 400).
    #[error("Validation Error: {0}")]
    ValidationError(String),
    /// No credential, or a credential that failed verification (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// A valid identity without the role or relationship the operation needs (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// A referenced task or user does not exist (HTTP 404).
    #[error("Not Found: {0}")]
    NotFound(String),
    /// A unique key is already taken, e.g. a registered email (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Unexpected server-side failure, including hashing errors (HTTP 500).
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
    /// Unexpected failure reported by the relational store (HTTP 500).
    #[error("Database Error: {0}")]
    DatabaseError(String),
}

impl AppError {
    /// Text placed in the `message` field of the response body.
    fn client_message(&self) -> &str {
        match self {
            AppError::BadRequest(msg)
            | AppError::ValidationError(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => INTERNAL_MESSAGE,
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.client_message()
        }))
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// Constraint violations are the storage-level backstop for rules the services check
/// first: a duplicate email becomes `Conflict`, a dangling assignee reference becomes
/// `NotFound`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        if let Some(db_error) = error.as_database_error() {
            if db_error.is_unique_violation() {
                return AppError::Conflict("User already exists".into());
            }
            if db_error.is_foreign_key_violation() {
                return AppError::NotFound("Assigned user not found".into());
            }
        }
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Converts `jsonwebtoken::errors::Error` into `AppError::Unauthorized`.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(format!("Invalid token: {}", error))
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(format!("Password hashing failed: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_error_status_codes() {
        let cases = vec![
            (AppError::BadRequest("x".into()), 400),
            (AppError::ValidationError("x".into()), 400),
            (AppError::Unauthorized("x".into()), 401),
            (AppError::Forbidden("x".into()), 403),
            (AppError::NotFound("x".into()), 404),
            (AppError::Conflict("x".into()), 409),
            (AppError::InternalServerError("x".into()), 500),
            (AppError::DatabaseError("x".into()), 500),
        ];

        for (error, expected) in cases {
            assert_eq!(error.error_response().status(), expected, "{}", error);
        }
    }

    #[actix_rt::test]
    async fn test_error_body_carries_message() {
        let response = AppError::Forbidden("Forbidden".into()).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({ "message": "Forbidden" }));
    }

    #[actix_rt::test]
    async fn test_internal_errors_do_not_leak_detail() {
        let response =
            AppError::DatabaseError("relation \"tasks\" does not exist".into()).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], INTERNAL_MESSAGE);
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, AppError::NotFound(_)));
    }
}
