//! Unified error system for the Atelier backend
//!
//! Every fallible operation surfaces an [`AppError`], which carries a
//! stable error code, an HTTP status and a human-readable message with
//! enough context (order id, attempted amount) for the admin UI to render
//! an actionable message.
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 4xxx: Order state errors
//! - 5xxx: Payment / refund errors
//! - 9xxx: System errors

use crate::response::ApiResponse;
use axum::body::Body;
use http::{Response, StatusCode};
use thiserror::Error;

/// Unified error type for the backend
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed request input
    #[error("{message}")]
    Validation { message: String },

    /// Resource not found
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Refund amount is non-positive or exceeds the refundable amount
    #[error(
        "Invalid refund amount {amount:.2} for order {order_id} (refundable: {refundable:.2})"
    )]
    InvalidAmount {
        order_id: String,
        amount: f64,
        refundable: f64,
    },

    /// Operation not valid for the order's current status
    #[error("Cannot {action} order {order_id} in status {status}")]
    InvalidState {
        order_id: String,
        status: String,
        action: String,
    },

    /// Order already has a shipment attached
    #[error("Order {order_id} already has a shipment assigned")]
    AlreadyShipped { order_id: String },

    /// The external order store could not be reached or failed mid-request
    #[error("Order store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// Internal server error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    // ========== Convenient constructors ==========

    /// Create a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a StoreUnavailable error
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    // ========== Error inspection methods ==========

    /// Get the stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "E0002",
            Self::NotFound { .. } => "E0003",
            Self::InvalidState { .. } => "E4001",
            Self::AlreadyShipped { .. } => "E4002",
            Self::InvalidAmount { .. } => "E5001",
            Self::StoreUnavailable { .. } => "E9003",
            Self::Internal { .. } => "E9001",
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidState { .. } | Self::AlreadyShipped { .. } | Self::InvalidAmount { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::StoreUnavailable { .. } => StatusCode::BAD_GATEWAY,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> Response<Body> {
        let status = self.status_code();
        let body = ApiResponse::<()>::error(self.code(), self.to_string());
        let json_body = serde_json::to_string(&body).unwrap_or_default();

        Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(json_body.into())
            .unwrap_or_else(|_| {
                let mut resp = Response::new(Body::from("Internal error"));
                *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                resp
            })
    }
}

/// Result type for API operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_to_expected_status() {
        let err = AppError::InvalidAmount {
            order_id: "a".repeat(24),
            amount: 10.0,
            refundable: 5.0,
        };
        assert_eq!(err.code(), "E5001");
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = AppError::not_found("Order 123");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = AppError::store_unavailable("connection refused");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn invalid_amount_message_carries_context() {
        let err = AppError::InvalidAmount {
            order_id: "64b1f0a2c3d4e5f601234567".to_string(),
            amount: 60.0,
            refundable: 30.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("64b1f0a2c3d4e5f601234567"));
        assert!(msg.contains("60.00"));
        assert!(msg.contains("30.00"));
    }
}
