use crate::store::StoreError;
use shared::error::AppError;
use shared::models::OrderStatus;
use thiserror::Error;

/// Order service errors
///
/// Validation errors (`InvalidAmount`, `InvalidState`, `AlreadyShipped`)
/// are detected locally before any store call and never reach the store.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Invalid refund amount {amount:.2} for order {order_id} (refundable: {refundable:.2})")]
    InvalidAmount {
        order_id: String,
        amount: f64,
        refundable: f64,
    },

    #[error("Cannot {action} order {order_id} in status {status}")]
    InvalidState {
        order_id: String,
        status: OrderStatus,
        action: &'static str,
    },

    #[error("Order {0} already has a shipment assigned")]
    AlreadyShipped(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(id) => AppError::not_found(format!("Order {id}")),
            OrderError::InvalidAmount {
                order_id,
                amount,
                refundable,
            } => AppError::InvalidAmount {
                order_id,
                amount,
                refundable,
            },
            OrderError::InvalidState {
                order_id,
                status,
                action,
            } => AppError::InvalidState {
                order_id,
                status: status.to_string(),
                action: action.to_string(),
            },
            OrderError::AlreadyShipped(order_id) => AppError::AlreadyShipped { order_id },
            // A targeted mutation on an id the store no longer has is a
            // reportable error (unlike a record vanishing between sync pages)
            OrderError::Store(StoreError::NotFound(id)) => {
                AppError::not_found(format!("Order {id}"))
            }
            OrderError::Store(StoreError::Unavailable(msg)) => AppError::store_unavailable(msg),
            OrderError::Store(StoreError::Unexpected(msg)) => AppError::store_unavailable(msg),
        }
    }
}

/// Result type for order service operations
pub type OrderResult<T> = Result<T, OrderError>;
