//! Refund ledger — refunded/refundable computation and refund validation
//!
//! All monetary arithmetic goes through `Decimal` and is rounded back to
//! two decimal places for storage, so repeated partial refunds stay
//! additive and exact. The ledger only reads the canonical
//! `refunded_amount` field; the three upstream wire shapes are resolved
//! once on ingest by [`Order::normalize`].

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use shared::models::{Order, OrderStatus, Refund};

use super::error::{OrderError, OrderResult};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for refund amount comparisons, absorbing float rounding from
/// upstream stores (0.0001)
pub const REFUND_EPSILON: f64 = 1e-4;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Cumulative refunded total for an order
#[inline]
pub fn refunded_amount(order: &Order) -> f64 {
    order.refunded_amount
}

/// Remaining refundable portion of the order total, clamped at zero
///
/// Never negative, even when bad upstream data put `refunded_amount`
/// above `total`.
pub fn refundable_amount(order: &Order) -> f64 {
    let remaining = to_decimal(order.total) - to_decimal(order.refunded_amount);
    to_f64(remaining.max(Decimal::ZERO))
}

/// Validate a refund request against the ledger invariants
///
/// Checked locally, before any store call:
/// - the order must have been paid (`PENDING`/`FAILED` cannot refund)
/// - the amount must be finite and positive
/// - the amount must not exceed the refundable amount (plus epsilon)
pub fn validate_refund(order: &Order, amount: f64) -> OrderResult<()> {
    if !order.status.is_paid() {
        return Err(OrderError::InvalidState {
            order_id: order.id.clone(),
            status: order.status,
            action: "refund",
        });
    }

    let refundable = refundable_amount(order);
    if !amount.is_finite() || amount <= 0.0 || amount > refundable + REFUND_EPSILON {
        return Err(OrderError::InvalidAmount {
            order_id: order.id.clone(),
            amount,
            refundable,
        });
    }

    Ok(())
}

/// Best-effort local refund update, used when the store confirms a refund
/// but cannot return the authoritative updated order
///
/// Adds the amount to the cumulative total, moves the status to
/// `REFUNDED` when the order is now fully refunded (within epsilon) or
/// `PARTIALLY_REFUNDED` otherwise, and records the refund event as
/// most-recent.
pub fn apply_refund_locally(
    order: &mut Order,
    amount: f64,
    reason: Option<String>,
    refund_id: Option<String>,
    refunded_at: DateTime<Utc>,
) {
    let amount = to_f64(to_decimal(amount));
    let new_total = to_f64(to_decimal(order.refunded_amount) + to_decimal(amount));

    order.record_refund(Refund {
        amount,
        reason,
        refunded_at,
        refund_id,
    });
    // record_refund adds with raw f64; pin the canonical field and the
    // metadata mirror to the rounded decimal sum
    order.refunded_amount = new_total;
    order.metadata.insert(
        "refundedAmount".to_string(),
        serde_json::Value::from(new_total),
    );

    order.status = if new_total + REFUND_EPSILON >= order.total {
        OrderStatus::Refunded
    } else {
        OrderStatus::PartiallyRefunded
    };
}
