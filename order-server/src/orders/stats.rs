//! Aggregation engine — summary statistics over the loaded order set
//!
//! Recomputed synchronously after every sync and every successful
//! mutation; a single O(n) pass over the in-memory set.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{Order, OrderStatus};

use super::ledger::{to_decimal, to_f64};

/// Summary statistics for the order dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: usize,
    /// Σ max(0, total − refunded) in currency unit; clamped per order
    /// before summing so one inconsistent record cannot drag the
    /// aggregate negative
    pub net_revenue: f64,
    /// Orders paid but not yet shipped (PAID + PROCESSING)
    pub paid_count: usize,
    pub shipped_count: usize,
    /// Orders with any refund activity (REFUNDED + PARTIALLY_REFUNDED)
    pub refunded_count: usize,
}

/// Compute statistics over the current order set
pub fn compute<'a>(orders: impl IntoIterator<Item = &'a Order>) -> OrderStats {
    let mut stats = OrderStats::default();
    let mut net = Decimal::ZERO;

    for order in orders {
        stats.total_orders += 1;

        let remaining = to_decimal(order.total) - to_decimal(order.refunded_amount);
        net += remaining.max(Decimal::ZERO);

        match order.status {
            OrderStatus::Paid | OrderStatus::Processing => stats.paid_count += 1,
            OrderStatus::Shipped => stats.shipped_count += 1,
            OrderStatus::Refunded | OrderStatus::PartiallyRefunded => stats.refunded_count += 1,
            OrderStatus::Pending | OrderStatus::Failed => {}
        }
    }

    stats.net_revenue = to_f64(net);
    stats
}
