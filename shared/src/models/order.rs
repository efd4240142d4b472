//! Order Model
//!
//! Canonical in-memory representation of an order as loaded from the
//! external document store. Field names follow the store's camelCase wire
//! format so records round-trip unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Order lifecycle status
///
/// `PENDING → PAID → PROCESSING → SHIPPED`; a refund moves a paid or
/// shipped order to `PARTIALLY_REFUNDED` or `REFUNDED`. `FAILED` is
/// terminal and only reachable before payment. There is no transition out
/// of `REFUNDED`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Processing,
    Shipped,
    PartiallyRefunded,
    Refunded,
    Failed,
}

impl OrderStatus {
    /// Wire name of the status (matches the serde representation)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::PartiallyRefunded => "partially_refunded",
            Self::Refunded => "refunded",
            Self::Failed => "failed",
        }
    }

    /// Whether the order has been paid at some point in its life
    pub fn is_paid(&self) -> bool {
        !matches!(self, Self::Pending | Self::Failed)
    }

    /// Whether the order is fully refunded (terminal)
    pub fn is_refunded(&self) -> bool {
        matches!(self, Self::Refunded)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shipping carrier (fixed set supported by the store)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Carrier {
    Correos,
    Seur,
    Gls,
    Ups,
    Dhl,
}

impl Carrier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correos => "correos",
            Self::Seur => "seur",
            Self::Gls => "gls",
            Self::Ups => "ups",
            Self::Dhl => "dhl",
        }
    }
}

impl std::fmt::Display for Carrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Billing or shipping address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Order line item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    /// Quantity (positive)
    pub qty: u32,
    /// Unit price in currency unit
    pub unit_price: f64,
    /// Line total in currency unit (qty × unit_price)
    pub total_price: f64,
    /// Origin of the item (e.g. "gallery", "class", "offer")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Shipment record (at most one per order; re-assignment is rejected)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub provider: Carrier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Most recent refund event on an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
    /// Refunded amount in currency unit (positive)
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub refunded_at: DateTime<Utc>,
    /// External refund reference from the payment provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_id: Option<String>,
}

/// Order entity
///
/// `refunded_amount` is the canonical cumulative refunded total. The store
/// may deliver it in one of three shapes (see [`Order::normalize`]); after
/// ingest only the canonical field is consulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Opaque store record identifier (24-char hex)
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    /// ISO 4217 currency code
    pub currency: String,
    pub items: Vec<OrderItem>,
    /// Amount in currency unit
    pub subtotal: f64,
    /// Amount in currency unit
    pub shipping: f64,
    /// Amount in currency unit (subtotal + shipping, established upstream)
    pub total: f64,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    /// Weak reference to the client record (lookup only, no ownership)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment: Option<Shipment>,
    /// Most recent refund event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund: Option<Refund>,
    /// Canonical cumulative refunded total, derived on ingest
    #[serde(default)]
    pub refunded_amount: f64,
    /// Free-form metadata map carried through from the store
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Order {
    /// Resolve the canonical `refunded_amount` from the three wire shapes
    /// the store may deliver, in priority order:
    ///
    /// 1. `metadata.refundedAmount` if present and numeric
    /// 2. sum of `metadata.refunds[].amount` if that list exists
    /// 3. the single `refund.amount` if present
    /// 4. zero
    ///
    /// Malformed metadata entries are skipped, never fatal. Called once on
    /// ingest and again whenever an authoritative store response replaces
    /// the local record.
    pub fn normalize(&mut self) {
        self.refunded_amount = self.derive_refunded_amount();
    }

    fn derive_refunded_amount(&self) -> f64 {
        if let Some(value) = self.metadata.get("refundedAmount")
            && let Some(amount) = value.as_f64()
            && amount.is_finite()
        {
            return amount;
        }

        if let Some(serde_json::Value::Array(refunds)) = self.metadata.get("refunds") {
            return refunds
                .iter()
                .filter_map(|entry| entry.get("amount").and_then(|a| a.as_f64()))
                .filter(|a| a.is_finite())
                .sum();
        }

        self.refund.as_ref().map(|r| r.amount).unwrap_or(0.0)
    }

    /// Append a refund event to `metadata.refunds` and bump the canonical
    /// cumulative amount. Used by the best-effort local update when the
    /// store does not return an authoritative order.
    pub fn record_refund(&mut self, refund: Refund) {
        self.refunded_amount += refund.amount;
        self.metadata.insert(
            "refundedAmount".to_string(),
            serde_json::Value::from(self.refunded_amount),
        );

        let entry = serde_json::to_value(&refund).unwrap_or(serde_json::Value::Null);
        match self.metadata.get_mut("refunds") {
            Some(serde_json::Value::Array(list)) => list.push(entry),
            _ => {
                self.metadata
                    .insert("refunds".to_string(), serde_json::Value::Array(vec![entry]));
            }
        }

        self.refund = Some(refund);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_order() -> Order {
        Order {
            id: "64b1f0a2c3d4e5f601234567".to_string(),
            created_at: Utc::now(),
            paid_at: Some(Utc::now()),
            currency: "EUR".to_string(),
            items: vec![],
            subtotal: 45.0,
            shipping: 5.0,
            total: 50.0,
            status: OrderStatus::Paid,
            billing_address: None,
            shipping_address: None,
            client_id: None,
            payment_intent_id: None,
            shipment: None,
            refund: None,
            refunded_amount: 0.0,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn normalize_prefers_explicit_metadata_amount() {
        let mut order = base_order();
        order
            .metadata
            .insert("refundedAmount".into(), serde_json::json!(12.5));
        order.metadata.insert(
            "refunds".into(),
            serde_json::json!([{"amount": 1.0}, {"amount": 2.0}]),
        );
        order.refund = Some(Refund {
            amount: 99.0,
            reason: None,
            refunded_at: Utc::now(),
            refund_id: None,
        });

        order.normalize();
        assert_eq!(order.refunded_amount, 12.5);
    }

    #[test]
    fn normalize_sums_refund_list_when_no_explicit_amount() {
        let mut order = base_order();
        order.metadata.insert(
            "refunds".into(),
            serde_json::json!([{"amount": 10.0}, {"amount": 7.5}, {"bogus": true}]),
        );

        order.normalize();
        assert_eq!(order.refunded_amount, 17.5);
    }

    #[test]
    fn normalize_falls_back_to_single_refund_then_zero() {
        let mut order = base_order();
        order.refund = Some(Refund {
            amount: 20.0,
            reason: Some("damaged".into()),
            refunded_at: Utc::now(),
            refund_id: None,
        });
        order.normalize();
        assert_eq!(order.refunded_amount, 20.0);

        let mut untouched = base_order();
        untouched.normalize();
        assert_eq!(untouched.refunded_amount, 0.0);
    }

    #[test]
    fn normalize_ignores_non_numeric_metadata() {
        let mut order = base_order();
        order
            .metadata
            .insert("refundedAmount".into(), serde_json::json!("not a number"));
        order.refund = Some(Refund {
            amount: 5.0,
            reason: None,
            refunded_at: Utc::now(),
            refund_id: None,
        });

        order.normalize();
        assert_eq!(order.refunded_amount, 5.0);
    }

    #[test]
    fn record_refund_is_additive_and_tracks_history() {
        let mut order = base_order();
        order.record_refund(Refund {
            amount: 20.0,
            reason: None,
            refunded_at: Utc::now(),
            refund_id: Some("re_1".into()),
        });
        order.record_refund(Refund {
            amount: 10.0,
            reason: Some("partial".into()),
            refunded_at: Utc::now(),
            refund_id: Some("re_2".into()),
        });

        assert_eq!(order.refunded_amount, 30.0);
        assert_eq!(order.refund.as_ref().unwrap().refund_id.as_deref(), Some("re_2"));
        let refunds = order.metadata.get("refunds").unwrap().as_array().unwrap();
        assert_eq!(refunds.len(), 2);

        // A fresh normalize over the recorded metadata agrees with the
        // canonical field.
        let recorded = order.refunded_amount;
        order.normalize();
        assert_eq!(order.refunded_amount, recorded);
    }

    #[test]
    fn status_round_trips_through_wire_names() {
        let json = serde_json::to_string(&OrderStatus::PartiallyRefunded).unwrap();
        assert_eq!(json, "\"partially_refunded\"");
        let status: OrderStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(status, OrderStatus::Shipped);
    }
}
