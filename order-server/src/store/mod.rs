//! External order store boundary
//!
//! The persistent order store is a document database behind a thin CRUD
//! API. This module defines the abstract operations the order service
//! depends on and the HTTP implementation against that API.
//!
//! Failures are surfaced as [`StoreError`] and never retried here; the
//! caller decides whether to re-attempt, and no local state is mutated
//! before the store confirms.

mod http;

pub use http::HttpOrderStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::{Carrier, Order, Refund};
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network or storage failure; the request may or may not have reached
    /// the store, the caller must not assume success
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store has no record with the given id
    #[error("record not found: {0}")]
    NotFound(String),

    /// The store answered with something this client cannot interpret
    #[error("unexpected store response: {0}")]
    Unexpected(String),
}

/// Pagination metadata returned by the store's list endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub total_pages: u32,
}

/// Result of a refund call: the refund event plus, when the store can
/// provide it, the authoritative updated order
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundOutcome {
    pub refund: Refund,
    #[serde(default)]
    pub order: Option<Order>,
}

/// Shipment assignment request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRequest {
    pub provider: Carrier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Export formats supported by the store (pass-through, no rendering here)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(Self::Csv),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Pdf => "application/pdf",
        }
    }
}

/// Abstract order store operations
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Paged full-set read, used by the sync loop
    async fn list_orders(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<Order>, PageMeta), StoreError>;

    /// Delete an order record
    async fn delete_order(&self, id: &str) -> Result<(), StoreError>;

    /// Refund an order; returns the authoritative updated order when the
    /// store can provide it
    async fn refund_order(
        &self,
        id: &str,
        amount: f64,
        reason: Option<&str>,
    ) -> Result<RefundOutcome, StoreError>;

    /// Attach a shipment to an order; returns the authoritative order
    async fn add_shipment(
        &self,
        id: &str,
        shipment: &ShipmentRequest,
    ) -> Result<Order, StoreError>;

    /// Export the full order set as a rendered blob (CSV/PDF)
    async fn export_orders(&self, format: ExportFormat) -> Result<Vec<u8>, StoreError>;
}
