//! 订单管理模块
//!
//! Order lifecycle management: in-memory order set synced from the
//! external store, weighted fuzzy search, refund ledger, shipment
//! assignment and dashboard aggregation.
//!
//! - `service`: the [`OrderService`] facade owning set, index and stats
//! - `ledger`: refund arithmetic and validation
//! - `index`: tantivy-backed search with degraded fallback
//! - `sync`: paged full-set load from the store
//! - `stats`: summary aggregation

mod error;
pub mod index;
pub mod ledger;
mod service;
pub mod stats;
pub mod sync;

#[cfg(test)]
mod tests;

pub use error::{OrderError, OrderResult};
pub use index::{FieldScope, OrderIndex, SearchQuery, StatusFilter};
pub use service::{OrderPage, OrderService};
pub use stats::OrderStats;
pub use sync::{ReloadOutcome, SyncConfig, SyncWarning};
