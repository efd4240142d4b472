//! Sync loop — paged full-set load from the external order store
//!
//! Pages through the store sequentially until exhaustion, a hard safety
//! cap, or cancellation. Records already accumulated stay valid when the
//! loop stops early; after cancellation no further pages are requested.

use serde::Serialize;
use shared::models::Order;
use tokio_util::sync::CancellationToken;

use crate::store::{OrderStore, StoreError};

/// Sync loop configuration
#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
    /// Records per page requested from the store
    pub page_size: u32,
    /// Hard upper bound on total records fetched, independent of page
    /// size, to bound memory use
    pub max_records: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: 200,
            max_records: 10_000,
        }
    }
}

/// Non-fatal conditions surfaced alongside a completed sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum SyncWarning {
    /// The safety cap stopped the loop before the store was exhausted;
    /// the loaded set may be incomplete
    SafetyCapReached { cap: usize },
}

/// Outcome of a full reload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadOutcome {
    /// Orders now held in memory
    pub loaded: usize,
    pub pages_fetched: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<SyncWarning>,
}

/// Fetch the full order set in bounded pages
///
/// Returns the fetched orders (later deduplicated by id on insert) plus
/// pages fetched and the safety-cap warning if it fired. A `NotFound`
/// from the store mid-way is treated as end-of-data, not an error.
pub async fn fetch_all(
    store: &dyn OrderStore,
    config: &SyncConfig,
    cancel: &CancellationToken,
) -> Result<(Vec<Order>, u32, Option<SyncWarning>), StoreError> {
    let mut fetched: Vec<Order> = Vec::new();
    let mut pages_fetched = 0u32;
    let mut warning = None;
    let mut page = 1u32;

    loop {
        if cancel.is_cancelled() {
            tracing::info!(page, loaded = fetched.len(), "Order sync cancelled");
            break;
        }

        let (orders, meta) = match store.list_orders(page, config.page_size).await {
            Ok(result) => result,
            Err(StoreError::NotFound(_)) => {
                tracing::debug!(page, "Store reported no data for page, stopping");
                break;
            }
            Err(e) => return Err(e),
        };
        pages_fetched += 1;

        let batch_empty = orders.is_empty();
        for order in orders {
            if fetched.len() >= config.max_records {
                tracing::warn!(
                    cap = config.max_records,
                    "Sync safety cap reached, order set may be incomplete"
                );
                warning = Some(SyncWarning::SafetyCapReached {
                    cap: config.max_records,
                });
                break;
            }
            fetched.push(order);
        }

        if warning.is_some() || batch_empty || page >= meta.total_pages {
            break;
        }
        page += 1;
    }

    Ok((fetched, pages_fetched, warning))
}
