//! Order service
//!
//! Owns the in-memory order set and coordinates the sync loop, search
//! index, aggregation and store-backed mutations. Reads are served from
//! memory; every mutation validates locally, persists to the store first
//! and only then updates local state (store-first write ordering).
//!
//! Mutations on the same order are single-flight: a per-order async lock
//! is held across validate → persist → reconcile, so a queued second
//! mutation revalidates against the already-updated record.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use shared::models::Order;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::store::{ExportFormat, OrderStore, ShipmentRequest};

use super::error::{OrderError, OrderResult};
use super::index::{OrderIndex, SearchQuery};
use super::ledger;
use super::stats::{self, OrderStats};
use super::sync::{self, ReloadOutcome, SyncConfig};

/// One page of query results
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// Total matches before pagination
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// The order service
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    orders: RwLock<HashMap<String, Order>>,
    index: OrderIndex,
    stats: RwLock<OrderStats>,
    /// Per-order mutation locks (single-flight)
    mutation_locks: DashMap<String, Arc<Mutex<()>>>,
    sync_config: SyncConfig,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, sync_config: SyncConfig) -> Self {
        Self {
            store,
            orders: RwLock::new(HashMap::new()),
            index: OrderIndex::new(),
            stats: RwLock::new(OrderStats::default()),
            mutation_locks: DashMap::new(),
            sync_config,
        }
    }

    /// Number of orders currently held in memory
    pub fn loaded_count(&self) -> usize {
        self.orders.read().len()
    }

    /// Whether the search index has been built at least once
    pub fn index_ready(&self) -> bool {
        self.index.is_ready()
    }

    /// Full reload: page through the store, normalize and replace the
    /// in-memory set, then rebuild the index and statistics
    ///
    /// On store failure the previous set stays in place untouched.
    pub async fn reload(&self, cancel: &CancellationToken) -> OrderResult<ReloadOutcome> {
        let (fetched, pages_fetched, warning) =
            sync::fetch_all(self.store.as_ref(), &self.sync_config, cancel).await?;

        // Deduplicate by id; a record shifting between pages mid-sync
        // keeps its latest version
        let mut set = HashMap::with_capacity(fetched.len());
        for mut order in fetched {
            order.normalize();
            set.insert(order.id.clone(), order);
        }
        let loaded = set.len();

        *self.orders.write() = set;
        self.reconcile();

        tracing::info!(loaded, pages_fetched, "Order set reloaded");
        Ok(ReloadOutcome {
            loaded,
            pages_fetched,
            warning,
        })
    }

    /// Fetch a single order by id from the in-memory set
    pub fn get(&self, id: &str) -> OrderResult<Order> {
        self.orders
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| OrderError::NotFound(id.to_string()))
    }

    /// Current summary statistics
    pub fn stats(&self) -> OrderStats {
        self.stats.read().clone()
    }

    /// Search/filter the order set and return one page of results
    ///
    /// `page` is 1-based; a page beyond the result range yields an empty
    /// list with the real totals.
    pub fn query(&self, query: &SearchQuery, page: u32, page_size: u32) -> OrderPage {
        let orders = self.orders.read();
        let ids = self.index.search(&orders, query);

        let total = ids.len();
        let page = page.max(1);
        let page_size = page_size.max(1);
        let total_pages = (total as u32).div_ceil(page_size).max(1);

        let start = (page as usize - 1) * page_size as usize;
        let page_orders = ids
            .iter()
            .skip(start)
            .take(page_size as usize)
            .filter_map(|id| orders.get(id).cloned())
            .collect();

        OrderPage {
            orders: page_orders,
            total,
            page,
            page_size,
            total_pages,
        }
    }

    /// Refund part or all of an order
    ///
    /// Validates against the ledger, persists through the store, then
    /// reconciles: the store's authoritative order wins when returned,
    /// otherwise the refund is applied locally.
    pub async fn request_refund(
        &self,
        id: &str,
        amount: f64,
        reason: Option<String>,
    ) -> OrderResult<Order> {
        let lock = self.mutation_lock(id);
        let _guard = lock.lock().await;

        let order = self.get(id)?;
        ledger::validate_refund(&order, amount)?;

        let outcome = self
            .store
            .refund_order(id, amount, reason.as_deref())
            .await?;

        let updated = match outcome.order {
            Some(mut authoritative) => {
                authoritative.normalize();
                authoritative
            }
            None => {
                let mut local = order;
                ledger::apply_refund_locally(
                    &mut local,
                    outcome.refund.amount,
                    outcome.refund.reason.clone(),
                    outcome.refund.refund_id.clone(),
                    outcome.refund.refunded_at,
                );
                local
            }
        };

        tracing::info!(
            order_id = %id,
            amount = %format!("{amount:.2}"),
            refunded_total = %format!("{:.2}", updated.refunded_amount),
            status = %updated.status,
            "Refund processed"
        );

        self.replace_order(updated.clone());
        Ok(updated)
    }

    /// Attach a shipment to an order
    ///
    /// Rejected locally when the order already has a shipment, is fully
    /// refunded, or was never paid.
    pub async fn assign_shipment(
        &self,
        id: &str,
        request: ShipmentRequest,
    ) -> OrderResult<Order> {
        let lock = self.mutation_lock(id);
        let _guard = lock.lock().await;

        let order = self.get(id)?;
        if order.shipment.is_some() {
            return Err(OrderError::AlreadyShipped(id.to_string()));
        }
        if order.status.is_refunded() || !order.status.is_paid() {
            return Err(OrderError::InvalidState {
                order_id: id.to_string(),
                status: order.status,
                action: "ship",
            });
        }

        let mut updated = self.store.add_shipment(id, &request).await?;
        updated.normalize();

        tracing::info!(
            order_id = %id,
            provider = %request.provider,
            "Shipment assigned"
        );

        self.replace_order(updated.clone());
        Ok(updated)
    }

    /// Delete an order from the store and the local set
    pub async fn delete(&self, id: &str) -> OrderResult<()> {
        let lock = self.mutation_lock(id);
        let _guard = lock.lock().await;

        if !self.orders.read().contains_key(id) {
            return Err(OrderError::NotFound(id.to_string()));
        }

        self.store.delete_order(id).await?;

        self.orders.write().remove(id);
        self.reconcile();
        self.mutation_locks.remove(id);

        tracing::info!(order_id = %id, "Order deleted");
        Ok(())
    }

    /// Export the full order set via the store (rendered upstream)
    pub async fn export(&self, format: ExportFormat) -> OrderResult<Vec<u8>> {
        let data = self.store.export_orders(format).await?;
        tracing::debug!(format = format.as_str(), bytes = data.len(), "Orders exported");
        Ok(data)
    }

    fn mutation_lock(&self, id: &str) -> Arc<Mutex<()>> {
        self.mutation_locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn replace_order(&self, order: Order) {
        self.orders.write().insert(order.id.clone(), order);
        self.reconcile();
    }

    /// Rebuild the search index and statistics from the current set
    ///
    /// An index rebuild failure degrades search to the fallback scan but
    /// never fails the mutation that triggered it.
    fn reconcile(&self) {
        let orders = self.orders.read();
        if let Err(e) = self.index.rebuild(&orders) {
            tracing::error!(error = %e, "Index rebuild failed, search degraded");
        }
        *self.stats.write() = stats::compute(orders.values());
    }
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService")
            .field("loaded", &self.loaded_count())
            .field("index_ready", &self.index_ready())
            .finish()
    }
}
