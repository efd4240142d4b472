//! Order service scenario tests against an in-process mock store

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use shared::models::{Carrier, Order, OrderStatus, Refund, Shipment};
use tokio_util::sync::CancellationToken;

use crate::orders::{
    FieldScope, OrderError, OrderService, SearchQuery, StatusFilter, SyncConfig, SyncWarning,
    ledger,
};
use crate::store::{
    ExportFormat, OrderStore, PageMeta, RefundOutcome, ShipmentRequest, StoreError,
};

/// In-process stand-in for the external order store
struct MockStore {
    orders: Mutex<HashMap<String, Order>>,
    /// Whether refund responses carry the authoritative updated order
    authoritative: bool,
    /// Error injected into the next store call
    fail_next: Mutex<Option<StoreError>>,
    refund_calls: AtomicUsize,
}

impl MockStore {
    fn new(orders: Vec<Order>) -> Self {
        Self {
            orders: Mutex::new(orders.into_iter().map(|o| (o.id.clone(), o)).collect()),
            authoritative: true,
            fail_next: Mutex::new(None),
            refund_calls: AtomicUsize::new(0),
        }
    }

    fn without_authoritative_orders(mut self) -> Self {
        self.authoritative = false;
        self
    }

    fn fail_next(&self, error: StoreError) {
        *self.fail_next.lock() = Some(error);
    }

    fn take_failure(&self) -> Result<(), StoreError> {
        match self.fail_next.lock().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn stored(&self, id: &str) -> Option<Order> {
        self.orders.lock().get(id).cloned()
    }

    fn len(&self) -> usize {
        self.orders.lock().len()
    }
}

#[async_trait]
impl OrderStore for MockStore {
    async fn list_orders(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<Order>, PageMeta), StoreError> {
        self.take_failure()?;
        let orders = self.orders.lock();
        let mut all: Vec<&Order> = orders.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));

        let total_pages = (all.len() as u32).div_ceil(page_size).max(1);
        let start = ((page - 1) * page_size) as usize;
        let batch = all
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();

        Ok((batch, PageMeta { page, total_pages }))
    }

    async fn delete_order(&self, id: &str) -> Result<(), StoreError> {
        self.take_failure()?;
        self.orders
            .lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn refund_order(
        &self,
        id: &str,
        amount: f64,
        reason: Option<&str>,
    ) -> Result<RefundOutcome, StoreError> {
        self.take_failure()?;
        let call = self.refund_calls.fetch_add(1, Ordering::SeqCst);

        let mut orders = self.orders.lock();
        let order = orders
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let refund = Refund {
            amount,
            reason: reason.map(str::to_string),
            refunded_at: Utc::now(),
            refund_id: Some(format!("re_{call}")),
        };
        ledger::apply_refund_locally(
            order,
            refund.amount,
            refund.reason.clone(),
            refund.refund_id.clone(),
            refund.refunded_at,
        );

        Ok(RefundOutcome {
            refund,
            order: self.authoritative.then(|| order.clone()),
        })
    }

    async fn add_shipment(
        &self,
        id: &str,
        shipment: &ShipmentRequest,
    ) -> Result<Order, StoreError> {
        self.take_failure()?;
        let mut orders = self.orders.lock();
        let order = orders
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        order.shipment = Some(Shipment {
            provider: shipment.provider,
            tracking_code: shipment.tracking_code.clone(),
            shipped_at: Some(Utc::now()),
            estimated_delivery: shipment.estimated_delivery,
        });
        order.status = OrderStatus::Shipped;
        Ok(order.clone())
    }

    async fn export_orders(&self, format: ExportFormat) -> Result<Vec<u8>, StoreError> {
        self.take_failure()?;
        Ok(format!("export-{}", format.as_str()).into_bytes())
    }
}

fn paid_order(n: u64, total: f64) -> Order {
    Order {
        id: format!("{n:024x}"),
        created_at: Utc::now(),
        paid_at: Some(Utc::now()),
        currency: "EUR".to_string(),
        items: vec![],
        subtotal: total,
        shipping: 0.0,
        total,
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

async fn loaded_service(store: Arc<MockStore>) -> OrderService {
    let service = OrderService::new(store, SyncConfig::default());
    service
        .reload(&CancellationToken::new())
        .await
        .expect("initial reload");
    service
}

#[tokio::test]
async fn reload_pages_through_the_full_set() {
    let orders: Vec<Order> = (0..450).map(|n| paid_order(n, 10.0)).collect();
    let store = Arc::new(MockStore::new(orders));
    let service = OrderService::new(
        store,
        SyncConfig {
            page_size: 200,
            max_records: 10_000,
        },
    );

    let outcome = service
        .reload(&CancellationToken::new())
        .await
        .expect("reload");
    assert_eq!(outcome.loaded, 450);
    assert_eq!(outcome.pages_fetched, 3);
    assert!(outcome.warning.is_none());
    assert_eq!(service.loaded_count(), 450);
    assert!(service.index_ready());
}

#[tokio::test]
async fn reload_stops_at_the_safety_cap_with_a_warning() {
    let orders: Vec<Order> = (0..120).map(|n| paid_order(n, 10.0)).collect();
    let store = Arc::new(MockStore::new(orders));
    let service = OrderService::new(
        store,
        SyncConfig {
            page_size: 50,
            max_records: 100,
        },
    );

    let outcome = service
        .reload(&CancellationToken::new())
        .await
        .expect("reload");
    assert_eq!(outcome.loaded, 100);
    assert_eq!(
        outcome.warning,
        Some(SyncWarning::SafetyCapReached { cap: 100 })
    );
}

#[tokio::test]
async fn cancelled_reload_requests_no_pages() {
    let orders: Vec<Order> = (0..50).map(|n| paid_order(n, 10.0)).collect();
    let store = Arc::new(MockStore::new(orders));
    let service = OrderService::new(store, SyncConfig::default());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = service.reload(&cancel).await.expect("reload");
    assert_eq!(outcome.pages_fetched, 0);
    assert_eq!(outcome.loaded, 0);
}

#[tokio::test]
async fn partial_then_full_refund_walks_the_ledger() {
    let store = Arc::new(MockStore::new(vec![paid_order(1, 50.0)]));
    let service = loaded_service(store).await;
    let id = format!("{:024x}", 1);

    let net_before = service.stats().net_revenue;

    let order = service
        .request_refund(&id, 20.0, Some("damaged frame".into()))
        .await
        .expect("first refund");
    assert_eq!(order.refunded_amount, 20.0);
    assert_eq!(order.status, OrderStatus::PartiallyRefunded);
    assert_eq!(ledger::refundable_amount(&order), 30.0);

    // Net revenue drops by exactly the refunded amount
    assert_eq!(net_before - service.stats().net_revenue, 20.0);
    assert_eq!(service.stats().refunded_count, 1);

    let order = service
        .request_refund(&id, 30.0, None)
        .await
        .expect("second refund");
    assert_eq!(order.refunded_amount, 50.0);
    assert_eq!(order.status, OrderStatus::Refunded);

    // Fully refunded: nothing left, not even a cent
    let err = service.request_refund(&id, 0.01, None).await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidAmount { .. }));
}

#[tokio::test]
async fn overshooting_refund_never_reaches_the_store() {
    let store = Arc::new(MockStore::new(vec![paid_order(1, 50.0)]));
    let service = loaded_service(store.clone()).await;
    let id = format!("{:024x}", 1);

    let err = service.request_refund(&id, 60.0, None).await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidAmount { .. }));

    assert_eq!(store.refund_calls.load(Ordering::SeqCst), 0);
    assert_eq!(service.get(&id).expect("order").refunded_amount, 0.0);
}

#[tokio::test]
async fn concurrent_refunds_on_one_order_are_single_flight() {
    let store = Arc::new(MockStore::new(vec![paid_order(1, 50.0)]));
    let service = loaded_service(store.clone()).await;
    let id = format!("{:024x}", 1);

    // Two 30.00 refunds race on a 50.00 order; the lock serializes them
    // and the loser revalidates against the updated record
    let (a, b) = tokio::join!(
        service.request_refund(&id, 30.0, None),
        service.request_refund(&id, 30.0, None),
    );

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    let failure = [a, b].into_iter().find(|r| r.is_err()).expect("one failure");
    assert!(matches!(failure, Err(OrderError::InvalidAmount { .. })));

    assert_eq!(store.refund_calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.get(&id).expect("order").refunded_amount, 30.0);
}

#[tokio::test]
async fn refund_without_authoritative_response_is_applied_locally() {
    let store = Arc::new(
        MockStore::new(vec![paid_order(1, 50.0)]).without_authoritative_orders(),
    );
    let service = loaded_service(store).await;
    let id = format!("{:024x}", 1);

    let order = service
        .request_refund(&id, 20.0, None)
        .await
        .expect("refund");
    assert_eq!(order.refunded_amount, 20.0);
    assert_eq!(order.status, OrderStatus::PartiallyRefunded);
    assert!(order.refund.is_some());
}

#[tokio::test]
async fn store_failure_leaves_local_state_untouched() {
    let store = Arc::new(MockStore::new(vec![paid_order(1, 50.0)]));
    let service = loaded_service(store.clone()).await;
    let id = format!("{:024x}", 1);
    let stats_before = service.stats();

    store.fail_next(StoreError::Unavailable("connection refused".into()));
    let err = service.request_refund(&id, 20.0, None).await.unwrap_err();
    assert!(matches!(err, OrderError::Store(StoreError::Unavailable(_))));

    assert_eq!(service.get(&id).expect("order").refunded_amount, 0.0);
    assert_eq!(service.stats(), stats_before);
}

#[tokio::test]
async fn shipment_assignment_and_rejections() {
    let mut refunded = paid_order(2, 40.0);
    refunded.status = OrderStatus::Refunded;
    refunded.refunded_amount = 40.0;
    let mut pending = paid_order(3, 15.0);
    pending.status = OrderStatus::Pending;
    pending.paid_at = None;

    let store = Arc::new(MockStore::new(vec![paid_order(1, 50.0), refunded, pending]));
    let service = loaded_service(store).await;

    let request = ShipmentRequest {
        provider: Carrier::Seur,
        tracking_code: Some("SEUR0042".into()),
        estimated_delivery: None,
    };

    let id = format!("{:024x}", 1);
    let order = service
        .assign_shipment(&id, request.clone())
        .await
        .expect("assign");
    assert_eq!(order.status, OrderStatus::Shipped);
    assert_eq!(
        order.shipment.as_ref().and_then(|s| s.tracking_code.as_deref()),
        Some("SEUR0042")
    );
    assert_eq!(service.stats().shipped_count, 1);

    // A second assignment on the same order is rejected
    let err = service
        .assign_shipment(&id, request.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::AlreadyShipped(_)));

    // Refunded and unpaid orders cannot ship
    let err = service
        .assign_shipment(&format!("{:024x}", 2), request.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidState { action: "ship", .. }));

    let err = service
        .assign_shipment(&format!("{:024x}", 3), request)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidState { .. }));
}

#[tokio::test]
async fn delete_removes_the_order_everywhere() {
    let store = Arc::new(MockStore::new(vec![paid_order(1, 50.0), paid_order(2, 30.0)]));
    let service = loaded_service(store.clone()).await;
    let id = format!("{:024x}", 1);

    service.delete(&id).await.expect("delete");
    assert!(matches!(service.get(&id), Err(OrderError::NotFound(_))));
    assert!(store.stored(&id).is_none());
    assert_eq!(store.len(), 1);
    assert_eq!(service.stats().total_orders, 1);

    // Deleting an unknown id is a NotFound, not a store call
    let err = service.delete("ffffffffffffffffffffffff").await.unwrap_err();
    assert!(matches!(err, OrderError::NotFound(_)));
}

#[tokio::test]
async fn query_pagination_is_a_pure_view() {
    let orders: Vec<Order> = (0..5).map(|n| paid_order(n, 10.0)).collect();
    let store = Arc::new(MockStore::new(orders));
    let service = loaded_service(store).await;

    let query = SearchQuery {
        text: String::new(),
        scope: FieldScope::All,
        status: StatusFilter::All,
    };

    let page = service.query(&query, 1, 2);
    assert_eq!(page.orders.len(), 2);
    assert_eq!(page.total, 5);
    assert_eq!(page.total_pages, 3);

    let page = service.query(&query, 3, 2);
    assert_eq!(page.orders.len(), 1);

    // Beyond the range: empty list, real totals
    let page = service.query(&query, 4, 2);
    assert!(page.orders.is_empty());
    assert_eq!(page.total, 5);
}

#[tokio::test]
async fn exact_id_query_through_the_service() {
    let orders: Vec<Order> = (0..10).map(|n| paid_order(n, 10.0)).collect();
    let store = Arc::new(MockStore::new(orders));
    let service = loaded_service(store).await;
    let id = format!("{:024x}", 7);

    let page = service.query(
        &SearchQuery {
            text: id.clone(),
            scope: FieldScope::All,
            status: StatusFilter::All,
        },
        1,
        12,
    );
    assert_eq!(page.total, 1);
    assert_eq!(page.orders[0].id, id);
}

#[tokio::test]
async fn export_passes_the_rendered_blob_through() {
    let store = Arc::new(MockStore::new(vec![paid_order(1, 50.0)]));
    let service = loaded_service(store).await;

    let data = service.export(ExportFormat::Csv).await.expect("export");
    assert_eq!(data, b"export-csv");
}
