//! Order search index
//!
//! Weighted multi-field fuzzy search over the in-memory order set, built
//! with an in-RAM tantivy index. The index is rebuilt on every full
//! reload and after each mutation's reconciliation; the set is bounded
//! (hundreds to low thousands of orders) so rebuilds are cheap.
//!
//! Until the first build completes, queries fall back to a naive
//! case-insensitive substring scan over the same fields, so exact-match
//! queries behave identically on both paths.

use parking_lot::RwLock;
use shared::models::{Order, OrderStatus};
use std::collections::HashMap;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions, Value,
};
use tantivy::{Index, IndexReader, ReloadPolicy, TantivyDocument, Term};
use thiserror::Error;

/// Field weights governing ranking when multiple fields match
const WEIGHT_ITEM_NAME: f32 = 3.0;
const WEIGHT_IDENTIFIER: f32 = 2.0;
const WEIGHT_CONTACT: f32 = 2.0;
const WEIGHT_TRACKING: f32 = 1.0;
const WEIGHT_SOURCE: f32 = 0.5;

/// Minimum term length for fuzzy (edit distance 1) matching
const FUZZY_MIN_LEN: usize = 3;

/// Search errors
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Index error: {0}")]
    Index(String),
}

/// Field-scope restriction for a search query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldScope {
    #[default]
    All,
    OrderId,
    ClientId,
    PaymentIntent,
    /// Shipping/billing names and email
    Contact,
    ItemName,
    Tracking,
}

/// Status filter applied before any text matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    /// Parse the admin query-surface value (`all` or a status wire name)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" | "all" => Some(Self::All),
            "pending" => Some(Self::Only(OrderStatus::Pending)),
            "paid" => Some(Self::Only(OrderStatus::Paid)),
            "processing" => Some(Self::Only(OrderStatus::Processing)),
            "shipped" => Some(Self::Only(OrderStatus::Shipped)),
            "partially_refunded" => Some(Self::Only(OrderStatus::PartiallyRefunded)),
            "refunded" => Some(Self::Only(OrderStatus::Refunded)),
            "failed" => Some(Self::Only(OrderStatus::Failed)),
            _ => None,
        }
    }

    pub fn matches(&self, status: OrderStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(only) => *only == status,
        }
    }
}

/// A search request against the order set
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    pub scope: FieldScope,
    pub status: StatusFilter,
}

/// Schema field handles for the order index
struct IndexFields {
    /// Stored record id, returned from hits
    id: Field,
    /// Raw status token for exact filtering
    status: Field,
    order_id: Field,
    client_id: Field,
    payment_intent: Field,
    item_names: Field,
    contact: Field,
    tracking: Field,
    source: Field,
}

impl IndexFields {
    /// Text fields (with ranking weight) implied by a field scope
    fn scoped(&self, scope: FieldScope) -> Vec<(Field, f32)> {
        match scope {
            FieldScope::All => vec![
                (self.item_names, WEIGHT_ITEM_NAME),
                (self.order_id, WEIGHT_IDENTIFIER),
                (self.client_id, WEIGHT_IDENTIFIER),
                (self.payment_intent, WEIGHT_IDENTIFIER),
                (self.contact, WEIGHT_CONTACT),
                (self.tracking, WEIGHT_TRACKING),
                (self.source, WEIGHT_SOURCE),
            ],
            FieldScope::OrderId => vec![(self.order_id, WEIGHT_IDENTIFIER)],
            FieldScope::ClientId => vec![(self.client_id, WEIGHT_IDENTIFIER)],
            FieldScope::PaymentIntent => vec![(self.payment_intent, WEIGHT_IDENTIFIER)],
            FieldScope::Contact => vec![(self.contact, WEIGHT_CONTACT)],
            FieldScope::ItemName => vec![(self.item_names, WEIGHT_ITEM_NAME)],
            FieldScope::Tracking => vec![(self.tracking, WEIGHT_TRACKING)],
        }
    }
}

/// Inner index state (once built)
struct ReadyIndex {
    reader: IndexReader,
    fields: IndexFields,
}

/// The order search index
///
/// Starts empty; [`OrderIndex::rebuild`] swaps in a fresh index
/// atomically, readers keep using the previous one until then.
#[derive(Default)]
pub struct OrderIndex {
    inner: RwLock<Option<ReadyIndex>>,
}

impl OrderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the index has been built at least once
    pub fn is_ready(&self) -> bool {
        self.inner.read().is_some()
    }

    fn build_schema() -> (Schema, IndexFields) {
        let mut schema_builder = Schema::builder();

        // STRING means indexed but not tokenized (exact match)
        let id = schema_builder.add_text_field("id", STRING | STORED);
        let status = schema_builder.add_text_field("status", STRING);

        let text_indexing = TextFieldIndexing::default()
            .set_tokenizer("default")
            .set_index_option(IndexRecordOption::WithFreqsAndPositions);
        let text_options = TextOptions::default().set_indexing_options(text_indexing);

        let order_id = schema_builder.add_text_field("order_id", text_options.clone());
        let client_id = schema_builder.add_text_field("client_id", text_options.clone());
        let payment_intent = schema_builder.add_text_field("payment_intent", text_options.clone());
        let item_names = schema_builder.add_text_field("item_names", text_options.clone());
        let contact = schema_builder.add_text_field("contact", text_options.clone());
        let tracking = schema_builder.add_text_field("tracking", text_options.clone());
        let source = schema_builder.add_text_field("source", text_options);

        let schema = schema_builder.build();
        let fields = IndexFields {
            id,
            status,
            order_id,
            client_id,
            payment_intent,
            item_names,
            contact,
            tracking,
            source,
        };

        (schema, fields)
    }

    /// Rebuild the index from the current order set and swap it in
    pub fn rebuild(&self, orders: &HashMap<String, Order>) -> Result<(), SearchError> {
        let (schema, fields) = Self::build_schema();
        let index = Index::create_in_ram(schema);

        let mut writer = index
            .writer(50_000_000)
            .map_err(|e| SearchError::Index(format!("Failed to create writer: {e}")))?;

        for order in orders.values() {
            let doc = tantivy::doc!(
                fields.id => order.id.clone(),
                fields.status => order.status.as_str(),
                fields.order_id => order.id.clone(),
                fields.client_id => order.client_id.clone().unwrap_or_default(),
                fields.payment_intent => order.payment_intent_id.clone().unwrap_or_default(),
                fields.item_names => item_name_fields(order).join(" "),
                fields.contact => contact_fields(order).join(" "),
                fields.tracking => tracking_fields(order).join(" "),
                fields.source => source_fields(order).join(" ")
            );
            writer
                .add_document(doc)
                .map_err(|e| SearchError::Index(format!("Failed to index order: {e}")))?;
        }

        writer
            .commit()
            .map_err(|e| SearchError::Index(format!("Failed to commit index: {e}")))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::Index(format!("Failed to create reader: {e}")))?;

        *self.inner.write() = Some(ReadyIndex { reader, fields });

        Ok(())
    }

    /// Run a search against the order set
    ///
    /// Returns matching order ids in deterministic rank order (score
    /// descending, id ascending). Pagination is a pure view over this
    /// sequence and happens in the caller.
    pub fn search(&self, orders: &HashMap<String, Order>, query: &SearchQuery) -> Vec<String> {
        let text = query.text.trim().to_lowercase();

        // Exact-identifier short-circuit: a pasted record id expects the
        // one order, not fuzzy neighbors
        if is_hex_id(&text)
            && matches!(query.scope, FieldScope::All | FieldScope::OrderId)
            && let Some(order) = orders
                .values()
                .find(|o| o.id.eq_ignore_ascii_case(&text))
        {
            if query.status.matches(order.status) {
                return vec![order.id.clone()];
            }
            return Vec::new();
        }

        if text.is_empty() {
            let mut all: Vec<&Order> = orders
                .values()
                .filter(|o| query.status.matches(o.status))
                .collect();
            sort_newest_first(&mut all);
            return all.into_iter().map(|o| o.id.clone()).collect();
        }

        let guard = self.inner.read();
        let Some(ready) = guard.as_ref() else {
            return fallback_scan(orders, query, &text);
        };

        match ranked_search(ready, orders.len(), query, &text) {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "Index search failed, falling back to scan");
                fallback_scan(orders, query, &text)
            }
        }
    }
}

/// Ranked tantivy search over the built index
fn ranked_search(
    ready: &ReadyIndex,
    set_size: usize,
    query: &SearchQuery,
    text: &str,
) -> Result<Vec<String>, SearchError> {
    let searcher = ready.reader.searcher();

    let mut text_clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
    for term_str in text.split_whitespace() {
        for (field, boost) in ready.fields.scoped(query.scope) {
            let term = Term::from_field_text(field, term_str);
            let exact: Box<dyn Query> =
                Box::new(TermQuery::new(term.clone(), IndexRecordOption::Basic));
            text_clauses.push((Occur::Should, Box::new(BoostQuery::new(exact, boost))));

            if term_str.len() >= FUZZY_MIN_LEN {
                let fuzzy: Box<dyn Query> = Box::new(FuzzyTermQuery::new(term, 1, true));
                text_clauses.push((Occur::Should, Box::new(BoostQuery::new(fuzzy, boost))));
            }
        }
    }
    let text_query: Box<dyn Query> = Box::new(BooleanQuery::new(text_clauses));

    // Status filter first (cheap, exact), then the weighted fuzzy match
    let full_query: Box<dyn Query> = match query.status {
        StatusFilter::All => text_query,
        StatusFilter::Only(status) => {
            let status_term = Term::from_field_text(ready.fields.status, status.as_str());
            let status_query: Box<dyn Query> =
                Box::new(TermQuery::new(status_term, IndexRecordOption::Basic));
            Box::new(BooleanQuery::new(vec![
                (Occur::Must, status_query),
                (Occur::Must, text_query),
            ]))
        }
    };

    let top_docs = searcher
        .search(&full_query, &TopDocs::with_limit(set_size.max(1)))
        .map_err(|e| SearchError::Index(format!("Search failed: {e}")))?;

    let mut hits: Vec<(f32, String)> = Vec::with_capacity(top_docs.len());
    for (score, doc_address) in top_docs {
        let doc = searcher
            .doc::<TantivyDocument>(doc_address)
            .map_err(|e| SearchError::Index(format!("Failed to retrieve doc: {e}")))?;
        if let Some(id) = doc.get_first(ready.fields.id).and_then(|v| v.as_str()) {
            hits.push((score, id.to_string()));
        }
    }

    // Deterministic rank order for a fixed set + query
    hits.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(&b.1))
    });

    Ok(hits.into_iter().map(|(_, id)| id).collect())
}

/// Degraded path while the index is not built: case-insensitive substring
/// scan over the same fields the index covers
fn fallback_scan(
    orders: &HashMap<String, Order>,
    query: &SearchQuery,
    text: &str,
) -> Vec<String> {
    let mut matched: Vec<&Order> = orders
        .values()
        .filter(|o| query.status.matches(o.status))
        .filter(|o| {
            scoped_haystacks(o, query.scope)
                .iter()
                .any(|h| h.to_lowercase().contains(text))
        })
        .collect();

    sort_newest_first(&mut matched);
    matched.into_iter().map(|o| o.id.clone()).collect()
}

fn sort_newest_first(orders: &mut [&Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

/// 24-character hexadecimal record identifier check
fn is_hex_id(s: &str) -> bool {
    s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn item_name_fields(order: &Order) -> Vec<String> {
    order.items.iter().map(|i| i.name.clone()).collect()
}

fn contact_fields(order: &Order) -> Vec<String> {
    let mut fields = Vec::new();
    for address in [&order.billing_address, &order.shipping_address]
        .into_iter()
        .flatten()
    {
        fields.push(address.first_name.clone());
        fields.push(address.last_name.clone());
        if let Some(email) = &address.email {
            fields.push(email.clone());
        }
    }
    fields
}

fn tracking_fields(order: &Order) -> Vec<String> {
    let mut fields = Vec::new();
    if let Some(shipment) = &order.shipment {
        if let Some(code) = &shipment.tracking_code {
            fields.push(code.clone());
        }
        fields.push(shipment.provider.as_str().to_string());
    }
    fields
}

fn source_fields(order: &Order) -> Vec<String> {
    order
        .items
        .iter()
        .filter_map(|i| i.source.clone())
        .collect()
}

/// All searchable strings for an order, restricted to the given scope
fn scoped_haystacks(order: &Order, scope: FieldScope) -> Vec<String> {
    match scope {
        FieldScope::All => {
            let mut fields = vec![order.id.clone()];
            fields.extend(order.client_id.clone());
            fields.extend(order.payment_intent_id.clone());
            fields.extend(item_name_fields(order));
            fields.extend(contact_fields(order));
            fields.extend(tracking_fields(order));
            fields.extend(source_fields(order));
            fields
        }
        FieldScope::OrderId => vec![order.id.clone()],
        FieldScope::ClientId => order.client_id.clone().into_iter().collect(),
        FieldScope::PaymentIntent => order.payment_intent_id.clone().into_iter().collect(),
        FieldScope::Contact => contact_fields(order),
        FieldScope::ItemName => item_name_fields(order),
        FieldScope::Tracking => tracking_fields(order),
    }
}
