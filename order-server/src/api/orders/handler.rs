//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use shared::models::Order;
use shared::response::ApiResponse;

use crate::core::ServerState;
use crate::orders::{FieldScope, OrderPage, OrderStats, ReloadOutcome, SearchQuery, StatusFilter};
use crate::store::{ExportFormat, ShipmentRequest};
use crate::utils::{AppError, AppResult};

/// Query params for listing/searching orders
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Free-text search; empty lists everything
    #[serde(default)]
    pub q: String,
    /// Field scope restriction (defaults to all fields)
    #[serde(default)]
    pub scope: FieldScope,
    /// Status filter (`all` or a status wire name)
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    pub page_size: Option<u32>,
}

fn default_page() -> u32 {
    1
}

/// List, search and filter orders (paginated)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<OrderPage>> {
    let status = match query.status.as_deref() {
        Some(s) => StatusFilter::parse(s)
            .ok_or_else(|| AppError::validation(format!("Unknown status filter: {s}")))?,
        None => StatusFilter::All,
    };

    let search = SearchQuery {
        text: query.q,
        scope: query.scope,
        status,
    };
    let page_size = query.page_size.unwrap_or(state.config.default_page_size);

    Ok(Json(state.service.query(&search, query.page, page_size)))
}

/// Get order by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state.service.get(&id)?;
    Ok(Json(order))
}

/// Dashboard statistics over the loaded set
pub async fn stats(State(state): State<ServerState>) -> Json<OrderStats> {
    Json(state.service.stats())
}

/// Trigger a full resync from the store
pub async fn reload(State(state): State<ServerState>) -> AppResult<Json<ReloadOutcome>> {
    let outcome = state.service.reload(&state.shutdown).await?;
    Ok(Json(outcome))
}

/// Refund request payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub amount: f64,
    pub reason: Option<String>,
}

/// Refund part or all of an order
pub async fn refund(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RefundRequest>,
) -> AppResult<Json<Order>> {
    let order = state
        .service
        .request_refund(&id, payload.amount, payload.reason)
        .await?;
    Ok(Json(order))
}

/// Assign a shipment to an order
pub async fn ship(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ShipmentRequest>,
) -> AppResult<Json<Order>> {
    let order = state.service.assign_shipment(&id, payload).await?;
    Ok(Json(order))
}

/// Delete an order
pub async fn remove(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.service.delete(&id).await?;
    Ok(Json(ApiResponse::ok_with_message((), "Order deleted")))
}

/// Export query params
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: String,
}

/// Export the full order set as CSV or PDF (rendered by the store)
pub async fn export(
    State(state): State<ServerState>,
    Query(query): Query<ExportQuery>,
) -> AppResult<impl IntoResponse> {
    let format = ExportFormat::parse(&query.format)
        .ok_or_else(|| AppError::validation(format!("Unknown export format: {}", query.format)))?;

    let data = state.service.export(format).await?;
    Ok((
        [(http::header::CONTENT_TYPE, format.content_type())],
        data,
    ))
}
