//! Order API Module
//!
//! Admin surface over the in-memory order set. Reads are served from
//! memory; mutations persist to the external store first.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        // List / search / filter (paginated)
        .route("/", get(handler::list))
        // Dashboard statistics
        .route("/stats", get(handler::stats))
        // Full-set export (rendered by the store)
        .route("/export", get(handler::export))
        // Full resync from the store
        .route("/reload", post(handler::reload))
        // Order detail / delete
        .route("/{id}", get(handler::get_by_id).delete(handler::remove))
        // Refund (partial or full)
        .route("/{id}/refund", post(handler::refund))
        // Shipment assignment
        .route("/{id}/shipment", post(handler::ship))
}
