//! HttpOrderStore — HTTP client for the order document store's CRUD API

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use shared::models::Order;
use std::time::Duration;

use super::{ExportFormat, OrderStore, PageMeta, RefundOutcome, ShipmentRequest, StoreError};

/// HTTP client for the order store API
pub struct HttpOrderStore {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    orders: Vec<Order>,
    meta: PageMeta,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefundRequest<'a> {
    amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

impl HttpOrderStore {
    /// Create a new store client
    ///
    /// `base_url` is the root of the store API (e.g. "http://store:4000");
    /// trailing slashes are stripped.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a transport-level failure; the request may not have reached the
    /// store at all, so this is always retryable from the caller's side.
    fn transport_error(e: reqwest::Error) -> StoreError {
        StoreError::Unavailable(e.to_string())
    }

    async fn check_status(
        response: reqwest::Response,
        id: &str,
    ) -> Result<reqwest::Response, StoreError> {
        match response.status() {
            s if s.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(id.to_string())),
            s => {
                let body = response.text().await.unwrap_or_default();
                Err(StoreError::Unexpected(format!("HTTP {s}: {body}")))
            }
        }
    }
}

#[async_trait]
impl OrderStore for HttpOrderStore {
    async fn list_orders(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<Order>, PageMeta), StoreError> {
        let response = self
            .client
            .get(self.url("/orders"))
            .query(&[("page", page), ("pageSize", page_size)])
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::check_status(response, "order list").await?;
        let list: ListResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Unexpected(e.to_string()))?;

        Ok((list.orders, list.meta))
    }

    async fn delete_order(&self, id: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.url(&format!("/orders/{id}")))
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::check_status(response, id).await?;
        Ok(())
    }

    async fn refund_order(
        &self,
        id: &str,
        amount: f64,
        reason: Option<&str>,
    ) -> Result<RefundOutcome, StoreError> {
        let response = self
            .client
            .post(self.url(&format!("/orders/{id}/refund")))
            .json(&RefundRequest { amount, reason })
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::check_status(response, id).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Unexpected(e.to_string()))
    }

    async fn add_shipment(
        &self,
        id: &str,
        shipment: &ShipmentRequest,
    ) -> Result<Order, StoreError> {
        let response = self
            .client
            .post(self.url(&format!("/orders/{id}/shipment")))
            .json(shipment)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::check_status(response, id).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Unexpected(e.to_string()))
    }

    async fn export_orders(&self, format: ExportFormat) -> Result<Vec<u8>, StoreError> {
        let response = self
            .client
            .get(self.url("/orders/export"))
            .query(&[("format", format.as_str())])
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::check_status(response, "order export").await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::Unexpected(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}
