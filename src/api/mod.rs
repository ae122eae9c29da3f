//! HTTP client for the order/inventory backend.
//!
//! The station talks to the backend through the `OrderService` trait so the
//! driver and the test suite can swap in a recording mock; `ApiClient` is the
//! real reqwest implementation.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::warn;

use crate::config::Config;
use crate::model::{InventoryItem, Order};

pub mod model;

use model::{build_dispatch_request, build_label_request, DeleteResp, InventoryDoc, OrderDoc};

/// Everything the station needs from the outside world: order lookup and
/// listing, inventory reverse lookup, the two-step dispatch persistence, and
/// the admin bulk delete.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// All pending orders whose items match `code` by SKU or barcode.
    async fn find_pending_by_code(&self, code: &str) -> Result<Vec<Order>>;

    async fn list_pending(&self) -> Result<Vec<Order>>;

    /// Reverse lookup of a physical barcode to its owning catalog entry.
    async fn inventory_by_barcode(&self, barcode: &str) -> Result<Option<InventoryItem>>;

    async fn save_shipping_label(&self, order_id: &str, label: &str) -> Result<Order>;

    /// Authoritative dispatch finalization; the server re-validates quantities
    /// and applies inventory effects.
    async fn commit_dispatch(
        &self,
        order_id: &str,
        scanned_codes: &[String],
        operator: &str,
    ) -> Result<Order>;

    /// Admin-only: remove all pending orders, returning how many were deleted.
    async fn delete_pending_orders(&self) -> Result<u64>;
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, token: String) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid backend base URL")?;
        let http = Client::builder()
            .user_agent("scan-station/0.1")
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(&cfg.server.base_url, cfg.server.token.clone())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid endpoint path {path}"))
    }

    async fn read_json<T: DeserializeOwned>(&self, res: reqwest::Response) -> Result<T> {
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, body, "backend error response");
            return Err(anyhow!("backend error {}: {}", status, body));
        }
        res.json::<T>().await.context("invalid backend response JSON")
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let res = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("failed to reach backend")?;
        self.read_json(res).await
    }
}

#[async_trait]
impl OrderService for ApiClient {
    async fn find_pending_by_code(&self, code: &str) -> Result<Vec<Order>> {
        let mut url = self.endpoint("v1/orders/pending")?;
        url.query_pairs_mut().append_pair("code", code);
        let docs: Vec<OrderDoc> = self.get_json(url).await?;
        Ok(docs.into_iter().map(OrderDoc::into_order).collect())
    }

    async fn list_pending(&self) -> Result<Vec<Order>> {
        let url = self.endpoint("v1/orders/pending")?;
        let docs: Vec<OrderDoc> = self.get_json(url).await?;
        Ok(docs.into_iter().map(OrderDoc::into_order).collect())
    }

    async fn inventory_by_barcode(&self, barcode: &str) -> Result<Option<InventoryItem>> {
        let url = self.endpoint(&format!("v1/inventory/barcode/{barcode}"))?;
        let res = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("failed to reach backend")?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let doc: InventoryDoc = self.read_json(res).await?;
        Ok(Some(doc.into_inventory()))
    }

    async fn save_shipping_label(&self, order_id: &str, label: &str) -> Result<Order> {
        let url = self.endpoint(&format!("v1/orders/{order_id}/shipping-label"))?;
        let res = self
            .http
            .put(url)
            .bearer_auth(&self.token)
            .json(&build_label_request(label))
            .send()
            .await
            .context("failed to reach backend")?;
        let doc: OrderDoc = self.read_json(res).await?;
        Ok(doc.into_order())
    }

    async fn commit_dispatch(
        &self,
        order_id: &str,
        scanned_codes: &[String],
        operator: &str,
    ) -> Result<Order> {
        let url = self.endpoint(&format!("v1/orders/{order_id}/dispatch"))?;
        let res = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&build_dispatch_request(scanned_codes, operator))
            .send()
            .await
            .context("failed to reach backend")?;
        let doc: OrderDoc = self.read_json(res).await?;
        Ok(doc.into_order())
    }

    async fn delete_pending_orders(&self) -> Result<u64> {
        let url = self.endpoint("v1/orders/pending")?;
        let res = self
            .http
            .delete(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("failed to reach backend")?;
        let resp: DeleteResp = self.read_json(res).await?;
        Ok(resp.deleted)
    }
}
