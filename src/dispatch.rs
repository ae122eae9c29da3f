//! The two-step persistence boundary: shipping-label save, then the
//! authoritative dispatch commit, plus the local history and the refresh
//! event emitted when the pool of pending orders changes.

use crate::api::OrderService;
use crate::db::{self, Pool};
use crate::model::Order;
use anyhow::Result;
use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

/// Emitted whenever the pending-order pool changed server-side, so any view
/// holding a cached listing knows to refresh. Consumers subscribe via
/// [`Committer::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationEvent {
    PendingInvalidated,
}

pub struct Committer {
    events: broadcast::Sender<StationEvent>,
}

impl Committer {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self { events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StationEvent> {
        self.events.subscribe()
    }

    /// Persist the scanned shipping label. Must succeed before the session
    /// may enter confirmation; on failure the caller stays in label capture
    /// and the scanned value is dropped.
    #[instrument(skip(self, svc))]
    pub async fn save_label(
        &self,
        svc: &dyn OrderService,
        order_id: &str,
        label: &str,
    ) -> Result<Order> {
        svc.save_shipping_label(order_id, label).await
    }

    /// Finalize the dispatch server-side, then append the local history row
    /// and emit the refresh event. A commit failure leaves nothing appended
    /// and no event sent; the operator retries or cancels. The history row is
    /// display-only and the server stays authoritative, so once the commit
    /// has succeeded a failed append must not fail the dispatch — retrying it
    /// would re-commit an already-dispatched order.
    #[instrument(skip_all, fields(order_id = %order.id))]
    pub async fn commit(
        &self,
        svc: &dyn OrderService,
        pool: &Pool,
        order: &Order,
        scanned_codes: &[String],
        operator: &str,
    ) -> Result<Order> {
        let committed = svc
            .commit_dispatch(&order.id, scanned_codes, operator)
            .await?;
        let dispatched_at = committed.dispatched_at.unwrap_or_else(Utc::now);
        if let Err(err) = db::append_dispatch(pool, &committed, operator, dispatched_at).await {
            warn!(?err, "failed to append dispatch history");
        }
        info!(
            order_number = %committed.order_number,
            codes = scanned_codes.len(),
            "dispatch committed"
        );
        let _ = self.events.send(StationEvent::PendingInvalidated);
        Ok(committed)
    }

    /// Admin bulk delete of all pending orders; also invalidates listings.
    #[instrument(skip_all)]
    pub async fn purge_pending(&self, svc: &dyn OrderService) -> Result<u64> {
        let deleted = svc.delete_pending_orders().await?;
        let _ = self.events.send(StationEvent::PendingInvalidated);
        Ok(deleted)
    }
}

impl Default for Committer {
    fn default() -> Self {
        Self::new()
    }
}
