//! Maps a raw scanned string to the order item it represents.

use crate::api::OrderService;
use crate::model::Order;
use anyhow::Result;
use tracing::instrument;

/// Resolve `code` against the active order: exact SKU match first, then the
/// item's own barcode, then a reverse lookup through the inventory
/// collaborator. `None` means "item not in order" — a normal, reportable
/// condition. Read-only; never touches the scan ledger.
#[instrument(skip(svc, order))]
pub async fn resolve(svc: &dyn OrderService, order: &Order, code: &str) -> Result<Option<String>> {
    if order.items.iter().any(|i| i.sku == code) {
        return Ok(Some(code.to_string()));
    }
    if let Some(item) = order.items.iter().find(|i| i.barcode.as_deref() == Some(code)) {
        return Ok(Some(item.sku.clone()));
    }
    if let Some(inv) = svc.inventory_by_barcode(code).await? {
        if order.items.iter().any(|i| i.sku == inv.sku) {
            return Ok(Some(inv.sku));
        }
    }
    Ok(None)
}
