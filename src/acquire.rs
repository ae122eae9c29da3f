//! Resolving a scanned code to zero, one, or many candidate orders.

use crate::api::OrderService;
use crate::model::Order;
use anyhow::Result;
use futures::future::join_all;
use tracing::{instrument, warn};

/// Outcome of an order lookup while locating. `Many` is surfaced to the
/// operator as a disambiguation list; nothing is auto-selected.
#[derive(Debug)]
pub enum Acquisition {
    None,
    One(Box<Order>),
    Many(Vec<Order>),
}

#[instrument(skip(svc))]
pub async fn acquire(svc: &dyn OrderService, code: &str) -> Result<Acquisition> {
    let mut orders = svc.find_pending_by_code(code).await?;
    Ok(match orders.len() {
        0 => Acquisition::None,
        1 => Acquisition::One(Box::new(orders.remove(0))),
        _ => Acquisition::Many(orders),
    })
}

/// Fill missing item display fields (name, images, listing URL) from the
/// inventory collaborator at acquisition time. Quantities are never touched,
/// and a failed lookup only costs the display data, so failures are logged
/// and skipped.
#[instrument(skip_all)]
pub async fn enrich(svc: &dyn OrderService, order: &mut Order) {
    let lookups: Vec<(usize, String)> = order
        .items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.name.is_none() || item.image_url.is_none())
        .filter_map(|(idx, item)| item.barcode.clone().map(|b| (idx, b)))
        .collect();
    if lookups.is_empty() {
        return;
    }

    let results = join_all(
        lookups
            .iter()
            .map(|(_, barcode)| svc.inventory_by_barcode(barcode)),
    )
    .await;

    for ((idx, barcode), result) in lookups.into_iter().zip(results) {
        let inv = match result {
            Ok(Some(inv)) => inv,
            Ok(None) => continue,
            Err(err) => {
                warn!(?err, barcode, "inventory enrichment lookup failed");
                continue;
            }
        };
        let item = &mut order.items[idx];
        if item.name.is_none() {
            item.name = inv.name;
        }
        if item.image_url.is_none() {
            item.image_url = inv.image_url;
        }
        if item.listing_url.is_none() {
            item.listing_url = inv.listing_url;
        }
    }
}
