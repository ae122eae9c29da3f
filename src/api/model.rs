//! Wire models for the fulfillment backend JSON API.
//!
//! Keep these structs mirroring the server payloads exactly; conversion into
//! the domain types in `crate::model` happens here so callers never see the
//! camelCase wire shape.

use crate::model::{InventoryItem, Order, OrderItem, OrderStatus};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDoc {
    pub id: String,
    pub order_number: String,
    pub status: String,
    #[serde(default)]
    pub items: Vec<OrderItemDoc>,
    #[serde(default)]
    pub shipping_label: Option<String>,
    #[serde(default)]
    pub dispatched_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub buyer_name: Option<String>,
    #[serde(default)]
    pub buyer_note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDoc {
    pub sku: String,
    #[serde(default)]
    pub barcode: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub listing_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDoc {
    pub sku: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub listing_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteResp {
    pub deleted: u64,
}

impl OrderDoc {
    /// Unknown status strings are treated as still pending so a server-side
    /// addition never makes an order silently vanish from the station.
    pub fn into_order(self) -> Order {
        Order {
            id: self.id,
            order_number: self.order_number,
            status: OrderStatus::parse_status(&self.status).unwrap_or(OrderStatus::Pending),
            items: self.items.into_iter().map(OrderItemDoc::into_item).collect(),
            shipping_label: self.shipping_label,
            dispatched_at: self.dispatched_at,
            buyer_name: self.buyer_name,
            buyer_note: self.buyer_note,
        }
    }
}

impl OrderItemDoc {
    pub fn into_item(self) -> OrderItem {
        OrderItem {
            sku: self.sku,
            barcode: self.barcode,
            quantity: self.quantity,
            name: self.name,
            image_url: self.image_url,
            listing_url: self.listing_url,
        }
    }
}

impl InventoryDoc {
    pub fn into_inventory(self) -> InventoryItem {
        InventoryItem {
            sku: self.sku,
            barcode: self.barcode,
            name: self.name,
            image_url: self.image_url,
            listing_url: self.listing_url,
        }
    }
}

pub fn build_label_request(label: &str) -> Value {
    json!({ "shippingLabel": label })
}

pub fn build_dispatch_request(scanned_codes: &[String], operator: &str) -> Value {
    json!({
        "scannedCodes": scanned_codes,
        "operator": operator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_doc_converts_to_domain() {
        let doc: OrderDoc = serde_json::from_value(json!({
            "id": "ord-1",
            "orderNumber": "1001",
            "status": "PENDING",
            "items": [
                { "sku": "A", "barcode": "A-bar", "quantity": 2, "name": "Widget" },
                { "sku": "B", "quantity": 1 }
            ],
            "buyerName": "Jo"
        }))
        .unwrap();

        let order = doc.into_order();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].barcode.as_deref(), Some("A-bar"));
        assert!(order.items[1].barcode.is_none());
        assert_eq!(order.buyer_name.as_deref(), Some("Jo"));
    }

    #[test]
    fn unknown_status_defaults_to_pending() {
        let doc: OrderDoc = serde_json::from_value(json!({
            "id": "ord-2",
            "orderNumber": "1002",
            "status": "ON_HOLD",
        }))
        .unwrap();
        assert_eq!(doc.into_order().status, OrderStatus::Pending);
    }

    #[test]
    fn dispatch_request_carries_codes_and_operator() {
        let codes = vec!["A-1".to_string(), "B-1".to_string()];
        let body = build_dispatch_request(&codes, "station-1");
        assert_eq!(body["scannedCodes"][0], "A-1");
        assert_eq!(body["scannedCodes"][1], "B-1");
        assert_eq!(body["operator"], "station-1");
    }

    #[test]
    fn label_request_shape() {
        let body = build_label_request("LBL-42");
        assert_eq!(body["shippingLabel"], "LBL-42");
    }
}
