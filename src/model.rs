use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Dispatched,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Dispatched => "DISPATCHED",
        }
    }

    pub fn parse_status(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OrderStatus::Pending),
            "DISPATCHED" => Some(OrderStatus::Dispatched),
            _ => None,
        }
    }
}

/// Step of the fulfillment workflow the station is currently in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Locating,
    VerifyingItems,
    CapturingLabel,
    Confirming,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Locating => "LOCATING",
            Phase::VerifyingItems => "VERIFYING_ITEMS",
            Phase::CapturingLabel => "CAPTURING_LABEL",
            Phase::Confirming => "CONFIRMING",
        }
    }
}

/// One required line of an order. `quantity` is fixed once the order is
/// acquired into a session; scanning never mutates it. `barcode` is absent
/// when no physical barcode exists for the unit type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItem {
    pub sku: String,
    pub barcode: Option<String>,
    pub quantity: u32,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub listing_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub shipping_label: Option<String>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub buyer_name: Option<String>,
    pub buyer_note: Option<String>,
}

impl Order {
    /// Sum of required unit quantities across all items.
    pub fn total_required(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn item(&self, sku: &str) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.sku == sku)
    }
}

/// Catalog entry returned by the inventory collaborator for a barcode lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryItem {
    pub sku: String,
    pub barcode: Option<String>,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub listing_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(sku: &str, qty: u32) -> OrderItem {
        OrderItem {
            sku: sku.into(),
            barcode: None,
            quantity: qty,
            name: None,
            image_url: None,
            listing_url: None,
        }
    }

    #[test]
    fn total_required_sums_quantities() {
        let order = Order {
            id: "o1".into(),
            order_number: "1001".into(),
            status: OrderStatus::Pending,
            items: vec![item("A", 2), item("B", 1)],
            shipping_label: None,
            dispatched_at: None,
            buyer_name: None,
            buyer_note: None,
        };
        assert_eq!(order.total_required(), 3);
        assert!(order.item("A").is_some());
        assert!(order.item("C").is_none());
    }

    #[test]
    fn status_round_trips() {
        assert_eq!(OrderStatus::parse_status("PENDING"), Some(OrderStatus::Pending));
        assert_eq!(
            OrderStatus::parse_status(OrderStatus::Dispatched.as_str()),
            Some(OrderStatus::Dispatched)
        );
        assert_eq!(OrderStatus::parse_status("SHIPPED"), None);
    }
}
