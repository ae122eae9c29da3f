//! Display-side behavior: acquisition-time enrichment, the status view, and
//! the local dispatch history view.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use scan_station::acquire;
use scan_station::api::OrderService;
use scan_station::db;
use scan_station::model::{InventoryItem, Order, OrderItem, OrderStatus};
use std::collections::HashMap;

struct FixedInventory {
    by_barcode: HashMap<String, InventoryItem>,
    fail: bool,
}

#[async_trait]
impl OrderService for FixedInventory {
    async fn find_pending_by_code(&self, _code: &str) -> Result<Vec<Order>> {
        Ok(Vec::new())
    }
    async fn list_pending(&self) -> Result<Vec<Order>> {
        Ok(Vec::new())
    }
    async fn inventory_by_barcode(&self, barcode: &str) -> Result<Option<InventoryItem>> {
        if self.fail {
            anyhow::bail!("inventory unavailable");
        }
        Ok(self.by_barcode.get(barcode).cloned())
    }
    async fn save_shipping_label(&self, _order_id: &str, _label: &str) -> Result<Order> {
        unreachable!()
    }
    async fn commit_dispatch(
        &self,
        _order_id: &str,
        _scanned_codes: &[String],
        _operator: &str,
    ) -> Result<Order> {
        unreachable!()
    }
    async fn delete_pending_orders(&self) -> Result<u64> {
        unreachable!()
    }
}

fn item(sku: &str, barcode: Option<&str>, name: Option<&str>) -> OrderItem {
    OrderItem {
        sku: sku.into(),
        barcode: barcode.map(Into::into),
        quantity: 1,
        name: name.map(Into::into),
        image_url: None,
        listing_url: None,
    }
}

fn order(items: Vec<OrderItem>) -> Order {
    Order {
        id: "o1".into(),
        order_number: "1001".into(),
        status: OrderStatus::Pending,
        items,
        shipping_label: None,
        dispatched_at: None,
        buyer_name: None,
        buyer_note: None,
    }
}

#[tokio::test]
async fn enrichment_fills_missing_display_fields_only() {
    let mut by_barcode = HashMap::new();
    by_barcode.insert(
        "A-bar".to_string(),
        InventoryItem {
            sku: "A".into(),
            barcode: Some("A-bar".into()),
            name: Some("Widget A".into()),
            image_url: Some("https://cdn/a.jpg".into()),
            listing_url: None,
        },
    );
    let svc = FixedInventory {
        by_barcode,
        fail: false,
    };

    let mut o = order(vec![
        item("A", Some("A-bar"), None),
        item("B", Some("B-bar"), None),   // barcode unknown to inventory
        item("C", None, None),            // no barcode, cannot be enriched
        item("D", Some("A-bar"), Some("Kept")), // already named
    ]);
    acquire::enrich(&svc, &mut o).await;

    assert_eq!(o.items[0].name.as_deref(), Some("Widget A"));
    assert_eq!(o.items[0].image_url.as_deref(), Some("https://cdn/a.jpg"));
    assert!(o.items[1].name.is_none());
    assert!(o.items[2].name.is_none());
    assert_eq!(o.items[3].name.as_deref(), Some("Kept"));
    // Quantities untouched.
    assert!(o.items.iter().all(|i| i.quantity == 1));
}

#[tokio::test]
async fn enrichment_failures_are_non_fatal() {
    let svc = FixedInventory {
        by_barcode: HashMap::new(),
        fail: true,
    };
    let mut o = order(vec![item("A", Some("A-bar"), None)]);
    acquire::enrich(&svc, &mut o).await;
    assert!(o.items[0].name.is_none());
}

#[tokio::test]
async fn history_keeps_every_commit_in_order() {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    for n in 0..3 {
        let mut o = order(vec![item("A", None, None)]);
        o.id = format!("o{n}");
        o.order_number = format!("10{n}");
        o.status = OrderStatus::Dispatched;
        db::append_dispatch(&pool, &o, "op-1", Utc::now()).await.unwrap();
    }

    let recent = db::recent_dispatches(&pool, 2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].order_number, "102");
    assert_eq!(recent[1].order_number, "101");
}
