//! Session state and the phase transition rules for one in-flight order.
//!
//! The session is a plain state object mutated by synchronous, infallible
//! transition methods; all collaborator I/O (order lookup, inventory lookup,
//! label save, dispatch commit) happens in the driver before or after a
//! transition. This keeps the phase table and the scan ledger invariants
//! testable without any transport harness.

use crate::model::{Order, Phase};
use std::collections::HashMap;

/// Result of applying one scan (or one manual confirmation) to the session.
/// Rejections leave the scan ledger untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Accepted {
        sku: String,
        scanned: u32,
        required: u32,
        /// All items met their quantity; the session moved to label capture.
        complete: bool,
    },
    AlreadyScanned {
        code: String,
    },
    NotInOrder {
        code: String,
    },
    QuantityExceeded {
        sku: String,
        scanned: u32,
        required: u32,
    },
}

/// Per-SKU progress line for operator display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemProgress {
    pub sku: String,
    pub scanned: u32,
    pub required: u32,
}

/// Scan ledger and phase for exactly one order at a time.
#[derive(Debug, Default)]
pub struct Session {
    phase: Phase,
    order: Option<Order>,
    scanned_codes: Vec<String>,
    scanned_counts: HashMap<String, u32>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    /// Every code consumed this session, in acceptance order.
    pub fn scanned_codes(&self) -> &[String] {
        &self.scanned_codes
    }

    pub fn scanned_count(&self, sku: &str) -> u32 {
        self.scanned_counts.get(sku).copied().unwrap_or(0)
    }

    /// Acquire `order` into the session. Single-unit orders skip item
    /// verification and go straight to label capture; everything else starts
    /// verifying with counts zeroed for every SKU.
    pub fn begin(&mut self, order: Order) -> Phase {
        self.scanned_codes.clear();
        self.scanned_counts = order.items.iter().map(|i| (i.sku.clone(), 0)).collect();
        self.phase = if order.total_required() == 1 {
            Phase::CapturingLabel
        } else {
            Phase::VerifyingItems
        };
        self.order = Some(order);
        self.phase
    }

    /// Apply one resolved barcode scan while verifying items.
    ///
    /// `resolved_sku` is the resolver's answer for `code` (None when the code
    /// belongs to no item of the active order). Checks run in order: duplicate,
    /// not-in-order, quantity; only an accepted scan touches the ledger.
    pub fn apply_scan(&mut self, code: &str, resolved_sku: Option<&str>) -> VerifyOutcome {
        debug_assert_eq!(self.phase, Phase::VerifyingItems);
        if self.scanned_codes.iter().any(|c| c == code) {
            return VerifyOutcome::AlreadyScanned { code: code.to_string() };
        }
        let Some(sku) = resolved_sku else {
            return VerifyOutcome::NotInOrder { code: code.to_string() };
        };
        self.confirm_sku(sku, code.to_string())
    }

    /// Manual confirmation for a SKU with no physical barcode.
    ///
    /// Deliberately skips the duplicate check a barcode scan performs; repeated
    /// manual confirms for the same SKU are bounded by the quantity check
    /// alone. Each confirm consumes a distinct ledger token so the code set
    /// still grows one-for-one with the counts.
    pub fn confirm_manual(&mut self, sku: &str) -> VerifyOutcome {
        debug_assert_eq!(self.phase, Phase::VerifyingItems);
        if self.order.as_ref().and_then(|o| o.item(sku)).is_none() {
            return VerifyOutcome::NotInOrder { code: sku.to_string() };
        }
        let token = format!("manual:{}:{}", sku, self.scanned_count(sku) + 1);
        self.confirm_sku(sku, token)
    }

    fn confirm_sku(&mut self, sku: &str, code: String) -> VerifyOutcome {
        let order = self.order.as_ref().expect("verifying without active order");
        let required = match order.item(sku) {
            Some(item) => item.quantity,
            None => return VerifyOutcome::NotInOrder { code },
        };
        let scanned = self.scanned_count(sku);
        if scanned >= required {
            return VerifyOutcome::QuantityExceeded {
                sku: sku.to_string(),
                scanned,
                required,
            };
        }

        let scanned = scanned + 1;
        self.scanned_counts.insert(sku.to_string(), scanned);
        self.scanned_codes.push(code);

        let complete = self.is_complete();
        if complete {
            self.phase = Phase::CapturingLabel;
        }
        VerifyOutcome::Accepted {
            sku: sku.to_string(),
            scanned,
            required,
            complete,
        }
    }

    /// True once every item has met its required quantity.
    pub fn is_complete(&self) -> bool {
        match &self.order {
            Some(order) => order
                .items
                .iter()
                .all(|i| self.scanned_count(&i.sku) >= i.quantity),
            None => false,
        }
    }

    /// Progress for items still missing units, for operator display.
    pub fn remaining(&self) -> Vec<ItemProgress> {
        let Some(order) = &self.order else {
            return Vec::new();
        };
        order
            .items
            .iter()
            .filter(|i| self.scanned_count(&i.sku) < i.quantity)
            .map(|i| ItemProgress {
                sku: i.sku.clone(),
                scanned: self.scanned_count(&i.sku),
                required: i.quantity,
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<ItemProgress> {
        let Some(order) = &self.order else {
            return Vec::new();
        };
        order
            .items
            .iter()
            .map(|i| ItemProgress {
                sku: i.sku.clone(),
                scanned: self.scanned_count(&i.sku),
                required: i.quantity,
            })
            .collect()
    }

    /// A successful label save moves the session to the final confirmation.
    pub fn label_saved(&mut self, label: &str) {
        debug_assert_eq!(self.phase, Phase::CapturingLabel);
        if let Some(order) = self.order.as_mut() {
            order.shipping_label = Some(label.to_string());
        }
        self.phase = Phase::Confirming;
    }

    /// Discard everything and return to locating. Used by cancel and after a
    /// successful dispatch commit; performs no persistence of its own.
    pub fn reset(&mut self) {
        self.phase = Phase::Locating;
        self.order = None;
        self.scanned_codes.clear();
        self.scanned_counts.clear();
    }

    /// Ledger invariants: counts bounded by quantities, codes unique, and the
    /// code set growing one-for-one with the count sum.
    #[cfg(test)]
    fn assert_ledger(&self) {
        let order = self.order.as_ref().expect("ledger without order");
        for item in &order.items {
            assert!(self.scanned_count(&item.sku) <= item.quantity);
        }
        let mut seen = std::collections::HashSet::new();
        for code in &self.scanned_codes {
            assert!(seen.insert(code), "code consumed twice: {code}");
        }
        let sum: u32 = self.scanned_counts.values().sum();
        assert_eq!(self.scanned_codes.len() as u32, sum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderItem, OrderStatus};

    fn item(sku: &str, barcode: Option<&str>, qty: u32) -> OrderItem {
        OrderItem {
            sku: sku.into(),
            barcode: barcode.map(Into::into),
            quantity: qty,
            name: None,
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

    #[test]
    fn begin_multi_unit_starts_verifying() {
        let mut s = Session::new();
        let phase = s.begin(order(vec![item("A", None, 2), item("B", None, 1)]));
        assert_eq!(phase, Phase::VerifyingItems);
        assert_eq!(s.scanned_count("A"), 0);
        assert_eq!(s.remaining().len(), 2);
    }

    #[test]
    fn single_unit_order_skips_verification() {
        let mut s = Session::new();
        let phase = s.begin(order(vec![item("C", None, 1)]));
        assert_eq!(phase, Phase::CapturingLabel);
    }

    #[test]
    fn full_verification_walk() {
        let mut s = Session::new();
        s.begin(order(vec![item("A", None, 2), item("B", None, 1)]));

        assert_eq!(
            s.apply_scan("A-barcode-1", Some("A")),
            VerifyOutcome::Accepted {
                sku: "A".into(),
                scanned: 1,
                required: 2,
                complete: false
            }
        );
        s.assert_ledger();

        // Same physical code again is a duplicate, count unchanged.
        assert_eq!(
            s.apply_scan("A-barcode-1", Some("A")),
            VerifyOutcome::AlreadyScanned {
                code: "A-barcode-1".into()
            }
        );
        assert_eq!(s.scanned_count("A"), 1);
        s.assert_ledger();

        assert_eq!(
            s.apply_scan("A-barcode-2", Some("A")),
            VerifyOutcome::Accepted {
                sku: "A".into(),
                scanned: 2,
                required: 2,
                complete: false
            }
        );

        // Final unit completes and moves to label capture.
        assert_eq!(
            s.apply_scan("B-barcode", Some("B")),
            VerifyOutcome::Accepted {
                sku: "B".into(),
                scanned: 1,
                required: 1,
                complete: true
            }
        );
        assert_eq!(s.phase(), Phase::CapturingLabel);
        s.assert_ledger();
    }

    #[test]
    fn unresolved_code_is_not_in_order() {
        let mut s = Session::new();
        s.begin(order(vec![item("A", None, 2)]));
        assert_eq!(
            s.apply_scan("mystery", None),
            VerifyOutcome::NotInOrder {
                code: "mystery".into()
            }
        );
        assert_eq!(s.scanned_codes().len(), 0);
    }

    #[test]
    fn duplicate_check_runs_before_resolution() {
        let mut s = Session::new();
        s.begin(order(vec![item("A", None, 2)]));
        s.apply_scan("X", Some("A"));
        // The same code reported as duplicate even if resolution now fails.
        assert_eq!(
            s.apply_scan("X", None),
            VerifyOutcome::AlreadyScanned { code: "X".into() }
        );
    }

    #[test]
    fn quantity_exceeded_rejects_extra_unit() {
        let mut s = Session::new();
        s.begin(order(vec![item("D", None, 1), item("E", None, 2)]));
        s.apply_scan("D-1", Some("D"));
        assert_eq!(
            s.apply_scan("D-2", Some("D")),
            VerifyOutcome::QuantityExceeded {
                sku: "D".into(),
                scanned: 1,
                required: 1
            }
        );
        assert_eq!(s.scanned_count("D"), 1);
        s.assert_ledger();
    }

    #[test]
    fn manual_confirm_repeats_up_to_quantity() {
        let mut s = Session::new();
        s.begin(order(vec![item("NOBAR", None, 2), item("B", None, 1)]));

        // No duplicate check on the manual path; only the quantity bound.
        assert!(matches!(
            s.confirm_manual("NOBAR"),
            VerifyOutcome::Accepted { scanned: 1, .. }
        ));
        assert!(matches!(
            s.confirm_manual("NOBAR"),
            VerifyOutcome::Accepted { scanned: 2, .. }
        ));
        assert_eq!(
            s.confirm_manual("NOBAR"),
            VerifyOutcome::QuantityExceeded {
                sku: "NOBAR".into(),
                scanned: 2,
                required: 2
            }
        );
        s.assert_ledger();
    }

    #[test]
    fn manual_confirm_unknown_sku_rejected() {
        let mut s = Session::new();
        s.begin(order(vec![item("A", None, 2)]));
        assert_eq!(
            s.confirm_manual("Z"),
            VerifyOutcome::NotInOrder { code: "Z".into() }
        );
    }

    #[test]
    fn label_save_then_reset() {
        let mut s = Session::new();
        s.begin(order(vec![item("C", None, 1)]));
        assert_eq!(s.phase(), Phase::CapturingLabel);
        s.label_saved("LBL-123");
        assert_eq!(s.phase(), Phase::Confirming);
        assert_eq!(
            s.order().unwrap().shipping_label.as_deref(),
            Some("LBL-123")
        );

        s.reset();
        assert_eq!(s.phase(), Phase::Locating);
        assert!(s.order().is_none());
        assert!(s.scanned_codes().is_empty());
    }
}
