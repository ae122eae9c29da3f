//! Station input driver: one stdin line in, operator-visible reply lines out.
//!
//! Lines starting with `/` are commands; anything else is treated as a scan
//! and dispatched by the current phase. Collaborator failures are converted
//! to reply lines here — nothing in the scan loop is fatal, and a rejection
//! never advances the phase.

use crate::acquire::{self, Acquisition};
use crate::api::OrderService;
use crate::db::{self, Pool};
use crate::dispatch::Committer;
use crate::model::{Order, Phase};
use crate::resolver;
use crate::session::{Session, VerifyOutcome};
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Scan guns occasionally emit partial or control-character garbage; anything
/// not matching this pattern is rejected before it reaches the state machine.
static CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 ._/#:-]*$").expect("valid code pattern"));

/// One scanning station: the active session plus the last order listing shown
/// to the operator (for `/pick` selection) and the acting operator identity.
pub struct Station {
    session: Session,
    candidates: Vec<Order>,
    operator: String,
    session_id: Option<Uuid>,
}

impl Station {
    pub fn new(operator: String) -> Self {
        Self {
            session: Session::new(),
            candidates: Vec::new(),
            operator,
            session_id: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Log-correlation id for the current session, if an order is active.
    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }
}

#[instrument(skip_all)]
pub async fn handle_input(
    station: &mut Station,
    svc: &dyn OrderService,
    pool: &Pool,
    committer: &Committer,
    line: &str,
) -> Result<Vec<String>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(rest) = trimmed.strip_prefix('/') {
        return handle_command(station, svc, pool, committer, rest).await;
    }
    // A shipping label is accepted verbatim, whatever the symbology emits;
    // only order/item scans go through the code pattern.
    if station.session.phase() != Phase::CapturingLabel && !CODE_RE.is_match(trimmed) {
        return Ok(vec!["Unreadable code.".to_string()]);
    }
    handle_scan(station, svc, committer, trimmed).await
}

async fn handle_command(
    station: &mut Station,
    svc: &dyn OrderService,
    pool: &Pool,
    committer: &Committer,
    rest: &str,
) -> Result<Vec<String>> {
    let mut parts = rest.split_whitespace();
    let cmd = parts.next().unwrap_or("");
    let arg = parts.next();
    match cmd {
        "orders" => list_pending(station, svc).await,
        "pick" => pick_candidate(station, svc, arg).await,
        "item" => confirm_item(station, arg),
        "confirm" => confirm_dispatch(station, svc, pool, committer).await,
        "cancel" => Ok(cancel(station)),
        "status" => Ok(status(station)),
        "history" => show_history(pool).await,
        "purge" => purge_pending(station, svc, committer).await,
        _ => Ok(vec!["Unknown command.".to_string()]),
    }
}

async fn handle_scan(
    station: &mut Station,
    svc: &dyn OrderService,
    committer: &Committer,
    code: &str,
) -> Result<Vec<String>> {
    match station.session.phase() {
        Phase::Locating => locate(station, svc, code).await,
        Phase::VerifyingItems => verify_scan(station, svc, code).await,
        Phase::CapturingLabel => capture_label(station, svc, committer, code).await,
        Phase::Confirming => Ok(vec![
            "Scanning is paused; /confirm to dispatch or /cancel.".to_string(),
        ]),
    }
}

async fn locate(
    station: &mut Station,
    svc: &dyn OrderService,
    code: &str,
) -> Result<Vec<String>> {
    match acquire::acquire(svc, code).await {
        Ok(Acquisition::None) => Ok(vec![format!("No pending order matches {code}.")]),
        Ok(Acquisition::One(order)) => Ok(begin_order(station, svc, *order).await),
        Ok(Acquisition::Many(orders)) => {
            let mut replies = vec!["Multiple orders match:".to_string()];
            for (i, order) in orders.iter().enumerate() {
                replies.push(format!(
                    "  {}. {} ({} items)",
                    i + 1,
                    order.order_number,
                    order.items.len()
                ));
            }
            replies.push("Select with /pick <n>.".to_string());
            station.candidates = orders;
            Ok(replies)
        }
        Err(err) => {
            warn!(?err, code, "order lookup failed");
            Ok(vec![format!("Order lookup failed: {err:#}")])
        }
    }
}

async fn list_pending(station: &mut Station, svc: &dyn OrderService) -> Result<Vec<String>> {
    if station.session.phase() != Phase::Locating {
        return Ok(vec![
            "Finish or /cancel the active order first.".to_string()
        ]);
    }
    let orders = match svc.list_pending().await {
        Ok(orders) => orders,
        Err(err) => {
            warn!(?err, "pending listing failed");
            return Ok(vec![format!("Order lookup failed: {err:#}")]);
        }
    };
    if orders.is_empty() {
        return Ok(vec!["No pending orders.".to_string()]);
    }
    let mut replies = vec![format!("{} pending orders:", orders.len())];
    for (i, order) in orders.iter().enumerate() {
        replies.push(format!(
            "  {}. {} ({} items, {} units)",
            i + 1,
            order.order_number,
            order.items.len(),
            order.total_required()
        ));
    }
    replies.push("Select with /pick <n>.".to_string());
    station.candidates = orders;
    Ok(replies)
}

async fn pick_candidate(
    station: &mut Station,
    svc: &dyn OrderService,
    arg: Option<&str>,
) -> Result<Vec<String>> {
    if station.session.phase() != Phase::Locating {
        return Ok(vec![
            "Finish or /cancel the active order first.".to_string()
        ]);
    }
    let Some(index) = arg.and_then(|a| a.parse::<usize>().ok()) else {
        return Ok(vec!["Usage: /pick <n>".to_string()]);
    };
    if index == 0 || index > station.candidates.len() {
        return Ok(vec![format!(
            "No such entry; {} orders listed.",
            station.candidates.len()
        )]);
    }
    let order = station.candidates[index - 1].clone();
    Ok(begin_order(station, svc, order).await)
}

/// Post-selection logic shared by direct scan acquisition, disambiguation and
/// listing selection: enrich display fields, seed the ledger, report the
/// starting phase.
async fn begin_order(station: &mut Station, svc: &dyn OrderService, mut order: Order) -> Vec<String> {
    acquire::enrich(svc, &mut order).await;
    let session_id = Uuid::new_v4();
    station.session_id = Some(session_id);
    let phase = station.session.begin(order);
    station.candidates.clear();

    let order = station.session.order().expect("order just acquired");
    info!(%session_id, order_number = %order.order_number, phase = phase.as_str(), "order acquired");
    let mut replies = vec![format!("Order {} acquired.", order.order_number)];
    match phase {
        Phase::CapturingLabel => {
            replies.push("Single unit; scan the shipping label.".to_string());
        }
        _ => {
            for p in station.session.remaining() {
                replies.push(format!("  {}: {}/{}", p.sku, p.scanned, p.required));
            }
            replies.push("Scan items to verify.".to_string());
        }
    }
    replies
}

async fn verify_scan(
    station: &mut Station,
    svc: &dyn OrderService,
    code: &str,
) -> Result<Vec<String>> {
    // An already-consumed code is a duplicate no matter what it resolves to;
    // reject it before spending a backend lookup on it.
    if station.session.scanned_codes().iter().any(|c| c == code) {
        let outcome = VerifyOutcome::AlreadyScanned {
            code: code.to_string(),
        };
        return Ok(describe_outcome(&station.session, outcome));
    }
    let order = station.session.order().expect("verifying without order");
    let resolved = match resolver::resolve(svc, order, code).await {
        Ok(resolved) => resolved,
        Err(err) => {
            warn!(?err, code, "resolution lookup failed");
            return Ok(vec![format!("Lookup failed: {err:#}")]);
        }
    };
    let outcome = station.session.apply_scan(code, resolved.as_deref());
    Ok(describe_outcome(&station.session, outcome))
}

fn confirm_item(station: &mut Station, arg: Option<&str>) -> Result<Vec<String>> {
    if station.session.phase() != Phase::VerifyingItems {
        return Ok(vec!["Not verifying items right now.".to_string()]);
    }
    let Some(sku) = arg else {
        return Ok(vec!["Usage: /item <sku>".to_string()]);
    };
    let outcome = station.session.confirm_manual(sku);
    Ok(describe_outcome(&station.session, outcome))
}

fn describe_outcome(session: &Session, outcome: VerifyOutcome) -> Vec<String> {
    match outcome {
        VerifyOutcome::Accepted {
            sku,
            scanned,
            required,
            complete,
        } => {
            let mut replies = vec![format!("Scanned {sku}: {scanned}/{required}.")];
            if complete {
                replies.push("All items verified; scan the shipping label.".to_string());
            } else {
                for p in session.remaining() {
                    replies.push(format!("  {}: {}/{}", p.sku, p.scanned, p.required));
                }
            }
            replies
        }
        VerifyOutcome::AlreadyScanned { code } => {
            vec![format!("Already scanned: {code}.")]
        }
        VerifyOutcome::NotInOrder { code } => {
            vec![format!("Item not in order: {code}.")]
        }
        VerifyOutcome::QuantityExceeded {
            sku,
            scanned,
            required,
        } => {
            vec![format!("Quantity exceeded for {sku}: {scanned}/{required}.")]
        }
    }
}

async fn capture_label(
    station: &mut Station,
    svc: &dyn OrderService,
    committer: &Committer,
    label: &str,
) -> Result<Vec<String>> {
    let order_id = station
        .session
        .order()
        .expect("capturing label without order")
        .id
        .clone();
    match committer.save_label(svc, &order_id, label).await {
        Ok(_) => {
            station.session.label_saved(label);
            Ok(vec![
                "Shipping label saved. /confirm to dispatch or /cancel.".to_string(),
            ])
        }
        Err(err) => {
            // Phase stays at label capture; the scanned value is dropped.
            warn!(?err, "shipping label save failed");
            Ok(vec![format!("Failed to save shipping label: {err:#}")])
        }
    }
}

async fn confirm_dispatch(
    station: &mut Station,
    svc: &dyn OrderService,
    pool: &Pool,
    committer: &Committer,
) -> Result<Vec<String>> {
    if station.session.phase() != Phase::Confirming {
        return Ok(vec!["Nothing to confirm.".to_string()]);
    }
    let order = station.session.order().expect("confirming without order").clone();
    let codes = station.session.scanned_codes().to_vec();
    match committer
        .commit(svc, pool, &order, &codes, &station.operator)
        .await
    {
        Ok(committed) => {
            station.session.reset();
            station.session_id = None;
            Ok(vec![format!("Order {} dispatched.", committed.order_number)])
        }
        Err(err) => {
            // Phase stays at confirming; operator retries or cancels.
            warn!(?err, order_id = %order.id, "dispatch commit failed");
            Ok(vec![format!("Dispatch failed: {err:#}")])
        }
    }
}

fn cancel(station: &mut Station) -> Vec<String> {
    if station.session.phase() == Phase::Locating {
        return vec!["No active order.".to_string()];
    }
    let order_number = station
        .session
        .order()
        .map(|o| o.order_number.clone())
        .unwrap_or_default();
    station.session.reset();
    station.session_id = None;
    info!(order_number, "session cancelled");
    vec!["Cancelled; back to locating.".to_string()]
}

fn status(station: &Station) -> Vec<String> {
    let mut replies = vec![format!("Phase: {}", station.session.phase().as_str())];
    if let Some(order) = station.session.order() {
        replies.push(format!("Order: {}", order.order_number));
        for p in station.session.progress() {
            replies.push(format!("  {}: {}/{}", p.sku, p.scanned, p.required));
        }
    }
    replies
}

async fn show_history(pool: &Pool) -> Result<Vec<String>> {
    let records = db::recent_dispatches(pool, 10).await?;
    if records.is_empty() {
        return Ok(vec!["No dispatches yet.".to_string()]);
    }
    let mut replies = vec!["Recent dispatches:".to_string()];
    for rec in records {
        replies.push(format!(
            "  {} by {} at {}",
            rec.order_number,
            rec.operator,
            rec.dispatched_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    Ok(replies)
}

async fn purge_pending(
    station: &mut Station,
    svc: &dyn OrderService,
    committer: &Committer,
) -> Result<Vec<String>> {
    if station.session.phase() != Phase::Locating {
        return Ok(vec![
            "Finish or /cancel the active order first.".to_string()
        ]);
    }
    match committer.purge_pending(svc).await {
        Ok(deleted) => {
            station.candidates.clear();
            Ok(vec![format!("Deleted {deleted} pending orders.")])
        }
        Err(err) => {
            warn!(?err, "bulk delete failed");
            Ok(vec![format!("Bulk delete failed: {err:#}")])
        }
    }
}
