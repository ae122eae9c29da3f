//! Rows returned by the dispatch-history repository.

use chrono::{DateTime, Utc};

/// One successful dispatch commit: the order snapshot as committed plus the
/// timestamp and acting operator. Not authoritative — display only.
#[derive(Debug, Clone)]
pub struct DispatchRecord {
    pub id: i64,
    pub order_id: String,
    pub order_number: String,
    pub operator: String,
    /// JSON snapshot of the order as returned by the commit call.
    pub snapshot: String,
    pub dispatched_at: DateTime<Utc>,
}
