use super::model::DispatchRecord;
use crate::model::Order;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::instrument;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized).await?;
    // Enable WAL and stricter durability.
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// For file-backed SQLite URLs, expand a leading `~/` and ensure the parent
/// directory exists. In-memory URLs and non-sqlite schemes pass through.
fn prepare_sqlite_url(url: &str) -> String {
    let Some(rest) = url.strip_prefix("sqlite:") else {
        return url.to_string();
    };
    if rest.starts_with(":memory") {
        return url.to_string();
    }
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };
    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rel), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rel),
        _ => path_part.to_string(),
    };
    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    match query_part {
        Some(q) => format!("sqlite://{}?{}", expanded_path, q),
        None => format!("sqlite://{}", expanded_path),
    }
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Append one history row for a committed dispatch. The snapshot is the order
/// exactly as the commit call returned it.
#[instrument(skip_all)]
pub async fn append_dispatch(
    pool: &Pool,
    order: &Order,
    operator: &str,
    dispatched_at: DateTime<Utc>,
) -> Result<i64> {
    let snapshot =
        serde_json::to_string(order).context("failed to serialize order snapshot")?;
    let rec = sqlx::query(
        "INSERT INTO dispatch_history (order_id, order_number, operator, snapshot, dispatched_at) \
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(operator)
    .bind(snapshot)
    .bind(dispatched_at)
    .fetch_one(pool)
    .await?;
    Ok(rec.get::<i64, _>("id"))
}

/// Most recent dispatches first, for the operator's confirmation view.
#[instrument(skip_all)]
pub async fn recent_dispatches(pool: &Pool, limit: i64) -> Result<Vec<DispatchRecord>> {
    let rows = sqlx::query(
        "SELECT id, order_id, order_number, operator, snapshot, dispatched_at \
         FROM dispatch_history ORDER BY id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| DispatchRecord {
            id: row.get("id"),
            order_id: row.get("order_id"),
            order_number: row.get("order_number"),
            operator: row.get("operator"),
            snapshot: row.get("snapshot"),
            dispatched_at: row.get("dispatched_at"),
        })
        .collect())
}

#[instrument(skip_all)]
pub async fn count_dispatches_for_order(pool: &Pool, order_id: &str) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM dispatch_history WHERE order_id = ?")
            .bind(order_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}
