//! Scan-driven order-fulfillment verification for a warehouse packing
//! station: locate an order by scan, confirm each required unit, capture the
//! shipping label, and commit the dispatch against the fulfillment backend.

pub mod acquire;
pub mod api;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod handlers;
pub mod model;
pub mod resolver;
pub mod session;
