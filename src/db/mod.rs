//! Local persistence: pool setup and the dispatch-history repository.
//!
//! Split into two submodules:
//! - `model`: typed rows returned by repository queries.
//! - `repo`: SQL-only functions that map rows into those types.
//!
//! External modules import from `scan_station::db`; the repository API and
//! row types are re-exported here.

pub mod model;
pub mod repo;

pub use model::DispatchRecord;
pub use repo::*;
