//! Evaluator
//!
//! The only component of the health engine with side effects: loads live
//! and baseline inputs, invokes the pure scorer, persists snapshots, and
//! serves a staleness-aware read path. Also provides SQLite-backed
//! implementations of the store contracts.

mod evaluator;
mod stores;


pub use evaluator::{FreshHealth, HealthEvaluator};
pub use stores::{init_schema, SqliteBaselineStore, SqliteEventStore, SqliteSnapshotStore};
