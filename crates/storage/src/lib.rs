#![forbid(unsafe_code)]

//! SQLite-backed undo/redo history for a single-writer object database.
//!
//! [`UndoLog`] owns the three history tables (connections, transactions,
//! changes). [`UndoEngine`] drives it together with a [`PrimaryDatabase`] to
//! move the live data backward and forward through committed transactions.
//! The read-only history API lives on [`UndoLog`] as well
//! (`get_transactions`, `get_transaction`, `export_history`).

mod config;
mod engine;
mod primary;
mod store;

pub use config::*;
pub use engine::*;
pub use primary::*;
pub use store::*;
