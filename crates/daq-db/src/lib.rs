//! Truth ledger for the DAQ injector.
//!
//! Every emitted event gets one append-only row recording which category was
//! actually rendered, from which source image, and under which object name.
//! The ledger is the ground truth downstream classifiers are scored against.
//!
//! # Architecture
//!
//! ```text
//! Injector (single producer)
//!     |
//!     +-- record() ---> SQLite `truth` table (one transaction per event)
//!                           ^
//! daq-audit / tests --------+-- all() (lazy stream, insertion order)
//!                           +-- category_totals()
//! ```
//!
//! # Modules
//!
//! - [`sqlite`] -- `SQLite` connection pool and configuration
//! - [`truth_store`] -- Append and stream truth records
//! - [`error`] -- Shared error types

pub mod error;
pub mod sqlite;
pub mod truth_store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use sqlite::{LedgerConfig, SqliteLedgerPool};
pub use truth_store::{CategoryTotals, TruthLedger, TruthRow};
