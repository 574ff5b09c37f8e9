//! Shared type definitions for the DAQ injector.
//!
//! This crate is the single source of truth for the values that cross crate
//! and process boundaries: the event category, the data-topic message read by
//! downstream consumers, and the ground-truth record kept in the ledger.
//!
//! # Modules
//!
//! - [`enums`] -- Event categories
//! - [`messages`] -- Versioned data-topic message schema
//! - [`structs`] -- Truth ledger records

pub mod enums;
pub mod messages;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::Category;
pub use messages::{DataMessage, EventDescriptor};
pub use structs::TruthRecord;
