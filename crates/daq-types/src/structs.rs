//! Ground-truth records persisted by the truth ledger.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::Category;

/// One row of the truth ledger: what was actually emitted for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruthRecord {
    /// Wall-clock time of the emission.
    pub timestamp: DateTime<Utc>,
    /// Source image the event was rendered from.
    pub source_path: PathBuf,
    /// Content-addressed object name the event was stored under.
    pub object_name: String,
    /// Whether the event was drawn from the signal category.
    pub is_signal: bool,
}

impl TruthRecord {
    /// The category recorded for this event.
    pub const fn category(&self) -> Category {
        Category::from_is_signal(self.is_signal)
    }
}
