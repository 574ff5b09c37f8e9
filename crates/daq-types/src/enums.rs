//! Enumeration types shared across the injector.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two mutually exclusive categories an emitted event is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// A signal event (nuclear recoil in the published dataset).
    Signal,
    /// A background event (electron recoil in the published dataset).
    Background,
}

impl Category {
    /// Build a category from the boolean flag stored in the ledger.
    pub const fn from_is_signal(is_signal: bool) -> Self {
        if is_signal { Self::Signal } else { Self::Background }
    }

    /// Whether this is the signal category.
    pub const fn is_signal(self) -> bool {
        matches!(self, Self::Signal)
    }

    /// Lowercase name used in log lines and info messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Signal => "signal",
            Self::Background => "background",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_round_trips() {
        assert_eq!(Category::from_is_signal(true), Category::Signal);
        assert_eq!(Category::from_is_signal(false), Category::Background);
        assert!(Category::Signal.is_signal());
        assert!(!Category::Background.is_signal());
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(Category::Signal.to_string(), "signal");
        assert_eq!(Category::Background.to_string(), "background");
    }
}
