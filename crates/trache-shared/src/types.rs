use serde::{Deserialize, Serialize};

use crate::text::fold;

/// Which page layout a service detail uses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Visa,
    Insurance,
    Hotels,
    Generic,
}

impl ServiceKind {
    /// Classify a service by keywords in its name, ignoring case and accents.
    pub fn classify(service_name: &str) -> Self {
        let folded = fold(service_name);
        if folded.contains("visa") {
            Self::Visa
        } else if folded.contains("assurance") || folded.contains("insurance") {
            Self::Insurance
        } else if folded.contains("hotel") {
            Self::Hotels
        } else {
            Self::Generic
        }
    }
}
