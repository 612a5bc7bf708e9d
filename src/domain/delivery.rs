use serde::{Deserialize, Serialize};

/// Outcome of a single delivery attempt. Never an error: failures are values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    Delivered { transport_id: String },
    Failed { reason: String },
}

impl DeliveryResult {
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Which path produced (or simulated) the reported success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryMethod {
    Primary,
    Fallback,
    AdminOnly,
    Mocked,
}

impl DeliveryMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
            Self::AdminOnly => "admin-only",
            Self::Mocked => "mocked",
        }
    }
}

/// Where a delivery run enters the fallback sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyEntry {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub accepted: bool,
    pub transport_id: String,
    pub method: DeliveryMethod,
    pub note: Option<String>,
    pub attempts: u8,
}

impl SubmissionOutcome {
    #[must_use]
    pub const fn is_mocked(&self) -> bool {
        matches!(self.method, DeliveryMethod::Mocked)
    }
}
