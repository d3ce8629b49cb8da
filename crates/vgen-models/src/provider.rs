//! Video generation provider identifiers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The external image-to-video services this backend can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ProviderId {
    /// Kling AI (Kuaishou)
    #[serde(rename = "kling")]
    Kling,
    /// MiniMax Hailuo
    #[serde(rename = "minmax", alias = "minimax")]
    MiniMax,
}

impl ProviderId {
    /// All known providers, in display order.
    pub const ALL: [ProviderId; 2] = [ProviderId::Kling, ProviderId::MiniMax];

    /// Wire identifier used by clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Kling => "kling",
            ProviderId::MiniMax => "minmax",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::Kling => "Kling",
            ProviderId::MiniMax => "Minimax",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a provider identifier is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderId {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "kling" => Ok(ProviderId::Kling),
            "minmax" | "minimax" => Ok(ProviderId::MiniMax),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}
