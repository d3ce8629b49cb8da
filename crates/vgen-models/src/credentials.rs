//! Per-provider credential sets.

use std::fmt;
use thiserror::Error;

use crate::ProviderId;

/// Credentials handed to a provider client for one generation batch.
///
/// Kling signs a short-lived token from the key pair on every request;
/// MiniMax sends its API key as-is and scopes calls to a group.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Kling {
        access_key: String,
        secret_key: String,
    },
    MiniMax {
        api_key: String,
        group_id: String,
    },
}

impl Credentials {
    /// Which provider these credentials belong to.
    pub fn provider(&self) -> ProviderId {
        match self {
            Credentials::Kling { .. } => ProviderId::Kling,
            Credentials::MiniMax { .. } => ProviderId::MiniMax,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Kling { access_key, .. } => f
                .debug_struct("Kling")
                .field("access_key", access_key)
                .field("secret_key", &"<redacted>")
                .finish(),
            Credentials::MiniMax { group_id, .. } => f
                .debug_struct("MiniMax")
                .field("api_key", &"<redacted>")
                .field("group_id", group_id)
                .finish(),
        }
    }
}

/// A required credential field was absent or blank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("API key is required for {0} API")]
    MissingApiKey(&'static str),

    #[error("Access Key Secret is required for Kling API")]
    MissingSecret,

    #[error("Group ID is required for Minimax API")]
    MissingGroupId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::Kling {
            access_key: "ak-123".into(),
            secret_key: "super-secret".into(),
        };
        let printed = format!("{:?}", creds);
        assert!(printed.contains("ak-123"));
        assert!(!printed.contains("super-secret"));

        let creds = Credentials::MiniMax {
            api_key: "mm-key".into(),
            group_id: "grp".into(),
        };
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("mm-key"));
        assert_eq!(creds.provider(), ProviderId::MiniMax);
    }
}
