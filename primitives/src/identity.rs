//! Advertiser identity verification.
use parse_display::Display;
use serde::{Deserialize, Serialize};

/// How an [`IdentityRecord`] was obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
#[display(style = "camelCase")]
pub enum VerificationSource {
    /// Returned by the verification service
    #[default]
    Remote,
    /// Synthesized from the submitted URL while the service was unreachable
    UrlDerived,
}

/// The advertiser's verified page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    /// Display name of the page
    pub name: String,
    pub page_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// "About" text of the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Website listed on the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default)]
    pub source: VerificationSource,
}

/// State of verifying the advertiser's identity.
///
/// Within one attempt it only moves forward:
/// `Unattempted -> Pending -> {Verified, Degraded, Failed}`.
/// Every new attempt starts over from `Pending`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum IdentityVerification {
    #[default]
    Unattempted,
    Pending {
        /// The normalized URL being verified
        url: String,
    },
    Verified {
        record: IdentityRecord,
    },
    /// The service was unreachable and the record was derived from the URL.
    /// Shown as a success, but consumers should disclose the degradation.
    Degraded {
        record: IdentityRecord,
    },
    Failed {
        reason: String,
    },
}

impl IdentityVerification {
    /// The identity record of a `Verified` or `Degraded` state
    pub fn record(&self) -> Option<&IdentityRecord> {
        match self {
            Self::Verified { record } | Self::Degraded { record } => Some(record),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// Whether the state is terminal for the current attempt
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            Self::Verified { .. } | Self::Degraded { .. } | Self::Failed { .. }
        )
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Unattempted => "unattempted",
            Self::Pending { .. } => "pending",
            Self::Verified { .. } => "verified",
            Self::Degraded { .. } => "degraded",
            Self::Failed { .. } => "failed",
        }
    }
}
