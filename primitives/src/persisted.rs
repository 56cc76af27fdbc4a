//! The record written to local storage.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AdCopy, Brief, CreativeDraft, IdentityVerification, PreviewSettings};

/// A snapshot of the draft as kept in local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDraft {
    pub saved_at: DateTime<Utc>,
    pub state: PersistedState,
}

/// The persisted part of a [`CreativeDraft`].
///
/// Assets never carry their inline payload here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub brief: Brief,
    pub ad_copy: AdCopy,
    #[serde(default)]
    pub preview: PreviewSettings,
    #[serde(default)]
    pub identity: IdentityVerification,
}

impl PersistedState {
    /// Projects the draft, stripping all inline asset payloads.
    pub fn from_draft(draft: &CreativeDraft) -> Self {
        let mut brief = draft.brief.clone();
        brief.assets = brief.assets.stripped();

        Self {
            brief,
            ad_copy: draft.ad_copy.clone(),
            preview: draft.preview,
            identity: draft.identity.clone(),
        }
    }

    /// A fresh draft holding this state, the side-effect states start over.
    pub fn into_draft(self) -> CreativeDraft {
        CreativeDraft {
            brief: self.brief,
            ad_copy: self.ad_copy,
            preview: self.preview,
            identity: self.identity,
            ..Default::default()
        }
    }
}

impl PersistedDraft {
    pub fn new(draft: &CreativeDraft, saved_at: DateTime<Utc>) -> Self {
        Self {
            saved_at,
            state: PersistedState::from_draft(draft),
        }
    }
}
