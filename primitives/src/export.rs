use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AdCopy, Brief, CopyLimitWarning, CreativeDraft, IdentityVerification, PreviewSettings,
    SharedDraft,
};

/// Read-only projection of a draft taken when an export is requested.
///
/// Computed on demand, never stored. Unlike the persisted state, assets keep their inline
/// payloads so the bundle can fall back to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot {
    pub exported_at: DateTime<Utc>,
    pub brief: Brief,
    pub ad_copy: AdCopy,
    pub preview: PreviewSettings,
    pub identity: IdentityVerification,
    /// The tracked URL at the time of the export, empty for an invalid destination
    pub tracked_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared: Option<SharedDraft>,
    #[serde(default)]
    pub copy_warnings: Vec<CopyLimitWarning>,
}

impl ExportSnapshot {
    pub fn new(draft: &CreativeDraft, exported_at: DateTime<Utc>) -> Self {
        Self {
            exported_at,
            brief: draft.brief.clone(),
            ad_copy: draft.ad_copy.clone(),
            preview: draft.preview,
            identity: draft.identity.clone(),
            tracked_url: draft.tracked_url(),
            shared: draft.share.shared.clone(),
            copy_warnings: draft.copy_limit_warnings(),
        }
    }

    /// The snapshot without inline payloads, the assets are bundled as separate files.
    pub fn without_inline_payloads(&self) -> Self {
        let mut snapshot = self.clone();
        snapshot.brief.assets = self.brief.assets.stripped();

        snapshot
    }
}
