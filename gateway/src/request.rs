use primitives::{
    CallToAction, CampaignObjective, CreativeDraft, ExportSnapshot, InlinePayload,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyIdentityRequest {
    /// The normalized page url
    pub url: String,
    /// The advertiser's landing page, helps disambiguating the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_url: Option<String>,
}

/// The brief fields copy is generated from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyBrief {
    pub ad_name: String,
    pub company_overview: String,
    pub website_url: String,
    pub objective: CampaignObjective,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertiser_name: Option<String>,
}

/// An inline encoded asset sent along with a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineAsset {
    pub data: InlinePayload,
    pub mime: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCopyRequest {
    pub brief: CopyBrief,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<InlineAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCopy {
    pub primary_text: String,
    pub headline: String,
    pub description: String,
    #[serde(default)]
    pub call_to_action: Option<CallToAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub data: InlinePayload,
    pub file_name: String,
    pub mime: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraftRequest {
    /// The whole draft, assets travel by their remote pointers only
    pub draft: CreativeDraft,
    pub snapshot: ExportSnapshot,
}

impl SaveDraftRequest {
    pub fn new(draft: &CreativeDraft, snapshot: &ExportSnapshot) -> Self {
        let mut draft = draft.clone();
        draft.brief.assets = draft.brief.assets.stripped();

        Self {
            draft,
            snapshot: snapshot.without_inline_payloads(),
        }
    }
}
