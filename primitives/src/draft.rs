//! The sub-records composing a [`CreativeDraft`].
use chrono::{DateTime, NaiveDate, Utc};
use parse_display::Display;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    util::{slug::slugify, tracking},
    AssetSlots, IdentityVerification,
};

/// An in-progress creative: the brief, the copy and the state of every side-effect on it.
///
/// All sub-records are always present and independently mutable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeDraft {
    pub brief: Brief,
    pub ad_copy: AdCopy,
    pub preview: PreviewSettings,
    pub identity: IdentityVerification,
    pub generation: GenerationState,
    pub persistence: PersistenceState,
    pub share: ShareState,
}

impl CreativeDraft {
    /// The destination of the ad with the UTM parameters of the brief applied.
    ///
    /// Falls back to the landing page of the brief when the copy has no destination URL.
    /// Invalid URLs result in an empty string.
    pub fn tracked_url(&self) -> String {
        let destination = if self.ad_copy.destination_url.trim().is_empty() {
            &self.brief.website_url
        } else {
            &self.ad_copy.destination_url
        };

        tracking::tracked_url(destination, &self.brief.utm)
    }

    /// Character limit violations of the copy, empty when the brief overrides the limits.
    pub fn copy_limit_warnings(&self) -> Vec<CopyLimitWarning> {
        if self.brief.toggles.override_char_limits {
            Vec::new()
        } else {
            self.ad_copy.limit_warnings()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Brief {
    /// Link to the advertiser's page which gets verified
    pub identity_url: String,
    /// The landing page of the advertiser
    pub website_url: String,
    /// Free-text description of the business
    pub company_overview: String,
    pub objective: CampaignObjective,
    /// Name of the ad, the default source of `utm_content`
    pub ad_name: String,
    pub utm: UtmParams,
    pub flight: Option<FlightWindow>,
    pub assets: AssetSlots,
    pub toggles: BriefToggles,
}

impl Brief {
    /// Fills `website_url` and `company_overview` only when they are empty.
    pub fn backfill(&mut self, website: Option<&str>, overview: Option<&str>) -> bool {
        let mut changed = false;

        if let Some(website) = website.filter(|w| !w.trim().is_empty()) {
            if self.website_url.trim().is_empty() {
                self.website_url = website.to_string();
                changed = true;
            }
        }

        if let Some(overview) = overview.filter(|o| !o.trim().is_empty()) {
            if self.company_overview.trim().is_empty() {
                self.company_overview = overview.to_string();
                changed = true;
            }
        }

        changed
    }
}

/// UTM parameters applied to the destination URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UtmParams {
    pub campaign: String,
    pub medium: String,
    pub source: String,
    pub content: String,
    /// The last value auto-derived from the ad name.
    /// When `content` differs from it, the user has edited `content` manually.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_auto: Option<String>,
}

impl UtmParams {
    /// Whether `content` was edited away from the last derived value.
    /// An empty `content` is never considered manual.
    pub fn is_content_manual(&self) -> bool {
        !self.content.is_empty() && self.content_auto.as_deref() != Some(self.content.as_str())
    }

    /// Re-derives `content` from the ad name, unless the user has diverged from it.
    ///
    /// Returns whether `content` changed.
    pub fn sync_content(&mut self, ad_name: &str) -> bool {
        if self.is_content_manual() {
            return false;
        }

        let derived = slugify(ad_name);
        let changed = self.content != derived;
        self.content = derived.clone();
        self.content_auto = Some(derived);

        changed
    }

    /// The non-empty parameters in `campaign`, `medium`, `source`, `content` order
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("utm_campaign", self.campaign.as_str()),
            ("utm_medium", self.medium.as_str()),
            ("utm_source", self.source.as_str()),
            ("utm_content", self.content.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .collect()
    }
}

/// The dates the campaign runs, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightWindow {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BriefToggles {
    /// Disables the copy character limit warnings
    pub override_char_limits: bool,
    /// Disables AI copy generation for this draft
    pub disable_ai_generation: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[display(style = "snake_case")]
pub enum CampaignObjective {
    Awareness,
    #[default]
    Traffic,
    Engagement,
    Leads,
    AppPromotion,
    Sales,
}

/// The user-facing payload of the ad.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdCopy {
    pub primary_text: String,
    pub headline: String,
    pub description: String,
    pub destination_url: String,
    pub display_link: String,
    pub call_to_action: CallToAction,
}

impl AdCopy {
    pub fn field(&self, field: CopyField) -> &str {
        match field {
            CopyField::PrimaryText => &self.primary_text,
            CopyField::Headline => &self.headline,
            CopyField::Description => &self.description,
        }
    }

    /// Every limited field longer than its [`CopyField::limit`]
    pub fn limit_warnings(&self) -> Vec<CopyLimitWarning> {
        CopyField::ALL
            .into_iter()
            .filter_map(|field| {
                let length = self.field(field).chars().count();
                let limit = field.limit();

                (length > limit).then_some(CopyLimitWarning {
                    field,
                    length,
                    limit,
                })
            })
            .collect()
    }
}

/// Copy fields with a recommended maximum length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
#[display(style = "camelCase")]
pub enum CopyField {
    PrimaryText,
    Headline,
    Description,
}

impl CopyField {
    pub const ALL: [CopyField; 3] = [
        CopyField::PrimaryText,
        CopyField::Headline,
        CopyField::Description,
    ];

    /// Characters shown before the placements truncate the text
    pub fn limit(&self) -> usize {
        match self {
            Self::PrimaryText => 125,
            Self::Headline => 40,
            Self::Description => 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
#[display("{field} is {length} characters long, the limit is {limit}")]
pub struct CopyLimitWarning {
    pub field: CopyField,
    pub length: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallToAction {
    #[default]
    #[display("Learn More")]
    LearnMore,
    #[display("Shop Now")]
    ShopNow,
    #[display("Sign Up")]
    SignUp,
    #[display("Book Now")]
    BookNow,
    #[display("Contact Us")]
    ContactUs,
    #[display("Download")]
    Download,
    #[display("Get Quote")]
    GetQuote,
    #[display("Apply Now")]
    ApplyNow,
    #[display("Subscribe")]
    Subscribe,
}

/// Which preview is currently shown. View state only, not needed for exporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreviewSettings {
    pub placement: Placement,
    pub device: Device,
    pub format: PreviewFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
#[display(style = "camelCase")]
pub enum Placement {
    #[default]
    FacebookFeed,
    InstagramFeed,
    FacebookStories,
    InstagramStories,
    InstagramReels,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
#[display(style = "camelCase")]
pub enum Device {
    #[default]
    Mobile,
    Desktop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
#[display(style = "camelCase")]
pub enum PreviewFormat {
    #[default]
    Square,
    Vertical,
}

/// AI copy generation state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationState {
    /// Whether a generation has ever succeeded for this draft
    pub has_generated: bool,
    pub in_flight: bool,
    /// The reason of the last failed generation, cleared on the next attempt
    pub error: Option<String>,
    pub last_generated_at: Option<DateTime<Utc>>,
}

/// Local persistence state, owned by the autosave
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistenceState {
    pub last_saved_at: Option<DateTime<Utc>>,
    pub saving: bool,
    /// Sticky until the next successful save
    pub error: Option<String>,
}

/// Outcome of saving the draft remotely
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShareState {
    pub saving: bool,
    pub shared: Option<SharedDraft>,
    pub error: Option<String>,
}

/// A remotely saved draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedDraft {
    pub short_id: String,
    pub public_url: Url,
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn utm() -> UtmParams {
        UtmParams {
            campaign: "Ignite".into(),
            medium: "Facebook".into(),
            source: "Townsquare".into(),
            ..Default::default()
        }
    }

    #[test]
    fn utm_content_follows_ad_name_until_edited() {
        let mut utm = utm();

        assert!(utm.sync_content("Fall Sale"));
        assert_eq!("fall-sale", utm.content);
        assert!(utm.sync_content("Winter Sale"));
        assert_eq!("winter-sale", utm.content);

        utm.content = "newsletter".into();
        assert!(utm.is_content_manual());
        assert!(!utm.sync_content("Spring Sale"));
        assert_eq!("newsletter", utm.content);

        // clearing the manual value hands it back to the ad name
        utm.content.clear();
        assert!(utm.sync_content("Spring Sale"));
        assert_eq!("spring-sale", utm.content);
    }

    #[test]
    fn utm_pairs_skip_empty_values() {
        let mut utm = utm();
        utm.medium = "  ".into();

        assert_eq!(
            vec![("utm_campaign", "Ignite"), ("utm_source", "Townsquare")],
            utm.pairs()
        );
    }

    #[test]
    fn backfill_never_overwrites() {
        let mut brief = Brief {
            company_overview: "Family owned since 1952".into(),
            ..Default::default()
        };

        assert!(brief.backfill(Some("https://ignite.example"), Some("Generated overview")));
        assert_eq!("https://ignite.example", brief.website_url);
        assert_eq!("Family owned since 1952", brief.company_overview);

        assert!(!brief.backfill(Some("https://other.example"), None));
        assert_eq!("https://ignite.example", brief.website_url);
    }

    #[test]
    fn copy_limit_warnings_respect_override() {
        let mut draft = CreativeDraft::default();
        draft.ad_copy.headline = "h".repeat(41);
        draft.ad_copy.description = "Short".into();

        assert_eq!(
            vec![CopyLimitWarning {
                field: CopyField::Headline,
                length: 41,
                limit: 40
            }],
            draft.copy_limit_warnings()
        );
        assert_eq!(
            "headline is 41 characters long, the limit is 40",
            draft.copy_limit_warnings()[0].to_string()
        );

        draft.brief.toggles.override_char_limits = true;
        assert!(draft.copy_limit_warnings().is_empty());
    }

    #[test]
    fn tracked_url_falls_back_to_website() {
        let mut draft = CreativeDraft::default();
        draft.brief.utm = utm();
        draft.brief.website_url = "ignite.example/shop".into();

        assert_eq!(
            "https://ignite.example/shop?utm_campaign=Ignite&utm_medium=Facebook&utm_source=Townsquare",
            draft.tracked_url()
        );

        draft.ad_copy.destination_url = "not a url".into();
        assert_eq!("", draft.tracked_url());
    }
}
