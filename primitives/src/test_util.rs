//! Fixtures for testing drafts, assets and identities.
use once_cell::sync::Lazy;
use slog::{o, Discard, Logger};
use url::Url;

use crate::{
    AdCopy, Aspect, AssetReference, Brief, CallToAction, CreativeDraft, Dimensions,
    IdentityRecord, IdentityVerification, InlinePayload, UtmParams, VerificationSource,
};

/// A PNG signature followed by garbage, base64 encoded.
/// Good enough for everything that doesn't decode the image itself.
pub const DUMMY_INLINE_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAA";

pub static DUMMY_REMOTE_URL: Lazy<Url> = Lazy::new(|| {
    "https://cdn.ignite.example/assets/fall-sale-square.png"
        .parse()
        .expect("Valid Url")
});

pub static DUMMY_IDENTITY: Lazy<IdentityRecord> = Lazy::new(|| IdentityRecord {
    name: "Ignite Marketing".into(),
    page_url: "https://www.facebook.com/ignitemarketing".into(),
    avatar_url: Some("https://graph.facebook.com/ignitemarketing/picture?type=large".into()),
    category: Some("Advertising/Marketing".into()),
    description: Some("Local marketing for local businesses.".into()),
    website: Some("https://ignite.example".into()),
    source: VerificationSource::Remote,
});

pub fn discard_logger() -> Logger {
    Logger::root(Discard, o!())
}

/// An asset with both the remote pointer and the inline payload.
///
/// The dimensions match the `aspect`, `None` results in an asset without dimensions.
pub fn dummy_asset(aspect: Option<Aspect>) -> AssetReference {
    let dimensions = aspect.map(|aspect| match aspect {
        Aspect::Square => Dimensions::new(1080, 1080),
        Aspect::Vertical => Dimensions::new(1080, 1920),
        Aspect::Other => Dimensions::new(800, 600),
    });

    AssetReference {
        name: "Fall Sale.png".into(),
        size: 18,
        mime: "image/png".into(),
        dimensions,
        aspect,
        remote_url: Some(DUMMY_REMOTE_URL.clone()),
        inline: Some(InlinePayload::new(DUMMY_INLINE_PNG.into())),
    }
}

/// A filled-in draft with a square asset and a verified identity.
pub fn dummy_draft() -> CreativeDraft {
    let mut brief = Brief {
        identity_url: "https://www.facebook.com/ignitemarketing".into(),
        website_url: "https://ignite.example".into(),
        company_overview: "Local marketing for local businesses.".into(),
        ad_name: "Fall Sale".into(),
        utm: UtmParams {
            campaign: "Ignite".into(),
            medium: "Facebook".into(),
            source: "Townsquare".into(),
            ..Default::default()
        },
        ..Default::default()
    };
    brief.utm.sync_content(&brief.ad_name);
    brief.assets.route(dummy_asset(Some(Aspect::Square)));

    CreativeDraft {
        brief,
        ad_copy: AdCopy {
            primary_text: "Everything in store is 30% off this weekend.".into(),
            headline: "Fall Sale".into(),
            description: "This weekend only".into(),
            destination_url: "https://ignite.example/sale".into(),
            display_link: "ignite.example".into(),
            call_to_action: CallToAction::ShopNow,
        },
        identity: IdentityVerification::Verified {
            record: DUMMY_IDENTITY.clone(),
        },
        ..Default::default()
    }
}
