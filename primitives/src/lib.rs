#![deny(rust_2018_idioms)]
#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use self::{
    asset::{Aspect, AssetReference, AssetRole, AssetSlots, Dimensions, InlinePayload},
    config::Config,
    draft::{
        AdCopy, Brief, BriefToggles, CallToAction, CampaignObjective, CopyField,
        CopyLimitWarning, CreativeDraft, Device, FlightWindow, GenerationState,
        PersistenceState, Placement, PreviewFormat, PreviewSettings, ShareState, SharedDraft,
        UtmParams,
    },
    export::ExportSnapshot,
    identity::{IdentityRecord, IdentityVerification, VerificationSource},
    persisted::{PersistedDraft, PersistedState},
};

pub mod asset;
pub mod config;
pub mod draft;
pub mod export;
pub mod identity;
pub mod persisted;

pub mod util {
    pub mod api;
    pub mod logging;
    pub mod slug;
    pub mod tracking;
}

#[cfg(any(test, feature = "test-util"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub mod test_util;
