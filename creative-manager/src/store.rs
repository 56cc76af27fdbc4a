//! The single source of truth for the draft being edited.
//!
//! Every mutation bumps the [`Revision`] and marks the draft dirty. Subscribers are notified
//! through a [`watch`] channel after every mutation, reset, hydration and save.
//!
//! Asynchronous work is split in a `begin_*` step, which hands out the request to send, and a
//! `complete_*` step taking the outcome. Verification and generation carry an attempt number,
//! so the outcome of a superseded attempt is ignored.
use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use gateway::{
    CopyBrief, GatewayResult, GenerateCopyRequest, GeneratedCopy, InlineAsset, SaveDraftRequest,
    VerifyIdentityRequest,
};
use primitives::{
    config::UtmDefaults, util::tracking::normalize_url, AdCopy, AssetReference, AssetRole,
    Brief, CopyLimitWarning, CreativeDraft, ExportSnapshot, IdentityVerification,
    PersistedDraft, PersistedState, PreviewSettings, SharedDraft, UtmParams,
};
use slog::{debug, error, info, Logger};
use tokio::sync::watch;

use crate::storage::{self, LocalStorage, StorageError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Revision {
    /// Bumped by every change of the draft's content
    pub version: u64,
    /// Whether the content changed since it was last saved or loaded
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationTicket {
    pub attempt: u64,
    pub request: VerifyIdentityRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    pub attempt: u64,
    pub request: GenerateCopyRequest,
}

/// A snapshot write handed out by [`DraftStore::begin_save`].
pub struct SaveJob {
    version: u64,
    epoch: u64,
    record: PersistedDraft,
    storage: Arc<dyn LocalStorage>,
    key: String,
}

impl SaveJob {
    pub fn record(&self) -> &PersistedDraft {
        &self.record
    }

    /// Writes the snapshot, blocking on the storage.
    pub fn run(&self, logger: &Logger) -> Result<(), StorageError> {
        storage::save_snapshot(&*self.storage, &self.key, &self.record, logger)
    }
}

impl fmt::Debug for SaveJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveJob")
            .field("version", &self.version)
            .field("epoch", &self.epoch)
            .field("saved_at", &self.record.saved_at)
            .field("key", &self.key)
            .finish()
    }
}

#[derive(Debug)]
pub struct DraftStore {
    draft: CreativeDraft,
    revision: Revision,
    identity_attempt: u64,
    generation_attempt: u64,
    /// Bumped by every reset, snapshots of an earlier epoch must not stay in the storage
    storage_epoch: u64,
    storage: Arc<dyn LocalStorage>,
    storage_key: String,
    utm_defaults: UtmDefaults,
    notifier: watch::Sender<Revision>,
    logger: Logger,
}

impl DraftStore {
    pub fn new(
        storage: Arc<dyn LocalStorage>,
        storage_key: impl Into<String>,
        utm_defaults: UtmDefaults,
        logger: Logger,
    ) -> Self {
        let revision = Revision::default();
        let (notifier, _) = watch::channel(revision);

        Self {
            draft: fresh_draft(&utm_defaults),
            revision,
            identity_attempt: 0,
            generation_attempt: 0,
            storage_epoch: 0,
            storage,
            storage_key: storage_key.into(),
            utm_defaults,
            notifier,
            logger,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Revision> {
        self.notifier.subscribe()
    }

    pub fn draft(&self) -> &CreativeDraft {
        &self.draft
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn is_dirty(&self) -> bool {
        self.revision.dirty
    }

    fn notify(&self) {
        self.notifier.send_replace(self.revision);
    }

    fn touch(&mut self) {
        self.revision.version += 1;
        self.revision.dirty = true;
        self.notify();
    }

    /// Replaces the draft with one that mirrors the storage, not dirty.
    fn replace(&mut self, draft: CreativeDraft) {
        self.draft = draft;
        // in-flight work belongs to the replaced draft
        self.identity_attempt += 1;
        self.generation_attempt += 1;
        self.revision.version += 1;
        self.revision.dirty = false;
        self.notify();
    }

    /// Edits the brief, re-deriving `utm_content` from the ad name unless it was set manually.
    pub fn update_brief(&mut self, update: impl FnOnce(&mut Brief)) {
        update(&mut self.draft.brief);

        let brief = &mut self.draft.brief;
        brief.utm.sync_content(&brief.ad_name);
        self.touch();
    }

    pub fn set_ad_name(&mut self, ad_name: impl Into<String>) {
        let ad_name = ad_name.into();
        self.update_brief(|brief| brief.ad_name = ad_name);
    }

    /// Sets `utm_content` manually, clearing it resumes the derivation from the ad name.
    pub fn set_utm_content(&mut self, content: impl Into<String>) {
        let content = content.into();
        self.update_brief(|brief| brief.utm.content = content);
    }

    pub fn update_ad_copy(&mut self, update: impl FnOnce(&mut AdCopy)) {
        update(&mut self.draft.ad_copy);
        self.touch();
    }

    pub fn update_preview(&mut self, update: impl FnOnce(&mut PreviewSettings)) {
        update(&mut self.draft.preview);
        self.touch();
    }

    /// Puts the asset into the slot of its role, replacing the previous one.
    pub fn attach_asset(&mut self, asset: AssetReference) -> AssetRole {
        let role = asset.role();
        let name = asset.name.clone();

        if let Some(replaced) = self.draft.brief.assets.route(asset) {
            debug!(&self.logger, "Replaced {} in the {} slot", replaced.name, role; "module" => "store");
        }
        info!(&self.logger, "Attached {} as the {} asset", name, role; "module" => "store");
        self.touch();

        role
    }

    pub fn remove_asset(&mut self, role: AssetRole) -> Option<AssetReference> {
        let removed = self.draft.brief.assets.slot_mut(role).take();
        if removed.is_some() {
            self.touch();
        }

        removed
    }

    pub fn tracked_url(&self) -> String {
        self.draft.tracked_url()
    }

    pub fn copy_limit_warnings(&self) -> Vec<CopyLimitWarning> {
        self.draft.copy_limit_warnings()
    }

    pub fn export_snapshot(&self, exported_at: DateTime<Utc>) -> ExportSnapshot {
        ExportSnapshot::new(&self.draft, exported_at)
    }

    /// Starts a new verification of the page URL, superseding any attempt in flight.
    ///
    /// An empty URL is a validation failure: the identity goes straight to `Failed` without
    /// becoming `Pending`, as there is nothing to send. Any attempt in flight is still superseded.
    pub fn begin_identity_verification(&mut self, page_url: &str) -> Option<VerificationTicket> {
        let url = normalize_url(page_url);
        self.identity_attempt += 1;
        self.draft.brief.identity_url = url.clone();

        if url.is_empty() {
            self.draft.identity = IdentityVerification::Failed {
                reason: "No page URL to verify".into(),
            };
            self.touch();

            return None;
        }

        let website = normalize_url(&self.draft.brief.website_url);
        self.draft.identity = IdentityVerification::Pending { url: url.clone() };
        self.touch();

        Some(VerificationTicket {
            attempt: self.identity_attempt,
            request: VerifyIdentityRequest {
                url,
                context_url: Some(website).filter(|website| !website.is_empty()),
            },
        })
    }

    /// Settles the verification, a `Verified` record backfills the empty website
    /// and company overview of the brief.
    ///
    /// Returns `false` when the attempt was superseded and the outcome ignored.
    pub fn complete_identity_verification(
        &mut self,
        attempt: u64,
        outcome: IdentityVerification,
    ) -> bool {
        if attempt != self.identity_attempt || !self.draft.identity.is_pending() {
            debug!(&self.logger, "Ignoring the outcome of verification attempt {}", attempt; "module" => "store", "current" => self.identity_attempt);
            return false;
        }

        if let IdentityVerification::Verified { record } = &outcome {
            let brief = &mut self.draft.brief;
            brief.backfill(record.website.as_deref(), record.description.as_deref());
            brief.utm.sync_content(&brief.ad_name);
        }

        self.draft.identity = outcome;
        self.touch();

        true
    }

    /// Starts generating copy, unless it is turned off for the draft or already in flight.
    ///
    /// The first asset with an inline payload, square first, is sent along.
    pub fn begin_generation(&mut self) -> Option<GenerationTicket> {
        if self.draft.brief.toggles.disable_ai_generation {
            self.draft.generation.error = Some("AI generation is turned off for this draft".into());
            self.touch();

            return None;
        }

        if self.draft.generation.in_flight {
            return None;
        }

        self.generation_attempt += 1;
        self.draft.generation.in_flight = true;
        self.draft.generation.error = None;
        self.touch();

        let brief = &self.draft.brief;
        let asset = brief.assets.iter().find_map(|(_, asset)| {
            asset.inline.as_ref().map(|data| InlineAsset {
                data: data.clone(),
                mime: asset.mime.clone(),
            })
        });

        Some(GenerationTicket {
            attempt: self.generation_attempt,
            request: GenerateCopyRequest {
                brief: CopyBrief {
                    ad_name: brief.ad_name.clone(),
                    company_overview: brief.company_overview.clone(),
                    website_url: normalize_url(&brief.website_url),
                    objective: brief.objective,
                    advertiser_name: self.draft.identity.record().map(|record| record.name.clone()),
                },
                asset,
            },
        })
    }

    /// Fills the copy with the generated one, returns `false` for a superseded attempt.
    pub fn complete_generation(
        &mut self,
        attempt: u64,
        result: GatewayResult<GeneratedCopy>,
    ) -> bool {
        if attempt != self.generation_attempt || !self.draft.generation.in_flight {
            debug!(&self.logger, "Ignoring the outcome of generation attempt {}", attempt; "module" => "store", "current" => self.generation_attempt);
            return false;
        }

        let generation = &mut self.draft.generation;
        generation.in_flight = false;

        match result {
            Ok(copy) => {
                let ad_copy = &mut self.draft.ad_copy;
                ad_copy.primary_text = copy.primary_text;
                ad_copy.headline = copy.headline;
                ad_copy.description = copy.description;
                if let Some(call_to_action) = copy.call_to_action {
                    ad_copy.call_to_action = call_to_action;
                }

                generation.has_generated = true;
                generation.last_generated_at = Some(Utc::now());
                generation.error = None;
            }
            Err(error) => {
                generation.error = Some(error.to_string());
            }
        }
        self.touch();

        true
    }

    /// Starts saving the draft remotely for sharing, `None` while a save is in flight.
    pub fn begin_share(&mut self, now: DateTime<Utc>) -> Option<SaveDraftRequest> {
        if self.draft.share.saving {
            return None;
        }

        self.draft.share.saving = true;
        self.draft.share.error = None;
        self.touch();

        Some(SaveDraftRequest::new(
            &self.draft,
            &self.export_snapshot(now),
        ))
    }

    pub fn complete_share(&mut self, result: GatewayResult<SharedDraft>) {
        let share = &mut self.draft.share;
        share.saving = false;

        match result {
            Ok(shared) => {
                info!(&self.logger, "Shared the draft as {}", shared.public_url; "module" => "store");
                share.shared = Some(shared);
                share.error = None;
            }
            Err(error) => share.error = Some(error.to_string()),
        }
        self.touch();
    }

    /// Replaces the draft with a persisted one, remote or local.
    ///
    /// The side-effect states start over and a pending verification is dropped,
    /// as its outcome can no longer arrive.
    pub fn hydrate(&mut self, state: PersistedState, saved_at: Option<DateTime<Utc>>) {
        let mut draft = state.into_draft();
        if draft.identity.is_pending() {
            draft.identity = IdentityVerification::Unattempted;
        }
        draft.persistence.last_saved_at = saved_at;

        self.replace(draft);
    }

    /// Hydrates from the local snapshot, returns whether there was one.
    pub fn hydrate_from_local(&mut self) -> Result<bool, StorageError> {
        match storage::load_snapshot(&*self.storage, &self.storage_key)? {
            Some(snapshot) => {
                info!(&self.logger, "Restored the draft saved at {}", snapshot.saved_at; "module" => "store");
                self.hydrate(snapshot.state, Some(snapshot.saved_at));

                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Starts over with a fresh draft and deletes the local snapshot.
    pub fn reset(&mut self) -> Result<(), StorageError> {
        self.replace(fresh_draft(&self.utm_defaults));
        self.storage_epoch += 1;

        self.storage.remove(&self.storage_key)
    }

    /// Snapshots the draft for writing to the local storage.
    pub fn begin_save(&mut self, saved_at: DateTime<Utc>) -> SaveJob {
        self.draft.persistence.saving = true;
        self.notify();

        SaveJob {
            version: self.revision.version,
            epoch: self.storage_epoch,
            record: PersistedDraft::new(&self.draft, saved_at),
            storage: Arc::clone(&self.storage),
            key: self.storage_key.clone(),
        }
    }

    /// Records the outcome of the write.
    ///
    /// The draft stays dirty when it changed during the write. A failure is kept as the
    /// persistence error until the next successful save.
    ///
    /// A write started before a reset belongs to the discarded draft, its snapshot is removed.
    pub fn complete_save(&mut self, job: &SaveJob, result: &Result<(), StorageError>) {
        self.draft.persistence.saving = false;

        if job.epoch != self.storage_epoch {
            debug!(&self.logger, "Removing the snapshot of a discarded draft"; "module" => "store", "version" => job.version);
            if let Err(remove_error) = self.storage.remove(&self.storage_key) {
                error!(&self.logger, "Removing the discarded snapshot failed"; "module" => "store", "error" => %remove_error);
            }
            self.notify();

            return;
        }

        let persistence = &mut self.draft.persistence;

        match result {
            Ok(()) => {
                persistence.last_saved_at = Some(job.record.saved_at);
                persistence.error = None;
                if job.version == self.revision.version {
                    self.revision.dirty = false;
                }
            }
            Err(save_error) => {
                error!(&self.logger, "Saving the draft failed"; "module" => "store", "error" => %save_error);
                persistence.error = Some(save_error.to_string());
            }
        }
        self.notify();
    }
}

fn fresh_draft(utm: &UtmDefaults) -> CreativeDraft {
    let mut draft = CreativeDraft::default();
    draft.brief.utm = UtmParams {
        campaign: utm.campaign.clone(),
        medium: utm.medium.clone(),
        source: utm.source.clone(),
        ..Default::default()
    };

    draft
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::storage::MemoryStorage;
    use gateway::Error;
    use primitives::{
        config::DEFAULT_CONFIG,
        test_util::{discard_logger, dummy_asset, dummy_draft, DUMMY_IDENTITY},
        Aspect, IdentityRecord, VerificationSource,
    };
    use pretty_assertions::assert_eq;

    fn setup_store(storage: Arc<MemoryStorage>) -> DraftStore {
        DraftStore::new(
            storage,
            DEFAULT_CONFIG.autosave.storage_key.clone(),
            DEFAULT_CONFIG.utm.clone(),
            discard_logger(),
        )
    }

    fn store() -> DraftStore {
        setup_store(Arc::new(MemoryStorage::new(None)))
    }

    fn verified(website: Option<&str>, description: Option<&str>) -> IdentityVerification {
        IdentityVerification::Verified {
            record: IdentityRecord {
                website: website.map(Into::into),
                description: description.map(Into::into),
                ..DUMMY_IDENTITY.clone()
            },
        }
    }

    #[test]
    fn new_drafts_start_with_utm_defaults() {
        let store = store();
        let utm = &store.draft().brief.utm;

        assert_eq!("Ignite", utm.campaign);
        assert_eq!("Facebook", utm.medium);
        assert_eq!("Townsquare", utm.source);
        assert_eq!("", utm.content);
        assert_eq!(Revision::default(), store.revision());
    }

    #[test]
    fn mutations_mark_dirty_and_notify() {
        let mut store = store();
        let mut revisions = store.subscribe();

        store.update_ad_copy(|copy| copy.headline = "Fall Sale".into());
        assert!(revisions.has_changed().unwrap());
        assert_eq!(
            Revision {
                version: 1,
                dirty: true
            },
            *revisions.borrow_and_update()
        );

        store.update_preview(|preview| preview.format = primitives::PreviewFormat::Vertical);
        assert_eq!(2, store.revision().version);
        assert!(store.is_dirty());
    }

    #[test]
    fn utm_content_follows_the_ad_name_until_edited() {
        let mut store = store();

        store.set_ad_name("Fall Sale");
        assert_eq!("fall-sale", store.draft().brief.utm.content);
        store.set_ad_name("Fall Sale 2024");
        assert_eq!("fall-sale-2024", store.draft().brief.utm.content);

        store.set_utm_content("hand-picked");
        store.set_ad_name("Winter Sale");
        assert_eq!("hand-picked", store.draft().brief.utm.content);

        store.set_utm_content("");
        assert_eq!("winter-sale", store.draft().brief.utm.content);
        store.set_ad_name("Spring Sale");
        assert_eq!("spring-sale", store.draft().brief.utm.content);
    }

    #[test]
    fn tracked_url_applies_the_utm_parameters() {
        let mut store = store();
        store.set_ad_name("Fall Sale");
        store.update_ad_copy(|copy| copy.destination_url = "ignite.example/sale?ref=fb".into());

        assert_eq!(
            "https://ignite.example/sale?ref=fb&utm_campaign=Ignite&utm_medium=Facebook&utm_source=Townsquare&utm_content=fall-sale",
            store.tracked_url()
        );

        store.update_ad_copy(|copy| copy.destination_url = "http://".into());
        assert_eq!("", store.tracked_url());
    }

    #[test]
    fn assets_are_routed_by_aspect() {
        let mut store = store();

        assert_eq!(AssetRole::Vertical, store.attach_asset(dummy_asset(Some(Aspect::Vertical))));
        assert_eq!(AssetRole::Generic, store.attach_asset(dummy_asset(None)));
        assert_eq!(AssetRole::Generic, store.attach_asset(dummy_asset(Some(Aspect::Other))));

        let assets = &store.draft().brief.assets;
        assert!(assets.square.is_none());
        assert_eq!(Some(Aspect::Other), assets.generic.as_ref().and_then(|a| a.aspect));

        assert!(store.remove_asset(AssetRole::Vertical).is_some());
        assert!(store.remove_asset(AssetRole::Vertical).is_none());
    }

    #[test]
    fn verified_identity_backfills_only_empty_fields() {
        let mut store = store();
        store.update_brief(|brief| brief.company_overview = "Our own words".into());

        let ticket = store
            .begin_identity_verification(" www.facebook.com/ignitemarketing ")
            .expect("Should start");
        assert_eq!("https://www.facebook.com/ignitemarketing", ticket.request.url);
        assert_eq!(None, ticket.request.context_url);
        assert!(store.draft().identity.is_pending());

        assert!(store.complete_identity_verification(
            ticket.attempt,
            verified(Some("https://ignite.example"), Some("Their words"))
        ));

        let brief = &store.draft().brief;
        assert_eq!("https://ignite.example", brief.website_url);
        assert_eq!("Our own words", brief.company_overview);
        assert_eq!("https://www.facebook.com/ignitemarketing", brief.identity_url);
    }

    #[test]
    fn degraded_identity_does_not_backfill() {
        let mut store = store();
        let ticket = store
            .begin_identity_verification("facebook.com/ignitemarketing")
            .expect("Should start");

        let record = IdentityRecord {
            source: VerificationSource::UrlDerived,
            ..DUMMY_IDENTITY.clone()
        };
        assert!(store.complete_identity_verification(
            ticket.attempt,
            IdentityVerification::Degraded { record }
        ));

        assert_eq!("", store.draft().brief.website_url);
        assert_eq!("degraded", store.draft().identity.status());
    }

    #[test]
    fn superseded_verification_outcomes_are_ignored() {
        let mut store = store();
        let first = store
            .begin_identity_verification("facebook.com/first")
            .expect("Should start");
        let second = store
            .begin_identity_verification("facebook.com/second")
            .expect("Should start");

        assert!(!store.complete_identity_verification(
            first.attempt,
            IdentityVerification::Failed {
                reason: "too late".into()
            }
        ));
        assert!(store.draft().identity.is_pending());

        assert!(store.complete_identity_verification(second.attempt, verified(None, None)));
        assert!(!store.complete_identity_verification(second.attempt, verified(None, None)));
        assert_eq!("verified", store.draft().identity.status());
    }

    #[test]
    fn empty_identity_url_fails_right_away() {
        let mut store = store();
        let in_flight = store
            .begin_identity_verification("facebook.com/ignitemarketing")
            .expect("Should start");

        assert_eq!(None, store.begin_identity_verification("   "));
        assert_eq!(
            IdentityVerification::Failed {
                reason: "No page URL to verify".into()
            },
            store.draft().identity
        );
        assert!(!store.complete_identity_verification(in_flight.attempt, verified(None, None)));
        assert_eq!("failed", store.draft().identity.status());
    }

    #[test]
    fn generation_fills_the_copy() {
        let mut store = setup_store(Arc::new(MemoryStorage::new(None)));
        store.hydrate(PersistedState::from_draft(&dummy_draft()), None);
        // inline payloads are not persisted, attach one again
        store.attach_asset(dummy_asset(Some(Aspect::Square)));

        let ticket = store.begin_generation().expect("Should start");
        assert_eq!(Some("Ignite Marketing".to_string()), ticket.request.brief.advertiser_name);
        assert_eq!(
            Some("image/png".to_string()),
            ticket.request.asset.as_ref().map(|asset| asset.mime.clone())
        );
        assert!(store.draft().generation.in_flight);
        assert_eq!(None, store.begin_generation(), "one generation at a time");

        let copy = crate::test_util::dummy_copy();
        assert!(store.complete_generation(ticket.attempt, Ok(copy.clone())));

        let draft = store.draft();
        assert_eq!(copy.headline, draft.ad_copy.headline);
        assert_eq!(primitives::CallToAction::ShopNow, draft.ad_copy.call_to_action);
        assert!(draft.generation.has_generated);
        assert!(!draft.generation.in_flight);
        assert!(draft.generation.last_generated_at.is_some());
    }

    #[test]
    fn generation_failure_is_recorded() {
        let mut store = store();
        let ticket = store.begin_generation().expect("Should start");

        assert!(store.complete_generation(ticket.attempt, Err(Error::Unreachable("offline".into()))));

        let generation = &store.draft().generation;
        assert!(!generation.in_flight);
        assert!(!generation.has_generated);
        assert_eq!(
            Some("Gateway unreachable: offline".to_string()),
            generation.error
        );
    }

    #[test]
    fn disabled_generation_is_refused() {
        let mut store = store();
        store.update_brief(|brief| brief.toggles.disable_ai_generation = true);

        assert_eq!(None, store.begin_generation());
        assert!(!store.draft().generation.in_flight);
        assert!(store.draft().generation.error.is_some());
    }

    #[test]
    fn share_records_the_public_url() {
        let mut store = store();
        let request = store.begin_share(Utc::now()).expect("Should start");
        assert!(request.draft.brief.assets.is_empty());
        assert_eq!(None, store.begin_share(Utc::now()));

        let shared = SharedDraft {
            short_id: "d00001".into(),
            public_url: "https://dummy.gateway/share/d00001".parse().unwrap(),
        };
        store.complete_share(Ok(shared.clone()));
        assert_eq!(Some(shared), store.draft().share.shared);
        assert!(!store.draft().share.saving);

        store.begin_share(Utc::now()).expect("Should start again");
        store.complete_share(Err(Error::Rejected("Too large".into())));
        assert_eq!(
            Some("Gateway rejected the request: Too large".to_string()),
            store.draft().share.error
        );
    }

    #[test]
    fn save_then_hydrate_restores_the_draft_without_payloads() {
        let storage = Arc::new(MemoryStorage::new(None));
        let mut store = setup_store(storage.clone());
        store.hydrate(PersistedState::from_draft(&dummy_draft()), None);
        store.attach_asset(dummy_asset(Some(Aspect::Vertical)));

        let job = store.begin_save(Utc::now());
        assert!(store.draft().persistence.saving);
        let result = job.run(&discard_logger());
        store.complete_save(&job, &result);
        assert!(!store.is_dirty());
        assert!(!store.draft().persistence.saving);
        assert_eq!(Some(job.record().saved_at), store.draft().persistence.last_saved_at);

        let mut restored = setup_store(storage);
        assert!(restored.hydrate_from_local().expect("Should load"));
        assert!(!restored.is_dirty());

        let assets = &restored.draft().brief.assets;
        let vertical = assets.vertical.as_ref().expect("Should be restored");
        assert!(vertical.inline.is_none());
        assert!(vertical.remote_url.is_some());
        assert_eq!(store.draft().ad_copy, restored.draft().ad_copy);
        assert_eq!(store.draft().identity, restored.draft().identity);
    }

    #[test]
    fn changes_during_a_save_keep_the_draft_dirty() {
        let mut store = store();
        store.set_ad_name("Fall Sale");

        let job = store.begin_save(Utc::now());
        store.set_ad_name("Fall Sale 2024");
        let result = job.run(&discard_logger());
        store.complete_save(&job, &result);

        assert!(store.is_dirty());
        assert!(store.draft().persistence.last_saved_at.is_some());
    }

    #[test]
    fn failed_save_is_sticky_until_the_next_success() {
        let storage = Arc::new(MemoryStorage::new(Some(16)));
        let mut store = setup_store(storage);
        store.set_ad_name("Fall Sale");

        let job = store.begin_save(Utc::now());
        let result = job.run(&discard_logger());
        assert!(result.is_err());
        store.complete_save(&job, &result);

        assert!(store.is_dirty());
        let error = store.draft().persistence.error.clone().expect("Should be kept");
        assert!(error.starts_with("Storage quota exceeded"), "{error}");

        store.set_ad_name("Fall Sale 2024");
        assert!(store.draft().persistence.error.is_some());
    }

    #[test]
    fn pending_verification_is_not_hydrated() {
        let mut store = store();
        let mut state = PersistedState::from_draft(&dummy_draft());
        state.identity = IdentityVerification::Pending {
            url: "https://www.facebook.com/ignitemarketing".into(),
        };

        store.hydrate(state, None);
        assert_eq!(IdentityVerification::Unattempted, store.draft().identity);
    }

    #[test]
    fn reset_discards_the_draft_and_the_snapshot() {
        let storage = Arc::new(MemoryStorage::new(None));
        let mut store = setup_store(storage.clone());
        store.set_ad_name("Fall Sale");
        let job = store.begin_save(Utc::now());
        let result = job.run(&discard_logger());
        store.complete_save(&job, &result);
        let ticket = store
            .begin_identity_verification("facebook.com/ignitemarketing")
            .expect("Should start");

        store.reset().expect("Should reset");

        assert_eq!(None, storage.get(&DEFAULT_CONFIG.autosave.storage_key).unwrap());
        assert_eq!("", store.draft().brief.ad_name);
        assert_eq!("Ignite", store.draft().brief.utm.campaign);
        assert!(!store.is_dirty());
        assert!(
            !store.complete_identity_verification(ticket.attempt, verified(None, None)),
            "the verification belonged to the discarded draft"
        );
        assert!(!setup_store(storage).hydrate_from_local().unwrap());
    }

    #[test]
    fn save_in_flight_during_a_reset_is_discarded() {
        let storage = Arc::new(MemoryStorage::new(None));
        let mut store = setup_store(storage.clone());
        store.set_ad_name("Discard me");

        let job = store.begin_save(Utc::now());
        store.reset().expect("Should reset");
        let result = job.run(&discard_logger());
        assert!(result.is_ok());
        store.complete_save(&job, &result);

        assert_eq!(None, storage.get(&DEFAULT_CONFIG.autosave.storage_key).unwrap());
        assert!(!store.draft().persistence.saving);
        assert_eq!(None, store.draft().persistence.last_saved_at);
        assert!(!setup_store(storage).hydrate_from_local().unwrap());
    }

    #[test]
    fn copy_limit_warnings_respect_the_override() {
        let mut store = store();
        store.update_ad_copy(|copy| copy.headline = "h".repeat(41));

        assert_eq!(1, store.copy_limit_warnings().len());

        store.update_brief(|brief| brief.toggles.override_char_limits = true);
        assert!(store.copy_limit_warnings().is_empty());
    }
}
