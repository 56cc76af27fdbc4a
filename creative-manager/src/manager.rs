//! Drives the [`DraftStore`] through the remote [`Gateway`].
use std::sync::Arc;

use chrono::Utc;
use gateway::Gateway;
use primitives::{AssetRole, Config, IdentityVerification, ShareState};
use slog::{debug, Logger};
use tokio::{sync::RwLock, task::JoinHandle};

use crate::{
    autosave,
    codec::RawFile,
    export::{Bundle, BundleAssembler, ExportError, PreviewSurface},
    identity, ingest,
    storage::{LocalStorage, StorageError},
    store::DraftStore,
};

pub type SharedStore = Arc<RwLock<DraftStore>>;

#[derive(Debug)]
pub struct Manager<G: Gateway> {
    config: Config,
    gateway: Arc<G>,
    store: SharedStore,
    logger: Logger,
}

impl<G: Gateway> Manager<G> {
    pub fn new(
        config: Config,
        gateway: Arc<G>,
        storage: Arc<dyn LocalStorage>,
        logger: Logger,
    ) -> Self {
        let store = DraftStore::new(
            storage,
            config.autosave.storage_key.clone(),
            config.utm.clone(),
            logger.clone(),
        );

        Self {
            config,
            gateway,
            store: Arc::new(RwLock::new(store)),
            logger,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Starts saving the draft after every burst of changes.
    pub fn spawn_autosave(&self) -> JoinHandle<()> {
        autosave::spawn(
            &self.store,
            self.config.autosave.debounce(),
            self.logger.clone(),
        )
    }

    pub async fn hydrate_from_local(&self) -> Result<bool, StorageError> {
        self.store.write().await.hydrate_from_local()
    }

    /// Ingests the file and puts it into the slot of its aspect.
    pub async fn ingest_asset(&self, file: RawFile) -> AssetRole {
        let asset = ingest::ingest(&*self.gateway, file, &self.logger).await;

        self.store.write().await.attach_asset(asset)
    }

    /// Verifies the page and returns the identity of the draft afterwards.
    ///
    /// When another verification started meanwhile, its state is returned instead.
    pub async fn verify_identity(&self, page_url: &str) -> IdentityVerification {
        let ticket = self.store.write().await.begin_identity_verification(page_url);

        if let Some(ticket) = ticket {
            let outcome = identity::verify(
                &*self.gateway,
                &ticket.request,
                &self.config.identity,
                &self.logger,
            )
            .await;

            self.store
                .write()
                .await
                .complete_identity_verification(ticket.attempt, outcome);
        }

        self.store.read().await.draft().identity.clone()
    }

    /// Generates the copy, returns whether it was filled in.
    pub async fn generate_copy(&self) -> bool {
        let ticket = match self.store.write().await.begin_generation() {
            Some(ticket) => ticket,
            None => {
                debug!(&self.logger, "Copy generation not started"; "module" => "manager");
                return false;
            }
        };

        let result = self.gateway.generate_copy(&ticket.request).await;
        let generated = result.is_ok();
        let applied = self
            .store
            .write()
            .await
            .complete_generation(ticket.attempt, result);

        generated && applied
    }

    /// Saves the draft remotely and returns the resulting share state.
    pub async fn share(&self) -> ShareState {
        let request = self.store.write().await.begin_share(Utc::now());

        if let Some(request) = request {
            let result = self.gateway.save_draft(&request).await;
            self.store.write().await.complete_share(result);
        }

        self.store.read().await.draft().share.clone()
    }

    /// Assembles the export bundle of the draft as it is now.
    pub async fn export(
        &self,
        preview: Option<&dyn PreviewSurface>,
    ) -> Result<Bundle, ExportError> {
        let snapshot = self.store.read().await.export_snapshot(Utc::now());

        let assembler =
            BundleAssembler::new(&*self.gateway, &self.config.export, self.logger.clone());
        match preview {
            Some(surface) => assembler.with_preview(surface).assemble(&snapshot).await,
            None => assembler.assemble(&snapshot).await,
        }
    }
}
