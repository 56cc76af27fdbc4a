//! The [`Dummy`] in-memory [`Gateway`] intended for testing.
//!
//! Every call succeeds by default. Failures can be scripted per [`Call`]
//! and every call is counted.
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parse_display::Display;
use primitives::{IdentityRecord, SharedDraft};
use url::Url;

use crate::{
    Error, Gateway, GatewayResult, GenerateCopyRequest, GeneratedCopy, SaveDraftRequest,
    UploadRequest, VerifyIdentityRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display(style = "kebab-case")]
pub enum Call {
    VerifyIdentity,
    GenerateCopy,
    UploadAsset,
    SaveDraft,
    FetchAsset,
}

#[derive(Debug, Clone)]
pub struct Options {
    /// Returned by every successful identity verification
    pub dummy_identity: IdentityRecord,
    /// Returned by every successful copy generation
    pub dummy_copy: GeneratedCopy,
    /// Uploaded assets and saved drafts are given urls under this base
    pub dummy_base_url: Url,
}

/// Dummy gateway implementation intended for testing.
#[derive(Debug)]
pub struct Dummy {
    options: Options,
    failures: DashMap<Call, Error>,
    calls: DashMap<Call, usize>,
    /// Remote assets by pointer
    assets: DashMap<Url, Vec<u8>>,
    uploads: AtomicUsize,
}

impl Dummy {
    pub fn init(options: Options) -> Self {
        Self {
            options,
            failures: Default::default(),
            calls: Default::default(),
            assets: Default::default(),
            uploads: AtomicUsize::new(0),
        }
    }

    /// Makes every following `call` fail with `error`, until [`Dummy::recover`] is called.
    pub fn fail(&self, call: Call, error: Error) {
        self.failures.insert(call, error);
    }

    pub fn recover(&self, call: Call) {
        self.failures.remove(&call);
    }

    /// How many times `call` was made, including the failed ones
    pub fn call_count(&self, call: Call) -> usize {
        self.calls.get(&call).map(|count| *count).unwrap_or_default()
    }

    /// Serves `bytes` for the pointer through [`Gateway::fetch_asset`].
    pub fn set_remote_asset(&self, url: Url, bytes: Vec<u8>) {
        self.assets.insert(url, bytes);
    }

    pub fn remote_asset(&self, url: &Url) -> Option<Vec<u8>> {
        self.assets.get(url).map(|bytes| bytes.clone())
    }

    fn track(&self, call: Call) -> GatewayResult<()> {
        *self.calls.entry(call).or_default() += 1;

        match self.failures.get(&call) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn url(&self, path: &str) -> GatewayResult<Url> {
        self.options
            .dummy_base_url
            .join(path)
            .map_err(|error| Error::Rejected(error.to_string()))
    }
}

#[async_trait]
impl Gateway for Dummy {
    async fn verify_identity(
        &self,
        _request: &VerifyIdentityRequest,
    ) -> GatewayResult<IdentityRecord> {
        self.track(Call::VerifyIdentity)?;

        Ok(self.options.dummy_identity.clone())
    }

    async fn generate_copy(&self, _request: &GenerateCopyRequest) -> GatewayResult<GeneratedCopy> {
        self.track(Call::GenerateCopy)?;

        Ok(self.options.dummy_copy.clone())
    }

    /// Stores the decoded payload, so it can be fetched back from the returned pointer.
    async fn upload_asset(&self, request: &UploadRequest) -> GatewayResult<Url> {
        self.track(Call::UploadAsset)?;

        let (_header, payload) = request
            .data
            .as_str()
            .split_once(',')
            .ok_or_else(|| Error::Rejected("Payload is not a data URI".into()))?;
        let bytes = base64::decode(payload).map_err(|error| Error::Rejected(error.to_string()))?;

        let upload = self.uploads.fetch_add(1, Ordering::SeqCst);
        let url = self.url(&format!("assets/{upload}/{}", request.file_name))?;
        self.assets.insert(url.clone(), bytes);

        Ok(url)
    }

    async fn save_draft(&self, _request: &SaveDraftRequest) -> GatewayResult<SharedDraft> {
        self.track(Call::SaveDraft)?;

        let short_id = format!("d{:05}", self.call_count(Call::SaveDraft));

        Ok(SharedDraft {
            public_url: self.url(&format!("share/{short_id}"))?,
            short_id,
        })
    }

    async fn fetch_asset(&self, url: &Url) -> GatewayResult<Vec<u8>> {
        self.track(Call::FetchAsset)?;

        self.remote_asset(url)
            .ok_or_else(|| Error::Rejected(format!("404 Not Found: {url}")))
    }
}
