#![deny(rust_2018_idioms)]
#![deny(clippy::all)]
//! The boundary to the creative REST API.
//!
//! Every call either succeeds or fails with a closed [`Error`], telling apart a service which
//! could not be reached from a service which declined the request.

use std::fmt;

use async_trait::async_trait;
use primitives::{IdentityRecord, SharedDraft};
use url::Url;

pub use self::{
    error::{Error, GatewayResult},
    http::HttpGateway,
    request::{
        CopyBrief, GenerateCopyRequest, GeneratedCopy, InlineAsset, SaveDraftRequest,
        UploadRequest, VerifyIdentityRequest,
    },
};

#[cfg(any(test, feature = "test-util"))]
pub mod dummy;
mod error;
pub mod http;
mod request;

#[async_trait]
pub trait Gateway: fmt::Debug + Send + Sync {
    /// Looks up the advertiser page behind the url.
    async fn verify_identity(
        &self,
        request: &VerifyIdentityRequest,
    ) -> GatewayResult<IdentityRecord>;

    /// Generates ad copy from the brief and, optionally, the creative.
    async fn generate_copy(&self, request: &GenerateCopyRequest) -> GatewayResult<GeneratedCopy>;

    /// Uploads the inline encoded asset and returns the pointer to the stored copy.
    async fn upload_asset(&self, request: &UploadRequest) -> GatewayResult<Url>;

    /// Saves the draft remotely for sharing.
    async fn save_draft(&self, request: &SaveDraftRequest) -> GatewayResult<SharedDraft>;

    /// Downloads the bytes behind a remote asset pointer.
    async fn fetch_asset(&self, url: &Url) -> GatewayResult<Vec<u8>>;
}
