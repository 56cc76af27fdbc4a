//! Turns a raw file into an [`AssetReference`].
//!
//! The inline payload is always kept so that the asset stays exportable even when the upload
//! fails, and the dimensions are best effort.
use gateway::{Gateway, UploadRequest};
use primitives::{Aspect, AssetReference, Dimensions};
use slog::{debug, warn, Logger};
use url::Url;

use crate::codec::{self, RawFile};

pub async fn ingest<G: Gateway + ?Sized>(
    gateway: &G,
    file: RawFile,
    logger: &Logger,
) -> AssetReference {
    let encoded = codec::encode(&file);
    let dimensions = probe(file.bytes.clone(), &file.name, logger).await;

    let request = UploadRequest {
        data: encoded.payload.clone(),
        file_name: file.name.clone(),
        mime: encoded.mime.clone(),
    };
    let remote_url = upload(gateway, &request, logger).await;

    AssetReference {
        size: file.bytes.len() as u64,
        name: file.name,
        mime: encoded.mime,
        dimensions,
        aspect: dimensions.map(Aspect::classify),
        remote_url,
        inline: Some(encoded.payload),
    }
}

/// The dimensions of the image, decoded off the async runtime.
async fn probe(bytes: Vec<u8>, name: &str, logger: &Logger) -> Option<Dimensions> {
    match tokio::task::spawn_blocking(move || codec::probe_dimensions(&bytes)).await {
        Ok(Ok(dimensions)) => Some(dimensions),
        Ok(Err(error)) => {
            debug!(logger, "No dimensions for {}: {}", name, error; "module" => "ingest");
            None
        }
        Err(error) => {
            warn!(logger, "Probing {} was interrupted: {}", name, error; "module" => "ingest");
            None
        }
    }
}

async fn upload<G: Gateway + ?Sized>(
    gateway: &G,
    request: &UploadRequest,
    logger: &Logger,
) -> Option<Url> {
    match gateway.upload_asset(request).await {
        Ok(url) => Some(url),
        Err(error) => {
            warn!(logger, "Upload of {} failed, keeping the inline copy only", request.file_name; "module" => "ingest", "error" => %error);
            None
        }
    }
}
