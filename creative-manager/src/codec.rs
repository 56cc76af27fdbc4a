//! Transport-safe inline encoding of raw files.
//!
//! Files are encoded as `data:{mime};base64,{payload}` URIs, where the MIME type is
//! normalized from the file signature and extension rather than trusting the reported one.
use std::{io::Cursor, path::Path};

use image::{ImageFormat, ImageReader};
use primitives::{Dimensions, InlinePayload};
use thiserror::Error;

pub const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Not a data URI")]
    NotADataUri,
    #[error("Only base64 data URIs are supported")]
    NotBase64,
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A file as selected by the user, before ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    pub name: String,
    /// The MIME type reported along with the file, often missing or wrong
    pub reported_mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl RawFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            reported_mime: None,
            bytes,
        }
    }

    pub fn with_reported_mime(mut self, mime: impl Into<String>) -> Self {
        self.reported_mime = Some(mime.into());
        self
    }

    /// Reads the file from disk, the reported MIME type is left empty.
    pub async fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self::new(name, bytes))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAsset {
    pub mime: String,
    pub payload: InlinePayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAsset {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Encodes the file with its normalized MIME type.
pub fn encode(file: &RawFile) -> EncodedAsset {
    let mime = normalize_mime(&file.name, file.reported_mime.as_deref(), &file.bytes);
    let payload = to_data_uri(&mime, &file.bytes);

    EncodedAsset { mime, payload }
}

pub fn to_data_uri(mime: &str, bytes: &[u8]) -> InlinePayload {
    InlinePayload::new(format!("data:{mime};base64,{}", base64::encode(bytes)))
}

/// Decodes a base64 data URI back into the raw bytes.
pub fn decode(payload: &InlinePayload) -> Result<DecodedAsset, CodecError> {
    let uri = payload
        .as_str()
        .strip_prefix("data:")
        .ok_or(CodecError::NotADataUri)?;
    let (header, data) = uri.split_once(',').ok_or(CodecError::NotADataUri)?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or(CodecError::NotBase64)?;

    Ok(DecodedAsset {
        mime: if mime.is_empty() { OCTET_STREAM } else { mime }.to_string(),
        bytes: base64::decode(data)?,
    })
}

/// The MIME type of the file, decided by the first that is known of:
///
/// 1. the image signature of the bytes
/// 2. the image format of the extension
/// 3. the reported MIME type, with common aliases corrected
///
/// and `application/octet-stream` otherwise.
pub fn normalize_mime(name: &str, reported: Option<&str>, bytes: &[u8]) -> String {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type().to_string();
    }

    let from_extension = Path::new(name)
        .extension()
        .and_then(ImageFormat::from_extension)
        .map(|format| format.to_mime_type());
    if let Some(mime) = from_extension {
        return mime.to_string();
    }

    reported
        .map(|mime| mime.trim().to_ascii_lowercase())
        .filter(|mime| !mime.is_empty() && mime != OCTET_STREAM)
        .map(|mime| match mime.as_str() {
            "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
            "image/x-png" => "image/png".to_string(),
            _ => mime,
        })
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

/// Decodes only as much of the image as needed for its pixel size.
pub fn probe_dimensions(bytes: &[u8]) -> image::ImageResult<Dimensions> {
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()?;

    Ok(Dimensions::new(width, height))
}
