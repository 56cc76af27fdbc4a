//! Ingested creative assets and the slots of the [`Brief`](crate::Brief) they are routed to.
use std::fmt;

use parse_display::Display;
use serde::{Deserialize, Serialize};
use url::Url;

/// Both aspect classes accept a width/height ratio within this distance of the target ratio.
pub const ASPECT_TOLERANCE: f64 = 0.01;

/// 9:16, the ratio of the canonical 1080x1920 vertical creative
const VERTICAL_RATIO: f64 = 9.0 / 16.0;

/// Pixel size of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{width}x{height}")]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
#[display(style = "camelCase")]
pub enum Aspect {
    Square,
    Vertical,
    Other,
}

impl Aspect {
    /// Classifies the dimensions using [`ASPECT_TOLERANCE`] for both the 1:1 and the 9:16 ratio.
    ///
    /// A degenerate size (zero width or height) is always [`Aspect::Other`].
    pub fn classify(dimensions: Dimensions) -> Self {
        if dimensions.width == 0 || dimensions.height == 0 {
            return Self::Other;
        }

        let ratio = f64::from(dimensions.width) / f64::from(dimensions.height);

        if (ratio - 1.0).abs() <= ASPECT_TOLERANCE {
            Self::Square
        } else if (ratio - VERTICAL_RATIO).abs() <= ASPECT_TOLERANCE {
            Self::Vertical
        } else {
            Self::Other
        }
    }

    /// The slot an asset of this aspect is routed to.
    pub fn role(&self) -> AssetRole {
        match self {
            Self::Square => AssetRole::Square,
            Self::Vertical => AssetRole::Vertical,
            Self::Other => AssetRole::Generic,
        }
    }
}

/// The slot of [`AssetSlots`] holding an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
#[display(style = "camelCase")]
pub enum AssetRole {
    Square,
    Vertical,
    /// An asset which is neither square nor vertical, or whose dimensions are unknown.
    Generic,
}

impl AssetRole {
    pub const ALL: [AssetRole; 3] = [AssetRole::Square, AssetRole::Vertical, AssetRole::Generic];

    /// The file stem placements conventionally expect for this slot, without extension.
    pub fn canonical_stem(&self) -> &'static str {
        match self {
            Self::Square => "square_1080x1080",
            Self::Vertical => "vertical_1080x1920",
            Self::Generic => "creative",
        }
    }
}

/// A `data:{mime};base64,{payload}` URI carrying the full asset bytes.
///
/// Only kept in memory, it never survives long-term persistence.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InlinePayload(String);

impl InlinePayload {
    pub fn new(data_uri: String) -> Self {
        Self(data_uri)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the encoded URI in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// The payload is usually megabytes of base64, keep it out of the logs
impl fmt::Debug for InlinePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = self.0.split(',').next().unwrap_or_default();
        write!(f, "InlinePayload({header},<{} bytes>)", self.0.len())
    }
}

/// Metadata and dual storage of a single ingested image.
///
/// Freshly ingested assets always carry the [`InlinePayload`] and, when the upload succeeded,
/// the `remote_url` as well. After a round-trip through local persistence only the metadata
/// and the `remote_url` are left, see [`AssetReference::stripped`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetReference {
    /// The original file name
    pub name: String,
    /// Size of the raw file in bytes
    pub size: u64,
    /// Normalized MIME type
    pub mime: String,
    /// `None` when the dimensions of the image could not be decoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect: Option<Aspect>,
    /// The pointer returned by a successful upload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline: Option<InlinePayload>,
}

impl AssetReference {
    /// The slot of this asset, assets without classification go to [`AssetRole::Generic`].
    pub fn role(&self) -> AssetRole {
        self.aspect
            .map(|aspect| aspect.role())
            .unwrap_or(AssetRole::Generic)
    }

    /// A copy without the [`InlinePayload`], safe for long-term persistence.
    pub fn stripped(&self) -> Self {
        Self {
            inline: None,
            ..self.clone()
        }
    }

    /// Whether any source of the bytes is still available
    pub fn has_source(&self) -> bool {
        self.remote_url.is_some() || self.inline.is_some()
    }

    /// The extension matching the normalized MIME type, falling back to the one of the file name.
    pub fn extension(&self) -> &str {
        match self.mime.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/bmp" => "bmp",
            "image/tiff" => "tiff",
            "image/avif" => "avif",
            "video/mp4" => "mp4",
            _ => self
                .name
                .rsplit_once('.')
                .map(|(_, extension)| extension)
                .filter(|extension| !extension.is_empty())
                .unwrap_or("bin"),
        }
    }
}

/// The asset slots of a [`Brief`](crate::Brief).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetSlots {
    pub square: Option<AssetReference>,
    pub vertical: Option<AssetReference>,
    pub generic: Option<AssetReference>,
}

impl AssetSlots {
    pub fn get(&self, role: AssetRole) -> Option<&AssetReference> {
        match role {
            AssetRole::Square => self.square.as_ref(),
            AssetRole::Vertical => self.vertical.as_ref(),
            AssetRole::Generic => self.generic.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, role: AssetRole) -> &mut Option<AssetReference> {
        match role {
            AssetRole::Square => &mut self.square,
            AssetRole::Vertical => &mut self.vertical,
            AssetRole::Generic => &mut self.generic,
        }
    }

    /// Puts the asset in the slot of its [`AssetReference::role`], returning the replaced one.
    pub fn route(&mut self, asset: AssetReference) -> Option<AssetReference> {
        self.slot_mut(asset.role()).replace(asset)
    }

    /// Populated slots in [`AssetRole::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (AssetRole, &AssetReference)> + '_ {
        AssetRole::ALL
            .into_iter()
            .filter_map(move |role| self.get(role).map(|asset| (role, asset)))
    }

    pub fn stripped(&self) -> Self {
        Self {
            square: self.square.as_ref().map(AssetReference::stripped),
            vertical: self.vertical.as_ref().map(AssetReference::stripped),
            generic: self.generic.as_ref().map(AssetReference::stripped),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}
