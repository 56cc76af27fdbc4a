//! Capturing the rendered ad preview.
use async_trait::async_trait;
use parse_display::Display;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(style = "lowercase")]
pub enum TextExpansion {
    /// Long primary text is cut with a "See more"
    Truncated,
    Expanded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[display(style = "lowercase")]
pub enum RasterFormat {
    Png,
    Jpeg,
}

impl RasterFormat {
    pub const ALL: [RasterFormat; 2] = [RasterFormat::Png, RasterFormat::Jpeg];

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("The preview is not rendered")]
    NotRendered,
    #[error("Capturing the preview as {format} failed: {reason}")]
    Failed { format: RasterFormat, reason: String },
}

/// The surface the ad preview is rendered on.
#[async_trait]
pub trait PreviewSurface: Send + Sync {
    fn text_expansion(&self) -> TextExpansion;

    fn set_text_expansion(&self, expansion: TextExpansion);

    async fn capture(&self, format: RasterFormat) -> Result<Vec<u8>, CaptureError>;
}

/// Shows the full primary text while alive, restores the previous expansion when dropped,
/// including on early returns and failed captures.
pub struct ExpandedText<'a> {
    surface: &'a dyn PreviewSurface,
    previous: TextExpansion,
}

impl<'a> ExpandedText<'a> {
    pub fn force(surface: &'a dyn PreviewSurface) -> Self {
        let previous = surface.text_expansion();
        surface.set_text_expansion(TextExpansion::Expanded);

        Self { surface, previous }
    }

    pub fn surface(&self) -> &'a dyn PreviewSurface {
        self.surface
    }
}

impl Drop for ExpandedText<'_> {
    fn drop(&mut self) {
        self.surface.set_text_expansion(self.previous);
    }
}
