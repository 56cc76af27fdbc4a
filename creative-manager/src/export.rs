//! Assembles the downloadable bundle of a draft.
//!
//! Every section of the bundle is produced independently: a failing section is recorded as a
//! [`SectionWarning`] and the remaining sections are still bundled. Only failing to write the
//! manifest or to finalize the archive fails the export.
use std::io::{Cursor, Write};

use gateway::Gateway;
use parse_display::Display;
use primitives::{
    config::ExportConfig, util::slug::sanitize_file_name, AssetReference, AssetRole,
    ExportSnapshot,
};
use serde::Serialize;
use slog::{info, warn, Logger};
use thiserror::Error;
use zip::{result::ZipError, write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::codec::{self, CodecError};

pub use self::preview::{CaptureError, ExpandedText, PreviewSurface, RasterFormat, TextExpansion};

pub mod preview;
pub mod render;

pub const MANIFEST: &str = "manifest.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "camelCase")]
#[display(style = "camelCase")]
pub enum Section {
    Snapshot,
    Spreadsheet,
    Summary,
    Previews,
    Creatives,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Display)]
#[display("{section}: {message}")]
pub struct SectionWarning {
    pub section: Section,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum SectionError {
    #[error("Serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("No preview surface is mounted")]
    NoPreviewSurface,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Writing the manifest: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("Finalizing the archive: {0}")]
    Finalize(#[from] ZipError),
}

/// Where the bytes of a bundled asset came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "camelCase")]
#[display(style = "camelCase")]
pub enum AssetSource {
    Remote,
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundledCreative {
    pub role: AssetRole,
    pub source: AssetSource,
    pub original: String,
    pub canonical: String,
}

#[derive(Debug, Clone)]
pub struct Bundle {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Paths of the bundled files, the manifest last
    pub files: Vec<String>,
    pub creatives: Vec<BundledCreative>,
    pub warnings: Vec<SectionWarning>,
}

#[derive(Debug, Default)]
struct SectionOutput {
    files: Vec<(String, Vec<u8>)>,
    warnings: Vec<String>,
    creatives: Vec<BundledCreative>,
}

impl SectionOutput {
    fn file(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            files: vec![(path.into(), bytes)],
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest<'a> {
    exported_at: String,
    ad_name: &'a str,
    tracked_url: &'a str,
    identity: &'a str,
    files: &'a [String],
    creatives: &'a [BundledCreative],
    warnings: &'a [SectionWarning],
}

/// The archive being written.
struct Archive {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    files: Vec<String>,
    creatives: Vec<BundledCreative>,
    warnings: Vec<SectionWarning>,
    logger: Logger,
}

impl Archive {
    fn new(logger: Logger) -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            files: Vec::new(),
            creatives: Vec::new(),
            warnings: Vec::new(),
            logger,
        }
    }

    fn warn(&mut self, section: Section, message: String) {
        warn!(&self.logger, "Export section degraded"; "module" => "export", "section" => %section, "reason" => &message);

        self.warnings.push(SectionWarning { section, message });
    }

    fn write(&mut self, path: &str, bytes: &[u8]) -> Result<(), ZipError> {
        // already compressed formats are stored as they are
        let compression = match path.rsplit_once('.').map(|(_, extension)| extension) {
            Some("json" | "csv" | "txt") => CompressionMethod::Deflated,
            _ => CompressionMethod::Stored,
        };
        let options = SimpleFileOptions::default().compression_method(compression);

        self.zip.start_file(path, options)?;
        self.zip.write_all(bytes)?;
        self.files.push(path.to_string());

        Ok(())
    }

    fn section(&mut self, section: Section, output: Result<SectionOutput, SectionError>) {
        let output = match output {
            Ok(output) => output,
            Err(error) => return self.warn(section, error.to_string()),
        };

        for (path, bytes) in output.files {
            if let Err(error) = self.write(&path, &bytes) {
                self.warn(section, format!("Writing {path}: {error}"));
            }
        }
        for message in output.warnings {
            self.warn(section, message);
        }
        self.creatives.extend(output.creatives);
    }

    fn finish(
        mut self,
        snapshot: &ExportSnapshot,
        file_name: String,
    ) -> Result<Bundle, ExportError> {
        let mut files = self.files.clone();
        files.push(MANIFEST.to_string());

        let manifest = serde_json::to_vec_pretty(&Manifest {
            exported_at: snapshot.exported_at.to_rfc3339(),
            ad_name: &snapshot.brief.ad_name,
            tracked_url: &snapshot.tracked_url,
            identity: snapshot.identity.status(),
            files: &files,
            creatives: &self.creatives,
            warnings: &self.warnings,
        })?;
        self.write(MANIFEST, &manifest)?;

        let bytes = self.zip.finish()?.into_inner();

        Ok(Bundle {
            file_name,
            bytes,
            files: self.files,
            creatives: self.creatives,
            warnings: self.warnings,
        })
    }
}

pub struct BundleAssembler<'a, G: Gateway + ?Sized> {
    gateway: &'a G,
    preview: Option<&'a dyn PreviewSurface>,
    config: &'a ExportConfig,
    logger: Logger,
}

impl<'a, G: Gateway + ?Sized> BundleAssembler<'a, G> {
    pub fn new(gateway: &'a G, config: &'a ExportConfig, logger: Logger) -> Self {
        Self {
            gateway,
            preview: None,
            config,
            logger,
        }
    }

    /// Captures the previews from the `surface`, without one the previews are skipped.
    pub fn with_preview(mut self, surface: &'a dyn PreviewSurface) -> Self {
        self.preview = Some(surface);
        self
    }

    pub async fn assemble(&self, snapshot: &ExportSnapshot) -> Result<Bundle, ExportError> {
        let base = render::base_name(snapshot, &self.config.archive_prefix);
        let mut archive = Archive::new(self.logger.clone());

        archive.section(
            Section::Snapshot,
            render::snapshot_json(snapshot)
                .map(|json| SectionOutput::file(format!("{base}.json"), json))
                .map_err(SectionError::from),
        );
        archive.section(
            Section::Spreadsheet,
            Ok(SectionOutput::file(
                format!("{base}.csv"),
                render::spreadsheet(snapshot),
            )),
        );
        archive.section(
            Section::Summary,
            Ok(SectionOutput::file(
                format!("{base}.txt"),
                render::summary(snapshot).into_bytes(),
            )),
        );
        archive.section(Section::Previews, self.previews(&base).await);
        archive.section(Section::Creatives, self.creatives(snapshot).await);

        let bundle = archive.finish(snapshot, render::archive_name(&base, snapshot.exported_at))?;
        info!(&self.logger, "Assembled {}", bundle.file_name; "module" => "export", "files" => bundle.files.len(), "warnings" => bundle.warnings.len());

        Ok(bundle)
    }

    /// Captures the preview in every raster format with the primary text expanded.
    ///
    /// A failed format is a warning, the other formats are still bundled.
    async fn previews(&self, base: &str) -> Result<SectionOutput, SectionError> {
        let surface = self.preview.ok_or(SectionError::NoPreviewSurface)?;
        let expanded = ExpandedText::force(surface);

        let mut output = SectionOutput::default();
        for format in RasterFormat::ALL {
            match expanded.surface().capture(format).await {
                Ok(bytes) => output.files.push((
                    format!("previews/{base}-preview.{}", format.extension()),
                    bytes,
                )),
                Err(error) => output.warnings.push(error.to_string()),
            }
        }

        Ok(output)
    }

    /// Bundles every populated slot under its original name and its canonical name.
    async fn creatives(&self, snapshot: &ExportSnapshot) -> Result<SectionOutput, SectionError> {
        let mut output = SectionOutput::default();

        for (role, asset) in snapshot.brief.assets.iter() {
            let (source, bytes) = match self.resolve(asset).await {
                Ok(resolved) => resolved,
                Err(reason) => {
                    output
                        .warnings
                        .push(format!("Skipped the {role} asset {}: {reason}", asset.name));
                    continue;
                }
            };

            let original = format!(
                "creatives/original/{role}-{}",
                sanitize_file_name(&asset.name)
            );
            let canonical = format!(
                "creatives/{}.{}",
                role.canonical_stem(),
                asset.extension()
            );

            output.files.push((original.clone(), bytes.clone()));
            output.files.push((canonical.clone(), bytes));
            output.creatives.push(BundledCreative {
                role,
                source,
                original,
                canonical,
            });
        }

        Ok(output)
    }

    /// The bytes behind the remote pointer, falling back to the inline payload.
    async fn resolve(&self, asset: &AssetReference) -> Result<(AssetSource, Vec<u8>), String> {
        if let Some(url) = &asset.remote_url {
            match self.gateway.fetch_asset(url).await {
                Ok(bytes) => return Ok((AssetSource::Remote, bytes)),
                Err(error) => {
                    warn!(&self.logger, "Fetching {} failed, falling back to the inline copy", url; "module" => "export", "error" => %error);
                }
            }
        }

        match &asset.inline {
            Some(payload) => codec::decode(payload)
                .map(|decoded| (AssetSource::Inline, decoded.bytes))
                .map_err(|error: CodecError| error.to_string()),
            None => Err("neither the remote nor the inline copy is available".into()),
        }
    }
}
