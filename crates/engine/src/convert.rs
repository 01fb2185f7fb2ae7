use std::fs;
use std::path::{Path, PathBuf};

use core_types::{ConversionRequest, ImageFormat, SaveOption, TiffCompression};
use tracing::{debug, info};

use crate::capabilities::BackgroundRemover;
use crate::encode::{encode, EncodeSettings};
use crate::handle::ImageHandle;
use crate::normalize::normalize;
use crate::{EngineError, Result};

/// A request that passed validation; building one touches no files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionPlan {
    pub format: ImageFormat,
    /// Always `Some` for TIFF.
    pub compression: Option<TiffCompression>,
    pub output: PathBuf,
}

/// Stateless converter; one instance can serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct ImageEngine {
    settings: EncodeSettings,
}

impl ImageEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: EncodeSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EncodeSettings {
        &self.settings
    }

    /// Validate format and options and settle the output path.
    pub fn plan(&self, request: &ConversionRequest) -> Result<ConversionPlan> {
        let format: ImageFormat = request
            .format
            .parse()
            .map_err(|_| EngineError::InvalidFormat(request.format.clone()))?;
        let compression = resolve_compression(format, request.option.as_deref())?;
        let output = request
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&request.input, format));

        Ok(ConversionPlan {
            format,
            compression,
            output,
        })
    }

    /// Convert `request.input` and return the path that was written.
    pub fn convert(&self, request: &ConversionRequest) -> Result<PathBuf> {
        let plan = self.plan(request)?;
        debug!(
            "converting {} -> {} ({})",
            request.input.display(),
            plan.output.display(),
            plan.format
        );

        let image = decode_file(&request.input)?;
        let normalized = normalize(image, plan.format, plan.compression)?;
        let bytes = encode(&normalized, plan.format, plan.compression, &self.settings)?;
        write_output(&plan.output, &bytes)?;

        info!(
            "Converted {} to {} ({} bytes)",
            request.input.display(),
            plan.output.display(),
            bytes.len()
        );
        Ok(plan.output)
    }

    /// Run `input` through `remover` and store the returned bytes untouched.
    pub fn remove_background(
        &self,
        input: &Path,
        output: Option<&Path>,
        remover: &dyn BackgroundRemover,
    ) -> Result<PathBuf> {
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_background_output(input));

        let bytes = fs::read(input).map_err(|e| EngineError::Decode {
            path: input.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!("removing background from {} ({} bytes)", input.display(), bytes.len());

        let cleaned = remover
            .remove_background_bytes(&bytes)
            .map_err(EngineError::Removal)?;
        write_output(&output, &cleaned)?;

        info!(
            "Removed background from {} into {}",
            input.display(),
            output.display()
        );
        Ok(output)
    }
}

/// `photo.png` + JPEG -> `photo.jpg`.
pub fn default_output_path(input: &Path, format: ImageFormat) -> PathBuf {
    input.with_extension(format.extension())
}

/// `portrait.jpg` -> `portrait_no_bg.png` in the same folder.
pub fn default_background_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!("{stem}_no_bg.png"))
}

fn resolve_compression(
    format: ImageFormat,
    option: Option<&str>,
) -> Result<Option<TiffCompression>> {
    if !format.spec().accepts_option(SaveOption::Compression) {
        if let Some(value) = option {
            debug!("ignoring option {value:?} for {format}");
        }
        return Ok(None);
    }

    let value = option.ok_or_else(|| EngineError::MissingOption {
        format,
        reason: format!(
            "a compression codec is required (one of {})",
            TiffCompression::NAMES.join(", ")
        ),
    })?;
    value
        .parse::<TiffCompression>()
        .map(Some)
        .map_err(|e| EngineError::MissingOption {
            format,
            reason: e.to_string(),
        })
}

fn decode_file(path: &Path) -> Result<ImageHandle> {
    let bytes = fs::read(path).map_err(|e| EngineError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let image = image::load_from_memory(&bytes).map_err(|e| EngineError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(ImageHandle::Pixels(image))
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|source| EngineError::Write {
        path: path.to_path_buf(),
        source,
    })
}
