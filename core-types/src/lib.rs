use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod compression;
pub mod format;
pub mod request;

pub use compression::TiffCompression;
pub use format::{FormatSpec, ImageFormat, ModeRequirement, SaveOption, FORMAT_SPECS};
pub use request::ConversionRequest;

/// Channel layout of a decoded image, independent of bit depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelMode {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
    /// Palette indices into at most 256 colors.
    Indexed,
}

impl PixelMode {
    pub fn has_alpha(self) -> bool {
        matches!(self, PixelMode::GrayAlpha | PixelMode::Rgba)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown image format: {0:?}")]
    UnknownFormat(String),

    #[error("unknown TIFF compression: {0:?} (expected one of {list})", list = TiffCompression::NAMES.join(", "))]
    UnknownCompression(String),
}
