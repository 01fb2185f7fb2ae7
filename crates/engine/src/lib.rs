//! Format-conversion engine.
//!
//! `ImageEngine::convert` decodes a source file, normalizes it for the target
//! format (see [`normalize`]) and writes the encoded result in one go.
//! Background removal is delegated to a [`BackgroundRemover`] supplied by the
//! caller; file pickers and prompts arrive through [`Dialogs`].

use core_types::ImageFormat;
use std::path::PathBuf;

mod capabilities;
mod convert;
mod encode;
mod handle;
mod normalize;
mod workflow;

pub use capabilities::{BackgroundRemover, Dialogs, RemovalError};
pub use convert::{default_background_output, default_output_path, ConversionPlan, ImageEngine};
pub use encode::{encode, EncodeSettings};
pub use handle::{ImageHandle, IndexedImage};
pub use normalize::{normalize, quantize};
pub use workflow::{convert_interactive, remove_background_interactive, Outcome};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Unsupported target format: {0:?}")]
    InvalidFormat(String),

    #[error("Missing or invalid {format} option: {reason}")]
    MissingOption { format: ImageFormat, reason: String },

    #[error("Cannot decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("Encode error: {0}")]
    Encode(String),

    /// Encoding succeeded but the bytes could not be stored.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Background removal failed: {0}")]
    Removal(#[source] RemovalError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
