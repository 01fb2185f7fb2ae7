use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One conversion as the caller phrased it; nothing is validated yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub input: PathBuf,
    /// Target format identifier, e.g. `"png"` or `"JPG"`.
    pub format: String,
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Format-specific option value (the TIFF compression codec).
    #[serde(default)]
    pub option: Option<String>,
}

impl ConversionRequest {
    pub fn new(input: impl AsRef<Path>, format: impl Into<String>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            format: format.into(),
            output: None,
            option: None,
        }
    }

    pub fn with_output(mut self, output: impl AsRef<Path>) -> Self {
        self.output = Some(output.as_ref().to_path_buf());
        self
    }

    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.option = Some(option.into());
        self
    }
}
