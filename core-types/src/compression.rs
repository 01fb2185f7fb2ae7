use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// TIFF compression codecs a caller may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiffCompression {
    Raw,
    None,
    Packbits,
    TiffLzw,
    TiffAdobeDeflate,
    TiffDeflate,
    Jpeg,
    Group3,
    Group4,
}

impl TiffCompression {
    pub const ALL: [TiffCompression; 9] = [
        TiffCompression::Raw,
        TiffCompression::None,
        TiffCompression::Packbits,
        TiffCompression::TiffLzw,
        TiffCompression::TiffAdobeDeflate,
        TiffCompression::TiffDeflate,
        TiffCompression::Jpeg,
        TiffCompression::Group3,
        TiffCompression::Group4,
    ];

    pub const NAMES: [&'static str; 9] = [
        "raw",
        "none",
        "packbits",
        "tiff_lzw",
        "tiff_adobe_deflate",
        "tiff_deflate",
        "jpeg",
        "group3",
        "group4",
    ];

    pub fn as_str(self) -> &'static str {
        Self::NAMES[self as usize]
    }
}

impl fmt::Display for TiffCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TiffCompression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|codec| codec.as_str() == wanted)
            .ok_or_else(|| ParseError::UnknownCompression(s.to_string()))
    }
}
