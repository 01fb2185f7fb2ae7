use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ParseError, PixelMode};

/// Every output format the converter can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    Webp,
    Ico,
}

impl ImageFormat {
    /// Selection order shown to users.
    pub const ALL: [ImageFormat; 7] = [
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::Webp,
        ImageFormat::Bmp,
        ImageFormat::Tiff,
        ImageFormat::Gif,
        ImageFormat::Ico,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Gif => "GIF",
            ImageFormat::Bmp => "BMP",
            ImageFormat::Tiff => "TIFF",
            ImageFormat::Webp => "WEBP",
            ImageFormat::Ico => "ICO",
        }
    }

    pub fn spec(self) -> &'static FormatSpec {
        // FORMAT_SPECS is ordered by discriminant.
        &FORMAT_SPECS[self as usize]
    }

    pub fn extension(self) -> &'static str {
        self.spec().extension
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|format| format.name()).collect()
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImageFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PNG" => Ok(ImageFormat::Png),
            "JPEG" | "JPG" => Ok(ImageFormat::Jpeg),
            "GIF" => Ok(ImageFormat::Gif),
            "BMP" => Ok(ImageFormat::Bmp),
            "TIFF" => Ok(ImageFormat::Tiff),
            "WEBP" => Ok(ImageFormat::Webp),
            "ICO" => Ok(ImageFormat::Ico),
            _ => Err(ParseError::UnknownFormat(s.to_string())),
        }
    }
}

/// Pixel-mode constraint a format places on its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeRequirement {
    Unchanged,
    Exactly(PixelMode),
}

impl ModeRequirement {
    pub fn accepts(self, mode: PixelMode) -> bool {
        match self {
            ModeRequirement::Unchanged => true,
            ModeRequirement::Exactly(required) => required == mode,
        }
    }
}

/// Save-time parameters a format understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOption {
    /// Encoder quality, 1-100.
    Quality,
    /// Compression codec; mandatory where listed.
    Compression,
}

/// Static description of one output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec {
    pub format: ImageFormat,
    /// Lower-case, without the leading dot.
    pub extension: &'static str,
    pub filter_label: &'static str,
    pub mode: ModeRequirement,
    pub dimensions: Option<(u32, u32)>,
    pub max_colors: Option<usize>,
    pub options: &'static [SaveOption],
}

impl FormatSpec {
    pub fn accepts_option(&self, option: SaveOption) -> bool {
        self.options.contains(&option)
    }
}

pub static FORMAT_SPECS: [FormatSpec; 7] = [
    FormatSpec {
        format: ImageFormat::Png,
        extension: "png",
        filter_label: "PNG files",
        mode: ModeRequirement::Exactly(PixelMode::Rgba),
        dimensions: None,
        max_colors: None,
        options: &[],
    },
    FormatSpec {
        format: ImageFormat::Jpeg,
        extension: "jpg",
        filter_label: "JPEG files",
        mode: ModeRequirement::Exactly(PixelMode::Rgb),
        dimensions: None,
        max_colors: None,
        options: &[SaveOption::Quality],
    },
    FormatSpec {
        format: ImageFormat::Gif,
        extension: "gif",
        filter_label: "GIF files",
        mode: ModeRequirement::Exactly(PixelMode::Indexed),
        dimensions: None,
        max_colors: Some(256),
        options: &[],
    },
    FormatSpec {
        format: ImageFormat::Bmp,
        extension: "bmp",
        filter_label: "BMP files",
        mode: ModeRequirement::Exactly(PixelMode::Rgba),
        dimensions: None,
        max_colors: None,
        options: &[],
    },
    FormatSpec {
        format: ImageFormat::Tiff,
        extension: "tiff",
        filter_label: "TIFF files",
        mode: ModeRequirement::Unchanged,
        dimensions: None,
        max_colors: None,
        options: &[SaveOption::Compression],
    },
    FormatSpec {
        format: ImageFormat::Webp,
        extension: "webp",
        filter_label: "WEBP files",
        mode: ModeRequirement::Exactly(PixelMode::Rgba),
        dimensions: None,
        max_colors: None,
        options: &[],
    },
    FormatSpec {
        format: ImageFormat::Ico,
        extension: "ico",
        filter_label: "ICO files",
        mode: ModeRequirement::Unchanged,
        dimensions: Some((64, 64)),
        max_colors: None,
        options: &[],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively_with_jpg_alias() {
        assert_eq!("jpeg".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!("JPG".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!("jPg".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!(" WebP ".parse::<ImageFormat>().unwrap(), ImageFormat::Webp);
        assert_eq!("tiff".parse::<ImageFormat>().unwrap(), ImageFormat::Tiff);
    }

    #[test]
    fn rejects_unknown_identifiers() {
        let err = "HEIC".parse::<ImageFormat>().unwrap_err();
        assert_eq!(err, ParseError::UnknownFormat("HEIC".into()));
        assert!("".parse::<ImageFormat>().is_err());
        assert!("tif".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn one_spec_per_format() {
        for format in ImageFormat::ALL {
            let matching = FORMAT_SPECS.iter().filter(|s| s.format == format).count();
            assert_eq!(matching, 1, "{format}");
            assert_eq!(format.spec().format, format);
        }
        assert_eq!(FORMAT_SPECS.len(), ImageFormat::ALL.len());
    }

    #[test]
    fn spec_table_matches_format_constraints() {
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
        assert_eq!(
            ImageFormat::Jpeg.spec().mode,
            ModeRequirement::Exactly(PixelMode::Rgb)
        );
        assert_eq!(ImageFormat::Gif.spec().max_colors, Some(256));
        assert_eq!(ImageFormat::Ico.spec().dimensions, Some((64, 64)));
        assert!(ImageFormat::Tiff.spec().accepts_option(SaveOption::Compression));
        assert!(!ImageFormat::Png.spec().accepts_option(SaveOption::Compression));
        for format in [ImageFormat::Png, ImageFormat::Bmp, ImageFormat::Webp] {
            assert_eq!(format.spec().mode, ModeRequirement::Exactly(PixelMode::Rgba));
        }
    }

    #[test]
    fn names_round_trip_through_parse() {
        for name in ImageFormat::names() {
            let format: ImageFormat = name.parse().unwrap();
            assert_eq!(format.to_string(), name);
        }
    }

    #[test]
    fn unchanged_requirement_accepts_everything() {
        assert!(ModeRequirement::Unchanged.accepts(PixelMode::GrayAlpha));
        assert!(!ModeRequirement::Exactly(PixelMode::Rgb).accepts(PixelMode::Rgba));
    }
}
