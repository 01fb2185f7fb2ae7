use std::collections::HashMap;

use color_quant::NeuQuant;
use core_types::{ImageFormat, TiffCompression};
use image::{imageops::FilterType, DynamicImage, RgbaImage};
use tracing::debug;

use crate::handle::{ImageHandle, IndexedImage};
use crate::{EngineError, Result};

/// Pixels below this alpha become the transparent palette slot.
const ALPHA_CUTOFF: u8 = 128;
const NEUQUANT_SAMPLE_FACTOR: i32 = 10;

/// Bring `image` into the pixel mode and size `format` requires.
///
/// TIFF leaves the pixels alone but refuses to proceed without a codec. ICO
/// is stretched to its fixed size whatever the source aspect ratio.
pub fn normalize(
    image: ImageHandle,
    format: ImageFormat,
    compression: Option<TiffCompression>,
) -> Result<ImageHandle> {
    let spec = format.spec();
    let source_mode = image.mode();

    let normalized = match format {
        ImageFormat::Jpeg => {
            ImageHandle::Pixels(DynamicImage::ImageRgb8(image.into_dynamic().to_rgb8()))
        }
        ImageFormat::Gif => {
            let max_colors = spec.max_colors.unwrap_or(256);
            match image {
                ImageHandle::Indexed(indexed) if indexed.color_count() <= max_colors => {
                    ImageHandle::Indexed(indexed)
                }
                other => ImageHandle::Indexed(quantize(&other.into_dynamic(), max_colors)),
            }
        }
        ImageFormat::Tiff => {
            if compression.is_none() {
                return Err(EngineError::MissingOption {
                    format,
                    reason: format!(
                        "a compression codec is required (one of {})",
                        TiffCompression::NAMES.join(", ")
                    ),
                });
            }
            image
        }
        ImageFormat::Ico => {
            let (width, height) = spec.dimensions.unwrap_or((64, 64));
            match image {
                ImageHandle::Pixels(img) => {
                    ImageHandle::Pixels(img.resize_exact(width, height, FilterType::CatmullRom))
                }
                ImageHandle::Indexed(indexed) => {
                    ImageHandle::Indexed(resize_indexed(&indexed, width, height))
                }
            }
        }
        ImageFormat::Png | ImageFormat::Bmp | ImageFormat::Webp => {
            ImageHandle::Pixels(DynamicImage::ImageRgba8(image.into_dynamic().to_rgba8()))
        }
    };

    debug!(
        "normalized {:?} -> {:?} for {}",
        source_mode,
        normalized.mode(),
        format
    );
    Ok(normalized)
}

/// Reduce `image` to a palette of at most `max_colors` entries.
///
/// Images that already fit are mapped exactly; otherwise NeuQuant picks the
/// palette. Transparent pixels share one reserved slot at the end.
pub fn quantize(image: &DynamicImage, max_colors: usize) -> IndexedImage {
    let max_colors = max_colors.clamp(2, 256);
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();

    let has_transparency = rgba.pixels().any(|p| p.0[3] < ALPHA_CUTOFF);
    let budget = if has_transparency {
        max_colors - 1
    } else {
        max_colors
    };

    let mapper = exact_palette(&rgba, budget).unwrap_or_else(|| neuquant_palette(&rgba, budget));
    let mut palette = mapper.palette();
    let transparent = if has_transparency {
        let slot = palette.len() as u8;
        palette.push([0, 0, 0, 0]);
        Some(slot)
    } else {
        None
    };

    let indices = rgba
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            match transparent {
                Some(slot) if a < ALPHA_CUTOFF => slot,
                _ => mapper.index_of([r, g, b]),
            }
        })
        .collect();

    IndexedImage {
        width,
        height,
        palette,
        indices,
        transparent,
    }
}

enum PaletteMapper {
    Exact {
        colors: Vec<[u8; 3]>,
        lookup: HashMap<[u8; 3], u8>,
    },
    Neural(NeuQuant),
}

impl PaletteMapper {
    fn palette(&self) -> Vec<[u8; 4]> {
        match self {
            PaletteMapper::Exact { colors, .. } => {
                colors.iter().map(|&[r, g, b]| [r, g, b, 255]).collect()
            }
            PaletteMapper::Neural(nq) => nq
                .color_map_rgba()
                .chunks_exact(4)
                .map(|c| [c[0], c[1], c[2], 255])
                .collect(),
        }
    }

    fn index_of(&self, rgb: [u8; 3]) -> u8 {
        match self {
            PaletteMapper::Exact { lookup, .. } => lookup.get(&rgb).copied().unwrap_or(0),
            PaletteMapper::Neural(nq) => nq.index_of(&[rgb[0], rgb[1], rgb[2], 255]) as u8,
        }
    }
}

fn exact_palette(rgba: &RgbaImage, budget: usize) -> Option<PaletteMapper> {
    let mut colors = Vec::new();
    let mut lookup = HashMap::new();
    for p in rgba.pixels().filter(|p| p.0[3] >= ALPHA_CUTOFF) {
        let rgb = [p.0[0], p.0[1], p.0[2]];
        if lookup.contains_key(&rgb) {
            continue;
        }
        if colors.len() == budget {
            return None;
        }
        lookup.insert(rgb, colors.len() as u8);
        colors.push(rgb);
    }
    Some(PaletteMapper::Exact { colors, lookup })
}

fn neuquant_palette(rgba: &RgbaImage, budget: usize) -> PaletteMapper {
    let opaque: Vec<u8> = rgba
        .pixels()
        .filter(|p| p.0[3] >= ALPHA_CUTOFF)
        .flat_map(|p| [p.0[0], p.0[1], p.0[2], 255])
        .collect();
    debug!(
        "quantizing {} opaque pixels to {} colors",
        opaque.len() / 4,
        budget
    );
    PaletteMapper::Neural(NeuQuant::new(NEUQUANT_SAMPLE_FACTOR, budget, &opaque))
}

/// Nearest-neighbour resample that keeps the palette intact.
fn resize_indexed(src: &IndexedImage, width: u32, height: u32) -> IndexedImage {
    let mut indices = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        let sy = (u64::from(y) * u64::from(src.height) / u64::from(height.max(1))) as u32;
        for x in 0..width {
            let sx = (u64::from(x) * u64::from(src.width) / u64::from(width.max(1))) as u32;
            let idx = sy as usize * src.width as usize + sx as usize;
            indices.push(src.indices.get(idx).copied().unwrap_or(0));
        }
    }
    IndexedImage {
        width,
        height,
        palette: src.palette.clone(),
        indices,
        transparent: src.transparent,
    }
}
