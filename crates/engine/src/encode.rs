use std::io::Cursor;

use core_types::{ImageFormat, TiffCompression};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tiff::encoder::compression::{Deflate, Lzw, Packbits, Uncompressed};
use tiff::encoder::{colortype, TiffEncoder, TiffValue};
use tracing::debug;

use crate::handle::{ImageHandle, IndexedImage};
use crate::normalize::quantize;
use crate::{EngineError, Result};

const DEFAULT_JPEG_QUALITY: u8 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    pub jpeg_quality: u8,
}

impl EncodeSettings {
    pub fn with_jpeg_quality(quality: u8) -> Self {
        Self {
            jpeg_quality: quality.clamp(1, 100),
        }
    }
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Encode a normalized image into an in-memory file of `format`.
pub fn encode(
    image: &ImageHandle,
    format: ImageFormat,
    compression: Option<TiffCompression>,
    settings: &EncodeSettings,
) -> Result<Vec<u8>> {
    let bytes = match (format, image) {
        (ImageFormat::Gif, ImageHandle::Indexed(indexed)) => encode_gif(indexed)?,
        (ImageFormat::Gif, ImageHandle::Pixels(img)) => {
            encode_gif(&quantize(img, format.spec().max_colors.unwrap_or(256)))?
        }
        (ImageFormat::Tiff, _) => {
            let codec = compression.ok_or_else(|| EngineError::MissingOption {
                format,
                reason: "a compression codec is required".into(),
            })?;
            encode_tiff(&image.to_dynamic(), codec)?
        }
        (ImageFormat::Jpeg, _) => encode_jpeg(&image.to_dynamic(), settings.jpeg_quality)?,
        (ImageFormat::Ico, _) => {
            // Icon entries are stored as 32-bit RGBA PNGs; other layouts do not decode.
            let img = match image.to_dynamic() {
                rgba @ DynamicImage::ImageRgba8(_) => rgba,
                other => DynamicImage::ImageRgba8(other.to_rgba8()),
            };
            write_with_image(&img, image::ImageFormat::Ico)?
        }
        (ImageFormat::Png, _) => write_with_image(&image.to_dynamic(), image::ImageFormat::Png)?,
        (ImageFormat::Bmp, _) => write_with_image(&image.to_dynamic(), image::ImageFormat::Bmp)?,
        (ImageFormat::Webp, _) => {
            write_with_image(&image.to_dynamic(), image::ImageFormat::WebP)?
        }
    };

    debug!("encoded {} bytes as {}", bytes.len(), format);
    Ok(bytes)
}

fn write_with_image(img: &DynamicImage, format: image::ImageFormat) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, format)
        .map_err(|e| EngineError::Encode(format!("{format:?}: {e}")))?;
    Ok(cursor.into_inner())
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => img.clone(),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(|e| EngineError::Encode(format!("JPEG: {e}")))?;
    Ok(bytes)
}

fn encode_gif(indexed: &IndexedImage) -> Result<Vec<u8>> {
    let width = u16::try_from(indexed.width)
        .map_err(|_| EngineError::Encode(format!("GIF width {} exceeds 65535", indexed.width)))?;
    let height = u16::try_from(indexed.height).map_err(|_| {
        EngineError::Encode(format!("GIF height {} exceeds 65535", indexed.height))
    })?;

    let palette: Vec<u8> = indexed
        .palette
        .iter()
        .flat_map(|&[r, g, b, _]| [r, g, b])
        .collect();
    // The GIF color table needs at least one entry.
    let palette = if palette.is_empty() {
        vec![0, 0, 0]
    } else {
        palette
    };

    let frame = gif::Frame::from_palette_pixels(
        width,
        height,
        indexed.indices.clone(),
        palette,
        indexed.transparent,
    );

    let mut bytes = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut bytes, width, height, &[])
            .map_err(|e| EngineError::Encode(format!("GIF: {e}")))?;
        encoder
            .write_frame(&frame)
            .map_err(|e| EngineError::Encode(format!("GIF: {e}")))?;
    }
    Ok(bytes)
}

fn encode_tiff(img: &DynamicImage, codec: TiffCompression) -> Result<Vec<u8>> {
    if matches!(
        codec,
        TiffCompression::Jpeg | TiffCompression::Group3 | TiffCompression::Group4
    ) {
        return Err(EngineError::Encode(format!(
            "TIFF compression {codec} is not supported by the encoder"
        )));
    }

    let (width, height) = (img.width(), img.height());
    let written = match img {
        DynamicImage::ImageLuma8(buf) => write_tiff::<colortype::Gray8>(width, height, buf, codec),
        DynamicImage::ImageLuma16(buf) => {
            write_tiff::<colortype::Gray16>(width, height, buf, codec)
        }
        DynamicImage::ImageRgb8(buf) => write_tiff::<colortype::RGB8>(width, height, buf, codec),
        DynamicImage::ImageRgb16(buf) => write_tiff::<colortype::RGB16>(width, height, buf, codec),
        DynamicImage::ImageRgba8(buf) => write_tiff::<colortype::RGBA8>(width, height, buf, codec),
        DynamicImage::ImageRgba16(buf) => {
            write_tiff::<colortype::RGBA16>(width, height, buf, codec)
        }
        // No gray+alpha or float layouts in the TIFF writer.
        DynamicImage::ImageLumaA16(_) | DynamicImage::ImageRgba32F(_) => {
            let buf = img.to_rgba16();
            write_tiff::<colortype::RGBA16>(width, height, &buf, codec)
        }
        DynamicImage::ImageRgb32F(_) => {
            let buf = img.to_rgb16();
            write_tiff::<colortype::RGB16>(width, height, &buf, codec)
        }
        other => {
            let buf = other.to_rgba8();
            write_tiff::<colortype::RGBA8>(width, height, &buf, codec)
        }
    };
    written.map_err(|e| EngineError::Encode(format!("TIFF ({codec}): {e}")))
}

fn write_tiff<C>(
    width: u32,
    height: u32,
    data: &[C::Inner],
    codec: TiffCompression,
) -> tiff::TiffResult<Vec<u8>>
where
    C: colortype::ColorType,
    [C::Inner]: TiffValue,
{
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut cursor)?;
        match codec {
            TiffCompression::Packbits => {
                encoder.write_image_with_compression::<C, _>(width, height, Packbits, data)?
            }
            TiffCompression::TiffLzw => {
                encoder.write_image_with_compression::<C, _>(width, height, Lzw, data)?
            }
            TiffCompression::TiffAdobeDeflate | TiffCompression::TiffDeflate => encoder
                .write_image_with_compression::<C, _>(width, height, Deflate::default(), data)?,
            _ => encoder.write_image_with_compression::<C, _>(width, height, Uncompressed, data)?,
        }
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    fn checker(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([20, 40, 60, 128])
            }
        }))
    }

    #[test]
    fn tiff_codecs_decode_back() {
        let source = checker(9, 7);
        for codec in [
            TiffCompression::Raw,
            TiffCompression::None,
            TiffCompression::Packbits,
            TiffCompression::TiffLzw,
            TiffCompression::TiffAdobeDeflate,
            TiffCompression::TiffDeflate,
        ] {
            let bytes = encode(
                &ImageHandle::from(source.clone()),
                ImageFormat::Tiff,
                Some(codec),
                &EncodeSettings::default(),
            )
            .unwrap();
            let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Tiff)
                .unwrap_or_else(|e| panic!("{codec}: {e}"));
            assert_eq!(decoded.to_rgba8(), source.to_rgba8(), "{codec}");
        }
    }

    #[test]
    fn tiff_keeps_gray_layout() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([77])));
        let bytes = encode(
            &ImageHandle::from(gray),
            ImageFormat::Tiff,
            Some(TiffCompression::TiffLzw),
            &EncodeSettings::default(),
        )
        .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
    }

    #[test]
    fn tiff_rejects_codecs_the_writer_lacks() {
        for codec in [
            TiffCompression::Jpeg,
            TiffCompression::Group3,
            TiffCompression::Group4,
        ] {
            let err = encode(
                &ImageHandle::from(checker(2, 2)),
                ImageFormat::Tiff,
                Some(codec),
                &EncodeSettings::default(),
            )
            .unwrap_err();
            assert!(matches!(err, EngineError::Encode(_)), "{codec}");
        }
    }

    #[test]
    fn gif_output_is_readable() {
        let indexed = quantize(&checker(10, 10), 256);
        let bytes = encode(
            &ImageHandle::Indexed(indexed),
            ImageFormat::Gif,
            None,
            &EncodeSettings::default(),
        )
        .unwrap();
        let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Gif).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 10));
        assert_eq!(decoded.to_rgba8().get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn jpeg_quality_changes_size() {
        let noisy = DynamicImage::ImageRgb8(image::RgbImage::from_fn(64, 64, |x, y| {
            image::Rgb([(x * 31 % 256) as u8, (y * 17 % 256) as u8, ((x * y) % 256) as u8])
        }));
        let handle = ImageHandle::from(noisy);
        let low = encode(
            &handle,
            ImageFormat::Jpeg,
            None,
            &EncodeSettings::with_jpeg_quality(10),
        )
        .unwrap();
        let high = encode(
            &handle,
            ImageFormat::Jpeg,
            None,
            &EncodeSettings::with_jpeg_quality(95),
        )
        .unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn ico_entries_are_always_rgba() {
        let sources = [
            DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([90]))),
            DynamicImage::ImageLumaA8(image::GrayAlphaImage::from_pixel(
                64,
                64,
                image::LumaA([90, 200]),
            )),
            DynamicImage::ImageRgb8(image::RgbImage::from_pixel(64, 64, image::Rgb([1, 2, 3]))),
            DynamicImage::ImageRgba16(image::ImageBuffer::from_pixel(
                64,
                64,
                Rgba([0u16, 65535, 0, 65535]),
            )),
        ];
        for source in sources {
            let color = source.color();
            let bytes = encode(
                &ImageHandle::from(source),
                ImageFormat::Ico,
                None,
                &EncodeSettings::default(),
            )
            .unwrap();
            let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Ico)
                .unwrap_or_else(|e| panic!("{color:?}: {e}"));
            assert_eq!(decoded.color(), image::ColorType::Rgba8, "{color:?}");
            assert_eq!((decoded.width(), decoded.height()), (64, 64));
        }
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(EncodeSettings::with_jpeg_quality(0).jpeg_quality, 1);
        assert_eq!(EncodeSettings::with_jpeg_quality(200).jpeg_quality, 100);
    }
}
