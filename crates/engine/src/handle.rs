use core_types::PixelMode;
use image::{DynamicImage, GenericImageView, RgbaImage};

/// A decoded image owned by a single conversion call.
#[derive(Debug, Clone)]
pub enum ImageHandle {
    Pixels(DynamicImage),
    Indexed(IndexedImage),
}

impl ImageHandle {
    pub fn mode(&self) -> PixelMode {
        match self {
            ImageHandle::Pixels(img) => {
                let color = img.color();
                match (color.has_color(), color.has_alpha()) {
                    (false, false) => PixelMode::Gray,
                    (false, true) => PixelMode::GrayAlpha,
                    (true, false) => PixelMode::Rgb,
                    (true, true) => PixelMode::Rgba,
                }
            }
            ImageHandle::Indexed(_) => PixelMode::Indexed,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ImageHandle::Pixels(img) => img.dimensions(),
            ImageHandle::Indexed(indexed) => (indexed.width, indexed.height),
        }
    }

    /// Expands palette images; pixel images are returned as-is.
    pub fn to_dynamic(&self) -> DynamicImage {
        match self {
            ImageHandle::Pixels(img) => img.clone(),
            ImageHandle::Indexed(indexed) => DynamicImage::ImageRgba8(indexed.to_rgba()),
        }
    }

    pub fn into_dynamic(self) -> DynamicImage {
        match self {
            ImageHandle::Pixels(img) => img,
            ImageHandle::Indexed(indexed) => DynamicImage::ImageRgba8(indexed.to_rgba()),
        }
    }
}

impl From<DynamicImage> for ImageHandle {
    fn from(img: DynamicImage) -> Self {
        ImageHandle::Pixels(img)
    }
}

/// Palette image: one index byte per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    pub width: u32,
    pub height: u32,
    /// RGBA entries; never more than 256.
    pub palette: Vec<[u8; 4]>,
    pub indices: Vec<u8>,
    /// Palette slot rendered fully transparent, if any.
    pub transparent: Option<u8>,
}

impl IndexedImage {
    pub fn color_count(&self) -> usize {
        self.palette.len()
    }

    pub fn to_rgba(&self) -> RgbaImage {
        debug_assert_eq!(
            self.indices.len(),
            self.width as usize * self.height as usize,
            "index buffer does not match {}x{}",
            self.width,
            self.height
        );
        let mut data = Vec::with_capacity(self.indices.len() * 4);
        for &index in &self.indices {
            let entry = self.palette.get(index as usize).copied().unwrap_or([0, 0, 0, 0]);
            data.extend_from_slice(&entry);
        }
        RgbaImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }
}
