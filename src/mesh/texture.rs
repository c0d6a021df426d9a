//! Texture data in CPU-friendly RGBA8 form before GPU upload.

use std::path::Path;

use crate::error::{AssetError, AssetResult};

#[derive(Clone, Debug, PartialEq)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl TextureData {
    /// Wrap raw RGBA8 pixels. Returns `None` when the buffer size does not
    /// match the dimensions.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize * 4 && width > 0 && height > 0).then_some(
            Self {
                data,
                width,
                height,
            },
        )
    }

    /// 1x1 opaque white, the fill-in for any material without a diffuse map.
    pub fn white() -> Self {
        Self {
            data: vec![255; 4],
            width: 1,
            height: 1,
        }
    }

    /// Decode an image file (PNG and whatever else `image` recognises).
    pub fn load(path: impl AsRef<Path>) -> AssetResult<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| AssetError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let texture = Self::from_image(img);
        log::info!(
            "Loaded texture {:?} ({}x{})",
            path,
            texture.width,
            texture.height
        );
        Ok(texture)
    }

    /// Decode an in-memory image, e.g. one embedded in a GLB buffer.
    fn from_image(img: image::DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            data: rgba.into_raw(),
            width,
            height,
        }
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(TextureData::from_rgba8(2, 2, vec![0; 15]).is_none());
        assert!(TextureData::from_rgba8(2, 2, vec![0; 16]).is_some());
        assert!(TextureData::from_rgba8(0, 0, Vec::new()).is_none());
    }

    #[test]
    fn loads_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        let img = image::RgbaImage::from_fn(4, 2, |x, _| {
            if x % 2 == 0 {
                image::Rgba([255, 0, 0, 255])
            } else {
                image::Rgba([0, 0, 255, 255])
            }
        });
        img.save(&path).unwrap();

        let texture = TextureData::load(&path).unwrap();
        assert_eq!((texture.width, texture.height), (4, 2));
        assert_eq!(&texture.data[0..4], &[255, 0, 0, 255]);
        assert_eq!(texture.bytes_per_row(), 16);
    }

    #[test]
    fn missing_file_is_an_image_error() {
        let err = TextureData::load("definitely/not/here.png").unwrap_err();
        assert!(matches!(err, AssetError::Image { .. }));
    }
}
