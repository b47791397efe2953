use crate::assets::LoadError;
use glam::Vec3;
use half::f16;
use image::{DynamicImage, ImageReader};
use std::path::Path;

/// How the renderer wraps an environment texture around the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureMapping {
    EquirectangularReflection,
}

/// Decoded equirectangular environment in linear RGB.
#[derive(Debug, Clone)]
pub struct EnvironmentMap {
    label: String,
    width: u32,
    height: u32,
    texels: Vec<Vec3>,
    mapping: TextureMapping,
}

impl EnvironmentMap {
    pub fn from_texels(
        label: impl Into<String>,
        width: u32,
        height: u32,
        texels: Vec<Vec3>,
    ) -> Result<Self, LoadError> {
        let expected = width as usize * height as usize;
        if width == 0 || height == 0 || texels.len() != expected {
            return Err(LoadError::UnsupportedFormat {
                what: "environment texels",
                detail: format!("{width}x{height} needs {expected} texels, got {}", texels.len()),
            });
        }
        Ok(Self {
            label: label.into(),
            width,
            height,
            texels,
            mapping: TextureMapping::EquirectangularReflection,
        })
    }

    pub fn from_image(label: impl Into<String>, image: &DynamicImage) -> Result<Self, LoadError> {
        let rgb = image.to_rgb32f();
        let (width, height) = rgb.dimensions();
        let texels = rgb.pixels().map(|pixel| Vec3::from_array(pixel.0)).collect();
        Self::from_texels(label, width, height, texels)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let reader = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
        let image = reader.decode()?;
        let label = path.file_stem().and_then(|s| s.to_str()).unwrap_or("environment").to_string();
        Self::from_image(label, &image)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mapping(&self) -> TextureMapping {
        self.mapping
    }

    /// RGBA16F texel data ready for upload.
    pub fn to_rgba_f16(&self) -> Vec<u16> {
        let mut out = Vec::with_capacity(self.texels.len() * 4);
        for texel in &self.texels {
            out.push(f16::from_f32(texel.x).to_bits());
            out.push(f16::from_f32(texel.y).to_bits());
            out.push(f16::from_f32(texel.z).to_bits());
            out.push(f16::ONE.to_bits());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    fn gradient_map() -> EnvironmentMap {
        let width = 8;
        let height = 4;
        let texels = (0..height)
            .flat_map(|y| (0..width).map(move |x| Vec3::new(x as f32, y as f32, 1.0)))
            .collect();
        EnvironmentMap::from_texels("gradient", width, height, texels).expect("valid texels")
    }

    #[test]
    fn f16_upload_is_row_major_with_opaque_alpha() {
        let map = gradient_map();
        let rgba = map.to_rgba_f16();
        assert_eq!(rgba.len(), 8 * 4 * 4);
        // Texel (x = 3, y = 2) starts at ((2 * 8) + 3) * 4.
        let offset = (2 * 8 + 3) * 4;
        let texel: Vec<f32> = rgba[offset..offset + 4].iter().map(|bits| f16::from_bits(*bits).to_f32()).collect();
        assert_eq!(texel, vec![3.0, 2.0, 1.0, 1.0]);
    }

    #[test]
    fn rejects_mismatched_texel_count() {
        let err = EnvironmentMap::from_texels("bad", 4, 4, vec![Vec3::ONE; 3]).unwrap_err();
        assert!(err.to_string().contains("16"));
    }

    #[test]
    fn load_decodes_png_and_keeps_mapping() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("Studio Night.png");
        let mut img = RgbImage::new(4, 2);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgb([(x as u8).saturating_mul(60), (y as u8).saturating_mul(120), 255]);
        }
        img.save(&path).expect("save png");

        let map = EnvironmentMap::load(&path).expect("load environment");
        assert_eq!((map.width(), map.height()), (4, 2));
        assert_eq!(map.label(), "Studio Night");
        assert_eq!(map.mapping(), TextureMapping::EquirectangularReflection);
        assert_eq!(map.to_rgba_f16().len(), 4 * 2 * 4);
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = EnvironmentMap::load("nowhere/pond.hdr").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
