use std::path::Path;

use anyhow::Context;
use image::{DynamicImage, codecs::jpeg::JpegEncoder, imageops::FilterType};

use crate::{
    config::ImageConfig,
    imaging::{ImageEncoder, encode_data_uri},
};

/// Downscales to a bounded size and re-encodes as a JPEG data URI.
#[derive(Debug, Clone)]
pub struct JpegDataUriEncoder {
    pub max_dimension: u32,
    pub quality: u8,
}

impl Default for JpegDataUriEncoder {
    fn default() -> Self {
        Self::from_config(&ImageConfig::default())
    }
}

impl JpegDataUriEncoder {
    pub fn from_config(config: &ImageConfig) -> Self {
        Self {
            max_dimension: config.max_dimension,
            quality: config.jpeg_quality,
        }
    }

    /// Size the image is scaled to; the longest side is clamped, never enlarged.
    pub fn target_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let max = self.max_dimension;
        let scale = |side: u32, longest: u32| {
            ((u64::from(side) * u64::from(max) + u64::from(longest) / 2) / u64::from(longest)).max(1) as u32
        };
        if width > height && width > max {
            (max, scale(height, width))
        } else if height > max {
            (scale(width, height), max)
        } else {
            (width, height)
        }
    }

    pub fn encode_bytes(&self, bytes: &[u8]) -> anyhow::Result<String> {
        let img = image::load_from_memory(bytes).context("Failed to decode image")?;
        let (width, height) = self.target_dimensions(img.width(), img.height());
        let img = if (width, height) == (img.width(), img.height()) {
            img
        } else {
            img.resize_exact(width, height, FilterType::CatmullRom)
        };

        // JPEG has no alpha channel.
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let mut jpeg = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, self.quality))
            .context("Failed to encode JPEG")?;
        Ok(encode_data_uri("image/jpeg", &jpeg))
    }
}

impl ImageEncoder for JpegDataUriEncoder {
    async fn encode(&self, source: &Path) -> anyhow::Result<String> {
        let bytes = tokio::fs::read(source)
            .await
            .with_context(|| format!("Failed to read image {:?}", source))?;
        let encoder = self.clone();
        tokio::task::spawn_blocking(move || encoder.encode_bytes(&bytes))
            .await?
            .with_context(|| format!("Failed to encode image {:?}", source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_longest_side() {
        let encoder = JpegDataUriEncoder::default();
        assert_eq!(encoder.target_dimensions(1200, 800), (600, 400));
        assert_eq!(encoder.target_dimensions(800, 1200), (400, 600));
        assert_eq!(encoder.target_dimensions(1000, 1000), (600, 600));
    }

    #[test]
    fn small_images_are_not_enlarged() {
        let encoder = JpegDataUriEncoder::default();
        assert_eq!(encoder.target_dimensions(320, 200), (320, 200));
        assert_eq!(encoder.target_dimensions(600, 600), (600, 600));
    }

    #[test]
    fn thin_images_keep_at_least_one_pixel() {
        let encoder = JpegDataUriEncoder::default();
        assert_eq!(encoder.target_dimensions(6000, 1), (600, 1));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let encoder = JpegDataUriEncoder::default();
        assert!(encoder.encode_bytes(b"not an image").is_err());
    }
}
