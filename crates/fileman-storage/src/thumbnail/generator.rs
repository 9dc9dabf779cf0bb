//! Thumbnail generator for image files.

use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use image::ImageFormat;
use image::imageops::FilterType;
use tracing::{debug, info};

use fileman_core::error::{AppError, ErrorKind};
use fileman_core::result::AppResult;
use fileman_core::traits::storage::StorageProvider;

/// Path of the thumbnail of `source_path` at `width` pixels.
pub fn thumbnail_path(source_path: &str, width: u32) -> String {
    format!("{source_path}_{width}")
}

/// Generates width-bounded thumbnails next to their source images.
#[derive(Debug, Clone)]
pub struct ThumbnailGenerator {
    /// Storage provider for reading source files and writing thumbnails.
    provider: Arc<dyn StorageProvider>,
}

impl ThumbnailGenerator {
    /// Create a new thumbnail generator.
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self { provider }
    }

    /// Generate one thumbnail `width` pixels wide and write it to
    /// [`thumbnail_path`], replacing any previous one.
    ///
    /// Returns the path of the written thumbnail.
    pub async fn generate(&self, source_path: &str, width: u32) -> AppResult<String> {
        if width == 0 {
            return Err(AppError::validation("Thumbnail width must be positive"));
        }
        info!("Generating thumbnail for file: {source_path}, size: {width}");

        let source_bytes = self.provider.read_bytes(source_path).await?;

        let thumbnail_bytes =
            tokio::task::spawn_blocking(move || Self::resize_image(&source_bytes, width))
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Internal, "Thumbnail task panicked", e)
                })??;

        let thumb_path = thumbnail_path(source_path, width);
        self.provider.write(&thumb_path, thumbnail_bytes).await?;

        debug!(
            source = source_path,
            width,
            output = %thumb_path,
            "Generated thumbnail"
        );

        Ok(thumb_path)
    }

    /// Generate every width concurrently.
    ///
    /// All generations run to the end even when one fails; the first
    /// error in `widths` order is returned after they have all finished.
    pub async fn generate_all(&self, source_path: &str, widths: &[u32]) -> AppResult<Vec<String>> {
        let results = join_all(widths.iter().map(|&w| self.generate(source_path, w))).await;
        results.into_iter().collect()
    }

    /// Resize to exactly `width` pixels wide, keeping the aspect ratio,
    /// and re-encode in the source format.
    fn resize_image(data: &[u8], width: u32) -> AppResult<Bytes> {
        let format = image::guess_format(data)
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Unrecognized image format", e))?;
        let img = image::load_from_memory_with_format(data, format)
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to decode image", e))?;

        let height = scaled_height(img.width(), img.height(), width);
        let thumb = img.resize_exact(width, height, FilterType::Lanczos3);

        let mut cursor = Cursor::new(Vec::new());
        thumb
            .write_to(&mut cursor, output_format(format))
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to encode thumbnail", e))?;

        Ok(Bytes::from(cursor.into_inner()))
    }
}

/// Height for `target_width` that keeps the `width:height` ratio.
fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    if width == 0 {
        return 1;
    }
    let scaled = (u64::from(height) * u64::from(target_width) + u64::from(width) / 2) / u64::from(width);
    scaled.clamp(1, u64::from(u32::MAX)) as u32
}

/// Formats the `image` crate decodes but cannot encode fall back to PNG.
fn output_format(source: ImageFormat) -> ImageFormat {
    if source.writing_enabled() {
        source
    } else {
        ImageFormat::Png
    }
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

    use super::*;
    use crate::providers::local::LocalStorageProvider;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    async fn setup() -> (tempfile::TempDir, ThumbnailGenerator, String) {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalStorageProvider::new(dir.path().to_str().unwrap())
            .await
            .unwrap();
        let source = dir.path().join("0b1c6f0e-image");
        std::fs::write(&source, png_bytes(1000, 600)).unwrap();
        let source = source.to_str().unwrap().to_string();
        (dir, ThumbnailGenerator::new(Arc::new(provider)), source)
    }

    #[test]
    fn test_thumbnail_path() {
        assert_eq!(thumbnail_path("/tmp/img.png", 250), "/tmp/img.png_250");
    }

    #[test]
    fn test_scaled_height() {
        assert_eq!(scaled_height(1000, 600, 500), 300);
        assert_eq!(scaled_height(1000, 1, 100), 1);
        assert_eq!(scaled_height(3, 2, 100), 67);
    }

    #[tokio::test]
    async fn test_generate_keeps_aspect_ratio_and_format() {
        let (_dir, generator, source) = setup().await;

        let out = generator.generate(&source, 250).await.unwrap();
        assert_eq!(out, format!("{source}_250"));

        let bytes = std::fs::read(&out).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        let thumb = image::load_from_memory(&bytes).unwrap();
        assert_eq!(thumb.dimensions(), (250, 150));
    }

    #[tokio::test]
    async fn test_generate_all_writes_every_width() {
        let (_dir, generator, source) = setup().await;

        let paths = generator.generate_all(&source, &[500, 250, 100]).await.unwrap();
        assert_eq!(paths.len(), 3);
        for width in [500, 250, 100] {
            let bytes = std::fs::read(thumbnail_path(&source, width)).unwrap();
            assert_eq!(image::load_from_memory(&bytes).unwrap().width(), width);
        }
    }

    #[tokio::test]
    async fn test_not_an_image_fails() {
        let (dir, generator, _source) = setup().await;
        let bogus = dir.path().join("notes.txt");
        std::fs::write(&bogus, b"plain text").unwrap();

        let err = generator
            .generate(bogus.to_str().unwrap(), 100)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
        assert!(!dir.path().join("notes.txt_100").exists());
    }

    #[tokio::test]
    async fn test_missing_source_fails_all() {
        let (dir, generator, _source) = setup().await;
        let missing = dir.path().join("missing");

        let err = generator
            .generate_all(missing.to_str().unwrap(), &[500, 250, 100])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
