use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, GrayImage, ImageEncoder, ImageResult, Luma};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::AppConfig;
use crate::error::{Error, IoResultExt, Result};
use crate::format::Format;
use crate::index::GroupKey;

const DEFAULT_FILL_VALUE: u8 = 0;
const DEFAULT_JPEG_QUALITY: u8 = 1;

/// Produces single-color grayscale rasters. Output depends only on the
/// inputs and the synthesizer settings, so repeated calls are byte-identical.
#[derive(Debug, Clone, Copy)]
pub struct Synthesizer {
    fill_value: u8,
    jpeg_quality: u8,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self {
            fill_value: DEFAULT_FILL_VALUE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl Synthesizer {
    pub fn new(fill_value: u8, jpeg_quality: u8) -> Self {
        Self {
            fill_value,
            jpeg_quality,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.fill_value, config.jpeg_quality)
    }

    /// Encode a `width` x `height` placeholder in `format`.
    ///
    /// Zero-area geometries are rejected for every format.
    pub fn synthesize(&self, format: Format, width: u32, height: u32) -> Result<Vec<u8>> {
        if !format.is_supported() {
            return Err(Error::UnsupportedFormat(format));
        }
        if width == 0 || height == 0 {
            return Err(Error::EmptyGeometry {
                format,
                width,
                height,
            });
        }

        let raster = GrayImage::from_pixel(width, height, Luma([self.fill_value]));
        let mut bytes = Vec::new();
        self.encode(format, raster, &mut bytes)
            .map_err(|source| Error::Encode {
                key: GroupKey::new(format, width, height),
                source,
            })?;
        Ok(bytes)
    }

    fn encode(&self, format: Format, raster: GrayImage, out: &mut Vec<u8>) -> ImageResult<()> {
        let (width, height) = raster.dimensions();
        match format {
            Format::Png => {
                PngEncoder::new(out).write_image(raster.as_raw(), width, height, ExtendedColorType::L8)
            }
            Format::Jpeg => JpegEncoder::new_with_quality(out, self.jpeg_quality).write_image(
                raster.as_raw(),
                width,
                height,
                ExtendedColorType::L8,
            ),
            Format::Gif => {
                // The GIF encoder only accepts RGB(A) input; a single color
                // still yields a one-entry palette.
                let rgb = DynamicImage::ImageLuma8(raster).into_rgb8();
                // Trailer is written when the encoder drops.
                let mut encoder = GifEncoder::new(out);
                encoder.encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
            }
            Format::Unknown => unreachable!("unsupported formats are rejected before encoding"),
        }
    }

    /// Write the canonical placeholder for `key` into `staging_dir` and return
    /// its path. An existing file at that path is never replaced.
    pub fn write_placeholder(&self, key: &GroupKey, staging_dir: &Path) -> Result<PathBuf> {
        let name = key
            .placeholder_name()
            .ok_or(Error::UnsupportedFormat(key.format))?;
        let bytes = self.synthesize(key.format, key.width, key.height)?;
        let path = staging_dir.join(name);

        let mut tmp = NamedTempFile::new_in(staging_dir).at("create placeholder in", staging_dir)?;
        tmp.write_all(&bytes).at("write placeholder", &path)?;
        tmp.as_file().sync_all().at("sync placeholder", &path)?;
        tmp.persist_noclobber(&path)
            .map_err(|e| e.error)
            .at("persist placeholder", &path)?;

        debug!("Created placeholder {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

/// Synthesize with default settings: black pixels, lowest JPEG quality.
pub fn synthesize(format: Format, width: u32, height: u32) -> Result<Vec<u8>> {
    Synthesizer::default().synthesize(format, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn decode(bytes: &[u8], format: Format) -> DynamicImage {
        image::load_from_memory_with_format(bytes, format.codec().unwrap()).unwrap()
    }

    #[test]
    fn test_synthesize_matches_requested_geometry() {
        for format in [Format::Png, Format::Gif, Format::Jpeg] {
            let bytes = synthesize(format, 100, 50).unwrap();
            let img = decode(&bytes, format);
            assert_eq!(img.dimensions(), (100, 50), "{format}");
        }
    }

    #[test]
    fn test_synthesize_is_deterministic() {
        for format in [Format::Png, Format::Gif, Format::Jpeg] {
            let first = synthesize(format, 31, 17).unwrap();
            let second = synthesize(format, 31, 17).unwrap();
            assert_eq!(first, second, "{format}");
        }
    }

    #[test]
    fn test_png_placeholder_is_single_gray_value() {
        let bytes = Synthesizer::new(0x80, 1)
            .synthesize(Format::Png, 4, 3)
            .unwrap();
        let img = decode(&bytes, Format::Png).into_luma8();
        assert!(img.pixels().all(|p| p.0 == [0x80]));
    }

    #[test]
    fn test_fill_value_changes_output() {
        let black = Synthesizer::new(0, 1).synthesize(Format::Png, 8, 8).unwrap();
        let white = Synthesizer::new(255, 1).synthesize(Format::Png, 8, 8).unwrap();
        assert_ne!(black, white);
    }

    #[test]
    fn test_zero_geometry_rejected_for_every_format() {
        for format in [Format::Png, Format::Gif, Format::Jpeg] {
            for (w, h) in [(0, 10), (10, 0), (0, 0)] {
                let err = synthesize(format, w, h).unwrap_err();
                assert!(matches!(err, Error::EmptyGeometry { .. }), "{format} {w}x{h}");
            }
        }
    }

    #[test]
    fn test_unknown_format_rejected() {
        let err = synthesize(Format::Unknown, 10, 10).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(Format::Unknown)));
    }

    #[test]
    fn test_codec_limits_surface_as_encode_errors() {
        let err = synthesize(Format::Gif, 70_000, 1).unwrap_err();
        assert!(matches!(err, Error::Encode { .. }));
    }

    #[test]
    fn test_write_placeholder_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let key = GroupKey::new(Format::Png, 3, 2);
        let synth = Synthesizer::default();

        let path = synth.write_placeholder(&key, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("3x2.png"));
        assert_eq!(std::fs::read(&path).unwrap(), synthesize(Format::Png, 3, 2).unwrap());

        let err = synth.write_placeholder(&key, dir.path()).unwrap_err();
        assert!(matches!(err, Error::Io { op: "persist placeholder", .. }));
        // No stray temporary files are left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
