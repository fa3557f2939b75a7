// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Backdrop frame loading.
//!
//! The engine never decodes video. Hosts that want a picture behind the
//! overlay (a poster frame or an exported still) load it here and upload the
//! RGBA pixels as a texture.

use std::path::Path;

use anyhow::{Context, Result};

/// File extensions offered by the backdrop picker.
pub const FRAME_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// A decoded frame as tightly packed RGBA8.
#[derive(Debug, Clone)]
pub struct LoadedFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl LoadedFrame {
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }
}

/// Decode an image file into RGBA pixels.
pub fn load_frame(path: &Path) -> Result<LoadedFrame> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open image {}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    log::info!("Loaded frame {} ({}x{})", path.display(), width, height);
    Ok(LoadedFrame {
        width,
        height,
        pixels: img.into_raw(),
    })
}

/// Decode an in-memory encoded image.
pub fn decode_frame(bytes: &[u8]) -> Result<LoadedFrame> {
    let img = image::load_from_memory(bytes)
        .context("Failed to decode image")?
        .to_rgba8();
    let (width, height) = img.dimensions();
    Ok(LoadedFrame {
        width,
        height,
        pixels: img.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    #[test]
    fn test_decode_png_to_rgba() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_pixel(4, 2, Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();

        let frame = decode_frame(&bytes).unwrap();
        assert_eq!((frame.width, frame.height), (4, 2));
        assert_eq!(frame.pixels.len(), 4 * 2 * 4);
        assert_eq!(&frame.pixels[..4], &[255, 0, 0, 255]);
        assert_eq!(frame.aspect_ratio(), 2.0);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_frame(&dir.path().join("missing.png")).is_err());
    }
}
