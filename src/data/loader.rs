use std::path::Path;

use anyhow::{Context, Result, bail};
use image::DynamicImage;
use ndarray::Array3;

use super::model::PixelBuffer;

/// File extensions offered by the open dialog.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load an image file into a [`PixelBuffer`]. Dispatch by extension.
///
/// Grayscale sources stay single-channel; everything else becomes RGB.
pub fn load_image(path: &Path) -> Result<PixelBuffer> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        bail!("Unsupported image extension: .{ext}");
    }

    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    decode_image(&bytes).with_context(|| format!("decoding {}", path.display()))
}

/// Decode an in-memory encoded image (format sniffed from the bytes).
pub fn decode_image(bytes: &[u8]) -> Result<PixelBuffer> {
    let img = image::load_from_memory(bytes).context("unrecognised or corrupt image data")?;
    from_dynamic(img)
}

/// Convert a decoded image into an (H, W, C) sample buffer.
pub fn from_dynamic(img: DynamicImage) -> Result<PixelBuffer> {
    let grayscale = matches!(
        img,
        DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
    );

    if grayscale {
        let gray = img.to_luma8();
        let (w, h) = gray.dimensions();
        return Array3::from_shape_vec((h as usize, w as usize, 1), gray.into_raw())
            .context("grayscale buffer has unexpected length");
    }

    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    Array3::from_shape_vec((h as usize, w as usize, 3), rgb.into_raw())
        .context("RGB buffer has unexpected length")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use std::io::Cursor;

    fn encode(img: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_gray_png_stays_single_channel() {
        let img = GrayImage::from_fn(5, 3, |x, y| Luma([(x * 10 + y) as u8]));
        let pixels = decode_image(&encode(DynamicImage::ImageLuma8(img))).unwrap();
        assert_eq!(pixels.dim(), (3, 5, 1));
        assert_eq!(pixels[[2, 4, 0]], 42);
    }

    #[test]
    fn test_rgb_png_layout() {
        let img = RgbImage::from_fn(4, 2, |x, y| Rgb([x as u8, y as u8, 7]));
        let pixels = decode_image(&encode(DynamicImage::ImageRgb8(img))).unwrap();
        assert_eq!(pixels.dim(), (2, 4, 3));
        assert_eq!(pixels[[1, 3, 0]], 3);
        assert_eq!(pixels[[1, 3, 1]], 1);
        assert_eq!(pixels[[1, 3, 2]], 7);
    }

    #[test]
    fn test_rgba_drops_alpha() {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([9, 8, 7, 0]));
        let pixels = decode_image(&encode(DynamicImage::ImageRgba8(img))).unwrap();
        assert_eq!(pixels.dim(), (2, 2, 3));
    }

    #[test]
    fn test_garbage_bytes_fail() {
        assert!(decode_image(b"definitely not an image").is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_image(Path::new("spectra.parquet")).unwrap_err();
        assert!(err.to_string().contains("Unsupported"));
    }
}
