use std::io::Cursor;
use std::path::Path;

use anyhow::Context;
use eframe::egui::ColorImage;
use image::{ImageFormat, Rgb, RgbImage};
use ndarray::Array2;
use palette::{Hsl, IntoColor, Srgb};
use serde::{Deserialize, Serialize};

use crate::data::model::{PixelBuffer, Reconstruction, ViewBuffer};
use crate::error::{Result, SpectralError};

// ---------------------------------------------------------------------------
// Spectrum palette
// ---------------------------------------------------------------------------

/// How the normalized log magnitude is coloured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumPalette {
    #[default]
    Gray,
    /// Hue sweep from blue (weak) to red (strong).
    Heat,
}

impl SpectrumPalette {
    pub const ALL: [SpectrumPalette; 2] = [SpectrumPalette::Gray, SpectrumPalette::Heat];

    pub fn label(&self) -> &'static str {
        match self {
            SpectrumPalette::Gray => "Gray",
            SpectrumPalette::Heat => "Heat",
        }
    }

    /// Colour for a normalized intensity in [0, 1].
    pub fn color_for(&self, t: f64) -> Rgb<u8> {
        let t = t.clamp(0.0, 1.0) as f32;
        match self {
            SpectrumPalette::Gray => {
                let v = (t * 255.0).round() as u8;
                Rgb([v, v, v])
            }
            SpectrumPalette::Heat => {
                let hsl = Hsl::new(240.0 * (1.0 - t), 0.85, 0.08 + 0.5 * t);
                let rgb: Srgb = hsl.into_color();
                Rgb([
                    (rgb.red * 255.0) as u8,
                    (rgb.green * 255.0) as u8,
                    (rgb.blue * 255.0) as u8,
                ])
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Buffer → image
// ---------------------------------------------------------------------------

/// Turn a view buffer into an 8-bit RGB image. Only the spectrum magnitude
/// uses `palette`.
pub fn to_rgb_image(buffer: &ViewBuffer, palette: SpectrumPalette) -> Result<RgbImage> {
    match buffer {
        ViewBuffer::Original(pixels) => pixels_to_rgb(pixels),
        ViewBuffer::Reconstruction(Reconstruction::Color(pixels)) => pixels_to_rgb(pixels),
        ViewBuffer::Reconstruction(Reconstruction::Gray(gray)) => {
            map_plane(gray, |v| {
                let v = v.clamp(0.0, 255.0).round() as u8;
                Rgb([v, v, v])
            })
        }
        ViewBuffer::Magnitude(magnitude) => {
            let normalized = normalize(magnitude);
            map_plane(&normalized, |t| palette.color_for(t))
        }
    }
}

/// Min/max scale to [0, 1]. A constant map becomes all zeros.
pub fn normalize(plane: &Array2<f64>) -> Array2<f64> {
    let min = plane.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = plane.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !range.is_finite() || range.abs() < f64::EPSILON {
        return Array2::zeros(plane.dim());
    }
    plane.mapv(|v| (v - min) / range)
}

/// egui texture data for an RGB image.
pub fn to_color_image(img: &RgbImage) -> ColorImage {
    ColorImage::from_rgb([img.width() as usize, img.height() as usize], img.as_raw())
}

/// PNG bytes of `img`.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| SpectralError::Encode(e.to_string()))?;
    Ok(bytes)
}

pub fn save_png(img: &RgbImage, path: &Path) -> anyhow::Result<()> {
    let bytes = encode_png(img)?;
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

fn image_size(h: usize, w: usize) -> Result<(u32, u32)> {
    let too_big = || SpectralError::Encode(format!("{w}x{h} is too large to encode"));
    Ok((
        u32::try_from(w).map_err(|_| too_big())?,
        u32::try_from(h).map_err(|_| too_big())?,
    ))
}

fn pixels_to_rgb(pixels: &PixelBuffer) -> Result<RgbImage> {
    let (h, w, c) = pixels.dim();
    let (width, height) = image_size(h, w)?;
    Ok(RgbImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        if c >= 3 {
            Rgb([pixels[[y, x, 0]], pixels[[y, x, 1]], pixels[[y, x, 2]]])
        } else {
            let v = pixels[[y, x, 0]];
            Rgb([v, v, v])
        }
    }))
}

fn map_plane(plane: &Array2<f64>, f: impl Fn(f64) -> Rgb<u8>) -> Result<RgbImage> {
    let (h, w) = plane.dim();
    let (width, height) = image_size(h, w)?;
    Ok(RgbImage::from_fn(width, height, |x, y| {
        f(plane[[y as usize, x as usize]])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    #[test]
    fn test_normalize_range() {
        let n = normalize(&array![[1.0, 2.0], [3.0, 5.0]]);
        assert_eq!(n[[0, 0]], 0.0);
        assert_eq!(n[[1, 1]], 1.0);
        assert!((n[[0, 1]] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_constant_magnitude_renders_black() {
        let img = to_rgb_image(
            &ViewBuffer::Magnitude(Array2::from_elem((3, 4), 7.5)),
            SpectrumPalette::Gray,
        )
        .unwrap();
        assert_eq!(img.dimensions(), (4, 3));
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_gray_reconstruction_rounds_and_clips() {
        let gray = array![[254.6, -3.0], [12.4, 300.0]];
        let img = to_rgb_image(
            &ViewBuffer::Reconstruction(Reconstruction::Gray(gray)),
            SpectrumPalette::Heat,
        )
        .unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(0, 1).0, [12, 12, 12]);
        assert_eq!(img.get_pixel(1, 1).0, [255, 255, 255]);
    }

    #[test]
    fn test_original_single_channel_expands_to_gray() {
        let pixels = Array3::from_shape_fn((2, 3, 1), |(y, x, _)| (y * 3 + x) as u8);
        let img = to_rgb_image(&ViewBuffer::Original(pixels), SpectrumPalette::Gray).unwrap();
        assert_eq!(img.get_pixel(2, 1).0, [5, 5, 5]);
    }

    #[test]
    fn test_heat_endpoints_differ() {
        let cold = SpectrumPalette::Heat.color_for(0.0);
        let hot = SpectrumPalette::Heat.color_for(1.0);
        assert!(hot.0[0] > cold.0[0]);
        assert!(cold.0[2] >= cold.0[0]);
    }

    #[test]
    fn test_png_round_trip_through_loader() {
        let pixels = Array3::from_shape_fn((4, 5, 3), |(y, x, k)| (y * 40 + x * 10 + k) as u8);
        let img = to_rgb_image(&ViewBuffer::Original(pixels.clone()), SpectrumPalette::Gray).unwrap();
        let bytes = encode_png(&img).unwrap();
        let decoded = crate::data::loader::decode_image(&bytes).unwrap();
        assert_eq!(decoded, pixels);
    }

    #[test]
    fn test_color_image_size() {
        let img = RgbImage::new(6, 2);
        let color = to_color_image(&img);
        assert_eq!(color.size, [6, 2]);
    }
}
