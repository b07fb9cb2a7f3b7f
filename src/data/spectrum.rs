use std::sync::Arc;

use ndarray::{Array2, Array3, ArrayView2, Axis, Zip};
use num_complex::Complex64;
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner};

use super::model::{
    Magnitude, MaskBuffer, PixelBuffer, Reconstruction, SpectrumBuffer,
};
use crate::error::{Result, SpectralError};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Forward 2-D transform of every channel, centred so the zero frequency sits
/// at `(H/2, W/2)`, plus the display magnitude of the result.
///
/// The channel axis is never transformed; channels are processed
/// independently (and in parallel).
pub fn forward_transform(pixels: &PixelBuffer) -> (SpectrumBuffer, Magnitude) {
    let (h, w, c) = pixels.dim();
    let plan = Plan2d::forward(h, w);

    let planes: Vec<Array2<Complex64>> = (0..c)
        .into_par_iter()
        .map(|ch| {
            let mut plane = pixels
                .index_axis(Axis(2), ch)
                .mapv(|v| Complex64::new(v as f64, 0.0));
            plan.process(&mut plane);
            fftshift(&plane)
        })
        .collect();

    let spectrum = stack_channels(h, w, &planes);
    let magnitude = display_magnitude(&spectrum, None);
    (spectrum, magnitude)
}

/// Log magnitude of `spectrum * mask`, for the live spectrum preview.
pub fn masked_magnitude(spectrum: &SpectrumBuffer, mask: &MaskBuffer) -> Result<Magnitude> {
    check_same_shape(spectrum, mask)?;
    Ok(display_magnitude(spectrum, Some(mask)))
}

/// Reconstruct pixels from the masked spectrum.
///
/// The result is the real part of the inverse transform, clipped to
/// [0, 255]. Multi-channel output is truncated to `u8`; single-channel output
/// stays floating point.
pub fn inverse_transform(spectrum: &SpectrumBuffer, mask: &MaskBuffer) -> Result<Reconstruction> {
    check_same_shape(spectrum, mask)?;
    let (h, w, c) = spectrum.dim();
    let plan = Plan2d::inverse(h, w);
    let scale = 1.0 / (h * w).max(1) as f64;

    let planes: Vec<Array2<f64>> = (0..c)
        .into_par_iter()
        .map(|ch| {
            let masked = Zip::from(spectrum.index_axis(Axis(2), ch))
                .and(mask.index_axis(Axis(2), ch))
                .map_collect(|&z, &keep| if keep { z } else { Complex64::default() });
            let mut plane = ifftshift(&masked);
            plan.process(&mut plane);
            plane.mapv(|z| (z.re * scale).clamp(0.0, 255.0))
        })
        .collect();

    if c == 1 {
        let gray = planes
            .into_iter()
            .next()
            .unwrap_or_else(|| Array2::zeros((h, w)));
        return Ok(Reconstruction::Gray(gray));
    }
    let color = Array3::from_shape_fn((h, w, c), |(y, x, k)| planes[k][[y, x]] as u8);
    Ok(Reconstruction::Color(color))
}

// ---------------------------------------------------------------------------
// Centering shifts
// ---------------------------------------------------------------------------

/// Move the zero-frequency term from `[0, 0]` to `[H/2, W/2]`
/// (roll each axis forward by `n / 2`).
pub fn fftshift<T: Clone>(plane: &Array2<T>) -> Array2<T> {
    let (h, w) = plane.dim();
    roll(plane.view(), h / 2, w / 2)
}

/// Exact inverse of [`fftshift`], also for odd sizes.
pub fn ifftshift<T: Clone>(plane: &Array2<T>) -> Array2<T> {
    let (h, w) = plane.dim();
    roll(plane.view(), h - h / 2, w - w / 2)
}

/// `out[(i + dy) % h, (j + dx) % w] = a[i, j]`
fn roll<T: Clone>(a: ArrayView2<'_, T>, dy: usize, dx: usize) -> Array2<T> {
    let (h, w) = a.dim();
    Array2::from_shape_fn((h, w), |(i, j)| {
        a[[(i + h - dy) % h, (j + w - dx) % w]].clone()
    })
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// Row and column plans for one transform direction. `Arc<dyn Fft>` is
/// `Send + Sync`, so one plan serves every channel.
struct Plan2d {
    rows: Arc<dyn Fft<f64>>,
    cols: Arc<dyn Fft<f64>>,
}

impl Plan2d {
    fn forward(h: usize, w: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            rows: planner.plan_fft_forward(w),
            cols: planner.plan_fft_forward(h),
        }
    }

    fn inverse(h: usize, w: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            rows: planner.plan_fft_inverse(w),
            cols: planner.plan_fft_inverse(h),
        }
    }

    /// Unnormalized separable 2-D transform: every row, then every column.
    fn process(&self, plane: &mut Array2<Complex64>) {
        let (h, w) = plane.dim();
        if h == 0 || w == 0 {
            return;
        }

        let mut line = vec![Complex64::default(); w];
        let mut scratch = vec![Complex64::default(); self.rows.get_inplace_scratch_len()];
        for mut row in plane.rows_mut() {
            line.iter_mut().zip(row.iter()).for_each(|(d, s)| *d = *s);
            self.rows.process_with_scratch(&mut line, &mut scratch);
            row.iter_mut().zip(line.iter()).for_each(|(d, s)| *d = *s);
        }

        let mut line = vec![Complex64::default(); h];
        let mut scratch = vec![Complex64::default(); self.cols.get_inplace_scratch_len()];
        for mut col in plane.columns_mut() {
            line.iter_mut().zip(col.iter()).for_each(|(d, s)| *d = *s);
            self.cols.process_with_scratch(&mut line, &mut scratch);
            col.iter_mut().zip(line.iter()).for_each(|(d, s)| *d = *s);
        }
    }
}

fn stack_channels(h: usize, w: usize, planes: &[Array2<Complex64>]) -> SpectrumBuffer {
    Array3::from_shape_fn((h, w, planes.len()), |(y, x, k)| planes[k][[y, x]])
}

/// Per-pixel mean over channels of `ln(1 + |z|)`; suppressed entries count
/// as zero.
fn display_magnitude(spectrum: &SpectrumBuffer, mask: Option<&MaskBuffer>) -> Magnitude {
    let (h, w, c) = spectrum.dim();
    let n = c.max(1) as f64;
    Array2::from_shape_fn((h, w), |(y, x)| {
        let sum: f64 = (0..c)
            .filter(|&k| mask.map_or(true, |m| m[[y, x, k]]))
            .map(|k| spectrum[[y, x, k]].norm().ln_1p())
            .sum();
        sum / n
    })
}

fn check_same_shape(spectrum: &SpectrumBuffer, mask: &MaskBuffer) -> Result<()> {
    if spectrum.dim() != mask.dim() {
        return Err(SpectralError::ShapeMismatch {
            expected: spectrum.dim(),
            actual: mask.dim(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::mask::reset_mask;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn ramp(h: usize, w: usize, c: usize) -> PixelBuffer {
        Array3::from_shape_fn((h, w, c), |(y, x, k)| ((y * 31 + x * 17 + k * 70) % 256) as u8)
    }

    #[test]
    fn test_fftshift_even_and_odd() {
        let a = array![[0, 1, 2, 3], [4, 5, 6, 7]];
        assert_eq!(fftshift(&a), array![[6, 7, 4, 5], [2, 3, 0, 1]]);

        let odd = array![[0, 1, 2], [3, 4, 5], [6, 7, 8]];
        let shifted = fftshift(&odd);
        // numpy.fft.fftshift on a 3x3 puts [0, 0] at [1, 1]
        assert_eq!(shifted[[1, 1]], 0);
        assert_eq!(ifftshift(&shifted), odd);
    }

    #[test]
    fn test_dc_term_is_centred() {
        let pixels = Array3::from_elem((6, 8, 1), 10u8);
        let (spectrum, magnitude) = forward_transform(&pixels);
        let dc = spectrum[[3, 4, 0]];
        assert_abs_diff_eq!(dc.re, 10.0 * 48.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dc.im, 0.0, epsilon = 1e-9);
        // A flat image has no energy anywhere else.
        assert_abs_diff_eq!(spectrum[[0, 0, 0]].norm(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(magnitude[[3, 4]], (480.0f64).ln_1p(), epsilon = 1e-9);
    }

    #[test]
    fn test_round_trip_gray() {
        let pixels = ramp(17, 12, 1);
        let (spectrum, _) = forward_transform(&pixels);
        let mask = reset_mask(spectrum.dim());
        let out = inverse_transform(&spectrum, &mask).unwrap();
        let Reconstruction::Gray(gray) = &out else {
            panic!("single channel must reconstruct as gray");
        };
        for ((y, x), v) in gray.indexed_iter() {
            assert!((v - pixels[[y, x, 0]] as f64).abs() <= 1e-6);
        }
    }

    #[test]
    fn test_round_trip_color_within_one_unit() {
        let pixels = ramp(9, 14, 3);
        let (spectrum, _) = forward_transform(&pixels);
        let mask = reset_mask(spectrum.dim());
        let out = inverse_transform(&spectrum, &mask).unwrap();
        assert_eq!(out.dim(), (9, 14, 3));
        for ((y, x, k), &v) in pixels.indexed_iter() {
            assert!((out.sample(y, x, k) - v as f64).abs() <= 1.0);
        }
    }

    #[test]
    fn test_channels_are_independent() {
        let mut pixels = Array3::zeros((8, 8, 3));
        pixels.index_axis_mut(Axis(2), 1).fill(200u8);
        let (spectrum, _) = forward_transform(&pixels);
        for ((_, _, k), z) in spectrum.indexed_iter() {
            if k != 1 {
                assert_abs_diff_eq!(z.norm(), 0.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_full_suppression_is_black() {
        let pixels = ramp(10, 10, 3);
        let (spectrum, _) = forward_transform(&pixels);
        let mask = Array3::from_elem(spectrum.dim(), false);
        match inverse_transform(&spectrum, &mask).unwrap() {
            Reconstruction::Color(c) => assert!(c.iter().all(|&v| v == 0)),
            Reconstruction::Gray(_) => panic!("expected colour output"),
        }
        let magnitude = masked_magnitude(&spectrum, &mask).unwrap();
        assert!(magnitude.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_dc_only_gives_mean() {
        let pixels = ramp(8, 8, 1);
        let mean = pixels.iter().map(|&v| v as f64).sum::<f64>() / 64.0;
        let (spectrum, _) = forward_transform(&pixels);
        let mut mask = Array3::from_elem(spectrum.dim(), false);
        mask[[4, 4, 0]] = true;
        let Reconstruction::Gray(gray) = inverse_transform(&spectrum, &mask).unwrap() else {
            panic!("expected gray output");
        };
        for v in gray.iter() {
            assert_abs_diff_eq!(*v, mean, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let (spectrum, _) = forward_transform(&ramp(4, 4, 1));
        let mask = Array3::from_elem((4, 5, 1), true);
        assert!(matches!(
            inverse_transform(&spectrum, &mask),
            Err(SpectralError::ShapeMismatch { .. })
        ));
        assert!(masked_magnitude(&spectrum, &mask).is_err());
    }

    #[test]
    fn test_magnitude_averages_channels() {
        let mut pixels = Array3::zeros((4, 4, 2));
        pixels.index_axis_mut(Axis(2), 0).fill(4u8);
        let (spectrum, magnitude) = forward_transform(&pixels);
        let expected = spectrum[[2, 2, 0]].norm().ln_1p() / 2.0;
        assert_abs_diff_eq!(magnitude[[2, 2]], expected, epsilon = 1e-12);
    }
}
