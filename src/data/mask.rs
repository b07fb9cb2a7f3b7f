use ndarray::{s, Array2, Array3, Axis, Zip};

use super::model::{MaskBuffer, NormalizedBox, PixelBox, ShapeKind};
use crate::error::{Result, SpectralError};

// ---------------------------------------------------------------------------
// Mask construction
// ---------------------------------------------------------------------------

/// A fresh mask that keeps every frequency component.
pub fn reset_mask(dim: (usize, usize, usize)) -> MaskBuffer {
    Array3::from_elem(dim, true)
}

/// Return a copy of `mask` with `shape` (drawn inside `bbox`) suppressed in
/// every channel. Entries already `false` stay `false`; nothing is ever
/// restored. The input mask is left untouched.
///
/// `thickness` must be positive for the border-based shapes
/// (hollow rectangle, ring) and is ignored otherwise.
pub fn apply_shape(
    mask: &MaskBuffer,
    shape: ShapeKind,
    bbox: &NormalizedBox,
    thickness: u32,
) -> Result<MaskBuffer> {
    validate_thickness(shape, thickness)?;

    let (h, w, _) = mask.dim();
    let pixels = bbox.to_pixels(h, w);
    let mut out = mask.clone();
    if pixels.is_degenerate() {
        log::debug!("apply_shape: zero-area {shape} box {pixels:?}, nothing to suppress");
        return Ok(out);
    }

    let region = shape_region(h, w, shape, &pixels, thickness as usize);
    for mut channel in out.axis_iter_mut(Axis(2)) {
        Zip::from(&mut channel).and(&region).for_each(|keep, &hit| {
            if hit {
                *keep = false;
            }
        });
    }
    Ok(out)
}

/// Reject a zero thickness for the shapes that are drawn as borders.
pub fn validate_thickness(shape: ShapeKind, thickness: u32) -> Result<()> {
    if shape.uses_thickness() && thickness == 0 {
        return Err(SpectralError::validation(format!(
            "{shape} needs a positive thickness"
        )));
    }
    Ok(())
}

/// Share of mask entries that are suppressed, in [0, 1].
pub fn suppressed_fraction(mask: &MaskBuffer) -> f64 {
    if mask.is_empty() {
        return 0.0;
    }
    let off = mask.iter().filter(|&&keep| !keep).count();
    off as f64 / mask.len() as f64
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// The 2-D suppression pattern of `shape` on an `h` x `w` grid: `true` marks
/// a pixel to suppress.
pub fn shape_region(
    h: usize,
    w: usize,
    shape: ShapeKind,
    bbox: &PixelBox,
    thickness: usize,
) -> Array2<bool> {
    let mut region = Array2::from_elem((h, w), false);
    if bbox.is_degenerate() {
        return region;
    }
    let PixelBox { x0, y0, x1, y1 } = *bbox;

    match shape {
        ShapeKind::Rectangle => {
            region.slice_mut(s![y0..y1, x0..x1]).fill(true);
        }
        ShapeKind::HollowRectangle => {
            // Bands never leave the box, even when thicker than it.
            let top = (y0 + thickness).min(y1);
            let bottom = y1.saturating_sub(thickness).max(y0);
            let left = (x0 + thickness).min(x1);
            let right = x1.saturating_sub(thickness).max(x0);
            region.slice_mut(s![y0..top, x0..x1]).fill(true);
            region.slice_mut(s![bottom..y1, x0..x1]).fill(true);
            region.slice_mut(s![y0..y1, x0..left]).fill(true);
            region.slice_mut(s![y0..y1, right..x1]).fill(true);
        }
        ShapeKind::Ellipse => {
            let outer = Ellipse::inscribed(bbox);
            region = Array2::from_shape_fn((h, w), |(y, x)| outer.contains(y, x));
        }
        ShapeKind::Ring => {
            let outer = Ellipse::inscribed(bbox);
            let inner = outer.shrink(thickness as f64);
            region = Array2::from_shape_fn((h, w), |(y, x)| {
                outer.contains(y, x) && !inner.is_some_and(|e| e.contains(y, x))
            });
        }
    }
    region
}

/// Axis-aligned ellipse in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Ellipse {
    cy: f64,
    cx: f64,
    ry: f64,
    rx: f64,
}

impl Ellipse {
    /// Centre at the box midpoint, radii half the box height/width.
    fn inscribed(bbox: &PixelBox) -> Self {
        Self {
            cy: (bbox.y0 + bbox.y1) as f64 / 2.0,
            cx: (bbox.x0 + bbox.x1) as f64 / 2.0,
            ry: bbox.height() as f64 / 2.0,
            rx: bbox.width() as f64 / 2.0,
        }
    }

    /// Concentric ellipse with both radii reduced by `by`. `None` once either
    /// radius reaches zero: the ring then covers the whole outer ellipse.
    fn shrink(&self, by: f64) -> Option<Self> {
        let (ry, rx) = (self.ry - by, self.rx - by);
        (ry > 0.0 && rx > 0.0).then_some(Self { ry, rx, ..*self })
    }

    fn contains(&self, y: usize, x: usize) -> bool {
        let dy = (y as f64 - self.cy) / self.ry;
        let dx = (x as f64 - self.cx) / self.rx;
        dy * dy + dx * dx <= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_2d(h: usize, w: usize) -> MaskBuffer {
        reset_mask((h, w, 1))
    }

    fn full_box() -> NormalizedBox {
        NormalizedBox::full()
    }

    #[test]
    fn test_rectangle_block() {
        let mask = mask_2d(100, 100);
        let bbox = NormalizedBox::new(0.2, 0.2, 0.6, 0.6).unwrap();
        let out = apply_shape(&mask, ShapeKind::Rectangle, &bbox, 0).unwrap();
        for ((y, x, _), &keep) in out.indexed_iter() {
            let inside = (20..60).contains(&y) && (20..60).contains(&x);
            assert_eq!(keep, !inside, "pixel ({y}, {x})");
        }
        // Pure: the input is untouched.
        assert!(mask.iter().all(|&k| k));
    }

    #[test]
    fn test_rectangle_drag_direction_irrelevant() {
        let mask = mask_2d(40, 40);
        let a = NormalizedBox::new(0.1, 0.7, 0.5, 0.2).unwrap();
        let b = NormalizedBox::new(0.5, 0.2, 0.1, 0.7).unwrap();
        assert_eq!(
            apply_shape(&mask, ShapeKind::Rectangle, &a, 0).unwrap(),
            apply_shape(&mask, ShapeKind::Rectangle, &b, 0).unwrap()
        );
    }

    #[test]
    fn test_hollow_rectangle_leaves_interior() {
        let mask = mask_2d(100, 100);
        let bbox = NormalizedBox::new(0.2, 0.2, 0.6, 0.6).unwrap();
        let out = apply_shape(&mask, ShapeKind::HollowRectangle, &bbox, 5).unwrap();
        assert!(!out[[20, 40, 0]]); // top band
        assert!(!out[[59, 40, 0]]); // bottom band
        assert!(!out[[40, 24, 0]]); // left band
        assert!(!out[[40, 55, 0]]); // right band
        assert!(out[[40, 40, 0]]); // interior
        assert!(out[[25, 25, 0]]);
        assert!(out[[19, 40, 0]]); // outside
        assert!(out[[40, 60, 0]]);
    }

    #[test]
    fn test_hollow_rectangle_thicker_than_box_stays_inside() {
        let mask = mask_2d(20, 20);
        let bbox = NormalizedBox::new(0.25, 0.25, 0.5, 0.5).unwrap();
        let out = apply_shape(&mask, ShapeKind::HollowRectangle, &bbox, 50).unwrap();
        let rect = apply_shape(&mask, ShapeKind::Rectangle, &bbox, 0).unwrap();
        assert_eq!(out, rect);
    }

    #[test]
    fn test_ellipse_containment() {
        let mask = mask_2d(100, 100);
        let out = apply_shape(&mask, ShapeKind::Ellipse, &full_box(), 0).unwrap();
        assert!(!out[[50, 50, 0]]);
        assert!(out[[0, 0, 0]]);
        assert!(out[[99, 99, 0]]);
        assert!(!out[[50, 0, 0]]); // on the boundary: ((50-50)/50)^2 + ((0-50)/50)^2 == 1
    }

    #[test]
    fn test_ring_excludes_centre() {
        let mask = mask_2d(100, 100);
        let out = apply_shape(&mask, ShapeKind::Ring, &full_box(), 10).unwrap();
        assert!(out[[50, 50, 0]]);
        assert!(!out[[50, 5, 0]]);
        assert!(!out[[5, 50, 0]]);
        assert!(out[[0, 0, 0]]);
    }

    #[test]
    fn test_ring_thicker_than_radius_is_full_ellipse() {
        let mask = mask_2d(60, 60);
        let bbox = NormalizedBox::new(0.25, 0.25, 0.75, 0.5).unwrap();
        let ring = apply_shape(&mask, ShapeKind::Ring, &bbox, 8).unwrap();
        let ellipse = apply_shape(&mask, ShapeKind::Ellipse, &bbox, 0).unwrap();
        assert_eq!(ring, ellipse);
    }

    #[test]
    fn test_zero_thickness_rejected_for_border_shapes() {
        let mask = mask_2d(10, 10);
        for shape in [ShapeKind::HollowRectangle, ShapeKind::Ring] {
            let err = apply_shape(&mask, shape, &full_box(), 0).unwrap_err();
            assert!(matches!(err, SpectralError::Validation(_)));
        }
    }

    #[test]
    fn test_degenerate_box_is_noop() {
        let mask = mask_2d(30, 30);
        let bbox = NormalizedBox::new(0.5, 0.1, 0.5, 0.9).unwrap();
        for shape in ShapeKind::ALL {
            let out = apply_shape(&mask, shape, &bbox, 3).unwrap();
            assert_eq!(out, mask);
        }
    }

    #[test]
    fn test_all_channels_suppressed_identically() {
        let mask = reset_mask((32, 32, 3));
        let bbox = NormalizedBox::new(0.1, 0.3, 0.8, 0.9).unwrap();
        let out = apply_shape(&mask, ShapeKind::Ellipse, &bbox, 0).unwrap();
        let first = out.index_axis(Axis(2), 0).to_owned();
        for ch in 1..3 {
            assert_eq!(out.index_axis(Axis(2), ch), first);
        }
        assert!(first.iter().any(|&k| !k));
    }

    #[test]
    fn test_suppression_is_monotonic() {
        let mut mask = mask_2d(50, 50);
        let steps = [
            (ShapeKind::Rectangle, NormalizedBox::new(0.0, 0.0, 0.3, 0.3).unwrap(), 0),
            (ShapeKind::Ring, NormalizedBox::new(0.1, 0.1, 0.9, 0.9).unwrap(), 4),
            (ShapeKind::HollowRectangle, NormalizedBox::new(0.2, 0.6, 0.7, 1.0).unwrap(), 2),
        ];
        for (shape, bbox, t) in steps {
            let next = apply_shape(&mask, shape, &bbox, t).unwrap();
            Zip::from(&mask).and(&next).for_each(|&before, &after| {
                if !before {
                    assert!(!after);
                }
            });
            mask = next;
        }
        assert!(suppressed_fraction(&mask) > 0.0);
        assert_eq!(suppressed_fraction(&reset_mask(mask.dim())), 0.0);
    }

    #[test]
    fn test_suppressed_fraction() {
        let mask = mask_2d(10, 10);
        let bbox = NormalizedBox::new(0.0, 0.0, 0.5, 0.5).unwrap();
        let out = apply_shape(&mask, ShapeKind::Rectangle, &bbox, 0).unwrap();
        assert!((suppressed_fraction(&out) - 0.25).abs() < 1e-12);
    }
}
