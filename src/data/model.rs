use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, Array3};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectralError};

// ---------------------------------------------------------------------------
// Buffers
// ---------------------------------------------------------------------------

/// Decoded image samples, shape (H, W, C). C == 1 is grayscale, C == 3 is RGB.
pub type PixelBuffer = Array3<u8>;

/// Centred 2-D spectrum, same shape as the pixels it was computed from.
pub type SpectrumBuffer = Array3<Complex64>;

/// `true` keeps a frequency component, `false` suppresses it.
pub type MaskBuffer = Array3<bool>;

/// Display magnitude `log(1 + |F|)`, averaged over channels.
pub type Magnitude = Array2<f64>;

/// Output of the inverse transform, already clipped to [0, 255].
#[derive(Debug, Clone, PartialEq)]
pub enum Reconstruction {
    /// Single-channel output stays floating point.
    Gray(Array2<f64>),
    /// Multi-channel output is cast to 8 bits after clipping.
    Color(Array3<u8>),
}

impl Reconstruction {
    /// (height, width, channels)
    pub fn dim(&self) -> (usize, usize, usize) {
        match self {
            Reconstruction::Gray(a) => {
                let (h, w) = a.dim();
                (h, w, 1)
            }
            Reconstruction::Color(a) => a.dim(),
        }
    }

    /// Sample at (y, x, c) as a float, regardless of representation.
    pub fn sample(&self, y: usize, x: usize, c: usize) -> f64 {
        match self {
            Reconstruction::Gray(a) => a[[y, x]],
            Reconstruction::Color(a) => a[[y, x, c]] as f64,
        }
    }
}

/// The numeric buffer behind one of the three logical views of a session.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewBuffer {
    Original(PixelBuffer),
    Magnitude(Magnitude),
    Reconstruction(Reconstruction),
}

// ---------------------------------------------------------------------------
// View – which image of a session is being asked for
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Original,
    Spectrum,
    Reconstruction,
}

impl View {
    pub const ALL: [View; 3] = [View::Original, View::Spectrum, View::Reconstruction];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Original => "original",
            View::Spectrum => "spectrum",
            View::Reconstruction => "reconstruction",
        }
    }

    /// Human-facing pane title.
    pub fn title(&self) -> &'static str {
        match self {
            View::Original => "Original",
            View::Spectrum => "Spectrum (log magnitude)",
            View::Reconstruction => "Reconstruction",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = SpectralError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "original" => Ok(View::Original),
            "spectrum" | "fft" => Ok(View::Spectrum),
            "reconstruction" | "ifft" => Ok(View::Reconstruction),
            other => Err(SpectralError::validation(format!("unknown view '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// ShapeKind
// ---------------------------------------------------------------------------

/// Geometric region a user can carve out of the spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    HollowRectangle,
    Ellipse,
    Ring,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 4] = [
        ShapeKind::Rectangle,
        ShapeKind::HollowRectangle,
        ShapeKind::Ellipse,
        ShapeKind::Ring,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::HollowRectangle => "hollow_rectangle",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Ring => "ring",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::HollowRectangle => "Hollow rectangle",
            ShapeKind::Ellipse => "Ellipse",
            ShapeKind::Ring => "Ring",
        }
    }

    /// Border-based shapes need a positive thickness.
    pub fn uses_thickness(&self) -> bool {
        matches!(self, ShapeKind::HollowRectangle | ShapeKind::Ring)
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeKind {
    type Err = SpectralError;

    /// Accepts the canonical names plus the short forms used by the web
    /// front end (`rect`, `hollow_rect`, `circle`).
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rectangle" | "rect" => Ok(ShapeKind::Rectangle),
            "hollow_rectangle" | "hollow_rect" => Ok(ShapeKind::HollowRectangle),
            "ellipse" | "circle" => Ok(ShapeKind::Ellipse),
            "ring" => Ok(ShapeKind::Ring),
            other => Err(SpectralError::validation(format!("unknown shape '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Boxes
// ---------------------------------------------------------------------------

/// Drag box in normalized coordinates, every component in [0, 1].
/// Corners may arrive in any order; sorting happens in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl NormalizedBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Result<Self> {
        for (name, v) in [("x0", x0), ("y0", y0), ("x1", x1), ("y1", y1)] {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(SpectralError::validation(format!(
                    "coordinate {name}={v} is outside [0, 1]"
                )));
            }
        }
        Ok(Self { x0, y0, x1, y1 })
    }

    /// The whole buffer.
    pub fn full() -> Self {
        Self {
            x0: 0.0,
            y0: 0.0,
            x1: 1.0,
            y1: 1.0,
        }
    }

    /// Scale to a `height` x `width` grid, truncating toward zero, and sort
    /// the corners.
    pub fn to_pixels(&self, height: usize, width: usize) -> PixelBox {
        let px = |v: f64, n: usize| ((v * n as f64) as usize).min(n);
        let (ax, bx) = (px(self.x0, width), px(self.x1, width));
        let (ay, by) = (px(self.y0, height), px(self.y1, height));
        PixelBox {
            x0: ax.min(bx),
            x1: ax.max(bx),
            y0: ay.min(by),
            y1: ay.max(by),
        }
    }
}

/// Half-open pixel rectangle `[y0, y1) x [x0, x1)` with sorted corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl PixelBox {
    /// Zero-area boxes suppress nothing.
    pub fn is_degenerate(&self) -> bool {
        self.x0 == self.x1 || self.y0 == self.y1
    }

    pub fn height(&self) -> usize {
        self.y1 - self.y0
    }

    pub fn width(&self) -> usize {
        self.x1 - self.x0
    }
}
