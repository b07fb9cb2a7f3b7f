/// Data layer: buffers, the spectrum engine, the mask generator and image
/// ingestion.
///
/// Architecture:
/// ```text
///  .png / .jpg / .bmp
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  decode file → PixelBuffer (H, W, C)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ spectrum  │  fft2 + fftshift per channel → SpectrumBuffer
///   └──────────┘
///        │            ┌──────────┐
///        │  ◄──────── │   mask    │  shape geometry → MaskBuffer
///        ▼            └──────────┘
///   ┌──────────┐
///   │ spectrum  │  spectrum · mask → ifftshift + ifft2 → Reconstruction
///   └──────────┘
/// ```

pub mod loader;
pub mod mask;
pub mod model;
pub mod spectrum;
