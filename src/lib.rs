//! Interactive Fourier spectrum editing.
//!
//! An image is transformed once into a centred 2-D spectrum; the user carves
//! geometric regions out of a boolean mask over that spectrum and the
//! reconstruction is recomputed from `spectrum * mask` on demand.

pub mod config;
pub mod data;
pub mod error;
pub mod render;
pub mod session;
pub mod state;

pub use data::model::{NormalizedBox, PixelBuffer, Reconstruction, ShapeKind, View, ViewBuffer};
pub use error::{Result, SpectralError};
pub use session::{ImageSession, SessionId, SessionStore, ShapeRequest};
