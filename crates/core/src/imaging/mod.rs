//! Deterministic image transform: mirror across the vertical axis, re-encode as PNG.

mod error;
mod flip;

pub use error::ImagingError;
pub use flip::{OUTPUT_CONTENT_TYPE, flip_horizontal, flip_horizontal_async};
