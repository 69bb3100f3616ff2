//! Background removal provider client.
//!
//! The pipeline only sees the [`BackgroundRemover`] trait; [`RemoveBgClient`] is the
//! remove.bg implementation used in production.

mod client;
mod error;

pub use client::{BackgroundRemover, RemoveBgClient, RemoveBgConfig};
pub use error::RemovalError;
