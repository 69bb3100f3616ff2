//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for record storage,
//! hiding the backing map from the rest of the application.

pub mod image;

pub use image::InMemoryImageRepository;
