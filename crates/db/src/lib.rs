//! Metadata store for image records.
//!
//! This crate provides:
//! - Repository implementations of `mirrorcut_core::images::ImageRepository`
//!
//! Records live in process memory and are lost on restart. A durable backend only
//! needs to implement the same four operations.

pub mod repositories;

pub use repositories::InMemoryImageRepository;
